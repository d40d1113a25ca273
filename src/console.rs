//! ANSI-colored output, standing in for the reference's raw escape codes.

use std::io::{self, Write};

use crossterm::style::Stylize;

pub fn green(msg: &str) {
    println!("{}", msg.green());
}

pub fn yellow(msg: &str) {
    println!("{}", msg.yellow());
}

pub fn red(msg: &str) {
    println!("{}", msg.red());
}

pub fn prompt(text: &str) {
    print!("{}", text);
    let _ = io::stdout().flush();
}
