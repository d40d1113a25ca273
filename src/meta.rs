//! Dot-commands: `.exit`, `.btree`, `.constants`, `.commands`.

use crate::node::*;
use crate::row::USER_ROW_SIZE;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommandResult {
    Success,
    Exit,
    Unrecognized,
}

pub fn do_meta_command(line: &str, table: &mut Table) -> MetaCommandResult {
    if line.starts_with(".exit") {
        return MetaCommandResult::Exit;
    }
    if line.starts_with(".btree") {
        println!("Tree:");
        print_tree(table.pager_mut(), table.root_page_idx(), 0);
        return MetaCommandResult::Success;
    }
    if line.starts_with(".constants") {
        println!("Constants:");
        print_constants();
        return MetaCommandResult::Success;
    }
    if line.starts_with(".commands") {
        println!("Commands:");
        print_commands();
        return MetaCommandResult::Success;
    }
    MetaCommandResult::Unrecognized
}

fn indent(level: u32) {
    for _ in 0..level {
        print!("  ");
    }
}

fn print_tree(pager: &mut crate::pager::Pager, page_idx: u32, indentation_level: u32) {
    let node_type = get_node_type(pager.get(page_idx));
    match node_type {
        NodeType::Leaf => {
            let num_keys = leaf_node_num_cells(pager.get(page_idx));
            indent(indentation_level);
            println!("- leaf (size {})", num_keys);
            for i in 0..num_keys {
                indent(indentation_level + 1);
                println!("- {}", leaf_node_key(pager.get(page_idx), i as usize));
            }
        }
        NodeType::Internal => {
            let num_keys = internal_node_num_keys(pager.get(page_idx));
            indent(indentation_level);
            println!("- internal (size {})", num_keys);

            for i in 0..num_keys {
                let child_page_idx = internal_node_child(pager.get(page_idx), i as usize);
                print_tree(pager, child_page_idx, indentation_level + 1);
                indent(indentation_level + 1);
                println!("- key {}", internal_node_key(pager.get(page_idx), i as usize));
            }

            let right_child = internal_node_right_child(pager.get(page_idx));
            if right_child != INVALID_PAGE_IDX {
                print_tree(pager, right_child, indentation_level + 1);
            }
        }
    }
}

fn print_constants() {
    println!("USER_ROW_SIZE: {}", USER_ROW_SIZE);
    println!("COMMON_NODE_HEADER_SIZE: {}", COMMON_NODE_HEADER_SIZE);
    println!("LEAF_NODE_HEADER_SIZE: {}", LEAF_NODE_HEADER_SIZE);
    println!("LEAF_NODE_CELL_SIZE: {}", LEAF_NODE_CELL_SIZE);
    println!("LEAF_NODE_SPACE_FOR_CELLS: {}", LEAF_NODE_SPACE_FOR_CELLS);
    println!("LEAF_NODE_MAX_CELLS: {}", LEAF_NODE_MAX_CELLS);
    println!("INTERNAL_NODE_MAX_KEYS: {}", INTERNAL_NODE_MAX_KEYS);
}

fn print_commands() {
    println!("insert {{num}} {{name}} {{email}}");
    println!("select");
    println!("select {{id}}");
    println!("update {{id}} set {{param}}={{value}}");
    println!("drop {{id}}");
    println!("import '{{file.csv}}'");
    println!("export '{{file.csv}}'");
    println!(".btree");
    println!(".commands");
    println!(".constants");
    println!(".exit");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::UserRow;

    #[test]
    fn unrecognized_command_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::open(dir.path().join("t.db"));
        assert_eq!(do_meta_command(".frobnicate", &mut table), MetaCommandResult::Unrecognized);
    }

    #[test]
    fn exit_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::open(dir.path().join("t.db"));
        assert_eq!(do_meta_command(".exit", &mut table), MetaCommandResult::Exit);
    }

    #[test]
    fn btree_and_constants_run_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::open(dir.path().join("t.db"));
        table.insert(&UserRow::new(1, "a", "a@x"));
        assert_eq!(do_meta_command(".btree", &mut table), MetaCommandResult::Success);
        assert_eq!(do_meta_command(".constants", &mut table), MetaCommandResult::Success);
        assert_eq!(do_meta_command(".commands", &mut table), MetaCommandResult::Success);
    }
}
