use thiserror::Error;

/// Tier-2 errors: recoverable I/O failures surfaced to the REPL without
/// aborting the process (e.g. a bad `import`/`export` path).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Tier-3 errors are not represented as a `Result` variant at all: they are
/// invariant violations (corrupt file, out-of-bounds page, short write) and
/// are handled by logging at `error` level and aborting the process, mirroring
/// the reference's `exit(EXIT_FAILURE)` calls.
pub fn fatal(msg: &str) -> ! {
    tracing::error!("{}", msg);
    eprintln!("{}", msg);
    std::process::exit(1);
}
