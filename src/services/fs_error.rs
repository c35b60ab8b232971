use thiserror::Error;

/// Failures of the sandboxed file operations
#[derive(Debug, Error)]
pub enum FsError {
    /// The requested path resolves outside the project root
    #[error("Access denied")]
    AccessDenied,
    #[error("File too large (max {}MB)", megabytes(.limit))]
    PayloadTooLarge { size: u64, limit: u64 },
    #[error("No such file or directory: '{0}'")]
    NotFound(String),
    #[error("File '{0}' is not valid UTF-8 text")]
    InvalidContent(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Render a byte count in MiB, without a fraction when it divides evenly
fn megabytes(bytes: &u64) -> String {
    const MIB: u64 = 1024 * 1024;
    let bytes = *bytes;
    if bytes % MIB == 0 {
        (bytes / MIB).to_string()
    } else {
        let mb = format!("{:.2}", bytes as f64 / MIB as f64);
        mb.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

impl FsError {
    /// Map an I/O error on `path`, keeping missing files distinguishable
    pub fn from_io(err: std::io::Error, path: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound(path.to_string()),
            _ => FsError::Io(err),
        }
    }
}
