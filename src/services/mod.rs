pub mod file_service;
pub mod fs_error;
pub mod path_resolver;

pub use file_service::{FileService, ReadResult};
pub use fs_error::FsError;
pub use path_resolver::PathResolver;
