pub mod diagnostics;
pub mod error;
pub mod files;
pub mod health;

pub use diagnostics::*;
pub use files::*;
pub use health::*;
