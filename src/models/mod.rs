pub mod diagnostics;
pub mod error;
pub mod file;
pub mod health;
pub mod messages;

pub use diagnostics::*;
pub use error::*;
pub use file::*;
pub use health::*;
pub use messages::*;
