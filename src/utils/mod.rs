// Utility functions
pub mod email;
pub mod error;
pub mod logger;
pub mod report;

pub use email::*;
pub use error::*;
pub use report::*;
