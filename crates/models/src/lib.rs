pub mod ballast;
pub mod config;
pub mod error;

pub use ballast::*;
pub use config::*;
pub use error::*;
