pub mod analysis;
pub mod config;
pub mod error;
pub mod metric;

pub use analysis::*;
pub use config::Config;
pub use error::*;
pub use metric::*;
