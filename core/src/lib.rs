pub mod config;
pub mod scheduler;
pub mod slot;
pub mod status;
pub mod style;
pub mod testing;

pub use crate::config::{Config, Verbosity};
pub use crate::scheduler::{run, Scheduler, Summary};
