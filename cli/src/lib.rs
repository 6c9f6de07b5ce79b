pub mod cmd;
pub mod config;
