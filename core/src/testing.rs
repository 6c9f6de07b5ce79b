pub mod compare;
pub mod process;
pub mod result;
pub mod runner;
pub mod testcase;
pub mod testfile;

pub use result::*;
pub use runner::*;
pub use testcase::*;
