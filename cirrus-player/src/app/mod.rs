//! Command-line front end: argument parsing, the host loop and the status
//! line.

pub mod cli;
pub mod runner;
pub mod status;

pub use runner::{Flow, Host, run};
