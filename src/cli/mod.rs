//! Workflows behind the command line

pub mod orchestration;

pub use orchestration::{run_init, run_show, InitArgs, ShowArgs};
