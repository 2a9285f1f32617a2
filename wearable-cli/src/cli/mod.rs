//! Command-line interface

pub mod commands;
pub mod stream;

pub use commands::{Cli, Commands, ConfigAction};
pub use stream::{stream_readings, stream_to_stdout};
