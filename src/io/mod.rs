//! Input/Output handling for the CLI.
//!
//! This module provides:
//! - Consistent exit codes derived from resolver errors

pub mod exit_code;

pub use exit_code::ExitCode;
