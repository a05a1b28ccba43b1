//! Command implementations for CLI tools.
//!
//! Each module contains the full implementation for a command,
//! which can be invoked by thin wrapper binaries.

pub mod allocate;
pub mod check;
pub mod common;
pub mod completions;
pub mod remit;
pub mod reverse;
pub mod settle;
