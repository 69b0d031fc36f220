//! Command implementations behind the `rowcache` binary.

pub mod commands;
