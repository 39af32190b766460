//! CLI module for questor - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for retrieval preview,
//! tool library management, vault notes, todos, and learnings.

pub mod commands;

pub use commands::Cli;
