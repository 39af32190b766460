//! Questor - autonomous task-execution agent core
//!
//! The core couples a tool retrieval engine, a planner/executor control
//! loop, a self-improvement cycle, and a set of durable stores (tool
//! library, research vault, learnings, todos). The reasoning engine and
//! external tool processes sit behind narrow traits (`Reasoner`,
//! `ToolBridge`) so the core stays deterministic and testable.

pub mod agent;
pub mod builtins;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod improve;
pub mod library;
pub mod llm;
pub mod retrieval;
pub mod schema;
pub mod store;
pub mod todos;
pub mod vault;

pub use error::{QuestorError, Result};
