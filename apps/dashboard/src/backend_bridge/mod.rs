//! Worker-thread side of the shell: command definitions and the runtime that owns the orchestrator.

pub mod commands;
pub mod runtime;
