//! Console surfaces for the launcher and dashboard.

pub mod console;
