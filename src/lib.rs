//! Starship Bridge - subsystem simulation core
//!
//! Turns discrete bridge commands into continuously evolving ship state:
//! a coordinator routes orders to department state machines that share a
//! validated power table, an alert level, and an independent warp drive.

pub mod command;
pub mod core;
pub mod departments;
pub mod power;
pub mod ship;
pub mod warp;
