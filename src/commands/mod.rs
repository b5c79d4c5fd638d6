//! Built-in commands every terminal session starts with. Service-specific
//! commands are registered on top of these through the engine handle.

mod clear;
mod echo;
mod help;

use crate::registry::Command;

/// The base command set: `help`, `echo` and `clear`.
pub fn builtins() -> Vec<Command> {
    vec![help::command(), echo::command(), clear::command()]
}
