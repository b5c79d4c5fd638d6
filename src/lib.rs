pub mod ansi;
pub mod cli;
pub mod commands;
pub mod config;
pub mod editor;
pub mod engine;
pub mod history;
pub mod output;
pub mod query;
pub mod registry;
pub mod screen;
