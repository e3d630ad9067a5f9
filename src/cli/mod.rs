//! CLI module for Piggybank

pub mod app;
pub mod commands;

pub use app::{DemoReport, PiggybankApp};
pub use commands::{Cli, Commands};
