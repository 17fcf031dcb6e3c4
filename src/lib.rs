pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod exit;
pub mod ui;
pub mod wiz;
