mod app;
pub mod cli;
mod clock;
mod commands;
mod config;
mod effects;
mod input;
mod logging;
mod persistence;
mod ui;

pub use app::run_app;
