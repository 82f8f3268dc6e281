pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod format;
pub mod model;
pub mod output;
pub mod render;
pub mod runner;
pub mod source;
pub mod state;
pub mod utils;

#[cfg(test)]
mod tests;
