use std::process::exit;

use colored::Colorize;

fn main() {
    if let Err(e) = ngaji::app::run_cli() {
        eprintln!(":: {} :: {}", "Error".red(), e);
        exit(1);
    }
}
