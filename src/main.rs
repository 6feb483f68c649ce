use clap::Parser;
use colored::Colorize;
use m365ctl::cli::{self, Cli};

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run(Cli::parse()).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(hint) = e.hint() {
            eprintln!("{} {}", "→".cyan(), hint);
        }
        std::process::exit(1);
    }
}
