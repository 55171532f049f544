// main.rs
mod cli;

use clap::Parser;
use cli::Args;
use studybuddy::config::Config;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();

    let config = match Config::new(args.data_dir.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Config error: {:#}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run(args, &config) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}
