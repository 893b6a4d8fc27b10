mod cli;
mod client;
mod discover;
mod error;
mod export;
mod join;
mod models;
mod paths;
mod retry;
mod settings;
mod source;
mod sql;
mod stages;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = settings::load_settings().with_overrides(cli.data_dir, cli.token_file, cli.base_url);

    let result = match cli.command {
        Commands::Discover { root } => cli::discover::run(&settings, root),
        Commands::Paths { root } => cli::paths::run(&settings, root),
        Commands::Products { root, join } => cli::products::run(&settings, root, join),
        Commands::Tree { root, join } => cli::tree::run(&settings, root, join),
        Commands::Local { code, tree_root } => cli::local::run(&settings, code, tree_root),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
