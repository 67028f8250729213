//! gox: Go with embedded markup.

mod cli;
mod config;
mod discovery;
mod error;
mod gofmt;
mod orchestrator;
mod overlay;
mod proxy;
mod registry;
mod remap;

use clap::Parser;
use cli::{Args, Command};
use config::Config;
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let result = match args.command {
        Command::Generate(generate) => orchestrator::run(generate).map(|()| 0),
        Command::Remap(remap) => remap::run(remap).map(|()| 0),
        Command::Version => {
            println!("gox {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Command::Go(argv) => proxy::run(argv, &Config::from_env()).await,
    };

    match result {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("gox: {}", e);
            std::process::exit(1);
        }
    }
}
