use birdseye::cli::Config;
use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    let config = Config::parse();
    process::exit(birdseye::cli::run(config).await)
}
