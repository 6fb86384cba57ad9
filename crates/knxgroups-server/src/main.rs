mod cli;
mod import;
mod server;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();

    if let Some(input) = args.input.as_deref() {
        return import::run_once(input, args.password.as_deref(), args.pretty);
    }

    log::info!("Starting knxgroups on port {}", args.port);

    server::start_server(args).await
}
