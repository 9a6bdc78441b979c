use anyhow::Result;
use clap::Parser;
use peersync_cli::{ServerArgs, run_server};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    run_server(ServerArgs::parse()).await
}
