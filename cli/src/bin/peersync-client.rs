use anyhow::Result;
use clap::Parser;
use peersync_cli::{ClientArgs, run_client};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    run_client(ClientArgs::parse()).await
}
