use clap::Parser;
use std::path::PathBuf;

use creative_studio_lib::models::StorageBackend;
use creative_studio_lib::RunOptions;

#[derive(Debug, Parser)]
#[command(name = "creative_studio", about = "Quota-gated creative generation session")]
struct Cli {
    /// Directory for config, state and logs (default: ~/.creative_studio)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// State backend: json, sqlite or memory
    #[arg(long)]
    backend: Option<StorageBackend>,

    /// Override the daily generation allowance
    #[arg(long)]
    daily_limit: Option<u32>,

    /// Sleep like a real generation backend
    #[arg(long)]
    simulate_latency: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    creative_studio_lib::run(RunOptions {
        data_dir: cli.data_dir,
        backend: cli.backend,
        daily_limit: cli.daily_limit,
        simulate_latency: cli.simulate_latency,
    })
    .await
}
