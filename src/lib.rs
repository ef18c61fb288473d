pub mod commands;
pub mod error;
pub mod models;
pub mod modules;
pub mod utils;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use commands::Command;
use models::StorageBackend;
use modules::{logger, storage, AppCoordinator, Generator, MockGenerator, StateStorage};
use utils::SystemClock;

/// Startup overrides; `None` keeps the value from the config file
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub data_dir: Option<PathBuf>,
    pub backend: Option<StorageBackend>,
    pub daily_limit: Option<u32>,
    pub simulate_latency: bool,
}

/// Build a session and drive it from stdin until `quit` or end of input
pub async fn run(options: RunOptions) -> anyhow::Result<()> {
    let data_dir = match options.data_dir {
        Some(dir) => dir,
        None => modules::config::get_data_dir()?,
    };
    logger::init_logger(&data_dir);

    let mut config = modules::config::load_or_init_app_config(&data_dir)?;
    if let Some(backend) = options.backend {
        config.storage_backend = backend;
    }
    if let Some(limit) = options.daily_limit {
        config.daily_generation_limit = limit;
    }
    info!(
        "Starting session in {:?} with {} storage",
        data_dir, config.storage_backend
    );

    let store = storage::open_store(config.storage_backend, &data_dir)?;
    let generator: Arc<dyn Generator> = if options.simulate_latency {
        Arc::new(MockGenerator::with_latency())
    } else {
        Arc::new(MockGenerator::new())
    };
    let mut app = AppCoordinator::new(
        config,
        StateStorage::new(store),
        Arc::new(SystemClock),
        generator,
    );
    if let Some(limit) = options.daily_limit {
        if app.quota().daily_limit != limit {
            let _ = app.upgrade(limit);
        }
    }

    println!("{}", app.announce_quota_status());
    println!("Now on {}. Type help for commands.", app.current().title());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command: Command = match line.parse() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        let quit = command == Command::Quit;
        match commands::execute(&mut app, command, &data_dir).await {
            Ok(output) => println!("{}", output),
            Err(e) => {
                warn!("Command failed: {}", e);
                println!("Error: {}", e);
            }
        }
        if quit {
            break;
        }
    }

    info!("Session ended on {}", app.current());
    Ok(())
}
