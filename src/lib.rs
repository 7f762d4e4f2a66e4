pub mod cli;
pub mod core;
pub mod server;
pub mod store;

use crate::cli::show::View;
use crate::core::config::AppConfig;
use crate::store::TabularStore;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    /// Run the HTTP API, optionally overriding the configured address.
    Serve {
        host: Option<String>,
        port: Option<u16>,
    },
    /// Print one view, from the given CSV files or from the stored upload.
    Show {
        view: View,
        files: Option<(PathBuf, PathBuf)>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let mut config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load_or_default()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let store = Arc::new(open_store(&config).await?);
            server::serve(&config.server, store).await
        }
        AppCommand::Show { view, files } => {
            let snapshot = match files {
                Some((weights, prices)) => {
                    Some(Arc::new(cli::show::load_snapshot_from_files(&weights, &prices)?))
                }
                None => open_store(&config).await?.snapshot(),
            };
            cli::show::run(&view, snapshot.as_deref())
        }
    }
}

/// Opens the upload store the config asks for.
pub async fn open_store(config: &AppConfig) -> Result<TabularStore> {
    if !config.storage.persist {
        info!("Persistence disabled, uploads are kept in memory");
        return Ok(TabularStore::in_memory());
    }

    let path = config.uploads_path()?;
    TabularStore::on_disk(&path)
        .await
        .with_context(|| format!("Failed to open upload store at {}", path.display()))
}
