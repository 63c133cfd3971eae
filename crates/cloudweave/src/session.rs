//! Config file → store → driver → connection

use crate::registry;
use anyhow::Context;
use cloudweave_cloud::{CloudDriver, Connection, ConnectionInfo, MetadataStore};
use cloudweave_config::{Config, ConnectionProfile, load_config};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

/// A resolved connection profile, not yet connected
pub struct Target {
    pub config: Config,
    pub name: String,
    pub profile: ConnectionProfile,
}

impl Target {
    pub fn new(config: Option<&Path>, connection: Option<&str>) -> anyhow::Result<Self> {
        let (config_path, config) = load_config(config).context("failed to load config")?;
        tracing::debug!("Loaded config from {}", config_path.display());

        let name = match connection {
            Some(name) => name.to_string(),
            None => match config.connection_names().as_slice() {
                [only] => only.to_string(),
                names => anyhow::bail!(
                    "choose a connection with --connection or WEAVE_CONNECTION (defined: {})",
                    if names.is_empty() {
                        "none".to_string()
                    } else {
                        names.join(", ")
                    }
                ),
            },
        };
        let profile = config.connection(&name)?.clone();

        Ok(Self {
            config,
            name,
            profile,
        })
    }

    pub fn driver(&self) -> anyhow::Result<Box<dyn CloudDriver>> {
        registry::driver(&self.profile.driver)
    }

    pub fn connection_info(&self) -> anyhow::Result<ConnectionInfo> {
        self.profile
            .connection_info()
            .with_context(|| format!("connection '{}'", self.name))
    }

    pub fn store(&self) -> anyhow::Result<Arc<MetadataStore>> {
        self.config
            .store
            .open()
            .context("failed to open metadata store")
    }

    /// Credential hash the driver would use, computed without connecting
    pub fn credential_hash(&self) -> anyhow::Result<String> {
        let driver = self.driver()?;
        Ok(self
            .connection_info()?
            .credential
            .hash_fields(driver.credential_hash_fields()))
    }

    pub async fn connect(&self) -> anyhow::Result<Connection> {
        let driver = self.driver()?;
        eprintln!(
            "{} {} ({})",
            "Connecting".blue(),
            self.name.cyan(),
            driver.name()
        );
        Connection::open(
            driver.as_ref(),
            self.connection_info()?,
            self.store()?,
            self.config.reconciler_config(),
        )
        .await
        .with_context(|| format!("failed to open connection '{}'", self.name))
    }
}
