//! Command-line interface definition.

use clap::{Parser, Subcommand};
use gi_verify::config::{default_config_path, VerifierConfig};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Product-authenticity verification against the GI registry portal.
#[derive(Parser, Debug)]
#[command(name = "gi-verify")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Entry page of the external verification portal.
    #[arg(long, global = true, env = "GI_VERIFY_PORTAL_URL")]
    pub portal_url: Option<String>,

    /// Chrome/Chromium executable to launch.
    #[arg(long, global = true, env = "GI_VERIFY_CHROME")]
    pub chrome: Option<PathBuf>,

    /// Show the browser window instead of running headless.
    #[arg(long, global = true)]
    pub headful: bool,

    /// Disable the Chrome sandbox (needed in some containers).
    #[arg(long, global = true, env = "GI_VERIFY_NO_SANDBOX")]
    pub no_sandbox: bool,

    /// Seconds to wait for the result table or rejection message.
    #[arg(long, global = true, env = "GI_VERIFY_CLASSIFICATION_TIMEOUT")]
    pub classification_timeout: Option<u64>,

    /// Log level.
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to configuration file.
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// What to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the verification endpoint over HTTP.
    Serve {
        /// Listen address.
        #[arg(long, env = "GI_VERIFY_LISTEN")]
        listen: Option<SocketAddr>,
    },
    /// Verify identifiers and print one JSON result per line.
    Check {
        /// Product identifiers.
        #[arg(required = true)]
        product_ids: Vec<String>,
    },
}

impl Cli {
    /// Build a [`VerifierConfig`] from the config file and CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be loaded.
    pub fn to_config(&self) -> color_eyre::Result<VerifierConfig> {
        // Start with the explicit file, then the default location, then defaults
        let mut config = match &self.config {
            Some(path) => VerifierConfig::from_file(path)?,
            None => {
                let path = default_config_path();
                if path.exists() {
                    VerifierConfig::from_file(&path)?
                } else {
                    VerifierConfig::default()
                }
            }
        };

        if let Some(url) = &self.portal_url {
            config.portal.url.clone_from(url);
        }
        if let Some(path) = &self.chrome {
            config.browser.executable = Some(path.clone());
        }
        if self.headful {
            config.browser.headless = false;
        }
        if self.no_sandbox {
            config.browser.sandbox = false;
        }
        if let Some(secs) = self.classification_timeout {
            config.timeouts.classification_secs = secs;
        }
        if let Command::Serve {
            listen: Some(listen),
        } = &self.command
        {
            config.server.listen = *listen;
        }
        config.log_level.clone_from(&self.log_level);

        Ok(config)
    }
}
