//! Core application

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::core::banner;
use crate::core::cli::{self, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::domain::drivers::{DriverKind, MetricsDriver, create_driver};
use crate::domain::metrics::{AgentCollector, Collector, DriverStats};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub drivers: Vec<Arc<dyn MetricsDriver>>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let config = AppConfig::load(&cli_config)?;

        match command {
            Some(Commands::Config) => return Self::print_config(&config),
            Some(Commands::Start) | None => {}
        }

        let app = Self::init(config).await?;
        app.start_agent().await
    }

    /// Build every configured driver around a shared agent collector
    pub async fn init(config: AppConfig) -> Result<Self> {
        let shutdown = ShutdownService::new(Duration::from_secs(config.shutdown_grace_secs));

        let stats: Vec<(DriverKind, Arc<DriverStats>)> = config
            .drivers
            .iter()
            .map(|kind| (*kind, Arc::new(DriverStats::new())))
            .collect();

        let mut agent = AgentCollector::new();
        for (kind, driver_stats) in &stats {
            agent.register(kind.as_str(), Arc::clone(driver_stats));
        }
        let collector: Arc<dyn Collector> = Arc::new(agent);

        let mut drivers = Vec::with_capacity(stats.len());
        for (kind, driver_stats) in stats {
            let driver = create_driver(kind, &config, Arc::clone(&collector), driver_stats)
                .await
                .with_context(|| format!("Failed to create {} driver", kind))?;
            drivers.push(driver);
        }

        Ok(Self {
            shutdown,
            config,
            drivers,
        })
    }

    fn print_config(config: &AppConfig) -> Result<()> {
        let json =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        println!("{}", json);
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        // stdout belongs to the console driver
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_agent(self) -> Result<()> {
        // Install signal handlers FIRST (before any driver starts)
        self.shutdown.install_signal_handlers();

        for driver in &self.drivers {
            self.shutdown.register(Arc::clone(driver)).await;
            if let Err(e) = driver.initialize() {
                self.shutdown.shutdown().await;
                return Err(e).with_context(|| format!("Failed to start {} driver", driver.name()));
            }
        }

        banner::print_banner(&self.config);
        tracing::debug!(drivers = self.drivers.len(), "Agent running");

        self.shutdown.wait().await;
        self.shutdown.shutdown().await;

        Ok(())
    }
}
