//! Driver registry
//!
//! Maps configured driver names to constructors. Adding a backend means a new
//! [`DriverKind`] variant and a match arm in [`create_driver`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::driver::MetricsDriver;
use super::error::DriverError;
use super::pipeline::PushDriver;
use crate::core::config::AppConfig;
use crate::data::exporters::{CloudwatchExporter, ConsoleExporter};
use crate::domain::metrics::{Collector, DriverStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Cloudwatch,
    Console,
}

impl DriverKind {
    pub const ALL: [DriverKind; 2] = [DriverKind::Cloudwatch, DriverKind::Console];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cloudwatch => "cloudwatch",
            Self::Console => "console",
        }
    }

    /// Comma separated list of every registered driver name
    pub fn available() -> String {
        Self::ALL
            .iter()
            .map(DriverKind::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverKind {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| DriverError::UnknownDriver {
                name: s.trim().to_string(),
                available: Self::available(),
            })
    }
}

/// Build a driver of `kind` from its resolved configuration.
///
/// The driver is returned unstarted. `stats` is shared with whoever reports
/// on this driver (the agent collector in the binary).
pub async fn create_driver(
    kind: DriverKind,
    config: &AppConfig,
    collector: Arc<dyn Collector>,
    stats: Arc<DriverStats>,
) -> Result<Arc<dyn MetricsDriver>, DriverError> {
    let not_configured = || DriverError::NotConfigured {
        driver: kind.to_string(),
        message: format!("missing '{}' section", kind),
    };

    let driver = match kind {
        DriverKind::Cloudwatch => {
            let cw = config.cloudwatch.as_ref().ok_or_else(not_configured)?;
            let client = CloudwatchExporter::new(
                cw.authentication.region_name.clone(),
                cw.authentication.aws_profile_name.clone(),
            )
            .await;
            PushDriver::new(cw.driver.clone(), collector, Arc::new(client), stats)
        }
        DriverKind::Console => {
            let console = config.console.as_ref().ok_or_else(not_configured)?;
            let client = ConsoleExporter::stdout(console.pretty);
            PushDriver::new(console.driver.clone(), collector, Arc::new(client), stats)
        }
    };

    tracing::debug!(driver = %kind, "Metrics driver created");
    Ok(Arc::new(driver))
}
