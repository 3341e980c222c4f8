//! Wait and settle settings, loadable from YAML.
//!
//! ```yaml
//! element_timeout_ms: 15000
//! poll_interval_ms: 250
//! visible_check_timeout_ms: 5000
//! ```
//!
//! Missing fields keep their defaults.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Timeouts and delays used by [`crate::BasePage`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Default wait for the `wait_for_element*` family and clickability checks.
    pub element_timeout_ms: u64,

    /// Sleep between element-wait probes.
    pub poll_interval_ms: u64,

    /// `is_element_present` wait. Zero means a single lookup.
    pub presence_check_timeout_ms: u64,

    /// `is_element_visible` wait.
    pub visible_check_timeout_ms: u64,

    /// How long `get_element_list` waits for the minimum count.
    pub list_timeout_ms: u64,
    pub list_interval_ms: u64,

    /// Pause after `refresh`.
    pub refresh_settle_ms: u64,

    /// Pause around the clear-browsing-data dialog.
    pub clear_data_settle_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            element_timeout_ms: 20_000,
            poll_interval_ms: 500,
            presence_check_timeout_ms: 0,
            visible_check_timeout_ms: 30_000,
            list_timeout_ms: 10_000,
            list_interval_ms: 500,
            refresh_settle_ms: 3_000,
            clear_data_settle_ms: 2_000,
        }
    }
}

impl Settings {
    /// Load settings from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse settings from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self> {
        // an empty document is all defaults
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject intervals that would poll without sleeping.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be at least 1".into()));
        }
        if self.list_interval_ms == 0 {
            return Err(Error::Config("list_interval_ms must be at least 1".into()));
        }
        Ok(())
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn presence_check_timeout(&self) -> Duration {
        Duration::from_millis(self.presence_check_timeout_ms)
    }

    pub fn visible_check_timeout(&self) -> Duration {
        Duration::from_millis(self.visible_check_timeout_ms)
    }

    pub fn list_timeout(&self) -> Duration {
        Duration::from_millis(self.list_timeout_ms)
    }

    pub fn list_interval(&self) -> Duration {
        Duration::from_millis(self.list_interval_ms)
    }

    pub fn refresh_settle(&self) -> Duration {
        Duration::from_millis(self.refresh_settle_ms)
    }

    pub fn clear_data_settle(&self) -> Duration {
        Duration::from_millis(self.clear_data_settle_ms)
    }
}
