//! Navigation, refresh, windows and session helpers.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::driver::{Driver, Gesture, WindowHandle};
use crate::keys;
use crate::page::BasePage;
use crate::{Error, Result};

/// Chrome's clear-browsing-data dialog.
pub const CLEAR_BROWSER_DATA_URL: &str = "chrome://settings/clearBrowserData";

// TABs from the dialog's initial focus to its confirm button.
const CLEAR_DATA_TABS: usize = 7;

/// Which window [`BasePage::switch_window`] selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowTarget {
    /// The window whose handle is `"main"`.
    Main,
    First,
    Last,
    Index(usize),
}

impl WindowTarget {
    /// `"main"`, `"first"`, `"last"` or a zero-based index.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "main" => Ok(WindowTarget::Main),
            "first" => Ok(WindowTarget::First),
            "last" => Ok(WindowTarget::Last),
            other => other.parse::<usize>().map(WindowTarget::Index).map_err(|_| {
                Error::InvalidArgument(format!("switch_window: invalid index: {other}"))
            }),
        }
    }
}

impl FromStr for WindowTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        WindowTarget::parse(s)
    }
}

impl From<usize> for WindowTarget {
    fn from(index: usize) -> Self {
        WindowTarget::Index(index)
    }
}

impl fmt::Display for WindowTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowTarget::Main => f.write_str("main"),
            WindowTarget::First => f.write_str("first"),
            WindowTarget::Last => f.write_str("last"),
            WindowTarget::Index(i) => write!(f, "{i}"),
        }
    }
}

impl<D: Driver> BasePage<D> {
    pub async fn navigate_url(&self, url: &str) -> Result<()> {
        info!(url, "navigate");
        self.driver().goto(url).await
    }

    /// Go back one page, then wait `additional_wait`.
    pub async fn navigate_browser_back(&self, additional_wait: Duration) -> Result<()> {
        self.driver().back().await?;
        info!("navigated back");
        if !additional_wait.is_zero() {
            sleep(additional_wait).await;
        }
        Ok(())
    }

    pub async fn navigate_browser_forward(&self) -> Result<()> {
        self.driver().forward().await?;
        info!("navigated forward");
        Ok(())
    }

    /// Reload and wait `refresh_settle`.
    pub async fn refresh(&self) -> Result<()> {
        self.driver().refresh().await?;
        sleep(self.settings().refresh_settle()).await;
        info!("page refreshed");
        Ok(())
    }

    /// Reload every `every` until `total` has passed: `total / every`
    /// reloads, each followed by a sleep of `every`.
    pub async fn refresher(&self, total: Duration, every: Duration) -> Result<()> {
        if every.is_zero() {
            return Err(Error::InvalidArgument(
                "refresher: refresh interval must be positive".into(),
            ));
        }
        let count = u64::try_from(total.as_nanos() / every.as_nanos()).unwrap_or(u64::MAX);
        debug!(count, ?every, "refreshing repeatedly");
        for _ in 0..count {
            self.driver().refresh().await?;
            sleep(every).await;
        }
        Ok(())
    }

    pub async fn get_browser_title(&self) -> Result<String> {
        let title = self.driver().title().await?;
        info!(%title, "browser title");
        Ok(title)
    }

    pub async fn get_browser_url(&self) -> Result<String> {
        let url = self.driver().current_url().await?;
        info!(%url, "browser url");
        Ok(url)
    }

    /// Switch to a window or tab. An index past the open windows is
    /// `Error::InvalidArgument`.
    pub async fn switch_window(&self, target: impl Into<WindowTarget>) -> Result<()> {
        let target = target.into();
        let handle = match target {
            WindowTarget::Main => WindowHandle::from("main"),
            _ => {
                let handles = self.driver().window_handles().await?;
                let picked = match target {
                    WindowTarget::First => handles.first(),
                    WindowTarget::Last => handles.last(),
                    WindowTarget::Index(i) => handles.get(i),
                    WindowTarget::Main => None,
                };
                picked.cloned().ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "switch_window: invalid index: {target} ({} open)",
                        handles.len()
                    ))
                })?
            }
        };
        debug!(%target, %handle, "switch window");
        self.driver().switch_to_window(&handle).await
    }

    /// Open a blank tab and switch to it.
    pub async fn open_new_tab(&self) -> Result<()> {
        self.driver().execute_script("window.open();", Vec::new()).await?;
        self.switch_window(WindowTarget::Last).await
    }

    /// The session still answers and has at least one window.
    pub async fn is_browser_reachable(&self) -> bool {
        match self.driver().window_handles().await {
            Ok(handles) => !handles.is_empty(),
            Err(e) => {
                debug!(error = %e, "browser not reachable");
                false
            }
        }
    }

    /// End the session if it is still alive.
    pub async fn quit_driver(&self) -> Result<()> {
        if !self.is_browser_reachable().await {
            warn!("browser already gone, skipping quit");
            return Ok(());
        }
        self.driver().quit().await?;
        info!("driver quit");
        Ok(())
    }

    /// Clear Chrome's browsing data through its settings dialog.
    pub async fn clear_browser_data(&self) -> Result<()> {
        let settle = self.settings().clear_data_settle();
        self.driver().goto(CLEAR_BROWSER_DATA_URL).await?;
        sleep(settle).await;
        self.driver()
            .perform(vec![
                Gesture::Type(keys::repeat(keys::TAB, CLEAR_DATA_TABS)),
                Gesture::Type(keys::ENTER.to_string()),
            ])
            .await?;
        sleep(settle).await;
        info!("browser data cleared");
        Ok(())
    }
}
