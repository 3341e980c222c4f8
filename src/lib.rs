//! # pagebase
//!
//! Page-object support for WebDriver automation: polling waits, forgiving
//! element lookup, and wrapped elements that chain.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagebase::{BasePage, Locator, WebDriverSession};
//!
//! # #[tokio::main]
//! # async fn main() -> pagebase::Result<()> {
//! let session = WebDriverSession::connect("http://localhost:9515").await?;
//! let page = BasePage::new(session);
//! page.navigate_url("https://example.com").await?;
//!
//! // Locate → scroll → click → type, all on one wrapped element
//! let search = Locator::id("q");
//! page.get_element(&search)
//!     .await?
//!     .scroll()
//!     .await?
//!     .click()
//!     .await?
//!     .send_keys("pagebase")
//!     .await?;
//!
//! if page.is_element_visible(&Locator::css(".results")).await? {
//!     println!("{}", page.get_browser_title().await?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod dropdown;
pub mod element;
pub mod frame;
pub mod keys;
pub mod locator;
pub mod navigation;
pub mod network;
pub mod page;
pub mod util;
pub mod wait;
pub mod webdriver;

#[cfg(test)]
mod mock;

pub use config::Settings;
pub use driver::{Driver, ElementHandle, Gesture, MouseButton, Rect, WindowHandle};
pub use dropdown::Dropdown;
pub use element::{Forwarded, Returns, WrappedElement};
pub use locator::{Locator, Strategy};
pub use network::{LogEntry, NetworkEvent};
pub use navigation::WindowTarget;
pub use page::{BasePage, ElementState, EraseOptions, EraseTarget, PageObject};
pub use wait::{wait_until, AtLeast, Equals, Expectation, IsSome, NotEquals, PollResult};
pub use webdriver::{RemoteElement, WebDriverSession};

/// Result type for pagebase operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by lookups, waits and driver calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("element not found: {0}")]
    NotFound(String),

    #[error("stale element reference: {0}")]
    Stale(String),

    #[error("element not interactable: {0}")]
    NotInteractable(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("driver error: {0}")]
    Driver(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The element is missing or its handle went stale.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::Stale(_))
    }

    /// The element exists but cannot take the interaction right now.
    pub fn is_not_interactable(&self) -> bool {
        matches!(self, Error::NotInteractable(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

/// Install a compact fmt subscriber. `RUST_LOG` wins over `level` when set.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(level: tracing::Level) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init();
}
