//! Page-object base: element waits, lookups and page helpers.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::driver::{Driver, ElementHandle, Gesture};
use crate::element::WrappedElement;
use crate::keys;
use crate::network::{self, NetworkEvent};
use crate::wait::{wait_until, AtLeast, PollResult};
use crate::{Error, Locator, Result};

/// Condition awaited by [`BasePage::wait_for_element`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    /// Attached to the DOM.
    Presence,
    /// Attached and displayed.
    Visible,
    /// Absent, or attached but hidden.
    Invisible,
    /// Displayed, enabled and not covered.
    Clickable,
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ElementState::Presence => "present",
            ElementState::Visible => "visible",
            ElementState::Invisible => "invisible",
            ElementState::Clickable => "clickable",
        })
    }
}

/// What [`BasePage::erase_text`] works on.
pub enum EraseTarget<'a, D: Driver> {
    Locator(&'a Locator),
    Element(&'a WrappedElement<D>),
}

impl<'a, D: Driver> From<&'a Locator> for EraseTarget<'a, D> {
    fn from(locator: &'a Locator) -> Self {
        EraseTarget::Locator(locator)
    }
}

impl<'a, D: Driver> From<&'a WrappedElement<D>> for EraseTarget<'a, D> {
    fn from(element: &'a WrappedElement<D>) -> Self {
        EraseTarget::Element(element)
    }
}

/// Steps [`BasePage::erase_text`] applies, in this order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EraseOptions {
    pub click: bool,
    pub clear: bool,
    /// Press END, then BACKSPACE this many times.
    pub backspace: usize,
}

/// A page in the application under test.
#[async_trait]
pub trait PageObject<D: Driver>: Send + Sync {
    fn base(&self) -> &BasePage<D>;

    /// Verify the page is the one showing.
    async fn check(&self) -> Result<()>;
}

// Result of one wait_for_element probe.
enum Probe<D: Driver> {
    Ready(Option<WrappedElement<D>>),
    Pending,
}

/// Driver session plus wait settings; the base of every page object.
#[derive(Debug, Clone)]
pub struct BasePage<D: Driver> {
    driver: D,
    settings: Settings,
}

impl<D: Driver> BasePage<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            settings: Settings::default(),
        }
    }

    /// Use `settings` instead of the defaults; they are validated first.
    pub fn with_settings(driver: D, settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { driver, settings })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn wrap(&self, element: D::Element, locator: Option<&Locator>) -> WrappedElement<D> {
        WrappedElement::new(self.driver.clone(), element, locator.cloned())
    }

    // ---- element waits ----

    /// Wait until the element behind `locator` reaches `state`.
    ///
    /// Probes first and checks the deadline after each probe, sleeping
    /// `poll_interval` in between. Missing, stale and not-interactable
    /// elements count as "not yet". On timeout, `Visible` logs and yields
    /// `Ok(None)`; every other state is `Error::Timeout`.
    pub async fn wait_for_element(
        &self,
        locator: &Locator,
        state: ElementState,
        timeout: Duration,
    ) -> Result<Option<WrappedElement<D>>> {
        info!(%locator, %state, ?timeout, "waiting for element");
        let start = Instant::now();
        let deadline = start + timeout;

        loop {
            match self.probe(locator, state).await {
                Ok(Probe::Ready(found)) => {
                    info!(%locator, %state, elapsed = ?start.elapsed(), "element ready");
                    return Ok(found);
                }
                Ok(Probe::Pending) => {}
                Err(e) if e.is_not_found() || e.is_not_interactable() => {}
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                break;
            }
            sleep(self.settings.poll_interval()).await;
        }

        if state == ElementState::Visible {
            error!(%locator, ?timeout, "element did not become visible");
            return Ok(None);
        }
        Err(Error::Timeout(format!(
            "{locator} not {state} after {timeout:?}"
        )))
    }

    async fn probe(&self, locator: &Locator, state: ElementState) -> Result<Probe<D>> {
        let found = match self.driver.find_element(locator).await {
            Ok(el) => el,
            Err(e) if state == ElementState::Invisible && e.is_not_found() => {
                return Ok(Probe::Ready(None));
            }
            Err(e) => return Err(e),
        };

        let ready = match state {
            ElementState::Presence => true,
            ElementState::Visible => found.is_displayed().await?,
            ElementState::Clickable => found.is_clickable().await?,
            ElementState::Invisible => match found.is_displayed().await {
                Ok(displayed) => !displayed,
                // detached between lookup and check
                Err(e) if e.is_not_found() => return Ok(Probe::Ready(None)),
                Err(e) => return Err(e),
            },
        };

        Ok(if ready {
            Probe::Ready(Some(self.wrap(found, Some(locator))))
        } else {
            Probe::Pending
        })
    }

    pub async fn wait_for_element_present(&self, locator: &Locator) -> Result<WrappedElement<D>> {
        self.wait_for_element(locator, ElementState::Presence, self.settings.element_timeout())
            .await?
            .ok_or_else(|| Error::NotFound(locator.to_string()))
    }

    pub async fn wait_for_element_clickable(&self, locator: &Locator) -> Result<WrappedElement<D>> {
        self.wait_for_element(locator, ElementState::Clickable, self.settings.element_timeout())
            .await?
            .ok_or_else(|| Error::NotFound(locator.to_string()))
    }

    /// `None` when the element never showed (already logged).
    pub async fn wait_for_element_visible(
        &self,
        locator: &Locator,
    ) -> Result<Option<WrappedElement<D>>> {
        self.wait_for_element(locator, ElementState::Visible, self.settings.element_timeout())
            .await
    }

    /// The hidden element, or `None` once it is gone from the DOM.
    pub async fn wait_for_element_invisible(
        &self,
        locator: &Locator,
    ) -> Result<Option<WrappedElement<D>>> {
        self.wait_for_element(locator, ElementState::Invisible, self.settings.element_timeout())
            .await
    }

    // ---- predicates ----

    /// Present within `presence_check_timeout` (a single lookup by default).
    pub async fn is_element_present(&self, locator: &Locator) -> Result<bool> {
        self.check_state(locator, ElementState::Presence, self.settings.presence_check_timeout())
            .await
    }

    pub async fn is_element_clickable(&self, locator: &Locator) -> Result<bool> {
        self.check_state(locator, ElementState::Clickable, self.settings.element_timeout())
            .await
    }

    pub async fn is_element_visible(&self, locator: &Locator) -> Result<bool> {
        self.check_state(locator, ElementState::Visible, self.settings.visible_check_timeout())
            .await
    }

    async fn check_state(
        &self,
        locator: &Locator,
        state: ElementState,
        timeout: Duration,
    ) -> Result<bool> {
        match self.wait_for_element(locator, state, timeout).await {
            Ok(found) => Ok(found.is_some()),
            Err(e) if e.is_not_found() || e.is_not_interactable() || e.is_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ---- lookups ----

    /// One lookup, no waiting. A miss is `Error::NotFound` naming `locator`.
    pub async fn get_element(&self, locator: &Locator) -> Result<WrappedElement<D>> {
        match self.driver.find_element(locator).await {
            Ok(el) => Ok(self.wrap(el, Some(locator))),
            Err(e) if e.is_not_found() => Err(Error::NotFound(locator.to_string())),
            Err(e) => Err(e),
        }
    }

    /// Elements matching `locator`, waiting up to `list_timeout` for at
    /// least `min_len` of them. On timeout the shorter list is returned.
    pub async fn get_element_list(
        &self,
        locator: &Locator,
        min_len: usize,
    ) -> Result<Vec<WrappedElement<D>>> {
        let outcome = wait_until(
            || self.driver.find_elements(locator),
            AtLeast(min_len),
            self.settings.list_timeout(),
            self.settings.list_interval(),
        )
        .await?;

        let found = match outcome {
            PollResult::Satisfied(found) => found,
            PollResult::TimedOut { last } => {
                let last = last.unwrap_or_default();
                warn!(%locator, min_len, found = last.len(), "fewer elements than expected");
                last
            }
        };
        Ok(found
            .into_iter()
            .map(|el| self.wrap(el, Some(locator)))
            .collect())
    }

    /// The focused element.
    pub async fn active_element(&self) -> Result<WrappedElement<D>> {
        let el = self.driver.active_element().await?;
        Ok(self.wrap(el, None))
    }

    // ---- helpers ----

    /// Empty an input by clicking, clearing and/or backspacing, as selected
    /// in `options`. Returns the element worked on.
    pub async fn erase_text<'a>(
        &self,
        target: impl Into<EraseTarget<'a, D>>,
        options: EraseOptions,
    ) -> Result<WrappedElement<D>> {
        let element = match target.into() {
            EraseTarget::Locator(locator) => self.get_element(locator).await?,
            EraseTarget::Element(element) => element.clone(),
        };

        if options.click {
            element.click().await?;
        }
        if options.clear {
            element.clear().await?;
        }
        if options.backspace > 0 {
            self.driver
                .perform(vec![
                    Gesture::Type(keys::END.to_string()),
                    Gesture::Type(keys::repeat(keys::BACKSPACE, options.backspace)),
                ])
                .await?;
        }
        Ok(element)
    }

    /// `Network.requestWillBeSent` events from the driver's performance log.
    pub async fn filter_network_requests(&self) -> Result<Vec<NetworkEvent>> {
        let entries = self.driver.log_entries("performance").await?;
        let mut requests = Vec::new();
        for entry in &entries {
            let event = network::process_request_entry(entry)?;
            if event.is_request() {
                requests.push(event);
            }
        }
        info!(total = entries.len(), requests = requests.len(), "filtered network log");
        Ok(requests)
    }
}
