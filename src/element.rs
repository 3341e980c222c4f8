//! Wrapped elements.
//!
//! A [`WrappedElement`] pairs a raw driver element with the locator that
//! found it and the session it belongs to. Actions return `&Self` so calls
//! chain:
//!
//! ```rust,no_run
//! # use pagebase::{BasePage, Locator, Driver};
//! # async fn demo<D: Driver>(page: &BasePage<D>) -> pagebase::Result<()> {
//! page.get_element(&Locator::id("email"))
//!     .await?
//!     .scroll()
//!     .await?
//!     .clear()
//!     .await?
//!     .send_keys("user@example.com")
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! Lookups from an element come back wrapped. Everything else the raw
//! element offers is reachable through the [`Forwarded`] table.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, trace};

use crate::driver::{Driver, ElementHandle, Gesture, MouseButton, Rect};
use crate::dropdown::Dropdown;
use crate::keys;
use crate::wait::{wait_until, Equals, PollResult};
use crate::{Error, Locator, Result};

/// Sleep between probes in `wait_visible`, `wait_enable` and `wait_clickable`.
pub const ELEMENT_POLL: Duration = Duration::from_millis(500);

/// What a forwarded operation hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returns {
    /// The raw element's own return value.
    Value,
    /// A new wrapper around the element the operation produced.
    Rewrapped,
    /// The wrapper the operation was called on.
    Wrapper,
}

/// Raw element operations exposed on [`WrappedElement`] by delegation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forwarded {
    Text,
    TagName,
    Attribute,
    Property,
    CssValue,
    IsDisplayed,
    IsEnabled,
    IsSelected,
    Rect,
    Screenshot,
    Parent,
    Clear,
    Submit,
}

impl Forwarded {
    pub const ALL: [Forwarded; 13] = [
        Forwarded::Text,
        Forwarded::TagName,
        Forwarded::Attribute,
        Forwarded::Property,
        Forwarded::CssValue,
        Forwarded::IsDisplayed,
        Forwarded::IsEnabled,
        Forwarded::IsSelected,
        Forwarded::Rect,
        Forwarded::Screenshot,
        Forwarded::Parent,
        Forwarded::Clear,
        Forwarded::Submit,
    ];

    pub const fn returns(self) -> Returns {
        match self {
            Forwarded::Parent => Returns::Rewrapped,
            Forwarded::Clear | Forwarded::Submit => Returns::Wrapper,
            _ => Returns::Value,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Forwarded::Text => "text",
            Forwarded::TagName => "tag_name",
            Forwarded::Attribute => "attribute",
            Forwarded::Property => "property",
            Forwarded::CssValue => "css_value",
            Forwarded::IsDisplayed => "is_displayed",
            Forwarded::IsEnabled => "is_enabled",
            Forwarded::IsSelected => "is_selected",
            Forwarded::Rect => "rect",
            Forwarded::Screenshot => "screenshot",
            Forwarded::Parent => "parent",
            Forwarded::Clear => "clear",
            Forwarded::Submit => "submit",
        }
    }
}

/// A driver element plus its locator and session.
#[derive(Clone)]
pub struct WrappedElement<D: Driver> {
    driver: D,
    element: D::Element,
    locator: Option<Locator>,
}

impl<D: Driver> fmt::Debug for WrappedElement<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedElement")
            .field("id", &self.element.id())
            .field("locator", &self.locator)
            .finish()
    }
}

impl<D: Driver> WrappedElement<D> {
    pub fn new(driver: D, element: D::Element, locator: Option<Locator>) -> Self {
        Self {
            driver,
            element,
            locator,
        }
    }

    pub fn locator(&self) -> Option<&Locator> {
        self.locator.as_ref()
    }

    pub fn raw(&self) -> &D::Element {
        &self.element
    }

    pub fn into_raw(self) -> D::Element {
        self.element
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn id(&self) -> String {
        self.element.id()
    }

    fn rewrap(&self, element: D::Element, locator: Locator) -> Self {
        Self::new(self.driver.clone(), element, Some(locator))
    }

    /// Locator when known, element id otherwise. Used in logs and errors.
    fn describe(&self) -> String {
        match &self.locator {
            Some(locator) => locator.to_string(),
            None => format!("element {}", self.element.id()),
        }
    }

    // ---- lookups ----

    /// First descendant matching `locator`.
    pub async fn find_element(&self, locator: &Locator) -> Result<Self> {
        let found = self.element.find_element(locator).await?;
        Ok(self.rewrap(found, locator.clone()))
    }

    /// All descendants matching `locator`, each wrapped.
    pub async fn find_elements(&self, locator: &Locator) -> Result<Vec<Self>> {
        let found = self.element.find_elements(locator).await?;
        Ok(found
            .into_iter()
            .map(|e| self.rewrap(e, locator.clone()))
            .collect())
    }

    // ---- waits ----

    pub async fn wait_visible(&self, timeout: Duration) -> Result<&Self> {
        self.wait_for_flag(timeout, "visible", || self.element.is_displayed())
            .await
    }

    pub async fn wait_enable(&self, timeout: Duration) -> Result<&Self> {
        self.wait_for_flag(timeout, "enabled", || self.element.is_enabled())
            .await
    }

    pub async fn wait_clickable(&self, timeout: Duration) -> Result<&Self> {
        self.wait_for_flag(timeout, "clickable", || self.element.is_clickable())
            .await
    }

    async fn wait_for_flag<F, Fut>(&self, timeout: Duration, what: &str, mut flag: F) -> Result<&Self>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let outcome = wait_until(
            || {
                let probe = flag();
                async move {
                    match probe.await {
                        Err(e) if e.is_not_found() || e.is_not_interactable() => Ok(false),
                        other => other,
                    }
                }
            },
            Equals(true),
            timeout,
            ELEMENT_POLL,
        )
        .await?;

        match outcome {
            PollResult::Satisfied(_) => Ok(self),
            PollResult::TimedOut { .. } => Err(Error::Timeout(format!(
                "{} element not {}",
                self.describe(),
                what
            ))),
        }
    }

    // ---- pointer ----

    pub async fn click(&self) -> Result<&Self> {
        debug!(element = %self.describe(), "click");
        self.element.click().await?;
        Ok(self)
    }

    /// Wait `delay`, then click.
    pub async fn click_after(&self, delay: Duration) -> Result<&Self> {
        sleep(delay).await;
        self.click().await
    }

    /// Click through `HTMLElement.click()`, bypassing hit testing.
    pub async fn js_click(&self) -> Result<&Self> {
        debug!(element = %self.describe(), "js click");
        self.run_script("arguments[0].click();").await
    }

    pub async fn double_click(&self) -> Result<&Self> {
        self.gestures(vec![self.move_to(0, 0), Gesture::DoubleClick])
            .await
    }

    pub async fn right_click(&self) -> Result<&Self> {
        self.gestures(vec![self.move_to(0, 0), Gesture::Click(MouseButton::Right)])
            .await
    }

    /// Left click at `(x, y)` from the element's center.
    pub async fn offset_click(&self, x: i64, y: i64) -> Result<&Self> {
        self.gestures(vec![self.move_to(x, y), Gesture::Click(MouseButton::Left)])
            .await
    }

    /// Press on the element, drag by `(x, y)`, release.
    pub async fn slide(&self, x: i64, y: i64) -> Result<&Self> {
        self.gestures(vec![
            self.move_to(0, 0),
            Gesture::Press(MouseButton::Left),
            Gesture::MoveBy { x, y },
            Gesture::Release(MouseButton::Left),
        ])
        .await
    }

    /// Hover, then click.
    pub async fn focus(&self) -> Result<&Self> {
        self.hover().await?;
        self.click().await
    }

    pub async fn hover(&self) -> Result<&Self> {
        self.gestures(vec![self.move_to(0, 0)]).await
    }

    /// Scroll the element to the vertical center of the viewport.
    pub async fn scroll(&self) -> Result<&Self> {
        self.run_script("arguments[0].scrollIntoView({block: 'center'});")
            .await
    }

    /// Scroll the element to the top of the viewport.
    pub async fn scroll_into_view(&self) -> Result<&Self> {
        self.run_script("arguments[0].scrollIntoView(true);").await
    }

    // ---- keyboard ----

    pub async fn send_keys(&self, text: &str) -> Result<&Self> {
        debug!(element = %self.describe(), len = text.len(), "send_keys");
        self.element.send_keys(text).await?;
        Ok(self)
    }

    /// Type one character at a time, pausing `delay` after each.
    pub async fn send_keys_slowly(&self, text: &str, delay: Duration) -> Result<&Self> {
        debug!(element = %self.describe(), len = text.len(), ?delay, "send_keys slowly");
        let mut buf = [0u8; 4];
        for c in text.chars() {
            self.element.send_keys(c.encode_utf8(&mut buf)).await?;
            sleep(delay).await;
        }
        Ok(self)
    }

    /// Type through the action chain into whatever has focus.
    pub async fn type_keys(&self, text: &str) -> Result<&Self> {
        self.gestures(vec![Gesture::Type(text.to_string())]).await
    }

    /// Ctrl + `key` (e.g. `'a'` to select all).
    pub async fn control_shortcut(&self, key: char) -> Result<&Self> {
        self.gestures(vec![
            Gesture::KeyDown(keys::CONTROL),
            Gesture::KeyDown(key),
            Gesture::KeyUp(key),
            Gesture::KeyUp(keys::CONTROL),
        ])
        .await
    }

    pub fn as_dropdown(&self) -> Dropdown<D> {
        Dropdown::new(self.clone())
    }

    fn move_to(&self, x: i64, y: i64) -> Gesture<D::Element> {
        Gesture::MoveTo {
            element: self.element.clone(),
            x,
            y,
        }
    }

    async fn gestures(&self, chain: Vec<Gesture<D::Element>>) -> Result<&Self> {
        if let Some(first) = chain.first() {
            debug!(element = %self.describe(), first = first.name(), steps = chain.len(), "perform");
        }
        self.driver.perform(chain).await?;
        Ok(self)
    }

    async fn run_script(&self, script: &str) -> Result<&Self> {
        self.driver
            .execute_script(script, vec![self.element.to_script_arg()])
            .await?;
        Ok(self)
    }

    // ---- forwarded ----

    // Each forwarded op goes through the helper for its `Returns` policy.

    async fn forward<T>(&self, op: Forwarded, call: impl Future<Output = Result<T>>) -> Result<T> {
        debug_assert_eq!(op.returns(), Returns::Value, "{} is not a value op", op.name());
        trace!(element = %self.describe(), op = op.name(), "forward");
        call.await
    }

    async fn forward_rewrapped(
        &self,
        op: Forwarded,
        call: impl Future<Output = Result<D::Element>>,
        locator: Locator,
    ) -> Result<Self> {
        debug_assert_eq!(op.returns(), Returns::Rewrapped, "{} does not rewrap", op.name());
        trace!(element = %self.describe(), op = op.name(), "forward");
        Ok(self.rewrap(call.await?, locator))
    }

    async fn forward_chained(
        &self,
        op: Forwarded,
        call: impl Future<Output = Result<()>>,
    ) -> Result<&Self> {
        debug_assert_eq!(op.returns(), Returns::Wrapper, "{} does not chain", op.name());
        trace!(element = %self.describe(), op = op.name(), "forward");
        call.await?;
        Ok(self)
    }

    pub async fn text(&self) -> Result<String> {
        self.forward(Forwarded::Text, self.element.text()).await
    }

    pub async fn tag_name(&self) -> Result<String> {
        self.forward(Forwarded::TagName, self.element.tag_name()).await
    }

    pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.forward(Forwarded::Attribute, self.element.attribute(name)).await
    }

    pub async fn property(&self, name: &str) -> Result<Option<String>> {
        self.forward(Forwarded::Property, self.element.property(name)).await
    }

    pub async fn css_value(&self, name: &str) -> Result<String> {
        self.forward(Forwarded::CssValue, self.element.css_value(name)).await
    }

    pub async fn is_displayed(&self) -> Result<bool> {
        self.forward(Forwarded::IsDisplayed, self.element.is_displayed()).await
    }

    pub async fn is_enabled(&self) -> Result<bool> {
        self.forward(Forwarded::IsEnabled, self.element.is_enabled()).await
    }

    pub async fn is_selected(&self) -> Result<bool> {
        self.forward(Forwarded::IsSelected, self.element.is_selected()).await
    }

    pub async fn rect(&self) -> Result<Rect> {
        self.forward(Forwarded::Rect, self.element.rect()).await
    }

    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        self.forward(Forwarded::Screenshot, self.element.screenshot()).await
    }

    /// The enclosing element, wrapped with locator `(xpath, "..")`.
    pub async fn parent(&self) -> Result<Self> {
        self.forward_rewrapped(Forwarded::Parent, self.element.parent(), Locator::xpath(".."))
            .await
    }

    pub async fn clear(&self) -> Result<&Self> {
        self.forward_chained(Forwarded::Clear, self.element.clear()).await
    }

    pub async fn submit(&self) -> Result<&Self> {
        self.forward_chained(Forwarded::Submit, self.element.submit()).await
    }
}
