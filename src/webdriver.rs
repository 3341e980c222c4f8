//! WebDriver backend over fantoccini.
//!
//! ```rust,no_run
//! use pagebase::{BasePage, WebDriverSession};
//!
//! # #[tokio::main]
//! # async fn main() -> pagebase::Result<()> {
//! let session = WebDriverSession::connect("http://localhost:9515").await?;
//! let page = BasePage::new(session);
//! page.navigate_url("https://example.com").await?;
//! page.quit_driver().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::wd::{Capabilities, WebDriverCompatibleCommand};
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::driver::{Driver, ElementHandle, Gesture, MouseButton, Rect, WindowHandle};
use crate::network::LogEntry;
use crate::{Error, Locator, Result, Strategy};

/// W3C element reference key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

// Hit test at the element's center, after scrolling it into view the way
// an element click does.
const NOT_COVERED_JS: &str = r#"
const el = arguments[0];
el.scrollIntoView({ block: 'center', inline: 'center' });
const r = el.getBoundingClientRect();
const hit = document.elementFromPoint(r.left + r.width / 2, r.top + r.height / 2);
return hit !== null && (hit === el || el.contains(hit));
"#;

const SUBMIT_JS: &str = r#"
const el = arguments[0];
const form = el.tagName === 'FORM' ? el : el.form || el.closest('form');
if (!form) { throw new Error('element is not in a form'); }
if (form.requestSubmit) { form.requestSubmit(); } else { form.submit(); }
"#;

impl From<CmdError> for Error {
    fn from(e: CmdError) -> Self {
        if e.is_no_such_element() {
            return Error::NotFound(e.to_string());
        }
        match &e {
            CmdError::Standard(wd) => match wd.error {
                ErrorStatus::NoSuchElement => Error::NotFound(e.to_string()),
                ErrorStatus::StaleElementReference => Error::Stale(e.to_string()),
                ErrorStatus::ElementNotInteractable | ErrorStatus::ElementClickIntercepted => {
                    Error::NotInteractable(e.to_string())
                }
                ErrorStatus::JavascriptError => Error::Script(e.to_string()),
                _ => Error::Driver(e.to_string()),
            },
            _ => Error::Driver(e.to_string()),
        }
    }
}

fn native(strategy: Strategy, selector: &str) -> fantoccini::Locator<'_> {
    match strategy {
        Strategy::Id => fantoccini::Locator::Id(selector),
        Strategy::XPath => fantoccini::Locator::XPath(selector),
        Strategy::LinkText => fantoccini::Locator::LinkText(selector),
        _ => fantoccini::Locator::Css(selector),
    }
}

/// A WebDriver session.
#[derive(Clone, Debug)]
pub struct WebDriverSession {
    client: Client,
}

impl WebDriverSession {
    /// Start a session on the WebDriver server at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with(url, Capabilities::new()).await
    }

    /// Start a session requesting `capabilities`, e.g.
    /// `goog:loggingPrefs` for [`crate::BasePage::filter_network_requests`].
    pub async fn connect_with(url: &str, capabilities: Capabilities) -> Result<Self> {
        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(url)
            .await
            .map_err(|e| Error::Driver(format!("failed to connect to {url}: {e}")))?;
        info!(url, "webdriver session started");
        Ok(Self { client })
    }

    /// Wrap an existing fantoccini client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn element(&self, inner: Element) -> RemoteElement {
        RemoteElement {
            client: self.client.clone(),
            inner,
        }
    }
}

#[async_trait]
impl Driver for WebDriverSession {
    type Element = RemoteElement;

    async fn find_element(&self, locator: &Locator) -> Result<RemoteElement> {
        let (strategy, selector) = locator.to_native();
        let found = self.client.find(native(strategy, &selector)).await?;
        Ok(self.element(found))
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<RemoteElement>> {
        let (strategy, selector) = locator.to_native();
        let found = self.client.find_all(native(strategy, &selector)).await?;
        Ok(found.into_iter().map(|e| self.element(e)).collect())
    }

    async fn active_element(&self) -> Result<RemoteElement> {
        let el = self.client.active_element().await?;
        Ok(self.element(el))
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        Ok(self.client.execute(script, args).await?)
    }

    async fn perform(&self, gestures: Vec<Gesture<RemoteElement>>) -> Result<()> {
        let cmd = PerformActions::from_gestures(&gestures)?;
        debug!(ticks = cmd.ticks, "perform actions");
        self.client.issue_cmd(cmd).await?;
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        Ok(self.client.goto(url).await?)
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.client.title().await?)
    }

    async fn back(&self) -> Result<()> {
        Ok(self.client.back().await?)
    }

    async fn forward(&self) -> Result<()> {
        Ok(self.client.forward().await?)
    }

    async fn refresh(&self) -> Result<()> {
        Ok(self.client.refresh().await?)
    }

    async fn window_handles(&self) -> Result<Vec<WindowHandle>> {
        let handles = self.client.windows().await?;
        Ok(handles
            .into_iter()
            .map(|h| WindowHandle(String::from(h)))
            .collect())
    }

    async fn switch_to_window(&self, handle: &WindowHandle) -> Result<()> {
        let native = fantoccini::wd::WindowHandle::try_from(handle.0.clone())
            .map_err(|e| Error::InvalidArgument(format!("window handle {handle}: {e}")))?;
        Ok(self.client.switch_to_window(native).await?)
    }

    async fn switch_to_frame(&self, frame: &RemoteElement) -> Result<()> {
        Ok(frame.inner.enter_frame().await?)
    }

    async fn switch_to_parent_frame(&self) -> Result<()> {
        Ok(self.client.enter_parent_frame().await?)
    }

    async fn log_entries(&self, log_type: &str) -> Result<Vec<LogEntry>> {
        let raw = self
            .client
            .issue_cmd(GetLog {
                log_type: log_type.to_string(),
            })
            .await?;
        Ok(serde_json::from_value(raw)?)
    }

    async fn quit(&self) -> Result<()> {
        self.client.clone().close().await?;
        info!("webdriver session closed");
        Ok(())
    }
}

/// An element in a [`WebDriverSession`].
#[derive(Clone, Debug)]
pub struct RemoteElement {
    client: Client,
    inner: Element,
}

impl RemoteElement {
    pub fn inner(&self) -> &Element {
        &self.inner
    }

    fn wrap(&self, inner: Element) -> Self {
        Self {
            client: self.client.clone(),
            inner,
        }
    }

    async fn script(&self, script: &str) -> Result<Value> {
        Ok(self
            .client
            .execute(script, vec![self.to_script_arg()])
            .await?)
    }
}

#[async_trait]
impl ElementHandle for RemoteElement {
    async fn find_element(&self, locator: &Locator) -> Result<Self> {
        let (strategy, selector) = locator.to_native();
        let found = self.inner.find(native(strategy, &selector)).await?;
        Ok(self.wrap(found))
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Self>> {
        let (strategy, selector) = locator.to_native();
        let found = self.inner.find_all(native(strategy, &selector)).await?;
        Ok(found.into_iter().map(|e| self.wrap(e)).collect())
    }

    async fn parent(&self) -> Result<Self> {
        let found = self.inner.find(fantoccini::Locator::XPath("..")).await?;
        Ok(self.wrap(found))
    }

    async fn click(&self) -> Result<()> {
        Ok(self.inner.click().await?)
    }

    async fn send_keys(&self, text: &str) -> Result<()> {
        Ok(self.inner.send_keys(text).await?)
    }

    async fn clear(&self) -> Result<()> {
        Ok(self.inner.clear().await?)
    }

    async fn submit(&self) -> Result<()> {
        self.script(SUBMIT_JS).await?;
        Ok(())
    }

    async fn text(&self) -> Result<String> {
        Ok(self.inner.text().await?)
    }

    async fn tag_name(&self) -> Result<String> {
        Ok(self.inner.tag_name().await?)
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.inner.attr(name).await?)
    }

    async fn property(&self, name: &str) -> Result<Option<String>> {
        Ok(self.inner.prop(name).await?)
    }

    async fn css_value(&self, name: &str) -> Result<String> {
        Ok(self.inner.css_value(name).await?)
    }

    async fn is_displayed(&self) -> Result<bool> {
        Ok(self.inner.is_displayed().await?)
    }

    async fn is_enabled(&self) -> Result<bool> {
        Ok(self.inner.is_enabled().await?)
    }

    async fn is_selected(&self) -> Result<bool> {
        Ok(self.inner.is_selected().await?)
    }

    async fn is_clickable(&self) -> Result<bool> {
        if !(self.inner.is_displayed().await? && self.inner.is_enabled().await?) {
            return Ok(false);
        }
        Ok(self.script(NOT_COVERED_JS).await?.as_bool().unwrap_or(false))
    }

    async fn rect(&self) -> Result<Rect> {
        let (x, y, width, height) = self.inner.rectangle().await?;
        Ok(Rect {
            x,
            y,
            width,
            height,
        })
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(self.inner.screenshot().await?)
    }

    async fn select_by_value(&self, value: &str) -> Result<()> {
        Ok(self.inner.select_by_value(value).await?)
    }

    async fn select_by_index(&self, index: usize) -> Result<()> {
        Ok(self.inner.select_by_index(index).await?)
    }

    async fn select_by_text(&self, text: &str) -> Result<()> {
        Ok(self.inner.select_by_label(text).await?)
    }

    fn id(&self) -> String {
        self.to_script_arg()
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn to_script_arg(&self) -> Value {
        serde_json::to_value(&self.inner).unwrap_or(Value::Null)
    }
}

/// `POST /session/{id}/se/log`, the Selenium log endpoint chromedriver serves.
#[derive(Debug)]
struct GetLog {
    log_type: String,
}

impl WebDriverCompatibleCommand for GetLog {
    fn endpoint(
        &self,
        base_url: &url::Url,
        session_id: Option<&str>,
    ) -> std::result::Result<url::Url, url::ParseError> {
        base_url.join(&format!("session/{}/se/log", session_id.unwrap_or_default()))
    }

    fn method_and_body(&self, _request_url: &url::Url) -> (http::Method, Option<String>) {
        (
            http::Method::POST,
            Some(json!({ "type": self.log_type }).to_string()),
        )
    }
}

/// `POST /session/{id}/actions` with one mouse and one keyboard source.
///
/// Every gesture step takes one tick on both sources; the idle source pauses,
/// so steps run strictly in order.
#[derive(Debug)]
struct PerformActions {
    body: Value,
    ticks: usize,
}

impl PerformActions {
    fn from_gestures(gestures: &[Gesture<RemoteElement>]) -> Result<Self> {
        let mut t = Ticks::default();

        for gesture in gestures {
            match gesture {
                Gesture::MoveTo { element, x, y } => {
                    let origin = element.to_script_arg();
                    if origin.is_null() {
                        return Err(Error::InvalidArgument("element has no reference".into()));
                    }
                    t.pointer(json!({
                        "type": "pointerMove", "duration": 100, "origin": origin, "x": x, "y": y
                    }));
                }
                Gesture::MoveBy { x, y } => t.pointer(json!({
                    "type": "pointerMove", "duration": 100, "origin": "pointer", "x": x, "y": y
                })),
                Gesture::Press(b) => t.pointer(button("pointerDown", *b)),
                Gesture::Release(b) => t.pointer(button("pointerUp", *b)),
                Gesture::Click(b) => t.click(*b),
                Gesture::DoubleClick => {
                    t.click(MouseButton::Left);
                    t.click(MouseButton::Left);
                }
                Gesture::KeyDown(c) => t.key("keyDown", *c),
                Gesture::KeyUp(c) => t.key("keyUp", *c),
                Gesture::Type(text) => {
                    for c in text.chars() {
                        t.key("keyDown", c);
                        t.key("keyUp", c);
                    }
                }
            }
        }

        let ticks = t.mouse.len();
        let body = json!({
            "actions": [
                {
                    "type": "pointer",
                    "id": "mouse",
                    "parameters": { "pointerType": "mouse" },
                    "actions": t.mouse,
                },
                {
                    "type": "key",
                    "id": "keyboard",
                    "actions": t.keyboard,
                },
            ]
        });
        Ok(Self { body, ticks })
    }
}

#[derive(Default)]
struct Ticks {
    mouse: Vec<Value>,
    keyboard: Vec<Value>,
}

impl Ticks {
    fn pointer(&mut self, action: Value) {
        self.mouse.push(action);
        self.keyboard.push(pause());
    }

    fn click(&mut self, b: MouseButton) {
        self.pointer(button("pointerDown", b));
        self.pointer(button("pointerUp", b));
    }

    fn key(&mut self, kind: &str, c: char) {
        self.mouse.push(pause());
        self.keyboard.push(json!({ "type": kind, "value": c.to_string() }));
    }
}

fn pause() -> Value {
    json!({ "type": "pause", "duration": 0 })
}

fn button(kind: &str, b: MouseButton) -> Value {
    let button = match b {
        MouseButton::Left => 0,
        MouseButton::Right => 2,
    };
    json!({ "type": kind, "button": button })
}

impl WebDriverCompatibleCommand for PerformActions {
    fn endpoint(
        &self,
        base_url: &url::Url,
        session_id: Option<&str>,
    ) -> std::result::Result<url::Url, url::ParseError> {
        base_url.join(&format!("session/{}/actions", session_id.unwrap_or_default()))
    }

    fn method_and_body(&self, _request_url: &url::Url) -> (http::Method, Option<String>) {
        (http::Method::POST, Some(self.body.to_string()))
    }
}
