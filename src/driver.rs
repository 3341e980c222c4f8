//! The browser driver seam.
//!
//! Everything above this module talks to the browser only through [`Driver`]
//! and [`ElementHandle`]. The wire protocol behind them is the backend's
//! business; [`crate::webdriver`] provides one over fantoccini.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::network::LogEntry;
use crate::{Locator, Result};

/// Opaque identifier of a browser window or tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub String);

impl WindowHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WindowHandle {
    fn from(s: &str) -> Self {
        WindowHandle(s.to_string())
    }
}

/// Element position and size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

/// One step of an action chain.
#[derive(Debug, Clone)]
pub enum Gesture<E> {
    /// Move the pointer to the element's center, shifted by `(x, y)`.
    MoveTo { element: E, x: i64, y: i64 },
    /// Move the pointer relative to where it is.
    MoveBy { x: i64, y: i64 },
    Press(MouseButton),
    Release(MouseButton),
    Click(MouseButton),
    DoubleClick,
    KeyDown(char),
    KeyUp(char),
    /// Type into whatever has focus.
    Type(String),
}

impl<E> Gesture<E> {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Gesture::MoveTo { .. } => "move_to",
            Gesture::MoveBy { .. } => "move_by",
            Gesture::Press(_) => "press",
            Gesture::Release(_) => "release",
            Gesture::Click(_) => "click",
            Gesture::DoubleClick => "double_click",
            Gesture::KeyDown(_) => "key_down",
            Gesture::KeyUp(_) => "key_up",
            Gesture::Type(_) => "type",
        }
    }

    pub fn is_keyboard(&self) -> bool {
        matches!(
            self,
            Gesture::KeyDown(_) | Gesture::KeyUp(_) | Gesture::Type(_)
        )
    }
}

/// A browser session.
///
/// Implementations are cheap handles: cloning shares the same session.
#[async_trait]
pub trait Driver: Clone + Send + Sync + 'static {
    type Element: ElementHandle;

    async fn find_element(&self, locator: &Locator) -> Result<Self::Element>;

    /// All matches; an empty list is not an error.
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Self::Element>>;

    /// The element that currently has focus.
    async fn active_element(&self) -> Result<Self::Element>;

    /// Run `script` with `args` bound to `arguments[..]`.
    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value>;

    /// Perform an action chain in order.
    async fn perform(&self, gestures: Vec<Gesture<Self::Element>>) -> Result<()>;

    async fn goto(&self, url: &str) -> Result<()>;
    async fn current_url(&self) -> Result<String>;
    async fn title(&self) -> Result<String>;
    async fn back(&self) -> Result<()>;
    async fn forward(&self) -> Result<()>;
    async fn refresh(&self) -> Result<()>;

    async fn window_handles(&self) -> Result<Vec<WindowHandle>>;
    async fn switch_to_window(&self, handle: &WindowHandle) -> Result<()>;

    async fn switch_to_frame(&self, frame: &Self::Element) -> Result<()>;
    async fn switch_to_parent_frame(&self) -> Result<()>;

    /// Driver log records of the given type (e.g. `"performance"`).
    async fn log_entries(&self, log_type: &str) -> Result<Vec<LogEntry>>;

    async fn quit(&self) -> Result<()>;
}

/// A raw element reference owned by a [`Driver`].
#[async_trait]
pub trait ElementHandle: Clone + Send + Sync + 'static {
    async fn find_element(&self, locator: &Locator) -> Result<Self>;
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Self>>;

    /// The enclosing element.
    async fn parent(&self) -> Result<Self>;

    async fn click(&self) -> Result<()>;
    async fn send_keys(&self, text: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
    async fn submit(&self) -> Result<()>;

    async fn text(&self) -> Result<String>;
    async fn tag_name(&self) -> Result<String>;
    async fn attribute(&self, name: &str) -> Result<Option<String>>;
    async fn property(&self, name: &str) -> Result<Option<String>>;
    async fn css_value(&self, name: &str) -> Result<String>;

    async fn is_displayed(&self) -> Result<bool>;
    async fn is_enabled(&self) -> Result<bool>;
    async fn is_selected(&self) -> Result<bool>;

    /// Visible, enabled and not covered at its click point. Backends that
    /// cannot see occlusion fall back to visible and enabled.
    async fn is_clickable(&self) -> Result<bool> {
        Ok(self.is_displayed().await? && self.is_enabled().await?)
    }

    async fn rect(&self) -> Result<Rect>;

    /// PNG bytes of the element.
    async fn screenshot(&self) -> Result<Vec<u8>>;

    async fn select_by_value(&self, value: &str) -> Result<()>;
    async fn select_by_index(&self, index: usize) -> Result<()>;
    async fn select_by_text(&self, text: &str) -> Result<()>;

    /// Backend element id.
    fn id(&self) -> String;

    /// JSON form for passing the element into `execute_script`.
    fn to_script_arg(&self) -> Value;
}
