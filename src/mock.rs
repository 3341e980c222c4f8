//! In-memory driver for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::driver::{Driver, ElementHandle, Gesture, Rect, WindowHandle};
use crate::network::LogEntry;
use crate::{Error, Locator, Result};

/// A fake DOM node.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub tag: String,
    pub text: String,
    pub attributes: HashMap<String, String>,
    pub css: HashMap<String, String>,
    pub displayed: bool,
    pub enabled: bool,
    pub selected: bool,
    pub covered: bool,
    pub stale: bool,
    pub value: String,
    pub options: Vec<(String, String)>,
    pub selected_option: Option<usize>,
    pub parent: Option<String>,
    pub rect: Rect,
    pub clicks: usize,
    pub cleared: usize,
    pub submitted: usize,
}

impl Node {
    pub fn new(tag: &str) -> Self {
        Node {
            tag: tag.into(),
            displayed: true,
            enabled: true,
            rect: Rect {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 20.0,
            },
            ..Default::default()
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.into();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn covered(mut self) -> Self {
        self.covered = true;
        self
    }

    /// `(value, text)` pairs for a `<select>`.
    pub fn options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .map(|(v, t)| (v.to_string(), t.to_string()))
            .collect();
        self
    }
}

#[derive(Debug, Default)]
pub struct State {
    nodes: HashMap<String, Node>,
    roots: HashMap<Locator, Vec<String>>,
    children: HashMap<(String, Locator), Vec<String>>,
    hidden_lookups: HashMap<Locator, usize>,
    lookups: HashMap<Locator, usize>,
    next_id: usize,
    active: Option<String>,
    pub frame_depth: usize,
    pub fail_parent_frame: bool,
    pub fail_windows: bool,
    pub windows: Vec<WindowHandle>,
    pub current_window: Option<WindowHandle>,
    pub history: Vec<String>,
    pub position: usize,
    pub title: String,
    pub refreshes: usize,
    pub scripts: Vec<(String, Vec<Value>)>,
    pub gestures: Vec<Gesture<String>>,
    pub logs: HashMap<String, Vec<LogEntry>>,
    pub quit: bool,
}

impl State {
    fn node(&self, id: &str) -> Result<&Node> {
        match self.nodes.get(id) {
            Some(n) if n.stale => Err(Error::Stale(id.into())),
            Some(n) => Ok(n),
            None => Err(Error::NotFound(id.into())),
        }
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut Node> {
        match self.nodes.get_mut(id) {
            Some(n) if n.stale => Err(Error::Stale(id.into())),
            Some(n) => Ok(n),
            None => Err(Error::NotFound(id.into())),
        }
    }

    fn insert(&mut self, node: Node) -> String {
        self.next_id += 1;
        let id = format!("node-{}", self.next_id);
        self.nodes.insert(id.clone(), node);
        id
    }

    fn roots_for(&mut self, locator: &Locator) -> Vec<String> {
        *self.lookups.entry(locator.clone()).or_default() += 1;
        if let Some(remaining) = self.hidden_lookups.get_mut(locator) {
            if *remaining > 0 {
                *remaining -= 1;
                return Vec::new();
            }
        }
        self.roots.get(locator).cloned().unwrap_or_default()
    }
}

#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<State>>,
}

impl std::fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MockDriver")
    }
}

impl MockDriver {
    pub fn new() -> Self {
        let driver = Self::default();
        {
            let mut s = driver.state();
            let main = WindowHandle::from("main");
            s.windows = vec![main.clone()];
            s.current_window = Some(main);
        }
        driver
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn same_session(&self, other: &MockDriver) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Register a top-level element reachable through `locator`.
    pub fn add(&self, locator: Locator, node: Node) -> String {
        let mut s = self.state();
        let id = s.insert(node);
        s.roots.entry(locator).or_default().push(id.clone());
        id
    }

    /// Register an element under `parent`, reachable from it through `locator`.
    pub fn add_child(&self, parent: &str, locator: Locator, node: Node) -> String {
        let mut s = self.state();
        let id = s.insert(Node {
            parent: Some(parent.to_string()),
            ..node
        });
        s.children
            .entry((parent.to_string(), locator))
            .or_default()
            .push(id.clone());
        id
    }

    /// The next `lookups` searches for `locator` find nothing.
    pub fn reveal_after(&self, locator: &Locator, lookups: usize) {
        self.state().hidden_lookups.insert(locator.clone(), lookups);
    }

    pub fn lookups(&self, locator: &Locator) -> usize {
        self.state().lookups.get(locator).copied().unwrap_or(0)
    }

    pub fn node(&self, id: &str) -> Node {
        self.state().nodes[id].clone()
    }

    pub fn update(&self, id: &str, f: impl FnOnce(&mut Node)) {
        let mut s = self.state();
        if let Some(n) = s.nodes.get_mut(id) {
            f(n);
        }
    }

    pub fn set_displayed(&self, id: &str, displayed: bool) {
        self.update(id, |n| n.displayed = displayed);
    }

    pub fn make_stale(&self, id: &str) {
        self.update(id, |n| n.stale = true);
    }

    pub fn set_active(&self, id: &str) {
        self.state().active = Some(id.to_string());
    }

    pub fn push_log(&self, log_type: &str, message: Value) {
        self.state()
            .logs
            .entry(log_type.to_string())
            .or_default()
            .push(LogEntry {
                level: "INFO".into(),
                message: message.to_string(),
                timestamp: 0,
            });
    }

    /// Raw handle for a registered node.
    pub fn handle(&self, id: &str) -> MockElement {
        self.element(id.to_string())
    }

    fn element(&self, id: String) -> MockElement {
        MockElement {
            id,
            state: self.state.clone(),
        }
    }
}

#[async_trait]
impl Driver for MockDriver {
    type Element = MockElement;

    async fn find_element(&self, locator: &Locator) -> Result<MockElement> {
        let ids = self.state().roots_for(locator);
        ids.into_iter()
            .next()
            .map(|id| self.element(id))
            .ok_or_else(|| Error::NotFound(locator.to_string()))
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<MockElement>> {
        let ids = self.state().roots_for(locator);
        Ok(ids.into_iter().map(|id| self.element(id)).collect())
    }

    async fn active_element(&self) -> Result<MockElement> {
        let active = self.state().active.clone();
        active
            .map(|id| self.element(id))
            .ok_or_else(|| Error::NotFound("active element".into()))
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        let mut s = self.state();
        if script.contains("window.open") {
            let handle = WindowHandle(format!("tab-{}", s.windows.len()));
            s.windows.push(handle);
        }
        s.scripts.push((script.to_string(), args));
        Ok(Value::Null)
    }

    async fn perform(&self, gestures: Vec<Gesture<MockElement>>) -> Result<()> {
        let mut s = self.state();
        for g in gestures {
            let recorded = match g {
                Gesture::MoveTo { element, x, y } => {
                    s.node(&element.id)?;
                    Gesture::MoveTo {
                        element: element.id,
                        x,
                        y,
                    }
                }
                Gesture::MoveBy { x, y } => Gesture::MoveBy { x, y },
                Gesture::Press(b) => Gesture::Press(b),
                Gesture::Release(b) => Gesture::Release(b),
                Gesture::Click(b) => Gesture::Click(b),
                Gesture::DoubleClick => Gesture::DoubleClick,
                Gesture::KeyDown(c) => Gesture::KeyDown(c),
                Gesture::KeyUp(c) => Gesture::KeyUp(c),
                Gesture::Type(text) => Gesture::Type(text),
            };
            s.gestures.push(recorded);
        }
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        let mut s = self.state();
        let keep = if s.history.is_empty() { 0 } else { s.position + 1 };
        s.history.truncate(keep);
        s.history.push(url.to_string());
        s.position = s.history.len() - 1;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let s = self.state();
        Ok(s.history.get(s.position).cloned().unwrap_or_default())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.state().title.clone())
    }

    async fn back(&self) -> Result<()> {
        let mut s = self.state();
        s.position = s.position.saturating_sub(1);
        Ok(())
    }

    async fn forward(&self) -> Result<()> {
        let mut s = self.state();
        if s.position + 1 < s.history.len() {
            s.position += 1;
        }
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        self.state().refreshes += 1;
        Ok(())
    }

    async fn window_handles(&self) -> Result<Vec<WindowHandle>> {
        let s = self.state();
        if s.fail_windows || s.quit {
            return Err(Error::Driver("invalid session id".into()));
        }
        Ok(s.windows.clone())
    }

    async fn switch_to_window(&self, handle: &WindowHandle) -> Result<()> {
        let mut s = self.state();
        if !s.windows.contains(handle) {
            return Err(Error::Driver(format!("no such window: {handle}")));
        }
        s.current_window = Some(handle.clone());
        Ok(())
    }

    async fn switch_to_frame(&self, frame: &MockElement) -> Result<()> {
        let mut s = self.state();
        s.node(&frame.id)?;
        s.frame_depth += 1;
        Ok(())
    }

    async fn switch_to_parent_frame(&self) -> Result<()> {
        let mut s = self.state();
        if s.fail_parent_frame {
            return Err(Error::Driver("cannot reach parent frame".into()));
        }
        s.frame_depth = s.frame_depth.saturating_sub(1);
        Ok(())
    }

    async fn log_entries(&self, log_type: &str) -> Result<Vec<LogEntry>> {
        Ok(self.state().logs.get(log_type).cloned().unwrap_or_default())
    }

    async fn quit(&self) -> Result<()> {
        self.state().quit = true;
        Ok(())
    }
}

#[derive(Clone)]
pub struct MockElement {
    pub id: String,
    state: Arc<Mutex<State>>,
}

impl std::fmt::Debug for MockElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockElement({})", self.id)
    }
}

impl MockElement {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn sibling(&self, id: String) -> MockElement {
        MockElement {
            id,
            state: self.state.clone(),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Node) -> T) -> Result<T> {
        let s = self.state();
        s.node(&self.id).map(f)
    }

    fn interact(&self, f: impl FnOnce(&mut Node)) -> Result<()> {
        let mut s = self.state();
        let node = s.node_mut(&self.id)?;
        if !node.displayed || !node.enabled {
            return Err(Error::NotInteractable(self.id.clone()));
        }
        f(node);
        Ok(())
    }

    fn select(&self, pick: impl FnOnce(&[(String, String)]) -> Option<usize>) -> Result<()> {
        let mut s = self.state();
        let node = s.node_mut(&self.id)?;
        if node.tag != "select" {
            return Err(Error::InvalidArgument(format!("{} is not a select", self.id)));
        }
        let index = pick(&node.options)
            .ok_or_else(|| Error::NotFound(format!("option in {}", self.id)))?;
        node.selected_option = Some(index);
        Ok(())
    }
}

#[async_trait]
impl ElementHandle for MockElement {
    async fn find_element(&self, locator: &Locator) -> Result<MockElement> {
        let mut s = self.state();
        s.node(&self.id)?;
        *s.lookups.entry(locator.clone()).or_default() += 1;
        s.children
            .get(&(self.id.clone(), locator.clone()))
            .and_then(|ids| ids.first().cloned())
            .map(|id| self.sibling(id))
            .ok_or_else(|| Error::NotFound(locator.to_string()))
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<MockElement>> {
        let s = self.state();
        s.node(&self.id)?;
        Ok(s.children
            .get(&(self.id.clone(), locator.clone()))
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|id| self.sibling(id))
            .collect())
    }

    async fn parent(&self) -> Result<MockElement> {
        let parent = self.read(|n| n.parent.clone())?;
        parent
            .map(|id| self.sibling(id))
            .ok_or_else(|| Error::NotFound(format!("parent of {}", self.id)))
    }

    async fn click(&self) -> Result<()> {
        let covered = self.read(|n| n.covered)?;
        if covered {
            return Err(Error::NotInteractable(format!("{} click intercepted", self.id)));
        }
        self.interact(|n| n.clicks += 1)
    }

    async fn send_keys(&self, text: &str) -> Result<()> {
        self.interact(|n| n.value.push_str(text))
    }

    async fn clear(&self) -> Result<()> {
        self.interact(|n| {
            n.value.clear();
            n.cleared += 1;
        })
    }

    async fn submit(&self) -> Result<()> {
        let mut s = self.state();
        s.node_mut(&self.id)?.submitted += 1;
        Ok(())
    }

    async fn text(&self) -> Result<String> {
        self.read(|n| n.text.clone())
    }

    async fn tag_name(&self) -> Result<String> {
        self.read(|n| n.tag.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.read(|n| n.attributes.get(name).cloned())
    }

    async fn property(&self, name: &str) -> Result<Option<String>> {
        self.read(|n| match name {
            "value" => Some(n.value.clone()),
            _ => n.attributes.get(name).cloned(),
        })
    }

    async fn css_value(&self, name: &str) -> Result<String> {
        self.read(|n| n.css.get(name).cloned().unwrap_or_default())
    }

    async fn is_displayed(&self) -> Result<bool> {
        self.read(|n| n.displayed)
    }

    async fn is_enabled(&self) -> Result<bool> {
        self.read(|n| n.enabled)
    }

    async fn is_selected(&self) -> Result<bool> {
        self.read(|n| n.selected)
    }

    async fn is_clickable(&self) -> Result<bool> {
        self.read(|n| n.displayed && n.enabled && !n.covered)
    }

    async fn rect(&self) -> Result<Rect> {
        self.read(|n| n.rect)
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.read(|_| b"\x89PNG\r\n\x1a\n".to_vec())
    }

    async fn select_by_value(&self, value: &str) -> Result<()> {
        self.select(|opts| opts.iter().position(|(v, _)| v == value))
    }

    async fn select_by_index(&self, index: usize) -> Result<()> {
        self.select(|opts| (index < opts.len()).then_some(index))
    }

    async fn select_by_text(&self, text: &str) -> Result<()> {
        self.select(|opts| opts.iter().position(|(_, t)| t == text))
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn to_script_arg(&self) -> Value {
        json!({ "element-6066-11e4-a52e-4f735466cecf": self.id })
    }
}
