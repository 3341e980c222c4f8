//! Element locators: a lookup strategy plus a selector string.

use std::fmt;

/// How a selector is interpreted by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Id,
    Css,
    XPath,
    LinkText,
    PartialLinkText,
    Name,
    ClassName,
    TagName,
}

impl Strategy {
    /// Name used in `strategy:selector` strings and in `Display`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Id => "id",
            Strategy::Css => "css",
            Strategy::XPath => "xpath",
            Strategy::LinkText => "link",
            Strategy::PartialLinkText => "partial_link",
            Strategy::Name => "name",
            Strategy::ClassName => "class",
            Strategy::TagName => "tag",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        Some(match prefix {
            "id" => Strategy::Id,
            "css" => Strategy::Css,
            "xpath" => Strategy::XPath,
            "link" => Strategy::LinkText,
            "partial_link" => Strategy::PartialLinkText,
            "name" => Strategy::Name,
            "class" => Strategy::ClassName,
            "tag" => Strategy::TagName,
            _ => return None,
        })
    }
}

/// Identifies an element within a page or within another element.
///
/// Immutable and reused across retries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    strategy: Strategy,
    selector: String,
}

impl Locator {
    pub fn new(strategy: Strategy, selector: impl Into<String>) -> Self {
        Self {
            strategy,
            selector: selector.into(),
        }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(Strategy::Id, value)
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(Strategy::Css, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, value)
    }

    pub fn link_text(value: impl Into<String>) -> Self {
        Self::new(Strategy::LinkText, value)
    }

    pub fn partial_link_text(value: impl Into<String>) -> Self {
        Self::new(Strategy::PartialLinkText, value)
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::new(Strategy::Name, value)
    }

    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(Strategy::ClassName, value)
    }

    pub fn tag_name(value: impl Into<String>) -> Self {
        Self::new(Strategy::TagName, value)
    }

    /// Parse `strategy:selector`. Unknown or missing prefixes fall back to CSS,
    /// so `div.card > a` and `css:div.card > a` are the same locator.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if let Some((prefix, rest)) = s.split_once(':') {
            if let Some(strategy) = Strategy::from_prefix(prefix) {
                return Self::new(strategy, rest);
            }
        }
        Self::css(s)
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// The locator rewritten onto the four W3C-native strategies
    /// (css, xpath, link text, and id through css).
    pub fn to_native(&self) -> (Strategy, String) {
        match self.strategy {
            Strategy::Id | Strategy::Css | Strategy::XPath | Strategy::LinkText => {
                (self.strategy, self.selector.clone())
            }
            Strategy::Name => (
                Strategy::Css,
                format!("[name={}]", css_string(&self.selector)),
            ),
            // attribute form needs no identifier escaping, e.g. `md:flex`
            Strategy::ClassName => (
                Strategy::Css,
                format!("[class~={}]", css_string(&self.selector)),
            ),
            Strategy::TagName => (Strategy::Css, self.selector.clone()),
            Strategy::PartialLinkText => (
                Strategy::XPath,
                format!(".//a[contains(., {})]", xpath_string(&self.selector)),
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, \"{}\")", self.strategy.as_str(), self.selector)
    }
}

impl From<&str> for Locator {
    fn from(s: &str) -> Self {
        Locator::parse(s)
    }
}

fn css_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

// XPath 1.0 has no escape character; mixed quotes need concat().
fn xpath_string(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
    format!("concat({})", parts.join(", \"'\", "))
}
