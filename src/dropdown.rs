//! `<select>` helper.

use tracing::debug;

use crate::driver::{Driver, ElementHandle};
use crate::element::WrappedElement;
use crate::page::BasePage;
use crate::{Error, Locator, Result};

/// One `<select>` element.
#[derive(Debug, Clone)]
pub struct Dropdown<D: Driver> {
    element: WrappedElement<D>,
}

impl<D: Driver> Dropdown<D> {
    pub fn new(element: WrappedElement<D>) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &WrappedElement<D> {
        &self.element
    }

    /// Select the option whose `value` attribute is `value`.
    pub async fn select_by_value(&self, value: &str) -> Result<&Self> {
        debug!(value, "select by value");
        self.element.raw().select_by_value(value).await?;
        Ok(self)
    }

    /// Select the option at zero-based `index`.
    pub async fn select_by_index(&self, index: usize) -> Result<&Self> {
        debug!(index, "select by index");
        self.element.raw().select_by_index(index).await?;
        Ok(self)
    }

    /// Select the option whose visible text is `text`.
    pub async fn select_by_text(&self, text: &str) -> Result<&Self> {
        debug!(text, "select by text");
        self.element.raw().select_by_text(text).await?;
        Ok(self)
    }
}

impl<D: Driver> BasePage<D> {
    /// The `index`-th element matching `locator`, as a dropdown.
    pub async fn get_dropdown_element(&self, locator: &Locator, index: usize) -> Result<Dropdown<D>> {
        let mut found = self.get_element_list(locator, 1).await?;
        if index >= found.len() {
            return Err(Error::NotFound(format!(
                "{locator} has no dropdown at index {index} ({} found)",
                found.len()
            )));
        }
        Ok(Dropdown::new(found.swap_remove(index)))
    }
}
