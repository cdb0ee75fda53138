//! Narrow capability interface over the browser automation client.
//!
//! The locator only needs to navigate, query elements by visible text or CSS
//! selector, read attributes and text, click, and wait. Anything richer stays
//! inside the implementation ([`crate::webdriver`] in production, scripted
//! fakes in tests).

use std::time::Duration;

use crate::error::RenderError;

/// Opaque reference to an element inside one renderer session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        ElementHandle(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// One live page.
///
/// Every call blocks until it completes or its own timeout fires; timeouts
/// surface as [`RenderError::Timeout`].
pub trait Renderer {
    /// Loads `url` and waits for the document to be interactive.
    fn navigate(&mut self, url: &str) -> Result<(), RenderError>;

    /// Visible text of the whole page body.
    fn body_text(&mut self) -> Result<String, RenderError>;

    /// Elements whose own visible text equals `text` exactly.
    fn find_by_text(&mut self, text: &str) -> Result<Vec<ElementHandle>, RenderError>;

    /// Elements matching a CSS selector, in document order.
    fn find_by_css(&mut self, selector: &str) -> Result<Vec<ElementHandle>, RenderError>;

    /// Attribute value, `None` when the attribute is absent.
    fn attribute(&mut self, element: &ElementHandle, name: &str) -> Result<Option<String>, RenderError>;

    fn text(&mut self, element: &ElementHandle) -> Result<String, RenderError>;

    fn click(&mut self, element: &ElementHandle) -> Result<(), RenderError>;

    /// Lets the page settle after navigation or a click.
    fn wait(&mut self, duration: Duration);
}

/// Starts renderer sessions. A fresh session is opened for every fetch attempt.
pub trait Automation {
    type Session: Renderer;

    /// Fails with [`RenderError::Unavailable`] when the automation client
    /// itself is missing; retrying cannot fix that.
    fn open(&self) -> Result<Self::Session, RenderError>;
}
