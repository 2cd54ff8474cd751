//! Deterministic headless runtime for the storefront page enhancements.
//!
//! The storefront ships four independent, stateless UI behaviors that are
//! wired up once per page: the user dropdown in the navbar, the fade-in
//! reveal for elements scrolling into view, live character counters for
//! bounded text fields, and the "back to top" button. This crate hosts
//! those behaviors on an in-memory page so they can be driven and verified
//! from ordinary Rust tests, with no browser and no timing dependence.
//!
//! [`Page::from_html`] parses the markup, [`Page::enhance`] installs the
//! controllers, and the simulation API (`click`, `type_text`,
//! `user_scroll_to`, ...) plays user interactions against them:
//!
//! ```
//! use storefront_ui::Page;
//!
//! # fn main() -> storefront_ui::Result<()> {
//! let html = r#"
//! <div class="input-wrapper">
//!   <textarea maxlength="40">Great kettle, fast shipping.</textarea>
//!   <span class="char-counter"></span>
//! </div>
//! "#;
//!
//! let mut page = Page::from_html(html)?;
//! page.enhance()?;
//! page.assert_text(".char-counter", "28 / 40")?;
//! # Ok(())
//! # }
//! ```
//!
//! Missing markup is never an error: each enhancement checks for its own
//! elements and silently skips what it cannot find, so one malformed page
//! section cannot disable the others.

use std::error::Error as StdError;
use std::fmt;

mod dom;
mod enhance;
mod events;
mod html;
mod observer;
mod page;
mod selector;
mod viewport;

pub use page::Page;
pub use viewport::{DEFAULT_VIEWPORT_HEIGHT, Rect, ScrollBehavior};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    DomRuntime(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::DomRuntime(msg) => write!(f, "dom runtime error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}
