use crate::dom::{Dom, NodeId, truncate_chars};
use crate::enhance;
use crate::events::{EventState, ListenerStore};
use crate::html::parse_html;
use crate::observer::RevealWatcher;
use crate::viewport::{Rect, ScrollBehavior, Viewport};
use crate::{Error, Result};

/// An in-memory storefront page: the parsed document, the enhancement
/// listeners wired onto it, and the simulated viewport they react to.
///
/// Construction parses the markup only; [`Page::enhance`] installs the
/// four storefront behaviors. Everything after that is driven through the
/// simulation API (`click`, `type_text`, `user_scroll_to`, ...), which
/// dispatches events synchronously and immediately, so a test observes
/// the exact state the page would settle into.
#[derive(Debug)]
pub struct Page {
    pub(crate) dom: Dom,
    pub(crate) listeners: ListenerStore,
    pub(crate) watchers: Vec<RevealWatcher>,
    pub(crate) viewport: Viewport,
    programmatic_scrolls: Vec<(i64, ScrollBehavior)>,
    navigations: Vec<String>,
    trace: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            watchers: Vec::new(),
            viewport: Viewport::new(),
            programmatic_scrolls: Vec::new(),
            navigations: Vec::new(),
            trace: false,
            trace_logs: Vec::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: true,
        })
    }

    /// Installs the four storefront enhancements. Each one checks for its
    /// own markup and silently skips whatever is missing; calling this on
    /// a page with none of the expected elements is a no-op.
    pub fn enhance(&mut self) -> Result<()> {
        enhance::install_all(self)
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::DomRuntime(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_log_limit = max_entries;
        Ok(())
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    pub(crate) fn trace_line(&mut self, line: String) {
        if !self.trace {
            return;
        }
        if self.trace_to_stderr {
            eprintln!("{line}");
        }
        if self.trace_logs.len() >= self.trace_log_limit {
            self.trace_logs.remove(0);
        }
        self.trace_logs.push(line);
    }

    /// Simulates a user click. After dispatch, the default action of an
    /// unprevented click on (or inside) an anchor with an `href` is
    /// recorded as a navigation.
    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let outcome = self.dispatch_event(target, "click")?;
        if outcome.default_prevented {
            return Ok(());
        }

        if let Some(anchor) = self.anchor_or_ancestor(target) {
            if let Some(href) = self.dom.attr(anchor, "href") {
                if self.trace {
                    let line = format!("[navigate] href={href}");
                    self.trace_line(line);
                }
                self.navigations.push(href);
            }
        }

        Ok(())
    }

    /// Replaces the field's value and dispatches `input`, the way a user
    /// finishing a burst of typing would. Values clamp to the field's
    /// `maxlength`, in characters, as the platform's text controls do.
    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let tag = self
            .dom
            .tag_name(target)
            .ok_or_else(|| Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: "non-element".into(),
            })?
            .to_ascii_lowercase();

        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }

        let max_len = self
            .dom
            .attr(target, "maxlength")
            .and_then(|raw| raw.parse::<usize>().ok());
        let clamped;
        let text = match max_len {
            Some(max_len) if text.chars().count() > max_len => {
                clamped = text.chars().take(max_len).collect::<String>();
                clamped.as_str()
            }
            _ => text,
        };

        self.dom.set_value(target, text)?;
        self.dispatch_event(target, "input")?;
        Ok(())
    }

    /// Dispatches a bare event with no default action, for driving
    /// listeners directly.
    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, event)?;
        Ok(())
    }

    /// Simulates the user scrolling to the given offset: updates the
    /// scroll position, fires `scroll` on the document, then delivers
    /// intersection changes to the reveal watchers.
    pub fn user_scroll_to(&mut self, y: i64) -> Result<()> {
        self.apply_scroll(y)
    }

    /// Programmatic scroll request; the requested behavior is recorded
    /// (see [`Page::programmatic_scrolls`]) and the scroll applies
    /// immediately.
    pub fn scroll_to(&mut self, y: i64, behavior: ScrollBehavior) -> Result<()> {
        let y = y.max(0);
        self.programmatic_scrolls.push((y, behavior));
        self.apply_scroll(y)
    }

    fn apply_scroll(&mut self, y: i64) -> Result<()> {
        let y = y.max(0);
        self.viewport.scroll_y = y;
        if self.trace {
            let line = format!("[scroll] y={y}");
            self.trace_line(line);
        }
        let root = self.dom.root;
        self.dispatch_event(root, "scroll")?;
        self.run_watchers()?;
        Ok(())
    }

    pub fn set_viewport_height(&mut self, height: i64) -> Result<()> {
        if height <= 0 {
            return Err(Error::DomRuntime("viewport height must be positive".into()));
        }
        self.viewport.height = height;
        self.run_watchers()
    }

    /// Assigns an element's vertical extent in document coordinates and
    /// re-delivers intersection changes under the new geometry.
    pub fn set_rect(&mut self, selector: &str, rect: Rect) -> Result<()> {
        let target = self.select_one(selector)?;
        self.viewport.set_rect(target, rect)?;
        self.run_watchers()
    }

    pub fn scroll_y(&self) -> i64 {
        self.viewport.scroll_y
    }

    pub fn viewport_height(&self) -> i64 {
        self.viewport.height
    }

    /// Programmatic scroll requests in order, each with the behavior the
    /// caller asked for.
    pub fn programmatic_scrolls(&self) -> &[(i64, ScrollBehavior)] {
        &self.programmatic_scrolls
    }

    /// Hrefs of anchors whose clicks completed without `preventDefault`.
    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    pub fn has_class(&self, selector: &str, class_name: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        self.dom.class_contains(target, class_name)
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.value(target)
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_class(&self, selector: &str, class_name: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.class_contains(target, class_name)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("{class_name}={expected}"),
                actual: format!("{class_name}={actual}"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    pub(crate) fn dispatch_event(
        &mut self,
        target: NodeId,
        event_type: &str,
    ) -> Result<EventState> {
        let mut event = EventState::new(event_type, target);

        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }

        // Target phase, then bubble through the ancestors.
        for node in path {
            event.current_target = node;
            self.invoke_listeners(node, &mut event)?;
            if event.propagation_stopped {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
        }

        self.trace_event_done(&event, "completed");
        Ok(event)
    }

    fn invoke_listeners(&mut self, node_id: NodeId, event: &mut EventState) -> Result<()> {
        let handlers = self.listeners.get(node_id, &event.event_type);
        for handler in handlers {
            if self.trace {
                let line = format!(
                    "[event] {} target={} current={} default_prevented={}",
                    event.event_type,
                    self.node_label(event.target),
                    self.node_label(event.current_target),
                    event.default_prevented
                );
                self.trace_line(line);
            }
            enhance::run(self, &handler, event)?;
        }
        Ok(())
    }

    /// Delivers pending intersection changes: newly-visible reveal
    /// targets gain their marker and leave the watch. Exhausted watchers
    /// are dropped.
    pub(crate) fn run_watchers(&mut self) -> Result<()> {
        let mut revealed = Vec::new();
        for watcher in &mut self.watchers {
            revealed.extend(watcher.take_intersecting(&self.viewport));
        }
        self.watchers.retain(|watcher| !watcher.is_done());

        for target in revealed {
            self.dom.class_add(target, "is-visible")?;
            if self.trace {
                let line = format!("[reveal] {}", self.node_label(target));
                self.trace_line(line);
            }
        }
        Ok(())
    }

    fn anchor_or_ancestor(&self, node_id: NodeId) -> Option<NodeId> {
        let mut cursor = Some(node_id);
        while let Some(current) = cursor {
            if self
                .dom
                .tag_name(current)
                .map(|tag| tag.eq_ignore_ascii_case("a"))
                .unwrap_or(false)
            {
                return Some(current);
            }
            cursor = self.dom.parent(current);
        }
        None
    }

    fn trace_event_done(&mut self, event: &EventState, outcome: &str) {
        if self.trace {
            let line = format!(
                "[event] {} target={} outcome={outcome}",
                event.event_type,
                self.node_label(event.target)
            );
            self.trace_line(line);
        }
    }

    fn node_label(&self, node_id: NodeId) -> String {
        match self.dom.tag_name(node_id) {
            Some(tag) => match self.dom.attr(node_id, "id") {
                Some(id) if !id.is_empty() => format!("{tag}#{id}"),
                _ => tag.to_string(),
            },
            None => "document".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_text_clamps_to_maxlength_in_chars() -> Result<()> {
        let mut page = Page::from_html(r#"<input id="title" maxlength="5">"#)?;
        page.type_text("#title", "café au lait")?;
        page.assert_value("#title", "café ")?;
        Ok(())
    }

    #[test]
    fn type_text_rejects_non_form_targets() -> Result<()> {
        let mut page = Page::from_html(r#"<p id="copy">text</p>"#)?;
        assert!(matches!(
            page.type_text("#copy", "x"),
            Err(Error::TypeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn unknown_selector_is_reported_not_swallowed() -> Result<()> {
        let mut page = Page::from_html("<div></div>")?;
        assert!(matches!(
            page.click("#missing"),
            Err(Error::SelectorNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn unprevented_anchor_click_records_a_navigation() -> Result<()> {
        let mut page = Page::from_html(r#"<a id="home" href="/"><span id="label">Home</span></a>"#)?;
        page.click("#label")?;
        assert_eq!(page.navigations(), ["/".to_string()]);
        Ok(())
    }

    #[test]
    fn scroll_offsets_clamp_at_the_origin() -> Result<()> {
        let mut page = Page::from_html("<div></div>")?;
        page.user_scroll_to(-50)?;
        assert_eq!(page.scroll_y(), 0);
        page.scroll_to(-10, ScrollBehavior::Smooth)?;
        assert_eq!(page.programmatic_scrolls(), [(0, ScrollBehavior::Smooth)]);
        Ok(())
    }

    #[test]
    fn trace_log_limit_must_be_positive() -> Result<()> {
        let mut page = Page::from_html("<div></div>")?;
        assert!(page.set_trace_log_limit(0).is_err());
        page.set_trace_log_limit(16)?;
        Ok(())
    }

    #[test]
    fn assertion_failures_carry_a_dom_snippet() -> Result<()> {
        let page = Page::from_html(r#"<span id="c" class="char-counter">5 / 10</span>"#)?;
        let err = page.assert_text("#c", "6 / 10").unwrap_err();
        match err {
            Error::AssertionFailed {
                actual, dom_snippet, ..
            } => {
                assert_eq!(actual, "5 / 10");
                assert!(dom_snippet.contains("char-counter"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }
}
