use crate::dom::NodeId;
use crate::events::EventState;
use crate::observer::RevealWatcher;
use crate::page::Page;
use crate::viewport::ScrollBehavior;
use crate::Result;

/// Scroll offset past which the back-to-top button shows (strictly
/// greater-than, matching the page contract).
pub(crate) const SCROLL_TOP_THRESHOLD: i64 = 300;

/// Fraction of a fade-in element that must be visible before it reveals.
pub(crate) const REVEAL_THRESHOLD: f64 = 0.1;

pub(crate) const REVEAL_ROOT_MARGIN: i64 = 0;

/// A wired enhancement reaction. Listeners store these as data; the page
/// runtime executes them through [`run`] when an event reaches their node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Handler {
    /// Click on `.dropdown-toggle`: swallow the click, flip the menu.
    DropdownToggle { menu: NodeId },
    /// Document-level click: close an open menu when the click landed
    /// outside the dropdown container.
    DropdownOutsideClose { container: NodeId, menu: NodeId },
    /// Input on a bounded field: rewrite its counter text and danger
    /// marker.
    CharCounterSync {
        field: NodeId,
        counter: NodeId,
        max_len: usize,
    },
    /// Document-level scroll: show/hide the back-to-top button.
    ScrollTopVisibility { button: NodeId },
    /// Click on the back-to-top button: suppress navigation, glide home.
    ScrollTopJump,
}

pub(crate) fn install_all(page: &mut Page) -> Result<()> {
    install_user_dropdown(page)?;
    install_fade_in_watcher(page)?;
    install_char_counters(page)?;
    install_scroll_top_button(page)?;
    Ok(())
}

/// Wires the navbar user dropdown: the toggle flips the menu's `active`
/// class, and any click elsewhere on the page closes an open menu. The
/// toggle handler stops propagation so the very click that opened the
/// menu never reaches the outside-close listener.
fn install_user_dropdown(page: &mut Page) -> Result<()> {
    let Some(container) = page.dom.by_id("user-dropdown") else {
        return Ok(());
    };
    let toggle = page.dom.query_selector_from(container, ".dropdown-toggle")?;
    let menu = page.dom.query_selector_from(container, ".dropdown-menu")?;
    let (Some(toggle), Some(menu)) = (toggle, menu) else {
        return Ok(());
    };

    page.listeners
        .add(toggle, "click", Handler::DropdownToggle { menu });
    page.listeners.add(
        page.dom.root,
        "click",
        Handler::DropdownOutsideClose { container, menu },
    );
    Ok(())
}

/// Puts every `.fade-in` element under a one-shot intersection watch and
/// delivers the initial intersection state, so elements already in view
/// reveal immediately.
fn install_fade_in_watcher(page: &mut Page) -> Result<()> {
    let targets = page.dom.query_selector_all(".fade-in")?;
    if targets.is_empty() {
        return Ok(());
    }

    page.watchers.push(RevealWatcher::new(
        REVEAL_ROOT_MARGIN,
        REVEAL_THRESHOLD,
        targets,
    ));
    page.run_watchers()
}

/// Binds a live counter to every field that declares a `maxlength`. The
/// counter element is resolved in two steps, reflecting both markup
/// shapes in circulation: first `.char-counter` inside the field's
/// `.input-wrapper`, then the wrapper's next element sibling if that
/// sibling is a counter. Fields that resolve nothing are skipped, as are
/// fields whose `maxlength` is not a number.
fn install_char_counters(page: &mut Page) -> Result<()> {
    let fields = page
        .dom
        .query_selector_all("input[maxlength], textarea[maxlength]")?;

    for field in fields {
        let Some(wrapper) = page.dom.closest(field, ".input-wrapper")? else {
            continue;
        };

        let mut counter = page.dom.query_selector_from(wrapper, ".char-counter")?;
        if counter.is_none() {
            if let Some(sibling) = page.dom.next_element_sibling(wrapper) {
                if page.dom.class_contains(sibling, "char-counter")? {
                    counter = Some(sibling);
                }
            }
        }
        let Some(counter) = counter else {
            continue;
        };

        let Some(max_len) = page
            .dom
            .attr(field, "maxlength")
            .and_then(|raw| raw.parse::<usize>().ok())
        else {
            continue;
        };

        page.listeners.add(
            field,
            "input",
            Handler::CharCounterSync {
                field,
                counter,
                max_len,
            },
        );
        // Render the initial count so prefilled edit forms start correct.
        sync_char_counter(page, field, counter, max_len)?;
    }
    Ok(())
}

/// Wires the back-to-top button: visibility tracks the scroll offset, and
/// a click glides back to the origin instead of navigating.
fn install_scroll_top_button(page: &mut Page) -> Result<()> {
    let Some(button) = page.dom.by_id("scrollTopBtn") else {
        return Ok(());
    };

    page.listeners
        .add(page.dom.root, "scroll", Handler::ScrollTopVisibility { button });
    page.listeners.add(button, "click", Handler::ScrollTopJump);
    Ok(())
}

pub(crate) fn run(page: &mut Page, handler: &Handler, event: &mut EventState) -> Result<()> {
    match handler {
        Handler::DropdownToggle { menu } => {
            // Keep this click away from the outside-close listener.
            event.stop_propagation();
            page.dom.class_toggle(*menu, "active")?;
        }
        Handler::DropdownOutsideClose { container, menu } => {
            if page.dom.class_contains(*menu, "active")?
                && !page.dom.contains(*container, event.target)
            {
                page.dom.class_remove(*menu, "active")?;
            }
        }
        Handler::CharCounterSync {
            field,
            counter,
            max_len,
        } => {
            sync_char_counter(page, *field, *counter, *max_len)?;
        }
        Handler::ScrollTopVisibility { button } => {
            if page.viewport.scroll_y > SCROLL_TOP_THRESHOLD {
                page.dom.class_add(*button, "visible")?;
            } else {
                page.dom.class_remove(*button, "visible")?;
            }
        }
        Handler::ScrollTopJump => {
            event.prevent_default();
            page.scroll_to(0, ScrollBehavior::Smooth)?;
        }
    }
    Ok(())
}

fn sync_char_counter(
    page: &mut Page,
    field: NodeId,
    counter: NodeId,
    max_len: usize,
) -> Result<()> {
    let current_len = page.dom.value(field)?.chars().count();
    page.dom
        .set_text_content(counter, &format!("{current_len} / {max_len}"))?;
    page.dom
        .class_set(counter, "danger", current_len >= max_len)?;
    Ok(())
}
