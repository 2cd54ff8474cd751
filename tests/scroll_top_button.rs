use storefront_ui::{Page, ScrollBehavior};

const LONG_PAGE_HTML: &str = r##"
<main>
  <h1 id="headline">All products</h1>
  <section id="catalog">A very long product listing</section>
</main>
<a id="scrollTopBtn" href="#" class="scroll-top">Back to top</a>
"##;

fn enhanced_page() -> storefront_ui::Result<Page> {
    let mut page = Page::from_html(LONG_PAGE_HTML)?;
    page.enhance()?;
    Ok(page)
}

#[test]
fn button_shows_past_the_threshold_and_hides_below_it() -> storefront_ui::Result<()> {
    let mut page = enhanced_page()?;
    page.assert_class("#scrollTopBtn", "visible", false)?;

    page.user_scroll_to(301)?;
    page.assert_class("#scrollTopBtn", "visible", true)?;

    page.user_scroll_to(299)?;
    page.assert_class("#scrollTopBtn", "visible", false)?;
    Ok(())
}

#[test]
fn threshold_is_strictly_greater_than_300() -> storefront_ui::Result<()> {
    let mut page = enhanced_page()?;

    page.user_scroll_to(300)?;
    page.assert_class("#scrollTopBtn", "visible", false)?;

    page.user_scroll_to(301)?;
    page.assert_class("#scrollTopBtn", "visible", true)?;
    Ok(())
}

#[test]
fn visibility_is_recomputed_on_every_scroll_event() -> storefront_ui::Result<()> {
    let mut page = enhanced_page()?;

    for offset in [500, 100, 800, 0, 301] {
        page.user_scroll_to(offset)?;
        page.assert_class("#scrollTopBtn", "visible", offset > 300)?;
    }
    Ok(())
}

#[test]
fn click_requests_a_smooth_scroll_to_the_origin() -> storefront_ui::Result<()> {
    let mut page = enhanced_page()?;

    page.user_scroll_to(900)?;
    page.click("#scrollTopBtn")?;

    assert_eq!(page.scroll_y(), 0);
    assert_eq!(page.programmatic_scrolls(), [(0, ScrollBehavior::Smooth)]);
    Ok(())
}

#[test]
fn click_does_not_navigate_the_page() -> storefront_ui::Result<()> {
    let mut page = enhanced_page()?;

    page.user_scroll_to(900)?;
    page.click("#scrollTopBtn")?;
    assert!(page.navigations().is_empty());
    Ok(())
}

#[test]
fn the_jump_itself_hides_the_button() -> storefront_ui::Result<()> {
    let mut page = enhanced_page()?;

    page.user_scroll_to(900)?;
    page.assert_class("#scrollTopBtn", "visible", true)?;

    // The programmatic scroll fires a scroll event of its own, and the
    // visibility listener sees the new offset.
    page.click("#scrollTopBtn")?;
    page.assert_class("#scrollTopBtn", "visible", false)?;
    Ok(())
}

#[test]
fn page_without_the_button_enhances_cleanly() -> storefront_ui::Result<()> {
    let mut page = Page::from_html(r#"<main id="plain">Short page</main>"#)?;
    page.enhance()?;
    page.user_scroll_to(1000)?;
    Ok(())
}
