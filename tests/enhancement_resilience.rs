use storefront_ui::{Page, Rect, ScrollBehavior};

// One page carrying all four enhancements, in the storefront's shape.
const STOREFRONT_HTML: &str = r##"
<!DOCTYPE html>
<html>
  <body>
    <nav class="navbar">
      <div id="user-dropdown" class="dropdown">
        <button class="dropdown-toggle">Account</button>
        <ul class="dropdown-menu"><li class="menu-item">Orders</li></ul>
      </div>
    </nav>
    <header id="hero" class="fade-in">Winter collection</header>
    <section class="products">
      <article id="card-1" class="product-card fade-in">Enamel kettle</article>
    </section>
    <form id="review-form">
      <div class="input-wrapper">
        <textarea id="review" maxlength="40">Great kettle.</textarea>
        <span class="char-counter"></span>
      </div>
    </form>
    <a id="scrollTopBtn" href="#">Back to top</a>
  </body>
</html>
"##;

#[test]
fn all_four_enhancements_coexist_on_one_page() -> storefront_ui::Result<()> {
    let mut page = Page::from_html(STOREFRONT_HTML)?;
    page.set_rect("#hero", Rect { top: 0, height: 300 })?;
    page.set_rect("#card-1", Rect { top: 2000, height: 400 })?;
    page.enhance()?;

    // Counter rendered its initial state, hero revealed, card pending.
    page.assert_text(".char-counter", "13 / 40")?;
    page.assert_class("#hero", "is-visible", true)?;
    page.assert_class("#card-1", "is-visible", false)?;

    // Scrolling drives both the reveal and the button, independently.
    page.user_scroll_to(1700)?;
    page.assert_class("#card-1", "is-visible", true)?;
    page.assert_class("#scrollTopBtn", "visible", true)?;

    // The dropdown neither affects nor is affected by the rest.
    page.click(".dropdown-toggle")?;
    page.assert_class(".dropdown-menu", "active", true)?;
    page.type_text("#review", "Sturdy, arrived early, looks great.")?;
    page.assert_text(".char-counter", "35 / 40")?;
    page.assert_class(".dropdown-menu", "active", true)?;

    // Back to top: smooth request, no navigation. The button sits
    // outside the dropdown, so this same click also closes the menu.
    page.click("#scrollTopBtn")?;
    assert_eq!(page.scroll_y(), 0);
    assert_eq!(page.programmatic_scrolls(), [(0, ScrollBehavior::Smooth)]);
    assert!(page.navigations().is_empty());
    page.assert_class(".dropdown-menu", "active", false)?;
    Ok(())
}

#[test]
fn empty_page_enhances_to_a_no_op() -> storefront_ui::Result<()> {
    let mut page = Page::from_html("<div></div>")?;
    page.enhance()?;
    page.user_scroll_to(400)?;
    Ok(())
}

#[test]
fn broken_dropdown_markup_does_not_disable_the_other_enhancements()
-> storefront_ui::Result<()> {
    let mut page = Page::from_html(
        r##"
        <div id="user-dropdown"><span>no toggle, no menu</span></div>
        <div class="input-wrapper">
          <input id="title" maxlength="10" value="hello">
          <span class="char-counter"></span>
        </div>
        <a id="scrollTopBtn" href="#">Top</a>
        "##,
    )?;
    page.enhance()?;

    page.assert_text(".char-counter", "5 / 10")?;
    page.user_scroll_to(400)?;
    page.assert_class("#scrollTopBtn", "visible", true)?;
    Ok(())
}

#[test]
fn one_unbindable_field_does_not_stop_its_neighbors() -> storefront_ui::Result<()> {
    let mut page = Page::from_html(
        r#"
        <input id="loose" maxlength="5">
        <div class="input-wrapper">
          <input id="bound" maxlength="10" value="hi">
          <span id="bound-counter" class="char-counter"></span>
        </div>
        "#,
    )?;
    page.enhance()?;

    page.assert_text("#bound-counter", "2 / 10")?;
    page.type_text("#loose", "abc")?;
    page.type_text("#bound", "abcd")?;
    page.assert_text("#bound-counter", "4 / 10")?;
    Ok(())
}

#[test]
fn enhancements_only_touch_their_own_markers() -> storefront_ui::Result<()> {
    let mut page = Page::from_html(STOREFRONT_HTML)?;
    page.set_rect("#hero", Rect { top: 0, height: 300 })?;
    page.set_rect("#card-1", Rect { top: 2000, height: 400 })?;
    page.enhance()?;

    page.user_scroll_to(2000)?;
    page.click(".dropdown-toggle")?;

    // No cross-talk: the menu never gains reveal/visibility markers and
    // the button never gains the dropdown's.
    page.assert_class(".dropdown-menu", "is-visible", false)?;
    page.assert_class(".dropdown-menu", "visible", false)?;
    page.assert_class("#scrollTopBtn", "active", false)?;
    page.assert_class("#card-1", "danger", false)?;
    Ok(())
}
