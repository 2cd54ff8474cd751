use std::collections::HashMap;

use crate::dom::Dom;
use crate::{Error, Result};

/// Single-pass parser for the storefront markup subset: nested tags,
/// quoted/unquoted/bare attributes, comments, a doctype prologue, void and
/// self-closing tags. `<script>` and `<style>` bodies are raw text; they
/// end up as text nodes and are never interpreted.
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();

    let mut stack = vec![dom.root];
    let bytes = html.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if starts_with_at(bytes, i, b"<!--") {
            if let Some(end) = find_subslice(bytes, i + 4, b"-->") {
                i = end + 3;
            } else {
                return Err(Error::HtmlParse("unclosed HTML comment".into()));
            }
            continue;
        }

        if starts_with_at(bytes, i, b"<!") {
            // Doctype or other markup declaration; skip to the closing '>'.
            while i < bytes.len() && bytes[i] != b'>' {
                i += 1;
            }
            if i >= bytes.len() {
                return Err(Error::HtmlParse("unclosed markup declaration".into()));
            }
            i += 1;
            continue;
        }

        if bytes[i] == b'<' {
            if starts_with_at(bytes, i, b"</") {
                let (tag, next) = parse_end_tag(html, i)?;
                i = next;

                while stack.len() > 1 {
                    let top = *stack
                        .last()
                        .ok_or_else(|| Error::HtmlParse("invalid stack state".into()))?;
                    let top_tag = dom.tag_name(top).unwrap_or("");
                    stack.pop();
                    if top_tag.eq_ignore_ascii_case(&tag) {
                        break;
                    }
                }
                continue;
            }

            let (tag, attrs, self_closing, next) = parse_start_tag(html, i)?;
            i = next;

            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let node = dom.create_element(parent, tag.clone(), attrs);

            if is_raw_text_tag(&tag) {
                let close = find_case_insensitive_end_tag(bytes, i, tag.as_bytes())
                    .ok_or_else(|| Error::HtmlParse(format!("unclosed <{tag}>")))?;
                if let Some(body) = html.get(i..close) {
                    if !body.is_empty() {
                        dom.create_text(node, body.to_string());
                    }
                }
                i = close;
                let (_, after_end) = parse_end_tag(html, i)?;
                i = after_end;
                continue;
            }

            if !self_closing && !is_void_tag(&tag) {
                stack.push(node);
            }
            continue;
        }

        let text_start = i;
        while i < bytes.len() && bytes[i] != b'<' {
            i += 1;
        }

        if let Some(text) = html.get(text_start..i) {
            if !text.is_empty() {
                let parent = *stack
                    .last()
                    .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
                dom.create_text(parent, text.to_string());
            }
        }
    }

    dom.initialize_textarea_values();
    Ok(dom)
}

fn parse_start_tag(
    html: &str,
    at: usize,
) -> Result<(String, HashMap<String, String>, bool, usize)> {
    let bytes = html.as_bytes();
    let mut i = at;
    if bytes.get(i) != Some(&b'<') {
        return Err(Error::HtmlParse("expected '<'".into()));
    }
    i += 1;

    skip_ws(bytes, &mut i);
    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }

    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid tag name".into()))?
        .to_ascii_lowercase();

    if tag.is_empty() {
        return Err(Error::HtmlParse("empty tag name".into()));
    }

    let mut attrs = HashMap::new();
    let mut self_closing = false;

    loop {
        skip_ws(bytes, &mut i);
        if i >= bytes.len() {
            return Err(Error::HtmlParse("unclosed start tag".into()));
        }

        if bytes[i] == b'>' {
            i += 1;
            break;
        }

        if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'>' {
            self_closing = true;
            i += 2;
            break;
        }

        let name_start = i;
        while i < bytes.len() && is_attr_name_char(bytes[i]) {
            i += 1;
        }

        let name = html
            .get(name_start..i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute name".into()))?
            .to_ascii_lowercase();

        if name.is_empty() {
            return Err(Error::HtmlParse("invalid attribute name".into()));
        }

        skip_ws(bytes, &mut i);

        let value = if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            skip_ws(bytes, &mut i);
            parse_attr_value(html, bytes, &mut i)?
        } else {
            "true".to_string()
        };

        attrs.insert(name, value);
    }

    Ok((tag, attrs, self_closing, i))
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize)> {
    let bytes = html.as_bytes();
    let mut i = at;

    if !(bytes.get(i) == Some(&b'<') && bytes.get(i + 1) == Some(&b'/')) {
        return Err(Error::HtmlParse("expected end tag".into()));
    }
    i += 2;
    skip_ws(bytes, &mut i);

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }

    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid end tag".into()))?
        .to_ascii_lowercase();

    while i < bytes.len() && bytes[i] != b'>' {
        i += 1;
    }
    if i >= bytes.len() {
        return Err(Error::HtmlParse("unclosed end tag".into()));
    }

    Ok((tag, i + 1))
}

fn parse_attr_value(html: &str, bytes: &[u8], i: &mut usize) -> Result<String> {
    if *i >= bytes.len() {
        return Err(Error::HtmlParse("missing attribute value".into()));
    }

    if bytes[*i] == b'\'' || bytes[*i] == b'"' {
        let quote = bytes[*i];
        *i += 1;
        let start = *i;
        while *i < bytes.len() && bytes[*i] != quote {
            *i += 1;
        }
        if *i >= bytes.len() {
            return Err(Error::HtmlParse("unclosed quoted attribute value".into()));
        }
        let value = html
            .get(start..*i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?
            .to_string();
        *i += 1;
        return Ok(value);
    }

    let start = *i;
    while *i < bytes.len()
        && !bytes[*i].is_ascii_whitespace()
        && bytes[*i] != b'>'
        && !(bytes[*i] == b'/' && *i + 1 < bytes.len() && bytes[*i + 1] == b'>')
    {
        *i += 1;
    }

    let value = html
        .get(start..*i)
        .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?
        .to_string();
    Ok(value)
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    if at + needle.len() > bytes.len() {
        return false;
    }
    &bytes[at..at + needle.len()] == needle
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || from > bytes.len() {
        return None;
    }

    let mut i = from;
    while i + needle.len() <= bytes.len() {
        if &bytes[i..i + needle.len()] == needle {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn find_case_insensitive_end_tag(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut needle = Vec::new();
    needle.extend_from_slice(b"</");
    needle.extend(tag.iter().map(|b| b.to_ascii_lowercase()));

    let mut i = from;
    while i + needle.len() <= bytes.len() {
        if bytes[i] == b'<' && bytes.get(i + 1) == Some(&b'/') {
            let mut matched = true;
            for j in 0..needle.len() {
                if bytes[i + j].to_ascii_lowercase() != needle[j] {
                    matched = false;
                    break;
                }
            }
            if matched {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_attributes() -> Result<()> {
        let dom = parse_html(
            r#"<div id="user-dropdown" class="dropdown">
                 <button class="dropdown-toggle">Account</button>
                 <ul class="dropdown-menu"><li>Orders</li></ul>
               </div>"#,
        )?;

        let container = dom.by_id("user-dropdown").unwrap();
        assert_eq!(dom.tag_name(container), Some("div"));
        assert_eq!(dom.attr(container, "class").as_deref(), Some("dropdown"));
        Ok(())
    }

    #[test]
    fn bare_attributes_default_to_true() -> Result<()> {
        let dom = parse_html(r#"<input id="f" required maxlength="40">"#)?;
        let field = dom.by_id("f").unwrap();
        assert_eq!(dom.attr(field, "required").as_deref(), Some("true"));
        assert_eq!(dom.attr(field, "maxlength").as_deref(), Some("40"));
        Ok(())
    }

    #[test]
    fn value_attribute_seeds_the_control_value() -> Result<()> {
        let dom = parse_html(r#"<input id="name" value="hello">"#)?;
        let field = dom.by_id("name").unwrap();
        assert_eq!(dom.value(field)?, "hello");
        Ok(())
    }

    #[test]
    fn textarea_value_comes_from_its_text() -> Result<()> {
        let dom = parse_html(r#"<textarea id="bio">first review</textarea>"#)?;
        let field = dom.by_id("bio").unwrap();
        assert_eq!(dom.value(field)?, "first review");
        Ok(())
    }

    #[test]
    fn void_tags_do_not_swallow_siblings() -> Result<()> {
        let dom = parse_html(r#"<div id="wrap"><input id="a"><p id="b">x</p></div>"#)?;
        let a = dom.by_id("a").unwrap();
        let b = dom.by_id("b").unwrap();
        assert_eq!(dom.parent(a), dom.parent(b));
        Ok(())
    }

    #[test]
    fn comments_and_doctype_are_skipped() -> Result<()> {
        let dom = parse_html(
            r#"<!DOCTYPE html><!-- navbar --><div id="only">ok</div><!-- footer -->"#,
        )?;
        let only = dom.by_id("only").unwrap();
        assert_eq!(dom.text_content(only), "ok");
        Ok(())
    }

    #[test]
    fn script_bodies_stay_raw_text() -> Result<()> {
        let dom = parse_html(
            r#"<div id="m">ok</div><script>if (1 < 2) { console.log("<div>"); }</script>"#,
        )?;
        let m = dom.by_id("m").unwrap();
        assert_eq!(dom.text_content(m), "ok");
        // The angle brackets inside the script must not create elements.
        assert_eq!(dom.all_element_nodes().len(), 2);
        Ok(())
    }

    #[test]
    fn unclosed_comment_is_a_parse_error() {
        assert!(matches!(
            parse_html("<!-- never closed"),
            Err(Error::HtmlParse(_))
        ));
    }

    #[test]
    fn unclosed_raw_text_tag_is_a_parse_error() {
        assert!(matches!(
            parse_html("<script>let a = 1;"),
            Err(Error::HtmlParse(_))
        ));
    }

    #[test]
    fn mismatched_end_tags_pop_to_the_matching_ancestor() -> Result<()> {
        let dom = parse_html(r#"<div id="outer"><span><b>x</span></div><p id="after">y</p>"#)?;
        let after = dom.by_id("after").unwrap();
        assert_eq!(dom.parent(after), Some(dom.root));
        Ok(())
    }
}
