use std::collections::HashSet;

use crate::dom::{Dom, NodeId, has_class};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    tag: Option<String>,
    universal: bool,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<SelectorAttrCondition>,
}

impl SelectorStep {
    fn id_only(&self) -> Option<&str> {
        if !self.universal && self.tag.is_none() && self.classes.is_empty() && self.attrs.is_empty()
        {
            self.id.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    step: SelectorStep,
    // Relation to previous (left) selector part.
    combinator: Option<SelectorCombinator>,
}

fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    let tokens = tokenize_selector(selector)?;
    let mut steps = Vec::new();
    let mut pending_combinator: Option<SelectorCombinator> = None;

    for token in tokens {
        if token == ">" || token == "+" || token == "~" {
            if pending_combinator.is_some() || steps.is_empty() {
                return Err(Error::UnsupportedSelector(selector.into()));
            }
            pending_combinator = Some(match token.as_str() {
                ">" => SelectorCombinator::Child,
                "+" => SelectorCombinator::AdjacentSibling,
                "~" => SelectorCombinator::GeneralSibling,
                _ => unreachable!(),
            });
            continue;
        }

        let step = parse_selector_step(&token)?;
        let combinator = if steps.is_empty() {
            None
        } else {
            Some(
                pending_combinator
                    .take()
                    .unwrap_or(SelectorCombinator::Descendant),
            )
        };
        steps.push(SelectorPart { step, combinator });
    }

    if steps.is_empty() || pending_combinator.is_some() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    Ok(steps)
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    let groups = split_selector_groups(selector)?;
    let mut parsed = Vec::with_capacity(groups.len());
    for group in groups {
        parsed.push(parse_selector_chain(&group)?);
    }
    Ok(parsed)
}

fn split_selector_groups(selector: &str) -> Result<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;

    for ch in selector.chars() {
        match ch {
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            ',' if bracket_depth == 0 => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                groups.push(trimmed.to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    let trimmed = current.trim();
    if trimmed.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

fn tokenize_selector(selector: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;

    for ch in selector.chars() {
        match ch {
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            '>' | '+' | '~' if bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
                tokens.push(ch.to_string());
            }
            ch if ch.is_ascii_whitespace() && bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }

    Ok(tokens)
}

fn parse_selector_step(part: &str) -> Result<SelectorStep> {
    let part = part.trim();
    if part.is_empty() {
        return Err(Error::UnsupportedSelector(part.into()));
    }

    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = SelectorStep::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if step.universal {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                i += 1;
                let Some((id, next)) = parse_selector_ident(part, i) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                if step.id.replace(id).is_some() {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                i = next;
            }
            b'.' => {
                i += 1;
                let Some((class_name, next)) = parse_selector_ident(part, i) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                step.classes.push(class_name);
                i = next;
            }
            b'[' => {
                let (attr, next) = parse_selector_attr_condition(part, i)?;
                step.attrs.push(attr);
                i = next;
            }
            _ => {
                if step.tag.is_some()
                    || step.id.is_some()
                    || !step.classes.is_empty()
                    || step.universal
                {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                let Some((tag, next)) = parse_selector_ident(part, i) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                step.tag = Some(tag);
                i = next;
            }
        }
    }

    if step.tag.is_none()
        && step.id.is_none()
        && step.classes.is_empty()
        && step.attrs.is_empty()
        && !step.universal
    {
        return Err(Error::UnsupportedSelector(part.into()));
    }
    Ok(step)
}

fn parse_selector_ident(part: &str, start: usize) -> Option<(String, usize)> {
    let bytes = part.as_bytes();
    let mut i = start;
    while i < bytes.len() && is_selector_ident_char(bytes[i]) {
        i += 1;
    }
    if i == start {
        return None;
    }
    part.get(start..i).map(|ident| (ident.to_string(), i))
}

fn is_selector_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn parse_selector_attr_condition(
    part: &str,
    start: usize,
) -> Result<(SelectorAttrCondition, usize)> {
    let bytes = part.as_bytes();
    let mut i = start;
    if bytes.get(i) != Some(&b'[') {
        return Err(Error::UnsupportedSelector(part.into()));
    }
    i += 1;

    let Some((key, next)) = parse_selector_ident(part, i) else {
        return Err(Error::UnsupportedSelector(part.into()));
    };
    let key = key.to_ascii_lowercase();
    i = next;

    match bytes.get(i) {
        Some(b']') => Ok((SelectorAttrCondition::Exists { key }, i + 1)),
        Some(b'=') => {
            i += 1;
            let quote = match bytes.get(i) {
                Some(&q @ (b'"' | b'\'')) => {
                    i += 1;
                    Some(q)
                }
                _ => None,
            };
            let value_start = i;
            while i < bytes.len() {
                match quote {
                    Some(q) if bytes[i] == q => break,
                    None if bytes[i] == b']' => break,
                    _ => i += 1,
                }
            }
            let value = part
                .get(value_start..i)
                .ok_or_else(|| Error::UnsupportedSelector(part.into()))?
                .to_string();
            if quote.is_some() {
                if i >= bytes.len() {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                i += 1;
            }
            if bytes.get(i) != Some(&b']') {
                return Err(Error::UnsupportedSelector(part.into()));
            }
            Ok((SelectorAttrCondition::Eq { key, value }, i + 1))
        }
        _ => Err(Error::UnsupportedSelector(part.into())),
    }
}

impl Dom {
    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let all = self.query_selector_all(selector)?;
        Ok(all.into_iter().next())
    }

    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;

        if groups.len() == 1 && groups[0].len() == 1 {
            if let Some(id) = groups[0][0].step.id_only() {
                return Ok(self.by_id(id).into_iter().collect());
            }
        }

        let mut ids = Vec::new();
        self.collect_elements_dfs(self.root, &mut ids);

        let mut seen = HashSet::new();
        let mut matched = Vec::new();
        for candidate in ids {
            if groups
                .iter()
                .any(|steps| self.matches_selector_chain(candidate, steps))
                && seen.insert(candidate)
            {
                matched.push(candidate);
            }
        }
        Ok(matched)
    }

    pub(crate) fn query_selector_from(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Option<NodeId>> {
        let all = self.query_selector_all_from(root, selector)?;
        Ok(all.into_iter().next())
    }

    pub(crate) fn query_selector_all_from(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;

        let mut ids = Vec::new();
        self.collect_elements_descendants_dfs(root, &mut ids);

        let mut seen = HashSet::new();
        let mut matched = Vec::new();
        for candidate in ids {
            if groups
                .iter()
                .any(|steps| self.matches_selector_chain(candidate, steps))
                && seen.insert(candidate)
            {
                matched.push(candidate);
            }
        }
        Ok(matched)
    }

    /// Nearest ancestor-or-self matching the selector, the lookup the
    /// counter wiring uses to find a field's wrapper.
    pub(crate) fn closest(&self, node_id: NodeId, selector: &str) -> Result<Option<NodeId>> {
        if self.element(node_id).is_none() {
            return Ok(None);
        }

        let groups = parse_selector_groups(selector)?;
        let mut cursor = Some(node_id);
        while let Some(current) = cursor {
            if groups
                .iter()
                .any(|steps| self.matches_selector_chain(current, steps))
            {
                return Ok(Some(current));
            }
            cursor = self.parent(current);
        }
        Ok(None)
    }

    fn matches_selector_chain(&self, node_id: NodeId, steps: &[SelectorPart]) -> bool {
        if steps.is_empty() {
            return false;
        }
        if !self.matches_step(node_id, &steps[steps.len() - 1].step) {
            return false;
        }

        let mut current = node_id;
        for idx in (1..steps.len()).rev() {
            let prev_step = &steps[idx - 1].step;
            let combinator = steps[idx]
                .combinator
                .unwrap_or(SelectorCombinator::Descendant);

            let matched = match combinator {
                SelectorCombinator::Child => {
                    let Some(parent) = self.parent(current) else {
                        return false;
                    };
                    if self.matches_step(parent, prev_step) {
                        Some(parent)
                    } else {
                        None
                    }
                }
                SelectorCombinator::Descendant => {
                    let mut cursor = self.parent(current);
                    let mut found = None;
                    while let Some(parent) = cursor {
                        if self.matches_step(parent, prev_step) {
                            found = Some(parent);
                            break;
                        }
                        cursor = self.parent(parent);
                    }
                    found
                }
                SelectorCombinator::AdjacentSibling => self
                    .previous_element_sibling(current)
                    .filter(|sibling| self.matches_step(*sibling, prev_step)),
                SelectorCombinator::GeneralSibling => {
                    let mut cursor = self.previous_element_sibling(current);
                    let mut found = None;
                    while let Some(sibling) = cursor {
                        if self.matches_step(sibling, prev_step) {
                            found = Some(sibling);
                            break;
                        }
                        cursor = self.previous_element_sibling(sibling);
                    }
                    found
                }
            };

            let Some(matched) = matched else {
                return false;
            };
            current = matched;
        }

        true
    }

    fn matches_step(&self, node_id: NodeId, step: &SelectorStep) -> bool {
        let Some(element) = self.element(node_id) else {
            return false;
        };

        if !step.universal {
            if let Some(tag) = &step.tag {
                if !element.tag_name.eq_ignore_ascii_case(tag) {
                    return false;
                }
            }
        } else if step.tag.is_some() {
            return false;
        }

        if let Some(id) = &step.id {
            if element.attrs.get("id") != Some(id) {
                return false;
            }
        }

        if step
            .classes
            .iter()
            .any(|class_name| !has_class(element, class_name))
        {
            return false;
        }

        for cond in &step.attrs {
            let matched = match cond {
                SelectorAttrCondition::Exists { key } => element.attrs.contains_key(key),
                SelectorAttrCondition::Eq { key, value } => element.attrs.get(key) == Some(value),
            };
            if !matched {
                return false;
            }
        }

        true
    }

    fn previous_element_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let parent = self.parent(node_id)?;
        let children = &self.nodes[parent.0].children;
        let pos = children.iter().position(|id| *id == node_id)?;
        for sibling in children[..pos].iter().rev() {
            if self.element(*sibling).is_some() {
                return Some(*sibling);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;

    const FIXTURE: &str = r#"
    <div id="page">
      <div id="user-dropdown" class="dropdown">
        <button class="dropdown-toggle">Account</button>
        <ul class="dropdown-menu"><li class="item">Orders</li></ul>
      </div>
      <div class="input-wrapper">
        <input id="title" maxlength="60">
      </div>
      <span class="char-counter"></span>
      <textarea id="review" maxlength="400"></textarea>
      <input id="plain">
    </div>
    "#;

    #[test]
    fn id_selector_uses_the_index() -> Result<()> {
        let dom = parse_html(FIXTURE)?;
        let found = dom.query_selector("#user-dropdown")?;
        assert_eq!(found, dom.by_id("user-dropdown"));
        Ok(())
    }

    #[test]
    fn class_and_tag_selectors_match() -> Result<()> {
        let dom = parse_html(FIXTURE)?;
        assert!(dom.query_selector(".dropdown-toggle")?.is_some());
        assert_eq!(dom.query_selector_all("input")?.len(), 2);
        assert!(dom.query_selector("nav")?.is_none());
        Ok(())
    }

    #[test]
    fn attribute_presence_groups_match_inputs_and_textareas() -> Result<()> {
        let dom = parse_html(FIXTURE)?;
        let bounded = dom.query_selector_all("input[maxlength], textarea[maxlength]")?;
        assert_eq!(bounded.len(), 2);
        assert!(bounded.contains(&dom.by_id("title").unwrap()));
        assert!(bounded.contains(&dom.by_id("review").unwrap()));
        Ok(())
    }

    #[test]
    fn attribute_value_selectors_match_exactly() -> Result<()> {
        let dom = parse_html(FIXTURE)?;
        assert!(dom.query_selector(r#"input[maxlength="60"]"#)?.is_some());
        assert!(dom.query_selector(r#"input[maxlength="61"]"#)?.is_none());
        Ok(())
    }

    #[test]
    fn scoped_queries_only_see_descendants() -> Result<()> {
        let dom = parse_html(FIXTURE)?;
        let container = dom.by_id("user-dropdown").unwrap();
        assert!(
            dom.query_selector_from(container, ".dropdown-menu")?
                .is_some()
        );
        assert!(
            dom.query_selector_from(container, ".char-counter")?
                .is_none()
        );
        // The scope root itself is not a candidate.
        assert!(dom.query_selector_from(container, ".dropdown")?.is_none());
        Ok(())
    }

    #[test]
    fn combinators_walk_the_tree() -> Result<()> {
        let dom = parse_html(FIXTURE)?;
        assert!(dom.query_selector("#user-dropdown .item")?.is_some());
        assert!(
            dom.query_selector("#user-dropdown > .dropdown-menu")?
                .is_some()
        );
        assert!(dom.query_selector("#user-dropdown > .item")?.is_none());
        assert!(
            dom.query_selector(".input-wrapper + .char-counter")?
                .is_some()
        );
        assert!(dom.query_selector(".dropdown ~ .char-counter")?.is_some());
        Ok(())
    }

    #[test]
    fn closest_matches_self_then_ancestors() -> Result<()> {
        let dom = parse_html(FIXTURE)?;
        let title = dom.by_id("title").unwrap();
        let wrapper = dom.closest(title, ".input-wrapper")?.unwrap();
        assert_eq!(dom.attr(wrapper, "class").as_deref(), Some("input-wrapper"));
        assert_eq!(dom.closest(title, "#title")?, Some(title));
        assert_eq!(dom.closest(title, ".missing")?, None);
        Ok(())
    }

    #[test]
    fn unsupported_selectors_are_rejected() -> Result<()> {
        let dom = parse_html(FIXTURE)?;
        assert!(matches!(
            dom.query_selector(""),
            Err(Error::UnsupportedSelector(_))
        ));
        assert!(matches!(
            dom.query_selector("div:hover"),
            Err(Error::UnsupportedSelector(_))
        ));
        assert!(matches!(
            dom.query_selector("[maxlength"),
            Err(Error::UnsupportedSelector(_))
        ));
        assert!(matches!(
            dom.query_selector("div >"),
            Err(Error::UnsupportedSelector(_))
        ));
        Ok(())
    }
}
