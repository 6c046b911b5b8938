// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! CSS Selector parsing and matching
//!
//! Supports selector lists, descendant and child combinators, and compound
//! selectors built from tags, ids, classes and attribute tests.

use crate::error::{Error, Result};

use super::node::Node;

/// A parsed selector list (`a, form[action]`)
#[derive(Debug, Clone)]
pub struct Selector {
    alternatives: Vec<ComplexSelector>,
}

/// Compound selectors joined by combinators, stored rightmost first
#[derive(Debug, Clone)]
struct ComplexSelector {
    subject: Compound,
    ancestry: Vec<(Combinator, Compound)>,
}

/// Combinator between compounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant (space)
    Descendant,
    /// Child (>)
    Child,
}

type Compound = Vec<SelectorPart>;

/// A part of a compound selector
#[derive(Debug, Clone)]
pub enum SelectorPart {
    Universal,
    Tag(String),
    Id(String),
    Class(String),
    Attribute(AttributeSelector),
}

/// Attribute selector
#[derive(Debug, Clone)]
pub struct AttributeSelector {
    pub name: String,
    pub operator: Option<AttributeOperator>,
    pub value: String,
}

/// Attribute selector operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// [attr=value]
    Equals,
    /// [attr~=value]
    Includes,
    /// [attr^=value]
    Prefix,
    /// [attr$=value]
    Suffix,
    /// [attr*=value]
    Substring,
}

impl Selector {
    /// Parse a CSS selector string
    pub fn parse(selector: &str) -> Result<Self> {
        let trimmed = selector.trim();
        if trimmed.is_empty() {
            return Err(Error::selector(selector, "empty selector"));
        }

        let alternatives = trimmed
            .split(',')
            .map(|alt| parse_complex(selector, alt.trim()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { alternatives })
    }

    /// Check if an element node matches this selector
    pub fn matches(&self, node: &Node) -> bool {
        node.is_element() && self.alternatives.iter().any(|alt| alt.matches(node))
    }
}

impl ComplexSelector {
    fn matches(&self, node: &Node) -> bool {
        compound_matches(&self.subject, node) && Self::match_ancestry(&self.ancestry, node)
    }

    fn match_ancestry(ancestry: &[(Combinator, Compound)], node: &Node) -> bool {
        let Some(((combinator, compound), rest)) = ancestry.split_first() else {
            return true;
        };

        match combinator {
            Combinator::Child => node
                .parent()
                .map(|p| compound_matches(compound, &p) && Self::match_ancestry(rest, &p))
                .unwrap_or(false),
            Combinator::Descendant => node
                .ancestors()
                .iter()
                .any(|a| compound_matches(compound, a) && Self::match_ancestry(rest, a)),
        }
    }
}

fn compound_matches(compound: &Compound, node: &Node) -> bool {
    node.is_element() && compound.iter().all(|part| part_matches(part, node))
}

fn part_matches(part: &SelectorPart, node: &Node) -> bool {
    match part {
        SelectorPart::Universal => true,
        SelectorPart::Tag(tag) => node
            .local_name()
            .map(|n| n.eq_ignore_ascii_case(tag))
            .unwrap_or(false),
        SelectorPart::Id(id) => node.get_attribute("id").as_deref() == Some(id.as_str()),
        SelectorPart::Class(class) => node
            .get_attribute("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false),
        SelectorPart::Attribute(attr) => {
            let Some(actual) = node.get_attribute(&attr.name) else {
                return false;
            };
            let expected = attr.value.as_str();
            match attr.operator {
                None => true,
                Some(AttributeOperator::Equals) => actual == expected,
                Some(AttributeOperator::Includes) => {
                    actual.split_whitespace().any(|w| w == expected)
                }
                Some(AttributeOperator::Prefix) => {
                    !expected.is_empty() && actual.starts_with(expected)
                }
                Some(AttributeOperator::Suffix) => {
                    !expected.is_empty() && actual.ends_with(expected)
                }
                Some(AttributeOperator::Substring) => {
                    !expected.is_empty() && actual.contains(expected)
                }
            }
        }
    }
}

fn parse_complex(full: &str, input: &str) -> Result<ComplexSelector> {
    if input.is_empty() {
        return Err(Error::selector(full, "empty selector in list"));
    }

    // Left to right, then reversed so the subject comes first
    let mut compounds: Vec<(Option<Combinator>, Compound)> = Vec::new();
    let mut pending = Some(Combinator::Descendant);
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '>' {
            chars.next();
            pending = Some(Combinator::Child);
            continue;
        }

        let compound = parse_compound(full, &mut chars)?;
        let combinator = if compounds.is_empty() { None } else { pending };
        compounds.push((combinator, compound));
        pending = Some(Combinator::Descendant);
    }

    let mut iter = compounds.into_iter().rev();
    let (mut link, subject) = iter
        .next()
        .ok_or_else(|| Error::selector(full, "missing compound selector"))?;
    let mut ancestry = Vec::new();
    for (combinator, compound) in iter {
        let joined = link.ok_or_else(|| Error::selector(full, "dangling combinator"))?;
        ancestry.push((joined, compound));
        link = combinator;
    }

    Ok(ComplexSelector { subject, ancestry })
}

fn parse_compound(
    full: &str,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<Compound> {
    let mut parts = Vec::new();

    while let Some(&c) = chars.peek() {
        match c {
            '*' => {
                chars.next();
                parts.push(SelectorPart::Universal);
            }
            '#' => {
                chars.next();
                parts.push(SelectorPart::Id(read_ident(full, chars)?));
            }
            '.' => {
                chars.next();
                parts.push(SelectorPart::Class(read_ident(full, chars)?));
            }
            '[' => {
                chars.next();
                parts.push(SelectorPart::Attribute(parse_attribute(full, chars)?));
            }
            c if c.is_whitespace() || c == '>' => break,
            c if is_ident_char(c) => {
                parts.push(SelectorPart::Tag(read_ident(full, chars)?.to_lowercase()));
            }
            other => {
                return Err(Error::selector(full, format!("unexpected character '{}'", other)));
            }
        }
    }

    if parts.is_empty() {
        return Err(Error::selector(full, "empty compound selector"));
    }
    Ok(parts)
}

fn parse_attribute(
    full: &str,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<AttributeSelector> {
    let mut body = String::new();
    for c in chars.by_ref() {
        if c == ']' {
            return attribute_from_body(full, body.trim());
        }
        body.push(c);
    }
    Err(Error::selector(full, "unclosed attribute selector"))
}

fn attribute_from_body(full: &str, body: &str) -> Result<AttributeSelector> {
    const OPERATORS: [(&str, AttributeOperator); 5] = [
        ("~=", AttributeOperator::Includes),
        ("^=", AttributeOperator::Prefix),
        ("$=", AttributeOperator::Suffix),
        ("*=", AttributeOperator::Substring),
        ("=", AttributeOperator::Equals),
    ];

    for (token, operator) in OPERATORS {
        if let Some((name, value)) = body.split_once(token) {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            return Ok(AttributeSelector {
                name: checked_name(full, name)?,
                operator: Some(operator),
                value: value.to_string(),
            });
        }
    }

    Ok(AttributeSelector {
        name: checked_name(full, body)?,
        operator: None,
        value: String::new(),
    })
}

fn checked_name(full: &str, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return Err(Error::selector(full, format!("invalid attribute name '{}'", name)));
    }
    Ok(name.to_lowercase())
}

fn read_ident(full: &str, chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<String> {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    if ident.is_empty() {
        return Err(Error::selector(full, "expected identifier"));
    }
    Ok(ident)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn test_selector_list() {
        let doc = parse_html(
            r#"<form action="/a"><input name="q"><textarea></textarea></form><a href="/x">x</a>"#,
        )
        .unwrap();

        assert_eq!(doc.query_selector_all("input, textarea").len(), 2);
        assert_eq!(doc.query_selector_all("a[href], form[action]").len(), 2);
    }

    #[test]
    fn test_combinators() {
        let doc = parse_html(
            r#"<div id="outer"><p><a class="deep" href="https://x.test">x</a></p></div>"#,
        )
        .unwrap();

        assert!(doc.query_selector("#outer a.deep").is_some());
        assert!(doc.query_selector("p > a").is_some());
        assert!(doc.query_selector("div > a").is_none());
    }

    #[test]
    fn test_attribute_operators() {
        let doc = parse_html(r#"<script src="https://cdn.test/app.js"></script>"#).unwrap();

        assert!(doc.query_selector("script[src^=https]").is_some());
        assert!(doc.query_selector("script[src$='.js']").is_some());
        assert!(doc.query_selector("script[src*=cdn]").is_some());
        assert!(doc.query_selector("script[src=nope]").is_none());
    }

    #[test]
    fn test_invalid_selector() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("a,").is_err());
        assert!(Selector::parse("[unclosed").is_err());
        assert!(matches!(
            Selector::parse("a!b"),
            Err(Error::Selector { .. })
        ));
    }
}
