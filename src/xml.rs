//! XML to attribute-mapping conversion.
//!
//! Feed payloads are schema-free: every child element of a record becomes a key
//! in a `serde_json::Map`, whatever its name. Nested elements become nested
//! mappings and repeated element names collapse into arrays.

use crate::errors::ApiError;
use roxmltree::{Document, Node};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A response body that is known to be well-formed XML.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    body: String,
}

impl ParsedDocument {
    /// Validates `body` as XML.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Parse` when the body is not well-formed.
    pub fn parse(body: impl Into<String>) -> Result<Self, ApiError> {
        let body = body.into();
        Document::parse(&body)?;
        Ok(Self { body })
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Selects descendant elements with a space-separated descendant selector
    /// such as `"branch"` or `"properties property"`.
    ///
    /// Matches are returned in document order, each converted with
    /// [`parse_element`]. No match yields an empty vector.
    ///
    /// Each call parses the body again; select once per response rather than
    /// in a loop.
    pub fn select(&self, selector: &str) -> Result<Vec<Map<String, Value>>, ApiError> {
        let tags: Vec<&str> = selector.split_whitespace().collect();
        let doc = Document::parse(&self.body)?;

        let matches: Vec<Map<String, Value>> = doc
            .descendants()
            .filter(|node| matches_selector(*node, &tags))
            .map(parse_element)
            .collect();

        tracing::debug!("Selected {} '{}' element(s)", matches.len(), selector);
        Ok(matches)
    }
}

/// Parses a standalone fragment and returns the mapping of its root element.
pub fn parse_fragment(xml: &str) -> Result<Map<String, Value>, ApiError> {
    let doc = Document::parse(xml)?;
    Ok(parse_element(doc.root_element()))
}

/// Converts one element into an attribute mapping.
///
/// XML attributes of the element become keys first; child elements are added
/// afterwards and win on a name clash.
pub fn parse_element(node: Node<'_, '_>) -> Map<String, Value> {
    let mut map = Map::new();

    for attr in node.attributes() {
        map.insert(attr.name().to_string(), scalar(attr.value()));
    }

    let mut from_children: HashSet<String> = HashSet::new();
    for child in node.children().filter(|c| c.is_element()) {
        let key = child.tag_name().name().to_string();
        let value = element_value(child);

        if from_children.insert(key.clone()) {
            map.insert(key, value);
            continue;
        }

        // Repeated element name
        match map.get_mut(&key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key, value);
            }
        }
    }

    map
}

fn element_value(node: Node<'_, '_>) -> Value {
    let has_children = node.children().any(|c| c.is_element());
    let has_attributes = node.attributes().next().is_some();

    if has_children {
        return Value::Object(parse_element(node));
    }

    let text = scalar(&text_of(node));
    if !has_attributes {
        return text;
    }

    // Leaf carrying XML attributes, e.g. <price currency="GBP">1000</price>
    let mut map = parse_element(node);
    if !text.is_null() {
        map.insert("value".to_string(), text);
    }
    Value::Object(map)
}

fn text_of(node: Node<'_, '_>) -> String {
    node.children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect()
}

/// Empty text is null, canonical integers become numbers, anything else
/// (including zero-padded codes like `00000`) stays a string.
fn scalar(raw: &str) -> Value {
    let text = raw.trim();
    if text.is_empty() {
        return Value::Null;
    }
    match text.parse::<i64>() {
        Ok(n) if n.to_string() == text => Value::from(n),
        _ => Value::String(text.to_string()),
    }
}

fn matches_selector(node: Node<'_, '_>, tags: &[&str]) -> bool {
    let Some((last, ancestors)) = tags.split_last() else {
        return false;
    };
    if !node.is_element() || node.tag_name().name() != *last {
        return false;
    }

    // Ancestor tags must appear, innermost first, somewhere above the node
    let mut remaining = ancestors.len();
    for ancestor in node.ancestors().skip(1).filter(|n| n.is_element()) {
        if remaining == 0 {
            break;
        }
        if ancestor.tag_name().name() == ancestors[remaining - 1] {
            remaining -= 1;
        }
    }
    remaining == 0
}
