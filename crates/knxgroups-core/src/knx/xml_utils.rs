use roxmltree::Node;
use std::fmt;

use crate::knx::address::GroupAddress;

#[derive(Debug)]
pub enum ParseError {
    MissingRequiredAttribute {
        element: String,
        attribute: String,
        context: String,
    },
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
        expected: String,
        context: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingRequiredAttribute { element, attribute, context } => {
                write!(f, "Missing required attribute '{}' on {} ({})", attribute, element, context)
            }
            ParseError::InvalidAttribute { element, attribute, value, expected, context } => {
                write!(f, "Invalid attribute '{}' on {}: '{}' (expected {}) ({})", attribute, element, value, expected, context)
            }
        }
    }
}

impl std::error::Error for ParseError {}

pub fn attr_value(node: &Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

pub fn required_attribute(node: &Node<'_, '_>, name: &str) -> Result<String, ParseError> {
    let value = node.attribute(name).map(str::trim).unwrap_or("");
    if value.is_empty() {
        return Err(ParseError::MissingRequiredAttribute {
            element: node.tag_name().name().to_string(),
            attribute: name.to_string(),
            context: node_context(node),
        });
    }
    Ok(value.to_string())
}

/// Reads a group address attribute in any notation ETS writes.
pub fn required_group_address(node: &Node<'_, '_>, name: &str) -> Result<GroupAddress, ParseError> {
    let raw = required_attribute(node, name)?;
    GroupAddress::parse(&raw).ok_or_else(|| ParseError::InvalidAttribute {
        element: node.tag_name().name().to_string(),
        attribute: name.to_string(),
        value: raw,
        expected: "group address".to_string(),
        context: node_context(node),
    })
}

pub fn strip_bom(input: &str) -> &str {
    input.strip_prefix('\u{feff}').unwrap_or(input)
}

pub fn short_id(full_id: &str) -> String {
    full_id.rsplit('_').next().unwrap_or(full_id).to_string()
}

fn node_context(node: &Node<'_, '_>) -> String {
    format!("offset {}", node.range().start)
}
