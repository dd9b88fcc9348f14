use serde::{Deserialize, Serialize};

pub type ProcessId = i32;

// Attribute names as the platform accessibility API spells them.
pub const ROLE: &str = "AXRole";
pub const SUBROLE: &str = "AXSubrole";
pub const IDENTIFIER: &str = "AXIdentifier";
pub const TITLE: &str = "AXTitle";
pub const DESCRIPTION: &str = "AXDescription";
pub const HELP: &str = "AXHelp";
pub const HIDDEN: &str = "AXHidden";
pub const VALUE: &str = "AXValue";
pub const CHILDREN: &str = "AXChildren";
pub const PARENT: &str = "AXParent";
pub const MENU_BAR: &str = "AXMenuBar";
pub const EXTRAS_MENU_BAR: &str = "AXExtrasMenuBar";

/// Label-bearing attributes, in the order a title is derived from them.
pub const LABEL_ATTRIBUTES: [&str; 3] = [TITLE, DESCRIPTION, HELP];

/// A decoded attribute value read from a foreign element.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue<E> {
    Text(String),
    Bool(bool),
    Number(f64),
    Element(E),
    Elements(Vec<E>),
}

impl<E> AttrValue<E> {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Booleans arrive either natively or as numbers (0 / non-zero).
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            AttrValue::Number(n) => Some(*n != 0.0),
            _ => None,
        }
    }

    pub fn into_element(self) -> Option<E> {
        match self {
            AttrValue::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_elements(self) -> Option<Vec<E>> {
        match self {
            AttrValue::Elements(v) => Some(v),
            _ => None,
        }
    }
}

/// Scalar attribute value as written in fixture files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl<E> From<&ScalarValue> for AttrValue<E> {
    fn from(value: &ScalarValue) -> Self {
        match value {
            ScalarValue::Bool(b) => AttrValue::Bool(*b),
            ScalarValue::Number(n) => AttrValue::Number(*n),
            ScalarValue::Text(s) => AttrValue::Text(s.clone()),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Number(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}
