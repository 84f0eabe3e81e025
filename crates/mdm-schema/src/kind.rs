//! The closed set of attribute kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of an attribute definition
///
/// Wire names are the lowercase strings used in catalog files
/// (`"text"`, `"datetime"`, `"rich_text"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    // Basic types
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    #[serde(rename = "time")]
    Time,

    // Enumerations
    #[serde(rename = "select")]
    Select,
    #[serde(rename = "multiselect")]
    MultiSelect,

    // File and media
    #[serde(rename = "file")]
    File,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "attachment")]
    Attachment,

    // Composite
    #[serde(rename = "object")]
    Object,
    #[serde(rename = "array")]
    Array,
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "formula")]
    Formula,
    #[serde(rename = "expression")]
    Expression,
    #[serde(rename = "table")]
    Table,

    // UI components
    #[serde(rename = "color")]
    Color,
    #[serde(rename = "rich_text")]
    RichText,
    #[serde(rename = "rating")]
    Rating,
    #[serde(rename = "barcode")]
    Barcode,
    #[serde(rename = "qr")]
    Qr,

    #[serde(rename = "readonly")]
    ReadOnly,
}

impl AttributeKind {
    /// Every kind, in declaration order
    pub const ALL: [AttributeKind; 23] = [
        AttributeKind::Text,
        AttributeKind::Number,
        AttributeKind::Boolean,
        AttributeKind::Date,
        AttributeKind::DateTime,
        AttributeKind::Time,
        AttributeKind::Select,
        AttributeKind::MultiSelect,
        AttributeKind::File,
        AttributeKind::Image,
        AttributeKind::Attachment,
        AttributeKind::Object,
        AttributeKind::Array,
        AttributeKind::Json,
        AttributeKind::Formula,
        AttributeKind::Expression,
        AttributeKind::Table,
        AttributeKind::Color,
        AttributeKind::RichText,
        AttributeKind::Rating,
        AttributeKind::Barcode,
        AttributeKind::Qr,
        AttributeKind::ReadOnly,
    ];

    /// Wire name of the kind
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeKind::Text => "text",
            AttributeKind::Number => "number",
            AttributeKind::Boolean => "boolean",
            AttributeKind::Date => "date",
            AttributeKind::DateTime => "datetime",
            AttributeKind::Time => "time",
            AttributeKind::Select => "select",
            AttributeKind::MultiSelect => "multiselect",
            AttributeKind::File => "file",
            AttributeKind::Image => "image",
            AttributeKind::Attachment => "attachment",
            AttributeKind::Object => "object",
            AttributeKind::Array => "array",
            AttributeKind::Json => "json",
            AttributeKind::Formula => "formula",
            AttributeKind::Expression => "expression",
            AttributeKind::Table => "table",
            AttributeKind::Color => "color",
            AttributeKind::RichText => "rich_text",
            AttributeKind::Rating => "rating",
            AttributeKind::Barcode => "barcode",
            AttributeKind::Qr => "qr",
            AttributeKind::ReadOnly => "readonly",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttributeKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| crate::Error::UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for kind in AttributeKind::ALL {
            let parsed: AttributeKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);

            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_unknown_kind() {
        let result = "currency".parse::<AttributeKind>();
        assert!(matches!(result, Err(crate::Error::UnknownKind(k)) if k == "currency"));
    }

    #[test]
    fn test_multi_word_names() {
        assert_eq!(AttributeKind::DateTime.as_str(), "datetime");
        assert_eq!(AttributeKind::MultiSelect.as_str(), "multiselect");
        assert_eq!(AttributeKind::RichText.as_str(), "rich_text");
        assert_eq!(AttributeKind::ReadOnly.as_str(), "readonly");
    }
}
