#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # mdm-validation
//!
//! Value rules for every attribute kind, definition-write checks, and the
//! normalizer that turns supplied attribute values into a stored map.
//!
//! Everything here is pure: no I/O and no logging.
//!
//! ## Example Usage
//!
//! ```rust
//! use mdm_ir::{AttributeMap, Value};
//! use mdm_schema::{AttributeDefinition, AttributeKind, DefinitionSet};
//! use mdm_validation::{normalize, WriteMode};
//!
//! let weight = AttributeDefinition::parse("d1", "weight", AttributeKind::Number, &Value::Null)
//!     .unwrap()
//!     .with_default(1);
//! let definitions: DefinitionSet = std::iter::once(weight).collect();
//!
//! let out = normalize(&definitions, &AttributeMap::new(), &AttributeMap::new(), WriteMode::Create)
//!     .unwrap();
//! assert_eq!(out["weight"], Value::Integer(1));
//! ```

pub mod definition;
pub mod engine;
pub mod reporter;
pub mod rules;

pub use definition::{check_definition, validate_definition};
pub use engine::{WriteMode, normalize};
pub use reporter::{Severity, ValidationIssue, ValidationReport, ValidationReporter, audit_values};
pub use rules::{RuleResult, check_value, validate_length, validate_pattern, validate_value};

use thiserror::Error;

/// Errors raised by definition checks and normalization
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] mdm_schema::Error),

    #[error("Invalid default value for attribute '{code}': {reason}")]
    InvalidDefault { code: String, reason: String },

    #[error("Invalid value for attribute '{code}': {reason}")]
    Value { code: String, reason: String },

    #[error("Unknown attribute: {code}")]
    UnknownAttribute { code: String },

    #[error("Missing required attribute: {code}")]
    MissingRequired { code: String },

    #[error("Attribute '{code}' is readonly and cannot be changed")]
    Readonly { code: String },
}

impl Error {
    /// Value rule failure for one attribute
    pub fn value(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Value {
            code: code.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
