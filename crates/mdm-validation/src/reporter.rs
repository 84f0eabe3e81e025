//! Collected validation issues for catalog audits
//!
//! [`crate::normalize`] stops at the first violation. Auditing a whole catalog
//! wants every problem at once, so [`audit_values`] records issues into a
//! [`ValidationReport`] instead of returning early.

use crate::rules::check_value;
use mdm_ir::AttributeMap;
use mdm_schema::DefinitionSet;
use serde::Serialize;
use std::fmt::Write;

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks the write
    Error,
    /// Worth a look, does not block
    Warning,
}

/// One finding, located by entity and attribute where known
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            entity: None,
            attribute: None,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(message)
        }
    }

    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

/// Ordered list of issues
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Append another report, tagging its issues with `entity` when untagged
    pub fn merge(&mut self, entity: &str, other: ValidationReport) {
        self.issues.extend(other.issues.into_iter().map(|mut issue| {
            issue.entity.get_or_insert_with(|| entity.to_string());
            issue
        }));
    }

    /// No errors recorded (warnings allowed)
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }

    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check a stored attribute map against its definitions, collecting every issue
///
/// Reports unknown keys, required attributes with neither a value nor a
/// default, and values that break their definition's rules.
#[must_use]
pub fn audit_values(definitions: &DefinitionSet, values: &AttributeMap) -> ValidationReport {
    let mut report = ValidationReport::new();

    for code in values.keys().filter(|code| !definitions.contains(code)) {
        report.add(ValidationIssue::error("unknown attribute").with_attribute(code));
    }

    for def in definitions {
        match values.get(&def.code) {
            Some(value) => {
                let result = check_value(&def.config, value);
                if !result.is_valid {
                    report.add(
                        ValidationIssue::error(result.message.unwrap_or_default())
                            .with_attribute(&def.code),
                    );
                }
            }
            None if def.required && def.default_value.is_none() => {
                report.add(ValidationIssue::error("missing required attribute").with_attribute(&def.code));
            }
            None => {}
        }
    }

    report
}

/// Renders reports as plain text
pub struct ValidationReporter;

impl ValidationReporter {
    /// Create a new validation reporter
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// One line per issue, then a summary line
    #[must_use]
    pub fn render(&self, report: &ValidationReport) -> String {
        let mut out = String::new();
        for issue in report.issues() {
            let label = match issue.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            let location = match (&issue.entity, &issue.attribute) {
                (Some(entity), Some(attribute)) => format!("{entity}.{attribute}: "),
                (Some(entity), None) => format!("{entity}: "),
                (None, Some(attribute)) => format!("{attribute}: "),
                (None, None) => String::new(),
            };
            let _ = writeln!(out, "{label}: {location}{}", issue.message);
        }
        let _ = write!(
            out,
            "{} error(s), {} warning(s)",
            report.error_count(),
            report.warning_count()
        );
        out
    }
}

impl Default for ValidationReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdm_ir::Value;
    use mdm_schema::{AttributeDefinition, AttributeKind};
    use serde_json::json;

    fn definitions() -> DefinitionSet {
        vec![
            AttributeDefinition::parse("d1", "name", AttributeKind::Text, &Value::Null)
                .unwrap()
                .with_required(true),
            AttributeDefinition::parse("d2", "rating", AttributeKind::Rating, &Value::from(json!({"max": 5})))
                .unwrap(),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_audit_collects_every_issue() {
        let values = Value::from(json!({"rating": 9, "color": "red"})).into_map().unwrap();
        let report = audit_values(&definitions(), &values);

        assert!(!report.is_valid());
        assert_eq!(report.error_count(), 3);
        let attributes: Vec<_> = report
            .issues()
            .iter()
            .filter_map(|i| i.attribute.as_deref())
            .collect();
        assert_eq!(attributes, vec!["color", "name", "rating"]);
    }

    #[test]
    fn test_audit_clean_values() {
        let values = Value::from(json!({"name": "Shirt", "rating": 4})).into_map().unwrap();
        assert!(audit_values(&definitions(), &values).is_empty());
    }

    #[test]
    fn test_merge_tags_entity_and_render() {
        let mut inner = ValidationReport::new();
        inner.add(ValidationIssue::error("bad").with_attribute("a"));
        inner.add(ValidationIssue::warning("odd").with_entity("other"));

        let mut report = ValidationReport::new();
        report.merge("item:1", inner);

        assert_eq!(report.issues()[0].entity.as_deref(), Some("item:1"));
        assert_eq!(report.issues()[1].entity.as_deref(), Some("other"));
        assert!(!report.is_valid());
        assert_eq!(report.warning_count(), 1);

        let text = ValidationReporter::new().render(&report);
        assert!(text.contains("error: item:1.a: bad"));
        assert!(text.contains("warning: other: odd"));
        assert!(text.ends_with("1 error(s), 1 warning(s)"));
    }
}
