//! Value rules for every attribute kind

use mdm_ir::Value;
use mdm_schema::config::{
    ArrayConfig, ColorConfig, ColorFormat, FileConfig, NumberConfig, ObjectConfig, OptionsConfig,
    Pattern, RatingConfig, TemporalConfig, TextConfig,
};
use mdm_schema::temporal::{parse_time, parse_timestamp};
use mdm_schema::{AttributeConfig, AttributeDefinition};
use regex::Regex;
use std::sync::LazyLock;

static HEX_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("hex color pattern is a valid regex")
});

const STEP_TOLERANCE: f64 = 1e-9;

/// Validation rule result
#[derive(Debug, Clone)]
pub struct RuleResult {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl RuleResult {
    #[must_use]
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }

    /// Run `next` only while still valid
    #[must_use]
    pub fn and_then(self, next: impl FnOnce() -> RuleResult) -> Self {
        if self.is_valid { next() } else { self }
    }
}

/// Validate a value against a definition
///
/// # Errors
///
/// [`crate::Error::Value`] naming the attribute code and the failed rule.
pub fn validate_value(definition: &AttributeDefinition, value: &Value) -> crate::Result<()> {
    let result = check_value(&definition.config, value);
    if result.is_valid {
        Ok(())
    } else {
        Err(crate::Error::value(
            &definition.code,
            result.message.unwrap_or_default(),
        ))
    }
}

/// Check a value against a typed config
#[must_use]
pub fn check_value(config: &AttributeConfig, value: &Value) -> RuleResult {
    match config {
        AttributeConfig::Text(c) => check_text(c, value),
        AttributeConfig::Number(c) => check_number(c, value),
        AttributeConfig::Boolean => match value {
            Value::Bool(_) => RuleResult::valid(),
            other => expected("boolean", other),
        },
        AttributeConfig::Date(c) | AttributeConfig::DateTime(c) => check_date(c, value),
        AttributeConfig::Time(c) => check_time(c, value),
        AttributeConfig::Select(c) => check_select(c, value),
        AttributeConfig::MultiSelect(c) => check_multiselect(c, value),
        AttributeConfig::File(_)
        | AttributeConfig::Image(_)
        | AttributeConfig::RichText(_)
        | AttributeConfig::Barcode(_)
        | AttributeConfig::Qr(_) => check_string(value),
        AttributeConfig::Attachment(c) => check_attachment(c, value),
        AttributeConfig::Object(c) => check_object(c, value),
        AttributeConfig::Array(c) => check_array(c, value),
        AttributeConfig::Table(_) => check_table(value),
        AttributeConfig::Color(c) => check_color(c, value),
        AttributeConfig::Rating(c) => check_rating(c, value),
        AttributeConfig::Json
        | AttributeConfig::Formula(_)
        | AttributeConfig::Expression(_)
        | AttributeConfig::ReadOnly => RuleResult::valid(),
    }
}

fn expected(what: &str, found: &Value) -> RuleResult {
    RuleResult::invalid(format!("must be a {what}, found {}", found.type_name()))
}

fn check_string(value: &Value) -> RuleResult {
    match value {
        Value::String(_) => RuleResult::valid(),
        other => expected("string", other),
    }
}

/// Validate length constraints on character count
#[must_use]
pub fn validate_length(value: &str, min: Option<usize>, max: Option<usize>) -> RuleResult {
    let len = value.chars().count();

    if let Some(min) = min {
        if len < min {
            return RuleResult::invalid(format!("length {len} is less than minimum {min}"));
        }
    }

    if let Some(max) = max {
        if len > max {
            return RuleResult::invalid(format!("length {len} exceeds maximum {max}"));
        }
    }

    RuleResult::valid()
}

/// Validate pattern matching anywhere in the value
#[must_use]
pub fn validate_pattern(value: &str, pattern: &Pattern) -> RuleResult {
    if pattern.is_match(value) {
        RuleResult::valid()
    } else {
        RuleResult::invalid(format!(
            "value '{value}' does not match pattern '{}'",
            pattern.as_str()
        ))
    }
}

fn check_text(config: &TextConfig, value: &Value) -> RuleResult {
    let Value::String(text) = value else {
        return expected("string", value);
    };
    validate_length(text, config.min_length, config.max_length).and_then(|| {
        config
            .pattern
            .as_ref()
            .map_or_else(RuleResult::valid, |p| validate_pattern(text, p))
    })
}

fn check_number(config: &NumberConfig, value: &Value) -> RuleResult {
    let Some(n) = value.as_f64().filter(|n| n.is_finite()) else {
        return expected("finite number", value);
    };

    if let Some(min) = config.min {
        if n < min {
            return RuleResult::invalid(format!("{n} is less than minimum {min}"));
        }
    }
    if let Some(max) = config.max {
        if n > max {
            return RuleResult::invalid(format!("{n} exceeds maximum {max}"));
        }
    }
    if let Some(decimals) = config.decimals {
        let places = match value {
            Value::Integer(_) => 0,
            _ => decimal_places(n),
        };
        if places > decimals {
            return RuleResult::invalid(format!(
                "{n} has {places} decimal places, at most {decimals} allowed"
            ));
        }
    }
    if let Some(step) = config.step {
        let steps = (n - config.min.unwrap_or(0.0)) / step;
        if (steps - steps.round()).abs() > STEP_TOLERANCE {
            return RuleResult::invalid(format!("{n} is not a multiple of step {step}"));
        }
    }
    if config.allow_negative == Some(false) && n < 0.0 {
        return RuleResult::invalid("negative values are not allowed");
    }
    if config.allow_zero == Some(false) && n == 0.0 {
        return RuleResult::invalid("zero is not allowed");
    }

    RuleResult::valid()
}

fn check_date(config: &TemporalConfig, value: &Value) -> RuleResult {
    let Some(text) = value.as_str() else {
        return expected("date string", value);
    };
    let Some(ts) = parse_timestamp(text) else {
        return RuleResult::invalid(format!("'{text}' is not a valid date"));
    };

    if let Some(min) = config.min.as_deref() {
        if parse_timestamp(min).is_some_and(|min_ts| ts < min_ts) {
            return RuleResult::invalid(format!("'{text}' is before minimum {min}"));
        }
    }
    if let Some(max) = config.max.as_deref() {
        if parse_timestamp(max).is_some_and(|max_ts| ts > max_ts) {
            return RuleResult::invalid(format!("'{text}' is after maximum {max}"));
        }
    }

    RuleResult::valid()
}

fn check_time(config: &TemporalConfig, value: &Value) -> RuleResult {
    let Some(text) = value.as_str() else {
        return expected("time string", value);
    };
    let Some(time) = parse_time(text) else {
        return RuleResult::invalid(format!("'{text}' is not a valid time (HH:MM[:SS])"));
    };

    if let Some(min) = config.min.as_deref() {
        if parse_time(min).is_some_and(|min_time| time < min_time) {
            return RuleResult::invalid(format!("'{text}' is before minimum {min}"));
        }
    }
    if let Some(max) = config.max.as_deref() {
        if parse_time(max).is_some_and(|max_time| time > max_time) {
            return RuleResult::invalid(format!("'{text}' is after maximum {max}"));
        }
    }

    RuleResult::valid()
}

fn option_values(config: &OptionsConfig) -> String {
    config
        .options
        .iter()
        .map(|o| o.value.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn check_select(config: &OptionsConfig, value: &Value) -> RuleResult {
    match value.as_str() {
        Some(choice) if config.contains(choice) => RuleResult::valid(),
        _ => RuleResult::invalid(format!(
            "{value} is not one of: {}",
            option_values(config)
        )),
    }
}

fn check_multiselect(config: &OptionsConfig, value: &Value) -> RuleResult {
    let Some(choices) = value.as_list() else {
        return expected("array", value);
    };
    for choice in choices {
        if !choice.as_str().is_some_and(|c| config.contains(c)) {
            return RuleResult::invalid(format!(
                "{choice} is not one of: {}",
                option_values(config)
            ));
        }
    }
    RuleResult::valid()
}

fn check_attachment(config: &FileConfig, value: &Value) -> RuleResult {
    let Some(files) = value.as_list() else {
        return expected("array of strings", value);
    };
    if files.iter().any(|f| f.as_str().is_none()) {
        return RuleResult::invalid("attachments must be strings");
    }
    if let Some(max) = config.max_files {
        if files.len() > max {
            return RuleResult::invalid(format!("{} files exceeds maximum {max}", files.len()));
        }
    }
    RuleResult::valid()
}

fn check_object(config: &ObjectConfig, value: &Value) -> RuleResult {
    let Some(map) = value.as_map() else {
        return expected("object", value);
    };
    match config.required.iter().find(|key| !map.contains_key(*key)) {
        Some(missing) => RuleResult::invalid(format!("missing required key '{missing}'")),
        None => RuleResult::valid(),
    }
}

fn check_array(config: &ArrayConfig, value: &Value) -> RuleResult {
    let Some(items) = value.as_list() else {
        return expected("array", value);
    };
    if let Some(index) = items.iter().position(|item| !config.item_type.accepts(item)) {
        return RuleResult::invalid(format!(
            "item {index} must be a {}, found {}",
            config.item_type.as_str(),
            items[index].type_name()
        ));
    }
    if let Some(min) = config.min_items {
        if items.len() < min {
            return RuleResult::invalid(format!("{} items is less than minimum {min}", items.len()));
        }
    }
    if let Some(max) = config.max_items {
        if items.len() > max {
            return RuleResult::invalid(format!("{} items exceeds maximum {max}", items.len()));
        }
    }
    RuleResult::valid()
}

fn check_table(value: &Value) -> RuleResult {
    match value.as_list() {
        Some(rows) if rows.iter().all(|row| row.as_map().is_some()) => RuleResult::valid(),
        Some(_) => RuleResult::invalid("table rows must be objects"),
        None => expected("array of rows", value),
    }
}

fn check_color(config: &ColorConfig, value: &Value) -> RuleResult {
    let Some(color) = value.as_str() else {
        return expected("string", value);
    };
    if config.format() == ColorFormat::Hex && !HEX_COLOR_RE.is_match(color) {
        return RuleResult::invalid(format!("'{color}' is not a hex color (#RGB or #RRGGBB)"));
    }
    RuleResult::valid()
}

fn check_rating(config: &RatingConfig, value: &Value) -> RuleResult {
    let Some(rating) = value
        .as_f64()
        .filter(|r| r.is_finite() && r.fract() == 0.0 && *r >= 0.0)
    else {
        return expected("non-negative integer", value);
    };
    match config.max {
        Some(max) if rating > f64::from(max) => {
            RuleResult::invalid(format!("{rating} exceeds maximum rating {max}"))
        }
        _ => RuleResult::valid(),
    }
}

/// Fractional digits in the shortest round-trip decimal form of `n`
#[must_use]
pub fn decimal_places(n: f64) -> u32 {
    let text = n.to_string();
    text.split_once('.')
        .map_or(0, |(_, fraction)| u32::try_from(fraction.len()).unwrap_or(u32::MAX))
}
