//! Per-kind attribute configuration
//!
//! Configs arrive as schemaless JSON objects. [`AttributeConfig::parse`] turns
//! one into the strongly typed variant for its kind, rejecting any structural
//! violation with a [`ConfigIssue`] naming the offending field. Once parsed, a
//! config is valid by construction; value checks never re-inspect raw JSON.

use crate::kind::AttributeKind;
use crate::temporal::{parse_time, parse_timestamp};
use mdm_ir::Value;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

/// A structural problem with one config field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: String,
    pub reason: String,
}

impl ConfigIssue {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

type Parsed<T> = std::result::Result<T, ConfigIssue>;

/// Compiled text pattern that remembers its source
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Regex source text
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Unanchored search, like `RegExp.test`
    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.0.is_match(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextConfig {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Pattern>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberConfig {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub decimals: Option<u32>,
    pub step: Option<f64>,
    pub allow_negative: Option<bool>,
    pub allow_zero: Option<bool>,
}

/// Bounds for date, datetime, and time kinds, kept as their source strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemporalConfig {
    pub min: Option<String>,
    pub max: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsConfig {
    pub options: Vec<SelectOption>,
}

impl OptionsConfig {
    /// Whether `value` is one of the option values
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    pub max_size: Option<f64>,
    pub max_files: Option<usize>,
    pub allowed_mime_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectConfig {
    pub properties: Option<BTreeMap<String, Value>>,
    pub required: Vec<String>,
}

/// Element type enforced on `array` values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayItemType {
    String,
    Number,
    Boolean,
}

impl ArrayItemType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ArrayItemType::String => "string",
            ArrayItemType::Number => "number",
            ArrayItemType::Boolean => "boolean",
        }
    }

    /// Whether `value` has this JSON type
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ArrayItemType::String => matches!(value, Value::String(_)),
            ArrayItemType::Number => value.is_finite_number(),
            ArrayItemType::Boolean => matches!(value, Value::Bool(_)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayConfig {
    pub item_type: ArrayItemType,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionConfig {
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub columns: Vec<TableColumn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorFormat {
    #[default]
    Hex,
    Rgb,
    Hsl,
}

impl ColorFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ColorFormat::Hex => "hex",
            ColorFormat::Rgb => "rgb",
            ColorFormat::Hsl => "hsl",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorConfig {
    pub format: Option<ColorFormat>,
}

impl ColorConfig {
    /// Effective format; hex when unset
    #[must_use]
    pub fn format(&self) -> ColorFormat {
        self.format.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichTextConfig {
    pub allowed_tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatingConfig {
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BarcodeConfig {
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCorrectionLevel {
    L,
    M,
    Q,
    H,
}

impl ErrorCorrectionLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCorrectionLevel::L => "L",
            ErrorCorrectionLevel::M => "M",
            ErrorCorrectionLevel::Q => "Q",
            ErrorCorrectionLevel::H => "H",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QrConfig {
    pub error_correction_level: Option<ErrorCorrectionLevel>,
}

/// Kind together with its typed config
#[derive(Debug, Clone)]
pub enum AttributeConfig {
    Text(TextConfig),
    Number(NumberConfig),
    Boolean,
    Date(TemporalConfig),
    DateTime(TemporalConfig),
    Time(TemporalConfig),
    Select(OptionsConfig),
    MultiSelect(OptionsConfig),
    File(FileConfig),
    Image(FileConfig),
    Attachment(FileConfig),
    Object(ObjectConfig),
    Array(ArrayConfig),
    Json,
    Formula(ExpressionConfig),
    Expression(ExpressionConfig),
    Table(TableConfig),
    Color(ColorConfig),
    RichText(RichTextConfig),
    Rating(RatingConfig),
    Barcode(BarcodeConfig),
    Qr(QrConfig),
    ReadOnly,
}

impl AttributeConfig {
    /// Parse and structurally validate a raw config for `kind`
    ///
    /// `null` is read as an empty object. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigIssue`] found.
    pub fn parse(kind: AttributeKind, raw: &Value) -> Parsed<Self> {
        let empty = BTreeMap::new();
        let cfg = match raw {
            Value::Null => &empty,
            Value::Map(map) => map,
            other => {
                return Err(ConfigIssue::new(
                    "config",
                    format!("must be an object, found {}", other.type_name()),
                ));
            }
        };
        let cfg = Fields(cfg);

        Ok(match kind {
            AttributeKind::Text => AttributeConfig::Text(parse_text(&cfg)?),
            AttributeKind::Number => AttributeConfig::Number(parse_number(&cfg)?),
            AttributeKind::Boolean => AttributeConfig::Boolean,
            AttributeKind::Date => AttributeConfig::Date(parse_dates(&cfg)?),
            AttributeKind::DateTime => AttributeConfig::DateTime(parse_dates(&cfg)?),
            AttributeKind::Time => AttributeConfig::Time(parse_times(&cfg)?),
            AttributeKind::Select => AttributeConfig::Select(parse_options(&cfg)?),
            AttributeKind::MultiSelect => AttributeConfig::MultiSelect(parse_options(&cfg)?),
            AttributeKind::File => AttributeConfig::File(parse_file(&cfg)?),
            AttributeKind::Image => AttributeConfig::Image(parse_file(&cfg)?),
            AttributeKind::Attachment => AttributeConfig::Attachment(parse_file(&cfg)?),
            AttributeKind::Object => AttributeConfig::Object(parse_object(&cfg)?),
            AttributeKind::Array => AttributeConfig::Array(parse_array(&cfg)?),
            AttributeKind::Json => AttributeConfig::Json,
            AttributeKind::Formula => AttributeConfig::Formula(parse_expression(&cfg)?),
            AttributeKind::Expression => AttributeConfig::Expression(parse_expression(&cfg)?),
            AttributeKind::Table => AttributeConfig::Table(parse_table(&cfg)?),
            AttributeKind::Color => AttributeConfig::Color(parse_color(&cfg)?),
            AttributeKind::RichText => AttributeConfig::RichText(RichTextConfig {
                allowed_tags: cfg.string_list("allowedTags")?,
            }),
            AttributeKind::Rating => AttributeConfig::Rating(parse_rating(&cfg)?),
            AttributeKind::Barcode => AttributeConfig::Barcode(BarcodeConfig {
                format: cfg.string("format")?,
            }),
            AttributeKind::Qr => AttributeConfig::Qr(parse_qr(&cfg)?),
            AttributeKind::ReadOnly => AttributeConfig::ReadOnly,
        })
    }

    /// Kind this config belongs to
    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeConfig::Text(_) => AttributeKind::Text,
            AttributeConfig::Number(_) => AttributeKind::Number,
            AttributeConfig::Boolean => AttributeKind::Boolean,
            AttributeConfig::Date(_) => AttributeKind::Date,
            AttributeConfig::DateTime(_) => AttributeKind::DateTime,
            AttributeConfig::Time(_) => AttributeKind::Time,
            AttributeConfig::Select(_) => AttributeKind::Select,
            AttributeConfig::MultiSelect(_) => AttributeKind::MultiSelect,
            AttributeConfig::File(_) => AttributeKind::File,
            AttributeConfig::Image(_) => AttributeKind::Image,
            AttributeConfig::Attachment(_) => AttributeKind::Attachment,
            AttributeConfig::Object(_) => AttributeKind::Object,
            AttributeConfig::Array(_) => AttributeKind::Array,
            AttributeConfig::Json => AttributeKind::Json,
            AttributeConfig::Formula(_) => AttributeKind::Formula,
            AttributeConfig::Expression(_) => AttributeKind::Expression,
            AttributeConfig::Table(_) => AttributeKind::Table,
            AttributeConfig::Color(_) => AttributeKind::Color,
            AttributeConfig::RichText(_) => AttributeKind::RichText,
            AttributeConfig::Rating(_) => AttributeKind::Rating,
            AttributeConfig::Barcode(_) => AttributeKind::Barcode,
            AttributeConfig::Qr(_) => AttributeKind::Qr,
            AttributeConfig::ReadOnly => AttributeKind::ReadOnly,
        }
    }

    /// Render back to the raw object form used in catalog files
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut out = Out::default();
        match self {
            AttributeConfig::Text(c) => {
                out.usize("minLength", c.min_length);
                out.usize("maxLength", c.max_length);
                out.string("pattern", c.pattern.as_ref().map(Pattern::as_str));
            }
            AttributeConfig::Number(c) => {
                out.number("min", c.min);
                out.number("max", c.max);
                out.usize("decimals", c.decimals.map(|d| d as usize));
                out.number("step", c.step);
                out.bool("allowNegative", c.allow_negative);
                out.bool("allowZero", c.allow_zero);
            }
            AttributeConfig::Date(c) | AttributeConfig::DateTime(c) | AttributeConfig::Time(c) => {
                out.string("min", c.min.as_deref());
                out.string("max", c.max.as_deref());
            }
            AttributeConfig::Select(c) | AttributeConfig::MultiSelect(c) => {
                let options = c
                    .options
                    .iter()
                    .map(|o| {
                        let mut entry = Out::default();
                        entry.string("value", Some(&o.value));
                        entry.string("label", o.label.as_deref());
                        entry.finish()
                    })
                    .collect();
                out.put("options", Value::List(options));
            }
            AttributeConfig::File(c) | AttributeConfig::Image(c) | AttributeConfig::Attachment(c) => {
                out.number("maxSize", c.max_size);
                out.usize("maxFiles", c.max_files);
                out.strings("allowedMimeTypes", c.allowed_mime_types.as_deref());
            }
            AttributeConfig::Object(c) => {
                if let Some(properties) = &c.properties {
                    out.put("properties", Value::Map(properties.clone()));
                }
                if !c.required.is_empty() {
                    out.strings("required", Some(&c.required));
                }
            }
            AttributeConfig::Array(c) => {
                out.string("itemType", Some(c.item_type.as_str()));
                out.usize("minItems", c.min_items);
                out.usize("maxItems", c.max_items);
            }
            AttributeConfig::Formula(c) | AttributeConfig::Expression(c) => {
                out.string("expression", Some(&c.expression));
            }
            AttributeConfig::Table(c) => {
                let columns = c
                    .columns
                    .iter()
                    .map(|col| {
                        let mut entry = Out::default();
                        entry.string("key", Some(&col.key));
                        entry.string("label", Some(&col.label));
                        entry.finish()
                    })
                    .collect();
                out.put("columns", Value::List(columns));
            }
            AttributeConfig::Color(c) => out.string("format", c.format.map(ColorFormat::as_str)),
            AttributeConfig::RichText(c) => out.strings("allowedTags", c.allowed_tags.as_deref()),
            AttributeConfig::Rating(c) => out.usize("max", c.max.map(|m| m as usize)),
            AttributeConfig::Barcode(c) => out.string("format", c.format.as_deref()),
            AttributeConfig::Qr(c) => out.string(
                "errorCorrectionLevel",
                c.error_correction_level.map(ErrorCorrectionLevel::as_str),
            ),
            AttributeConfig::Boolean | AttributeConfig::Json | AttributeConfig::ReadOnly => {}
        }
        out.finish()
    }
}

/// Typed accessors over a raw config object
struct Fields<'a>(&'a BTreeMap<String, Value>);

impl Fields<'_> {
    /// Present, non-null field
    fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    fn number(&self, field: &str) -> Parsed<Option<f64>> {
        match self.get(field) {
            None => Ok(None),
            Some(v) if v.is_finite_number() => Ok(v.as_f64()),
            Some(_) => Err(ConfigIssue::new(field, "must be a number")),
        }
    }

    fn non_negative_int(&self, field: &str) -> Parsed<Option<usize>> {
        match self.get(field) {
            None => Ok(None),
            Some(v) => match v.as_i64().map(usize::try_from) {
                Some(Ok(n)) => Ok(Some(n)),
                _ => Err(ConfigIssue::new(field, "must be a non-negative integer")),
            },
        }
    }

    fn positive_int(&self, field: &str) -> Parsed<Option<usize>> {
        match self.non_negative_int(field) {
            Ok(Some(0)) | Err(_) => Err(ConfigIssue::new(field, "must be a positive integer")),
            other => other,
        }
    }

    fn bool(&self, field: &str) -> Parsed<Option<bool>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(ConfigIssue::new(field, "must be a boolean")),
        }
    }

    fn string(&self, field: &str) -> Parsed<Option<String>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ConfigIssue::new(field, "must be a string")),
        }
    }

    fn required_string(&self, field: &str) -> Parsed<String> {
        self.string(field)?
            .ok_or_else(|| ConfigIssue::new(field, "is required (string)"))
    }

    fn string_list(&self, field: &str) -> Parsed<Option<Vec<String>>> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        let items = value
            .as_list()
            .ok_or_else(|| ConfigIssue::new(field, "must be an array of strings"))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ConfigIssue::new(field, "entries must be strings"))
            })
            .collect::<Parsed<Vec<_>>>()
            .map(Some)
    }

    /// Required non-empty array of objects
    fn object_list(&self, field: &str) -> Parsed<Vec<Fields<'_>>> {
        let items = self
            .get(field)
            .and_then(Value::as_list)
            .filter(|items| !items.is_empty())
            .ok_or_else(|| ConfigIssue::new(field, "must be a non-empty array"))?;
        items
            .iter()
            .map(|item| {
                item.as_map()
                    .map(Fields)
                    .ok_or_else(|| ConfigIssue::new(field, "entries must be objects"))
            })
            .collect()
    }
}

fn ensure_ordered<T: PartialOrd>(min: Option<T>, max: Option<T>, field: &str, other: &str) -> Parsed<()> {
    match (min, max) {
        (Some(min), Some(max)) if max < min => {
            Err(ConfigIssue::new(field, format!("must be >= {other}")))
        }
        _ => Ok(()),
    }
}

fn parse_text(cfg: &Fields<'_>) -> Parsed<TextConfig> {
    let min_length = cfg.non_negative_int("minLength")?;
    let max_length = cfg.non_negative_int("maxLength")?;
    ensure_ordered(min_length, max_length, "maxLength", "minLength")?;

    let pattern = match cfg.string("pattern")? {
        Some(source) => Some(Pattern(Regex::new(&source).map_err(|e| {
            ConfigIssue::new(
                "pattern",
                format!(
                    "must be a valid regular expression (Rust regex syntax, \
                     no lookaround or backreferences): {e}"
                ),
            )
        })?)),
        None => None,
    };

    Ok(TextConfig {
        min_length,
        max_length,
        pattern,
    })
}

fn parse_number(cfg: &Fields<'_>) -> Parsed<NumberConfig> {
    let min = cfg.number("min")?;
    let max = cfg.number("max")?;
    ensure_ordered(min, max, "max", "min")?;

    let decimals = cfg
        .non_negative_int("decimals")?
        .map(|d| {
            u32::try_from(d).map_err(|_| ConfigIssue::new("decimals", "is out of range"))
        })
        .transpose()?;

    let step = cfg.number("step")?;
    if step.is_some_and(|s| s <= 0.0) {
        return Err(ConfigIssue::new("step", "must be a positive number"));
    }

    Ok(NumberConfig {
        min,
        max,
        decimals,
        step,
        allow_negative: cfg.bool("allowNegative")?,
        allow_zero: cfg.bool("allowZero")?,
    })
}

fn parse_dates(cfg: &Fields<'_>) -> Parsed<TemporalConfig> {
    let parse = |field: &str| -> Parsed<Option<String>> {
        match cfg.string(field)? {
            Some(s) if parse_timestamp(&s).is_none() => {
                Err(ConfigIssue::new(field, "must be a date string"))
            }
            other => Ok(other),
        }
    };
    let config = TemporalConfig {
        min: parse("min")?,
        max: parse("max")?,
    };
    ensure_ordered(
        config.min.as_deref().and_then(parse_timestamp),
        config.max.as_deref().and_then(parse_timestamp),
        "max",
        "min",
    )?;
    Ok(config)
}

fn parse_times(cfg: &Fields<'_>) -> Parsed<TemporalConfig> {
    let parse = |field: &str| -> Parsed<Option<String>> {
        match cfg.string(field)? {
            Some(s) if parse_time(&s).is_none() => {
                Err(ConfigIssue::new(field, "must be a time string HH:MM[:SS]"))
            }
            other => Ok(other),
        }
    };
    let config = TemporalConfig {
        min: parse("min")?,
        max: parse("max")?,
    };
    ensure_ordered(
        config.min.as_deref().and_then(parse_time),
        config.max.as_deref().and_then(parse_time),
        "max",
        "min",
    )?;
    Ok(config)
}

fn parse_options(cfg: &Fields<'_>) -> Parsed<OptionsConfig> {
    let options = cfg
        .object_list("options")?
        .iter()
        .map(|option| {
            let value = option.string("value").ok().flatten().ok_or_else(|| {
                ConfigIssue::new("options", "each option must be { value: string, label?: string }")
            })?;
            let label = option
                .string("label")
                .map_err(|_| ConfigIssue::new("options", "option.label must be a string"))?;
            Ok(SelectOption { value, label })
        })
        .collect::<Parsed<Vec<_>>>()?;
    Ok(OptionsConfig { options })
}

fn parse_file(cfg: &Fields<'_>) -> Parsed<FileConfig> {
    let max_size = cfg.number("maxSize")?;
    if max_size.is_some_and(|s| s <= 0.0) {
        return Err(ConfigIssue::new("maxSize", "must be a positive number (bytes)"));
    }
    Ok(FileConfig {
        max_size,
        max_files: cfg.positive_int("maxFiles")?,
        allowed_mime_types: cfg.string_list("allowedMimeTypes")?,
    })
}

fn parse_object(cfg: &Fields<'_>) -> Parsed<ObjectConfig> {
    let properties = match cfg.get("properties") {
        None => None,
        Some(Value::Map(map)) => Some(map.clone()),
        Some(_) => return Err(ConfigIssue::new("properties", "must be an object")),
    };
    Ok(ObjectConfig {
        properties,
        required: cfg.string_list("required")?.unwrap_or_default(),
    })
}

fn parse_array(cfg: &Fields<'_>) -> Parsed<ArrayConfig> {
    let item_type = match cfg.required_string("itemType")?.as_str() {
        "string" => ArrayItemType::String,
        "number" => ArrayItemType::Number,
        "boolean" => ArrayItemType::Boolean,
        _ => {
            return Err(ConfigIssue::new(
                "itemType",
                "must be one of string|number|boolean",
            ));
        }
    };
    let min_items = cfg.non_negative_int("minItems")?;
    let max_items = cfg.non_negative_int("maxItems")?;
    ensure_ordered(min_items, max_items, "maxItems", "minItems")?;
    Ok(ArrayConfig {
        item_type,
        min_items,
        max_items,
    })
}

fn parse_expression(cfg: &Fields<'_>) -> Parsed<ExpressionConfig> {
    Ok(ExpressionConfig {
        expression: cfg.required_string("expression")?,
    })
}

fn parse_table(cfg: &Fields<'_>) -> Parsed<TableConfig> {
    let columns = cfg
        .object_list("columns")?
        .iter()
        .map(|column| match (column.string("key"), column.string("label")) {
            (Ok(Some(key)), Ok(Some(label))) => Ok(TableColumn { key, label }),
            _ => Err(ConfigIssue::new("columns", "each column must have key and label")),
        })
        .collect::<Parsed<Vec<_>>>()?;
    Ok(TableConfig { columns })
}

fn parse_color(cfg: &Fields<'_>) -> Parsed<ColorConfig> {
    let format = match cfg.get("format") {
        None => None,
        Some(Value::String(s)) if s == "hex" => Some(ColorFormat::Hex),
        Some(Value::String(s)) if s == "rgb" => Some(ColorFormat::Rgb),
        Some(Value::String(s)) if s == "hsl" => Some(ColorFormat::Hsl),
        Some(_) => return Err(ConfigIssue::new("format", "must be one of hex|rgb|hsl")),
    };
    Ok(ColorConfig { format })
}

fn parse_rating(cfg: &Fields<'_>) -> Parsed<RatingConfig> {
    let max = cfg
        .positive_int("max")?
        .map(|m| u32::try_from(m).map_err(|_| ConfigIssue::new("max", "is out of range")))
        .transpose()?;
    Ok(RatingConfig { max })
}

fn parse_qr(cfg: &Fields<'_>) -> Parsed<QrConfig> {
    let level = match cfg.get("errorCorrectionLevel").and_then(Value::as_str) {
        None if cfg.get("errorCorrectionLevel").is_none() => None,
        Some("L") => Some(ErrorCorrectionLevel::L),
        Some("M") => Some(ErrorCorrectionLevel::M),
        Some("Q") => Some(ErrorCorrectionLevel::Q),
        Some("H") => Some(ErrorCorrectionLevel::H),
        _ => {
            return Err(ConfigIssue::new(
                "errorCorrectionLevel",
                "must be one of L|M|Q|H",
            ));
        }
    };
    Ok(QrConfig {
        error_correction_level: level,
    })
}

/// Builder for the raw object form
#[derive(Default)]
struct Out(BTreeMap<String, Value>);

impl Out {
    fn put(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    fn usize(&mut self, key: &str, value: Option<usize>) {
        if let Some(v) = value.and_then(|v| i64::try_from(v).ok()) {
            self.put(key, Value::Integer(v));
        }
    }

    fn number(&mut self, key: &str, value: Option<f64>) {
        if let Some(v) = value {
            let as_value = Value::Float(v);
            self.put(key, as_value.as_i64().map_or(as_value, Value::Integer));
        }
    }

    fn bool(&mut self, key: &str, value: Option<bool>) {
        if let Some(v) = value {
            self.put(key, Value::Bool(v));
        }
    }

    fn string(&mut self, key: &str, value: Option<&str>) {
        if let Some(v) = value {
            self.put(key, Value::String(v.to_string()));
        }
    }

    fn strings(&mut self, key: &str, value: Option<&[String]>) {
        if let Some(v) = value {
            self.put(
                key,
                Value::List(v.iter().map(|s| Value::String(s.clone())).collect()),
            );
        }
    }

    fn finish(self) -> Value {
        Value::Map(self.0)
    }
}
