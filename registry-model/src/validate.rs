//! Field conversion and validation.
//!
//! Validation never stops at the first problem: every field is converted and
//! checked, and all messages end up in one [`FieldErrors`] map. Nested models
//! and lists report their errors as nested maps keyed by field name or list
//! index.

use crate::field::{Choices, DefaultValue, FieldKind};
use crate::schema::{DocumentSchema, Rule, SchemaRegistry};
use crate::PARENT_KEY;
use chrono::FixedOffset;
use registry_types::{generate_id, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

pub const REQUIRED: &str = "This field is required.";
pub const ROGUE_FIELD: &str = "Rogue field";

/// Errors for one field: plain messages, or a nested map for models and
/// lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldError {
    Messages(Vec<String>),
    Nested(BTreeMap<String, FieldError>),
}

impl FieldError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Messages(vec![message.into()])
    }
}

/// Field name → errors, for a whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding one message for one field.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    /// Appends a message. A field that already carries nested errors keeps
    /// them.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        match self
            .0
            .entry(field.to_string())
            .or_insert_with(|| FieldError::Messages(Vec::new()))
        {
            FieldError::Messages(messages) => messages.push(message.into()),
            FieldError::Nested(_) => {}
        }
    }

    pub fn insert(&mut self, field: &str, error: FieldError) {
        self.0.insert(field.to_string(), error);
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldError)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, FieldError> {
        self.0
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

/// Converts and validates JSON objects against registry schemas.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    registry: &'a SchemaRegistry,
    timezone: FixedOffset,
}

impl<'a> Validator<'a> {
    /// `timezone` localises naive timestamps and stamps generated ones.
    pub fn new(registry: &'a SchemaRegistry, timezone: FixedOffset) -> Self {
        Self { registry, timezone }
    }

    /// Validates `data` against `schema`.
    ///
    /// Returns the converted document: timestamps normalised, numbers
    /// coerced, nulls and the parent link dropped, and (with
    /// `apply_defaults`) defaults filled in for missing fields.
    pub fn validate(
        &self,
        schema: &DocumentSchema,
        data: &Map<String, Value>,
        apply_defaults: bool,
    ) -> Result<Map<String, Value>, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut output = Map::new();

        for key in data.keys() {
            if key != PARENT_KEY && schema.field(key).is_none() {
                errors.push(key, ROGUE_FIELD);
            }
        }

        for spec in &schema.fields {
            let raw = match data.get(&spec.name) {
                Some(Value::Null) => None,
                Some(value) => Some(value.clone()),
                None if apply_defaults => spec.default.as_ref().map(|d| self.default_value(d)),
                None => None,
            };
            let Some(raw) = raw else {
                if spec.required {
                    errors.push(&spec.name, REQUIRED);
                }
                continue;
            };
            match self.convert(&spec.kind, &raw, apply_defaults) {
                Ok(value) => {
                    output.insert(spec.name.clone(), value);
                }
                Err(error) => errors.insert(&spec.name, error),
            }
        }

        for rule in &schema.rules {
            self.check_rule(rule, &output, &mut errors);
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(errors)
        }
    }

    fn default_value(&self, default: &DefaultValue) -> Value {
        match default {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::GeneratedId => Value::String(generate_id()),
            DefaultValue::Now => Value::String(Timestamp::now(self.timezone).to_iso()),
            DefaultValue::EmptyList => Value::Array(Vec::new()),
        }
    }

    fn convert(&self, kind: &FieldKind, value: &Value, apply_defaults: bool) -> Result<Value, FieldError> {
        match kind {
            FieldKind::String {
                min_length,
                max_length,
                regex,
                choices,
            } => {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    other => {
                        return Err(FieldError::message(format!(
                            "Couldn't interpret '{other}' as string."
                        )));
                    }
                };
                let mut messages = Vec::new();
                if let Some(choices) = choices {
                    let allowed = self.choices(choices);
                    if !allowed.contains(&text) {
                        messages.push(format!("Value must be one of {}.", format_choices(&allowed)));
                    }
                }
                let length = text.chars().count();
                if max_length.is_some_and(|max| length > max) {
                    messages.push("String value is too long.".into());
                }
                if min_length.is_some_and(|min| length < min) {
                    messages.push("String value is too short.".into());
                }
                if let Some(pattern) = regex {
                    if !self.matches(pattern, &text) {
                        messages.push("String value did not match validation regex.".into());
                    }
                }
                if messages.is_empty() {
                    Ok(Value::String(text))
                } else {
                    Err(FieldError::Messages(messages))
                }
            }
            FieldKind::Float { min } => {
                let number = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .filter(|n| n.is_finite())
                .ok_or_else(|| FieldError::message(format!("Value '{value}' is not float.")))?;
                if let Some(min) = min {
                    if number < *min {
                        return Err(FieldError::message(format!(
                            "Float value should be greater than {min}."
                        )));
                    }
                }
                Ok(Value::from(number))
            }
            FieldKind::Int => {
                let number = match value {
                    Value::Number(n) => n.as_i64().or_else(|| {
                        n.as_f64()
                            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                            .map(|f| f as i64)
                    }),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                }
                .ok_or_else(|| FieldError::message(format!("Value '{value}' is not int.")))?;
                Ok(Value::from(number))
            }
            FieldKind::Bool => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::String(s) if matches!(s.as_str(), "true" | "True" | "1") => Ok(Value::Bool(true)),
                Value::String(s) if matches!(s.as_str(), "false" | "False" | "0") => {
                    Ok(Value::Bool(false))
                }
                Value::Number(n) if n.as_u64() == Some(1) => Ok(Value::Bool(true)),
                Value::Number(n) if n.as_u64() == Some(0) => Ok(Value::Bool(false)),
                _ => Err(FieldError::message("Must be either true or false.")),
            },
            FieldKind::DateTime => match value {
                Value::String(s) => Timestamp::parse(s, self.timezone)
                    .map(|ts| Value::String(ts.to_iso()))
                    .map_err(|e| FieldError::message(e.to_string())),
                other => Err(FieldError::message(format!(
                    "Could not parse {other}. Should be ISO8601."
                ))),
            },
            FieldKind::Url => match value {
                Value::String(s) if is_url(s) => Ok(value.clone()),
                _ => Err(FieldError::message("Not a well formed URL.")),
            },
            FieldKind::Email => match value {
                Value::String(s) if is_email(s) => Ok(value.clone()),
                _ => Err(FieldError::message("Not a well formed email address.")),
            },
            FieldKind::Md5 => match value {
                Value::String(s) => check_hex(s, 32).map(|()| value.clone()),
                _ => Err(FieldError::message("Hash value is not hexadecimal.")),
            },
            FieldKind::Hash => match value {
                Value::String(s) => check_hash(s).map(|()| value.clone()),
                _ => Err(FieldError::message("Hash type is not supported.")),
            },
            FieldKind::Any => Ok(value.clone()),
            FieldKind::Model { schema } => {
                let Value::Object(object) = value else {
                    return Err(FieldError::message("Please use a mapping for this field."));
                };
                let nested = self
                    .registry
                    .get(schema)
                    .map_err(|e| FieldError::message(e.to_string()))?;
                self.validate(nested, object, apply_defaults)
                    .map(Value::Object)
                    .map_err(|errors| FieldError::Nested(errors.into_inner()))
            }
            FieldKind::List { item } => {
                let Value::Array(items) = value else {
                    return Err(FieldError::message("Could not interpret the value as a list"));
                };
                let mut converted = Vec::with_capacity(items.len());
                let mut errors = BTreeMap::new();
                for (index, element) in items.iter().enumerate() {
                    match self.convert(item, element, apply_defaults) {
                        Ok(v) => converted.push(v),
                        Err(e) => {
                            errors.insert(index.to_string(), e);
                        }
                    }
                }
                if errors.is_empty() {
                    Ok(Value::Array(converted))
                } else {
                    Err(FieldError::Nested(errors))
                }
            }
            FieldKind::Dict => match value {
                Value::Object(_) => Ok(value.clone()),
                _ => Err(FieldError::message("Only dictionaries may be used in a DictType")),
            },
        }
    }

    fn choices(&self, choices: &Choices) -> Vec<String> {
        match choices {
            Choices::Values(values) => values.clone(),
            Choices::Catalog(list) => self.registry.catalogs().list(*list),
        }
    }

    fn matches(&self, pattern: &str, text: &str) -> bool {
        match self.registry.pattern(pattern) {
            Some(re) => re.is_match(text),
            None => regex_lite::Regex::new(pattern).is_ok_and(|re| re.is_match(text)),
        }
    }

    /// Cross-field rules only look at fields that converted cleanly.
    fn check_rule(&self, rule: &Rule, output: &Map<String, Value>, errors: &mut FieldErrors) {
        match rule {
            Rule::PeriodOrder { start, end } => {
                if errors.contains(start) || errors.contains(end) {
                    return;
                }
                let parse = |field: &str| {
                    output
                        .get(field)
                        .and_then(Value::as_str)
                        .and_then(|s| Timestamp::parse(s, self.timezone).ok())
                };
                if let (Some(start_at), Some(end_at)) = (parse(start.as_str()), parse(end.as_str())) {
                    if end_at < start_at {
                        errors.push(start, "period should begin before its end");
                    }
                }
            }
            Rule::AtLeastOne {
                target,
                others,
                message,
            } => {
                if errors.contains(target) {
                    return;
                }
                let present = |field: &str| match output.get(field) {
                    None | Some(Value::Null) => false,
                    Some(Value::String(s)) => !s.is_empty(),
                    Some(_) => true,
                };
                if !present(target.as_str()) && !others.iter().any(|f| present(f.as_str())) {
                    errors.push(target, message.clone());
                }
            }
            Rule::CatalogCode { scheme, code } => {
                if errors.contains(scheme) || errors.contains(code) {
                    return;
                }
                let Some(code_value) = output.get(code).and_then(Value::as_str) else {
                    return;
                };
                let codes: Vec<String> = output
                    .get(scheme)
                    .and_then(Value::as_str)
                    .and_then(|s| self.registry.catalogs().codes(s))
                    .map(|codes| codes.iter().cloned().collect())
                    .unwrap_or_default();
                if !codes.iter().any(|c| c == code_value) {
                    errors.push(code, format!("Value must be one of {}.", format_choices(&codes)));
                }
            }
        }
    }
}

fn format_choices(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("'{v}'")).collect();
    format!("[{}]", quoted.join(", "))
}

fn is_url(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    Url::parse(value).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https" | "ftp")
            && url.host_str().is_some_and(|host| !host.is_empty())
    })
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !local.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

fn check_hex(value: &str, expected_len: usize) -> Result<(), FieldError> {
    if value.len() != expected_len {
        return Err(FieldError::message("Hash value is wrong length."));
    }
    if !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(FieldError::message("Hash value is not hexadecimal."));
    }
    Ok(())
}

fn check_hash(value: &str) -> Result<(), FieldError> {
    let Some((algorithm, digest)) = value.split_once(':') else {
        return Err(FieldError::message("Hash type is not supported."));
    };
    let expected_len = match algorithm {
        "md5" => 32,
        "sha1" => 40,
        "sha224" => 56,
        "sha256" => 64,
        "sha384" => 96,
        "sha512" => 128,
        _ => return Err(FieldError::message("Hash type is not supported.")),
    };
    check_hex(digest, expected_len)
}
