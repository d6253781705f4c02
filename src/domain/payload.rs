//! Field-by-field reading of JSON request bodies.
//!
//! Handlers accept bodies as raw JSON and the services pull typed fields out of
//! them here, collecting every problem into one [`FieldErrors`] so a client sees
//! all field messages in a single 400 response.

use crate::error::{AppError, AppResult, FieldErrors, NON_FIELD_ERRORS};
use rust_decimal::Decimal;
use serde_json::{Map, Value as JsonValue};
use std::str::FromStr;

pub const REQUIRED: &str = "This field is required.";
pub const NOT_NULL: &str = "This field may not be null.";
pub const NOT_BLANK: &str = "This field may not be blank.";

/// Constraints for string fields.
#[derive(Debug, Clone, Copy)]
pub struct TextRules {
    pub max_len: Option<usize>,
    pub min_len: Option<usize>,
    pub allow_blank: bool,
    pub trim: bool,
}

impl TextRules {
    /// Non-blank, trimmed, at most 255 characters.
    pub const NAME: TextRules = TextRules {
        max_len: Some(255),
        min_len: None,
        allow_blank: false,
        trim: true,
    };

    /// Passwords keep surrounding whitespace.
    pub const fn password(min_len: usize) -> TextRules {
        TextRules {
            max_len: Some(128),
            min_len: Some(min_len),
            allow_blank: false,
            trim: false,
        }
    }
}

fn type_name(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "str",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "dict",
    }
}

pub struct Payload<'a> {
    map: &'a Map<String, JsonValue>,
    errors: FieldErrors,
}

impl<'a> Payload<'a> {
    pub fn new(value: &'a JsonValue) -> AppResult<Self> {
        match value.as_object() {
            Some(map) => Ok(Self {
                map,
                errors: FieldErrors::new(),
            }),
            None => Err(AppError::field(
                NON_FIELD_ERRORS,
                format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    type_name(value)
                ),
            )),
        }
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    /// Looks the field up, recording "required"/"null" errors as needed.
    fn lookup(&mut self, field: &str, required: bool) -> Option<&'a JsonValue> {
        match self.map.get(field) {
            None => {
                if required {
                    self.errors.add(field, REQUIRED);
                }
                None
            }
            Some(JsonValue::Null) => {
                self.errors.add(field, NOT_NULL);
                None
            }
            Some(v) => Some(v),
        }
    }

    pub fn text(&mut self, field: &str, required: bool, rules: TextRules) -> Option<String> {
        let raw = self.lookup(field, required)?;
        let value = match raw {
            JsonValue::String(s) => s.clone(),
            JsonValue::Number(n) => n.to_string(),
            other => {
                self.errors
                    .add(field, format!("Not a valid string (got {}).", type_name(other)));
                return None;
            }
        };
        let value = if rules.trim {
            value.trim().to_string()
        } else {
            value
        };

        if value.is_empty() {
            if rules.allow_blank {
                return Some(value);
            }
            self.errors.add(field, NOT_BLANK);
            return None;
        }

        let len = value.chars().count();
        if let Some(max) = rules.max_len {
            if len > max {
                self.errors.add(
                    field,
                    format!("Ensure this field has no more than {max} characters."),
                );
                return None;
            }
        }
        if let Some(min) = rules.min_len {
            if len < min {
                self.errors.add(
                    field,
                    format!("Ensure this field has at least {min} characters."),
                );
                return None;
            }
        }
        Some(value)
    }

    pub fn integer(&mut self, field: &str, required: bool) -> Option<i32> {
        const INVALID: &str = "A valid integer is required.";

        let raw = self.lookup(field, required)?;
        let parsed: Option<i64> = match raw {
            JsonValue::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            JsonValue::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        let Some(n) = parsed else {
            self.errors.add(field, INVALID);
            return None;
        };
        match i32::try_from(n) {
            Ok(v) => Some(v),
            Err(_) => {
                self.errors.add(
                    field,
                    format!("Ensure this value is between {} and {}.", i32::MIN, i32::MAX),
                );
                None
            }
        }
    }

    /// Reads a fixed-point decimal and rescales it to `decimal_places`.
    pub fn decimal(
        &mut self,
        field: &str,
        required: bool,
        max_digits: u32,
        decimal_places: u32,
    ) -> Option<Decimal> {
        const INVALID: &str = "A valid number is required.";

        let raw = self.lookup(field, required)?;
        let text = match raw {
            JsonValue::Number(n) => n.to_string(),
            JsonValue::String(s) => s.trim().to_string(),
            _ => {
                self.errors.add(field, INVALID);
                return None;
            }
        };
        let parsed = Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text));
        let Ok(value) = parsed else {
            self.errors.add(field, INVALID);
            return None;
        };

        let normalized = value.normalize();
        if normalized.scale() > decimal_places {
            self.errors.add(
                field,
                format!("Ensure that there are no more than {decimal_places} decimal places."),
            );
            return None;
        }
        let whole = normalized.trunc().abs();
        let whole_digits = if whole.is_zero() {
            0
        } else {
            whole.to_string().len() as u32
        };
        let max_whole = max_digits.saturating_sub(decimal_places);
        if whole_digits > max_whole {
            self.errors.add(
                field,
                format!(
                    "Ensure that there are no more than {max_whole} digits \
                     before the decimal point."
                ),
            );
            return None;
        }

        let mut value = normalized;
        value.rescale(decimal_places);
        Some(value)
    }

    /// Reads a list of primary keys, dropping duplicates but keeping order.
    pub fn id_list(&mut self, field: &str, required: bool) -> Option<Vec<i64>> {
        let raw = self.lookup(field, required)?;
        let JsonValue::Array(items) = raw else {
            self.errors.add(
                field,
                format!("Expected a list of items but got type \"{}\".", type_name(raw)),
            );
            return None;
        };

        let mut ids = Vec::with_capacity(items.len());
        let mut ok = true;
        for item in items {
            let id = match item {
                JsonValue::Number(n) => n.as_i64(),
                JsonValue::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            match id {
                Some(id) => {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                None => {
                    self.errors.add(
                        field,
                        format!("Incorrect type. Expected pk value, received {}.", type_name(item)),
                    );
                    ok = false;
                }
            }
        }
        ok.then_some(ids)
    }

    pub fn boolean(&mut self, field: &str, required: bool) -> Option<bool> {
        let raw = self.lookup(field, required)?;
        let parsed = match raw {
            JsonValue::Bool(b) => Some(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            JsonValue::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "t" | "1" | "yes" | "on" => Some(true),
                "false" | "f" | "0" | "no" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        };
        if parsed.is_none() {
            self.errors.add(field, "Must be a valid boolean.");
        }
        parsed
    }

    /// Ends reading; fails with every collected field error.
    pub fn finish(self) -> AppResult<()> {
        self.errors.into_result()
    }
}

/// Parses a comma-separated id list from a query string parameter.
pub fn parse_id_csv(field: &str, raw: &str) -> AppResult<Vec<i64>> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<i64>() {
            Ok(id) => ids.push(id),
            Err(_) => {
                return Err(AppError::field(
                    field,
                    format!("\"{part}\" is not a valid id."),
                ))
            }
        }
    }
    Ok(ids)
}
