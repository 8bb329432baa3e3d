//! Typed setting values and the ordered per-plugin settings map.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::error::ValidationError;

/// A single configuration value.
///
/// Stored on disk as a plain JSON boolean, integer, or string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// Feature flag.
    Bool(bool),
    /// Whole number (durations, counts).
    Int(i64),
    /// Free text.
    Str(String),
}

/// The type of a setting, taken from its default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKind {
    Bool,
    Int,
    Str,
}

impl SettingKind {
    /// Get the display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::Str => "text",
        }
    }
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl SettingValue {
    /// Get the kind of this value.
    pub fn kind(&self) -> SettingKind {
        match self {
            Self::Bool(_) => SettingKind::Bool,
            Self::Int(_) => SettingKind::Int,
            Self::Str(_) => SettingKind::Str,
        }
    }

    /// Whether this value counts as "unset" under merge-by-default.
    ///
    /// Only the empty string qualifies; `false` and `0` are real values.
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Str(s) if s.is_empty())
    }

    /// Convert a stored JSON value.
    ///
    /// Returns `None` for `null`, the empty string, and anything that is not
    /// a boolean, an integer, or a string.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n.as_i64().map(Self::Int),
            serde_json::Value::String(s) if !s.is_empty() => Some(Self::Str(s.clone())),
            _ => None,
        }
    }

    /// Text shown in an input field for this value.
    pub fn as_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Str(s) => s.clone(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "\"{s}\""),
            other => write!(f, "{}", other.as_text()),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Ordered key/value settings of one plugin.
///
/// Keys keep their insertion order so the control surface renders them in
/// the order the plugin declared its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    entries: Vec<(String, SettingValue)>,
}

impl Settings {
    /// Create an empty settings map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or replace a value, keeping the original position of existing keys.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Boolean flag, `None` if missing or not a boolean.
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(SettingValue::as_bool)
    }

    /// Boolean flag with a fallback.
    pub fn bool_or(&self, key: &str, fallback: bool) -> bool {
        self.bool(key).unwrap_or(fallback)
    }

    /// Integer with a fallback for missing, cleared, or mistyped values.
    pub fn int_or(&self, key: &str, fallback: i64) -> i64 {
        self.get(key).and_then(SettingValue::as_int).unwrap_or(fallback)
    }

    /// Text with a fallback for missing or empty values.
    pub fn str_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        match self.get(key).and_then(SettingValue::as_str) {
            Some(s) if !s.is_empty() => s,
            _ => fallback,
        }
    }

    /// Convert to a JSON object (keys in declaration order when serialized).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for Settings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<SettingValue>> FromIterator<(K, V)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut settings = Self::new();
        for (key, value) in iter {
            settings.set(key, value);
        }
        settings
    }
}

/// A discrete user edit of one setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingEdit {
    /// Flip a boolean flag.
    Toggle,
    /// Replace with an already-typed value.
    Set(SettingValue),
    /// Replace with text typed or pasted by the user, coerced to the key's kind.
    Text(String),
    /// Append one typed character.
    Append(char),
    /// Delete the last character.
    Backspace,
}

/// Strip NUL characters and surrounding whitespace from user input.
pub fn sanitize_text(text: &str) -> String {
    text.replace('\0', "").trim().to_string()
}

impl SettingEdit {
    /// Resolve this edit against the current value of a key of the given kind.
    ///
    /// An integer key may be cleared to the empty string; merge-by-default
    /// turns that back into the default on the next load.
    pub fn resolve(
        &self,
        key: &str,
        kind: SettingKind,
        current: Option<&SettingValue>,
    ) -> Result<SettingValue, ValidationError> {
        let current_text = current.map(SettingValue::as_text).unwrap_or_default();

        match (self, kind) {
            (Self::Toggle, SettingKind::Bool) => {
                let flag = current.and_then(SettingValue::as_bool).unwrap_or(false);
                Ok(SettingValue::Bool(!flag))
            }
            (Self::Toggle, _) => Err(ValidationError::NotABoolean { key: key.to_string() }),

            (Self::Set(value), _) => {
                if value.kind() == kind || (kind == SettingKind::Int && value.is_unset()) {
                    Ok(value.clone())
                } else {
                    Err(ValidationError::TypeMismatch {
                        key: key.to_string(),
                        expected: kind,
                        found: value.kind(),
                    })
                }
            }

            (Self::Text(text), SettingKind::Bool) => match sanitize_text(text).as_str() {
                "true" | "on" | "yes" | "1" => Ok(SettingValue::Bool(true)),
                "false" | "off" | "no" | "0" => Ok(SettingValue::Bool(false)),
                _ => Err(ValidationError::NotABoolean { key: key.to_string() }),
            },
            (Self::Text(text), SettingKind::Int) => parse_int(key, &sanitize_text(text)),
            (Self::Text(text), SettingKind::Str) => Ok(SettingValue::Str(sanitize_text(text))),

            (Self::Append(_) | Self::Backspace, SettingKind::Bool) => {
                Err(ValidationError::NotABoolean { key: key.to_string() })
            }
            (Self::Append(c), _) if c.is_control() => {
                Err(ValidationError::NonPrintable { key: key.to_string() })
            }
            (Self::Append(c), SettingKind::Int) => {
                if !c.is_ascii_digit() {
                    return Err(ValidationError::NotAnInteger {
                        key: key.to_string(),
                        input: format!("{current_text}{c}"),
                    });
                }
                parse_int(key, &format!("{current_text}{c}"))
            }
            (Self::Append(c), SettingKind::Str) => Ok(SettingValue::Str(format!("{current_text}{c}"))),

            (Self::Backspace, kind) => {
                let mut text = current_text;
                text.pop();
                if kind == SettingKind::Int {
                    parse_int(key, &text)
                } else {
                    Ok(SettingValue::Str(text))
                }
            }
        }
    }
}

fn parse_int(key: &str, text: &str) -> Result<SettingValue, ValidationError> {
    if text.is_empty() {
        return Ok(SettingValue::Str(String::new()));
    }
    text.parse::<i64>().map(SettingValue::Int).map_err(|_| ValidationError::NotAnInteger {
        key: key.to_string(),
        input: text.to_string(),
    })
}
