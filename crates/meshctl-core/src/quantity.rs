//! Kubernetes resource quantities (`100m`, `64Mi`, `1.5`)

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

static QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]+(?:\.[0-9]+)?|\.[0-9]+)(m|k|M|G|T|P|E|Ki|Mi|Gi|Ti|Pi|Ei|[eE][0-9]+)?$")
        .expect("valid regex")
});

/// A non-negative resource quantity, kept in the form the user wrote it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity(String);

impl Quantity {
    /// Parse a quantity, returning the reason it was rejected on failure
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.is_empty() {
            return Err("value is empty".to_string());
        }
        if s.starts_with('-') {
            return Err(format!("\"{}\" is negative", s));
        }
        if !QUANTITY.is_match(s) {
            return Err(format!("\"{}\" is not a number with an optional unit suffix", s));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Quantity::parse(&raw).map_err(serde::de::Error::custom)
    }
}
