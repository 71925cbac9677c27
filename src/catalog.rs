//! Build numbers, cache keys and the parsed card catalog
//!
//! A build request is either a concrete build number or the `latest`
//! sentinel. Only concrete builds ever map to a cache key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::num::NonZeroU64;

/// Prefix of every persistent cache key.
pub const CACHE_KEY_PREFIX: &str = "hsjson-build-";

/// Build token substituted into the source template for the latest dataset.
pub const LATEST_TOKEN: &str = "latest";

/// A concrete, non-zero build identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildNumber(NonZeroU64);

impl BuildNumber {
    /// Returns `None` for zero, which never names a build.
    pub fn new(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(Self)
    }

    pub fn get(&self) -> u64 {
        self.0.get()
    }

    /// Persistent cache key, e.g. `hsjson-build-12345`.
    pub fn cache_key(&self) -> String {
        format!("{CACHE_KEY_PREFIX}{}", self.0)
    }

    /// Inverse of [`BuildNumber::cache_key`].
    pub fn from_cache_key(key: &str) -> Option<Self> {
        key.strip_prefix(CACHE_KEY_PREFIX)?
            .parse::<u64>()
            .ok()
            .and_then(Self::new)
    }
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the caller asked for after numeric coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildRequest {
    Build(BuildNumber),
    Latest,
}

impl BuildRequest {
    /// Lenient coercion of user input.
    ///
    /// Empty, non-numeric, zero, negative and fractional values all mean
    /// "latest"; only a positive integer selects a build.
    pub fn coerce(input: &str) -> Self {
        let trimmed = input.trim();
        if let Ok(n) = trimmed.parse::<u64>() {
            return Self::from(n);
        }
        // Accept integral floats such as "12345.0"
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() && f >= 1.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
                Self::from(f as u64)
            }
            _ => Self::Latest,
        }
    }
}

impl From<u64> for BuildRequest {
    fn from(value: u64) -> Self {
        BuildNumber::new(value).map_or(Self::Latest, Self::Build)
    }
}

impl From<u32> for BuildRequest {
    fn from(value: u32) -> Self {
        Self::from(u64::from(value))
    }
}

impl From<Option<u64>> for BuildRequest {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Self::Latest, Self::from)
    }
}

impl From<BuildNumber> for BuildRequest {
    fn from(value: BuildNumber) -> Self {
        Self::Build(value)
    }
}

impl From<&str> for BuildRequest {
    fn from(value: &str) -> Self {
        Self::coerce(value)
    }
}

impl From<String> for BuildRequest {
    fn from(value: String) -> Self {
        Self::coerce(&value)
    }
}

impl From<Option<&str>> for BuildRequest {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Latest, Self::coerce)
    }
}

/// Parsed card catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Catalog(Value);

impl Catalog {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw).map(Self)
    }

    /// Length used by the validity check.
    ///
    /// Arrays report their element count, objects their `length` member
    /// coerced to a number. Scalars have no length.
    pub fn coerced_length(&self) -> Option<f64> {
        match &self.0 {
            Value::Array(items) => Some(items.len() as f64),
            Value::Object(map) => match map.get("length")? {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether a cached copy may be served as-is.
    pub fn is_valid(&self) -> bool {
        self.coerced_length().is_some_and(|len| len > 0.0)
    }

    /// Number of top-level entries (array items or object members).
    pub fn len(&self) -> usize {
        match &self.0 {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Catalog {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
