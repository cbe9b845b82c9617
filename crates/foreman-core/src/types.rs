use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;

/// A single value collected from the user during a wizard step
///
/// This is a wrapper around a JSON value with some helper methods
/// for working with data in different formats.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DataPacket {
    /// The inner JSON value
    pub value: serde_json::Value,
}

/// Accumulated wizard data, keyed by field name
///
/// Patches supplied by each step are shallow-merged into this map: a key
/// present in the patch overwrites the stored value, keys absent from the
/// patch are left untouched.
pub type FlowData = HashMap<String, DataPacket>;

impl DataPacket {
    /// Create a new data packet from a JSON value
    #[inline]
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Create a null data packet
    #[inline]
    pub fn null() -> Self {
        Self {
            value: serde_json::Value::Null,
        }
    }

    /// Get the inner JSON value
    #[inline]
    pub fn as_value(&self) -> &serde_json::Value {
        &self.value
    }

    /// Take ownership of the inner JSON value
    #[inline]
    pub fn into_value(self) -> serde_json::Value {
        self.value
    }

    /// Check if the data packet is null
    #[inline]
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Try to convert the data packet to a string
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    /// Try to convert the data packet to a number
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }

    /// Try to convert the data packet to an integer
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        self.value.as_i64()
    }

    /// Try to convert the data packet to a boolean
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }

    /// Try to convert the data packet to an object
    #[inline]
    pub fn as_object(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.value.as_object()
    }

    /// Try to convert the data packet to a specific type
    pub fn to<T>(&self) -> Result<T, serde_json::Error>
    where
        T: for<'de> DeserializeOwned,
    {
        serde_json::from_value(self.value.clone())
    }

    /// Create a data packet from a serializable value
    pub fn from<T>(value: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize,
    {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    /// Create a data packet from a string or string reference
    #[inline]
    pub fn from_string(s: &str) -> Self {
        Self::new(serde_json::Value::String(s.to_string()))
    }
}

impl std::str::FromStr for DataPacket {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(serde_json::Value::String(s.to_string())))
    }
}

/// Build a [`FlowData`] map from `(key, value)` pairs
///
/// Convenience for callers assembling a step patch by hand.
pub fn flow_data<I, K>(pairs: I) -> FlowData
where
    I: IntoIterator<Item = (K, serde_json::Value)>,
    K: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), DataPacket::new(v)))
        .collect()
}
