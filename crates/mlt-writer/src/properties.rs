//! Scalar property values and their canonical text form.
//!
//! MLT stores every property as a string. Values are kept typed while the
//! document is assembled and only flattened to text when written.

use std::fmt;

use indexmap::IndexMap;
use otmlt_common::error::{OtmltError, OtmltResult};
use serde::{Deserialize, Serialize};

/// Ordered property set, keyed by property name.
pub type PropertyMap = IndexMap<String, PropertyValue>;

/// A scalar configuration or metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// Shortest text that parses back to the same float, always with a
/// fractional part or exponent (`2.0`, `-0.5`, `1e16`).
pub fn format_float(value: f64) -> String {
    format!("{value:?}")
}

/// Flatten a property set to the string pairs written into the document.
pub fn stringify(properties: &PropertyMap) -> IndexMap<String, String> {
    properties
        .iter()
        .map(|(key, value)| (key.clone(), value.to_string()))
        .collect()
}

impl TryFrom<serde_json::Value> for PropertyValue {
    type Error = OtmltError;

    fn try_from(value: serde_json::Value) -> OtmltResult<Self> {
        match value {
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Self::Int(i)),
                None => n
                    .as_f64()
                    .map(Self::Float)
                    .ok_or_else(|| OtmltError::config(format!("number {n} is not representable"))),
            },
            serde_json::Value::String(s) => Ok(Self::Text(s)),
            other => Err(OtmltError::config(format!(
                "property values must be integers, floats or strings, got {other}"
            ))),
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_value_to_string_conversion() {
        let mut data = PropertyMap::new();
        data.insert("int_key".to_string(), 42i64.into());
        data.insert("float_key".to_string(), 42.0.into());
        data.insert("str_key".to_string(), "43".into());

        let converted = stringify(&data);
        assert_eq!(converted["int_key"], "42");
        assert_eq!(converted["float_key"], "42.0");
        assert_eq!(converted["str_key"], "43");
        let keys: Vec<_> = converted.keys().cloned().collect();
        assert_eq!(keys, vec!["int_key", "float_key", "str_key"]);
    }

    #[test]
    fn test_negative_and_fractional_floats() {
        assert_eq!(format_float(-2.0), "-2.0");
        assert_eq!(format_float(0.5), "0.5");
        assert_eq!(format_float(1.25), "1.25");
    }

    #[test]
    fn test_json_scalars_convert() {
        assert_eq!(
            PropertyValue::try_from(serde_json::json!(1920)).unwrap(),
            PropertyValue::Int(1920)
        );
        assert_eq!(
            PropertyValue::try_from(serde_json::json!(29.97)).unwrap(),
            PropertyValue::Float(29.97)
        );
        assert_eq!(
            PropertyValue::try_from(serde_json::json!("709")).unwrap(),
            PropertyValue::Text("709".to_string())
        );
    }

    #[test]
    fn test_non_scalar_is_rejected() {
        let err = PropertyValue::try_from(serde_json::json!([1, 2])).unwrap_err();
        assert!(matches!(err, OtmltError::Config { .. }));
        assert!(PropertyValue::try_from(serde_json::json!({"a": 1})).is_err());
        assert!(PropertyValue::try_from(serde_json::Value::Null).is_err());
    }

    #[test]
    fn test_untagged_deserialize_keeps_int_and_float_apart() {
        let parsed: PropertyMap = serde_json::from_str(r#"{"a":42,"b":42.0,"c":"x"}"#).unwrap();
        assert_eq!(parsed["a"], PropertyValue::Int(42));
        assert_eq!(parsed["b"], PropertyValue::Float(42.0));
        assert_eq!(parsed["c"], PropertyValue::Text("x".to_string()));
    }

    proptest! {
        #[test]
        fn float_text_round_trips(v in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
            let text = PropertyValue::Float(v).to_string();
            let back: f64 = text.parse().unwrap();
            prop_assert_eq!(back.to_bits(), v.to_bits());
            prop_assert_eq!(format_float(back), text);
        }

        #[test]
        fn ints_render_without_fraction(v in any::<i64>()) {
            let text = PropertyValue::Int(v).to_string();
            prop_assert!(!text.contains('.'));
            prop_assert_eq!(text.parse::<i64>().unwrap(), v);
        }
    }
}
