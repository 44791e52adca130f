//! Conversion of typed values into command text.

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;

/// Turns a value into the text carried by a command.
///
/// Implementations must be deterministic: the same value always yields the
/// same text.
pub trait ValueSerializer {
    fn to_command_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<String>;
}

/// Default serializer backed by `serde_json`.
///
/// Strings pass through unchanged, `null` becomes the empty string and any
/// other value is rendered as compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl ValueSerializer for JsonSerializer {
    fn to_command_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        match serde_json::to_value(value)? {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            other => Ok(serde_json::to_string(&other)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde::ser::Error as _;
    use serde::Serializer;
    use std::collections::BTreeMap;

    #[test]
    fn test_strings_pass_through() {
        let s = JsonSerializer;
        assert_eq!(s.to_command_value("hi \"there\"").unwrap(), "hi \"there\"");
        assert_eq!(s.to_command_value(&String::from("x")).unwrap(), "x");
    }

    #[test]
    fn test_null_is_empty() {
        let s = JsonSerializer;
        assert_eq!(s.to_command_value(&None::<u32>).unwrap(), "");
        assert_eq!(s.to_command_value(&()).unwrap(), "");
    }

    #[test]
    fn test_structured_values() {
        let s = JsonSerializer;
        assert_eq!(s.to_command_value(&42).unwrap(), "42");
        assert_eq!(s.to_command_value(&true).unwrap(), "true");
        assert_eq!(s.to_command_value(&vec![1, 2]).unwrap(), "[1,2]");

        let mut map = BTreeMap::new();
        map.insert("b", 2);
        map.insert("a", 1);
        assert_eq!(s.to_command_value(&map).unwrap(), r#"{"a":1,"b":2}"#);
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(S::Error::custom("refusing to serialize"))
        }
    }

    #[test]
    fn test_failure_is_propagated() {
        let err = JsonSerializer.to_command_value(&Unserializable).unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
    }
}
