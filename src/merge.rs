use crate::error::{Error, Result};
use crate::field::FieldValue;
use crate::message::BaseMessage;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Merge caller-supplied `fields` into the serialized form of `base`.
///
/// Base fields always win on a key collision. Nil values and empty strings
/// are dropped, errors become text, structured values keep their nested
/// JSON shape. The only failure is `base` itself not serializing to an
/// object, in which case the caller should ship `base` unmerged.
pub fn merge(base: &BaseMessage, fields: BTreeMap<String, FieldValue>) -> Result<Map<String, Value>> {
    let mut data = match serde_json::to_value(base) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(Error::NotAnObject),
        Err(source) => {
            return Err(Error::Serialize {
                context: "serializing base message".to_string(),
                source,
            })
        }
    };

    for (key, value) in fields {
        if data.get(&key).is_some_and(|v| !v.is_null()) {
            // do not allow overwriting
            continue;
        }
        if let Some(value) = normalize(value) {
            data.insert(key, value);
        }
    }

    Ok(data)
}

/// JSON form of a single field, `None` when it must be left out.
pub fn normalize(value: FieldValue) -> Option<Value> {
    match value {
        FieldValue::TracedError(rendered) => Some(Value::String(rendered)),
        FieldValue::Error(message) => Some(Value::String(message)),
        FieldValue::Nil => None,
        FieldValue::Str(s) if s.is_empty() => None,
        FieldValue::Str(s) => Some(Value::String(s)),
        FieldValue::Structured(v) => Some(v),
        FieldValue::Scalar(v) | FieldValue::Opaque(v) => Some(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{build_with_host, MessageContext};
    use crate::record::{Level, LogEntry};
    use crate::severity::LogbackLevels;
    use proptest::prelude::*;
    use serde_json::json;

    fn merged(entry: LogEntry) -> Map<String, Value> {
        let ctx = MessageContext {
            facility: "api".into(),
            environment: "test".into(),
        };
        let base = build_with_host(&entry, &ctx, &LogbackLevels, Some("box".into()));
        merge(&base, entry.fields).unwrap()
    }

    #[test]
    fn base_fields_win_on_collision() {
        let data = merged(
            LogEntry::new(Level::INFO, "hello")
                .with_field("facility", "spoofed")
                .with_field("level", 99)
                .with_field("Severity", "nope"),
        );
        assert_eq!(data["facility"], json!("api"));
        assert_eq!(data["level"], json!(4));
        assert_eq!(data["Severity"], json!("INFO"));
    }

    #[test]
    fn omitted_base_field_can_be_supplied_by_caller() {
        let ctx = MessageContext::default();
        let entry = LogEntry::new(Level::INFO, "hello").with_field("environment", "from-field");
        let base = build_with_host(&entry, &ctx, &LogbackLevels, None);
        let data = merge(&base, entry.fields).unwrap();
        assert_eq!(data["environment"], json!("from-field"));
    }

    #[test]
    fn nil_and_empty_string_are_left_out() {
        let data = merged(
            LogEntry::new(Level::ERROR, "something went wrong, but there is no error")
                .with_field("error", None::<String>)
                .with_field("empty", "")
                .with_field("kept", "yes"),
        );
        assert!(!data.contains_key("error"));
        assert!(!data.contains_key("empty"));
        assert_eq!(data["kept"], json!("yes"));
    }

    #[test]
    fn errors_are_never_empty_objects() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "opaque");
        let data = merged(LogEntry::new(Level::ERROR, "err").with_error(&err));
        assert_eq!(data["error"], json!("opaque"));
    }

    #[test]
    fn traced_errors_keep_the_full_rendering() {
        let err = anyhow::anyhow!("the cause").context("test");
        let expected = format!("{:?}", err);
        let data = merged(LogEntry::new(Level::ERROR, "err").with_field("error", &err));
        assert_eq!(data["error"], json!(expected));
    }

    #[test]
    fn structured_and_scalar_values() {
        let data = merged(
            LogEntry::new(Level::INFO, "hello")
                .with_field("user", json!({"id": 7, "roles": ["admin"]}))
                .with_field("opaque", json!({}))
                .with_field("count", 3)
                .with_field("ok", false),
        );
        assert_eq!(data["user"], json!({"id": 7, "roles": ["admin"]}));
        assert_eq!(data["opaque"], json!({}));
        assert_eq!(data["count"], json!(3));
        assert_eq!(data["ok"], json!(false));
    }

    #[test]
    fn keys_are_the_union_of_base_and_fields() {
        let data = merged(LogEntry::new(Level::INFO, "hello").with_field("extra", 1));
        let keys: Vec<&str> = data.keys().map(String::as_str).collect();
        for key in [
            "Severity",
            "Time",
            "environment",
            "facility",
            "host",
            "level",
            "short_message",
            "full_message",
            "extra",
        ] {
            assert!(keys.contains(&key), "missing {}", key);
        }
        assert_eq!(keys.len(), 9);
    }

    const RESERVED: [&str; 8] = [
        "Severity",
        "Time",
        "environment",
        "facility",
        "host",
        "level",
        "short_message",
        "full_message",
    ];

    fn field_key() -> impl Strategy<Value = String> {
        prop_oneof![
            prop::sample::select(RESERVED.to_vec()).prop_map(String::from),
            "[a-z_]{1,10}",
        ]
    }

    fn field_value() -> impl Strategy<Value = FieldValue> {
        prop_oneof![
            Just(FieldValue::Nil),
            Just(FieldValue::Str(String::new())),
            "[a-z ]{1,12}".prop_map(FieldValue::Str),
            any::<i64>().prop_map(FieldValue::from),
            any::<bool>().prop_map(FieldValue::from),
            "[a-z ]{1,12}".prop_map(FieldValue::Error),
            "[a-z]{1,8}".prop_map(|k| FieldValue::from(json!({ k: [1, 2] }))),
        ]
    }

    proptest! {
        #[test]
        fn merge_keeps_base_and_drops_absent(
            fields in prop::collection::btree_map(field_key(), field_value(), 0..20)
        ) {
            let ctx = MessageContext {
                facility: "api".into(),
                environment: "test".into(),
            };
            let entry = LogEntry::new(Level::INFO, "hello");
            let base = build_with_host(&entry, &ctx, &LogbackLevels, Some("box".into()));
            let expected_base = serde_json::to_value(&base).unwrap();
            let data = merge(&base, fields.clone()).unwrap();

            for (key, value) in expected_base.as_object().unwrap() {
                prop_assert_eq!(&data[key], value);
            }
            for (key, value) in &data {
                prop_assert!(!value.is_null(), "{} is null", key);
                prop_assert!(value.as_str() != Some(""), "{} is an empty string", key);
                prop_assert_ne!(value, &json!({}), "{} is an empty object", key);
            }
            for (key, value) in &fields {
                if RESERVED.contains(&key.as_str()) {
                    continue;
                }
                let absent = matches!(value, FieldValue::Nil)
                    || matches!(value, FieldValue::Str(s) if s.is_empty());
                prop_assert_eq!(data.contains_key(key), !absent);
            }
        }
    }
}
