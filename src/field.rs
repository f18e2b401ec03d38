use serde::Serialize;
use serde_json::Value;
use std::backtrace::Backtrace;
use std::error::Error as StdError;

/// A caller-supplied field value, classified once when it is attached to
/// a [`LogEntry`](crate::record::LogEntry).
///
/// The variant decides how the merger normalizes the value, so an error is
/// always turned into text and never serialized as an empty JSON object.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absent value. Never written to the payload.
    Nil,
    /// Text. Empty strings are never written to the payload.
    Str(String),
    /// Number or boolean, written as-is.
    Scalar(Value),
    /// Error without a trace, rendered as its message chain.
    Error(String),
    /// Error carrying a stack trace, rendered with the full trace.
    TracedError(String),
    /// Object or array with at least one visible member.
    Structured(Value),
    /// Structured value with nothing visible to serialize, written as-is.
    Opaque(Value),
}

impl FieldValue {
    /// Classify a plain error. The message includes every `source()` in the
    /// chain, joined with `": "`.
    pub fn error<E>(err: &E) -> Self
    where
        E: StdError + ?Sized,
    {
        let mut message = error_chain(err);
        if message.is_empty() {
            message = format!("{:?}", err);
        }
        if message.is_empty() {
            message = std::any::type_name::<E>().to_string();
        }
        FieldValue::Error(message)
    }

    /// Classify an error together with the trace captured where it was raised.
    pub fn traced<E>(err: &E, backtrace: &Backtrace) -> Self
    where
        E: StdError + ?Sized,
    {
        FieldValue::TracedError(format!(
            "{}\n\nStack backtrace:\n{}",
            error_chain(err),
            backtrace
        ))
    }

    /// Classify anything serde can serialize by the shape it serializes to.
    pub fn structured<T>(value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_value(value) {
            Ok(v) => FieldValue::from(v),
            Err(e) => {
                eprintln!("dropping field that failed to serialize: {}", e);
                FieldValue::Nil
            }
        }
    }
}

fn error_chain<E>(err: &E) -> String
where
    E: StdError + ?Sized,
{
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // thiserror-style wrappers often already embed their source
        if !text.is_empty() && !rendered.ends_with(&text) {
            if !rendered.is_empty() {
                rendered.push_str(": ");
            }
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Nil,
            Value::String(s) => FieldValue::Str(s),
            Value::Bool(_) | Value::Number(_) => FieldValue::Scalar(value),
            Value::Object(ref map) if map.is_empty() => FieldValue::Opaque(value),
            Value::Array(ref items) if items.is_empty() => FieldValue::Opaque(value),
            Value::Object(_) | Value::Array(_) => FieldValue::Structured(value),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Str(value.clone())
    }
}

macro_rules! scalar_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(value: $t) -> Self {
                    FieldValue::from(Value::from(value))
                }
            }
        )*
    };
}

scalar_from!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<T> From<Option<T>> for FieldValue
where
    T: Into<FieldValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Nil, Into::into)
    }
}

impl From<anyhow::Error> for FieldValue {
    fn from(err: anyhow::Error) -> Self {
        FieldValue::from(&err)
    }
}

impl From<&anyhow::Error> for FieldValue {
    /// `anyhow` errors render their cause chain and, when one was captured,
    /// their backtrace through `Debug`.
    fn from(err: &anyhow::Error) -> Self {
        FieldValue::TracedError(format!("{:?}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, thiserror::Error)]
    #[error("test")]
    struct Wrapped {
        #[source]
        cause: std::io::Error,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("")]
    struct Silent;

    #[derive(Serialize)]
    struct Visible {
        id: u32,
    }

    #[derive(Serialize)]
    struct Hidden {}

    #[test]
    fn wrapped_error_keeps_context_and_cause() {
        let err = Wrapped {
            cause: std::io::Error::new(std::io::ErrorKind::Other, "the cause"),
        };
        assert_eq!(FieldValue::error(&err), FieldValue::Error("test: the cause".into()));
    }

    #[test]
    fn error_with_empty_display_is_still_text() {
        match FieldValue::error(&Silent) {
            FieldValue::Error(msg) => assert_eq!(msg, "Silent"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn anyhow_errors_are_traced() {
        let err = anyhow::anyhow!("the cause").context("test");
        match FieldValue::from(&err) {
            FieldValue::TracedError(rendered) => {
                assert!(rendered.starts_with("test"));
                assert!(rendered.contains("the cause"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn traced_includes_backtrace_section() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let bt = Backtrace::force_capture();
        match FieldValue::traced(&err, &bt) {
            FieldValue::TracedError(rendered) => {
                assert!(rendered.starts_with("boom\n\nStack backtrace:\n"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn structured_values_are_classified_by_shape() {
        assert!(matches!(FieldValue::structured(&Visible { id: 1 }), FieldValue::Structured(_)));
        assert_eq!(FieldValue::structured(&Hidden {}), FieldValue::Opaque(json!({})));
        assert_eq!(FieldValue::structured(&()), FieldValue::Nil);
        assert_eq!(FieldValue::structured("x"), FieldValue::Str("x".into()));
    }

    #[test]
    fn options_and_scalars() {
        assert_eq!(FieldValue::from(None::<String>), FieldValue::Nil);
        assert_eq!(FieldValue::from(Some(3_u64)), FieldValue::Scalar(json!(3)));
        assert_eq!(FieldValue::from(true), FieldValue::Scalar(json!(true)));
        assert_eq!(FieldValue::from(f64::NAN), FieldValue::Nil);
    }
}
