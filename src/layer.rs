use crate::field::FieldValue;
use crate::hook::Hook;
use crate::record::{Level, LogEntry};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns events into [`LogEntry`]s and
/// fires them at a [`Hook`].
///
/// Only events whose level is listed in [`Hook::levels`] are forwarded.
/// The hook is expected to hand entries off without blocking, so network
/// I/O stays decoupled from application threads.
pub struct SinkLayer {
    hook: Arc<dyn Hook>,
}

impl SinkLayer {
    pub fn new(hook: Arc<dyn Hook>) -> Self {
        Self { hook }
    }
}

impl<S> Layer<S> for SinkLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        let level = Level::from(*event.metadata().level());
        if !self.hook.levels().contains(&level) {
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
        event.record(&mut visitor);

        let entry = LogEntry {
            level,
            message: message.unwrap_or_default(),
            time: Utc::now(),
            fields,
        };

        if let Err(e) = self.hook.fire(entry) {
            eprintln!("Failed to fire hook, got {}", e);
        }
    }
}

use tracing::field::{Field, Visit};

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, FieldValue>,
    pub message: &'a mut Option<String>,
}

impl<'a> FieldVisitor<'a> {
    fn insert(&mut self, field: &Field, value: FieldValue) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.insert(field, FieldValue::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, FieldValue::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, FieldValue::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, FieldValue::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, FieldValue::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.insert(field, FieldValue::error(value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.insert(field, FieldValue::Str(format!("{:?}", value)));
        }
    }
}
