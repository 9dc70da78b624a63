use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

/// A span that has closed.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedSpan {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub fields: HashMap<String, serde_json::Value>,
    pub duration_micros: u128,
}

/// A log event, with the name of the span it was emitted in.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedEvent {
    pub level: String,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
    pub fields: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Default)]
struct Store {
    spans: Vec<CapturedSpan>,
    events: Vec<CapturedEvent>,
}

/// Shared in-memory storage for spans and events.
///
/// Clone the handle, install [`CapturedSpans::layer`] on a subscriber, run the
/// code under test, then inspect what was recorded.
///
/// ```rust
/// use ragline_telemetry::CapturedSpans;
/// use tracing_subscriber::layer::SubscriberExt;
///
/// let captured = CapturedSpans::new();
/// let subscriber = tracing_subscriber::registry().with(captured.layer());
/// tracing::subscriber::with_default(subscriber, || {
///     tracing::info_span!("rag.query", collection = "docs").in_scope(|| {
///         tracing::warn!(tool = "unknown_tool", "skipping");
///     });
/// });
///
/// assert_eq!(captured.spans_named("rag.query").len(), 1);
/// assert_eq!(captured.events_at(tracing::Level::WARN)[0].message, "skipping");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CapturedSpans {
    store: Arc<Mutex<Store>>,
}

impl CapturedSpans {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self) -> CaptureLayer {
        CaptureLayer { store: self.store.clone() }
    }

    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.lock().spans.clone()
    }

    pub fn spans_named(&self, name: &str) -> Vec<CapturedSpan> {
        self.lock().spans.iter().filter(|s| s.name == name).cloned().collect()
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.lock().events.clone()
    }

    pub fn events_at(&self, level: Level) -> Vec<CapturedEvent> {
        let level = level.to_string();
        self.lock().events.iter().filter(|e| e.level == level).cloned().collect()
    }

    pub fn clear(&self) {
        let mut store = self.lock();
        store.spans.clear();
        store.events.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The [`Layer`] that feeds a [`CapturedSpans`] handle.
pub struct CaptureLayer {
    store: Arc<Mutex<Store>>,
}

struct SpanFields(HashMap<String, serde_json::Value>);

struct Opened(Instant);

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut visitor = JsonVisitor::default();
        attrs.record(&mut visitor);

        let mut extensions = span.extensions_mut();
        extensions.insert(SpanFields(visitor.0));
        extensions.insert(Opened(Instant::now()));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut extensions = span.extensions_mut();
        if let Some(fields) = extensions.get_mut::<SpanFields>() {
            let mut visitor = JsonVisitor::default();
            values.record(&mut visitor);
            fields.0.extend(visitor.0);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);
        let mut fields = visitor.0;
        let message = match fields.remove("message") {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let metadata = event.metadata();
        let captured = CapturedEvent {
            level: metadata.level().to_string(),
            target: metadata.target().to_string(),
            message,
            span: ctx.event_span(event).map(|s| s.name().to_string()),
            fields,
        };
        self.store.lock().unwrap_or_else(|e| e.into_inner()).events.push(captured);
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else { return };
        let extensions = span.extensions();
        let fields = extensions.get::<SpanFields>().map(|f| f.0.clone()).unwrap_or_default();
        let duration_micros =
            extensions.get::<Opened>().map(|o| o.0.elapsed().as_micros()).unwrap_or(0);

        let captured = CapturedSpan {
            name: span.name().to_string(),
            parent: span.parent().map(|p| p.name().to_string()),
            fields,
            duration_micros,
        };
        self.store.lock().unwrap_or_else(|e| e.into_inner()).spans.push(captured);
    }
}

#[derive(Default)]
struct JsonVisitor(HashMap<String, serde_json::Value>);

impl tracing::field::Visit for JsonVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::Value::Bool(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }
}
