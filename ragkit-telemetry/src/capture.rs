//! In-memory capture of `tracing` events.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

/// One recorded event.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedEvent {
    pub level: String,
    pub target: String,
    pub message: String,
    pub fields: HashMap<String, serde_json::Value>,
}

/// Shared storage for captured events.
///
/// Clones share the same buffer, so a test can keep one handle and install
/// [`layer`](Self::layer) into a subscriber.
///
/// ```rust,ignore
/// let capture = EventCapture::new();
/// let _guard = tracing::subscriber::set_default(capture.subscriber());
/// store.add_document("hello", HashMap::new()).await?;
/// assert_eq!(capture.find("documents added").unwrap().fields["added"], 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventCapture {
    events: Arc<RwLock<Vec<CapturedEvent>>>,
}

impl EventCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A layer that appends every event it sees to this buffer.
    pub fn layer(&self) -> CaptureLayer {
        CaptureLayer { storage: self.clone() }
    }

    /// A subscriber that records into this buffer and does nothing else.
    pub fn subscriber(&self) -> impl Subscriber + Send + Sync + 'static {
        tracing_subscriber::registry().with(self.layer())
    }

    /// Snapshot of all events recorded so far.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.read().map(|events| events.clone()).unwrap_or_default()
    }

    /// First event whose message equals `message`.
    pub fn find(&self, message: &str) -> Option<CapturedEvent> {
        self.events.read().ok()?.iter().find(|e| e.message == message).cloned()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }

    fn push(&self, event: CapturedEvent) {
        if let Ok(mut events) = self.events.write() {
            events.push(event);
        }
    }
}

/// A tracing layer that records events into an [`EventCapture`].
pub struct CaptureLayer {
    storage: EventCapture,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);
        let mut fields = visitor.0;

        let message = match fields.remove("message") {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let metadata = event.metadata();

        self.storage.push(CapturedEvent {
            level: metadata.level().to_string(),
            target: metadata.target().to_string(),
            message,
            fields,
        });
    }
}

#[derive(Default)]
struct JsonVisitor(HashMap<String, serde_json::Value>);

impl Visit for JsonVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::Value::Bool(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }
}
