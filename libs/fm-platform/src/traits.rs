//! Platform ports consumed by the threshold handlers
//!
//! Implementations:
//! - `MemoryPlatform`: in-memory backend for tests and offline replay
//! - host adapters: provided by the platform integrating the handlers

use crate::types::*;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Metric-type catalogue
#[async_trait]
pub trait MetricCatalog: Send + Sync {
    /// Look up a metric type by name
    async fn metric_type(&self, name: &str) -> Result<Option<MetricType>>;
}

/// Interface inventory
#[async_trait]
pub trait InterfaceCatalog: Send + Sync {
    /// Look up an interface by name, scoped to its managed object
    async fn find_interface(&self, object: &ManagedObject, name: &str)
        -> Result<Option<Interface>>;
}

/// Alarm escalation rule store
#[async_trait]
pub trait EscalationStore: Send + Sync {
    /// Rule-sets for an alarm class, in evaluation order
    async fn class_escalations(&self, alarm_class: &str) -> Result<Vec<AlarmEscalation>>;
}

/// Selector matching engine
#[async_trait]
pub trait SelectorMatcher: Send + Sync {
    async fn is_in_selector(&self, object: &ManagedObject, selector: SelectorId) -> Result<bool>;
}

/// Notification group with its transport
#[async_trait]
pub trait NotificationGroup: Send + Sync {
    fn name(&self) -> &str;

    /// Send a message to every member of the group
    async fn notify(&self, subject: &str, body: &str) -> Result<()>;
}

/// Notification group lookup
#[async_trait]
pub trait NotificationGroupRegistry: Send + Sync {
    async fn get_by_id(&self, id: NotificationGroupId)
        -> Result<Option<Arc<dyn NotificationGroup>>>;
}

/// Deferred-call scheduler
///
/// Fire-and-forget: a successful `schedule` only means the call was accepted.
#[async_trait]
pub trait DeferredScheduler: Send + Sync {
    async fn schedule(&self, call: DeferredCall) -> Result<()>;
}

/// Template renderer
pub trait TemplateRenderer: Send + Sync {
    fn render_subject(&self, template: &Template, context: &Value) -> Result<String>;

    fn render_body(&self, template: &Template, context: &Value) -> Result<String>;
}

/// Lookup ports bundled for handler construction
#[derive(Clone)]
pub struct PlatformPorts {
    pub metrics: Arc<dyn MetricCatalog>,
    pub interfaces: Arc<dyn InterfaceCatalog>,
    pub escalations: Arc<dyn EscalationStore>,
    pub selectors: Arc<dyn SelectorMatcher>,
    pub groups: Arc<dyn NotificationGroupRegistry>,
    pub renderer: Arc<dyn TemplateRenderer>,
}

impl PlatformPorts {
    /// Bundle a backend that implements every lookup port
    pub fn from_backend<B>(backend: Arc<B>, renderer: Arc<dyn TemplateRenderer>) -> Self
    where
        B: MetricCatalog
            + InterfaceCatalog
            + EscalationStore
            + SelectorMatcher
            + NotificationGroupRegistry
            + 'static,
    {
        Self {
            metrics: backend.clone(),
            interfaces: backend.clone(),
            escalations: backend.clone(),
            selectors: backend.clone(),
            groups: backend,
            renderer,
        }
    }
}
