//! In-memory platform implementation
//!
//! Uses DashMap for concurrent lookups. Backs the integration tests and the
//! `thresholdsrv` offline replay mode, and can be seeded from a YAML
//! inventory fixture.

use crate::error::{PlatformError, Result};
use crate::traits::*;
use crate::types::*;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Selector definition: a static set of managed objects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorFixture {
    pub id: SelectorId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub objects: Vec<ObjectId>,
}

/// Inventory fixture file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryFixture {
    #[serde(default)]
    pub managed_objects: Vec<ManagedObject>,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    #[serde(default)]
    pub metric_types: Vec<MetricType>,
    #[serde(default)]
    pub selectors: Vec<SelectorFixture>,
    #[serde(default)]
    pub notification_groups: Vec<NotificationGroupRef>,
    /// Rule-sets in evaluation order
    #[serde(default)]
    pub escalations: Vec<AlarmEscalation>,
}

/// In-memory platform with concurrent access support
pub struct MemoryPlatform {
    objects: DashMap<String, ManagedObject>,
    interfaces: DashMap<(ObjectId, String), Interface>,
    metrics: DashMap<String, MetricType>,
    selectors: DashMap<SelectorId, HashSet<ObjectId>>,
    groups: DashMap<NotificationGroupId, Arc<MemoryNotificationGroup>>,
    escalations: RwLock<Vec<AlarmEscalation>>,
}

impl MemoryPlatform {
    /// Create an empty platform
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            interfaces: DashMap::new(),
            metrics: DashMap::new(),
            selectors: DashMap::new(),
            groups: DashMap::new(),
            escalations: RwLock::new(Vec::new()),
        }
    }

    /// Build a platform from a fixture, validating cross references
    pub fn from_fixture(fixture: InventoryFixture) -> Result<Self> {
        let platform = Self::new();

        for mo in fixture.managed_objects {
            platform.add_managed_object(mo);
        }
        for iface in fixture.interfaces {
            if !platform.objects.iter().any(|mo| mo.id == iface.managed_object) {
                return Err(PlatformError::Fixture(format!(
                    "interface {} references unknown managed object {}",
                    iface.name, iface.managed_object
                )));
            }
            platform.add_interface(iface);
        }
        for metric in fixture.metric_types {
            platform.add_metric_type(metric);
        }
        for selector in fixture.selectors {
            platform.add_selector(selector.id, selector.objects);
        }
        for group in fixture.notification_groups {
            platform.add_notification_group(group.id, group.name);
        }
        for esc in fixture.escalations {
            for item in &esc.escalations {
                if let Some(group) = &item.notification_group {
                    if !platform.groups.contains_key(&group.id) {
                        return Err(PlatformError::Fixture(format!(
                            "escalation {} references unknown notification group {}",
                            esc.name, group.id
                        )));
                    }
                }
            }
            platform.add_escalation(esc);
        }

        info!(
            "Inventory loaded: {} objects, {} interfaces, {} escalations",
            platform.objects.len(),
            platform.interfaces.len(),
            platform.escalations.read().len()
        );
        Ok(platform)
    }

    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let fixture: InventoryFixture = serde_yaml::from_str(source)?;
        Self::from_fixture(fixture)
    }

    /// Load an inventory fixture file
    pub fn load_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        debug!("Loading inventory from {}", path.as_ref().display());
        Self::from_yaml_str(&source)
    }

    pub fn add_managed_object(&self, mo: ManagedObject) {
        self.objects.insert(mo.name.clone(), mo);
    }

    pub fn add_interface(&self, iface: Interface) {
        self.interfaces
            .insert((iface.managed_object, iface.name.clone()), iface);
    }

    pub fn add_metric_type(&self, metric: MetricType) {
        self.metrics.insert(metric.name.clone(), metric);
    }

    pub fn add_selector(&self, id: SelectorId, objects: impl IntoIterator<Item = ObjectId>) {
        self.selectors.insert(id, objects.into_iter().collect());
    }

    /// Register a notification group and return its handle
    pub fn add_notification_group(
        &self,
        id: NotificationGroupId,
        name: impl Into<String>,
    ) -> Arc<MemoryNotificationGroup> {
        let group = Arc::new(MemoryNotificationGroup::new(id, name));
        self.groups.insert(id, group.clone());
        group
    }

    /// Append a rule-set; evaluation order follows insertion order
    pub fn add_escalation(&self, escalation: AlarmEscalation) {
        self.escalations.write().push(escalation);
    }

    /// Managed object by name
    pub fn managed_object(&self, name: &str) -> Option<ManagedObject> {
        self.objects.get(name).map(|mo| mo.clone())
    }
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricCatalog for MemoryPlatform {
    async fn metric_type(&self, name: &str) -> anyhow::Result<Option<MetricType>> {
        Ok(self.metrics.get(name).map(|m| m.clone()))
    }
}

#[async_trait]
impl InterfaceCatalog for MemoryPlatform {
    async fn find_interface(
        &self,
        object: &ManagedObject,
        name: &str,
    ) -> anyhow::Result<Option<Interface>> {
        Ok(self
            .interfaces
            .get(&(object.id, name.to_string()))
            .map(|i| i.clone()))
    }
}

#[async_trait]
impl EscalationStore for MemoryPlatform {
    async fn class_escalations(&self, alarm_class: &str) -> anyhow::Result<Vec<AlarmEscalation>> {
        Ok(self
            .escalations
            .read()
            .iter()
            .filter(|esc| esc.applies_to(alarm_class))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SelectorMatcher for MemoryPlatform {
    async fn is_in_selector(
        &self,
        object: &ManagedObject,
        selector: SelectorId,
    ) -> anyhow::Result<bool> {
        Ok(self
            .selectors
            .get(&selector)
            .map(|members| members.contains(&object.id))
            .unwrap_or(false))
    }
}

#[async_trait]
impl NotificationGroupRegistry for MemoryPlatform {
    async fn get_by_id(
        &self,
        id: NotificationGroupId,
    ) -> anyhow::Result<Option<Arc<dyn NotificationGroup>>> {
        Ok(self
            .groups
            .get(&id)
            .map(|g| g.clone() as Arc<dyn NotificationGroup>))
    }
}

/// Notification group that records deliveries instead of sending them
pub struct MemoryNotificationGroup {
    id: NotificationGroupId,
    name: String,
    delivered: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl MemoryNotificationGroup {
    pub fn new(id: NotificationGroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            delivered: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make subsequent `notify` calls fail with a transport error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delivered `(subject, body)` pairs
    pub fn deliveries(&self) -> Vec<(String, String)> {
        self.delivered.lock().clone()
    }
}

#[async_trait]
impl NotificationGroup for MemoryNotificationGroup {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, subject: &str, body: &str) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PlatformError::Transport(format!(
                "delivery to group {} refused",
                self.name
            ))
            .into());
        }
        self.delivered
            .lock()
            .push((subject.to_string(), body.to_string()));
        debug!("Delivered message to group {} ({})", self.name, self.id);
        Ok(())
    }
}

/// Scheduler that records deferred calls without running them
#[derive(Default)]
pub struct RecordingScheduler {
    calls: Mutex<Vec<DeferredCall>>,
    failing: AtomicBool,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler that rejects every call
    pub fn failing() -> Self {
        let scheduler = Self::default();
        scheduler.failing.store(true, Ordering::SeqCst);
        scheduler
    }

    pub fn calls(&self) -> Vec<DeferredCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl DeferredScheduler for RecordingScheduler {
    async fn schedule(&self, call: DeferredCall) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("queue {} is unavailable", call.queue);
        }
        self.calls.lock().push(call);
        Ok(())
    }
}
