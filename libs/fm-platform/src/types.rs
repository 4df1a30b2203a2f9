use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use uuid::Uuid;

pub type ObjectId = u64;
pub type DomainId = u64;
pub type SelectorId = u64;
pub type NotificationGroupId = u64;
pub type TemplateId = u64;

/// Alarm status as recorded in the alarm log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmStatus {
    /// Active
    #[serde(rename = "A")]
    Active,
    /// Cleared
    #[serde(rename = "C")]
    Cleared,
}

/// Alarm log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmLogEntry {
    pub timestamp: DateTime<Utc>,
    pub from_status: AlarmStatus,
    pub to_status: AlarmStatus,
    pub message: String,
}

/// Raised alarm
///
/// Owned by the alarm subsystem. Handlers read their parameters from `vars`
/// and write enrichment fields back into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alarm {
    /// Alarm ID
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Alarm class name
    pub alarm_class: String,
    /// Severity, higher is worse
    pub severity: u32,
    /// Variable bag
    #[serde(default)]
    pub vars: Map<String, Value>,
    /// Group notified when the alarm clears
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_notification_group: Option<NotificationGroupRef>,
    /// Template used for the clear notification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_template: Option<TemplateRef>,
    /// Alarm log
    #[serde(default)]
    pub log: Vec<AlarmLogEntry>,
}

impl Alarm {
    /// Create new alarm with an empty variable bag
    pub fn new(alarm_class: impl Into<String>, severity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            alarm_class: alarm_class.into(),
            severity,
            vars: Map::new(),
            clear_notification_group: None,
            clear_template: None,
            log: Vec::new(),
        }
    }

    /// Builder-style variable assignment
    pub fn with_var(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set_var(key, value);
        self
    }

    pub fn set_var(&mut self, key: &str, value: impl Into<Value>) {
        self.vars.insert(key.to_string(), value.into());
    }

    pub fn var(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    /// String variable, `None` when absent or not a string
    pub fn var_str(&self, key: &str) -> Option<&str> {
        self.vars.get(key).and_then(Value::as_str)
    }

    /// Numeric variable; numeric strings are accepted as well
    pub fn var_f64(&self, key: &str) -> Option<f64> {
        match self.vars.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Append a log entry that keeps the alarm active
    pub fn log_active(&mut self, message: impl Into<String>) {
        self.log.push(AlarmLogEntry {
            timestamp: Utc::now(),
            from_status: AlarmStatus::Active,
            to_status: AlarmStatus::Active,
            message: message.into(),
        });
    }
}

/// Notification policy of a managed object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationPolicy {
    /// Escalate and notify
    #[default]
    Enable,
    /// Never notify
    Disable,
}

/// Managed object (network device)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedObject {
    pub id: ObjectId,
    pub name: String,
    /// Business-intelligence id
    pub bi_id: i64,
    /// Administrative domain ancestry, the object's own domain included
    #[serde(default)]
    pub administrative_domain_path: Vec<DomainId>,
    /// Periodic discovery interval from the object profile, in seconds
    #[serde(default = "default_discovery_interval")]
    pub periodic_discovery_interval: u64,
    #[serde(default)]
    pub escalation_policy: EscalationPolicy,
}

fn default_discovery_interval() -> u64 {
    300
}

impl ManagedObject {
    pub fn new(id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            bi_id: id as i64,
            administrative_domain_path: Vec::new(),
            periodic_discovery_interval: default_discovery_interval(),
            escalation_policy: EscalationPolicy::Enable,
        }
    }

    /// Whether alarms raised on this object may produce notifications
    pub fn can_notify(&self) -> bool {
        self.escalation_policy == EscalationPolicy::Enable
    }

    /// Whether `domain` is in the object's administrative-domain ancestry
    pub fn in_domain(&self, domain: DomainId) -> bool {
        self.administrative_domain_path.contains(&domain)
    }
}

/// Physical or logical interface of a managed object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    /// Owning managed object
    pub managed_object: ObjectId,
    /// Input speed, kbit/s
    #[serde(default)]
    pub in_speed: Option<u64>,
    /// Output speed, kbit/s
    #[serde(default)]
    pub out_speed: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Interface {
    /// Both speeds, when both are known and non-zero
    pub fn speeds(&self) -> Option<(u64, u64)> {
        match (self.in_speed, self.out_speed) {
            (Some(i), Some(o)) if i > 0 && o > 0 => Some((i, o)),
            _ => None,
        }
    }
}

/// Metric type from the metric catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricType {
    pub name: String,
    /// Measurement unit tag, e.g. `bit/s`
    pub measure: String,
}

/// Reference to a notification group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationGroupRef {
    pub id: NotificationGroupId,
    pub name: String,
}

/// Reference to a message template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub id: TemplateId,
    pub name: String,
}

/// Message template with subject and body sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub subject: String,
    pub body: String,
}

/// Single escalation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationItem {
    /// Delay before notification, in seconds
    #[serde(default)]
    pub delay: u64,
    #[serde(default)]
    pub administrative_domain: Option<DomainId>,
    #[serde(default)]
    pub min_severity: Option<u32>,
    #[serde(default)]
    pub selector: Option<SelectorId>,
    #[serde(default)]
    pub notification_group: Option<NotificationGroupRef>,
    #[serde(default)]
    pub template: Option<Template>,
    #[serde(default)]
    pub clear_template: Option<TemplateRef>,
    /// Stop evaluating the remaining items of this rule-set
    #[serde(default)]
    pub stop_processing: bool,
}

/// Escalation rule-set bound to one or more alarm classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmEscalation {
    pub id: u64,
    pub name: String,
    pub alarm_classes: Vec<String>,
    /// Items in evaluation order
    #[serde(default)]
    pub escalations: Vec<EscalationItem>,
}

impl AlarmEscalation {
    pub fn applies_to(&self, alarm_class: &str) -> bool {
        self.alarm_classes.iter().any(|c| c == alarm_class)
    }
}

/// Named arguments of a deferred threshold notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationNotice {
    pub notification_group_id: NotificationGroupId,
    pub subject: String,
    pub body: String,
}

/// Deferred handler invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredCall {
    /// Handler name, e.g. `threshold_escalation`
    pub handler: String,
    /// Target scheduler queue
    pub queue: String,
    /// Remaining delay; `None` runs as soon as possible
    pub delay: Option<Duration>,
    pub notice: EscalationNotice,
}
