//! Common test utilities for thresholdsrv integration tests

#![allow(dead_code)]

use fm_platform::{
    Alarm, AlarmEscalation, EscalationItem, Interface, ManagedObject, MemoryNotificationGroup,
    MemoryPlatform, MetricType, NotificationGroupRef, PlaceholderRenderer, PlatformPorts,
    RecordingScheduler, Template, TemplateRef,
};
use std::sync::Arc;
use thresholdsrv::{ThresholdConfig, ThresholdService};

pub const ALARM_CLASS: &str = "NOC | PM | Out of Thresholds";
pub const METRIC_IN: &str = "Interface | Load | In";
pub const METRIC_OUT: &str = "Interface | Load | Out";
pub const OBJECT_ID: u64 = 1;
pub const DOMAIN_ID: u64 = 10;
pub const SELECTOR_ID: u64 = 3;
pub const NOC_GROUP: u64 = 7;
pub const NETOPS_GROUP: u64 = 8;

/// Test fixture: platform, recorded scheduler calls and wired handlers
pub struct TestBed {
    pub platform: Arc<MemoryPlatform>,
    pub scheduler: Arc<RecordingScheduler>,
    pub service: ThresholdService,
    pub mo: ManagedObject,
    pub noc: Arc<MemoryNotificationGroup>,
    pub netops: Arc<MemoryNotificationGroup>,
}

pub fn managed_object() -> ManagedObject {
    let mut mo = ManagedObject::new(OBJECT_ID, "core-sw-01#2");
    mo.bi_id = 9001;
    mo.administrative_domain_path = vec![1, DOMAIN_ID];
    mo.periodic_discovery_interval = 300;
    mo
}

pub fn template() -> Template {
    Template {
        id: 1,
        name: "threshold".to_string(),
        subject: "{{ managed_object.name }}: {{ alarm.vars.interface }} load".to_string(),
        body: "Load {{ alarm.vars.percent }}% ({{ alarm.vars.convert_value }})".to_string(),
    }
}

pub fn clear_template() -> TemplateRef {
    TemplateRef {
        id: 2,
        name: "threshold-clear".to_string(),
    }
}

pub fn group_ref(id: u64) -> NotificationGroupRef {
    NotificationGroupRef {
        id,
        name: if id == NOC_GROUP { "noc-duty" } else { "netops" }.to_string(),
    }
}

/// Escalation item that notifies `group` after `delay` seconds
pub fn notify_item(group: u64, delay: u64) -> EscalationItem {
    EscalationItem {
        delay,
        administrative_domain: None,
        min_severity: None,
        selector: None,
        notification_group: Some(group_ref(group)),
        template: Some(template()),
        clear_template: Some(clear_template()),
        stop_processing: false,
    }
}

/// Escalation item without a notification group
pub fn watch_item() -> EscalationItem {
    EscalationItem {
        notification_group: None,
        template: None,
        clear_template: None,
        ..notify_item(NOC_GROUP, 0)
    }
}

pub fn rule_set(id: u64, items: Vec<EscalationItem>) -> AlarmEscalation {
    AlarmEscalation {
        id,
        name: format!("rule-set-{}", id),
        alarm_classes: vec![ALARM_CLASS.to_string()],
        escalations: items,
    }
}

pub fn interface(in_speed: Option<u64>, out_speed: Option<u64>) -> Interface {
    Interface {
        name: "Gi0/1".to_string(),
        managed_object: OBJECT_ID,
        in_speed,
        out_speed,
        description: Some("Uplink to dist-01".to_string()),
    }
}

/// Threshold alarm on `Gi0/1` with the given measured value (bit/s)
pub fn threshold_alarm(value: u64) -> Alarm {
    Alarm::new(ALARM_CLASS, 4000)
        .with_var("metric", METRIC_IN)
        .with_var("path", "core-sw-01 | Gi0/1 | Gi0/1")
        .with_var("value", value)
        .with_var("window_type", "m")
        .with_var("window", 3)
}

/// Build a test bed with the given interface and escalation rule-sets
pub fn test_bed(iface: Interface, escalations: Vec<AlarmEscalation>) -> TestBed {
    test_bed_with_config(iface, escalations, ThresholdConfig::default())
}

pub fn test_bed_with_config(
    iface: Interface,
    escalations: Vec<AlarmEscalation>,
    config: ThresholdConfig,
) -> TestBed {
    let platform = Arc::new(MemoryPlatform::new());
    let mo = managed_object();
    platform.add_managed_object(mo.clone());
    platform.add_interface(iface);
    platform.add_metric_type(MetricType {
        name: METRIC_IN.to_string(),
        measure: "bit/s".to_string(),
    });
    platform.add_metric_type(MetricType {
        name: METRIC_OUT.to_string(),
        measure: "bit/s".to_string(),
    });
    platform.add_selector(SELECTOR_ID, [OBJECT_ID]);
    let noc = platform.add_notification_group(NOC_GROUP, "noc-duty");
    let netops = platform.add_notification_group(NETOPS_GROUP, "netops");
    for esc in escalations {
        platform.add_escalation(esc);
    }

    let scheduler = Arc::new(RecordingScheduler::new());
    let ports = PlatformPorts::from_backend(platform.clone(), Arc::new(PlaceholderRenderer::new()));
    let service = ThresholdService::with_scheduler(&ports, scheduler.clone(), &config);

    TestBed {
        platform,
        scheduler,
        service,
        mo,
        noc,
        netops,
    }
}
