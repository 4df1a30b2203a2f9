//! Threshold alarm enrichment integration tests

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

mod common;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use common::*;
use fm_platform::{
    EscalationPolicy, MetricCatalog, MetricType, PlaceholderRenderer, RecordingScheduler,
};
use serde_json::json;
use std::sync::Arc;
use thresholdsrv::config::{EnricherConfig, SchedulerConfig};
use thresholdsrv::{EscalationEvaluator, HandlerError, ThresholdConfig, ThresholdEnricher};

#[tokio::test]
async fn test_end_to_end_enrichment() {
    let bed = test_bed(
        interface(Some(1_000_000), Some(1_000_000)),
        vec![rule_set(1, vec![notify_item(NOC_GROUP, 0)])],
    );
    let mut alarm = threshold_alarm(500_000_000);

    bed.service
        .enricher
        .handle(&bed.mo, &mut alarm)
        .await
        .unwrap();

    assert_eq!(alarm.var("percent"), Some(&json!(50)));
    assert_eq!(alarm.var_str("interface"), Some("Gi0/1"));
    assert_eq!(alarm.var_str("description"), Some("Uplink to dist-01"));
    assert_eq!(alarm.var_str("convert_value"), Some("500 Mbit/s"));
    assert_eq!(alarm.var("threshold_interval"), Some(&json!(15)));
    assert_eq!(alarm.var_str("mo"), Some("core-sw-01%232"));
    assert!(alarm.var_str("ts_from_date").is_some());

    assert_eq!(alarm.clear_notification_group, Some(group_ref(NOC_GROUP)));
    assert_eq!(alarm.clear_template, Some(clear_template()));
    assert_eq!(alarm.log.len(), 1);
    assert_eq!(alarm.log[0].message, "Sending message to : noc-duty");

    let calls = bed.scheduler.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].handler, "threshold_escalation");
    assert_eq!(calls[0].queue, "scheduler");
    assert_eq!(calls[0].delay, None);
    assert_eq!(calls[0].notice.notification_group_id, NOC_GROUP);
    assert_eq!(calls[0].notice.subject, "core-sw-01#2: Gi0/1 load");
    assert_eq!(calls[0].notice.body, "Load 50% (500 Mbit/s)");
}

#[tokio::test]
async fn test_outbound_metric_uses_out_speed() {
    let bed = test_bed(interface(Some(1_000_000), Some(100_000)), vec![]);
    let mut alarm = threshold_alarm(50_000_000).with_var("metric", METRIC_OUT);

    bed.service
        .enricher
        .handle(&bed.mo, &mut alarm)
        .await
        .unwrap();

    assert_eq!(alarm.var("percent"), Some(&json!(50)));
}

#[tokio::test]
async fn test_unknown_speed_leaves_percent_unset() {
    for (in_speed, out_speed) in [(None, None), (Some(1_000_000), None), (Some(0), Some(1000))] {
        let bed = test_bed(interface(in_speed, out_speed), vec![]);
        let mut alarm = threshold_alarm(500_000_000);

        bed.service
            .enricher
            .handle(&bed.mo, &mut alarm)
            .await
            .unwrap();

        assert!(alarm.var("percent").is_none());
        assert_eq!(alarm.var_str("interface"), Some("Gi0/1"));
        assert_eq!(alarm.var_str("convert_value"), Some("500 Mbit/s"));
    }
}

#[tokio::test]
async fn test_missing_description_is_empty() {
    let mut iface = interface(Some(1_000_000), Some(1_000_000));
    iface.description = None;
    let bed = test_bed(iface, vec![]);
    let mut alarm = threshold_alarm(500_000_000);

    bed.service
        .enricher
        .handle(&bed.mo, &mut alarm)
        .await
        .unwrap();

    assert_eq!(alarm.var_str("description"), Some(""));
}

#[tokio::test]
async fn test_zero_value_omits_convert_value() {
    let bed = test_bed(interface(Some(1_000_000), Some(1_000_000)), vec![]);
    let mut alarm = threshold_alarm(0);

    bed.service
        .enricher
        .handle(&bed.mo, &mut alarm)
        .await
        .unwrap();

    assert!(alarm.var("convert_value").is_none());
    assert_eq!(alarm.var("percent"), Some(&json!(0)));
    assert!(alarm.var_str("mo").is_some());
}

#[tokio::test]
async fn test_time_window_has_no_threshold_interval() {
    let bed = test_bed(interface(Some(1_000_000), Some(1_000_000)), vec![]);
    let mut alarm = threshold_alarm(500_000_000).with_var("window_type", "t");

    bed.service
        .enricher
        .handle(&bed.mo, &mut alarm)
        .await
        .unwrap();

    assert!(alarm.var("threshold_interval").is_none());
    assert_eq!(alarm.var("percent"), Some(&json!(50)));
}

#[tokio::test]
async fn test_fractional_window_rounds_down_to_minutes() {
    let bed = test_bed(interface(Some(1_000_000), Some(1_000_000)), vec![]);
    let mut alarm = threshold_alarm(500_000_000).with_var("window", 2.5);

    bed.service
        .enricher
        .handle(&bed.mo, &mut alarm)
        .await
        .unwrap();

    assert_eq!(alarm.var("threshold_interval"), Some(&json!(12)));
}

#[tokio::test]
async fn test_oversized_window_is_swallowed() {
    let bed = test_bed(
        interface(Some(1_000_000), Some(1_000_000)),
        vec![rule_set(1, vec![notify_item(NOC_GROUP, 0)])],
    );
    let mut alarm = threshold_alarm(500_000_000).with_var("window", 1e17);

    let result = bed.service.enricher.handle(&bed.mo, &mut alarm).await;

    assert!(result.is_ok());
    assert!(alarm.var("threshold_interval").is_none());
    assert!(alarm.var("interface").is_none());
    assert!(bed.scheduler.calls().is_empty());

    let err = bed
        .service
        .enricher
        .enrich(&bed.mo, &mut alarm)
        .await
        .unwrap_err();
    assert!(matches!(err, HandlerError::InvalidVar { ref key, .. } if key == "window"));
}

#[tokio::test]
async fn test_unknown_metric_is_swallowed() {
    let bed = test_bed(
        interface(Some(1_000_000), Some(1_000_000)),
        vec![rule_set(1, vec![notify_item(NOC_GROUP, 0)])],
    );
    let mut alarm = threshold_alarm(500_000_000).with_var("metric", "Interface | Errors | In");

    let result = bed.service.enricher.handle(&bed.mo, &mut alarm).await;

    assert!(result.is_ok());
    assert!(alarm.var("interface").is_none());
    assert!(alarm.clear_notification_group.is_none());
    assert!(bed.scheduler.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_interface_is_swallowed() {
    let bed = test_bed(
        interface(Some(1_000_000), Some(1_000_000)),
        vec![rule_set(1, vec![notify_item(NOC_GROUP, 0)])],
    );
    let mut alarm = threshold_alarm(500_000_000).with_var("path", "core-sw-01 | Gi0/9 | Gi0/9");

    bed.service
        .enricher
        .handle(&bed.mo, &mut alarm)
        .await
        .unwrap();

    assert!(alarm.var("percent").is_none());
    assert!(alarm.log.is_empty());
    assert!(bed.scheduler.calls().is_empty());

    let err = bed
        .service
        .enricher
        .enrich(&bed.mo, &mut alarm)
        .await
        .unwrap_err();
    assert!(matches!(err, HandlerError::InterfaceNotFound { ref name, .. } if name == "Gi0/9"));
}

#[tokio::test]
async fn test_missing_value_keeps_partial_enrichment() {
    let bed = test_bed(interface(Some(1_000_000), Some(1_000_000)), vec![]);
    let mut alarm = threshold_alarm(500_000_000);
    alarm.vars.remove("value");

    let err = bed
        .service
        .enricher
        .enrich(&bed.mo, &mut alarm)
        .await
        .unwrap_err();

    assert!(matches!(err, HandlerError::MissingVar(ref key) if key == "value"));
    assert!(alarm.var("interface").is_none());
    assert!(alarm.var("percent").is_none());
}

#[tokio::test]
async fn test_disabled_escalation_policy_skips_notification() {
    let bed = test_bed(
        interface(Some(1_000_000), Some(1_000_000)),
        vec![rule_set(1, vec![notify_item(NOC_GROUP, 0)])],
    );
    let mut mo = bed.mo.clone();
    mo.escalation_policy = EscalationPolicy::Disable;
    let mut alarm = threshold_alarm(500_000_000);

    bed.service.enricher.handle(&mo, &mut alarm).await.unwrap();

    assert_eq!(alarm.var("percent"), Some(&json!(50)));
    assert!(alarm.clear_notification_group.is_none());
    assert!(alarm.log.is_empty());
    assert!(bed.scheduler.calls().is_empty());
}

#[tokio::test]
async fn test_lookback_start_in_milliseconds() {
    let bed = test_bed(interface(Some(1_000_000), Some(1_000_000)), vec![]);
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
    let mut alarm = threshold_alarm(500_000_000);

    bed.service
        .enricher
        .enrich_at(&bed.mo, &mut alarm, now)
        .await
        .unwrap();

    let expected = ((now - Duration::hours(6)).timestamp() * 1000).to_string();
    assert_eq!(alarm.var_str("ts_from_date"), Some(expected.as_str()));
}

#[tokio::test]
async fn test_lookback_window_clamped_to_floor() {
    let mut config = ThresholdConfig::default();
    config.enricher.lookback_window_secs = 30 * 24 * 3600;
    let bed = test_bed_with_config(interface(Some(1_000_000), Some(1_000_000)), vec![], config);
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
    let mut alarm = threshold_alarm(500_000_000);

    bed.service
        .enricher
        .enrich_at(&bed.mo, &mut alarm, now)
        .await
        .unwrap();

    let expected = ((now - Duration::days(6)).timestamp() * 1000).to_string();
    assert_eq!(alarm.var_str("ts_from_date"), Some(expected.as_str()));
}

struct UnreachableCatalog;

#[async_trait]
impl MetricCatalog for UnreachableCatalog {
    async fn metric_type(&self, _name: &str) -> anyhow::Result<Option<MetricType>> {
        anyhow::bail!("metric catalog connection refused")
    }
}

#[tokio::test]
async fn test_platform_failure_propagates() {
    let bed = test_bed(interface(Some(1_000_000), Some(1_000_000)), vec![]);
    let evaluator = EscalationEvaluator::new(
        bed.platform.clone(),
        bed.platform.clone(),
        Arc::new(PlaceholderRenderer::new()),
        Arc::new(RecordingScheduler::new()),
        SchedulerConfig::default(),
    );
    let enricher = ThresholdEnricher::new(
        Arc::new(UnreachableCatalog),
        bed.platform.clone(),
        evaluator,
        EnricherConfig::default(),
    );
    let mut alarm = threshold_alarm(500_000_000);

    let err = enricher.handle(&bed.mo, &mut alarm).await.unwrap_err();

    assert!(matches!(err, HandlerError::Platform(_)));
    assert!(err.to_string().contains("connection refused"));
    assert!(alarm.var("interface").is_none());
}
