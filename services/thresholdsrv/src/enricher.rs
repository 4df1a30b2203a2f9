//! Interface threshold alarm enrichment
//!
//! Annotates an interface threshold alarm with utilisation data taken from the
//! interface inventory and hands it to the escalation evaluator.

use crate::config::EnricherConfig;
use crate::error::{HandlerError, Result};
use crate::escalation::EscalationEvaluator;
use crate::humanize::{humanize_speed, SpeedUnit};
use chrono::{DateTime, Utc};
use fm_platform::{Alarm, Interface, InterfaceCatalog, ManagedObject, MetricCatalog, MetricType};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};

/// Window type marker for "last N measurements" thresholds
const WINDOW_MEASUREMENTS: &str = "m";

/// Upper bound for a threshold interval in seconds
const MAX_INTERVAL_SECS: f64 = u64::MAX as f64;

/// Threshold alarm enricher
#[derive(Clone)]
pub struct ThresholdEnricher {
    metrics: Arc<dyn MetricCatalog>,
    interfaces: Arc<dyn InterfaceCatalog>,
    escalation: EscalationEvaluator,
    config: EnricherConfig,
}

impl ThresholdEnricher {
    pub fn new(
        metrics: Arc<dyn MetricCatalog>,
        interfaces: Arc<dyn InterfaceCatalog>,
        escalation: EscalationEvaluator,
        config: EnricherConfig,
    ) -> Self {
        Self {
            metrics,
            interfaces,
            escalation,
            config,
        }
    }

    /// Alarm handler entry point
    ///
    /// Enrichment failures caused by alarm or inventory contents are logged
    /// and swallowed; fields written before the failure stay on the alarm.
    /// Platform failures are returned to the caller.
    pub async fn handle(&self, mo: &ManagedObject, alarm: &mut Alarm) -> Result<()> {
        let span = info_span!(
            "threshold_enrich",
            alarm_id = %alarm.id,
            alarm_class = %alarm.alarm_class,
            managed_object = %mo.name
        );

        async {
            match self.enrich(mo, alarm).await {
                Err(e) if e.is_expected() => {
                    warn!("Threshold enrichment incomplete: {}", e);
                    Ok(())
                },
                other => other,
            }
        }
        .instrument(span)
        .await
    }

    /// Enrich the alarm, failing on the first error
    pub async fn enrich(&self, mo: &ManagedObject, alarm: &mut Alarm) -> Result<()> {
        self.enrich_at(mo, alarm, Utc::now()).await
    }

    /// Enrich the alarm as of `now`
    pub async fn enrich_at(
        &self,
        mo: &ManagedObject,
        alarm: &mut Alarm,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let from = lookback_start(
            now,
            self.config.lookback_window(),
            self.config.lookback_floor(),
        );

        let metric_name = alarm
            .var_str("metric")
            .ok_or_else(|| HandlerError::missing_var("metric"))?
            .to_string();
        let metric = self
            .metrics
            .metric_type(&metric_name)
            .await?
            .ok_or_else(|| HandlerError::MetricNotFound(metric_name.clone()))?;

        let threshold_interval = threshold_interval_secs(alarm, mo)?;

        let path = alarm
            .var_str("path")
            .ok_or_else(|| HandlerError::missing_var("path"))?;
        let iface_name = interface_name(path).to_string();
        let iface = self
            .interfaces
            .find_interface(mo, &iface_name)
            .await?
            .ok_or_else(|| HandlerError::InterfaceNotFound {
                name: iface_name.clone(),
                managed_object: mo.id,
            })?;

        let value = alarm
            .var_f64("value")
            .ok_or_else(|| HandlerError::missing_var("value"))?;

        if let Some(percent) = utilisation_percent(&iface, &metric_name, value) {
            alarm.set_var("percent", percent);
        }

        alarm.set_var("interface", iface_name.as_str());
        alarm.set_var(
            "description",
            iface.description.clone().unwrap_or_default(),
        );
        match convert_value(value, &metric) {
            Ok(converted) => alarm.set_var("convert_value", converted),
            Err(e) => warn!("Cannot humanize value of {}: {}", metric.name, e),
        }
        if let Some(seconds) = threshold_interval {
            alarm.set_var("threshold_interval", seconds / 60);
        }
        alarm.set_var("ts_from_date", (from.timestamp() * 1000).to_string());
        alarm.set_var("mo", encode_object_name(&mo.name));

        if mo.can_notify() {
            let context = json!({
                "alarm": serde_json::to_value(&*alarm)?,
                "managed_object": {
                    "name": mo.name,
                    "bi_id": mo.bi_id,
                },
            });
            if let Some(outcome) = self.escalation.evaluate(alarm, mo, &context).await? {
                alarm.clear_notification_group = Some(outcome.notification_group);
                alarm.clear_template = outcome.clear_template;
                alarm.log_active(outcome.message);
            }
        } else {
            debug!("Notifications disabled for {}", mo.name);
        }

        Ok(())
    }
}

/// Start of the metric lookback window, never earlier than `now - floor`
pub fn lookback_start(
    now: DateTime<Utc>,
    window: chrono::Duration,
    floor: chrono::Duration,
) -> DateTime<Utc> {
    let from = now - window;
    let limit = now - floor;
    from.max(limit)
}

/// Interface name: last `|` segment of the metric path
pub fn interface_name(path: &str) -> &str {
    path.rsplit('|').next().unwrap_or(path).trim()
}

/// Threshold window length in seconds, for measurement-count windows only
fn threshold_interval_secs(alarm: &Alarm, mo: &ManagedObject) -> Result<Option<u64>> {
    if alarm.var_str("window_type") != Some(WINDOW_MEASUREMENTS) {
        return Ok(None);
    }
    let window = alarm
        .var_f64("window")
        .ok_or_else(|| HandlerError::missing_var("window"))?;
    if !window.is_finite() || window < 0.0 {
        return Err(HandlerError::invalid_var("window", format!("{}", window)));
    }
    let seconds = mo.periodic_discovery_interval as f64 * window;
    if seconds >= MAX_INTERVAL_SECS {
        return Err(HandlerError::invalid_var(
            "window",
            format!("{} measurements overflow the threshold interval", window),
        ));
    }
    Ok(Some(seconds as u64))
}

/// Load as a percentage of interface capacity
///
/// Speeds are kbit/s while the measured value is bit/s, hence the `/ 1000`.
fn utilisation_percent(iface: &Interface, metric_name: &str, value: f64) -> Option<i64> {
    let (in_speed, out_speed) = iface.speeds()?;
    let speed = if metric_name.contains("In") {
        in_speed
    } else {
        out_speed
    };
    Some((100.0 / speed as f64 * (value / 1000.0)).round() as i64)
}

fn convert_value(value: f64, metric: &MetricType) -> Result<Value> {
    let unit: SpeedUnit = metric.measure.parse()?;
    Ok(Value::String(humanize_speed(value, unit)?))
}

/// Managed object name with `#` percent-encoded
pub fn encode_object_name(name: &str) -> String {
    name.replace('#', "%23")
}
