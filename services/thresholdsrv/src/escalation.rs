//! Alarm escalation evaluation
//!
//! Walks the escalation rule-sets of an alarm class in store order and
//! schedules a deferred notification for the first item that passes every
//! filter and owns a notification group.

use crate::config::SchedulerConfig;
use crate::error::{HandlerError, Result};
use chrono::Utc;
use fm_platform::{
    Alarm, DeferredCall, DeferredScheduler, EscalationItem, EscalationNotice, EscalationStore,
    ManagedObject, NotificationGroupRef, SelectorMatcher, TemplateRef, TemplateRenderer,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, Instrument};

/// Result of a successful escalation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationOutcome {
    /// Group that will receive the notification
    pub notification_group: NotificationGroupRef,
    /// Template to use when the alarm clears
    pub clear_template: Option<TemplateRef>,
    /// Alarm log message
    pub message: String,
}

/// Escalation rule evaluator
#[derive(Clone)]
pub struct EscalationEvaluator {
    store: Arc<dyn EscalationStore>,
    selectors: Arc<dyn SelectorMatcher>,
    renderer: Arc<dyn TemplateRenderer>,
    scheduler: Arc<dyn DeferredScheduler>,
    config: SchedulerConfig,
}

impl EscalationEvaluator {
    pub fn new(
        store: Arc<dyn EscalationStore>,
        selectors: Arc<dyn SelectorMatcher>,
        renderer: Arc<dyn TemplateRenderer>,
        scheduler: Arc<dyn DeferredScheduler>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            selectors,
            renderer,
            scheduler,
            config,
        }
    }

    /// Evaluate escalation rules for an alarm
    ///
    /// Returns `Ok(None)` when no rule dispatched a notification. A
    /// `stop_processing` item ends the current rule-set only; later rule-sets
    /// are still evaluated.
    pub async fn evaluate(
        &self,
        alarm: &Alarm,
        mo: &ManagedObject,
        context: &Value,
    ) -> Result<Option<EscalationOutcome>> {
        let span = info_span!(
            "alarm_escalation",
            alarm_class = %alarm.alarm_class,
            severity = alarm.severity
        );
        self.evaluate_rules(alarm, mo, context)
            .instrument(span)
            .await
    }

    async fn evaluate_rules(
        &self,
        alarm: &Alarm,
        mo: &ManagedObject,
        context: &Value,
    ) -> Result<Option<EscalationOutcome>> {
        let now = Utc::now();

        for esc in self.store.class_escalations(&alarm.alarm_class).await? {
            for item in &esc.escalations {
                if !self.item_matches(item, alarm, mo).await? {
                    continue;
                }

                info!(
                    "{} Watch for {} after {} seconds",
                    alarm.alarm_class, esc.name, item.delay
                );
                let delay = remaining_delay(item.delay);
                if let Some(fire_at) = delay
                    .and_then(|d| chrono::Duration::from_std(d).ok())
                    .and_then(|d| now.checked_add_signed(d))
                {
                    debug!("Escalation {} fires at {}", esc.name, fire_at.to_rfc3339());
                }

                if let Some(group) = &item.notification_group {
                    let (subject, body) = match &item.template {
                        Some(template) => (
                            self.renderer.render_subject(template, context)?,
                            self.renderer.render_body(template, context)?,
                        ),
                        None => (String::new(), String::new()),
                    };
                    debug!("Notification message:\nSubject: {}\n{}", subject, body);

                    self.scheduler
                        .schedule(DeferredCall {
                            handler: self.config.handler.clone(),
                            queue: self.config.queue.clone(),
                            delay,
                            notice: EscalationNotice {
                                notification_group_id: group.id,
                                subject,
                                body,
                            },
                        })
                        .await
                        .map_err(|e| HandlerError::Scheduler(e.to_string()))?;

                    return Ok(Some(EscalationOutcome {
                        notification_group: group.clone(),
                        clear_template: item.clear_template.clone(),
                        message: format!("Sending message to : {}", group.name),
                    }));
                }

                if item.stop_processing {
                    debug!("Stopping processing");
                    break;
                }
            }
        }

        Ok(None)
    }

    /// Administrative domain, severity and selector filters
    async fn item_matches(
        &self,
        item: &EscalationItem,
        alarm: &Alarm,
        mo: &ManagedObject,
    ) -> Result<bool> {
        if let Some(domain) = item.administrative_domain {
            if !mo.in_domain(domain) {
                return Ok(false);
            }
        }
        if let Some(min_severity) = item.min_severity {
            if alarm.severity < min_severity {
                return Ok(false);
            }
        }
        if let Some(selector) = item.selector {
            if !self.selectors.is_in_selector(mo, selector).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Delay until the escalation fires; `None` means run immediately
fn remaining_delay(delay_secs: u64) -> Option<Duration> {
    (delay_secs > 0).then(|| Duration::from_secs(delay_secs))
}
