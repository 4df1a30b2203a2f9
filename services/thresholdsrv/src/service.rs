//! Handler wiring
//!
//! Builds the enricher, evaluator, dispatcher and scheduler from a set of
//! platform ports and the service configuration.

use crate::config::ThresholdConfig;
use crate::dispatcher::NotificationDispatcher;
use crate::enricher::ThresholdEnricher;
use crate::escalation::EscalationEvaluator;
use crate::scheduler::TokioScheduler;
use fm_platform::{DeferredScheduler, PlatformPorts};
use std::sync::Arc;

/// Wired threshold handlers
#[derive(Clone)]
pub struct ThresholdService {
    pub enricher: ThresholdEnricher,
    pub dispatcher: NotificationDispatcher,
}

impl ThresholdService {
    /// Wire handlers around an externally provided scheduler
    pub fn with_scheduler(
        ports: &PlatformPorts,
        scheduler: Arc<dyn DeferredScheduler>,
        config: &ThresholdConfig,
    ) -> Self {
        let evaluator = EscalationEvaluator::new(
            ports.escalations.clone(),
            ports.selectors.clone(),
            ports.renderer.clone(),
            scheduler,
            config.scheduler.clone(),
        );
        let enricher = ThresholdEnricher::new(
            ports.metrics.clone(),
            ports.interfaces.clone(),
            evaluator,
            config.enricher.clone(),
        );

        Self {
            enricher,
            dispatcher: NotificationDispatcher::new(ports.groups.clone()),
        }
    }

    /// Wire handlers around an in-process tokio scheduler
    pub fn with_tokio_scheduler(
        ports: &PlatformPorts,
        config: &ThresholdConfig,
    ) -> (Self, Arc<TokioScheduler>) {
        let dispatcher = NotificationDispatcher::new(ports.groups.clone());
        let scheduler = Arc::new(TokioScheduler::new(
            dispatcher,
            config.scheduler.handler.clone(),
        ));
        let service = Self::with_scheduler(ports, scheduler.clone(), config);
        (service, scheduler)
    }
}
