//! Threshold alarm handlers
//!
//! Interface threshold alarm enrichment and escalation notification for the
//! fault-management platform:
//! - `enricher`: annotates threshold alarms with interface utilisation
//! - `escalation`: selects the escalation rule and schedules a notification
//! - `dispatcher`: delivers the notification to its group
//! - `scheduler`: in-process deferred call execution

pub mod config;
pub mod dispatcher;
pub mod enricher;
pub mod error;
pub mod escalation;
pub mod humanize;
pub mod logging;
pub mod scheduler;
pub mod service;

pub use config::ThresholdConfig;
pub use dispatcher::NotificationDispatcher;
pub use enricher::ThresholdEnricher;
pub use error::{HandlerError, Result};
pub use escalation::{EscalationEvaluator, EscalationOutcome};
pub use humanize::{humanize_speed, SpeedUnit};
pub use scheduler::{SchedulerStatus, TokioScheduler};
pub use service::ThresholdService;
