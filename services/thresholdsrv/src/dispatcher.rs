//! Threshold notification dispatch
//!
//! Terminal, fire-and-forget step invoked by the scheduler once an escalation
//! delay has elapsed.

use crate::error::{HandlerError, Result};
use fm_platform::{EscalationNotice, NotificationGroup, NotificationGroupRegistry};
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

/// Sends rendered escalation messages to notification groups
#[derive(Clone)]
pub struct NotificationDispatcher {
    groups: Arc<dyn NotificationGroupRegistry>,
}

impl NotificationDispatcher {
    pub fn new(groups: Arc<dyn NotificationGroupRegistry>) -> Self {
        Self { groups }
    }

    /// Deliver a notice, logging every failure
    pub async fn dispatch(&self, notice: &EscalationNotice) {
        let span = info_span!(
            "threshold_escalation",
            notification_group_id = notice.notification_group_id
        );

        async {
            match self.try_dispatch(notice).await {
                Ok(()) => {},
                Err(e @ HandlerError::InvalidGroup(_)) => warn!("{}", e),
                Err(e @ HandlerError::Transport(_)) => warn!("{}", e),
                Err(e) => error!("Notification dispatch failed: {}", e),
            }
        }
        .instrument(span)
        .await
    }

    /// Deliver a notice
    ///
    /// The group name is logged as sent even when the transport fails, the
    /// failure itself is returned as `Transport`.
    pub async fn try_dispatch(&self, notice: &EscalationNotice) -> Result<()> {
        let group = self
            .groups
            .get_by_id(notice.notification_group_id)
            .await?
            .ok_or(HandlerError::InvalidGroup(notice.notification_group_id))?;

        let sent = group.notify(&notice.subject, &notice.body).await;
        info!("Sending notification to group {}", group.name());

        sent.map_err(|e| HandlerError::Transport(e.to_string()))
    }
}
