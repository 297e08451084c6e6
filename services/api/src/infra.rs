use autopilot_studio::intake::{Notification, NotificationKind, Notifier, NotifyError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Writes toasts to the log. The dashboard front end is not served from this process.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn publish(&self, notification: Notification) -> Result<(), NotifyError> {
        let intake_id = notification
            .intake_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_default();
        match notification.kind {
            NotificationKind::Error => warn!(
                %intake_id,
                title = %notification.title,
                "{}",
                notification.description
            ),
            NotificationKind::Success | NotificationKind::Info => info!(
                %intake_id,
                title = %notification.title,
                "{}",
                notification.description
            ),
        }
        Ok(())
    }
}
