//! Toast notifications raised by the editor.

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::error::FailurePayload;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "All changes saved.";
pub const SUCCESS_TITLE: &str = "SUCCESS!";
pub const ERROR_TITLE: &str = "Sorry but something went wrong!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastMode {
    Dismissible,
    /// Stays until the user closes it.
    Sticky,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub variant: ToastVariant,
    pub mode: ToastMode,
}

impl Toast {
    pub fn success(message: Option<&str>) -> Self {
        let message = message
            .filter(|message| !message.is_empty())
            .unwrap_or(DEFAULT_SUCCESS_MESSAGE);
        Self {
            title: SUCCESS_TITLE.to_string(),
            message: message.to_string(),
            variant: ToastVariant::Success,
            mode: ToastMode::Dismissible,
        }
    }

    pub fn error(payload: &FailurePayload) -> Self {
        Self {
            title: ERROR_TITLE.to_string(),
            message: payload.message(),
            variant: ToastVariant::Error,
            mode: ToastMode::Sticky,
        }
    }

    pub fn is_error(&self) -> bool {
        self.variant == ToastVariant::Error
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

impl<F> Notifier for F
where
    F: Fn(Toast) + Send + Sync,
{
    fn notify(&self, toast: Toast) {
        self(toast)
    }
}

/// Writes toasts to the log only.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.variant {
            ToastVariant::Success => info!(title = %toast.title, "{}", toast.message),
            ToastVariant::Error => error!(title = %toast.title, "{}", toast.message),
        }
    }
}

/// Forwards toasts to whoever renders them.
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Toast>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, toast: Toast) {
        if let Err(err) = self.tx.send(toast) {
            warn!(message = %err.0.message, "toast dropped; no renderer attached");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorBody;

    #[test]
    fn success_toast_defaults_message() {
        let toast = Toast::success(None);
        assert_eq!(toast.title, SUCCESS_TITLE);
        assert_eq!(toast.message, DEFAULT_SUCCESS_MESSAGE);
        assert_eq!(toast.mode, ToastMode::Dismissible);

        assert_eq!(Toast::success(Some("")).message, DEFAULT_SUCCESS_MESSAGE);
        assert_eq!(Toast::success(Some("Tier deleted.")).message, "Tier deleted.");
    }

    #[test]
    fn error_toast_is_sticky_and_uses_payload_text() {
        let payload = FailurePayload::new(Some(500), ErrorBody::message("database is locked"));
        let toast = Toast::error(&payload);
        assert!(toast.is_error());
        assert_eq!(toast.title, ERROR_TITLE);
        assert_eq!(toast.message, "database is locked");
        assert_eq!(toast.mode, ToastMode::Sticky);
    }

    #[tokio::test]
    async fn channel_notifier_forwards_toasts() {
        let (notifier, mut rx) = ChannelNotifier::new();
        notifier.notify(Toast::success(None));
        let toast = rx.recv().await.expect("toast");
        assert_eq!(toast.variant, ToastVariant::Success);

        drop(rx);
        notifier.notify(Toast::success(None));
    }
}
