//! Client side of the account maturity tier editor: staged edit state,
//! the backend gateway, and the editor that reconciles the two.

pub mod confirm;
pub mod editor;
pub mod error;
pub mod gateway;
pub mod labels;
pub mod notify;
pub mod state;
pub mod validation;

pub use confirm::{AutoConfirm, Confirm, DELETE_PROMPT};
pub use editor::{visible_rows, BusyFlag, TierEditor, DEFAULT_TITLE};
pub use error::{EditorError, FailurePayload, GatewayError, SyncKind};
pub use gateway::{HttpSyncGateway, MissingSyncGateway, SyncGateway, SyncResponse};
pub use labels::HeaderLabels;
pub use notify::{ChannelNotifier, Notifier, Toast, ToastMode, ToastVariant, TracingNotifier};
pub use state::{SavePlan, TierEditorState};
pub use validation::{validate_state, InputValidator, InputWidget};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
