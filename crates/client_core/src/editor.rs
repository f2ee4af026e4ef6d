use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use shared::domain::{TierField, TierId, TierRecord};
use tracing::{debug, error, info, warn};

use crate::{
    confirm::{Confirm, DELETE_PROMPT},
    error::{EditorError, GatewayError, SyncKind},
    gateway::{SyncGateway, SyncResponse},
    labels::HeaderLabels,
    notify::{Notifier, Toast},
    state::{SavePlan, TierEditorState},
    validation::{validate_state, InputValidator},
};

pub const DEFAULT_TITLE: &str = "Account Maturity Tiers";

/// Set while a request is in flight. Clones observe the same flag, so a
/// view can grey out its save and delete buttons.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(self.0.clone()))
    }
}

/// Clears the flag when the request finishes, fails, or is dropped.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The tier administration form: staged local edits, validated saves, and
/// reconciliation with the backend's answer after every round trip.
pub struct TierEditor {
    gateway: Arc<dyn SyncGateway>,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
    validator: InputValidator,
    state: TierEditorState,
    labels: HeaderLabels,
    busy: BusyFlag,
    title: String,
}

impl TierEditor {
    pub fn new(
        gateway: Arc<dyn SyncGateway>,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self {
            gateway,
            notifier,
            confirm,
            validator: Box::new(validate_state),
            state: TierEditorState::new(),
            labels: HeaderLabels::default(),
            busy: BusyFlag::default(),
            title: DEFAULT_TITLE.to_string(),
        }
    }

    pub fn with_validator(mut self, validator: InputValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn state(&self) -> &TierEditorState {
        &self.state
    }

    pub fn labels(&self) -> &HeaderLabels {
        &self.labels
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Save is offered only when something changed and nothing is in flight.
    pub fn can_save(&self) -> bool {
        self.state.is_dirty() && !self.is_busy()
    }

    /// Header labels, then the first record load.
    pub async fn start(&mut self) -> Result<(), EditorError> {
        self.load_labels().await;
        self.load().await
    }

    /// Pulls column labels from the schema. Failure keeps the built-in
    /// labels and is only logged.
    pub async fn load_labels(&mut self) {
        match self.gateway.describe().await {
            Ok(info) => {
                let applied = self.labels.apply(&info);
                debug!(applied, "header labels loaded");
            }
            Err(error) => warn!(%error, "failed to load tier field labels"),
        }
    }

    pub async fn load(&mut self) -> Result<(), EditorError> {
        let _busy = self.acquire()?;
        let response = self.gateway.list().await;
        self.reconcile(SyncKind::Load, response)
    }

    /// Stages a new tier; false when one is already pending.
    pub fn add(&mut self) -> bool {
        self.state.add_pending()
    }

    pub fn edit(
        &mut self,
        tier_id: Option<TierId>,
        field: TierField,
        value: &str,
    ) -> Result<(), EditorError> {
        self.state.update_field(tier_id, field, value)
    }

    pub fn cancel(&mut self) {
        self.state.cancel();
    }

    /// Validates the inputs and sends either the pending tier or the whole
    /// working set. Nothing is sent, and nothing changes, when validation
    /// fails.
    pub async fn save(&mut self) -> Result<(), EditorError> {
        if self.is_busy() {
            return Err(EditorError::Busy);
        }
        if !self.state.is_dirty() {
            debug!("save skipped; no staged changes");
            return Ok(());
        }
        if !(self.validator)(&self.state) {
            info!("save blocked by invalid inputs");
            return Err(EditorError::InvalidInput);
        }

        let _busy = self.acquire()?;
        let (kind, response) = match self.state.prepare_save() {
            SavePlan::Insert(record) => {
                let record = record.clone();
                (SyncKind::Insert, self.gateway.insert(&record).await)
            }
            SavePlan::Update(records) => {
                let records = records.to_vec();
                (SyncKind::Update, self.gateway.bulk_update(&records).await)
            }
        };
        self.reconcile(kind, response)
    }

    /// Deletes a saved tier after the user confirms. Returns false when the
    /// user declines.
    pub async fn remove(&mut self, tier_id: TierId) -> Result<bool, EditorError> {
        if self.is_busy() {
            return Err(EditorError::Busy);
        }
        let Some(record) = self.state.record(tier_id).cloned() else {
            error!(%tier_id, "delete targeted a tier that is not in the working set");
            return Err(EditorError::NotFound {
                tier_id: Some(tier_id),
            });
        };
        if !self.confirm.confirm(DELETE_PROMPT).await {
            debug!(%tier_id, "delete declined");
            return Ok(false);
        }

        let _busy = self.acquire()?;
        let response = self.gateway.delete(&record).await;
        self.reconcile(SyncKind::Delete, response)?;
        Ok(true)
    }

    fn acquire(&self) -> Result<BusyGuard, EditorError> {
        self.busy.try_acquire().ok_or(EditorError::Busy)
    }

    /// Adopts the backend's record set, or reports the failure and leaves
    /// local state as it was.
    fn reconcile(
        &mut self,
        kind: SyncKind,
        response: Result<SyncResponse, GatewayError>,
    ) -> Result<(), EditorError> {
        let result = match response {
            Ok(Some(records)) => Ok(records),
            Ok(None) => Err(EditorError::NullResponse { operation: kind }),
            Err(err) => Err(EditorError::from_gateway(kind, err)),
        };

        match result {
            Ok(records) => {
                let announce = kind.is_write() || self.state.is_loaded();
                info!(operation = %kind, records = records.len(), "tiers reconciled");
                self.state.initialize(records);
                if announce {
                    self.notifier.notify(Toast::success(None));
                }
                Ok(())
            }
            Err(err) => {
                warn!(operation = %kind, error = %err, "tier sync failed");
                if let Some(payload) = err.failure_payload() {
                    self.notifier.notify(Toast::error(&payload));
                }
                Err(err)
            }
        }
    }
}

/// Rows for display, pending row last.
pub fn visible_rows(state: &TierEditorState) -> Vec<&TierRecord> {
    state.records().iter().chain(state.pending()).collect()
}

#[cfg(test)]
#[path = "tests/editor_tests.rs"]
mod tests;
