//! Local working set of the tier editor.
//!
//! Every edit is staged here and nothing touches the network. The working
//! set and the snapshot are only ever replaced wholesale, by
//! [`TierEditorState::initialize`] after a successful round trip or by
//! [`TierEditorState::cancel`].

use std::collections::HashMap;

use shared::domain::{TierField, TierId, TierRecord};
use tracing::{debug, error};

use crate::error::EditorError;

/// What a save has to send. A pending new tier always takes priority over
/// edits to existing ones; the two never go out in the same save.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SavePlan<'a> {
    Insert(&'a TierRecord),
    Update(&'a [TierRecord]),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierEditorState {
    working: Vec<TierRecord>,
    index: HashMap<TierId, usize>,
    pending: Option<TierRecord>,
    snapshot: Vec<TierRecord>,
    dirty: bool,
    loaded: bool,
}

impl TierEditorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts an authoritative record set.
    pub fn initialize(&mut self, records: Vec<TierRecord>) {
        self.snapshot = records.clone();
        self.working = records;
        self.rebuild_index();
        self.pending = None;
        self.dirty = false;
        self.loaded = true;
    }

    /// Stages a blank tier one level above the current last one. Returns
    /// false when a pending tier already exists.
    pub fn add_pending(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }
        let level = u32::try_from(self.working.len()).map_or(u32::MAX, |len| len.saturating_add(1));
        self.pending = Some(TierRecord::blank(level));
        self.dirty = true;
        true
    }

    /// Sets one field of an existing tier, or of the pending tier when
    /// `tier_id` is `None`.
    pub fn update_field(
        &mut self,
        tier_id: Option<TierId>,
        field: TierField,
        value: &str,
    ) -> Result<(), EditorError> {
        let target = match tier_id {
            None => self.pending.as_mut(),
            Some(tier_id) => self
                .index
                .get(&tier_id)
                .copied()
                .and_then(|position| self.working.get_mut(position)),
        };
        let Some(target) = target else {
            error!(?tier_id, %field, "edit targeted a tier that is not in the working set");
            return Err(EditorError::NotFound { tier_id });
        };

        target.set_field(field, value)?;
        self.dirty = true;
        debug!(?tier_id, %field, "staged tier edit");
        Ok(())
    }

    /// Discards every staged edit and the pending tier.
    pub fn cancel(&mut self) {
        self.working = self.snapshot.clone();
        self.rebuild_index();
        self.pending = None;
        self.dirty = false;
    }

    pub fn prepare_save(&self) -> SavePlan<'_> {
        match &self.pending {
            Some(pending) => SavePlan::Insert(pending),
            None => SavePlan::Update(&self.working),
        }
    }

    pub fn records(&self) -> &[TierRecord] {
        &self.working
    }

    pub fn record(&self, tier_id: TierId) -> Option<&TierRecord> {
        self.index
            .get(&tier_id)
            .and_then(|position| self.working.get(*position))
    }

    pub fn pending(&self) -> Option<&TierRecord> {
        self.pending.as_ref()
    }

    pub fn snapshot(&self) -> &[TierRecord] {
        &self.snapshot
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// True once any authoritative record set has been adopted.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .working
            .iter()
            .enumerate()
            .filter_map(|(position, record)| record.id.map(|tier_id| (tier_id, position)))
            .collect();
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
