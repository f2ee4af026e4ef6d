use shared::domain::{TierField, TierId, TierRecord};
use tracing::warn;

use crate::state::TierEditorState;

/// An input bound to one value on screen.
pub trait InputWidget {
    fn check_validity(&self) -> bool;

    /// Shows the widget's own validity message and returns its validity.
    fn report_validity(&self) -> bool;
}

/// Asks every widget to report, then answers whether all of them are
/// valid. Reporting never stops at the first invalid widget.
pub fn validate_fields<'a, I>(fields: I) -> bool
where
    I: IntoIterator<Item = &'a dyn InputWidget>,
{
    fields.into_iter().fold(true, |all_valid, field| {
        let valid = field.report_validity();
        all_valid && valid
    })
}

/// An editable cell of the tier table with the rules of its field.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundInput {
    pub tier_id: Option<TierId>,
    pub level: u32,
    pub field: TierField,
    pub value: String,
    pub required: bool,
    pub min: Option<f64>,
}

impl BoundInput {
    pub fn for_record(record: &TierRecord, field: TierField) -> Self {
        Self {
            tier_id: record.id,
            level: record.level,
            field,
            value: record.field_text(field),
            required: true,
            min: (field == TierField::CountFloor).then_some(0.0),
        }
    }

    pub fn validity_message(&self) -> Option<String> {
        let value = self.value.trim();
        if value.is_empty() {
            return self.required.then(|| "Complete this field.".to_string());
        }
        if self.field == TierField::CountFloor {
            let Some(number) = value.parse::<f64>().ok().filter(|n| n.is_finite()) else {
                return Some("Enter a valid value.".to_string());
            };
            if let Some(min) = self.min.filter(|min| number < *min) {
                return Some(format!("Value must be {min} or greater."));
            }
        }
        None
    }
}

impl InputWidget for BoundInput {
    fn check_validity(&self) -> bool {
        self.validity_message().is_none()
    }

    fn report_validity(&self) -> bool {
        match self.validity_message() {
            Some(message) => {
                warn!(tier_id = ?self.tier_id, level = self.level, field = %self.field, %message, "invalid input");
                false
            }
            None => true,
        }
    }
}

/// Input-boundary check run before a save is dispatched.
pub type InputValidator = Box<dyn Fn(&TierEditorState) -> bool + Send + Sync>;

/// Validates the inputs [`bound_inputs`] derives from the state.
pub fn validate_state(state: &TierEditorState) -> bool {
    let inputs = bound_inputs(state);
    validate_fields(inputs.iter().map(|input| input as &dyn InputWidget))
}

/// Inputs currently on screen: the editable fields of every row, plus the
/// pending row when there is one. Level is displayed but never an input.
pub fn bound_inputs(state: &TierEditorState) -> Vec<BoundInput> {
    state
        .records()
        .iter()
        .chain(state.pending())
        .flat_map(|record| {
            TierField::ALL
                .into_iter()
                .filter(|field| !field.is_read_only())
                .map(move |field| BoundInput::for_record(record, field))
        })
        .collect()
}
