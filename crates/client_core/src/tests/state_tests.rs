use super::*;
use shared::domain::FieldEditError;

fn tier(id: i64, level: u32, label: &str, count_floor: f64) -> TierRecord {
    TierRecord {
        id: Some(TierId(id)),
        level,
        name: label.to_lowercase(),
        label: label.to_string(),
        count_floor: Some(count_floor),
    }
}

fn loaded(records: Vec<TierRecord>) -> TierEditorState {
    let mut state = TierEditorState::new();
    state.initialize(records);
    state
}

#[test]
fn initialize_resets_everything() {
    let mut state = loaded(vec![tier(1, 1, "Bronze", 0.0)]);
    state.add_pending();
    state
        .update_field(Some(TierId(1)), TierField::Label, "Copper")
        .expect("edit");

    let response = vec![tier(1, 1, "Bronze", 0.0), tier(2, 2, "Silver", 10.0)];
    state.initialize(response.clone());

    assert_eq!(state.records(), response.as_slice());
    assert_eq!(state.snapshot(), response.as_slice());
    assert!(state.pending().is_none());
    assert!(!state.is_dirty());
    assert!(state.is_loaded());
    assert_eq!(state.record(TierId(2)).map(|t| t.level), Some(2));
}

#[test]
fn cancel_restores_snapshot_after_any_edit_sequence() {
    let original = vec![tier(1, 1, "Bronze", 0.0), tier(2, 2, "Silver", 10.0)];
    let mut state = loaded(original.clone());

    state.add_pending();
    state
        .update_field(None, TierField::Name, "gold")
        .expect("pending edit");
    state
        .update_field(Some(TierId(2)), TierField::CountFloor, "15")
        .expect("edit");
    state
        .update_field(Some(TierId(1)), TierField::Label, "Copper")
        .expect("edit");
    state.add_pending();

    state.cancel();

    assert_eq!(state.records(), original.as_slice());
    assert_eq!(state.snapshot(), original.as_slice());
    assert!(state.pending().is_none());
    assert!(!state.is_dirty());
    state
        .update_field(Some(TierId(2)), TierField::Label, "Silver II")
        .expect("index still resolves after cancel");
}

#[test]
fn add_pending_twice_keeps_first_pending_record() {
    let mut state = loaded(vec![tier(1, 1, "Bronze", 0.0), tier(2, 2, "Silver", 10.0)]);

    assert!(state.add_pending());
    state
        .update_field(None, TierField::Label, "Gold")
        .expect("pending edit");
    assert!(!state.add_pending());

    let pending = state.pending().expect("pending");
    assert_eq!(pending.level, 3);
    assert_eq!(pending.label, "Gold");
    assert!(state.is_dirty());
}

#[test]
fn insert_wins_over_edits_to_existing_records() {
    let mut state = loaded(vec![tier(1, 1, "Bronze", 0.0)]);
    state
        .update_field(Some(TierId(1)), TierField::Label, "Copper")
        .expect("edit");
    assert!(matches!(state.prepare_save(), SavePlan::Update(records) if records[0].label == "Copper"));

    state.add_pending();
    let SavePlan::Insert(record) = state.prepare_save() else {
        panic!("pending record must be inserted first");
    };
    assert!(record.is_new());
}

#[test]
fn staged_new_tier_scenario() {
    let mut state = loaded(vec![TierRecord {
        id: Some(TierId(1)),
        level: 1,
        name: String::new(),
        label: "Bronze".into(),
        count_floor: Some(0.0),
    }]);

    state.add_pending();
    assert_eq!(state.pending(), Some(&TierRecord::blank(2)));

    state
        .update_field(None, TierField::Label, "Silver")
        .expect("pending edit");
    assert_eq!(state.pending().map(|t| t.label.as_str()), Some("Silver"));

    let expected = TierRecord {
        label: "Silver".into(),
        ..TierRecord::blank(2)
    };
    assert_eq!(state.prepare_save(), SavePlan::Insert(&expected));
}

#[test]
fn edit_of_unknown_id_is_not_found() {
    let mut state = loaded(vec![tier(1, 1, "Bronze", 0.0)]);
    let before = state.clone();

    let err = state
        .update_field(Some(TierId(999)), TierField::Label, "X")
        .expect_err("unknown id");
    assert_eq!(
        err,
        EditorError::NotFound {
            tier_id: Some(TierId(999))
        }
    );

    let err = state
        .update_field(None, TierField::Label, "X")
        .expect_err("no pending record");
    assert_eq!(err, EditorError::NotFound { tier_id: None });
    assert_eq!(state, before);
}

#[test]
fn rejected_field_value_leaves_state_clean() {
    let mut state = loaded(vec![tier(1, 1, "Bronze", 0.0)]);

    let err = state
        .update_field(Some(TierId(1)), TierField::Level, "5")
        .expect_err("level is read-only");
    assert_eq!(
        err,
        EditorError::Field(FieldEditError::ReadOnly(TierField::Level))
    );
    state
        .update_field(Some(TierId(1)), TierField::CountFloor, "ten")
        .expect_err("not a number");

    assert!(!state.is_dirty());
    assert_eq!(state.records(), state.snapshot());
}

#[test]
fn empty_state_stages_level_one() {
    let mut state = TierEditorState::new();
    assert!(!state.is_loaded());
    state.add_pending();
    assert_eq!(state.pending().map(|t| t.level), Some(1));
}

#[test]
fn decimal_count_floor_is_staged() {
    let mut state = loaded(vec![tier(1, 1, "Bronze", 0.0)]);
    state
        .update_field(Some(TierId(1)), TierField::CountFloor, "2.5")
        .expect("decimal threshold");

    assert_eq!(state.records()[0].count_floor, Some(2.5));
    assert!(state.is_dirty());
    assert!(crate::validation::validate_state(&state));
}
