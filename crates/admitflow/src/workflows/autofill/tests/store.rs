use serde_json::json;

use super::common::{app_id, fields};
use crate::workflows::autofill::merge::{is_empty_value, merged_view};
use crate::workflows::autofill::step_store::StepDataStore;

#[test]
fn entries_are_created_lazily() {
    let mut store = StepDataStore::new();
    store.activate(&app_id("app-1"));

    assert!(store.user_data(1).is_none());
    store.write_user_fields(1, fields(json!({ "given_name": "Ana" })));
    assert_eq!(store.user_data(1).unwrap()["given_name"], json!("Ana"));
    assert!(store.user_data(2).is_none());
}

#[test]
fn user_fields_upsert_and_last_write_wins() {
    let mut store = StepDataStore::new();
    store.activate(&app_id("app-1"));

    store.write_user_fields(1, fields(json!({ "given_name": "Ana", "city": "Lima" })));
    store.write_user_fields(1, fields(json!({ "given_name": "Anna" })));

    let user = store.user_data(1).unwrap();
    assert_eq!(user["given_name"], json!("Anna"));
    assert_eq!(user["city"], json!("Lima"), "untouched fields survive");
}

#[test]
fn ocr_writes_skip_user_populated_fields() {
    let mut store = StepDataStore::new();
    store.activate(&app_id("app-1"));
    store.write_user_fields(1, fields(json!({ "given_name": "Ana", "surname": "" })));

    assert!(!store.write_ocr_field_if_user_empty(1, "given_name", json!("Anne")));
    assert!(store.write_ocr_field_if_user_empty(1, "surname", json!("Silva")));
    assert!(store.write_ocr_field_if_user_empty(1, "passport_number", json!("X123")));

    let view = store.merged_view(1);
    assert_eq!(view["given_name"], json!("Ana"), "user data always wins");
    assert_eq!(view["surname"], json!("Silva"));
    assert_eq!(view["passport_number"], json!("X123"));
}

#[test]
fn false_and_zero_count_as_user_values() {
    let mut store = StepDataStore::new();
    store.activate(&app_id("app-1"));
    store.write_user_fields(1, fields(json!({ "has_dependents": false, "gap_years": 0 })));

    assert!(!store.write_ocr_field_if_user_empty(1, "has_dependents", json!(true)));
    assert!(!store.write_ocr_field_if_user_empty(1, "gap_years", json!(2)));
}

#[test]
fn switching_applications_clears_every_step() {
    let mut store = StepDataStore::new();
    store.activate(&app_id("app-a"));
    store.write_user_fields(1, fields(json!({ "given_name": "Ana" })));
    store.write_ocr_field_if_user_empty(2, "surname", json!("Silva"));

    store.activate(&app_id("app-b"));
    assert!(store.merged_view(1).is_empty(), "no leakage from app-a");
    assert!(store.merged_view(2).is_empty());
    assert_eq!(store.active_application(), Some(&app_id("app-b")));

    // Re-activating the same application keeps data intact.
    store.write_user_fields(1, fields(json!({ "given_name": "Bruno" })));
    store.activate(&app_id("app-b"));
    assert_eq!(store.merged_view(1)["given_name"], json!("Bruno"));
}

#[test]
fn merged_view_is_computed_not_stored() {
    let mut store = StepDataStore::new();
    store.activate(&app_id("app-1"));
    store.write_ocr_field_if_user_empty(1, "given_name", json!("John"));

    assert_eq!(store.merged_view(1)["given_name"], json!("John"));

    // A later user correction immediately takes precedence on read.
    store.write_user_fields(1, fields(json!({ "given_name": "Jon" })));
    assert_eq!(store.merged_view(1)["given_name"], json!("Jon"));
    assert_eq!(
        store.ocr_data(1).unwrap()["given_name"],
        json!("John"),
        "sources stay separate"
    );
}

#[test]
fn emptiness_covers_null_blank_and_missing() {
    assert!(is_empty_value(None));
    assert!(is_empty_value(Some(&json!(null))));
    assert!(is_empty_value(Some(&json!(""))));
    assert!(is_empty_value(Some(&json!("   "))));
    assert!(!is_empty_value(Some(&json!("x"))));
    assert!(!is_empty_value(Some(&json!(false))));
    assert!(!is_empty_value(Some(&json!(0))));
}

#[test]
fn merge_prefers_nonempty_user_fields() {
    let user = fields(json!({ "a": "user", "b": "", "d": false }));
    let ocr = fields(json!({ "a": "ocr", "b": "ocr-b", "c": "ocr-c" }));

    let view = merged_view(&user, &ocr);
    assert_eq!(view["a"], json!("user"));
    assert_eq!(view["b"], json!("ocr-b"), "blanked user field shows ocr");
    assert_eq!(view["c"], json!("ocr-c"));
    assert_eq!(view["d"], json!(false));
}
