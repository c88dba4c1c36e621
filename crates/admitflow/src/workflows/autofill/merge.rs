use serde_json::{Map, Value};

/// A field counts as empty when it is absent, null, or a blank string.
///
/// Everything else, including `false` and `0`, is a deliberate user value
/// and must never be replaced by extraction output.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

/// Compute the merged form view: user fields take precedence field-by-field
/// over OCR-derived fields.
///
/// The result is always computed on read and never written back, so a later
/// correction to either source re-merges cleanly.
pub fn merged_view(user: &Map<String, Value>, ocr: &Map<String, Value>) -> Map<String, Value> {
    let mut view = ocr.clone();

    for (key, value) in user {
        if is_empty_value(Some(value)) {
            // Leave any OCR suggestion visible for fields the user blanked.
            view.entry(key.clone()).or_insert(Value::Null);
        } else {
            view.insert(key.clone(), value.clone());
        }
    }

    view
}
