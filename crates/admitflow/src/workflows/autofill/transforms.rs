use serde_json::{Map, Value};

use super::merge::is_empty_value;

/// Field-level cleanup applied to extracted data before it reaches the step
/// store, registered per document type.
#[derive(Debug, Clone)]
pub enum FieldTransform {
    /// Expand a single-letter gender code into its canonical word.
    GenderCode { field: &'static str },
    /// Copy a source field into a differently-named target, only when the
    /// target is still empty.
    CopyIfTargetEmpty {
        from: &'static str,
        to: &'static str,
    },
    /// Match a free-text value against a known option list, falling back to
    /// an "other" bucket when nothing matches.
    MatchOptionList {
        field: &'static str,
        options: &'static [&'static str],
        fallback: &'static str,
    },
}

impl FieldTransform {
    pub fn apply(&self, fields: &mut Map<String, Value>) {
        match self {
            FieldTransform::GenderCode { field } => {
                let Some(Value::String(raw)) = fields.get(*field) else {
                    return;
                };
                if let Some(expanded) = expand_gender_code(raw) {
                    fields.insert((*field).to_string(), Value::String(expanded.to_string()));
                }
            }
            FieldTransform::CopyIfTargetEmpty { from, to } => {
                if !is_empty_value(fields.get(*to)) {
                    return;
                }
                if let Some(value) = fields.get(*from).cloned() {
                    if !is_empty_value(Some(&value)) {
                        fields.insert((*to).to_string(), value);
                    }
                }
            }
            FieldTransform::MatchOptionList {
                field,
                options,
                fallback,
            } => {
                let Some(Value::String(raw)) = fields.get(*field) else {
                    return;
                };
                let matched = match_option(raw, options).unwrap_or(fallback);
                fields.insert((*field).to_string(), Value::String(matched.to_string()));
            }
        }
    }
}

fn expand_gender_code(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "M" => Some("Male"),
        "F" => Some("Female"),
        "X" => Some("Non-binary"),
        _ => None,
    }
}

fn match_option(raw: &str, options: &[&'static str]) -> Option<&'static str> {
    let needle = raw.trim();
    options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(needle))
        .copied()
}

/// Apply a transform chain in registration order.
pub fn apply_all(transforms: &[FieldTransform], fields: &mut Map<String, Value>) {
    for transform in transforms {
        transform.apply(fields);
    }
}
