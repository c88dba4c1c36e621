use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::transforms::FieldTransform;

/// One extracted document section as the OCR pipeline reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrSection {
    pub source_document_id: String,
    pub document_type: String,
    #[serde(default)]
    pub extracted_data: Map<String, Value>,
    #[serde(default)]
    pub confidence_scores: BTreeMap<String, f64>,
}

/// Sections arrive either singly or as a batch per section name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(OcrSection),
    Many(Vec<OcrSection>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<OcrSection> {
        match self {
            OneOrMany::One(section) => vec![section],
            OneOrMany::Many(sections) => sections,
        }
    }
}

/// Snapshot returned by the extraction-results endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionSnapshot {
    #[serde(default)]
    pub sections: BTreeMap<String, OneOrMany>,
    pub metadata: ExtractionMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionMetadata {
    /// Count of uploaded documents the pipeline is still processing.
    pub ocr_pending: u32,
}

impl ExtractionSnapshot {
    /// Ready means nothing is still processing; whether any data arrived is a
    /// separate question answered by the merge pass.
    pub fn is_ready(&self) -> bool {
        self.metadata.ocr_pending == 0
    }

    pub fn all_sections(&self) -> Vec<OcrSection> {
        self.sections
            .values()
            .cloned()
            .flat_map(OneOrMany::into_vec)
            .collect()
    }
}

/// Where one document type's extracted fields land in the draft form.
#[derive(Debug, Clone)]
pub struct StepMapping {
    pub step: u32,
    pub transforms: Vec<FieldTransform>,
}

/// Registry mapping OCR document types onto form steps and their field
/// transforms.
#[derive(Debug, Clone, Default)]
pub struct SectionMapper {
    mappings: BTreeMap<String, StepMapping>,
}

const ENGLISH_TEST_TYPES: &[&str] = &["IELTS", "TOEFL", "PTE", "Duolingo"];

impl SectionMapper {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard admissions form layout: passports feed the personal
    /// details step, academic transcripts the education step, English test
    /// reports the test-scores step.
    pub fn standard() -> Self {
        let mut mapper = Self::default();
        mapper.register(
            "passport",
            StepMapping {
                step: 1,
                transforms: vec![
                    FieldTransform::GenderCode { field: "gender" },
                    FieldTransform::CopyIfTargetEmpty {
                        from: "expiry_date",
                        to: "passport_expiry_date",
                    },
                ],
            },
        );
        mapper.register(
            "academic_transcript",
            StepMapping {
                step: 2,
                transforms: Vec::new(),
            },
        );
        mapper.register(
            "english_test_report",
            StepMapping {
                step: 3,
                transforms: vec![FieldTransform::MatchOptionList {
                    field: "test_type",
                    options: ENGLISH_TEST_TYPES,
                    fallback: "Other",
                }],
            },
        );
        mapper
    }

    pub fn register(&mut self, document_type: &str, mapping: StepMapping) {
        self.mappings.insert(document_type.to_string(), mapping);
    }

    pub fn mapping_for(&self, document_type: &str) -> Option<&StepMapping> {
        self.mappings.get(document_type)
    }
}
