//! OCR autofill: bounded polling for extraction results, user-wins merging
//! into the step store, and debounced draft-form persistence.

pub mod bridge;
pub mod documents;
pub mod extraction;
pub mod merge;
pub mod poller;
pub mod step_store;
pub mod transforms;

#[cfg(test)]
mod tests;

pub use bridge::FormPersistenceBridge;
pub use documents::{
    DocumentGateway, HttpDocumentGateway, UploadError, UploadReceipt, UploadRequest,
};
pub use extraction::{
    ExtractionMetadata, ExtractionSnapshot, OcrSection, OneOrMany, SectionMapper, StepMapping,
};
pub use merge::{is_empty_value, merged_view};
pub use poller::{
    AutofillEngine, AutofillOutcome, ExtractionFetchError, ExtractionGateway,
    HttpExtractionGateway, PollPlan,
};
pub use step_store::{StepDataStore, StepEntry};
pub use transforms::FieldTransform;
