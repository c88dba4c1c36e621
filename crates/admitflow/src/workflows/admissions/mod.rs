//! Admissions application lifecycle: stage ordering, transition guards,
//! Galaxy propagation tracking, and the HTTP surface exposing them.

pub mod domain;
pub mod galaxy;
pub mod guards;
pub mod listing;
pub mod repository;
pub mod router;
pub mod service;
pub mod sync;

#[cfg(test)]
mod tests;

pub use domain::{
    display_label, kanban_placement, ActorRole, ApplicationId, ApplicationStage, KanbanPlacement,
    StaffId, SyncMetadata, SyncStatus, KNOWN_SECTIONS,
};
pub use galaxy::{GalaxyGateway, GalaxySyncError, HttpGalaxyGateway};
pub use guards::{TransitionGuard, TransitionRefusal};
pub use listing::{ListFilters, ListState, ListStateStore, PageRequest};
pub use repository::{
    ApplicationRecord, ApplicationRepository, ApplicationStatusView, RepositoryError,
};
pub use router::admissions_router;
pub use service::{AdmissionsService, AdmissionsServiceError, SyncOutcome};
pub use sync::{evaluate, is_sync_complete, SyncPolicy, SyncReport};
