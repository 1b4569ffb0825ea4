//! medrec-core: clinical record models and their validation
//!
//! This crate defines the Patient and Observation records served by the
//! API, the loosely-typed drafts they are validated from, and the
//! partial-merge patches applied on update.

mod coerce;
pub mod error;
pub mod id;
pub mod observation;
pub mod patch;
pub mod patient;

pub use error::ModelError;
pub use id::ResourceId;
pub use observation::{
    CodeableConcept, Coding, Observation, ObservationDraft, ObservationFields, ObservationPatch,
    ObservationStatus, Quantity, SubjectRef,
};
pub use patch::Patch;
pub use patient::{
    Gender, HumanName, HumanNameDraft, Identifier, Patient, PatientDraft, PatientFields,
    PatientPatch,
};
