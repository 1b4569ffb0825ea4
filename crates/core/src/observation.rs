//! Observation record: a measurement or result about a patient

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::coerce::{from_object, parse_timestamp};
use crate::error::ModelError;
use crate::id::ResourceId;
use crate::patch::Patch;

const RESOURCE: &str = "Observation";

/// Observation workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObservationStatus {
    Registered,
    Preliminary,
    #[default]
    Final,
    Amended,
    Corrected,
    Cancelled,
    EnteredInError,
    Unknown,
}

impl ObservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationStatus::Registered => "registered",
            ObservationStatus::Preliminary => "preliminary",
            ObservationStatus::Final => "final",
            ObservationStatus::Amended => "amended",
            ObservationStatus::Corrected => "corrected",
            ObservationStatus::Cancelled => "cancelled",
            ObservationStatus::EnteredInError => "entered-in-error",
            ObservationStatus::Unknown => "unknown",
        }
    }
}

impl FromStr for ObservationStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(ObservationStatus::Registered),
            "preliminary" => Ok(ObservationStatus::Preliminary),
            "final" => Ok(ObservationStatus::Final),
            "amended" => Ok(ObservationStatus::Amended),
            "corrected" => Ok(ObservationStatus::Corrected),
            "cancelled" => Ok(ObservationStatus::Cancelled),
            "entered-in-error" => Ok(ObservationStatus::EnteredInError),
            "unknown" => Ok(ObservationStatus::Unknown),
            _ => Err(invalid(&format!("status: `{}` is not a valid enum value", s))),
        }
    }
}

impl fmt::Display for ObservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// What was observed. Intentionally permissive: nothing is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default)]
    pub coding: Vec<Coding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A measured amount
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Reference to the patient an observation is about, as sent by a client.
///
/// Either the bare patient id, `Patient/<id>`, or `{"reference": "Patient/<id>"}`.
/// Any other JSON shape is kept as-is and rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SubjectRef {
    Bare(String),
    Reference { reference: String },
    Other(JsonValue),
}

impl SubjectRef {
    fn resolve(&self) -> Result<ResourceId, ModelError> {
        let raw = match self {
            SubjectRef::Bare(raw) => raw.as_str(),
            SubjectRef::Reference { reference } => reference.as_str(),
            SubjectRef::Other(value) => {
                return Err(invalid(&format!(
                    "subject: `{}` is not a valid Patient reference",
                    value
                )));
            }
        };
        let id = raw.strip_prefix("Patient/").unwrap_or(raw);
        ResourceId::parse(id).map_err(|_| {
            invalid(&format!("subject: `{}` is not a valid Patient reference", raw))
        })
    }
}

/// A stored observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: ResourceId,
    pub status: ObservationStatus,
    pub code: CodeableConcept,
    pub subject: ResourceId,
    pub effective_date_time: Option<DateTime<Utc>>,
    pub value_quantity: Option<Quantity>,
    pub issued: DateTime<Utc>,
}

/// The client-controlled part of an observation, after validation
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationFields {
    pub status: ObservationStatus,
    pub code: CodeableConcept,
    pub subject: ResourceId,
    pub effective_date_time: Option<DateTime<Utc>>,
    pub value_quantity: Option<Quantity>,
    pub issued: Option<DateTime<Utc>>,
}

/// Create payload before validation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationDraft {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub code: Option<CodeableConcept>,
    #[serde(default)]
    pub subject: Option<SubjectRef>,
    #[serde(default)]
    pub effective_date_time: Option<String>,
    #[serde(default)]
    pub value_quantity: Option<Quantity>,
    #[serde(default)]
    pub issued: Option<String>,
}

/// Update payload: only fields present in the request are merged
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationPatch {
    #[serde(default)]
    pub status: Patch<String>,
    #[serde(default)]
    pub code: Patch<CodeableConcept>,
    #[serde(default)]
    pub subject: Patch<SubjectRef>,
    #[serde(default)]
    pub effective_date_time: Patch<String>,
    #[serde(default)]
    pub value_quantity: Patch<Quantity>,
    #[serde(default)]
    pub issued: Patch<String>,
}

impl ObservationDraft {
    pub fn from_json(body: JsonValue) -> Result<Self, ModelError> {
        from_object(RESOURCE, body)
    }

    /// Check every schema constraint and produce typed fields.
    ///
    /// Only the shape of `subject` is checked here; whether the patient
    /// exists is a storage question.
    pub fn validate(self) -> Result<ObservationFields, ModelError> {
        let subject = self
            .subject
            .as_ref()
            .ok_or_else(|| invalid("subject is required"))?
            .resolve()?;

        let status = self
            .status
            .as_deref()
            .map(ObservationStatus::from_str)
            .transpose()?
            .unwrap_or_default();

        let effective_date_time = self
            .effective_date_time
            .as_deref()
            .map(|raw| parse_timestamp(RESOURCE, "effectiveDateTime", raw))
            .transpose()?;
        let issued = self
            .issued
            .as_deref()
            .map(|raw| parse_timestamp(RESOURCE, "issued", raw))
            .transpose()?;

        Ok(ObservationFields {
            status,
            code: self.code.unwrap_or_default(),
            subject,
            effective_date_time,
            value_quantity: self.value_quantity,
            issued,
        })
    }
}

impl From<&Observation> for ObservationDraft {
    fn from(obs: &Observation) -> Self {
        Self {
            status: Some(obs.status.as_str().to_string()),
            code: Some(obs.code.clone()),
            subject: Some(SubjectRef::Bare(obs.subject.to_string())),
            effective_date_time: obs.effective_date_time.map(format_timestamp),
            value_quantity: obs.value_quantity.clone(),
            issued: Some(format_timestamp(obs.issued)),
        }
    }
}

impl ObservationPatch {
    pub fn from_json(body: JsonValue) -> Result<Self, ModelError> {
        from_object(RESOURCE, body)
    }
}

impl Observation {
    /// Build a new record with a fresh id; `issued` defaults to now
    pub fn new(fields: ObservationFields) -> Self {
        Self {
            id: ResourceId::new(),
            status: fields.status,
            code: fields.code,
            subject: fields.subject,
            effective_date_time: fields.effective_date_time,
            value_quantity: fields.value_quantity,
            issued: fields.issued.unwrap_or_else(Utc::now),
        }
    }

    /// Merge a patch into this record and re-validate the result.
    ///
    /// `status: null` resets to `final`; `issued` cannot be cleared.
    pub fn apply(&self, patch: ObservationPatch) -> Result<Observation, ModelError> {
        if patch.issued == Patch::Null {
            return Err(invalid("issued cannot be cleared"));
        }

        let mut draft = ObservationDraft::from(self);
        patch.status.merge_into(&mut draft.status);
        patch.code.merge_into(&mut draft.code);
        patch.subject.merge_into(&mut draft.subject);
        patch.effective_date_time.merge_into(&mut draft.effective_date_time);
        patch.value_quantity.merge_into(&mut draft.value_quantity);
        patch.issued.merge_into(&mut draft.issued);

        let fields = draft.validate()?;
        Ok(Observation {
            id: self.id,
            status: fields.status,
            code: fields.code,
            subject: fields.subject,
            effective_date_time: fields.effective_date_time,
            value_quantity: fields.value_quantity,
            issued: fields.issued.unwrap_or(self.issued),
        })
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn invalid(detail: &str) -> ModelError {
    ModelError::Validation(format!("{} validation failed: {}", RESOURCE, detail))
}
