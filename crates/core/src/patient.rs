//! Patient demographic record

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::coerce::{from_object, parse_date};
use crate::error::ModelError;
use crate::id::ResourceId;
use crate::patch::Patch;

const RESOURCE: &str = "Patient";

/// Administrative gender (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Unknown => "unknown",
        }
    }
}

impl FromStr for Gender {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            "unknown" => Ok(Gender::Unknown),
            _ => Err(ModelError::Validation(format!(
                "{} validation failed: gender: `{}` is not a valid enum value",
                RESOURCE, s
            ))),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External identifier such as a national ID. No uniqueness is enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A validated patient name; `family` is always non-blank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanName {
    pub family: String,
    #[serde(default)]
    pub given: Vec<String>,
}

/// A patient name as received from a client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanNameDraft {
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub given: Option<Vec<String>>,
}

/// A stored patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: ResourceId,
    pub identifier: Vec<Identifier>,
    pub name: Vec<HumanName>,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// The client-controlled part of a patient, after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientFields {
    pub identifier: Vec<Identifier>,
    pub name: Vec<HumanName>,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
}

/// Create payload before validation.
///
/// Fields the record does not know about (including `id` and `createdAt`)
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDraft {
    #[serde(default)]
    pub identifier: Option<Vec<Identifier>>,
    #[serde(default)]
    pub name: Option<Vec<HumanNameDraft>>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
}

/// Update payload: only fields present in the request are merged
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientPatch {
    #[serde(default)]
    pub identifier: Patch<Vec<Identifier>>,
    #[serde(default)]
    pub name: Patch<Vec<HumanNameDraft>>,
    #[serde(default)]
    pub gender: Patch<String>,
    #[serde(default)]
    pub birth_date: Patch<String>,
}

impl PatientDraft {
    /// Coerce a JSON request body into a draft
    pub fn from_json(body: JsonValue) -> Result<Self, ModelError> {
        from_object(RESOURCE, body)
    }

    /// Check every schema constraint and produce typed fields
    pub fn validate(self) -> Result<PatientFields, ModelError> {
        let names = self
            .name
            .filter(|names| !names.is_empty())
            .ok_or_else(|| invalid("name is required"))?;

        let name = names
            .into_iter()
            .enumerate()
            .map(|(i, draft)| match draft.family {
                Some(family) if !family.trim().is_empty() => Ok(HumanName {
                    family,
                    given: draft.given.unwrap_or_default(),
                }),
                _ => Err(invalid(&format!("name[{}].family is required", i))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let gender = self.gender.as_deref().map(Gender::from_str).transpose()?;
        let birth_date = self
            .birth_date
            .as_deref()
            .map(|raw| parse_date(RESOURCE, "birthDate", raw))
            .transpose()?;

        Ok(PatientFields {
            identifier: self.identifier.unwrap_or_default(),
            name,
            gender,
            birth_date,
        })
    }
}

impl From<&Patient> for PatientDraft {
    fn from(patient: &Patient) -> Self {
        Self {
            identifier: Some(patient.identifier.clone()),
            name: Some(
                patient
                    .name
                    .iter()
                    .map(|n| HumanNameDraft {
                        family: Some(n.family.clone()),
                        given: Some(n.given.clone()),
                    })
                    .collect(),
            ),
            gender: patient.gender.map(|g| g.as_str().to_string()),
            birth_date: patient.birth_date.map(|d| d.to_string()),
        }
    }
}

impl PatientPatch {
    /// Coerce a JSON request body into a patch
    pub fn from_json(body: JsonValue) -> Result<Self, ModelError> {
        from_object(RESOURCE, body)
    }

    pub fn is_empty(&self) -> bool {
        self.identifier.is_absent()
            && self.name.is_absent()
            && self.gender.is_absent()
            && self.birth_date.is_absent()
    }
}

impl Patient {
    /// Build a new record with a fresh id, stamped with the current time
    pub fn new(fields: PatientFields) -> Self {
        Self {
            id: ResourceId::new(),
            identifier: fields.identifier,
            name: fields.name,
            gender: fields.gender,
            birth_date: fields.birth_date,
            created_at: Utc::now(),
        }
    }

    /// Merge a patch into this record and re-validate the result.
    ///
    /// `id` and `createdAt` are carried over unchanged.
    pub fn apply(&self, patch: PatientPatch) -> Result<Patient, ModelError> {
        let mut draft = PatientDraft::from(self);
        patch.identifier.merge_into(&mut draft.identifier);
        patch.name.merge_into(&mut draft.name);
        patch.gender.merge_into(&mut draft.gender);
        patch.birth_date.merge_into(&mut draft.birth_date);

        let fields = draft.validate()?;
        Ok(Patient {
            id: self.id,
            identifier: fields.identifier,
            name: fields.name,
            gender: fields.gender,
            birth_date: fields.birth_date,
            created_at: self.created_at,
        })
    }
}

fn invalid(detail: &str) -> ModelError {
    ModelError::Validation(format!("{} validation failed: {}", RESOURCE, detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn draft(body: JsonValue) -> Result<PatientFields, ModelError> {
        PatientDraft::from_json(body)?.validate()
    }

    fn jane() -> Patient {
        let fields = draft(json!({
            "identifier": [{"system": "urn:oid:national-id", "value": "A-100"}],
            "name": [{"family": "Doe", "given": ["Jane"]}],
            "gender": "female",
            "birthDate": "1988-12-01"
        }))
        .unwrap();
        Patient::new(fields)
    }

    #[test]
    fn minimal_patient_is_valid() {
        let fields = draft(json!({"name": [{"family": "Doe"}]})).unwrap();
        assert_eq!(fields.name[0].family, "Doe");
        assert!(fields.name[0].given.is_empty());
        assert!(fields.identifier.is_empty());
        assert_eq!(fields.gender, None);
        assert_eq!(fields.birth_date, None);
    }

    #[test]
    fn name_is_required() {
        for body in [
            json!({}),
            json!({"name": null}),
            json!({"name": []}),
            json!({"gender": "male"}),
        ] {
            let err = draft(body).unwrap_err();
            assert_eq!(
                err,
                ModelError::Validation("Patient validation failed: name is required".into())
            );
        }
    }

    #[test]
    fn every_name_needs_a_family() {
        let err = draft(json!({"name": [{"family": "Doe"}, {"given": ["X"]}]})).unwrap_err();
        assert_eq!(
            err,
            ModelError::Validation("Patient validation failed: name[1].family is required".into())
        );

        let err = draft(json!({"name": [{"family": "  "}]})).unwrap_err();
        assert!(matches!(err, ModelError::Validation(m) if m.contains("name[0].family")));
    }

    #[test]
    fn gender_outside_closed_set_is_rejected() {
        let err = draft(json!({"name": [{"family": "Doe"}], "gender": "robot"})).unwrap_err();
        assert!(matches!(err, ModelError::Validation(m) if m.contains("gender")));
    }

    #[test]
    fn malformed_birth_date_is_a_coercion_error() {
        let err = draft(json!({"name": [{"family": "Doe"}], "birthDate": "yesterday"})).unwrap_err();
        assert!(matches!(err, ModelError::TypeCoercion(_)));
    }

    #[test]
    fn wrong_json_types_are_coercion_errors() {
        assert!(matches!(
            draft(json!({"name": 42})),
            Err(ModelError::TypeCoercion(_))
        ));
        assert!(matches!(
            draft(json!([{"family": "Doe"}])),
            Err(ModelError::TypeCoercion(_))
        ));
    }

    #[test]
    fn unknown_and_server_owned_fields_are_ignored() {
        let fields = draft(json!({
            "id": "not-used",
            "createdAt": "1999-01-01",
            "name": [{"family": "Doe"}],
            "telecom": [{"system": "phone"}]
        }))
        .unwrap();
        assert_eq!(fields.name.len(), 1);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let patient = jane();
        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["birthDate"], "1988-12-01");
        assert_eq!(json["gender"], "female");
        assert!(json["createdAt"].is_string());
        assert_eq!(json["id"], patient.id.to_string());

        let back: Patient = serde_json::from_value(json).unwrap();
        assert_eq!(back, patient);
    }

    #[test]
    fn gender_only_patch_leaves_other_fields() {
        let before = jane();
        let patch = PatientPatch::from_json(json!({"gender": "other"})).unwrap();
        let after = before.apply(patch).unwrap();

        assert_eq!(after.gender, Some(Gender::Other));
        assert_eq!(after.identifier, before.identifier);
        assert_eq!(after.name, before.name);
        assert_eq!(after.birth_date, before.birth_date);
        assert_eq!(after.id, before.id);
        assert_eq!(after.created_at, before.created_at);
    }

    #[test]
    fn null_and_empty_clear_fields() {
        let before = jane();
        let patch =
            PatientPatch::from_json(json!({"birthDate": null, "gender": null, "identifier": []}))
                .unwrap();
        let after = before.apply(patch).unwrap();

        assert_eq!(after.birth_date, None);
        assert_eq!(after.gender, None);
        assert!(after.identifier.is_empty());
        assert_eq!(after.name, before.name);
    }

    #[test]
    fn patch_cannot_remove_required_name() {
        let before = jane();
        for body in [json!({"name": []}), json!({"name": null})] {
            let patch = PatientPatch::from_json(body).unwrap();
            assert!(matches!(before.apply(patch), Err(ModelError::Validation(_))));
        }
    }

    #[test]
    fn empty_string_is_a_value_not_absence() {
        let patch = PatientPatch::from_json(json!({"gender": ""})).unwrap();
        assert!(!patch.is_empty());
        assert!(matches!(jane().apply(patch), Err(ModelError::Validation(_))));
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let before = jane();
        let patch = PatientPatch::from_json(json!({"createdAt": "2000-01-01"})).unwrap();
        assert!(patch.is_empty());
        assert_eq!(before.apply(patch).unwrap(), before);
    }
}
