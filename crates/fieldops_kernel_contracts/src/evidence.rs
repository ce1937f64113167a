#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{string_id, validate_id};
use crate::site::GeoPoint;
use crate::ticket::TicketId;
use crate::{ContractViolation, SchemaVersion, Validate};

pub const EVIDENCE_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

string_id!(BundleId, "bundle_id", 64);
string_id!(EvidenceItemId, "evidence_item_id", 64);
string_id!(ValidatorId, "validator_id", 128);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    PhotoBefore,
    PhotoAfter,
    Signature,
    Checklist,
    GeoTag,
    Other,
}

impl EvidenceType {
    pub fn is_photo(self) -> bool {
        matches!(self, Self::PhotoBefore | Self::PhotoAfter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExifMetadata {
    pub captured_at: Option<DateTime<Utc>>,
    pub gps: Option<GeoPoint>,
}

/// Post-intervention checklist as captured by the technician.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistData {
    pub tipo_falla: String,
    pub accion_realizada: String,
    #[serde(default)]
    pub repuestos_usados: Vec<String>,
    pub pruebas_post: String,
    #[serde(default)]
    pub observaciones: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub schema_version: SchemaVersion,
    pub id: BundleId,
    pub ticket_id: TicketId,
    pub is_valid: bool,
    pub validated_by: Option<ValidatorId>,
    pub validated_at: Option<DateTime<Utc>>,
}

impl EvidenceBundle {
    /// Bundle as created on first submission, not yet validated.
    pub fn pending_v1(id: BundleId, ticket_id: TicketId) -> Result<Self, ContractViolation> {
        let b = Self {
            schema_version: EVIDENCE_CONTRACT_VERSION,
            id,
            ticket_id,
            is_valid: false,
            validated_by: None,
            validated_at: None,
        };
        b.validate()?;
        Ok(b)
    }
}

impl Validate for EvidenceBundle {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != EVIDENCE_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "evidence_bundle.schema_version",
                reason: "must match EVIDENCE_CONTRACT_VERSION",
            });
        }
        self.id.validate()?;
        self.ticket_id.validate()?;
        if self.validated_by.is_some() != self.validated_at.is_some() {
            return Err(ContractViolation::InvalidValue {
                field: "evidence_bundle.validated_by",
                reason: "validated_by and validated_at must be set together",
            });
        }
        if self.is_valid && self.validated_by.is_none() {
            return Err(ContractViolation::InvalidValue {
                field: "evidence_bundle.is_valid",
                reason: "a valid bundle must record its validator",
            });
        }
        if let Some(v) = &self.validated_by {
            v.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub schema_version: SchemaVersion,
    pub id: EvidenceItemId,
    pub bundle_id: BundleId,
    pub evidence_type: EvidenceType,
    pub content_ref: String,
    pub exif: Option<ExifMetadata>,
    pub geo: Option<GeoPoint>,
    pub checklist: Option<ChecklistData>,
    pub content_hash: String,
}

impl EvidenceItem {
    #[allow(clippy::too_many_arguments)]
    pub fn v1(
        id: EvidenceItemId,
        bundle_id: BundleId,
        evidence_type: EvidenceType,
        content_ref: String,
        exif: Option<ExifMetadata>,
        geo: Option<GeoPoint>,
        checklist: Option<ChecklistData>,
        content_hash: String,
    ) -> Result<Self, ContractViolation> {
        let item = Self {
            schema_version: EVIDENCE_CONTRACT_VERSION,
            id,
            bundle_id,
            evidence_type,
            content_ref,
            exif,
            geo,
            checklist,
            content_hash,
        };
        item.validate()?;
        Ok(item)
    }

    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.exif.and_then(|e| e.captured_at)
    }
}

impl Validate for EvidenceItem {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != EVIDENCE_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "evidence_item.schema_version",
                reason: "must match EVIDENCE_CONTRACT_VERSION",
            });
        }
        self.id.validate()?;
        self.bundle_id.validate()?;
        validate_id("evidence_item.content_ref", &self.content_ref, 1024)?;
        if let Some(geo) = &self.geo {
            geo.validate()?;
        }
        if let Some(gps) = self.exif.and_then(|e| e.gps) {
            gps.validate()?;
        }
        if self.checklist.is_some() && self.evidence_type != EvidenceType::Checklist {
            return Err(ContractViolation::InvalidValue {
                field: "evidence_item.checklist",
                reason: "only checklist items may carry a checklist payload",
            });
        }
        validate_sha256("evidence_item.content_hash", &self.content_hash)
    }
}

fn validate_sha256(field: &'static str, value: &str) -> Result<(), ContractViolation> {
    if value.len() != 64
        || !value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, 'a'..='f'))
    {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be a 64-char lowercase hex value",
        });
    }
    Ok(())
}
