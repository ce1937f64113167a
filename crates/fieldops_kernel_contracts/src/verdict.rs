#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ticket::TicketStatus;
use crate::ReasonCodeId;

pub mod reason_codes {
    use crate::ReasonCodeId;

    // Field-ticket rule namespace ("FT").
    pub const FT_CHECKLIST_NOT_COMPLETED: ReasonCodeId = ReasonCodeId(0x4654_0010);
    pub const FT_CHECKLIST_FIELD_MISSING: ReasonCodeId = ReasonCodeId(0x4654_0011);

    pub const FT_EVIDENCE_ITEM_MISSING: ReasonCodeId = ReasonCodeId(0x4654_0020);
    pub const FT_EVIDENCE_OUTSIDE_GEOFENCE: ReasonCodeId = ReasonCodeId(0x4654_0021);
    pub const FT_EVIDENCE_PHOTO_ORDER: ReasonCodeId = ReasonCodeId(0x4654_0022);

    pub const FT_PERMIT_APPROVED_MISSING: ReasonCodeId = ReasonCodeId(0x4654_0030);

    pub const FT_BUNDLE_MISSING: ReasonCodeId = ReasonCodeId(0x4654_0040);
    pub const FT_TICKET_ALREADY_TERMINAL: ReasonCodeId = ReasonCodeId(0x4654_0041);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistField {
    TipoFalla,
    AccionRealizada,
    PruebasPost,
}

impl fmt::Display for ChecklistField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TipoFalla => "failure type (tipo_falla)",
            Self::AccionRealizada => "action taken (accion_realizada)",
            Self::PruebasPost => "post-intervention test (pruebas_post)",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoKind {
    Before,
    After,
}

impl fmt::Display for PhotoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Before => "BEFORE",
            Self::After => "AFTER",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredEvidence {
    Photo(PhotoKind),
    Checklist,
}

impl fmt::Display for RequiredEvidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Photo(kind) => write!(f, "{kind} photo"),
            Self::Checklist => f.write_str("checklist"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ChecklistDeficiency {
    #[error("checklist not completed")]
    NotCompleted,
    #[error("{field} is required")]
    FieldMissing { field: ChecklistField },
}

impl ChecklistDeficiency {
    pub fn reason_code(&self) -> ReasonCodeId {
        match self {
            Self::NotCompleted => reason_codes::FT_CHECKLIST_NOT_COMPLETED,
            Self::FieldMissing { .. } => reason_codes::FT_CHECKLIST_FIELD_MISSING,
        }
    }
}

/// A business rule a ticket or its evidence does not satisfy yet.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Deficiency {
    #[error("missing {item}")]
    EvidenceItemMissing { item: RequiredEvidence },
    #[error("{photo} photo outside site geofence ({distance_m:.0} m > {radius_m:.0} m)")]
    OutsideGeofence {
        photo: PhotoKind,
        distance_m: f64,
        radius_m: f64,
    },
    #[error("AFTER photo must be captured after the BEFORE photo")]
    PhotoOrderViolation,
    #[error("checklist: {0}")]
    ChecklistIncomplete(ChecklistDeficiency),
    #[error("approved HSE permit required for intervention type {intervention_type}")]
    ApprovedPermitMissing { intervention_type: String },
    #[error("no evidence bundle submitted")]
    EvidenceBundleMissing,
    #[error("ticket already neutralized or closed (status {})", .status.as_str())]
    TicketAlreadyTerminal { status: TicketStatus },
}

impl Deficiency {
    pub fn reason_code(&self) -> ReasonCodeId {
        match self {
            Self::EvidenceItemMissing { .. } => reason_codes::FT_EVIDENCE_ITEM_MISSING,
            Self::OutsideGeofence { .. } => reason_codes::FT_EVIDENCE_OUTSIDE_GEOFENCE,
            Self::PhotoOrderViolation => reason_codes::FT_EVIDENCE_PHOTO_ORDER,
            Self::ChecklistIncomplete(inner) => inner.reason_code(),
            Self::ApprovedPermitMissing { .. } => reason_codes::FT_PERMIT_APPROVED_MISSING,
            Self::EvidenceBundleMissing => reason_codes::FT_BUNDLE_MISSING,
            Self::TicketAlreadyTerminal { .. } => reason_codes::FT_TICKET_ALREADY_TERMINAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistValidation {
    pub valid: bool,
    pub errors: Vec<ChecklistDeficiency>,
}

impl ChecklistValidation {
    pub fn from_errors(errors: Vec<ChecklistDeficiency>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceValidation {
    pub valid: bool,
    pub errors: Vec<Deficiency>,
}

impl EvidenceValidation {
    pub fn from_errors(errors: Vec<Deficiency>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeutralizeVerdict {
    pub can_neutralize: bool,
    pub reasons: Vec<Deficiency>,
}

impl NeutralizeVerdict {
    pub fn from_reasons(reasons: Vec<Deficiency>) -> Self {
        Self {
            can_neutralize: reasons.is_empty(),
            reasons,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.reasons.iter().map(ToString::to_string).collect()
    }
}
