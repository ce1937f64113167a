#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::string_id;
use crate::ticket::TicketId;
use crate::{ContractViolation, SchemaVersion, Validate};

pub const PERMIT_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

string_id!(PermitId, "permit_id", 64);

/// Hazard categories an HSE permit can be issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermitType {
    WorkAtHeight,
    Electrical,
    ConfinedSpace,
    HotWork,
    Excavation,
    Radiofrequency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsePermit {
    pub schema_version: SchemaVersion,
    pub id: PermitId,
    pub ticket_id: TicketId,
    pub permit_type: PermitType,
    pub status: PermitStatus,
    pub issued_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl HsePermit {
    pub fn v1(
        id: PermitId,
        ticket_id: TicketId,
        permit_type: PermitType,
        status: PermitStatus,
        issued_at: DateTime<Utc>,
        approved_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ContractViolation> {
        let p = Self {
            schema_version: PERMIT_CONTRACT_VERSION,
            id,
            ticket_id,
            permit_type,
            status,
            issued_at,
            approved_at,
        };
        p.validate()?;
        Ok(p)
    }

    pub fn is_approved_for(&self, ticket_id: &TicketId) -> bool {
        self.status == PermitStatus::Approved && &self.ticket_id == ticket_id
    }
}

impl Validate for HsePermit {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != PERMIT_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "hse_permit.schema_version",
                reason: "must match PERMIT_CONTRACT_VERSION",
            });
        }
        self.id.validate()?;
        self.ticket_id.validate()?;
        match (self.status, self.approved_at) {
            (PermitStatus::Approved, None) => Err(ContractViolation::InvalidValue {
                field: "hse_permit.approved_at",
                reason: "must be set on approved permits",
            }),
            (_, Some(approved_at)) if approved_at < self.issued_at => {
                Err(ContractViolation::InvalidValue {
                    field: "hse_permit.approved_at",
                    reason: "must not precede issued_at",
                })
            }
            _ => Ok(()),
        }
    }
}
