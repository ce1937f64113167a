#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{string_id, validate_id, validate_opt_text};
use crate::site::SiteId;
use crate::{ContractViolation, SchemaVersion, Validate};

pub const TICKET_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

string_id!(TicketId, "ticket_id", 64);

/// Severity, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TicketPriority {
    P0,
    P1,
    P2,
    P3,
}

impl TicketPriority {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "P0" => Some(Self::P0),
            "P1" => Some(Self::P1),
            "P2" => Some(Self::P2),
            "P3" => Some(Self::P3),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
        }
    }
}

/// Lifecycle states in the only order a ticket may traverse them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Received,
    Assigned,
    OnSite,
    Neutralized,
    Validated,
    Closed,
}

impl TicketStatus {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "received" => Some(Self::Received),
            "assigned" => Some(Self::Assigned),
            "on_site" => Some(Self::OnSite),
            "neutralized" => Some(Self::Neutralized),
            "validated" => Some(Self::Validated),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Assigned => "assigned",
            Self::OnSite => "on_site",
            Self::Neutralized => "neutralized",
            Self::Validated => "validated",
            Self::Closed => "closed",
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::Received => Some(Self::Assigned),
            Self::Assigned => Some(Self::OnSite),
            Self::OnSite => Some(Self::Neutralized),
            Self::Neutralized => Some(Self::Validated),
            Self::Validated => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// True once the repair has been neutralized, whether or not it was validated or closed since.
    pub fn is_past_neutralization(self) -> bool {
        self >= Self::Neutralized
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub schema_version: SchemaVersion,
    pub id: TicketId,
    pub code: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub site_id: SiteId,
    pub intervention_type: Option<String>,
    pub opened_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub neutralized_at: Option<DateTime<Utc>>,
    pub validated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub sla_deadline: Option<DateTime<Utc>>,
    pub exclusion_cause: Option<String>,
    pub is_recurrent: bool,
}

impl Ticket {
    /// A freshly received ticket: no later timestamps and no deadline yet.
    #[allow(clippy::too_many_arguments)]
    pub fn received_v1(
        id: TicketId,
        code: String,
        priority: TicketPriority,
        site_id: SiteId,
        intervention_type: Option<String>,
        opened_at: DateTime<Utc>,
        exclusion_cause: Option<String>,
        is_recurrent: bool,
    ) -> Result<Self, ContractViolation> {
        let t = Self {
            schema_version: TICKET_CONTRACT_VERSION,
            id,
            code,
            priority,
            status: TicketStatus::Received,
            site_id,
            intervention_type,
            opened_at,
            assigned_at: None,
            arrived_at: None,
            neutralized_at: None,
            validated_at: None,
            closed_at: None,
            sla_deadline: None,
            exclusion_cause,
            is_recurrent,
        };
        t.validate()?;
        Ok(t)
    }

    pub fn is_sla_excluded(&self) -> bool {
        self.exclusion_cause.is_some()
    }

    /// Latest lifecycle timestamp that has been set.
    pub fn last_stamp(&self) -> DateTime<Utc> {
        self.lifecycle_stamps()
            .into_iter()
            .flatten()
            .last()
            .unwrap_or(self.opened_at)
    }

    fn lifecycle_stamps(&self) -> [Option<DateTime<Utc>>; 6] {
        [
            Some(self.opened_at),
            self.assigned_at,
            self.arrived_at,
            self.neutralized_at,
            self.validated_at,
            self.closed_at,
        ]
    }
}

impl Validate for Ticket {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != TICKET_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "ticket.schema_version",
                reason: "must match TICKET_CONTRACT_VERSION",
            });
        }
        self.id.validate()?;
        validate_id("ticket.code", &self.code, 64)?;
        self.site_id.validate()?;
        validate_opt_text("ticket.intervention_type", &self.intervention_type, 64)?;
        validate_opt_text("ticket.exclusion_cause", &self.exclusion_cause, 512)?;

        let mut prev: Option<DateTime<Utc>> = None;
        for stamp in self.lifecycle_stamps().into_iter().flatten() {
            if prev.is_some_and(|p| stamp < p) {
                return Err(ContractViolation::InvalidValue {
                    field: "ticket.lifecycle_timestamps",
                    reason: "must be non-decreasing in lifecycle order",
                });
            }
            prev = Some(stamp);
        }

        let required = [
            (TicketStatus::Assigned, self.assigned_at, "ticket.assigned_at"),
            (TicketStatus::OnSite, self.arrived_at, "ticket.arrived_at"),
            (
                TicketStatus::Neutralized,
                self.neutralized_at,
                "ticket.neutralized_at",
            ),
            (
                TicketStatus::Validated,
                self.validated_at,
                "ticket.validated_at",
            ),
            (TicketStatus::Closed, self.closed_at, "ticket.closed_at"),
        ];
        for (stage, stamp, field) in required {
            if self.status >= stage && stamp.is_none() {
                return Err(ContractViolation::InvalidValue {
                    field,
                    reason: "must be set once the status reaches this stage",
                });
            }
        }

        if let Some(deadline) = self.sla_deadline {
            if deadline < self.opened_at {
                return Err(ContractViolation::InvalidValue {
                    field: "ticket.sla_deadline",
                    reason: "must not precede opened_at",
                });
            }
        }
        Ok(())
    }
}
