#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use fieldops_engines::evidence::validate_evidence;
use fieldops_engines::geo::{check_arrival, GeofenceConfig};
use fieldops_engines::guard::{GuardConfig, NeutralizationGuard, NeutralizeInput};
use fieldops_engines::sla::{SlaCalculator, SlaConfig};
use fieldops_kernel_contracts::evidence::{EvidenceBundle, EvidenceItem, ValidatorId};
use fieldops_kernel_contracts::site::{GeoPoint, Site};
use fieldops_kernel_contracts::ticket::{Ticket, TicketId, TicketPriority, TicketStatus};
use fieldops_kernel_contracts::verdict::{Deficiency, NeutralizeVerdict};
use fieldops_kernel_contracts::{ContractViolation, Validate};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleConfig {
    pub geofence: GeofenceConfig,
    pub sla: SlaConfig,
    pub guard: GuardConfig,
}

impl LifecycleConfig {
    pub fn mvp_v1() -> Self {
        Self {
            geofence: GeofenceConfig::mvp_v1(),
            sla: SlaConfig::mvp_v1(),
            guard: GuardConfig::mvp_v1(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),
    #[error("transition {} -> {} is not allowed", .from.as_str(), .to.as_str())]
    NotAllowed { from: TicketStatus, to: TicketStatus },
    #[error("transition time {at} precedes last lifecycle timestamp {last}")]
    TimestampRegression {
        at: DateTime<Utc>,
        last: DateTime<Utc>,
    },
    #[error("record belongs to a different {record}")]
    RecordMismatch { record: &'static str },
    #[error("arrival outside site geofence ({distance_m:.0} m > {radius_m:.0} m)")]
    OutsideArrivalGeofence { distance_m: f64, radius_m: f64 },
    #[error("neutralization blocked: {} reason(s)", .0.len())]
    Blocked(Vec<Deficiency>),
    #[error("evidence invalid: {} error(s)", .0.len())]
    EvidenceInvalid(Vec<Deficiency>),
    #[error("evidence bundle has not been validated")]
    BundleNotValidated,
}

/// Decision seam for the neutralization transition.
pub trait NeutralizationEngine {
    fn can_neutralize(&self, input: &NeutralizeInput<'_>) -> NeutralizeVerdict;
}

impl NeutralizationEngine for NeutralizationGuard {
    fn can_neutralize(&self, input: &NeutralizeInput<'_>) -> NeutralizeVerdict {
        NeutralizationGuard::can_neutralize(self, input)
    }
}

/// Applies lifecycle transitions. Every method returns an updated copy and
/// leaves its inputs untouched; persisting the result is the caller's job.
#[derive(Debug, Clone)]
pub struct TicketLifecycle<E>
where
    E: NeutralizationEngine,
{
    config: LifecycleConfig,
    sla: SlaCalculator,
    engine: E,
}

impl TicketLifecycle<NeutralizationGuard> {
    pub fn mvp_v1() -> Result<Self, ContractViolation> {
        let config = LifecycleConfig::mvp_v1();
        Self::new(config, NeutralizationGuard::new(config.guard))
    }
}

impl<E> TicketLifecycle<E>
where
    E: NeutralizationEngine,
{
    pub fn new(config: LifecycleConfig, engine: E) -> Result<Self, ContractViolation> {
        for (field, radius) in [
            (
                "lifecycle_config.geofence.arrival_radius_m",
                config.geofence.arrival_radius_m,
            ),
            (
                "lifecycle_config.geofence.evidence_radius_m",
                config.geofence.evidence_radius_m,
            ),
            (
                "lifecycle_config.guard.evidence_radius_m",
                config.guard.evidence_radius_m,
            ),
        ] {
            if !radius.is_finite() {
                return Err(ContractViolation::NotFinite { field });
            }
            if radius <= 0.0 {
                return Err(ContractViolation::InvalidValue {
                    field,
                    reason: "must be > 0",
                });
            }
        }
        if config.sla.metro_zones.iter().any(|z| z.trim().is_empty()) {
            return Err(ContractViolation::InvalidValue {
                field: "lifecycle_config.sla.metro_zones",
                reason: "must not contain blank zone names",
            });
        }
        Ok(Self {
            config,
            sla: SlaCalculator::new(config.sla),
            engine,
        })
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Builds a received ticket with its SLA deadline stamped. Excluded
    /// tickets carry no deadline.
    #[allow(clippy::too_many_arguments)]
    pub fn open_ticket(
        &self,
        id: TicketId,
        code: String,
        priority: TicketPriority,
        site: &Site,
        intervention_type: Option<String>,
        opened_at: DateTime<Utc>,
        exclusion_cause: Option<String>,
        is_recurrent: bool,
    ) -> Result<Ticket, TransitionError> {
        site.validate()?;
        let mut ticket = Ticket::received_v1(
            id,
            code,
            priority,
            site.id.clone(),
            intervention_type,
            opened_at,
            exclusion_cause,
            is_recurrent,
        )?;
        if !ticket.is_sla_excluded() {
            let deadline = self.sla.deadline(opened_at, priority, site.zone.as_deref());
            ticket.sla_deadline = Some(deadline.with_timezone(&Utc));
        }
        ticket.validate()?;
        info!(
            ticket_id = %ticket.id,
            priority = priority.as_str(),
            sla_deadline = ?ticket.sla_deadline,
            "ticket received"
        );
        Ok(ticket)
    }

    pub fn assign(&self, ticket: &Ticket, at: DateTime<Utc>) -> Result<Ticket, TransitionError> {
        let mut next = self.step(ticket, TicketStatus::Assigned)?;
        self.not_before_last(ticket, at)?;
        next.assigned_at = Some(at);
        next.validate()?;
        self.applied(&next);
        Ok(next)
    }

    pub fn record_arrival(
        &self,
        ticket: &Ticket,
        site: &Site,
        position: GeoPoint,
        at: DateTime<Utc>,
    ) -> Result<Ticket, TransitionError> {
        position.validate()?;
        if ticket.site_id != site.id {
            return Err(self.refused(ticket, TransitionError::RecordMismatch { record: "site" }));
        }
        let mut next = self.step(ticket, TicketStatus::OnSite)?;
        self.not_before_last(ticket, at)?;

        let check = check_arrival(position, site, &self.config.geofence);
        if !check.inside {
            return Err(self.refused(
                ticket,
                TransitionError::OutsideArrivalGeofence {
                    distance_m: check.distance_m,
                    radius_m: check.radius_m,
                },
            ));
        }

        next.arrived_at = Some(at);
        next.validate()?;
        self.applied(&next);
        Ok(next)
    }

    /// Runs the neutralization guard and, when it passes, moves an on-site
    /// ticket to neutralized. Every item must belong to the submitted bundle.
    pub fn neutralize(
        &self,
        input: &NeutralizeInput<'_>,
        at: DateTime<Utc>,
    ) -> Result<Ticket, TransitionError> {
        let ticket = input.ticket;
        if ticket.site_id != input.site.id {
            return Err(self.refused(ticket, TransitionError::RecordMismatch { record: "site" }));
        }
        if let Some(bundle) = input.bundle {
            if bundle.ticket_id != ticket.id {
                return Err(self.refused(
                    ticket,
                    TransitionError::RecordMismatch {
                        record: "evidence bundle",
                    },
                ));
            }
            if input.items.iter().any(|i| i.bundle_id != bundle.id) {
                return Err(self.refused(
                    ticket,
                    TransitionError::RecordMismatch {
                        record: "evidence item",
                    },
                ));
            }
        }

        let verdict = self.engine.can_neutralize(input);
        if !verdict.can_neutralize {
            return Err(self.refused(ticket, TransitionError::Blocked(verdict.reasons)));
        }

        let mut next = self.step(ticket, TicketStatus::Neutralized)?;
        self.not_before_last(ticket, at)?;
        next.neutralized_at = Some(at);
        next.validate()?;
        self.applied(&next);
        Ok(next)
    }

    /// Supervisor sign-off; requires the ticket's bundle to have been validated.
    pub fn validate(
        &self,
        ticket: &Ticket,
        bundle: &EvidenceBundle,
        at: DateTime<Utc>,
    ) -> Result<Ticket, TransitionError> {
        if bundle.ticket_id != ticket.id {
            return Err(self.refused(
                ticket,
                TransitionError::RecordMismatch {
                    record: "evidence bundle",
                },
            ));
        }
        if !bundle.is_valid {
            return Err(self.refused(ticket, TransitionError::BundleNotValidated));
        }
        let mut next = self.step(ticket, TicketStatus::Validated)?;
        self.not_before_last(ticket, at)?;
        next.validated_at = Some(at);
        next.validate()?;
        self.applied(&next);
        Ok(next)
    }

    pub fn close(&self, ticket: &Ticket, at: DateTime<Utc>) -> Result<Ticket, TransitionError> {
        let mut next = self.step(ticket, TicketStatus::Closed)?;
        self.not_before_last(ticket, at)?;
        next.closed_at = Some(at);
        next.validate()?;
        self.applied(&next);
        Ok(next)
    }

    /// Validates the bundle's items and, if they pass, returns the bundle
    /// marked valid. Already-valid bundles are returned unchanged.
    pub fn mark_bundle_validated(
        &self,
        bundle: &EvidenceBundle,
        items: &[EvidenceItem],
        site: &Site,
        validator: ValidatorId,
        at: DateTime<Utc>,
    ) -> Result<EvidenceBundle, TransitionError> {
        bundle.validate()?;
        if bundle.is_valid {
            return Ok(bundle.clone());
        }
        let own_items: Vec<EvidenceItem> = items
            .iter()
            .filter(|i| i.bundle_id == bundle.id)
            .cloned()
            .collect();
        let result = validate_evidence(&own_items, site, self.config.geofence.evidence_radius_m);
        if !result.valid {
            warn!(
                bundle_id = %bundle.id,
                error_count = result.errors.len(),
                "evidence bundle rejected"
            );
            return Err(TransitionError::EvidenceInvalid(result.errors));
        }

        let mut next = bundle.clone();
        next.is_valid = true;
        next.validated_by = Some(validator);
        next.validated_at = Some(at);
        next.validate()?;
        info!(bundle_id = %next.id, ticket_id = %next.ticket_id, "evidence bundle validated");
        Ok(next)
    }

    fn step(&self, ticket: &Ticket, to: TicketStatus) -> Result<Ticket, TransitionError> {
        if ticket.status.next() != Some(to) {
            return Err(self.refused(
                ticket,
                TransitionError::NotAllowed {
                    from: ticket.status,
                    to,
                },
            ));
        }
        let mut next = ticket.clone();
        next.status = to;
        Ok(next)
    }

    fn not_before_last(&self, ticket: &Ticket, at: DateTime<Utc>) -> Result<(), TransitionError> {
        let last = ticket.last_stamp();
        if at < last {
            return Err(self.refused(ticket, TransitionError::TimestampRegression { at, last }));
        }
        Ok(())
    }

    fn applied(&self, ticket: &Ticket) {
        info!(
            ticket_id = %ticket.id,
            status = ticket.status.as_str(),
            "ticket transition applied"
        );
    }

    fn refused(&self, ticket: &Ticket, err: TransitionError) -> TransitionError {
        warn!(ticket_id = %ticket.id, error = %err, "ticket transition refused");
        err
    }
}
