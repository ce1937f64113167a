#![forbid(unsafe_code)]

use fieldops_kernel_contracts::evidence::{EvidenceBundle, EvidenceItem};
use fieldops_kernel_contracts::permit::HsePermit;
use fieldops_kernel_contracts::site::Site;
use fieldops_kernel_contracts::ticket::Ticket;
use fieldops_kernel_contracts::verdict::{Deficiency, NeutralizeVerdict};
use tracing::debug;

use crate::evidence::{validate_evidence, DEFAULT_EVIDENCE_GEOFENCE_RADIUS_M};
use crate::permit::{has_approved_permit, requires_hse};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardConfig {
    pub evidence_radius_m: f64,
}

impl GuardConfig {
    pub fn mvp_v1() -> Self {
        Self {
            evidence_radius_m: DEFAULT_EVIDENCE_GEOFENCE_RADIUS_M,
        }
    }
}

/// Everything the guard looks at for one ticket. Records are borrowed, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct NeutralizeInput<'a> {
    pub ticket: &'a Ticket,
    pub bundle: Option<&'a EvidenceBundle>,
    pub items: &'a [EvidenceItem],
    pub permits: &'a [HsePermit],
    pub site: &'a Site,
}

#[derive(Debug, Clone)]
pub struct NeutralizationGuard {
    config: GuardConfig,
}

impl NeutralizationGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    pub fn can_neutralize(&self, input: &NeutralizeInput<'_>) -> NeutralizeVerdict {
        let ticket = input.ticket;
        if ticket.status.is_past_neutralization() {
            return NeutralizeVerdict::from_reasons(vec![Deficiency::TicketAlreadyTerminal {
                status: ticket.status,
            }]);
        }

        let mut reasons = Vec::new();

        if requires_hse(ticket) && !has_approved_permit(ticket, input.permits) {
            reasons.push(Deficiency::ApprovedPermitMissing {
                intervention_type: ticket.intervention_type.clone().unwrap_or_default(),
            });
        }

        if input.bundle.is_none() {
            reasons.push(Deficiency::EvidenceBundleMissing);
            return self.verdict(ticket, reasons);
        }

        reasons.extend(
            validate_evidence(input.items, input.site, self.config.evidence_radius_m).errors,
        );
        self.verdict(ticket, reasons)
    }

    fn verdict(&self, ticket: &Ticket, reasons: Vec<Deficiency>) -> NeutralizeVerdict {
        debug!(
            ticket_id = %ticket.id,
            reason_count = reasons.len(),
            "neutralization guard evaluated"
        );
        NeutralizeVerdict::from_reasons(reasons)
    }
}

impl Default for NeutralizationGuard {
    fn default() -> Self {
        Self::new(GuardConfig::mvp_v1())
    }
}

pub fn can_neutralize(input: &NeutralizeInput<'_>) -> NeutralizeVerdict {
    NeutralizationGuard::default().can_neutralize(input)
}
