#![forbid(unsafe_code)]

use fieldops_kernel_contracts::permit::HsePermit;
use fieldops_kernel_contracts::ticket::Ticket;

/// A ticket needs a safety permit iff it declares an intervention type.
pub fn requires_hse(ticket: &Ticket) -> bool {
    ticket.intervention_type.is_some()
}

/// Permits belonging to other tickets are ignored.
pub fn has_approved_permit(ticket: &Ticket, permits: &[HsePermit]) -> bool {
    permits.iter().any(|p| p.is_approved_for(&ticket.id))
}
