#![forbid(unsafe_code)]

use fieldops_engines::sla::{calculate_sla_minutes, format_sla_time, Clock, SlaCalculator};
use fieldops_kernel_contracts::ticket::Ticket;
use serde::Serialize;

/// Post-hoc SLA outcome of one ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SlaCompliance {
    /// An exclusion cause removed the SLA obligation.
    Excluded,
    /// Not neutralized yet.
    Pending,
    /// Neutralized but no deadline was ever stamped.
    Untracked { elapsed_minutes: i64 },
    Met { elapsed_minutes: i64 },
    Breached {
        elapsed_minutes: i64,
        overrun_minutes: i64,
    },
}

pub fn sla_compliance(ticket: &Ticket) -> SlaCompliance {
    if ticket.is_sla_excluded() {
        return SlaCompliance::Excluded;
    }
    let Some(neutralized_at) = ticket.neutralized_at else {
        return SlaCompliance::Pending;
    };
    let elapsed_minutes = calculate_sla_minutes(ticket.opened_at, neutralized_at);
    match ticket.sla_deadline {
        None => SlaCompliance::Untracked { elapsed_minutes },
        Some(deadline) if neutralized_at <= deadline => SlaCompliance::Met { elapsed_minutes },
        Some(deadline) => SlaCompliance::Breached {
            elapsed_minutes,
            overrun_minutes: calculate_sla_minutes(deadline, neutralized_at),
        },
    }
}

/// One-line remaining-time label for an open ticket, e.g. `"2h 15m remaining"`.
pub fn remaining_label(ticket: &Ticket, calculator: &SlaCalculator, clock: &dyn Clock) -> String {
    if ticket.is_sla_excluded() {
        return "excluded".to_string();
    }
    if ticket.sla_deadline.is_none() {
        return "no deadline".to_string();
    }
    let remaining = calculator.remaining(ticket, clock);
    if remaining.is_overdue {
        return "overdue".to_string();
    }
    format!("{} remaining", format_sla_time(remaining.remaining_minutes))
}
