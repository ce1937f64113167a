#![forbid(unsafe_code)]

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use fieldops_kernel_contracts::ticket::{Ticket, TicketPriority};
use serde::Serialize;
use tracing::debug;

/// Zones served by the metro crews, where P0 tickets get the short deadline.
pub const METRO_ZONES: &[&str] = &["CENTRO", "NORTE", "SUR"];

/// Wall-clock offset all deadlines are expressed in (UTC-05:00, no DST).
pub const REFERENCE_UTC_OFFSET_WEST_SECS: i32 = 5 * 3600;

/// Source of "now" for remaining-time computations.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaConfig {
    pub metro_zones: &'static [&'static str],
    pub p0_metro_hours: u32,
    pub p0_hours: u32,
    pub p1_hours: u32,
    pub p2_hours: u32,
    pub p3_hours: u32,
    pub unknown_priority_hours: u32,
    pub reference_offset: FixedOffset,
}

impl SlaConfig {
    pub fn mvp_v1() -> Self {
        Self {
            metro_zones: METRO_ZONES,
            p0_metro_hours: 2,
            p0_hours: 4,
            p1_hours: 8,
            p2_hours: 24,
            p3_hours: 72,
            unknown_priority_hours: 24,
            reference_offset: FixedOffset::west_opt(REFERENCE_UTC_OFFSET_WEST_SECS)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlaRemaining {
    /// Clamped at zero for display.
    pub remaining_minutes: i64,
    pub is_overdue: bool,
}

#[derive(Debug, Clone)]
pub struct SlaCalculator {
    config: SlaConfig,
}

impl SlaCalculator {
    pub fn new(config: SlaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SlaConfig {
        &self.config
    }

    pub fn hours_by_priority(&self, priority: TicketPriority, zone: Option<&str>) -> u32 {
        match priority {
            TicketPriority::P0 if self.is_metro(zone) => self.config.p0_metro_hours,
            TicketPriority::P0 => self.config.p0_hours,
            TicketPriority::P1 => self.config.p1_hours,
            TicketPriority::P2 => self.config.p2_hours,
            TicketPriority::P3 => self.config.p3_hours,
        }
    }

    /// Same table keyed by the stored label; unknown labels fall back to the safe default.
    pub fn hours_by_priority_label(&self, label: &str, zone: Option<&str>) -> u32 {
        match TicketPriority::parse(label) {
            Some(priority) => self.hours_by_priority(priority, zone),
            None => self.config.unknown_priority_hours,
        }
    }

    pub fn deadline(
        &self,
        opened_at: DateTime<Utc>,
        priority: TicketPriority,
        zone: Option<&str>,
    ) -> DateTime<FixedOffset> {
        let hours = self.hours_by_priority(priority, zone);
        opened_at.with_timezone(&self.config.reference_offset) + Duration::hours(i64::from(hours))
    }

    pub fn remaining(&self, ticket: &Ticket, clock: &dyn Clock) -> SlaRemaining {
        let Some(deadline) = ticket.sla_deadline else {
            return SlaRemaining {
                remaining_minutes: 0,
                is_overdue: false,
            };
        };
        if ticket.is_sla_excluded() {
            return SlaRemaining {
                remaining_minutes: 0,
                is_overdue: false,
            };
        }
        let signed = floor_minutes(deadline - clock.now());
        debug!(ticket_id = %ticket.id, signed_minutes = signed, "sla remaining computed");
        SlaRemaining {
            remaining_minutes: signed.max(0),
            is_overdue: signed < 0,
        }
    }

    fn is_metro(&self, zone: Option<&str>) -> bool {
        zone.map(str::trim).is_some_and(|z| {
            self.config
                .metro_zones
                .iter()
                .any(|metro| metro.eq_ignore_ascii_case(z))
        })
    }
}

impl Default for SlaCalculator {
    fn default() -> Self {
        Self::new(SlaConfig::mvp_v1())
    }
}

pub fn sla_hours_by_priority(priority: TicketPriority, zone: Option<&str>) -> u32 {
    SlaCalculator::default().hours_by_priority(priority, zone)
}

pub fn sla_hours_by_priority_label(label: &str, zone: Option<&str>) -> u32 {
    SlaCalculator::default().hours_by_priority_label(label, zone)
}

pub fn calculate_sla_deadline(
    opened_at: DateTime<Utc>,
    priority: TicketPriority,
    zone: Option<&str>,
) -> DateTime<FixedOffset> {
    SlaCalculator::default().deadline(opened_at, priority, zone)
}

pub fn calculate_sla_remaining(ticket: &Ticket, clock: &dyn Clock) -> SlaRemaining {
    SlaCalculator::default().remaining(ticket, clock)
}

/// Elapsed whole minutes, floored.
pub fn calculate_sla_minutes(opened_at: DateTime<Utc>, neutralized_at: DateTime<Utc>) -> i64 {
    floor_minutes(neutralized_at - opened_at)
}

pub fn format_sla_time(minutes: i64) -> String {
    if minutes < 60 {
        return format!("{minutes}m");
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}

fn floor_minutes(delta: Duration) -> i64 {
    delta.num_milliseconds().div_euclid(60_000)
}
