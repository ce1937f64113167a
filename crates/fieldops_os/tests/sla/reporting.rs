#![forbid(unsafe_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use fieldops_engines::sla::{
    calculate_sla_deadline, calculate_sla_remaining, format_sla_time, sla_hours_by_priority,
    sla_hours_by_priority_label, FixedClock, SlaCalculator, SlaConfig,
};
use fieldops_kernel_contracts::site::{GeoPoint, Site, SiteId};
use fieldops_kernel_contracts::ticket::{TicketId, TicketPriority};
use fieldops_os::lifecycle::TicketLifecycle;
use fieldops_os::sla_report::remaining_label;

fn opened() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 29, 23, 15, 0).unwrap()
}

fn metro_site() -> Site {
    Site::v1(
        SiteId::new("site_ctr").unwrap(),
        "BOG-001".to_string(),
        "Centro".to_string(),
        GeoPoint::new(4.5981, -74.0760).unwrap(),
        Some("centro".to_string()),
        None,
        None,
    )
    .unwrap()
}

#[test]
fn priority_table_lookups() {
    assert_eq!(sla_hours_by_priority(TicketPriority::P0, Some("CENTRO")), 2);
    assert_eq!(sla_hours_by_priority(TicketPriority::P0, Some("ORIENTE")), 4);
    assert_eq!(sla_hours_by_priority(TicketPriority::P3, None), 72);
    assert_eq!(sla_hours_by_priority_label("P7", None), 24);
}

#[test]
fn p1_deadline_spans_month_boundary() {
    let deadline = calculate_sla_deadline(opened(), TicketPriority::P1, None);
    assert_eq!(
        deadline.with_timezone(&Utc),
        Utc.with_ymd_and_hms(2024, 3, 1, 7, 15, 0).unwrap()
    );
    assert_eq!(deadline.with_timezone(&Utc) - opened(), Duration::hours(8));
}

#[test]
fn ticket_ten_minutes_past_deadline_is_overdue() {
    let lc = TicketLifecycle::mvp_v1().unwrap();
    let ticket = lc
        .open_ticket(
            TicketId::new("tk_late").unwrap(),
            "INC-404".to_string(),
            TicketPriority::P0,
            &metro_site(),
            None,
            opened(),
            None,
            true,
        )
        .unwrap();
    let deadline = ticket.sla_deadline.unwrap();
    assert_eq!(deadline, opened() + Duration::hours(2));

    let clock = FixedClock(deadline + Duration::minutes(10));
    let remaining = calculate_sla_remaining(&ticket, &clock);
    assert_eq!(remaining.remaining_minutes, 0);
    assert!(remaining.is_overdue);
    assert_eq!(
        remaining_label(&ticket, &SlaCalculator::default(), &clock),
        "overdue"
    );

    let clock = FixedClock(opened() + Duration::minutes(25));
    let remaining = calculate_sla_remaining(&ticket, &clock);
    assert_eq!(remaining.remaining_minutes, 95);
    assert_eq!(format_sla_time(remaining.remaining_minutes), "1h 35m");
}

#[test]
fn reference_offset_is_injectable() {
    let utc_config = SlaConfig {
        reference_offset: chrono::FixedOffset::east_opt(0).unwrap(),
        ..SlaConfig::mvp_v1()
    };
    let calc = SlaCalculator::new(utc_config);
    let deadline = calc.deadline(opened(), TicketPriority::P2, None);
    assert_eq!(deadline.to_rfc3339(), "2024-03-01T23:15:00+00:00");

    let local = calculate_sla_deadline(opened(), TicketPriority::P2, None);
    assert_eq!(local.to_rfc3339(), "2024-03-01T18:15:00-05:00");
    assert_eq!(local, deadline);
}
