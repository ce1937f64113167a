#![forbid(unsafe_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use fieldops_engines::evidence::content_hash_hex;
use fieldops_engines::guard::{NeutralizationGuard, NeutralizeInput};
use fieldops_kernel_contracts::evidence::{
    BundleId, ChecklistData, EvidenceBundle, EvidenceItem, EvidenceItemId, EvidenceType,
    ExifMetadata, ValidatorId,
};
use fieldops_kernel_contracts::permit::{HsePermit, PermitId, PermitStatus, PermitType};
use fieldops_kernel_contracts::site::{GeoPoint, Site, SiteId};
use fieldops_kernel_contracts::ticket::{Ticket, TicketId, TicketPriority, TicketStatus};
use fieldops_kernel_contracts::verdict::Deficiency;
use fieldops_os::lifecycle::{TicketLifecycle, TransitionError};
use fieldops_os::sla_report::{sla_compliance, SlaCompliance};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 30, 21, 0, 0).unwrap()
}

fn site() -> Site {
    Site::v1(
        SiteId::new("site_med_031").unwrap(),
        "MED-031".to_string(),
        "Repetidora El Poblado".to_string(),
        GeoPoint::new(6.2088, -75.5676).unwrap(),
        Some("ORIENTE".to_string()),
        Some("ANTIOQUIA".to_string()),
        Some(SiteId::new("site_med_001").unwrap()),
    )
    .unwrap()
}

fn on_site_position() -> GeoPoint {
    GeoPoint::new(6.2090, -75.5674).unwrap()
}

fn evidence(id: &str, evidence_type: EvidenceType, minute: i64) -> EvidenceItem {
    let checklist = (evidence_type == EvidenceType::Checklist).then(|| ChecklistData {
        tipo_falla: "Antena desalineada".to_string(),
        accion_realizada: "Realineacion y ajuste".to_string(),
        repuestos_usados: Vec::new(),
        pruebas_post: "RSL -45 dBm".to_string(),
        observaciones: String::new(),
    });
    EvidenceItem::v1(
        EvidenceItemId::new(id).unwrap(),
        BundleId::new("bd_med").unwrap(),
        evidence_type,
        format!("evidence/{id}.bin"),
        Some(ExifMetadata {
            captured_at: Some(t0() + Duration::minutes(minute)),
            gps: Some(on_site_position()),
        }),
        Some(on_site_position()),
        checklist,
        content_hash_hex(id.as_bytes()),
    )
    .unwrap()
}

fn open(lc: &TicketLifecycle<NeutralizationGuard>) -> Ticket {
    lc.open_ticket(
        TicketId::new("tk_med").unwrap(),
        "INC-7788".to_string(),
        TicketPriority::P0,
        &site(),
        Some("ALTURA".to_string()),
        t0(),
        None,
        false,
    )
    .unwrap()
}

#[test]
fn full_lifecycle_reaches_closed() {
    let lc = TicketLifecycle::mvp_v1().unwrap();
    let site = site();

    let received = open(&lc);
    // ORIENTE is not a metro zone: 4 hours for P0.
    assert_eq!(received.sla_deadline, Some(t0() + Duration::hours(4)));

    let assigned = lc.assign(&received, t0() + Duration::minutes(5)).unwrap();
    let on_site = lc
        .record_arrival(&assigned, &site, on_site_position(), t0() + Duration::minutes(50))
        .unwrap();

    let bundle =
        EvidenceBundle::pending_v1(BundleId::new("bd_med").unwrap(), on_site.id.clone()).unwrap();
    let items = vec![
        evidence("ev_before", EvidenceType::PhotoBefore, 55),
        evidence("ev_after", EvidenceType::PhotoAfter, 110),
        evidence("ev_checklist", EvidenceType::Checklist, 115),
        evidence("ev_signature", EvidenceType::Signature, 116),
    ];
    let permits = vec![HsePermit::v1(
        PermitId::new("hse_med").unwrap(),
        on_site.id.clone(),
        PermitType::WorkAtHeight,
        PermitStatus::Approved,
        t0() + Duration::minutes(40),
        Some(t0() + Duration::minutes(45)),
    )
    .unwrap()];

    let neutralized = lc
        .neutralize(
            &NeutralizeInput {
                ticket: &on_site,
                bundle: Some(&bundle),
                items: &items,
                permits: &permits,
                site: &site,
            },
            t0() + Duration::minutes(120),
        )
        .unwrap();
    assert_eq!(neutralized.status, TicketStatus::Neutralized);
    assert_eq!(
        sla_compliance(&neutralized),
        SlaCompliance::Met {
            elapsed_minutes: 120
        }
    );

    let validator = ValidatorId::new("supervisor_ana").unwrap();
    let valid_bundle = lc
        .mark_bundle_validated(&bundle, &items, &site, validator.clone(), t0() + Duration::hours(3))
        .unwrap();
    assert!(valid_bundle.is_valid);
    assert_eq!(valid_bundle.validated_by, Some(validator));
    assert!(!bundle.is_valid);

    let validated = lc
        .validate(&neutralized, &valid_bundle, t0() + Duration::hours(3))
        .unwrap();
    let closed = lc.close(&validated, t0() + Duration::hours(5)).unwrap();
    assert_eq!(closed.status, TicketStatus::Closed);
    assert_eq!(closed.assigned_at, Some(t0() + Duration::minutes(5)));
    assert_eq!(closed.arrived_at, Some(t0() + Duration::minutes(50)));
    assert_eq!(closed.neutralized_at, Some(t0() + Duration::minutes(120)));
    assert_eq!(closed.validated_at, Some(t0() + Duration::hours(3)));
    assert_eq!(closed.closed_at, Some(t0() + Duration::hours(5)));

    // A second neutralization attempt is refused by the guard itself.
    let again = lc.neutralize(
        &NeutralizeInput {
            ticket: &closed,
            bundle: Some(&valid_bundle),
            items: &items,
            permits: &permits,
            site: &site,
        },
        t0() + Duration::hours(6),
    );
    match again {
        Err(TransitionError::Blocked(reasons)) => assert_eq!(
            reasons,
            vec![Deficiency::TicketAlreadyTerminal {
                status: TicketStatus::Closed
            }]
        ),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn neutralization_without_permit_lists_every_blocker() {
    let lc = TicketLifecycle::mvp_v1().unwrap();
    let site = site();
    let assigned = lc.assign(&open(&lc), t0()).unwrap();
    let on_site = lc
        .record_arrival(&assigned, &site, on_site_position(), t0() + Duration::minutes(10))
        .unwrap();
    let bundle =
        EvidenceBundle::pending_v1(BundleId::new("bd_med").unwrap(), on_site.id.clone()).unwrap();
    let items = vec![evidence("ev_before", EvidenceType::PhotoBefore, 15)];

    let err = lc
        .neutralize(
            &NeutralizeInput {
                ticket: &on_site,
                bundle: Some(&bundle),
                items: &items,
                permits: &[],
                site: &site,
            },
            t0() + Duration::minutes(30),
        )
        .unwrap_err();
    let TransitionError::Blocked(reasons) = err else {
        panic!("expected blocked verdict");
    };
    let messages: Vec<String> = reasons.iter().map(ToString::to_string).collect();
    assert_eq!(
        messages,
        vec![
            "approved HSE permit required for intervention type ALTURA".to_string(),
            "missing AFTER photo".to_string(),
            "missing checklist".to_string(),
        ]
    );
}

#[test]
fn neutralization_on_items_of_another_bundle_is_refused() {
    let lc = TicketLifecycle::mvp_v1().unwrap();
    let site = site();
    let assigned = lc.assign(&open(&lc), t0()).unwrap();
    let on_site = lc
        .record_arrival(&assigned, &site, on_site_position(), t0() + Duration::minutes(10))
        .unwrap();
    let own_bundle =
        EvidenceBundle::pending_v1(BundleId::new("bd_other").unwrap(), on_site.id.clone())
            .unwrap();
    // Complete set, but every item was filed under bd_med.
    let items = vec![
        evidence("ev_before", EvidenceType::PhotoBefore, 15),
        evidence("ev_after", EvidenceType::PhotoAfter, 40),
        evidence("ev_checklist", EvidenceType::Checklist, 45),
    ];
    let permits = vec![HsePermit::v1(
        PermitId::new("hse_med").unwrap(),
        on_site.id.clone(),
        PermitType::WorkAtHeight,
        PermitStatus::Approved,
        t0(),
        Some(t0() + Duration::minutes(5)),
    )
    .unwrap()];

    let err = lc
        .neutralize(
            &NeutralizeInput {
                ticket: &on_site,
                bundle: Some(&own_bundle),
                items: &items,
                permits: &permits,
                site: &site,
            },
            t0() + Duration::minutes(60),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TransitionError::RecordMismatch {
            record: "evidence item"
        }
    ));

    let matching_bundle =
        EvidenceBundle::pending_v1(BundleId::new("bd_med").unwrap(), on_site.id.clone()).unwrap();
    let neutralized = lc
        .neutralize(
            &NeutralizeInput {
                ticket: &on_site,
                bundle: Some(&matching_bundle),
                items: &items,
                permits: &permits,
                site: &site,
            },
            t0() + Duration::minutes(60),
        )
        .unwrap();
    assert_eq!(neutralized.status, TicketStatus::Neutralized);
}

#[test]
fn bundle_validation_ignores_items_of_other_bundles() {
    let lc = TicketLifecycle::mvp_v1().unwrap();
    let site = site();
    let bundle = EvidenceBundle::pending_v1(
        BundleId::new("bd_other").unwrap(),
        TicketId::new("tk_med").unwrap(),
    )
    .unwrap();
    let items = vec![
        evidence("ev_before", EvidenceType::PhotoBefore, 1),
        evidence("ev_after", EvidenceType::PhotoAfter, 2),
        evidence("ev_checklist", EvidenceType::Checklist, 3),
    ];
    let err = lc
        .mark_bundle_validated(
            &bundle,
            &items,
            &site,
            ValidatorId::new("supervisor_ana").unwrap(),
            t0(),
        )
        .unwrap_err();
    match err {
        TransitionError::EvidenceInvalid(errors) => assert_eq!(errors.len(), 3),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn arrival_for_another_site_is_refused() {
    let lc = TicketLifecycle::mvp_v1().unwrap();
    let assigned = lc.assign(&open(&lc), t0()).unwrap();
    let mut other = site();
    other.id = SiteId::new("site_med_099").unwrap();
    other.parent_site_id = None;
    let err = lc
        .record_arrival(&assigned, &other, on_site_position(), t0())
        .unwrap_err();
    assert!(matches!(
        err,
        TransitionError::RecordMismatch { record: "site" }
    ));
}
