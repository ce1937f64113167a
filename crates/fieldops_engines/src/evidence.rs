#![forbid(unsafe_code)]

use fieldops_kernel_contracts::evidence::{EvidenceItem, EvidenceType};
use fieldops_kernel_contracts::site::Site;
use fieldops_kernel_contracts::verdict::{
    Deficiency, EvidenceValidation, PhotoKind, RequiredEvidence,
};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::checklist::validate_checklist;
use crate::geo::distance_meters;

/// Evidence may be captured farther from the site than the arrival check allows.
pub const DEFAULT_EVIDENCE_GEOFENCE_RADIUS_M: f64 = 300.0;

/// Validates the before/after photos and checklist of one bundle.
///
/// Only the first submitted item of each required type is evaluated; later
/// duplicates are ignored.
pub fn validate_evidence(items: &[EvidenceItem], site: &Site, radius_m: f64) -> EvidenceValidation {
    let before = first_of(items, EvidenceType::PhotoBefore);
    let after = first_of(items, EvidenceType::PhotoAfter);
    let checklist = first_of(items, EvidenceType::Checklist);

    let mut errors = Vec::new();

    for (kind, photo) in [(PhotoKind::Before, before), (PhotoKind::After, after)] {
        let Some(photo) = photo else {
            errors.push(Deficiency::EvidenceItemMissing {
                item: RequiredEvidence::Photo(kind),
            });
            continue;
        };
        if let Some(geo) = photo.geo {
            let distance_m = distance_meters(geo, site.center);
            if distance_m > radius_m {
                errors.push(Deficiency::OutsideGeofence {
                    photo: kind,
                    distance_m,
                    radius_m,
                });
            }
        }
    }

    if let (Some(before_at), Some(after_at)) = (
        before.and_then(EvidenceItem::captured_at),
        after.and_then(EvidenceItem::captured_at),
    ) {
        if after_at <= before_at {
            errors.push(Deficiency::PhotoOrderViolation);
        }
    }

    match checklist {
        None => errors.push(Deficiency::EvidenceItemMissing {
            item: RequiredEvidence::Checklist,
        }),
        Some(item) => errors.extend(
            validate_checklist(item.checklist.as_ref())
                .errors
                .into_iter()
                .map(Deficiency::ChecklistIncomplete),
        ),
    }

    debug!(
        site_id = %site.id,
        item_count = items.len(),
        error_count = errors.len(),
        "evidence validated"
    );
    EvidenceValidation::from_errors(errors)
}

fn first_of(items: &[EvidenceItem], evidence_type: EvidenceType) -> Option<&EvidenceItem> {
    let mut matching = items.iter().filter(|i| i.evidence_type == evidence_type);
    let first = matching.next();
    let ignored = matching.count();
    if ignored > 0 {
        debug!(
            ?evidence_type,
            ignored, "duplicate evidence items ignored; first submission is authoritative"
        );
    }
    first
}

/// Lowercase hex SHA-256 of the evidence content.
pub fn content_hash_hex(content: &[u8]) -> String {
    Sha256::digest(content)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// True iff `content` hashes to the digest recorded on the item.
pub fn verify_content_hash(item: &EvidenceItem, content: &[u8]) -> bool {
    item.content_hash == content_hash_hex(content)
}
