#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::common::{string_id, validate_id, validate_opt_text};
use crate::{ContractViolation, SchemaVersion, Validate};

pub const SITE_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

string_id!(SiteId, "site_id", 64);

/// Coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, ContractViolation> {
        let p = Self { lat, lng };
        p.validate()?;
        Ok(p)
    }
}

impl Validate for GeoPoint {
    fn validate(&self) -> Result<(), ContractViolation> {
        if !self.lat.is_finite() {
            return Err(ContractViolation::NotFinite {
                field: "geo_point.lat",
            });
        }
        if !self.lng.is_finite() {
            return Err(ContractViolation::NotFinite {
                field: "geo_point.lng",
            });
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(ContractViolation::InvalidRange {
                field: "geo_point.lat",
                min: -90.0,
                max: 90.0,
                got: self.lat,
            });
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(ContractViolation::InvalidRange {
                field: "geo_point.lng",
                min: -180.0,
                max: 180.0,
                got: self.lng,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub schema_version: SchemaVersion,
    pub id: SiteId,
    pub code: String,
    pub name: String,
    pub center: GeoPoint,
    pub zone: Option<String>,
    pub region: Option<String>,
    pub parent_site_id: Option<SiteId>,
}

impl Site {
    pub fn v1(
        id: SiteId,
        code: String,
        name: String,
        center: GeoPoint,
        zone: Option<String>,
        region: Option<String>,
        parent_site_id: Option<SiteId>,
    ) -> Result<Self, ContractViolation> {
        let site = Self {
            schema_version: SITE_CONTRACT_VERSION,
            id,
            code,
            name,
            center,
            zone,
            region,
            parent_site_id,
        };
        site.validate()?;
        Ok(site)
    }

    pub fn is_dependent(&self) -> bool {
        self.parent_site_id.is_some()
    }
}

impl Validate for Site {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != SITE_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "site.schema_version",
                reason: "must match SITE_CONTRACT_VERSION",
            });
        }
        self.id.validate()?;
        validate_id("site.code", &self.code, 32)?;
        validate_id("site.name", &self.name, 256)?;
        self.center.validate()?;
        validate_opt_text("site.zone", &self.zone, 64)?;
        validate_opt_text("site.region", &self.region, 64)?;
        if let Some(parent) = &self.parent_site_id {
            parent.validate()?;
            if parent == &self.id {
                return Err(ContractViolation::InvalidValue {
                    field: "site.parent_site_id",
                    reason: "must not reference the site itself",
                });
            }
        }
        Ok(())
    }
}
