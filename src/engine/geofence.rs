//! Great-circle distance checks between a reported position and a workplace.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::CoreError;

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Allowed distance from the workplace when checking in.
pub const CHECK_IN_RADIUS_METERS: f64 = 200.0;

/// Allowed distance when checking out. Wider than the check-in radius.
pub const CHECK_OUT_RADIUS_METERS: f64 = 500.0;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    #[schema(example = json!(-6.2))]
    pub latitude: f64,
    #[schema(example = 106.816666)]
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Rejects non-finite or out-of-range values before any distance is computed.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoreError::validation(format!(
                "latitude must be between -90 and 90, got {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoreError::validation(format!(
                "longitude must be between -180 and 180, got {}",
                self.longitude
            )));
        }
        Ok(())
    }

    /// Builds coordinates from an optional pair; both halves must be present.
    pub fn from_pair(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Self>, CoreError> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => {
                let coords = Self::new(lat, lon);
                coords.validate()?;
                Ok(Some(coords))
            }
            (None, None) => Ok(None),
            _ => Err(CoreError::validation(
                "latitude and longitude must be supplied together",
            )),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeofenceCheck {
    pub accepted: bool,
    pub distance_meters: f64,
}

/// Haversine distance in meters.
pub fn distance_meters(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

pub fn validate(reported: Coordinates, workplace: Coordinates, radius_meters: f64) -> GeofenceCheck {
    let distance = distance_meters(reported, workplace);
    GeofenceCheck {
        accepted: distance <= radius_meters,
        distance_meters: distance,
    }
}
