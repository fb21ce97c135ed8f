use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }

    /// Planar distance in degrees. Only meaningful for the small offsets
    /// used when spreading co-located markers.
    pub fn degree_distance(self, other: LatLng) -> f64 {
        let dlat = other.lat - self.lat;
        let dlng = other.lng - self.lng;
        (dlat * dlat + dlng * dlng).sqrt()
    }
}

/// Public fields of the account that owns a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub program: String,
    pub graduation_year: Option<String>,
    pub current_term: Option<String>,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub owner: Owner,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Profile {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// A profile together with the coordinate it is drawn at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedMarker {
    pub profile: Profile,
    pub offset_latitude: f64,
    pub offset_longitude: f64,
}

impl PlacedMarker {
    pub fn display_position(&self) -> LatLng {
        LatLng::new(self.offset_latitude, self.offset_longitude)
    }

    pub fn is_offset(&self) -> bool {
        self.offset_latitude != self.profile.latitude
            || self.offset_longitude != self.profile.longitude
    }
}

/// Body of a profile submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub graduation_year: Option<String>,
    #[serde(default)]
    pub current_term: Option<String>,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A submission that passed [`ProfileInput::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidProfileInput {
    pub name: String,
    pub program: String,
    pub graduation_year: Option<String>,
    pub current_term: Option<String>,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("latitude must be between -90 and 90, got {0}")]
    LatitudeOutOfRange(f64),
    #[error("longitude must be between -180 and 180, got {0}")]
    LongitudeOutOfRange(f64),
    #[error("location not found, try a more specific address")]
    LocationNotFound,
}

fn required(value: &str, field: &'static str) -> Result<String, InputError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(InputError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Blank optional fields are stored as absent.
fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ProfileInput {
    pub fn validate(&self) -> Result<ValidProfileInput, InputError> {
        let name = required(&self.name, "name")?;
        let program = required(&self.program, "program")?;
        let location = required(&self.location, "location")?;

        if !self.latitude.is_finite() || !(MIN_LATITUDE..=MAX_LATITUDE).contains(&self.latitude) {
            return Err(InputError::LatitudeOutOfRange(self.latitude));
        }
        if !self.longitude.is_finite()
            || !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&self.longitude)
        {
            return Err(InputError::LongitudeOutOfRange(self.longitude));
        }

        Ok(ValidProfileInput {
            name,
            program,
            graduation_year: optional(self.graduation_year.as_deref()),
            current_term: optional(self.current_term.as_deref()),
            location,
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

/// One geocoder match for a free-text address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeCandidate {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}
