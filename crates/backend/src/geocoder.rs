use member_map_shared::models::GeocodeCandidate;
use serde::Deserialize;
use thiserror::Error;

/// Queries shorter than this never reach the upstream service.
pub const MIN_GEOCODE_CHARS: usize = 3;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder unreachable: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoder rate limit reached")]
    RateLimited,
    #[error("geocoder returned status {0}")]
    Status(u16),
    #[error("geocoder response malformed: {message}")]
    Parse { message: String },
}

#[derive(Debug, Deserialize)]
struct NominatimHit {
    display_name: String,
    lat: String,
    lon: String,
}

/// Client for a Nominatim-compatible `/search` endpoint.
#[derive(Clone)]
pub struct Geocoder {
    client: reqwest::Client,
    base_url: String,
    limit: u8,
}

impl Geocoder {
    pub fn new(base_url: &str, user_agent: &str, limit: u8) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Geocoder {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limit: limit.max(1),
        })
    }

    pub async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        let query = query.trim();
        if query.chars().count() < MIN_GEOCODE_CHARS {
            return Ok(Vec::new());
        }

        let url = format!("{}/search", self.base_url);
        let limit = self.limit.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[("format", "json"), ("q", query), ("limit", limit.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(query, "Geocoder rate limited");
            return Err(GeocodeError::RateLimited);
        }
        if !status.is_success() {
            tracing::warn!(query, status = status.as_u16(), "Geocoder non-OK response");
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let body = resp.text().await?;
        let candidates = parse_response(&body)?;
        tracing::debug!(query, count = candidates.len(), "Geocoded");
        Ok(candidates)
    }
}

/// Parse a Nominatim JSON array. Hits with unparseable coordinates are skipped.
pub fn parse_response(body: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
    let hits: Vec<NominatimHit> = serde_json::from_str(body).map_err(|e| GeocodeError::Parse {
        message: e.to_string(),
    })?;

    Ok(hits
        .into_iter()
        .filter_map(|hit| {
            let latitude = hit.lat.trim().parse::<f64>().ok()?;
            let longitude = hit.lon.trim().parse::<f64>().ok()?;
            Some(GeocodeCandidate {
                label: hit.display_name,
                latitude,
                longitude,
            })
        })
        .collect())
}
