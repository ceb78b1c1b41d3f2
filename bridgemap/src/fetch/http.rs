//! HTTP fetch capability for the bridge inventory backend.
//!
//! Implements [`TileFetcher`] against the reference backend's batch
//! endpoint: `POST {base}/api/bridges/batch` with the tile list in the JSON
//! body and zoom/ranking/limit as query parameters.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{BoxFuture, FetchError, FetchMode, TileFetcher};
use crate::filter::FilterSettings;
use crate::store::Entity;
use crate::tile::TileKey;

/// Record field carrying the stable identifier.
const ID_FIELD: &str = "structure_number_008";

/// Record field carrying the latitude.
const LAT_FIELD: &str = "lat_016";

/// Record field carrying the longitude.
const LON_FIELD: &str = "long_017";

/// Request body for the batch endpoint.
#[derive(Debug, Serialize)]
struct BatchRequest {
    /// Tile coordinates as `[x, y]` pairs.
    tiles: Vec<[u32; 2]>,
    zoom: u8,
    mode: &'static str,
}

/// `TileFetcher` backed by the bridge inventory HTTP API.
pub struct HttpTileFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTileFetcher {
    /// Create a fetcher for the given backend base URL, e.g.
    /// `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a fetcher with a custom request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn batch_url(&self, zoom: u8, filters: &FilterSettings) -> String {
        format!(
            "{}/api/bridges/batch?zoom={}&filterKey={}&limit={}",
            self.base_url,
            zoom,
            filters.ranking().as_str(),
            filters.limit()
        )
    }
}

/// Converts one backend record into an [`Entity`].
///
/// Records without an identifier or a finite position are unusable for the
/// store and yield `None`.
fn record_to_entity(record: Value) -> Option<Entity> {
    let mut fields = match record {
        Value::Object(map) => map,
        _ => return None,
    };

    let id = match fields.get(ID_FIELD).and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return None,
    };
    let lat = fields.get(LAT_FIELD).and_then(Value::as_f64)?;
    let lon = fields.get(LON_FIELD).and_then(Value::as_f64)?;
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }

    fields.remove(ID_FIELD);
    fields.remove(LAT_FIELD);
    fields.remove(LON_FIELD);

    Some(Entity {
        id,
        lat,
        lon,
        attributes: fields,
    })
}

impl TileFetcher for HttpTileFetcher {
    fn fetch_tiles<'a>(
        &'a self,
        zoom: u8,
        tiles: &'a [TileKey],
        filters: &'a FilterSettings,
        mode: FetchMode,
    ) -> BoxFuture<'a, Result<Vec<Entity>, FetchError>> {
        let url = self.batch_url(zoom, filters);
        let body = BatchRequest {
            tiles: tiles.iter().map(|t| [t.x, t.y]).collect(),
            zoom,
            mode: mode.as_str(),
        };

        Box::pin(async move {
            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url,
                });
            }

            let records: Vec<Value> = response
                .json()
                .await
                .map_err(|e| FetchError::Decode(e.to_string()))?;

            let total = records.len();
            let entities: Vec<Entity> =
                records.into_iter().filter_map(record_to_entity).collect();
            if entities.len() < total {
                debug!(
                    skipped = total - entities.len(),
                    "skipped records without identifier or position"
                );
            }

            Ok(entities)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_url_carries_query_parameters() {
        let fetcher = HttpTileFetcher::new("http://localhost:8000/").unwrap();
        let filters = FilterSettings::default().with_limit(250);

        let url = fetcher.batch_url(12, &filters);

        assert_eq!(
            url,
            "http://localhost:8000/api/bridges/batch?zoom=12&filterKey=lowestRating&limit=250"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = BatchRequest {
            tiles: vec![[10, 5], [11, 5]],
            zoom: 9,
            mode: FetchMode::Coarse.as_str(),
        };

        let encoded = serde_json::to_value(&body).unwrap();
        assert_eq!(
            encoded,
            json!({ "tiles": [[10, 5], [11, 5]], "zoom": 9, "mode": "coarse" })
        );
    }

    #[test]
    fn test_record_to_entity_splits_attributes() {
        let record = json!({
            "structure_number_008": "000000000012345",
            "lat_016": 40.7128,
            "long_017": -74.0060,
            "adt_029": 12000,
            "bridge_condition": "P"
        });

        let entity = record_to_entity(record).unwrap();

        assert_eq!(entity.id, "000000000012345");
        assert_eq!(entity.lat, 40.7128);
        assert_eq!(entity.lon, -74.0060);
        assert_eq!(entity.attributes.len(), 2);
        assert_eq!(entity.attributes["adt_029"], json!(12000));
        assert!(!entity.attributes.contains_key("lat_016"));
    }

    #[test]
    fn test_record_without_id_is_skipped() {
        let record = json!({ "lat_016": 40.0, "long_017": -74.0 });
        assert!(record_to_entity(record).is_none());
    }

    #[test]
    fn test_record_with_null_position_is_skipped() {
        let record = json!({
            "structure_number_008": "X",
            "lat_016": null,
            "long_017": -74.0
        });
        assert!(record_to_entity(record).is_none());
    }

    #[test]
    fn test_non_object_record_is_skipped() {
        assert!(record_to_entity(json!("not a record")).is_none());
        assert!(record_to_entity(json!(42)).is_none());
    }
}
