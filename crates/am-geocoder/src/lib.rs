//! ジオコーダクライアント。
//!
//! フリーテキストの住所をフォワードジオコーディングし、候補住所
//! （正規化済みの full address と座標）を返す。スコアリング側は
//! [`Geocoder`] トレイト越しにだけ依存するので、テストではスタブに
//! 差し替えられる。

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use am_common::Coordinates;

const MAPBOX_FORWARD_URL: &str = "https://api.mapbox.com/search/geocode/v6/forward";
const CANDIDATE_LIMIT: u8 = 5;
const FEATURE_TYPES: &str = "address,place,locality,region,country,postcode";

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("MAPBOX_ACCESS_TOKEN must be set")]
    MissingToken,
    #[error("geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// ジオコーダが返す 1 候補
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeCandidate {
    pub full_address: String,
    pub coordinates: Option<Coordinates>,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// クエリに対する最有力候補を返す。候補ゼロは `Ok(None)`。
    async fn best_match(&self, query: &str) -> Result<Option<GeocodeCandidate>, GeocodeError>;
}

/// Mapbox Geocoding v6 のフォワードエンドポイントを叩くクライアント
pub struct MapboxClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl MapboxClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            base_url: MAPBOX_FORWARD_URL.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, GeocodeError> {
        Self::from_token(std::env::var("MAPBOX_ACCESS_TOKEN").ok())
    }

    fn from_token(token: Option<String>) -> Result<Self, GeocodeError> {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or(GeocodeError::MissingToken)?;
        Ok(Self::new(token))
    }

    /// テスト用にエンドポイントを差し替える
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Geocoder for MapboxClient {
    async fn best_match(&self, query: &str) -> Result<Option<GeocodeCandidate>, GeocodeError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("access_token", self.token.as_str()),
                ("limit", &CANDIDATE_LIMIT.to_string()),
                ("types", FEATURE_TYPES),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: ForwardResponse = response.json().await?;
        debug!(query, candidates = body.features.len(), "geocoder response");

        // TODO: rank candidates by relevance instead of taking the first usable feature
        Ok(body
            .features
            .into_iter()
            .find_map(GeocodeCandidate::from_feature))
    }
}

impl GeocodeCandidate {
    fn from_feature(feature: Feature) -> Option<Self> {
        let full_address = feature.properties.full_address?;
        if full_address.trim().is_empty() {
            return None;
        }
        let coordinates = feature.geometry.and_then(|g| match g.coordinates.as_slice() {
            [lon, lat, ..] => Some(Coordinates { lat: *lat, lon: *lon }),
            _ => None,
        });
        Some(Self {
            full_address,
            coordinates,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ForwardResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: FeatureProperties,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    full_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    // GeoJSON order: [lon, lat]
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_forward_response_and_picks_first_usable_feature() {
        let body = r#"{
            "features": [
                {"properties": {"full_address": null}, "geometry": null},
                {
                    "properties": {"full_address": "10 Downing Street, London SW1A 2AA, United Kingdom"},
                    "geometry": {"type": "Point", "coordinates": [-0.12766, 51.50335]}
                },
                {"properties": {"full_address": "Londonderry, United Kingdom"}, "geometry": null}
            ]
        }"#;

        let response: ForwardResponse = serde_json::from_str(body).expect("valid fixture");
        let candidate = response
            .features
            .into_iter()
            .find_map(GeocodeCandidate::from_feature)
            .expect("one usable feature");

        assert_eq!(
            candidate.full_address,
            "10 Downing Street, London SW1A 2AA, United Kingdom"
        );
        let coords = candidate.coordinates.expect("geometry present");
        assert!((coords.lat - 51.50335).abs() < 1e-9);
        assert!((coords.lon - (-0.12766)).abs() < 1e-9);
    }

    #[test]
    fn empty_feature_list_yields_no_candidate() {
        let response: ForwardResponse = serde_json::from_str(r#"{"features": []}"#).expect("valid");
        assert!(response
            .features
            .into_iter()
            .find_map(GeocodeCandidate::from_feature)
            .is_none());
    }

    #[test]
    fn construction_requires_a_nonempty_token() {
        assert!(matches!(
            MapboxClient::from_token(None),
            Err(GeocodeError::MissingToken)
        ));
        assert!(matches!(
            MapboxClient::from_token(Some("  ".into())),
            Err(GeocodeError::MissingToken)
        ));
        assert!(MapboxClient::from_token(Some("pk.test".into())).is_ok());
    }
}
