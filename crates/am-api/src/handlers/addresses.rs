use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use am_common::review::ReviewDecision;
use am_common::Coordinates;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct ScoreAddressRequest {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct ScoreAddressResponse {
    pub address: String,
    pub matched_address: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub score: f64,
    /// カバレッジペナルティ適用後のコンポーネントスコア
    pub component_score: f64,
    /// 全文ファジーフォールバック値
    pub fuzzy: f64,
    /// 双方に存在したフィールドの重み和
    pub covered_weight: f64,
    pub decision: ReviewDecision,
    pub manual_review_required: bool,
    /// 比較できたフィールドごとの類似度（レビューUIが根拠表示に使う）
    pub breakdown: BTreeMap<String, f64>,
}

/// 住所をジオコーディングし、最有力候補との一致信頼度とレビュー判定を返す。
/// 候補ゼロは「一致なし」としてスコア 0.0 のレビュー行き（エラーにはしない）。
pub async fn score_address(
    State(state): State<SharedState>,
    _user: AuthUser,
    Json(request): Json<ScoreAddressRequest>,
) -> Result<Json<ScoreAddressResponse>, ApiError> {
    let address = request.address.trim().to_string();
    if address.is_empty() {
        return Err(ApiError::BadRequest("address must not be empty".into()));
    }

    let Some(candidate) = state.geocoder.best_match(&address).await? else {
        info!(address = %address, "no geocoder candidate");
        return Ok(Json(ScoreAddressResponse {
            address,
            matched_address: None,
            coordinates: None,
            score: 0.0,
            component_score: 0.0,
            fuzzy: 0.0,
            covered_weight: 0.0,
            decision: ReviewDecision::ManualReview,
            manual_review_required: true,
            breakdown: BTreeMap::new(),
        }));
    };

    let result = state
        .engine
        .score(&address, &candidate.full_address, candidate.coordinates);
    let decision = state.review.decide(result.score);

    info!(
        score = result.score,
        covered_weight = result.covered_weight,
        decision = decision.as_str(),
        "address scored"
    );

    let breakdown = result
        .breakdown
        .iter()
        .map(|(kind, similarity)| (kind.as_str().to_string(), *similarity))
        .collect();

    Ok(Json(ScoreAddressResponse {
        address,
        matched_address: Some(candidate.full_address),
        coordinates: candidate.coordinates,
        score: result.score,
        component_score: result.component_score,
        fuzzy: result.fuzzy,
        covered_weight: result.covered_weight,
        decision,
        manual_review_required: decision == ReviewDecision::ManualReview,
        breakdown,
    }))
}
