//! レビューゲート判定。
//!
//! スコアだけで自動確定するか、人手レビューのキューに回すかを決める。
//! 閾値は運用中にキャリブレーションするため環境変数で上書きできる。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
pub struct ReviewConfig {
    /// この値以上なら自動確定の候補
    pub auto_accept_threshold: f64,
    /// 境界付近の誤確定を避けるための安全マージン
    pub manual_review_margin: f64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            auto_accept_threshold: 0.8,
            manual_review_margin: 0.05,
        }
    }
}

impl ReviewConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            auto_accept_threshold: env_f64(
                "AM_AUTO_ACCEPT_THRESHOLD",
                defaults.auto_accept_threshold,
            ),
            manual_review_margin: env_f64(
                "AM_MANUAL_REVIEW_MARGIN",
                defaults.manual_review_margin,
            ),
        }
    }

    /// 自動確定はマージン込みで閾値を超えた場合のみ。
    /// 閾値ちょうど（マージンなし）はレビュー行き。
    /// 実効カットオフ (0.8 + 0.05 等) は浮動小数点加算で僅かに膨らむため、
    /// 比較には微小な許容誤差を入れる。
    pub fn decide(&self, score: f64) -> ReviewDecision {
        const CUTOFF_TOLERANCE: f64 = 1e-9;
        let cutoff = self.auto_accept_threshold + self.manual_review_margin;
        if score >= cutoff - CUTOFF_TOLERANCE {
            ReviewDecision::AutoAccept
        } else {
            ReviewDecision::ManualReview
        }
    }
}

fn env_f64(name: &str, default: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    AutoAccept,
    ManualReview,
}

impl ReviewDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewDecision::AutoAccept => "auto_accept",
            ReviewDecision::ManualReview => "manual_review",
        }
    }
}
