//! 住所一致スコアリングのコア。
//!
//! フィールド別比較 (compare)、重みテーブル (weights)、
//! パイプライン本体 (scoring) の 3 層からなる。

pub mod compare;
pub mod scoring;
pub mod weights;

pub use scoring::{ConfigError, MatchScore, ScoreEngine, ScoringConfig};
pub use weights::ComponentWeights;
