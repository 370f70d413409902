pub mod components;
pub mod extract;
pub mod logging;
pub mod matching;
pub mod normalize;
pub mod review;

use serde::{Deserialize, Serialize};

/// ジオコーダ候補に付随する座標。
/// スコアリング入力として受け取るが現状は未使用（距離ペナルティは将来拡張）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}
