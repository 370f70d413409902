use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::warn;

use super::compare::{compare_component, fuzzy_ratio, token_sort_ratio};
use super::weights::ComponentWeights;
use crate::components::{clean_house_number, is_suspicious_road, ComponentKind, ComponentSet};
use crate::extract::ComponentExtractor;
use crate::normalize::{info_level, normalize};
use crate::Coordinates;

// 情報量の乏しい入力（単一トークン等）ではファジーの影響をこの係数まで絞る
const LOW_INFO_BLEND_FACTOR: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub weights: ComponentWeights,
    /// ファジーフォールバックのブレンド係数 λ（< 1.0）。
    /// 構造カバレッジが低いときの救済上限を決める。
    pub fuzzy_blend: f64,
    /// このカバレッジ未満のときだけファジー救済が働く
    pub fuzzy_coverage_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ComponentWeights::default(),
            fuzzy_blend: 0.6,
            fuzzy_coverage_threshold: 0.25,
        }
    }
}

impl ScoringConfig {
    /// 環境変数から設定を読み込み（デプロイ先ごとのキャリブレーション用）
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            weights: ComponentWeights::from_env(),
            fuzzy_blend: env_f64("AM_FUZZY_BLEND", defaults.fuzzy_blend),
            fuzzy_coverage_threshold: env_f64(
                "AM_FUZZY_COVERAGE_THRESHOLD",
                defaults.fuzzy_coverage_threshold,
            ),
        }
    }
}

fn env_f64(name: &str, default: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("component weights must sum to 1.0 (got {0:.4})")]
    WeightSum(f64),
    #[error("fuzzy blend factor must be in (0.0, 1.0) (got {0})")]
    FuzzyBlend(f64),
    #[error("fuzzy coverage threshold must be in [0.0, 1.0] (got {0})")]
    CoverageThreshold(f64),
}

/// スコアリング結果（最終スコア + レビューUI向け内訳）
#[derive(Debug, Clone, Default)]
pub struct MatchScore {
    /// 最終スコア [0.0, 1.0]
    pub score: f64,
    /// 比較可能フィールドに限定した重み付き平均
    pub weighted_score: f64,
    /// カバレッジペナルティ適用後のコンポーネントスコア
    pub component_score: f64,
    /// 双方に存在したフィールドの重み和
    pub covered_weight: f64,
    /// どちらかに存在したフィールドの重み和
    pub union_weight: f64,
    /// 全文ファジーフォールバック値
    pub fuzzy: f64,
    /// 比較できたフィールドごとの類似度
    pub breakdown: Vec<(ComponentKind, f64)>,
}

/// 住所ペアの一致信頼度 [0.0, 1.0] を計算するエンジン。
///
/// 重みテーブルは構築時に注入・検証され、以後 read-only。
/// 呼び出しごとの状態は持たないため複数スレッドから同時に呼べる。
pub struct ScoreEngine<E> {
    config: ScoringConfig,
    extractor: E,
}

impl<E: ComponentExtractor> ScoreEngine<E> {
    pub fn new(config: ScoringConfig, extractor: E) -> Result<Self, ConfigError> {
        let sum = config.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::WeightSum(sum));
        }
        if config.fuzzy_blend <= 0.0 || config.fuzzy_blend >= 1.0 {
            return Err(ConfigError::FuzzyBlend(config.fuzzy_blend));
        }
        if !(0.0..=1.0).contains(&config.fuzzy_coverage_threshold) {
            return Err(ConfigError::CoverageThreshold(
                config.fuzzy_coverage_threshold,
            ));
        }

        Ok(Self { config, extractor })
    }

    /// 生の入力住所とジオコーダ候補を比較する。
    ///
    /// 空入力は「証拠なし」としてスコア 0.0（エラーにはしない）。
    /// 座標は受け取るだけで未使用（距離ペナルティは将来拡張）。
    pub fn score(
        &self,
        raw_user: &str,
        raw_candidate: &str,
        _candidate_coordinates: Option<Coordinates>,
    ) -> MatchScore {
        if raw_user.trim().is_empty() || raw_candidate.trim().is_empty() {
            return MatchScore::default();
        }

        let norm_a = normalize(raw_user);
        let norm_b = normalize(raw_candidate);

        let set_a = self.extract_or_empty(&norm_a);
        let set_b = self.extract_or_empty(&norm_b);

        let (breakdown, weighted, covered, union) =
            weighted_score(&set_a, &set_b, &self.config.weights);
        let component_score = apply_coverage(weighted, covered, union);
        let fuzzy = fuzzy_fallback(&norm_a, &norm_b);

        let blend = if info_level(&norm_a).min(info_level(&norm_b)) <= 1 {
            self.config.fuzzy_blend * LOW_INFO_BLEND_FACTOR
        } else {
            self.config.fuzzy_blend
        };
        let score = final_score(
            component_score,
            covered,
            fuzzy,
            blend,
            self.config.fuzzy_coverage_threshold,
        );

        MatchScore {
            score,
            weighted_score: weighted,
            component_score,
            covered_weight: covered,
            union_weight: union,
            fuzzy,
            breakdown,
        }
    }

    fn extract_or_empty(&self, normalized: &str) -> ComponentSet {
        match self.extractor.extract(normalized) {
            Ok(set) => set,
            Err(err) => {
                warn!(error = %err, "extractor failed; degrading to whole-string fuzzy");
                ComponentSet::default()
            }
        }
    }
}

/// 双方に存在するフィールドのみで重み付き平均を取る。
///
/// 戻り値: (フィールド別類似度, 重み付き平均, 共通重み, 出現重み和)。
/// 共通重みが 0 のときの平均 0.0 は「証拠不足」の下限値であって
/// ゼロ除算ガードではない。欠損フィールドは分母からも外れるため、
/// 欠損そのもののペナルティは apply_coverage が担う。
pub fn weighted_score(
    a: &ComponentSet,
    b: &ComponentSet,
    weights: &ComponentWeights,
) -> (Vec<(ComponentKind, f64)>, f64, f64, f64) {
    let mut breakdown = Vec::new();
    let mut numerator = 0.0;
    let mut covered = 0.0;
    let mut union = 0.0;

    for kind in ComponentKind::iter() {
        let weight = weights.get(kind);
        let value_a = a.get(kind);
        let value_b = b.get(kind);

        if value_a.is_some() || value_b.is_some() {
            union += weight;
        }
        let (Some(value_a), Some(value_b)) = (value_a, value_b) else {
            continue;
        };

        // パースノイズの road は偽の一致を作らないよう比較から外す
        if kind == ComponentKind::Road
            && (is_suspicious_road(value_a) || is_suspicious_road(value_b))
        {
            continue;
        }

        let (value_a, value_b) = if kind == ComponentKind::HouseNumber {
            (clean_house_number(value_a), clean_house_number(value_b))
        } else {
            (value_a.to_string(), value_b.to_string())
        };

        let similarity = compare_component(kind, &value_a, &value_b).clamp(0.0, 1.0);
        breakdown.push((kind, similarity));
        numerator += similarity * weight;
        covered += weight;
    }

    let weighted = if covered > 0.0 { numerator / covered } else { 0.0 };
    (breakdown, weighted, covered, union)
}

/// カバレッジペナルティ: 出現フィールド全体のうち、実際に比較できた
/// 重み比率でスコアを割り引く。country しか持たない入力が詳細な候補と
/// 比較されたとき、country の完全一致だけで 1.0 にならないのはこの段に
/// よるもの（双方 country のみなら union も country のみで、1.0 は正当）。
/// weighted_score とは別の段として保つ。
pub fn apply_coverage(weighted: f64, covered: f64, union: f64) -> f64 {
    if union <= 0.0 {
        return 0.0;
    }
    (weighted * (covered / union)).clamp(0.0, 1.0)
}

/// 構造を無視した全文フォールバック類似度。
/// 抽出が崩れたケース（番地が road に吸収される等）の信号回収用。
pub fn fuzzy_fallback(normalized_a: &str, normalized_b: &str) -> f64 {
    fuzzy_ratio(normalized_a, normalized_b).max(token_sort_ratio(normalized_a, normalized_b))
}

/// 最終ブレンド。
/// - 共通重み 0: 構造的証拠が皆無なのでファジー値をそのまま使う
/// - 閾値未満: ファジーは λ 倍までの救済としてのみ働く
/// - 閾値以上: コンポーネントスコアをそのまま採用（ファジー無視）
pub fn final_score(
    component_score: f64,
    covered: f64,
    fuzzy: f64,
    blend: f64,
    coverage_threshold: f64,
) -> f64 {
    let score = if covered <= 0.0 {
        fuzzy
    } else if covered < coverage_threshold {
        component_score.max(blend * fuzzy)
    } else {
        component_score
    };
    score.clamp(0.0, 1.0)
}
