use std::collections::HashMap;
use std::sync::LazyLock;

use strsim::normalized_damerau_levenshtein;

use crate::components::ComponentKind;

/// 道路種別の略記 → 正規形。token 単位で展開してから比較する。
static ROAD_ABBREVIATIONS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("st", "street"),
        ("str", "street"),
        ("rd", "road"),
        ("ave", "avenue"),
        ("av", "avenue"),
        ("blvd", "boulevard"),
        ("ln", "lane"),
        ("dr", "drive"),
        ("ct", "court"),
        ("pl", "place"),
        ("sq", "square"),
        ("ter", "terrace"),
        ("hwy", "highway"),
        ("pkwy", "parkway"),
        ("ul", "ulica"),
        ("al", "aleja"),
        ("n", "north"),
        ("s", "south"),
        ("e", "east"),
        ("w", "west"),
    ]
    .into_iter()
    .collect()
});

// 数値系フィールドの不一致時の上限（前方一致を除く）
const NUMERIC_MISMATCH_CAP: f64 = 0.3;

pub fn expand_road_abbreviations(road: &str) -> String {
    road.split_whitespace()
        .map(|token| ROAD_ABBREVIATIONS.get(token).copied().unwrap_or(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 編集距離ベースの類似度 [0,1]。空文字側があれば 0.0。
pub fn fuzzy_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    normalized_damerau_levenshtein(a, b).clamp(0.0, 1.0)
}

/// トークンを整列・重複排除してから取る類似度（語順の揺れを吸収）
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    fuzzy_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort_unstable();
    tokens.dedup();
    tokens.join(" ")
}

/// 双方に値があるフィールドの類似度を計算する。
///
/// - 数値系 (house_number / postcode): 区切りを除いた圧縮形で比較。
///   完全一致 1.0、一方が他方の前方一致なら「一致した先頭文字数 ÷ 第1引数の長さ」
///   （意図的に非対称。部分郵便番号は入力側の粒度で評価する）、
///   それ以外は編集距離比を 0.3 で頭打ち。
/// - road は略記展開後に比較、その他は素の編集距離比。
pub fn compare_component(kind: ComponentKind, a: &str, b: &str) -> f64 {
    if kind.is_numeric() {
        return compare_numeric(a, b);
    }

    let (a, b) = if kind == ComponentKind::Road {
        (expand_road_abbreviations(a), expand_road_abbreviations(b))
    } else {
        (a.to_string(), b.to_string())
    };

    if a == b {
        return 1.0;
    }
    fuzzy_ratio(&a, &b)
}

fn compare_numeric(a: &str, b: &str) -> f64 {
    let ca = compact(a);
    let cb = compact(b);
    if ca.is_empty() || cb.is_empty() {
        return 0.0;
    }
    if ca == cb {
        return 1.0;
    }

    if ca.starts_with(&cb) || cb.starts_with(&ca) {
        let shared = ca.len().min(cb.len());
        return (shared as f64 / ca.len() as f64).clamp(0.0, 1.0);
    }

    fuzzy_ratio(&ca, &cb).min(NUMERIC_MISMATCH_CAP)
}

fn compact(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}
