use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::components::{ComponentKind, ComponentSet};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("extractor backend failed: {0}")]
    Backend(String),
}

/// 正規化済み住所文字列を構成フィールドへ分解する能力。
///
/// 実装は差し替え可能。失敗 (`Err`) はスコアリング側で「全フィールド欠損」
/// として扱われ、スコアリング呼び出し自体は失敗しない。
pub trait ComponentExtractor: Send + Sync {
    fn extract(&self, normalized: &str) -> Result<ComponentSet, ExtractError>;
}

lazy_static! {
    // UK: "sw1a 2aa" / "sw1a2aa"
    static ref UK_POSTCODE_RE: Regex =
        Regex::new(r"\b[a-z]{1,2}\d[a-z\d]?\s?\d[a-z]{2}\b").unwrap();
    // 欧州系: "00-950" (PL) / "1012 ab" (NL)
    static ref EU_POSTCODE_RE: Regex =
        Regex::new(r"\b(?:\d{2}-\d{3}|\d{4}\s?[a-z]{2})\b").unwrap();
    // US: "90210" / "90210-1234"
    static ref US_ZIP_RE: Regex = Regex::new(r"\b\d{5}(?:-\d{4})?\b").unwrap();

    // 先頭番地: "10 downing street" / "221b baker street"
    static ref LEADING_NUMBER_RE: Regex =
        Regex::new(r"^(\d+[a-z]?(?:/\d+[a-z]?)?)\s+(.+)$").unwrap();
    // 末尾番地（欧州式）: "dabrowskiego 5"
    static ref TRAILING_NUMBER_RE: Regex = Regex::new(r"^(.+?)\s+(\d+[a-z]?)$").unwrap();
    // 番地のみのセグメント
    static ref NUMBER_ONLY_RE: Regex = Regex::new(r"^\d+[a-z]?$").unwrap();
}

// 国名レキシコン（正規化後の表記）。検出のみで、ISOコード等への正規化はしない。
const COUNTRIES: &[&str] = &[
    "uk",
    "united kingdom",
    "great britain",
    "england",
    "scotland",
    "wales",
    "northern ireland",
    "ireland",
    "us",
    "usa",
    "united states",
    "united states of america",
    "canada",
    "mexico",
    "france",
    "germany",
    "deutschland",
    "poland",
    "polska",
    "spain",
    "espana",
    "italy",
    "italia",
    "portugal",
    "netherlands",
    "nederland",
    "belgium",
    "austria",
    "switzerland",
    "sweden",
    "norway",
    "denmark",
    "finland",
    "czechia",
    "czech republic",
    "japan",
    "australia",
    "new zealand",
    "brazil",
    "brasil",
];

// 州略記レキシコン。フルネーム ("new york" 等) は都市名と衝突するため
// ここでは扱わず、city / city_district スロットに流す（両住所で対称に
// 誤るぶんには比較結果が歪まない）。"or" や "in" のような英単語と
// 衝突する略記も除外。
const STATE_CODES: &[&str] = &[
    "ca", "ny", "tx", "fl", "il", "wa", "az", "co", "pa", "ga", "oh", "mi", "nj", "va", "nv",
    "ma", "nc", "tn", "md", "mo", "wi", "mn",
];

/// カンマ区切りセグメントをルールベースで分類する既定の抽出器。
///
/// 外部パーサ（libpostal 等）を使う構成へ差し替える場合も
/// `ComponentExtractor` 契約さえ満たせばスコアリング側の変更は不要。
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl ComponentExtractor for HeuristicExtractor {
    fn extract(&self, normalized: &str) -> Result<ComponentSet, ExtractError> {
        let mut set = ComponentSet::default();
        let mut leftovers: Vec<(usize, String)> = Vec::new();
        let mut road_index: Option<usize> = None;

        for (index, raw_segment) in normalized.split(',').enumerate() {
            let mut segment = raw_segment.trim().to_string();
            if segment.is_empty() {
                continue;
            }

            if set.get(ComponentKind::Postcode).is_none() {
                if let Some((code, remainder)) = split_postcode(&segment) {
                    set.set(ComponentKind::Postcode, code);
                    segment = remainder;
                    if segment.is_empty() {
                        continue;
                    }
                }
            }

            if COUNTRIES.contains(&segment.as_str()) {
                set.set(ComponentKind::Country, segment);
                continue;
            }

            if STATE_CODES.contains(&segment.as_str()) {
                set.set(ComponentKind::State, segment);
                continue;
            }

            if set.get(ComponentKind::Road).is_none() {
                if let Some(captures) = LEADING_NUMBER_RE.captures(&segment) {
                    set.set(ComponentKind::HouseNumber, &captures[1]);
                    set.set(ComponentKind::Road, &captures[2]);
                    road_index = Some(index);
                    continue;
                }
                if let Some(captures) = TRAILING_NUMBER_RE.captures(&segment) {
                    set.set(ComponentKind::Road, &captures[1]);
                    set.set(ComponentKind::HouseNumber, &captures[2]);
                    road_index = Some(index);
                    continue;
                }
                if NUMBER_ONLY_RE.is_match(&segment) {
                    set.set(ComponentKind::HouseNumber, segment);
                    continue;
                }
            }

            leftovers.push((index, segment));
        }

        assign_leftovers(&mut set, road_index, leftovers);
        Ok(set)
    }
}

/// セグメントから郵便番号を探し、(郵便番号, 残り) を返す
fn split_postcode(segment: &str) -> Option<(String, String)> {
    for pattern in [&*UK_POSTCODE_RE, &*EU_POSTCODE_RE, &*US_ZIP_RE] {
        if let Some(found) = pattern.find(segment) {
            // セグメント全体が番地パターンに読める場合は郵便番号扱いしない
            if NUMBER_ONLY_RE.is_match(segment) {
                return None;
            }
            let remainder = format!("{} {}", &segment[..found.start()], &segment[found.end()..]);
            return Some((found.as_str().to_string(), remainder.trim().to_string()));
        }
    }
    None
}

/// 未分類セグメントを house / city / city_district に割り当てる。
/// road より前のセグメントは建物・POI 名、road 以降の最初が city、次が district。
fn assign_leftovers(
    set: &mut ComponentSet,
    road_index: Option<usize>,
    leftovers: Vec<(usize, String)>,
) {
    let mut leftovers = leftovers.into_iter().peekable();

    match road_index {
        Some(road_at) => {
            if let Some((index, _)) = leftovers.peek() {
                if *index < road_at {
                    let (_, segment) = leftovers.next().unwrap_or_default();
                    set.set(ComponentKind::House, segment);
                }
            }
        }
        None => {
            // road が取れず残りが複数ある場合、先頭は POI 名として扱う
            if leftovers.len() >= 2 {
                let (_, segment) = leftovers.next().unwrap_or_default();
                set.set(ComponentKind::House, segment);
            }
        }
    }

    if let Some((_, segment)) = leftovers.next() {
        set.set(ComponentKind::City, segment);
    }
    if let Some((_, segment)) = leftovers.next() {
        set.set(ComponentKind::CityDistrict, segment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn extract(raw: &str) -> ComponentSet {
        HeuristicExtractor
            .extract(&normalize(raw))
            .expect("heuristic extractor does not fail")
    }

    #[test]
    fn parses_uk_style_address() {
        let set = extract("10 Downing Street, London, SW1A 2AA, UK");

        assert_eq!(set.get(ComponentKind::HouseNumber), Some("10"));
        assert_eq!(set.get(ComponentKind::Road), Some("downing street"));
        assert_eq!(set.get(ComponentKind::City), Some("london"));
        assert_eq!(set.get(ComponentKind::Postcode), Some("sw1a 2aa"));
        assert_eq!(set.get(ComponentKind::Country), Some("uk"));
    }

    #[test]
    fn parses_compact_postcode_and_long_country() {
        let set = extract("10 Downing St, London, SW1A2AA, United Kingdom");

        assert_eq!(set.get(ComponentKind::Road), Some("downing st"));
        assert_eq!(set.get(ComponentKind::Postcode), Some("sw1a2aa"));
        assert_eq!(set.get(ComponentKind::Country), Some("united kingdom"));
    }

    #[test]
    fn parses_european_trailing_house_number() {
        let set = extract("Dąbrowskiego 5, 00-950, Warszawa, Polska");

        assert_eq!(set.get(ComponentKind::Road), Some("dabrowskiego"));
        assert_eq!(set.get(ComponentKind::HouseNumber), Some("5"));
        assert_eq!(set.get(ComponentKind::Postcode), Some("00-950"));
        assert_eq!(set.get(ComponentKind::City), Some("warszawa"));
        assert_eq!(set.get(ComponentKind::Country), Some("polska"));
    }

    #[test]
    fn postcode_embedded_in_city_segment_is_split_out() {
        let set = extract("10 Downing Street, London SW1A 2AA");

        assert_eq!(set.get(ComponentKind::Postcode), Some("sw1a 2aa"));
        assert_eq!(set.get(ComponentKind::City), Some("london"));
    }

    #[test]
    fn bare_country_yields_country_only() {
        let set = extract("France");

        assert_eq!(set.get(ComponentKind::Country), Some("france"));
        assert_eq!(set.get(ComponentKind::Road), None);
        assert_eq!(set.get(ComponentKind::City), None);
    }

    #[test]
    fn poi_before_city_becomes_house() {
        let set = extract("Buckingham Palace, London, UK");

        assert_eq!(set.get(ComponentKind::House), Some("buckingham palace"));
        assert_eq!(set.get(ComponentKind::City), Some("london"));
        assert_eq!(set.get(ComponentKind::Country), Some("uk"));
    }

    #[test]
    fn us_style_with_state_and_zip() {
        let set = extract("350 Fifth Avenue, New York, NY 10118, USA");

        assert_eq!(set.get(ComponentKind::HouseNumber), Some("350"));
        assert_eq!(set.get(ComponentKind::Road), Some("fifth avenue"));
        assert_eq!(set.get(ComponentKind::City), Some("new york"));
        assert_eq!(set.get(ComponentKind::State), Some("ny"));
        assert_eq!(set.get(ComponentKind::Postcode), Some("10118"));
        assert_eq!(set.get(ComponentKind::Country), Some("usa"));
    }

    #[test]
    fn degenerate_input_yields_all_absent() {
        assert!(extract("").is_empty());
        assert!(extract("!!! ???").is_empty());
    }
}
