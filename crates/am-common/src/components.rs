use strum::EnumIter;

/// 住所構成フィールドの固定列挙。
/// 抽出器が返せるフィールドはこの8種類のみ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum ComponentKind {
    HouseNumber,
    Road,
    Postcode,
    City,
    State,
    Country,
    House,
    CityDistrict,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::HouseNumber => "house_number",
            ComponentKind::Road => "road",
            ComponentKind::Postcode => "postcode",
            ComponentKind::City => "city",
            ComponentKind::State => "state",
            ComponentKind::Country => "country",
            ComponentKind::House => "house",
            ComponentKind::CityDistrict => "city_district",
        }
    }

    /// 数値系フィールド（完全一致ベース + 前方一致の部分点で比較する）
    pub fn is_numeric(&self) -> bool {
        matches!(self, ComponentKind::HouseNumber | ComponentKind::Postcode)
    }
}

/// 1住所分の抽出結果。
/// 「欠損」(None) と「空一致」は別物: 欠損フィールドはカバレッジ計算から
/// 除外されるため、空文字は set() の時点で欠損に落とす。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentSet {
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub house: Option<String>,
    pub city_district: Option<String>,
}

impl ComponentSet {
    pub fn get(&self, kind: ComponentKind) -> Option<&str> {
        match kind {
            ComponentKind::HouseNumber => self.house_number.as_deref(),
            ComponentKind::Road => self.road.as_deref(),
            ComponentKind::Postcode => self.postcode.as_deref(),
            ComponentKind::City => self.city.as_deref(),
            ComponentKind::State => self.state.as_deref(),
            ComponentKind::Country => self.country.as_deref(),
            ComponentKind::House => self.house.as_deref(),
            ComponentKind::CityDistrict => self.city_district.as_deref(),
        }
    }

    pub fn set(&mut self, kind: ComponentKind, value: impl Into<String>) {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return;
        }

        let slot = match kind {
            ComponentKind::HouseNumber => &mut self.house_number,
            ComponentKind::Road => &mut self.road,
            ComponentKind::Postcode => &mut self.postcode,
            ComponentKind::City => &mut self.city,
            ComponentKind::State => &mut self.state,
            ComponentKind::Country => &mut self.country,
            ComponentKind::House => &mut self.house,
            ComponentKind::CityDistrict => &mut self.city_district,
        };
        *slot = Some(trimmed.to_string());
    }

    pub fn is_empty(&self) -> bool {
        use strum::IntoEnumIterator;
        ComponentKind::iter().all(|kind| self.get(kind).is_none())
    }
}

/// パーサ異常値ガード: "202 1014" のように番地へ郵便番号断片が混入した場合、
/// 後続トークンが郵便番号らしければ先頭トークンだけを残す。
pub fn clean_house_number(house_number: &str) -> String {
    let trimmed = house_number.trim();
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.len() <= 1 {
        return trimmed.to_string();
    }

    if tokens[1..].iter().any(|t| looks_like_postcode_fragment(t)) {
        return tokens[0].to_string();
    }

    trimmed.to_string()
}

/// 3〜5桁の数字のみのトークンは郵便番号断片とみなす
pub fn looks_like_postcode_fragment(token: &str) -> bool {
    let token = token.trim();
    (3..=5).contains(&token.len()) && token.chars().all(|c| c.is_ascii_digit())
}

/// "az" のような極端に短い road はパースノイズ。
/// 偽の完全一致を作らないよう、比較対象から外す判定に使う。
pub fn is_suspicious_road(road: &str) -> bool {
    road.trim().len() <= 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_drops_empty_values_as_absent() {
        let mut set = ComponentSet::default();
        set.set(ComponentKind::City, "  ");
        set.set(ComponentKind::Road, "downing street");

        assert_eq!(set.get(ComponentKind::City), None);
        assert_eq!(set.get(ComponentKind::Road), Some("downing street"));
        assert!(!set.is_empty());
    }

    #[test]
    fn clean_house_number_strips_postcode_fragments() {
        assert_eq!(clean_house_number("202 1014"), "202");
        assert_eq!(clean_house_number("12a"), "12a");
        assert_eq!(clean_house_number("12 14"), "12 14");
        assert_eq!(clean_house_number("5 00950"), "5");
    }

    #[test]
    fn short_roads_are_suspicious() {
        assert!(is_suspicious_road("az"));
        assert!(is_suspicious_road(" rd "));
        assert!(!is_suspicious_road("main"));
        assert!(!is_suspicious_road("downing street"));
    }
}
