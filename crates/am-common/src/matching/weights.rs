use crate::components::ComponentKind;

/// 既定の重要度テーブル。
/// road と house_number が支配的で、行政区分ほど軽くなる。
/// 合計は 1.0 ちょうど（ScoreEngine 構築時に検証される）。
pub const DEFAULT_WEIGHTS: ComponentWeights = ComponentWeights {
    house_number: 0.30,
    road: 0.35,
    postcode: 0.15,
    city: 0.10,
    state: 0.04,
    country: 0.03,
    house: 0.02,
    city_district: 0.01,
};

/// コンポーネント重要度テーブル（プロセス起動時に読み込む設定値、以後 read-only）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentWeights {
    pub house_number: f64,
    pub road: f64,
    pub postcode: f64,
    pub city: f64,
    pub state: f64,
    pub country: f64,
    pub house: f64,
    pub city_district: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl ComponentWeights {
    pub fn get(&self, kind: ComponentKind) -> f64 {
        match kind {
            ComponentKind::HouseNumber => self.house_number,
            ComponentKind::Road => self.road,
            ComponentKind::Postcode => self.postcode,
            ComponentKind::City => self.city,
            ComponentKind::State => self.state,
            ComponentKind::Country => self.country,
            ComponentKind::House => self.house,
            ComponentKind::CityDistrict => self.city_district,
        }
    }

    pub fn sum(&self) -> f64 {
        self.house_number
            + self.road
            + self.postcode
            + self.city
            + self.state
            + self.country
            + self.house
            + self.city_district
    }

    /// 環境変数から重みを読み込む（未設定フィールドは既定値のまま）
    pub fn from_env() -> Self {
        Self {
            house_number: env_weight("AM_WEIGHT_HOUSE_NUMBER", DEFAULT_WEIGHTS.house_number),
            road: env_weight("AM_WEIGHT_ROAD", DEFAULT_WEIGHTS.road),
            postcode: env_weight("AM_WEIGHT_POSTCODE", DEFAULT_WEIGHTS.postcode),
            city: env_weight("AM_WEIGHT_CITY", DEFAULT_WEIGHTS.city),
            state: env_weight("AM_WEIGHT_STATE", DEFAULT_WEIGHTS.state),
            country: env_weight("AM_WEIGHT_COUNTRY", DEFAULT_WEIGHTS.country),
            house: env_weight("AM_WEIGHT_HOUSE", DEFAULT_WEIGHTS.house),
            city_district: env_weight("AM_WEIGHT_CITY_DISTRICT", DEFAULT_WEIGHTS.city_district),
        }
    }
}

fn env_weight(name: &str, default: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
