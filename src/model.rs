//! Input data handed over by the data-selection pipeline.
//!
//! The types mirror the JSON shape of the computed statistics (`timeInRange`,
//! `sensorUsage`), the glucose bounds and the patient identity. They only describe data;
//! nothing here decides which statistics exist or how they are computed.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Glucose range category of a time-in-range datum.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryId {
    VeryLow,
    Low,
    Target,
    High,
    VeryHigh,
    /// Any id outside the five standard ranges, kept verbatim.
    Other(String),
}

impl CategoryId {
    /// The camelCase identifier used in the statistics payload.
    pub fn as_str(&self) -> &str {
        match self {
            CategoryId::VeryLow => "veryLow",
            CategoryId::Low => "low",
            CategoryId::Target => "target",
            CategoryId::High => "high",
            CategoryId::VeryHigh => "veryHigh",
            CategoryId::Other(id) => id,
        }
    }
}

impl From<String> for CategoryId {
    fn from(value: String) -> Self {
        match value.as_str() {
            "veryLow" => CategoryId::VeryLow,
            "low" => CategoryId::Low,
            "target" => CategoryId::Target,
            "high" => CategoryId::High,
            "veryHigh" => CategoryId::VeryHigh,
            _ => CategoryId::Other(value),
        }
    }
}

impl From<&str> for CategoryId {
    fn from(value: &str) -> Self {
        CategoryId::from(value.to_owned())
    }
}

impl From<CategoryId> for String {
    fn from(id: CategoryId) -> Self {
        match id {
            CategoryId::Other(id) => id,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One category bucket of a statistic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryDatum {
    pub id: CategoryId,
    pub value: f64,
}

impl CategoryDatum {
    pub fn new(id: impl Into<CategoryId>, value: f64) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

/// The total a statistic's categories add up to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatTotal {
    pub value: f64,
}

/// A named total plus its ordered category buckets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticRecord {
    #[serde(default)]
    pub total: StatTotal,
    #[serde(default)]
    pub data: Vec<CategoryDatum>,
}

impl StatisticRecord {
    pub fn new(total: f64, data: Vec<CategoryDatum>) -> Self {
        Self {
            total: StatTotal { value: total },
            data,
        }
    }

    /// Whether the record has anything to chart.
    pub fn has_data(&self) -> bool {
        self.total.value.is_finite() && self.total.value > 0.0
    }
}

/// A statistic as delivered by the data-selection pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stat<T> {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub data: T,
}

/// A datum reference carrying its timestamp in epoch milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedDatum {
    pub time: i64,
}

/// Raw sensor usage figures.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SensorUsageRaw {
    pub cgm_days_worn: u32,
    pub oldest_datum: Option<TimedDatum>,
    pub newest_datum: Option<TimedDatum>,
    #[serde(rename = "sensorUsageAGP")]
    pub sensor_usage_agp: Option<f64>,
}

/// Sensor usage statistic payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorUsageData {
    #[serde(default)]
    pub raw: SensorUsageRaw,
}

/// The statistics bundle used by the AGP page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgpStats {
    pub time_in_range: Stat<StatisticRecord>,
    pub sensor_usage: Stat<SensorUsageData>,
}

impl AgpStats {
    /// Parses the statistics JSON.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}

/// Glucose thresholds shown as the time-in-range tick labels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundsConfig {
    pub very_low_threshold: f64,
    pub target_lower_bound: f64,
    pub target_upper_bound: f64,
    pub very_high_threshold: f64,
}

impl BoundsConfig {
    /// The thresholds in ascending clinical order.
    pub fn ascending(&self) -> [f64; 4] {
        [
            self.very_low_threshold,
            self.target_lower_bound,
            self.target_upper_bound,
            self.very_high_threshold,
        ]
    }
}

impl Default for BoundsConfig {
    /// Standard mg/dL consensus targets.
    fn default() -> Self {
        Self {
            very_low_threshold: 54.0,
            target_lower_bound: 70.0,
            target_upper_bound: 180.0,
            very_high_threshold: 250.0,
        }
    }
}

/// Patient identity printed in the report info rows.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Patient {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<NaiveDate>,
}

impl Patient {
    /// The display name: `fullName` when present, otherwise first and last name joined.
    pub fn display_name(&self) -> String {
        if let Some(full) = self.full_name.as_deref().filter(|name| !name.trim().is_empty()) {
            return full.trim().to_owned();
        }
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
