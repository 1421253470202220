use std::fmt;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use crate::models::observation::{ActualData, MonitorData, Observation};
use crate::models::prediction::{PredictionData, PrefectureData};
use crate::parsers::ParseError;
use crate::wbgt_level::Band;

/// Where the current value was taken from
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataSource {
    #[serde(rename = "実測値")]
    Monitor,
    #[serde(rename = "実況値")]
    Actual,
    #[serde(rename = "予測値")]
    Prediction,
    #[serde(rename = "デフォルト値（取得エラー）")]
    Default,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataSource::Monitor    => write!(f, "実測値"),
            DataSource::Actual     => write!(f, "実況値"),
            DataSource::Prediction => write!(f, "予測値"),
            DataSource::Default    => write!(f, "デフォルト値（取得エラー）"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    Direct,
    Proxy,
    Fallback,
}

/// The document written by a fetch run and read by the dashboard
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub location: String,
    #[serde(rename = "pointCode")]
    pub point_code: String,
    #[serde(rename = "updateTime")]
    pub update_time: DateTime<FixedOffset>,
    #[serde(rename = "fetchedAt")]
    pub fetched_at: DateTime<FixedOffset>,
    #[serde(rename = "fetchMethod")]
    pub fetch_method: FetchMethod,
    pub unit: String,
    #[serde(rename = "currentWbgt")]
    pub current_wbgt: Option<f64>,
    #[serde(rename = "dataSource")]
    pub data_source: DataSource,
    #[serde(rename = "dataDate")]
    pub data_date: Option<String>,
    #[serde(rename = "dataTime")]
    pub data_time: Option<String>,
    pub level: Option<Band>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prediction: Option<PredictionData>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub actual: Option<ActualData>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub monitor: Option<MonitorData>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prefecture: Option<PrefectureData>,
    #[serde(default)]
    pub error: bool,
    #[serde(rename = "errorMessage", skip_serializing_if = "Option::is_none", default)]
    pub error_message: Option<String>,
}

impl Snapshot {
    /// Checks the invariants the dashboard relies on when it indexes into a snapshot.
    /// A snapshot flagged as an error is only checked for its current value since
    /// nothing else in it is rendered.
    pub fn validate(&self) -> Result<(), ParseError> {
        if let Some(wbgt) = self.current_wbgt {
            check_finite("currentWbgt", wbgt)?;
        }
        if self.error {
            return Ok(());
        }

        let expected = self.current_wbgt.map(Band::classify);
        if self.level != expected {
            return Err(ParseError::Shape(format!(
                "level {:?} does not match currentWbgt {:?}", self.level, self.current_wbgt)));
        }

        if let Some(prediction) = &self.prediction {
            for p in &prediction.predictions {
                if p.time.len() != 10 || !p.time.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(ParseError::Shape(format!("prediction time '{}' is not YYYYMMDDHH", p.time)));
                }
                check_finite("prediction.wbgt", p.wbgt)?;
            }
        }
        if let Some(actual) = &self.actual {
            check_observations("actual", &actual.actual_values)?;
        }
        if let Some(monitor) = &self.monitor {
            check_observations("monitor", &monitor.monitor_values)?;
        }

        Ok(())
    }
}

fn check_finite(field: &str, value: f64) -> Result<(), ParseError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParseError::Shape(format!("{} is not a finite number", field)))
    }
}

fn check_observations(source: &str, observations: &[Observation]) -> Result<(), ParseError> {
    for o in observations {
        if o.date_naive().is_none() || o.minutes().is_none() {
            return Err(ParseError::Shape(format!("{} row '{} {}' has no valid date and time", source, o.date, o.time)));
        }
        if let Some(wbgt) = o.wbgt {
            check_finite(source, wbgt)?;
        }
    }
    Ok(())
}
