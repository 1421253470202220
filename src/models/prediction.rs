use serde::{Deserialize, Serialize};

/// One forecast value, time is given as YYYYMMDDHH
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictionPoint {
    pub time: String,
    pub wbgt: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct PredictionData {
    pub available: bool,
    #[serde(rename = "updateTime")]
    pub update_time: Option<String>,
    pub predictions: Vec<PredictionPoint>,
}

/// Forecast for one point in the prefecture wide file
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PointForecast {
    #[serde(rename = "pointCode")]
    pub point_code: String,
    #[serde(rename = "updateTime")]
    pub update_time: Option<String>,
    pub predictions: Vec<PredictionPoint>,
}

impl PointForecast {
    /// Returns the highest forecasted value, if any
    pub fn peak(&self) -> Option<&PredictionPoint> {
        self.predictions
            .iter()
            .max_by(|a, b| a.wbgt.total_cmp(&b.wbgt))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PrefectureData {
    pub name: String,
    pub points: Vec<PointForecast>,
}
