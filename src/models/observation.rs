use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of an actual (estimated) or monitor (measured) CSV file
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Observation {
    pub date: String,
    pub time: String,
    pub wbgt: Option<f64>,
}

impl Observation {
    /// Returns the date as published, i.e. YYYY/M/D with or without zero padding
    pub fn date_naive(&self) -> Option<NaiveDate> {
        let mut parts = self.date.trim().split('/');
        let year = parts.next()?.trim().parse::<i32>().ok()?;
        let month = parts.next()?.trim().parse::<u32>().ok()?;
        let day = parts.next()?.trim().parse::<u32>().ok()?;
        if parts.next().is_some() {
            return None;
        }

        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// Returns minutes since midnight, 24:00 is accepted and sorts after 23:xx
    pub fn minutes(&self) -> Option<u32> {
        let (hour, minute) = self.time.trim().split_once(':')?;
        let hour = hour.trim().parse::<u32>().ok()?;
        let minute = minute.trim().parse::<u32>().ok()?;

        if minute > 59 || hour > 24 || (hour == 24 && minute != 0) {
            None
        } else {
            Some(hour * 60 + minute)
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct ActualData {
    pub available: bool,
    pub latest: Option<Observation>,
    #[serde(rename = "actualValues")]
    pub actual_values: Vec<Observation>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct MonitorData {
    pub available: bool,
    pub latest: Option<Observation>,
    #[serde(rename = "monitorValues")]
    pub monitor_values: Vec<Observation>,
}
