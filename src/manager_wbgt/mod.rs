pub mod errors;

use std::time::Duration;
use chrono::{DateTime, FixedOffset};
use log::debug;
use ureq::Agent;
use crate::config::{Sources, Station};
use crate::manager_wbgt::errors::FetchError;

/// Struct for downloading WBGT files published by the heat illness prevention site
pub struct WbgtSite {
    agent: Agent,
    base_url: String,
    point_code: String,
    monitor_name: String,
    prefecture: Option<String>,
}

impl WbgtSite {
    /// Returns a WbgtSite struct ready for downloading files for the given station
    ///
    /// # Arguments
    ///
    /// * 'sources' - base url and timeout
    /// * 'station' - point code and names used in file names
    pub fn new(sources: &Sources, station: &Station) -> WbgtSite {
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(sources.timeout_secs)))
            .build();

        let agent = config.into();

        Self {
            agent,
            base_url: sources.base_url.trim_end_matches('/').to_string(),
            point_code: station.point_code.clone(),
            monitor_name: station.monitor_name.clone(),
            prefecture: station.prefecture.clone(),
        }
    }

    /// Url for the per point forecast, it always holds the latest forecast
    pub fn prediction_url(&self) -> String {
        format!("{}/prev15WG/dl/yohou_{}.csv", self.base_url, self.point_code)
    }

    /// Url for the actual (estimated) values for the month of the given date
    ///
    /// # Arguments
    ///
    /// * 'date_time' - any time within the month
    pub fn actual_url(&self, date_time: DateTime<FixedOffset>) -> String {
        format!("{}/est15WG/dl/wbgt_{}_{}.csv", self.base_url, self.point_code, date_time.format("%Y%m"))
    }

    /// Url for the monitor (measured) values for the month of the given date
    ///
    /// # Arguments
    ///
    /// * 'date_time' - any time within the month
    pub fn monitor_url(&self, date_time: DateTime<FixedOffset>) -> String {
        format!("{}/mntr/dl/{}_{}.csv", self.base_url, self.monitor_name, date_time.format("%Y%m"))
    }

    /// Url for the prefecture wide forecast, None if no prefecture is configured
    pub fn prefecture_url(&self) -> Option<String> {
        self.prefecture
            .as_ref()
            .map(|p| format!("{}/prev15WG/dl/yohou_{}.csv", self.base_url, p))
    }

    /// Downloads a CSV document. The site doesn't guarantee UTF-8 so the body is decoded lossy,
    /// all fields we use are ASCII anyway.
    ///
    /// # Arguments
    ///
    /// * 'url' - url to download
    pub fn get_csv(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);

        let body = self.agent
            .get(url)
            .call()?
            .body_mut()
            .read_to_vec()?;

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn site(prefecture: Option<&str>) -> WbgtSite {
        let sources = Sources { base_url: "https://www.wbgt.env.go.jp/".to_string(), timeout_secs: 30 };
        let station = Station {
            location: "甲府".to_string(),
            point_code: "61286".to_string(),
            monitor_name: "Kofu".to_string(),
            region: "07".to_string(),
            prefecture_no: "61".to_string(),
            prefecture: prefecture.map(|p| p.to_string()),
        };
        WbgtSite::new(&sources, &station)
    }

    #[test]
    fn urls_are_built_from_point_and_month() {
        let site = site(Some("yamanashi"));
        let date = FixedOffset::east_opt(9 * 3600).unwrap().with_ymd_and_hms(2024, 6, 24, 12, 0, 0).unwrap();

        assert_eq!(site.prediction_url(), "https://www.wbgt.env.go.jp/prev15WG/dl/yohou_61286.csv");
        assert_eq!(site.actual_url(date), "https://www.wbgt.env.go.jp/est15WG/dl/wbgt_61286_202406.csv");
        assert_eq!(site.monitor_url(date), "https://www.wbgt.env.go.jp/mntr/dl/Kofu_202406.csv");
        assert_eq!(site.prefecture_url().as_deref(), Some("https://www.wbgt.env.go.jp/prev15WG/dl/yohou_yamanashi.csv"));
    }

    #[test]
    fn no_prefecture_no_url() {
        assert!(site(None).prefecture_url().is_none());
    }
}
