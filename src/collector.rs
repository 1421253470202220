use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset};
use log::{error, info, warn};
use crate::config::Config;
use crate::errors::CollectError;
use crate::manager_scrape::Scraper;
use crate::manager_wbgt::WbgtSite;
use crate::models::observation::{ActualData, MonitorData, Observation};
use crate::models::prediction::{PredictionData, PrefectureData};
use crate::models::snapshot::Snapshot;
use crate::parsers::csv_files::{latest_observation, parse_observation_csv, parse_prediction_csv, parse_prefecture_csv};
use crate::parsers::html_page::HtmlExtractor;
use crate::snapshot::{build_snapshot, fallback_snapshot, now_jst, scraped_snapshot, SourceParts};
use crate::storage::{save_raw, save_snapshot};

const PREDICTION_FILE: &str = "prediction.csv";
const ACTUAL_FILE: &str = "actual.csv";
const MONITOR_FILE: &str = "monitor.csv";
const PREFECTURE_FILE: &str = "prefecture.csv";
const SCRAPED_FILE: &str = "scraped.html";

/// Runs one fetch, i.e. downloads all sources, combines them and saves the snapshot.
///
/// Whatever goes wrong a snapshot file is left behind, if nothing else a degraded one
/// with a seasonal default value and the error flag set. A degraded run still returns
/// an error so the process exits with a failure code.
///
/// # Arguments
///
/// * 'config' - configuration
pub fn run(config: &Config) -> Result<()> {
    let now = now_jst();
    let site = WbgtSite::new(&config.sources, &config.station);
    let snapshot_path = config.files.data_path(&config.files.snapshot_file);

    match collect(config, &site, now) {
        Ok(snapshot) => {
            save_snapshot(&snapshot_path, &snapshot)?;
            info!("snapshot saved to {}: {:?} {} ({:?})",
                snapshot_path, snapshot.current_wbgt, snapshot.data_source, snapshot.fetch_method);
            Ok(())
        },
        Err(e) => {
            error!("fetch run failed: {}", e);
            let fallback = fallback_snapshot(&config.station, &e.to_string(), now);
            match save_snapshot(&snapshot_path, &fallback) {
                Ok(()) => warn!("fallback snapshot with default value {:?} saved to {}", fallback.current_wbgt, snapshot_path),
                Err(se) => error!("failed to save fallback snapshot: {}", se),
            }
            Err(anyhow!("fetch run failed: {}", e))
        },
    }
}

/// Downloads and combines all sources. Falls back to scraping the HTML page through the
/// proxy when no CSV source has a value and the proxy is enabled.
///
/// # Arguments
///
/// * 'config' - configuration
/// * 'site' - the site manager to download with
/// * 'now' - time of the run
pub fn collect(config: &Config, site: &WbgtSite, now: DateTime<FixedOffset>) -> Result<Snapshot, CollectError> {
    let parts = fetch_parts(config, site, now);

    match build_snapshot(&config.station, parts, now) {
        Ok(snapshot) => Ok(snapshot),
        Err(e) if config.proxy.enabled => {
            warn!("{}, trying the html page through the proxy", e);
            scrape(config, now)
        },
        Err(e) => Err(e.into()),
    }
}

/// Fetches every source in turn, a failing source is logged and marked as unavailable
fn fetch_parts(config: &Config, site: &WbgtSite, now: DateTime<FixedOffset>) -> SourceParts {
    let files = &config.files;

    let prediction = fetch_prediction(site, &files.data_path(PREDICTION_FILE))
        .unwrap_or_else(|e| {
            warn!("prediction data unavailable: {}", e);
            PredictionData::default()
        });

    let actual = fetch_observations(site, &site.actual_url(now), &files.data_path(ACTUAL_FILE))
        .map(|(latest, actual_values)| ActualData { available: true, latest, actual_values })
        .unwrap_or_else(|e| {
            warn!("actual data unavailable: {}", e);
            ActualData::default()
        });

    let monitor = fetch_observations(site, &site.monitor_url(now), &files.data_path(MONITOR_FILE))
        .map(|(latest, monitor_values)| MonitorData { available: true, latest, monitor_values })
        .unwrap_or_else(|e| {
            warn!("monitor data unavailable: {}", e);
            MonitorData::default()
        });

    let prefecture = config.station.prefecture.as_ref().and_then(|name| {
        fetch_prefecture(site, name, &files.data_path(PREFECTURE_FILE))
            .map_err(|e| warn!("prefecture data unavailable: {}", e))
            .ok()
    });

    SourceParts { prediction, actual, monitor, prefecture }
}

/// Downloads a document and keeps a raw copy of it before it is parsed
fn fetch_document(site: &WbgtSite, url: &str, raw_path: &str) -> Result<String, CollectError> {
    let text = site.get_csv(url)?;
    save_raw(raw_path, &text)?;

    Ok(text)
}

fn fetch_prediction(site: &WbgtSite, raw_path: &str) -> Result<PredictionData, CollectError> {
    let text = fetch_document(site, &site.prediction_url(), raw_path)?;
    let (update_time, predictions) = parse_prediction_csv(&text)?;
    info!("prediction: {} point(s)", predictions.len());

    Ok(PredictionData { available: true, update_time, predictions })
}

fn fetch_observations(site: &WbgtSite, url: &str, raw_path: &str) -> Result<(Option<Observation>, Vec<Observation>), CollectError> {
    let text = fetch_document(site, url, raw_path)?;
    let observations = parse_observation_csv(&text)?;
    let latest = latest_observation(&observations).cloned();
    info!("{}: {} row(s), latest {:?}", url, observations.len(), latest.as_ref().map(|o| (&o.date, &o.time, o.wbgt)));

    Ok((latest, observations))
}

fn fetch_prefecture(site: &WbgtSite, name: &str, raw_path: &str) -> Result<PrefectureData, CollectError> {
    let url = site.prefecture_url()
        .ok_or_else(|| CollectError::Config("no prefecture configured".into()))?;
    let text = fetch_document(site, &url, raw_path)?;

    Ok(PrefectureData { name: name.to_string(), points: parse_prefecture_csv(&text)? })
}

/// Fetches the HTML page through the proxy and extracts the current value from it
fn scrape(config: &Config, now: DateTime<FixedOffset>) -> Result<Snapshot, CollectError> {
    let scraper = Scraper::new(&config.proxy, &config.sources, &config.station)?;
    let html = scraper.get_page()?;
    save_raw(&config.files.data_path(SCRAPED_FILE), &html)?;

    let value = HtmlExtractor::new()?.extract(&html, now)?;
    info!("scraped WBGT {} (time found on page: {})", value.wbgt, value.timestamp_found);

    Ok(scraped_snapshot(&config.station, value, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::path::Path;
    use std::thread;
    use chrono::Datelike;
    use log::LevelFilter;
    use crate::config::{Dashboard, Files, General, Proxy, Sources, Station};
    use crate::manager_scrape::errors::ScrapeError;
    use crate::models::snapshot::{DataSource, FetchMethod};
    use crate::snapshot::seasonal_default;
    use crate::storage::load_snapshot;

    /// Nothing listens on the discard port, every request fails with a connection error
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    const UNSET_KEY_ENV: &str = "WBGTWATCH_TEST_UNSET_KEY";

    const FORECAST_CSV: &str = ",,2024062412,2024062415\n61286,2024062412,220,245\n";

    const ACTUAL_CSV: &str = "Date,Time,61286\n2024/6/24,10:00,25.1\n2024/6/24,11:00,26.0\n2024/6/24,12:00,\n";

    fn test_config(base_url: &str, data_dir: &str, proxy_enabled: bool, api_key_env: &str) -> Config {
        Config {
            station: Station {
                location: "甲府".to_string(),
                point_code: "61286".to_string(),
                monitor_name: "Kofu".to_string(),
                region: "07".to_string(),
                prefecture_no: "61".to_string(),
                prefecture: Some("yamanashi".to_string()),
            },
            sources: Sources { base_url: base_url.to_string(), timeout_secs: 5 },
            proxy: Proxy {
                enabled: proxy_enabled,
                api_url: format!("{}/api/v1/", base_url),
                api_key_env: api_key_env.to_string(),
            },
            files: Files {
                data_dir: format!("{}/", data_dir),
                snapshot_file: "latest_data.json".to_string(),
                page_file: format!("{}/index.html", data_dir),
            },
            dashboard: Dashboard { refresh_minutes: 30, retry_seconds: 60 },
            general: General { log_path: "log/".to_string(), log_level: LevelFilter::Off, log_to_stdout: false },
        }
    }

    /// Serves canned responses on a local port. A request is answered by the first route whose
    /// prefix matches its path, anything else gets a 404. Returns the base url.
    fn serve(routes: Vec<(&'static str, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        thread::spawn(move || {
            for mut stream in listener.incoming().flatten() {
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let mut header = String::new();
                while reader.read_line(&mut header).unwrap_or(0) > 2 {
                    header.clear();
                }

                let path = request_line.split_whitespace().nth(1).unwrap_or("/");
                let response = match routes.iter().find(|(prefix, _)| path.starts_with(prefix)) {
                    Some((_, body)) => format!("HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\n\
                                                Content-Length: {}\r\nConnection: close\r\n\r\n{}", body.len(), body),
                    None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
                };
                let _ = stream.write_all(response.as_bytes());
            }
        });

        base_url
    }

    fn data_file(config: &Config, name: &str) -> String {
        config.files.data_path(name)
    }

    #[test]
    fn unreachable_site_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(UNREACHABLE, dir.path().to_str().unwrap(), false, UNSET_KEY_ENV);
        let site = WbgtSite::new(&config.sources, &config.station);

        assert!(matches!(collect(&config, &site, now_jst()), Err(CollectError::NoData(_))));
    }

    #[test]
    fn proxy_without_key_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(UNREACHABLE, dir.path().to_str().unwrap(), true, UNSET_KEY_ENV);
        let site = WbgtSite::new(&config.sources, &config.station);

        assert!(matches!(collect(&config, &site, now_jst()), Err(CollectError::Scrape(ScrapeError::Config(_)))));
    }

    #[test]
    fn failed_run_leaves_degraded_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(UNREACHABLE, dir.path().to_str().unwrap(), false, UNSET_KEY_ENV);

        assert!(run(&config).is_err());

        let snapshot = load_snapshot(&data_file(&config, &config.files.snapshot_file)).unwrap();
        assert!(snapshot.error);
        assert_eq!(snapshot.data_source, DataSource::Default);
        assert_eq!(snapshot.current_wbgt, Some(seasonal_default(snapshot.fetched_at.month())));
        assert!(snapshot.error_message.unwrap().contains("NoDataError"));
    }

    #[test]
    fn missing_monitor_file_does_not_end_run() {
        let base_url = serve(vec![
            ("/prev15WG/dl/yohou_61286.csv", FORECAST_CSV),
            ("/est15WG/dl/wbgt_61286_", ACTUAL_CSV),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&base_url, dir.path().to_str().unwrap(), false, UNSET_KEY_ENV);

        assert!(run(&config).is_ok());

        let snapshot = load_snapshot(&data_file(&config, &config.files.snapshot_file)).unwrap();
        snapshot.validate().unwrap();
        assert!(!snapshot.error);
        assert_eq!(snapshot.fetch_method, FetchMethod::Direct);
        assert_eq!(snapshot.data_source, DataSource::Actual);
        assert_eq!(snapshot.current_wbgt, Some(26.0));
        assert_eq!(snapshot.data_time.as_deref(), Some("11:00"));
        assert!(!snapshot.monitor.unwrap().available);
        assert!(snapshot.actual.unwrap().available);
        assert_eq!(snapshot.prediction.unwrap().predictions.len(), 2);
        assert!(snapshot.prefecture.is_none());
    }

    #[test]
    fn raw_documents_are_kept_before_parsing() {
        let broken_forecast = "地点,時刻,latest\n61286,2024062412,220\n";
        let base_url = serve(vec![
            ("/prev15WG/dl/yohou_61286.csv", broken_forecast),
            ("/est15WG/dl/wbgt_61286_", ACTUAL_CSV),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&base_url, dir.path().to_str().unwrap(), false, UNSET_KEY_ENV);
        let site = WbgtSite::new(&config.sources, &config.station);

        let snapshot = collect(&config, &site, now_jst()).unwrap();

        assert!(!snapshot.prediction.unwrap().available);
        assert_eq!(fs::read_to_string(data_file(&config, PREDICTION_FILE)).unwrap(), broken_forecast);
        assert_eq!(fs::read_to_string(data_file(&config, ACTUAL_FILE)).unwrap(), ACTUAL_CSV);
        assert!(!Path::new(&data_file(&config, MONITOR_FILE)).exists());
    }

    #[test]
    fn proxy_page_is_used_when_no_csv_has_a_value() {
        let page = "<html><body><table>\
            <tr><th>暑さ指数(WBGT)</th><td>29.4</td></tr>\
            <tr><td>2024年7月10日 14:00 時点</td></tr>\
            </table></body></html>";
        let base_url = serve(vec![("/api/v1/", page)]);
        let dir = tempfile::tempdir().unwrap();
        let key_env = "WBGTWATCH_TEST_PROXY_KEY";
        // no other test reads this variable
        unsafe { std::env::set_var(key_env, "test-key") };
        let config = test_config(&base_url, dir.path().to_str().unwrap(), true, key_env);
        let site = WbgtSite::new(&config.sources, &config.station);

        let snapshot = collect(&config, &site, now_jst()).unwrap();

        assert_eq!(snapshot.fetch_method, FetchMethod::Proxy);
        assert_eq!(snapshot.data_source, DataSource::Actual);
        assert_eq!(snapshot.current_wbgt, Some(29.4));
        assert_eq!(snapshot.data_date.as_deref(), Some("2024/7/10"));
        assert_eq!(snapshot.data_time.as_deref(), Some("14:00"));
        assert_eq!(fs::read_to_string(data_file(&config, SCRAPED_FILE)).unwrap(), page);
    }
}
