use std::fmt::Write;
use chrono::{DateTime, FixedOffset};
use log::warn;
use crate::dashboard::{Dashboard, ViewState};
use crate::models::prediction::PrefectureData;
use crate::models::snapshot::Snapshot;
use crate::wbgt_level::Band;

const STYLE: &str = "body{font-family:sans-serif;max-width:760px;margin:auto;padding:1em}\
.level{padding:1em;border-radius:8px;color:#000}\
.green{background:#218cff}.yellow{background:#a0d2ff}.orange{background:#faf500}\
.red{background:#ff9600}.darkred{background:#ff2800;color:#fff}\
.error{border:1px solid #c00;padding:1em}table{border-collapse:collapse}td,th{padding:2px 8px}";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Renders the whole page for the dashboard's current state
///
/// # Arguments
///
/// * 'dashboard' - the dashboard to render
/// * 'refresh_minutes' - how often the browser should reload the page
/// * 'now' - render time, shown at the bottom of the page
pub fn render(dashboard: &Dashboard, refresh_minutes: u64, now: DateTime<FixedOffset>) -> String {
    let body = match dashboard.state() {
        ViewState::Loading => "<p>読み込み中...</p>".to_string(),
        ViewState::Displayed(snapshot) => {
            let chart_svg = dashboard.chart().and_then(|c| c.to_svg()
                .map_err(|e| warn!("forecast chart left out: {}", e))
                .ok());
            render_snapshot(snapshot, chart_svg)
        },
        ViewState::Errored(message) => render_error(message),
    };

    format!("<!DOCTYPE html>\n<html lang=\"ja\">\n<head>\n<meta charset=\"utf-8\">\n\
             <meta http-equiv=\"refresh\" content=\"{}\">\n<title>暑さ指数 (WBGT)</title>\n<style>{}</style>\n</head>\n\
             <body>\n{}\n<footer>ページ生成: {}</footer>\n</body>\n</html>\n",
            refresh_minutes * 60, STYLE, body, now.format("%Y/%m/%d %H:%M"))
}

fn render_error(message: &str) -> String {
    format!("<div class=\"error\" id=\"error-message\"><p>データを取得できませんでした</p><p>{}</p>\
             <p><a id=\"retry-button\" href=\"\">再試行</a></p></div>", escape(message))
}

fn render_snapshot(snapshot: &Snapshot, chart_svg: Option<String>) -> String {
    let mut html = String::new();

    let _ = write!(html, "<h1 id=\"location\">{}の暑さ指数</h1>", escape(&snapshot.location));

    let data_time = match (&snapshot.data_date, &snapshot.data_time) {
        (Some(date), Some(time)) => format!("観測時刻: {} {}", escape(date), escape(time)),
        _ => "観測時刻: 不明".to_string(),
    };
    let _ = write!(html, "<p id=\"data-time\">{}</p>", data_time);
    let _ = write!(html, "<p id=\"data-source\">データソース: {}</p>", snapshot.data_source);
    let _ = write!(html, "<p>更新時刻: <span id=\"update-time\">{}</span></p>", snapshot.update_time.format("%Y/%m/%d %H:%M"));

    match snapshot.current_wbgt {
        Some(wbgt) => {
            let band = Band::classify(wbgt);
            let _ = write!(html, "<div id=\"current-wbgt\" class=\"level {}\"><p class=\"value\">{:.1}{}</p>\
                                  <p id=\"wbgt-level\">{}</p><p id=\"wbgt-advice\">{}</p></div>",
                           band.color(), wbgt, escape(&snapshot.unit), band.label(), band.advice());
        },
        None => {
            let _ = write!(html, "<div id=\"current-wbgt\"><p>現在の暑さ指数データがありません</p></div>");
        },
    }

    if let Some(svg) = chart_svg {
        let _ = write!(html, "<h2>予測値</h2><div class=\"forecast-chart\">{}</div>", svg);
    }
    if let Some(prefecture) = &snapshot.prefecture {
        html.push_str(&render_prefecture(prefecture));
    }

    html
}

fn render_prefecture(prefecture: &PrefectureData) -> String {
    let mut html = format!("<h2>{} の予測最高値</h2><table><tr><th>地点</th><th>最高</th><th>レベル</th></tr>", escape(&prefecture.name));

    for point in &prefecture.points {
        if let Some(peak) = point.peak() {
            let band = Band::classify(peak.wbgt);
            let _ = write!(html, "<tr><td>{}</td><td>{:.1}</td><td class=\"{}\">{}</td></tr>",
                           escape(&point.point_code), peak.wbgt, band.color(), band.label());
        }
    }
    html.push_str("</table>");

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::config::Station;
    use crate::models::prediction::{PredictionData, PredictionPoint};
    use crate::snapshot::{build_snapshot, fallback_snapshot, jst, SourceParts};
    use crate::storage::save_snapshot;

    fn station() -> Station {
        Station {
            location: "甲府".to_string(),
            point_code: "61286".to_string(),
            monitor_name: "Kofu".to_string(),
            region: "07".to_string(),
            prefecture_no: "61".to_string(),
            prefecture: None,
        }
    }

    fn render_from(snapshot: &Snapshot) -> (Dashboard, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latest_data.json");
        save_snapshot(path.to_str().unwrap(), snapshot).unwrap();

        let mut dashboard = Dashboard::new(path.to_str().unwrap());
        dashboard.refresh();
        let html = render(&dashboard, 30, jst().with_ymd_and_hms(2024, 6, 24, 12, 30, 0).unwrap());

        (dashboard, html)
    }

    #[test]
    fn displayed_page_shows_band_and_chart() {
        let now = jst().with_ymd_and_hms(2024, 6, 24, 15, 0, 0).unwrap();
        let parts = SourceParts {
            prediction: PredictionData {
                available: true,
                update_time: Some("2024062412".to_string()),
                predictions: vec![
                    PredictionPoint { time: "2024062412".to_string(), wbgt: 22.0 },
                    PredictionPoint { time: "2024062415".to_string(), wbgt: 24.5 },
                ],
            },
            ..Default::default()
        };
        let snapshot = build_snapshot(&station(), parts, now).unwrap();
        let (_, html) = render_from(&snapshot);

        assert!(html.contains("甲府の暑さ指数"));
        assert!(html.contains("24.5°C"));
        assert!(html.contains("注意"));
        assert!(html.contains("観測時刻: 2024/6/24 15:00"));
        assert!(html.contains("<svg"));
        assert!(html.contains("content=\"1800\""));
    }

    #[test]
    fn error_page_has_retry_and_no_chart() {
        let snapshot = fallback_snapshot(&station(), "FetchError::Status: http status 403", jst().with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap());
        let (dashboard, html) = render_from(&snapshot);

        assert!(matches!(dashboard.state(), ViewState::Errored(_)));
        assert!(html.contains("retry-button"));
        assert!(html.contains("http status 403"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn markup_in_location_is_escaped() {
        let mut station = station();
        station.location = "<b>甲府</b>".to_string();
        let now = jst().with_ymd_and_hms(2024, 6, 24, 15, 0, 0).unwrap();
        let parts = SourceParts {
            prediction: PredictionData {
                available: true,
                update_time: None,
                predictions: vec![PredictionPoint { time: "2024062415".to_string(), wbgt: 18.0 }],
            },
            ..Default::default()
        };
        let (_, html) = render_from(&build_snapshot(&station, parts, now).unwrap());

        assert!(html.contains("&lt;b&gt;甲府&lt;/b&gt;"));
    }
}
