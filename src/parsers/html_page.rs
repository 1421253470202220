use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta};
use regex::{Captures, Regex};
use scraper::{Html, Selector};
use crate::errors::NoDataError;
use crate::parsers::ParseError;

/// WBGT value and time found on a scraped page
#[derive(Debug, PartialEq)]
pub struct ScrapedValue {
    pub wbgt: f64,
    pub timestamp: DateTime<FixedOffset>,
    pub timestamp_found: bool,
}

/// Extracts WBGT from the heat illness prevention site's HTML pages
///
/// The page layout isn't stable, so instead of relying on element ids the extractor
/// looks for text mentioning WBGT and picks up the number next to it.
pub struct HtmlExtractor {
    table: Selector,
    row: Selector,
    generic: Selector,
    number: Regex,
    date_patterns: [Regex; 2],
    time_only: Regex,
}

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Shape(format!("selector '{}': {}", css, e)))
}

fn mentions_wbgt(text: &str) -> bool {
    text.contains("WBGT") || text.contains("暑さ指数")
}

fn mentions_time(text: &str) -> bool {
    text.contains("時点") || text.contains("更新")
}

fn capture_u32(caps: &Captures, i: usize) -> Option<u32> {
    caps.get(i)?.as_str().parse::<u32>().ok()
}

/// Builds a JST date time, hour 24 is rolled over into the next day
fn to_date_time(date: NaiveDate, hour: u32, minute: u32, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let naive = if hour == 24 && minute == 0 {
        date.checked_add_signed(TimeDelta::days(1))?.and_hms_opt(0, 0, 0)?
    } else {
        date.and_hms_opt(hour, minute, 0)?
    };

    naive.and_local_timezone(offset).single()
}

impl HtmlExtractor {
    pub fn new() -> Result<HtmlExtractor, ParseError> {
        Ok(HtmlExtractor {
            table: selector("table")?,
            row: selector("tr")?,
            generic: selector("div, span, p")?,
            number: Regex::new(r"(\d+\.\d+|\d+)")?,
            date_patterns: [
                Regex::new(r"(\d{4})年(\d{1,2})月(\d{1,2})日\s*(\d{1,2}):(\d{2})")?,
                Regex::new(r"(\d{4})/(\d{1,2})/(\d{1,2})\s+(\d{1,2}):(\d{2})")?,
            ],
            time_only: Regex::new(r"(\d{1,2}):(\d{2})\s*時点")?,
        })
    }

    /// Extracts the WBGT value and, if present, the time it is valid for.
    ///
    /// Table rows are searched first, then generic text elements. When several candidates
    /// mention WBGT the last one in document order is used, for nested elements that is the
    /// innermost one. Without any timestamp on the page the given fetch time is used.
    ///
    /// # Arguments
    ///
    /// * 'html' - the page
    /// * 'now' - time of the fetch
    pub fn extract(&self, html: &str, now: DateTime<FixedOffset>) -> Result<ScrapedValue, NoDataError> {
        let document = Html::parse_document(html);

        let mut wbgt: Option<f64> = None;
        let mut time_texts: Vec<String> = Vec::new();

        for table in document.select(&self.table) {
            let table_text = table.text().collect::<String>();
            if !mentions_wbgt(&table_text) {
                continue;
            }
            for row in table.select(&self.row) {
                let row_text = row.text().collect::<String>();
                let row_text = row_text.trim();
                if mentions_wbgt(row_text) {
                    if let Some(v) = self.first_number(row_text) {
                        wbgt = Some(v);
                    }
                }
                if mentions_time(row_text) {
                    time_texts.push(row_text.to_string());
                }
            }
        }

        if wbgt.is_none() {
            for elem in document.select(&self.generic) {
                let text = elem.text().collect::<String>();
                let text = text.trim();
                if mentions_wbgt(text) {
                    if let Some(v) = self.first_number(text) {
                        wbgt = Some(v);
                    }
                }
            }
        }

        let wbgt = wbgt.ok_or_else(|| NoDataError("WBGT value not found in the scraped data".to_string()))?;

        time_texts.push(document.root_element().text().collect::<String>());
        let timestamp = self.find_timestamp(&time_texts, now);

        Ok(ScrapedValue {
            wbgt,
            timestamp: timestamp.unwrap_or(now),
            timestamp_found: timestamp.is_some(),
        })
    }

    fn first_number(&self, text: &str) -> Option<f64> {
        self.number
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    }

    /// Tries the date patterns in order over all candidate texts, the first hit wins
    fn find_timestamp(&self, texts: &[String], now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let offset = *now.offset();

        for pattern in &self.date_patterns {
            for text in texts {
                if let Some(caps) = pattern.captures(text) {
                    let date = NaiveDate::from_ymd_opt(
                        caps.get(1)?.as_str().parse::<i32>().ok()?,
                        capture_u32(&caps, 2)?,
                        capture_u32(&caps, 3)?,
                    );
                    if let Some(dt) = date.and_then(|d| to_date_time(d, capture_u32(&caps, 4)?, capture_u32(&caps, 5)?, offset)) {
                        return Some(dt);
                    }
                }
            }
        }

        for text in texts {
            if let Some(caps) = self.time_only.captures(text) {
                if let Some(dt) = to_date_time(now.date_naive(), capture_u32(&caps, 1)?, capture_u32(&caps, 2)?, offset) {
                    return Some(dt);
                }
            }
        }

        None
    }
}
