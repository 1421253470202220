use std::cmp::Reverse;
use std::collections::BTreeMap;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use crate::models::observation::Observation;
use crate::models::prediction::{PointForecast, PredictionPoint};
use crate::parsers::ParseError;

/// Forecast files hold WBGT multiplied by ten
const PREDICTION_SCALE: f64 = 10.0;

/// First column in forecast files holding a forecast value, the ones before are point and update time
const FIRST_VALUE_COLUMN: usize = 2;

/// Reads all non-blank records from a CSV document without treating any row as header
///
/// # Arguments
///
/// * 'text' - the CSV document
fn read_records(text: &str) -> Result<Vec<StringRecord>, ParseError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().any(|f| !f.is_empty()) {
            records.push(record);
        }
    }

    Ok(records)
}

/// Turns one forecast row into prediction points given the header labels
///
/// Only cells holding a number are kept. Empty cells are hours the forecast doesn't cover and
/// placeholders like `---` are treated the same, as observation files treat them.
///
/// # Arguments
///
/// * 'header' - header record with time labels
/// * 'row' - data record
fn row_to_predictions(header: &StringRecord, row: &StringRecord) -> Result<Vec<PredictionPoint>, ParseError> {
    let mut predictions = Vec::new();

    for (i, value) in row.iter().enumerate().skip(FIRST_VALUE_COLUMN) {
        let Some(raw) = value.parse::<f64>().ok().filter(|v| v.is_finite()) else {
            continue;
        };
        let label = header.get(i)
            .ok_or_else(|| ParseError::Shape(format!("forecast value in column {} has no time label", i)))?;
        if label.len() != 10 || !label.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::Shape(format!("forecast time label '{}' is not YYYYMMDDHH", label)));
        }

        predictions.push(PredictionPoint { time: label.to_string(), wbgt: raw / PREDICTION_SCALE });
    }

    Ok(predictions)
}

fn non_empty(field: Option<&str>) -> Option<String> {
    field.filter(|f| !f.is_empty()).map(|f| f.to_string())
}

/// Parses a per point forecast file. Returns the update time given in the data row (if any)
/// together with the forecast points from the first data row.
///
/// An empty or header only document yields no points.
///
/// # Arguments
///
/// * 'text' - the CSV document
pub fn parse_prediction_csv(text: &str) -> Result<(Option<String>, Vec<PredictionPoint>), ParseError> {
    let records = read_records(text)?;
    if records.len() < 2 {
        return Ok((None, Vec::new()));
    }

    let predictions = row_to_predictions(&records[0], &records[1])?;

    Ok((non_empty(records[1].get(1)), predictions))
}

/// Parses a prefecture wide forecast file, i.e. one row per point sharing the header
///
/// # Arguments
///
/// * 'text' - the CSV document
pub fn parse_prefecture_csv(text: &str) -> Result<Vec<PointForecast>, ParseError> {
    let records = read_records(text)?;
    let mut points = Vec::new();

    if let Some((header, rows)) = records.split_first() {
        for row in rows {
            let point_code = non_empty(row.get(0))
                .ok_or_else(|| ParseError::Shape("forecast row without point code".to_string()))?;
            points.push(PointForecast {
                point_code,
                update_time: non_empty(row.get(1)),
                predictions: row_to_predictions(header, row)?,
            });
        }
    }

    Ok(points)
}

/// Parses an actual or monitor file. The first row is a header, every following row
/// is date, time and WBGT followed by columns we don't use. Missing values, e.g. when
/// a station was down, are kept as rows without a value.
///
/// # Arguments
///
/// * 'text' - the CSV document
pub fn parse_observation_csv(text: &str) -> Result<Vec<Observation>, ParseError> {
    let records = read_records(text)?;
    let mut observations = Vec::new();

    for row in records.iter().skip(1) {
        if row.len() < 2 {
            return Err(ParseError::Shape(format!("observation row has {} field(s), expected date and time", row.len())));
        }

        let wbgt = row.get(2)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite());

        let observation = Observation {
            date: row[0].to_string(),
            time: row[1].to_string(),
            wbgt,
        };
        if observation.date_naive().is_none() || observation.minutes().is_none() {
            return Err(ParseError::Shape(format!("unexpected date/time '{} {}'", &row[0], &row[1])));
        }

        observations.push(observation);
    }

    Ok(observations)
}

/// Returns the latest observation holding a value. Rows are grouped per date and the most recent
/// date with any value wins, within that date the latest time with a value is chosen.
///
/// # Arguments
///
/// * 'observations' - observations as parsed, in any order
pub fn latest_observation(observations: &[Observation]) -> Option<&Observation> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&Observation>> = BTreeMap::new();
    for o in observations {
        if let Some(date) = o.date_naive() {
            by_date.entry(date).or_default().push(o);
        }
    }

    for (_, mut day) in by_date.into_iter().rev() {
        day.sort_by_key(|o| Reverse(o.minutes().unwrap_or(0)));
        if let Some(o) = day.into_iter().find(|o| o.wbgt.is_some()) {
            return Some(o);
        }
    }

    None
}
