pub mod chart;
pub mod page;

use log::{info, warn};
use thiserror::Error;
use crate::dashboard::chart::ForecastChart;
use crate::errors::StorageError;
use crate::models::snapshot::Snapshot;
use crate::parsers::ParseError;
use crate::storage::load_snapshot;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("スナップショットを読み込めませんでした: {0}")]
    Load(#[from] StorageError),
    #[error("スナップショットの形式が不正です: {0}")]
    Invalid(#[from] ParseError),
    #[error("{0}")]
    Flagged(String),
}

/// Default message for snapshots flagged as errors without a message of their own
const FLAGGED_DEFAULT: &str = "データの取得に失敗しました";

/// What the page currently shows
pub enum ViewState {
    Loading,
    Displayed(Box<Snapshot>),
    Errored(String),
}

/// Presentation state for the page, owns the snapshot being shown and its forecast chart
pub struct Dashboard {
    snapshot_path: String,
    state: ViewState,
    chart: Option<ForecastChart>,
}

impl Dashboard {
    /// Returns a new dashboard in loading state
    ///
    /// # Arguments
    ///
    /// * 'snapshot_path' - snapshot file written by the fetch runs
    pub fn new(snapshot_path: &str) -> Dashboard {
        Dashboard { snapshot_path: snapshot_path.to_string(), state: ViewState::Loading, chart: None }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn chart(&self) -> Option<&ForecastChart> {
        self.chart.as_ref()
    }

    /// Reads the snapshot and moves to displayed or errored. Any previous chart is dropped
    /// before a new one is built so there is never more than one.
    pub fn refresh(&mut self) -> &ViewState {
        self.state = ViewState::Loading;
        self.chart = None;

        self.state = match self.load() {
            Ok(snapshot) => {
                self.chart = snapshot.prediction
                    .as_ref()
                    .and_then(|p| ForecastChart::new(&p.predictions));
                info!("showing {:?} from {}, {} forecast point(s)",
                    snapshot.current_wbgt, snapshot.data_source, self.chart.as_ref().map_or(0, |c| c.bars().len()));
                ViewState::Displayed(Box::new(snapshot))
            },
            Err(e) => {
                warn!("dashboard errored: {}", e);
                ViewState::Errored(e.to_string())
            },
        };

        &self.state
    }

    /// Retry after an error, same as a refresh
    pub fn retry(&mut self) -> &ViewState {
        info!("retrying");
        self.refresh()
    }

    fn load(&self) -> Result<Snapshot, DashboardError> {
        let snapshot = load_snapshot(&self.snapshot_path)?;
        if snapshot.error {
            return Err(DashboardError::Flagged(
                snapshot.error_message.unwrap_or_else(|| FLAGGED_DEFAULT.to_string())));
        }
        snapshot.validate()?;

        Ok(snapshot)
    }
}
