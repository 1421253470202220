use std::fmt;
use serde::{Deserialize, Serialize};

/// Lower bound of the caution band
const CAUTION_FROM: f64 = 21.0;

/// Lower bound of the warning band
const WARNING_FROM: f64 = 25.0;

/// Lower bound of the danger (severe warning) band
const DANGER_FROM: f64 = 28.0;

/// Lower bound of the extreme danger band
const EXTREME_FROM: f64 = 31.0;

/// Heat stress risk bands as published by the Ministry of the Environment.
/// Bands are half-open, a value equal to a lower bound belongs to the higher band.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Safe,
    Caution,
    Warning,
    Danger,
    Extreme,
}

impl Band {
    /// Classifies a WBGT value
    ///
    /// # Arguments
    ///
    /// * 'wbgt' - WBGT in degrees Celsius
    pub fn classify(wbgt: f64) -> Band {
        if wbgt < CAUTION_FROM {
            Band::Safe
        } else if wbgt < WARNING_FROM {
            Band::Caution
        } else if wbgt < DANGER_FROM {
            Band::Warning
        } else if wbgt < EXTREME_FROM {
            Band::Danger
        } else {
            Band::Extreme
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Band::Safe    => "ほぼ安全",
            Band::Caution => "注意",
            Band::Warning => "警戒",
            Band::Danger  => "厳重警戒",
            Band::Extreme => "危険",
        }
    }

    /// Color tag, also used as css class name on the page
    pub fn color(&self) -> &'static str {
        match self {
            Band::Safe    => "green",
            Band::Caution => "yellow",
            Band::Warning => "orange",
            Band::Danger  => "red",
            Band::Extreme => "darkred",
        }
    }

    /// Fill color used in the forecast chart
    pub fn hex(&self) -> &'static str {
        match self {
            Band::Safe    => "#218cff",
            Band::Caution => "#a0d2ff",
            Band::Warning => "#faf500",
            Band::Danger  => "#ff9600",
            Band::Extreme => "#ff2800",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Band::Safe    => "通常は熱中症の危険は小さいが、適宜水分・塩分の補給は必要です。市民マラソンなどではこの条件でも熱中症が発生するので注意してください。",
            Band::Caution => "一般に危険性は少ないが、激しい運動や重労働時には熱中症が発生する危険性があります。運動の合間に積極的に水分・塩分を補給してください。",
            Band::Warning => "運動や激しい作業をする際は定期的に充分に休息を取り入れてください。",
            Band::Danger  => "外出時は炎天下を避け、室内では室温の上昇に注意してください。激しい運動は中止しましょう。",
            Band::Extreme => "高齢者においては安静状態でも発生する危険性が大きいです。外出はなるべく避け、涼しい室内に移動してください。",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
