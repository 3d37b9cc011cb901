use std::fmt;
use std::str::FromStr;

use powertools_errors::PowertoolsError;
use serde::{Deserialize, Serialize};

/// CloudWatch metric units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricUnit {
    Seconds,
    Microseconds,
    Milliseconds,
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
    Terabytes,
    Bits,
    Kilobits,
    Megabits,
    Gigabits,
    Terabits,
    Percent,
    Count,
    #[serde(rename = "Bytes/Second")]
    BytesPerSecond,
    #[serde(rename = "Kilobytes/Second")]
    KilobytesPerSecond,
    #[serde(rename = "Megabytes/Second")]
    MegabytesPerSecond,
    #[serde(rename = "Gigabytes/Second")]
    GigabytesPerSecond,
    #[serde(rename = "Terabytes/Second")]
    TerabytesPerSecond,
    #[serde(rename = "Bits/Second")]
    BitsPerSecond,
    #[serde(rename = "Kilobits/Second")]
    KilobitsPerSecond,
    #[serde(rename = "Megabits/Second")]
    MegabitsPerSecond,
    #[serde(rename = "Gigabits/Second")]
    GigabitsPerSecond,
    #[serde(rename = "Terabits/Second")]
    TerabitsPerSecond,
    #[serde(rename = "Count/Second")]
    CountPerSecond,
    #[serde(rename = "None")]
    NoUnit,
}

impl MetricUnit {
    pub const ALL: [MetricUnit; 27] = [
        MetricUnit::Seconds,
        MetricUnit::Microseconds,
        MetricUnit::Milliseconds,
        MetricUnit::Bytes,
        MetricUnit::Kilobytes,
        MetricUnit::Megabytes,
        MetricUnit::Gigabytes,
        MetricUnit::Terabytes,
        MetricUnit::Bits,
        MetricUnit::Kilobits,
        MetricUnit::Megabits,
        MetricUnit::Gigabits,
        MetricUnit::Terabits,
        MetricUnit::Percent,
        MetricUnit::Count,
        MetricUnit::BytesPerSecond,
        MetricUnit::KilobytesPerSecond,
        MetricUnit::MegabytesPerSecond,
        MetricUnit::GigabytesPerSecond,
        MetricUnit::TerabytesPerSecond,
        MetricUnit::BitsPerSecond,
        MetricUnit::KilobitsPerSecond,
        MetricUnit::MegabitsPerSecond,
        MetricUnit::GigabitsPerSecond,
        MetricUnit::TerabitsPerSecond,
        MetricUnit::CountPerSecond,
        MetricUnit::NoUnit,
    ];

    /// The name CloudWatch expects in the EMF `Unit` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricUnit::Seconds => "Seconds",
            MetricUnit::Microseconds => "Microseconds",
            MetricUnit::Milliseconds => "Milliseconds",
            MetricUnit::Bytes => "Bytes",
            MetricUnit::Kilobytes => "Kilobytes",
            MetricUnit::Megabytes => "Megabytes",
            MetricUnit::Gigabytes => "Gigabytes",
            MetricUnit::Terabytes => "Terabytes",
            MetricUnit::Bits => "Bits",
            MetricUnit::Kilobits => "Kilobits",
            MetricUnit::Megabits => "Megabits",
            MetricUnit::Gigabits => "Gigabits",
            MetricUnit::Terabits => "Terabits",
            MetricUnit::Percent => "Percent",
            MetricUnit::Count => "Count",
            MetricUnit::BytesPerSecond => "Bytes/Second",
            MetricUnit::KilobytesPerSecond => "Kilobytes/Second",
            MetricUnit::MegabytesPerSecond => "Megabytes/Second",
            MetricUnit::GigabytesPerSecond => "Gigabytes/Second",
            MetricUnit::TerabytesPerSecond => "Terabytes/Second",
            MetricUnit::BitsPerSecond => "Bits/Second",
            MetricUnit::KilobitsPerSecond => "Kilobits/Second",
            MetricUnit::MegabitsPerSecond => "Megabits/Second",
            MetricUnit::GigabitsPerSecond => "Gigabits/Second",
            MetricUnit::TerabitsPerSecond => "Terabits/Second",
            MetricUnit::CountPerSecond => "Count/Second",
            MetricUnit::NoUnit => "None",
        }
    }
}

impl FromStr for MetricUnit {
    type Err = PowertoolsError;

    /// Accepts the CloudWatch names (`Count/Second`) and the variant names
    /// (`CountPerSecond`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        MetricUnit::ALL
            .iter()
            .find(|unit| unit.as_str() == s || format!("{unit:?}") == s)
            .copied()
            .ok_or_else(|| {
                PowertoolsError::validation_error(format!(
                    "invalid metric unit '{s}', expected one of: {}",
                    MetricUnit::ALL
                        .iter()
                        .map(MetricUnit::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

impl fmt::Display for MetricUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<metrics::Unit> for MetricUnit {
    fn from(unit: metrics::Unit) -> Self {
        match unit {
            metrics::Unit::Count => MetricUnit::Count,
            metrics::Unit::Percent => MetricUnit::Percent,
            metrics::Unit::Seconds => MetricUnit::Seconds,
            metrics::Unit::Milliseconds => MetricUnit::Milliseconds,
            metrics::Unit::Microseconds => MetricUnit::Microseconds,
            metrics::Unit::Bytes => MetricUnit::Bytes,
            metrics::Unit::Kibibytes => MetricUnit::Kilobytes,
            metrics::Unit::Mebibytes => MetricUnit::Megabytes,
            metrics::Unit::Gibibytes => MetricUnit::Gigabytes,
            metrics::Unit::Tebibytes => MetricUnit::Terabytes,
            metrics::Unit::BitsPerSecond => MetricUnit::BitsPerSecond,
            metrics::Unit::KilobitsPerSecond => MetricUnit::KilobitsPerSecond,
            metrics::Unit::MegabitsPerSecond => MetricUnit::MegabitsPerSecond,
            metrics::Unit::GigabitsPerSecond => MetricUnit::GigabitsPerSecond,
            metrics::Unit::TerabitsPerSecond => MetricUnit::TerabitsPerSecond,
            metrics::Unit::CountPerSecond => MetricUnit::CountPerSecond,
            _ => MetricUnit::NoUnit,
        }
    }
}

/// Storage resolution of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MetricResolution {
    /// 60 second granularity.
    #[default]
    Standard,
    /// 1 second granularity.
    High,
}

impl MetricResolution {
    pub fn as_seconds(&self) -> u32 {
        match self {
            MetricResolution::Standard => 60,
            MetricResolution::High => 1,
        }
    }
}
