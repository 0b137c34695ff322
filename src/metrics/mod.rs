//! Metric calculators and the collector that runs them over one run's
//! artifacts.

mod calculators;
mod collector;
mod registry;
mod report;
#[cfg(test)]
mod tests;

pub use collector::{CollectOptions, MetricsCollector};
pub use registry::{CalculatorRegistry, ModelRegistry};
pub use report::{MetricEntry, MetricsReport, format_report, title_case};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageRole {
    Original,
    Generated,
}

impl ImageRole {
    pub const ALL: [ImageRole; 2] = [ImageRole::Original, ImageRole::Generated];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Generated => "generated",
        }
    }
}
