//! Library for turning per-instance metrics payloads into chart-ready series.

pub mod error;
pub mod interval;
pub mod monitor;
pub mod normalize;
pub mod selection;
pub mod series;
pub mod types;

pub use error::{IntervalError, PayloadError, RefreshError};
pub use interval::TimeInterval;
pub use monitor::{MetricsSource, Monitor};
pub use normalize::{device_set, normalize, normalize_json, transform};
pub use selection::DiskSelection;
pub use series::{Category, ChartGroup, DataPoint, DiskDeviceSet, MetricsSeries, Unit};
pub use types::{RawPayload, RawSample};
