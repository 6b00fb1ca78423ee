//! Flat chart rows and the chart groups the rendering layer filters them by.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Idle,
    #[serde(rename = "IO Wait")]
    IoWait,
    System,
    User,
    #[serde(rename = "Memory Used")]
    MemoryUsed,
    #[serde(rename = "Memory Free")]
    MemoryFree,
    #[serde(rename = "Network Receive")]
    NetworkReceive,
    #[serde(rename = "Network Transmit")]
    NetworkTransmit,
    #[serde(rename = "Disk Read")]
    DiskRead,
    #[serde(rename = "Disk Write")]
    DiskWrite,
}

impl Category {
    /// Emission order within one sample.
    pub const ALL: [Category; 10] = [
        Category::Idle,
        Category::IoWait,
        Category::System,
        Category::User,
        Category::MemoryUsed,
        Category::MemoryFree,
        Category::NetworkReceive,
        Category::NetworkTransmit,
        Category::DiskRead,
        Category::DiskWrite,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Idle => "Idle",
            Category::IoWait => "IO Wait",
            Category::System => "System",
            Category::User => "User",
            Category::MemoryUsed => "Memory Used",
            Category::MemoryFree => "Memory Free",
            Category::NetworkReceive => "Network Receive",
            Category::NetworkTransmit => "Network Transmit",
            Category::DiskRead => "Disk Read",
            Category::DiskWrite => "Disk Write",
        }
    }

    pub fn unit(self) -> Unit {
        self.group().unit()
    }

    pub fn group(self) -> ChartGroup {
        match self {
            Category::Idle | Category::IoWait | Category::System | Category::User => {
                ChartGroup::Cpu
            }
            Category::MemoryUsed | Category::MemoryFree => ChartGroup::Memory,
            Category::NetworkReceive | Category::NetworkTransmit => ChartGroup::Network,
            Category::DiskRead | Category::DiskWrite => ChartGroup::Disk,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Unit {
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "GB")]
    Gb,
    #[serde(rename = "KB")]
    Kb,
    #[serde(rename = "MB")]
    Mb,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Percent => "%",
            Unit::Gb => "GB",
            Unit::Kb => "KB",
            Unit::Mb => "MB",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The four chart views: CPU, memory, network, disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartGroup {
    Cpu,
    Memory,
    Network,
    Disk,
}

impl ChartGroup {
    pub const ALL: [ChartGroup; 4] = [
        ChartGroup::Cpu,
        ChartGroup::Memory,
        ChartGroup::Network,
        ChartGroup::Disk,
    ];

    pub fn categories(self) -> &'static [Category] {
        match self {
            ChartGroup::Cpu => &Category::ALL[0..4],
            ChartGroup::Memory => &Category::ALL[4..6],
            ChartGroup::Network => &Category::ALL[6..8],
            ChartGroup::Disk => &Category::ALL[8..10],
        }
    }

    pub fn unit(self) -> Unit {
        match self {
            ChartGroup::Cpu => Unit::Percent,
            ChartGroup::Memory => Unit::Gb,
            ChartGroup::Network => Unit::Kb,
            ChartGroup::Disk => Unit::Mb,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartGroup::Cpu => "CPU Usage (%)",
            ChartGroup::Memory => "Memory Usage (GB)",
            ChartGroup::Network => "Network Traffic (KB)",
            ChartGroup::Disk => "Disk I/O (MB)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub category: Category,
    pub value: f64,
    pub unit: Unit,
}

impl DataPoint {
    pub fn new(timestamp: DateTime<Utc>, category: Category, value: f64) -> Self {
        Self {
            timestamp,
            category,
            value,
            unit: category.unit(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricsSeries(Vec<DataPoint>);

impl MetricsSeries {
    pub fn points(&self) -> &[DataPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataPoint> {
        self.0.iter()
    }

    pub fn for_category(&self, category: Category) -> impl Iterator<Item = &DataPoint> + '_ {
        self.0.iter().filter(move |p| p.category == category)
    }

    /// Rows belonging to one chart, in series order.
    pub fn for_group(&self, group: ChartGroup) -> impl Iterator<Item = &DataPoint> + '_ {
        self.0.iter().filter(move |p| p.category.group() == group)
    }
}

impl From<Vec<DataPoint>> for MetricsSeries {
    fn from(points: Vec<DataPoint>) -> Self {
        Self(points)
    }
}

impl<'a> IntoIterator for &'a MetricsSeries {
    type Item = &'a DataPoint;
    type IntoIter = std::slice::Iter<'a, DataPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Disk device identifiers offered for selection, in payload order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiskDeviceSet(Vec<String>);

impl DiskDeviceSet {
    pub fn contains(&self, device: &str) -> bool {
        self.0.iter().any(|d| d == device)
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for DiskDeviceSet {
    fn from(devices: Vec<String>) -> Self {
        Self(devices)
    }
}
