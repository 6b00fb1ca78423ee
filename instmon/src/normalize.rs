//! Flattens nested per-sample metrics into uniform chart rows.
//!
//! Every sample yields ten rows, in [`Category::ALL`] order. CPU values are
//! passed through as percentages, memory as GB, network byte counters are
//! summed across interfaces and reported in KB (1 KB = 1e3 bytes), and the
//! selected disk's byte counters in MB (1 MB = 1e6 bytes).

use crate::error::PayloadError;
use crate::series::{Category, DataPoint, DiskDeviceSet, MetricsSeries};
use crate::types::{RawPayload, RawSample};

const BYTES_PER_KB: f64 = 1e3;
const BYTES_PER_MB: f64 = 1e6;

/// Normalize `samples` against `selected_disk`.
pub fn normalize(samples: &[RawSample], selected_disk: &str) -> (MetricsSeries, DiskDeviceSet) {
    (transform(samples, selected_disk), device_set(samples))
}

/// Decode a JSON payload and normalize it.
pub fn normalize_json(
    text: &str,
    selected_disk: &str,
) -> Result<(MetricsSeries, DiskDeviceSet), PayloadError> {
    let payload = RawPayload::from_json(text)?;
    Ok(normalize(&payload.metrics, selected_disk))
}

/// Device identifiers of the first sample only.
// TODO: decide whether devices that only appear in later samples should be offered.
pub fn device_set(samples: &[RawSample]) -> DiskDeviceSet {
    samples
        .first()
        .map(|s| s.disks().iter().map(|d| d.device.clone()).collect::<Vec<_>>())
        .unwrap_or_default()
        .into()
}

pub fn transform(samples: &[RawSample], selected_disk: &str) -> MetricsSeries {
    let mut points = Vec::with_capacity(samples.len() * Category::ALL.len());
    for sample in samples {
        push_sample(&mut points, sample, selected_disk);
    }
    points.into()
}

fn push_sample(out: &mut Vec<DataPoint>, s: &RawSample, selected_disk: &str) {
    let ts = s.timestamp;

    let cpu = s.breakdown();
    let idle = cpu.and_then(|c| c.idle).unwrap_or(0.0);
    let iowait = cpu.and_then(|c| c.iowait).unwrap_or(0.0);
    let system = cpu.and_then(|c| c.system).unwrap_or(0.0);
    let user = cpu.and_then(|c| c.user).unwrap_or(0.0);

    let mem = s.memory.as_ref();
    let used = mem.and_then(|m| m.used_memory_gb).unwrap_or(0.0);
    let free = mem.and_then(|m| m.available_memory_gb).unwrap_or(0.0);

    let rx_total: u128 = s
        .networks()
        .iter()
        .map(|n| u128::from(n.rx_bytes.unwrap_or(0)))
        .sum();
    let tx_total: u128 = s
        .networks()
        .iter()
        .map(|n| u128::from(n.tx_bytes.unwrap_or(0)))
        .sum();

    let disk = s.disks().iter().find(|d| d.device == selected_disk);
    let read = disk.and_then(|d| d.read_bytes).unwrap_or(0);
    let write = disk.and_then(|d| d.write_bytes).unwrap_or(0);

    out.extend([
        DataPoint::new(ts, Category::Idle, idle),
        DataPoint::new(ts, Category::IoWait, iowait),
        DataPoint::new(ts, Category::System, system),
        DataPoint::new(ts, Category::User, user),
        DataPoint::new(ts, Category::MemoryUsed, used),
        DataPoint::new(ts, Category::MemoryFree, free),
        DataPoint::new(ts, Category::NetworkReceive, rx_total as f64 / BYTES_PER_KB),
        DataPoint::new(ts, Category::NetworkTransmit, tx_total as f64 / BYTES_PER_KB),
        DataPoint::new(ts, Category::DiskRead, read as f64 / BYTES_PER_MB),
        DataPoint::new(ts, Category::DiskWrite, write as f64 / BYTES_PER_MB),
    ]);
}
