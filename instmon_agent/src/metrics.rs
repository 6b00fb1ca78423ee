//! Sample collection using sysinfo (and /proc/stat on Linux) for instmon_agent.

use chrono::Utc;
use instmon::types::{CpuBreakdown, CpuStats, DiskDevice, MemoryStats, NetworkInterface};
use instmon::RawSample;
use once_cell::sync::OnceCell;
use std::collections::{HashMap, HashSet};
#[cfg(target_os = "linux")]
use std::fs;
#[cfg(target_os = "linux")]
use std::io;
use tracing::warn;

use crate::state::AppState;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

pub fn host_name() -> &'static str {
    static NAME: OnceCell<String> = OnceCell::new();
    NAME.get_or_init(|| {
        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "localhost".into())
    })
}

/// Aggregate CPU jiffies from the first line of /proc/stat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    /// "cpu  user nice system idle iowait irq softirq steal ..."
    pub fn parse(line: &str) -> Option<Self> {
        let mut it = line.split_whitespace();
        if it.next()? != "cpu" {
            return None;
        }
        let mut f = [0u64; 8];
        for (i, tok) in it.take(8).enumerate() {
            f[i] = tok.parse().ok()?;
        }
        Some(Self {
            user: f[0],
            nice: f[1],
            system: f[2],
            idle: f[3],
            iowait: f[4],
            irq: f[5],
            softirq: f[6],
            steal: f[7],
        })
    }

    fn total(&self) -> u64 {
        self.user
            .saturating_add(self.nice)
            .saturating_add(self.system)
            .saturating_add(self.idle)
            .saturating_add(self.iowait)
            .saturating_add(self.irq)
            .saturating_add(self.softirq)
            .saturating_add(self.steal)
    }

    /// Percentages over the interval since `prev` (since boot when `None`).
    /// Returns the breakdown and the busy share (`100 - idle - iowait`).
    pub fn breakdown_since(&self, prev: Option<&CpuTimes>) -> (CpuBreakdown, f64) {
        let base = prev.copied().unwrap_or_default();
        let d = |now: u64, then: u64| now.saturating_sub(then) as f64;
        let total = d(self.total(), base.total());
        if total <= 0.0 {
            return (
                CpuBreakdown {
                    idle: Some(100.0),
                    iowait: Some(0.0),
                    system: Some(0.0),
                    user: Some(0.0),
                },
                0.0,
            );
        }
        let pct = |v: f64| v * 100.0 / total;
        let user = pct(d(self.user, base.user) + d(self.nice, base.nice));
        let system = pct(
            d(self.system, base.system)
                + d(self.irq, base.irq)
                + d(self.softirq, base.softirq)
                + d(self.steal, base.steal),
        );
        let idle = pct(d(self.idle, base.idle));
        let iowait = pct(d(self.iowait, base.iowait));
        let busy = (100.0 - idle - iowait).max(0.0);
        (
            CpuBreakdown {
                idle: Some(idle),
                iowait: Some(iowait),
                system: Some(system),
                user: Some(user),
            },
            busy,
        )
    }
}

#[cfg(target_os = "linux")]
fn read_cpu_times() -> io::Result<CpuTimes> {
    let s = fs::read_to_string("/proc/stat")?;
    s.lines()
        .next()
        .and_then(CpuTimes::parse)
        .ok_or_else(|| io::Error::other("no cpu line"))
}

#[cfg(target_os = "linux")]
async fn collect_cpu(state: &AppState) -> CpuStats {
    let vcpus = {
        let sys = state.sys.lock().await;
        sys.cpus().len() as u64
    };
    let now = match read_cpu_times() {
        Ok(t) => t,
        Err(e) => {
            warn!("reading /proc/stat failed: {e}");
            return CpuStats {
                cpu_breakdown: None,
                vcpus: Some(vcpus),
                total_usage: None,
            };
        }
    };
    let mut prev = state.cpu_prev.lock().await;
    let (breakdown, busy) = now.breakdown_since(prev.as_ref());
    *prev = Some(now);
    CpuStats {
        cpu_breakdown: Some(breakdown),
        vcpus: Some(vcpus),
        total_usage: Some(busy),
    }
}

// Without /proc/stat only the overall usage is known; report it as user time.
#[cfg(not(target_os = "linux"))]
async fn collect_cpu(state: &AppState) -> CpuStats {
    let mut sys = state.sys.lock().await;
    sys.refresh_cpu_usage();
    let usage = f64::from(sys.global_cpu_usage()).clamp(0.0, 100.0);
    CpuStats {
        cpu_breakdown: Some(CpuBreakdown {
            idle: Some(100.0 - usage),
            iowait: Some(0.0),
            system: Some(0.0),
            user: Some(usage),
        }),
        vcpus: Some(sys.cpus().len() as u64),
        total_usage: Some(usage),
    }
}

pub fn memory_stats(total_bytes: u64, available_bytes: u64) -> MemoryStats {
    let available = available_bytes.min(total_bytes);
    let used = total_bytes - available;
    let usage_percent = if total_bytes > 0 {
        used as f64 / total_bytes as f64 * 100.0
    } else {
        0.0
    };
    MemoryStats {
        used_memory_gb: Some(used as f64 / BYTES_PER_GIB),
        available_memory_gb: Some(available as f64 / BYTES_PER_GIB),
        total_memory_gb: Some(total_bytes as f64 / BYTES_PER_GIB),
        memory_usage_percent: Some(usage_percent),
    }
}

async fn collect_memory(state: &AppState) -> MemoryStats {
    let mut sys = state.sys.lock().await;
    sys.refresh_memory();
    memory_stats(sys.total_memory(), sys.available_memory())
}

async fn collect_networks(state: &AppState) -> Vec<NetworkInterface> {
    let mut nets = state.networks.lock().await;
    nets.refresh(true);
    let mut out: Vec<NetworkInterface> = nets
        .iter()
        // loopback traffic never leaves the instance
        .filter(|(name, _)| name.as_str() != "lo")
        .map(|(name, data)| NetworkInterface {
            interface: Some(name.clone()),
            rx_bytes: Some(data.total_received()),
            tx_bytes: Some(data.total_transmitted()),
            rx_packets: Some(data.total_packets_received()),
            tx_packets: Some(data.total_packets_transmitted()),
            rx_errors: Some(data.total_errors_on_received()),
            tx_errors: Some(data.total_errors_on_transmitted()),
        })
        .collect();
    out.sort_by(|a, b| a.interface.cmp(&b.interface));
    out
}

/// `/dev/vda1` -> `vda1`.
pub fn device_name(raw: &str) -> &str {
    raw.strip_prefix("/dev/").unwrap_or(raw)
}

pub fn usage_percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = (used as f64 / total as f64 * 100.0).min(100.0);
    (pct * 100.0).round() / 100.0
}

/// Completed read and write requests per block device, keyed by name.
///
/// Each `/proc/diskstats` line is
/// `major minor name reads merged sectors ms writes ...`.
pub fn parse_diskstats(text: &str) -> HashMap<String, (u64, u64)> {
    text.lines()
        .filter_map(|line| {
            let f: Vec<&str> = line.split_whitespace().collect();
            let reads = f.get(3)?.parse().ok()?;
            let writes = f.get(7)?.parse().ok()?;
            Some((f.get(2)?.to_string(), (reads, writes)))
        })
        .collect()
}

#[cfg(target_os = "linux")]
fn read_disk_requests() -> HashMap<String, (u64, u64)> {
    match fs::read_to_string("/proc/diskstats") {
        Ok(s) => parse_diskstats(&s),
        Err(e) => {
            warn!("reading /proc/diskstats failed: {e}");
            HashMap::new()
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn read_disk_requests() -> HashMap<String, (u64, u64)> {
    HashMap::new()
}

async fn collect_disks(state: &AppState) -> Vec<DiskDevice> {
    let requests = read_disk_requests();
    let mut disks = state.disks.lock().await;
    disks.refresh(true);
    let mut seen = HashSet::new();
    disks
        .iter()
        .filter_map(|d| {
            let name = d.name().to_string_lossy();
            let device = device_name(&name).to_string();
            // the same device mounted twice is reported once
            if device.is_empty() || !seen.insert(device.clone()) {
                return None;
            }
            let usage = d.usage();
            let total = d.total_space();
            let used = total.saturating_sub(d.available_space());
            let reqs = requests.get(&device).copied();
            Some(DiskDevice {
                read_bytes: Some(usage.total_read_bytes),
                write_bytes: Some(usage.total_written_bytes),
                read_requests: reqs.map(|(r, _)| r),
                write_requests: reqs.map(|(_, w)| w),
                total_size: Some(total),
                used_size: Some(used),
                usage_percent: Some(usage_percent(used, total)),
                device,
            })
        })
        .collect()
}

/// Take one sample of the local host.
pub async fn collect_sample(state: &AppState) -> RawSample {
    let cpu = collect_cpu(state).await;
    let memory = collect_memory(state).await;
    let network = collect_networks(state).await;
    let disk = collect_disks(state).await;
    RawSample {
        timestamp: Utc::now(),
        instance_name: Some(host_name().to_string()),
        server_id: Some(state.instance_id.clone()),
        cpu: Some(cpu),
        memory: Some(memory),
        network: Some(network),
        disk: Some(disk),
    }
}
