//! Shared agent state: sysinfo handles, CPU counter baseline and the sample history.

use std::sync::Arc;
use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, Networks, RefreshKind, System};
use tokio::sync::{Mutex, RwLock};

use crate::config::AgentConfig;
use crate::history::History;
use crate::metrics::CpuTimes;

pub type SharedSystem = Arc<Mutex<System>>;
pub type SharedNetworks = Arc<Mutex<Networks>>;
pub type SharedDisks = Arc<Mutex<Disks>>;
pub type SharedHistory = Arc<RwLock<History>>;

#[derive(Clone)]
pub struct AppState {
    // Persistent sysinfo handles
    pub sys: SharedSystem,
    pub networks: SharedNetworks,
    pub disks: SharedDisks,
    // Counters from the previous tick, for CPU deltas
    pub cpu_prev: Arc<Mutex<Option<CpuTimes>>>,

    pub history: SharedHistory,
    pub instance_id: String,
    pub auth_token: Option<String>,
}

impl AppState {
    pub fn new(config: &AgentConfig) -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything());
        Self {
            sys: Arc::new(Mutex::new(System::new_with_specifics(refresh_kind))),
            networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
            cpu_prev: Arc::new(Mutex::new(None)),
            history: Arc::new(RwLock::new(History::new(
                config.retention,
                config.history_cap(),
            ))),
            instance_id: config.instance_id.clone(),
            auth_token: config.auth_token.clone(),
        }
    }
}
