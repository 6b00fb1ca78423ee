//! Caller-side state for one monitored instance: current disk selection and
//! the last normalized fetch.

use std::future::Future;

use tracing::debug;

use crate::error::{PayloadError, RefreshError};
use crate::interval::TimeInterval;
use crate::normalize::{device_set, transform};
use crate::selection::DiskSelection;
use crate::series::{ChartGroup, DataPoint, DiskDeviceSet, MetricsSeries};
use crate::types::RawPayload;

/// Where payloads come from. Retries, timeouts and cancellation of stale
/// requests belong to the implementation.
///
/// Sources hand back the undecoded JSON body; decoding happens in
/// [`Monitor::refresh`] so a malformed body surfaces as
/// [`RefreshError::Payload`] rather than as a transport failure.
pub trait MetricsSource {
    type Error: std::error::Error + 'static;

    fn fetch_metrics(
        &mut self,
        subject_id: &str,
        interval: TimeInterval,
    ) -> impl Future<Output = Result<Vec<u8>, Self::Error>>;
}

#[derive(Debug, Clone, Default)]
pub struct Monitor {
    subject_id: String,
    interval: TimeInterval,
    selection: DiskSelection,
    devices: DiskDeviceSet,
    series: MetricsSeries,
}

impl Monitor {
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            ..Self::default()
        }
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn interval(&self) -> TimeInterval {
        self.interval
    }

    /// Takes effect on the next fetch.
    pub fn set_interval(&mut self, interval: TimeInterval) {
        self.interval = interval;
    }

    pub fn selected_disk(&self) -> &str {
        self.selection.current()
    }

    /// Disk rows follow the new device from the next `apply`/`refresh`.
    pub fn select_disk(&mut self, device: impl Into<String>) {
        self.selection.select(device);
    }

    pub fn devices(&self) -> &DiskDeviceSet {
        &self.devices
    }

    pub fn series(&self) -> &MetricsSeries {
        &self.series
    }

    pub fn chart(&self, group: ChartGroup) -> impl Iterator<Item = &DataPoint> + '_ {
        self.series.for_group(group)
    }

    /// Replace state with a freshly fetched payload. The selection is
    /// re-resolved against the new devices before disk rows are built.
    pub fn apply(&mut self, payload: &RawPayload) {
        let devices = device_set(&payload.metrics);
        self.selection.resolve(&devices);
        self.series = transform(&payload.metrics, self.selection.current());
        self.devices = devices;
        debug!(
            subject = %self.subject_id,
            samples = payload.metrics.len(),
            rows = self.series.len(),
            disk = self.selection.current(),
            "metrics applied"
        );
    }

    /// Decode and apply. On a structural error nothing is replaced.
    pub fn apply_json(&mut self, text: &str) -> Result<(), PayloadError> {
        let payload = RawPayload::from_json(text).inspect_err(|e| {
            debug!(subject = %self.subject_id, error = %e, "rejected metrics payload");
        })?;
        self.apply(&payload);
        Ok(())
    }

    /// One fetch cycle against `source`. On failure nothing is replaced.
    pub async fn refresh<S: MetricsSource>(
        &mut self,
        source: &mut S,
    ) -> Result<(), RefreshError<S::Error>> {
        let body = source
            .fetch_metrics(&self.subject_id, self.interval)
            .await
            .map_err(RefreshError::Transport)?;
        let payload = RawPayload::from_slice(&body).inspect_err(|e| {
            debug!(subject = %self.subject_id, error = %e, "rejected metrics payload");
        })?;
        self.apply(&payload);
        Ok(())
    }
}
