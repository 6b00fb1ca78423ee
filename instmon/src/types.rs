//! Types that mirror the agent's JSON schema.
//!
//! Numeric leaves are lenient: absent, `null` or non-numeric values decode to
//! `None` and count as 0 downstream. The four per-sample containers (`cpu`,
//! `memory`, `network`, `disk`) must be present as keys; a `null` value is
//! accepted, a missing key or a value of the wrong shape fails the decode.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PayloadError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPayload {
    pub metrics: Vec<RawSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub timestamp: Option<String>,
}

impl RawPayload {
    pub fn new(metrics: Vec<RawSample>) -> Self {
        Self {
            metrics,
            latest: None,
            timestamp: None,
        }
    }

    /// Decode a payload, rejecting structural violations.
    pub fn from_json(text: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, PayloadError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub timestamp: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub instance_name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub server_id: Option<String>,
    #[serde(deserialize_with = "present")]
    pub cpu: Option<CpuStats>,
    #[serde(deserialize_with = "present")]
    pub memory: Option<MemoryStats>,
    #[serde(deserialize_with = "present")]
    pub network: Option<Vec<NetworkInterface>>,
    #[serde(deserialize_with = "present")]
    pub disk: Option<Vec<DiskDevice>>,
}

impl RawSample {
    /// A sample with every container present but empty.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            instance_name: None,
            server_id: None,
            cpu: Some(CpuStats::default()),
            memory: Some(MemoryStats::default()),
            network: Some(Vec::new()),
            disk: Some(Vec::new()),
        }
    }

    pub fn networks(&self) -> &[NetworkInterface] {
        self.network.as_deref().unwrap_or_default()
    }

    pub fn disks(&self) -> &[DiskDevice] {
        self.disk.as_deref().unwrap_or_default()
    }

    pub fn breakdown(&self) -> Option<&CpuBreakdown> {
        self.cpu.as_ref().and_then(|c| c.cpu_breakdown.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuStats {
    #[serde(default)]
    pub cpu_breakdown: Option<CpuBreakdown>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_u64"
    )]
    pub vcpus: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_f64"
    )]
    pub total_usage: Option<f64>,
}

/// Percentages of CPU time spent in each state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuBreakdown {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub idle: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub iowait: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub system: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub user: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub used_memory_gb: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub available_memory_gb: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_f64"
    )]
    pub total_memory_gb: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_f64"
    )]
    pub memory_usage_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInterface {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub interface: Option<String>,
    // cumulative counters; the normalizer reports them as-is, fractions truncated
    #[serde(default, deserialize_with = "lenient_u64")]
    pub rx_bytes: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub tx_bytes: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_u64"
    )]
    pub rx_packets: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_u64"
    )]
    pub tx_packets: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_u64"
    )]
    pub rx_errors: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_u64"
    )]
    pub tx_errors: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskDevice {
    /// Missing or null identifiers decode to the empty string.
    #[serde(default, deserialize_with = "device_id")]
    pub device: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub read_bytes: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub write_bytes: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_u64"
    )]
    pub read_requests: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_u64"
    )]
    pub write_requests: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_u64"
    )]
    pub total_size: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_u64"
    )]
    pub used_size: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_f64"
    )]
    pub usage_percent: Option<f64>,
}

// With a custom deserializer serde no longer treats a missing Option field as
// None, so the key is required while `null` is still accepted.
fn present<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d)
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(v.and_then(|v| v.as_f64()).filter(|f| f.is_finite()))
}

// Counters are whole numbers: a fractional value is truncated toward zero,
// a negative or non-finite one decodes as `None`.
fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(v.and_then(|v| {
        v.as_u64().or_else(|| {
            v.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        })
    }))
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match v {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

fn device_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(lenient_string(d)?.unwrap_or_default())
}

/// Parse RFC 3339, or a naive ISO-8601 date-time taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let s = String::deserialize(d)?;
    parse_timestamp(&s)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {s:?}")))
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json(body: &str) -> String {
        format!(r#"{{"metrics":[{{"timestamp":"2024-05-01T12:00:00Z",{body}}}]}}"#)
    }

    #[test]
    fn null_containers_are_accepted() {
        let text = sample_json(r#""cpu":null,"memory":null,"network":null,"disk":null"#);
        let payload = RawPayload::from_json(&text).unwrap();
        let s = &payload.metrics[0];
        assert!(s.cpu.is_none() && s.memory.is_none());
        assert!(s.networks().is_empty() && s.disks().is_empty());
    }

    #[test]
    fn missing_container_key_is_structural() {
        let text = sample_json(r#""cpu":{},"memory":{},"network":[]"#);
        let err = RawPayload::from_json(&text).unwrap_err();
        assert!(err.to_string().contains("disk"), "{err}");
    }

    #[test]
    fn wrong_container_shape_is_structural() {
        let text = sample_json(r#""cpu":{},"memory":{},"network":{"rx_bytes":1},"disk":[]"#);
        assert!(RawPayload::from_json(&text).is_err());
        assert!(RawPayload::from_json(r#"{"metrics":{}}"#).is_err());
        assert!(RawPayload::from_json(r#"{"latest":true}"#).is_err());
    }

    #[test]
    fn leaves_are_lenient() {
        let text = sample_json(
            r#""cpu":{"cpu_breakdown":{"idle":"n/a","user":null,"system":12.5}},
               "memory":{"used_memory_gb":true},
               "network":[{"rx_bytes":1500.0,"tx_bytes":-3}],
               "disk":[{"read_bytes":7}]"#,
        );
        let payload = RawPayload::from_json(&text).unwrap();
        let s = &payload.metrics[0];
        let b = s.breakdown().unwrap();
        assert_eq!(b.idle, None);
        assert_eq!(b.user, None);
        assert_eq!(b.iowait, None);
        assert_eq!(b.system, Some(12.5));
        assert_eq!(s.memory.as_ref().unwrap().used_memory_gb, None);
        assert_eq!(s.networks()[0].rx_bytes, Some(1500));
        assert_eq!(s.networks()[0].tx_bytes, None);
        assert_eq!(s.disks()[0].device, "");
        assert_eq!(s.disks()[0].read_bytes, Some(7));
    }

    #[test]
    fn naive_and_offset_timestamps() {
        let naive = parse_timestamp("2024-05-01T12:00:00.250000").unwrap();
        let zulu = parse_timestamp("2024-05-01T12:00:00.250Z").unwrap();
        assert_eq!(naive, zulu);
        let offset = parse_timestamp("2024-05-01T14:00:00+02:00").unwrap();
        assert_eq!(offset, parse_timestamp("2024-05-01T12:00:00").unwrap());
        assert!(parse_timestamp("yesterday").is_none());

        let text = r#"{"metrics":[{"timestamp":"soon","cpu":{},"memory":{},"network":[],"disk":[]}]}"#;
        assert!(RawPayload::from_json(text).is_err());
    }

    #[test]
    fn agent_output_decodes_back() {
        let mut s = RawSample::empty(parse_timestamp("2024-05-01T12:00:00Z").unwrap());
        s.instance_name = Some("web-1".into());
        s.disk = Some(vec![DiskDevice {
            device: "vda".into(),
            read_bytes: Some(10),
            write_bytes: Some(20),
            ..Default::default()
        }]);
        let json = serde_json::to_string(&RawPayload::new(vec![s.clone()])).unwrap();
        let back = RawPayload::from_json(&json).unwrap();
        assert_eq!(back.metrics, vec![s]);
    }

    #[test]
    fn disk_request_counts_survive_reserialization() {
        let text = r#"{"metrics":[{"timestamp":"2024-05-01T12:00:00","cpu":{},"memory":{},"network":[],
            "disk":[{"device":"vda","read_bytes":1,"write_bytes":2,"read_requests":7,"write_requests":"?"}]}]}"#;
        let payload = RawPayload::from_json(text).unwrap();
        let d = &payload.metrics[0].disks()[0];
        assert_eq!(d.read_requests, Some(7));
        assert_eq!(d.write_requests, None);

        let v = serde_json::to_value(&payload).unwrap();
        let disk = &v["metrics"][0]["disk"][0];
        assert_eq!(disk["read_requests"], 7);
        assert!(disk.get("write_requests").is_none());
    }
}
