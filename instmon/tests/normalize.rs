//! Normalization properties over hand-built payloads.

use instmon::types::{CpuBreakdown, CpuStats, DiskDevice, MemoryStats, NetworkInterface};
use instmon::{
    device_set, normalize, normalize_json, Category, ChartGroup, RawPayload, RawSample, Unit,
};

fn ts(minute: u32) -> chrono::DateTime<chrono::Utc> {
    instmon::types::parse_timestamp(&format!("2024-05-01T12:{minute:02}:00Z")).unwrap()
}

fn nic(rx: u64, tx: u64) -> NetworkInterface {
    NetworkInterface {
        rx_bytes: Some(rx),
        tx_bytes: Some(tx),
        ..Default::default()
    }
}

fn disk(device: &str, read: u64, write: u64) -> DiskDevice {
    DiskDevice {
        device: device.into(),
        read_bytes: Some(read),
        write_bytes: Some(write),
        ..Default::default()
    }
}

fn sample(minute: u32, nets: Vec<NetworkInterface>, disks: Vec<DiskDevice>) -> RawSample {
    RawSample {
        cpu: Some(CpuStats {
            cpu_breakdown: Some(CpuBreakdown {
                idle: Some(50.0),
                iowait: Some(5.0),
                system: Some(10.0),
                user: Some(35.0),
            }),
            ..Default::default()
        }),
        memory: Some(MemoryStats {
            used_memory_gb: Some(2.0),
            available_memory_gb: Some(6.0),
            ..Default::default()
        }),
        network: Some(nets),
        disk: Some(disks),
        ..RawSample::empty(ts(minute))
    }
}

fn value(rows: &[instmon::DataPoint], category: Category) -> f64 {
    rows.iter()
        .find(|p| p.category == category)
        .map(|p| p.value)
        .unwrap()
}

#[test]
fn empty_samples_give_empty_outputs() {
    let (series, devices) = normalize(&[], "sda");
    assert!(series.is_empty());
    assert!(devices.is_empty());
}

#[test]
fn ten_rows_per_sample_in_fixed_order() {
    let samples: Vec<RawSample> = (0..3)
        .map(|m| sample(m, vec![nic(1, 2)], vec![disk("sda", 1, 2)]))
        .collect();
    let (series, _) = normalize(&samples, "sda");
    assert_eq!(series.len(), 10 * samples.len());
    for (i, chunk) in series.points().chunks(10).enumerate() {
        let cats: Vec<Category> = chunk.iter().map(|p| p.category).collect();
        assert_eq!(cats, Category::ALL.to_vec());
        assert!(chunk.iter().all(|p| p.timestamp == ts(i as u32)));
    }
}

#[test]
fn reference_scenario() {
    let text = r#"{"metrics":[{
        "timestamp":"2024-05-01T12:00:00Z",
        "cpu":{"cpu_breakdown":{"idle":50,"iowait":5,"system":10,"user":35}},
        "memory":{"used_memory_gb":2,"available_memory_gb":6},
        "network":[{"rx_bytes":1000,"tx_bytes":500}],
        "disk":[{"device":"sda","read_bytes":2000000,"write_bytes":1000000}]
    }]}"#;
    let (series, devices) = normalize_json(text, "sda").unwrap();
    let rows = series.points();

    let idle = &rows[0];
    assert_eq!((idle.category, idle.value, idle.unit), (Category::Idle, 50.0, Unit::Percent));
    let used = series.for_category(Category::MemoryUsed).next().unwrap();
    assert_eq!((used.value, used.unit), (2.0, Unit::Gb));
    let rx = series.for_category(Category::NetworkReceive).next().unwrap();
    assert_eq!((rx.value, rx.unit), (1.0, Unit::Kb));
    assert_eq!(value(rows, Category::NetworkTransmit), 0.5);
    let read = series.for_category(Category::DiskRead).next().unwrap();
    assert_eq!((read.value, read.unit), (2.0, Unit::Mb));
    assert_eq!(value(rows, Category::DiskWrite), 1.0);
    assert_eq!(devices.as_slice(), ["sda".to_string()]);
}

#[test]
fn network_is_summed_across_interfaces_in_kb() {
    let s = sample(0, vec![nic(1_500, 250), nic(2_500, 750), nic(0, 0)], vec![]);
    let (series, _) = normalize(&[s.clone()], "");
    let rows = series.points();
    let rx_sum: u64 = s.networks().iter().map(|n| n.rx_bytes.unwrap()).sum();
    let tx_sum: u64 = s.networks().iter().map(|n| n.tx_bytes.unwrap()).sum();
    assert_eq!(value(rows, Category::NetworkReceive), rx_sum as f64 / 1000.0);
    assert_eq!(value(rows, Category::NetworkTransmit), tx_sum as f64 / 1000.0);
    assert_eq!(value(rows, Category::NetworkReceive), 4.0);
}

#[test]
fn no_interfaces_means_zero_traffic() {
    let (series, _) = normalize(&[sample(0, vec![], vec![])], "");
    assert_eq!(value(series.points(), Category::NetworkReceive), 0.0);
    assert_eq!(value(series.points(), Category::NetworkTransmit), 0.0);
}

#[test]
fn unmatched_disk_reports_zero() {
    let s = sample(0, vec![], vec![disk("vda", 5_000_000, 6_000_000)]);
    let (series, devices) = normalize(&[s], "vdb");
    assert_eq!(value(series.points(), Category::DiskRead), 0.0);
    assert_eq!(value(series.points(), Category::DiskWrite), 0.0);
    assert_eq!(devices.as_slice(), ["vda".to_string()]);
}

#[test]
fn first_matching_disk_wins() {
    let s = sample(
        0,
        vec![],
        vec![disk("vda", 1_000_000, 0), disk("vda", 9_000_000, 0)],
    );
    let (series, devices) = normalize(&[s], "vda");
    assert_eq!(value(series.points(), Category::DiskRead), 1.0);
    // duplicates are reported as they appear
    assert_eq!(devices.len(), 2);
}

#[test]
fn device_set_comes_from_first_sample_only() {
    let samples = vec![
        sample(0, vec![], vec![disk("vda", 0, 0), disk("vdb", 0, 0)]),
        sample(1, vec![], vec![disk("vda", 0, 0), disk("vdc", 0, 0)]),
    ];
    let devices = device_set(&samples);
    assert_eq!(devices.as_slice(), ["vda".to_string(), "vdb".to_string()]);
    assert!(!devices.contains("vdc"));

    // the disk transform still looks at each sample's own list
    let (series, _) = normalize(&samples, "vdc");
    let reads: Vec<f64> = series.for_category(Category::DiskRead).map(|p| p.value).collect();
    assert_eq!(reads, vec![0.0, 0.0]);
}

#[test]
fn missing_and_null_leaves_default_to_zero() {
    let text = r#"{"metrics":[{
        "timestamp":"2024-05-01T12:00:00",
        "cpu":{"cpu_breakdown":{"idle":null}},
        "memory":null,
        "network":[{"rx_bytes":null},{"tx_bytes":2000}],
        "disk":[{"device":"sda"}]
    },{
        "timestamp":"2024-05-01T12:01:00",
        "cpu":null,
        "memory":{},
        "network":null,
        "disk":null
    }]}"#;
    let (series, devices) = normalize_json(text, "sda").unwrap();
    assert_eq!(series.len(), 20);
    assert!(series.iter().all(|p| p.value.is_finite()));
    let nonzero: Vec<_> = series.iter().filter(|p| p.value != 0.0).collect();
    assert_eq!(nonzero.len(), 1);
    assert_eq!(nonzero[0].category, Category::NetworkTransmit);
    assert_eq!(nonzero[0].value, 2.0);
    assert_eq!(devices.as_slice(), ["sda".to_string()]);
}

#[test]
fn fractional_byte_counters_are_truncated() {
    let text = r#"{"metrics":[{
        "timestamp":"2024-05-01T12:00:00Z","cpu":null,"memory":null,
        "network":[{"rx_bytes":1500.5,"tx_bytes":999.9},{"rx_bytes":500.75,"tx_bytes":-3}],
        "disk":[{"device":"vda","read_bytes":2500000.9,"write_bytes":"n/a"}]
    }]}"#;
    let (series, _) = normalize_json(text, "vda").unwrap();
    let rows = series.points();
    assert_eq!(value(rows, Category::NetworkReceive), 2.0);
    assert_eq!(value(rows, Category::NetworkTransmit), 0.999);
    assert_eq!(value(rows, Category::DiskRead), 2.5);
    assert_eq!(value(rows, Category::DiskWrite), 0.0);
}

#[test]
fn structural_errors_fail_the_whole_payload() {
    let missing_memory = r#"{"metrics":[
        {"timestamp":"2024-05-01T12:00:00Z","cpu":{},"memory":{},"network":[],"disk":[]},
        {"timestamp":"2024-05-01T12:01:00Z","cpu":{},"network":[],"disk":[]}
    ]}"#;
    let err = normalize_json(missing_memory, "").unwrap_err();
    assert!(err.to_string().contains("memory"), "{err}");

    assert!(normalize_json(r#"{"metrics":null}"#, "").is_err());
    assert!(normalize_json(r#"[]"#, "").is_err());
    assert!(normalize_json(
        r#"{"metrics":[{"timestamp":"2024-05-01T12:00:00Z","cpu":{},"memory":{},"network":[],"disk":"sda"}]}"#,
        ""
    )
    .is_err());
}

#[test]
fn normalize_is_idempotent() {
    let samples = vec![
        sample(0, vec![nic(10, 20)], vec![disk("sda", 3, 4)]),
        sample(1, vec![nic(30, 40)], vec![disk("sdb", 5, 6)]),
    ];
    let first = normalize(&samples, "sdb");
    let second = normalize(&samples, "sdb");
    assert_eq!(first, second);
}

#[test]
fn chart_groups_select_their_rows() {
    let samples = vec![sample(0, vec![nic(1, 1)], vec![]), sample(1, vec![], vec![])];
    let (series, _) = normalize(&samples, "");
    for group in ChartGroup::ALL {
        let rows: Vec<_> = series.for_group(group).collect();
        assert_eq!(rows.len(), group.categories().len() * samples.len());
        assert!(rows.iter().all(|p| p.unit == group.unit()));
    }
}

#[test]
fn payload_envelope_fields_are_optional() {
    let text = r#"{"latest":false,"timestamp":"2024-05-01T12:05:00","metrics":[]}"#;
    let payload = RawPayload::from_json(text).unwrap();
    assert_eq!(payload.latest, Some(false));
    assert!(payload.metrics.is_empty());
}
