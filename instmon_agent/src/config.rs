//! Agent configuration: command-line flags plus `INSTMON_AGENT_*` environment variables.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_SAMPLE_SECS: u64 = 60;
pub const DEFAULT_RETENTION_MINS: u64 = 120;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentArgs {
    pub port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub port: u16,
    pub sample_period: Duration,
    pub retention: Duration,
    pub instance_id: String,
    pub auth_token: Option<String>,
}

pub fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--port PORT|-p PORT]\n\
         \n\
         Environment:\n  \
           INSTMON_AGENT_PORT            listen port when no flag is given (default {DEFAULT_PORT})\n  \
           INSTMON_AGENT_SAMPLE_SECS     seconds between samples (default {DEFAULT_SAMPLE_SECS})\n  \
           INSTMON_AGENT_RETENTION_MINS  minutes of history kept (default {DEFAULT_RETENTION_MINS})\n  \
           INSTMON_AGENT_INSTANCE_ID     id samples are stored under (default: host name)\n  \
           INSTMON_AGENT_TOKEN           require ?token=... on every request\n  \
           RUST_LOG                      log filter (default info)"
    )
}

/// Parse flags. `Err` carries text to print before exiting (help or a usage error).
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<AgentArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "instmon_agent".into());
    let mut long: Option<String> = None;
    let mut short: Option<String> = None;
    while let Some(a) = it.next() {
        match a.as_str() {
            "-h" | "--help" => return Err(usage(&prog)),
            "--port" => long = it.next(),
            "-p" => short = it.next(),
            _ if a.starts_with("--port=") => {
                if let Some((_, v)) = a.split_once('=') {
                    long = Some(v.to_string());
                }
            }
            _ => return Err(format!("Unexpected argument '{a}'.\n{}", usage(&prog))),
        }
    }
    let port = match long.or(short) {
        Some(s) => Some(
            s.parse::<u16>()
                .map_err(|_| format!("Invalid port '{s}'.\n{}", usage(&prog)))?,
        ),
        None => None,
    };
    Ok(AgentArgs { port })
}

impl AgentConfig {
    pub fn from_env(args: AgentArgs) -> Self {
        Self::from_lookup(args, |k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(args: AgentArgs, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = args
            .port
            .or_else(|| lookup("INSTMON_AGENT_PORT").and_then(|v| v.trim().parse().ok()))
            .unwrap_or(DEFAULT_PORT);
        let sample_secs = number("INSTMON_AGENT_SAMPLE_SECS")
            .unwrap_or(DEFAULT_SAMPLE_SECS)
            .max(1);
        let retention_mins = number("INSTMON_AGENT_RETENTION_MINS")
            .unwrap_or(DEFAULT_RETENTION_MINS)
            .max(1);
        let instance_id = text("INSTMON_AGENT_INSTANCE_ID").unwrap_or_else(default_instance_id);

        Self {
            port,
            sample_period: Duration::from_secs(sample_secs),
            retention: Duration::from_secs(retention_mins.saturating_mul(60)),
            instance_id,
            auth_token: text("INSTMON_AGENT_TOKEN"),
        }
    }

    /// Upper bound on samples kept per instance.
    pub fn history_cap(&self) -> usize {
        let per_period = self.retention.as_secs() / self.sample_period.as_secs().max(1);
        usize::try_from(per_period)
            .unwrap_or(usize::MAX)
            .saturating_add(1)
    }
}

pub fn default_instance_id() -> String {
    crate::metrics::host_name().to_string()
}
