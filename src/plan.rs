use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use serde::{Serialize, Serializer};
use tracing::{info, instrument, warn};

use crate::config::DiagnosticConfig;
use crate::error::PlanError;

pub const DEFAULT_STAT_RUNS: u32 = 1;
pub const DEFAULT_STAT_INTERVAL_SECS: u64 = 60;

const OUTPUT_DIR_PREFIX: &str = "support-diagnostics";
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    Basic,
    Cookie,
}

impl FromStr for AuthType {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(AuthType::Basic),
            "cookie" => Ok(AuthType::Cookie),
            _ => Err(PlanError::UnknownAuthType(s.to_string())),
        }
    }
}

/// Credentials the collector presents to the node.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Auth {
    None,
    Basic {
        username: String,
        /// `None` means the password has to be prompted for.
        #[serde(rename = "has_password", serialize_with = "serialize_presence")]
        password: Option<String>,
    },
    Cookie {
        path: PathBuf,
    },
}

/// Effective settings handed to the collection pipeline.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CollectionPlan {
    pub host: String,
    pub port: u16,
    pub node_name: String,
    pub output_directory: PathBuf,
    pub stat_runs: u32,
    #[serde(rename = "stat_interval_secs", serialize_with = "serialize_secs")]
    pub stat_interval: Duration,
    pub auth: Auth,
}

impl CollectionPlan {
    pub fn resolve_now(config: &DiagnosticConfig) -> Result<Self, PlanError> {
        Self::resolve(config, Local::now().naive_local())
    }

    /// Applies the collector defaults to `config`. `timestamp` only feeds the
    /// synthesized output directory name.
    #[instrument(skip_all)]
    pub fn resolve(config: &DiagnosticConfig, timestamp: NaiveDateTime) -> Result<Self, PlanError> {
        let (host, port) = split_host_port(&config.host_port)?;

        let output_directory = match &config.output_directory {
            Some(dir) => PathBuf::from(dir),
            None => default_output_directory(&host, &config.node_name, timestamp),
        };

        let plan = Self {
            host,
            port,
            node_name: config.node_name.clone(),
            output_directory,
            stat_runs: config.stat_runs.unwrap_or(DEFAULT_STAT_RUNS),
            stat_interval: config
                .stat_interval
                .map(|secs| Duration::from_secs(u64::from(secs)))
                .unwrap_or(Duration::from_secs(DEFAULT_STAT_INTERVAL_SECS)),
            auth: resolve_auth(config)?,
        };

        info!(
            "Collecting from {}:{} node {} ({} runs every {:?}) into {}",
            plan.host,
            plan.port,
            plan.node_name,
            plan.stat_runs,
            plan.stat_interval,
            plan.output_directory.display()
        );
        Ok(plan)
    }
}

fn split_host_port(host_port: &str) -> Result<(String, u16), PlanError> {
    let invalid = || PlanError::InvalidPort {
        host_port: host_port.to_string(),
    };

    let (host, port) = host_port.rsplit_once(':').ok_or_else(invalid)?;
    let port: u16 = port.parse().map_err(|_| invalid())?;
    if port == 0 {
        return Err(invalid());
    }

    Ok((host.to_string(), port))
}

/// `./support-diagnostics.[host].[node].[timestamp]`
fn default_output_directory(host: &str, node_name: &str, timestamp: NaiveDateTime) -> PathBuf {
    PathBuf::from(".").join(format!(
        "{}.{}.{}.{}",
        OUTPUT_DIR_PREFIX,
        host,
        node_name,
        timestamp.format(TIMESTAMP_FORMAT)
    ))
}

fn resolve_auth(config: &DiagnosticConfig) -> Result<Auth, PlanError> {
    let auth = match (&config.auth_type, &config.auth_creds) {
        (None, None) => Auth::None,
        (None, Some(_)) => return Err(PlanError::MissingAuthType),
        (Some(kind), None) => return Err(PlanError::MissingAuthCreds(kind.clone())),
        (Some(kind), Some(creds)) => match kind.parse::<AuthType>()? {
            AuthType::Basic => Auth::Basic {
                username: creds.clone(),
                password: config.auth_password.clone(),
            },
            AuthType::Cookie => Auth::Cookie {
                path: PathBuf::from(creds),
            },
        },
    };

    if config.auth_password.is_some() && !matches!(auth, Auth::Basic { .. }) {
        warn!("--auth-password is only used with basic authentication, ignoring it");
    }

    Ok(auth)
}

fn serialize_presence<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_bool(value.is_some())
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    fn resolve(args: &[&str]) -> Result<CollectionPlan, PlanError> {
        let config = DiagnosticConfig::parse(args).unwrap();
        CollectionPlan::resolve(&config, timestamp())
    }

    #[test]
    fn test_defaults_applied() {
        let plan = resolve(&[]).unwrap();
        assert_eq!(plan.host, "localhost");
        assert_eq!(plan.port, 9200);
        assert_eq!(plan.node_name, "_local");
        assert_eq!(plan.stat_runs, 1);
        assert_eq!(plan.stat_interval, Duration::from_secs(60));
        assert_eq!(
            plan.output_directory,
            PathBuf::from("./support-diagnostics.localhost._local.20240307-140509")
        );
        assert_eq!(plan.auth, Auth::None);
    }

    #[test]
    fn test_supplied_values_kept() {
        let plan = resolve(&["-H", "es1:9300", "-n", "data1", "-o", "/tmp/out", "-r", "3", "-i", "10"]).unwrap();
        assert_eq!(plan.host, "es1");
        assert_eq!(plan.port, 9300);
        assert_eq!(plan.output_directory, PathBuf::from("/tmp/out"));
        assert_eq!(plan.stat_runs, 3);
        assert_eq!(plan.stat_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_ipv6_style_host_splits_on_last_colon() {
        let plan = resolve(&["-H", "[::1]:9200"]).unwrap();
        assert_eq!(plan.host, "[::1]");
        assert_eq!(plan.port, 9200);
    }

    #[test]
    fn test_port_out_of_range() {
        for host_port in ["host:99999", "host:0"] {
            assert_eq!(
                resolve(&["-H", host_port]).unwrap_err(),
                PlanError::InvalidPort { host_port: host_port.to_string() }
            );
        }
    }

    #[test]
    fn test_basic_auth() {
        let plan = resolve(&["-a", "basic", "-c", "elastic"]).unwrap();
        assert_eq!(plan.auth, Auth::Basic { username: "elastic".to_string(), password: None });

        let plan = resolve(&["-a", "BASIC", "-c", "elastic", "-p", "changeme"]).unwrap();
        assert_eq!(
            plan.auth,
            Auth::Basic { username: "elastic".to_string(), password: Some("changeme".to_string()) }
        );
    }

    #[test]
    fn test_cookie_auth_ignores_password() {
        let plan = resolve(&["-a", "cookie", "-c", "/etc/es/cookie", "-p", "unused"]).unwrap();
        assert_eq!(plan.auth, Auth::Cookie { path: PathBuf::from("/etc/es/cookie") });
    }

    #[test]
    fn test_auth_errors() {
        assert_eq!(
            resolve(&["-a", "kerberos", "-c", "x"]).unwrap_err(),
            PlanError::UnknownAuthType("kerberos".to_string())
        );
        assert_eq!(
            resolve(&["-a", "basic"]).unwrap_err(),
            PlanError::MissingAuthCreds("basic".to_string())
        );
        assert_eq!(resolve(&["-c", "elastic"]).unwrap_err(), PlanError::MissingAuthType);
    }

    #[test]
    fn test_json_hides_password() {
        let plan = resolve(&["-a", "basic", "-c", "elastic", "-p", "hunter2", "-i", "30"]).unwrap();
        let json = serde_json::to_value(&plan).unwrap();

        assert!(!json.to_string().contains("hunter2"));
        assert_eq!(json["auth"]["type"], "basic");
        assert_eq!(json["auth"]["username"], "elastic");
        assert_eq!(json["auth"]["has_password"], true);
        assert_eq!(json["stat_interval_secs"], 30);
        assert_eq!(json["port"], 9200);
    }
}
