use std::fmt;

use clap::ArgMatches;
use tracing::{debug, instrument};

use crate::cli;
use crate::error::ParseFailure;
use crate::schema::{self, OptionSpec};

/// Validated command line of the diagnostics tool.
///
/// Optional fields stay `None` when not supplied; their effective defaults
/// are applied later by [`crate::plan::CollectionPlan`].
#[derive(Clone, PartialEq, Eq)]
pub struct DiagnosticConfig {
    pub host_port: String,
    pub node_name: String,
    pub output_directory: Option<String>,
    pub stat_runs: Option<u32>,
    pub stat_interval: Option<u32>,
    pub auth_type: Option<String>,
    pub auth_creds: Option<String>,
    pub auth_password: Option<String>,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self {
            host_port: schema::DEFAULT_HOST_PORT.to_string(),
            node_name: schema::DEFAULT_NODE_NAME.to_string(),
            output_directory: None,
            stat_runs: None,
            stat_interval: None,
            auth_type: None,
            auth_creds: None,
            auth_password: None,
        }
    }
}

impl fmt::Debug for DiagnosticConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticConfig")
            .field("host_port", &self.host_port)
            .field("node_name", &self.node_name)
            .field("output_directory", &self.output_directory)
            .field("stat_runs", &self.stat_runs)
            .field("stat_interval", &self.stat_interval)
            .field("auth_type", &self.auth_type)
            .field("auth_creds", &self.auth_creds)
            .field("auth_password", &self.auth_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl DiagnosticConfig {
    /// Parses the process arguments, excluding the program name.
    ///
    /// A help request anywhere before `--` wins over every other token,
    /// including malformed ones.
    #[instrument(skip_all)]
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, ParseFailure> {
        let tokens: Vec<String> = tokens.iter().map(|t| t.as_ref().to_string()).collect();

        if cli::wants_help(&tokens) {
            debug!("Help requested");
            return Err(ParseFailure::HelpRequested { usage: cli::usage() });
        }

        let matches = cli::tokenize(&tokens)?;
        if matches.get_flag(schema::HELP.id) {
            return Err(ParseFailure::HelpRequested { usage: cli::usage() });
        }

        let config = Self {
            host_port: required(&matches, &schema::HOST_PORT)?,
            node_name: required(&matches, &schema::NODE_NAME)?,
            output_directory: optional(&matches, &schema::OUTPUT_DIRECTORY)?,
            stat_runs: positive(&matches, &schema::STAT_RUNS)?,
            stat_interval: positive(&matches, &schema::STAT_INTERVAL)?,
            auth_type: optional(&matches, &schema::AUTH_TYPE)?,
            auth_creds: optional(&matches, &schema::AUTH_CREDS)?,
            auth_password: optional(&matches, &schema::AUTH_PASSWORD)?,
        };

        debug!("Parsed configuration: {:?}", config);
        Ok(config)
    }

    /// Canonical `--long=value` tokens that parse back into this config.
    pub fn to_args(&self) -> Vec<String> {
        let values = [
            (&schema::HOST_PORT, Some(self.host_port.clone())),
            (&schema::NODE_NAME, Some(self.node_name.clone())),
            (&schema::OUTPUT_DIRECTORY, self.output_directory.clone()),
            (&schema::STAT_RUNS, self.stat_runs.map(|n| n.to_string())),
            (&schema::STAT_INTERVAL, self.stat_interval.map(|n| n.to_string())),
            (&schema::AUTH_TYPE, self.auth_type.clone()),
            (&schema::AUTH_CREDS, self.auth_creds.clone()),
            (&schema::AUTH_PASSWORD, self.auth_password.clone()),
        ];
        // `=` keeps values that look like options attached to their flag
        values
            .into_iter()
            .filter_map(|(spec, value)| value.map(|value| format!("{}={}", spec.flag(), value)))
            .collect()
    }
}

/// The single value supplied for `spec`, pattern-checked, if any.
fn single(matches: &ArgMatches, spec: &OptionSpec) -> Result<Option<String>, ParseFailure> {
    let Some(values) = matches.get_many::<String>(spec.id) else {
        return Ok(None);
    };
    let values: Vec<&String> = values.collect();
    if values.len() > 1 {
        return Err(ParseFailure::RepeatedOption { option: spec.flag() });
    }
    let Some(value) = values.first() else {
        return Ok(None);
    };

    if spec.is_required() && value.is_empty() {
        return Err(ParseFailure::MissingRequiredOption { option: spec.flag() });
    }
    if !spec.accepts(value) {
        return Err(ParseFailure::PatternMismatch {
            option: spec.flag(),
            value: value.to_string(),
            pattern: spec.pattern.unwrap_or_default().to_string(),
        });
    }

    Ok(Some(value.to_string()))
}

fn required(matches: &ArgMatches, spec: &OptionSpec) -> Result<String, ParseFailure> {
    let default = spec.default.unwrap_or_default();
    Ok(single(matches, spec)?.unwrap_or_else(|| default.to_string()))
}

fn optional(matches: &ArgMatches, spec: &OptionSpec) -> Result<Option<String>, ParseFailure> {
    single(matches, spec)
}

fn positive(matches: &ArgMatches, spec: &OptionSpec) -> Result<Option<u32>, ParseFailure> {
    single(matches, spec)?
        .map(|value| {
            value
                .parse::<u32>()
                .map_err(|_| ParseFailure::ValueOutOfRange {
                    option: spec.flag(),
                    value,
                })
        })
        .transpose()
}
