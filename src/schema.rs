//! Static option table for the diagnostics command line.
//!
//! Every option the tool understands is declared once here. The clap command
//! in [`crate::cli`] and the validator in [`crate::config`] are both driven by
//! this table.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseFailure;

pub const DEFAULT_HOST_PORT: &str = "localhost:9200";
pub const DEFAULT_NODE_NAME: &str = "_local";

// port digits are ASCII only
pub const HOST_PORT_PATTERN: &str = r"\S+:[0-9]{1,5}$";
pub const NODE_NAME_PATTERN: &str = ".+";
pub const POSITIVE_INT_PATTERN: &str = "^[1-9][0-9]*$";

/// Every pattern in the table, anchored to match the whole value.
static COMPILED: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    OPTIONS
        .iter()
        .filter_map(|spec| spec.pattern)
        .map(|pattern| {
            let re = Regex::new(&format!("^(?:{})$", pattern)).expect("option pattern must compile");
            (pattern, re)
        })
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Takes no value.
    Flag,
    /// Takes exactly one value and may appear at most once.
    Single,
}

#[derive(Debug)]
pub struct OptionSpec {
    pub id: &'static str,
    pub long: &'static str,
    pub short: Option<char>,
    pub short_aliases: &'static [char],
    pub value_name: &'static str,
    pub arity: Arity,
    pub default: Option<&'static str>,
    pub pattern: Option<&'static str>,
    pub help: &'static str,
}

impl OptionSpec {
    /// Whether the option falls back to a default instead of staying absent.
    pub fn is_required(&self) -> bool {
        self.default.is_some()
    }

    /// `--long` spelling used in messages and canonical tokens.
    pub fn flag(&self) -> String {
        format!("--{}", self.long)
    }

    pub fn shorts(&self) -> impl Iterator<Item = char> + '_ {
        self.short.into_iter().chain(self.short_aliases.iter().copied())
    }

    /// Checks `value` against the option's pattern. Options without a
    /// pattern accept anything.
    pub fn accepts(&self, value: &str) -> bool {
        match self.pattern {
            Some(pattern) => COMPILED.get(pattern).is_some_and(|re| re.is_match(value)),
            None => true,
        }
    }
}

pub const HELP: OptionSpec = OptionSpec {
    id: "help",
    long: "help",
    short: Some('h'),
    short_aliases: &['?'],
    value_name: "",
    arity: Arity::Flag,
    default: None,
    pattern: None,
    help: "This help message",
};

pub const HOST_PORT: OptionSpec = OptionSpec {
    id: "host_port",
    long: "host-port",
    short: Some('H'),
    short_aliases: &[],
    value_name: "host:port",
    arity: Arity::Single,
    default: Some(DEFAULT_HOST_PORT),
    pattern: Some(HOST_PORT_PATTERN),
    help: "Elasticsearch hostname:port. Default: localhost:9200 (optional)",
};

pub const NODE_NAME: OptionSpec = OptionSpec {
    id: "node_name",
    long: "node-name",
    short: Some('n'),
    short_aliases: &[],
    value_name: "name",
    arity: Arity::Single,
    default: Some(DEFAULT_NODE_NAME),
    pattern: Some(NODE_NAME_PATTERN),
    help: "On a host with multiple nodes, the node name to gather data for. Should match node.name in elasticsearch.yml. Default: _local (optional)",
};

pub const OUTPUT_DIRECTORY: OptionSpec = OptionSpec {
    id: "output_directory",
    long: "output-directory",
    short: Some('o'),
    short_aliases: &[],
    value_name: "path",
    arity: Arity::Single,
    default: None,
    pattern: None,
    help: "Output directory to use instead of './support-diagnostics.[host].[node].[timestamp]' (optional)",
};

pub const STAT_RUNS: OptionSpec = OptionSpec {
    id: "stat_runs",
    long: "stat-runs",
    short: Some('r'),
    short_aliases: &[],
    value_name: "int",
    arity: Arity::Single,
    default: None,
    pattern: Some(POSITIVE_INT_PATTERN),
    help: "Number of times to collect stats. Default: 1 (optional)",
};

pub const STAT_INTERVAL: OptionSpec = OptionSpec {
    id: "stat_interval",
    long: "stat-interval",
    short: Some('i'),
    short_aliases: &[],
    value_name: "int",
    arity: Arity::Single,
    default: None,
    pattern: Some(POSITIVE_INT_PATTERN),
    help: "Interval in seconds between stats collections. Default: 60 (optional)",
};

pub const AUTH_TYPE: OptionSpec = OptionSpec {
    id: "auth_type",
    long: "auth-type",
    short: Some('a'),
    short_aliases: &[],
    value_name: "basic|cookie",
    arity: Arity::Single,
    default: None,
    pattern: None,
    help: "Authentication type. Either 'basic' or 'cookie'. Default: none (optional)",
};

pub const AUTH_CREDS: OptionSpec = OptionSpec {
    id: "auth_creds",
    long: "auth-creds",
    short: Some('c'),
    short_aliases: &[],
    value_name: "value",
    arity: Arity::Single,
    default: None,
    pattern: None,
    help: "Authentication credentials. Either a path to the auth cookie file or the basic auth username. You will be prompted for the password unless you specify -p. Default: none (optional)",
};

// `-a` belongs to --auth-type; the password takes `-p`.
pub const AUTH_PASSWORD: OptionSpec = OptionSpec {
    id: "auth_password",
    long: "auth-password",
    short: Some('p'),
    short_aliases: &[],
    value_name: "value",
    arity: Arity::Single,
    default: None,
    pattern: None,
    help: "Password for basic authentication. Use with -c to skip the password prompt. Default: none (optional)",
};

pub static OPTIONS: [&OptionSpec; 9] = [
    &HELP,
    &HOST_PORT,
    &NODE_NAME,
    &OUTPUT_DIRECTORY,
    &STAT_RUNS,
    &STAT_INTERVAL,
    &AUTH_TYPE,
    &AUTH_CREDS,
    &AUTH_PASSWORD,
];

/// Looks an option up by the `--long` or `-s` spelling a user typed.
pub fn find(spelling: &str) -> Option<&'static OptionSpec> {
    if let Some(long) = spelling.strip_prefix("--") {
        return OPTIONS.iter().copied().find(|spec| spec.long == long);
    }

    let mut chars = spelling.strip_prefix('-')?.chars();
    let short = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    find_short(short)
}

pub fn find_short(short: char) -> Option<&'static OptionSpec> {
    OPTIONS
        .iter()
        .copied()
        .find(|spec| spec.shorts().any(|c| c == short))
}

/// Rejects a table in which two options claim the same short name.
pub fn check_short_names(options: &[&OptionSpec]) -> Result<(), ParseFailure> {
    for (i, first) in options.iter().enumerate() {
        for second in &options[i + 1..] {
            if let Some(short) = first.shorts().find(|c| second.shorts().any(|s| s == *c)) {
                return Err(ParseFailure::AmbiguousShortOption {
                    short,
                    first: first.flag(),
                    second: second.flag(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_names_are_unique() {
        assert!(check_short_names(&OPTIONS).is_ok());
    }

    #[test]
    fn test_duplicate_short_name_is_reported() {
        const CLASH: OptionSpec = OptionSpec {
            id: "clash",
            long: "clash",
            short: Some('a'),
            short_aliases: &[],
            value_name: "value",
            arity: Arity::Single,
            default: None,
            pattern: None,
            help: "",
        };

        match check_short_names(&[&AUTH_TYPE, &CLASH]) {
            Err(ParseFailure::AmbiguousShortOption { short, first, second }) => {
                assert_eq!(short, 'a');
                assert_eq!(first, "--auth-type");
                assert_eq!(second, "--clash");
            }
            other => panic!("expected ambiguous short option, got {:?}", other),
        }
    }

    #[test]
    fn test_patterns_compile() {
        for spec in OPTIONS {
            if let Some(pattern) = spec.pattern {
                assert!(COMPILED.contains_key(pattern), "bad pattern for {}", spec.long);
            }
        }
    }

    #[test]
    fn test_host_port_pattern() {
        assert!(HOST_PORT.accepts("localhost:9200"));
        assert!(HOST_PORT.accepts("10.0.0.1:1"));
        assert!(HOST_PORT.accepts("es-data-1.example.com:99999"));
        assert!(!HOST_PORT.accepts("bad host:9200"));
        assert!(!HOST_PORT.accepts("host:123456"));
        assert!(!HOST_PORT.accepts("host:"));
        assert!(!HOST_PORT.accepts(":9200"));
        assert!(!HOST_PORT.accepts("host"));
    }

    #[test]
    fn test_host_port_rejects_non_ascii_digits() {
        assert!(!HOST_PORT.accepts("host:\u{0661}\u{0662}"));
        assert!(!HOST_PORT.accepts("host:９２００"));
    }

    #[test]
    fn test_find_short() {
        assert_eq!(find_short('?').map(|s| s.id), Some("help"));
        assert_eq!(find_short('o').map(|s| s.id), Some("output_directory"));
        assert!(find_short('z').is_none());
    }

    #[test]
    fn test_positive_int_pattern() {
        assert!(STAT_RUNS.accepts("1"));
        assert!(STAT_RUNS.accepts("120"));
        for bad in ["0", "00", "012", "-5", "12a", ""] {
            assert!(!STAT_RUNS.accepts(bad), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_node_name_pattern() {
        assert!(NODE_NAME.accepts("data1"));
        assert!(NODE_NAME.accepts("_local"));
        assert!(!NODE_NAME.accepts(""));
    }

    #[test]
    fn test_find_by_spelling() {
        assert_eq!(find("--host-port").map(|s| s.id), Some("host_port"));
        assert_eq!(find("-H").map(|s| s.id), Some("host_port"));
        assert_eq!(find("-?").map(|s| s.id), Some("help"));
        assert_eq!(find("-a").map(|s| s.id), Some("auth_type"));
        assert_eq!(find("-p").map(|s| s.id), Some("auth_password"));
        assert!(find("--bogus").is_none());
        assert!(find("-Hn").is_none());
        assert!(find("host").is_none());
    }
}
