use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::error::ParseFailure;
use crate::schema::{self, Arity, OptionSpec, OPTIONS};

const NAME: &str = "support-diagnostics";

const LONG_ABOUT: &str = "Elasticsearch support diagnostics

Collects stats, settings and logs from a running Elasticsearch node and writes them
to an output directory for support analysis.

For verbose logging, set RUST_LOG=debug environment variable";

/// Builds the clap command from the option table.
pub fn command() -> Result<Command, ParseFailure> {
    schema::check_short_names(&OPTIONS)?;

    let cmd = Command::new(NAME)
        .about("Elasticsearch support diagnostics")
        .long_about(LONG_ABOUT)
        .version(env!("CARGO_PKG_VERSION"))
        .disable_help_flag(true)
        .disable_version_flag(true)
        .no_binary_name(true);

    Ok(OPTIONS.iter().fold(cmd, |cmd, spec| cmd.arg(to_arg(spec))))
}

fn to_arg(spec: &OptionSpec) -> Arg {
    let mut arg = Arg::new(spec.id).long(spec.long).help(spec.help);
    if let Some(short) = spec.short {
        arg = arg.short(short);
    }
    if !spec.short_aliases.is_empty() {
        arg = arg.visible_short_aliases(spec.short_aliases.iter().copied());
    }

    match spec.arity {
        Arity::Flag => arg.action(ArgAction::SetTrue),
        // Append so a repeated option reaches the validator instead of
        // failing inside clap with its own wording.
        Arity::Single => arg
            .action(ArgAction::Append)
            .num_args(1)
            .value_name(spec.value_name)
            .allow_negative_numbers(true)
            // unconstrained values may look like options, e.g. `-o -out`
            .allow_hyphen_values(spec.pattern.is_none()),
    }
}

/// Rendered usage text shown for `--help`.
pub fn usage() -> String {
    match command() {
        Ok(mut cmd) => cmd.render_long_help().to_string(),
        Err(e) => e.to_string(),
    }
}

enum Scan {
    Help,
    NeedsValue,
    Plain,
}

/// True when any token before a `--` terminator asks for help, either on its
/// own (`-h`, `-?`, `--help`) or inside a short cluster such as `-hH`.
///
/// The token after an option that takes a separate value is that option's
/// value, so `-c -hunter` is not a help request.
pub fn wants_help(tokens: &[String]) -> bool {
    let mut expects_value = false;
    for token in tokens.iter().take_while(|token| token.as_str() != "--") {
        if matches!(schema::find(token), Some(spec) if spec.id == schema::HELP.id) {
            return true;
        }
        if std::mem::take(&mut expects_value) {
            continue;
        }
        match scan(token) {
            Scan::Help => return true,
            Scan::NeedsValue => expects_value = true,
            Scan::Plain => {}
        }
    }
    false
}

fn scan(token: &str) -> Scan {
    if token.starts_with("--") {
        return match schema::find(token) {
            Some(spec) if spec.arity == Arity::Single => Scan::NeedsValue,
            _ => Scan::Plain,
        };
    }

    let Some(cluster) = token.strip_prefix('-') else {
        return Scan::Plain;
    };
    for (i, c) in cluster.char_indices() {
        match schema::find_short(c) {
            Some(spec) if spec.id == schema::HELP.id => return Scan::Help,
            // the rest of the cluster, if any, is the value
            Some(spec) if spec.arity == Arity::Single => {
                return if i + c.len_utf8() == cluster.len() {
                    Scan::NeedsValue
                } else {
                    Scan::Plain
                };
            }
            _ => return Scan::Plain,
        }
    }
    Scan::Plain
}

/// Splits tokens into per-option raw values without checking patterns.
pub fn tokenize(tokens: &[String]) -> Result<ArgMatches, ParseFailure> {
    command()?
        .try_get_matches_from(tokens)
        .map_err(|err| from_clap_error(err, tokens))
}

fn context(err: &clap::Error, kind: ContextKind) -> Option<String> {
    match err.get(kind) {
        Some(ContextValue::String(value)) => Some(value.clone()),
        _ => None,
    }
}

/// clap reports only the offending character of a short cluster (`-w` for
/// `-weird`); find the token the user actually typed.
fn typed_token(tokens: &[String], reported: &str) -> String {
    let short = reported
        .strip_prefix('-')
        .filter(|rest| !rest.starts_with('-') && rest.chars().count() == 1)
        .and_then(|rest| rest.chars().next());

    tokens
        .iter()
        .find(|token| token.as_str() == reported)
        .or_else(|| {
            tokens.iter().find(|token| {
                token
                    .strip_prefix(reported)
                    .is_some_and(|rest| rest.starts_with('='))
            })
        })
        .or_else(|| {
            let short = short?;
            tokens.iter().find(|token| {
                !token.starts_with("--")
                    && token
                        .strip_prefix('-')
                        .is_some_and(|cluster| cluster.contains(short))
            })
        })
        .cloned()
        .unwrap_or_else(|| reported.to_string())
}

fn from_clap_error(err: clap::Error, tokens: &[String]) -> ParseFailure {
    let invalid_arg = context(&err, ContextKind::InvalidArg);

    match (err.kind(), invalid_arg) {
        (ErrorKind::UnknownArgument, Some(reported)) => ParseFailure::UnknownOption {
            token: typed_token(tokens, &reported),
        },
        // clap names the option as e.g. "--host-port <host:port>"
        (ErrorKind::InvalidValue, Some(arg)) => {
            let spelling = arg.split_whitespace().next().unwrap_or_default();
            let option = schema::find(spelling)
                .map(OptionSpec::flag)
                .unwrap_or_else(|| spelling.to_string());
            ParseFailure::MissingRequiredOption { option }
        }
        (kind, invalid_arg) => {
            let what = kind.as_str().unwrap_or("invalid arguments");
            let value = context(&err, ContextKind::InvalidValue);
            let message = match (invalid_arg, value) {
                (Some(arg), Some(value)) => format!("{}: '{}' for {}", what, value, arg),
                (Some(arg), None) => format!("{}: {}", what, arg),
                (None, _) => what.to_string(),
            };
            ParseFailure::Invalid { message }
        }
    }
}
