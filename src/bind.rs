//! The binding pass: register each option as a flag, resolve its override, and
//! write the winning value into the caller's variable.
//!
//! For every [`Opt`], in order:
//!
//! 1. Register a flag of the matching kind (name, short alias, help, default).
//! 2. Ask the [`Resolver`] for an environment or config-file override.
//! 3. Coerce the override (or fall back to the default) and write the
//!    destination. Nothing is written if coercion fails.
//! 4. Mark the flag required unless the override came from the environment.
//! 5. Mark the flag hidden.
//!
//! The first error aborts the pass. Options bound before it keep their values.
//!
//! Values typed on the command line are applied afterwards by
//! [`Bindings::apply_matches`], which is what puts flags above every other
//! source.

use std::collections::BTreeMap;

use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{ArgMatches, Command};
use toml::Value;
use tracing::debug;

use crate::coerce;
use crate::duration;
use crate::error::BindError;
use crate::flags::{Flag, FlagKind, FlagSet};
use crate::resolve::{Resolver, Source};
use crate::types::{DefaultValue, Dest, Opt};

/// One bound option, holding on to its destination until flags are applied.
#[derive(Debug)]
pub struct Binding<'a> {
    pub flag: String,
    /// Name used for environment, config and flag-overlay lookups.
    pub lookup_name: String,
    pub source: Option<Source>,
    dest: Dest<'a>,
    persistent: bool,
}

/// The result of a binding pass.
#[derive(Debug, Default)]
pub struct Bindings<'a> {
    bindings: Vec<Binding<'a>>,
    required_persistent: Vec<String>,
}

impl<'a> Bindings<'a> {
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding<'a>> {
        self.bindings.iter()
    }

    /// Where the value of `flag` came from during binding (`None` means the
    /// default).
    pub fn source(&self, flag: &str) -> Option<Source> {
        self.bindings
            .iter()
            .find(|b| b.flag == flag)
            .and_then(|b| b.source)
    }

    /// Write values given explicitly on the command line into their
    /// destinations. Persistent options are also recorded in the resolver so
    /// later lookups of the same name see the flag.
    pub fn apply_matches(
        &mut self,
        matches: &ArgMatches,
        resolver: &mut Resolver,
    ) -> Result<(), BindError> {
        for binding in &mut self.bindings {
            let Ok(Some(raw)) = matches.try_get_raw(&binding.flag) else {
                continue;
            };
            if matches.value_source(&binding.flag) != Some(ValueSource::CommandLine) {
                continue;
            }
            let raw: Vec<String> = raw.map(|v| v.to_string_lossy().into_owned()).collect();

            let value = match binding.dest {
                Dest::StrList(_) | Dest::StrMap(_) => {
                    Value::Array(raw.into_iter().map(Value::String).collect())
                }
                _ => Value::String(raw.last().cloned().unwrap_or_default()),
            };

            apply(&binding.flag, &mut binding.dest, None, Some(&value))?;
            binding.source = Some(Source::Flag);
            debug!(option = %binding.flag, "value from command line");

            if binding.persistent {
                resolver.bind_flag(&binding.lookup_name, value);
            }
        }
        Ok(())
    }

    /// Enforce required persistent options, which clap cannot check itself.
    ///
    /// Each must have been given on the command line at some level of
    /// `matches`; otherwise this returns clap's missing-argument error for `cmd`.
    pub fn check_required(
        &self,
        cmd: &mut Command,
        matches: &ArgMatches,
    ) -> Result<(), BindError> {
        let missing: Vec<&str> = self
            .required_persistent
            .iter()
            .map(String::as_str)
            .filter(|id| !given_on_command_line(matches, id))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        let flags: Vec<String> = missing.iter().map(|id| format!("  --{id}")).collect();
        let message = format!(
            "the following required arguments were not provided:\n{}",
            flags.join("\n")
        );
        Err(cmd.error(ErrorKind::MissingRequiredArgument, message).into())
    }
}

/// Whether `id` was typed on the command line at this level or any
/// subcommand level below it.
fn given_on_command_line(matches: &ArgMatches, id: &str) -> bool {
    let mut current = Some(matches);
    while let Some(m) = current {
        if matches!(m.try_contains_id(id), Ok(true))
            && m.value_source(id) == Some(ValueSource::CommandLine)
        {
            return true;
        }
        current = m.subcommand().map(|(_, sub)| sub);
    }
    false
}

/// Bind `opts` onto `cmd`, returning the command with the new flags attached.
pub fn bind_options<'a>(
    cmd: Command,
    resolver: &Resolver,
    opts: Vec<Opt<'a>>,
) -> Result<(Command, Bindings<'a>), BindError> {
    let mut flags = FlagSet::new();
    let bindings = bind_into(&mut flags, resolver, opts)?;
    Ok((cmd.args(flags.into_args()), bindings))
}

/// Bind `opts` into an existing flag set.
pub fn bind_into<'a>(
    flags: &mut FlagSet,
    resolver: &Resolver,
    opts: Vec<Opt<'a>>,
) -> Result<Bindings<'a>, BindError> {
    let mut bindings = Vec::with_capacity(opts.len());

    for opt in opts {
        let lookup_name = opt.lookup_name().to_string();
        let Opt {
            mut dest,
            flag,
            short,
            default,
            desc,
            required,
            hidden,
            persistent,
            ..
        } = opt;

        flags.register(Flag {
            short,
            help: desc,
            default: default.as_ref().map(default_text),
            persistent,
            ..Flag::new(&flag, FlagKind::of(&dest))
        })?;

        let found = resolver.lookup(&lookup_name);
        apply(&flag, &mut dest, default, found.as_ref().map(|o| &o.value))?;
        let source = found.map(|o| o.source);

        // Only the environment exempts a required option: file and flag
        // presence are checked when argv is parsed.
        if required && source != Some(Source::Env) {
            flags.mark_required(&flag)?;
        }
        if hidden {
            flags.mark_hidden(&flag)?;
        }

        debug!(option = %flag, source = ?source, "bound option");
        bindings.push(Binding {
            flag,
            lookup_name,
            source,
            dest,
            persistent,
        });
    }

    let required_persistent = flags.required_persistent().map(String::from).collect();
    Ok(Bindings {
        bindings,
        required_persistent,
    })
}

/// Validate the default against the destination, coerce the override if there
/// is one, and write the result.
fn apply(
    flag: &str,
    dest: &mut Dest<'_>,
    default: Option<DefaultValue>,
    found: Option<&Value>,
) -> Result<(), BindError> {
    let expected = dest.kind();
    match dest {
        Dest::Str(slot) => {
            let d = take_default(flag, expected, default, |d| match d {
                DefaultValue::Str(s) => Ok(s),
                other => Err(other),
            })?;
            write(&mut **slot, d, found, flag, "string", coerce::to_string)
        }
        Dest::I32(slot) => {
            let d = int_default(flag, expected, default)?;
            write(&mut **slot, d, found, flag, "int", coerce::to_int)
        }
        Dest::I64(slot) => {
            let d = int_default(flag, expected, default)?;
            write(&mut **slot, d, found, flag, "int", coerce::to_int)
        }
        Dest::U16(slot) => {
            let d = int_default(flag, expected, default)?;
            write(&mut **slot, d, found, flag, "int", coerce::to_int)
        }
        Dest::U32(slot) => {
            let d = int_default(flag, expected, default)?;
            write(&mut **slot, d, found, flag, "int", coerce::to_int)
        }
        Dest::U64(slot) => {
            let d = int_default(flag, expected, default)?;
            write(&mut **slot, d, found, flag, "int", coerce::to_int)
        }
        Dest::Bool(slot) => {
            let d = take_default(flag, expected, default, |d| match d {
                DefaultValue::Bool(b) => Ok(b),
                other => Err(other),
            })?;
            write(&mut **slot, d, found, flag, "bool", coerce::to_bool)
        }
        Dest::Duration(slot) => {
            let d = match default {
                None => Default::default(),
                Some(DefaultValue::Duration(d)) => d,
                Some(DefaultValue::Str(s)) => {
                    duration::parse(&s).map_err(|reason| BindError::InvalidDefault {
                        flag: flag.to_string(),
                        value: s.clone(),
                        reason,
                    })?
                }
                Some(other) => return Err(mismatch(flag, expected, &other)),
            };
            write(&mut **slot, d, found, flag, "duration", coerce::to_duration)
        }
        Dest::StrList(slot) => {
            let d = take_default(flag, expected, default, |d| match d {
                DefaultValue::StrList(v) => Ok(v),
                other => Err(other),
            })?;
            write(&mut **slot, d, found, flag, "string-slice", coerce::to_string_list)
        }
        Dest::StrMap(slot) => {
            let d = take_default(flag, expected, default, |d| match d {
                DefaultValue::StrMap(m) => Ok(m),
                other => Err(other),
            })?;
            write(&mut **slot, d, found, flag, "string-map", coerce::to_string_map)
        }
        Dest::Custom(value) => {
            let d = match default {
                None => None,
                Some(DefaultValue::Str(s)) => Some(s),
                Some(other) => return Err(mismatch(flag, expected, &other)),
            };
            match (found, d) {
                (Some(raw), _) => {
                    let coerced = coerce::to_string(raw).and_then(|s| value.set(&s));
                    coerced.map_err(|reason| coercion(flag, raw, value.value_name(), reason))
                }
                (None, Some(d)) => value.set(&d).map_err(|reason| BindError::InvalidDefault {
                    flag: flag.to_string(),
                    value: d,
                    reason,
                }),
                (None, None) => Ok(()),
            }
        }
    }
}

fn write<T>(
    slot: &mut T,
    default: T,
    found: Option<&Value>,
    flag: &str,
    kind: &'static str,
    coerce: impl Fn(&Value) -> Result<T, String>,
) -> Result<(), BindError> {
    *slot = match found {
        Some(raw) => coerce(raw).map_err(|reason| coercion(flag, raw, kind, reason))?,
        None => default,
    };
    Ok(())
}

fn take_default<T: Default>(
    flag: &str,
    expected: &'static str,
    default: Option<DefaultValue>,
    pick: impl FnOnce(DefaultValue) -> Result<T, DefaultValue>,
) -> Result<T, BindError> {
    match default {
        None => Ok(T::default()),
        Some(d) => pick(d).map_err(|other| mismatch(flag, expected, &other)),
    }
}

fn int_default<T: TryFrom<i128> + Default>(
    flag: &str,
    expected: &'static str,
    default: Option<DefaultValue>,
) -> Result<T, BindError> {
    match default {
        None => Ok(T::default()),
        Some(DefaultValue::Int(v)) => coerce::widen(flag, v),
        Some(other) => Err(mismatch(flag, expected, &other)),
    }
}

fn mismatch(flag: &str, expected: &'static str, found: &DefaultValue) -> BindError {
    BindError::UnsupportedDefault {
        flag: flag.to_string(),
        expected,
        found: found.kind(),
    }
}

fn coercion(flag: &str, raw: &Value, kind: &'static str, reason: String) -> BindError {
    BindError::Coercion {
        flag: flag.to_string(),
        value: coerce::raw_text(raw),
        kind,
        reason,
    }
}

/// How a default is shown in help output.
fn default_text(default: &DefaultValue) -> String {
    match default {
        DefaultValue::Str(s) => s.clone(),
        DefaultValue::Int(i) => i.to_string(),
        DefaultValue::Bool(b) => b.to_string(),
        DefaultValue::Duration(d) => duration::format(*d),
        DefaultValue::StrList(v) => format!("[{}]", v.join(",")),
        DefaultValue::StrMap(m) => format!("[{}]", join_pairs(m)),
    }
}

fn join_pairs(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{env, resolver};
    use crate::store::ConfigStore;
    use crate::value::{Id, LogLevel};
    use std::time::Duration;

    fn bind<'a>(r: &Resolver, opts: Vec<Opt<'a>>) -> Result<(Command, Bindings<'a>), BindError> {
        bind_options(Command::new("abc"), r, opts)
    }

    #[test]
    fn default_used_without_overrides() {
        let r = resolver(&[], "");
        let mut port = 0i64;
        bind(&r, vec![Opt::new("port", Dest::I64(&mut port)).default(8080)]).unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn env_override_applied() {
        let r = resolver(&[("ABC_PORT", "9090")], "");
        let mut port = 0i64;
        let (_, b) = bind(&r, vec![Opt::new("port", Dest::I64(&mut port)).default(8080)]).unwrap();
        assert_eq!(b.source("port"), Some(Source::Env));
        drop(b);
        assert_eq!(port, 9090);
    }

    #[test]
    fn env_beats_config_file() {
        let r = resolver(&[("ABC_HOST", "from-env")], "host = \"from-file\"");
        let mut host = String::new();
        bind(&r, vec![Opt::new("host", Dest::Str(&mut host))]).unwrap();
        assert_eq!(host, "from-env");
    }

    #[test]
    fn config_file_beats_default() {
        let r = resolver(&[], "host = \"from-file\"");
        let mut host = String::new();
        bind(&r, vec![Opt::new("host", Dest::Str(&mut host)).default("localhost")]).unwrap();
        assert_eq!(host, "from-file");
    }

    #[test]
    fn no_default_writes_zero_value() {
        let r = resolver(&[], "");
        let mut host = "stale".to_string();
        let mut n = 7u32;
        bind(
            &r,
            vec![
                Opt::new("host", Dest::Str(&mut host)),
                Opt::new("n", Dest::U32(&mut n)),
            ],
        )
        .unwrap();
        assert_eq!(host, "");
        assert_eq!(n, 0);
    }

    #[test]
    fn env_var_name_override() {
        let r = resolver(&[("ABC_BOLT_FILE", "/tmp/db")], "");
        let mut path = String::new();
        bind(
            &r,
            vec![Opt::new("bolt-path", Dest::Str(&mut path)).env_var("bolt-file")],
        )
        .unwrap();
        assert_eq!(path, "/tmp/db");
    }

    #[test]
    fn every_integer_width_from_env() {
        let r = resolver(
            &[
                ("ABC_A", "-5"),
                ("ABC_B", "9000000000"),
                ("ABC_C", "65535"),
                ("ABC_D", "4000000000"),
                ("ABC_E", "18446744073709551615"),
            ],
            "",
        );
        let (mut a, mut b, mut c, mut d, mut e) = (0i32, 0i64, 0u16, 0u32, 0u64);
        bind(
            &r,
            vec![
                Opt::new("a", Dest::I32(&mut a)),
                Opt::new("b", Dest::I64(&mut b)),
                Opt::new("c", Dest::U16(&mut c)),
                Opt::new("d", Dest::U32(&mut d)),
                Opt::new("e", Dest::U64(&mut e)),
            ],
        )
        .unwrap();
        assert_eq!((a, b, c, d, e), (-5, 9_000_000_000, 65535, 4_000_000_000, u64::MAX));
    }

    #[test]
    fn narrower_default_widens() {
        let r = resolver(&[], "");
        let mut wide = 0i64;
        let mut small = 0i32;
        bind(
            &r,
            vec![
                Opt::new("wide", Dest::I64(&mut wide)).default(2_000_000_000i32),
                Opt::new("small", Dest::I32(&mut small)).default(42u8),
            ],
        )
        .unwrap();
        assert_eq!(wide, 2_000_000_000);
        assert_eq!(small, 42);
    }

    #[test]
    fn default_out_of_range_rejected() {
        let r = resolver(&[], "");
        let mut n = 0i32;
        let err = bind(&r, vec![Opt::new("n", Dest::I32(&mut n)).default(i64::MAX)]).unwrap_err();
        assert!(matches!(err, BindError::DefaultOutOfRange { target: "i32", .. }));
    }

    #[test]
    fn default_of_wrong_type_rejected() {
        let r = resolver(&[], "");
        let mut port = 0u16;
        let err = bind(&r, vec![Opt::new("port", Dest::U16(&mut port)).default("8080")]).unwrap_err();
        assert!(matches!(
            err,
            BindError::UnsupportedDefault {
                expected: "u16",
                found: "string",
                ..
            }
        ));

        let mut name = String::new();
        let err = bind(&r, vec![Opt::new("name", Dest::Str(&mut name)).default(5)]).unwrap_err();
        assert!(matches!(err, BindError::UnsupportedDefault { .. }));
    }

    #[test]
    fn bool_from_env() {
        let r = resolver(&[("ABC_DEBUG", "true")], "");
        let mut debug = false;
        bind(&r, vec![Opt::new("debug", Dest::Bool(&mut debug))]).unwrap();
        assert!(debug);
    }

    #[test]
    fn bad_bool_is_coercion_failure() {
        let r = resolver(&[("ABC_DEBUG", "notabool")], "");
        let mut debug = false;
        let err = bind(&r, vec![Opt::new("debug", Dest::Bool(&mut debug))]).unwrap_err();
        match err {
            BindError::Coercion { flag, value, .. } => {
                assert_eq!(flag, "debug");
                assert_eq!(value, "notabool");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_duration_leaves_destination_alone() {
        let r = resolver(&[("ABC_TIMEOUT", "5x")], "");
        let mut timeout = Duration::from_secs(42);
        let err = bind(
            &r,
            vec![Opt::new("timeout", Dest::Duration(&mut timeout)).default(Duration::from_secs(1))],
        )
        .unwrap_err();
        assert!(matches!(err, BindError::Coercion { kind: "duration", .. }));
        assert!(err.to_string().contains("timeout"));
        assert!(err.to_string().contains("5x"));
        assert_eq!(timeout, Duration::from_secs(42));
    }

    #[test]
    fn duration_from_env_and_string_default() {
        let r = resolver(&[("ABC_TIMEOUT", "2h30m")], "");
        let mut timeout = Duration::ZERO;
        let mut interval = Duration::ZERO;
        bind(
            &r,
            vec![
                Opt::new("timeout", Dest::Duration(&mut timeout)),
                Opt::new("interval", Dest::Duration(&mut interval)).default("30s"),
            ],
        )
        .unwrap();
        assert_eq!(timeout, Duration::from_secs(9000));
        assert_eq!(interval, Duration::from_secs(30));
    }

    #[test]
    fn overflowing_duration_is_coercion_failure() {
        let r = resolver(&[("ABC_T", "340282366920938463463374607431768211.999us")], "");
        let mut t = Duration::from_secs(1);
        let err = bind(&r, vec![Opt::new("t", Dest::Duration(&mut t))]).unwrap_err();
        assert!(matches!(err, BindError::Coercion { kind: "duration", .. }));
        assert_eq!(t, Duration::from_secs(1));
    }

    #[test]
    fn bad_duration_default_rejected() {
        let r = resolver(&[], "");
        let mut d = Duration::ZERO;
        let err = bind(&r, vec![Opt::new("d", Dest::Duration(&mut d)).default("soon")]).unwrap_err();
        assert!(matches!(err, BindError::InvalidDefault { .. }));
    }

    #[test]
    fn string_list_from_env_and_file() {
        let r = resolver(&[("ABC_TAGS", "a,b")], "hosts = [\"x\", \"y\"]");
        let mut tags = vec![];
        let mut hosts = vec![];
        bind(
            &r,
            vec![
                Opt::new("tags", Dest::StrList(&mut tags)),
                Opt::new("hosts", Dest::StrList(&mut hosts)).default(vec!["z"]),
            ],
        )
        .unwrap();
        assert_eq!(tags, vec!["a", "b"]);
        assert_eq!(hosts, vec!["x", "y"]);
    }

    #[test]
    fn string_map_last_duplicate_wins() {
        let r = resolver(&[("ABC_LABELS", "env=dev,team=core,env=prod")], "");
        let mut labels = BTreeMap::new();
        bind(&r, vec![Opt::new("labels", Dest::StrMap(&mut labels))]).unwrap();
        assert_eq!(labels.keys().collect::<Vec<_>>(), vec!["env", "team"]);
        assert_eq!(labels["env"], "prod");
    }

    #[test]
    fn string_map_from_file_table() {
        let r = resolver(&[], "[labels]\nenv = \"prod\"\n");
        let mut labels = BTreeMap::new();
        bind(&r, vec![Opt::new("labels", Dest::StrMap(&mut labels))]).unwrap();
        assert_eq!(labels["env"], "prod");
    }

    #[test]
    fn custom_values_from_env_and_default() {
        let r = resolver(&[("ABC_ORG_ID", "020f755c3c082000")], "");
        let mut org = Id::default();
        let mut level = LogLevel::default();
        bind(
            &r,
            vec![
                Opt::new("org-id", Dest::Custom(&mut org)),
                Opt::new("log-level", Dest::Custom(&mut level)).default("debug"),
            ],
        )
        .unwrap();
        assert_eq!(org.to_string(), "020f755c3c082000");
        assert_eq!(level.0, tracing::Level::DEBUG);
    }

    #[test]
    fn custom_parse_error_is_coercion_failure() {
        let r = resolver(&[("ABC_LOG_LEVEL", "loud")], "");
        let mut level = LogLevel::default();
        let err = bind(&r, vec![Opt::new("log-level", Dest::Custom(&mut level))]).unwrap_err();
        assert!(matches!(err, BindError::Coercion { kind: "LEVEL", .. }));
        assert_eq!(level, LogLevel::default());
    }

    #[test]
    fn failure_stops_binding_without_rollback() {
        let r = resolver(&[("ABC_A", "1"), ("ABC_B", "bad"), ("ABC_C", "3")], "");
        let (mut a, mut b, mut c) = (0i64, 0i64, 0i64);
        let result = bind(
            &r,
            vec![
                Opt::new("a", Dest::I64(&mut a)),
                Opt::new("b", Dest::I64(&mut b)),
                Opt::new("c", Dest::I64(&mut c)),
            ],
        );
        assert!(matches!(result, Err(BindError::Coercion { ref flag, .. }) if flag == "b"));
        drop(result);
        assert_eq!((a, b, c), (1, 0, 0));
    }

    #[test]
    fn duplicate_flag_rejected() {
        let r = resolver(&[], "");
        let (mut a, mut b) = (String::new(), String::new());
        let err = bind(
            &r,
            vec![
                Opt::new("name", Dest::Str(&mut a)),
                Opt::new("name", Dest::Str(&mut b)),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, BindError::Registration { .. }));
    }

    #[test]
    fn required_exempted_by_env() {
        let r = resolver(&[("ABC_TOKEN", "secret")], "");
        let mut token = String::new();
        let (cmd, b) = bind(&r, vec![Opt::new("token", Dest::Str(&mut token)).required()]).unwrap();
        assert!(cmd.clone().try_get_matches_from(["abc"]).is_ok());
        drop(b);
        assert_eq!(token, "secret");
    }

    #[test]
    fn required_not_exempted_by_config_file() {
        let r = resolver(&[], "token = \"from-file\"");
        let mut token = String::new();
        let (cmd, _b) = bind(&r, vec![Opt::new("token", Dest::Str(&mut token)).required()]).unwrap();
        let err = cmd.try_get_matches_from(["abc"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn required_with_nothing_fails_at_parse() {
        let r = Resolver::new("ABC", env(&[]), ConfigStore::empty());
        let mut token = String::new();
        let (cmd, _b) = bind(&r, vec![Opt::new("token", Dest::Str(&mut token)).required()]).unwrap();
        assert!(cmd.clone().try_get_matches_from(["abc"]).is_err());
        assert!(cmd.try_get_matches_from(["abc", "--token", "t"]).is_ok());
    }

    #[test]
    fn hidden_option_not_in_help() {
        let r = resolver(&[], "");
        let (mut a, mut b) = (String::new(), String::new());
        let (mut cmd, _b) = bind(
            &r,
            vec![
                Opt::new("shown", Dest::Str(&mut a)),
                Opt::new("secret", Dest::Str(&mut b)).hidden(),
            ],
        )
        .unwrap();
        let help = cmd.render_help().to_string();
        assert!(help.contains("--shown"));
        assert!(!help.contains("--secret"));
    }

    #[test]
    fn flag_beats_env_and_file() {
        let mut r = resolver(&[("ABC_PORT", "9090")], "port = 3000");
        let mut port = 0u16;
        let (cmd, mut b) =
            bind(&r, vec![Opt::new("port", Dest::U16(&mut port)).default(8080)]).unwrap();
        let m = cmd.try_get_matches_from(["abc", "--port", "7000"]).unwrap();
        b.apply_matches(&m, &mut r).unwrap();
        assert_eq!(b.source("port"), Some(Source::Flag));
        drop(b);
        assert_eq!(port, 7000);
    }

    #[test]
    fn unset_flag_keeps_resolved_value() {
        let mut r = resolver(&[("ABC_PORT", "9090")], "");
        let mut port = 0u16;
        let (cmd, mut b) = bind(&r, vec![Opt::new("port", Dest::U16(&mut port))]).unwrap();
        let m = cmd.try_get_matches_from(["abc"]).unwrap();
        b.apply_matches(&m, &mut r).unwrap();
        drop(b);
        assert_eq!(port, 9090);
    }

    #[test]
    fn flag_values_for_collections_and_bools() {
        let mut r = resolver(&[], "");
        let mut tags = vec![];
        let mut labels = BTreeMap::new();
        let mut verbose = false;
        let (cmd, mut b) = bind(
            &r,
            vec![
                Opt::new("tags", Dest::StrList(&mut tags)).short('t'),
                Opt::new("labels", Dest::StrMap(&mut labels)),
                Opt::new("verbose", Dest::Bool(&mut verbose)).short('v'),
            ],
        )
        .unwrap();
        let m = cmd
            .try_get_matches_from([
                "abc", "-t", "a,b", "-t", "c", "--labels", "k=1,j=2", "--labels", "k=3", "-v",
            ])
            .unwrap();
        b.apply_matches(&m, &mut r).unwrap();
        drop(b);
        assert_eq!(tags, vec!["a", "b", "c"]);
        assert_eq!(labels["k"], "3");
        assert_eq!(labels["j"], "2");
        assert!(verbose);
    }

    #[test]
    fn bad_flag_value_is_coercion_failure() {
        let mut r = resolver(&[], "");
        let mut port = 0u16;
        let (cmd, mut b) = bind(&r, vec![Opt::new("port", Dest::U16(&mut port))]).unwrap();
        let m = cmd.try_get_matches_from(["abc", "--port", "99999"]).unwrap();
        let err = b.apply_matches(&m, &mut r).unwrap_err();
        assert!(matches!(err, BindError::Coercion { ref value, .. } if value == "99999"));
    }

    #[test]
    fn persistent_flag_recorded_in_resolver() {
        let mut r = resolver(&[("ABC_HOST", "env-host")], "");
        let mut host = String::new();
        let (cmd, mut b) =
            bind(&r, vec![Opt::new("host", Dest::Str(&mut host)).persistent()]).unwrap();
        let m = cmd.try_get_matches_from(["abc", "--host", "cli-host"]).unwrap();
        b.apply_matches(&m, &mut r).unwrap();

        let o = r.lookup("host").unwrap();
        assert_eq!(o.source, Source::Flag);
        assert_eq!(o.value, Value::String("cli-host".into()));
    }

    #[test]
    fn persistent_flag_with_env_name_sees_own_overlay() {
        let mut r = resolver(&[], "");
        let mut path = String::new();
        let (cmd, mut b) = bind(
            &r,
            vec![
                Opt::new("bolt-path", Dest::Str(&mut path))
                    .env_var("bolt-file")
                    .persistent(),
            ],
        )
        .unwrap();
        let m = cmd
            .try_get_matches_from(["abc", "--bolt-path", "/tmp/db"])
            .unwrap();
        b.apply_matches(&m, &mut r).unwrap();

        let o = r.lookup("bolt-file").unwrap();
        assert_eq!(o.source, Source::Flag);
        assert_eq!(o.value, Value::String("/tmp/db".into()));
    }

    #[test]
    fn required_persistent_binds_and_is_checked_after_parse() {
        let r = resolver(&[], "");
        let mut host = String::new();
        let (mut cmd, b) = bind(
            &r,
            vec![Opt::new("host", Dest::Str(&mut host)).persistent().required()],
        )
        .unwrap();

        let m = cmd.clone().try_get_matches_from(["abc"]).unwrap();
        let err = b.check_required(&mut cmd, &m).unwrap_err();
        match err {
            BindError::Cli(e) => assert_eq!(e.kind(), clap::error::ErrorKind::MissingRequiredArgument),
            other => panic!("unexpected error: {other}"),
        }

        let m = cmd.clone().try_get_matches_from(["abc", "--host", "h"]).unwrap();
        assert!(b.check_required(&mut cmd, &m).is_ok());
    }

    #[test]
    fn required_persistent_exempted_by_env() {
        let r = resolver(&[("ABC_HOST", "env-host")], "");
        let mut host = String::new();
        let (mut cmd, b) = bind(
            &r,
            vec![Opt::new("host", Dest::Str(&mut host)).persistent().required()],
        )
        .unwrap();
        let m = cmd.clone().try_get_matches_from(["abc"]).unwrap();
        assert!(b.check_required(&mut cmd, &m).is_ok());
        drop(b);
        assert_eq!(host, "env-host");
    }

    #[test]
    fn persistent_flag_reaches_subcommand() {
        let mut r = resolver(&[], "");
        let mut host = String::new();
        let (cmd, mut b) =
            bind(&r, vec![Opt::new("host", Dest::Str(&mut host)).persistent()]).unwrap();
        let cmd = cmd.subcommand(Command::new("serve"));
        let m = cmd.try_get_matches_from(["abc", "serve", "--host", "h"]).unwrap();
        let (_, sub) = m.subcommand().unwrap();
        b.apply_matches(sub, &mut r).unwrap();
        drop(b);
        assert_eq!(host, "h");
    }

    #[test]
    fn non_persistent_flag_not_recorded() {
        let mut r = resolver(&[], "");
        let mut host = String::new();
        let (cmd, mut b) = bind(&r, vec![Opt::new("host", Dest::Str(&mut host))]).unwrap();
        let m = cmd.try_get_matches_from(["abc", "--host", "h"]).unwrap();
        b.apply_matches(&m, &mut r).unwrap();
        assert!(r.store().flag("host").is_none());
    }

    #[test]
    fn defaults_rendered_for_help() {
        assert_eq!(default_text(&DefaultValue::Int(8080)), "8080");
        assert_eq!(
            default_text(&DefaultValue::from(Duration::from_secs(90))),
            "1m30s"
        );
        assert_eq!(default_text(&DefaultValue::from(vec!["a", "b"])), "[a,b]");
        let map: BTreeMap<String, String> = [("k".to_string(), "v".to_string())].into();
        assert_eq!(default_text(&DefaultValue::from(map)), "[k=v]");
    }
}
