//! Declarative option binding for command-line programs. List your options,
//! point each at a variable, and go.
//!
//! Optbind wires every option to three sources (command-line flags,
//! environment variables and a config file), resolves them in a fixed order,
//! converts the winning value to the option's type and writes it into the
//! caller's variable.
//!
//! ```ignore
//! let mut port = 0u16;
//! let mut timeout = Duration::ZERO;
//! let mut cmd = Program::new("abc")
//!     .opt(Opt::new("port", Dest::U16(&mut port)).default(8080))
//!     .opt(Opt::new("timeout", Dest::Duration(&mut timeout)).default("30s"))
//!     .build(StdEnv)?;
//! cmd.try_get_matches_from(std::env::args_os())?;
//! ```
//!
//! That call reads `./config.{json,toml,yaml,yml}` if present, checks
//! `ABC_PORT` and `ABC_TIMEOUT`, registers `--port` and `--timeout`, and
//! leaves the resolved values in `port` and `timeout`.
//!
//! # Precedence
//!
//! ```text
//! Registered default    Opt::default(...)
//!        ↑ overridden by
//! Config file           config.{json,toml,yaml,yml}
//!        ↑ overridden by
//! Environment vars      PREFIX_NAME
//!        ↑ overridden by
//! Command-line flags    --name value
//! ```
//!
//! Binding happens in two steps. [`bind_options`] consults the environment
//! and config file for each option while registering its flag, so
//! destinations hold their resolved values before argv is seen.
//! [`Bindings::apply_matches`] then writes values typed on the command line,
//! which is what puts flags on top.
//!
//! # Destinations and defaults
//!
//! A [`Dest`] names the variable an option writes and, by its variant, the
//! option's type: strings, `i32`/`i64`/`u16`/`u32`/`u64`, `bool`,
//! [`Duration`](std::time::Duration), string lists, string maps, or any type
//! implementing [`FlagValue`] (see [`Id`] and [`LogLevel`]).
//!
//! Defaults are a [`DefaultValue`]. Integer literals of any width are
//! accepted and checked against the destination width; a default that does
//! not fit, or is of the wrong family, fails the binding. An option with no
//! default and no override is set to its type's zero value.
//!
//! # Environment variables
//!
//! With prefix `ABC`:
//!
//! | Option | Env var |
//! |--------|---------|
//! | `port` | `ABC_PORT` |
//! | `log-level` | `ABC_LOG_LEVEL` |
//! | `bolt-path` with `.env_var("bolt-file")` | `ABC_BOLT_FILE` |
//!
//! Empty variables count as unset. Reads go through the [`EnvSource`] trait;
//! [`StdEnv`] is the process environment and [`MapEnv`] a fixed map for
//! tests.
//!
//! # Config file
//!
//! The file is named `config` with one of the extensions `json`, `toml`,
//! `yaml`, `yml`, tried in that order in each [`SearchPath`]. The first
//! directory that has one wins. `{PREFIX}_CONFIG_PATH` overrides the search:
//! a path with a known extension is used as the file, a path without one as
//! the only directory to search. A missing file is not an error; a malformed
//! one is. Keys are case-insensitive and dotted names reach into tables.
//!
//! # Required and hidden options
//!
//! A required option must be given on the command line unless an environment
//! variable supplies it. A value in the config file does **not** satisfy a
//! required option. Hidden options work normally but are left out of help.
//!
//! # Persistent options
//!
//! Persistent options are visible in every subcommand. When one is set on
//! the command line its value is also recorded in the [`Resolver`], ahead of
//! the environment and config file, so later lookups of the same name see it.
//!
//! # Error handling
//!
//! All fallible operations return [`BindError`]. Binding stops at the first
//! failing option; options bound before it keep their values, and the failing
//! option's variable is left untouched.

pub mod coerce;
pub mod duration;
pub mod error;
pub mod types;
pub mod value;

mod bind;
mod env;
mod file;
mod flags;
mod program;
mod resolve;
mod store;

#[cfg(test)]
mod fixtures;

pub use bind::{Binding, Bindings, bind_into, bind_options};
pub use env::{EnvSource, MapEnv, StdEnv, env_key};
pub use error::BindError;
pub use file::{CONFIG_BASENAME, ConfigLocation, EXTENSIONS};
pub use flags::{Flag, FlagKind, FlagSet};
pub use program::{BoundCommand, Program};
pub use resolve::{Override, Resolver, Source};
pub use store::ConfigStore;
pub use types::{DefaultValue, Dest, Opt, SearchPath};
pub use value::{FlagValue, Id, LogLevel};
