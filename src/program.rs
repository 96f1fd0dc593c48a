use clap::{ArgMatches, Command};
use tracing::debug;

use crate::bind::{self, Bindings};
use crate::env::{self, EnvSource};
use crate::error::BindError;
use crate::file::ConfigLocation;
use crate::resolve::Resolver;
use crate::store::ConfigStore;
use crate::types::{Opt, SearchPath};

/// A command-line program whose options are bound to flags, environment
/// variables and a config file.
///
/// Ties the pieces together the usual way:
///
/// - **Environment**: variables are read as `{NAME}_{OPTION}`, with the program
///   name upper-cased and hyphens turned into underscores.
/// - **Config file**: `{NAME}_CONFIG_PATH` picks the file or directory;
///   otherwise the [`search_paths()`](Self::search_paths) are searched for
///   `config.{json,toml,yaml,yml}`.
/// - **Flags**: every option becomes a `--flag` on a [`clap::Command`] named
///   after the program.
///
/// ```ignore
/// let mut port = 0u16;
/// let mut cmd = Program::new("abc")
///     .opt(Opt::new("port", Dest::U16(&mut port)).default(8080))
///     .build(StdEnv)?;
/// cmd.try_get_matches_from(std::env::args_os())?;
/// ```
pub struct Program<'a> {
    name: String,
    about: Option<String>,
    env_prefix: Option<String>,
    search_paths: Vec<SearchPath>,
    opts: Vec<Opt<'a>>,
    subcommands: Vec<Command>,
}

impl<'a> Program<'a> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            about: None,
            env_prefix: None,
            search_paths: vec![SearchPath::Cwd],
            opts: Vec::new(),
            subcommands: Vec::new(),
        }
    }

    pub fn about(mut self, about: &str) -> Self {
        self.about = Some(about.to_string());
        self
    }

    /// Override the environment variable prefix (default: derived from the name).
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Replace the config search paths (default: `[Cwd]`). The first directory
    /// holding a config file wins.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn opt(mut self, opt: Opt<'a>) -> Self {
        self.opts.push(opt);
        self
    }

    pub fn opts(mut self, opts: impl IntoIterator<Item = Opt<'a>>) -> Self {
        self.opts.extend(opts);
        self
    }

    /// Attach a subcommand. Persistent options are visible inside it.
    pub fn subcommand(mut self, cmd: Command) -> Self {
        self.subcommands.push(cmd);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The prefix environment variables are read under.
    pub fn effective_env_prefix(&self) -> String {
        match &self.env_prefix {
            Some(prefix) => prefix.to_uppercase(),
            None => self.name.replace('-', "_").to_uppercase(),
        }
    }

    /// Where the config file is read from, honoring `{PREFIX}_CONFIG_PATH`.
    pub fn config_location(&self, env: &dyn EnvSource) -> Result<ConfigLocation, BindError> {
        match env::lookup(env, &self.effective_env_prefix(), "config-path") {
            Some(path) => {
                debug!(path = %path, "config path from environment");
                ConfigLocation::from_config_path(&path)
            }
            None => Ok(ConfigLocation::Search(self.search_paths.clone())),
        }
    }

    /// Load the config file, bind every option, and build the command.
    pub fn build(self, env: impl EnvSource + 'static) -> Result<BoundCommand<'a>, BindError> {
        let location = self.config_location(&env)?;
        let store = ConfigStore::load(&location, &self.name)?;
        let resolver = Resolver::new(&self.effective_env_prefix(), env, store);

        let mut cmd = Command::new(self.name.clone())
            .args_override_self(true)
            .subcommands(self.subcommands);
        if let Some(about) = self.about {
            cmd = cmd.about(about);
        }

        let (command, bindings) = bind::bind_options(cmd, &resolver, self.opts)?;
        Ok(BoundCommand {
            command,
            bindings,
            resolver,
        })
    }
}

/// A built command holding the bound options until argv is parsed.
pub struct BoundCommand<'a> {
    command: Command,
    bindings: Bindings<'a>,
    resolver: Resolver,
}

impl<'a> BoundCommand<'a> {
    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn bindings(&self) -> &Bindings<'a> {
        &self.bindings
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Parse `argv` and write explicit flag values into their destinations.
    ///
    /// Missing required flags and unknown flags surface as [`BindError::Cli`].
    pub fn try_get_matches_from<I, T>(&mut self, argv: I) -> Result<ArgMatches, BindError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = self.command.try_get_matches_from_mut(argv)?;
        self.bindings.check_required(&mut self.command, &matches)?;

        let mut current = Some(&matches);
        while let Some(m) = current {
            self.bindings.apply_matches(m, &mut self.resolver)?;
            current = m.subcommand().map(|(_, sub)| sub);
        }
        Ok(matches)
    }

    pub fn render_help(&mut self) -> String {
        self.command.render_help().to_string()
    }
}
