//! # optbind demo application
//!
//! A sample server launcher that showcases how options are bound to flags,
//! environment variables and a config file. This is **not** a real app; it
//! exists purely to demonstrate and manually verify optbind's behavior.
//!
//! ## Running
//!
//! ```sh
//! DEMO_TOKEN=secret cargo run --example optbind_demo -- show
//! cargo run --example optbind_demo -- --help
//! ```
//!
//! `--token` is required, so every run below needs `DEMO_TOKEN` set or
//! `--token` passed.
//!
//! ## Features demonstrated
//!
//! | Feature               | How to exercise it                                                     |
//! |-----------------------|------------------------------------------------------------------------|
//! | Registered defaults   | `cargo run --example optbind_demo -- show`                             |
//! | Config file (cwd)     | Create `config.toml` with `port = 3000` in cwd, then run `show`        |
//! | Config path override  | `DEMO_CONFIG_PATH=/etc/demo/app.yaml cargo run --example optbind_demo -- show` |
//! | Env var override      | `DEMO_PORT=9090 cargo run --example optbind_demo -- show`              |
//! | Env var name override | `DEMO_BOLT_FILE=/tmp/x.db cargo run --example optbind_demo -- show`     |
//! | Flag override         | `cargo run --example optbind_demo -- --port 7000 show`                 |
//! | Persistent flag       | `cargo run --example optbind_demo -- show --log-level debug`           |
//! | Lists and maps        | `cargo run --example optbind_demo -- --tags a,b --labels env=prod show` |
//! | Required option       | `cargo run --example optbind_demo -- serve` fails without a token      |
//! | Hidden option         | `--org-id` works but does not appear in `--help`                      |

use std::collections::BTreeMap;
use std::process;
use std::time::Duration;

use clap::Command;
use tracing::info;
use tracing_subscriber::EnvFilter;

use optbind::{BindError, Dest, Id, LogLevel, Opt, Program, SearchPath, StdEnv};

#[derive(Debug, Default)]
struct Settings {
    host: String,
    port: u16,
    bolt_path: String,
    timeout: Duration,
    workers: i32,
    debug: bool,
    tags: Vec<String>,
    labels: BTreeMap<String, String>,
    token: String,
    org_id: Id,
    log_level: LogLevel,
}

fn run(settings: &mut Settings) -> Result<Option<String>, BindError> {
    let mut cmd = Program::new("demo")
        .about("optbind demo: a sample server launcher")
        .search_paths(vec![SearchPath::Home(".optbind-demo"), SearchPath::Cwd])
        .opt(
            Opt::new("host", Dest::Str(&mut settings.host))
                .default("localhost")
                .desc("Address to bind"),
        )
        .opt(
            Opt::new("port", Dest::U16(&mut settings.port))
                .short('p')
                .default(8080)
                .desc("Port to listen on"),
        )
        .opt(
            Opt::new("bolt-path", Dest::Str(&mut settings.bolt_path))
                .env_var("bolt-file")
                .default("demo.db")
                .desc("Path to the database file"),
        )
        .opt(
            Opt::new("timeout", Dest::Duration(&mut settings.timeout))
                .default(Duration::from_secs(30))
                .desc("Request timeout"),
        )
        .opt(
            Opt::new("workers", Dest::I32(&mut settings.workers))
                .default(4u8)
                .desc("Worker threads"),
        )
        .opt(Opt::new("debug", Dest::Bool(&mut settings.debug)).desc("Enable debug endpoints"))
        .opt(Opt::new("tags", Dest::StrList(&mut settings.tags)).desc("Tags to attach"))
        .opt(Opt::new("labels", Dest::StrMap(&mut settings.labels)).desc("Labels to attach"))
        .opt(
            Opt::new("token", Dest::Str(&mut settings.token))
                .desc("API token")
                .required(),
        )
        .opt(
            Opt::new("org-id", Dest::Custom(&mut settings.org_id))
                .desc("Organization ID")
                .hidden(),
        )
        .opt(
            Opt::new("log-level", Dest::Custom(&mut settings.log_level))
                .default("info")
                .desc("Log verbosity")
                .persistent(),
        )
        .subcommand(Command::new("serve").about("Pretend to start the server"))
        .subcommand(Command::new("show").about("Print the resolved settings"))
        .build(StdEnv)?;

    let matches = cmd.try_get_matches_from(std::env::args_os())?;
    Ok(matches.subcommand_name().map(str::to_string))
}

fn show(settings: &Settings) {
    let labels: Vec<String> = settings
        .labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    let entries = [
        ("host", settings.host.clone()),
        ("port", settings.port.to_string()),
        ("bolt-path", settings.bolt_path.clone()),
        ("timeout", optbind::duration::format(settings.timeout)),
        ("workers", settings.workers.to_string()),
        ("debug", settings.debug.to_string()),
        ("tags", settings.tags.join(",")),
        ("labels", labels.join(",")),
        ("org-id", settings.org_id.to_string()),
        ("log-level", settings.log_level.to_string()),
    ];
    let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in &entries {
        println!("{key:<width$}  {value}");
    }
}

fn main() {
    let mut settings = Settings::default();
    let subcommand = match run(&mut settings) {
        Ok(name) => name,
        Err(BindError::Cli(e)) => e.exit(),
        Err(e) => {
            eprintln!("Failed to bind options:\n{e}");
            process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(settings.log_level.to_string()))
        .init();

    match subcommand.as_deref() {
        Some("serve") => {
            info!(host = %settings.host, port = settings.port, workers = settings.workers, "serving");
            println!("listening on {}:{}", settings.host, settings.port);
        }
        _ => show(&settings),
    }
}
