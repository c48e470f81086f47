//! `cockpit` - inspect and flush the cockpit offline queue and backups
//!
//! ```text
//! cockpit --storage ./state status
//! cockpit --storage ./state backups --json
//! cockpit --storage ./state --endpoint https://cockpits.example --token $T flush
//! ```

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use cockpit_core::{CockpitEditor, EditorConfig};
use cockpit_sync::{BackupStore, FileStorage, OfflineQueue, Storage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("cockpit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and flush the cockpit offline queue and local backups")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML config file"),
        )
        .arg(
            Arg::new("storage")
                .long("storage")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding the queue and backups"),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .global(true)
                .help("Base URL of the cockpit store"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .global(true)
                .help("Bearer token sent with every request"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("status")
                .about("Show queued writes")
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("backups")
                .about("List local backups")
                .arg(json_flag()),
        )
        .subcommand(Command::new("flush").about("Probe the server and send every queued write"))
}

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON")
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Config file (if any), then environment, then command-line flags
fn resolve_config(matches: &ArgMatches, env: impl Fn(&str) -> Option<String>) -> Result<EditorConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    config.apply_env_overrides(env);
    if let Some(endpoint) = matches.get_one::<String>("endpoint") {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(dir) = matches.get_one::<PathBuf>("storage") {
        config.storage_dir = Some(dir.clone());
    }
    config.validate()?;
    Ok(config)
}

fn open_storage(config: &EditorConfig) -> Result<Arc<dyn Storage>> {
    let dir = config
        .storage_dir
        .as_ref()
        .context("no storage directory: pass --storage or set storage_dir")?;
    let storage = FileStorage::open(dir)
        .with_context(|| format!("opening storage at {}", dir.display()))?;
    Ok(Arc::new(storage))
}

fn status(config: &EditorConfig, json: bool) -> Result<()> {
    let queue = OfflineQueue::load(open_storage(config)?)?;
    if json {
        let writes: Vec<_> = queue.iter().collect();
        println!("{}", serde_json::to_string_pretty(&writes)?);
        return Ok(());
    }

    println!("{} pending write(s)", queue.len());
    for write in queue.iter() {
        println!(
            "  {}  cockpit={}  kind={:?}  retries={}  created={}",
            write.id,
            write.cockpit_id,
            write.kind,
            write.retry_count,
            write.created_at.to_rfc3339()
        );
        if let Some(error) = &write.last_error {
            println!("      last error: {error}");
        }
    }
    Ok(())
}

fn backups(config: &EditorConfig, json: bool) -> Result<()> {
    let backups = BackupStore::new(open_storage(config)?).list()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&backups)?);
        return Ok(());
    }

    println!("{} backup(s)", backups.len());
    for backup in &backups {
        println!(
            "  {}  {:?}  backed up {}",
            backup.cockpit.id,
            backup.cockpit.name,
            backup.backed_up_at.to_rfc3339()
        );
    }
    Ok(())
}

async fn flush(config: &EditorConfig, token: Option<&str>) -> Result<()> {
    open_storage(config)?;
    let editor = CockpitEditor::from_config(config, token)?;
    let result = editor.force_sync().await;
    let pending = editor.sync_state().pending_count;
    editor.dispose();

    let report = result.context("server unreachable, writes stay queued")?;
    println!(
        "sent {}, conflicts {}, dropped {}, {} still queued",
        report.sent, report.conflicts, report.dropped, pending
    );
    if let Some(delay) = report.retry_in {
        println!("next retry was due in {}s; run flush again later", delay.as_secs());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));
    let config = resolve_config(&matches, |key| std::env::var(key).ok())?;
    let token = matches.get_one::<String>("token").map(String::as_str);

    match matches.subcommand() {
        Some(("status", args)) => status(&config, args.get_flag("json")),
        Some(("backups", args)) => backups(&config, args.get_flag("json")),
        Some(("flush", _)) => flush(&config, token).await,
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("no command given"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cockpit_model::Cockpit;
    use cockpit_sync::PendingWrite;

    fn parse(args: &[&str]) -> ArgMatches {
        cli().try_get_matches_from(args).unwrap()
    }

    #[test]
    fn command_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn flags_override_environment() {
        let matches = parse(&["cockpit", "--storage", "/tmp/state", "--endpoint", "https://a.example", "status"]);
        let config = resolve_config(&matches, |_| Some("https://env.example".into())).unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("https://a.example"));
        assert_eq!(config.storage_dir, Some(PathBuf::from("/tmp/state")));

        let matches = parse(&["cockpit", "backups", "--storage", "/tmp/state"]);
        let config = resolve_config(&matches, |_| Some("https://env.example".into())).unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("https://env.example"));
    }

    #[test]
    fn rejects_bad_endpoint_flag() {
        let matches = parse(&["cockpit", "--endpoint", "localhost", "status"]);
        assert!(resolve_config(&matches, |_| None).is_err());
    }

    #[test]
    fn reads_queue_and_backups_from_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(dir.path()).unwrap());
        let cockpit = Cockpit::new("Plant");
        BackupStore::new(Arc::clone(&storage)).save(&cockpit).unwrap();
        let mut queue = OfflineQueue::load(storage).unwrap();
        queue.enqueue(PendingWrite::update(&cockpit), None).unwrap();

        let config = EditorConfig::new().with_storage_dir(dir.path());
        status(&config, false).unwrap();
        status(&config, true).unwrap();
        backups(&config, true).unwrap();

        assert!(status(&EditorConfig::new(), false).is_err());
    }
}
