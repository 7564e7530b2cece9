//! Runs one pipeline participant against a file-backed record store, so the
//! driver and each triangulator can live in separate processes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use driver::Driver;
use log::info;
use runtime_native::SessionConfig;
use service_abi::Participant;
use transport::{CancelToken, Endpoint, FileStore, RecordId, StoreHandle, Waiter};
use triangulator::Triangulator;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a WAB pipeline participant", long_about = None)]
struct Cli {
    /// Session settings (TOML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Record store directory; overrides `root` from the config.
    #[arg(short, long, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    role: Role,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Role {
    /// Seed the matrices and schedule commands from `driver_in`.
    Driver,
    /// Rasterize draws handed to `T<index>`.
    Triangulator {
        /// Worker index, starting at 1.
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        index: u32,
    },
}

fn load_config(cli: &Cli) -> Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.root = Some(root.clone());
    }
    Ok(config)
}

fn open_store(config: &SessionConfig) -> Result<Arc<FileStore>> {
    let root = config
        .root
        .as_ref()
        .ok_or_else(|| anyhow!("no store root: pass --root or set `root` in the config"))?;
    let store = FileStore::open(root, config.read_semantics)
        .with_context(|| format!("opening record store {}", root.display()))?;
    Ok(Arc::new(store))
}

/// Every record a session with `config` touches.
fn session_records(config: &SessionConfig) -> Vec<RecordId> {
    let mut ids = vec![
        RecordId::driver_in(),
        RecordId::driver_out(),
        RecordId::raster_matrix(),
        RecordId::depth_matrix(),
    ];
    for index in config.roster() {
        ids.push(RecordId::triangulator_in(index));
        ids.push(RecordId::triangulator_out(index));
    }
    ids
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    config.validate()?;
    let store = open_store(&config)?;
    let waiter = Waiter::new(config.wait, CancelToken::new());

    let mut participant: Box<dyn Participant> = match cli.role {
        Role::Driver => {
            store
                .clear_stale_leases(session_records(&config))
                .context("clearing stale write leases")?;
            let handle: StoreHandle = store;
            let mut driver = Driver::new(Endpoint::new(handle, waiter), config.driver_config());
            driver.initialize().context("initializing driver")?;
            Box::new(driver)
        }
        Role::Triangulator { index } => {
            let handle: StoreHandle = store;
            Box::new(Triangulator::new(
                Endpoint::new(handle, waiter),
                config.triangulator_config(index),
            ))
        }
    };

    info!("{}: running", participant.name());
    participant
        .run()
        .with_context(|| format!("{} stopped", participant.name()))?;
    info!("{}: shut down", participant.name());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn triangulator_needs_a_positive_index() {
        let cli = Cli::try_parse_from(["wab-node", "--root", "/tmp/w", "triangulator", "-i", "2"])
            .unwrap();
        assert_eq!(cli.role, Role::Triangulator { index: 2 });
        assert!(Cli::try_parse_from(["wab-node", "triangulator", "--index", "0"]).is_err());
        assert!(Cli::try_parse_from(["wab-node", "triangulator"]).is_err());
    }

    #[test]
    fn root_flag_overrides_the_config() {
        let dir = std::env::temp_dir();
        let args: Vec<std::ffi::OsString> = vec![
            "wab-node".into(),
            "--root".into(),
            dir.clone().into_os_string(),
            "driver".into(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.root, Some(dir));
        assert_eq!(session_records(&config).len(), 6);
    }

    #[test]
    fn missing_root_is_an_error() {
        let cli = Cli::try_parse_from(["wab-node", "driver"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert!(open_store(&config).is_err());
    }
}
