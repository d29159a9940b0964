//! Familiar service binary.
//!
//! Runs the bootstrap the way the host application does, for development and
//! for hosts that launch the service as a child process.
//!
//! # Usage
//!
//! ```bash
//! # Fresh environment, provider staged by the host, PIN handed over in a
//! # file the binary deletes once read
//! familiar-server --data-dir /srv/familiar \
//!     --env FAMILIAR_LLM_PROVIDER=ollama --pin-file /run/familiar/pin
//!
//! # Start from the process environment, host values on top
//! familiar-server --data-dir /srv/familiar --inherit-env
//! ```
//!
//! The raw PIN is refused in `--env`: process arguments stay readable for
//! the whole run. It is also never taken from the inherited environment.
//!
//! The dashboard key is written to `<data-dir>/.dashboard_key`. SIGINT and
//! SIGTERM request a graceful shutdown.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use clap::Parser;
use familiar_core::{ConfigMap, ConfigValue, ServiceEnv, keys};
use familiar_server::{Bootstrap, LocalAgent, LoopbackDashboard, ShutdownHandle};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

/// Familiar embedded service
#[derive(Parser, Debug)]
#[command(name = "familiar-server")]
#[command(about = "Bootstrap the Familiar agent and its loopback dashboard")]
#[command(version)]
struct Args {
    /// Host data directory (key file and `.familiar/` data root live here)
    #[arg(short, long)]
    data_dir: PathBuf,

    /// Host configuration entry, repeatable
    #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    env: Vec<(String, String)>,

    /// File holding the owner PIN; deleted as soon as it is read
    #[arg(long, value_name = "PATH")]
    pin_file: Option<PathBuf>,

    /// Seed the service environment from the process environment
    #[arg(long)]
    inherit_env: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    let (key, value) =
        raw.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    if key.is_empty() {
        return Err("empty key".to_string());
    }
    if keys::is_raw_secret(key) {
        return Err(format!("{key} would stay readable in the process arguments; use --pin-file"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Read the staged PIN and remove the file.
///
/// The file is gone before the PIN is used; failing to delete it aborts the
/// start. One trailing line ending is stripped.
fn read_pin_file(path: &Path) -> io::Result<Zeroizing<String>> {
    let mut pin = Zeroizing::new(fs::read_to_string(path)?);
    fs::remove_file(path)?;

    let len = pin.strip_suffix('\n').map_or(pin.len(), |rest| rest.trim_end_matches('\r').len());
    pin.truncate(len);
    Ok(pin)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let data_dir = std::path::absolute(&args.data_dir)?;
    let mut config: ConfigMap =
        args.env.into_iter().map(|(key, value)| (key, ConfigValue::Text(value))).collect();
    if let Some(path) = &args.pin_file {
        let pin = read_pin_file(path)?;
        config.insert(keys::OWNER_PIN_RAW.to_string(), ConfigValue::Text(pin.to_string()));
    }
    let base = if args.inherit_env { ServiceEnv::inherit_process() } else { ServiceEnv::new() };

    tracing::info!(data_dir = %data_dir.display(), keys = config.len(), "Familiar server starting");

    let bootstrap = Bootstrap::new(LocalAgent::factory(), LoopbackDashboard).inherit(base);
    tokio::spawn(forward_signals(bootstrap.shutdown_handle()));

    bootstrap.run(&data_dir, config).await?;

    Ok(())
}

/// Turn SIGINT/SIGTERM into a shutdown request.
async fn forward_signals(shutdown: ShutdownHandle) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    shutdown.stop();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_pair_splits_on_first_equals() {
        assert_eq!(
            parse_env_pair("OLLAMA_URL=http://x/?a=b").unwrap(),
            ("OLLAMA_URL".to_string(), "http://x/?a=b".to_string())
        );
        assert_eq!(parse_env_pair("EMPTY=").unwrap(), ("EMPTY".to_string(), String::new()));
    }

    #[test]
    fn env_pair_rejects_malformed() {
        assert!(parse_env_pair("NOVALUE").is_err());
        assert!(parse_env_pair("=value").is_err());
    }

    #[test]
    fn env_pair_rejects_raw_pin_keys() {
        assert!(parse_env_pair("OWNER_PIN_RAW=4821").is_err());
        assert!(parse_env_pair("FAMILIAR_OWNER_PIN_RAW=4821").is_err());
        assert!(parse_env_pair("OWNER_PIN_HASH=ab:cd").is_ok());
    }

    #[test]
    fn args_refuse_pin_on_command_line() {
        let result = Args::try_parse_from([
            "familiar-server",
            "--data-dir",
            "/tmp/familiar",
            "--env",
            "OWNER_PIN_RAW=4821",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn pin_file_is_read_then_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pin");
        fs::write(&path, "4821\r\n").unwrap();

        let pin = read_pin_file(&path).unwrap();

        assert_eq!(pin.as_str(), "4821");
        assert!(!path.exists());
    }

    #[test]
    fn pin_file_keeps_inner_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pin");
        fs::write(&path, " 12 34").unwrap();

        assert_eq!(read_pin_file(&path).unwrap().as_str(), " 12 34");
    }

    #[test]
    fn missing_pin_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_pin_file(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn args_accept_pin_file() {
        let args = Args::parse_from([
            "familiar-server",
            "--data-dir",
            "/tmp/familiar",
            "--pin-file",
            "/run/familiar/pin",
        ]);
        assert_eq!(args.pin_file, Some(PathBuf::from("/run/familiar/pin")));
    }

    #[test]
    fn args_collect_repeated_env() {
        let args = Args::parse_from([
            "familiar-server",
            "--data-dir",
            "/tmp/familiar",
            "--env",
            "A=1",
            "-e",
            "B=2",
        ]);
        assert_eq!(args.env.len(), 2);
        assert!(!args.inherit_env);
        assert_eq!(args.log_level, "info");
    }
}
