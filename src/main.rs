use anyhow::{Context, Result};
use clap::Parser;
use rs_timelocale::logging::init_logging;
use rs_timelocale::{ConnectOptions, HostKeyPolicy, RemoteConfigurator, RunConfig, SshConnector, VerifyMode};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "rs-timelocale",
    version,
    about = "Enable NTP, set the timezone and console keymap on a remote host over SSH, then verify"
)]
struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// YAML or JSON run configuration; SSH_PASSWORD fills a missing password
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override SSH_HOST
    #[arg(long)]
    host: Option<String>,

    /// Override SSH_PORT
    #[arg(long)]
    port: Option<u16>,

    /// Override SSH_USERNAME
    #[arg(long)]
    username: Option<String>,

    /// Append-only log file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Verification mode
    #[arg(long, value_enum)]
    mode: Option<VerifyMode>,

    /// Exit with status 1 when the connection, a command or a check fails
    #[arg(long)]
    strict: bool,

    /// Bound every remote call to this many seconds (0 waits forever)
    #[arg(long = "command-timeout", value_name = "SECS")]
    command_timeout: Option<u64>,

    /// TCP connect and handshake timeout in seconds
    #[arg(long = "connect-timeout", value_name = "SECS")]
    connect_timeout: Option<u64>,

    /// How to treat host keys not found in known_hosts
    #[arg(long, value_enum)]
    host_key_policy: Option<HostKeyPolicy>,

    /// known_hosts file to check and record host keys in
    #[arg(long)]
    known_hosts: Option<PathBuf>,

    /// Print the run report as JSON when finished
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn load_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = RunConfig::from_file(path)
                    .with_context(|| format!("loading {}", path.display()))?;
                config.merge_env_secret(|key| std::env::var(key).ok());
                config
            }
            None => RunConfig::from_env().context("reading SSH_* environment")?,
        };

        if let Some(host) = &self.host {
            config.host.hostname = host.clone();
        }
        if let Some(port) = self.port {
            config.host.port = port;
        }
        if let Some(username) = &self.username {
            config.host.username = username.clone();
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = log_file.clone();
        }
        if let Some(mode) = self.mode {
            config.verify_mode = mode;
        }
        if let Some(secs) = self.command_timeout {
            config.command_timeout_secs = secs;
        }
        if let Some(secs) = self.connect_timeout {
            config.connect_timeout_secs = secs;
        }
        if let Some(policy) = self.host_key_policy {
            config.host_key_policy = policy;
        }
        if let Some(path) = &self.known_hosts {
            config.known_hosts_path = Some(path.clone());
        }
        Ok(config)
    }
}

/// 默认的 .env 可以不存在，但存在时必须能解析
fn optional_env_file(loaded: dotenvy::Result<PathBuf>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        // 没有 .env 文件时直接使用进程环境
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e).context("loading .env"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path).with_context(|| format!("loading {}", path.display()))?;
        }
        None => optional_env_file(dotenvy::dotenv())?,
    }

    let config = cli.load_config()?;
    init_logging(&config.log_file).context("initializing logging")?;

    let connector = SshConnector::new(ConnectOptions::from_run_config(&config));
    let report = RemoteConfigurator::new(config, connector).run();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    std::process::exit(report.exit_code(cli.strict));
}
