use crate::config::RunConfig;
use crate::executor::CommandExecutor;
use crate::plan::config_commands;
use crate::ssh::{Connector, RemoteShell};
use crate::types::{CheckResult, CommandOutcome, ConfigCommand};
use crate::verifier::Verifier;
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{error, info, warn};

/// 一次运行的完整结果
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub host: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub connection_error: Option<String>,
    pub commands: Vec<CommandOutcome>,
    pub checks: Vec<CheckResult>,
}

impl RunReport {
    pub fn failed_commands(&self) -> usize {
        self.commands.iter().filter(|c| !c.is_success()).count()
    }

    pub fn failed_checks(&self) -> usize {
        self.checks.iter().filter(|c| c.is_failure()).count()
    }

    pub fn all_passed(&self) -> bool {
        self.connection_error.is_none() && self.failed_commands() == 0 && self.failed_checks() == 0
    }

    /// 默认总是返回 0；strict 模式下任何失败都返回 1
    pub fn exit_code(&self, strict: bool) -> i32 {
        if strict && !self.all_passed() { 1 } else { 0 }
    }
}

/// 连接、执行配置命令、验证、断开，严格顺序执行
pub struct RemoteConfigurator<C: Connector> {
    config: RunConfig,
    connector: C,
    commands: Vec<ConfigCommand>,
    verifier: Verifier,
}

impl<C: Connector> RemoteConfigurator<C> {
    pub fn new(config: RunConfig, connector: C) -> Self {
        let verifier = Verifier::new(config.verify_mode);
        Self {
            config,
            connector,
            commands: config_commands(),
            verifier,
        }
    }

    pub fn run(&self) -> RunReport {
        let started_at = Local::now();
        let host = self.config.host.hostname.clone();
        info!("Connecting to {}:{}", host, self.config.host.port);

        let mut shell = match self.connector.open(&self.config.host) {
            Ok(shell) => shell,
            Err(e) => {
                error!("Connection failed: {}", e);
                return RunReport {
                    host,
                    started_at,
                    finished_at: Local::now(),
                    connection_error: Some(e.to_string()),
                    commands: Vec::new(),
                    checks: Vec::new(),
                };
            }
        };
        info!("Connected to host {} as {}", host, self.config.host.username);

        let executor = CommandExecutor::new(self.config.host.sudo_secret());
        let commands = executor.run_all(&mut shell, &self.commands);
        let checks = self.verifier.verify(&mut shell);

        match shell.close() {
            Ok(()) => info!("Disconnected from host {}", host),
            Err(e) => warn!("Failed to close session to {} cleanly: {}", host, e),
        }

        let report = RunReport {
            host,
            started_at,
            finished_at: Local::now(),
            connection_error: None,
            commands,
            checks,
        };
        info!(
            "Run finished: {}/{} commands succeeded, {} check(s) failed",
            report.commands.len() - report.failed_commands(),
            report.commands.len(),
            report.failed_checks()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssh::mock::{MockConnector, MockShell};
    use crate::types::{CheckStatus, HostConfig, VerifyMode};

    fn run_config(mode: VerifyMode) -> RunConfig {
        let mut config = RunConfig::new(HostConfig {
            hostname: "10.1.1.1".to_string(),
            username: "ops".to_string(),
            password: Some("pw".to_string()),
            ..HostConfig::default()
        });
        config.verify_mode = mode;
        config
    }

    #[test]
    fn test_report_exit_code() {
        let connector = MockConnector::refusing("refused");
        let report = RemoteConfigurator::new(run_config(VerifyMode::Targeted), connector).run();
        assert!(!report.all_passed());
        assert_eq!(report.exit_code(false), 0);
        assert_eq!(report.exit_code(true), 1);
    }

    #[test]
    fn test_dump_mode_run() {
        let shell = MockShell::new().respond("timedatectl status", 0, "Time zone: Asia/Kolkata", "");
        let log = shell.log();
        let report = RemoteConfigurator::new(run_config(VerifyMode::Dump), MockConnector::new(shell)).run();

        assert_eq!(report.checks.len(), 2);
        assert!(report.checks.iter().all(|c| c.status == CheckStatus::Observed));
        assert!(report.all_passed());
        assert_eq!(log.borrow().executed.len(), 5);
    }

    #[test]
    fn test_report_serializes() {
        let report = RemoteConfigurator::new(run_config(VerifyMode::Targeted), MockConnector::new(MockShell::new())).run();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["host"], "10.1.1.1");
        assert_eq!(json["commands"].as_array().unwrap().len(), 3);
        assert_eq!(json["commands"][0]["status"], "success");
        assert!(json["connection_error"].is_null());
    }
}
