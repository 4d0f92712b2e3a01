use crate::error::ConfiguratorError;
use crate::types::{HostConfig, HostKeyPolicy, VerifyMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_HOST: &str = "SSH_HOST";
pub const ENV_USERNAME: &str = "SSH_USERNAME";
pub const ENV_PASSWORD: &str = "SSH_PASSWORD";
pub const ENV_PORT: &str = "SSH_PORT";

pub const DEFAULT_LOG_FILE: &str = "automation_log.txt";

/// 一次运行所需的全部配置，构造后显式传给编排器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub host: HostConfig,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default)]
    pub verify_mode: VerifyMode,
    /// 0 表示远程命令无限等待
    #[serde(default)]
    pub command_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub host_key_policy: HostKeyPolicy,
    #[serde(default)]
    pub known_hosts_path: Option<PathBuf>,
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

fn default_connect_timeout() -> u64 {
    10
}

impl RunConfig {
    pub fn new(host: HostConfig) -> Self {
        Self {
            host,
            log_file: default_log_file(),
            verify_mode: VerifyMode::default(),
            command_timeout_secs: 0,
            connect_timeout_secs: default_connect_timeout(),
            host_key_policy: HostKeyPolicy::default(),
            known_hosts_path: None,
        }
    }

    /// 从进程环境变量读取主机与凭据
    pub fn from_env() -> Result<Self, ConfiguratorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 缺失的变量按空字符串处理，由传输层在连接时报错
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfiguratorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup(ENV_PORT).filter(|p| !p.trim().is_empty()) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                ConfiguratorError::ConfigError(format!("Invalid {} '{}': {}", ENV_PORT, raw, e))
            })?,
            None => 22,
        };

        let host = HostConfig {
            hostname: lookup(ENV_HOST).unwrap_or_default(),
            port,
            username: lookup(ENV_USERNAME).unwrap_or_default(),
            password: lookup(ENV_PASSWORD),
            private_key_path: None,
            passphrase: None,
        };
        Ok(Self::new(host))
    }

    /// 从YAML文件加载配置
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfiguratorError> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfiguratorError::ConfigError(format!("Failed to read config file: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ConfiguratorError::ConfigError(format!("Failed to parse YAML: {}", e)))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfiguratorError> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfiguratorError::ConfigError(format!("Failed to read config file: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| ConfiguratorError::ConfigError(format!("Failed to parse JSON: {}", e)))
    }

    /// 按扩展名选择解析格式，.json 以外一律按 YAML 处理
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfiguratorError> {
        let is_json = path
            .as_ref()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_file(path)
        } else {
            Self::from_yaml_file(path)
        }
    }

    /// 配置文件未给出密码时使用环境变量中的密码
    pub fn merge_env_secret<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.host.password.is_none() {
            self.host.password = lookup(ENV_PASSWORD);
        }
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_secs > 0).then(|| Duration::from_secs(self.command_timeout_secs))
    }

    /// strict 策略必须有 known_hosts 文件可查，未指定时使用 ~/.ssh/known_hosts
    pub fn resolved_known_hosts_path(&self) -> Option<PathBuf> {
        match (&self.known_hosts_path, self.host_key_policy) {
            (Some(path), _) => Some(path.clone()),
            (None, HostKeyPolicy::Strict) => std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".ssh").join("known_hosts")),
            (None, HostKeyPolicy::AcceptNew) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_reads_host_and_credentials() {
        let config = RunConfig::from_lookup(lookup_from(&[
            (ENV_HOST, "192.168.1.50"),
            (ENV_USERNAME, "admin"),
            (ENV_PASSWORD, "pw"),
        ]))
        .unwrap();

        assert_eq!(config.host.hostname, "192.168.1.50");
        assert_eq!(config.host.port, 22);
        assert_eq!(config.host.username, "admin");
        assert_eq!(config.host.password.as_deref(), Some("pw"));
        assert_eq!(config.log_file, PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(config.verify_mode, VerifyMode::Targeted);
        assert!(config.command_timeout().is_none());
    }

    #[test]
    fn test_missing_values_are_not_validated() {
        let config = RunConfig::from_lookup(|_| None).unwrap();
        assert!(config.host.hostname.is_empty());
        assert!(config.host.username.is_empty());
        assert_eq!(config.host.sudo_secret(), "");
    }

    #[test]
    fn test_invalid_port_rejected() {
        let result = RunConfig::from_lookup(lookup_from(&[(ENV_PORT, "ssh")]));
        assert!(matches!(result, Err(ConfiguratorError::ConfigError(_))));

        let config = RunConfig::from_lookup(lookup_from(&[(ENV_PORT, "2222")])).unwrap();
        assert_eq!(config.host.port, 2222);
    }

    #[test]
    fn test_yaml_config_file_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(
            file,
            "host:\n  hostname: box.local\n  username: ops\nverify_mode: dump\ncommand_timeout_secs: 30\nhost_key_policy: strict\nknown_hosts_path: /tmp/kh"
        )
        .unwrap();

        let mut config = RunConfig::from_file(file.path()).unwrap();
        assert_eq!(config.host.hostname, "box.local");
        assert_eq!(config.host.port, 22);
        assert_eq!(config.verify_mode, VerifyMode::Dump);
        assert_eq!(config.command_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.host_key_policy, HostKeyPolicy::Strict);
        assert_eq!(config.resolved_known_hosts_path(), Some(PathBuf::from("/tmp/kh")));

        assert!(config.host.password.is_none());
        config.merge_env_secret(lookup_from(&[(ENV_PASSWORD, "from-env")]));
        assert_eq!(config.host.password.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_json_config_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"host": {{"hostname": "10.0.0.7", "port": 2200, "username": "root", "password": "x"}}}}"#
        )
        .unwrap();

        let config = RunConfig::from_file(file.path()).unwrap();
        assert_eq!(config.host.port, 2200);
        assert_eq!(config.host.password.as_deref(), Some("x"));
        assert_eq!(config.host_key_policy, HostKeyPolicy::AcceptNew);
        assert!(config.resolved_known_hosts_path().is_none());
    }

    #[test]
    fn test_unreadable_config_file() {
        let result = RunConfig::from_file("/nonexistent/run.yml");
        assert!(matches!(result, Err(ConfiguratorError::ConfigError(_))));
    }
}
