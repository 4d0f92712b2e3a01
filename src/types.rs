use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Serialize, Deserialize)]
pub struct HostConfig {
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub private_key_path: Option<String>,
    #[serde(default, skip_serializing)]
    pub passphrase: Option<String>,
}

fn default_port() -> u16 {
    22
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            port: default_port(),
            username: String::new(),
            password: None,
            private_key_path: None,
            passphrase: None,
        }
    }
}

impl HostConfig {
    /// sudo -S 使用的提权密码，未配置时为空字符串
    pub fn sudo_secret(&self) -> &str {
        self.password.as_deref().unwrap_or("")
    }
}

// 密码与口令不出现在日志中
impl fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostConfig")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("private_key_path", &self.private_key_path)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// 一条固定的配置命令
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigCommand {
    pub command: String,
    /// 为 true 时在命令启动后向 stdin 写入一次提权密码
    #[serde(default)]
    pub needs_privilege: bool,
}

impl ConfigCommand {
    pub fn privileged(command: &str) -> Self {
        Self {
            command: command.to_string(),
            needs_privilege: true,
        }
    }

    pub fn plain(command: &str) -> Self {
        Self {
            command: command.to_string(),
            needs_privilege: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// 单条配置命令的执行结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandOutcome {
    pub command: String,
    pub status: OutcomeStatus,
    pub result: CommandResult,
}

impl CommandOutcome {
    pub fn new(command: &str, result: CommandResult) -> Self {
        let status = if result.is_success() {
            OutcomeStatus::Success
        } else {
            OutcomeStatus::Error
        };
        Self {
            command: command.to_string(),
            status,
            result,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    /// 写入日志的那一行文本：成功时带 stdout，失败时带 stderr
    pub fn summary(&self) -> String {
        match self.status {
            OutcomeStatus::Success => format!(
                "Success: {}\nOutput: {}",
                self.command,
                self.result.stdout.trim()
            ),
            OutcomeStatus::Error => format!(
                "Error executing: {}\nError: {}",
                self.command,
                self.result.stderr.trim()
            ),
        }
    }
}

/// 观测值与期望值的比较规则
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum MatchRule {
    /// 布尔等价的 "已启用"（yes / true / 1 / on）
    Enabled,
    /// 去除首尾空白后完全相等
    Exact { value: String },
    /// 状态文本中包含 "<field>: <value>"
    StatusField { field: String, value: String },
    /// 只展示原始输出，不做判断
    Display,
}

/// 一项验证查询
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationCheck {
    pub label: String,
    pub query: String,
    #[serde(flatten)]
    pub rule: MatchRule,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Correct,
    Incorrect,
    Observed,
    QueryFailed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckResult {
    pub label: String,
    pub query: String,
    pub expected: Option<String>,
    pub observed: String,
    pub status: CheckStatus,
}

impl CheckResult {
    /// 验证未通过（不一致或查询失败）；Observed 不算失败
    pub fn is_failure(&self) -> bool {
        matches!(self.status, CheckStatus::Incorrect | CheckStatus::QueryFailed(_))
    }

    pub fn message(&self) -> String {
        let expected = self.expected.as_deref().unwrap_or("");
        match &self.status {
            CheckStatus::Correct => format!("{} is correctly set to {}.", self.label, expected),
            CheckStatus::Incorrect => format!(
                "{} is incorrect. Found {} instead of {}.",
                self.label, self.observed, expected
            ),
            CheckStatus::Observed => format!("{}:\n{}", self.label, self.observed),
            CheckStatus::QueryFailed(e) => format!("{} could not be queried: {}", self.label, e),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VerifyMode {
    /// 逐项比较期望值
    #[default]
    Targeted,
    /// 只输出状态命令的原始内容
    Dump,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    /// 首次连接时自动信任未知主机密钥
    #[default]
    AcceptNew,
    /// 只接受 known_hosts 中已记录的主机密钥
    Strict,
}
