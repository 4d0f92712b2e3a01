use thiserror::Error;
use serde::Serialize;

#[derive(Error, Debug, Serialize)]
pub enum ConfiguratorError {
    #[error("SSH connection failed: {0}")]
    SshConnectionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Host key verification failed: {0}")]
    HostKeyError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("SSH error: {0}")]
    Ssh2Error(String),
}

impl ConfiguratorError {
    /// 是否属于建立会话阶段的错误（连接、认证、主机密钥）
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ConfiguratorError::SshConnectionError(_)
                | ConfiguratorError::AuthenticationError(_)
                | ConfiguratorError::HostKeyError(_)
        )
    }
}

impl From<std::io::Error> for ConfiguratorError {
    fn from(error: std::io::Error) -> Self {
        ConfiguratorError::IoError(error.to_string())
    }
}

impl From<ssh2::Error> for ConfiguratorError {
    fn from(error: ssh2::Error) -> Self {
        ConfiguratorError::Ssh2Error(error.to_string())
    }
}
