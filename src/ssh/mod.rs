// SSH 传输层：会话抽象与 ssh2 实现
mod client;
mod host_key;
#[cfg(test)]
pub(crate) mod mock;

use crate::error::ConfiguratorError;
use crate::types::{CommandResult, HostConfig};

pub use client::{ConnectOptions, SshClient, SshConnector};
pub use host_key::format_fingerprint;

/// 已建立的远程 shell 会话
pub trait RemoteShell {
    /// 执行一条命令并阻塞到退出码可用；`stdin` 非空时在启动后写入一次
    fn exec(&mut self, command: &str, stdin: Option<&str>) -> Result<CommandResult, ConfiguratorError>;

    /// 关闭会话，重复调用无副作用
    fn close(&mut self) -> Result<(), ConfiguratorError>;
}

/// 打开会话的一方
pub trait Connector {
    type Shell: RemoteShell;

    fn open(&self, config: &HostConfig) -> Result<Self::Shell, ConfiguratorError>;
}
