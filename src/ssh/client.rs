use crate::config::RunConfig;
use crate::error::ConfiguratorError;
use crate::ssh::host_key;
use crate::ssh::{Connector, RemoteShell};
use crate::types::{CommandResult, HostConfig, HostKeyPolicy};
use ssh2::Session;
use std::io::prelude::*;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// 建立连接时使用的参数
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub connect_timeout: Duration,
    /// None 表示远程命令无限等待
    pub command_timeout: Option<Duration>,
    pub host_key_policy: HostKeyPolicy,
    pub known_hosts_path: Option<PathBuf>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            command_timeout: None,
            host_key_policy: HostKeyPolicy::AcceptNew,
            known_hosts_path: None,
        }
    }
}

impl ConnectOptions {
    pub fn from_run_config(config: &RunConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            command_timeout: config.command_timeout(),
            host_key_policy: config.host_key_policy,
            known_hosts_path: config.resolved_known_hosts_path(),
        }
    }
}

fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}

/// 非 UTF-8 字节替换为 U+FFFD，不让输出编码影响退出码判断
fn decode_output(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn write_stdin<W: Write>(channel: &mut W, input: &str) -> std::io::Result<()> {
    channel.write_all(input.as_bytes())?;
    channel.flush()
}

/// SSH 客户端
pub struct SshClient {
    session: Session,
    config: HostConfig,
    closed: bool,
}

impl SshClient {
    /// 建立 SSH 连接，失败时不重试
    pub fn connect(config: &HostConfig, options: &ConnectOptions) -> Result<Self, ConfiguratorError> {
        let address = format!("{}:{}", config.hostname, config.port);
        let socket_addr = address
            .to_socket_addrs()
            .map_err(|e| {
                ConfiguratorError::SshConnectionError(format!("Failed to resolve {}: {}", address, e))
            })?
            .next()
            .ok_or_else(|| {
                ConfiguratorError::SshConnectionError(format!("No address found for {}", address))
            })?;

        let tcp = TcpStream::connect_timeout(&socket_addr, options.connect_timeout).map_err(|e| {
            ConfiguratorError::SshConnectionError(format!("Failed to connect to {}: {}", address, e))
        })?;

        if let Err(e) = tcp.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.set_timeout(timeout_millis(options.connect_timeout));

        session.handshake().map_err(|e| {
            ConfiguratorError::SshConnectionError(format!("SSH Handshake failed: {}", e))
        })?;

        host_key::verify_host_key(
            &session,
            &config.hostname,
            config.port,
            options.host_key_policy,
            options.known_hosts_path.as_deref(),
        )?;

        Self::authenticate(&session, config)?;

        // 握手完成后切换为命令超时，0 表示无限等待
        session.set_timeout(options.command_timeout.map(timeout_millis).unwrap_or(0));

        debug!("Authenticated to {} as {}", config.hostname, config.username);

        Ok(Self {
            session,
            config: config.clone(),
            closed: false,
        })
    }

    fn authenticate(session: &Session, config: &HostConfig) -> Result<(), ConfiguratorError> {
        if let Some(ref private_key_path) = config.private_key_path {
            let passphrase = config.passphrase.as_deref();
            session
                .userauth_pubkey_file(&config.username, None, Path::new(private_key_path), passphrase)
                .map_err(|e| ConfiguratorError::AuthenticationError(e.to_string()))?;
        } else {
            // 缺省密码按空字符串提交，由服务端拒绝
            session
                .userauth_password(&config.username, config.sudo_secret())
                .map_err(|e| ConfiguratorError::AuthenticationError(e.to_string()))?;
        }

        if !session.authenticated() {
            return Err(ConfiguratorError::AuthenticationError(
                "Authentication failed".to_string(),
            ));
        }
        Ok(())
    }
}

impl RemoteShell for SshClient {
    fn exec(&mut self, command: &str, stdin: Option<&str>) -> Result<CommandResult, ConfiguratorError> {
        let mut channel = self.session.channel_session()?;
        channel.exec(command)?;

        if let Some(input) = stdin {
            // 远端可能已关闭 stdin（例如免密 sudo），写入失败不影响取退出码
            if let Err(e) = write_stdin(&mut channel, input) {
                warn!("Failed to write stdin for '{}': {}", command, e);
            }
            if let Err(e) = channel.send_eof() {
                warn!("Failed to send EOF for '{}': {}", command, e);
            }
        }

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        channel.read_to_end(&mut stdout)?;
        channel.stderr().read_to_end(&mut stderr)?;

        channel.wait_close()?;
        let exit_code = channel.exit_status()?;

        debug!(
            "Command '{}' on '{}' exited with code {}",
            command, self.config.hostname, exit_code
        );

        Ok(CommandResult {
            exit_code,
            stdout: decode_output(&stdout),
            stderr: decode_output(&stderr),
        })
    }

    fn close(&mut self) -> Result<(), ConfiguratorError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.session
            .disconnect(None, "configuration run finished", None)?;
        Ok(())
    }
}

impl Drop for SshClient {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                warn!("Failed to close session to {}: {}", self.config.hostname, e);
            }
        }
    }
}

/// 基于 ssh2 的连接器
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    options: ConnectOptions,
}

impl SshConnector {
    pub fn new(options: ConnectOptions) -> Self {
        Self { options }
    }
}

impl Connector for SshConnector {
    type Shell = SshClient;

    fn open(&self, config: &HostConfig) -> Result<SshClient, ConfiguratorError> {
        SshClient::connect(config, &self.options)
    }
}
