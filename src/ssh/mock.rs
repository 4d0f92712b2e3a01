//! 测试用的远程 shell，按命令返回预设结果并记录调用顺序

use super::{Connector, RemoteShell};
use crate::error::ConfiguratorError;
use crate::types::{CommandResult, HostConfig};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// 对会话的所有调用记录
#[derive(Debug, Default)]
pub(crate) struct CallLog {
    pub executed: Vec<String>,
    pub stdin: Vec<Option<String>>,
    pub open_calls: usize,
    pub close_calls: usize,
}

#[derive(Clone, Default)]
pub(crate) struct MockShell {
    responses: HashMap<String, Result<CommandResult, String>>,
    close_error: Option<String>,
    log: Rc<RefCell<CallLog>>,
}

impl MockShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, command: &str, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        self.responses.insert(
            command.to_string(),
            Ok(CommandResult {
                exit_code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }),
        );
        self
    }

    pub fn fail(mut self, command: &str, message: &str) -> Self {
        self.responses
            .insert(command.to_string(), Err(message.to_string()));
        self
    }

    pub fn fail_close(mut self, message: &str) -> Self {
        self.close_error = Some(message.to_string());
        self
    }

    pub fn log(&self) -> Rc<RefCell<CallLog>> {
        Rc::clone(&self.log)
    }
}

impl RemoteShell for MockShell {
    fn exec(&mut self, command: &str, stdin: Option<&str>) -> Result<CommandResult, ConfiguratorError> {
        {
            let mut log = self.log.borrow_mut();
            log.executed.push(command.to_string());
            log.stdin.push(stdin.map(str::to_string));
        }
        match self.responses.get(command) {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(message)) => Err(ConfiguratorError::Ssh2Error(message.clone())),
            None => Ok(CommandResult {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
            }),
        }
    }

    fn close(&mut self) -> Result<(), ConfiguratorError> {
        self.log.borrow_mut().close_calls += 1;
        match &self.close_error {
            Some(message) => Err(ConfiguratorError::Ssh2Error(message.clone())),
            None => Ok(()),
        }
    }
}

/// 返回预设 MockShell 或连接错误的连接器
pub(crate) struct MockConnector {
    shell: MockShell,
    connect_error: Option<String>,
}

impl MockConnector {
    pub fn new(shell: MockShell) -> Self {
        Self {
            shell,
            connect_error: None,
        }
    }

    pub fn refusing(message: &str) -> Self {
        Self {
            shell: MockShell::new(),
            connect_error: Some(message.to_string()),
        }
    }

    pub fn log(&self) -> Rc<RefCell<CallLog>> {
        self.shell.log()
    }
}

impl Connector for MockConnector {
    type Shell = MockShell;

    fn open(&self, _config: &HostConfig) -> Result<MockShell, ConfiguratorError> {
        self.shell.log.borrow_mut().open_calls += 1;
        match &self.connect_error {
            Some(message) => Err(ConfiguratorError::SshConnectionError(message.clone())),
            None => Ok(self.shell.clone()),
        }
    }
}
