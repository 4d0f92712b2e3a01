use crate::ssh::RemoteShell;
use crate::types::{CommandOutcome, CommandResult, ConfigCommand};
use tracing::{error, info};

/// 按顺序执行配置命令，单条失败不影响后续命令
pub struct CommandExecutor<'a> {
    sudo_secret: &'a str,
}

impl<'a> CommandExecutor<'a> {
    pub fn new(sudo_secret: &'a str) -> Self {
        Self { sudo_secret }
    }

    /// 执行全部命令，返回与输入顺序一致的结果
    pub fn run_all<S: RemoteShell>(&self, shell: &mut S, commands: &[ConfigCommand]) -> Vec<CommandOutcome> {
        commands
            .iter()
            .map(|command| self.run_one(shell, command))
            .collect()
    }

    fn run_one<S: RemoteShell>(&self, shell: &mut S, command: &ConfigCommand) -> CommandOutcome {
        info!("Executing: {}", command.command);

        // 提权密码只写一次，不检测提示符是否出现
        let stdin = command
            .needs_privilege
            .then(|| format!("{}\n", self.sudo_secret));

        let result = match shell.exec(&command.command, stdin.as_deref()) {
            Ok(result) => result,
            Err(e) => CommandResult {
                exit_code: -1,
                stdout: String::new(),
                stderr: e.to_string(),
            },
        };

        let outcome = CommandOutcome::new(&command.command, result);
        if outcome.is_success() {
            info!("{}", outcome.summary());
        } else {
            error!("{}", outcome.summary());
        }
        outcome
    }
}
