//! 固定的配置命令与验证查询
//!
//! 命令列表在进程启动时即确定，运行期间不可修改。

use crate::types::{ConfigCommand, MatchRule, VerificationCheck, VerifyMode};

pub const TARGET_TIMEZONE: &str = "Asia/Kolkata";
pub const TARGET_KEYMAP: &str = "us";

/// 按执行顺序排列的配置命令
pub fn config_commands() -> Vec<ConfigCommand> {
    vec![
        ConfigCommand::privileged("sudo -S timedatectl set-ntp true"),
        ConfigCommand::privileged(&format!("sudo -S timedatectl set-timezone {}", TARGET_TIMEZONE)),
        ConfigCommand::privileged(&format!("sudo -S localectl set-keymap {}", TARGET_KEYMAP)),
    ]
}

/// 逐项比较的验证查询
pub fn targeted_checks() -> Vec<VerificationCheck> {
    vec![
        VerificationCheck {
            label: "NTP".to_string(),
            query: "timedatectl show --property=NTP --value".to_string(),
            rule: MatchRule::Enabled,
        },
        VerificationCheck {
            label: "Timezone".to_string(),
            query: "timedatectl show --property=Timezone --value".to_string(),
            rule: MatchRule::Exact {
                value: TARGET_TIMEZONE.to_string(),
            },
        },
        VerificationCheck {
            label: "Keymap".to_string(),
            query: "localectl status".to_string(),
            rule: MatchRule::StatusField {
                field: "VC Keymap".to_string(),
                value: TARGET_KEYMAP.to_string(),
            },
        },
    ]
}

/// 只输出原始状态的查询
pub fn dump_checks() -> Vec<VerificationCheck> {
    vec![
        VerificationCheck {
            label: "Time status".to_string(),
            query: "timedatectl status".to_string(),
            rule: MatchRule::Display,
        },
        VerificationCheck {
            label: "Locale status".to_string(),
            query: "localectl status".to_string(),
            rule: MatchRule::Display,
        },
    ]
}

pub fn checks_for(mode: VerifyMode) -> Vec<VerificationCheck> {
    match mode {
        VerifyMode::Targeted => targeted_checks(),
        VerifyMode::Dump => dump_checks(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_order_is_fixed() {
        let commands: Vec<String> = config_commands().into_iter().map(|c| c.command).collect();
        assert_eq!(
            commands,
            vec![
                "sudo -S timedatectl set-ntp true",
                "sudo -S timedatectl set-timezone Asia/Kolkata",
                "sudo -S localectl set-keymap us",
            ]
        );
    }

    #[test]
    fn test_sudo_commands_are_privileged() {
        for command in config_commands() {
            assert_eq!(command.needs_privilege, command.command.starts_with("sudo -S"));
        }
    }

    #[test]
    fn test_checks_for_mode() {
        assert_eq!(checks_for(VerifyMode::Targeted).len(), 3);
        let dump = checks_for(VerifyMode::Dump);
        assert_eq!(dump.len(), 2);
        assert!(dump.iter().all(|c| c.rule == MatchRule::Display));
    }
}
