use crate::plan::checks_for;
use crate::ssh::RemoteShell;
use crate::types::{CheckResult, CheckStatus, MatchRule, VerificationCheck, VerifyMode};
use regex::Regex;
use tracing::{error, info};

/// 在配置命令执行完毕后查询主机的实际设置
pub struct Verifier {
    checks: Vec<VerificationCheck>,
}

impl Verifier {
    pub fn new(mode: VerifyMode) -> Self {
        Self {
            checks: checks_for(mode),
        }
    }

    pub fn with_checks(checks: Vec<VerificationCheck>) -> Self {
        Self { checks }
    }

    /// 每项查询只执行一次，不重试
    pub fn verify<S: RemoteShell>(&self, shell: &mut S) -> Vec<CheckResult> {
        self.checks
            .iter()
            .map(|check| {
                let result = run_check(shell, check);
                match result.status {
                    CheckStatus::Correct | CheckStatus::Observed => info!("{}", result.message()),
                    CheckStatus::Incorrect | CheckStatus::QueryFailed(_) => {
                        error!("{}", result.message())
                    }
                }
                result
            })
            .collect()
    }
}

fn run_check<S: RemoteShell>(shell: &mut S, check: &VerificationCheck) -> CheckResult {
    let expected = expected_value(&check.rule);
    match shell.exec(&check.query, None) {
        Ok(output) => {
            let (status, observed) = evaluate(&check.rule, &output.stdout);
            CheckResult {
                label: check.label.clone(),
                query: check.query.clone(),
                expected,
                observed,
                status,
            }
        }
        Err(e) => CheckResult {
            label: check.label.clone(),
            query: check.query.clone(),
            expected,
            observed: String::new(),
            status: CheckStatus::QueryFailed(e.to_string()),
        },
    }
}

fn expected_value(rule: &MatchRule) -> Option<String> {
    match rule {
        MatchRule::Enabled => Some("enabled".to_string()),
        MatchRule::Exact { value } => Some(value.clone()),
        MatchRule::StatusField { value, .. } => Some(format!("'{}'", value)),
        MatchRule::Display => None,
    }
}

/// systemd 的布尔属性可能以 yes/true/1/on 表示
fn is_enabled(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "yes" | "true" | "1" | "on"
    )
}

/// 从 `localectl status` 之类的输出中取出某个字段的值
fn status_field(raw: &str, field: &str) -> Option<String> {
    let pattern = format!(r"(?m)^\s*{}:\s*(.*?)\s*$", regex::escape(field));
    let re = Regex::new(&pattern).ok()?;
    re.captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// 按规则比较原始输出，返回判定与用于展示的观测值
pub fn evaluate(rule: &MatchRule, raw: &str) -> (CheckStatus, String) {
    let trimmed = raw.trim();
    match rule {
        MatchRule::Enabled => {
            let observed = trimmed.to_string();
            if is_enabled(trimmed) {
                (CheckStatus::Correct, observed)
            } else {
                (CheckStatus::Incorrect, observed)
            }
        }
        MatchRule::Exact { value } => {
            let status = if trimmed == value {
                CheckStatus::Correct
            } else {
                CheckStatus::Incorrect
            };
            (status, trimmed.to_string())
        }
        MatchRule::StatusField { field, value } => {
            let needle = format!("{}: {}", field, value);
            let observed = status_field(trimmed, field).unwrap_or_else(|| "<missing>".to_string());
            if trimmed.contains(&needle) {
                (CheckStatus::Correct, observed)
            } else {
                (CheckStatus::Incorrect, format!("'{}'", observed))
            }
        }
        MatchRule::Display => (CheckStatus::Observed, trimmed.to_string()),
    }
}
