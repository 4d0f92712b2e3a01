use crate::error::ConfiguratorError;
use crate::types::HostKeyPolicy;
use ssh2::{CheckResult, HashType, HostKeyType, KnownHostFileKind, KnownHosts, Session};
use std::path::Path;
use tracing::{debug, info, warn};

/// 将主机密钥摘要格式化为冒号分隔的十六进制串
pub fn format_fingerprint(hash: &[u8]) -> String {
    hash.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// known_hosts 中的主机名写法，非 22 端口使用 `[host]:port`
fn known_hosts_entry(hostname: &str, port: u16) -> String {
    if port == 22 {
        hostname.to_string()
    } else {
        format!("[{}]:{}", hostname, port)
    }
}

/// 对一次 known_hosts 查询结果的处理方式
#[derive(Debug, Clone, PartialEq, Eq)]
enum HostKeyDecision {
    /// 与已记录的密钥一致
    Known,
    /// 首次见到的密钥，按 TOFU 信任
    TrustNew,
    Reject(String),
}

/// 已记录但不一致的密钥总是被拒绝；未知密钥只在 AcceptNew 策略下被信任
fn decide(check: &CheckResult, policy: HostKeyPolicy, hostname: &str, fingerprint: &str) -> HostKeyDecision {
    match (check, policy) {
        (CheckResult::Match, _) => HostKeyDecision::Known,
        (CheckResult::Mismatch, _) => HostKeyDecision::Reject(format!(
            "Host key for {} does not match the recorded key (SHA256 {})",
            hostname, fingerprint
        )),
        (CheckResult::NotFound | CheckResult::Failure, HostKeyPolicy::Strict) => {
            HostKeyDecision::Reject(format!(
                "Unknown host key for {} (SHA256 {})",
                hostname, fingerprint
            ))
        }
        (CheckResult::NotFound | CheckResult::Failure, HostKeyPolicy::AcceptNew) => {
            HostKeyDecision::TrustNew
        }
    }
}

/// 把主机密钥加入 known_hosts 并写回文件，必要时创建父目录
fn record_host_key(
    known_hosts: &mut KnownHosts,
    entry: &str,
    key: &[u8],
    key_type: HostKeyType,
    path: &Path,
) -> Result<(), ConfiguratorError> {
    known_hosts.add(entry, key, "added by rs-timelocale", key_type.into())?;
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("Failed to create directory {}: {}", parent.display(), e);
        }
    }
    known_hosts.write_file(path, KnownHostFileKind::OpenSSH)?;
    Ok(())
}

fn load_known_hosts(session: &Session, path: Option<&Path>) -> Result<KnownHosts, ConfiguratorError> {
    let mut known_hosts = session.known_hosts()?;
    if let Some(path) = path {
        if path.exists() {
            known_hosts.read_file(path, KnownHostFileKind::OpenSSH)?;
        }
    }
    Ok(known_hosts)
}

/// 按策略校验服务端主机密钥
///
/// 未知密钥在 AcceptNew 策略下被信任，并在配置了 known_hosts 文件时写入该文件。
pub(super) fn verify_host_key(
    session: &Session,
    hostname: &str,
    port: u16,
    policy: HostKeyPolicy,
    known_hosts_path: Option<&Path>,
) -> Result<(), ConfiguratorError> {
    let (key, key_type) = session.host_key().ok_or_else(|| {
        ConfiguratorError::HostKeyError(format!("{} did not present a host key", hostname))
    })?;
    let fingerprint = session
        .host_key_hash(HashType::Sha256)
        .map(format_fingerprint)
        .unwrap_or_else(|| "unknown".to_string());

    let mut known_hosts = load_known_hosts(session, known_hosts_path)?;
    let check = known_hosts.check_port(hostname, port, key);

    match decide(&check, policy, hostname, &fingerprint) {
        HostKeyDecision::Known => {
            debug!("Host key for {} matches known_hosts", hostname);
        }
        HostKeyDecision::Reject(reason) => return Err(ConfiguratorError::HostKeyError(reason)),
        HostKeyDecision::TrustNew => {
            warn!(
                "Trusting unknown host key for {} on first use (SHA256 {})",
                hostname, fingerprint
            );
            if let Some(path) = known_hosts_path {
                let entry = known_hosts_entry(hostname, port);
                match record_host_key(&mut known_hosts, &entry, key, key_type, path) {
                    Ok(()) => info!("Recorded host key for {} in {}", entry, path.display()),
                    Err(e) => warn!("Failed to record host key in {}: {}", path.display(), e),
                }
            }
        }
    }
    Ok(())
}
