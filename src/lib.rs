pub mod error;
pub mod types;
pub mod plan;
pub mod ssh;
pub mod config;
pub mod executor;
pub mod verifier;
pub mod configurator;
pub mod logging;


pub use error::ConfiguratorError;
pub use types::{
    HostConfig, CommandResult, ConfigCommand, CommandOutcome, OutcomeStatus,
    MatchRule, VerificationCheck, CheckStatus, CheckResult, VerifyMode, HostKeyPolicy,
};
pub use ssh::{ConnectOptions, Connector, RemoteShell, SshClient, SshConnector};
pub use config::RunConfig;
pub use executor::CommandExecutor;
pub use verifier::Verifier;
pub use configurator::{RemoteConfigurator, RunReport};

// 便捷的重新导出
pub type Result<T> = std::result::Result<T, ConfiguratorError>;
