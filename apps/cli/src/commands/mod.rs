//! 命令定义和实现

pub mod cache;
pub mod config;
pub mod exec;
pub mod run;

pub use cache::CacheCommand;
pub use config::ConfigCommand;
pub use exec::ExecCommand;
pub use run::RunCommand;
