//! 命令定义和实现

pub mod analyze;
pub mod config;
pub mod run;

pub use analyze::AnalyzeCommand;
pub use config::ConfigCommand;
pub use run::RunCommand;
