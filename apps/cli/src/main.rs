//! # Luxo CLI
//!
//! 单关节跳跃控制器的命令行工具。
//!
//! ```bash
//! # 生成默认配置
//! luxo-cli config init
//!
//! # 在仿真关节上跑一次跳跃（虚拟时钟，快于实时）
//! luxo-cli run --backend sim --fast --log jump.csv
//!
//! # 用记录的日志回放，复现相位切换
//! luxo-cli run --backend replay --replay-log jump.csv --log replay.csv
//!
//! # 分析日志
//! luxo-cli analyze jump.csv
//! ```
//!
//! ## 退出码
//!
//! | 码 | 含义 |
//! |----|------|
//! | 0 | 成功 |
//! | 2 | 配置无效 |
//! | 3 | 传感器故障 |
//! | 4 | 执行器故障 |
//! | 5 | 超时周期超限 |
//! | 6 | 日志写入失败 |
//! | 1 | 其他错误 |

use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod commands;
mod exit;

use commands::{AnalyzeCommand, ConfigCommand, RunCommand};

/// Luxo CLI - 跳跃控制命令行工具
#[derive(Parser, Debug)]
#[command(name = "luxo-cli")]
#[command(about = "Command-line interface for the Luxo jump controller", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 执行一次跳跃
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 分析运行日志
    Analyze {
        #[command(flatten)]
        args: AnalyzeCommand,
    },
}

fn main() -> ExitCode {
    // 初始化日志（输出到 stderr，stdout 留给报告）
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("luxo_cli=info".parse().unwrap())
                .add_directive("luxo_control=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { args } => args.execute(),
        Commands::Config(cmd) => cmd.execute(),
        Commands::Analyze { args } => args.execute(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", exit::diagnostic(&e));
            ExitCode::from(exit::exit_code(&e))
        },
    }
}
