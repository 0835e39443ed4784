//! 配置管理命令
//!
//! 跳跃参数保存在 TOML 文件中（默认 `<config_dir>/luxo/jump.toml`），运行前加载一次。

use anyhow::{Context, Result};
use clap::Subcommand;
use luxo_tools::JumpConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub fn default_config_file() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("luxo");
    path.push("jump.toml");
    Ok(path)
}

/// 解析配置路径：显式参数优先，否则使用默认路径
fn resolve(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p),
        None => default_config_file(),
    }
}

/// 加载配置
///
/// 显式给出的文件必须存在；默认路径不存在时使用内置默认参数。
pub fn load_config(path: Option<&Path>) -> Result<JumpConfig> {
    if let Some(path) = path {
        return JumpConfig::load_from_file(path)
            .with_context(|| format!("加载配置失败: {}", path.display()));
    }

    let default_path = default_config_file()?;
    if default_path.exists() {
        JumpConfig::load_from_file(&default_path)
            .with_context(|| format!("加载配置失败: {}", default_path.display()))
    } else {
        tracing::info!(
            "No config file at {}, using built-in defaults",
            default_path.display()
        );
        Ok(JumpConfig::default())
    }
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写入默认配置文件
    Init {
        /// 配置文件路径（默认 <config_dir>/luxo/jump.toml）
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },

    /// 检查配置是否有效
    Check {
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// 显示生效的配置
    Show {
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Init { path, force } => Self::init_(resolve(path)?, force),
            ConfigCommand::Check { path } => Self::check_(path),
            ConfigCommand::Show { path } => Self::show_(path),
        }
    }

    fn init_(path: PathBuf, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("创建配置目录失败")?;
        }

        JumpConfig::default()
            .save_to_file(&path)
            .with_context(|| format!("写入配置文件失败: {}", path.display()))?;

        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }

    fn check_(path: Option<PathBuf>) -> Result<()> {
        let config = load_config(path.as_deref())?;

        println!("✅ 配置有效");
        println!(
            "  起跳: {:.3} N·m，阈值 {:.3} rad（{:?}）",
            config.launch.torque, config.launch.threshold, config.launch.direction
        );
        println!(
            "  稳定: Kp {:.3}，Kd {:.3}，目标 {:.3} rad / {:.3} rad/s",
            config.stabilize.kp,
            config.stabilize.kd,
            config.stabilize.target_position,
            config.stabilize.target_velocity
        );
        println!(
            "  限制: |τ| ≤ {:.3} N·m，安全力矩 {:.3} N·m",
            config.limits.torque_max, config.limits.safe_torque
        );
        println!(
            "  定时: 周期 {:?}（{:.1} Hz），最长 {:?}",
            config.timing.period(),
            config.timing.frequency_hz(),
            config.timing.max_duration()
        );
        Ok(())
    }

    fn show_(path: Option<PathBuf>) -> Result<()> {
        let config = load_config(path.as_deref())?;
        print!("{}", config.to_toml_string()?);
        Ok(())
    }
}
