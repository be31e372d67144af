//! 配置管理命令
//!
//! 查看或生成引擎配置文件（默认 `<config_dir>/affprim/engine.toml`）。

use crate::utils::{default_config_path, load_settings};
use affprim_client::EngineConfig;
use affprim_tools::EngineSettings;
use anyhow::{Context, Result, bail};
use clap::Subcommand;
use std::fs;
use std::path::PathBuf;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示生效的配置（文件不存在时显示默认值）
    Show {
        /// 配置文件路径
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// 生成默认配置文件
    Init {
        /// 配置文件路径
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Show { file } => Self::show(file),
            ConfigCommand::Init { file, force } => Self::init(file, force),
        }
    }

    fn show(file: Option<PathBuf>) -> Result<()> {
        let settings = load_settings(file.as_deref())?;
        let config = EngineConfig::from_settings(&settings).context("配置无效")?;

        print!("{}", settings.to_toml_string()?);
        println!();
        println!("# 控制周期: {:?}", config.period);
        println!("# 默认执行时间: {:?}", config.default_exec_time);
        println!(
            "# 手部布局: {} 个关节, {} 个手指",
            config.hand_layout.joint_count(),
            config.hand_layout.digit_count()
        );
        Ok(())
    }

    fn init(file: Option<PathBuf>, force: bool) -> Result<()> {
        let path = match file {
            Some(p) => p,
            None => default_config_path()?,
        };
        if path.exists() && !force {
            bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
        }
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).context("创建配置目录失败")?;
        }

        let content = format!(
            "# affprim engine configuration\n\n{}",
            EngineSettings::default().to_toml_string()?
        );
        fs::write(&path, content).context("写入配置文件失败")?;
        println!("✅ 已生成配置文件: {}", path.display());
        Ok(())
    }
}
