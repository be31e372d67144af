//! # affprim CLI
//!
//! 动作原语引擎的命令行工具。手势在仿真后端上执行，用于检查配置、
//! 手部序列文件和手势分解是否符合预期。
//!
//! ```bash
//! # 生成默认配置
//! affprim-cli config init
//!
//! # 检查手部序列文件
//! affprim-cli seqs hands.toml
//!
//! # 在仿真后端上执行抓取
//! affprim-cli gesture grasp --target -0.3,0.1,0.0 --offset 0,0,0.05
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

use commands::{ConfigCommand, GestureCommand, SeqsCommand};

/// affprim CLI - 动作原语命令行工具
#[derive(Parser, Debug)]
#[command(name = "affprim-cli")]
#[command(about = "Command-line interface for affprim action primitives", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 检查手部序列文件
    Seqs {
        #[command(flatten)]
        args: SeqsCommand,
    },

    /// 在仿真后端上执行手势
    #[command(subcommand)]
    Gesture(GestureCommand),
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("affprim=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(),
        Commands::Seqs { args } => args.execute(),
        Commands::Gesture(cmd) => cmd.execute(),
    }
}
