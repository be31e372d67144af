//! 手部序列文件检查命令

use crate::utils::load_settings;
use affprim_tools::HandSequenceFile;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

/// 手部序列检查参数
#[derive(Args, Debug)]
pub struct SeqsCommand {
    /// 手部序列文件
    pub file: PathBuf,

    /// 引擎配置文件（提供手部布局）
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl SeqsCommand {
    pub fn execute(self) -> Result<()> {
        let settings = load_settings(self.config.as_deref())?;
        let layout = settings.hand.to_layout()?;
        let defs = HandSequenceFile::load_from_file(&self.file)?;

        println!(
            "📄 {}: {} 个序列（布局 {} 关节 / {} 手指）",
            self.file.display(),
            defs.len(),
            layout.joint_count(),
            layout.digit_count()
        );
        for def in &defs {
            def.check_layout(&layout)
                .with_context(|| format!("序列 \"{}\" 与手部布局不符", def.key))?;
            println!("  {:<16} {} 个路点", def.key, def.way_points.len());
        }
        Ok(())
    }
}
