//! 手势命令
//!
//! 在仿真后端（按时间推进）上执行一个手势，打印下发的目标和最终状态。
//! Ctrl+C 中断等待并清空队列。

use crate::utils::{load_settings, parse_orientation, parse_position};
use affprim_client::{ActionEngine, CheckOutcome, EngineBuilder, EngineConfig};
use affprim_control::{ApproachStrategy, GestureCombinator};
use affprim_sdk::driver::{Completion, SimJointController, SimOutputSource, SimPoseController};
use affprim_sdk::{AxisAngle, ContactGuard, Position3D};
use affprim_tools::{HandSequenceFile, default_hand_sequences};
use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// 所有手势共用的参数
#[derive(Args, Debug)]
pub struct EngineArgs {
    /// 引擎配置文件
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 手部序列文件（默认使用内置的 open_hand / close_hand / karate_hand）
    #[arg(long)]
    pub sequences: Option<PathBuf>,

    /// 覆盖控制周期（毫秒）
    #[arg(long)]
    pub period_ms: Option<u64>,

    /// 等待完成的超时（秒）
    #[arg(long, default_value_t = 30)]
    pub timeout_s: u64,
}

/// 接触保护参数
#[derive(Args, Debug)]
pub struct GuardArgs {
    /// 接近时锁定并监控的手臂关节
    #[arg(long)]
    pub guard_joint: Option<usize>,

    /// 输出信号阈值
    #[arg(long, default_value_t = 200.0)]
    pub guard_threshold: f64,
}

impl GuardArgs {
    fn strategy(&self) -> ApproachStrategy {
        match self.guard_joint {
            Some(joint) => ApproachStrategy::ContactGuarded(ContactGuard::new(
                joint,
                self.guard_threshold,
            )),
            None => ApproachStrategy::Plain,
        }
    }
}

/// 手势命令
#[derive(Subcommand, Debug)]
pub enum GestureCommand {
    /// 抓取：张开手从 target+offset 接近 target，然后握紧
    Grasp {
        /// 目标位置 x,y,z（米）
        #[arg(long, allow_hyphen_values = true)]
        target: String,

        /// 姿态 x,y,z,angle（弧度）
        #[arg(long, default_value = "0,0,1,0", allow_hyphen_values = true)]
        orientation: String,

        /// 预备点相对目标的偏移 x,y,z（米）
        #[arg(long, default_value = "0,0,0.05", allow_hyphen_values = true)]
        offset: String,

        #[command(flatten)]
        guard: GuardArgs,

        #[command(flatten)]
        common: EngineArgs,
    },

    /// 触碰：张开手从 target+offset 接近 target
    Touch {
        /// 目标位置 x,y,z（米）
        #[arg(long, allow_hyphen_values = true)]
        target: String,

        /// 姿态 x,y,z,angle（弧度）
        #[arg(long, default_value = "0,0,1,0", allow_hyphen_values = true)]
        orientation: String,

        /// 预备点相对目标的偏移 x,y,z（米）
        #[arg(long, default_value = "0,0,0.05", allow_hyphen_values = true)]
        offset: String,

        #[command(flatten)]
        guard: GuardArgs,

        #[command(flatten)]
        common: EngineArgs,
    },

    /// 轻敲：掌刀姿态到 from，敲到 to，再回到 from
    Tap {
        /// 起点 x,y,z（米）
        #[arg(long, allow_hyphen_values = true)]
        from: String,

        /// 敲击点 x,y,z（米）
        #[arg(long, allow_hyphen_values = true)]
        to: String,

        /// 姿态 x,y,z,angle（弧度）
        #[arg(long, default_value = "0,0,1,0", allow_hyphen_values = true)]
        orientation: String,

        /// 敲击段执行时间（毫秒）
        #[arg(long, default_value_t = 300)]
        exec_ms: u64,

        #[command(flatten)]
        common: EngineArgs,
    },
}

impl GestureCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            GestureCommand::Grasp {
                target,
                orientation,
                offset,
                guard,
                common,
            } => {
                let (x, o, d) = (
                    parse_position(&target)?,
                    parse_orientation(&orientation)?,
                    parse_position(&offset)?,
                );
                run(&common, guard.guard_joint.is_some(), |engine| {
                    GestureCombinator::new(engine)
                        .with_strategy(guard.strategy())
                        .grasp(x, o, d)
                        .context("抓取入队失败")
                })
            },
            GestureCommand::Touch {
                target,
                orientation,
                offset,
                guard,
                common,
            } => {
                let (x, o, d) = (
                    parse_position(&target)?,
                    parse_orientation(&orientation)?,
                    parse_position(&offset)?,
                );
                run(&common, guard.guard_joint.is_some(), |engine| {
                    GestureCombinator::new(engine)
                        .with_strategy(guard.strategy())
                        .touch(x, o, d)
                        .context("触碰入队失败")
                })
            },
            GestureCommand::Tap {
                from,
                to,
                orientation,
                exec_ms,
                common,
            } => {
                let (x1, x2, o) = (
                    parse_position(&from)?,
                    parse_position(&to)?,
                    parse_orientation(&orientation)?,
                );
                if exec_ms == 0 {
                    bail!("--exec-ms 必须大于 0");
                }
                run(&common, false, |engine| {
                    GestureCombinator::new(engine)
                        .tap(x1, o, x2, o, Duration::from_millis(exec_ms))
                        .context("轻敲入队失败")
                })
            },
        }
    }
}

/// 构建仿真引擎，压入手势并等待完成
fn run(
    args: &EngineArgs,
    guarded: bool,
    push: impl FnOnce(&ActionEngine) -> Result<Vec<u64>>,
) -> Result<()> {
    let settings = load_settings(args.config.as_deref())?;
    let mut config = EngineConfig::from_settings(&settings).context("配置无效")?;
    if let Some(ms) = args.period_ms {
        config.period = Duration::from_millis(ms);
    }
    let sequences = match &args.sequences {
        Some(path) => HandSequenceFile::load_from_file(path)?,
        None => default_hand_sequences(),
    };

    let pose = Arc::new(SimPoseController::with_pose(
        Completion::Timed,
        Position3D::new(-0.2, 0.0, 0.2),
        AxisAngle::IDENTITY,
    ));
    let joints = Arc::new(SimJointController::new(
        config.hand_layout.joint_count(),
        Completion::Timed,
    ));
    let mut builder = EngineBuilder::new()
        .pose_controller(pose.clone())
        .joint_controller(joints)
        .hand_sequences(sequences)
        .config(config);
    if guarded {
        builder = builder.output_source(Arc::new(SimOutputSource::new()));
    }
    let engine = Arc::new(builder.build()?);

    {
        let engine = engine.clone();
        ctrlc::set_handler(move || {
            eprintln!("\n⚠️  收到 Ctrl+C，停止手势");
            engine.sync_check_interrupt(true);
            engine.clear_actions_queue();
        })
        .context("注册 Ctrl+C 处理失败")?;
    }

    let ids = push(engine.as_ref())?;
    info!("Gesture queued as {:?}", ids);
    println!("🤖 已入队 {} 个动作", ids.len());

    let started = Instant::now();
    let outcome = engine.check_timeout(Duration::from_secs(args.timeout_s));
    for (i, target) in pose.targets().iter().enumerate() {
        println!("  reach #{} -> {}", i, target);
    }

    let status = engine.status();
    engine.close();
    if let Some(fault) = status.last_fault {
        bail!("动作 {:?} 发生 {} 故障: {}", fault.action_id, fault.facet, fault.message);
    }
    match outcome {
        CheckOutcome::Done => {
            println!(
                "✅ 完成，用时 {:.2}s（{} 个控制周期）",
                started.elapsed().as_secs_f64(),
                status.ticks
            );
            Ok(())
        },
        CheckOutcome::Interrupted => bail!("已中断"),
        CheckOutcome::Pending => bail!("{} 秒内未完成", args.timeout_s),
    }
}
