//! 手势演示
//!
//! 在仿真后端上依次执行抓取、轻敲，并在另一个线程上用跟踪目标画一段圆弧。
//! Ctrl+C 会中断阻塞查询并清空队列。

use affprim_sdk::prelude::*;
use clap::Parser;
use std::f64::consts::PI;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "gesture_demo")]
#[command(about = "手势演示 - 在仿真后端上运行抓取、轻敲和跟踪")]
struct Args {
    /// 控制周期（毫秒，默认: 20）
    #[arg(long, default_value = "20")]
    period_ms: u64,

    /// 接近距离（米，默认: 0.05）
    #[arg(long, default_value = "0.05")]
    offset: f64,

    /// 跳过跟踪演示
    #[arg(long)]
    no_tracking: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    affprim_sdk::init_logger();

    println!("🤖 affprim SDK - 手势演示");
    println!("=========================\n");

    // ==================== 步骤 1: 创建引擎 ====================
    let pose = Arc::new(SimPoseController::with_pose(
        Completion::Timed,
        Position3D::new(-0.2, 0.0, 0.2),
        AxisAngle::IDENTITY,
    ));
    let engine = Arc::new(
        EngineBuilder::new()
            .pose_controller(pose.clone())
            .joint_controller(Arc::new(SimJointController::new(9, Completion::Timed)))
            .hand_sequences(default_hand_sequences())
            .config(EngineConfig {
                period: Duration::from_millis(args.period_ms),
                default_exec_time: Duration::from_millis(800),
                ..Default::default()
            })
            .build()?,
    );
    println!("   ✅ 引擎就绪，手部序列: {:?}\n", engine.hand_seq_list());

    {
        let engine = engine.clone();
        ctrlc::set_handler(move || {
            eprintln!("\n⚠️  收到 Ctrl+C，停止所有动作");
            engine.sync_check_interrupt(true);
            engine.clear_actions_queue();
        })?;
    }

    // ==================== 步骤 2: 抓取 ====================
    let gestures = GestureCombinator::new(engine.clone());
    let target = Position3D::new(-0.3, 0.1, 0.0);
    let ids = gestures.grasp(target, AxisAngle::IDENTITY, Position3D::new(0.0, 0.0, args.offset))?;
    println!("✊ 抓取已入队: {:?}", ids);
    if !report(&engine, "抓取") {
        return Ok(());
    }

    // ==================== 步骤 3: 轻敲 ====================
    let ids = gestures.tap(
        Position3D::new(-0.3, -0.1, 0.05),
        AxisAngle::IDENTITY,
        Position3D::new(-0.3, -0.1, 0.0),
        AxisAngle::IDENTITY,
        Duration::from_millis(300),
    )?;
    println!("🖐  轻敲已入队: {:?}", ids);
    if !report(&engine, "轻敲") {
        return Ok(());
    }

    // ==================== 步骤 4: 跟踪 ====================
    if !args.no_tracking {
        engine.set_tracking_mode(true)?;
        let tracker = {
            let engine = engine.clone();
            thread::spawn(move || -> Result<(), EngineError> {
                for i in 0..=20 {
                    let phase = PI * i as f64 / 20.0;
                    let p = Position3D::new(-0.3 + 0.05 * phase.cos(), 0.05 * phase.sin(), 0.1);
                    engine.reach(p, AxisAngle::IDENTITY, Some(Duration::from_millis(100)))?;
                    thread::sleep(Duration::from_millis(50));
                }
                Ok(())
            })
        };
        if let Ok(Err(e)) = tracker.join() {
            eprintln!("   ❌ 跟踪中断: {}", e);
        }
        report(&engine, "跟踪");
    }

    let status = engine.status();
    println!(
        "\n📊 共执行 {} 个控制周期，最终位姿 {}",
        status.ticks,
        engine.pose()?.0
    );
    engine.close();
    Ok(())
}

/// 等待队列排空并打印结果；被中断时返回 false
fn report(engine: &ActionEngine, name: &str) -> bool {
    match engine.check(true) {
        CheckOutcome::Done => {
            let status = engine.status();
            println!(
                "   ✅ {}完成 (位姿 {})",
                name,
                engine.pose().map(|(p, _)| p.to_string()).unwrap_or_default()
            );
            if let Some(fault) = status.last_fault {
                println!("   ⚠️  期间发生故障: {} {}", fault.facet, fault.message);
            }
            true
        },
        outcome => {
            println!("   ⏹  {}未完成: {:?}", name, outcome);
            false
        },
    }
}
