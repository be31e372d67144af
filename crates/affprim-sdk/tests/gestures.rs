//! 手势组合测试
//!
//! 在手动步进的引擎上运行抓取、触碰、轻敲，检查下发到仿真服务的命令序列。

use affprim_sdk::driver::sim::PoseCommand;
use affprim_sdk::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const X: Position3D = Position3D::new(-0.3, 0.1, 0.0);
const D: Position3D = Position3D::new(0.0, 0.0, 0.05);

struct Rig {
    engine: ActionEngine,
    pose: Arc<SimPoseController>,
    joints: Arc<SimJointController>,
    output: Arc<SimOutputSource>,
}

fn rig() -> Rig {
    let pose = Arc::new(SimPoseController::new(Completion::Manual));
    let joints = Arc::new(SimJointController::new(9, Completion::Manual));
    let output = Arc::new(SimOutputSource::new());
    let engine = EngineBuilder::new()
        .pose_controller(pose.clone())
        .joint_controller(joints.clone())
        .output_source(output.clone())
        .hand_sequences(default_hand_sequences())
        .config(EngineConfig {
            monitor_period: Duration::from_millis(1),
            ..Default::default()
        })
        .manual_stepping()
        .build()
        .expect("engine");
    Rig {
        engine,
        pose,
        joints,
        output,
    }
}

/// 完成当前动作的所有 facet 并推进一个周期
fn complete_step(rig: &Rig) {
    rig.pose.finish_motion();
    rig.joints.converge();
    rig.engine.step().unwrap();
}

fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_grasp_runs_to_completion() {
    let rig = rig();
    let ids = GestureCombinator::new(&rig.engine)
        .grasp(X, AxisAngle::IDENTITY, D)
        .unwrap();
    assert_eq!(ids.len(), 3);
    assert_eq!(rig.engine.queue_len(), 3);

    rig.engine.step().unwrap();
    assert_eq!(rig.engine.status().state, ExecutorState::ArmAndHandRunning);
    complete_step(&rig);
    assert_eq!(rig.engine.status().state, ExecutorState::ArmRunning);
    complete_step(&rig);
    assert_eq!(rig.engine.status().state, ExecutorState::HandRunning);
    // close_hand 有两个路点
    complete_step(&rig);
    complete_step(&rig);

    assert!(rig.engine.check_actions_done(false));
    assert_eq!(rig.pose.targets(), vec![X + D, X]);
}

#[test]
fn test_tap_uses_exec_time_for_strike() {
    let rig = rig();
    let x2 = Position3D::new(-0.3, 0.1, -0.04);
    GestureCombinator::new(&rig.engine)
        .tap(
            X,
            AxisAngle::IDENTITY,
            x2,
            AxisAngle::IDENTITY,
            Duration::from_millis(300),
        )
        .unwrap();

    rig.engine.step().unwrap();
    for _ in 0..4 {
        complete_step(&rig);
    }
    assert!(rig.engine.check_actions_done(false));
    assert_eq!(rig.pose.targets(), vec![X, x2, X]);
    assert_eq!(
        rig.pose.exec_times(),
        vec![
            Duration::from_secs(2),
            Duration::from_millis(300),
            Duration::from_secs(2)
        ]
    );
}

#[test]
fn test_guarded_touch_stops_on_contact() {
    let rig = rig();
    let guard = ContactGuard::new(4, 200.0);
    GestureCombinator::new(&rig.engine)
        .with_strategy(ApproachStrategy::ContactGuarded(guard))
        .touch(X, AxisAngle::IDENTITY, D)
        .unwrap();

    // 预备段
    rig.engine.step().unwrap();
    complete_step(&rig);
    assert_eq!(rig.engine.status().state, ExecutorState::ArmRunning);
    assert!(
        rig.pose
            .commands()
            .contains(&PoseCommand::Dof { dof: 4, enabled: false })
    );

    // 接近段中途碰到
    rig.output.set_output(4, -350.0);
    wait_until(|| rig.pose.stop_count() == 1);
    rig.engine.step().unwrap();

    let st = rig.engine.status();
    assert!(st.is_drained());
    assert!(st.contact_detected);
    assert_eq!(
        rig.pose.commands().last(),
        Some(&PoseCommand::Dof { dof: 4, enabled: true })
    );
}

#[test]
fn test_guarded_touch_without_contact_reaches_target() {
    let rig = rig();
    GestureCombinator::new(&rig.engine)
        .with_strategy(ApproachStrategy::ContactGuarded(ContactGuard::new(4, 200.0)))
        .touch(X, AxisAngle::IDENTITY, D)
        .unwrap();

    rig.engine.step().unwrap();
    complete_step(&rig);
    rig.output.set_output(4, 150.0);
    complete_step(&rig);

    let st = rig.engine.status();
    assert!(st.is_drained());
    assert!(!st.contact_detected);
    assert_eq!(rig.pose.stop_count(), 0);
}

#[test]
fn test_guarded_gesture_needs_output_source() {
    let engine = EngineBuilder::new()
        .pose_controller(Arc::new(SimPoseController::new(Completion::Manual)))
        .joint_controller(Arc::new(SimJointController::new(9, Completion::Manual)))
        .hand_sequences(default_hand_sequences())
        .manual_stepping()
        .build()
        .unwrap();
    let err = GestureCombinator::new(&engine)
        .with_strategy(ApproachStrategy::ContactGuarded(ContactGuard::new(4, 200.0)))
        .grasp(X, AxisAngle::IDENTITY, D)
        .unwrap_err();
    assert_eq!(err, GestureError::GuardUnsupported);
    assert_eq!(engine.queue_len(), 0);
}

#[test]
fn test_gesture_with_missing_sequence_is_atomic() {
    let rig = rig();
    rig.engine.remove_hand_seq("close_hand").unwrap();
    let err = GestureCombinator::new(&rig.engine)
        .grasp(X, AxisAngle::IDENTITY, D)
        .unwrap_err();
    assert!(err.is_setup_error());
    assert_eq!(rig.engine.queue_len(), 0);
}
