//! 配置文件到引擎的端到端测试

use affprim_sdk::driver::sim::PoseCommand;
use affprim_sdk::prelude::*;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

const SETTINGS: &str = r#"
[engine]
name = "bench"
part = "right_arm"
period_ms = 20
default_exec_time_s = 1.5
tracking_mode = true
sync_timeout_ms = 2000

[[aux_dof]]
name = "torso_yaw"
index = 2
min = -15.0
max = 15.0
"#;

const SEQUENCES: &str = r#"
[[sequence]]
key = "point"

[[sequence.wp]]
poss = [0.0, 80.0, 60.0, 60.0, 0.0, 0.0, 90.0, 90.0, 90.0]
vels = [30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0]
thres = [1000.0, 1000.0, 1000.0, 1000.0, 1000.0]
"#;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_engine_from_files() -> anyhow::Result<()> {
    let settings_file = write_temp(SETTINGS);
    let sequences_file = write_temp(SEQUENCES);

    let settings = EngineSettings::load_from_file(settings_file.path())?;
    let config = EngineConfig::from_settings(&settings)?;
    assert_eq!(config.period, Duration::from_millis(20));
    assert_eq!(config.sync_timeout, Some(Duration::from_secs(2)));

    let pose = Arc::new(SimPoseController::new(Completion::Manual));
    let engine = EngineBuilder::new()
        .pose_controller(pose.clone())
        .joint_controller(Arc::new(SimJointController::new(9, Completion::Manual)))
        .hand_sequences(HandSequenceFile::load_from_file(sequences_file.path())?)
        .config(config)
        .manual_stepping()
        .build()?;

    assert_eq!(engine.hand_seq_list(), vec!["point"]);
    assert!(engine.tracking_mode());

    engine.push_reach(Position3D::new(0.3, 0.0, 0.2), AxisAngle::IDENTITY)?;
    engine.step()?;
    assert_eq!(pose.exec_times(), vec![Duration::from_millis(1500)]);

    // 运动期间启用辅助自由度及其限位，结束后关闭
    pose.finish_motion();
    engine.step()?;
    let commands = pose.commands();
    assert!(commands.contains(&PoseCommand::Dof { dof: 2, enabled: true }));
    assert!(commands.contains(&PoseCommand::DofLimits {
        dof: 2,
        min_deg: -15.0,
        max_deg: 15.0
    }));
    assert_eq!(
        commands.last(),
        Some(&PoseCommand::Dof { dof: 2, enabled: false })
    );
    Ok(())
}

#[test]
fn test_sequence_file_loads_into_running_engine() -> anyhow::Result<()> {
    let engine = EngineBuilder::new()
        .pose_controller(Arc::new(SimPoseController::new(Completion::Manual)))
        .joint_controller(Arc::new(SimJointController::new(9, Completion::Manual)))
        .manual_stepping()
        .build()?;
    assert!(engine.hand_seq_list().is_empty());

    let defs = HandSequenceFile::from_toml_str(SEQUENCES)?;
    assert_eq!(engine.load_hand_sequences(&defs)?, 1);
    assert!(engine.is_valid_hand_seq("point"));
    Ok(())
}

#[test]
fn test_mismatched_sequence_file_fails_build() {
    let short_positions = SEQUENCES.replace("0.0, 0.0, 90.0, 90.0, 90.0]", "90.0]");
    let defs = HandSequenceFile::from_toml_str(&short_positions).unwrap();
    let err = EngineBuilder::new()
        .pose_controller(Arc::new(SimPoseController::new(Completion::Manual)))
        .joint_controller(Arc::new(SimJointController::new(9, Completion::Manual)))
        .hand_sequences(defs)
        .manual_stepping()
        .build()
        .err()
        .unwrap();
    assert!(err.is_config_error());
}
