//! 参数解析与配置路径工具

use affprim_sdk::{AxisAngle, Position3D};
use affprim_tools::EngineSettings;
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// 默认配置文件路径（`<config_dir>/affprim/engine.toml`）
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("affprim");
    path.push("engine.toml");
    Ok(path)
}

/// 加载配置；文件不存在时使用默认值
pub fn load_settings(path: Option<&Path>) -> Result<EngineSettings> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    if !path.exists() {
        return Ok(EngineSettings::default());
    }
    EngineSettings::load_from_file(&path)
}

/// 解析逗号分隔的浮点数
fn parse_floats(s: &str, expected: usize, what: &str) -> Result<Vec<f64>> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("解析{}失败: {}", what, s))?;
    if values.len() != expected {
        bail!("{}需要 {} 个分量，得到 {} 个", what, expected, values.len());
    }
    if values.iter().any(|v| !v.is_finite()) {
        bail!("{}包含非有限值: {}", what, s);
    }
    Ok(values)
}

/// 解析位置 `x,y,z`（米）
pub fn parse_position(s: &str) -> Result<Position3D> {
    let v = parse_floats(s, 3, "位置")?;
    Ok(Position3D::new(v[0], v[1], v[2]))
}

/// 解析轴角 `x,y,z,angle`（弧度）
pub fn parse_orientation(s: &str) -> Result<AxisAngle> {
    let v = parse_floats(s, 4, "姿态")?;
    Ok(AxisAngle::new(v[0], v[1], v[2], v[3]))
}
