//! # 手部序列定义文件
//!
//! 只读加载，从不写回。每个序列由一个 key 和若干路点组成；
//! `poss` / `vels` 为 N 个手部关节的位置（度）和速度（度/秒），
//! `thres` 为 M 个手指的接触检测阈值。
//!
//! ```toml
//! num_sequences = 2
//!
//! [[sequence]]
//! key = "open_hand"
//!
//! [[sequence.wp]]
//! poss = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
//! vels = [40.0, 40.0, 40.0, 40.0, 40.0, 40.0, 40.0, 40.0, 40.0]
//! thres = [1000.0, 1000.0, 1000.0, 1000.0, 1000.0]
//!
//! [[sequence]]
//! key = "close_hand"
//! # ...
//! ```
//!
//! `num_sequences` 可选；给出时必须与实际序列数一致。

use affprim_protocol::{HandLayout, HandWayPoint};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// 文件中的一个路点
#[derive(Debug, Clone, Deserialize)]
struct WayPointEntry {
    poss: Vec<f64>,
    vels: Vec<f64>,
    thres: Vec<f64>,
}

/// 文件中的一个序列
#[derive(Debug, Clone, Deserialize)]
struct SequenceEntry {
    key: String,
    #[serde(default)]
    wp: Vec<WayPointEntry>,
}

/// 已解析的序列定义
#[derive(Debug, Clone, PartialEq)]
pub struct HandSequenceDef {
    /// 序列 key
    pub key: String,
    /// 有序路点
    pub way_points: Vec<HandWayPoint>,
}

/// 手部序列文件
#[derive(Debug, Clone, Deserialize)]
pub struct HandSequenceFile {
    #[serde(default)]
    num_sequences: Option<usize>,
    #[serde(default)]
    sequence: Vec<SequenceEntry>,
}

impl HandSequenceFile {
    /// 从文件加载
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<HandSequenceDef>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read hand sequence file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid hand sequence file {}", path.display()))
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(content: &str) -> Result<Vec<HandSequenceDef>> {
        let file: HandSequenceFile = toml::from_str(content).context("failed to parse TOML")?;
        file.into_defs()
    }

    fn into_defs(self) -> Result<Vec<HandSequenceDef>> {
        if let Some(expected) = self.num_sequences
            && expected != self.sequence.len()
        {
            bail!(
                "num_sequences = {} but {} sequences are defined",
                expected,
                self.sequence.len()
            );
        }

        let mut seen = HashSet::new();
        let mut defs = Vec::with_capacity(self.sequence.len());
        for (i, seq) in self.sequence.into_iter().enumerate() {
            if seq.key.is_empty() {
                bail!("sequence #{} has an empty key", i);
            }
            if !seen.insert(seq.key.clone()) {
                bail!("duplicate sequence key \"{}\"", seq.key);
            }
            if seq.wp.is_empty() {
                bail!("sequence \"{}\" has no way-points", seq.key);
            }
            let way_points = seq
                .wp
                .into_iter()
                .map(|wp| HandWayPoint::new(seq.key.clone(), wp.poss, wp.vels, wp.thres))
                .collect();
            defs.push(HandSequenceDef {
                key: seq.key,
                way_points,
            });
        }
        Ok(defs)
    }
}

impl HandSequenceDef {
    /// 按布局校验所有路点的维度
    pub fn check_layout(&self, layout: &HandLayout) -> Result<()> {
        for (i, wp) in self.way_points.iter().enumerate() {
            layout
                .check_way_point(wp)
                .with_context(|| format!("sequence \"{}\", way-point #{}", self.key, i))?;
        }
        Ok(())
    }
}

/// 默认布局下的内置序列：`open_hand`、`close_hand`、`karate_hand`
pub fn default_hand_sequences() -> Vec<HandSequenceDef> {
    let seq = |key: &str, wps: &[([f64; 9], f64, f64)]| HandSequenceDef {
        key: key.to_string(),
        way_points: wps
            .iter()
            .map(|(poss, vel, thres)| {
                HandWayPoint::new(key, poss.to_vec(), vec![*vel; 9], vec![*thres; 5])
            })
            .collect(),
    };

    vec![
        seq(
            "open_hand",
            &[([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 40.0, 1000.0)],
        ),
        seq(
            "close_hand",
            &[
                ([40.0, 80.0, 10.0, 20.0, 20.0, 40.0, 20.0, 40.0, 90.0], 40.0, 50.0),
                ([40.0, 80.0, 40.0, 50.0, 70.0, 90.0, 70.0, 90.0, 180.0], 40.0, 50.0),
            ],
        ),
        seq(
            "karate_hand",
            &[
                ([0.0, 80.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 40.0, 1000.0),
                ([0.0, 80.0, 60.0, 60.0, 0.0, 0.0, 0.0, 0.0, 0.0], 40.0, 1000.0),
            ],
        ),
    ]
}
