//! 手部序列库
//!
//! 序列标签 → 有序路点列表。标签唯一；向未知标签追加路点会隐式创建序列。
//!
//! 序列以 `Arc<Vec<_>>` 存放：执行器启动手部运动时只拷贝一个引用，
//! 之后对库的修改（追加/删除）不影响正在执行的序列。

use crate::error::{EngineError, Result};
use affprim_protocol::{HandLayout, HandWayPoint};
use affprim_tools::HandSequenceDef;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 手部序列库
#[derive(Debug)]
pub struct HandSeqLibrary {
    layout: HandLayout,
    sequences: RwLock<HashMap<String, Arc<Vec<HandWayPoint>>>>,
}

impl HandSeqLibrary {
    /// 创建空库
    pub fn new(layout: HandLayout) -> Self {
        Self {
            layout,
            sequences: RwLock::new(HashMap::new()),
        }
    }

    /// 用于校验路点维度的布局
    pub fn layout(&self) -> &HandLayout {
        &self.layout
    }

    /// 向序列 `tag` 追加一个路点（序列不存在时创建）
    ///
    /// 维度不匹配时返回 [`EngineError::DimensionMismatch`]，库不变。
    pub fn add_way_point(
        &self,
        tag: &str,
        positions: Vec<f64>,
        velocities: Vec<f64>,
        thresholds: Vec<f64>,
    ) -> Result<()> {
        let wp = HandWayPoint::new(tag, positions, velocities, thresholds);
        self.layout.check_way_point(&wp)?;

        let mut sequences = self.sequences.write();
        let seq = sequences.entry(tag.to_string()).or_default();
        Arc::make_mut(seq).push(wp);
        debug!("Hand sequence \"{}\" now has {} way-points", tag, seq.len());
        Ok(())
    }

    /// 序列是否已注册
    pub fn is_valid(&self, tag: &str) -> bool {
        self.sequences.read().contains_key(tag)
    }

    /// 删除序列
    pub fn remove(&self, tag: &str) -> Result<()> {
        match self.sequences.write().remove(tag) {
            Some(_) => Ok(()),
            None => Err(EngineError::UnknownSequence(tag.to_string())),
        }
    }

    /// 所有标签的快照（按字典序）
    pub fn list_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.sequences.read().keys().cloned().collect();
        tags.sort();
        tags
    }

    /// 序列路点的快照
    pub fn get(&self, tag: &str) -> Option<Arc<Vec<HandWayPoint>>> {
        self.sequences.read().get(tag).cloned()
    }

    /// 序列数
    pub fn len(&self) -> usize {
        self.sequences.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.sequences.read().is_empty()
    }

    /// 批量加载序列定义
    ///
    /// 全部校验通过后才写入（要么全部加载，要么不变）。
    /// 与 [`add_way_point`](Self::add_way_point) 一致，已有标签会被追加。
    /// 返回加载的路点总数。
    pub fn load(&self, defs: &[HandSequenceDef]) -> Result<usize> {
        for def in defs {
            if def.key.is_empty() {
                return Err(EngineError::InvalidAction(
                    "hand sequence with an empty key".to_string(),
                ));
            }
            for wp in &def.way_points {
                self.layout.check_way_point(wp)?;
            }
        }

        let mut sequences = self.sequences.write();
        let mut count = 0;
        for def in defs {
            let seq = sequences.entry(def.key.clone()).or_default();
            Arc::make_mut(seq).extend(def.way_points.iter().cloned());
            count += def.way_points.len();
        }
        debug!("Loaded {} hand sequences ({} way-points)", defs.len(), count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lib() -> HandSeqLibrary {
        HandSeqLibrary::new(HandLayout::default())
    }

    fn wp() -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        (vec![10.0; 9], vec![20.0; 9], vec![50.0; 5])
    }

    #[test]
    fn test_add_to_unknown_tag_creates_sequence() {
        let lib = lib();
        let (p, v, t) = wp();
        lib.add_way_point("pinch", p, v, t).unwrap();
        assert_eq!(lib.len(), 1);
        assert_eq!(lib.get("pinch").unwrap().len(), 1);
        assert_eq!(lib.get("pinch").unwrap()[0].tag(), "pinch");
    }

    #[test]
    fn test_dimension_mismatch_leaves_library_unchanged() {
        let lib = lib();
        let err = lib
            .add_way_point("bad", vec![0.0; 7], vec![0.0; 9], vec![0.0; 5])
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::DimensionMismatch {
                field: "positions",
                expected: 9,
                actual: 7
            }
        );
        assert!(!lib.is_valid("bad"));
        assert!(lib.is_empty());
    }

    #[test]
    fn test_list_remove_round_trip() {
        let lib = lib();
        for _ in 0..2 {
            let (p, v, t) = wp();
            lib.add_way_point("T", p, v, t).unwrap();
        }
        assert!(lib.list_tags().contains(&"T".to_string()));
        assert_eq!(lib.get("T").unwrap().len(), 2);

        lib.remove("T").unwrap();
        assert!(!lib.is_valid("T"));
        assert_eq!(lib.remove("T"), Err(EngineError::UnknownSequence("T".into())));
    }

    #[test]
    fn test_snapshot_unaffected_by_later_appends() {
        let lib = lib();
        let (p, v, t) = wp();
        lib.add_way_point("grow", p.clone(), v.clone(), t.clone()).unwrap();
        let snapshot = lib.get("grow").unwrap();
        lib.add_way_point("grow", p, v, t).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(lib.get("grow").unwrap().len(), 2);
    }

    #[test]
    fn test_load_is_all_or_nothing() {
        let lib = lib();
        let good = HandSequenceDef {
            key: "good".into(),
            way_points: vec![HandWayPoint::new("good", vec![0.0; 9], vec![1.0; 9], vec![1.0; 5])],
        };
        let bad = HandSequenceDef {
            key: "bad".into(),
            way_points: vec![HandWayPoint::new("bad", vec![0.0; 9], vec![1.0; 9], vec![1.0; 3])],
        };

        assert!(lib.load(&[good.clone(), bad]).is_err());
        assert!(lib.is_empty());

        assert_eq!(lib.load(&[good]).unwrap(), 1);
        assert!(lib.is_valid("good"));
    }

    proptest! {
        #[test]
        fn prop_one_sequence_per_distinct_tag(tags in proptest::collection::vec("[a-d]{1,2}", 1..20)) {
            let lib = lib();
            for tag in &tags {
                let (p, v, t) = wp();
                lib.add_way_point(tag, p, v, t).unwrap();
            }
            let mut distinct = tags.clone();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(lib.list_tags(), distinct.clone());

            for tag in &distinct {
                let expected = tags.iter().filter(|t| *t == tag).count();
                prop_assert_eq!(lib.get(tag).unwrap().len(), expected);
            }
        }
    }
}
