//! 规则树变更引擎
//!
//! 所有操作都是纯函数：接收当前根组，返回新的根组，不修改输入。
//! 目标 ID 或路径不存在时原样返回（结构相等），不会报错。
//!
//! 两类寻址方式共用同一棵树：
//! - 按 ID：`update_group` / `add_rule` / `remove_group` / `clone_group` 等，供编辑器使用
//! - 按路径：`find_item_by_id` / `remove_item` / `insert_item` / `move_item`，供拖拽协调器使用。
//!   路径是相对根组 `children` 的下标序列。

use crate::error::RuleError;
use crate::ids::{IdGenerator, fresh_id};
use crate::models::{RuleGroup, RuleNode, ScoringRule};
use crate::operators::{ConditionOperator, LogicalOperator, Operation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use tracing::{debug, warn};

/// 逻辑组字段补丁
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupPatch {
    #[serde(default)]
    pub combinator: Option<LogicalOperator>,
}

impl GroupPatch {
    pub fn combinator(combinator: LogicalOperator) -> Self {
        Self {
            combinator: Some(combinator),
        }
    }

    fn apply_to(&self, group: &RuleGroup) -> RuleGroup {
        RuleGroup {
            combinator: self.combinator.unwrap_or(group.combinator),
            ..group.clone()
        }
    }
}

/// 叶子规则字段补丁
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePatch {
    #[serde(default)]
    pub attribute_id: Option<i64>,
    #[serde(default)]
    pub condition: Option<ConditionOperator>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub operation: Option<Operation>,
    #[serde(default)]
    pub points: Option<f64>,
}

impl RulePatch {
    pub fn points(points: f64) -> Self {
        Self {
            points: Some(points),
            ..Default::default()
        }
    }

    pub fn operation(operation: Operation) -> Self {
        Self {
            operation: Some(operation),
            ..Default::default()
        }
    }

    pub fn with_points(mut self, points: f64) -> Self {
        self.points = Some(points);
        self
    }

    /// 返回打过补丁的新规则，ID 保持不变
    pub fn apply_to(&self, rule: &ScoringRule) -> ScoringRule {
        ScoringRule {
            id: rule.id.clone(),
            attribute_id: self.attribute_id.unwrap_or(rule.attribute_id),
            condition: self
                .condition
                .clone()
                .unwrap_or_else(|| rule.condition.clone()),
            value: self.value.clone().unwrap_or_else(|| rule.value.clone()),
            operation: self.operation.unwrap_or(rule.operation),
            points: self.points.unwrap_or(rule.points),
        }
    }
}

/// 克隆节点的放置位置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClonePlacement {
    /// 追加到根组末尾
    #[default]
    Root,
    /// 紧跟在原节点之后
    Sibling,
}

impl FromStr for ClonePlacement {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "root" => Ok(Self::Root),
            "sibling" => Ok(Self::Sibling),
            other => Err(RuleError::ParseError(format!(
                "未知的克隆位置: {}（可选 root / sibling）",
                other
            ))),
        }
    }
}

/// 按 ID 查找到的节点及其路径
#[derive(Debug, Clone, PartialEq)]
pub struct FoundItem<'a> {
    pub item: &'a RuleNode,
    pub path: Vec<usize>,
}

impl RuleGroup {
    // ==================== 按 ID 的变更 ====================

    /// 更新匹配组的字段
    pub fn update_group(&self, group_id: &str, patch: &GroupPatch) -> RuleGroup {
        if self.find_group(group_id).is_none() {
            debug!(group_id, "update_group: 目标组不存在");
            return self.clone();
        }
        self.rewrite_group(group_id, &|g| patch.apply_to(g))
    }

    /// 更新匹配的叶子规则
    pub fn update_rule(&self, rule_id: &str, patch: &RulePatch) -> RuleGroup {
        RuleGroup {
            id: self.id.clone(),
            combinator: self.combinator,
            children: self
                .children
                .iter()
                .map(|child| match child {
                    RuleNode::Group(g) => RuleNode::Group(g.update_rule(rule_id, patch)),
                    RuleNode::Rule(r) if r.id == rule_id => RuleNode::Rule(patch.apply_to(r)),
                    RuleNode::Rule(r) => RuleNode::Rule(r.clone()),
                })
                .collect(),
        }
    }

    /// 向匹配组追加叶子规则
    pub fn add_rule(&self, group_id: &str, rule: ScoringRule) -> RuleGroup {
        self.append_child(group_id, RuleNode::Rule(rule))
    }

    /// 向匹配组追加子组
    pub fn add_group(&self, group_id: &str, group: RuleGroup) -> RuleGroup {
        self.append_child(group_id, RuleNode::Group(group))
    }

    /// 删除指定组及其整棵子树；根组自身不能删除
    pub fn remove_group(&self, group_id: &str) -> RuleGroup {
        if self.id == group_id {
            warn!(group_id, "remove_group: 根组不能被删除");
            return self.clone();
        }

        RuleGroup {
            id: self.id.clone(),
            combinator: self.combinator,
            children: self
                .children
                .iter()
                .filter(|child| !matches!(child, RuleNode::Group(g) if g.id == group_id))
                .map(|child| match child {
                    RuleNode::Group(g) => RuleNode::Group(g.remove_group(group_id)),
                    RuleNode::Rule(r) => RuleNode::Rule(r.clone()),
                })
                .collect(),
        }
    }

    /// 删除指定叶子规则；被清空的组保留
    pub fn remove_rule(&self, rule_id: &str) -> RuleGroup {
        RuleGroup {
            id: self.id.clone(),
            combinator: self.combinator,
            children: self
                .children
                .iter()
                .filter(|child| !matches!(child, RuleNode::Rule(r) if r.id == rule_id))
                .map(|child| match child {
                    RuleNode::Group(g) => RuleNode::Group(g.remove_rule(rule_id)),
                    RuleNode::Rule(r) => RuleNode::Rule(r.clone()),
                })
                .collect(),
        }
    }

    /// 深拷贝一个子树并为每个节点分配新 ID
    pub fn clone_group(
        &self,
        group: &RuleGroup,
        ids: &mut dyn IdGenerator,
        placement: ClonePlacement,
    ) -> RuleGroup {
        let mut taken: HashSet<String> = self.all_ids().into_iter().collect();
        taken.extend(group.all_ids());

        let cloned = reassign_ids(group, ids, &mut taken);
        self.place_clone(&group.id, RuleNode::Group(cloned), placement)
    }

    /// 拷贝一条叶子规则并分配新 ID
    pub fn clone_rule(
        &self,
        rule: &ScoringRule,
        ids: &mut dyn IdGenerator,
        placement: ClonePlacement,
    ) -> RuleGroup {
        let mut taken: HashSet<String> = self.all_ids().into_iter().collect();
        taken.insert(rule.id.clone());

        let cloned = ScoringRule {
            id: fresh_id(ids, &mut taken),
            ..rule.clone()
        };
        self.place_clone(&rule.id, RuleNode::Rule(cloned), placement)
    }

    /// 按 ID 查找组（包括根组自身）
    pub fn find_group(&self, group_id: &str) -> Option<&RuleGroup> {
        if self.id == group_id {
            return Some(self);
        }
        self.children.iter().find_map(|child| match child {
            RuleNode::Group(g) => g.find_group(group_id),
            RuleNode::Rule(_) => None,
        })
    }

    /// 按 ID 查找叶子规则
    pub fn find_rule(&self, rule_id: &str) -> Option<&ScoringRule> {
        self.children.iter().find_map(|child| match child {
            RuleNode::Group(g) => g.find_rule(rule_id),
            RuleNode::Rule(r) if r.id == rule_id => Some(r),
            RuleNode::Rule(_) => None,
        })
    }

    // ==================== 按路径的变更 ====================

    /// 先序深度优先查找，返回第一个匹配节点及其路径
    pub fn find_item_by_id(&self, id: &str) -> Option<FoundItem<'_>> {
        find_in(&self.children, id)
    }

    /// 删除路径上的节点；路径无效时原样返回
    pub fn remove_item(&self, path: &[usize]) -> RuleGroup {
        match self.take_item(path) {
            Some((tree, _)) => tree,
            None => self.clone(),
        }
    }

    /// 删除路径上的节点，同时返回被删除的节点
    pub fn take_item(&self, path: &[usize]) -> Option<(RuleGroup, RuleNode)> {
        let mut tree = self.clone();
        match splice_remove(&mut tree.children, path) {
            Some(item) => Some((tree, item)),
            None => {
                debug!(?path, "remove_item: 无效路径");
                None
            }
        }
    }

    /// 在路径处插入节点，末级下标超出时追加到末尾
    ///
    /// 中间路径无效或节点 ID 与树中已有 ID 冲突时原样返回。
    pub fn insert_item(&self, item: RuleNode, path: &[usize]) -> RuleGroup {
        if let Some(duplicate) = self.first_duplicate_of(&item) {
            warn!(id = %duplicate, "insert_item: 节点 ID 已存在，拒绝插入");
            return self.clone();
        }

        let mut tree = self.clone();
        match splice_insert(&mut tree.children, path, item) {
            Ok(()) => tree,
            Err(_) => {
                debug!(?path, "insert_item: 无效路径");
                self.clone()
            }
        }
    }

    /// 把 `from` 处的节点移动到 `to`
    ///
    /// `to` 以删除源节点之后的树为准。任一步失败时原样返回。
    pub fn move_item(&self, from: &[usize], to: &[usize]) -> RuleGroup {
        let Some((without, item)) = self.take_item(from) else {
            return self.clone();
        };

        let mut tree = without;
        match splice_insert(&mut tree.children, to, item) {
            Ok(()) => tree,
            Err(_) => {
                debug!(?from, ?to, "move_item: 目标路径无效");
                self.clone()
            }
        }
    }

    // ==================== 内部辅助 ====================

    fn rewrite_group(&self, group_id: &str, f: &dyn Fn(&RuleGroup) -> RuleGroup) -> RuleGroup {
        if self.id == group_id {
            return f(self);
        }
        RuleGroup {
            id: self.id.clone(),
            combinator: self.combinator,
            children: self
                .children
                .iter()
                .map(|child| match child {
                    RuleNode::Group(g) => RuleNode::Group(g.rewrite_group(group_id, f)),
                    RuleNode::Rule(r) => RuleNode::Rule(r.clone()),
                })
                .collect(),
        }
    }

    fn append_child(&self, group_id: &str, node: RuleNode) -> RuleGroup {
        if self.find_group(group_id).is_none() {
            debug!(group_id, "append: 目标组不存在");
            return self.clone();
        }
        if let Some(duplicate) = self.first_duplicate_of(&node) {
            warn!(id = %duplicate, "append: 节点 ID 已存在，拒绝插入");
            return self.clone();
        }

        self.rewrite_group(group_id, &|g| {
            let mut g = g.clone();
            g.children.push(node.clone());
            g
        })
    }

    fn place_clone(&self, original_id: &str, node: RuleNode, placement: ClonePlacement) -> RuleGroup {
        if placement == ClonePlacement::Sibling {
            if let Some(found) = self.find_item_by_id(original_id) {
                let mut path = found.path;
                if let Some(last) = path.last_mut() {
                    *last += 1;
                }
                return self.insert_item(node, &path);
            }
            debug!(original_id, "clone: 原节点不在树中，追加到根组");
        }
        let root_id = self.id.clone();
        self.append_child(&root_id, node)
    }

    /// 节点（含子树）中第一个与树内已有 ID 冲突的 ID
    fn first_duplicate_of(&self, node: &RuleNode) -> Option<String> {
        let existing: HashSet<String> = self.all_ids().into_iter().collect();
        let mut incoming = Vec::new();
        node.collect_ids(&mut incoming);

        let mut seen = HashSet::new();
        incoming
            .into_iter()
            .find(|id| existing.contains(id) || !seen.insert(id.clone()))
    }
}

fn reassign_ids(
    group: &RuleGroup,
    ids: &mut dyn IdGenerator,
    taken: &mut HashSet<String>,
) -> RuleGroup {
    let id = fresh_id(ids, taken);
    let children = group
        .children
        .iter()
        .map(|child| match child {
            RuleNode::Group(g) => RuleNode::Group(reassign_ids(g, ids, taken)),
            RuleNode::Rule(r) => RuleNode::Rule(ScoringRule {
                id: fresh_id(ids, taken),
                ..r.clone()
            }),
        })
        .collect();

    RuleGroup {
        id,
        combinator: group.combinator,
        children,
    }
}

fn find_in<'a>(items: &'a [RuleNode], id: &str) -> Option<FoundItem<'a>> {
    for (i, item) in items.iter().enumerate() {
        if item.id() == id {
            return Some(FoundItem {
                item,
                path: vec![i],
            });
        }
        if let RuleNode::Group(g) = item {
            if let Some(found) = find_in(&g.children, id) {
                let mut path = Vec::with_capacity(found.path.len() + 1);
                path.push(i);
                path.extend(found.path);
                return Some(FoundItem {
                    item: found.item,
                    path,
                });
            }
        }
    }
    None
}

fn splice_remove(children: &mut Vec<RuleNode>, path: &[usize]) -> Option<RuleNode> {
    match path {
        [] => None,
        [last] => (*last < children.len()).then(|| children.remove(*last)),
        [head, rest @ ..] => match children.get_mut(*head) {
            Some(RuleNode::Group(g)) => splice_remove(&mut g.children, rest),
            _ => None,
        },
    }
}

fn splice_insert(
    children: &mut Vec<RuleNode>,
    path: &[usize],
    item: RuleNode,
) -> Result<(), RuleNode> {
    match path {
        [] => Err(item),
        [last] => {
            let index = (*last).min(children.len());
            children.insert(index, item);
            Ok(())
        }
        [head, rest @ ..] => match children.get_mut(*head) {
            Some(RuleNode::Group(g)) => splice_insert(&mut g.children, rest, item),
            _ => Err(item),
        },
    }
}
