//! 规则集持久化形态
//!
//! 后端以父指针形式存储规则树：每个节点一行，`parentRuleId` 指向父节点。
//!
//! - 组节点行：`logicOperator` 为组合器，`action` 为 null，`conditions` 为空
//! - 叶子规则行：`logicOperator` 为 null，携带 `action` 与恰好一个条件
//!
//! `flatten` 按先序为节点分配从 1 开始的行 ID；`rehydrate` 是其逆变换。

use crate::error::Result;
use crate::models::{
    Attribute, Condition, ROOT_GROUP_ID, RuleGroup, RuleNode, Ruleset, ScoringRule,
};
use crate::operators::{LogicalOperator, Operation};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, warn};

/// 叶子规则的计分动作
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(default)]
    pub operation: Option<Operation>,
    #[serde(default)]
    pub points: Option<f64>,
}

/// 扁平规则行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRuleRow {
    pub rule_id: i64,
    #[serde(default)]
    pub parent_rule_id: Option<i64>,
    #[serde(default)]
    pub logic_operator: Option<LogicalOperator>,
    #[serde(default)]
    pub action: Option<RuleAction>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl FlatRuleRow {
    fn is_group(&self, has_children: bool) -> bool {
        self.logic_operator.is_some() || has_children || self.conditions.is_empty()
    }
}

/// 与后端交换的规则集记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRuleset {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub base_weight: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub form_order: Vec<usize>,
    #[serde(default)]
    pub selected_programs: Vec<i64>,
    #[serde(default)]
    pub rules: Vec<FlatRuleRow>,
}

impl PersistedRuleset {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_ruleset(ruleset: &Ruleset) -> Self {
        Self {
            id: ruleset.id,
            name: ruleset.name.clone(),
            base_weight: ruleset.base_weight,
            description: ruleset.description.clone(),
            attributes: ruleset.attributes.clone(),
            form_order: ruleset.form_order.clone(),
            selected_programs: ruleset.selected_programs.clone(),
            rules: flatten(&ruleset.root_group),
        }
    }

    /// 重建为编辑器使用的规则集
    ///
    /// 缺失的 formOrder 按恒等排列补齐。
    pub fn into_ruleset(self) -> Ruleset {
        let root_group = rehydrate(&self.rules);
        let mut ruleset = Ruleset {
            id: self.id,
            name: self.name,
            base_weight: self.base_weight,
            description: self.description,
            root_group,
            attributes: self.attributes,
            form_order: self.form_order,
            selected_programs: self.selected_programs,
        };
        if ruleset.form_order.is_empty() && !ruleset.attributes.is_empty() {
            ruleset.reset_form_order();
        }
        ruleset
    }
}

/// 把规则树展开为父指针行（先序）
pub fn flatten(root: &RuleGroup) -> Vec<FlatRuleRow> {
    let mut rows = Vec::with_capacity(root.node_count());
    let mut next_id = 1;
    flatten_group(root, None, &mut next_id, &mut rows);
    rows
}

fn flatten_group(
    group: &RuleGroup,
    parent: Option<i64>,
    next_id: &mut i64,
    rows: &mut Vec<FlatRuleRow>,
) {
    let rule_id = *next_id;
    *next_id += 1;
    rows.push(FlatRuleRow {
        rule_id,
        parent_rule_id: parent,
        logic_operator: Some(group.combinator),
        action: None,
        conditions: Vec::new(),
    });

    for child in &group.children {
        match child {
            RuleNode::Group(g) => flatten_group(g, Some(rule_id), next_id, rows),
            RuleNode::Rule(r) => {
                rows.push(FlatRuleRow {
                    rule_id: *next_id,
                    parent_rule_id: Some(rule_id),
                    logic_operator: None,
                    action: Some(RuleAction {
                        operation: Some(r.operation),
                        points: Some(r.points),
                    }),
                    conditions: vec![Condition::new(
                        r.attribute_id,
                        r.condition.clone(),
                        r.value.clone(),
                    )],
                });
                *next_id += 1;
            }
        }
    }
}

/// 从父指针行重建规则树
///
/// 唯一的顶层组行成为根组（ID 固定为 `root`），否则用一个 AND 根组容纳全部顶层行。
/// 重复 ID、父节点不存在或处于环上的行会被丢弃并记录告警。
#[instrument(skip(rows), fields(rows = rows.len()))]
pub fn rehydrate(rows: &[FlatRuleRow]) -> RuleGroup {
    let mut index: HashMap<i64, &FlatRuleRow> = HashMap::with_capacity(rows.len());
    for row in rows {
        if index.insert(row.rule_id, row).is_some() {
            warn!(rule_id = row.rule_id, "重复的规则行 ID，保留最后一行");
        }
    }

    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    let mut top_level = Vec::new();
    let mut seen = HashSet::new();
    for row in rows {
        if !seen.insert(row.rule_id) {
            continue;
        }
        match row.parent_rule_id {
            None => top_level.push(row.rule_id),
            Some(parent) if index.contains_key(&parent) => {
                children.entry(parent).or_default().push(row.rule_id)
            }
            Some(parent) => {
                warn!(rule_id = row.rule_id, parent, "父规则不存在，丢弃该行");
            }
        }
    }

    let mut visited = HashSet::new();
    let nodes: Vec<RuleNode> = top_level
        .iter()
        .filter_map(|id| build_node(*id, &index, &children, &mut visited))
        .collect();

    let unreachable = index.len() - visited.len();
    if unreachable > 0 {
        warn!(unreachable, "存在无法从顶层到达的规则行（孤立或成环），已丢弃");
    }

    match nodes.as_slice() {
        [RuleNode::Group(group)] => RuleGroup {
            id: ROOT_GROUP_ID.to_string(),
            ..group.clone()
        },
        _ => RuleGroup::root().with_children(nodes),
    }
}

fn build_node(
    id: i64,
    index: &HashMap<i64, &FlatRuleRow>,
    children: &HashMap<i64, Vec<i64>>,
    visited: &mut HashSet<i64>,
) -> Option<RuleNode> {
    if !visited.insert(id) {
        warn!(rule_id = id, "规则行成环，已截断");
        return None;
    }
    let row = index.get(&id)?;
    let child_ids = children.get(&id).map(Vec::as_slice).unwrap_or_default();

    if row.is_group(!child_ids.is_empty()) {
        if !row.conditions.is_empty() {
            debug!(rule_id = id, "组行上的条件被忽略");
        }
        let nodes = child_ids
            .iter()
            .filter_map(|child| build_node(*child, index, children, visited))
            .collect();
        return Some(RuleNode::Group(RuleGroup {
            id: id.to_string(),
            combinator: row.logic_operator.unwrap_or_default(),
            children: nodes,
        }));
    }

    if row.conditions.len() > 1 {
        debug!(
            rule_id = id,
            conditions = row.conditions.len(),
            "叶子规则只保留第一个条件"
        );
    }
    let condition = row.conditions.first()?;
    let action = row.action.clone().unwrap_or_default();

    Some(RuleNode::Rule(ScoringRule {
        id: id.to_string(),
        attribute_id: condition.evaluated_attribute_id,
        condition: condition.operator.clone(),
        value: condition.value1.clone(),
        operation: action.operation.unwrap_or_default(),
        points: action.points.unwrap_or(0.0),
    }))
}
