//! 规则引擎领域模型
//!
//! 包含属性（表单字段）定义、计分规则树、规则集以及表单取值上下文。

use crate::operators::{ConditionOperator, LogicalOperator, Operation, VisibilityAction};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use validator::Validate;

/// 根组的固定 ID
pub const ROOT_GROUP_ID: &str = "root";

// ==================== 属性 ====================

/// 属性类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeType {
    SingleLineText,
    MultiLineText,
    Number,
    Date,
    Dropdown,
    Multiselect,
}

impl AttributeType {
    /// 是否为选择类（必须配置选项）
    pub fn is_choice(self) -> bool {
        matches!(self, Self::Dropdown | Self::Multiselect)
    }

    /// 是否为数值类（允许 min/max 校验与排序比较）
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Date)
    }

    /// 计分规则中允许使用的操作符
    pub fn scoring_operators(self) -> &'static [ConditionOperator] {
        match self {
            Self::SingleLineText | Self::MultiLineText | Self::Dropdown | Self::Multiselect => {
                TEXT_OPERATORS
            }
            Self::Number | Self::Date => ORDERED_OPERATORS,
        }
    }

    /// 可见性条件中允许使用的操作符
    pub fn visibility_operators(self) -> &'static [ConditionOperator] {
        match self {
            Self::SingleLineText | Self::Dropdown => TEXT_OPERATORS,
            Self::MultiLineText | Self::Multiselect => MEMBERSHIP_OPERATORS,
            Self::Number | Self::Date => ORDERED_OPERATORS,
        }
    }
}

const TEXT_OPERATORS: &[ConditionOperator] = &[
    ConditionOperator::Equals,
    ConditionOperator::NotEquals,
    ConditionOperator::Contains,
    ConditionOperator::NotContains,
];

const MEMBERSHIP_OPERATORS: &[ConditionOperator] =
    &[ConditionOperator::Contains, ConditionOperator::NotContains];

const ORDERED_OPERATORS: &[ConditionOperator] = &[
    ConditionOperator::Equals,
    ConditionOperator::NotEquals,
    ConditionOperator::GreaterThan,
    ConditionOperator::LessThan,
    ConditionOperator::GreaterThanOrEqual,
    ConditionOperator::LessThanOrEqual,
];

/// 数值校验规则
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl ValidationRule {
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }
}

/// 原子条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub condition_id: Option<Value>,
    #[serde(deserialize_with = "deserialize_attribute_id")]
    pub evaluated_attribute_id: i64,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value1: String,
    /// 保留字段，计分与可见性评估均不使用
    #[serde(default)]
    pub value2: Option<String>,
}

impl Condition {
    pub fn new(
        evaluated_attribute_id: i64,
        operator: impl Into<ConditionOperator>,
        value1: impl Into<String>,
    ) -> Self {
        Self {
            condition_id: None,
            evaluated_attribute_id,
            operator: operator.into(),
            value1: value1.into(),
            value2: None,
        }
    }
}

/// 可见性规则（属性级或选项级）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRule {
    pub action: VisibilityAction,
    #[serde(default)]
    pub logic_operator: LogicalOperator,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl VisibilityRule {
    pub fn new(action: VisibilityAction, logic_operator: LogicalOperator) -> Self {
        Self {
            action,
            logic_operator,
            conditions: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// 条件中引用的属性 ID
    pub fn referenced_attributes(&self) -> impl Iterator<Item = i64> + '_ {
        self.conditions.iter().map(|c| c.evaluated_attribute_id)
    }
}

/// 选择类属性的选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeOption {
    pub label: String,
    pub value: String,
    /// 选项级可见性规则
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<VisibilityRule>,
}

impl AttributeOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            rule: None,
        }
    }
}

/// 属性（表单字段）定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub attribute_id: i64,
    #[validate(length(min = 2, message = "属性名称至少需要2个字符"))]
    pub name: String,
    #[validate(length(min = 2, message = "显示名称至少需要2个字符"))]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    #[serde(default, deserialize_with = "deserialize_options")]
    pub options: Vec<AttributeOption>,
    #[serde(default)]
    pub validation_rule: Option<ValidationRule>,
    /// 属性自身的可见性规则；持久化形态可能是数组，只取第一条
    #[serde(default, deserialize_with = "deserialize_visibility_rule")]
    pub rules: Option<VisibilityRule>,
    /// 可见性规则所引用的其它属性 ID，仅用于阻止不安全的移除
    #[serde(default, deserialize_with = "deserialize_depends_on")]
    pub depends_on: Vec<i64>,
}

impl Attribute {
    pub fn new(
        attribute_id: i64,
        name: impl Into<String>,
        display_name: impl Into<String>,
        attribute_type: AttributeType,
    ) -> Self {
        Self {
            attribute_id,
            name: name.into(),
            display_name: display_name.into(),
            description: None,
            category_id: None,
            attribute_type,
            options: Vec::new(),
            validation_rule: None,
            rules: None,
            depends_on: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: Vec<AttributeOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_rule(mut self, rule: VisibilityRule) -> Self {
        self.rules = Some(rule);
        self
    }

    pub fn with_validation(mut self, rule: ValidationRule) -> Self {
        self.validation_rule = Some(rule);
        self
    }

    /// 可见性规则引用的属性 ID（去重，保持首次出现顺序）
    pub fn referenced_attributes(&self) -> Vec<i64> {
        let mut seen = HashSet::new();
        self.rules
            .iter()
            .flat_map(|r| r.referenced_attributes())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// 持久化的 rules 字段可能是 null、单个对象或数组
fn deserialize_visibility_rule<'de, D>(deserializer: D) -> Result<Option<VisibilityRule>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<VisibilityRule>),
        One(VisibilityRule),
    }

    Ok(
        match Option::<OneOrMany>::deserialize(deserializer)? {
            None => None,
            Some(OneOrMany::One(rule)) => Some(rule),
            Some(OneOrMany::Many(rules)) => rules.into_iter().next(),
        },
    )
}

fn deserialize_options<'de, D>(deserializer: D) -> Result<Vec<AttributeOption>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<AttributeOption>>::deserialize(deserializer)?.unwrap_or_default())
}

/// 属性 ID 在持久化数据中可能是数字，也可能是数字字符串
#[derive(Deserialize)]
#[serde(untagged)]
enum AttributeIdRepr {
    Number(i64),
    Text(String),
}

impl AttributeIdRepr {
    fn into_id<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            Self::Number(id) => Ok(id),
            Self::Text(raw) => raw
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("无效的属性 ID: {:?}", raw))),
        }
    }
}

fn deserialize_attribute_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    AttributeIdRepr::deserialize(deserializer)?.into_id()
}

/// dependsOn 既可能是 ID 列表，也可能是嵌入的属性对象列表
fn deserialize_depends_on<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Dependency {
        Id(AttributeIdRepr),
        #[serde(rename_all = "camelCase")]
        Embedded { attribute_id: AttributeIdRepr },
    }

    let deps = Option::<Vec<Dependency>>::deserialize(deserializer)?.unwrap_or_default();
    deps.into_iter()
        .map(|d| match d {
            Dependency::Id(id) => id.into_id(),
            Dependency::Embedded { attribute_id } => attribute_id.into_id(),
        })
        .collect()
}

// ==================== 计分规则树 ====================

/// 规则树节点（逻辑组或叶子规则）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleNode {
    Group(RuleGroup),
    Rule(ScoringRule),
}

impl RuleNode {
    pub fn id(&self) -> &str {
        match self {
            Self::Group(g) => &g.id,
            Self::Rule(r) => &r.id,
        }
    }

    pub fn as_group(&self) -> Option<&RuleGroup> {
        match self {
            Self::Group(g) => Some(g),
            Self::Rule(_) => None,
        }
    }

    pub fn as_rule(&self) -> Option<&ScoringRule> {
        match self {
            Self::Rule(r) => Some(r),
            Self::Group(_) => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// 收集本节点及其子树中的全部 ID（先序）
    pub fn collect_ids(&self, ids: &mut Vec<String>) {
        match self {
            Self::Group(g) => g.collect_ids(ids),
            Self::Rule(r) => ids.push(r.id.clone()),
        }
    }

    /// 子树中是否存在指定 ID（包括自身）
    pub fn contains_id(&self, id: &str) -> bool {
        match self {
            Self::Group(g) => g.contains_id(id),
            Self::Rule(r) => r.id == id,
        }
    }

    /// 忽略 ID 的结构等价比较
    pub fn same_shape(&self, other: &RuleNode) -> bool {
        match (self, other) {
            (Self::Group(a), Self::Group(b)) => a.same_shape(b),
            (Self::Rule(a), Self::Rule(b)) => a.same_shape(b),
            _ => false,
        }
    }
}

impl From<RuleGroup> for RuleNode {
    fn from(group: RuleGroup) -> Self {
        Self::Group(group)
    }
}

impl From<ScoringRule> for RuleNode {
    fn from(rule: ScoringRule) -> Self {
        Self::Rule(rule)
    }
}

/// 逻辑组节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleGroup {
    pub id: String,
    #[serde(default)]
    pub combinator: LogicalOperator,
    #[serde(default)]
    pub children: Vec<RuleNode>,
}

impl RuleGroup {
    pub fn new(id: impl Into<String>, combinator: LogicalOperator) -> Self {
        Self {
            id: id.into(),
            combinator,
            children: Vec::new(),
        }
    }

    /// 新规则集使用的空根组
    pub fn root() -> Self {
        Self::new(ROOT_GROUP_ID, LogicalOperator::And)
    }

    pub fn with_children(mut self, children: Vec<RuleNode>) -> Self {
        self.children = children;
        self
    }

    pub fn collect_ids(&self, ids: &mut Vec<String>) {
        ids.push(self.id.clone());
        for child in &self.children {
            child.collect_ids(ids);
        }
    }

    /// 整棵树（含自身）的全部 ID
    pub fn all_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.id == id || self.children.iter().any(|c| c.contains_id(id))
    }

    /// 树中的节点总数（含自身）
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|c| match c {
                RuleNode::Group(g) => g.node_count(),
                RuleNode::Rule(_) => 1,
            })
            .sum::<usize>()
    }

    /// 先序遍历全部叶子规则
    pub fn leaf_rules(&self) -> Vec<&ScoringRule> {
        let mut rules = Vec::new();
        self.collect_leaves(&mut rules);
        rules
    }

    fn collect_leaves<'a>(&'a self, rules: &mut Vec<&'a ScoringRule>) {
        for child in &self.children {
            match child {
                RuleNode::Group(g) => g.collect_leaves(rules),
                RuleNode::Rule(r) => rules.push(r),
            }
        }
    }

    pub fn same_shape(&self, other: &RuleGroup) -> bool {
        self.combinator == other.combinator
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.same_shape(b))
    }
}

/// 叶子计分规则：单一条件 + 计分运算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringRule {
    pub id: String,
    #[serde(deserialize_with = "deserialize_attribute_id")]
    pub attribute_id: i64,
    pub condition: ConditionOperator,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub operation: Operation,
    #[serde(default)]
    pub points: f64,
}

impl ScoringRule {
    pub fn new(
        id: impl Into<String>,
        attribute_id: i64,
        condition: impl Into<ConditionOperator>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            attribute_id,
            condition: condition.into(),
            value: value.into(),
            operation: Operation::Add,
            points: 0.0,
        }
    }

    pub fn with_effect(mut self, operation: Operation, points: f64) -> Self {
        self.operation = operation;
        self.points = points;
        self
    }

    /// 除以零的规则不允许进入规则树
    pub fn divides_by_zero(&self) -> bool {
        self.operation == Operation::Divide && self.points == 0.0
    }

    pub fn same_shape(&self, other: &ScoringRule) -> bool {
        self.attribute_id == other.attribute_id
            && self.condition == other.condition
            && self.value == other.value
            && self.operation == other.operation
            && self.points == other.points
    }
}

// ==================== 规则集 ====================

/// 规则集：计分规则树 + 导入的属性 + 表单顺序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Ruleset {
    #[serde(default)]
    pub id: Option<i64>,
    #[validate(length(min = 1, message = "规则集名称不能为空"))]
    pub name: String,
    #[serde(default)]
    pub base_weight: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default = "RuleGroup::root")]
    pub root_group: RuleGroup,
    #[validate(length(min = 1, message = "请先导入规则集使用的属性"))]
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// attributes 的下标排列，决定渲染与评估顺序
    #[serde(default)]
    pub form_order: Vec<usize>,
    /// 挂载该规则集的专业（program）ID
    #[serde(default)]
    pub selected_programs: Vec<i64>,
}

impl Ruleset {
    pub fn new(name: impl Into<String>, base_weight: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            base_weight,
            description: String::new(),
            root_group: RuleGroup::root(),
            attributes: Vec::new(),
            form_order: Vec::new(),
            selected_programs: Vec::new(),
        }
    }

    pub fn attribute(&self, attribute_id: i64) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.attribute_id == attribute_id)
    }

    /// 按 formOrder 依次返回属性，越界下标被忽略
    pub fn ordered_attributes(&self) -> impl Iterator<Item = &Attribute> + '_ {
        self.form_order
            .iter()
            .filter_map(|&index| self.attributes.get(index))
    }

    /// 将 formOrder 重置为恒等排列
    pub fn reset_form_order(&mut self) {
        self.form_order = (0..self.attributes.len()).collect();
    }
}

// ==================== 评估上下文 ====================

/// 表单取值：属性 ID → 值
///
/// 文本/数字/日期/下拉为标量，多选为 `{选项值: bool}` 映射。
/// `null` 与缺失等价。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues {
    values: BTreeMap<i64, Value>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 对象创建（键为属性 ID）
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// 获取字段值，null 视为缺失
    pub fn get(&self, attribute_id: i64) -> Option<&Value> {
        self.values.get(&attribute_id).filter(|v| !v.is_null())
    }

    pub fn set(&mut self, attribute_id: i64, value: impl Into<Value>) {
        self.values.insert(attribute_id, value.into());
    }

    pub fn with(mut self, attribute_id: i64, value: impl Into<Value>) -> Self {
        self.set(attribute_id, value);
        self
    }

    /// 更新多选属性中单个选项的勾选状态
    pub fn set_option(&mut self, attribute_id: i64, option_value: &str, checked: bool) {
        let entry = self
            .values
            .entry(attribute_id)
            .or_insert_with(|| Value::Object(Default::default()));
        if !entry.is_object() {
            *entry = Value::Object(Default::default());
        }
        if let Value::Object(map) = entry {
            map.insert(option_value.to_string(), Value::Bool(checked));
        }
    }

    pub fn remove(&mut self, attribute_id: i64) -> Option<Value> {
        self.values.remove(&attribute_id)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &Value)> + '_ {
        self.values.iter().map(|(k, v)| (*k, v))
    }
}

// ==================== 评估结果 ====================

/// 单次计分步骤
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreStep {
    pub rule_id: String,
    pub operation: Operation,
    pub points: f64,
    pub score_before: f64,
    pub score_after: f64,
}

/// 计分结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub score: f64,
    pub base_weight: f64,
    /// 根组是否成立
    pub matched: bool,
    pub applied_steps: Vec<ScoreStep>,
    pub evaluation_trace: Vec<String>,
}

impl ScoreResult {
    pub fn new(base_weight: f64) -> Self {
        Self {
            score: base_weight,
            base_weight,
            matched: false,
            applied_steps: Vec::new(),
            evaluation_trace: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_tree_serialization() {
        let root = RuleGroup::root().with_children(vec![
            ScoringRule::new("r1", 1, "equals", "yes")
                .with_effect(Operation::Add, 10.0)
                .into(),
            RuleGroup::new("g1", LogicalOperator::Or).into(),
        ]);

        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(json["children"][0]["type"], "rule");
        assert_eq!(json["children"][0]["condition"], "equals");
        assert_eq!(json["children"][1]["type"], "group");
        assert_eq!(json["children"][1]["combinator"], "OR");

        let parsed: RuleGroup = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, root);
    }

    #[test]
    fn test_attribute_deserialization_accepts_rule_array() {
        let attr: Attribute = serde_json::from_value(json!({
            "attributeId": 7,
            "name": "gpa",
            "displayName": "GPA",
            "type": "number",
            "options": null,
            "validationRule": {"required": true, "min": 0, "max": 4},
            "rules": [{
                "action": "SHOW",
                "logicOperator": "AND",
                "conditions": [
                    {"conditionId": 1, "evaluatedAttributeId": 3, "operator": "equals", "value1": "yes", "value2": null}
                ]
            }],
            "dependsOn": [{"attributeId": 3, "name": "x"}]
        }))
        .unwrap();

        assert_eq!(attr.attribute_type, AttributeType::Number);
        assert!(attr.options.is_empty());
        assert_eq!(attr.referenced_attributes(), vec![3]);
        assert_eq!(attr.depends_on, vec![3]);
        assert!(attr.validation_rule.unwrap().is_required());
    }

    #[test]
    fn test_text_attribute_ids_are_parsed() {
        let rule: VisibilityRule = serde_json::from_value(json!({
            "action": "SHOW",
            "logicOperator": "",
            "conditions": [
                {"evaluatedAttributeId": "2", "operator": "equals", "value1": "yes"},
                {"evaluatedAttributeId": " 4 ", "operator": "equals", "value1": "no"}
            ]
        }))
        .unwrap();
        assert_eq!(rule.logic_operator, LogicalOperator::Or);
        assert_eq!(rule.referenced_attributes().collect::<Vec<_>>(), vec![2, 4]);

        let leaf: ScoringRule = serde_json::from_value(json!({
            "id": "r1",
            "attributeId": "7",
            "condition": "greater_than",
            "value": "3"
        }))
        .unwrap();
        assert_eq!(leaf.attribute_id, 7);

        let attr: Attribute = serde_json::from_value(json!({
            "attributeId": 9,
            "name": "essay",
            "displayName": "Essay",
            "type": "multiLineText",
            "dependsOn": ["3", {"attributeId": "5"}]
        }))
        .unwrap();
        assert_eq!(attr.depends_on, vec![3, 5]);
    }

    #[test]
    fn test_attribute_name_validation() {
        let attr = Attribute::new(1, "a", "A", AttributeType::SingleLineText);
        assert!(attr.validate().is_err());

        let attr = Attribute::new(1, "age", "Age", AttributeType::Number);
        assert!(attr.validate().is_ok());
    }

    #[test]
    fn test_form_values_null_is_missing() {
        let values = FormValues::from_json(r#"{"1": null, "2": 5, "3": {"a": true}}"#).unwrap();
        assert_eq!(values.get(1), None);
        assert_eq!(values.get(2), Some(&json!(5)));
        assert_eq!(values.get(3), Some(&json!({"a": true})));
        assert_eq!(values.get(4), None);
    }

    #[test]
    fn test_set_option_builds_map() {
        let mut values = FormValues::new();
        values.set_option(9, "math", true);
        values.set_option(9, "art", false);
        assert_eq!(values.get(9), Some(&json!({"math": true, "art": false})));
    }

    #[test]
    fn test_same_shape_ignores_ids() {
        let a = RuleGroup::root().with_children(vec![
            ScoringRule::new("x", 1, "equals", "1").into(),
        ]);
        let b = RuleGroup::new("other", LogicalOperator::And).with_children(vec![
            ScoringRule::new("y", 1, "equals", "1").into(),
        ]);
        assert!(a.same_shape(&b));
        assert_ne!(a, b);
    }
}
