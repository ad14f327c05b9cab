//! 规则集编译器
//!
//! 加载或保存规则集前做完整的结构校验，并预先提取计分规则引用的属性。

use crate::error::{Result, RuleError};
use crate::models::{Attribute, RuleGroup, RuleNode, Ruleset, ScoringRule};
use crate::persistence::PersistedRuleset;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{info, instrument, warn};
use validator::Validate;

/// 编译后的规则集
#[derive(Debug, Clone)]
pub struct CompiledRuleset {
    pub ruleset: Ruleset,
    /// 计分规则引用的属性 ID
    pub scoring_attributes: BTreeSet<i64>,
    /// 编译版本号
    pub compile_version: u64,
}

impl CompiledRuleset {
    pub fn name(&self) -> &str {
        &self.ruleset.name
    }

    pub fn root(&self) -> &RuleGroup {
        &self.ruleset.root_group
    }
}

/// 规则集编译器
pub struct RulesetCompiler {
    compile_version: u64,
}

impl RulesetCompiler {
    pub fn new() -> Self {
        Self { compile_version: 0 }
    }

    /// 从编辑器形态的 JSON 编译
    pub fn compile_from_json(&mut self, json: &str) -> Result<CompiledRuleset> {
        let ruleset: Ruleset = serde_json::from_str(json)?;
        self.compile(ruleset)
    }

    /// 从后端持久化形态的 JSON 编译
    pub fn compile_persisted(&mut self, json: &str) -> Result<CompiledRuleset> {
        let persisted = PersistedRuleset::from_json(json)?;
        self.compile(persisted.into_ruleset())
    }

    #[instrument(skip(self, ruleset), fields(ruleset = %ruleset.name))]
    pub fn compile(&mut self, ruleset: Ruleset) -> Result<CompiledRuleset> {
        validate_ruleset(&ruleset)?;

        let scoring_attributes = ruleset
            .root_group
            .leaf_rules()
            .iter()
            .map(|r| r.attribute_id)
            .collect();

        self.compile_version += 1;
        info!(version = self.compile_version, "规则集已编译");

        Ok(CompiledRuleset {
            ruleset,
            scoring_attributes,
            compile_version: self.compile_version,
        })
    }
}

impl Default for RulesetCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// 保存前的规则集校验
pub fn validate_ruleset(ruleset: &Ruleset) -> Result<()> {
    ruleset.validate()?;

    let mut attributes: HashMap<i64, &Attribute> = HashMap::new();
    for attr in &ruleset.attributes {
        if attributes.insert(attr.attribute_id, attr).is_some() {
            return Err(RuleError::ValidationError(format!(
                "属性 ID {} 重复",
                attr.attribute_id
            )));
        }
    }
    for attr in &ruleset.attributes {
        validate_attribute(attr, &attributes)?;
    }

    validate_form_order(ruleset)?;
    validate_tree(&ruleset.root_group, &attributes)?;

    Ok(())
}

/// 单个属性的校验
pub fn validate_attribute(attr: &Attribute, known: &HashMap<i64, &Attribute>) -> Result<()> {
    attr.validate()?;

    if attr.attribute_type.is_choice() && attr.options.is_empty() {
        return Err(RuleError::ValidationError(format!(
            "属性 '{}' 是选择类型，必须配置选项",
            attr.name
        )));
    }

    if attr.referenced_attributes().contains(&attr.attribute_id) {
        return Err(RuleError::ValidationError(format!(
            "属性 '{}' 的可见性规则引用了自身",
            attr.name
        )));
    }

    let rules = attr
        .rules
        .iter()
        .chain(attr.options.iter().filter_map(|o| o.rule.as_ref()));
    for cond in rules.flat_map(|r| r.conditions.iter()) {
        let Some(target) = known.get(&cond.evaluated_attribute_id) else {
            return Err(RuleError::AttributeNotFound(cond.evaluated_attribute_id));
        };
        if !target
            .attribute_type
            .visibility_operators()
            .contains(&cond.operator)
        {
            // 持久化数据允许出现编辑器不提供的操作符，评估时仍按语义处理
            warn!(
                attribute = %attr.name,
                operator = %cond.operator,
                "可见性条件使用了该属性类型不支持的操作符"
            );
        }
    }

    Ok(())
}

fn validate_form_order(ruleset: &Ruleset) -> Result<()> {
    let n = ruleset.attributes.len();
    let mut seen = vec![false; n];
    let is_permutation = ruleset.form_order.len() == n
        && ruleset
            .form_order
            .iter()
            .all(|&i| i < n && !std::mem::replace(&mut seen[i], true));

    if !is_permutation {
        return Err(RuleError::ValidationError(format!(
            "formOrder {:?} 不是 0..{} 的排列",
            ruleset.form_order, n
        )));
    }
    Ok(())
}

fn validate_tree(root: &RuleGroup, attributes: &HashMap<i64, &Attribute>) -> Result<()> {
    if root.id.is_empty() {
        return Err(RuleError::ValidationError("根组 ID 为空".to_string()));
    }
    let mut ids = HashSet::from([root.id.clone()]);
    validate_children(root, "root", attributes, &mut ids)
}

fn validate_children(
    group: &RuleGroup,
    path: &str,
    attributes: &HashMap<i64, &Attribute>,
    ids: &mut HashSet<String>,
) -> Result<()> {
    for (i, child) in group.children.iter().enumerate() {
        let child_path = format!("{}.children[{}]", path, i);
        if child.id().is_empty() || !ids.insert(child.id().to_string()) {
            return Err(RuleError::ValidationError(format!(
                "节点 '{}' 的 ID '{}' 为空或重复",
                child_path,
                child.id()
            )));
        }

        match child {
            RuleNode::Group(g) => validate_children(g, &child_path, attributes, ids)?,
            RuleNode::Rule(r) => validate_leaf(r, &child_path, attributes)?,
        }
    }
    Ok(())
}

fn validate_leaf(
    rule: &ScoringRule,
    path: &str,
    attributes: &HashMap<i64, &Attribute>,
) -> Result<()> {
    if rule.divides_by_zero() {
        return Err(RuleError::DivideByZero {
            rule_id: rule.id.clone(),
        });
    }
    let Some(attr) = attributes.get(&rule.attribute_id) else {
        return Err(RuleError::AttributeNotFound(rule.attribute_id));
    };
    if !attr.attribute_type.scoring_operators().contains(&rule.condition) {
        warn!(
            rule_id = %rule.id,
            operator = %rule.condition,
            "计分规则使用了该属性类型不支持的操作符"
        );
    }
    if !rule.points.is_finite() {
        return Err(RuleError::ValidationError(format!(
            "规则 '{}' 的分值不是有限数",
            path
        )));
    }
    Ok(())
}
