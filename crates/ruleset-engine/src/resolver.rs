//! 可见性与计分解析
//!
//! 可见性：逐个属性评估其自身（单层）的可见性规则；选项级规则同理。
//! 计分：深度优先遍历根组，组的真值按组合器合并子节点真值，只有真值成立的组
//! 才贡献其内部的计分步骤；成立的叶子规则按先序依次作用于从 baseWeight 开始的分数。

use admissions_shared::config::EngineConfig;

use crate::evaluator::ConditionEvaluator;
use crate::models::{
    Attribute, AttributeOption, FormValues, RuleGroup, RuleNode, Ruleset, ScoreResult, ScoreStep,
    ScoringRule,
};
use tracing::{debug, instrument, warn};

/// 规则解析器
#[derive(Debug, Clone, Default)]
pub struct RuleResolver {
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl RuleResolver {
    pub fn new() -> Self {
        Self {
            trace_enabled: false,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            trace_enabled: config.trace_enabled,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace_enabled
    }

    // ==================== 可见性 ====================

    pub fn is_attribute_visible(attribute: &Attribute, values: &FormValues) -> bool {
        ConditionEvaluator::is_visible(attribute.rules.as_ref(), values)
    }

    /// 按 formOrder 返回当前可见的属性
    pub fn visible_attributes<'a>(ruleset: &'a Ruleset, values: &FormValues) -> Vec<&'a Attribute> {
        ruleset
            .ordered_attributes()
            .filter(|attr| Self::is_attribute_visible(attr, values))
            .collect()
    }

    /// 选择类属性当前可见的选项
    pub fn visible_options<'a>(
        attribute: &'a Attribute,
        values: &FormValues,
    ) -> Vec<&'a AttributeOption> {
        attribute
            .options
            .iter()
            .filter(|opt| ConditionEvaluator::is_visible(opt.rule.as_ref(), values))
            .collect()
    }

    /// 去掉隐藏属性的取值
    ///
    /// 隐藏的属性不参与计分，引用它们的条件按未填写处理。
    pub fn effective_values(ruleset: &Ruleset, values: &FormValues) -> FormValues {
        let mut effective = values.clone();
        for attr in &ruleset.attributes {
            if !Self::is_attribute_visible(attr, values) {
                effective.remove(attr.attribute_id);
            }
        }
        effective
    }

    // ==================== 计分 ====================

    /// 计算规则集的分数
    #[instrument(skip(self, ruleset, values), fields(ruleset = %ruleset.name))]
    pub fn score(&self, ruleset: &Ruleset, values: &FormValues) -> ScoreResult {
        let effective = Self::effective_values(ruleset, values);
        self.score_tree(&ruleset.root_group, ruleset.base_weight, &effective)
    }

    /// 从 `base_weight` 开始对规则树计分
    pub fn score_tree(&self, root: &RuleGroup, base_weight: f64, values: &FormValues) -> ScoreResult {
        let mut result = ScoreResult::new(base_weight);

        let (matched, contributions) = self.evaluate_group(root, values, &mut result, "root");
        result.matched = matched;

        if !matched {
            if self.trace_enabled {
                result
                    .evaluation_trace
                    .push("root: 根组不成立，分数保持 baseWeight".to_string());
            }
            return result;
        }

        for rule in contributions {
            self.apply_rule(rule, &mut result);
        }

        debug!(score = result.score, steps = result.applied_steps.len(), "计分完成");
        result
    }

    /// 评估组，返回组真值及其贡献的叶子规则（先序）
    fn evaluate_group<'a>(
        &self,
        group: &'a RuleGroup,
        values: &FormValues,
        result: &mut ScoreResult,
        path: &str,
    ) -> (bool, Vec<&'a ScoringRule>) {
        if self.trace_enabled {
            result.evaluation_trace.push(format!(
                "{}: 开始评估 {} 组 {} (共 {} 个子节点)",
                path,
                group.combinator,
                group.id,
                group.children.len()
            ));
        }

        let mut truths = Vec::with_capacity(group.children.len());
        let mut contributions = Vec::new();

        for (i, child) in group.children.iter().enumerate() {
            let child_path = format!("{}.children[{}]", path, i);
            match child {
                RuleNode::Rule(rule) => {
                    let matched = ConditionEvaluator::evaluate_rule(rule, values);
                    if self.trace_enabled {
                        result.evaluation_trace.push(format!(
                            "{}: 属性 {} {} {:?} => {}",
                            child_path,
                            rule.attribute_id,
                            rule.condition,
                            rule.value,
                            if matched { "MATCHED" } else { "NOT_MATCHED" }
                        ));
                    }
                    if matched {
                        contributions.push(rule);
                    }
                    truths.push(matched);
                }
                RuleNode::Group(sub) => {
                    let (matched, sub_contributions) =
                        self.evaluate_group(sub, values, result, &child_path);
                    if matched {
                        contributions.extend(sub_contributions);
                    }
                    truths.push(matched);
                }
            }
        }

        let matched = group.combinator.combine(truths);
        if self.trace_enabled {
            result.evaluation_trace.push(format!(
                "{}: {} 组{}",
                path,
                group.combinator,
                if matched { "成立" } else { "不成立" }
            ));
        }

        if matched {
            (true, contributions)
        } else {
            (false, Vec::new())
        }
    }

    fn apply_rule(&self, rule: &ScoringRule, result: &mut ScoreResult) {
        let before = result.score;
        let Some(after) = rule.operation.apply(before, rule.points) else {
            warn!(rule_id = %rule.id, "除数为零，跳过该计分步骤");
            if self.trace_enabled {
                result
                    .evaluation_trace
                    .push(format!("{}: 除数为零，已跳过", rule.id));
            }
            return;
        };

        if self.trace_enabled {
            result.evaluation_trace.push(format!(
                "{}: {} {} => {} -> {}",
                rule.id, rule.operation, rule.points, before, after
            ));
        }

        result.score = after;
        result.applied_steps.push(ScoreStep {
            rule_id: rule.id.clone(),
            operation: rule.operation,
            points: rule.points,
            score_before: before,
            score_after: after,
        });
    }
}
