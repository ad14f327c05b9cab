//! 表单会话
//!
//! 持有申请人填写中的取值。属性列表或 formOrder 变化时取值整体清空；
//! 只有当前可见的属性会被校验、提交和计分。

use crate::error::{Result, RuleError};
use crate::models::{Attribute, AttributeOption, AttributeType, FormValues, Ruleset, ScoreResult};
use crate::resolver::RuleResolver;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::{debug, info};

/// 字段校验失败的原因
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldErrorKind {
    Required,
    NotANumber,
    BelowMin { min: f64 },
    AboveMax { max: f64 },
}

/// 单个字段的校验错误
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub attribute_id: i64,
    pub display_name: String,
    #[serde(flatten)]
    pub kind: FieldErrorKind,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FieldErrorKind::Required => write!(f, "{} 为必填项", self.display_name),
            FieldErrorKind::NotANumber => write!(f, "{} 必须是数字", self.display_name),
            FieldErrorKind::BelowMin { min } => {
                write!(f, "{} 不能小于 {}", self.display_name, min)
            }
            FieldErrorKind::AboveMax { max } => {
                write!(f, "{} 不能大于 {}", self.display_name, max)
            }
        }
    }
}

/// 提交结果：可见字段的取值与录取评估分数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub values: FormValues,
    pub score: ScoreResult,
}

/// 表单会话
#[derive(Debug, Clone)]
pub struct FormSession {
    ruleset: Ruleset,
    values: FormValues,
    /// 布局变化（取值被重置）的次数
    generation: u64,
}

impl FormSession {
    pub fn new(ruleset: Ruleset) -> Self {
        Self {
            ruleset,
            values: FormValues::new(),
            generation: 0,
        }
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 替换规则集；属性列表或 formOrder 变化时清空取值
    pub fn update_ruleset(&mut self, ruleset: Ruleset) {
        let layout_changed = ruleset.attributes != self.ruleset.attributes
            || ruleset.form_order != self.ruleset.form_order;
        self.ruleset = ruleset;
        if layout_changed {
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.values.clear();
        self.generation += 1;
        debug!(generation = self.generation, "表单取值已重置");
    }

    pub fn set_value(&mut self, attribute_id: i64, value: impl Into<Value>) {
        if self.ruleset.attribute(attribute_id).is_none() {
            debug!(attribute_id, "为未导入的属性赋值");
        }
        self.values.set(attribute_id, value);
    }

    /// 勾选/取消多选属性的某个选项
    pub fn toggle_option(&mut self, attribute_id: i64, option_value: &str, checked: bool) {
        self.values.set_option(attribute_id, option_value, checked);
    }

    pub fn clear_value(&mut self, attribute_id: i64) {
        self.values.remove(attribute_id);
    }

    /// 按 formOrder 返回当前可见的属性
    pub fn visible_attributes(&self) -> Vec<&Attribute> {
        RuleResolver::visible_attributes(&self.ruleset, &self.values)
    }

    /// 属性当前可见的选项
    pub fn visible_options(&self, attribute_id: i64) -> Vec<&AttributeOption> {
        self.ruleset
            .attribute(attribute_id)
            .map(|attr| RuleResolver::visible_options(attr, &self.values))
            .unwrap_or_default()
    }

    /// 校验所有可见字段，返回全部错误
    pub fn field_errors(&self) -> Vec<FieldError> {
        self.visible_attributes()
            .into_iter()
            .filter_map(|attr| check_field(attr, self.values.get(attr.attribute_id)))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let errors = self.field_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(RuleError::FormInvalid(errors))
        }
    }

    /// 校验并提交，只保留可见字段的取值并计算分数
    pub fn submit(&self, resolver: &RuleResolver) -> Result<Submission> {
        self.validate()?;

        let mut values = FormValues::new();
        for attr in self.visible_attributes() {
            if let Some(value) = self.values.get(attr.attribute_id) {
                values.set(attr.attribute_id, value.clone());
            }
        }

        let score = resolver.score(&self.ruleset, &values);
        info!(score = score.score, fields = values.len(), "表单已提交");
        Ok(Submission { values, score })
    }
}

fn check_field(attr: &Attribute, value: Option<&Value>) -> Option<FieldError> {
    let error = |kind| {
        Some(FieldError {
            attribute_id: attr.attribute_id,
            display_name: attr.display_name.clone(),
            kind,
        })
    };
    let rule = attr.validation_rule.clone().unwrap_or_default();

    let Some(value) = value.filter(|v| !is_blank(v)) else {
        return if rule.is_required() {
            error(FieldErrorKind::Required)
        } else {
            None
        };
    };

    if attr.attribute_type != AttributeType::Number {
        return None;
    }

    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    };
    let Some(number) = number else {
        return error(FieldErrorKind::NotANumber);
    };

    match (rule.min, rule.max) {
        (Some(min), _) if number < min => error(FieldErrorKind::BelowMin { min }),
        (_, Some(max)) if number > max => error(FieldErrorKind::AboveMax { max }),
        _ => None,
    }
}

/// 空字符串、空数组或未勾选任何选项的多选视为未填写
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => !map.values().any(|v| v.as_bool() == Some(true)),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
