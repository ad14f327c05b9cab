//! 条件评估器
//!
//! 对单个条件求布尔值，并按逻辑操作符合并同一节点上的多个条件。
//! 所有函数都是全函数：字段缺失、类型不符或无法解析时给出确定的回退值，不会返回错误。

use crate::models::{Condition, FormValues, ScoringRule, VisibilityRule};
use crate::operators::{ConditionOperator, LogicalOperator, VisibilityAction};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;

/// 条件评估器
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// 评估条件
    ///
    /// # Arguments
    /// * `field_value` - 从表单取值中获取的字段值
    /// * `operator` - 操作符
    /// * `expected` - 条件中配置的比较值（value1）
    pub fn evaluate(field_value: Option<&Value>, operator: &ConditionOperator, expected: &str) -> bool {
        // 字段未填写时条件一律不成立
        let field = match field_value {
            Some(v) if !v.is_null() => v,
            _ => return false,
        };

        match operator {
            ConditionOperator::Equals => Self::loose_eq(field, expected),
            ConditionOperator::NotEquals => !Self::loose_eq(field, expected),
            ConditionOperator::Contains => Self::membership(field, expected).unwrap_or(false),
            ConditionOperator::NotContains => {
                Self::membership(field, expected).map(|r| !r).unwrap_or(false)
            }
            ConditionOperator::GreaterThan => {
                Self::compare(field, expected, |o| o == Ordering::Greater)
            }
            ConditionOperator::LessThan => Self::compare(field, expected, |o| o == Ordering::Less),
            ConditionOperator::GreaterThanOrEqual => {
                Self::compare(field, expected, |o| o != Ordering::Less)
            }
            ConditionOperator::LessThanOrEqual => {
                Self::compare(field, expected, |o| o != Ordering::Greater)
            }
            // 未知操作符放行，避免新操作符导致字段被意外隐藏
            ConditionOperator::Unknown(_) => true,
        }
    }

    /// 评估单个条件记录
    pub fn evaluate_condition(condition: &Condition, values: &FormValues) -> bool {
        Self::evaluate(
            values.get(condition.evaluated_attribute_id),
            &condition.operator,
            &condition.value1,
        )
    }

    /// 评估叶子计分规则的隐式条件
    pub fn evaluate_rule(rule: &ScoringRule, values: &FormValues) -> bool {
        Self::evaluate(values.get(rule.attribute_id), &rule.condition, &rule.value)
    }

    /// 按逻辑操作符合并多个条件
    pub fn evaluate_all(
        conditions: &[Condition],
        logic: LogicalOperator,
        values: &FormValues,
    ) -> bool {
        logic.combine(
            conditions
                .iter()
                .map(|c| Self::evaluate_condition(c, values)),
        )
    }

    /// 计算可见性规则的最终结果
    ///
    /// 无规则或无条件时始终可见；HIDE 取反，SHOW 直接采用，其它动作不可见。
    pub fn is_visible(rule: Option<&VisibilityRule>, values: &FormValues) -> bool {
        let rule = match rule {
            Some(rule) if !rule.conditions.is_empty() => rule,
            _ => return true,
        };

        let matched = Self::evaluate_all(&rule.conditions, rule.logic_operator, values);

        match rule.action {
            VisibilityAction::Hide => !matched,
            VisibilityAction::Show => matched,
            VisibilityAction::Other(_) => false,
        }
    }

    /// 宽松相等：数值与其字符串形式视为相等
    fn loose_eq(field: &Value, expected: &str) -> bool {
        match field {
            Value::String(s) => s == expected,
            Value::Number(_) | Value::Bool(_) => {
                let lhs = Self::value_to_number(field);
                let rhs = Self::str_to_number(expected);
                lhs == rhs
            }
            Value::Array(_) | Value::Object(_) => Self::to_display_string(field) == expected,
            Value::Null => false,
        }
    }

    /// 包含检查
    ///
    /// 数组按元素匹配，字符串按子串匹配，对象按键存在匹配；其它类型无法判断，返回 `None`。
    fn membership(field: &Value, expected: &str) -> Option<bool> {
        match field {
            Value::Array(arr) => Some(arr.iter().any(|item| item.as_str() == Some(expected))),
            Value::String(s) => Some(s.contains(expected)),
            Value::Object(map) => Some(map.contains_key(expected)),
            _ => None,
        }
    }

    /// 排序比较：两侧都是日期时按时间比较，否则转为数值比较
    fn compare<F>(field: &Value, expected: &str, accept: F) -> bool
    where
        F: Fn(Ordering) -> bool,
    {
        if let (Some(lhs), Some(rhs)) = (
            field.as_str().and_then(Self::parse_date),
            Self::parse_date(expected),
        ) {
            return accept(lhs.cmp(&rhs));
        }

        let lhs = Self::value_to_number(field);
        let rhs = Self::str_to_number(expected);

        // NaN 参与比较时结果为 false
        lhs.partial_cmp(&rhs).map(accept).unwrap_or(false)
    }

    /// 解析日期（RFC 3339 或 YYYY-MM-DD）
    fn parse_date(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }

        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
    }

    /// 将 Value 转换为数值，无法转换时为 NaN
    fn value_to_number(value: &Value) -> f64 {
        match value {
            Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            Value::String(s) => Self::str_to_number(s),
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Array(_) => Self::str_to_number(&Self::to_display_string(value)),
            Value::Null | Value::Object(_) => f64::NAN,
        }
    }

    /// 字符串转数值：空白串为 0，非数字为 NaN
    fn str_to_number(s: &str) -> f64 {
        let s = s.trim();
        if s.is_empty() {
            return 0.0;
        }

        match s {
            "Infinity" | "+Infinity" => return f64::INFINITY,
            "-Infinity" => return f64::NEG_INFINITY,
            _ => {}
        }

        // f64 解析器接受 inf/nan 字面量，这里需要排除
        let lower = s.to_ascii_lowercase();
        if lower.contains("inf") || lower.contains("nan") {
            return f64::NAN;
        }

        s.parse().unwrap_or(f64::NAN)
    }

    /// 值的文本形式，数组按逗号拼接
    fn to_display_string(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Array(arr) => arr
                .iter()
                .map(Self::to_display_string)
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
        }
    }
}
