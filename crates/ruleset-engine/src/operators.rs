//! 规则操作符定义

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// 条件操作符
///
/// 持久化数据中可能出现前端尚未支持的操作符，统一收敛到 `Unknown`，
/// 评估时按放行处理，不会导致反序列化失败。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    // 通用比较
    Equals,
    NotEquals,

    // 包含检查
    Contains,
    NotContains,

    // 数值/日期比较
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,

    /// 未识别的操作符，保留原始文本
    Unknown(String),
}

impl ConditionOperator {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
            Self::LessThanOrEqual => "less_than_or_equal",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<String> for ConditionOperator {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "equals" => Self::Equals,
            "not_equals" => Self::NotEquals,
            "contains" => Self::Contains,
            "not_contains" => Self::NotContains,
            "greater_than" => Self::GreaterThan,
            "less_than" => Self::LessThan,
            "greater_than_or_equal" => Self::GreaterThanOrEqual,
            "less_than_or_equal" => Self::LessThanOrEqual,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<&str> for ConditionOperator {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<ConditionOperator> for String {
    fn from(op: ConditionOperator) -> Self {
        match op {
            ConditionOperator::Unknown(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 逻辑操作符（组合器）
///
/// 反序列化时只有 "AND" 被识别为与，其余任何文本都按或处理；null 取默认值。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl<'de> Deserialize<'de> for LogicalOperator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<String>::deserialize(deserializer)? {
            None => Self::default(),
            Some(raw) if raw.trim().eq_ignore_ascii_case("AND") => Self::And,
            Some(_) => Self::Or,
        })
    }
}

impl LogicalOperator {
    /// 按组合器合并一组布尔结果
    ///
    /// 空序列遵循全称/存在量词语义：AND 为 true，OR 为 false。
    pub fn combine<I>(self, results: I) -> bool
    where
        I: IntoIterator<Item = bool>,
    {
        let mut results = results.into_iter();
        match self {
            Self::And => results.all(|r| r),
            Self::Or => results.any(|r| r),
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// 计分运算
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    #[default]
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    /// 将运算应用到当前分数
    ///
    /// 除数为零时返回 `None`，由调用方决定如何处理。
    pub fn apply(self, score: f64, points: f64) -> Option<f64> {
        match self {
            Self::Add => Some(score + points),
            Self::Subtract => Some(score - points),
            Self::Multiply => Some(score * points),
            Self::Divide if points == 0.0 => None,
            Self::Divide => Some(score / points),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        };
        write!(f, "{}", s)
    }
}

/// 可见性动作
///
/// 只有 SHOW / HIDE 有效，其它取值一律视为不可见。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VisibilityAction {
    Show,
    Hide,
    Other(String),
}

impl From<String> for VisibilityAction {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "SHOW" => Self::Show,
            "HIDE" => Self::Hide,
            _ => Self::Other(raw),
        }
    }
}

impl From<VisibilityAction> for String {
    fn from(action: VisibilityAction) -> Self {
        match action {
            VisibilityAction::Show => "SHOW".to_string(),
            VisibilityAction::Hide => "HIDE".to_string(),
            VisibilityAction::Other(raw) => raw,
        }
    }
}

impl fmt::Display for VisibilityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Show => write!(f, "SHOW"),
            Self::Hide => write!(f, "HIDE"),
            Self::Other(raw) => write!(f, "{}", raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_round_trip_keeps_unknown_text() {
        let op: ConditionOperator = serde_json::from_str(r#""starts_with""#).unwrap();
        assert_eq!(op, ConditionOperator::Unknown("starts_with".to_string()));
        assert_eq!(serde_json::to_string(&op).unwrap(), r#""starts_with""#);

        let op: ConditionOperator = serde_json::from_str(r#""greater_than_or_equal""#).unwrap();
        assert_eq!(op, ConditionOperator::GreaterThanOrEqual);
    }

    #[test]
    fn test_combine() {
        assert!(LogicalOperator::Or.combine([false, true]));
        assert!(!LogicalOperator::And.combine([false, true]));
        assert!(LogicalOperator::And.combine(Vec::<bool>::new()));
        assert!(!LogicalOperator::Or.combine(Vec::<bool>::new()));
    }

    #[test]
    fn test_logical_operator_treats_anything_but_and_as_or() {
        use serde_json::json;

        let parse = |raw| serde_json::from_value::<LogicalOperator>(raw).unwrap();
        assert_eq!(parse(json!("AND")), LogicalOperator::And);
        assert_eq!(parse(json!("and")), LogicalOperator::And);
        assert_eq!(parse(json!("OR")), LogicalOperator::Or);
        assert_eq!(parse(json!("")), LogicalOperator::Or);
        assert_eq!(parse(json!("XOR")), LogicalOperator::Or);
        assert_eq!(parse(json!(null)), LogicalOperator::And);
        assert_eq!(serde_json::to_value(LogicalOperator::Or).unwrap(), json!("OR"));
    }

    #[test]
    fn test_operation_apply() {
        assert_eq!(Operation::Add.apply(10.0, 5.0), Some(15.0));
        assert_eq!(Operation::Subtract.apply(10.0, 5.0), Some(5.0));
        assert_eq!(Operation::Multiply.apply(10.0, 1.5), Some(15.0));
        assert_eq!(Operation::Divide.apply(10.0, 4.0), Some(2.5));
        assert_eq!(Operation::Divide.apply(10.0, 0.0), None);
    }

    #[test]
    fn test_visibility_action_parsing() {
        let action: VisibilityAction = serde_json::from_str(r#""HIDE""#).unwrap();
        assert_eq!(action, VisibilityAction::Hide);
        let action: VisibilityAction = serde_json::from_str(r#""TOGGLE""#).unwrap();
        assert_eq!(action, VisibilityAction::Other("TOGGLE".to_string()));
    }
}
