//! 规则引擎错误类型
//!
//! 评估与树变更路径是全函数，不会产生这里的错误；
//! 只有加载/校验、编辑入口和表单提交会返回 `RuleError`。

use crate::form::FieldError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("规则解析失败: {0}")]
    ParseError(String),

    #[error("规则集校验失败: {0}")]
    ValidationError(String),

    #[error("字段校验失败: {0}")]
    FieldValidation(#[from] validator::ValidationErrors),

    #[error("无效的操作符: {operator} 不支持类型 {attribute_type}")]
    InvalidOperator {
        operator: String,
        attribute_type: String,
    },

    #[error("属性不存在: {0}")]
    AttributeNotFound(i64),

    #[error("属性 {attribute} 仍被引用: {referenced_by}")]
    AttributeInUse {
        attribute: String,
        referenced_by: String,
    },

    #[error("不能除以零: 规则 {rule_id} 的除数必须非零")]
    DivideByZero { rule_id: String },

    #[error("根组不能被删除")]
    RootGroupImmutable,

    #[error("表单校验失败: {} 个字段未通过", .0.len())]
    FormInvalid(Vec<FieldError>),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;
