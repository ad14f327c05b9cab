//! 录取规则集引擎
//!
//! 提供规则集的纯函数核心能力：
//! - 规则树模型与基于 ID/路径的不可变变更
//! - 条件评估、字段可见性与计分
//! - 拖拽重排的状态机与合法性检查
//! - 持久化形态（父指针行）与编辑器形态之间的转换

pub mod cli;
pub mod compiler;
pub mod dnd;
pub mod editor;
pub mod error;
pub mod evaluator;
pub mod form;
pub mod ids;
pub mod models;
pub mod mutation;
pub mod operators;
pub mod persistence;
pub mod resolver;

pub use compiler::{CompiledRuleset, RulesetCompiler, validate_ruleset};
pub use dnd::{
    CancelReason, DragCoordinator, DragState, DropOutcome, DropPosition, DropTarget, Droppable,
    Point, Rect, can_drop_item, commit_move,
};
pub use editor::RulesetEditor;
pub use error::{Result, RuleError};
pub use evaluator::ConditionEvaluator;
pub use form::{FieldError, FieldErrorKind, FormSession, Submission};
pub use ids::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use models::{
    Attribute, AttributeOption, AttributeType, Condition, FormValues, ROOT_GROUP_ID, RuleGroup,
    RuleNode, Ruleset, ScoreResult, ScoreStep, ScoringRule, ValidationRule, VisibilityRule,
};
pub use mutation::{ClonePlacement, FoundItem, GroupPatch, RulePatch};
pub use operators::{ConditionOperator, LogicalOperator, Operation, VisibilityAction};
pub use persistence::{FlatRuleRow, PersistedRuleset, RuleAction, flatten, rehydrate};
pub use resolver::RuleResolver;
