//! CLI 模块
//!
//! 提供命令行接口，支持以下功能：
//!
//! - `validate` - 校验规则集文件（编辑器形态或持久化形态）
//! - `evaluate` - 根据表单取值计算可见字段与录取分数
//! - `flatten` - 把编辑器形态转换为父指针行
//! - `rehydrate` - 把父指针行重建为规则树
//!
//! # 使用示例
//!
//! ```bash
//! # 校验规则集
//! ruleset-engine validate ruleset.json
//!
//! # 计分并输出追踪
//! ruleset-engine evaluate ruleset.json values.json --trace
//!
//! # 形态转换
//! ruleset-engine flatten ruleset.json -o persisted.json
//! ruleset-engine rehydrate persisted.json
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::{CommandRunner, load_ruleset};
