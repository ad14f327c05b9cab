//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。

use clap::{Parser, Subcommand};

/// 录取规则集引擎命令行工具
///
/// 规则集文件可以是编辑器形态（含 `rootGroup`）或后端持久化形态（含 `rules` 行），
/// 读取时自动识别。结果以 JSON 写到 stdout，日志写到 stderr。
#[derive(Parser, Debug)]
#[command(name = "ruleset-engine")]
#[command(version, about = "录取规则集引擎")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，覆盖配置文件
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 校验规则集
    ///
    /// 检查属性引用、操作符、formOrder 排列与规则树结构。
    Validate {
        /// 规则集文件路径
        file: String,
    },

    /// 计算可见字段与录取分数
    Evaluate {
        /// 规则集文件路径
        ruleset: String,

        /// 表单取值文件路径（属性 ID → 值）
        values: String,

        /// 输出评估追踪
        #[arg(long)]
        trace: bool,

        /// 先按字段校验规则检查表单，不通过时报错
        #[arg(long)]
        strict: bool,
    },

    /// 展开为持久化形态
    Flatten {
        /// 规则集文件路径
        file: String,

        /// 输出文件路径（缺省写到 stdout）
        #[arg(short, long)]
        output: Option<String>,
    },

    /// 从持久化形态重建编辑器形态
    Rehydrate {
        /// 持久化规则集文件路径
        file: String,

        /// 输出文件路径（缺省写到 stdout）
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_validate() {
        let cli = Cli::parse_from(["ruleset-engine", "validate", "ruleset.json"]);
        assert!(cli.log_level.is_none());
        match cli.command {
            Commands::Validate { file } => assert_eq!(file, "ruleset.json"),
            _ => panic!("预期 Validate 命令"),
        }
    }

    #[test]
    fn test_cli_parse_evaluate() {
        let cli = Cli::parse_from([
            "ruleset-engine",
            "--log-level",
            "debug",
            "evaluate",
            "ruleset.json",
            "values.json",
            "--trace",
        ]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Evaluate {
                ruleset,
                values,
                trace,
                strict,
            } => {
                assert_eq!(ruleset, "ruleset.json");
                assert_eq!(values, "values.json");
                assert!(trace);
                assert!(!strict);
            }
            _ => panic!("预期 Evaluate 命令"),
        }
    }

    #[test]
    fn test_cli_parse_conversions() {
        let cli = Cli::parse_from(["ruleset-engine", "flatten", "a.json", "-o", "b.json"]);
        match cli.command {
            Commands::Flatten { file, output } => {
                assert_eq!(file, "a.json");
                assert_eq!(output.as_deref(), Some("b.json"));
            }
            _ => panic!("预期 Flatten 命令"),
        }

        let cli = Cli::parse_from(["ruleset-engine", "rehydrate", "b.json"]);
        match cli.command {
            Commands::Rehydrate { file, output } => {
                assert_eq!(file, "b.json");
                assert!(output.is_none());
            }
            _ => panic!("预期 Rehydrate 命令"),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["ruleset-engine"]).is_err());
    }
}
