//! 命令执行器
//!
//! 负责执行各 CLI 子命令的具体逻辑：读取文件、调用引擎、输出 JSON。

use std::fs;
use std::io::Write as _;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use admissions_shared::config::EngineConfig;

use crate::compiler::RulesetCompiler;
use crate::form::FormSession;
use crate::models::{FormValues, Ruleset, ScoreResult};
use crate::persistence::{PersistedRuleset, flatten};
use crate::resolver::RuleResolver;

/// 可见字段摘要
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleField {
    pub attribute_id: i64,
    pub name: String,
    pub display_name: String,
}

/// evaluate 命令的输出
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub ruleset: String,
    pub visible_fields: Vec<VisibleField>,
    pub score: ScoreResult,
}

/// validate 命令的输出
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub ruleset: String,
    pub attributes: usize,
    pub rules: usize,
    pub scoring_attributes: Vec<i64>,
}

/// 解析规则集 JSON，自动识别编辑器形态与持久化形态
///
/// 含 `rootGroup` 的按编辑器形态解析；只含 `rules` 行的按持久化形态重建。
pub fn parse_ruleset(json: &str) -> Result<Ruleset> {
    let raw: Value = serde_json::from_str(json).context("规则集不是合法 JSON")?;

    let persisted = raw.get("rootGroup").is_none() && raw.get("rules").is_some();
    if persisted {
        let persisted: PersistedRuleset =
            serde_json::from_value(raw).context("解析持久化规则集失败")?;
        Ok(persisted.into_ruleset())
    } else {
        let mut ruleset: Ruleset = serde_json::from_value(raw).context("解析规则集失败")?;
        if ruleset.form_order.is_empty() && !ruleset.attributes.is_empty() {
            ruleset.reset_form_order();
        }
        Ok(ruleset)
    }
}

/// 从文件读取规则集
pub fn load_ruleset(path: &str) -> Result<Ruleset> {
    let json = fs::read_to_string(path).with_context(|| format!("读取规则集文件失败: {}", path))?;
    parse_ruleset(&json).with_context(|| format!("规则集文件无效: {}", path))
}

fn load_values(path: &str) -> Result<FormValues> {
    let json = fs::read_to_string(path).with_context(|| format!("读取表单取值失败: {}", path))?;
    FormValues::from_json(&json).with_context(|| format!("表单取值文件无效: {}", path))
}

/// 命令执行器
///
/// 持有引擎配置，作为 CLI 与引擎之间的桥梁。
pub struct CommandRunner {
    engine: EngineConfig,
}

impl CommandRunner {
    pub fn new(engine: EngineConfig) -> Self {
        Self { engine }
    }

    /// 执行 validate 命令
    pub fn run_validate(&self, file: &str) -> Result<()> {
        let report = self.validate(load_ruleset(file)?)?;
        info!(ruleset = %report.ruleset, rules = report.rules, "规则集校验通过");
        emit(&report, None)
    }

    /// 执行 evaluate 命令
    pub fn run_evaluate(&self, ruleset: &str, values: &str, trace: bool, strict: bool) -> Result<()> {
        let report = self.evaluate(load_ruleset(ruleset)?, load_values(values)?, trace, strict)?;
        emit(&report, None)
    }

    /// 执行 flatten 命令
    pub fn run_flatten(&self, file: &str, output: Option<String>) -> Result<()> {
        let ruleset = load_ruleset(file)?;
        let persisted = PersistedRuleset::from_ruleset(&ruleset);
        info!(rows = persisted.rules.len(), "规则树已展开");
        emit(&persisted, output.as_deref())
    }

    /// 执行 rehydrate 命令
    pub fn run_rehydrate(&self, file: &str, output: Option<String>) -> Result<()> {
        let ruleset = load_ruleset(file)?;
        info!(nodes = ruleset.root_group.node_count(), "规则树已重建");
        emit(&ruleset, output.as_deref())
    }

    pub fn validate(&self, ruleset: Ruleset) -> Result<ValidationReport> {
        let compiled = RulesetCompiler::new()
            .compile(ruleset)
            .context("规则集校验失败")?;

        Ok(ValidationReport {
            ruleset: compiled.name().to_string(),
            attributes: compiled.ruleset.attributes.len(),
            rules: flatten(compiled.root()).len(),
            scoring_attributes: compiled.scoring_attributes.iter().copied().collect(),
        })
    }

    /// 计算可见字段与分数
    ///
    /// `trace` 为 true 或配置开启追踪时输出评估追踪。
    pub fn evaluate(
        &self,
        ruleset: Ruleset,
        values: FormValues,
        trace: bool,
        strict: bool,
    ) -> Result<EvaluationReport> {
        let compiled = RulesetCompiler::new()
            .compile(ruleset)
            .context("规则集校验失败")?;

        let mut resolver = RuleResolver::from_config(&self.engine);
        if trace {
            resolver = resolver.with_trace();
        }

        let mut session = FormSession::new(compiled.ruleset);
        for (attribute_id, value) in values.iter() {
            if session.ruleset().attribute(attribute_id).is_none() {
                warn!(attribute_id, "表单取值引用了未导入的属性，已忽略");
                continue;
            }
            session.set_value(attribute_id, value.clone());
        }

        let score = if strict {
            session.submit(&resolver).context("表单校验失败")?.score
        } else {
            resolver.score(session.ruleset(), session.values())
        };

        let visible_fields = session
            .visible_attributes()
            .into_iter()
            .map(|attr| VisibleField {
                attribute_id: attr.attribute_id,
                name: attr.name.clone(),
                display_name: attr.display_name.clone(),
            })
            .collect();

        Ok(EvaluationReport {
            ruleset: session.ruleset().name.clone(),
            visible_fields,
            score,
        })
    }
}

/// 把结果以 JSON 写到文件或 stdout
fn emit<T: Serialize>(value: &T, output: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("序列化结果失败")?;

    match output {
        Some(path) => {
            let mut file = fs::File::create(path).context("创建输出文件失败")?;
            file.write_all(json.as_bytes()).context("写入文件失败")?;
            info!(path, "结果已输出到文件");
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ruleset_json() -> Value {
        json!({
            "name": "本科录取",
            "baseWeight": 10.0,
            "attributes": [
                {"attributeId": 1, "name": "gpa", "displayName": "绩点", "type": "number"},
                {"attributeId": 2, "name": "essay", "displayName": "文书", "type": "multiLineText",
                 "rules": {"action": "SHOW", "logicOperator": "AND", "conditions": [
                     {"evaluatedAttributeId": 1, "operator": "greater_than", "value1": "3"}
                 ]}}
            ],
            "rootGroup": {"id": "root", "combinator": "AND", "children": [
                {"type": "rule", "id": "r1", "attributeId": 1, "condition": "greater_than",
                 "value": "3", "operation": "add", "points": 5.0}
            ]}
        })
    }

    #[test]
    fn test_parse_editor_shape() {
        let ruleset = parse_ruleset(&ruleset_json().to_string()).unwrap();
        assert_eq!(ruleset.name, "本科录取");
        assert_eq!(ruleset.form_order, vec![0, 1]);
        assert_eq!(ruleset.root_group.node_count(), 2);
        assert_eq!(ruleset.root_group.leaf_rules().len(), 1);
    }

    #[test]
    fn test_parse_persisted_shape() {
        let ruleset = parse_ruleset(&ruleset_json().to_string()).unwrap();
        let persisted = serde_json::to_string(&PersistedRuleset::from_ruleset(&ruleset)).unwrap();

        let back = parse_ruleset(&persisted).unwrap();
        assert!(back.root_group.same_shape(&ruleset.root_group));
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_ruleset("{not json").is_err());
    }

    #[test]
    fn test_evaluate_report() {
        let runner = CommandRunner::new(EngineConfig::default());
        let ruleset = parse_ruleset(&ruleset_json().to_string()).unwrap();
        let values = FormValues::new().with(1, json!(3.5));

        let report = runner.evaluate(ruleset, values, false, false).unwrap();
        assert_eq!(report.visible_fields.len(), 2);
        assert_eq!(report.score.score, 15.0);
        assert!(report.score.evaluation_trace.is_empty());
    }

    #[test]
    fn test_evaluate_with_configured_trace() {
        let runner = CommandRunner::new(EngineConfig {
            trace_enabled: true,
            ..EngineConfig::default()
        });
        let ruleset = parse_ruleset(&ruleset_json().to_string()).unwrap();
        let values = FormValues::new().with(1, json!(2)).with(99, json!("x"));

        let report = runner.evaluate(ruleset, values, false, false).unwrap();
        assert_eq!(report.visible_fields.len(), 1);
        assert_eq!(report.score.score, 10.0);
        assert!(!report.score.evaluation_trace.is_empty());
    }

    #[test]
    fn test_validate_report() {
        let runner = CommandRunner::new(EngineConfig::default());
        let ruleset = parse_ruleset(&ruleset_json().to_string()).unwrap();

        let report = runner.validate(ruleset).unwrap();
        assert_eq!(report.attributes, 2);
        assert_eq!(report.rules, 2);
        assert_eq!(report.scoring_attributes, vec![1]);
    }
}
