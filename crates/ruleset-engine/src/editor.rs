//! 规则集编辑会话
//!
//! 编辑器持有单个规则集，所有树变更都经由变更引擎完成并整体替换根组。
//! 用户输入在这里被同步校验：除以零、超出属性类型的操作符、删除仍被引用的属性
//! 都会被拒绝并保留原值。

use admissions_shared::config::EngineConfig;

use crate::compiler::validate_ruleset;
use crate::dnd::{DropOutcome, DropTarget, commit_move};
use crate::error::{Result, RuleError};
use crate::ids::{IdGenerator, UuidIdGenerator};
use crate::models::{Attribute, RuleGroup, Ruleset, ScoringRule};
use crate::mutation::{ClonePlacement, GroupPatch, RulePatch};
use crate::operators::{ConditionOperator, LogicalOperator};
use crate::persistence::PersistedRuleset;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// 规则集编辑器
pub struct RulesetEditor {
    ruleset: Ruleset,
    ids: Box<dyn IdGenerator>,
    clone_placement: ClonePlacement,
    revision: u64,
}

impl RulesetEditor {
    pub fn new(ruleset: Ruleset) -> Self {
        Self {
            ruleset,
            ids: Box::new(UuidIdGenerator),
            clone_placement: ClonePlacement::default(),
            revision: 0,
        }
    }

    /// 按引擎配置创建编辑器；克隆位置无法识别时报错
    pub fn from_config(ruleset: Ruleset, config: &EngineConfig) -> Result<Self> {
        let placement: ClonePlacement = config.clone_placement.parse()?;
        Ok(Self::new(ruleset).with_clone_placement(placement))
    }

    pub fn with_id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clone_placement(mut self, placement: ClonePlacement) -> Self {
        self.clone_placement = placement;
        self
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    pub fn root(&self) -> &RuleGroup {
        &self.ruleset.root_group
    }

    /// 每次实际变更后递增
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn into_ruleset(self) -> Ruleset {
        self.ruleset
    }

    pub fn set_details(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        base_weight: f64,
    ) {
        self.ruleset.name = name.into();
        self.ruleset.description = description.into();
        self.ruleset.base_weight = base_weight;
        self.revision += 1;
    }

    pub fn set_selected_programs(&mut self, programs: Vec<i64>) {
        self.ruleset.selected_programs = programs;
        self.revision += 1;
    }

    // ==================== 规则树 ====================

    /// 用新根组替换当前树；结构未变化时不计为变更
    fn replace_root(&mut self, root: RuleGroup) -> bool {
        if root == self.ruleset.root_group {
            debug!("变更未改变规则树");
            return false;
        }
        self.ruleset.root_group = root;
        self.revision += 1;
        true
    }

    /// 向组中添加默认叶子规则，返回新规则 ID
    ///
    /// 默认值：第一个属性、equals、空值、add、0 分。
    pub fn add_rule(&mut self, group_id: &str) -> Result<Option<String>> {
        let Some(first_id) = self.ruleset.attributes.first().map(|a| a.attribute_id) else {
            return Err(RuleError::ValidationError(
                "请先导入规则集使用的属性".to_string(),
            ));
        };

        let id = self.next_free_id();
        let rule = ScoringRule::new(id.clone(), first_id, ConditionOperator::Equals, "");
        let root = self.ruleset.root_group.add_rule(group_id, rule);
        Ok(self.replace_root(root).then_some(id))
    }

    /// 向组中添加空的 AND 子组，返回新组 ID
    pub fn add_group(&mut self, group_id: &str) -> Option<String> {
        let id = self.next_free_id();
        let group = RuleGroup::new(id.clone(), LogicalOperator::And);
        let root = self.ruleset.root_group.add_group(group_id, group);
        self.replace_root(root).then_some(id)
    }

    pub fn update_group(&mut self, group_id: &str, patch: &GroupPatch) -> bool {
        let root = self.ruleset.root_group.update_group(group_id, patch);
        self.replace_root(root)
    }

    /// 更新叶子规则
    ///
    /// 结果规则除以零、引用未导入的属性或使用该属性类型不支持的操作符时拒绝，树保持不变。
    /// 只更换属性时，原操作符若不适用于新类型则重置为 equals。
    #[instrument(skip(self, patch))]
    pub fn update_rule(&mut self, rule_id: &str, patch: &RulePatch) -> Result<bool> {
        let Some(current) = self.ruleset.root_group.find_rule(rule_id) else {
            debug!("规则不存在");
            return Ok(false);
        };

        let mut patch = patch.clone();
        let mut updated = patch.apply_to(current);

        let attr = self
            .ruleset
            .attribute(updated.attribute_id)
            .ok_or(RuleError::AttributeNotFound(updated.attribute_id))?;
        let allowed = attr.attribute_type.scoring_operators();

        if patch.condition.is_none() && !allowed.contains(&updated.condition) {
            patch.condition = Some(ConditionOperator::Equals);
            updated = patch.apply_to(current);
        }

        if !allowed.contains(&updated.condition) {
            return Err(RuleError::InvalidOperator {
                operator: updated.condition.to_string(),
                attribute_type: format!("{:?}", attr.attribute_type),
            });
        }
        if updated.divides_by_zero() {
            warn!("除数为零，拒绝修改");
            return Err(RuleError::DivideByZero {
                rule_id: rule_id.to_string(),
            });
        }

        let root = self.ruleset.root_group.update_rule(rule_id, &patch);
        Ok(self.replace_root(root))
    }

    /// 删除组；根组不可删除
    pub fn remove_group(&mut self, group_id: &str) -> Result<bool> {
        if group_id == self.ruleset.root_group.id {
            return Err(RuleError::RootGroupImmutable);
        }
        let root = self.ruleset.root_group.remove_group(group_id);
        Ok(self.replace_root(root))
    }

    pub fn remove_rule(&mut self, rule_id: &str) -> bool {
        let root = self.ruleset.root_group.remove_rule(rule_id);
        self.replace_root(root)
    }

    /// 克隆组，返回副本的 ID
    pub fn clone_group(&mut self, group_id: &str) -> Option<String> {
        let group = self.ruleset.root_group.find_group(group_id)?.clone();
        let root =
            self.ruleset
                .root_group
                .clone_group(&group, self.ids.as_mut(), self.clone_placement);
        self.replace_cloned(root)
    }

    /// 克隆叶子规则，返回副本的 ID
    pub fn clone_rule(&mut self, rule_id: &str) -> Option<String> {
        let rule = self.ruleset.root_group.find_rule(rule_id)?.clone();
        let root =
            self.ruleset
                .root_group
                .clone_rule(&rule, self.ids.as_mut(), self.clone_placement);
        self.replace_cloned(root)
    }

    fn replace_cloned(&mut self, root: RuleGroup) -> Option<String> {
        let before: HashSet<String> = self.ruleset.root_group.all_ids().into_iter().collect();
        let new_id = root.all_ids().into_iter().find(|id| !before.contains(id))?;
        self.replace_root(root).then_some(new_id)
    }

    /// 直接把节点移动到放置目标处
    pub fn move_node(&mut self, active_id: &str, target: &DropTarget) -> DropOutcome {
        let outcome = commit_move(&self.ruleset.root_group, active_id, target);
        self.apply_drop(&outcome);
        outcome
    }

    /// 应用拖拽协调器给出的结果，返回树是否变化
    pub fn apply_drop(&mut self, outcome: &DropOutcome) -> bool {
        match outcome {
            DropOutcome::Moved(root) => self.replace_root(root.clone()),
            DropOutcome::Cancelled(_) | DropOutcome::Ignored => false,
        }
    }

    fn next_free_id(&mut self) -> String {
        let mut taken: HashSet<String> = self.ruleset.root_group.all_ids().into_iter().collect();
        crate::ids::fresh_id(self.ids.as_mut(), &mut taken)
    }

    // ==================== 属性 ====================

    /// 从属性目录导入属性及其可见性规则引用的全部属性
    ///
    /// 返回本次新导入的属性 ID；已存在的属性不重复导入。导入后 formOrder 重置为恒等排列。
    #[instrument(skip(self, catalog))]
    pub fn import_attribute(&mut self, catalog: &[Attribute], attribute_id: i64) -> Result<Vec<i64>> {
        let mut imported = Vec::new();
        let mut pending = vec![attribute_id];

        while let Some(id) = pending.pop() {
            if self.ruleset.attribute(id).is_some() {
                continue;
            }
            let Some(source) = catalog.iter().find(|a| a.attribute_id == id) else {
                return Err(RuleError::AttributeNotFound(id));
            };

            let mut attr = source.clone();
            let mut deps = attr.referenced_attributes();
            for option_rule in attr.options.iter().filter_map(|o| o.rule.as_ref()) {
                deps.extend(option_rule.referenced_attributes());
            }
            let mut seen = HashSet::new();
            deps.retain(|d| *d != id && seen.insert(*d));

            attr.depends_on = deps.clone();
            self.ruleset.attributes.push(attr);
            imported.push(id);
            pending.extend(deps.into_iter().rev());
        }

        if !imported.is_empty() {
            self.ruleset.reset_form_order();
            self.revision += 1;
            info!(?imported, "属性已导入");
        }
        Ok(imported)
    }

    /// 移除属性；仍被其它属性的可见性规则或计分规则引用时拒绝
    #[instrument(skip(self))]
    pub fn remove_attribute(&mut self, attribute_id: i64) -> Result<()> {
        let Some(position) = self
            .ruleset
            .attributes
            .iter()
            .position(|a| a.attribute_id == attribute_id)
        else {
            return Err(RuleError::AttributeNotFound(attribute_id));
        };

        let referenced_by = self.references_to(attribute_id);
        if !referenced_by.is_empty() {
            let attribute = self.ruleset.attributes[position].display_name.clone();
            warn!(%attribute, ?referenced_by, "属性仍被引用，拒绝移除");
            return Err(RuleError::AttributeInUse {
                attribute,
                referenced_by: referenced_by.join(", "),
            });
        }

        self.ruleset.attributes.remove(position);
        self.ruleset.reset_form_order();
        self.revision += 1;
        Ok(())
    }

    /// 引用指定属性的其它属性（显示名）与计分规则（`rule <id>`）
    fn references_to(&self, attribute_id: i64) -> Vec<String> {
        let from_attributes = self
            .ruleset
            .attributes
            .iter()
            .filter(|a| a.attribute_id != attribute_id)
            .filter(|a| {
                a.depends_on.contains(&attribute_id)
                    || a.referenced_attributes().contains(&attribute_id)
                    || a
                        .options
                        .iter()
                        .filter_map(|o| o.rule.as_ref())
                        .any(|r| r.referenced_attributes().any(|id| id == attribute_id))
            })
            .map(|a| a.display_name.clone());

        let from_rules = self
            .ruleset
            .root_group
            .leaf_rules()
            .into_iter()
            .filter(|r| r.attribute_id == attribute_id)
            .map(|r| format!("rule {}", r.id));

        from_attributes.chain(from_rules).collect()
    }

    /// 调整 formOrder；必须是属性下标的排列
    pub fn reorder_attributes(&mut self, form_order: Vec<usize>) -> Result<()> {
        let n = self.ruleset.attributes.len();
        let mut sorted = form_order.clone();
        sorted.sort_unstable();
        if sorted != (0..n).collect::<Vec<_>>() {
            return Err(RuleError::ValidationError(format!(
                "formOrder {:?} 不是 0..{} 的排列",
                form_order, n
            )));
        }
        self.ruleset.form_order = form_order;
        self.revision += 1;
        Ok(())
    }

    // ==================== 保存 ====================

    pub fn validate(&self) -> Result<()> {
        validate_ruleset(&self.ruleset)
    }

    /// 校验并生成持久化形态
    pub fn to_persisted(&self) -> Result<PersistedRuleset> {
        self.validate()?;
        Ok(PersistedRuleset::from_ruleset(&self.ruleset))
    }
}
