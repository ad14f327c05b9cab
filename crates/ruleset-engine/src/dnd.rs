//! 拖拽协调器
//!
//! 把指针事件序列转换为离散的移动命令，经由变更引擎作用到规则树上。
//!
//! 状态机：Idle → Dragging → Idle（提交），或 Idle → Dragging → Cancelled → Idle。
//! 拖拽过程中只更新悬停目标，不修改规则树；只有在松开指针时才提交一次移动。

use admissions_shared::config::EngineConfig;

use crate::models::{RuleGroup, RuleNode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// 默认激活距离（像素）
pub const DEFAULT_ACTIVATION_DISTANCE: f64 = 5.0;

/// 指针坐标
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// 节点在界面上占据的矩形区域
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// 可放置区域：节点 ID + 布局矩形
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Droppable {
    pub id: String,
    pub rect: Rect,
}

impl Droppable {
    pub fn new(id: impl Into<String>, rect: Rect) -> Self {
        Self {
            id: id.into(),
            rect,
        }
    }
}

/// 相对目标节点的放置位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPosition {
    /// 目标之前（同级）
    Before,
    /// 目标之后（同级）
    After,
    /// 追加为目标组的最后一个子节点
    Inside,
}

/// 放置目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTarget {
    pub id: String,
    pub position: DropPosition,
}

impl DropTarget {
    pub fn new(id: impl Into<String>, position: DropPosition) -> Self {
        Self {
            id: id.into(),
            position,
        }
    }
}

/// 进行中的拖拽
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub active_id: String,
    /// 覆盖层展示的被拖拽节点副本
    pub overlay: RuleNode,
    /// 拖拽开始时的节点路径
    pub origin: Vec<usize>,
    pub over: Option<DropTarget>,
}

/// 取消原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// 松开时不在任何可放置区域上
    NoTarget,
    /// 把组拖进自身或其子树
    IllegalMove,
    /// 放回原位，树没有变化
    SamePosition,
    /// 被拖拽节点或目标已不在当前树中
    StaleTarget,
    /// 调用方主动取消（例如按下 Esc）
    Aborted,
}

/// 拖拽状态
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
    Cancelled(CancelReason),
}

/// 松开指针后的结果
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// 提交了一次移动，携带新的根组
    Moved(RuleGroup),
    /// 移动被丢弃，调用方无需更新
    Cancelled(CancelReason),
    /// 未进入拖拽（只是点击）
    Ignored,
}

impl DropOutcome {
    /// 新树（仅在提交时存在）
    pub fn into_tree(self) -> Option<RuleGroup> {
        match self {
            Self::Moved(tree) => Some(tree),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Press {
    id: String,
    at: Point,
}

/// 拖拽协调器
#[derive(Debug, Clone)]
pub struct DragCoordinator {
    activation_distance: f64,
    state: DragState,
    press: Option<Press>,
}

impl DragCoordinator {
    pub fn new(activation_distance: f64) -> Self {
        Self {
            activation_distance: activation_distance.max(0.0),
            state: DragState::Idle,
            press: None,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.drag_activation_distance)
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// 当前悬停的目标
    pub fn over(&self) -> Option<&DropTarget> {
        match &self.state {
            DragState::Dragging(session) => session.over.as_ref(),
            _ => None,
        }
    }

    /// 覆盖层节点
    pub fn overlay(&self) -> Option<&RuleNode> {
        match &self.state {
            DragState::Dragging(session) => Some(&session.overlay),
            _ => None,
        }
    }

    /// Cancelled → Idle
    pub fn reset(&mut self) {
        self.state = DragState::Idle;
        self.press = None;
    }

    /// 在可拖拽节点上按下指针
    pub fn pointer_down(&mut self, tree: &RuleGroup, id: &str, at: Point) {
        if self.is_dragging() {
            debug!(id, "pointer_down: 已在拖拽中，忽略");
            return;
        }
        self.reset();

        if tree.find_item_by_id(id).is_none() {
            debug!(id, "pointer_down: 节点不可拖拽");
            return;
        }
        self.press = Some(Press {
            id: id.to_string(),
            at,
        });
    }

    /// 指针移动
    ///
    /// 未激活时检查是否越过激活距离；拖拽中重新计算悬停目标。
    /// 返回当前悬停目标。
    pub fn pointer_move(
        &mut self,
        tree: &RuleGroup,
        at: Point,
        droppables: &[Droppable],
    ) -> Option<&DropTarget> {
        let pending = match self.state {
            DragState::Idle => self.press.clone(),
            _ => None,
        };
        if let Some(press) = pending {
            if press.at.distance(at) < self.activation_distance {
                return None;
            }
            let Some(found) = tree.find_item_by_id(&press.id) else {
                debug!(id = %press.id, "drag start: 节点已不在树中");
                self.press = None;
                return None;
            };

            debug!(id = %press.id, path = ?found.path, "拖拽开始");
            self.state = DragState::Dragging(DragSession {
                active_id: press.id.clone(),
                overlay: found.item.clone(),
                origin: found.path,
                over: None,
            });
            self.press = None;
        }

        let DragState::Dragging(session) = &mut self.state else {
            return None;
        };

        session.over = hit_test(tree, &session.active_id, at, droppables);
        session.over.as_ref()
    }

    /// 松开指针，在有效目标上提交移动
    pub fn pointer_up(&mut self, tree: &RuleGroup) -> DropOutcome {
        self.press = None;

        let session = match std::mem::take(&mut self.state) {
            DragState::Dragging(session) => session,
            other => {
                self.state = other;
                return DropOutcome::Ignored;
            }
        };

        let outcome = match &session.over {
            Some(target) => commit_move(tree, &session.active_id, target),
            None => DropOutcome::Cancelled(CancelReason::NoTarget),
        };

        self.state = match &outcome {
            DropOutcome::Cancelled(reason) => DragState::Cancelled(*reason),
            _ => DragState::Idle,
        };
        outcome
    }

    /// 主动取消拖拽
    pub fn cancel(&mut self) -> DropOutcome {
        self.press = None;
        if !self.is_dragging() {
            return DropOutcome::Ignored;
        }
        self.state = DragState::Cancelled(CancelReason::Aborted);
        DropOutcome::Cancelled(CancelReason::Aborted)
    }
}

impl Default for DragCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVATION_DISTANCE)
    }
}

/// 能否把 `dragging` 放到 `target_id` 上
///
/// 目标是被拖拽节点自身，或位于被拖拽组子树中的任何节点时不允许。
pub fn can_drop_item(dragging: &RuleNode, target_id: &str) -> bool {
    !dragging.contains_id(target_id)
}

/// 把节点移动到放置目标处
///
/// 先从树中取出源节点，再在新树中定位目标并插入；
/// 结果与原树相同时视为取消，不产生新树。
#[instrument(skip(tree), fields(target = %target.id, position = ?target.position))]
pub fn commit_move(tree: &RuleGroup, active_id: &str, target: &DropTarget) -> DropOutcome {
    let Some(source) = tree.find_item_by_id(active_id) else {
        warn!("被拖拽节点不在树中");
        return DropOutcome::Cancelled(CancelReason::StaleTarget);
    };

    if !can_drop_item(source.item, &target.id) {
        debug!("非法移动：目标位于被拖拽节点的子树中");
        return DropOutcome::Cancelled(CancelReason::IllegalMove);
    }

    let Some((without, item)) = tree.take_item(&source.path) else {
        return DropOutcome::Cancelled(CancelReason::StaleTarget);
    };

    let destination = if target.id == without.id {
        // 根组本身作为目标时只能放入其中
        Some(vec![without.children.len()])
    } else {
        without
            .find_item_by_id(&target.id)
            .map(|found| destination_path(found.item, found.path, target.position))
    };
    let Some(destination) = destination else {
        warn!("放置目标不在树中");
        return DropOutcome::Cancelled(CancelReason::StaleTarget);
    };

    let moved = without.insert_item(item, &destination);
    if moved == *tree {
        return DropOutcome::Cancelled(CancelReason::SamePosition);
    }

    info!(from = ?source.path, to = ?destination, "节点已移动");
    DropOutcome::Moved(moved)
}

fn destination_path(target: &RuleNode, mut path: Vec<usize>, position: DropPosition) -> Vec<usize> {
    match (position, target) {
        (DropPosition::Inside, RuleNode::Group(g)) => {
            path.push(g.children.len());
            path
        }
        (DropPosition::After, _) | (DropPosition::Inside, RuleNode::Rule(_)) => {
            if let Some(last) = path.last_mut() {
                *last += 1;
            }
            path
        }
        (DropPosition::Before, _) => path,
    }
}

/// 取中心点离指针最近的可放置区域，并按指针在矩形中的纵向位置决定放置方式
fn hit_test(
    tree: &RuleGroup,
    active_id: &str,
    at: Point,
    droppables: &[Droppable],
) -> Option<DropTarget> {
    let closest = droppables
        .iter()
        .filter(|d| d.id != active_id)
        .min_by(|a, b| {
            a.rect
                .center()
                .distance(at)
                .total_cmp(&b.rect.center().distance(at))
        })?;

    let is_group = closest.id == tree.id
        || tree
            .find_item_by_id(&closest.id)
            .is_some_and(|found| found.item.is_group());
    let rect = &closest.rect;
    let offset = if rect.height > 0.0 {
        (at.y - rect.y) / rect.height
    } else {
        0.5
    };

    let position = if is_group {
        if closest.id == tree.id || (0.25..=0.75).contains(&offset) {
            DropPosition::Inside
        } else if offset < 0.25 {
            DropPosition::Before
        } else {
            DropPosition::After
        }
    } else if offset < 0.5 {
        DropPosition::Before
    } else {
        DropPosition::After
    };

    Some(DropTarget::new(closest.id.clone(), position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoringRule;
    use crate::operators::LogicalOperator;

    /// root
    /// ├── g1
    /// │   ├── r1
    /// │   └── g2
    /// │       ├── r2
    /// │       └── g3
    /// │           └── r3
    /// └── r4
    fn sample_tree() -> RuleGroup {
        RuleGroup::root().with_children(vec![
            RuleGroup::new("g1", LogicalOperator::And)
                .with_children(vec![
                    ScoringRule::new("r1", 1, "equals", "a").into(),
                    RuleGroup::new("g2", LogicalOperator::Or)
                        .with_children(vec![
                            ScoringRule::new("r2", 2, "equals", "b").into(),
                            RuleGroup::new("g3", LogicalOperator::And)
                                .with_children(vec![
                                    ScoringRule::new("r3", 3, "equals", "c").into(),
                                ])
                                .into(),
                        ])
                        .into(),
                ])
                .into(),
            ScoringRule::new("r4", 4, "equals", "d").into(),
        ])
    }

    fn droppables() -> Vec<Droppable> {
        vec![
            Droppable::new("g1", Rect::new(0.0, 0.0, 200.0, 40.0)),
            Droppable::new("r1", Rect::new(0.0, 50.0, 200.0, 20.0)),
            Droppable::new("g2", Rect::new(0.0, 80.0, 200.0, 40.0)),
            Droppable::new("r4", Rect::new(0.0, 200.0, 200.0, 20.0)),
        ]
    }

    #[test]
    fn test_can_drop_item_rejects_self_and_descendants() {
        let tree = sample_tree();
        let g2 = tree.find_item_by_id("g2").unwrap().item.clone();
        for id in ["g2", "r2", "g3", "r3"] {
            assert!(!can_drop_item(&g2, id), "{} 应被拒绝", id);
        }
        for id in ["g1", "r1", "r4", "root"] {
            assert!(can_drop_item(&g2, id), "{} 应被允许", id);
        }
    }

    #[test]
    fn test_drop_group_into_own_descendant_is_rejected() {
        let tree = sample_tree();
        let outcome = commit_move(&tree, "g2", &DropTarget::new("g3", DropPosition::Inside));
        assert_eq!(outcome, DropOutcome::Cancelled(CancelReason::IllegalMove));
    }

    #[test]
    fn test_move_rule_before_sibling() {
        let tree = sample_tree();
        let moved = commit_move(&tree, "r4", &DropTarget::new("r1", DropPosition::Before))
            .into_tree()
            .unwrap();
        assert_eq!(moved.find_item_by_id("r4").unwrap().path, vec![0, 0]);
        assert_eq!(moved.node_count(), tree.node_count());
    }

    #[test]
    fn test_move_into_group_appends() {
        let tree = sample_tree();
        let moved = commit_move(&tree, "r1", &DropTarget::new("g3", DropPosition::Inside))
            .into_tree()
            .unwrap();
        // 删除 r1 后 g2 成为 g1 的第一个子节点
        assert_eq!(moved.find_item_by_id("r1").unwrap().path, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_move_after_target_in_same_list() {
        let tree = sample_tree();
        let moved = commit_move(&tree, "g1", &DropTarget::new("r4", DropPosition::After))
            .into_tree()
            .unwrap();
        assert_eq!(moved.children[0].id(), "r4");
        assert_eq!(moved.children[1].id(), "g1");
    }

    #[test]
    fn test_drop_onto_root_appends() {
        let tree = sample_tree();
        let moved = commit_move(&tree, "r3", &DropTarget::new("root", DropPosition::Inside))
            .into_tree()
            .unwrap();
        assert_eq!(moved.children.last().unwrap().id(), "r3");
    }

    #[test]
    fn test_same_position_is_cancelled() {
        let tree = sample_tree();
        let outcome = commit_move(&tree, "r1", &DropTarget::new("g2", DropPosition::Before));
        assert_eq!(outcome, DropOutcome::Cancelled(CancelReason::SamePosition));
    }

    #[test]
    fn test_stale_ids_are_cancelled() {
        let tree = sample_tree();
        assert_eq!(
            commit_move(&tree, "ghost", &DropTarget::new("r1", DropPosition::Before)),
            DropOutcome::Cancelled(CancelReason::StaleTarget)
        );
        assert_eq!(
            commit_move(&tree, "r1", &DropTarget::new("ghost", DropPosition::Before)),
            DropOutcome::Cancelled(CancelReason::StaleTarget)
        );
    }

    #[test]
    fn test_small_movement_does_not_start_drag() {
        let tree = sample_tree();
        let mut dnd = DragCoordinator::default();
        dnd.pointer_down(&tree, "r4", Point::new(10.0, 210.0));
        assert!(dnd.pointer_move(&tree, Point::new(12.0, 212.0), &droppables()).is_none());
        assert!(!dnd.is_dragging());
        assert_eq!(dnd.pointer_up(&tree), DropOutcome::Ignored);
        assert_eq!(dnd.state(), &DragState::Idle);
    }

    #[test]
    fn test_activation_distance_from_config() {
        let tree = sample_tree();
        let config = EngineConfig {
            drag_activation_distance: 50.0,
            ..EngineConfig::default()
        };
        let mut dnd = DragCoordinator::from_config(&config);
        dnd.pointer_down(&tree, "r4", Point::new(10.0, 210.0));
        dnd.pointer_move(&tree, Point::new(10.0, 240.0), &droppables());
        assert!(!dnd.is_dragging());
        dnd.pointer_move(&tree, Point::new(10.0, 270.0), &droppables());
        assert!(dnd.is_dragging());
    }

    #[test]
    fn test_full_drag_commits_move() {
        let tree = sample_tree();
        let mut dnd = DragCoordinator::new(5.0);

        dnd.pointer_down(&tree, "r4", Point::new(10.0, 210.0));
        dnd.pointer_move(&tree, Point::new(10.0, 150.0), &droppables());
        assert!(dnd.is_dragging());
        assert_eq!(dnd.overlay().unwrap().id(), "r4");

        // r1 的上半部分
        let over = dnd
            .pointer_move(&tree, Point::new(100.0, 52.0), &droppables())
            .cloned();
        assert_eq!(over, Some(DropTarget::new("r1", DropPosition::Before)));

        let moved = dnd.pointer_up(&tree).into_tree().unwrap();
        assert_eq!(moved.find_item_by_id("r4").unwrap().path, vec![0, 0]);
        assert_eq!(dnd.state(), &DragState::Idle);
    }

    #[test]
    fn test_drag_without_target_is_cancelled() {
        let tree = sample_tree();
        let mut dnd = DragCoordinator::new(5.0);
        dnd.pointer_down(&tree, "r1", Point::new(0.0, 60.0));
        dnd.pointer_move(&tree, Point::new(0.0, 90.0), &[]);

        assert_eq!(
            dnd.pointer_up(&tree),
            DropOutcome::Cancelled(CancelReason::NoTarget)
        );
        assert_eq!(dnd.state(), &DragState::Cancelled(CancelReason::NoTarget));

        dnd.reset();
        assert_eq!(dnd.state(), &DragState::Idle);
    }

    #[test]
    fn test_group_middle_band_targets_inside() {
        let tree = sample_tree();
        let mut dnd = DragCoordinator::new(0.0);
        dnd.pointer_down(&tree, "r4", Point::new(0.0, 210.0));
        let over = dnd
            .pointer_move(&tree, Point::new(100.0, 100.0), &droppables())
            .cloned();
        assert_eq!(over, Some(DropTarget::new("g2", DropPosition::Inside)));
    }

    #[test]
    fn test_explicit_cancel() {
        let tree = sample_tree();
        let mut dnd = DragCoordinator::new(0.0);
        assert_eq!(dnd.cancel(), DropOutcome::Ignored);

        dnd.pointer_down(&tree, "g1", Point::new(0.0, 0.0));
        dnd.pointer_move(&tree, Point::new(0.0, 1.0), &droppables());
        assert_eq!(
            dnd.cancel(),
            DropOutcome::Cancelled(CancelReason::Aborted)
        );
        // 取消后新的按下回到 Idle
        dnd.pointer_down(&tree, "r1", Point::new(0.0, 0.0));
        assert_eq!(dnd.state(), &DragState::Idle);
    }
}
