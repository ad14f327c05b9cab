//! 节点 ID 生成

use std::collections::HashSet;
use uuid::Uuid;

/// 节点 ID 生成器
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// 基于 UUID v4 的生成器（默认）
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// 单调递增的生成器，输出 `{prefix}{n}`
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// 生成器连续撞号的最大重试次数
const MAX_ATTEMPTS: usize = 16;

/// 生成一个不在 `taken` 中的 ID，并登记到 `taken`
///
/// 生成器多次撞号后退化为在最后一个候选后追加序号，保证一定终止。
pub fn fresh_id(ids: &mut dyn IdGenerator, taken: &mut HashSet<String>) -> String {
    let mut candidate = ids.next_id();
    for _ in 1..MAX_ATTEMPTS {
        if !taken.contains(&candidate) {
            break;
        }
        candidate = ids.next_id();
    }

    let base = candidate.clone();
    let mut suffix = 1;
    while taken.contains(&candidate) {
        candidate = format!("{}-{}", base, suffix);
        suffix += 1;
    }

    taken.insert(candidate.clone());
    candidate
}
