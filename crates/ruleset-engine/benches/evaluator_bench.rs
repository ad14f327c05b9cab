//! 条件评估与计分性能基准测试
//!
//! 覆盖 ConditionEvaluator 的单条件评估，以及 RuleResolver 在不同规模规则树上的计分。

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ruleset_engine::{
    Attribute, AttributeType, ConditionEvaluator, ConditionOperator, FormValues, LogicalOperator,
    Operation, RuleGroup, RuleNode, RuleResolver, Ruleset, ScoringRule, flatten, rehydrate,
};
use serde_json::{Value, json};
use std::hint::black_box;

/// 等值与包含检查基准
fn bench_equality_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("equality_operations");

    let number = json!(5);
    let text = json!("banana");
    let list = json!(["a", "b", "c", "d", "e"]);

    group.bench_function("equals_loose", |b| {
        b.iter(|| {
            ConditionEvaluator::evaluate(
                black_box(Some(&number)),
                black_box(&ConditionOperator::Equals),
                black_box("5"),
            )
        })
    });

    group.bench_function("contains_text", |b| {
        b.iter(|| {
            ConditionEvaluator::evaluate(
                black_box(Some(&text)),
                black_box(&ConditionOperator::Contains),
                black_box("an"),
            )
        })
    });

    group.bench_function("contains_array", |b| {
        b.iter(|| {
            ConditionEvaluator::evaluate(
                black_box(Some(&list)),
                black_box(&ConditionOperator::Contains),
                black_box("d"),
            )
        })
    });

    group.finish();
}

/// 数值与日期比较基准
fn bench_ordering_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordering_operations");

    let number = json!(3.8);
    let date = json!("2026-03-15");

    group.bench_function("greater_than_number", |b| {
        b.iter(|| {
            ConditionEvaluator::evaluate(
                black_box(Some(&number)),
                black_box(&ConditionOperator::GreaterThan),
                black_box("3.5"),
            )
        })
    });

    group.bench_function("less_than_date", |b| {
        b.iter(|| {
            ConditionEvaluator::evaluate(
                black_box(Some(&date)),
                black_box(&ConditionOperator::LessThan),
                black_box("2026-09-01"),
            )
        })
    });

    group.bench_function("missing_field", |b| {
        b.iter(|| {
            ConditionEvaluator::evaluate(
                black_box(None),
                black_box(&ConditionOperator::GreaterThanOrEqual),
                black_box("100"),
            )
        })
    });

    group.finish();
}

/// 生成 `groups` 个 OR 子组、每组 `rules` 条叶子规则的规则树
fn build_tree(groups: usize, rules: usize) -> RuleGroup {
    let children: Vec<RuleNode> = (0..groups)
        .map(|g| {
            let leaves = (0..rules)
                .map(|r| {
                    ScoringRule::new(
                        format!("r{}_{}", g, r),
                        (r % 4) as i64 + 1,
                        ConditionOperator::GreaterThan,
                        format!("{}", r * 10),
                    )
                    .with_effect(Operation::Add, 1.0)
                    .into()
                })
                .collect();
            RuleGroup::new(format!("g{}", g), LogicalOperator::Or)
                .with_children(leaves)
                .into()
        })
        .collect();
    RuleGroup::root().with_children(children)
}

fn build_ruleset(groups: usize, rules: usize) -> Ruleset {
    let mut ruleset = Ruleset::new("基准规则集", 10.0);
    ruleset.attributes = (1..=4)
        .map(|id| {
            Attribute::new(
                id,
                format!("field_{}", id),
                format!("字段 {}", id),
                AttributeType::Number,
            )
        })
        .collect();
    ruleset.reset_form_order();
    ruleset.root_group = build_tree(groups, rules);
    ruleset
}

fn build_values() -> FormValues {
    (1..=4).fold(FormValues::new(), |values, id| values.with(id, Value::from(id * 25)))
}

/// 不同规模规则树的计分
fn bench_scoring_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring_scaling");
    let values = build_values();
    let resolver = RuleResolver::new();

    for size in [5, 20, 50, 100].iter() {
        let ruleset = build_ruleset(*size, 5);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| resolver.score(black_box(&ruleset), black_box(&values)))
        });
    }

    group.finish();
}

/// 追踪开启时的额外开销
fn bench_scoring_trace(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring_trace");
    let ruleset = build_ruleset(20, 5);
    let values = build_values();

    let plain = RuleResolver::new();
    let traced = RuleResolver::new().with_trace();

    group.bench_function("without_trace", |b| {
        b.iter(|| plain.score(black_box(&ruleset), black_box(&values)))
    });
    group.bench_function("with_trace", |b| {
        b.iter(|| traced.score(black_box(&ruleset), black_box(&values)))
    });

    group.finish();
}

/// 持久化形态转换
fn bench_persistence(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistence");
    let tree = build_tree(50, 5);
    let rows = flatten(&tree);

    group.bench_function("flatten", |b| b.iter(|| flatten(black_box(&tree))));
    group.bench_function("rehydrate", |b| b.iter(|| rehydrate(black_box(&rows))));

    group.finish();
}

criterion_group!(
    benches,
    bench_equality_operations,
    bench_ordering_operations,
    bench_scoring_scaling,
    bench_scoring_trace,
    bench_persistence,
);

criterion_main!(benches);
