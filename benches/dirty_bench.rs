use criterion::{Criterion, criterion_group, criterion_main};
use dirty_record::{DirtyTracked, Record, ScalarKind, Schema};
use std::hint::black_box;
use std::sync::Arc;

// ─── Test Data ──────────────────────────────────────────────────────────────

/// User-shaped record:
/// {
///   "name": str, "email": str, "age": i64,
///   "tags": [str], "metadata": {str: str},
///   "profile": { "avatar_url": str, "bio": str }
/// }
fn user_schema() -> Arc<Schema> {
    Schema::builder("User")
        .scalar("name", ScalarKind::Str)
        .scalar("email", ScalarKind::Str)
        .scalar("age", ScalarKind::I64)
        .list("tags", ScalarKind::Str)
        .map("metadata", ScalarKind::Str, ScalarKind::Str)
        .record("profile", "UserProfile")
        .build()
        .unwrap()
}

fn profile_schema() -> Arc<Schema> {
    Schema::builder("UserProfile")
        .scalar("avatar_url", ScalarKind::Str)
        .scalar("bio", ScalarKind::Str)
        .build()
        .unwrap()
}

fn node_schema() -> Arc<Schema> {
    Schema::builder("Node")
        .record("child", "Node")
        .scalar("label", ScalarKind::I64)
        .build()
        .unwrap()
}

fn wide_schema(fields: usize) -> Arc<Schema> {
    let mut b = Schema::builder(format!("Wide{fields}"));
    for i in 0..fields {
        b = b.scalar(format!("f{i}"), ScalarKind::I64);
    }
    b.build().unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// Group 1: Scalar sets
// ═══════════════════════════════════════════════════════════════════════════

fn bench_scalar_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalar_set");
    let user = Record::new(&user_schema());

    group.bench_function("set_i64 (changed)", |b| {
        let mut n = 0i64;
        b.iter(|| {
            n += 1;
            black_box(user.set(black_box(2), n))
        })
    });

    group.bench_function("set_str (redundant)", |b| {
        user.set(0, "alice");
        b.iter(|| black_box(user.set(black_box(0), black_box("alice"))))
    });

    group.bench_function("is_field_dirty", |b| {
        b.iter(|| black_box(user.is_field_dirty(black_box(2))))
    });

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Group 2: Bitmap width, 64 fields (inline word) vs 65 (boxed words)
// ═══════════════════════════════════════════════════════════════════════════

fn bench_bitmap_width(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitmap_width");

    for fields in [64usize, 65, 256] {
        let rec = Record::new(&wide_schema(fields));
        for i in (0..fields).step_by(3) {
            rec.set(i, 1i64);
        }
        group.bench_function(format!("dirty_field_indexes ({fields} fields)"), |b| {
            b.iter(|| black_box(rec.dirty_field_indexes()))
        });
        group.bench_function(format!("reset_dirty ({fields} fields)"), |b| {
            b.iter(|| rec.reset_dirty())
        });
    }

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Group 3: Propagation through parent links
// ═══════════════════════════════════════════════════════════════════════════

fn bench_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation");

    let user = Record::new(&user_schema());
    user.set(5, Record::new(&profile_schema()));
    let profile = user.get_record(5).unwrap();

    group.bench_function("nested set (depth 1)", |b| {
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            black_box(profile.set(black_box(1), n.to_string()))
        })
    });

    for depth in [8usize, 64] {
        let schema = node_schema();
        let nodes: Vec<Record> = (0..=depth).map(|_| Record::new(&schema)).collect();
        for pair in nodes.windows(2) {
            pair[0].set(0, &pair[1]);
        }
        let leaf = nodes[depth].clone();
        group.bench_function(format!("leaf set (depth {depth})"), |b| {
            let mut n = 0i64;
            b.iter(|| {
                n += 1;
                black_box(leaf.set(black_box(1), n))
            })
        });
    }

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Group 4: Collection element tracking
// ═══════════════════════════════════════════════════════════════════════════

fn bench_collections(c: &mut Criterion) {
    let mut group = c.benchmark_group("collections");

    group.bench_function("add_element (x100 + reset)", |b| {
        let user = Record::new(&user_schema());
        b.iter(|| {
            for _ in 0..100 {
                user.add_element(3, "tag");
            }
            user.reset_dirty();
            user.set(3, dirty_record::list![]);
        })
    });

    group.bench_function("set_map_value (changed)", |b| {
        let user = Record::new(&user_schema());
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            black_box(user.set_map_value(4, "level", n.to_string()))
        })
    });

    group.finish();
}

// ─── Criterion Main ─────────────────────────────────────────────────────────

criterion_group!(
    benches,
    bench_scalar_set,
    bench_bitmap_width,
    bench_propagation,
    bench_collections,
);
criterion_main!(benches);
