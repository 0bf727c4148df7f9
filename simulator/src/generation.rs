use rand::Rng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;

use sql_recordset::{Record, ScalarValue};

use crate::args::SimConfig;
use crate::model::{DeleteKey, Item, Op, Step, TableModel, TxMode, item_record};

const GROUPS: [&str; 3] = ["red", "green", "blue"];

#[derive(Debug, Clone, Copy)]
enum Kind {
    Insert,
    Replace,
    Update,
    Delete,
}

/// Draw the next step. Fresh ids are reserved from `model` even if the step is
/// later rolled back.
pub(crate) fn next_step(model: &mut TableModel, config: &SimConfig, rng: &mut ChaCha8Rng) -> Step {
    let outer = rng.random::<f64>() < config.outer_tx_rate;
    if rng.random::<f64>() < config.fault_rate {
        let rows = batch_len(config, rng).max(2);
        let op = faulty_insert(model, rows, rng);
        let tx = if outer { TxMode::OuterRollback } else { TxMode::Owned };
        return Step { op, tx };
    }

    let kind = choose_weighted(
        &[
            (Kind::Insert, 0.35),
            (Kind::Replace, 0.15),
            (Kind::Update, 0.30),
            (Kind::Delete, 0.20),
        ],
        rng,
    );
    let len = batch_len(config, rng);
    let op = match kind {
        Kind::Insert => Op::Insert((0..len).map(|i| fresh_row(model, i, rng)).collect()),
        Kind::Replace => Op::Replace(replace_rows(model, len, rng)),
        Kind::Update => Op::Update((0..len).map(|_| update_row(model, rng)).collect()),
        Kind::Delete => delete_op(model, len, rng),
    };
    let tx = match (outer, rng.random_bool(0.5)) {
        (false, _) => TxMode::Owned,
        (true, true) => TxMode::OuterCommit,
        (true, false) => TxMode::OuterRollback,
    };
    Step { op, tx }
}

fn batch_len(config: &SimConfig, rng: &mut ChaCha8Rng) -> usize {
    // an occasional empty batch exercises the no-op path
    if rng.random_bool(0.02) {
        return 0;
    }
    rng.random_range(1..=config.batch_size)
}

fn random_item(rng: &mut ChaCha8Rng) -> Item {
    let grp = if rng.random_bool(0.2) {
        None
    } else {
        GROUPS.choose(rng).map(|g| (*g).to_string())
    };
    let label = Some(format!("item-{}", rng.random_range(0..10_000)));
    let qty = if rng.random_bool(0.1) {
        None
    } else {
        Some(rng.random_range(0..500).to_string())
    };
    Item { grp, label, qty }
}

/// A new row. Rows after the first sometimes leave `qty` out entirely so the
/// batch binds NULL for it.
fn fresh_row(model: &mut TableModel, index: usize, rng: &mut ChaCha8Rng) -> Record {
    let id = model.reserve_id();
    let mut rec = item_record(id, &random_item(rng));
    if index > 0 && rng.random_bool(0.1) {
        rec.remove("qty");
    }
    rec
}

fn replace_rows(model: &mut TableModel, len: usize, rng: &mut ChaCha8Rng) -> Vec<Record> {
    let ids = model.ids();
    (0..len)
        .map(|i| match ids.choose(rng) {
            Some(&id) if rng.random_bool(0.7) => item_record(id, &random_item(rng)),
            _ => fresh_row(model, i, rng),
        })
        .collect()
}

fn existing_or_missing_id(model: &TableModel, rng: &mut ChaCha8Rng) -> i64 {
    let ids = model.ids();
    match ids.choose(rng) {
        Some(&id) if rng.random_bool(0.85) => id,
        // never reserved, so no row can have it
        _ => -rng.random_range(1..1_000),
    }
}

fn update_row(model: &TableModel, rng: &mut ChaCha8Rng) -> Record {
    let id = existing_or_missing_id(model, rng);
    let item = random_item(rng);
    let mut rec = Record::new();
    rec.set("id", id.to_string());
    if rng.random_bool(0.5) {
        rec.set("grp", ScalarValue::from(item.grp));
    }
    if rng.random_bool(0.5) {
        rec.set("label", ScalarValue::from(item.label));
    }
    if rng.random_bool(0.5) {
        rec.set("qty", ScalarValue::from(item.qty));
    }
    rec
}

fn delete_op(model: &TableModel, len: usize, rng: &mut ChaCha8Rng) -> Op {
    if rng.random_bool(0.15) {
        let grp = if rng.random_bool(0.3) {
            ScalarValue::Null
        } else {
            GROUPS.choose(rng).map_or(ScalarValue::Null, |g| ScalarValue::from(*g))
        };
        let rec: Record = [("grp", grp)].into_iter().collect();
        return Op::Delete {
            key: DeleteKey::Group,
            rows: vec![rec],
        };
    }
    let rows: Vec<Record> = (0..len)
        .map(|_| {
            let id = existing_or_missing_id(model, rng);
            [("id", id.to_string())].into_iter().collect::<Record>()
        })
        .collect();
    Op::Delete {
        key: DeleteKey::Id,
        rows,
    }
}

/// An insert of `len` fresh rows where one row after the first reuses an id that
/// already exists, either in the table or earlier in the batch.
fn faulty_insert(model: &mut TableModel, len: usize, rng: &mut ChaCha8Rng) -> Op {
    let mut rows: Vec<Record> = (0..len).map(|i| fresh_row(model, i, rng)).collect();
    let dup_at = rng.random_range(1..len);
    let ids = model.ids();
    let dup_id = match ids.choose(rng) {
        Some(&id) if rng.random_bool(0.5) => id,
        _ => rows[0].int64("id"),
    };
    rows[dup_at].set("id", dup_id.to_string());
    Op::FaultyInsert { rows, dup_at }
}

fn choose_weighted<T: Copy>(items: &[(T, f64)], rng: &mut ChaCha8Rng) -> T {
    let total: f64 = items.iter().map(|(_, weight)| weight.max(0.0)).sum();
    let mut target = rng.random::<f64>() * total;
    for (item, weight) in items {
        let w = weight.max(0.0);
        if target <= w {
            return *item;
        }
        target -= w;
    }
    items[items.len() - 1].0
}
