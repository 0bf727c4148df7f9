use std::time::Instant;

use rand_chacha::ChaCha8Rng;

use crate::args::SimConfig;
use crate::backend::SqliteBackend;
use crate::generation::next_step;
use crate::logging::EventLog;
use crate::model::TableModel;
use crate::oracle::Oracle;

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) steps: u64,
    pub(crate) faults: u64,
    pub(crate) rows: usize,
}

/// Drive seeded steps until the iteration or time budget runs out.
///
/// Returns the failure reason on the first divergence between the table and the
/// model; the event log has already been dumped by then.
pub(crate) fn run(config: &SimConfig, rng: &mut ChaCha8Rng) -> Result<RunSummary, String> {
    let mut backend =
        SqliteBackend::open().map_err(|err| format!("failed to open backend: {err}"))?;
    let mut model = TableModel::new();
    let mut events = EventLog::new(config.first_steps, config.tail_steps);
    let mut summary = RunSummary::default();

    let started = Instant::now();
    let max_steps = config.iterations.unwrap_or(u64::MAX);
    let max_time = config.duration_ms.unwrap_or(u64::MAX);

    while summary.steps < max_steps && elapsed_ms(started) <= max_time {
        let mut step = next_step(&mut model, config, rng);
        let op_display = step.op.to_string();

        let mut predicted = model.clone();
        let expected = predicted.apply(&step.op);
        let outcome = backend.apply(&mut step);
        if step.persists() {
            model = predicted;
        } else {
            summary.faults += u64::from(outcome.is_err());
        }

        let result_label = match &outcome {
            Ok(n) => format!("Ok({n})"),
            Err(err) => format!("Err({err})"),
        };
        events.record(format!(
            "step={} op={} tx={:?} result={}",
            summary.steps, op_display, step.tx, result_label
        ));

        let checked = Oracle::check_outcome(&step.op, expected, &outcome).and_then(|()| {
            let table = backend
                .snapshot()
                .map_err(|err| format!("failed to read back table: {err}"))?;
            Oracle::check_table(&model, &table, backend.in_transaction())
        });
        if let Err(reason) = checked {
            events.dump_failure(&reason);
            return Err(reason);
        }
        summary.steps += 1;
    }

    summary.rows = model.rows.len();
    tracing::info!(
        "complete: steps={} faults={} rows={} elapsed={}ms",
        summary.steps,
        summary.faults,
        summary.rows,
        elapsed_ms(started)
    );
    Ok(summary)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
