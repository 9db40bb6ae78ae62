//! The parallel assessor driver (spec §4.9), grounded directly on the
//! specification's own design note (§9: "Use task-based parallelism: spawn
//! up to `p` workers on a bounded channel; driver loop consumes
//! completions and emits progress") since the teacher has no multi-worker
//! analogue for this concern. Built on `std::thread` + `std::sync::mpsc`
//! rather than a task-stealing crate, matching that design note's
//! deliberate choice to avoid an additional scheduler dependency.

use crate::aggregator::AggregatorSpec;
use crate::assessment::assessor::{self, AssessError};
use crate::assessment::Assessment;
use crate::expr::{Expression, FuncTable};
use crate::rule::Rule;
use crate::source::RecordSource;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

/// One update from the driver. The final event for a run always has
/// `finished = true`; all prior events have `finished = false`.
pub struct ProgressEvent {
    pub assessment: Option<Assessment>,
    pub error: Option<String>,
    pub progress: f64,
    pub finished: bool,
}

/// Run `rules` against `source`, fanning out across up to `max_parallelism`
/// worker threads. Takes ownership of everything it needs so the driver
/// can run on its own background thread and the caller can keep draining
/// `ProgressEvent`s from the returned receiver.
pub fn run(
    rules: Vec<Rule>,
    user_specs: Vec<Box<dyn AggregatorSpec>>,
    goals: Vec<Expression>,
    funcs: FuncTable,
    source: Box<dyn RecordSource>,
    max_parallelism: usize,
) -> Receiver<ProgressEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || drive(rules, user_specs, goals, funcs, source, max_parallelism.max(1), tx));
    rx
}

/// Shard `rules` into `min(|rules|, 1000)` contiguous pieces, the last
/// absorbing any remainder (spec §4.9).
fn shard_rules(rules: &[Rule]) -> Vec<Vec<Rule>> {
    let n = rules.len();
    let shard_count = n.min(1000).max(1);
    let base = n / shard_count;
    let mut shards = Vec::with_capacity(shard_count);
    let mut idx = 0;
    for s in 0..shard_count {
        let size = if s == shard_count - 1 { n - idx } else { base };
        shards.push(rules[idx..idx + size].to_vec());
        idx += size;
    }
    shards
}

fn drive(
    rules: Vec<Rule>,
    user_specs: Vec<Box<dyn AggregatorSpec>>,
    goals: Vec<Expression>,
    funcs: FuncTable,
    source: Box<dyn RecordSource>,
    p: usize,
    tx: mpsc::Sender<ProgressEvent>,
) {
    tracing::info!(rules = rules.len(), max_parallelism = p, "driver starting");

    if rules.len() < 2 {
        let mut src = source;
        let event = match assessor::assess(&rules, &user_specs, &goals, &funcs, src.as_mut()) {
            Ok(a) => ProgressEvent { assessment: Some(a), error: None, progress: 1.0, finished: true },
            Err(e) => ProgressEvent { assessment: None, error: Some(e.to_string()), progress: 1.0, finished: true },
        };
        tx.send(event).ok();
        return;
    }

    let shards = shard_rules(&rules);
    let total = shards.len();
    tracing::debug!(shards = total, "rules sharded across workers");
    let user_specs = Arc::new(user_specs);
    let goals = Arc::new(goals);
    let funcs = Arc::new(funcs);

    let mut queue: VecDeque<(usize, Vec<Rule>)> = shards.into_iter().enumerate().collect();
    let (result_tx, result_rx) = mpsc::channel::<(usize, Result<Assessment, AssessError>)>();
    let mut in_flight = 0usize;
    let mut completed = 0usize;
    let mut running: Option<Assessment> = None;
    let mut cancelled = false;

    loop {
        while !cancelled && in_flight < p {
            let Some((shard_idx, shard_rules)) = queue.pop_front() else { break };
            let mut src = match source.clone_source() {
                Ok(s) => s,
                Err(e) => {
                    result_tx.send((shard_idx, Err(AssessError::Io(e)))).ok();
                    in_flight += 1;
                    continue;
                }
            };
            let specs = Arc::clone(&user_specs);
            let goals = Arc::clone(&goals);
            let funcs = Arc::clone(&funcs);
            let result_tx = result_tx.clone();
            in_flight += 1;
            thread::spawn(move || {
                let result = assessor::assess(&shard_rules, &specs, &goals, &funcs, src.as_mut());
                result_tx.send((shard_idx, result)).ok();
            });
        }

        if completed == total || (cancelled && in_flight == 0) {
            break;
        }

        let Ok((_shard_idx, result)) = result_rx.recv() else { break };
        in_flight -= 1;
        completed += 1;

        match result {
            Ok(partial) => {
                running = Some(match running.take() {
                    None => partial,
                    Some(mut acc) => {
                        acc.merge(partial).expect("shards share the same record source and thus num_records");
                        acc
                    }
                });
                let progress = completed as f64 / total as f64;
                let finished = completed == total;
                if finished {
                    tracing::info!(total, "driver finished");
                }
                tx.send(ProgressEvent {
                    assessment: if finished { running.clone() } else { None },
                    error: None,
                    progress,
                    finished,
                })
                .ok();
            }
            Err(e) => {
                cancelled = true;
                queue.clear();
                tracing::info!(error = %e, "driver cancelled after shard failure");
                tx.send(ProgressEvent { assessment: None, error: Some(e.to_string()), progress: 1.0, finished: true }).ok();
                return;
            }
        }
    }
}
