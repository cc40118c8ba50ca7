//! Batching inference server and its worker-side channel client.
//!
//! Workers and the server exchange messages over single-capacity bounded
//! channels, one pair per worker. Each server iteration takes exactly one
//! message from every live worker: either a position to evaluate or `None`,
//! meaning that worker has finished its simulations. Requests are batched
//! into a single oracle call; result `i` is routed back to requester `i`.
//! The protocol guarantees a send never blocks: a worker posts at most one
//! message between responses, so its mailbox slot is always free.

use std::sync::MutexGuard;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use mcts_core::Game;
use tracing::trace;

use crate::oracle::{Evaluation, Oracle, OracleError};
use crate::search::{SearchError, SearchLock, SearchState};
use crate::worker::EvalClient;

/// One position to evaluate, or `None` when the worker has finished.
type InferenceRequest<G> = Option<(<G as Game>::Board, Vec<<G as Game>::Action>)>;

/// Server-side endpoints for one worker.
pub(crate) struct ServerChannel<G: Game> {
    requests: Receiver<InferenceRequest<G>>,
    responses: Sender<Result<Evaluation, OracleError>>,
}

/// Worker-side endpoints: the mailbox pair a concurrent worker evaluates
/// through.
pub(crate) struct RemoteClient<G: Game> {
    requests: Sender<InferenceRequest<G>>,
    responses: Receiver<Result<Evaluation, OracleError>>,
}

/// Create the mailbox pair connecting one worker with the server.
pub(crate) fn channel_pair<G: Game>() -> (RemoteClient<G>, ServerChannel<G>) {
    let (request_tx, request_rx) = bounded(1);
    let (response_tx, response_rx) = bounded(1);
    (
        RemoteClient {
            requests: request_tx,
            responses: response_rx,
        },
        ServerChannel {
            requests: request_rx,
            responses: response_tx,
        },
    )
}

impl<G: Game> EvalClient<G> for RemoteClient<G> {
    fn evaluate<'a>(
        &mut self,
        lock: &'a SearchLock<G>,
        guard: MutexGuard<'a, SearchState<G>>,
        board: &G::Board,
        actions: &[G::Action],
    ) -> Result<(MutexGuard<'a, SearchState<G>>, Evaluation), SearchError> {
        // Post under the lock, then release it for the duration of the
        // wait. This is the only suspension point inside a descent.
        self.requests
            .send(Some((board.clone(), actions.to_vec())))
            .map_err(|_| SearchError::ServerDisconnected)?;
        drop(guard);

        let response = self
            .responses
            .recv()
            .map_err(|_| SearchError::ServerDisconnected)?;
        let evaluation = response?;

        let guard = lock.lock().expect("search lock poisoned");
        Ok((guard, evaluation))
    }

    fn finish(&mut self) {
        // The server may already be gone if the oracle failed; that is fine.
        let _ = self.requests.send(None);
    }
}

/// Serve inference requests until every worker has terminated.
///
/// Returns the total time spent inside the oracle. On oracle failure the
/// error is forwarded to every worker still waiting for a response, so no
/// worker stays blocked, and then returned to the caller.
pub(crate) fn serve<G: Game, O: Oracle<G>>(
    oracle: &mut O,
    mut workers: Vec<ServerChannel<G>>,
    fill_batches: bool,
) -> Result<Duration, OracleError> {
    let capacity = workers.len();
    let mut inference_time = Duration::ZERO;

    while !workers.is_empty() {
        let mut live = Vec::with_capacity(workers.len());
        let mut batch: Vec<(G::Board, Vec<G::Action>)> = Vec::with_capacity(capacity);
        for channel in workers {
            match channel.requests.recv() {
                Ok(Some(request)) => {
                    batch.push(request);
                    live.push(channel);
                }
                // Terminator, or a worker that died and dropped its sender.
                Ok(None) | Err(_) => {}
            }
        }
        workers = live;
        if workers.is_empty() {
            break;
        }

        let submitted = batch.len();
        if fill_batches && submitted < capacity {
            // Downstream oracles may prefer constant-size batches; the
            // padded slots' results are discarded below.
            let filler = batch[0].clone();
            batch.resize(capacity, filler);
        }
        trace!(requests = submitted, batch = batch.len(), "evaluating batch");

        let started = Instant::now();
        let result = oracle.evaluate_batch(&batch);
        inference_time += started.elapsed();

        let evaluations = match result {
            Ok(evaluations) if evaluations.len() >= submitted => evaluations,
            Ok(evaluations) => {
                let error = OracleError::EvaluationFailed(format!(
                    "batch returned {} results for {} requests",
                    evaluations.len(),
                    submitted
                ));
                broadcast_failure(&workers, &error);
                return Err(error);
            }
            Err(error) => {
                broadcast_failure(&workers, &error);
                return Err(error);
            }
        };

        for (channel, evaluation) in workers.iter().zip(evaluations) {
            // A worker that errored out since posting may miss its
            // response; that only matters to the worker, which is gone.
            let _ = channel.responses.send(Ok(evaluation));
        }
    }

    Ok(inference_time)
}

fn broadcast_failure<G: Game>(workers: &[ServerChannel<G>], error: &OracleError) {
    for channel in workers {
        let _ = channel.responses.send(Err(error.clone()));
    }
}
