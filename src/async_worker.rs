use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;

use tracing::{debug, warn};

use hime_core::engine::{CandidateEngine, CandidateSuggestion};
use hime_session::{CandidateQuery, CommitRequest};

// ---------------------------------------------------------------------------
// Work / Result types
// ---------------------------------------------------------------------------

pub(crate) struct QueryWork {
    pub query: CandidateQuery,
    pub generation: u64,
}

pub(crate) struct QueryResult {
    pub snapshot: u64,
    pub candidates: Vec<CandidateSuggestion>,
}

pub(crate) struct CommitResult {
    pub snapshot: u64,
    pub text: Option<String>,
}

// ---------------------------------------------------------------------------
// AsyncWorker
// ---------------------------------------------------------------------------

/// Runs engine calls off the input thread. Results are collected by the
/// owner through `try_recv_*`.
pub(crate) struct AsyncWorker {
    query_tx: mpsc::Sender<QueryWork>,
    query_rx: Mutex<mpsc::Receiver<QueryResult>>,
    query_gen: Arc<AtomicU64>,

    commit_tx: mpsc::Sender<CommitRequest>,
    commit_rx: Mutex<mpsc::Receiver<CommitResult>>,
}

impl AsyncWorker {
    pub fn new(engine: Arc<dyn CandidateEngine>) -> io::Result<Self> {
        let query_gen = Arc::new(AtomicU64::new(0));

        // Candidate worker
        let (work_tx, work_rx) = mpsc::channel::<QueryWork>();
        let (result_tx, result_rx) = mpsc::channel::<QueryResult>();
        {
            let engine = Arc::clone(&engine);
            let gen = Arc::clone(&query_gen);
            thread::Builder::new()
                .name("hime-candidates".into())
                .spawn(move || candidate_worker(work_rx, result_tx, gen, engine))?;
        }

        // Commit worker
        let (commit_work_tx, commit_work_rx) = mpsc::channel::<CommitRequest>();
        let (commit_result_tx, commit_result_rx) = mpsc::channel::<CommitResult>();
        thread::Builder::new()
            .name("hime-commit".into())
            .spawn(move || commit_worker(commit_work_rx, commit_result_tx, engine))?;

        Ok(Self {
            query_tx: work_tx,
            query_rx: Mutex::new(result_rx),
            query_gen,
            commit_tx: commit_work_tx,
            commit_rx: Mutex::new(commit_result_rx),
        })
    }

    pub fn submit_query(&self, query: CandidateQuery) {
        let gen = self.query_gen.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.query_tx.send(QueryWork {
            query,
            generation: gen,
        });
    }

    pub fn submit_commit(&self, request: CommitRequest) {
        let _ = self.commit_tx.send(request);
    }

    pub fn invalidate_queries(&self) {
        self.query_gen.fetch_add(1, Ordering::SeqCst);
    }

    pub fn try_recv_query(&self) -> Option<QueryResult> {
        let rx = self.query_rx.lock().unwrap_or_else(PoisonError::into_inner);
        rx.try_recv().ok()
    }

    pub fn try_recv_commit(&self) -> Option<CommitResult> {
        let rx = self.commit_rx.lock().unwrap_or_else(PoisonError::into_inner);
        rx.try_recv().ok()
    }
}

// ---------------------------------------------------------------------------
// Worker threads
// ---------------------------------------------------------------------------

fn candidate_worker(
    rx: mpsc::Receiver<QueryWork>,
    tx: mpsc::Sender<QueryResult>,
    gen: Arc<AtomicU64>,
    engine: Arc<dyn CandidateEngine>,
) {
    while let Ok(work) = rx.recv() {
        // Drain: if multiple work items queued, skip to latest
        let mut latest = work;
        while let Ok(newer) = rx.try_recv() {
            latest = newer;
        }

        // Check staleness before doing work
        if latest.generation != gen.load(Ordering::SeqCst) {
            continue;
        }

        let candidates = match engine.query_candidates(&latest.query.composition) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "candidate query failed");
                Vec::new()
            }
        };

        // Check staleness after the engine call
        if latest.generation != gen.load(Ordering::SeqCst) {
            debug!(snapshot = latest.query.snapshot, "dropping superseded candidates");
            continue;
        }

        let _ = tx.send(QueryResult {
            snapshot: latest.query.snapshot,
            candidates,
        });
    }
}

fn commit_worker(
    rx: mpsc::Receiver<CommitRequest>,
    tx: mpsc::Sender<CommitResult>,
    engine: Arc<dyn CandidateEngine>,
) {
    while let Ok(request) = rx.recv() {
        let text = engine.commit_candidate(request.index);
        if text.is_none() {
            debug!(index = request.index, "engine rejected commit");
        }
        let _ = tx.send(CommitResult {
            snapshot: request.snapshot,
            text,
        });
    }
}
