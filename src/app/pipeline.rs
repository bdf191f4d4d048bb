use crate::diff::{Collection, DiffMap};
use anyhow::Result;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};

/// Completed-but-undrained results that may queue up before a worker blocks
pub const QUEUE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Collection,
    Diff,
    Highlight,
}

impl ResultKind {
    fn index(self) -> usize {
        match self {
            ResultKind::Collection => 0,
            ResultKind::Diff => 1,
            ResultKind::Highlight => 2,
        }
    }
}

/// The outcome of one background computation
pub enum AsyncResult {
    Collection(Result<Collection>),
    Diff(Result<DiffMap>),
    Highlight(Result<()>),
}

impl AsyncResult {
    /// A failed result of `kind`
    fn failed(kind: ResultKind, err: anyhow::Error) -> Self {
        match kind {
            ResultKind::Collection => AsyncResult::Collection(Err(err)),
            ResultKind::Diff => AsyncResult::Diff(Err(err)),
            ResultKind::Highlight => AsyncResult::Highlight(Err(err)),
        }
    }

    pub fn kind(&self) -> ResultKind {
        match self {
            AsyncResult::Collection(_) => ResultKind::Collection,
            AsyncResult::Diff(_) => ResultKind::Diff,
            AsyncResult::Highlight(_) => ResultKind::Highlight,
        }
    }
}

struct Envelope {
    generation: u64,
    result: AsyncResult,
}

/// Wakes the main thread; callable from any thread
#[derive(Clone)]
pub struct Waker {
    tx: Sender<()>,
}

impl Waker {
    pub fn channel() -> (Self, Receiver<()>) {
        let (tx, rx) = mpsc::channel();
        (Waker { tx }, rx)
    }

    pub fn wake(&self) {
        // A dropped receiver means the event loop is gone; nothing to wake
        let _ = self.tx.send(());
    }
}

/// Bounded queue of results fed by fire-and-forget worker threads.
///
/// Every submission gets a fresh generation and becomes the latest job of
/// its kind. Results from an older generation of the same kind are dropped
/// unseen when popped, so at most one job per kind is ever effective.
pub struct Pipeline {
    tx: SyncSender<Envelope>,
    rx: Receiver<Envelope>,
    waker: Waker,
    next_generation: u64,
    latest: [Option<u64>; 3],
    outstanding: [bool; 3],
}

impl Pipeline {
    pub fn new(waker: Waker) -> Self {
        let (tx, rx) = mpsc::sync_channel(QUEUE_CAPACITY);
        Pipeline {
            tx,
            rx,
            waker,
            next_generation: 0,
            latest: [None; 3],
            outstanding: [false; 3],
        }
    }

    pub fn submit_collection<F>(&mut self, work: F) -> u64
    where
        F: FnOnce() -> Result<Collection> + Send + 'static,
    {
        self.spawn(ResultKind::Collection, move || AsyncResult::Collection(work()))
    }

    pub fn submit_diff<F>(&mut self, work: F) -> u64
    where
        F: FnOnce() -> Result<DiffMap> + Send + 'static,
    {
        self.spawn(ResultKind::Diff, move || AsyncResult::Diff(work()))
    }

    fn spawn<F>(&mut self, kind: ResultKind, work: F) -> u64
    where
        F: FnOnce() -> AsyncResult + Send + 'static,
    {
        let generation = self.next_generation;
        self.next_generation += 1;
        if self.outstanding[kind.index()] {
            log::debug!("superseding outstanding {:?} job with generation {}", kind, generation);
        }
        self.latest[kind.index()] = Some(generation);
        self.outstanding[kind.index()] = true;

        let tx = self.tx.clone();
        let waker = self.waker.clone();
        std::thread::spawn(move || {
            // A panicking worker still reports back, as an error
            let result = panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                log::error!("{:?} worker panicked: {}", kind, message);
                AsyncResult::failed(kind, anyhow::anyhow!("{:?} worker panicked: {}", kind, message))
            });
            // Only this worker blocks if the queue is full, never the main thread
            if tx.send(Envelope { generation, result }).is_ok() {
                waker.wake();
            }
        });
        generation
    }

    /// Whether the latest job of `kind` has a result not yet popped
    pub fn is_outstanding(&self, kind: ResultKind) -> bool {
        self.outstanding[kind.index()]
    }

    /// Pop the next current result without blocking, discarding superseded ones
    pub fn try_next(&mut self) -> Option<AsyncResult> {
        loop {
            let envelope = self.rx.try_recv().ok()?;
            let kind = envelope.result.kind();
            if self.latest[kind.index()] != Some(envelope.generation) {
                log::debug!(
                    "dropping stale {:?} result from generation {}",
                    kind,
                    envelope.generation
                );
                continue;
            }
            self.outstanding[kind.index()] = false;
            return Some(envelope.result);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
