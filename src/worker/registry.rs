//! The identity-to-worker registry.
//!
//! The only state shared across conversations. Every check-and-act sequence
//! (spawn-if-absent, stop-if-present) runs under one lock so that at most one
//! live worker exists per conversation identity at any time.

use super::chat_worker::{ChatWorker, WorkerContext};
use super::event::{ChatProfile, ConversationId, Envelope, InboundUpdate, StopSignal};
use super::mailbox::{mailbox, MailboxSender};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Handle to one live worker: its mailbox plus the join handle `stop` awaits.
struct WorkerHandle {
    sender: MailboxSender,
    generation: u64,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerHandle {
    /// Wait for the worker task to exit. Only the first caller observes the
    /// join; later callers return once the handle has been taken.
    async fn join(&self) {
        let join = { self.join.lock().await.take() };
        if let Some(join) = join {
            if let Err(err) = join.await {
                error!(error = %err, "worker task ended abnormally");
            }
        }
    }
}

type WorkerMap = Mutex<HashMap<ConversationId, Arc<WorkerHandle>>>;

/// Registry of running conversation workers, keyed by conversation identity.
pub struct WorkerRegistry {
    workers: Arc<WorkerMap>,
    context: WorkerContext,
    generations: AtomicU64,
}

impl WorkerRegistry {
    /// Create an empty registry whose workers share `context`.
    #[must_use]
    pub fn new(context: WorkerContext) -> Arc<Self> {
        Arc::new(Self {
            workers: Arc::new(Mutex::new(HashMap::new())),
            context,
            generations: AtomicU64::new(0),
        })
    }

    /// Route an inbound update to its conversation's worker.
    ///
    /// Spawns and registers a new worker when none is running for the
    /// update's identity; the update is then delivered as that worker's first
    /// input. Per identity, delivery order follows call order.
    pub async fn route_event(&self, update: InboundUpdate) {
        let id = update.conversation();
        let mut workers = self.workers.lock().await;
        if let Some(handle) = workers.get(&id) {
            if handle.sender.put(Envelope::Update(update.clone())) {
                return;
            }
            // The worker terminated but has not deregistered yet; replace it.
            debug!(chat = %id, "replacing a finished worker");
            workers.remove(&id);
        }
        let handle = self.spawn(update.chat.clone());
        if !handle.sender.put(Envelope::Update(update)) {
            error!(chat = %id, "new worker dropped its mailbox before the first event");
        }
        workers.insert(id, handle);
    }

    /// Ask `id`'s worker to stop and wait until it has fully terminated.
    ///
    /// The worker is deregistered before this returns. No-op when no worker
    /// is registered for `id`.
    pub async fn stop(&self, id: ConversationId, reason: Option<String>) {
        let handle = { self.workers.lock().await.get(&id).cloned() };
        let Some(handle) = handle else { return };
        if !handle.sender.put(Envelope::Stop(StopSignal { reason })) {
            debug!(chat = %id, "worker already finished before the stop signal");
        }
        handle.join().await;
    }

    /// Stop every running worker, waiting for each to terminate.
    pub async fn stop_all(&self, reason: Option<&str>) {
        let ids: Vec<ConversationId> = { self.workers.lock().await.keys().copied().collect() };
        for id in ids {
            self.stop(id, reason.map(str::to_owned)).await;
        }
    }

    /// Whether a worker is currently registered for `id`.
    pub async fn contains(&self, id: ConversationId) -> bool {
        self.workers.lock().await.contains_key(&id)
    }

    /// Number of active conversations.
    pub async fn len(&self) -> usize {
        self.workers.lock().await.len()
    }

    /// Whether no conversations are active.
    pub async fn is_empty(&self) -> bool {
        self.workers.lock().await.is_empty()
    }

    /// Spawn a worker task for `chat` and hand back its handle.
    ///
    /// Callers must hold the registry lock: registering the returned handle
    /// has to be atomic with the existence check that preceded it. The task
    /// deregisters itself when the conversation ends, whatever ended it.
    fn spawn(&self, chat: ChatProfile) -> Arc<WorkerHandle> {
        let id = chat.id;
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let (sender, inbox) = mailbox();
        let worker = ChatWorker::new(chat, inbox, &self.context);
        let workers = Arc::clone(&self.workers);
        let join = tokio::spawn(async move {
            worker.run_to_completion().await;
            deregister(&workers, id, generation).await;
        });
        info!(chat = %id, "spawned conversation worker");
        Arc::new(WorkerHandle {
            sender,
            generation,
            join: Mutex::new(Some(join)),
        })
    }
}

/// Drop `id`'s registration if it still belongs to `generation`.
///
/// The guard keeps a dying worker from deregistering a newer one that already
/// took over the identity.
async fn deregister(workers: &WorkerMap, id: ConversationId, generation: u64) {
    let mut workers = workers.lock().await;
    if workers
        .get(&id)
        .is_some_and(|handle| handle.generation == generation)
    {
        workers.remove(&id);
        debug!(chat = %id, "worker deregistered");
    }
}
