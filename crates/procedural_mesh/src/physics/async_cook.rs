//! Asynchronous collision cooking services
//!
//! The mesh component submits body setups and later drains completions on its
//! own thread. A service never calls back into the component; completions are
//! pulled, so the queue of pending setups is only ever touched by its owner.
//!
//! # Services
//!
//! - [`ThreadedCookService`] - One background worker fed over a crossbeam channel
//! - [`DeferredCookService`] - Host-driven; jobs complete only when told to,
//!   in any order. Used by tools and tests that need deterministic timing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crossbeam::channel::{unbounded, Receiver, Sender};

use super::body_setup::BodySetup;
use super::cooking::{CollisionCooker, CookError, CookedCollision};

/// Identifies one submitted cook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CookTicket(u64);

impl CookTicket {
    /// Raw ticket number
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Result of one finished cook
#[derive(Debug, Clone)]
pub struct CookCompletion {
    /// Ticket returned by `submit`
    pub ticket: CookTicket,
    /// Cooked data or the failure reason
    pub result: Result<CookedCollision, CookError>,
}

/// Background cooking contract
pub trait AsyncCookService: Send {
    /// Queue a setup for cooking
    fn submit(&mut self, setup: Arc<BodySetup>) -> CookTicket;

    /// Cancel a cook that has not started yet
    ///
    /// Returns `false` if the job already started or finished; its completion
    /// will still be delivered and must be ignored by the caller.
    fn abort(&mut self, ticket: CookTicket) -> bool;

    /// Take every completion that has arrived since the last call
    fn drain_completed(&mut self) -> Vec<CookCompletion>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Queued,
    Started,
    Aborted,
}

struct CookJob {
    ticket: CookTicket,
    setup: Arc<BodySetup>,
}

/// Cooks on a dedicated worker thread
pub struct ThreadedCookService {
    sender: Option<Sender<CookJob>>,
    completions: Receiver<CookCompletion>,
    undeliverable: Vec<CookCompletion>,
    jobs: Arc<Mutex<HashMap<CookTicket, JobState>>>,
    next_ticket: u64,
    worker: Option<thread::JoinHandle<()>>,
}

impl ThreadedCookService {
    /// Spawn the worker
    pub fn new(cooker: Arc<dyn CollisionCooker>) -> Self {
        let (sender, receiver) = unbounded::<CookJob>();
        let (completion_sender, completions) = unbounded();
        let jobs = Arc::new(Mutex::new(HashMap::new()));

        let worker_jobs = Arc::clone(&jobs);
        let worker = thread::spawn(move || {
            for job in receiver.iter() {
                {
                    let mut jobs = lock(&worker_jobs);
                    if jobs.get(&job.ticket) == Some(&JobState::Aborted) {
                        jobs.remove(&job.ticket);
                        continue;
                    }
                    jobs.insert(job.ticket, JobState::Started);
                }

                let result = cooker.cook(&job.setup);
                lock(&worker_jobs).remove(&job.ticket);

                if completion_sender.send(CookCompletion { ticket: job.ticket, result }).is_err() {
                    break;
                }
            }
            log::trace!("Cook worker exiting");
        });

        Self {
            sender: Some(sender),
            completions,
            undeliverable: Vec::new(),
            jobs,
            next_ticket: 1,
            worker: Some(worker),
        }
    }

    /// Number of submitted jobs that have not finished
    pub fn in_flight(&self) -> usize {
        lock(&self.jobs)
            .values()
            .filter(|state| **state != JobState::Aborted)
            .count()
    }

    /// Abort every job the worker has not started; returns how many
    pub fn abort_queued(&mut self) -> usize {
        let mut aborted = 0;
        for state in lock(&self.jobs).values_mut() {
            if *state == JobState::Queued {
                *state = JobState::Aborted;
                aborted += 1;
            }
        }
        aborted
    }
}

impl AsyncCookService for ThreadedCookService {
    fn submit(&mut self, setup: Arc<BodySetup>) -> CookTicket {
        let ticket = CookTicket(self.next_ticket);
        self.next_ticket += 1;

        lock(&self.jobs).insert(ticket, JobState::Queued);
        let sent = self
            .sender
            .as_ref()
            .map_or(false, |sender| sender.send(CookJob { ticket, setup }).is_ok());

        if !sent {
            log::error!("Cook worker unavailable, failing cook {}", ticket.value());
            lock(&self.jobs).remove(&ticket);
            self.undeliverable.push(CookCompletion { ticket, result: Err(CookError::WorkerDisconnected) });
        }
        ticket
    }

    fn abort(&mut self, ticket: CookTicket) -> bool {
        let mut jobs = lock(&self.jobs);
        match jobs.get_mut(&ticket) {
            Some(state) if *state == JobState::Queued => {
                *state = JobState::Aborted;
                true
            }
            _ => false,
        }
    }

    fn drain_completed(&mut self) -> Vec<CookCompletion> {
        let mut completed = std::mem::take(&mut self.undeliverable);
        completed.extend(self.completions.try_iter());
        completed
    }
}

impl Drop for ThreadedCookService {
    fn drop(&mut self) {
        let skipped = self.abort_queued();
        if skipped > 0 {
            log::debug!("Dropping {} queued cooks on shutdown", skipped);
        }
        // Closing the channel ends the worker loop.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Cook worker panicked");
            }
        }
    }
}

#[derive(Default)]
struct DeferredState {
    next_ticket: u64,
    queued: Vec<(CookTicket, Arc<BodySetup>)>,
    started: HashMap<CookTicket, Arc<BodySetup>>,
    completed: Vec<CookCompletion>,
    aborted: usize,
}

/// Cook service whose jobs finish only when the host says so
///
/// Clones share the same queue, so the host keeps one handle while the
/// component owns another.
#[derive(Clone, Default)]
pub struct DeferredCookService {
    state: Arc<Mutex<DeferredState>>,
}

impl DeferredCookService {
    /// Create an empty service
    pub fn new() -> Self {
        Self::default()
    }

    /// Tickets submitted and neither aborted nor completed, oldest first
    pub fn pending_tickets(&self) -> Vec<CookTicket> {
        let state = lock(&self.state);
        let mut tickets: Vec<_> = state
            .queued
            .iter()
            .map(|(ticket, _)| *ticket)
            .chain(state.started.keys().copied())
            .collect();
        tickets.sort();
        tickets
    }

    /// The setup submitted under `ticket`, if still pending
    pub fn pending_setup(&self, ticket: CookTicket) -> Option<Arc<BodySetup>> {
        let state = lock(&self.state);
        state
            .queued
            .iter()
            .find(|(t, _)| *t == ticket)
            .map(|(_, setup)| Arc::clone(setup))
            .or_else(|| state.started.get(&ticket).cloned())
    }

    /// Mark a queued job as started; it can no longer be aborted
    pub fn start(&self, ticket: CookTicket) -> bool {
        let mut state = lock(&self.state);
        match state.queued.iter().position(|(t, _)| *t == ticket) {
            Some(pos) => {
                let (ticket, setup) = state.queued.remove(pos);
                state.started.insert(ticket, setup);
                true
            }
            None => false,
        }
    }

    /// Cook a pending job now and queue its completion
    pub fn complete(&self, ticket: CookTicket, cooker: &dyn CollisionCooker) -> bool {
        let Some(setup) = self.take_pending(ticket) else {
            return false;
        };
        let result = cooker.cook(&setup);
        lock(&self.state).completed.push(CookCompletion { ticket, result });
        true
    }

    /// Finish a pending job with a failure
    pub fn fail(&self, ticket: CookTicket, error: CookError) -> bool {
        if self.take_pending(ticket).is_none() {
            return false;
        }
        lock(&self.state).completed.push(CookCompletion { ticket, result: Err(error) });
        true
    }

    /// Complete every pending job in submission order
    pub fn complete_all(&self, cooker: &dyn CollisionCooker) -> usize {
        self.pending_tickets()
            .into_iter()
            .filter(|ticket| self.complete(*ticket, cooker))
            .count()
    }

    /// Jobs cancelled before they started
    pub fn aborted_count(&self) -> usize {
        lock(&self.state).aborted
    }

    fn take_pending(&self, ticket: CookTicket) -> Option<Arc<BodySetup>> {
        let mut state = lock(&self.state);
        if let Some(pos) = state.queued.iter().position(|(t, _)| *t == ticket) {
            return Some(state.queued.remove(pos).1);
        }
        state.started.remove(&ticket)
    }
}

impl AsyncCookService for DeferredCookService {
    fn submit(&mut self, setup: Arc<BodySetup>) -> CookTicket {
        let mut state = lock(&self.state);
        state.next_ticket += 1;
        let ticket = CookTicket(state.next_ticket);
        state.queued.push((ticket, setup));
        ticket
    }

    fn abort(&mut self, ticket: CookTicket) -> bool {
        let mut state = lock(&self.state);
        match state.queued.iter().position(|(t, _)| *t == ticket) {
            Some(pos) => {
                state.queued.remove(pos);
                state.aborted += 1;
                true
            }
            None => false,
        }
    }

    fn drain_completed(&mut self) -> Vec<CookCompletion> {
        std::mem::take(&mut lock(&self.state).completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::cooking::MeshCooker;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn drain_until(service: &mut ThreadedCookService, count: usize) -> Vec<CookCompletion> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut completions = Vec::new();
        while completions.len() < count && Instant::now() < deadline {
            completions.extend(service.drain_completed());
            thread::sleep(Duration::from_millis(1));
        }
        completions
    }

    #[test]
    fn test_threaded_service_completes_job() {
        let mut service = ThreadedCookService::new(Arc::new(MeshCooker::new()));
        let setup = Arc::new(BodySetup::new());
        let ticket = service.submit(Arc::clone(&setup));

        let completions = drain_until(&mut service, 1);
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].ticket, ticket);
        assert_eq!(completions[0].result.as_ref().unwrap().geometry_id, setup.geometry_id);
        assert_eq!(service.in_flight(), 0);
    }

    #[test]
    fn test_threaded_service_abort_after_finish_fails() {
        let mut service = ThreadedCookService::new(Arc::new(MeshCooker::new()));
        let ticket = service.submit(Arc::new(BodySetup::new()));
        let _ = drain_until(&mut service, 1);
        assert!(!service.abort(ticket));
    }

    /// Blocks inside `cook` until the test opens the gate
    struct GatedCooker {
        started: Sender<()>,
        gate: Receiver<()>,
        cooks: AtomicUsize,
    }

    impl CollisionCooker for GatedCooker {
        fn cook(&self, setup: &BodySetup) -> Result<CookedCollision, CookError> {
            self.cooks.fetch_add(1, Ordering::SeqCst);
            let _ = self.started.send(());
            let _ = self.gate.recv();
            MeshCooker::new().cook(setup)
        }
    }

    #[test]
    fn test_threaded_shutdown_skips_queued_jobs() {
        let (started_tx, started_rx) = unbounded();
        let (gate_tx, gate_rx) = unbounded();
        let cooker = Arc::new(GatedCooker { started: started_tx, gate: gate_rx, cooks: AtomicUsize::new(0) });
        let mut service = ThreadedCookService::new(cooker.clone());

        service.submit(Arc::new(BodySetup::new()));
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        service.submit(Arc::new(BodySetup::new()));
        service.submit(Arc::new(BodySetup::new()));

        assert_eq!(service.abort_queued(), 2);
        assert_eq!(service.in_flight(), 1);

        gate_tx.send(()).unwrap();
        drop(service);
        assert_eq!(cooker.cooks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deferred_abort_only_before_start() {
        let mut service = DeferredCookService::new();
        let first = service.submit(Arc::new(BodySetup::new()));
        let second = service.submit(Arc::new(BodySetup::new()));

        assert!(service.start(first));
        assert!(!service.abort(first));
        assert!(service.abort(second));
        assert_eq!(service.pending_tickets(), vec![first]);
        assert_eq!(service.aborted_count(), 1);
    }

    #[test]
    fn test_deferred_completes_out_of_order() {
        let mut service = DeferredCookService::new();
        let first = service.submit(Arc::new(BodySetup::new()));
        let second = service.submit(Arc::new(BodySetup::new()));

        assert!(service.complete(second, &MeshCooker::new()));
        assert!(service.fail(first, CookError::WorkerDisconnected));

        let completions = service.drain_completed();
        assert_eq!(completions.len(), 2);
        assert_eq!(completions[0].ticket, second);
        assert!(completions[0].result.is_ok());
        assert_eq!(completions[1].ticket, first);
        assert!(completions[1].result.is_err());
        assert!(service.drain_completed().is_empty());
    }

    #[test]
    fn test_deferred_clones_share_queue() {
        let mut component_side = DeferredCookService::new();
        let host_side = component_side.clone();
        let ticket = component_side.submit(Arc::new(BodySetup::new()));
        assert_eq!(host_side.pending_tickets(), vec![ticket]);
        assert_eq!(host_side.complete_all(&MeshCooker::new()), 1);
        assert_eq!(component_side.drain_completed().len(), 1);
    }
}
