//! Bounded worker pool for jobs
//!
//! The scheduler runs at most `workers` jobs at a time under one shared
//! [`Scope`]. Status messages from every job go through a single relay task,
//! started before the first job and awaited once the last job has finished.
//! A failing job never stops the others; an ended scope stops new jobs from
//! starting but keeps every job that already ran.

use crate::job::{Job, StatusEvent, StatusSender, status_channel};
use crate::logger::Logger;
use crate::process::Scope;
use futures::stream::{self, StreamExt};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;

/// Destination for relayed status events
pub trait StatusSink: Send + Sync {
    fn publish(&self, event: &StatusEvent, done: usize, total: usize);
}

impl StatusSink for Logger {
    fn publish(&self, event: &StatusEvent, done: usize, total: usize) {
        self.progress(done, total, &event.label, &event.message);
    }
}

/// Completion counter for one scheduling run
#[derive(Debug)]
pub struct Progress {
    total: usize,
    done: Mutex<usize>,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            done: Mutex::new(0),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn done(&self) -> usize {
        self.done.lock().map(|done| *done).unwrap_or(0)
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.done())
    }

    fn complete_one(&self) {
        if let Ok(mut done) = self.done.lock() {
            *done += 1;
        }
    }
}

pub struct Scheduler {
    workers: usize,
    sink: Arc<dyn StatusSink>,
}

impl Scheduler {
    pub fn new(workers: usize) -> Self {
        Self::with_sink(workers, Arc::new(Logger))
    }

    pub fn with_sink(workers: usize, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            workers: workers.max(1),
            sink,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `jobs` and return the ones that were started, in submission order
    pub async fn schedule(&self, jobs: Vec<Box<dyn Job>>, scope: &Scope) -> Vec<Box<dyn Job>> {
        if jobs.is_empty() {
            return Vec::new();
        }

        let progress = Arc::new(Progress::new(jobs.len()));
        let (tx, rx) = status_channel();
        let relay = tokio::spawn(relay_status(rx, Arc::clone(&progress), Arc::clone(&self.sink)));

        let mut finished: Vec<(usize, Box<dyn Job>)> = stream::iter(jobs.into_iter().enumerate())
            .map(|(index, mut job)| {
                let tx = tx.clone();
                let progress = Arc::clone(&progress);
                async move {
                    if scope.is_done() {
                        return None;
                    }

                    let sender = StatusSender::new(job.id(), job.label().to_string(), tx);
                    job.base_mut().attach_status(sender);
                    job.run(scope).await;

                    progress.complete_one();
                    let criticals = job.errors().get_critical_errors().len();
                    if criticals == 0 {
                        job.base().send_status("Finished");
                    } else {
                        job.base()
                            .send_status(format!("Failed with {criticals} critical error(s)"));
                    }
                    job.base_mut().detach_status();

                    Some((index, job))
                }
            })
            .buffer_unordered(self.workers)
            .filter_map(futures::future::ready)
            .collect()
            .await;

        drop(tx);
        let _ = relay.await;

        finished.sort_by_key(|(index, _)| *index);
        finished.into_iter().map(|(_, job)| job).collect()
    }
}

async fn relay_status(
    mut rx: UnboundedReceiver<StatusEvent>,
    progress: Arc<Progress>,
    sink: Arc<dyn StatusSink>,
) {
    while let Some(event) = rx.recv().await {
        sink.publish(&event, progress.done(), progress.total());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobBase, JobError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct SleepJob {
        base: JobBase,
        sleep: Duration,
        fail: bool,
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl SleepJob {
        fn new(name: &str, fail: bool, running: &Arc<AtomicUsize>, peak: &Arc<AtomicUsize>) -> Self {
            Self {
                base: JobBase::new(name, format!("/work/{name}"), Vec::new()),
                sleep: Duration::from_millis(20),
                fail,
                running: Arc::clone(running),
                peak: Arc::clone(peak),
            }
        }
    }

    #[async_trait]
    impl Job for SleepJob {
        fn base(&self) -> &JobBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut JobBase {
            &mut self.base
        }

        async fn run(&mut self, _scope: &Scope) {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.base.send_status("working");
            tokio::time::sleep(self.sleep).await;
            if self.fail {
                self.base.errors_mut().critical(JobError::new("boom"));
            }
            self.running.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<StatusEvent>>,
    }

    impl StatusSink for RecordingSink {
        fn publish(&self, event: &StatusEvent, _done: usize, _total: usize) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn jobs(count: usize, fail_every: usize) -> (Vec<Box<dyn Job>>, Arc<AtomicUsize>) {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let jobs = (0..count)
            .map(|i| {
                let fail = fail_every != 0 && i % fail_every == 0;
                Box::new(SleepJob::new(&format!("job{i}"), fail, &running, &peak)) as Box<dyn Job>
            })
            .collect();
        (jobs, peak)
    }

    #[tokio::test]
    async fn test_schedule_empty() {
        let scheduler = Scheduler::with_sink(2, Arc::new(RecordingSink::default()));
        assert!(scheduler.schedule(Vec::new(), &Scope::new()).await.is_empty());
        assert!(scheduler.schedule(Vec::new(), &Scope::new()).await.is_empty());
    }

    #[tokio::test]
    async fn test_schedule_keeps_order_and_isolates_failures() {
        let scheduler = Scheduler::with_sink(3, Arc::new(RecordingSink::default()));
        let (jobs, _) = jobs(6, 2);

        let done = scheduler.schedule(jobs, &Scope::new()).await;
        assert_eq!(done.len(), 6);
        for (i, job) in done.iter().enumerate() {
            assert_eq!(job.label(), format!("job{i}"));
            assert_eq!(job.errors().has_error(), i % 2 == 0);
        }
    }

    #[tokio::test]
    async fn test_schedule_respects_worker_bound() {
        let scheduler = Scheduler::with_sink(2, Arc::new(RecordingSink::default()));
        let (jobs, peak) = jobs(8, 0);

        scheduler.schedule(jobs, &Scope::new()).await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_schedule_relays_every_status() {
        let sink = Arc::new(RecordingSink::default());
        let scheduler = Scheduler::with_sink(2, sink.clone());
        let (jobs, _) = jobs(3, 0);

        scheduler.schedule(jobs, &Scope::new()).await;
        let events = sink.events.lock().unwrap();
        assert_eq!(events.iter().filter(|e| e.message == "working").count(), 3);
        assert_eq!(events.iter().filter(|e| e.message == "Finished").count(), 3);
    }

    #[tokio::test]
    async fn test_schedule_with_ended_scope_starts_nothing() {
        let scheduler = Scheduler::with_sink(2, Arc::new(RecordingSink::default()));
        let (jobs, _) = jobs(4, 0);
        let scope = Scope::new();
        scope.cancel();

        let done = scheduler.schedule(jobs, &scope).await;
        assert!(done.is_empty());
    }

    #[test]
    fn test_progress_counter() {
        let progress = Progress::new(3);
        progress.complete_one();
        assert_eq!(progress.done(), 1);
        assert_eq!(progress.remaining(), 2);
    }
}
