use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use crate::error::ServiceError;
use crate::flow::{Job, JobOutcome, Ticket};
use crate::service::BlueprintService;

/// Runs service calls on short-lived worker threads and hands results back to the UI thread.
pub struct JobRunner {
    service: Arc<dyn BlueprintService>,
    tx: Sender<(Ticket, JobOutcome)>,
    rx: Receiver<(Ticket, JobOutcome)>,
    in_flight: usize,
}

impl JobRunner {
    pub fn new(service: Arc<dyn BlueprintService>) -> Self {
        let (tx, rx) = channel();
        Self {
            service,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn dispatch(&mut self, ticket: Ticket, job: Job) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let kind = job.kind();
        self.in_flight += 1;

        let spawned = thread::Builder::new()
            .name(format!("blueprint-{kind}"))
            .spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| job.run(service.as_ref())))
                    .unwrap_or_else(|_| {
                        JobOutcome::failed(kind, ServiceError::Worker("worker panicked".to_string()))
                    });
                if tx.send((ticket, outcome)).is_err() {
                    tracing::debug!(%kind, "result dropped, receiver gone");
                }
            });

        if let Err(err) = spawned {
            tracing::error!(%err, %kind, "could not spawn worker");
            let outcome = JobOutcome::failed(kind, ServiceError::Worker(err.to_string()));
            if self.tx.send((ticket, outcome)).is_err() {
                self.in_flight -= 1;
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<(Ticket, JobOutcome)> {
        match self.rx.try_recv() {
            Ok(result) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(result)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}
