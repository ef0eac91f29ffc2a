//! Active-object pipeline: MST → SCC → HAMILTON → MAXCLIQUE.
//!
//! Every stage is one persistent thread draining its own [`BlockingQueue`].
//! A job becomes visible to stage N+1 only when stage N pushes it, which
//! orders the stages of a single job without any lock on the job itself.
//! The last stage assembles the reply and completes the job's latch.

use std::os::unix::net::{UnixListener, UnixStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use graphd_algorithms::run_guarded;
use graphd_concurrent::{BlockingQueue, QueueError};
use graphd_core::protocol::error_reply;
use graphd_core::AlgorithmKind;
use parking_lot::Mutex;
use tracing::{debug, debug_span, error, info, info_span, warn};

use crate::connection::{self, read_request};
use crate::error::{Result, ServerError};
use crate::job::Job;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

type JobQueue = BlockingQueue<Arc<Job>>;
type StageWork = Box<dyn Fn(&Job) + Send + Sync>;

/// One step of the chain.
pub struct Stage {
    name: String,
    algorithm: Option<AlgorithmKind>,
    work: StageWork,
}

impl Stage {
    /// Runs `kind` on the matching twin and records the result in the job.
    pub fn algorithm(kind: AlgorithmKind) -> Self {
        Self {
            name: kind.tag().to_string(),
            algorithm: Some(kind),
            work: Box::new(move |job: &Job| {
                job.record(kind, run_guarded(kind, job.graph(kind)));
            }),
        }
    }

    /// A stage that contributes no section to the reply.
    pub fn custom<F>(name: impl Into<String>, work: F) -> Self
    where
        F: Fn(&Job) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            algorithm: None,
            work: Box::new(work),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

pub struct Pipeline {
    queues: Vec<Arc<JobQueue>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Pipeline {
    /// The four-stage suite in [`AlgorithmKind::SUITE`] order.
    pub fn standard() -> Result<Self> {
        Self::with_stages(AlgorithmKind::SUITE.into_iter().map(Stage::algorithm).collect())
    }

    pub fn with_stages(stages: Vec<Stage>) -> Result<Self> {
        if stages.is_empty() {
            return Err(ServerError::Config("pipeline needs at least one stage".into()));
        }

        let sections: Arc<[AlgorithmKind]> =
            stages.iter().filter_map(|stage| stage.algorithm).collect();
        let queues: Vec<Arc<JobQueue>> =
            stages.iter().map(|_| Arc::new(JobQueue::new())).collect();

        let mut workers = Vec::with_capacity(stages.len());
        for (index, stage) in stages.into_iter().enumerate() {
            let input = queues[index].clone();
            let next = queues.get(index + 1).cloned();
            let sections = sections.clone();
            let worker = thread::Builder::new()
                .name(format!("graphd-stage-{}", stage.name.to_lowercase()))
                .spawn(move || stage_loop(stage, &input, next.as_deref(), &sections))?;
            workers.push(worker);
        }
        info!("Pipeline started with {} stages", queues.len());

        Ok(Self {
            queues,
            workers: Mutex::new(workers),
        })
    }

    /// Enqueues `job` at the head of the chain. Fails once shut down.
    pub fn submit(&self, job: Arc<Job>) -> std::result::Result<(), QueueError<Arc<Job>>> {
        self.queues[0].push(job)
    }

    pub fn stage_count(&self) -> usize {
        self.queues.len()
    }

    /// Closes the stages front to back, joining each before closing the
    /// next, so every job already accepted still reaches the end.
    pub fn shutdown(&self) -> Result<()> {
        let workers: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        if workers.is_empty() {
            return Ok(());
        }

        let mut panicked = false;
        for (queue, worker) in self.queues.iter().zip(workers) {
            queue.close();
            panicked |= worker.join().is_err();
        }
        info!("Pipeline stopped");
        if panicked {
            return Err(ServerError::ThreadPanicked("pipeline stage"));
        }
        Ok(())
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            error!("pipeline shutdown: {}", err);
        }
    }
}

fn stage_loop(stage: Stage, input: &JobQueue, next: Option<&JobQueue>, sections: &[AlgorithmKind]) {
    while let Some(job) = input.pop() {
        let span = debug_span!("stage", stage = %stage.name, job_id = job.id());
        let _entered = span.enter();
        debug!("start");

        if panic::catch_unwind(AssertUnwindSafe(|| (stage.work)(&job))).is_err() {
            error!("stage panicked; job continues without its result");
        }
        debug!("end");

        match next {
            Some(queue) => {
                if let Err(err) = queue.push(job) {
                    let job = err.into_inner();
                    warn!("next stage is closed, abandoning job");
                    job.complete(error_reply(&"server is shutting down"));
                }
            }
            None => {
                job.complete(job.assemble_reply(sections));
            }
        }
    }
    debug!(stage = %stage.name, "stage exiting");
}

/// Connection task: submits the job and blocks until the last stage completes it.
pub fn handle_connection(pipeline: &Pipeline, mut stream: UnixStream) {
    let text = match read_request(&mut stream) {
        Ok(text) => text,
        Err(err) => {
            warn!("failed to read request: {}", err);
            return;
        }
    };
    let reply = match Job::from_request_text(&text) {
        Ok(job) => {
            let job = Arc::new(job);
            let span = info_span!("job", job_id = job.id());
            let _entered = span.enter();
            info!("submitting {:?}", job.request());
            match pipeline.submit(job.clone()) {
                Ok(()) => job
                    .wait_reply()
                    .unwrap_or_else(|| error_reply(&"job finished without a reply")),
                Err(err) => error_reply(&err),
            }
        }
        Err(err) => {
            debug!("rejected request {:?}: {}", text.trim(), err);
            err.reply()
        }
    };
    if let Err(err) = connection::send(&mut stream, &reply) {
        warn!("failed to send reply: {}", err);
    }
}

/// Accept loop; one short-lived thread per connection.
pub fn serve(
    listener: UnixListener,
    pipeline: Arc<Pipeline>,
    shutdown: Arc<AtomicBool>,
    read_timeout: Duration,
) {
    let mut connections: Vec<JoinHandle<()>> = Vec::new();
    for incoming in listener.incoming() {
        if shutdown.load(Ordering::Acquire) {
            break;
        }
        match incoming {
            Ok(stream) => {
                connections.retain(|connection| !connection.is_finished());
                let pipeline = pipeline.clone();
                let stream = connection::accepted(stream, read_timeout);
                let spawned = thread::Builder::new()
                    .name("graphd-connection".into())
                    .spawn(move || handle_connection(&pipeline, stream));
                match spawned {
                    Ok(connection) => connections.push(connection),
                    Err(err) => error!("failed to spawn connection thread: {}", err),
                }
            }
            Err(err) => {
                warn!("accept failed: {}", err);
                thread::sleep(ACCEPT_BACKOFF);
            }
        }
    }
    for connection in connections {
        if connection.join().is_err() {
            error!("connection thread panicked");
        }
    }
    debug!("pipeline acceptor exiting");
}
