//! Leader-follower worker pool.
//!
//! Workers take turns holding the [`LeaderToken`]. The leader performs one
//! blocking `accept`, hands leadership to the next follower right away, and
//! then processes the connection itself. Accepting the next client therefore
//! never waits on the current client's algorithms.
//!
//! Per connection the four suite algorithms run concurrently, each on its own
//! copy of its graph, and stream their sections back as they finish under the
//! connection's send lock.

use std::os::unix::net::{UnixListener, UnixStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use graphd_algorithms::{catch_failure, AlgorithmError};
use graphd_concurrent::LeaderToken;
use graphd_core::protocol::{done_line, section};
use graphd_core::{AlgorithmKind, Graph};
use tracing::{debug, error, info, info_span, warn};

use crate::connection::{self, read_request, SharedWriter};
use crate::error::{Result, ServerError};
use crate::job::Job;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

pub struct LeaderFollowerPool {
    token: Arc<LeaderToken>,
    workers: Vec<JoinHandle<()>>,
}

impl LeaderFollowerPool {
    pub fn spawn(
        listener: Arc<UnixListener>,
        size: usize,
        shutdown: Arc<AtomicBool>,
        read_timeout: Duration,
    ) -> Result<Self> {
        Self::spawn_with_handler(listener, size, shutdown, read_timeout, handle_connection)
    }

    /// Pool whose workers hand every accepted stream to `handler`.
    pub fn spawn_with_handler<H>(
        listener: Arc<UnixListener>,
        size: usize,
        shutdown: Arc<AtomicBool>,
        read_timeout: Duration,
        handler: H,
    ) -> Result<Self>
    where
        H: Fn(UnixStream) + Send + Sync + 'static,
    {
        if size == 0 {
            return Err(ServerError::Config("worker pool needs at least one worker".into()));
        }

        let token = Arc::new(LeaderToken::new());
        let handler = Arc::new(handler);
        let mut workers = Vec::with_capacity(size);
        for index in 0..size {
            let (listener, token, shutdown, handler) = (
                listener.clone(),
                token.clone(),
                shutdown.clone(),
                handler.clone(),
            );
            let worker = thread::Builder::new()
                .name(format!("graphd-lf-{}", index))
                .spawn(move || {
                    worker_loop(index, &listener, &token, &shutdown, read_timeout, &*handler)
                })?;
            workers.push(worker);
        }
        info!("Leader-follower pool started with {} workers", size);
        Ok(Self { token, workers })
    }

    /// Wakes every follower; they exit instead of waiting for leadership.
    /// The current leader still has to be woken out of `accept`.
    pub fn close(&self) {
        self.token.close();
    }

    pub fn join(self) -> Result<()> {
        let mut panicked = false;
        for worker in self.workers {
            panicked |= worker.join().is_err();
        }
        if panicked {
            return Err(ServerError::ThreadPanicked("leader-follower worker"));
        }
        Ok(())
    }
}

fn worker_loop<H>(
    index: usize,
    listener: &UnixListener,
    token: &LeaderToken,
    shutdown: &AtomicBool,
    read_timeout: Duration,
    handler: &H,
) where
    H: Fn(UnixStream) + ?Sized,
{
    while let Some(leadership) = token.acquire() {
        if shutdown.load(Ordering::Acquire) {
            break;
        }
        debug!(worker = index, "leading");
        let accepted = listener.accept();
        // promote a follower before doing any work
        drop(leadership);

        match accepted {
            Ok((stream, _)) => {
                if shutdown.load(Ordering::Acquire) {
                    break;
                }
                debug!(worker = index, "processing connection");
                let stream = connection::accepted(stream, read_timeout);
                // a panicking connection must not cost the pool a worker
                if panic::catch_unwind(AssertUnwindSafe(|| handler(stream))).is_err() {
                    error!(worker = index, "connection handler panicked");
                }
            }
            Err(err) => {
                warn!(worker = index, "accept failed: {}", err);
                thread::sleep(ACCEPT_BACKOFF);
            }
        }
    }
    debug!(worker = index, "worker exiting");
}

/// Runs the four suite algorithms concurrently and streams each section as it completes.
pub fn handle_connection(stream: UnixStream) {
    handle_connection_with(stream, graphd_algorithms::run)
}

/// [`handle_connection`] with a custom per-algorithm runner. A runner that
/// fails or panics turns into an `ERROR:` section for its algorithm only.
pub fn handle_connection_with<R>(mut stream: UnixStream, runner: R)
where
    R: Fn(AlgorithmKind, &Graph) -> std::result::Result<String, AlgorithmError> + Sync,
{
    let text = match read_request(&mut stream) {
        Ok(text) => text,
        Err(err) => {
            warn!("failed to read request: {}", err);
            return;
        }
    };
    let job = match Job::from_request_text(&text) {
        Ok(job) => job,
        Err(err) => {
            debug!("rejected request {:?}: {}", text.trim(), err);
            if let Err(err) = connection::send(&mut stream, &err.reply()) {
                warn!("failed to send error reply: {}", err);
            }
            return;
        }
    };

    let span = info_span!("job", job_id = job.id());
    let _entered = span.enter();
    info!("processing {:?}", job.request());

    let writer = SharedWriter::new(stream);
    let header = format!(
        "{}=== Running {} algorithms (leader-follower) ===\n",
        job.header(),
        AlgorithmKind::SUITE.len()
    );
    if let Err(err) = writer.send(&header) {
        warn!("client went away: {}", err);
        return;
    }

    thread::scope(|scope| {
        for kind in AlgorithmKind::SUITE {
            let (job, writer, runner, span) = (&job, &writer, &runner, span.clone());
            scope.spawn(move || {
                let _entered = span.enter();
                let graph = job.graph(kind).clone();
                job.record(kind, catch_failure(|| runner(kind, &graph)));
                let body = job.result(kind).unwrap_or_default();
                if let Err(err) = writer.send(&section(kind, body)) {
                    warn!(algorithm = %kind, "failed to send section: {}", err);
                }
            });
        }
    });

    if let Err(err) = writer.send(&done_line()) {
        warn!("failed to send sentinel: {}", err);
    }
    info!("connection complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::Shutdown;
    use std::sync::mpsc;
    use std::sync::Barrier;

    const READ_TIMEOUT: Duration = Duration::from_secs(5);

    fn ask(path: &std::path::Path, request: &str) -> String {
        let mut client = UnixStream::connect(path).unwrap();
        client.write_all(request.as_bytes()).unwrap();
        client.shutdown(Shutdown::Write).unwrap();
        let mut reply = String::new();
        client.read_to_string(&mut reply).unwrap();
        reply
    }

    fn stop(pool: LeaderFollowerPool, shutdown: &AtomicBool, path: &std::path::Path) {
        shutdown.store(true, Ordering::Release);
        pool.close();
        let _ = UnixStream::connect(path);
        pool.join().unwrap();
    }

    #[test]
    fn next_accept_does_not_wait_for_processing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lf.sock");
        let listener = Arc::new(UnixListener::bind(&path).unwrap());
        let shutdown = Arc::new(AtomicBool::new(false));

        let (accepted_tx, accepted_rx) = mpsc::channel();
        let release = Arc::new(Barrier::new(3));
        let handler = {
            let release = release.clone();
            move |_stream: UnixStream| {
                accepted_tx.send(()).unwrap();
                release.wait();
            }
        };
        let pool = LeaderFollowerPool::spawn_with_handler(
            listener,
            2,
            shutdown.clone(),
            READ_TIMEOUT,
            handler,
        )
        .unwrap();

        let _first = UnixStream::connect(&path).unwrap();
        accepted_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        // the first worker is parked in its handler; the second must still accept
        let _second = UnixStream::connect(&path).unwrap();
        accepted_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        release.wait();
        stop(pool, &shutdown, &path);
    }

    #[test]
    fn streams_all_suite_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lf.sock");
        let listener = Arc::new(UnixListener::bind(&path).unwrap());
        let shutdown = Arc::new(AtomicBool::new(false));
        let pool = LeaderFollowerPool::spawn(listener, 2, shutdown.clone(), READ_TIMEOUT).unwrap();

        let reply = ask(&path, "-a MST -v 5 -e 6 -s 3");

        assert!(reply.starts_with("=== Random Graphs (seed=3, V=5, E=6) ===\n"));
        assert!(reply.contains("=== Running 4 algorithms (leader-follower) ===\n"));
        for kind in AlgorithmKind::SUITE {
            assert_eq!(reply.matches(&format!("[{}]\n", kind)).count(), 1, "{}", kind);
        }
        assert!(!reply.contains("[EULERIAN]"));
        assert!(reply.ends_with("=== DONE ===\n"));

        stop(pool, &shutdown, &path);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let listener = Arc::new(UnixListener::bind(dir.path().join("lf.sock")).unwrap());
        let result =
            LeaderFollowerPool::spawn(listener, 0, Arc::new(AtomicBool::new(false)), READ_TIMEOUT);
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[test]
    fn failing_algorithm_becomes_an_error_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lf.sock");
        let listener = Arc::new(UnixListener::bind(&path).unwrap());
        let shutdown = Arc::new(AtomicBool::new(false));
        let handler = |stream: UnixStream| {
            handle_connection_with(stream, |kind, graph: &Graph| match kind {
                AlgorithmKind::Scc => panic!("scc exploded"),
                AlgorithmKind::Hamilton => Err(AlgorithmError::IncompleteCircuit { used: 1, total: 2 }),
                _ => graphd_algorithms::run(kind, graph),
            })
        };
        let pool =
            LeaderFollowerPool::spawn_with_handler(listener, 1, shutdown.clone(), READ_TIMEOUT, handler)
                .unwrap();

        let reply = ask(&path, "-a MST -v 5 -e 6 -s 3");
        assert!(reply.contains("[SCC]\nERROR: scc exploded\n"), "{}", reply);
        assert!(reply.contains("[HAMILTON]\nERROR: circuit walk used 1 of 2 edges\n"));
        assert!(reply.contains("[MST]\nMinimum Spanning Tree"));
        assert!(reply.contains("[MAXCLIQUE]\nMaximum clique size: "));
        assert!(reply.ends_with("=== DONE ===\n"));

        // the same single worker keeps serving
        let again = ask(&path, "-a MST -v 4 -e 3 -s 1");
        assert!(again.ends_with("=== DONE ===\n"));

        stop(pool, &shutdown, &path);
    }

    #[test]
    fn panicking_handler_keeps_the_worker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lf.sock");
        let listener = Arc::new(UnixListener::bind(&path).unwrap());
        let shutdown = Arc::new(AtomicBool::new(false));
        let handler = |stream: UnixStream| {
            let mut text = String::new();
            (&stream).read_to_string(&mut text).unwrap();
            if text == "boom" {
                panic!("handler blew up");
            }
            (&stream).write_all(b"ok").unwrap();
        };
        let pool =
            LeaderFollowerPool::spawn_with_handler(listener, 1, shutdown.clone(), READ_TIMEOUT, handler)
                .unwrap();

        assert_eq!(ask(&path, "boom"), "");
        assert_eq!(ask(&path, "hello"), "ok");

        stop(pool, &shutdown, &path);
    }
}
