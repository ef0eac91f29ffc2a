use std::fs;
use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use graphd_core::{ServerConfig, ServerMode};
use tracing::{debug, info, warn};

use crate::error::{Result, ServerError};
use crate::leader_follower::LeaderFollowerPool;
use crate::pipeline::{self, Pipeline};
use crate::serial;

/// A bound, not yet running server.
pub struct Server {
    config: ServerConfig,
    listener: UnixListener,
}

impl Server {
    /// Binds the configured socket path, replacing a stale socket file.
    pub fn bind(config: ServerConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|err| ServerError::Config(err.to_string()))?;

        let path = config.socket_path.clone();
        match fs::remove_file(&path) {
            Ok(()) => debug!("removed stale socket {:?}", path),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(ServerError::Bind { path, source }),
        }
        let listener =
            UnixListener::bind(&path).map_err(|source| ServerError::Bind { path, source })?;
        Ok(Self { config, listener })
    }

    pub fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    pub fn mode(&self) -> ServerMode {
        self.config.mode
    }

    /// Starts serving in the background.
    pub fn spawn(self) -> Result<ServerHandle> {
        let Server { config, listener } = self;
        let shutdown = Arc::new(AtomicBool::new(false));
        let read_timeout = config.read_timeout();

        let runner = match config.mode {
            ServerMode::Serial => {
                let flag = shutdown.clone();
                let acceptor = thread::Builder::new()
                    .name("graphd-serial".into())
                    .spawn(move || serial::serve(listener, flag, read_timeout))?;
                Runner::Serial { acceptor }
            }
            ServerMode::LeaderFollower => Runner::LeaderFollower(LeaderFollowerPool::spawn(
                Arc::new(listener),
                config.workers,
                shutdown.clone(),
                read_timeout,
            )?),
            ServerMode::Pipeline => {
                let pipeline = Arc::new(Pipeline::standard()?);
                let (flag, stages) = (shutdown.clone(), pipeline.clone());
                let acceptor = thread::Builder::new()
                    .name("graphd-acceptor".into())
                    .spawn(move || pipeline::serve(listener, stages, flag, read_timeout))?;
                Runner::Pipeline { acceptor, pipeline }
            }
        };

        info!(
            "graphd listening on {:?} (mode={})",
            config.socket_path, config.mode
        );
        Ok(ServerHandle {
            socket_path: config.socket_path,
            shutdown,
            runner: Some(runner),
        })
    }

    /// Serves until the process is stopped.
    pub fn run(self) -> Result<()> {
        self.spawn()?.wait()
    }
}

enum Runner {
    Serial {
        acceptor: JoinHandle<()>,
    },
    LeaderFollower(LeaderFollowerPool),
    Pipeline {
        acceptor: JoinHandle<()>,
        pipeline: Arc<Pipeline>,
    },
}

impl Runner {
    fn join(self) -> Result<()> {
        match self {
            Runner::Serial { acceptor } => join_thread(acceptor, "serial acceptor"),
            Runner::LeaderFollower(pool) => pool.join(),
            Runner::Pipeline { acceptor, pipeline } => {
                // connections still waiting on replies need the stages alive
                let accepted = join_thread(acceptor, "pipeline acceptor");
                pipeline.shutdown()?;
                accepted
            }
        }
    }
}

fn join_thread(handle: JoinHandle<()>, name: &'static str) -> Result<()> {
    handle.join().map_err(|_| ServerError::ThreadPanicked(name))
}

/// Running server. Dropping the handle shuts the server down.
pub struct ServerHandle {
    socket_path: PathBuf,
    shutdown: Arc<AtomicBool>,
    runner: Option<Runner>,
}

impl ServerHandle {
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Stops accepting, lets in-flight work finish, joins every thread and
    /// removes the socket file.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    /// Blocks for as long as the server runs.
    pub fn wait(mut self) -> Result<()> {
        let joined = match self.runner.take() {
            Some(runner) => runner.join(),
            None => Ok(()),
        };
        self.remove_socket();
        joined
    }

    fn stop(&mut self) -> Result<()> {
        let Some(runner) = self.runner.take() else {
            return Ok(());
        };
        info!("shutting down graphd on {:?}", self.socket_path);
        self.shutdown.store(true, Ordering::Release);
        if let Runner::LeaderFollower(pool) = &runner {
            pool.close();
        }
        // unblock the thread parked in accept()
        if let Err(err) = UnixStream::connect(&self.socket_path) {
            debug!("wake-up connect failed: {}", err);
        }
        let joined = runner.join();
        self.remove_socket();
        joined
    }

    fn remove_socket(&self) {
        if let Err(err) = fs::remove_file(&self.socket_path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!("failed to remove {:?}: {}", self.socket_path, err);
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!("shutdown on drop: {}", err);
        }
    }
}
