//! Starting and stopping the HTTP server against a given store file.

use std::io;
use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

use rocket::{Build, Ignite, Rocket, Shutdown};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::db::PostStore;
use crate::error::AppError;

const READY_POLL_ATTEMPTS: usize = 50;
const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A launched server. Pass it to [`close_server`] to stop it.
pub struct RunningServer {
    pub address: SocketAddr,
    shutdown: Shutdown,
    task: JoinHandle<Result<Rocket<Ignite>, rocket::Error>>,
}

impl RunningServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }
}

fn free_port(host: &str) -> Result<u16, AppError> {
    let listener = TcpListener::bind((host, 0))?;
    Ok(listener.local_addr()?.port())
}

/// Polls `address` until it accepts a connection. Gives up early if `task`
/// exits, and returns `false` when the attempts run out.
async fn wait_until_accepting<T>(address: SocketAddr, task: &JoinHandle<T>, attempts: usize) -> bool {
    for _ in 0..attempts {
        if task.is_finished() {
            return false;
        }
        if tokio::net::TcpStream::connect(address).await.is_ok() {
            return true;
        }
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
    false
}

/// Opens the store at `config.database_path` and builds a configured rocket.
pub fn build(config: &Config) -> Result<Rocket<Build>, AppError> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = PostStore::open(&config.database_path)?;

    let figment = rocket::Config::figment()
        .merge(("address", config.host.clone()))
        .merge(("port", config.port))
        .merge(("shutdown.grace", 1))
        .merge(("shutdown.mercy", 1));

    Ok(crate::create_rocket(store)?.configure(figment))
}

/// Binds a listener and serves until [`close_server`] is called. A port of
/// `0` is resolved to a free one first. Returns once the socket accepts
/// connections.
pub async fn run_server(config: &Config) -> Result<RunningServer, AppError> {
    let port = match config.port {
        0 => free_port(&config.host)?,
        port => port,
    };
    let config = Config { port, ..config.clone() };

    let rocket = build(&config)?.ignite().await?;
    let address = SocketAddr::new(rocket.config().address, rocket.config().port);
    let shutdown = rocket.shutdown();
    let task = tokio::spawn(rocket.launch());

    let ready = wait_until_accepting(address, &task, READY_POLL_ATTEMPTS).await;

    if task.is_finished() {
        task.await??;
        return Err(io::Error::new(io::ErrorKind::ConnectionAborted, "server exited during startup").into());
    }
    if !ready {
        shutdown.notify();
        task.abort();
        return Err(io::Error::new(io::ErrorKind::TimedOut, format!("server at {address} never accepted a connection")).into());
    }

    tracing::info!(%address, db = %config.database_path.display(), "server started");
    Ok(RunningServer { address, shutdown, task })
}

/// Requests a graceful shutdown and waits for the server task to finish.
pub async fn close_server(server: RunningServer) -> Result<(), AppError> {
    let RunningServer { address, shutdown, task } = server;
    shutdown.notify();
    task.await??;
    tracing::info!(%address, "server stopped");
    Ok(())
}
