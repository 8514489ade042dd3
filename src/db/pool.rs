//! Pool lifecycle: connection logging and the fail-fast policy for lost
//! connectivity.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPool;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::RuntimeMode;

/// Exit code used when the pool becomes unusable.
pub const POOL_FAILURE_EXIT_CODE: i32 = 1;

type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

/// What the caller should do after a pool-level error was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    Terminate,
}

pub struct PoolLifecycle {
    mode: RuntimeMode,
    connected: AtomicBool,
    exit: ExitHook,
}

impl PoolLifecycle {
    /// Lifecycle that exits the process on fatal pool errors.
    pub fn new(mode: RuntimeMode) -> Self {
        Self::with_exit_hook(mode, Arc::new(exit_process))
    }

    pub fn with_exit_hook(mode: RuntimeMode, exit: ExitHook) -> Self {
        Self {
            mode,
            connected: AtomicBool::new(false),
            exit,
        }
    }

    /// Called for every new physical connection.
    pub fn on_connect(&self) {
        if !self.connected.swap(true, Ordering::SeqCst) {
            info!("Connected to PostgreSQL database");
        } else {
            debug!("Opened additional PostgreSQL connection");
        }
    }

    pub fn has_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Report an asynchronous pool-level error.
    pub fn on_error(&self, err: &sqlx::Error) -> Disposition {
        error!(error = %err, "Unexpected error on idle database connection");

        if self.mode.exits_on_pool_error() {
            error!(mode = %self.mode, "Database pool is unrecoverable, exiting");
            (self.exit)(POOL_FAILURE_EXIT_CODE);
            Disposition::Terminate
        } else {
            Disposition::Continue
        }
    }
}

fn exit_process(code: i32) {
    std::process::exit(code)
}

/// Errors that mean the database went away, as opposed to a busy pool.
pub fn is_connection_loss(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_) | sqlx::Error::WorkerCrashed
    )
}

/// A timeout with no live connections left, after the database was reachable
/// once, means new connections are being refused.
fn is_unreachable(pool: &PgPool, lifecycle: &PoolLifecycle, err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::PoolTimedOut) && pool.size() == 0 && lifecycle.has_connected()
}

pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Periodically ping the pool and hand connection loss to the lifecycle.
pub fn spawn_monitor(
    pool: PgPool,
    lifecycle: Arc<PoolLifecycle>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if pool.is_closed() {
                debug!("Pool closed, stopping monitor");
                break;
            }

            match health_check(&pool).await {
                Ok(()) => {}
                Err(e) if is_connection_loss(&e) || is_unreachable(&pool, &lifecycle, &e) => {
                    if lifecycle.on_error(&e) == Disposition::Terminate {
                        break;
                    }
                }
                Err(e) => debug!(error = %e, "Pool health check failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording_lifecycle(mode: RuntimeMode) -> (PoolLifecycle, Arc<Mutex<Vec<i32>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let lifecycle =
            PoolLifecycle::with_exit_hook(mode, Arc::new(move |code: i32| sink.lock().unwrap().push(code)));
        (lifecycle, calls)
    }

    fn lost_connection() -> sqlx::Error {
        sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "server closed the connection",
        ))
    }

    #[test]
    fn test_production_terminates_on_pool_error() {
        let (lifecycle, calls) = recording_lifecycle(RuntimeMode::Production);
        assert_eq!(lifecycle.on_error(&lost_connection()), Disposition::Terminate);
        assert_eq!(*calls.lock().unwrap(), vec![POOL_FAILURE_EXIT_CODE]);
    }

    #[test]
    fn test_development_keeps_running() {
        let (lifecycle, calls) = recording_lifecycle(RuntimeMode::Development);
        assert_eq!(lifecycle.on_error(&lost_connection()), Disposition::Continue);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_first_connection_is_recorded_once() {
        let (lifecycle, _) = recording_lifecycle(RuntimeMode::Test);
        assert!(!lifecycle.has_connected());
        lifecycle.on_connect();
        lifecycle.on_connect();
        assert!(lifecycle.has_connected());
    }

    #[test]
    fn test_connection_loss_classification() {
        assert!(is_connection_loss(&lost_connection()));
        assert!(is_connection_loss(&sqlx::Error::WorkerCrashed));
        assert!(!is_connection_loss(&sqlx::Error::PoolTimedOut));
        assert!(!is_connection_loss(&sqlx::Error::RowNotFound));
    }

    #[tokio::test]
    async fn test_monitor_terminates_when_database_disappears() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(100))
            .connect_lazy("postgres://postgres@127.0.0.1:1/postgres")
            .unwrap();
        let (lifecycle, calls) = recording_lifecycle(RuntimeMode::Production);
        lifecycle.on_connect();

        let handle = spawn_monitor(pool, Arc::new(lifecycle), Duration::from_millis(20));
        let joined = tokio_test::assert_ok!(tokio::time::timeout(Duration::from_secs(5), handle).await);
        tokio_test::assert_ok!(joined);

        assert_eq!(*calls.lock().unwrap(), vec![POOL_FAILURE_EXIT_CODE]);
    }
}
