//! Restart-forever supervision for the coordinator's long-running loops.

use std::backtrace::Backtrace;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Once;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info};

use crm_core::Result;

use crate::sync::panic_message;

/// How a supervised task is restarted after it fails.
///
/// No jitter and no back-off: every restart waits the same cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Task name used in logs.
    pub task: &'static str,
    pub cooldown: Duration,
}

impl RestartPolicy {
    pub const fn new(task: &'static str, cooldown: Duration) -> Self {
        Self { task, cooldown }
    }
}

static PANIC_HOOK: Once = Once::new();

/// Replace the process panic hook with one that logs every panic at ERROR,
/// with its location and a captured backtrace.
///
/// The supervisor and `sync_all` only see the payload once the panic has
/// unwound, so this is where the panic site is recorded. Calling it again
/// is a no-op.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let location = info
                .location()
                .map(|l| l.to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            error!(
                subsystem = "dictionary",
                component = "panic",
                panic.message = %panic_message(info.payload()),
                panic.location = %location,
                backtrace = %Backtrace::force_capture(),
                "Panic captured"
            );
        }));
    });
}

/// Resolves once shutdown has been requested or the sender is gone.
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

fn is_shutdown(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow()
}

/// Run `task` until shutdown, restarting it after every error or panic.
///
/// `task` receives its own shutdown receiver and is expected to return
/// `Ok(())` once it observes shutdown. A task that returns `Ok(())` while
/// no shutdown was requested is restarted like a failed one.
pub async fn supervise<F, Fut>(policy: RestartPolicy, mut shutdown: watch::Receiver<bool>, mut task: F)
where
    F: FnMut(watch::Receiver<bool>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut restarts: u64 = 0;
    loop {
        if is_shutdown(&shutdown) {
            break;
        }

        info!(
            subsystem = "dictionary",
            component = "supervisor",
            task = policy.task,
            restarts,
            "Starting task"
        );

        let outcome = AssertUnwindSafe(task(shutdown.clone())).catch_unwind().await;
        if is_shutdown(&shutdown) {
            break;
        }

        match outcome {
            Ok(Ok(())) => error!(
                subsystem = "dictionary",
                component = "supervisor",
                task = policy.task,
                cooldown_ms = policy.cooldown.as_millis() as u64,
                "Task exited unexpectedly, restarting"
            ),
            Ok(Err(e)) => error!(
                subsystem = "dictionary",
                component = "supervisor",
                task = policy.task,
                cooldown_ms = policy.cooldown.as_millis() as u64,
                error = %e,
                "Task failed, restarting"
            ),
            Err(payload) => error!(
                subsystem = "dictionary",
                component = "supervisor",
                task = policy.task,
                cooldown_ms = policy.cooldown.as_millis() as u64,
                error = %panic_message(payload.as_ref()),
                "Task panicked, restarting"
            ),
        }

        restarts += 1;
        tokio::select! {
            _ = shutdown_requested(&mut shutdown) => break,
            _ = sleep(policy.cooldown) => {}
        }
    }

    info!(
        subsystem = "dictionary",
        component = "supervisor",
        task = policy.task,
        restarts,
        "Task stopped"
    );
}
