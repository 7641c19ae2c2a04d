//! Time-bounding wrapper for runtime functions.
//!
//! The wrapped call runs on its own thread while the caller waits up to the limit. A call that overruns
//! yields a `TimeoutError` fault; its thread is left to finish on its own and its result is discarded.
//! Substitutions active during the run are restored when the run ends, so an overrunning body may
//! observe the original bindings again.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use gradecase_core::Fault;

use crate::runtime::Function;

/// Wrap `function` so a call taking longer than `limit` faults with `TimeoutError`.
pub fn bound(function: Function, limit: Duration) -> Function {
    let name = format!("timeout({})", function.name());
    Function::new(name, move |args| {
        let (tx, rx) = mpsc::channel();
        let inner = function.clone();
        let args = args.to_vec();
        thread::Builder::new()
            .name(format!("gradecase-timeout-{}", inner.name()))
            .spawn(move || {
                // The receiver is gone once the caller timed out.
                let _ = tx.send(inner.call(&args));
            })
            .map_err(|err| Fault::runtime(format!("could not start bounded call: {err}")))?;

        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!(limit_secs = limit.as_secs_f64(), "bounded call timed out");
                Err(Fault::timeout(limit.as_secs_f64()))
            }
            Err(RecvTimeoutError::Disconnected) => Err(Fault::runtime("bounded call ended without a result")),
        }
    })
}
