//! `GET /health/live`, `GET /health/ready`: the liveness probe is
//! constant; the readiness probe checks the process-external dependency
//! under a 3-second ceiling independent of any caller-side cancellation.
//! The in-memory metadata store is in-process and cannot be unavailable;
//! a networked replacement would be probed the same bounded way.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use artifortress_types::ArtifortressError;

use crate::state::AppState;

const READY_CHECK_CEILING: Duration = Duration::from_secs(3);

pub fn health_live() -> bool {
    true
}

pub fn health_ready(state: &AppState) -> Result<(), ArtifortressError> {
    let object_store = state.object_store.clone();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(object_store.check_availability());
    });
    match rx.recv_timeout(READY_CHECK_CEILING) {
        Ok(result) => {
            result?;
            Ok(())
        }
        Err(_) => Err(ArtifortressError::service_unavailable("readiness check timed out")),
    }
}
