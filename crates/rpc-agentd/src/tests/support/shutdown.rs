//! Shutdown signal triggered explicitly by a scenario step.

use std::sync::{Arc, Condvar, Mutex};

use crate::process::{ShutdownError, ShutdownSignal};

#[derive(Debug, Clone, Default)]
pub struct ManualShutdown {
    state: Arc<(Mutex<bool>, Condvar)>,
}

impl ManualShutdown {
    /// Releases every waiter.
    pub fn trigger(&self) {
        let (lock, condvar) = &*self.state;
        *lock.lock().expect("shutdown mutex poisoned") = true;
        condvar.notify_all();
    }
}

impl ShutdownSignal for ManualShutdown {
    fn wait(&self) -> Result<(), ShutdownError> {
        let (lock, condvar) = &*self.state;
        let guard = lock.lock().expect("shutdown mutex poisoned");
        let _released = condvar
            .wait_while(guard, |triggered| !*triggered)
            .expect("shutdown mutex poisoned");
        Ok(())
    }
}
