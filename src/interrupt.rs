use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Cooperative stop request shared between a probing session and whoever may interrupt it
/// (typically a Ctrl-C handler). Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct StopCondition {
    condition: Arc<(Mutex<bool>, Condvar)>,
}

impl StopCondition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_stop(&self) {
        let (lock, cvar) = &*self.condition;
        let mut should_stop = lock.lock().unwrap_or_else(PoisonError::into_inner);
        *should_stop = true;
        cvar.notify_all();
    }

    #[must_use]
    pub fn should_stop(&self) -> bool {
        let (lock, _) = &*self.condition;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleeps up to `timeout`, waking early if a stop is requested. Returns the stop flag.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.condition;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (should_stop, _) = cvar
            .wait_timeout_while(guard, timeout, |should_stop| !*should_stop)
            .unwrap_or_else(PoisonError::into_inner);
        *should_stop
    }
}
