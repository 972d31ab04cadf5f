//! Locking helpers shared by every layer.

use std::sync::{Mutex, MutexGuard};

/// Lock `mutex`, recovering the data if a previous holder panicked.
///
/// Every critical section in this crate leaves its state consistent before
/// any call that could panic, so a poisoned lock still guards valid data.
#[track_caller]
pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            let loc = std::panic::Location::caller();
            tracing::error!(
                file = loc.file(),
                line = loc.line(),
                "mutex poisoned; continuing with recovered state"
            );
            poisoned.into_inner()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_recovers_poisoned_mutex() {
        let shared = Arc::new(Mutex::new(vec![1, 2]));

        let poisoner = Arc::clone(&shared);
        let result = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(result.is_err());
        assert!(shared.is_poisoned());

        lock_or_recover(&shared).push(3);
        assert_eq!(*lock_or_recover(&shared), vec![1, 2, 3]);
    }
}
