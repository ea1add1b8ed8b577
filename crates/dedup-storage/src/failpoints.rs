//! Deterministic write-failure injection (feature: `failpoints`).
//!
//! Lets a test arm a named point and observe the exact error path a real
//! disk-exhaustion failure would take, without needing to actually exhaust
//! disk space.

#[cfg(feature = "failpoints")]
pub(crate) mod armed {
    use std::cell::RefCell;
    use std::collections::HashSet;

    thread_local! {
        // Thread-local, not process-global: tests that arm a failpoint run
        // on their own thread under the default parallel test runner, so
        // one test's armed point never leaks into another's.
        static ARMED: RefCell<HashSet<&'static str>> = RefCell::new(HashSet::new());
    }

    pub fn arm(name: &'static str) {
        ARMED.with(|set| set.borrow_mut().insert(name));
    }

    pub fn disarm(name: &'static str) {
        ARMED.with(|set| set.borrow_mut().remove(name));
    }

    pub fn is_armed(name: &str) -> bool {
        ARMED.with(|set| set.borrow().contains(name))
    }
}

#[cfg(feature = "failpoints")]
pub use armed::{arm, disarm};

#[cfg(feature = "failpoints")]
#[macro_export]
macro_rules! fail_point {
    ($name:expr) => {
        if $crate::failpoints::armed::is_armed($name) {
            return Err(dedup_core::Error::SpillWriteFailure(format!(
                "failpoint triggered: {}",
                $name
            )));
        }
    };
}

#[cfg(not(feature = "failpoints"))]
#[macro_export]
macro_rules! fail_point {
    ($name:expr) => {
        let _ = $name;
    };
}
