//! Git Access Layer error type and the retry policy from spec.md §4.1.

use std::thread;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitLayerError {
    #[error("not a git repository at {0}")]
    NotARepository(String),

    #[error("repository objects are corrupt: {0}")]
    Corrupt(String),

    #[error("I/O failure after retries against {object}: {message}")]
    IoFailure { object: String, message: String },

    #[error("{0}")]
    Other(String),
}

impl From<gix::open::Error> for GitLayerError {
    fn from(e: gix::open::Error) -> Self {
        GitLayerError::NotARepository(e.to_string())
    }
}

impl From<gix::object::find::existing::Error> for GitLayerError {
    fn from(e: gix::object::find::existing::Error) -> Self {
        GitLayerError::Corrupt(e.to_string())
    }
}

impl From<gix::object::try_into::Error> for GitLayerError {
    fn from(e: gix::object::try_into::Error) -> Self {
        GitLayerError::Corrupt(e.to_string())
    }
}

impl From<gix::object::commit::Error> for GitLayerError {
    fn from(e: gix::object::commit::Error) -> Self {
        GitLayerError::Corrupt(e.to_string())
    }
}

/// Retry a transient Git I/O operation up to `attempts` times with
/// exponential backoff, per spec.md §4.1. On exhaustion, the error is
/// wrapped as `IoFailure` and reported against `object` — the caller
/// (a searcher) logs it to metrics and continues traversal rather than
/// aborting the request.
pub fn retry_io<T>(
    object: &str,
    attempts: u32,
    mut op: impl FnMut() -> Result<T, GitLayerError>,
) -> Result<T, GitLayerError> {
    let mut last_err = None;
    for attempt in 0..attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) => {
                last_err = Some(err);
                if attempt + 1 < attempts {
                    thread::sleep(Duration::from_millis(20 * 2u64.pow(attempt)));
                }
            }
        }
    }
    Err(GitLayerError::IoFailure {
        object: object.to_string(),
        message: last_err.map(|e| e.to_string()).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn retry_io_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry_io("blob abc", 3, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(GitLayerError::Other("transient".into()))
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn retry_io_gives_up_after_exhausting_attempts() {
        let result: Result<(), GitLayerError> =
            retry_io("blob abc", 2, || Err(GitLayerError::Other("down".into())));
        assert!(matches!(result, Err(GitLayerError::IoFailure { .. })));
    }
}
