//! Fail-open helper for side channels
//!
//! Transcript writing and similar bookkeeping must never decide whether a
//! synthesis run succeeds. Wrap those operations in [`fail_open`].
//!
//! Do not use it for generation or test execution: those have their own
//! error contracts.

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Run `f`, logging and swallowing any error.
///
/// Returns `None` when the operation failed.
///
/// ```no_run
/// use cwm_core::fail_open::fail_open;
/// use cwm_core::Result;
///
/// async fn append_transcript() -> Result<()> {
///     Ok(())
/// }
///
/// async fn example() {
///     let written = fail_open("run_log", || append_transcript()).await;
///     assert!(written.is_some());
/// }
/// ```
pub async fn fail_open<F, Fut, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CwmError;

    #[tokio::test]
    async fn test_fail_open_passes_value_through() {
        let result = fail_open("op", || async { Ok::<_, CwmError>("written") }).await;
        assert_eq!(result, Some("written"));
    }

    #[tokio::test]
    async fn test_fail_open_swallows_io_error() {
        let result = fail_open("op", || async {
            let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
            Err::<(), _>(CwmError::from(err))
        })
        .await;
        assert_eq!(result, None);
    }
}
