//! Synchronous wrappers for callers without an async runtime.
//!
//! Calls are driven on a runtime owned by this module, so they must not be made
//! from inside another Tokio runtime.

use crate::WorksheetSelector;
use crate::error::{AppError, Result};
use polars::prelude::DataFrame;
use std::sync::OnceLock;
use tokio::runtime::Runtime;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

// The runtime outlives each call so pooled connections stay usable.
fn runtime() -> Result<&'static Runtime> {
    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    // Losing a race just drops the spare runtime
    let _ = RUNTIME.set(runtime);

    RUNTIME
        .get()
        .ok_or_else(|| AppError::Config("Failed to start async runtime".to_string()))
}

/// Blocking version of [`crate::fetch_sheet_as_polars`].
pub fn fetch_sheet_as_polars(
    spreadsheet_id: &str,
    selector: WorksheetSelector,
) -> Result<DataFrame> {
    ensure_outside_runtime()?;
    runtime()?.block_on(crate::fetch_sheet_as_polars(spreadsheet_id, selector))
}

// Blocking inside a runtime worker would panic; async callers should use the async API.
fn ensure_outside_runtime() -> Result<()> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(AppError::Config(
            "Blocking fetch called from within an async runtime; \
             use gsheet_frame::fetch_sheet_as_polars instead"
                .to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_is_reused() {
        let first = runtime().unwrap() as *const Runtime;
        let second = runtime().unwrap() as *const Runtime;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_called_inside_runtime_returns_error() {
        let result = fetch_sheet_as_polars("abc123", WorksheetSelector::default());

        match result {
            Err(AppError::Config(message)) => assert!(message.contains("async runtime")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!crate::SESSION.is_initialized());
    }

    #[test]
    fn test_empty_id_fails_before_authenticating() {
        let result = fetch_sheet_as_polars("", WorksheetSelector::default());

        assert!(matches!(result, Err(AppError::Config(_))));
        assert!(!crate::SESSION.is_initialized());
    }
}
