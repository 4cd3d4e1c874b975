use crate::error::Result;
use std::future::Future;
use tokio::sync::OnceCell;
use tracing::debug;

/// Lazily initialised client shared by every call in the process.
///
/// Initialisation runs at most once even when several tasks race for it. A
/// failed initialisation is not stored, so the next call tries again.
pub struct Session<C> {
    client: OnceCell<C>,
}

impl<C> Session<C> {
    pub const fn new() -> Self {
        Self {
            client: OnceCell::const_new(),
        }
    }

    pub async fn client<F, Fut>(&self, init: F) -> Result<&C>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C>>,
    {
        if let Some(client) = self.client.get() {
            debug!("Reusing authenticated session");
            return Ok(client);
        }

        self.client.get_or_try_init(init).await
    }

    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }
}

impl<C> Default for Session<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_initialises_once() {
        let session: Session<String> = Session::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let client = session
                .client(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("client".to_string())
                })
                .await
                .unwrap();
            assert_eq!(client, "client");
        }

        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "credentials should only be acquired once per process"
        );
        assert!(session.is_initialized());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_calls_initialise_once() {
        let session: Arc<Session<String>> = Arc::new(Session::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let session = Arc::clone(&session);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    session
                        .client(|| async {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::task::yield_now().await;
                            Ok("client".to_string())
                        })
                        .await
                        .map(|client| client.clone())
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "client");
        }

        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "racing callers should share one initialisation"
        );
    }

    #[tokio::test]
    async fn test_failed_init_is_retried() {
        let session: Session<String> = Session::new();
        let calls = AtomicUsize::new(0);

        let result = session
            .client(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Auth("consent denied".to_string()))
            })
            .await;
        assert!(matches!(result, Err(AppError::Auth(_))));
        assert!(!session.is_initialized());

        let client = session
            .client(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("client".to_string())
            })
            .await
            .unwrap();

        assert_eq!(client, "client");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
