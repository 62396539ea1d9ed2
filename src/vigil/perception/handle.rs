// SPDX-License-Identifier: MIT

//! Lazily-loaded model handle with a single-initialization guarantee

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::{ModelLoader, PerceptionModel, Unavailable};

type LoadResult<E> = Result<Arc<dyn PerceptionModel<E>>, Unavailable>;

/// Shared access to one perception model
///
/// The first caller runs the loader; concurrent callers wait for it, and
/// everyone afterwards sees the cached result. A failed load is cached too
/// and reported the same way on every call.
pub struct ModelHandle<E> {
    name: String,
    loader: Arc<dyn ModelLoader<E>>,
    model: OnceCell<LoadResult<E>>,
}

impl<E: Send + 'static> ModelHandle<E> {
    pub fn new(name: impl Into<String>, loader: Arc<dyn ModelLoader<E>>) -> Self {
        Self {
            name: name.into(),
            loader,
            model: OnceCell::new(),
        }
    }

    /// A handle whose model is never available
    pub fn disabled(name: impl Into<String>) -> Self {
        let name = name.into();
        let loader = Arc::new(DisabledLoader::new(name.clone()));
        Self::new(name, loader)
    }

    /// A handle around an already constructed model
    pub fn ready(name: impl Into<String>, model: Arc<dyn PerceptionModel<E>>) -> Self {
        Self::new(name, Arc::new(ReadyLoader::new(model)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the loader has already run
    pub fn is_initialized(&self) -> bool {
        self.model.initialized()
    }

    /// Get the model, loading it on first use
    pub async fn model(&self) -> LoadResult<E> {
        self.model
            .get_or_init(|| async {
                log::info!("Loading {} model...", self.name);
                let loaded = self.loader.load().await;
                if let Err(e) = &loaded {
                    log::warn!("{}", e);
                }
                loaded
            })
            .await
            .clone()
    }

    /// Analyze a payload, or explain why that is not possible
    pub async fn analyze(&self, payload: Option<&[u8]>) -> Result<E, Unavailable> {
        let payload = payload.ok_or_else(|| Unavailable::NoPayload(self.name.clone()))?;
        let model = self.model().await?;
        model.analyze(payload).await
    }
}

/// Loader for a modality without a configured model
#[derive(Debug, Clone)]
pub struct DisabledLoader {
    name: String,
}

impl DisabledLoader {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl<E: Send + 'static> ModelLoader<E> for DisabledLoader {
    async fn load(&self) -> LoadResult<E> {
        Err(Unavailable::NotConfigured(self.name.clone()))
    }
}

/// Loader that hands out an existing model
pub struct ReadyLoader<E> {
    model: Arc<dyn PerceptionModel<E>>,
}

impl<E> ReadyLoader<E> {
    pub fn new(model: Arc<dyn PerceptionModel<E>>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<E: Send + 'static> ModelLoader<E> for ReadyLoader<E> {
    async fn load(&self) -> LoadResult<E> {
        Ok(self.model.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct EchoModel;

    #[async_trait]
    impl PerceptionModel<usize> for EchoModel {
        async fn analyze(&self, payload: &[u8]) -> Result<usize, Unavailable> {
            Ok(payload.len())
        }
    }

    // Loader that counts its calls and can be told to fail
    struct CountingLoader {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ModelLoader<usize> for CountingLoader {
        async fn load(&self) -> LoadResult<usize> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            if self.fail {
                Err(Unavailable::LoadFailed {
                    model: "echo".to_string(),
                    reason: "weights missing".to_string(),
                })
            } else {
                Ok(Arc::new(EchoModel))
            }
        }
    }

    fn counting(fail: bool) -> Arc<CountingLoader> {
        Arc::new(CountingLoader {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_load() {
        let loader = counting(false);
        let handle = Arc::new(ModelHandle::<usize>::new("echo", loader.clone()));
        assert!(!handle.is_initialized());

        let calls: Vec<_> = (0..8)
            .map(|_| {
                let handle = handle.clone();
                tokio::spawn(async move { handle.analyze(Some(&b"abc"[..])).await })
            })
            .collect();

        for call in futures::future::join_all(calls).await {
            assert_eq!(call.unwrap(), Ok(3));
        }
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert!(handle.is_initialized());
    }

    #[tokio::test]
    async fn test_load_failure_is_cached() {
        let loader = counting(true);
        let handle: ModelHandle<usize> = ModelHandle::new("echo", loader.clone());

        let first = handle.analyze(Some(&b"abc"[..])).await.unwrap_err();
        let second = handle.analyze(Some(&b"abc"[..])).await.unwrap_err();
        assert_eq!(first, second);
        assert!(matches!(first, Unavailable::LoadFailed { .. }));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_payload_skips_loading() {
        let loader = counting(false);
        let handle: ModelHandle<usize> = ModelHandle::new("echo", loader.clone());

        let err = handle.analyze(None).await.unwrap_err();
        assert_eq!(err, Unavailable::NoPayload("echo".to_string()));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_and_ready_handles() {
        let disabled: ModelHandle<usize> = ModelHandle::disabled("vision");
        assert_eq!(
            disabled.analyze(Some(&b"x"[..])).await,
            Err(Unavailable::NotConfigured("vision".to_string()))
        );

        let ready: ModelHandle<usize> = ModelHandle::ready("echo", Arc::new(EchoModel));
        assert_eq!(ready.analyze(Some(&b"four"[..])).await, Ok(4));
        assert_eq!(ready.name(), "echo");
    }
}
