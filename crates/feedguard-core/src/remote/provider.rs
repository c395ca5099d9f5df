//! Shared handle to a remote chat model
//!
//! Built once at startup and passed to each engine. The client is created
//! lazily on first use and can be rebuilt after a failure; both go through a
//! mutex so concurrent requests never race on the shared handle. The lock is
//! only held while constructing the client, never across a model call.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ChatModel, OpenAiCompatClient};
use crate::config::RemoteConfig;
use crate::Result;

/// Builds a fresh chat model client
pub trait ModelFactory: Send + Sync {
    fn build(&self) -> Result<Arc<dyn ChatModel>>;
}

impl<F> ModelFactory for F
where
    F: Fn() -> Result<Arc<dyn ChatModel>> + Send + Sync,
{
    fn build(&self) -> Result<Arc<dyn ChatModel>> {
        self()
    }
}

/// Lazily constructed, recreatable chat model handle
pub struct ClientProvider {
    factory: Option<Box<dyn ModelFactory>>,
    current: Mutex<Option<Arc<dyn ChatModel>>>,
    unavailable_reason: String,
}

impl ClientProvider {
    /// Provider backed by `factory`
    pub fn new(factory: impl ModelFactory + 'static) -> Self {
        Self {
            factory: Some(Box::new(factory)),
            current: Mutex::new(None),
            unavailable_reason: String::new(),
        }
    }

    /// Provider that never yields a client
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            factory: None,
            current: Mutex::new(None),
            unavailable_reason: reason.into(),
        }
    }

    /// OpenAI-compatible provider, or unavailable when no credential is configured
    pub fn from_remote(remote: Option<RemoteConfig>, model: &str, temperature: f32) -> Self {
        match remote {
            Some(remote) => {
                let model = model.to_string();
                Self::new(move || -> Result<Arc<dyn ChatModel>> {
                    let client = OpenAiCompatClient::new(&remote, model.clone(), temperature)?;
                    Ok(Arc::new(client) as Arc<dyn ChatModel>)
                })
            }
            None => Self::unavailable("LLM unavailable (no API key)"),
        }
    }

    /// True if a factory is configured
    pub fn is_configured(&self) -> bool {
        self.factory.is_some()
    }

    /// Why no client can be produced, when unconfigured
    pub fn unavailable_reason(&self) -> &str {
        &self.unavailable_reason
    }

    /// Current client, building it on first use
    pub fn get(&self) -> Option<Arc<dyn ChatModel>> {
        let factory = self.factory.as_ref()?;
        let mut current = self.current.lock();
        if current.is_none() {
            *current = Self::try_build(factory.as_ref());
        }
        current.clone()
    }

    /// Replace the current client with a fresh one
    pub fn recreate(&self) -> Option<Arc<dyn ChatModel>> {
        let factory = self.factory.as_ref()?;
        debug!("Recreating remote model client");
        let fresh = Self::try_build(factory.as_ref());
        let mut current = self.current.lock();
        *current = fresh;
        current.clone()
    }

    fn try_build(factory: &dyn ModelFactory) -> Option<Arc<dyn ChatModel>> {
        match factory.build() {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Failed to build remote model client: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use crate::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Echo;

    #[async_trait]
    impl ChatModel for Echo {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            Ok(messages.last().map(|m| m.content.clone()).unwrap_or_default())
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    fn counting_provider(builds: Arc<AtomicU32>) -> ClientProvider {
        ClientProvider::new(move || -> Result<Arc<dyn ChatModel>> {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Echo) as Arc<dyn ChatModel>)
        })
    }

    #[test]
    fn test_lazy_single_construction() {
        let builds = Arc::new(AtomicU32::new(0));
        let provider = counting_provider(builds.clone());
        assert_eq!(builds.load(Ordering::SeqCst), 0);

        assert!(provider.get().is_some());
        assert!(provider.get().is_some());
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_recreate_builds_again() {
        let builds = Arc::new(AtomicU32::new(0));
        let provider = counting_provider(builds.clone());

        provider.get();
        provider.recreate();
        provider.get();
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unavailable_provider() {
        let provider = ClientProvider::unavailable("rules-only mode forced");
        assert!(!provider.is_configured());
        assert!(provider.get().is_none());
        assert!(provider.recreate().is_none());
        assert_eq!(provider.unavailable_reason(), "rules-only mode forced");
    }

    #[test]
    fn test_failed_build_yields_none() {
        let provider = ClientProvider::new(|| -> Result<Arc<dyn ChatModel>> {
            Err(Error::config("bad endpoint"))
        });
        assert!(provider.is_configured());
        assert!(provider.get().is_none());
    }

    #[test]
    fn test_from_remote_without_key() {
        let provider = ClientProvider::from_remote(None, "m", 0.0);
        assert!(!provider.is_configured());
        assert_eq!(provider.unavailable_reason(), "LLM unavailable (no API key)");
    }

    #[test]
    fn test_concurrent_recreation() {
        let builds = Arc::new(AtomicU32::new(0));
        let provider = Arc::new(counting_provider(builds.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = provider.clone();
                std::thread::spawn(move || provider.recreate().is_some())
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(builds.load(Ordering::SeqCst), 8);
        assert!(provider.get().is_some());
    }
}
