//! Restart fallback chain: local signal → platform process restart → exit.
//!
//! Each step runs only after the previous one failed or was unavailable,
//! with a delay in between so a flapping endpoint cannot cause a restart storm.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use strum::Display;

use crate::core::config;
use crate::storage::remote::RemoteConfigProvider;

/// Which step of the chain ended up handling the restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RestartMethod {
    LocalSignal,
    RemotePlatform,
    ProcessExit,
}

type ExitHook = Arc<dyn Fn() + Send + Sync>;

pub struct RestartCoordinator {
    client: Client,
    local_url: Option<String>,
    local_delay: Duration,
    fallback_delay: Duration,
    exit_hook: ExitHook,
}

impl RestartCoordinator {
    /// Signals `http://localhost:{port}/restart`, exits the process as last resort.
    pub fn new(port: u16) -> Self {
        Self {
            client: Client::builder()
                .timeout(config::network::local_signal_timeout())
                .build()
                .unwrap_or_default(),
            local_url: Some(format!("http://localhost:{}/restart", port)),
            local_delay: config::restart::local_delay(),
            fallback_delay: config::restart::fallback_delay(),
            exit_hook: Arc::new(exit_process),
        }
    }

    #[must_use]
    pub fn local_url(mut self, url: Option<String>) -> Self {
        self.local_url = url;
        self
    }

    #[must_use]
    pub fn delays(mut self, local: Duration, fallback: Duration) -> Self {
        self.local_delay = local;
        self.fallback_delay = fallback;
        self
    }

    /// Replaces the final "terminate the process" step.
    #[must_use]
    pub fn exit_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.exit_hook = Arc::new(hook);
        self
    }

    pub async fn restart(&self, remote: Option<&dyn RemoteConfigProvider>) -> RestartMethod {
        log::info!("🔄 Initiating safe bot restart...");

        tokio::time::sleep(self.local_delay).await;
        if self.signal_local().await {
            log::info!("✅ Safe restart request sent");
            return RestartMethod::LocalSignal;
        }

        tokio::time::sleep(self.fallback_delay).await;
        if let Some(remote) = remote {
            match remote.restart_processes().await {
                Ok(()) => {
                    log::info!("✅ Bot restart triggered via platform API");
                    return RestartMethod::RemotePlatform;
                }
                Err(e) => {
                    log::error!("❌ Platform restart failed: {}", e);
                    tokio::time::sleep(self.fallback_delay).await;
                }
            }
        }

        log::warn!("🆘 Emergency restart initiated");
        (self.exit_hook)();
        RestartMethod::ProcessExit
    }

    async fn signal_local(&self) -> bool {
        let Some(url) = self.local_url.as_deref() else {
            return false;
        };
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                log::warn!("⚠️ Local restart endpoint responded {}, trying fallback", response.status());
                false
            }
            Err(e) => {
                log::warn!("⚠️ Local restart request failed ({}), trying fallback", e);
                false
            }
        }
    }
}

#[allow(clippy::exit)]
fn exit_process() {
    // The supervisor (platform or systemd) brings the process back up
    std::process::exit(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{AppError, AppResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FakePlatform {
        fail: bool,
        restarts: AtomicU32,
    }

    #[async_trait]
    impl RemoteConfigProvider for FakePlatform {
        async fn fetch_all(&self) -> AppResult<HashMap<String, String>> {
            Ok(HashMap::new())
        }

        async fn patch(&self, _key: &str, _value: &str) -> AppResult<()> {
            Ok(())
        }

        async fn restart_processes(&self) -> AppResult<()> {
            self.restarts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AppError::RemoteSync("down".into()))
            } else {
                Ok(())
            }
        }
    }

    fn coordinator(local_url: Option<String>, exited: Arc<AtomicBool>) -> RestartCoordinator {
        RestartCoordinator::new(0)
            .local_url(local_url)
            .delays(Duration::from_millis(1), Duration::from_millis(1))
            .exit_hook(move || exited.store(true, Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_local_signal_wins() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/restart"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let exited = Arc::new(AtomicBool::new(false));
        let platform = FakePlatform {
            fail: false,
            restarts: AtomicU32::new(0),
        };
        let used = coordinator(Some(format!("{}/restart", server.uri())), exited.clone())
            .restart(Some(&platform))
            .await;

        assert_eq!(used, RestartMethod::LocalSignal);
        assert_eq!(platform.restarts.load(Ordering::SeqCst), 0);
        assert!(!exited.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_falls_back_to_platform() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let exited = Arc::new(AtomicBool::new(false));
        let platform = FakePlatform {
            fail: false,
            restarts: AtomicU32::new(0),
        };
        let used = coordinator(Some(format!("{}/restart", server.uri())), exited.clone())
            .restart(Some(&platform))
            .await;

        assert_eq!(used, RestartMethod::RemotePlatform);
        assert_eq!(platform.restarts.load(Ordering::SeqCst), 1);
        assert!(!exited.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_exits_when_everything_fails() {
        let exited = Arc::new(AtomicBool::new(false));
        let platform = FakePlatform {
            fail: true,
            restarts: AtomicU32::new(0),
        };
        let used = coordinator(None, exited.clone()).restart(Some(&platform)).await;

        assert_eq!(used, RestartMethod::ProcessExit);
        assert_eq!(platform.restarts.load(Ordering::SeqCst), 1);
        assert!(exited.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_exits_without_remote() {
        let exited = Arc::new(AtomicBool::new(false));
        let used = coordinator(None, exited.clone()).restart(None).await;
        assert_eq!(used, RestartMethod::ProcessExit);
        assert!(exited.load(Ordering::SeqCst));
        assert_eq!(used.to_string(), "process_exit");
    }
}
