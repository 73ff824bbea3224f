//! Remote config provider port and the platform-API adapter.
//!
//! The provider mirrors settings on the hosting platform so they survive
//! redeploys. It is optional: the settings store works fully without it,
//! and every call here is bounded by `config::network::remote_timeout()`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use std::collections::HashMap;

use crate::core::config;
use crate::core::error::{AppError, AppResult};

/// Key/value config service addressed by an application identifier.
#[async_trait]
pub trait RemoteConfigProvider: Send + Sync {
    /// Fetches every config var of the application.
    async fn fetch_all(&self) -> AppResult<HashMap<String, String>>;

    /// Sets a single config var.
    async fn patch(&self, key: &str, value: &str) -> AppResult<()>;

    /// Restarts every running process of the application.
    async fn restart_processes(&self) -> AppResult<()>;
}

/// Heroku-compatible platform API client (`/apps/{app}/config-vars`, `/apps/{app}/dynos`).
pub struct HerokuConfigProvider {
    client: Client,
    base_url: String,
    app_name: String,
}

impl HerokuConfigProvider {
    pub fn new(base_url: &str, app_name: &str, api_key: &str) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.heroku+json; version=3"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| AppError::Validation(format!("Invalid API key header: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config::network::remote_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_name: app_name.to_string(),
        })
    }

    /// Builds a provider from HEROKU_APP_NAME / HEROKU_API_KEY, `None` unless both are set.
    pub fn from_env() -> Option<Self> {
        let app = config::remote::APP_NAME.as_deref()?;
        let key = config::remote::API_KEY.as_deref()?;
        match Self::new(&config::remote::API_URL, app, key) {
            Ok(provider) => Some(provider),
            Err(e) => {
                log::warn!("⚠️ Remote config provider disabled: {}", e);
                None
            }
        }
    }

    fn app_url(&self, resource: &str) -> String {
        format!(
            "{}/apps/{}/{}",
            self.base_url,
            urlencoding::encode(&self.app_name),
            resource
        )
    }

    fn check(response: &reqwest::Response) -> AppResult<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AppError::RemoteSync(format!("platform API responded {}", status)))
        }
    }
}

#[async_trait]
impl RemoteConfigProvider for HerokuConfigProvider {
    async fn fetch_all(&self) -> AppResult<HashMap<String, String>> {
        let response = self.client.get(self.app_url("config-vars")).send().await?;
        Self::check(&response)?;
        // Unset vars come back as null; treat them as absent
        let vars: HashMap<String, Option<String>> = response.json().await?;
        Ok(vars.into_iter().filter_map(|(k, v)| v.map(|v| (k, v))).collect())
    }

    async fn patch(&self, key: &str, value: &str) -> AppResult<()> {
        let body = HashMap::from([(key, value)]);
        let response = self.client.patch(self.app_url("config-vars")).json(&body).send().await?;
        Self::check(&response)
    }

    async fn restart_processes(&self) -> AppResult<()> {
        let response = self.client.delete(self.app_url("dynos")).send().await?;
        Self::check(&response)
    }
}
