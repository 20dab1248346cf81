#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_derive::Deserialize;
use serde_json::json;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

/// Injected credentials seam for every network-calling component. Replaces
/// ambient token globals so callers can be handed a test double.
#[async_trait]
pub trait Credentials: Send + Sync {
    fn access_token(&self) -> String;

    /// Exchanges the refresh token for a new access token.
    async fn refresh(&self) -> Result<()>;

    /// Forgets both tokens. Called when a refresh fails or a refreshed request
    /// still comes back expired.
    fn clear(&self);
}

const TOKEN: &str = "token";
const REFRESH_TOKEN: &str = "refresh_token";

#[derive(Deserialize)]
struct RefreshEnvelope {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<RefreshData>,
}

#[derive(Deserialize)]
struct RefreshData {
    token: String,
    refresh_token: Option<String>,
}

pub struct TokenStore {
    url: String,
    tokens: DashMap<String, String>,
}

impl Default for TokenStore {
    fn default() -> TokenStore {
        return TokenStore::new(
            &Config::get(ConfigKey::ApiUrl),
            &Config::get(ConfigKey::AuthToken),
            &Config::get(ConfigKey::AuthRefreshToken),
        );
    }
}

impl TokenStore {
    pub fn new(url: &str, token: &str, refresh_token: &str) -> TokenStore {
        let tokens = DashMap::new();
        if !token.is_empty() {
            tokens.insert(TOKEN.to_string(), token.to_string());
        }
        if !refresh_token.is_empty() {
            tokens.insert(REFRESH_TOKEN.to_string(), refresh_token.to_string());
        }

        return TokenStore {
            url: url.to_string(),
            tokens,
        };
    }
}

#[async_trait]
impl Credentials for TokenStore {
    fn access_token(&self) -> String {
        if let Some(token) = self.tokens.get(TOKEN) {
            return token.to_string();
        }

        return "".to_string();
    }

    async fn refresh(&self) -> Result<()> {
        let refresh_token = match self.tokens.get(REFRESH_TOKEN) {
            Some(token) => token.to_string(),
            None => bail!("no refresh token available"),
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/auth/refresh", url = self.url))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Token refresh failed");
            bail!("token refresh failed");
        }

        let envelope = res.json::<RefreshEnvelope>().await?;
        if envelope.code != 0 {
            bail!(format!("token refresh rejected: {}", envelope.msg));
        }

        let data = match envelope.data {
            Some(data) => data,
            None => bail!("token refresh response carried no data"),
        };

        self.tokens.insert(TOKEN.to_string(), data.token);
        if let Some(refreshed) = data.refresh_token {
            self.tokens.insert(REFRESH_TOKEN.to_string(), refreshed);
        }

        return Ok(());
    }

    fn clear(&self) {
        self.tokens.clear();
    }
}
