use flow_vision_types::{Bytes, async_trait, reqwest};
use std::{sync::OnceLock, time::Duration};

/// HTTP capability handed to model loaders.
///
/// Loaders never reach for a global client; whoever builds the node decides
/// how remote models are fetched (proxy, cache, offline mirror, test double).
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> flow_vision_types::Result<Bytes>;
}

/// Default [`HttpFetch`] backed by `reqwest`.
#[derive(Debug, Default)]
pub struct ReqwestFetch {
    timeout: Option<Duration>,
    /// Built on first use so constructing nodes stays cheap.
    client: OnceLock<reqwest::Client>,
}

impl ReqwestFetch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeout for a whole request, body included.
    pub fn with_timeout(timeout: Duration) -> Self {
        ReqwestFetch {
            timeout: Some(timeout),
            client: OnceLock::new(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn client(&self) -> flow_vision_types::Result<&reqwest::Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(self.client.get_or_init(|| client))
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn fetch(&self, url: &str) -> flow_vision_types::Result<Bytes> {
        tracing::debug!(url = %url, "Fetching model asset");
        let response = self.client()?.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(flow_vision_types::anyhow!(
                "Request to {} failed with status {}: {}",
                url,
                status,
                body_text
            ));
        }

        Ok(response.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_kept_for_the_client() {
        assert_eq!(ReqwestFetch::new().timeout(), None);
        let fetch = ReqwestFetch::with_timeout(Duration::from_secs(5));
        assert_eq!(fetch.timeout(), Some(Duration::from_secs(5)));
    }
}
