use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::ApiError,
    protocol::{InitializeRequest, InitializeResponse},
};
use tracing::{debug, info};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Server-side chatbot initialization call.
#[async_trait]
pub trait Initializer: Send + Sync {
    async fn initialize(&self, request: &InitializeRequest) -> ClientResult<InitializeResponse>;
}

pub struct HttpInitializer {
    http: Client,
    endpoint: Url,
}

impl HttpInitializer {
    pub fn new(server_url: &Url) -> ClientResult<Self> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &Url) -> ClientResult<Self> {
        let endpoint = server_url
            .join("/initialize")
            .map_err(|err| ClientError::InvalidServerUrl {
                url: server_url.to_string(),
                reason: err.to_string(),
            })?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Initializer for HttpInitializer {
    async fn initialize(&self, request: &InitializeRequest) -> ClientResult<InitializeResponse> {
        debug!(
            endpoint = %self.endpoint,
            website_url = %request.website_url,
            "initialize: sending request"
        );
        let res = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let detail = res
                .json::<ApiError>()
                .await
                .ok()
                .map(|body| body.detail);
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        // The body is informational only; an unreadable one does not fail the call.
        let body = res.json::<InitializeResponse>().await.unwrap_or_default();
        info!(
            status = body.status.as_deref().unwrap_or("-"),
            message = body.message.as_deref().unwrap_or("-"),
            "initialize: server accepted request"
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_rooted_at_server_host() {
        let server_url = Url::parse("http://127.0.0.1:8000/static/index.html").expect("url");
        let initializer = HttpInitializer::new(&server_url).expect("initializer");
        assert_eq!(
            initializer.endpoint().as_str(),
            "http://127.0.0.1:8000/initialize"
        );
    }
}
