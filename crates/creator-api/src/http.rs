//! HTTP transport for the creator API.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use resolution::{
    CreatorAdvertisement, CreatorClient, CreatorError, CreatorName, CreatorRequest,
    CreatorResponse,
};
use tracing::debug;

/// A [`CreatorClient`] reaching one creator service over HTTP.
///
/// The client carries no call timeout of its own: the engine's fan-out gather
/// bounds every iteration, and an abandoned call completing late on the
/// service side has no effect on the coordinator.
pub struct HttpCreatorClient {
    name: CreatorName,
    resolve_url: Url,
    supported_types_url: Url,
    http: reqwest::Client,
}

impl HttpCreatorClient {
    /// Builds a client for the creator service rooted at `base_url`.
    ///
    /// `base_url` must end with a trailing slash for relative endpoint
    /// resolution to behave (e.g. `https://ci-creator.internal/api/`).
    pub fn new(name: CreatorName, base_url: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("invalid base URL for creator '{name}'"))?;
        let resolve_url = base
            .join("resolve")
            .with_context(|| format!("cannot derive resolve endpoint for creator '{name}'"))?;
        let supported_types_url = base.join("supported-types").with_context(|| {
            format!("cannot derive supported-types endpoint for creator '{name}'")
        })?;
        Ok(Self {
            name,
            resolve_url,
            supported_types_url,
            http: reqwest::Client::new(),
        })
    }

    /// The creator this client reaches.
    pub fn name(&self) -> &CreatorName {
        &self.name
    }

    /// Polls the creator's advertised support table.
    pub async fn advertised_support(&self) -> Result<CreatorAdvertisement, CreatorError> {
        let response = self
            .http
            .get(self.supported_types_url.clone())
            .send()
            .await
            .map_err(map_transport)?;
        let response = check_status(response).await?;
        response
            .json::<CreatorAdvertisement>()
            .await
            .map_err(|err| CreatorError::Protocol {
                reason: format!("undecodable advertisement: {err}"),
            })
    }
}

#[async_trait]
impl CreatorClient for HttpCreatorClient {
    async fn resolve(&self, request: CreatorRequest) -> Result<CreatorResponse, CreatorError> {
        debug!(
            creator = %self.name,
            fragments = request.dependencies.len(),
            url = %self.resolve_url,
            "sending resolve call"
        );
        let response = self
            .http
            .post(self.resolve_url.clone())
            .json(&request)
            .send()
            .await
            .map_err(map_transport)?;
        let response = check_status(response).await?;
        response
            .json::<CreatorResponse>()
            .await
            .map_err(|err| CreatorError::Protocol {
                reason: format!("undecodable resolve response: {err}"),
            })
    }
}

fn map_transport(err: reqwest::Error) -> CreatorError {
    CreatorError::Transport {
        reason: err.to_string(),
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CreatorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("<unreadable body>"));
    if status == StatusCode::SERVICE_UNAVAILABLE {
        Err(CreatorError::Transport {
            reason: format!("creator unavailable: {message}"),
        })
    } else {
        Err(CreatorError::Service {
            message: format!("{status}: {message}"),
        })
    }
}
