//! Outbound command seam and its HTTP implementation against the control bridge.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::ControlCommand;
use tracing::debug;
use url::Url;

use crate::error::TransportError;

#[async_trait]
pub trait ControlTransport: Send + Sync {
    /// Sends one command and resolves with the response body once the server acknowledged it.
    async fn send(&self, command: &ControlCommand) -> Result<String, TransportError>;
}

#[async_trait]
impl<T: ControlTransport + ?Sized> ControlTransport for Arc<T> {
    async fn send(&self, command: &ControlCommand) -> Result<String, TransportError> {
        (**self).send(command).await
    }
}

pub struct HttpControlTransport {
    http: Client,
    base_url: Url,
}

impl HttpControlTransport {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let mut base_url = Url::parse(server_url.trim()).map_err(|source| {
            TransportError::InvalidUrl {
                url: server_url.to_string(),
                source,
            }
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(TransportError::UnsupportedScheme(
                base_url.scheme().to_string(),
            ));
        }
        // Relative joins only keep a path prefix when it ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, command: &ControlCommand) -> Result<Url, TransportError> {
        let relative = command.path().trim_start_matches('/');
        self.base_url
            .join(relative)
            .map_err(|source| TransportError::InvalidUrl {
                url: format!("{}{relative}", self.base_url),
                source,
            })
    }
}

#[async_trait]
impl ControlTransport for HttpControlTransport {
    async fn send(&self, command: &ControlCommand) -> Result<String, TransportError> {
        let url = self.endpoint(command)?;
        debug!(endpoint = command.path(), address = ?command.address(), "issuing control request");

        let response = self
            .http
            .post(url)
            .query(&command.query())
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(endpoint = command.path(), status = status.as_u16(), "control request acknowledged");
        Ok(body)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
