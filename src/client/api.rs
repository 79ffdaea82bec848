//! HTTP client for the keeper server.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::api::{
    Code, Credentials, ErrorBody, HealthResponse, LoginResponse, RecordResponse, RegisterResponse,
    StatusResponse, VaultResponse,
};
use crate::models::{Kind, Record, Snapshot};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with an error status.
    #[error("{message}")]
    Status { code: Code, message: String },
    /// The request never completed: connection refused, deadline hit.
    #[error("request failed, please try again")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected response from server: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn code(&self) -> Option<Code> {
        match self {
            ClientError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.code() == Some(Code::AlreadyExists)
    }
}

#[derive(Debug, Clone)]
pub struct KeeperClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl KeeperClient {
    /// `timeout` bounds every call except login.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let request = self.http.get(self.url("/health")).timeout(self.timeout);
        self.send(request).await
    }

    pub async fn register(&self, login: &str, pass: &str) -> Result<RegisterResponse, ClientError> {
        let request = self
            .http
            .post(self.url("/api/register"))
            .json(&credentials(login, pass))
            .timeout(self.timeout);
        self.send(request).await
    }

    /// Authenticates and returns the full snapshot. No deadline applies.
    pub async fn login(&self, login: &str, pass: &str) -> Result<LoginResponse, ClientError> {
        let request = self
            .http
            .post(self.url("/api/login"))
            .json(&credentials(login, pass));
        self.send(request).await
    }

    pub async fn vault(&self, token: &str) -> Result<Snapshot, ClientError> {
        let request = self
            .http
            .get(self.url("/api/vault"))
            .bearer_auth(token)
            .timeout(self.timeout);
        let response: VaultResponse = self.send(request).await?;
        Ok(response.vault)
    }

    /// Fetches one live record; `None` when the server has no live copy.
    pub async fn get_record(
        &self,
        token: &str,
        kind: Kind,
        title: &str,
    ) -> Result<Option<Record>, ClientError> {
        let request = self
            .http
            .get(self.record_url(kind, title))
            .bearer_auth(token)
            .timeout(self.timeout);

        match self.send::<RecordResponse>(request).await {
            Ok(response) => Ok(Some(response.record)),
            Err(e) if e.code() == Some(Code::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn post_record(&self, token: &str, record: &Record) -> Result<(), ClientError> {
        let request = self
            .http
            .post(self.url(&format!("/api/records/{}", record.kind())))
            .bearer_auth(token)
            .json(record)
            .timeout(self.timeout);
        let _: StatusResponse = self.send(request).await?;
        Ok(())
    }

    pub async fn delete_record(
        &self,
        token: &str,
        kind: Kind,
        title: &str,
    ) -> Result<(), ClientError> {
        let request = self
            .http
            .delete(self.record_url(kind, title))
            .bearer_auth(token)
            .timeout(self.timeout);
        let _: StatusResponse = self.send(request).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn record_url(&self, kind: Kind, title: &str) -> String {
        self.url(&format!(
            "/api/records/{}/{}",
            kind,
            urlencoding::encode(title)
        ))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await.map_err(|e| {
            tracing::debug!("Request failed: {}", e);
            ClientError::Transport(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            tracing::debug!("Reading response failed: {}", e);
            ClientError::Transport(e)
        })?;

        if status.is_success() {
            return serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()));
        }

        match serde_json::from_slice::<ErrorBody>(&bytes) {
            Ok(body) => Err(ClientError::Status {
                code: body.code,
                message: body.message,
            }),
            Err(_) => Err(ClientError::Status {
                code: Code::from_http_status(status.as_u16()),
                message: status.to_string(),
            }),
        }
    }
}

fn credentials(login: &str, pass: &str) -> Credentials {
    Credentials {
        login: login.to_string(),
        pass: pass.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = KeeperClient::new("http://localhost:3200/", Duration::from_secs(3));
        assert_eq!(client.base_url(), "http://localhost:3200");
        assert_eq!(client.url("/api/vault"), "http://localhost:3200/api/vault");
    }

    #[test]
    fn test_record_url_encodes_title() {
        let client = KeeperClient::new("http://localhost:3200", Duration::from_secs(3));
        assert_eq!(
            client.record_url(Kind::Pair, "work mail/imap"),
            "http://localhost:3200/api/records/pair/work%20mail%2Fimap"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = KeeperClient::new(&format!("http://{}", addr), Duration::from_secs(3));
        let err = client.vault("token").await.unwrap_err();

        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(err.to_string(), "request failed, please try again");
    }

    /// Accepts connections and never answers them.
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_calls_give_up_at_the_request_deadline() {
        let deadline = Duration::from_millis(500);
        let client = KeeperClient::new(&silent_server().await, deadline);

        let started = std::time::Instant::now();
        let err = client.vault("token").await.unwrap_err();
        let elapsed = started.elapsed();
        assert!(matches!(&err, ClientError::Transport(e) if e.is_timeout()));
        assert_eq!(err.to_string(), "request failed, please try again");
        assert!(elapsed >= deadline, "gave up after {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(5), "gave up after {:?}", elapsed);

        let record = Record::new("note", crate::models::Payload::Text { body: "x".into() });
        let err = client.post_record("token", &record).await.unwrap_err();
        assert!(matches!(&err, ClientError::Transport(e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_login_has_no_deadline() {
        let client = KeeperClient::new(&silent_server().await, Duration::from_millis(200));

        let pending =
            tokio::time::timeout(Duration::from_millis(1500), client.login("u", "p")).await;
        assert!(pending.is_err(), "login finished early: {:?}", pending);
    }
}
