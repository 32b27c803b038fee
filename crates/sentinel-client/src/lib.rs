//! Client library for the sentinel orchestrator.
//!
//! [`OrchestratorClient`] speaks the orchestrator's JSON API; the [`cli`]
//! module builds the `sentinel-cli` tool on top of it and the local
//! keyring.

pub mod cli;

use reqwest::{Client as HttpClient, Response};
use sentinel_keyring::KeyringError;
use sentinel_types::api::{
    CreateTransactionRequest, CreateTransactionResponse, ErrorResponse, ExecutionReport,
    SafeInfoResponse, SignTransactionRequest, SubmitReceipt, TransactionInfoResponse,
    TransactionStatusResponse,
};
use sentinel_types::config::ClientConfig;
use sentinel_types::{ConfigError, ProposalId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request error
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("json parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The orchestrator answered with an error body
    #[error("orchestrator error {code} ({status}): {message}")]
    Api {
        status: u16,
        code: u32,
        message: String,
    },

    #[error("keyring error: {0}")]
    Keyring(#[from] KeyringError),

    #[error(transparent)]
    Sentinel(#[from] sentinel_errors::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// HTTP client for the orchestrator API
#[derive(Clone, Debug)]
pub struct OrchestratorClient {
    /// API root, e.g. `http://localhost:3001/api/v1`
    base_url: Url,
    http_client: HttpClient,
}

impl OrchestratorClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(
            &config.orchestrator_url,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let root = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{root}/{path}"))?)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await?;
        let (code, message) = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(err) => (err.code, err.error),
            Err(_) => (sentinel_errors::codes::INTERNAL, body),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = self.http_client.get(url).send().await?;
        Self::decode(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: Option<&B>) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let mut request = self.http_client.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        Self::decode(request.send().await?).await
    }

    /// `GET /health` on the server root
    pub async fn health(&self) -> Result<serde_json::Value> {
        let url = self.base_url.join("/health")?;
        let response = self.http_client.get(url).send().await?;
        Self::decode(response).await
    }

    pub async fn safe_info(&self) -> Result<SafeInfoResponse> {
        self.get("safe/info").await
    }

    pub async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> Result<CreateTransactionResponse> {
        self.post("transactions", Some(request)).await
    }

    pub async fn get_transaction(&self, tx_id: &ProposalId) -> Result<TransactionInfoResponse> {
        self.get(&format!("transactions/{tx_id}")).await
    }

    pub async fn sign_transaction(
        &self,
        tx_id: &ProposalId,
        request: &SignTransactionRequest,
    ) -> Result<SubmitReceipt> {
        self.post(&format!("transactions/{tx_id}/sign"), Some(request))
            .await
    }

    pub async fn execute_transaction(&self, tx_id: &ProposalId) -> Result<ExecutionReport> {
        self.post::<(), _>(&format!("transactions/{tx_id}/execute"), None)
            .await
    }

    pub async fn transaction_status(
        &self,
        tx_id: &ProposalId,
    ) -> Result<TransactionStatusResponse> {
        self.get(&format!("transactions/{tx_id}/status")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_crypto::{sign_digest, PrivateKey};
    use sentinel_server::OrchestratorServer;
    use sentinel_types::{Config, ProposalState};
    use tokio::net::TcpListener;

    /// Serve an orchestrator on an ephemeral port and return its API root
    async fn spawn_orchestrator(threshold: usize, total: usize) -> String {
        let mut config = Config::default();
        config.quorum.threshold = threshold;
        config.quorum.total_signers = total;
        let server = OrchestratorServer::new(&config).unwrap();
        let app = server.router();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/v1")
    }

    #[test]
    fn test_endpoint_keeps_api_prefix() {
        let client =
            OrchestratorClient::new("http://localhost:3001/api/v1/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            client.endpoint("safe/info").unwrap().as_str(),
            "http://localhost:3001/api/v1/safe/info"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            OrchestratorClient::new("not a url", Duration::from_secs(1)),
            Err(ClientError::Url(_))
        ));
    }

    #[tokio::test]
    async fn test_round_trip_against_orchestrator() {
        let base = spawn_orchestrator(1, 2).await;
        let client = OrchestratorClient::new(&base, Duration::from_secs(5)).unwrap();

        let health = client.health().await.unwrap();
        assert_eq!(health["status"], "ok");

        let created = client
            .create_transaction(&CreateTransactionRequest {
                to: "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".to_string(),
                value: "42".to_string(),
                data: None,
            })
            .await
            .unwrap();
        assert_eq!(created.required_signatures, 1);

        let key = PrivateKey::random();
        let signature = sign_digest(&key, &created.safe_tx_hash).unwrap();
        let receipt = client
            .sign_transaction(
                &created.tx_id,
                &SignTransactionRequest {
                    signer_address: key.address().to_string(),
                    signature: signature.to_hex(),
                },
            )
            .await
            .unwrap();
        assert_eq!(receipt.state, ProposalState::Ready);

        let report = client.execute_transaction(&created.tx_id).await.unwrap();
        assert_eq!(report.state, ProposalState::Executed);

        let status = client.transaction_status(&created.tx_id).await.unwrap();
        assert_eq!(status.signatures_collected, 1);
        assert_eq!(status.status, ProposalState::Executed);
    }

    #[tokio::test]
    async fn test_api_errors_carry_code() {
        let base = spawn_orchestrator(1, 1).await;
        let client = OrchestratorClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client
            .transaction_status(&ProposalId::new())
            .await
            .unwrap_err();
        match err {
            ClientError::Api { status, code, .. } => {
                assert_eq!(status, 404);
                assert_eq!(code, sentinel_errors::codes::NOT_FOUND);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
