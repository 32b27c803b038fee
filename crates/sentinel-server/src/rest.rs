//! REST API of the orchestrator
//!
//! Proposals are created here, signers post their signatures, and anyone
//! may ask for status or trigger execution once the quorum is met.

use axum::{
    extract::{Path, State},
    http::Method,
    response::Json,
    routing::{get, post},
    Router,
};
use sentinel_crypto::RecoverableSignature;
use sentinel_errors::Error;
use sentinel_telemetry::{metrics_router, ExecutionOutcome};
use sentinel_types::api::{
    CreateTransactionRequest, CreateTransactionResponse, ExecutionReport, OwnersByRole,
    SafeInfoResponse, SignTransactionRequest, SignatureInfo, SignerEntry, SubmitReceipt,
    TransactionInfoResponse, TransactionStatusResponse,
};
use sentinel_types::config::ServerConfig;
use sentinel_types::{Address, ProposalId, ProposalState, SignerRole, TransactionProposal};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::debug;

use crate::error::{error_response, rejection_reason, ApiResult};
use crate::health::health_handler;
use crate::state::AppState;

fn parse_id(raw: &str) -> Result<ProposalId, Error> {
    raw.parse()
}

fn parse_call_data(raw: Option<&str>) -> Result<Option<Vec<u8>>, Error> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let payload = raw.strip_prefix("0x").unwrap_or(raw);
    if payload.is_empty() {
        return Ok(None);
    }
    hex::decode(payload)
        .map(Some)
        .map_err(|e| Error::InvalidHex(format!("call data: {e}")))
}

/// Owners grouped by role, for display
async fn safe_info(State(state): State<Arc<AppState>>) -> Json<SafeInfoResponse> {
    let policy = state.collector.policy();
    let mut owners = OwnersByRole::default();
    for (address, role) in policy.owners() {
        match role {
            SignerRole::Human => owners.humans.push(*address),
            SignerRole::Agent => owners.agents.push(*address),
        }
    }

    Json(SafeInfoResponse {
        threshold: policy.threshold(),
        total_signers: policy.total_signers(),
        owners,
        next_nonce: state.next_nonce(),
    })
}

async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTransactionRequest>,
) -> ApiResult<CreateTransactionResponse> {
    let destination: Address = request.to.parse().map_err(error_response)?;
    let value: u128 = request.value.trim().parse().map_err(|_| {
        error_response(Error::InvalidRequest(format!(
            "invalid value: {}",
            request.value
        )))
    })?;
    let call_data = parse_call_data(request.data.as_deref()).map_err(error_response)?;

    let proposal = TransactionProposal::new(destination, value, call_data, state.allocate_nonce());
    let digest = proposal.digest;
    let tx_id = state.collector.register(proposal).await;
    state.metrics.proposal_created();

    Ok(Json(CreateTransactionResponse {
        tx_id,
        safe_tx_hash: digest,
        required_signatures: state.collector.policy().threshold(),
        current_signatures: 0,
    }))
}

async fn get_transaction(
    Path(tx_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<TransactionInfoResponse> {
    let id = parse_id(&tx_id).map_err(error_response)?;
    let snapshot = state.collector.snapshot(&id).await.map_err(error_response)?;

    let signatures = snapshot
        .records
        .iter()
        .map(|record| SignatureInfo {
            signer: record.approval.signer,
            signer_role: record.role,
            signed_at: record.received_at,
        })
        .collect();

    Ok(Json(TransactionInfoResponse {
        tx_id: id,
        safe_tx_hash: snapshot.proposal.digest,
        transaction: snapshot.proposal,
        signatures,
        status: snapshot.status.state,
        ready_to_execute: snapshot.status.state == ProposalState::Ready,
    }))
}

async fn sign_transaction(
    Path(tx_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignTransactionRequest>,
) -> ApiResult<SubmitReceipt> {
    let parsed = parse_id(&tx_id).and_then(|id| {
        let signer: Address = request.signer_address.parse()?;
        let signature: RecoverableSignature = request.signature.parse()?;
        Ok((id, signer, signature))
    });
    let result = match parsed {
        Ok((id, signer, signature)) => {
            state
                .collector
                .submit_signature(&id, signer, signature)
                .await
        }
        Err(err) => Err(err),
    };

    match result {
        Ok(receipt) => {
            state.metrics.signature_accepted();
            Ok(Json(receipt))
        }
        Err(err) => {
            state.metrics.signature_rejected(rejection_reason(&err));
            Err(error_response(err))
        }
    }
}

async fn execute_transaction(
    Path(tx_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<ExecutionReport> {
    let id = parse_id(&tx_id).map_err(error_response)?;
    match state.collector.execute(&id).await {
        Ok(report) => {
            let outcome = if report.execution_result.success {
                ExecutionOutcome::Success
            } else {
                ExecutionOutcome::SinkFailed
            };
            state.metrics.execution(outcome);
            Ok(Json(report))
        }
        Err(err) => {
            state.metrics.execution(ExecutionOutcome::Rejected);
            Err(error_response(err))
        }
    }
}

async fn transaction_status(
    Path(tx_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<TransactionStatusResponse> {
    let id = parse_id(&tx_id).map_err(error_response)?;
    let status = state
        .collector
        .quorum_status(&id)
        .await
        .map_err(error_response)?;
    debug!(proposal_id = %id, state = %status.state, "status query");

    let policy = state.collector.policy();
    let signers = status
        .signer_identities
        .iter()
        .map(|address| SignerEntry {
            address: *address,
            role: policy.role_of(address),
        })
        .collect();

    Ok(Json(TransactionStatusResponse {
        tx_id: id,
        status: status.state,
        signatures_collected: status.collected_count,
        required_signatures: status.threshold,
        signers,
    }))
}

/// Create the orchestrator router with its middleware stack
pub fn create_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(86400));

    let registry = state.registry.clone();

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/safe/info", get(safe_info))
        .route("/api/v1/transactions", post(create_transaction))
        .route("/api/v1/transactions/:tx_id", get(get_transaction))
        .route("/api/v1/transactions/:tx_id/sign", post(sign_transaction))
        .route("/api/v1/transactions/:tx_id/execute", post(execute_transaction))
        .route("/api/v1/transactions/:tx_id/status", get(transaction_status))
        .with_state(state)
        .merge(metrics_router(registry))
        // Outermost to innermost
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        )
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::LoggingExecutor;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sentinel_crypto::{sign_digest, PrivateKey};
    use sentinel_quorum::{Collector, QuorumPolicy};
    use sentinel_telemetry::{MetricsRegistry, QuorumMetrics};
    use sentinel_types::api::ErrorResponse;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt; // for `oneshot`

    fn app_with_policy(policy: QuorumPolicy) -> Router {
        let registry = MetricsRegistry::new();
        let metrics = QuorumMetrics::register(&registry).unwrap();
        let collector = Arc::new(Collector::new(policy, Arc::new(LoggingExecutor)));
        let state = Arc::new(AppState::new(collector, registry, metrics));
        create_router(state, &ServerConfig::default())
    }

    fn app(threshold: usize, total: usize) -> Router {
        app_with_policy(QuorumPolicy::new(threshold, total).unwrap())
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    fn decode<T: DeserializeOwned>(body: &[u8]) -> T {
        serde_json::from_slice(body).unwrap()
    }

    async fn propose(app: &Router) -> CreateTransactionResponse {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/transactions",
            Some(serde_json::json!({
                "to": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
                "value": "1000000000000000000",
                "data": "0x"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        decode(&body)
    }

    async fn sign(app: &Router, tx: &CreateTransactionResponse, key: &PrivateKey) -> (StatusCode, Vec<u8>) {
        let signature = sign_digest(key, &tx.safe_tx_hash).unwrap();
        send(
            app,
            Method::POST,
            &format!("/api/v1/transactions/{}/sign", tx.tx_id),
            Some(serde_json::json!({
                "signer_address": key.address().to_string(),
                "signature": signature.to_hex(),
            })),
        )
        .await
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = app(1, 1);
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        let health: serde_json::Value = decode(&body);
        assert_eq!(health["status"], "ok");
        assert_eq!(health["open_proposals"], 0);
    }

    #[tokio::test]
    async fn test_full_collection_flow() {
        let app = app(2, 3);
        let tx = propose(&app).await;
        assert_eq!(tx.required_signatures, 2);
        assert_eq!(tx.current_signatures, 0);

        let keys: Vec<PrivateKey> = (0..3).map(|_| PrivateKey::random()).collect();

        let (status, body) = sign(&app, &tx, &keys[0]).await;
        assert_eq!(status, StatusCode::OK);
        let receipt: SubmitReceipt = decode(&body);
        assert_eq!(receipt.collected_count, 1);
        assert_eq!(receipt.state, ProposalState::Open);

        // Not enough signatures yet
        let uri = format!("/api/v1/transactions/{}/execute", tx.tx_id);
        let (status, body) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let error: ErrorResponse = decode(&body);
        assert_eq!(error.code, sentinel_errors::codes::QUORUM_NOT_MET);

        let (status, body) = sign(&app, &tx, &keys[1]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decode::<SubmitReceipt>(&body).state, ProposalState::Ready);

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/transactions/{}", tx.tx_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let info: TransactionInfoResponse = decode(&body);
        assert!(info.ready_to_execute);
        assert_eq!(info.signatures.len(), 2);
        assert_eq!(info.safe_tx_hash, tx.safe_tx_hash);

        let (status, body) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let report: ExecutionReport = decode(&body);
        assert_eq!(report.state, ProposalState::Executed);
        assert!(report.execution_result.success);
        assert!(report.execution_result.tx_hash.is_some());

        let (status, _) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Late signature is recorded, state stays Executed
        let (status, body) = sign(&app, &tx, &keys[2]).await;
        assert_eq!(status, StatusCode::OK);
        let receipt: SubmitReceipt = decode(&body);
        assert_eq!(receipt.collected_count, 3);
        assert_eq!(receipt.state, ProposalState::Executed);

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/transactions/{}/status", tx.tx_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let status_body: TransactionStatusResponse = decode(&body);
        assert_eq!(status_body.signatures_collected, 3);
        assert_eq!(status_body.status, ProposalState::Executed);
    }

    #[tokio::test]
    async fn test_duplicate_and_invalid_signatures() {
        let app = app(2, 3);
        let tx = propose(&app).await;
        let key = PrivateKey::random();

        assert_eq!(sign(&app, &tx, &key).await.0, StatusCode::OK);
        let (status, body) = sign(&app, &tx, &key).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            decode::<ErrorResponse>(&body).code,
            sentinel_errors::codes::DUPLICATE_SIGNER
        );

        let other = PrivateKey::random();
        let signature = sign_digest(&other, &tx.safe_tx_hash).unwrap();
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/transactions/{}/sign", tx.tx_id),
            Some(serde_json::json!({
                "signer_address": key.address().to_string(),
                "signature": signature.to_hex(),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/transactions/{}/sign", tx.tx_id),
            Some(serde_json::json!({
                "signer_address": other.address().to_string(),
                "signature": "0x1234",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, Method::GET, "/metrics", None).await;
        let metrics = String::from_utf8(body).unwrap();
        assert!(metrics.contains("sentinel_signatures_accepted_total 1"));
        assert!(metrics.contains(r#"reason="duplicate_signer""#));
    }

    #[tokio::test]
    async fn test_unknown_transaction() {
        let app = app(1, 1);
        for uri in [
            "/api/v1/transactions/not-a-uuid".to_string(),
            format!("/api/v1/transactions/{}/status", ProposalId::new()),
        ] {
            let (status, _) = send(&app, Method::GET, &uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let app = app(1, 1);
        for body in [
            serde_json::json!({"to": "0x1234", "value": "1"}),
            serde_json::json!({"to": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8", "value": "-1"}),
            serde_json::json!({"to": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8", "value": "1", "data": "0xzz"}),
        ] {
            let (status, _) = send(&app, Method::POST, "/api/v1/transactions", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_nonce_changes_digest() {
        let app = app(1, 1);
        let first = propose(&app).await;
        let second = propose(&app).await;
        assert_ne!(first.safe_tx_hash, second.safe_tx_hash);

        let (_, body) = send(&app, Method::GET, "/api/v1/safe/info", None).await;
        let info: SafeInfoResponse = decode(&body);
        assert_eq!(info.next_nonce, 2);
    }

    #[tokio::test]
    async fn test_safe_info_groups_owners() {
        let human = PrivateKey::random();
        let agent = PrivateKey::random();
        let policy = QuorumPolicy::new(1, 2)
            .unwrap()
            .with_owners([
                (human.address(), SignerRole::Human),
                (agent.address(), SignerRole::Agent),
            ])
            .unwrap();
        let app = app_with_policy(policy);

        let (status, body) = send(&app, Method::GET, "/api/v1/safe/info", None).await;
        assert_eq!(status, StatusCode::OK);
        let info: SafeInfoResponse = decode(&body);
        assert_eq!(info.threshold, 1);
        assert_eq!(info.owners.humans, vec![human.address()]);
        assert_eq!(info.owners.agents, vec![agent.address()]);

        let tx = propose(&app).await;
        let outsider = PrivateKey::random();
        let (status, _) = sign(&app, &tx, &outsider).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let app = app(1, 1);
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/v1/safe/info")
                    .header("Origin", "https://example.com")
                    .header("Access-Control-Request-Method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert!(headers.contains_key("access-control-allow-origin"));
        assert!(headers.contains_key("access-control-allow-methods"));
    }
}
