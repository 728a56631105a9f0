use bytes::Bytes;
use reqwest::{Client, StatusCode, header};
use serde::Serialize;
use serde::de::IgnoredAny;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::connection::{ApiConnection, ProcessQuery};
use super::error::{LookupError, classify_transport_error};

/// Identifiers that match no real process; used only to probe reachability.
pub const CONNECTION_TEST_PROCESS: &str = "0";
pub const CONNECTION_TEST_CPF: &str = "00000000000";

/// One upstream response that made it back within the timeout.
struct UpstreamResponse {
    status: StatusCode,
    body: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionTestStatus {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionTestReport {
    pub message: String,
    pub status: ConnectionTestStatus,
    #[serde(skip)]
    pub http_status: StatusCode,
}

/// HTTP client for the external process API. One call per lookup, never retried.
pub struct ProcessLookupClient {
    client: Client,
    timeout: Duration,
}

impl ProcessLookupClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()?;
        Ok(Self { client, timeout })
    }

    /// Looks up a process and returns the upstream JSON body exactly as received.
    pub async fn lookup(&self, connection: &ApiConnection, query: &ProcessQuery) -> Result<Bytes, LookupError> {
        let response = self.send(connection, query).await?;

        match response.status {
            status if status.is_success() => {
                serde_json::from_slice::<IgnoredAny>(&response.body).map_err(|e| {
                    warn!(error = %e, "Upstream returned a success status with a non-JSON body.");
                    LookupError::Unexpected(format!("invalid upstream JSON: {e}"))
                })?;
                info!(
                    numero_processo = %query.numero_processo,
                    bytes = response.body.len(),
                    "Process lookup succeeded."
                );
                Ok(response.body)
            }
            status => Err(map_failure_status(status)),
        }
    }

    /// Probes the upstream with a dummy process. A 404 proves the API is reachable
    /// and accepted the token.
    pub async fn test_connection(&self, connection: &ApiConnection) -> ConnectionTestReport {
        let query = ProcessQuery {
            numero_processo: CONNECTION_TEST_PROCESS.to_owned(),
            cpf: CONNECTION_TEST_CPF.to_owned(),
        };

        match self.send(connection, &query).await {
            Ok(response) if response.status.is_success() || response.status == StatusCode::NOT_FOUND => {
                info!(upstream_status = response.status.as_u16(), "API connection test succeeded.");
                ConnectionTestReport {
                    message: "Conexão com a API estabelecida com sucesso. A API está acessível e o token foi aceito."
                        .to_string(),
                    status: ConnectionTestStatus::Success,
                    http_status: StatusCode::OK,
                }
            }
            Ok(response) => {
                let err = map_failure_status(response.status);
                let status = match err {
                    LookupError::InvalidToken => ConnectionTestStatus::Error,
                    _ => ConnectionTestStatus::Warning,
                };
                warn!(upstream_status = response.status.as_u16(), "API connection test got a failure status.");
                ConnectionTestReport {
                    message: err.client_message(),
                    status,
                    http_status: err.status_code(),
                }
            }
            Err(err) => connection_test_failure(err),
        }
    }

    async fn send(&self, connection: &ApiConnection, query: &ProcessQuery) -> Result<UpstreamResponse, LookupError> {
        let url = connection.lookup_url(query);
        debug!(host = ?url.host_str(), port = ?url.port(), "Sending upstream process lookup.");

        let request = self
            .client
            .get(url)
            .bearer_auth(connection.token())
            .header(header::ACCEPT, "application/json");

        // Dropping the future on expiry cancels the in-flight request.
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(UpstreamResponse { status, body })
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                let err = classify_transport_error(&e);
                warn!(error = %e, kind = %err, "Upstream process lookup failed.");
                Err(err)
            }
            Err(_elapsed) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Upstream process lookup timed out.");
                Err(LookupError::Timeout)
            }
        }
    }
}

fn map_failure_status(status: StatusCode) -> LookupError {
    match status {
        StatusCode::NOT_FOUND => LookupError::ProcessNotFound,
        StatusCode::UNAUTHORIZED => LookupError::InvalidToken,
        other => LookupError::UpstreamStatus(other),
    }
}

/// Report for a connection test that failed before or during the upstream call.
pub fn connection_test_failure(err: LookupError) -> ConnectionTestReport {
    ConnectionTestReport {
        message: err.client_message(),
        status: ConnectionTestStatus::Error,
        http_status: err.status_code(),
    }
}
