use thiserror::Error;
use tracing::{debug, warn};

use crate::graphql::{GraphQlError, GraphQlRequest, GraphQlResponse};
use crate::operations::Operation;

/// Where the backend listens when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000/graphql";

const USER_AGENT: &str = concat!("reltrack/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend returned status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Backend reported errors: {}", join_errors(.0))]
    GraphQl(Vec<GraphQlError>),

    #[error("Response for {operation} carried no data")]
    MissingData { operation: &'static str },

    #[error("JSON parsing failed: {0}")]
    Parse(#[from] serde_json::Error),
}

fn join_errors(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl GatewayError {
    /// Transport-level failures never reached the resolver
    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Network(_))
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Client for the tracker's GraphQL endpoint
///
/// Build one at startup and hand out references. There is no retry and no
/// request timeout here; a failed call is reported once and the user decides
/// whether to try again.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    endpoint: String,
}

impl GatewayClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_user_agent(endpoint, USER_AGENT)
    }

    pub fn with_user_agent(endpoint: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Run one operation and return its `data` payload
    pub async fn execute<O: Operation>(&self, variables: &O::Variables) -> Result<O::Data> {
        debug!("Executing {} against {}", O::NAME, self.endpoint);

        let body = GraphQlRequest {
            query: O::DOCUMENT,
            operation_name: O::NAME,
            variables,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| warn!("{} failed to send: {}", O::NAME, e))?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // GraphQL servers often put the useful part in an errors array
            // even on 4xx/5xx, so prefer that when it parses.
            if let Ok(envelope) = serde_json::from_str::<GraphQlResponse<serde_json::Value>>(&text) {
                if !envelope.errors.is_empty() {
                    warn!("{} rejected with status {}", O::NAME, status);
                    return Err(GatewayError::GraphQl(envelope.errors));
                }
            }

            warn!("{} failed with status {}", O::NAME, status);
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: GraphQlResponse<O::Data> = serde_json::from_str(&text)?;

        if !envelope.errors.is_empty() {
            warn!("{} returned {} error(s)", O::NAME, envelope.errors.len());
            return Err(GatewayError::GraphQl(envelope.errors));
        }

        envelope
            .data
            .ok_or(GatewayError::MissingData { operation: O::NAME })
    }
}
