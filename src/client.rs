//! HTTP client for the ClickHouse backend
//!
//! Both operations are a single POST against the ClickHouse HTTP interface:
//! the SQL template travels in the `query` parameter, select arguments as
//! `param_*` parameters, insert rows as a JSONEachRow body. No retries.

use reqwest::{header::HeaderMap, Client};
use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::{PastilaError, Result};
use crate::types::{InsertRow, SelectResponse, SelectRow};

/// Response header carrying the backend-assigned query id
pub const QUERY_ID_HEADER: &str = "X-ClickHouse-Query-Id";

/// Newest row for a fingerprint/hash pair
pub const SELECT_QUERY: &str = "
SELECT
	toBool(is_encrypted) as is_encrypted,
	content
FROM data
WHERE
    fingerprint = reinterpretAsUInt32(unhex({fingerprintHex:String})) AND
    hash = reinterpretAsUInt128(unhex({hashHex:String}))
ORDER BY time LIMIT 1 FORMAT JSONEachRow";

pub const INSERT_QUERY: &str = "
INSERT INTO data (hash_hex, fingerprint_hex, prev_hash_hex, prev_fingerprint_hex, is_encrypted, content)
FORMAT JSONEachRow";

/// Low-level access to the `data` table
#[derive(Clone)]
pub struct StorageClient {
    clickhouse_url: String,
    client: Client,
}

impl StorageClient {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            clickhouse_url: config.clickhouse_url.clone(),
            client,
        })
    }

    /// Fetch the stored row for a paste
    ///
    /// An empty result set is [`PastilaError::NotFound`]; an unparsable one
    /// is [`PastilaError::InvalidLocator`].
    pub async fn select(&self, fingerprint_hex: &str, hash_hex: &str) -> Result<SelectResponse> {
        let (response, request_id) = self
            .execute(
                SELECT_QUERY,
                &[
                    ("param_fingerprintHex", fingerprint_hex),
                    ("param_hashHex", hash_hex),
                ],
                None,
            )
            .await?;

        let body = response.bytes().await?;
        let row = serde_json::Deserializer::from_slice(&body)
            .into_iter::<SelectRow>()
            .next();

        match row {
            Some(Ok(row)) => {
                debug!(
                    request_id = %request_id,
                    encrypted = row.is_encrypted,
                    "Selected paste"
                );
                Ok(SelectResponse { row, request_id })
            }
            Some(Err(e)) => Err(PastilaError::InvalidLocator(format!(
                "malformed ClickHouse response: {}",
                e
            ))),
            None => Err(PastilaError::NotFound(format!(
                "{}/{}",
                fingerprint_hex, hash_hex
            ))),
        }
    }

    /// Store one row, returning the backend query id
    pub async fn insert(&self, row: &InsertRow) -> Result<String> {
        let mut body = serde_json::to_vec(row)?;
        body.push(b'\n');

        let (_response, request_id) = self.execute(INSERT_QUERY, &[], Some(body)).await?;

        debug!(
            request_id = %request_id,
            hash = %row.hash_hex,
            encrypted = row.is_encrypted,
            "Inserted paste"
        );
        Ok(request_id)
    }

    async fn execute(
        &self,
        query: &str,
        params: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<(reqwest::Response, String)> {
        let mut request = self
            .client
            .post(&self.clickhouse_url)
            .query(&[("query", query)]);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;

        // Without a query id we are not talking to ClickHouse at all
        let request_id = match query_id(response.headers()) {
            Some(id) => id,
            None => {
                return Err(PastilaError::InvalidLocator(
                    "missing query id".to_string(),
                ))
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => format!("failed to read response body: {}", e),
            };
            return Err(PastilaError::Status { status, body });
        }

        Ok((response, request_id))
    }
}

fn query_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(QUERY_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
