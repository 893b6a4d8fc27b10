use std::io::Read;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::retry::{Exhausted, Retry, Sleeper, ThreadSleeper};

/// One result row, keyed by the remote column names.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub query: String,
    pub params: Vec<Value>,
}

impl QueryRequest {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            params: Vec::new(),
        }
    }
}

/// HTTP status and body as received, before interpretation.
#[derive(Debug, Clone)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("server reported status {0}")]
    Server(i64),

    #[error("malformed response: {0}")]
    Malformed(String),
}

pub trait Transport {
    fn send(&self, request: &QueryRequest) -> Result<RawReply, AttemptError>;
}

/// Blocking HTTPS transport. Each call builds its own agent, so no
/// connection is reused between queries.
pub struct HttpTransport {
    url: String,
    token: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(url: String, token: String, timeout: Duration) -> Self {
        Self { url, token, timeout }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &QueryRequest) -> Result<RawReply, AttemptError> {
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let result = agent
            .post(&self.url)
            .set("Accept", "application/json")
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Content-Type", "application/json")
            .send_json(request);
        let response = match result {
            Ok(response) => response,
            // Non-2xx still carries a JSON body worth inspecting.
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(t)) => return Err(AttemptError::Transport(t.to_string())),
        };
        let status = response.status();
        // into_string caps bodies at 10 MB; batched stock replies can exceed it.
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|e| AttemptError::Transport(e.to_string()))?;
        Ok(RawReply { status, body })
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    data: Option<Vec<Row>>,
    #[serde(rename = "statusCode", default)]
    status_code: Option<i64>,
    #[serde(default)]
    message: Option<Value>,
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

/// Classify one reply: rows on success, a retryable error otherwise.
pub fn interpret(reply: RawReply) -> Result<Vec<Row>, AttemptError> {
    let parsed: QueryResponse = match serde_json::from_str(&reply.body) {
        Ok(parsed) => parsed,
        Err(_) if reply.status >= 500 => return Err(AttemptError::Server(i64::from(reply.status))),
        Err(e) => return Err(AttemptError::Malformed(format!("{e}: {}", snippet(&reply.body)))),
    };
    match parsed.status_code {
        Some(code) if code >= 500 => return Err(AttemptError::Server(code)),
        Some(code) if code >= 400 => {
            let message = parsed.message.map(|m| m.to_string()).unwrap_or_default();
            tracing::warn!(status = code, "inspection endpoint rejected query {message}");
        }
        _ => {}
    }
    if parsed.data.is_none() && reply.status >= 500 {
        return Err(AttemptError::Server(i64::from(reply.status)));
    }
    Ok(parsed.data.unwrap_or_default())
}

pub struct QueryClient<T, S = ThreadSleeper> {
    transport: T,
    retry: Retry,
    sleeper: S,
}

impl<T: Transport> QueryClient<T, ThreadSleeper> {
    pub fn new(transport: T, retry: Retry) -> Self {
        Self {
            transport,
            retry,
            sleeper: ThreadSleeper,
        }
    }
}

impl<T: Transport, S: Sleeper> QueryClient<T, S> {
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> QueryClient<T, S2> {
        QueryClient {
            transport: self.transport,
            retry: self.retry,
            sleeper,
        }
    }

    /// Rows for `sql`, or the last failure once every attempt is spent.
    pub fn try_rows(&self, sql: &str) -> Result<Vec<Row>, Exhausted<AttemptError>> {
        let request = QueryRequest::new(sql);
        tracing::debug!(query = sql, "inspection query");
        self.retry.run(&self.sleeper, |_| {
            self.transport.send(&request).and_then(interpret)
        })
    }

    /// Rows for `sql`; exhausted retries count as no data.
    pub fn rows(&self, sql: &str) -> Vec<Row> {
        match self.try_rows(sql) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("{e}; treating as empty result");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
impl<T, S> QueryClient<T, S> {
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }
}
