//! GitHub GraphQL [`DiscussionApi`] over a repository's pull requests.
//!
//! Transport is a blocking `ureq` agent; response decoding lives in
//! [`decode_count`] and [`decode_batch`] so it can be tested without a
//! network.

use std::time::Duration;

use serde_json::{json, Value};

use mipsync_core::{config::DiscussionsConfig, ApiError, DiscussionApi, DiscussionBatch};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest `first`/`last` the GraphQL API accepts.
const MAX_PAGE: u64 = 100;

const COUNT_QUERY: &str = "query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) { pullRequests { totalCount } }
}";

const PAGE_QUERY: &str = "query($owner: String!, $name: String!, $first: Int!, $after: String) {
  repository(owner: $owner, name: $name) {
    pullRequests(first: $first, after: $after) {
      totalCount
      pageInfo { endCursor hasNextPage }
      edges { cursor node { id number title url state createdAt updatedAt author { login } } }
    }
  }
}";

const LAST_QUERY: &str = "query($owner: String!, $name: String!, $last: Int!, $before: String) {
  repository(owner: $owner, name: $name) {
    pullRequests(last: $last, before: $before) {
      totalCount
      pageInfo { endCursor hasNextPage startCursor hasPreviousPage }
      edges { cursor node { id number title url state createdAt updatedAt author { login } } }
    }
  }
}";

pub struct GithubDiscussionApi {
    agent: ureq::Agent,
    endpoint: String,
    owner: String,
    repo: String,
    token: String,
    page_size: u32,
}

impl GithubDiscussionApi {
    /// Build a client, reading the token from `config.token_env`.
    pub fn from_config(config: &DiscussionsConfig) -> Result<Self, ApiError> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ApiError::MissingToken(config.token_env.clone()))?;
        Ok(Self::new(config, token))
    }

    pub fn new(config: &DiscussionsConfig, token: String) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            endpoint: config.endpoint.clone(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            token,
            page_size: config.page_size.clamp(1, MAX_PAGE as u32),
        }
    }

    fn query(&self, query: &str, mut variables: Value) -> Result<Value, ApiError> {
        variables["owner"] = json!(self.owner);
        variables["name"] = json!(self.repo);
        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("bearer {}", self.token))
            .set("User-Agent", "mipsync")
            .send_json(json!({ "query": query, "variables": variables }));

        match response {
            Ok(r) => r
                .into_json::<Value>()
                .map_err(|e| ApiError::MalformedResponse(e.to_string())),
            Err(ureq::Error::Status(status, r)) => Err(ApiError::Status {
                status,
                body: r.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(ApiError::Http(e.to_string())),
        }
    }
}

impl DiscussionApi for GithubDiscussionApi {
    fn count(&self) -> Result<u64, ApiError> {
        decode_count(&self.query(COUNT_QUERY, json!({}))?)
    }

    fn fetch_page(&self, cursor: Option<&str>) -> Result<DiscussionBatch, ApiError> {
        let body = self.query(PAGE_QUERY, json!({ "first": self.page_size, "after": cursor }))?;
        decode_batch(&body)
    }

    fn fetch_last_n(&self, n: u64) -> Result<DiscussionBatch, ApiError> {
        fetch_backwards(n, |last, before| {
            self.query(LAST_QUERY, json!({ "last": last, "before": before }))
        })
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn connection(body: &Value) -> Result<&Value, ApiError> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        let messages: Vec<&str> = errors
            .iter()
            .filter_map(|e| e.get("message").and_then(Value::as_str))
            .collect();
        return Err(ApiError::MalformedResponse(messages.join("; ")));
    }
    body.pointer("/data/repository/pullRequests")
        .filter(|v| v.is_object())
        .ok_or_else(|| ApiError::MalformedResponse("missing data.repository.pullRequests".into()))
}

/// `totalCount` of a count response.
pub fn decode_count(body: &Value) -> Result<u64, ApiError> {
    connection(body)?
        .get("totalCount")
        .and_then(Value::as_u64)
        .ok_or_else(|| ApiError::MalformedResponse("missing totalCount".into()))
}

/// One page of a page or last-N response.
pub fn decode_batch(body: &Value) -> Result<DiscussionBatch, ApiError> {
    let conn = connection(body)?;
    let edges = conn
        .get("edges")
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| ApiError::MalformedResponse("missing edges".into()))?;
    let page_info = conn.get("pageInfo");
    Ok(DiscussionBatch {
        edges,
        end_cursor: page_info
            .and_then(|p| p.get("endCursor"))
            .and_then(Value::as_str)
            .map(str::to_string),
        has_next_page: page_info
            .and_then(|p| p.get("hasNextPage"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
        total_count: conn.get("totalCount").and_then(Value::as_u64),
    })
}

/// Collect the newest `n` edges by paging backwards at most [`MAX_PAGE`] at a
/// time. `fetch(last, before)` returns one raw response.
///
/// Edges come back oldest first. Cursor, next-page flag and total are taken
/// from the newest page, so the result reads like a single `last: n` page.
pub fn fetch_backwards<F>(n: u64, mut fetch: F) -> Result<DiscussionBatch, ApiError>
where
    F: FnMut(u64, Option<&str>) -> Result<Value, ApiError>,
{
    let mut merged: Option<DiscussionBatch> = None;
    let mut before: Option<String> = None;
    let mut remaining = n;

    while remaining > 0 {
        let body = fetch(remaining.min(MAX_PAGE), before.as_deref())?;
        let mut batch = decode_batch(&body)?;
        let fetched = batch.edges.len() as u64;
        let page_info = connection(&body)?.get("pageInfo");
        let has_previous = page_info
            .and_then(|p| p.get("hasPreviousPage"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        before = page_info
            .and_then(|p| p.get("startCursor"))
            .and_then(Value::as_str)
            .map(str::to_string);

        merged = Some(match merged {
            None => batch,
            Some(mut newer) => {
                batch.edges.append(&mut newer.edges);
                newer.edges = batch.edges;
                newer
            }
        });

        remaining = remaining.saturating_sub(fetched);
        if fetched == 0 || !has_previous || before.is_none() {
            break;
        }
    }

    Ok(merged.unwrap_or_default())
}
