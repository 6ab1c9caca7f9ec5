// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use factly_app::{CategoryFilter, Fact, FactId, VoteKind};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const FACTS_TABLE: &str = "facts";
pub const ORDER_COLUMN: &str = "votesInteresting";
pub const SELECT_ROW_CAP: usize = 1000;

/// A fact as submitted: the server assigns the id and zeroes the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewFact {
    pub text: String,
    pub source: String,
    pub category: String,
}

/// Blocking client for the hosted facts table. One instance per process;
/// every call performs exactly one request, with no retry or dedup.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    api_key: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }
        if api_key.trim().is_empty() {
            bail!("api.api_key must not be empty");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            api_key: api_key.to_owned(),
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Cheap reachability probe: a one-row select against the facts table.
    pub fn ping(&self) -> Result<()> {
        let response = self
            .authorize(self.http.get(self.table_url()))
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(())
    }

    /// Selects all fact columns, optionally filtered by category equality,
    /// ordered by interesting-votes descending, capped at 1000 rows.
    pub fn select_facts(&self, filter: CategoryFilter) -> Result<Vec<Fact>> {
        let response = self
            .authorize(self.http.get(self.table_url()))
            .query(&select_params(filter))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        response.json().context("decode fact rows")
    }

    /// Inserts one fact and returns the created row as the server stored it.
    pub fn insert_fact(&self, new_fact: &NewFact) -> Result<Fact> {
        let response = self
            .authorize(self.http.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(new_fact)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let rows: Vec<Fact> = response.json().context("decode inserted fact")?;
        single_row(rows, "insert")
    }

    /// Sets one vote column to `current + 1` on the fact with the given id
    /// and returns the updated row. The caller's `current` value is what its
    /// mirror shows; the server's returned row wins regardless.
    pub fn increment_vote(&self, id: FactId, kind: VoteKind, current: i64) -> Result<Fact> {
        let response = self
            .authorize(self.http.patch(self.table_url()))
            .query(&[("id", format!("eq.{}", id.get()))])
            .header("Prefer", "return=representation")
            .json(&vote_patch(kind, current))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let rows: Vec<Fact> = response.json().context("decode updated fact")?;
        single_row(rows, "vote update")
    }

    fn table_url(&self) -> String {
        format!("{}/{}", self.base_url, FACTS_TABLE)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }
}

fn select_params(filter: CategoryFilter) -> Vec<(&'static str, String)> {
    let mut params = vec![("select", "*".to_owned())];
    if let CategoryFilter::Only(name) = filter {
        params.push(("category", format!("eq.{name}")));
    }
    params.push(("order", format!("{ORDER_COLUMN}.desc")));
    params.push(("limit", SELECT_ROW_CAP.to_string()));
    params
}

fn vote_patch(kind: VoteKind, current: i64) -> serde_json::Map<String, serde_json::Value> {
    let mut body = serde_json::Map::new();
    body.insert(
        kind.column().to_owned(),
        serde_json::Value::from(current + 1),
    );
    body
}

fn single_row(rows: Vec<Fact>, action: &str) -> Result<Fact> {
    let count = rows.len();
    if count != 1 {
        bail!("{action} returned {count} rows; expected exactly one");
    }
    rows.into_iter()
        .next()
        .ok_or_else(|| anyhow!("{action} returned no rows"))
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!("cannot reach {base_url} -- check [api].base_url and your network ({error})")
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<TableErrorEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return anyhow!("table service error ({}): {}", status.as_u16(), message);
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("table service error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("table service returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct TableErrorEnvelope {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{Client, NewFact, clean_error_response, select_params, single_row, vote_patch};
    use factly_app::{CategoryFilter, Fact, FactId, VoteKind};
    use reqwest::StatusCode;
    use std::time::Duration;

    fn fact(id: i64) -> Fact {
        Fact {
            id: FactId::new(id),
            text: "t".to_owned(),
            source: "https://example.com".to_owned(),
            category: "science".to_owned(),
            votes_interesting: 0,
            votes_mindblowing: 0,
            votes_false: 0,
        }
    }

    #[test]
    fn select_params_for_all_categories() {
        let params = select_params(CategoryFilter::All);
        assert_eq!(
            params,
            vec![
                ("select", "*".to_owned()),
                ("order", "votesInteresting.desc".to_owned()),
                ("limit", "1000".to_owned()),
            ]
        );
    }

    #[test]
    fn select_params_add_category_equality_filter() {
        let params = select_params(CategoryFilter::Only("science"));
        assert!(params.contains(&("category", "eq.science".to_owned())));
    }

    #[test]
    fn vote_patch_targets_exactly_one_column() {
        let body = vote_patch(VoteKind::False, 2);
        assert_eq!(body.len(), 1);
        assert_eq!(body["votesFalse"], 3);
    }

    #[test]
    fn single_row_rejects_zero_and_many() {
        assert!(single_row(Vec::new(), "insert").is_err());
        assert!(single_row(vec![fact(1), fact(2)], "insert").is_err());
        let row = single_row(vec![fact(1)], "insert").expect("one row should pass");
        assert_eq!(row.id, FactId::new(1));
    }

    #[test]
    fn clean_error_prefers_the_json_message() {
        let error = clean_error_response(
            StatusCode::CONFLICT,
            r#"{"message":"duplicate key value","code":"23505"}"#,
        );
        assert_eq!(
            error.to_string(),
            "table service error (409): duplicate key value"
        );
    }

    #[test]
    fn clean_error_falls_back_to_short_plain_bodies_then_status() {
        let error = clean_error_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(error.to_string().contains("upstream down"));

        let error = clean_error_response(StatusCode::BAD_GATEWAY, "");
        assert_eq!(error.to_string(), "table service returned 502");

        let error = clean_error_response(StatusCode::BAD_GATEWAY, r#"{"unexpected":true}"#);
        assert_eq!(error.to_string(), "table service returned 502");
    }

    #[test]
    fn client_rejects_empty_base_url_and_key() {
        assert!(Client::new("", "key", Duration::from_secs(1)).is_err());
        assert!(Client::new("http://localhost", "  ", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn client_trims_trailing_slashes() {
        let client = Client::new("http://localhost:3000/rest/v1///", "key", Duration::from_secs(1))
            .expect("client should initialize");
        assert_eq!(client.base_url(), "http://localhost:3000/rest/v1");
    }

    #[test]
    fn new_fact_serializes_the_three_submitted_fields() {
        let encoded = serde_json::to_string(&NewFact {
            text: "T".to_owned(),
            source: "https://example.com".to_owned(),
            category: "science".to_owned(),
        })
        .expect("new fact should encode");
        assert_eq!(
            encoded,
            r#"{"text":"T","source":"https://example.com","category":"science"}"#
        );
    }
}
