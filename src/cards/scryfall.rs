use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client, StatusCode,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::dto::{Card, CardList, SearchFilter};
use super::filter::{matches, retain_matches};
use super::CardSource;
use crate::config::ScryfallConfig;

#[derive(Debug, Error)]
pub enum CardError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {status}: {details}")]
    Status { status: u16, details: String },
}

/// Read-only Scryfall client. One attempt per call, nothing cached.
#[derive(Clone)]
pub struct ScryfallClient {
    http: Client,
    base_url: String,
}

impl ScryfallClient {
    pub fn new(config: &ScryfallConfig) -> Result<Self, CardError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `Ok(None)` on 404, which Scryfall also uses for "no results".
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, CardError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "scryfall request");

        let res = self.http.get(&url).query(query).send().await?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let details = res.text().await.unwrap_or_default();
            warn!(%url, %status, "scryfall returned an error");
            return Err(CardError::Status {
                status: status.as_u16(),
                details,
            });
        }
        Ok(Some(res.json::<T>().await?))
    }
}

/// A user term with wrapping quotes dropped; used both upstream and locally.
fn normalize(term: &str) -> &str {
    term.trim().trim_matches('"').trim()
}

/// `prefix:"term"` with `\` and `"` escaped, so Scryfall never parses the
/// term as its own query syntax.
fn quoted(prefix: &str, term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{prefix}:\"{escaped}\"")
}

#[async_trait]
impl CardSource for ScryfallClient {
    async fn search(&self, term: &str, filter: SearchFilter) -> Result<CardList, CardError> {
        let term = normalize(term);
        let q = match filter {
            SearchFilter::Name => quoted("name", term),
            SearchFilter::Ability => quoted("o", term),
        };
        let list = match self.get_json::<CardList>("/cards/search", &[("q", q)]).await {
            Ok(list) => list.unwrap_or_else(CardList::empty),
            // Scryfall answers 400 for queries it cannot parse; that is no match.
            Err(CardError::Status { status: 400, details }) => {
                debug!(%details, "scryfall rejected the query");
                CardList::empty()
            }
            Err(err) => return Err(err),
        };
        Ok(retain_matches(list, term, filter))
    }

    async fn random(&self, ability: Option<&str>) -> Result<CardList, CardError> {
        let ability = ability.map(normalize);
        let query: Vec<(&str, String)> = ability
            .map(|a| vec![("q", quoted("o", a))])
            .unwrap_or_default();
        let Some(card) = self.get_json::<Card>("/cards/random", &query).await? else {
            return Ok(CardList::empty());
        };
        match ability {
            Some(a) if !matches(&card, a, SearchFilter::Ability) => Ok(CardList::empty()),
            _ => Ok(CardList::single(card)),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Card>, CardError> {
        self.get_json::<Card>(&format!("/cards/{id}"), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BOLT_ID: &str = "e3285e6b-3e79-4d7c-bf96-d920f973b122";

    fn client_for(server: &MockServer) -> ScryfallClient {
        ScryfallClient::new(&ScryfallConfig {
            base_url: server.uri(),
            timeout_secs: 5,
            user_agent: "PrimerTest/1.0".into(),
        })
        .unwrap()
    }

    fn bolt() -> serde_json::Value {
        json!({
            "object": "card",
            "id": BOLT_ID,
            "name": "Lightning Bolt",
            "mana_cost": "{R}",
            "type_line": "Instant",
            "oracle_text": "Lightning Bolt deals 3 damage to any target.",
            "rarity": "common"
        })
    }

    #[tokio::test]
    async fn search_filters_by_name_locally() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cards/search"))
            .and(query_param("q", "name:\"lightning\""))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "total_cards": 2,
                "has_more": false,
                "data": [
                    bolt(),
                    {
                        "object": "card",
                        "id": "0b3e4a4f-6c8d-4a5c-9a53-6cfa1e0b1f11",
                        "name": "Thunderous Wrath",
                        "oracle_text": "Thunderous Wrath deals 5 damage. lightning strikes"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let list = client_for(&server)
            .search("lightning", SearchFilter::Name)
            .await
            .unwrap();
        assert_eq!(list.total_cards, 1);
        assert_eq!(list.data[0].name, "Lightning Bolt");
    }

    #[tokio::test]
    async fn ability_search_uses_oracle_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cards/search"))
            .and(query_param("q", "o:\"damage\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "total_cards": 1,
                "has_more": false,
                "data": [bolt()]
            })))
            .mount(&server)
            .await;

        let list = client_for(&server)
            .search("damage", SearchFilter::Ability)
            .await
            .unwrap();
        assert_eq!(list.data.len(), 1);
    }

    #[tokio::test]
    async fn name_terms_are_quoted_and_unparseable_queries_are_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cards/search"))
            .and(query_param("q", "name:\"bolt (\""))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "object": "error",
                "code": "bad_request",
                "details": "You didn't provide any search terms."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let list = client_for(&server)
            .search("bolt (", SearchFilter::Name)
            .await
            .unwrap();
        assert_eq!(list, CardList::empty());
    }

    #[tokio::test]
    async fn quoted_ability_terms_match_locally() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cards/search"))
            .and(query_param("q", "o:\"damage\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "total_cards": 1,
                "has_more": false,
                "data": [bolt()]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let list = client_for(&server)
            .search("\"damage\"", SearchFilter::Ability)
            .await
            .unwrap();
        assert_eq!(list.total_cards, 1);
        assert_eq!(list.data[0].name, "Lightning Bolt");
    }

    #[test]
    fn inner_quotes_and_backslashes_are_escaped() {
        assert_eq!(quoted("o", r#"say "hi""#), r#"o:"say \"hi\"""#);
        assert_eq!(quoted("name", r"a\b"), r#"name:"a\\b""#);
        assert_eq!(normalize(r#"  "flying"  "#), "flying");
    }

    #[tokio::test]
    async fn no_results_is_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cards/search"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "object": "error",
                "code": "not_found",
                "details": "Your query didn't match any cards."
            })))
            .mount(&server)
            .await;

        let list = client_for(&server)
            .search("zzzz", SearchFilter::Name)
            .await
            .unwrap();
        assert_eq!(list, CardList::empty());
    }

    #[tokio::test]
    async fn get_by_id_found_and_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/cards/{BOLT_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(bolt()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/cards/{}", Uuid::nil())))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let id: Uuid = BOLT_ID.parse().unwrap();
        let card = client.get(id).await.unwrap().unwrap();
        assert_eq!(card.name, "Lightning Bolt");
        assert!(client.get(Uuid::nil()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn random_wraps_single_card() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cards/random"))
            .respond_with(ResponseTemplate::new(200).set_body_json(bolt()))
            .mount(&server)
            .await;

        let list = client_for(&server).random(Some("damage")).await.unwrap();
        assert_eq!(list.total_cards, 1);
        assert!(!list.has_more);
    }

    #[tokio::test]
    async fn upstream_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cards/random"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server).random(None).await.unwrap_err();
        assert!(matches!(err, CardError::Status { status: 503, .. }));
    }
}
