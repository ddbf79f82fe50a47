use crate::config::toml_config::SourceConfig;
use crate::domain::model::{Record, SearchQuery};
use crate::domain::ports::Connector;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const JSON: &str = "application/json";
const XML: &str = "application/xml";

/// Connector for a GeoNetwork catalogue: Elasticsearch search plus per-record
/// XML retrieval.
pub struct GeoNetworkConnector {
    config: SourceConfig,
    client: Client,
}

impl GeoNetworkConnector {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds());
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        join_url(&self.config.url, path)
    }

    pub async fn get_record(&self, uuid: &str) -> Result<String> {
        let url = format!("{}/{}", self.endpoint(&self.config.get_record_endpoint), uuid);
        tracing::debug!("Fetching record {} from {}", uuid, url);

        let record_error = |e: reqwest::Error| EtlError::RecordError {
            record_id: uuid.to_string(),
            message: e.to_string(),
        };
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, XML)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(record_error)?;
        response.text().await.map_err(record_error)
    }

    async fn search_hits(&self, query: &SearchQuery) -> Result<Vec<Value>> {
        let url = self.endpoint(&self.config.search_endpoint);
        tracing::debug!("Searching {} with {}", url, query.as_json());

        let search_error = |e: reqwest::Error| EtlError::SearchError {
            message: e.to_string(),
        };
        let body: Value = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .json(query.as_json())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(search_error)?
            .json()
            .await
            .map_err(search_error)?;

        match body.pointer("/hits/hits") {
            Some(Value::Array(hits)) => Ok(hits.clone()),
            _ => Err(EtlError::SearchError {
                message: "response has no hits.hits array".to_string(),
            }),
        }
    }
}

/// Joins a base URL and an endpoint path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// True when any top-level value of the hit mentions one of `keywords`.
/// An empty keyword list keeps every hit.
pub fn matches_keywords(hit: &Value, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let Some(fields) = hit.as_object() else {
        return false;
    };
    fields.values().any(|value| {
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        keywords.iter().any(|keyword| text.contains(keyword.as_str()))
    })
}

fn hit_uuid(hit: &Value) -> Option<&str> {
    hit.pointer("/_source/uuid").and_then(Value::as_str)
}

#[async_trait]
impl Connector for GeoNetworkConnector {
    async fn can_connect(&self) -> bool {
        let url = self.endpoint(&self.config.test_endpoint);
        let result = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status());
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Failed to connect to GeoNetwork at {}: {}", url, e);
                false
            }
        }
    }

    fn construct_query(&self, since: Option<DateTime<Utc>>) -> SearchQuery {
        let mut filter = Vec::new();
        if let Some(since) = since {
            let date = since.to_rfc3339_opts(SecondsFormat::AutoSi, true);
            filter.push(json!({
                "bool": {
                    "should": [
                        { "range": { "changeDate": { "gt": date } } },
                        { "range": { "createDate": { "gt": date } } }
                    ],
                    "minimum_should_match": 1
                }
            }));
        }

        SearchQuery(json!({
            "query": {
                "bool": {
                    "must": [{ "match_all": {} }],
                    "filter": filter
                }
            },
            "size": self.config.max_records()
        }))
    }

    async fn search_records(&self, query: &SearchQuery) -> Result<Vec<Record>> {
        let hits = self.search_hits(query).await?;
        let hit_count = hits.len();

        let uuids: Vec<String> = hits
            .iter()
            .filter(|hit| matches_keywords(hit, &self.config.filter_keywords))
            .filter_map(|hit| {
                let uuid = hit_uuid(hit);
                if uuid.is_none() {
                    tracing::warn!("Skipping search hit without _source.uuid");
                }
                uuid.map(str::to_string)
            })
            .collect();
        tracing::info!(
            "Search returned {} hits, {} after keyword filter",
            hit_count,
            uuids.len()
        );

        let mut records = Vec::with_capacity(uuids.len());
        for uuid in uuids {
            let content = self.get_record(&uuid).await?;
            records.push(Record { uuid, content });
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn source_config(base_url: &str) -> SourceConfig {
        SourceConfig {
            url: format!("{}/geonetwork", base_url),
            search_endpoint: "/srv/api/search/records/_search".to_string(),
            get_record_endpoint: "/srv/api/records".to_string(),
            test_endpoint: "/srv/api/site".to_string(),
            max_records: Some(10),
            filter_keywords: vec!["GRDC".to_string(), "Grains".to_string()],
            timeout_seconds: Some(5),
        }
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://example.com/geonetwork/", "/srv/api/site"),
            "http://example.com/geonetwork/srv/api/site"
        );
        assert_eq!(
            join_url("http://example.com/geonetwork", "srv/api/site"),
            "http://example.com/geonetwork/srv/api/site"
        );
    }

    #[test]
    fn test_matches_keywords() {
        let keywords = vec!["GRDC".to_string()];
        let hit = json!({"_id": "1", "_source": {"uuid": "1", "contact": "data@GRDC.com.au"}});
        assert!(matches_keywords(&hit, &keywords));

        let hit = json!({"_id": "2", "_source": {"uuid": "2", "contact": "someone@else.org"}});
        assert!(!matches_keywords(&hit, &keywords));
        assert!(matches_keywords(&hit, &[]));
    }

    #[test]
    fn test_construct_query_with_since() {
        let connector = GeoNetworkConnector::new(source_config("http://localhost")).unwrap();
        let since = DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let query = connector.construct_query(Some(since));
        let body = query.as_json();

        assert_eq!(body["size"], 10);
        assert_eq!(body["query"]["bool"]["must"][0], json!({"match_all": {}}));
        let date_filter = &body["query"]["bool"]["filter"][0]["bool"];
        assert_eq!(date_filter["minimum_should_match"], 1);
        assert_eq!(
            date_filter["should"][0]["range"]["changeDate"]["gt"],
            "2025-03-01T12:00:00Z"
        );
        assert_eq!(
            date_filter["should"][1]["range"]["createDate"]["gt"],
            "2025-03-01T12:00:00Z"
        );
    }

    #[test]
    fn test_construct_query_uses_default_size() {
        let config = SourceConfig {
            max_records: None,
            ..source_config("http://localhost")
        };
        let connector = GeoNetworkConnector::new(config).unwrap();
        assert_eq!(connector.construct_query(None).as_json()["size"], 100);
    }

    #[test]
    fn test_construct_query_without_since() {
        let connector = GeoNetworkConnector::new(source_config("http://localhost")).unwrap();
        let query = connector.construct_query(None);
        assert_eq!(query.as_json()["query"]["bool"]["filter"], json!([]));
    }

    #[tokio::test]
    async fn test_can_connect_success() {
        let server = MockServer::start_async().await;
        let site = server
            .mock_async(|when, then| {
                when.method(GET).path("/geonetwork/srv/api/site");
                then.status(200).body("{}");
            })
            .await;

        let connector = GeoNetworkConnector::new(source_config(&server.base_url())).unwrap();
        assert!(connector.can_connect().await);
        site.assert_async().await;
    }

    #[tokio::test]
    async fn test_can_connect_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/geonetwork/srv/api/site");
                then.status(503);
            })
            .await;

        let connector = GeoNetworkConnector::new(source_config(&server.base_url())).unwrap();
        assert!(!connector.can_connect().await);
    }

    #[tokio::test]
    async fn test_get_record_success() {
        let server = MockServer::start_async().await;
        let record = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/geonetwork/srv/api/records/test-uuid-123")
                    .header("accept", "application/xml");
                then.status(200).body("<xml>Record Content</xml>");
            })
            .await;

        let connector = GeoNetworkConnector::new(source_config(&server.base_url())).unwrap();
        let xml = connector.get_record("test-uuid-123").await.unwrap();

        assert_eq!(xml, "<xml>Record Content</xml>");
        record.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_record_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/geonetwork/srv/api/records/invalid-uuid");
                then.status(404);
            })
            .await;

        let connector = GeoNetworkConnector::new(source_config(&server.base_url())).unwrap();
        let err = connector.get_record("invalid-uuid").await.unwrap_err();

        assert!(matches!(err, EtlError::RecordError { .. }));
        assert!(err.to_string().contains("Error getting record invalid-uuid"));
    }

    #[tokio::test]
    async fn test_search_records_filters_and_fetches_in_order() {
        let server = MockServer::start_async().await;
        let search = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/geonetwork/srv/api/search/records/_search")
                    .header("accept", "application/json");
                then.status(200).json_body(json!({
                    "hits": { "hits": [
                        { "_source": { "uuid": "uuid1", "resourceTitle": "GRDC soil trial" } },
                        { "_source": { "uuid": "uuid-x", "resourceTitle": "Ocean temperature" } },
                        { "_source": { "uuid": "uuid2", "purpose": "Grains research" } }
                    ]}
                }));
            })
            .await;
        let first = server
            .mock_async(|when, then| {
                when.method(GET).path("/geonetwork/srv/api/records/uuid1");
                then.status(200).body("<xml>1</xml>");
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.method(GET).path("/geonetwork/srv/api/records/uuid2");
                then.status(200).body("<xml>2</xml>");
            })
            .await;
        let skipped = server
            .mock_async(|when, then| {
                when.method(GET).path("/geonetwork/srv/api/records/uuid-x");
                then.status(200).body("<xml>x</xml>");
            })
            .await;

        let connector = GeoNetworkConnector::new(source_config(&server.base_url())).unwrap();
        let query = connector.construct_query(None);
        let records = connector.search_records(&query).await.unwrap();

        search.assert_async().await;
        first.assert_async().await;
        second.assert_async().await;
        skipped.assert_hits_async(0).await;
        assert_eq!(
            records,
            vec![Record::new("uuid1", "<xml>1</xml>"), Record::new("uuid2", "<xml>2</xml>")]
        );
    }

    #[tokio::test]
    async fn test_search_records_rejects_unexpected_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/geonetwork/srv/api/search/records/_search");
                then.status(200).json_body(json!({ "error": "index missing" }));
            })
            .await;

        let connector = GeoNetworkConnector::new(source_config(&server.base_url())).unwrap();
        let err = connector
            .search_records(&connector.construct_query(None))
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::SearchError { .. }));
    }
}
