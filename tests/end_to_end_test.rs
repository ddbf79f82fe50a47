use anyhow::Result;
use harvest_etl::config::toml_config::SourceConfig;
use harvest_etl::config::{NotificationChannel, NotificationsConfig, ValidatorConfig};
use harvest_etl::domain::model::{BatchStatus, TransformedData};
use harvest_etl::{
    BatchJob, EtlError, FileStore, GeoNetworkConnector, LocalStorage, MetadataTransformer,
    MetadataValidator, NotificationService,
};
use httpmock::prelude::*;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

const VALID: &str = include_str!("data/valid_record.xml");

fn source_config(base_url: &str) -> SourceConfig {
    SourceConfig {
        url: format!("{}/geonetwork/", base_url),
        search_endpoint: "/srv/api/search/records/_search".to_string(),
        get_record_endpoint: "/srv/api/records".to_string(),
        test_endpoint: "/srv/api/site".to_string(),
        max_records: Some(50),
        filter_keywords: vec!["GRDC".to_string()],
        timeout_seconds: Some(5),
    }
}

fn notifications_config(dir: &Path) -> NotificationsConfig {
    NotificationsConfig {
        channel: NotificationChannel::File,
        destination: vec!["data-team@example.org".to_string()],
        client_id: None,
        client_secret: None,
        output_dir: Some(dir.to_str().unwrap().to_string()),
    }
}

fn build_job(
    base_url: &str,
    output: &Path,
    notifications: &Path,
) -> Result<BatchJob<GeoNetworkConnector, MetadataValidator, MetadataTransformer, FileStore<LocalStorage>>>
{
    Ok(BatchJob::new(
        GeoNetworkConnector::new(source_config(base_url))?,
        MetadataValidator::from_config(&ValidatorConfig::default())?,
        MetadataTransformer::new()?,
        FileStore::new(LocalStorage::new(output)),
        NotificationService::from_config(&notifications_config(notifications)),
    ))
}

fn notification_files(dir: &Path) -> Vec<String> {
    let mut contents: Vec<(String, String)> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .map(|entry| {
                    let path = entry.unwrap().path();
                    let name = path.file_name().unwrap().to_str().unwrap().to_string();
                    (name, std::fs::read_to_string(&path).unwrap())
                })
                .collect()
        })
        .unwrap_or_default();
    contents.sort();
    contents.into_iter().map(|(_, content)| content).collect()
}

#[tokio::test]
async fn test_harvest_saves_valid_records_and_reports_invalid_ones() -> Result<()> {
    let output = TempDir::new()?;
    let notices = TempDir::new()?;
    let server = MockServer::start_async().await;

    let site = server
        .mock_async(|when, then| {
            when.method(GET).path("/geonetwork/srv/api/site");
            then.status(200).json_body(json!({"name": "catalogue"}));
        })
        .await;
    let search = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/geonetwork/srv/api/search/records/_search")
                .json_body_partial(r#"{"size": 50}"#);
            then.status(200).json_body(json!({
                "hits": { "hits": [
                    { "_source": { "uuid": "rec-1", "contact": "metadata@grdc.com.au", "owner": "GRDC" } },
                    { "_source": { "uuid": "rec-other", "owner": "Bureau" } },
                    { "_source": { "uuid": "rec-2", "owner": "GRDC" } },
                    { "_source": { "uuid": "rec-3", "owner": "GRDC" } }
                ]}
            }));
        })
        .await;
    let rec1 = server
        .mock_async(|when, then| {
            when.method(GET).path("/geonetwork/srv/api/records/rec-1");
            then.status(200).body(VALID);
        })
        .await;
    let rec2 = server
        .mock_async(|when, then| {
            when.method(GET).path("/geonetwork/srv/api/records/rec-2");
            then.status(200)
                .body(VALID.replace("Soil moisture response to stubble retention", ""));
        })
        .await;
    let rec3 = server
        .mock_async(|when, then| {
            when.method(GET).path("/geonetwork/srv/api/records/rec-3");
            then.status(200)
                .body(VALID.replace("DAV1707-001-BLX", "UOA2203-008-RTX"));
        })
        .await;
    let other = server
        .mock_async(|when, then| {
            when.method(GET).path("/geonetwork/srv/api/records/rec-other");
            then.status(200).body(VALID);
        })
        .await;

    let job = build_job(&server.base_url(), output.path(), notices.path())?;
    let stats = job.run().await?;

    site.assert_async().await;
    search.assert_async().await;
    rec1.assert_async().await;
    rec2.assert_async().await;
    rec3.assert_async().await;
    other.assert_hits_async(0).await;

    assert_eq!(stats.fetched, 3);
    assert_eq!(stats.valid, 2);
    assert_eq!(stats.invalid, 1);
    assert_eq!(stats.saved, 2);
    assert_eq!(stats.status(), BatchStatus::CompletedWithErrors);

    let saved: TransformedData = serde_json::from_slice(&std::fs::read(
        output.path().join("records/rec-3.json"),
    )?)?;
    assert_eq!(saved.contract_code.as_deref(), Some("UOA2203-008-RTX"));
    assert!(output.path().join("records/rec-1.json").exists());
    assert!(!output.path().join("records/rec-2.json").exists());

    let notifications = notification_files(notices.path());
    assert_eq!(notifications.len(), 2);
    assert!(notifications[0].starts_with("Subject: Invalid Record: rec-2\n"));
    assert!(notifications[0].contains("Record is missing a title."));
    assert!(notifications[1].starts_with("Subject: Batch Summary\n"));
    assert!(notifications[1].contains("Fetched: 3\nValid: 2\nInvalid: 1\nSaved: 2\nFailed: 0"));

    Ok(())
}

#[tokio::test]
async fn test_unreachable_catalogue_aborts_the_run() -> Result<()> {
    let output = TempDir::new()?;
    let notices = TempDir::new()?;
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/geonetwork/srv/api/site");
            then.status(500);
        })
        .await;
    let search = server
        .mock_async(|when, then| {
            when.method(POST).path("/geonetwork/srv/api/search/records/_search");
            then.status(200).json_body(json!({"hits": {"hits": []}}));
        })
        .await;

    let job = build_job(&server.base_url(), output.path(), notices.path())?;
    let err = job.run().await.unwrap_err();

    assert!(matches!(err, EtlError::ConnectionError { .. }));
    search.assert_hits_async(0).await;

    let notifications = notification_files(notices.path());
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].starts_with("Subject: Connection Error\n"));
    Ok(())
}

#[tokio::test]
async fn test_missing_record_fails_the_search() -> Result<()> {
    let output = TempDir::new()?;
    let notices = TempDir::new()?;
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/geonetwork/srv/api/site");
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/geonetwork/srv/api/search/records/_search");
            then.status(200)
                .json_body(json!({"hits": {"hits": [{"_source": {"uuid": "gone", "owner": "GRDC"}}]}}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/geonetwork/srv/api/records/gone");
            then.status(404);
        })
        .await;

    let job = build_job(&server.base_url(), output.path(), notices.path())?;
    let err = job.run().await.unwrap_err();

    assert!(matches!(err, EtlError::RecordError { .. }));
    assert!(err.is_retryable());
    let notifications = notification_files(notices.path());
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].contains("Error getting record gone"));
    Ok(())
}
