use crate::common::{create_test_config, create_test_pipeline, mount_page};
use chrono::Utc;
use dovepeak::crawler::Coordinator;
use dovepeak::output::{handlers_for, write_all, RunSummary};
use tempfile::tempdir;
use wiremock::MockServer;

#[tokio::test]
async fn test_crawl_results_exported() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        r#"<a href="/about">About us</a><footer>info@example.org</footer>"#,
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/about",
        "<p>Write to \"Press Office\" at press@example.org, or nobody@nowhere.test</p>",
        1,
    )
    .await;

    let dir = tempdir().unwrap();
    let mut config = create_test_config(vec![mock_server.uri()]);
    config.output.results_path = dir.path().join("emails.csv").display().to_string();
    config.output.json_path = Some(dir.path().join("emails.json").display().to_string());
    config.output.summary_path = dir.path().join("summary.md").display().to_string();

    let pipeline = create_test_pipeline(&config);
    let started_at = Utc::now();
    let snapshot = Coordinator::new(config.clone(), pipeline)
        .unwrap()
        .run()
        .await;
    let summary = RunSummary {
        started_at,
        finished_at: Utc::now(),
        config_hash: "abc123".to_string(),
        seeds: config.seeds.clone(),
        cancelled: false,
        pages_failed: 0,
    };

    let handlers = handlers_for(&config.output);
    assert_eq!(handlers.len(), 3);
    write_all(&handlers, &summary, &snapshot).unwrap();

    let csv = std::fs::read_to_string(&config.output.results_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "id,email,domain,isValid,source,confidence,type");
    assert_eq!(lines.len(), snapshot.records.len() + 1);
    assert!(lines[1].starts_with("1,info@example.org,example.org,true,footer,"));
    assert!(csv.contains("nobody@nowhere.test,nowhere.test,false,about page,"));

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(config.output.json_path.as_ref().unwrap()).unwrap(),
    )
    .unwrap();
    assert_eq!(json["records"].as_array().unwrap().len(), 3);
    assert_eq!(json["stats"]["pagesScanned"], 2);
    assert_eq!(json["stats"]["totalFound"], 3);
    assert_eq!(json["records"][0]["type"], "info");
    assert_eq!(json["records"][0]["isValid"], true);

    let markdown = std::fs::read_to_string(&config.output.summary_path).unwrap();
    assert!(markdown.contains("# Dovepeak Run Summary"));
    assert!(markdown.contains("- **Pages Scanned**: 2"));
    assert!(markdown.contains("## Invalid Addresses"));
}
