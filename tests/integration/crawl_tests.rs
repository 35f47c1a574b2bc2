use crate::common::{create_test_config, create_test_pipeline, html, mount_page};
use dovepeak::config::Config;
use dovepeak::crawler::Coordinator;
use dovepeak::email::EmailType;
use dovepeak::{ConfigError, DovepeakError};
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<h1>St Example</h1>
        <a href="/contact">Contact</a>
        <a href="/staff-directory">Our staff</a>
        <a href="/blog">Blog</a>
        <a href="https://other.example.net/contact">Elsewhere</a>"#,
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/contact",
        "<p>Contact us: info@example.org or call 555-1234</p>",
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/staff-directory",
        r#"<ul><li><a href="mailto:admin@example.org">Admin@Example.ORG</a></li></ul>
        <footer>help@example.org</footer>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/blog", "<p>blog@example.org</p>", 0).await;

    let config = create_test_config(vec![base_url]);
    let pipeline = create_test_pipeline(&config);
    let coordinator = Coordinator::new(config, pipeline).expect("Failed to create coordinator");

    let snapshot = coordinator.run().await;

    assert_eq!(snapshot.stats.domains_scanned, 1);
    assert_eq!(snapshot.stats.pages_scanned, 3);
    assert_eq!(snapshot.stats.total_found, 3);
    assert_eq!(
        snapshot.stats.valid_emails + snapshot.stats.invalid_emails,
        snapshot.stats.total_found
    );

    let emails: Vec<&str> = snapshot.records.iter().map(|r| r.email.as_str()).collect();
    assert_eq!(
        emails,
        vec!["info@example.org", "admin@example.org", "help@example.org"]
    );

    let info = &snapshot.records[0];
    assert_eq!(info.email_type, EmailType::Info);
    assert_eq!(info.source, "contact page");
    assert!(info.is_valid);
    assert!((60..=85).contains(&info.confidence));

    let admin = &snapshot.records[1];
    assert_eq!(admin.email_type, EmailType::Admin);
    assert_eq!(admin.source, "staff directory");

    let help = &snapshot.records[2];
    assert_eq!(help.email_type, EmailType::Support);
    assert_eq!(help.source, "footer");
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/contact", "<p>office@example.org</p>", 1).await;

    let config = create_test_config(vec![format!("{}/contact", mock_server.uri())]);
    let pipeline = create_test_pipeline(&config);
    let coordinator = Coordinator::new(config, pipeline).unwrap();
    let handle = coordinator.start();
    let failed_before_join = handle.pages_failed();
    let snapshot = handle.join().await.unwrap();

    assert_eq!(failed_before_join, 0);
    assert_eq!(snapshot.stats.pages_scanned, 1);
    assert_eq!(snapshot.records.len(), 1);
    assert_eq!(snapshot.records[0].email, "office@example.org");
    // generic local part on a contact page
    assert_eq!(snapshot.records[0].email_type, EmailType::Contact);
}

#[tokio::test]
async fn test_retry_budget_exhausted_fails_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(vec![mock_server.uri()]);
    config.crawler.retry_budget = 2;
    let pipeline = create_test_pipeline(&config);
    let coordinator = Coordinator::new(config, pipeline).unwrap();
    let pipeline = coordinator.pipeline();

    let snapshot = coordinator.run().await;

    assert_eq!(snapshot.stats.domains_scanned, 1);
    assert_eq!(snapshot.stats.pages_scanned, 1);
    assert!(snapshot.records.is_empty());
    assert_eq!(pipeline.stats().pages_failed(), 1);
}

#[tokio::test]
async fn test_permanent_failures_are_not_retried() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/contact">Contact</a><a href="/about">About</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("x".repeat(4096), "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(vec![mock_server.uri()]);
    config.fetcher.max_body_bytes = 1024;
    let pipeline = create_test_pipeline(&config);
    let coordinator = Coordinator::new(config, pipeline).unwrap();
    let pipeline = coordinator.pipeline();

    let snapshot = coordinator.run().await;

    assert_eq!(snapshot.stats.pages_scanned, 3);
    assert_eq!(pipeline.stats().pages_failed(), 2);
}

#[tokio::test]
async fn test_common_paths_probed_on_seed() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", "<p>Welcome</p>", 1).await;
    mount_page(&mock_server, "/contact", "<p>info@example.org</p>", 1).await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(vec![mock_server.uri()]);
    config.crawler.common_paths = vec!["/contact".to_string(), "/about".to_string()];
    let pipeline = create_test_pipeline(&config);
    let snapshot = Coordinator::new(config, pipeline).unwrap().run().await;

    assert_eq!(snapshot.stats.pages_scanned, 3);
    assert_eq!(snapshot.records.len(), 1);
    assert_eq!(snapshot.records[0].source, "contact page");
}

#[tokio::test]
async fn test_domain_page_budget() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/contact">Contact</a><a href="/about">About</a><a href="/staff">Staff</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/contact", "<p>info@example.org</p>", 1).await;
    mount_page(&mock_server, "/about", "<p>about@example.org</p>", 0).await;
    mount_page(&mock_server, "/staff", "<p>staff@example.org</p>", 0).await;

    let mut config = create_test_config(vec![mock_server.uri()]);
    config.crawler.max_pages_per_domain = 2;
    let pipeline = create_test_pipeline(&config);
    let snapshot = Coordinator::new(config, pipeline).unwrap().run().await;

    assert_eq!(snapshot.stats.pages_scanned, 2);
    assert_eq!(snapshot.records.len(), 1);
}

#[tokio::test]
async fn test_total_page_budget_across_domains() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    for server in [&first, &second] {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html(r#"<a href="/contact">Contact</a>"#))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/contact"))
            .respond_with(html("<p>info@example.org</p>"))
            .mount(server)
            .await;
    }

    let mut config = create_test_config(vec![first.uri(), second.uri()]);
    config.crawler.max_total_pages = 3;
    config.crawler.max_domains_in_flight = 1;
    let pipeline = create_test_pipeline(&config);
    let snapshot = Coordinator::new(config, pipeline).unwrap().run().await;

    assert_eq!(snapshot.stats.pages_scanned, 3);
    assert_eq!(snapshot.stats.domains_scanned, 2);
    // the same address on both domains is one record
    assert_eq!(snapshot.records.len(), 1);
}

#[tokio::test]
async fn test_politeness_delay_between_requests() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/contact">Contact</a><a href="/about">About</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/contact", "<p>Nothing here</p>", 1).await;
    mount_page(&mock_server, "/about", "<p>Nothing here</p>", 1).await;

    let mut config = create_test_config(vec![mock_server.uri()]);
    config.crawler.politeness_delay_ms = 150;
    let pipeline = create_test_pipeline(&config);
    let coordinator = Coordinator::new(config, pipeline).unwrap();

    let start = Instant::now();
    let snapshot = coordinator.run().await;

    assert_eq!(snapshot.stats.pages_scanned, 3);
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_plain_text_page_is_scanned() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("Reach us at contact@stmaryshospital.com", "text/plain"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(vec![format!("{}/contact", mock_server.uri())]);
    let pipeline = create_test_pipeline(&config);
    let snapshot = Coordinator::new(config, pipeline).unwrap().run().await;

    assert_eq!(snapshot.records.len(), 1);
    assert_eq!(snapshot.records[0].email_type, EmailType::Contact);
    assert_eq!(snapshot.records[0].domain, "stmaryshospital.com");
}

#[tokio::test]
async fn test_cancel_before_start_dispatches_nothing() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "<p>info@example.org</p>", 0).await;

    let config = create_test_config(vec![mock_server.uri()]);
    let pipeline = create_test_pipeline(&config);
    let coordinator = Coordinator::new(config, pipeline).unwrap();
    coordinator.cancellation_token().cancel();

    let snapshot = coordinator.run().await;

    assert_eq!(snapshot.stats.pages_scanned, 0);
    assert_eq!(snapshot.stats.domains_scanned, 0);
    assert!(snapshot.records.is_empty());
}

#[tokio::test]
async fn test_cancel_lets_in_flight_fetch_finish() {
    let slow = MockServer::start().await;
    let never = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            html(r#"<p>info@example.org</p><a href="/contact">Contact</a>"#)
                .set_delay(Duration::from_millis(400)),
        )
        .expect(1)
        .mount(&slow)
        .await;
    mount_page(&slow, "/contact", "<p>office@example.org</p>", 0).await;
    mount_page(&never, "/", "<p>help@example.org</p>", 0).await;

    let mut config = create_test_config(vec![slow.uri(), never.uri()]);
    config.crawler.max_domains_in_flight = 1;
    let pipeline = create_test_pipeline(&config);
    let handle = Coordinator::new(config, pipeline).unwrap().start();

    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.cancel();
    assert!(handle.is_cancelled());

    let snapshot = handle.join().await.unwrap();

    assert_eq!(snapshot.stats.domains_scanned, 1);
    assert_eq!(snapshot.stats.pages_scanned, 1);
    assert_eq!(snapshot.records.len(), 1);
    assert_eq!(snapshot.records[0].email, "info@example.org");
    assert_eq!(
        snapshot.stats.valid_emails + snapshot.stats.invalid_emails,
        snapshot.stats.total_found
    );
}

#[tokio::test]
async fn test_snapshot_readable_while_running() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>info@example.org</p>").set_delay(Duration::from_millis(200)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(vec![mock_server.uri()]);
    let pipeline = create_test_pipeline(&config);
    let handle = Coordinator::new(config, pipeline).unwrap().start();

    let during = handle.snapshot();
    assert!(during.stats.pages_scanned <= 1);

    let after = handle.join().await.unwrap();
    assert!(after.stats.pages_scanned >= during.stats.pages_scanned);
    assert_eq!(after.stats.pages_scanned, 1);
}

#[tokio::test]
async fn test_redirect_chain_over_limit_fails_page() {
    let mock_server = MockServer::start().await;

    // /r0 -> /r1 -> ... -> /r6 -> /final, twice the configured hop limit
    for hop in 0..7 {
        let next = if hop == 6 {
            "/final".to_string()
        } else {
            format!("/r{}", hop + 1)
        };
        let times: RangeInclusive<u64> = if hop == 0 { 1..=1 } else { 0..=1 };
        Mock::given(method("GET"))
            .and(path(format!("/r{}", hop)))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", next.as_str()))
            .expect(times)
            .mount(&mock_server)
            .await;
    }
    mount_page(&mock_server, "/final", "<p>info@example.org</p>", 0).await;

    let config = create_test_config(vec![format!("{}/r0", mock_server.uri())]);
    assert_eq!(config.fetcher.max_redirects, 3);
    let pipeline = create_test_pipeline(&config);
    let coordinator = Coordinator::new(config, pipeline).unwrap();
    let pipeline = coordinator.pipeline();

    let snapshot = coordinator.run().await;

    assert_eq!(snapshot.stats.domains_scanned, 1);
    assert_eq!(snapshot.stats.pages_scanned, 1);
    assert_eq!(pipeline.stats().pages_failed(), 1);
    assert!(snapshot.records.is_empty());
}

#[tokio::test]
async fn test_timeout_is_retried_within_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(html("<p>info@example.org</p>").set_delay(Duration::from_millis(1500)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(vec![format!("{}/contact", mock_server.uri())]);
    config.fetcher.timeout_ms = 200;
    config.crawler.retry_budget = 2;
    let pipeline = create_test_pipeline(&config);
    let coordinator = Coordinator::new(config, pipeline).unwrap();
    let pipeline = coordinator.pipeline();

    let start = Instant::now();
    let snapshot = coordinator.run().await;

    assert!(start.elapsed() < Duration::from_millis(1500));
    assert_eq!(snapshot.stats.domains_scanned, 1);
    assert_eq!(snapshot.stats.pages_scanned, 1);
    assert_eq!(pipeline.stats().pages_failed(), 1);
    assert!(snapshot.records.is_empty());
    assert_eq!(
        snapshot.stats.valid_emails + snapshot.stats.invalid_emails,
        snapshot.stats.total_found
    );
}

#[tokio::test]
async fn test_cancel_during_politeness_wait_sends_nothing_new() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<p>info@example.org</p><a href="/contact">Contact</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/contact", "<p>office@example.org</p>", 0).await;

    let mut config = create_test_config(vec![mock_server.uri()]);
    config.crawler.politeness_delay_ms = 2_000;
    let pipeline = create_test_pipeline(&config);
    let handle = Coordinator::new(config, pipeline).unwrap().start();

    tokio::time::sleep(Duration::from_millis(300)).await;
    handle.cancel();
    let cancelled_at = Instant::now();

    let snapshot = handle.join().await.unwrap();

    assert!(cancelled_at.elapsed() < Duration::from_millis(1_000));
    assert_eq!(snapshot.stats.pages_scanned, 1);
    assert_eq!(snapshot.records.len(), 1);
    assert_eq!(snapshot.records[0].email, "info@example.org");
}

fn new_coordinator(config: Config) -> Result<Coordinator, DovepeakError> {
    let pipeline = create_test_pipeline(&config);
    Coordinator::new(config, pipeline)
}

#[tokio::test]
async fn test_invalid_limits_rejected_before_run() {
    let zeroed: [fn(&mut Config); 3] = [
        |c| c.crawler.max_domains_in_flight = 0,
        |c| c.crawler.max_pages_per_domain = 0,
        |c| c.crawler.retry_budget = 0,
    ];

    for (i, zero) in zeroed.iter().enumerate() {
        let mut config = create_test_config(vec!["example.org".to_string()]);
        zero(&mut config);
        let result = new_coordinator(config);
        assert!(
            matches!(result, Err(DovepeakError::Config(ConfigError::Validation(_)))),
            "case {} accepted",
            i
        );
    }
}

#[tokio::test]
async fn test_invalid_seed_is_config_error() {
    let config = create_test_config(vec!["example.org".to_string(), "localhost".to_string()]);
    let result = new_coordinator(config);
    assert!(matches!(
        result,
        Err(DovepeakError::Config(ConfigError::InvalidSeed(_)))
    ));
}
