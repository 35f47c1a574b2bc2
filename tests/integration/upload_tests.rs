use crate::common::{create_test_config, create_test_pipeline};
use dovepeak::email::EmailType;

#[tokio::test]
async fn test_uploaded_list_is_deduplicated_and_validated() {
    let config = create_test_config(vec![]);
    let pipeline = create_test_pipeline(&config);

    let snapshot = pipeline
        .validate_list([
            "contact@stmaryshospital.com",
            "\u{200B}Contact@StMarysHospital.com ",
            "",
            "   ",
            "not-an-email",
            "billing@unknown-clinic.test",
            "help@flaky.org",
        ])
        .await;

    assert_eq!(snapshot.records.len(), 4);
    assert_eq!(snapshot.stats.total_found, 4);
    assert_eq!(snapshot.stats.valid_emails, 2);
    assert_eq!(snapshot.stats.invalid_emails, 2);
    assert_eq!(snapshot.stats.pages_scanned, 0);
    assert_eq!(snapshot.stats.domains_scanned, 0);

    let contact = &snapshot.records[0];
    assert_eq!(contact.email, "contact@stmaryshospital.com");
    assert_eq!(contact.email_type, EmailType::Contact);
    assert_eq!(contact.source, "uploaded list");
    assert!(contact.is_valid);
    assert!((60..=85).contains(&contact.confidence));

    let no_mx = snapshot
        .records
        .iter()
        .find(|r| r.email == "billing@unknown-clinic.test")
        .unwrap();
    assert!(!no_mx.is_valid);
    assert!(no_mx.confidence <= 20);

    // a resolver timeout is a soft pass
    let flaky = snapshot
        .records
        .iter()
        .find(|r| r.email == "help@flaky.org")
        .unwrap();
    assert!(flaky.is_valid);
    assert!((30..=50).contains(&flaky.confidence));
}

#[tokio::test]
async fn test_uploaded_list_without_domain_check() {
    let mut config = create_test_config(vec![]);
    config.validation.enable_domain_check = false;
    let pipeline = create_test_pipeline(&config);

    let snapshot = pipeline
        .validate_list(["billing@unknown-clinic.test", "bad@@example.org"])
        .await;

    let billing = &snapshot.records[0];
    assert!(billing.is_valid);
    assert!((30..=50).contains(&billing.confidence));

    let bad = &snapshot.records[1];
    assert!(!bad.is_valid);
    assert!(bad.confidence <= 20);
}

#[tokio::test]
async fn test_mailbox_probe_inconclusive_keeps_address_valid() {
    let mut config = create_test_config(vec![]);
    config.validation.enable_mailbox_probe = true;
    let pipeline = create_test_pipeline(&config);

    let snapshot = pipeline.validate_list(["info@example.org"]).await;

    let record = &snapshot.records[0];
    assert!(record.is_valid);
    assert!((60..=85).contains(&record.confidence));
    assert_eq!(record.email_type, EmailType::Info);
}
