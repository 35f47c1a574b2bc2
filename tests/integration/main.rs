//! Integration tests for dovepeak
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl, validation and export cycle end-to-end. DNS and SMTP are replaced
//! by deterministic stubs.

mod common;
mod crawl_tests;
mod export_tests;
mod upload_tests;
