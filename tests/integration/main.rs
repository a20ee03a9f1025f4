//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the listing API and run the
//! fetcher and the full pipeline against it end-to-end.

mod common;
mod fetch_tests;
mod pipeline_tests;
