//! Integration tests for parsing JSON:API documents.
//!
//! These tests validate that responses built from realistic JSON:API payloads
//! expose their data, side-loaded resources and errors correctly.

use jsonapi_client::{Error, JsonApiAdapter, RawResponse, ResponseAdapter};
use jsonapi_core::document::{ErrorSource, PrimaryData, ResourceIdentifier};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load a fixture from disk.
fn load_fixture(name: &str) -> String {
    let fixture_path = fixtures_dir().join(name);
    fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture at {}: {}",
            fixture_path.display(),
            e
        )
    })
}

#[derive(Debug, Deserialize)]
struct ArticleAttributes {
    title: String,
    published: bool,
    word_count: u32,
}

#[test]
fn test_compound_document_primary_data() {
    let raw = RawResponse::new(StatusCode::OK, load_fixture("compound_document.json"));
    let response = JsonApiAdapter.adapt(raw, true).unwrap();

    assert!(matches!(response.data(), Some(PrimaryData::Many(_))));
    let articles = response.resources();
    assert_eq!(articles.len(), 2, "Expected 2 articles in test data");

    let first: ArticleAttributes = articles[0].attributes_as().unwrap();
    assert_eq!(first.title, "JSON:API paints my bikeshed!");
    assert!(first.published);
    assert_eq!(first.word_count, 1250);

    let second: ArticleAttributes = articles[1].attributes_as().unwrap();
    assert!(!second.published);
}

#[test]
fn test_compound_document_relationships_resolve_to_included() {
    let raw = RawResponse::new(StatusCode::OK, load_fixture("compound_document.json"));
    let response = JsonApiAdapter.adapt(raw, true).unwrap();
    let document = response.document();
    let article = response.resources()[0];

    let author = article.related("author");
    assert_eq!(
        author,
        vec![ResourceIdentifier {
            kind: "people".to_string(),
            id: "9".to_string()
        }]
    );
    let person = document
        .find_included(&author[0].kind, &author[0].id)
        .expect("author should be side-loaded");
    assert_eq!(person.attribute("twitter"), Some(&json!("dgeb")));

    let comments = article.related("comments");
    assert_eq!(comments.len(), 2);
    for comment in &comments {
        assert!(document.find_included(&comment.kind, &comment.id).is_some());
    }

    assert!(response.resources()[1].related("comments").is_empty());
    assert_eq!(response.included().len(), 3);
}

#[test]
fn test_compound_document_meta_and_links() {
    let raw = RawResponse::new(StatusCode::OK, load_fixture("compound_document.json"));
    let response = JsonApiAdapter.adapt(raw, true).unwrap();

    assert_eq!(response.meta().and_then(|m| m.get("total")), Some(&json!(3)));
    let links = response.document().links.as_ref().unwrap();
    assert!(links.contains_key("next"));
    assert_eq!(response.document().jsonapi, Some(json!({"version": "1.1"})));
}

#[test]
fn test_validation_errors_raise_with_details() {
    let raw = RawResponse::new(
        StatusCode::UNPROCESSABLE_ENTITY,
        load_fixture("validation_errors.json"),
    );
    let err = JsonApiAdapter.adapt(raw, true).unwrap_err();
    assert_eq!(
        err,
        Error::ValidationError("title must not be blank; Invalid Query Parameter".to_string())
    );
}

#[test]
fn test_validation_errors_are_exposed_without_raising() {
    let raw = RawResponse::new(
        StatusCode::UNPROCESSABLE_ENTITY,
        load_fixture("validation_errors.json"),
    );
    let response = JsonApiAdapter.adapt(raw, false).unwrap();

    assert!(!response.is_success());
    let errors = response.errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].code.as_deref(), Some("blank"));
    assert_eq!(
        errors[0].source,
        Some(ErrorSource {
            pointer: Some("/data/attributes/title".to_string()),
            parameter: None,
        })
    );
    assert_eq!(
        errors[1].source.as_ref().and_then(|s| s.parameter.as_deref()),
        Some("filter[articles][status]")
    );
}
