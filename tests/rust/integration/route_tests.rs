//! Route behavior: statuses, redirects, push-state markers, sitemap and the
//! health probe.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::util::ServiceExt;

use super::reference_app;

async fn get(app: &Router, url: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(url)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("infallible service");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, headers, String::from_utf8_lossy(&bytes).into_owned())
}

fn query_count(headers: &axum::http::HeaderMap) -> Option<usize> {
    headers
        .get(classdex::server::QUERY_COUNT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

// ---------------------------------------------------------------------------
// Health probe
// ---------------------------------------------------------------------------

#[tokio::test]
async fn healthcheck_is_empty_and_touches_no_catalog() {
    let app = reference_app();
    let (status, headers, body) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(query_count(&headers), Some(0));
}

// ---------------------------------------------------------------------------
// Lookup misses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_version_is_404() {
    let app = reference_app();
    let (status, headers, body) = get(&app, "/projects/django/9.9/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Page not found"), "{body}");
    // The miss itself is one catalog query.
    assert_eq!(query_count(&headers), Some(1));
}

#[tokio::test]
async fn unknown_module_is_404_after_fuzzy_retry() {
    let app = reference_app();
    let (status, headers, _) = get(&app, "/projects/django/4.0/django.nosuch.module/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    // Version hit, precise miss, case-folded miss.
    assert_eq!(query_count(&headers), Some(3));
}

#[tokio::test]
async fn unknown_klass_is_404() {
    let app = reference_app();
    let (status, _, _) = get(
        &app,
        "/projects/django/4.0/django.views.generic.edit/NoSuchView/",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_shortcut_is_404() {
    let app = reference_app();
    let (status, _, _) = get(&app, "/NoSuchView/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Latest-version redirects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn latest_version_redirects_to_newest() {
    let app = reference_app();
    let (status, headers, _) = get(&app, "/projects/django/latest/").await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        headers.get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/projects/django/4.0/")
    );
}

#[tokio::test]
async fn latest_module_redirect_preserves_requested_module() {
    let app = reference_app();
    let (status, headers, _) =
        get(&app, "/projects/DJANGO/latest/DJANGO.VIEWS.GENERIC.EDIT/").await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    // The package folds to its canonical casing; the module is resolved by
    // the target page, so the requested casing is passed through.
    assert_eq!(
        headers.get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/projects/django/4.0/DJANGO.VIEWS.GENERIC.EDIT/")
    );
}

#[tokio::test]
async fn latest_klass_redirects_to_newest() {
    let app = reference_app();
    let (status, headers, _) = get(
        &app,
        "/projects/django/latest/django.views.generic.edit/FormView/",
    )
    .await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        headers.get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/projects/django/4.0/django.views.generic.edit/FormView/")
    );
}

#[tokio::test]
async fn latest_redirect_for_unknown_package_is_404() {
    let app = reference_app();
    let (status, _, _) = get(&app, "/projects/flask/latest/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Case folding and push-state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn canonical_klass_page_has_no_push_state() {
    let app = reference_app();
    let (status, _, body) = get(
        &app,
        "/projects/django/4.0/django.views.generic.edit/FormView/",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("history.replaceState"), "{body}");
}

#[tokio::test]
async fn miscased_shortcut_resolves_and_pushes_canonical_path() {
    let app = reference_app();
    let (status, _, body) = get(&app, "/fORMvIEW/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(
        "history.replaceState(null, \"\", \
         \"/projects/django/4.0/django.views.generic.edit/FormView/\")"
    ));
    // The page itself shows the canonical name.
    assert!(body.contains("<h1>FormView</h1>"));
}

#[tokio::test]
async fn exactly_cased_shortcut_renders_like_the_canonical_page() {
    let app = reference_app();
    let (_, _, shortcut) = get(&app, "/FormView/").await;
    let (_, _, canonical) = get(
        &app,
        "/projects/django/4.0/django.views.generic.edit/FormView/",
    )
    .await;
    assert_eq!(shortcut, canonical);
}

#[tokio::test]
async fn miscased_module_page_pushes_canonical_path() {
    let app = reference_app();
    let (status, _, body) =
        get(&app, "/projects/django/4.0/DJANGO.VIEWS.GENERIC.EDIT/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(
        "history.replaceState(null, \"\", \"/projects/django/4.0/django.views.generic.edit/\")"
    ));
}

// ---------------------------------------------------------------------------
// Sitemap
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sitemap_lists_every_klass_with_version_weighted_priority() {
    let app = reference_app();
    let (status, headers, body) = get(&app, "/sitemap.xml").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("application/xml")
    );
    assert!(body.contains("<loc>http://localhost:8080/</loc>"));
    assert!(body.contains("<priority>1.0</priority>"));
    assert!(body.contains(
        "<loc>http://localhost:8080/projects/django/4.0/django.views.generic.edit/FormView/</loc>"
    ));
    assert!(body.contains(
        "<loc>http://localhost:8080/projects/django/3.2/django.views.generic.edit/FormView/</loc>"
    ));
    assert!(body.contains("<priority>0.9</priority>"));
    assert!(body.contains("<priority>0.5</priority>"));
    // Every class page in both versions is present: 7 in 4.0, 6 in 3.2,
    // plus the home entry.
    assert_eq!(body.matches("<url>").count(), 14);
}
