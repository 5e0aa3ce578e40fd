//! Checks that the pages in `rendered_views` match the reference files in
//! `tests/_page_snapshots/`.
//!
//! This suite is intended to prevent regressions when refactoring handlers or
//! the renderer. As well as ensuring the HTML hasn't materially changed, it
//! also checks the number of catalog queries made while rendering each page.
//!
//! If the reference files legitimately need to change, re-generate them by
//! running this suite once with `CLASSDEX_UPDATE_SNAPSHOTS=1`, review the
//! diff, and commit the result.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serial_test::serial;
use tower::util::ServiceExt;

use classdex::config::ServerConfig;
use classdex::html_compare::compare_html;
use classdex::server::{AppState, QUERY_COUNT_HEADER};
use classdex::store::{fixtures, CatalogStore};
use classdex::urls::{self, Route};

const UPDATE_ENV_VAR: &str = "CLASSDEX_UPDATE_SNAPSHOTS";
const FIXTURES: [&str; 3] = ["project.json", "3.2.json", "4.0.json"];

/// `(snapshot filename, expected catalog queries, url)` for every rendered
/// view. The canonical class page and the `/{klass}/` shortcut share a
/// snapshot; so do the two miscased class rows.
fn rendered_views() -> Vec<(&'static str, usize, String)> {
    vec![
        ("homepage.html", 6, urls::reverse(Route::Home, &[])),
        (
            "version-detail.html",
            6,
            urls::version_path("django", "4.0"),
        ),
        (
            "module-detail.html",
            8,
            urls::module_path("django", "4.0", "django.views.generic.edit"),
        ),
        (
            "klass-detail.html",
            27,
            urls::klass_path("django", "4.0", "django.views.generic.edit", "FormView"),
        ),
        (
            "klass-detail.html",
            26,
            urls::klass_shortcut_path("FormView"),
        ),
        // Detail pages with wRonGLY CasEd arGuMEnTs
        (
            "fuzzy-version-detail.html",
            6,
            urls::version_path("DJANGO", "4.0"),
        ),
        (
            "fuzzy-module-detail.html",
            9,
            urls::module_path("DJANGO", "4.0", "DJANGO.VIEWS.GENERIC.EDIT"),
        ),
        (
            "fuzzy-klass-detail.html",
            27,
            urls::klass_path("DJANGO", "4.0", "DJANGO.VIEWS.GENERIC.EDIT", "fORMvIEW"),
        ),
        (
            "fuzzy-klass-detail.html",
            26,
            urls::klass_shortcut_path("fORMvIEW"),
        ),
    ]
}

fn manifest_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn reference_app() -> Router {
    let store = CatalogStore::open_in_memory().expect("in-memory catalog");
    for fixture in FIXTURES {
        let path = manifest_path("tests/fixtures").join(fixture);
        fixtures::load_fixture_file(&store, &path)
            .unwrap_or_else(|e| panic!("loading {fixture}: {e}"));
    }
    let state = Arc::new(AppState {
        store,
        config: ServerConfig::default(),
    });
    classdex::server::router(state)
}

async fn get(app: &Router, url: &str) -> (StatusCode, usize, String) {
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
    let queries = response
        .headers()
        .get(QUERY_COUNT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(usize::MAX);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let html = String::from_utf8(bytes.to_vec()).expect("utf-8 body");
    (status, queries, html)
}

#[tokio::test]
#[serial]
async fn test_page_html() {
    let app = reference_app();
    let update_snapshots = env::var(UPDATE_ENV_VAR).is_ok();

    // Each row is an independent sub-check; failures accumulate so one
    // regression never masks another.
    let mut failures: Vec<String> = Vec::new();

    for (filename, expected_queries, url) in rendered_views() {
        let (status, queries, html) = get(&app, &url).await;

        if status != StatusCode::OK {
            failures.push(format!("[{url}] expected 200 OK, got {status}"));
            continue;
        }
        if queries != expected_queries {
            failures.push(format!(
                "[{url}] expected {expected_queries} catalog queries, got {queries}"
            ));
        }

        let path = manifest_path("tests/_page_snapshots").join(filename);
        if update_snapshots {
            fs::write(&path, &html)
                .unwrap_or_else(|e| panic!("writing snapshot {}: {e}", path.display()));
        }
        match fs::read_to_string(&path) {
            Ok(expected) => {
                if let Err(mismatch) = compare_html(&html, &expected) {
                    failures.push(format!("[{url}] {mismatch}"));
                }
            }
            Err(e) => {
                failures.push(format!(
                    "[{url}] cannot read snapshot {}: {e}",
                    path.display()
                ));
            }
        }
    }

    assert!(
        failures.is_empty(),
        "{} snapshot check(s) failed:\n{}",
        failures.len(),
        failures.join("\n")
    );
}

/// Rendering is deterministic: two independently seeded applications produce
/// byte-identical pages. This is what makes snapshot regeneration followed by
/// a re-run yield zero diffs.
#[tokio::test]
#[serial]
async fn test_rendering_is_deterministic() {
    let first = reference_app();
    let second = reference_app();
    for (_, _, url) in rendered_views() {
        let (status_a, queries_a, html_a) = get(&first, &url).await;
        let (status_b, queries_b, html_b) = get(&second, &url).await;
        assert_eq!(status_a, StatusCode::OK, "{url}");
        assert_eq!(status_a, status_b, "{url}");
        assert_eq!(queries_a, queries_b, "{url}");
        assert_eq!(html_a, html_b, "{url}");
    }
}

/// Shared snapshot rows really are byte-identical pages: the shortcut renders
/// exactly like the canonical class page, and both miscased class URLs render
/// exactly alike.
#[tokio::test]
#[serial]
async fn test_shared_snapshots_are_identical_renders() {
    let app = reference_app();
    let (_, _, canonical) = get(
        &app,
        &urls::klass_path("django", "4.0", "django.views.generic.edit", "FormView"),
    )
    .await;
    let (_, _, shortcut) = get(&app, &urls::klass_shortcut_path("FormView")).await;
    assert_eq!(canonical, shortcut);

    let (_, _, fuzzy_full) = get(
        &app,
        &urls::klass_path("DJANGO", "4.0", "DJANGO.VIEWS.GENERIC.EDIT", "fORMvIEW"),
    )
    .await;
    let (_, _, fuzzy_shortcut) = get(&app, &urls::klass_shortcut_path("fORMvIEW")).await;
    assert_eq!(fuzzy_full, fuzzy_shortcut);

    // The fuzzy variant differs from the canonical page only by the
    // push-state script.
    assert_ne!(canonical, fuzzy_full);
    assert!(fuzzy_full.contains("history.replaceState"));
    assert!(!canonical.contains("history.replaceState"));
}
