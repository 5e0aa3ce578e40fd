//! Page handlers.
//!
//! Lookup semantics mirror the catalog's case rules: package, module and
//! class names fold case, version numbers match exactly. When a request
//! needed case-folded resolution the page carries a push-state URL pointing
//! at the canonical path; exactly-cased requests (including the `/{klass}/`
//! shortcut alias) render without one, which is what lets the shortcut share
//! a snapshot with the canonical class page.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::render;
use crate::server::models::{build_klass_page, build_nav};
use crate::server::AppState;
use crate::store::StoreError;
use crate::urls;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("no matching catalog entry")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::NotFound => {
                (StatusCode::NOT_FOUND, Html(render::not_found_page())).into_response()
            }
            PageError::Store(error) => {
                log::error!("catalog error while rendering page: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(render::server_error_page()),
                )
                    .into_response()
            }
        }
    }
}

/// Latest version's class index.
pub async fn home(State(state): State<Arc<AppState>>) -> Result<Html<String>, PageError> {
    let store = &state.store;
    let version = store.latest_version()?.ok_or(PageError::NotFound)?;
    let klasses = store.klasses_for_version(version.id)?;
    let nav = build_nav(store, &version, None, None)?;
    Ok(Html(render::home_page(
        &state.config.site_base_url,
        &version,
        &klasses,
        &nav,
    )))
}

/// Class index for one version.
pub async fn version_detail(
    State(state): State<Arc<AppState>>,
    Path((package, version)): Path<(String, String)>,
) -> Result<Html<String>, PageError> {
    let store = &state.store;
    let row = store
        .version_by_slug(&package, &version)?
        .ok_or(PageError::NotFound)?;
    let push_state = (row.package != package).then(|| row.path());
    let klasses = store.klasses_for_version(row.id)?;
    let nav = build_nav(store, &row, None, None)?;
    Ok(Html(render::version_page(
        &state.config.site_base_url,
        &row,
        &klasses,
        &nav,
        push_state.as_deref(),
    )))
}

/// Module page. Precise lookup first, case-folded fallback second; the
/// fallback costs one extra query, which the snapshot suite pins down.
pub async fn module_detail(
    State(state): State<Arc<AppState>>,
    Path((package, version, module)): Path<(String, String, String)>,
) -> Result<Html<String>, PageError> {
    let store = &state.store;
    let version_row = store
        .version_by_slug(&package, &version)?
        .ok_or(PageError::NotFound)?;
    let (module_row, fuzzed) = match store.module_by_name(version_row.id, &module)? {
        Some(row) => (row, false),
        None => (
            store
                .module_by_name_nocase(version_row.id, &module)?
                .ok_or(PageError::NotFound)?,
            true,
        ),
    };
    let push_state = (fuzzed || version_row.package != package).then(|| module_row.path());
    let klasses = store.klasses_for_module(module_row.id)?;
    let canonical_path = store
        .latest_module_by_name(version_row.project_id, &module_row.name)?
        .map(|latest| latest.path())
        .unwrap_or_else(|| module_row.path());
    let nav = build_nav(store, &version_row, Some(module_row.id), None)?;
    Ok(Html(render::module_page(
        &format!("{}{}", state.config.site_base_url, canonical_path),
        &module_row,
        &klasses,
        &nav,
        push_state.as_deref(),
    )))
}

/// Class page. The lookup is case-folded in one statement, so canonical and
/// miscased requests cost the same number of queries.
pub async fn klass_detail(
    State(state): State<Arc<AppState>>,
    Path((package, version, module, klass)): Path<(String, String, String, String)>,
) -> Result<Html<String>, PageError> {
    let store = &state.store;
    let version_row = store
        .version_by_slug(&package, &version)?
        .ok_or(PageError::NotFound)?;
    let klass_row = store
        .klass_for_version_nocase(version_row.id, &module, &klass)?
        .ok_or(PageError::NotFound)?;
    let fuzzed = klass_row.package != package
        || klass_row.module_name != module
        || klass_row.name != klass;
    let push_state = fuzzed.then(|| klass_row.path());
    let page = build_klass_page(
        store,
        &state.config.site_base_url,
        &version_row,
        klass_row,
        push_state,
    )?;
    Ok(Html(render::klass_page(&page)))
}

/// `/{klass}/` resolves the newest version carrying that class name.
pub async fn klass_detail_shortcut(
    State(state): State<Arc<AppState>>,
    Path(klass): Path<String>,
) -> Result<Html<String>, PageError> {
    let store = &state.store;
    let klass_row = store
        .latest_klass_by_name(&klass)?
        .ok_or(PageError::NotFound)?;
    let push_state = (klass_row.name != klass).then(|| klass_row.path());
    let version_row = klass_row.version();
    let page = build_klass_page(
        store,
        &state.config.site_base_url,
        &version_row,
        klass_row,
        push_state,
    )?;
    Ok(Html(render::klass_page(&page)))
}

/// `/projects/{package}/latest/` redirects to the newest version's index.
pub async fn version_detail_latest(
    State(state): State<Arc<AppState>>,
    Path(package): Path<String>,
) -> Result<Redirect, PageError> {
    let latest = state
        .store
        .latest_version_for_package(&package)?
        .ok_or(PageError::NotFound)?;
    Ok(Redirect::temporary(&latest.path()))
}

pub async fn module_detail_latest(
    State(state): State<Arc<AppState>>,
    Path((package, module)): Path<(String, String)>,
) -> Result<Redirect, PageError> {
    let latest = state
        .store
        .latest_version_for_package(&package)?
        .ok_or(PageError::NotFound)?;
    // The target resolves the module itself, folding case if needed.
    Ok(Redirect::temporary(&urls::module_path(
        &latest.package,
        &latest.version_number,
        &module,
    )))
}

pub async fn klass_detail_latest(
    State(state): State<Arc<AppState>>,
    Path((package, module, klass)): Path<(String, String, String)>,
) -> Result<Redirect, PageError> {
    let latest = state
        .store
        .latest_version_for_package(&package)?
        .ok_or(PageError::NotFound)?;
    Ok(Redirect::temporary(&urls::klass_path(
        &latest.package,
        &latest.version_number,
        &module,
        &klass,
    )))
}

pub async fn sitemap(State(state): State<Arc<AppState>>) -> Result<Response, PageError> {
    let store = &state.store;
    let latest = store.latest_version()?.ok_or(PageError::NotFound)?;
    let klasses = store.all_klasses()?;
    let xml = render::sitemap(&state.config.site_base_url, &latest, &klasses);
    Ok(([(header::CONTENT_TYPE, "application/xml")], xml).into_response())
}

/// Minimal "up" probe. Returns an empty 200 response.
///
/// Deliberately doesn't touch the catalog so that a misconfigured or broken
/// database doesn't take the health endpoint down with it.
pub async fn healthcheck() -> StatusCode {
    StatusCode::OK
}
