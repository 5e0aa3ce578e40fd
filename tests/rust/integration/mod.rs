//! Integration tests - the full router and catalog driven in process
//! against the reference fixtures.

mod route_tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use classdex::config::ServerConfig;
use classdex::server::AppState;
use classdex::store::{fixtures, CatalogStore};

pub fn manifest_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

/// A catalog seeded with the same fixtures the snapshot suite uses.
pub fn reference_store() -> CatalogStore {
    let store = CatalogStore::open_in_memory().expect("in-memory catalog");
    for fixture in ["project.json", "3.2.json", "4.0.json"] {
        let path = manifest_path("tests/fixtures").join(fixture);
        fixtures::load_fixture_file(&store, &path)
            .unwrap_or_else(|e| panic!("loading {fixture}: {e}"));
    }
    store
}

pub fn reference_app() -> axum::Router {
    let state = Arc::new(AppState {
        store: reference_store(),
        config: ServerConfig::default(),
    });
    classdex::server::router(state)
}
