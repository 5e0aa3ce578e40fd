//! Named routes and URL reversal.
//!
//! Every link the renderer emits and every path the router matches comes from
//! the single pattern table below, so the two can never drift apart.

/// The named routes of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    VersionDetail,
    VersionDetailLatest,
    ModuleDetail,
    ModuleDetailLatest,
    KlassDetail,
    KlassDetailLatest,
    KlassDetailShortcut,
    Sitemap,
    Healthcheck,
}

impl Route {
    pub const ALL: [Route; 10] = [
        Route::Home,
        Route::VersionDetail,
        Route::VersionDetailLatest,
        Route::ModuleDetail,
        Route::ModuleDetailLatest,
        Route::KlassDetail,
        Route::KlassDetailLatest,
        Route::KlassDetailShortcut,
        Route::Sitemap,
        Route::Healthcheck,
    ];

    /// Stable route name, usable for lookup and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::VersionDetail => "version-detail",
            Route::VersionDetailLatest => "version-detail-latest",
            Route::ModuleDetail => "module-detail",
            Route::ModuleDetailLatest => "module-detail-latest",
            Route::KlassDetail => "klass-detail",
            Route::KlassDetailLatest => "klass-detail-latest",
            Route::KlassDetailShortcut => "klass-detail-shortcut",
            Route::Sitemap => "sitemap",
            Route::Healthcheck => "healthcheck",
        }
    }

    /// Axum path pattern. `latest` segments are static and therefore take
    /// priority over the `{version}` captures at the same position.
    pub fn pattern(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::VersionDetail => "/projects/{package}/{version}/",
            Route::VersionDetailLatest => "/projects/{package}/latest/",
            Route::ModuleDetail => "/projects/{package}/{version}/{module}/",
            Route::ModuleDetailLatest => "/projects/{package}/latest/{module}/",
            Route::KlassDetail => "/projects/{package}/{version}/{module}/{klass}/",
            Route::KlassDetailLatest => "/projects/{package}/latest/{module}/{klass}/",
            Route::KlassDetailShortcut => "/{klass}/",
            Route::Sitemap => "/sitemap.xml",
            Route::Healthcheck => "/healthz",
        }
    }

    pub fn by_name(name: &str) -> Option<Route> {
        Route::ALL.iter().copied().find(|route| route.name() == name)
    }
}

/// Build the path for a named route by substituting `{param}` placeholders.
///
/// Panics when a parameter does not exist in the pattern or a placeholder is
/// left unfilled; both are programmer errors, not runtime conditions.
pub fn reverse(route: Route, params: &[(&str, &str)]) -> String {
    let mut path = route.pattern().to_string();
    for (key, value) in params {
        let placeholder = format!("{{{key}}}");
        assert!(
            path.contains(&placeholder),
            "route {:?} has no {{{key}}} parameter",
            route.name()
        );
        path = path.replace(&placeholder, value);
    }
    assert!(
        !path.contains('{'),
        "unfilled parameter reversing route {:?}: {path}",
        route.name()
    );
    path
}

pub fn version_path(package: &str, version: &str) -> String {
    reverse(
        Route::VersionDetail,
        &[("package", package), ("version", version)],
    )
}

pub fn module_path(package: &str, version: &str, module: &str) -> String {
    reverse(
        Route::ModuleDetail,
        &[("package", package), ("version", version), ("module", module)],
    )
}

pub fn klass_path(package: &str, version: &str, module: &str, klass: &str) -> String {
    reverse(
        Route::KlassDetail,
        &[
            ("package", package),
            ("version", version),
            ("module", module),
            ("klass", klass),
        ],
    )
}

pub fn klass_shortcut_path(klass: &str) -> String {
    reverse(Route::KlassDetailShortcut, &[("klass", klass)])
}
