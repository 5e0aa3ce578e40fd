//! View models assembled from the catalog before rendering.
//!
//! Handlers build these structs, the renderer turns them into HTML. Keeping
//! the store access here makes each page's query cost a property of this
//! module: the counts asserted by the snapshot suite are sums of the store
//! calls below.

use crate::render;
use crate::store::{
    CatalogStore, KlassRow, PreparedAttribute, PreparedMethod, StoreError, VersionRow,
};

/// Link to the same logical page in another version of the project.
#[derive(Debug, Clone)]
pub struct OtherVersionLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct NavKlass {
    pub name: String,
    pub url: String,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct NavModule {
    pub source_name: String,
    pub short_name: String,
    pub url: String,
    pub active: bool,
    pub classes: Vec<NavKlass>,
}

/// Sidebar state shared by every page.
#[derive(Debug, Clone)]
pub struct NavData {
    pub version_name: String,
    pub other_versions: Vec<OtherVersionLink>,
    pub modules: Vec<NavModule>,
}

/// Assemble the sidebar for a version.
///
/// On class pages the version switcher deep-links to the same class in other
/// versions where it exists, falling back to the version index. That lookup
/// is one extra query and only happens when `active_klass` is set.
pub fn build_nav(
    store: &CatalogStore,
    version: &VersionRow,
    active_module_id: Option<i64>,
    active_klass: Option<&KlassRow>,
) -> Result<NavData, StoreError> {
    let others = store.other_versions(version)?;

    let other_versions = if let Some(klass) = active_klass {
        let ids: Vec<i64> = others.iter().map(|v| v.id).collect();
        let counterparts = store.klasses_named_in_versions(&klass.name, &ids)?;
        others
            .iter()
            .map(|other| {
                let url = counterparts
                    .iter()
                    .find(|k| k.project_version_id == other.id)
                    .map(|k| k.path())
                    .unwrap_or_else(|| other.path());
                OtherVersionLink {
                    name: other.display_name(),
                    url,
                }
            })
            .collect()
    } else {
        others
            .iter()
            .map(|other| OtherVersionLink {
                name: other.display_name(),
                url: other.path(),
            })
            .collect()
    };

    let mut modules = Vec::new();
    for module in store.modules_for_version(version.id)? {
        let classes = store
            .klasses_for_module(module.id)?
            .into_iter()
            .map(|klass| NavKlass {
                active: active_klass.is_some_and(|active| active.id == klass.id),
                url: klass.path(),
                name: klass.name,
            })
            .collect();
        modules.push(NavModule {
            active: active_module_id == Some(module.id),
            url: module.path(),
            short_name: module.short_name().to_string(),
            source_name: module.name.clone(),
            classes,
        });
    }

    Ok(NavData {
        version_name: version.display_name(),
        other_versions,
        modules,
    })
}

/// Everything the class page renders.
#[derive(Debug)]
pub struct KlassPage {
    pub klass: KlassRow,
    pub ancestors: Vec<KlassRow>,
    pub descendants: Vec<KlassRow>,
    pub attributes: Vec<PreparedAttribute>,
    pub methods: Vec<PreparedMethod>,
    /// Absolute URL of this class in the newest version carrying it.
    pub canonical_url: String,
    /// Set when the request needed case-folded resolution; the renderer emits
    /// a `history.replaceState` call to the canonical path.
    pub push_state_url: Option<String>,
    pub yuml_url: Option<String>,
    pub nav: NavData,
}

pub fn build_klass_page(
    store: &CatalogStore,
    site_base_url: &str,
    version: &VersionRow,
    klass: KlassRow,
    push_state_url: Option<String>,
) -> Result<KlassPage, StoreError> {
    let ancestry = store.ancestry(&klass)?;
    let descendants = store.descendants(&klass)?;
    let attributes = store.prepared_attributes(&klass, &ancestry.ancestors)?;
    let methods = store.prepared_methods(&klass, &ancestry.ancestors)?;
    let canonical_path = store
        .latest_klass_by_name(&klass.name)?
        .map(|latest| latest.path())
        .unwrap_or_else(|| klass.path());
    let nav = build_nav(store, version, Some(klass.module_id), Some(&klass))?;

    Ok(KlassPage {
        canonical_url: format!("{site_base_url}{canonical_path}"),
        push_state_url,
        yuml_url: render::yuml_url(&ancestry.edges),
        ancestors: ancestry.ancestors,
        descendants,
        attributes,
        methods,
        nav,
        klass,
    })
}
