//! SQLite-backed catalog of projects, versions, modules and classes.
//!
//! Every SQL statement issued on behalf of a page goes through [`CatalogStore::run`],
//! which bumps a monotonic counter. The server's query-count middleware reads the
//! counter before and after each request, which is what the snapshot suite asserts
//! against. One store method is one SQL statement; the hierarchy walks issue one
//! statement per expanded node, so page costs stay data-proportional and exact.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

use crate::urls;

pub mod fixtures;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// A project version joined with its project name.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRow {
    pub id: i64,
    pub project_id: i64,
    pub package: String,
    pub version_number: String,
    pub sortable_version_number: String,
}

impl VersionRow {
    /// Display form, e.g. `django 4.0`.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.package, self.version_number)
    }

    pub fn path(&self) -> String {
        urls::version_path(&self.package, &self.version_number)
    }
}

/// A module joined with its version and project names.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRow {
    pub id: i64,
    pub project_version_id: i64,
    pub name: String,
    pub docstring: String,
    pub filename: String,
    pub version_number: String,
    pub package: String,
}

impl ModuleRow {
    /// Final dotted-path segment, e.g. `edit` for `django.views.generic.edit`.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn path(&self) -> String {
        urls::module_path(&self.package, &self.version_number, &self.name)
    }
}

/// A class joined with enough context to build its canonical URL.
#[derive(Debug, Clone, PartialEq)]
pub struct KlassRow {
    pub id: i64,
    pub module_id: i64,
    pub name: String,
    pub docstring: String,
    pub line_number: i64,
    pub module_name: String,
    pub project_version_id: i64,
    pub project_id: i64,
    pub version_number: String,
    pub sortable_version_number: String,
    pub package: String,
}

impl KlassRow {
    pub fn path(&self) -> String {
        urls::klass_path(
            &self.package,
            &self.version_number,
            &self.module_name,
            &self.name,
        )
    }

    pub fn module_path(&self) -> String {
        urls::module_path(&self.package, &self.version_number, &self.module_name)
    }

    /// Import statement shown on the class page.
    pub fn import_statement(&self) -> String {
        format!("from {} import {}", self.module_name, self.name)
    }

    /// Reconstruct the version this class belongs to from the joined columns.
    pub fn version(&self) -> VersionRow {
        VersionRow {
            id: self.project_version_id,
            project_id: self.project_id,
            package: self.package.clone(),
            version_number: self.version_number.clone(),
            sortable_version_number: self.sortable_version_number.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRow {
    pub klass_id: i64,
    pub name: String,
    pub value: String,
    pub line_number: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodRow {
    pub klass_id: i64,
    pub name: String,
    pub docstring: String,
    pub code: String,
    pub line_number: i64,
}

/// Result of an ancestry walk: the MRO-like linearization plus the raw
/// inheritance edges encountered, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct Ancestry {
    pub ancestors: Vec<KlassRow>,
    /// `(parent name, child name)` pairs, including edges into already-visited
    /// nodes, for inheritance-diagram rendering.
    pub edges: Vec<(String, String)>,
}

/// Class whose definition another class inherits, with a link target.
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    pub klass_name: String,
    pub url: String,
}

/// An attribute as seen from a class: own definitions shadow inherited ones.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAttribute {
    pub name: String,
    pub value: String,
    pub line_number: i64,
    /// `None` when defined on the class itself.
    pub origin: Option<Origin>,
}

/// A method as seen from a class, under the same shadowing rule.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMethod {
    pub name: String,
    pub docstring: String,
    pub code: String,
    pub line_number: i64,
    pub origin: Option<Origin>,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS project_versions (
    id INTEGER PRIMARY KEY,
    project_id INTEGER NOT NULL REFERENCES projects(id),
    version_number TEXT NOT NULL,
    sortable_version_number TEXT NOT NULL,
    UNIQUE (project_id, version_number)
);
CREATE TABLE IF NOT EXISTS modules (
    id INTEGER PRIMARY KEY,
    project_version_id INTEGER NOT NULL REFERENCES project_versions(id),
    name TEXT NOT NULL,
    docstring TEXT NOT NULL DEFAULT '',
    filename TEXT NOT NULL DEFAULT '',
    UNIQUE (project_version_id, name)
);
CREATE TABLE IF NOT EXISTS klasses (
    id INTEGER PRIMARY KEY,
    module_id INTEGER NOT NULL REFERENCES modules(id),
    name TEXT NOT NULL,
    docstring TEXT NOT NULL DEFAULT '',
    line_number INTEGER NOT NULL DEFAULT 0,
    UNIQUE (module_id, name)
);
CREATE TABLE IF NOT EXISTS inheritance (
    id INTEGER PRIMARY KEY,
    parent_id INTEGER NOT NULL REFERENCES klasses(id),
    child_id INTEGER NOT NULL REFERENCES klasses(id),
    position INTEGER NOT NULL,
    UNIQUE (child_id, position)
);
CREATE TABLE IF NOT EXISTS klass_attributes (
    id INTEGER PRIMARY KEY,
    klass_id INTEGER NOT NULL REFERENCES klasses(id),
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    line_number INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS klass_methods (
    id INTEGER PRIMARY KEY,
    klass_id INTEGER NOT NULL REFERENCES klasses(id),
    name TEXT NOT NULL,
    docstring TEXT NOT NULL DEFAULT '',
    code TEXT NOT NULL DEFAULT '',
    line_number INTEGER NOT NULL DEFAULT 0
);
";

/// Joined column list shared by every class query.
const KLASS_COLUMNS: &str = "k.id, k.module_id, k.name, k.docstring, k.line_number, \
     m.name, pv.id, pv.project_id, pv.version_number, pv.sortable_version_number, p.name";

const KLASS_JOINS: &str = "FROM klasses k \
     JOIN modules m ON m.id = k.module_id \
     JOIN project_versions pv ON pv.id = m.project_version_id \
     JOIN projects p ON p.id = pv.project_id";

/// Embedded catalog store with per-statement query accounting.
pub struct CatalogStore {
    conn: Mutex<Connection>,
    queries: AtomicUsize,
}

impl CatalogStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        // Schema and pragma setup happen outside the counted path so that the
        // counter only ever reflects catalog queries.
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            queries: AtomicUsize::new(0),
        })
    }

    /// Number of SQL statements executed so far. Monotonic.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    fn run<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T, StoreError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let conn = self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(f(&conn)?)
    }

    // ------------------------------------------------------------------
    // Version lookups
    // ------------------------------------------------------------------

    pub fn latest_version(&self) -> Result<Option<VersionRow>, StoreError> {
        self.run(|conn| {
            conn.query_row(
                "SELECT pv.id, pv.project_id, p.name, pv.version_number, pv.sortable_version_number \
                 FROM project_versions pv JOIN projects p ON p.id = pv.project_id \
                 ORDER BY pv.sortable_version_number DESC LIMIT 1",
                [],
                version_from_row,
            )
            .optional()
        })
    }

    pub fn latest_version_for_package(
        &self,
        package: &str,
    ) -> Result<Option<VersionRow>, StoreError> {
        self.run(|conn| {
            conn.query_row(
                "SELECT pv.id, pv.project_id, p.name, pv.version_number, pv.sortable_version_number \
                 FROM project_versions pv JOIN projects p ON p.id = pv.project_id \
                 WHERE p.name = ?1 COLLATE NOCASE \
                 ORDER BY pv.sortable_version_number DESC LIMIT 1",
                params![package],
                version_from_row,
            )
            .optional()
        })
    }

    /// Package names are matched case-insensitively; version numbers exactly.
    pub fn version_by_slug(
        &self,
        package: &str,
        version_number: &str,
    ) -> Result<Option<VersionRow>, StoreError> {
        self.run(|conn| {
            conn.query_row(
                "SELECT pv.id, pv.project_id, p.name, pv.version_number, pv.sortable_version_number \
                 FROM project_versions pv JOIN projects p ON p.id = pv.project_id \
                 WHERE p.name = ?1 COLLATE NOCASE AND pv.version_number = ?2",
                params![package, version_number],
                version_from_row,
            )
            .optional()
        })
    }

    /// Sibling versions of the same project, newest first.
    pub fn other_versions(&self, version: &VersionRow) -> Result<Vec<VersionRow>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare(
                "SELECT pv.id, pv.project_id, p.name, pv.version_number, pv.sortable_version_number \
                 FROM project_versions pv JOIN projects p ON p.id = pv.project_id \
                 WHERE pv.project_id = ?1 AND pv.id != ?2 \
                 ORDER BY pv.sortable_version_number DESC",
            )?;
            let rows = stmt.query_map(params![version.project_id, version.id], version_from_row)?;
            rows.collect()
        })
    }

    // ------------------------------------------------------------------
    // Module lookups
    // ------------------------------------------------------------------

    pub fn modules_for_version(&self, version_id: i64) -> Result<Vec<ModuleRow>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MODULE_COLUMNS} {MODULE_JOINS} \
                 WHERE m.project_version_id = ?1 ORDER BY m.name"
            ))?;
            let rows = stmt.query_map(params![version_id], module_from_row)?;
            rows.collect()
        })
    }

    pub fn module_by_name(
        &self,
        version_id: i64,
        name: &str,
    ) -> Result<Option<ModuleRow>, StoreError> {
        self.run(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {MODULE_COLUMNS} {MODULE_JOINS} \
                     WHERE m.project_version_id = ?1 AND m.name = ?2"
                ),
                params![version_id, name],
                module_from_row,
            )
            .optional()
        })
    }

    /// Case-folded fallback for miscased URL segments.
    pub fn module_by_name_nocase(
        &self,
        version_id: i64,
        name: &str,
    ) -> Result<Option<ModuleRow>, StoreError> {
        self.run(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {MODULE_COLUMNS} {MODULE_JOINS} \
                     WHERE m.project_version_id = ?1 AND m.name = ?2 COLLATE NOCASE"
                ),
                params![version_id, name],
                module_from_row,
            )
            .optional()
        })
    }

    /// Newest version of a module across the project; canonical-link target.
    pub fn latest_module_by_name(
        &self,
        project_id: i64,
        name: &str,
    ) -> Result<Option<ModuleRow>, StoreError> {
        self.run(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {MODULE_COLUMNS} {MODULE_JOINS} \
                     WHERE pv.project_id = ?1 AND m.name = ?2 COLLATE NOCASE \
                     ORDER BY pv.sortable_version_number DESC LIMIT 1"
                ),
                params![project_id, name],
                module_from_row,
            )
            .optional()
        })
    }

    // ------------------------------------------------------------------
    // Class lookups
    // ------------------------------------------------------------------

    pub fn klasses_for_version(&self, version_id: i64) -> Result<Vec<KlassRow>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {KLASS_COLUMNS} {KLASS_JOINS} \
                 WHERE pv.id = ?1 ORDER BY m.name, k.name"
            ))?;
            let rows = stmt.query_map(params![version_id], klass_from_row)?;
            rows.collect()
        })
    }

    pub fn klasses_for_module(&self, module_id: i64) -> Result<Vec<KlassRow>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {KLASS_COLUMNS} {KLASS_JOINS} \
                 WHERE k.module_id = ?1 ORDER BY k.name"
            ))?;
            let rows = stmt.query_map(params![module_id], klass_from_row)?;
            rows.collect()
        })
    }

    /// Class pages resolve case-insensitively in a single statement, so a
    /// miscased request costs the same as a canonical one.
    pub fn klass_for_version_nocase(
        &self,
        version_id: i64,
        module_name: &str,
        klass_name: &str,
    ) -> Result<Option<KlassRow>, StoreError> {
        self.run(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {KLASS_COLUMNS} {KLASS_JOINS} \
                     WHERE pv.id = ?1 AND m.name = ?2 COLLATE NOCASE \
                     AND k.name = ?3 COLLATE NOCASE"
                ),
                params![version_id, module_name, klass_name],
                klass_from_row,
            )
            .optional()
        })
    }

    /// Newest version carrying a class of this name; backs the `/{klass}/`
    /// shortcut and canonical links.
    pub fn latest_klass_by_name(&self, name: &str) -> Result<Option<KlassRow>, StoreError> {
        self.run(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {KLASS_COLUMNS} {KLASS_JOINS} \
                     WHERE k.name = ?1 COLLATE NOCASE \
                     ORDER BY pv.sortable_version_number DESC LIMIT 1"
                ),
                params![name],
                klass_from_row,
            )
            .optional()
        })
    }

    /// Same-named classes in the given versions; feeds the version switcher.
    pub fn klasses_named_in_versions(
        &self,
        name: &str,
        version_ids: &[i64],
    ) -> Result<Vec<KlassRow>, StoreError> {
        if version_ids.is_empty() {
            // SQLite rejects an empty IN list; there is nothing to look up anyway.
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; version_ids.len()].join(", ");
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {KLASS_COLUMNS} {KLASS_JOINS} \
                 WHERE k.name = ? AND pv.id IN ({placeholders}) \
                 ORDER BY pv.sortable_version_number DESC"
            ))?;
            let mut bindings: Vec<&dyn rusqlite::types::ToSql> = vec![&name];
            for id in version_ids {
                bindings.push(id);
            }
            let rows = stmt.query_map(bindings.as_slice(), klass_from_row)?;
            rows.collect()
        })
    }

    pub fn all_klasses(&self) -> Result<Vec<KlassRow>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {KLASS_COLUMNS} {KLASS_JOINS} \
                 ORDER BY pv.sortable_version_number DESC, m.name, k.name"
            ))?;
            let rows = stmt.query_map([], klass_from_row)?;
            rows.collect()
        })
    }

    // ------------------------------------------------------------------
    // Inheritance graph
    // ------------------------------------------------------------------

    /// One hop up, in declaration order.
    pub fn direct_parents(&self, klass_id: i64) -> Result<Vec<KlassRow>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {KLASS_COLUMNS} {KLASS_JOINS} \
                 JOIN inheritance i ON i.parent_id = k.id \
                 WHERE i.child_id = ?1 ORDER BY i.position"
            ))?;
            let rows = stmt.query_map(params![klass_id], klass_from_row)?;
            rows.collect()
        })
    }

    /// One hop down, name-ordered.
    pub fn direct_children(&self, klass_id: i64) -> Result<Vec<KlassRow>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {KLASS_COLUMNS} {KLASS_JOINS} \
                 JOIN inheritance i ON i.child_id = k.id \
                 WHERE i.parent_id = ?1 ORDER BY k.name"
            ))?;
            let rows = stmt.query_map(params![klass_id], klass_from_row)?;
            rows.collect()
        })
    }

    /// Pre-order walk of `direct_parents`; first sighting wins, so diamonds
    /// collapse and cyclic data terminates. One query per expanded node.
    pub fn ancestry(&self, klass: &KlassRow) -> Result<Ancestry, StoreError> {
        let mut seen = HashSet::from([klass.id]);
        let mut ancestry = Ancestry::default();
        self.walk_parents(klass, &mut seen, &mut ancestry)?;
        Ok(ancestry)
    }

    fn walk_parents(
        &self,
        node: &KlassRow,
        seen: &mut HashSet<i64>,
        ancestry: &mut Ancestry,
    ) -> Result<(), StoreError> {
        for parent in self.direct_parents(node.id)? {
            ancestry.edges.push((parent.name.clone(), node.name.clone()));
            if seen.insert(parent.id) {
                ancestry.ancestors.push(parent.clone());
                self.walk_parents(&parent, seen, ancestry)?;
            }
        }
        Ok(())
    }

    /// The dual walk over `direct_children`.
    pub fn descendants(&self, klass: &KlassRow) -> Result<Vec<KlassRow>, StoreError> {
        let mut seen = HashSet::from([klass.id]);
        let mut out = Vec::new();
        self.walk_children(klass, &mut seen, &mut out)?;
        Ok(out)
    }

    fn walk_children(
        &self,
        node: &KlassRow,
        seen: &mut HashSet<i64>,
        out: &mut Vec<KlassRow>,
    ) -> Result<(), StoreError> {
        for child in self.direct_children(node.id)? {
            if seen.insert(child.id) {
                out.push(child.clone());
                self.walk_children(&child, seen, out)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attributes and methods
    // ------------------------------------------------------------------

    pub fn attributes_for(&self, klass_id: i64) -> Result<Vec<AttributeRow>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare(
                "SELECT klass_id, name, value, line_number FROM klass_attributes \
                 WHERE klass_id = ?1 ORDER BY name",
            )?;
            let rows = stmt.query_map(params![klass_id], |row| {
                Ok(AttributeRow {
                    klass_id: row.get(0)?,
                    name: row.get(1)?,
                    value: row.get(2)?,
                    line_number: row.get(3)?,
                })
            })?;
            rows.collect()
        })
    }

    pub fn methods_for(&self, klass_id: i64) -> Result<Vec<MethodRow>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare(
                "SELECT klass_id, name, docstring, code, line_number FROM klass_methods \
                 WHERE klass_id = ?1 ORDER BY name",
            )?;
            let rows = stmt.query_map(params![klass_id], |row| {
                Ok(MethodRow {
                    klass_id: row.get(0)?,
                    name: row.get(1)?,
                    docstring: row.get(2)?,
                    code: row.get(3)?,
                    line_number: row.get(4)?,
                })
            })?;
            rows.collect()
        })
    }

    /// Attributes visible on a class: its own first, then each ancestor's in
    /// MRO order, with already-seen names shadowed. Name-sorted for display.
    pub fn prepared_attributes(
        &self,
        klass: &KlassRow,
        ancestors: &[KlassRow],
    ) -> Result<Vec<PreparedAttribute>, StoreError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for attr in self.attributes_for(klass.id)? {
            seen.insert(attr.name.clone());
            out.push(PreparedAttribute {
                name: attr.name,
                value: attr.value,
                line_number: attr.line_number,
                origin: None,
            });
        }
        for ancestor in ancestors {
            for attr in self.attributes_for(ancestor.id)? {
                if seen.insert(attr.name.clone()) {
                    out.push(PreparedAttribute {
                        name: attr.name,
                        value: attr.value,
                        line_number: attr.line_number,
                        origin: Some(Origin {
                            klass_name: ancestor.name.clone(),
                            url: ancestor.path(),
                        }),
                    });
                }
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    /// Methods visible on a class, under the same shadowing rule.
    pub fn prepared_methods(
        &self,
        klass: &KlassRow,
        ancestors: &[KlassRow],
    ) -> Result<Vec<PreparedMethod>, StoreError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for method in self.methods_for(klass.id)? {
            seen.insert(method.name.clone());
            out.push(PreparedMethod {
                name: method.name,
                docstring: method.docstring,
                code: method.code,
                line_number: method.line_number,
                origin: None,
            });
        }
        for ancestor in ancestors {
            for method in self.methods_for(ancestor.id)? {
                if seen.insert(method.name.clone()) {
                    out.push(PreparedMethod {
                        name: method.name,
                        docstring: method.docstring,
                        code: method.code,
                        line_number: method.line_number,
                        origin: Some(Origin {
                            klass_name: ancestor.name.clone(),
                            url: ancestor.path(),
                        }),
                    });
                }
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Writes (fixture loading)
    // ------------------------------------------------------------------

    pub fn upsert_project(&self, pk: i64, name: &str) -> Result<(), StoreError> {
        self.run(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO projects (id, name) VALUES (?1, ?2)",
                params![pk, name],
            )
            .map(|_| ())
        })
    }

    pub fn upsert_version(
        &self,
        pk: i64,
        project_id: i64,
        version_number: &str,
        sortable_version_number: &str,
    ) -> Result<(), StoreError> {
        self.run(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO project_versions \
                 (id, project_id, version_number, sortable_version_number) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![pk, project_id, version_number, sortable_version_number],
            )
            .map(|_| ())
        })
    }

    pub fn upsert_module(
        &self,
        pk: i64,
        project_version_id: i64,
        name: &str,
        docstring: &str,
        filename: &str,
    ) -> Result<(), StoreError> {
        self.run(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO modules \
                 (id, project_version_id, name, docstring, filename) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![pk, project_version_id, name, docstring, filename],
            )
            .map(|_| ())
        })
    }

    pub fn upsert_klass(
        &self,
        pk: i64,
        module_id: i64,
        name: &str,
        docstring: &str,
        line_number: i64,
    ) -> Result<(), StoreError> {
        self.run(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO klasses (id, module_id, name, docstring, line_number) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![pk, module_id, name, docstring, line_number],
            )
            .map(|_| ())
        })
    }

    pub fn upsert_inheritance(
        &self,
        pk: i64,
        parent_id: i64,
        child_id: i64,
        position: i64,
    ) -> Result<(), StoreError> {
        self.run(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO inheritance (id, parent_id, child_id, position) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![pk, parent_id, child_id, position],
            )
            .map(|_| ())
        })
    }

    pub fn upsert_attribute(
        &self,
        pk: i64,
        klass_id: i64,
        name: &str,
        value: &str,
        line_number: i64,
    ) -> Result<(), StoreError> {
        self.run(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO klass_attributes (id, klass_id, name, value, line_number) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![pk, klass_id, name, value, line_number],
            )
            .map(|_| ())
        })
    }

    pub fn upsert_method(
        &self,
        pk: i64,
        klass_id: i64,
        name: &str,
        docstring: &str,
        code: &str,
        line_number: i64,
    ) -> Result<(), StoreError> {
        self.run(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO klass_methods \
                 (id, klass_id, name, docstring, code, line_number) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![pk, klass_id, name, docstring, code, line_number],
            )
            .map(|_| ())
        })
    }
}

const MODULE_COLUMNS: &str =
    "m.id, m.project_version_id, m.name, m.docstring, m.filename, pv.version_number, p.name";

const MODULE_JOINS: &str = "FROM modules m \
     JOIN project_versions pv ON pv.id = m.project_version_id \
     JOIN projects p ON p.id = pv.project_id";

fn version_from_row(row: &Row) -> rusqlite::Result<VersionRow> {
    Ok(VersionRow {
        id: row.get(0)?,
        project_id: row.get(1)?,
        package: row.get(2)?,
        version_number: row.get(3)?,
        sortable_version_number: row.get(4)?,
    })
}

fn module_from_row(row: &Row) -> rusqlite::Result<ModuleRow> {
    Ok(ModuleRow {
        id: row.get(0)?,
        project_version_id: row.get(1)?,
        name: row.get(2)?,
        docstring: row.get(3)?,
        filename: row.get(4)?,
        version_number: row.get(5)?,
        package: row.get(6)?,
    })
}

fn klass_from_row(row: &Row) -> rusqlite::Result<KlassRow> {
    Ok(KlassRow {
        id: row.get(0)?,
        module_id: row.get(1)?,
        name: row.get(2)?,
        docstring: row.get(3)?,
        line_number: row.get(4)?,
        module_name: row.get(5)?,
        project_version_id: row.get(6)?,
        project_id: row.get(7)?,
        version_number: row.get(8)?,
        sortable_version_number: row.get(9)?,
        package: row.get(10)?,
    })
}
