//! HTML page rendering.
//!
//! Pages are assembled with plain string building; the structure below is the
//! contract the golden snapshot files capture. Formatting (indentation, line
//! breaks) is free to change because snapshots are compared structurally, but
//! element structure, attributes and text are not.

use crate::server::models::{KlassPage, NavData};
use crate::store::{KlassRow, ModuleRow, VersionRow};

/// Minimal HTML escaping for text and attribute values.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Inheritance-diagram URL in yuml.me plain class notation, one `^-` pair per
/// inheritance edge. `None` for classes without ancestors.
pub fn yuml_url(edges: &[(String, String)]) -> Option<String> {
    if edges.is_empty() {
        return None;
    }
    let pairs: Vec<String> = edges
        .iter()
        .map(|(parent, child)| format!("[{parent}]^-[{child}]"))
        .collect();
    Some(format!(
        "https://yuml.me/diagram/plain;/class/{}",
        pairs.join(",")
    ))
}

fn nav_html(nav: &NavData) -> String {
    let mut out = String::new();
    out.push_str("<nav class=\"sidebar\">\n");
    out.push_str(&format!("<h2>{}</h2>\n", escape(&nav.version_name)));

    out.push_str("<ul class=\"version-switcher\">\n");
    for other in &nav.other_versions {
        out.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape(&other.url),
            escape(&other.name)
        ));
    }
    out.push_str("</ul>\n");

    out.push_str("<ul class=\"modules\">\n");
    for module in &nav.modules {
        let module_class = if module.active { "module active" } else { "module" };
        out.push_str(&format!("<li class=\"{module_class}\">\n"));
        out.push_str(&format!(
            "<a href=\"{}\">{}</a>\n",
            escape(&module.url),
            escape(&module.short_name)
        ));
        out.push_str("<ul class=\"klasses\">\n");
        for klass in &module.classes {
            let klass_class = if klass.active { "klass active" } else { "klass" };
            out.push_str(&format!(
                "<li class=\"{klass_class}\"><a href=\"{}\">{}</a></li>\n",
                escape(&klass.url),
                escape(&klass.name)
            ));
        }
        out.push_str("</ul>\n");
        out.push_str("</li>\n");
    }
    out.push_str("</ul>\n");
    out.push_str("</nav>\n");
    out
}

fn layout(
    title: &str,
    canonical_url: &str,
    push_state_url: Option<&str>,
    nav: &NavData,
    main: &str,
) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n");
    out.push_str("<html lang=\"en\">\n");
    out.push_str("<head>\n");
    out.push_str("<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape(title)));
    out.push_str(&format!(
        "<link rel=\"canonical\" href=\"{}\">\n",
        escape(canonical_url)
    ));
    out.push_str("<link rel=\"stylesheet\" href=\"/static/classdex.css\">\n");
    out.push_str("</head>\n");
    out.push_str("<body>\n");
    if let Some(path) = push_state_url {
        out.push_str(&format!(
            "<script>history.replaceState(null, \"\", \"{}\");</script>\n",
            escape(path)
        ));
    }
    out.push_str("<header class=\"site-header\">\n");
    out.push_str("<a class=\"brand\" href=\"/\">Classdex</a>\n");
    out.push_str("</header>\n");
    out.push_str("<div class=\"page\">\n");
    out.push_str(&nav_html(nav));
    out.push_str("<main>\n");
    out.push_str(main);
    out.push_str("</main>\n");
    out.push_str("</div>\n");
    out.push_str("<footer class=\"site-footer\">\n");
    out.push_str("<p>Classdex browses class hierarchies extracted from upstream releases.</p>\n");
    out.push_str("</footer>\n");
    out.push_str("</body>\n");
    out.push_str("</html>\n");
    out
}

fn klass_index_table(klasses: &[KlassRow]) -> String {
    let mut out = String::new();
    out.push_str("<table class=\"klass-index\">\n");
    out.push_str("<thead>\n<tr>\n<th>Module</th>\n<th>Class</th>\n</tr>\n</thead>\n");
    out.push_str("<tbody>\n");
    for klass in klasses {
        out.push_str("<tr>\n");
        out.push_str(&format!(
            "<td><a href=\"{}\">{}</a></td>\n",
            escape(&klass.module_path()),
            escape(&klass.module_name)
        ));
        out.push_str(&format!(
            "<td><a href=\"{}\">{}</a></td>\n",
            escape(&klass.path()),
            escape(&klass.name)
        ));
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n");
    out.push_str("</table>\n");
    out
}

pub fn home_page(
    site_base_url: &str,
    version: &VersionRow,
    klasses: &[KlassRow],
    nav: &NavData,
) -> String {
    let mut main = String::new();
    main.push_str(&format!("<h1>{}</h1>\n", escape(&version.display_name())));
    main.push_str(
        "<p class=\"tagline\">Detailed descriptions of each class-based view, \
         version by version.</p>\n",
    );
    main.push_str(&klass_index_table(klasses));
    layout(
        "Classdex",
        &format!("{site_base_url}/"),
        None,
        nav,
        &main,
    )
}

pub fn version_page(
    site_base_url: &str,
    version: &VersionRow,
    klasses: &[KlassRow],
    nav: &NavData,
    push_state_url: Option<&str>,
) -> String {
    let module_count = {
        // Rows arrive module-grouped (ordered by module name, then class).
        let mut ids: Vec<i64> = klasses.iter().map(|k| k.module_id).collect();
        ids.dedup();
        ids.len()
    };
    let mut main = String::new();
    main.push_str(&format!("<h1>{}</h1>\n", escape(&version.display_name())));
    main.push_str(&format!(
        "<p class=\"summary\">{} classes across {} modules.</p>\n",
        klasses.len(),
        module_count
    ));
    main.push_str(&klass_index_table(klasses));
    layout(
        &format!("{} | Classdex", version.display_name()),
        &format!("{site_base_url}{}", version.path()),
        push_state_url,
        nav,
        &main,
    )
}

pub fn module_page(
    canonical_url: &str,
    module: &ModuleRow,
    klasses: &[KlassRow],
    nav: &NavData,
    push_state_url: Option<&str>,
) -> String {
    let mut main = String::new();
    main.push_str(&format!("<h1>{}</h1>\n", escape(&module.name)));
    if !module.docstring.is_empty() {
        main.push_str(&format!(
            "<p class=\"docstring\">{}</p>\n",
            escape(&module.docstring)
        ));
    }
    main.push_str("<section class=\"klasses\">\n");
    main.push_str("<h2>Classes</h2>\n");
    main.push_str("<ul>\n");
    for klass in klasses {
        main.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape(&klass.path()),
            escape(&klass.name)
        ));
    }
    main.push_str("</ul>\n");
    main.push_str("</section>\n");
    layout(
        &format!("{} | Classdex", module.name),
        canonical_url,
        push_state_url,
        nav,
        &main,
    )
}

pub fn klass_page(page: &KlassPage) -> String {
    let klass = &page.klass;
    let mut main = String::new();
    main.push_str(&format!("<h1>{}</h1>\n", escape(&klass.name)));
    main.push_str(&format!(
        "<p class=\"import\"><code>{}</code></p>\n",
        escape(&klass.import_statement())
    ));
    if !klass.docstring.is_empty() {
        main.push_str(&format!(
            "<p class=\"docstring\">{}</p>\n",
            escape(&klass.docstring)
        ));
    }
    main.push_str(&format!(
        "<p class=\"source-ref\">Defined in <a href=\"{}\">{}</a>, line {}.</p>\n",
        escape(&klass.module_path()),
        escape(&klass.module_name),
        klass.line_number
    ));
    if let Some(url) = &page.yuml_url {
        main.push_str(&format!(
            "<p class=\"diagram\"><a href=\"{}\">Inheritance diagram</a></p>\n",
            escape(url)
        ));
    }

    main.push_str("<section class=\"ancestors\">\n");
    main.push_str("<h2>Ancestors (MRO)</h2>\n");
    if page.ancestors.is_empty() {
        main.push_str("<p class=\"empty\">This class has no ancestors.</p>\n");
    } else {
        main.push_str("<ol>\n");
        for ancestor in &page.ancestors {
            main.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape(&ancestor.path()),
                escape(&ancestor.name)
            ));
        }
        main.push_str("</ol>\n");
    }
    main.push_str("</section>\n");

    main.push_str("<section class=\"descendants\">\n");
    main.push_str("<h2>Descendants</h2>\n");
    if page.descendants.is_empty() {
        main.push_str("<p class=\"empty\">No subclasses in this version.</p>\n");
    } else {
        main.push_str("<ul>\n");
        for descendant in &page.descendants {
            main.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape(&descendant.path()),
                escape(&descendant.name)
            ));
        }
        main.push_str("</ul>\n");
    }
    main.push_str("</section>\n");

    main.push_str("<section class=\"attributes\">\n");
    main.push_str("<h2>Attributes</h2>\n");
    if page.attributes.is_empty() {
        main.push_str("<p class=\"empty\">No attributes defined.</p>\n");
    } else {
        main.push_str("<table class=\"attributes\">\n<tbody>\n");
        for attribute in &page.attributes {
            main.push_str("<tr>\n");
            main.push_str(&format!(
                "<td><code>{} = {}</code></td>\n",
                escape(&attribute.name),
                escape(&attribute.value)
            ));
            match &attribute.origin {
                Some(origin) => main.push_str(&format!(
                    "<td class=\"origin\"><a href=\"{}\">{}</a></td>\n",
                    escape(&origin.url),
                    escape(&origin.klass_name)
                )),
                None => main.push_str("<td class=\"origin\"></td>\n"),
            }
            main.push_str("</tr>\n");
        }
        main.push_str("</tbody>\n</table>\n");
    }
    main.push_str("</section>\n");

    main.push_str("<section class=\"methods\">\n");
    main.push_str("<h2>Methods</h2>\n");
    if page.methods.is_empty() {
        main.push_str("<p class=\"empty\">No methods defined.</p>\n");
    } else {
        for method in &page.methods {
            main.push_str("<article class=\"method\">\n");
            main.push_str(&format!("<h3><code>{}</code></h3>\n", escape(&method.name)));
            if !method.docstring.is_empty() {
                main.push_str(&format!(
                    "<p class=\"docstring\">{}</p>\n",
                    escape(&method.docstring)
                ));
            }
            if !method.code.is_empty() {
                main.push_str(&format!(
                    "<pre><code>{}</code></pre>\n",
                    escape(&method.code)
                ));
            }
            if let Some(origin) = &method.origin {
                main.push_str(&format!(
                    "<p class=\"origin\">Inherited from <a href=\"{}\">{}</a>.</p>\n",
                    escape(&origin.url),
                    escape(&origin.klass_name)
                ));
            }
            main.push_str("</article>\n");
        }
    }
    main.push_str("</section>\n");

    layout(
        &format!("{} | Classdex", klass.name),
        &page.canonical_url,
        page.push_state_url.as_deref(),
        &page.nav,
        &main,
    )
}

/// The sitemap references every class page; the latest version's entries get
/// a higher priority, as the home page links there.
pub fn sitemap(site_base_url: &str, latest: &VersionRow, klasses: &[KlassRow]) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
    out.push_str("<url>\n");
    out.push_str(&format!("<loc>{site_base_url}/</loc>\n"));
    out.push_str("<priority>1.0</priority>\n");
    out.push_str("</url>\n");
    for klass in klasses {
        let priority = if klass.project_version_id == latest.id {
            "0.9"
        } else {
            "0.5"
        };
        out.push_str("<url>\n");
        out.push_str(&format!(
            "<loc>{}</loc>\n",
            escape(&format!("{site_base_url}{}", klass.path()))
        ));
        out.push_str(&format!("<priority>{priority}</priority>\n"));
        out.push_str("</url>\n");
    }
    out.push_str("</urlset>\n");
    out
}

pub fn not_found_page() -> String {
    concat!(
        "<!DOCTYPE html>\n",
        "<html lang=\"en\">\n",
        "<head>\n<meta charset=\"utf-8\">\n<title>Not found | Classdex</title>\n</head>\n",
        "<body>\n",
        "<h1>Page not found</h1>\n",
        "<p>Nothing in the catalog matches this address.</p>\n",
        "</body>\n",
        "</html>\n",
    )
    .to_string()
}

pub fn server_error_page() -> String {
    concat!(
        "<!DOCTYPE html>\n",
        "<html lang=\"en\">\n",
        "<head>\n<meta charset=\"utf-8\">\n<title>Server error | Classdex</title>\n</head>\n",
        "<body>\n",
        "<h1>Something went wrong</h1>\n",
        "<p>The catalog could not be read. Try again shortly.</p>\n",
        "</body>\n",
        "</html>\n",
    )
    .to_string()
}
