//! Robustness tests for structural HTML comparison.
//!
//! The comparator sees two kinds of input: our own rendered pages and golden
//! files that humans re-generate and occasionally hand-edit. It must stay
//! lenient about formatting while never letting a structural change slip by.

use classdex::html_compare::{canonicalize, compare_html, parse_document};
use test_case::test_case;

// ---------------------------------------------------------------------------
// Equivalence cases
// ---------------------------------------------------------------------------

#[test_case("<p>a  b</p>", "<p>a b</p>" ; "internal whitespace collapses")]
#[test_case("<p>\n  a\n</p>", "<p>a</p>" ; "leading and trailing whitespace drops")]
#[test_case("<p a=\"1\" b=\"2\">x</p>", "<p b=\"2\" a=\"1\">x</p>" ; "attribute order")]
#[test_case("<P>x</P>", "<p>x</p>" ; "tag name case")]
#[test_case("<p Class=\"a\">x</p>", "<p class=\"a\">x</p>" ; "attribute name case")]
#[test_case("<p class='a'>x</p>", "<p class=\"a\">x</p>" ; "quote style")]
#[test_case("<br>", "<br/>" ; "void element self closing")]
#[test_case("<input disabled>", "<input disabled=\"\">" ; "bare attribute")]
#[test_case("<!-- x --><p>a</p><!-- y -->", "<p>a</p>" ; "comments ignored")]
#[test_case("<!DOCTYPE html><p>a</p>", "<p>a</p>" ; "doctype ignored")]
#[test_case("a<!-- gap -->b", "a b" ; "text across a comment merges")]
fn equivalent(left: &str, right: &str) {
    assert!(
        compare_html(left, right).is_ok(),
        "expected equivalence:\nleft:  {left}\nright: {right}"
    );
}

// ---------------------------------------------------------------------------
// Difference cases
// ---------------------------------------------------------------------------

#[test_case("<p>a</p>", "<p>b</p>" ; "text differs")]
#[test_case("<p>a</p>", "<div>a</div>" ; "tag differs")]
#[test_case("<p class=\"a\">x</p>", "<p class=\"b\">x</p>" ; "attribute value differs")]
#[test_case("<p>x</p>", "<p class=\"a\">x</p>" ; "attribute added")]
#[test_case("<div><p>x</p></div>", "<div></div><p>x</p>" ; "nesting differs")]
#[test_case("<p>x</p>", "<p>x</p><p>x</p>" ; "element count differs")]
#[test_case("<p>ab</p>", "<p>a b</p>" ; "word boundary is significant")]
fn different(left: &str, right: &str) {
    assert!(
        compare_html(left, right).is_err(),
        "expected mismatch:\nleft:  {left}\nright: {right}"
    );
}

// ---------------------------------------------------------------------------
// Pathological markup
// ---------------------------------------------------------------------------

#[test]
fn unterminated_tag_does_not_hang() {
    // The open element is implicitly closed at end of input.
    let canonical = canonicalize("<div><p>dangling");
    assert!(canonical.contains("dangling"));
}

#[test]
fn unterminated_comment_degrades_to_text() {
    // No panic, no hang; content is preserved in some normalized form.
    let _ = canonicalize("<p>a</p><!-- never closed");
}

#[test]
fn stray_end_tags_are_ignored() {
    assert!(compare_html("</div><p>x</p></span>", "<p>x</p>").is_ok());
}

#[test]
fn misnested_end_tag_closes_up_to_match() {
    // </div> implicitly closes the open <span>.
    let document = parse_document("<div><span>x</div>");
    let canonical = canonicalize("<div><span>x</div>");
    assert_eq!(document.children.len(), 1);
    assert_eq!(canonical, "<div>\n  <span>\n    x\n  </span>\n</div>\n");
}

#[test]
fn script_containing_markup_is_opaque_text() {
    let html = r#"<script>document.write("<div>not an element</div>");</script>"#;
    let document = parse_document(html);
    // One script element whose only child is text, not a parsed <div>.
    assert_eq!(document.children.len(), 1);
    let canonical = canonicalize(html);
    assert!(canonical.contains("not an element"));
    assert!(!canonical.contains("<div>\n"));
}

#[test]
fn script_close_tag_case_is_folded() {
    assert!(compare_html(
        "<script>let x = 1;</SCRIPT>",
        "<script>let x = 1;</script>",
    )
    .is_ok());
}

#[test]
fn empty_documents_are_equal() {
    assert!(compare_html("", "").is_ok());
    assert!(compare_html("   \n  ", "").is_ok());
}

#[test]
fn empty_vs_nonempty_differs() {
    assert!(compare_html("", "<p>x</p>").is_err());
}

#[test]
fn deeply_nested_markup_round_trips() {
    let mut html = String::new();
    for _ in 0..200 {
        html.push_str("<div>");
    }
    html.push('x');
    for _ in 0..200 {
        html.push_str("</div>");
    }
    assert!(compare_html(&html, &html).is_ok());
}

#[test]
fn mismatch_report_points_at_first_divergence() {
    let error = compare_html(
        "<ul><li>one</li><li>two</li></ul>",
        "<ul><li>one</li><li>three</li></ul>",
    )
    .unwrap_err();
    let message = error.to_string();
    assert!(message.contains("differ structurally"), "{message}");
    assert!(message.contains("three"), "{message}");
    assert!(message.contains("canonical line"), "{message}");
}

#[test]
fn attribute_values_keep_internal_case() {
    assert!(compare_html(
        r#"<a href="/projects/DJANGO/4.0/">x</a>"#,
        r#"<a href="/projects/django/4.0/">x</a>"#,
    )
    .is_err());
}
