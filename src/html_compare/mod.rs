//! Structural HTML comparison.
//!
//! Two documents are considered equal when their normalized trees match:
//! tag and attribute names are case-folded, attributes are order-insensitive,
//! and runs of whitespace in text collapse to a single space. This is what the
//! snapshot suite uses to diff rendered pages against golden files without
//! being sensitive to formatting churn.
//!
//! The tokenizer is deliberately lenient: comments and doctypes are dropped,
//! void elements never expect a closing tag, mismatched end tags close the
//! nearest open element of that name, and stray `<` characters are treated as
//! text. Entities are not decoded; both sides of a comparison are expected to
//! use the same escaping.

use std::collections::BTreeMap;
use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_until, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt},
    multi::many0,
    sequence::{delimited, preceded},
    IResult, Parser,
};

/// Elements whose content is raw text rather than markup.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

/// Elements that never have children or end tags.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Doctype,
    Comment,
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    fn new(name: &str) -> Self {
        Element {
            name: name.to_string(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

fn tag_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == ':')(input)
}

fn attr_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')(input)
}

fn attr_value(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        take_while1(|c: char| !c.is_whitespace() && c != '>' && c != '/'),
    ))
    .parse(input)
}

/// One attribute, with optional value; bare attributes get an empty value.
fn attribute(input: &str) -> IResult<&str, (String, String)> {
    let (input, _) = multispace0.parse(input)?;
    let (input, name) = attr_name(input)?;
    let (input, value) = opt(preceded(
        delimited(multispace0, char('='), multispace0),
        attr_value,
    ))
    .parse(input)?;
    Ok((
        input,
        (
            name.to_ascii_lowercase(),
            value.unwrap_or_default().to_string(),
        ),
    ))
}

fn start_tag(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('<').parse(input)?;
    let (input, name) = tag_name(input)?;
    let (input, attrs) = many0(attribute).parse(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, slash) = opt(char('/')).parse(input)?;
    let (input, _) = char('>').parse(input)?;
    Ok((
        input,
        Token::StartTag {
            name: name.to_ascii_lowercase(),
            attrs,
            self_closing: slash.is_some(),
        },
    ))
}

fn end_tag(input: &str) -> IResult<&str, Token> {
    map(
        delimited(
            tag("</"),
            delimited(multispace0, tag_name, multispace0),
            char('>'),
        ),
        |name: &str| Token::EndTag(name.to_ascii_lowercase()),
    )
    .parse(input)
}

fn comment(input: &str) -> IResult<&str, Token> {
    map(
        delimited(tag("<!--"), take_until("-->"), tag("-->")),
        |_| Token::Comment,
    )
    .parse(input)
}

fn doctype(input: &str) -> IResult<&str, Token> {
    map(
        delimited(tag_no_case("<!doctype"), take_until(">"), char('>')),
        |_| Token::Doctype,
    )
    .parse(input)
}

fn text(input: &str) -> IResult<&str, Token> {
    map(take_while1(|c| c != '<'), |t: &str| {
        Token::Text(t.to_string())
    })
    .parse(input)
}

/// A `<` that opens nothing parses as literal text so the tokenizer always
/// makes progress.
fn stray_lt(input: &str) -> IResult<&str, Token> {
    map(char('<'), |_| Token::Text("<".to_string())).parse(input)
}

fn token(input: &str) -> IResult<&str, Token> {
    alt((comment, doctype, end_tag, start_tag, text, stray_lt)).parse(input)
}

/// ASCII case-insensitive substring search. The needle starts with `<`, so a
/// byte offset is always a character boundary in the haystack.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

fn tokenize(mut input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    while !input.is_empty() {
        match token(input) {
            Ok((rest, parsed)) => {
                let raw_element = match &parsed {
                    Token::StartTag {
                        name,
                        self_closing: false,
                        ..
                    } if RAW_TEXT_ELEMENTS.contains(&name.as_str()) => Some(name.clone()),
                    _ => None,
                };
                tokens.push(parsed);
                input = rest;
                if let Some(name) = raw_element {
                    let closer = format!("</{name}");
                    let end = find_ascii_ci(input, &closer).unwrap_or(input.len());
                    let (raw, after) = input.split_at(end);
                    if !raw.is_empty() {
                        tokens.push(Token::Text(raw.to_string()));
                    }
                    input = after;
                }
            }
            Err(_) => {
                // Unreachable in practice (stray_lt and text cover everything),
                // but never loop forever on adversarial input.
                let mut chars = input.chars();
                if let Some(first) = chars.next() {
                    tokens.push(Token::Text(first.to_string()));
                }
                input = chars.as_str();
            }
        }
    }
    tokens
}

// ---------------------------------------------------------------------------
// Tree building and normalization
// ---------------------------------------------------------------------------

fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_text(parent: &mut Element, collapsed: String) {
    if collapsed.is_empty() {
        return;
    }
    // Merge runs of text split by dropped comments.
    if let Some(Node::Text(prev)) = parent.children.last_mut() {
        prev.push(' ');
        prev.push_str(&collapsed);
    } else {
        parent.children.push(Node::Text(collapsed));
    }
}

/// Parse a document into a normalized tree rooted at a synthetic `#document`
/// element.
pub fn parse_document(html: &str) -> Element {
    let mut stack: Vec<Element> = vec![Element::new("#document")];

    for token in tokenize(html) {
        match token {
            Token::Doctype | Token::Comment => {}
            Token::Text(text) => {
                let collapsed = collapse_ws(&text);
                if let Some(top) = stack.last_mut() {
                    push_text(top, collapsed);
                }
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                let mut element = Element::new(&name);
                element.attrs = attrs.into_iter().collect();
                if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
                    if let Some(top) = stack.last_mut() {
                        top.children.push(Node::Element(element));
                    }
                } else {
                    stack.push(element);
                }
            }
            Token::EndTag(name) => {
                // Ignore end tags that close nothing; otherwise pop (and
                // implicitly close) up to the matching element.
                if stack.iter().skip(1).any(|e| e.name == name) {
                    while stack.len() > 1 {
                        let Some(done) = stack.pop() else { break };
                        let matched = done.name == name;
                        if let Some(top) = stack.last_mut() {
                            top.children.push(Node::Element(done));
                        }
                        if matched {
                            break;
                        }
                    }
                }
            }
        }
    }

    // Close anything left open at end of input.
    while stack.len() > 1 {
        let Some(done) = stack.pop() else { break };
        if let Some(top) = stack.last_mut() {
            top.children.push(Node::Element(done));
        }
    }
    stack.pop().unwrap_or_else(|| Element::new("#document"))
}

fn write_node(node: &Node, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        Node::Text(text) => {
            out.push_str(&indent);
            out.push_str(text);
            out.push('\n');
        }
        Node::Element(element) => {
            out.push_str(&indent);
            out.push('<');
            out.push_str(&element.name);
            for (name, value) in &element.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(value);
                out.push('"');
            }
            out.push_str(">\n");
            for child in &element.children {
                write_node(child, depth + 1, out);
            }
            out.push_str(&indent);
            out.push_str("</");
            out.push_str(&element.name);
            out.push_str(">\n");
        }
    }
}

/// Canonical, indentation-stable rendering of the normalized tree. Equal
/// canonical forms mean structurally equal documents.
pub fn canonicalize(html: &str) -> String {
    let document = parse_document(html);
    let mut out = String::new();
    for child in &document.children {
        write_node(child, 0, &mut out);
    }
    out
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// A failed comparison, carrying both canonical forms and the first line at
/// which they diverge.
#[derive(Debug)]
pub struct HtmlMismatch {
    pub actual: String,
    pub expected: String,
    pub line: usize,
}

impl HtmlMismatch {
    fn context(source: &str, line: usize) -> String {
        let lines: Vec<&str> = source.lines().collect();
        let start = line.saturating_sub(3);
        let end = (line + 3).min(lines.len());
        let mut out = String::new();
        for (number, content) in lines.iter().enumerate().take(end).skip(start) {
            let marker = if number == line { ">" } else { " " };
            out.push_str(&format!("{marker} {:>4} | {content}\n", number + 1));
        }
        if lines.is_empty() {
            out.push_str(">    1 | <empty document>\n");
        }
        out
    }
}

impl fmt::Display for HtmlMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "HTML documents differ structurally at canonical line {}:",
            self.line + 1
        )?;
        writeln!(f, "--- expected ---")?;
        write!(f, "{}", Self::context(&self.expected, self.line))?;
        writeln!(f, "--- actual ---")?;
        write!(f, "{}", Self::context(&self.actual, self.line))
    }
}

impl std::error::Error for HtmlMismatch {}

/// Compare two HTML documents structurally.
pub fn compare_html(actual: &str, expected: &str) -> Result<(), Box<HtmlMismatch>> {
    let actual_canonical = canonicalize(actual);
    let expected_canonical = canonicalize(expected);
    if actual_canonical == expected_canonical {
        return Ok(());
    }

    let line = actual_canonical
        .lines()
        .zip(expected_canonical.lines())
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| {
            actual_canonical
                .lines()
                .count()
                .min(expected_canonical.lines().count())
        });

    Err(Box::new(HtmlMismatch {
        actual: actual_canonical,
        expected: expected_canonical,
        line,
    }))
}
