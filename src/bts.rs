//! Read and patch Xtensa Xplorer `.bts` build-target settings files.
//!
//! A `.bts` file is an XML document describing the compiler and linker
//! configuration of one build target. Multi-value settings (include paths,
//! libraries, library search paths, preprocessor defines) are stored as map
//! entries: a `<key>` element naming the setting next to a `<value>` element
//! wrapping the individual `<ListEntry>` items.

use std::ops::Range;

// ═══════════════════════════════════════════════════════════════════════════════
//  Helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Escape `&`, `<` and `>` for use as element text content.
fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Escape for use inside a double-quoted attribute value.
fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

/// Re-render an element's attributes as ` name="value"` pairs.
fn attribute_string(element: roxmltree::Node) -> String {
    element
        .attributes()
        .map(|a| format!(" {}=\"{}\"", a.name(), escape_attr(a.value())))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Error
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct BtsError {
    pub message: String,
}

impl BtsError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl std::fmt::Display for BtsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BtsError {}

impl From<roxmltree::Error> for BtsError {
    fn from(error: roxmltree::Error) -> Self {
        Self::new(format!("XML Error: {error}"))
    }
}

impl From<std::io::Error> for BtsError {
    fn from(error: std::io::Error) -> Self {
        Self::new(format!("IO Error: {error}"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Entry – one list entry to insert
// ═══════════════════════════════════════════════════════════════════════════════

/// The payload of a new `<ListEntry>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValue {
    /// Rendered as the text content of the new entry
    /// (include paths, library names, search paths).
    Text(String),
    /// Rendered as attributes on an empty entry; the text content stays
    /// empty. Used for `Defines`-style key/value pairs. Pairs are rendered
    /// in the order given.
    Attributes(Vec<(String, String)>),
}

impl EntryValue {
    fn render(&self) -> String {
        match self {
            EntryValue::Text(text) => {
                format!("<ListEntry>{}</ListEntry>", escape_text(text))
            }
            EntryValue::Attributes(pairs) => {
                let attrs: String = pairs
                    .iter()
                    .map(|(name, value)| format!(" {}=\"{}\"", name, escape_attr(value)))
                    .collect();
                format!("<ListEntry{attrs}/>")
            }
        }
    }
}

/// One dependency declaration to append into the settings document.
///
/// `container_path` is a slash-separated element path addressing a repeating
/// container type (e.g.
/// `BuildSettings/BaseSettings/LinkerOptions/StringListMapOptions/StringListMapEntry`);
/// `key` selects among the repeated containers by the text of their `<key>`
/// child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub container_path: String,
    pub key: String,
    pub value: EntryValue,
}

impl Entry {
    /// An entry carrying plain text content.
    pub fn text(
        container_path: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            container_path: container_path.into(),
            key: key.into(),
            value: EntryValue::Text(value.into()),
        }
    }

    /// An entry carrying attribute pairs instead of text content.
    pub fn attrs(
        container_path: impl Into<String>,
        key: impl Into<String>,
        pairs: &[(&str, &str)],
    ) -> Self {
        Self {
            container_path: container_path.into(),
            key: key.into(),
            value: EntryValue::Attributes(
                pairs.iter().map(|(n, v)| (n.to_string(), v.to_string())).collect(),
            ),
        }
    }
}

/// Result of one [`Bts::insert_list_entry`] call. The two skip conditions
/// are expected, non-fatal outcomes; the caller decides how to report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// No container at `container_path` has a `<key>` matching the entry.
    ContainerNotFound,
    /// The matched container has no `<value>` child to append into.
    ValueNotFound,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Bts – top-level handle
// ═══════════════════════════════════════════════════════════════════════════════

/// Handle for reading and patching a `.bts` file while preserving its
/// original formatting.
///
/// Reading is done by parsing with `roxmltree`. Mutations splice the raw
/// source string using byte-accurate positions from
/// `roxmltree::Node::range()`, so whitespace, comments, and attribute
/// ordering elsewhere in the document are never touched. New list entries
/// are appended without re-indenting, matching how the IDE itself rewrites
/// these files.
#[derive(Debug, Clone)]
pub struct Bts {
    source: String,
}

impl Bts {
    /// Parse a `.bts` settings document from its XML source string.
    pub fn parse(source: impl Into<String>) -> Result<Self, BtsError> {
        let source = source.into();
        roxmltree::Document::parse(&source)?;
        Ok(Self { source })
    }

    /// Load a `.bts` file from disk.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, BtsError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| BtsError::new(format!("{}: {e}", path.display())))?;
        Self::parse(source)
    }

    /// The current raw XML source (reflects any mutations).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Write the (potentially mutated) source back to disk, prepending an
    /// XML declaration when the document does not already carry one.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), BtsError> {
        if self.source.trim_start().starts_with("<?xml") {
            std::fs::write(path, &self.source)?;
        } else {
            let mut out =
                String::with_capacity(self.source.len() + 64);
            out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
            out.push_str(&self.source);
            std::fs::write(path, out)?;
        }
        Ok(())
    }

    /// Append one new `<ListEntry>` under the `<value>` of the container
    /// matching the entry's path and `<key>` text.
    ///
    /// A missing container or missing `<value>` child is an expected
    /// condition reported through [`InsertOutcome`], leaving the document
    /// untouched. Only a malformed document is an error. Insertion is
    /// deliberately not idempotent: applying the same entry twice appends
    /// it twice.
    pub fn insert_list_entry(&mut self, entry: &Entry) -> Result<InsertOutcome, BtsError> {
        let splice = {
            let doc = roxmltree::Document::parse(&self.source)?;

            let Some(container) = find_container(&doc, &entry.container_path, &entry.key)
            else {
                return Ok(InsertOutcome::ContainerNotFound);
            };

            let Some(value) = container
                .children()
                .find(|n| n.is_element() && n.tag_name().name() == "value")
            else {
                return Ok(InsertOutcome::ValueNotFound);
            };

            splice_point(value)
        };

        self.apply(splice, &entry.value.render());
        Ok(InsertOutcome::Inserted)
    }

    /// Append the root element of an override fragment as the new last
    /// child of `BuildSettings`.
    ///
    /// The fragment is parsed only to locate its root element; the root is
    /// spliced in verbatim, with no validation of its internal shape. A
    /// document without a `BuildSettings` element does not match the
    /// settings schema, so that case is an error rather than a skip.
    pub fn append_override(&mut self, fragment: &str) -> Result<(), BtsError> {
        let fragment_doc = roxmltree::Document::parse(fragment)?;
        let fragment_root = &fragment[fragment_doc.root_element().range()];

        let splice = {
            let doc = roxmltree::Document::parse(&self.source)?;
            let settings = doc
                .descendants()
                .find(|n| n.is_element() && n.tag_name().name() == "BuildSettings")
                .ok_or_else(|| {
                    BtsError::new("No <BuildSettings> element found in settings document")
                })?;
            splice_point(settings)
        };

        self.apply(splice, fragment_root);
        Ok(())
    }

    /// Byte-splice `content` into the source at the computed point.
    fn apply(&mut self, splice: Splice, content: &str) {
        match splice {
            Splice::Append(pos) => self.source.insert_str(pos, content),
            Splice::RewriteEmpty { range, name, attrs } => self
                .source
                .replace_range(range, &format!("<{name}{attrs}>{content}</{name}>")),
        }
    }
}

// ─── Splice point computation ────────────────────────────────────────────

/// Where and how to insert a new last child into `element`.
enum Splice {
    /// Insert at this byte offset (directly before the closing tag).
    Append(usize),
    /// The element is empty or self-closing: rewrite it entirely,
    /// preserving its attributes.
    RewriteEmpty {
        range: Range<usize>,
        name: String,
        attrs: String,
    },
}

fn splice_point(element: roxmltree::Node) -> Splice {
    match element.last_child() {
        // Any last child (including a whitespace text node) ends directly
        // before the closing tag.
        Some(last) => Splice::Append(last.range().end),
        None => Splice::RewriteEmpty {
            range: element.range(),
            name: element.tag_name().name().to_string(),
            attrs: attribute_string(element),
        },
    }
}

// ─── Container search ────────────────────────────────────────────────────

/// Find the first container, in document order, reachable through
/// `container_path` whose direct `<key>` child has text equal to `key`.
///
/// The first path segment is searched on the descendant axis (the segments
/// address elements below the document root, not the root itself); each
/// further segment descends through direct children only.
fn find_container<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    container_path: &str,
    key: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    let mut segments = container_path.split('/');
    let first = segments.next()?;

    let mut matches: Vec<roxmltree::Node<'a, 'input>> = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == first)
        .collect();

    for segment in segments {
        matches = matches
            .iter()
            .flat_map(|n| n.children())
            .filter(|n| n.is_element() && n.tag_name().name() == segment)
            .collect();
    }

    matches.into_iter().find(|container| {
        container.children().any(|c| {
            c.is_element() && c.tag_name().name() == "key" && c.text() == Some(key)
        })
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
