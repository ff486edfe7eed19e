//! Report tree model for JUnit-style XML.
//!
//! A report is parsed once into a tree of typed [`ReportNode`]s: suites,
//! sections, test cases, and unrecognized containers. Nothing downstream looks
//! at raw XML again; the serializer writes the same tree back out.

mod analyze;
mod parser;
mod serialize;
mod status;
mod summary;

pub use analyze::{Analysis, CaseRecord, analyze};
pub use status::Status;
pub use summary::{RootShape, Summary};

use crate::core::error::{Error, Result};
use crate::resolve::FailingIdentity;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

pub(crate) const TESTSUITES_TAG: &str = "testsuites";
pub(crate) const TESTSUITE_TAG: &str = "testsuite";
pub(crate) const SECTIONS_TAG: &str = "sections";
pub(crate) const SECTION_TAG: &str = "section";
pub(crate) const TESTCASE_TAG: &str = "testcase";

/// Classname reported for cases without one, outside of identity matching.
pub const UNKNOWN_CLASSNAME: &str = "Unknown";

/// Element attributes in document order.
pub type Attributes = IndexMap<String, String>;

/// A node in the report tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportNode {
    /// A `<testsuite>` element.
    Suite(Group),
    /// A `<section>` element.
    Section(Group),
    /// A `<testcase>` leaf.
    Case(TestCase),
    /// Any other element, e.g. `<testsuites>`, `<properties>` or a custom wrapper.
    Unknown(Group),
    /// Character data between elements.
    Text(String),
}

/// A container element and its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub tag: String,
    pub attributes: Attributes,
    pub children: Vec<ReportNode>,
}

/// One test case result.
///
/// Attributes are kept verbatim and in document order; `name`, `classname`
/// and `time` are read from them.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub attributes: Attributes,
    /// Outcome markers (`failure`, `error`, `skipped`) and any other children.
    pub content: Vec<Content>,
}

/// Child content of a test case, kept verbatim for serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Element(Element),
    Text(String),
}

/// An element below a test case, such as `<failure>` or `<system-out>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attributes: Attributes,
    pub content: Vec<Content>,
}

impl Element {
    /// Create an empty element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Attributes::new(),
            content: Vec::new(),
        }
    }

    /// Set an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Append text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content.push(Content::Text(text.into()));
        self
    }
}

impl Group {
    /// Create an empty group.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Append a child node.
    pub fn with_child(mut self, child: ReportNode) -> Self {
        self.children.push(child);
        self
    }

    /// All test cases below this group, at any depth, in document order.
    pub fn cases(&self) -> Vec<&TestCase> {
        let mut out = Vec::new();
        for child in &self.children {
            child.collect_cases(&mut out);
        }
        out
    }

    /// Whether any test case sits below this group.
    pub fn has_cases(&self) -> bool {
        self.children.iter().any(ReportNode::has_cases)
    }

    /// Whether this group already carries summary counters.
    pub fn has_counters(&self) -> bool {
        self.attributes.contains_key("tests")
    }
}

impl ReportNode {
    /// Wrap a group in the variant its tag calls for.
    pub fn from_group(group: Group) -> Self {
        match group.tag.as_str() {
            TESTSUITE_TAG => ReportNode::Suite(group),
            SECTION_TAG => ReportNode::Section(group),
            _ => ReportNode::Unknown(group),
        }
    }

    /// Element tag of this node, if it is an element.
    pub fn tag(&self) -> Option<&str> {
        match self {
            ReportNode::Suite(g) | ReportNode::Section(g) | ReportNode::Unknown(g) => {
                Some(&g.tag)
            }
            ReportNode::Case(_) => Some(TESTCASE_TAG),
            ReportNode::Text(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            ReportNode::Suite(g) | ReportNode::Section(g) | ReportNode::Unknown(g) => Some(g),
            ReportNode::Case(_) | ReportNode::Text(_) => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            ReportNode::Suite(g) | ReportNode::Section(g) | ReportNode::Unknown(g) => Some(g),
            ReportNode::Case(_) | ReportNode::Text(_) => None,
        }
    }

    /// All test cases in this subtree, in document order.
    pub fn cases(&self) -> Vec<&TestCase> {
        let mut out = Vec::new();
        self.collect_cases(&mut out);
        out
    }

    fn collect_cases<'a>(&'a self, out: &mut Vec<&'a TestCase>) {
        match self {
            ReportNode::Case(case) => out.push(case),
            ReportNode::Text(_) => {}
            ReportNode::Suite(g) | ReportNode::Section(g) | ReportNode::Unknown(g) => {
                for child in &g.children {
                    child.collect_cases(out);
                }
            }
        }
    }

    /// Whether this subtree contains at least one test case.
    pub fn has_cases(&self) -> bool {
        match self {
            ReportNode::Case(_) => true,
            ReportNode::Text(_) => false,
            ReportNode::Suite(g) | ReportNode::Section(g) | ReportNode::Unknown(g) => {
                g.has_cases()
            }
        }
    }

    /// Visit every test case in this subtree mutably.
    pub(crate) fn for_each_case_mut(&mut self, f: &mut impl FnMut(&mut TestCase)) {
        match self {
            ReportNode::Case(case) => f(case),
            ReportNode::Text(_) => {}
            ReportNode::Suite(g) | ReportNode::Section(g) | ReportNode::Unknown(g) => {
                for child in &mut g.children {
                    child.for_each_case_mut(f);
                }
            }
        }
    }
}

impl TestCase {
    /// Create a passing test case with no classname.
    pub fn new(name: impl Into<String>) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert("name".to_string(), name.into());
        Self {
            attributes,
            content: Vec::new(),
        }
    }

    pub fn with_classname(mut self, classname: impl Into<String>) -> Self {
        self.attributes
            .insert("classname".to_string(), classname.into());
        self
    }

    pub fn with_time(mut self, seconds: f64) -> Self {
        self.attributes
            .insert("time".to_string(), format!("{seconds:.3}"));
        self
    }

    /// Test name; empty when the attribute is missing.
    pub fn name(&self) -> &str {
        self.attributes.get("name").map(String::as_str).unwrap_or("")
    }

    pub fn classname(&self) -> Option<&str> {
        self.attributes.get("classname").map(String::as_str)
    }

    /// Duration in seconds. An unparseable or negative `time` counts as absent.
    pub fn time(&self) -> Option<f64> {
        self.attributes
            .get("time")
            .and_then(|t| t.trim().parse::<f64>().ok())
            .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
    }

    /// Append a child element, e.g. a `<failure>` marker.
    pub fn with_element(mut self, element: Element) -> Self {
        self.content.push(Content::Element(element));
        self
    }

    /// Derived outcome of this case.
    pub fn status(&self) -> Status {
        Status::classify(self.content.iter().filter_map(|c| match c {
            Content::Element(e) => Some(e.tag.as_str()),
            Content::Text(_) => None,
        }))
    }

    /// Cross-report matching key: `classname::name`, with stray `:` trimmed
    /// from both ends when the classname is empty.
    pub fn identity(&self) -> String {
        let classname = self.classname().unwrap_or("");
        format!("{}::{}", classname, self.name())
            .trim_matches(':')
            .to_string()
    }

    /// Classname for display and grouping, with a sentinel when absent.
    pub fn display_classname(&self) -> &str {
        self.classname().unwrap_or(UNKNOWN_CLASSNAME)
    }

    /// Remove every `failure`, `error` and `skipped` child, leaving the case passed.
    ///
    /// Returns the number of markers removed.
    pub(crate) fn strip_outcome_markers(&mut self) -> usize {
        let before = self.content.len();
        self.content.retain(|c| match c {
            Content::Element(e) => !status::OUTCOME_TAGS.contains(&e.tag.as_str()),
            Content::Text(_) => true,
        });
        before - self.content.len()
    }
}

/// A parsed report and the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    path: PathBuf,
    root: ReportNode,
}

impl Report {
    /// Load and parse a report file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_xml(&content, path)
    }

    /// Parse a report from an in-memory document.
    pub fn from_xml(xml: &str, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let root = parser::parse(xml).map_err(|message| Error::malformed(&path, message))?;
        Ok(Self { path, root })
    }

    /// Build a report directly from a tree.
    pub fn from_root(root: ReportNode, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root,
        }
    }

    /// File the report was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &ReportNode {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut ReportNode {
        &mut self.root
    }

    /// Shape of the tree, decided by the root tag.
    pub fn shape(&self) -> RootShape {
        RootShape::of(&self.root)
    }

    /// All test cases, in document order.
    pub fn cases(&self) -> Vec<&TestCase> {
        self.root.cases()
    }

    /// Aggregate counts over every test case in the report.
    pub fn summary(&self) -> Summary {
        Summary::of(self.root.cases())
    }

    /// Identities of failed and errored cases that carry both a classname and a name.
    pub fn failing_identities(&self) -> Vec<FailingIdentity> {
        self.cases()
            .into_iter()
            .filter(|case| case.status().is_failing())
            .filter_map(|case| match case.classname() {
                Some(classname) if !classname.is_empty() && !case.name().is_empty() => {
                    Some(FailingIdentity::new(classname, case.name()))
                }
                _ => None,
            })
            .collect()
    }

    /// Recompute counters on every summarizable node from its leaves.
    ///
    /// Returns whether any node was updated.
    pub(crate) fn recompute_summaries(&mut self) -> bool {
        summary::recompute(&mut self.root)
    }

    /// Serialize the report as an XML document.
    pub fn to_xml(&self) -> Result<String> {
        let mut buf = Vec::new();
        serialize::write_document(&self.root, &mut buf)?;
        utf8_document(buf)
    }

    /// Write the report to `path`, creating parent directories as needed.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            crate::util::ensure_dir_exists(parent)?;
        }
        let file = std::io::BufWriter::new(std::fs::File::create(path)?);
        serialize::write_document(&self.root, file)?;
        Ok(())
    }
}

fn utf8_document(buf: Vec<u8>) -> Result<String> {
    String::from_utf8(buf)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
