//! Summary counters and their full recomputation over the report tree.

use super::{
    Attributes, Group, ReportNode, SECTIONS_TAG, Status, TESTSUITE_TAG, TESTSUITES_TAG, TestCase,
};
use serde::Serialize;

/// Shape of a report tree, decided by its root tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootShape {
    /// `<testsuites>` holding `<testsuite>` children.
    Suites,
    /// `<sections>` holding `<section>` children.
    Sections,
    /// A single `<testsuite>` root.
    SingleSuite,
    /// Anything else; every direct child holding cases is summarized.
    Unknown,
}

impl RootShape {
    pub fn of(root: &ReportNode) -> Self {
        match root.tag() {
            Some(TESTSUITES_TAG) => RootShape::Suites,
            Some(SECTIONS_TAG) => RootShape::Sections,
            Some(TESTSUITE_TAG) => RootShape::SingleSuite,
            _ => RootShape::Unknown,
        }
    }
}

/// Aggregate counts over a set of test cases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub tests: usize,
    pub passed: usize,
    pub failures: usize,
    pub errors: usize,
    pub skipped: usize,
    /// Sum of the `time` of every case that reports one.
    pub time: f64,
}

impl Summary {
    /// Count cases by their classified status.
    pub fn of<'a>(cases: impl IntoIterator<Item = &'a TestCase>) -> Self {
        let mut summary = Summary::default();
        for case in cases {
            summary.tests += 1;
            match case.status() {
                Status::Passed => summary.passed += 1,
                Status::Failed => summary.failures += 1,
                Status::Error => summary.errors += 1,
                Status::Skipped => summary.skipped += 1,
            }
            if let Some(time) = case.time() {
                summary.time += time;
            }
        }
        summary
    }

    /// Failed, errored and skipped cases together.
    pub fn not_passed(&self) -> usize {
        self.failures + self.errors + self.skipped
    }

    /// Write the counters onto a node's attributes, replacing stale values in place.
    pub fn apply(&self, attributes: &mut Attributes) {
        attributes.insert("tests".to_string(), self.tests.to_string());
        attributes.insert("failures".to_string(), self.failures.to_string());
        attributes.insert("errors".to_string(), self.errors.to_string());
        attributes.insert("skipped".to_string(), self.skipped.to_string());
        attributes.insert("time".to_string(), format!("{:.3}", self.time));
    }
}

/// Recompute counters on every summarizable node of the tree.
///
/// Which nodes are summarizable depends on the root shape. Counters always
/// come from the leaves currently under a node, never from a delta.
pub(super) fn recompute(root: &mut ReportNode) -> bool {
    match RootShape::of(root) {
        RootShape::SingleSuite => refresh_matching(root, is_suite),
        RootShape::Suites => refresh_with_aggregate_root(root, is_suite),
        RootShape::Sections => refresh_with_aggregate_root(root, is_section),
        RootShape::Unknown => refresh_direct_children(root),
    }
}

fn is_suite(node: &ReportNode) -> bool {
    matches!(node, ReportNode::Suite(_))
}

fn is_section(node: &ReportNode) -> bool {
    matches!(node, ReportNode::Section(_))
}

/// Refresh every node matching `summarizable`, children before parents.
fn refresh_matching(node: &mut ReportNode, summarizable: fn(&ReportNode) -> bool) -> bool {
    let matches = summarizable(node);
    let Some(group) = node.as_group_mut() else {
        return false;
    };

    let mut updated = false;
    for child in &mut group.children {
        updated |= refresh_matching(child, summarizable);
    }
    if matches {
        updated |= refresh_group(group);
    }
    updated
}

/// Refresh matching nodes below the root, then the root itself if it already
/// reports counters.
fn refresh_with_aggregate_root(root: &mut ReportNode, summarizable: fn(&ReportNode) -> bool) -> bool {
    let mut updated = refresh_matching(root, summarizable);
    if let Some(group) = root.as_group_mut()
        && group.has_counters()
    {
        updated |= refresh_group(group);
    }
    updated
}

/// Refresh each direct child holding cases; fall back to the root when none do.
fn refresh_direct_children(root: &mut ReportNode) -> bool {
    let Some(group) = root.as_group_mut() else {
        return false;
    };

    let mut updated = false;
    for child in &mut group.children {
        if let Some(child_group) = child.as_group_mut() {
            updated |= refresh_group(child_group);
        }
    }
    if !updated {
        updated = refresh_group(group);
    }
    updated
}

fn refresh_group(group: &mut Group) -> bool {
    let summary = Summary::of(group.cases());
    if summary.tests == 0 {
        return false;
    }
    summary.apply(&mut group.attributes);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Element, Report};

    fn case(name: &str, marker: Option<&str>, time: f64) -> ReportNode {
        let mut case = TestCase::new(name).with_classname("c").with_time(time);
        if let Some(tag) = marker {
            case = case.with_element(Element::new(tag));
        }
        ReportNode::Case(case)
    }

    fn attr<'a>(node: &'a ReportNode, key: &str) -> Option<&'a str> {
        node.as_group()
            .and_then(|g| g.attributes.get(key))
            .map(String::as_str)
    }

    #[test]
    fn test_summary_uses_precedence() {
        let both = TestCase::new("t")
            .with_element(Element::new("skipped"))
            .with_element(Element::new("failure"));
        let summary = Summary::of([&both]);
        assert_eq!(summary.tests, 1);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.not_passed() + summary.passed, summary.tests);
    }

    #[test]
    fn test_root_shape() {
        let shape = |xml: &str| Report::from_xml(xml, "r.xml").unwrap().shape();
        assert_eq!(shape("<testsuites/>"), RootShape::Suites);
        assert_eq!(shape("<sections/>"), RootShape::Sections);
        assert_eq!(shape("<testsuite/>"), RootShape::SingleSuite);
        assert_eq!(shape("<results/>"), RootShape::Unknown);
    }

    #[test]
    fn test_recompute_suites_overwrites_stale_counters() {
        let mut suite = Group::new("testsuite");
        suite.attributes.insert("name".into(), "s".into());
        suite.attributes.insert("tests".into(), "99".into());
        suite.attributes.insert("failures".into(), "42".into());
        suite.children = vec![
            case("a", None, 0.5),
            case("b", Some("failure"), 0.25),
            case("c", Some("skipped"), 0.0),
        ];
        let mut root = ReportNode::Unknown(Group::new("testsuites").with_child(ReportNode::Suite(suite)));

        assert!(recompute(&mut root));
        let suite = &root.as_group().unwrap().children[0];
        assert_eq!(attr(suite, "name"), Some("s"));
        assert_eq!(attr(suite, "tests"), Some("3"));
        assert_eq!(attr(suite, "failures"), Some("1"));
        assert_eq!(attr(suite, "errors"), Some("0"));
        assert_eq!(attr(suite, "skipped"), Some("1"));
        assert_eq!(attr(suite, "time"), Some("0.750"));
        // Attribute order is preserved for replaced keys.
        let keys: Vec<_> = suite.as_group().unwrap().attributes.keys().cloned().collect();
        assert_eq!(keys, vec!["name", "tests", "failures", "errors", "skipped", "time"]);
        // The root carried no counters and gains none.
        assert_eq!(attr(&root, "tests"), None);
    }

    #[test]
    fn test_recompute_suites_root_with_counters() {
        let mut top = Group::new("testsuites");
        top.attributes.insert("tests".into(), "0".into());
        let top = top
            .with_child(ReportNode::Suite(Group::new("testsuite").with_child(case("a", None, 1.0))))
            .with_child(ReportNode::Suite(
                Group::new("testsuite").with_child(case("b", Some("error"), 2.0)),
            ));
        let mut root = ReportNode::Unknown(top);

        assert!(recompute(&mut root));
        assert_eq!(attr(&root, "tests"), Some("2"));
        assert_eq!(attr(&root, "errors"), Some("1"));
        assert_eq!(attr(&root, "time"), Some("3.000"));
    }

    #[test]
    fn test_recompute_sections() {
        let section = Group::new("section").with_child(case("a", Some("error"), 0.1));
        let empty = Group::new("section");
        let mut root = ReportNode::Unknown(
            Group::new("sections")
                .with_child(ReportNode::Section(section))
                .with_child(ReportNode::Section(empty)),
        );

        assert!(recompute(&mut root));
        let children = &root.as_group().unwrap().children;
        assert_eq!(attr(&children[0], "errors"), Some("1"));
        assert_eq!(attr(&children[1], "tests"), None);
    }

    #[test]
    fn test_recompute_single_suite_and_nested() {
        let nested = Group::new("testsuite").with_child(case("n", Some("failure"), 0.0));
        let mut root = ReportNode::Suite(
            Group::new("testsuite")
                .with_child(case("a", None, 0.0))
                .with_child(ReportNode::Suite(nested)),
        );

        assert!(recompute(&mut root));
        assert_eq!(attr(&root, "tests"), Some("2"));
        assert_eq!(attr(&root, "failures"), Some("1"));
        assert_eq!(attr(&root.as_group().unwrap().children[1], "tests"), Some("1"));
    }

    #[test]
    fn test_recompute_unknown_root_children() {
        let mut root = ReportNode::Unknown(
            Group::new("results")
                .with_child(ReportNode::Unknown(Group::new("block").with_child(case("a", None, 0.0))))
                .with_child(ReportNode::Unknown(Group::new("meta"))),
        );

        assert!(recompute(&mut root));
        let children = &root.as_group().unwrap().children;
        assert_eq!(attr(&children[0], "tests"), Some("1"));
        assert_eq!(attr(&children[1], "tests"), None);
        assert_eq!(attr(&root, "tests"), None);
    }

    #[test]
    fn test_recompute_unknown_root_falls_back_to_root() {
        let mut root = ReportNode::Unknown(Group::new("results").with_child(case("a", None, 0.0)));
        assert!(recompute(&mut root));
        assert_eq!(attr(&root, "tests"), Some("1"));
    }

    #[test]
    fn test_recompute_no_cases() {
        let mut root = ReportNode::Unknown(Group::new("testsuites"));
        assert!(!recompute(&mut root));
    }
}
