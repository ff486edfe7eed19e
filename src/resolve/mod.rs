//! Map failing test identities to source files the runner can target.
//!
//! Classnames in JUnit reports are dotted paths such as `tests.pkg.TestClass`.
//! The resolver turns them into a file under the source tree using a naming
//! heuristic, then falls back to searching the tree by module file name.

mod root;

pub use root::{DEFAULT_ROOT_MARKER, find_project_root};

use serde::Serialize;
use std::cmp::Ordering;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Default extension of test source files.
pub const DEFAULT_EXTENSION: &str = "py";

/// A failed or errored test case selected for rerun.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FailingIdentity {
    pub classname: String,
    pub name: String,
}

impl FailingIdentity {
    pub fn new(classname: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            classname: classname.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for FailingIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.classname, self.name)
    }
}

/// A test located in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedLocation {
    pub path: PathBuf,
    pub name: String,
}

impl ResolvedLocation {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Runner target in `file::testname` form.
    pub fn target(&self) -> String {
        format!("{}::{}", self.path.display(), self.name)
    }
}

/// How confidently a classname was mapped to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The path derived from the classname exists.
    Exact(PathBuf),
    /// Found by searching the tree for the module file name; may be a guess
    /// when several subtrees contain a module of that name.
    FallbackSearch(PathBuf),
    /// No matching file.
    Unresolved,
}

impl Resolution {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Resolution::Exact(p) | Resolution::FallbackSearch(p) => Some(p),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Unresolved)
    }
}

/// Outcome of resolving a batch of identities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionReport {
    pub resolved: Vec<ResolvedLocation>,
    pub unresolved: Vec<FailingIdentity>,
    /// How many of `resolved` came from the fallback search.
    pub fallback_matches: usize,
}

/// Split a dotted classname into module path components.
///
/// A final segment starting with an uppercase letter is taken to be a class
/// and dropped, since module names are lowercase by convention.
pub fn module_path_components(classname: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = classname.split('.').filter(|p| !p.is_empty()).collect();
    if parts
        .last()
        .and_then(|last| last.chars().next())
        .is_some_and(char::is_uppercase)
    {
        parts.pop();
    }
    parts
}

/// Resolves classnames to files under a base directory.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    base_dir: PathBuf,
    extension: String,
}

impl IdentityResolver {
    /// Create a resolver for `.py` files under `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Use a different source file extension (without the dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve one classname to a source file.
    pub fn resolve(&self, classname: &str) -> Resolution {
        let components = module_path_components(classname);
        let Some((module, packages)) = components.split_last() else {
            return Resolution::Unresolved;
        };
        let file_name = format!("{module}.{}", self.extension);

        let mut candidate = self.base_dir.clone();
        candidate.extend(packages);
        candidate.push(&file_name);
        tracing::debug!(classname, candidate = %candidate.display(), "looking for test file");

        if candidate.is_file() {
            return Resolution::Exact(candidate);
        }

        match self.search(OsStr::new(&file_name)) {
            Some(found) => {
                tracing::debug!(classname, found = %found.display(), "located test file by search");
                Resolution::FallbackSearch(found)
            }
            None => Resolution::Unresolved,
        }
    }

    /// Resolve every identity; unresolved ones are collected, not fatal.
    pub fn resolve_all(&self, identities: &[FailingIdentity]) -> ResolutionReport {
        let mut report = ResolutionReport::default();
        for identity in identities {
            match self.resolve(&identity.classname) {
                Resolution::Exact(path) => {
                    report
                        .resolved
                        .push(ResolvedLocation::new(path, &identity.name));
                }
                Resolution::FallbackSearch(path) => {
                    report.fallback_matches += 1;
                    report
                        .resolved
                        .push(ResolvedLocation::new(path, &identity.name));
                }
                Resolution::Unresolved => {
                    tracing::warn!(identity = %identity, "could not find test file");
                    report.unresolved.push(identity.clone());
                }
            }
        }
        report
    }

    /// First file named `file_name` under the base directory. Files of a
    /// directory are visited before its subdirectories, each in name order.
    fn search(&self, file_name: &OsStr) -> Option<PathBuf> {
        WalkDir::new(&self.base_dir)
            .sort_by(files_first)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable entry");
                    None
                }
            })
            .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
            .map(DirEntry::into_path)
    }
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}
