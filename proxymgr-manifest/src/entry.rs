//! Manifest entries and include-path matching.

use std::fmt;

/// The five kinds of item the synchronizer maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// `WCFMetadata`: the folder holding every reference group.
    MetadataGroup,
    /// `WCFMetadataStorage`: one reference group folder.
    StorageGroup,
    /// `Compile`: the generated source file.
    CompileItem,
    /// `None`: the mapping record, tagged with its generator.
    NoneItem,
    /// `Reference`: a framework assembly.
    Reference,
}

impl EntryKind {
    /// Item element name in the manifest.
    pub fn element_name(self) -> &'static str {
        match self {
            EntryKind::MetadataGroup => "WCFMetadata",
            EntryKind::StorageGroup => "WCFMetadataStorage",
            EntryKind::CompileItem => "Compile",
            EntryKind::NoneItem => "None",
            EntryKind::Reference => "Reference",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// One item to upsert: kind, `Include` path and ordered metadata tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub kind: EntryKind,
    pub include: String,
    pub tags: Vec<(String, String)>,
}

impl ManifestEntry {
    pub fn new(kind: EntryKind, include: impl Into<String>) -> Self {
        Self {
            kind,
            include: include.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    /// Whether an existing item of `kind` with `include` is this entry.
    pub fn matches(&self, kind: EntryKind, include: &str) -> bool {
        self.kind == kind && same_include(kind, &self.include, include)
    }
}

/// Canonical form of an include path: `\` separators, no trailing separator,
/// ASCII lowercase.
pub fn normalize_include(path: &str) -> String {
    let unified = path.trim().replace('/', "\\");
    unified.trim_end_matches('\\').to_ascii_lowercase()
}

/// Include equality for `kind`. References compare by simple assembly name,
/// so `System.ServiceModel, Version=4.0.0.0` matches `System.ServiceModel`.
pub(crate) fn same_include(kind: EntryKind, a: &str, b: &str) -> bool {
    match kind {
        EntryKind::Reference => normalize_include(simple_name(a)) == normalize_include(simple_name(b)),
        _ => normalize_include(a) == normalize_include(b),
    }
}

fn simple_name(reference: &str) -> &str {
    reference.split(',').next().unwrap_or(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Service References\\Input\\", "service references\\input")]
    #[case("Service References/Input/Input.proxy.cs", "service references\\input\\input.proxy.cs")]
    #[case("  Service References  ", "service references")]
    #[case("System.ServiceModel", "system.servicemodel")]
    fn normalizes(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_include(raw), expected);
    }

    #[rstest]
    #[case(EntryKind::StorageGroup, "Service References\\Input\\", "service references/input")]
    #[case(EntryKind::CompileItem, "A\\B.cs", "a/b.cs")]
    #[case(
        EntryKind::Reference,
        "System.ServiceModel",
        "System.ServiceModel, Version=4.0.0.0, Culture=neutral"
    )]
    fn equivalent_includes(#[case] kind: EntryKind, #[case] a: &str, #[case] b: &str) {
        assert!(same_include(kind, a, b));
        assert!(ManifestEntry::new(kind, a).matches(kind, b));
    }

    #[test]
    fn kind_participates_in_matching() {
        let entry = ManifestEntry::new(EntryKind::NoneItem, "x.svcmap");
        assert!(!entry.matches(EntryKind::CompileItem, "x.svcmap"));
    }

    #[test]
    fn distinct_files_do_not_match() {
        assert!(!same_include(EntryKind::CompileItem, "Input.proxy.cs", "Input.proxy.vb"));
    }
}
