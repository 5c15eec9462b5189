//! Service-contract detection on generated sources.
//!
//! The generated file is reduced to a tree of type declarations (namespaces,
//! classes, interfaces, …) and searched depth-first for an interface. This is
//! a structural check only: any interface counts as "the generator produced a
//! service contract".

mod csharp;
mod vb;

use std::path::Path;

use proxymgr_core::Language;

use crate::error::ContractError;

/// Kind of a declaration in the generated source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Namespace,
    Class,
    Struct,
    Interface,
    Enum,
    Record,
    Module,
}

/// One declaration and the declarations nested in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,
    pub children: Vec<Declaration>,
}

impl Declaration {
    pub fn new(kind: DeclarationKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            children: Vec::new(),
        }
    }
}

/// True when the artifact at `path` declares at least one interface.
///
/// Unreadable files and unknown languages count as "no contract".
pub fn has_service_contract(path: &Path) -> bool {
    match declarations(path) {
        Ok(tree) => match find_interface(&tree) {
            Some(found) => {
                tracing::debug!("service contract '{}' found in {}", found.name, path.display());
                true
            }
            None => {
                tracing::debug!("no interface declared in {}", path.display());
                false
            }
        },
        Err(e) => {
            tracing::warn!("{e}");
            false
        }
    }
}

/// Parse the declaration tree of a generated source file.
pub fn declarations(path: &Path) -> Result<Vec<Declaration>, ContractError> {
    let language = language_of(path).ok_or_else(|| ContractError::UnsupportedLanguage {
        path: path.to_path_buf(),
    })?;
    let source = std::fs::read_to_string(path).map_err(|source| ContractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(&source, language))
}

/// Parse source text of the given language into top-level declarations.
pub fn parse(source: &str, language: Language) -> Vec<Declaration> {
    match language {
        Language::CSharp => csharp::parse(source),
        Language::VisualBasic => vb::parse(source),
    }
}

/// Depth-first search for the first interface declaration.
pub fn find_interface(declarations: &[Declaration]) -> Option<&Declaration> {
    for declaration in declarations {
        if declaration.kind == DeclarationKind::Interface {
            return Some(declaration);
        }
        if let Some(found) = find_interface(&declaration.children) {
            return Some(found);
        }
    }
    None
}

fn language_of(path: &Path) -> Option<Language> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("cs") => Some(Language::CSharp),
        Some("vb") => Some(Language::VisualBasic),
        _ => None,
    }
}

/// Builds the tree while a parser walks the source. Frames without a
/// declaration are plain scopes (method bodies, accessors, initializers).
#[derive(Default)]
pub(crate) struct TreeBuilder {
    roots: Vec<Declaration>,
    frames: Vec<Frame>,
}

struct Frame {
    declaration: Option<Declaration>,
    closes_with_brace: bool,
}

impl TreeBuilder {
    pub(crate) fn open(&mut self, declaration: Option<Declaration>) {
        self.frames.push(Frame {
            declaration,
            closes_with_brace: true,
        });
    }

    /// A declaration that spans to end of input (C# file-scoped namespace).
    pub(crate) fn open_until_end(&mut self, declaration: Declaration) {
        self.frames.push(Frame {
            declaration: Some(declaration),
            closes_with_brace: false,
        });
    }

    /// Close the innermost brace-delimited frame, and any open-ended frames
    /// above it. Stray closers are ignored.
    pub(crate) fn close_brace(&mut self) {
        while let Some(frame) = self.frames.pop() {
            let braced = frame.closes_with_brace;
            self.attach(frame);
            if braced {
                return;
            }
        }
    }

    /// Close the innermost frame declaring `kind` (VB `End <Kind>`).
    pub(crate) fn close_kind(&mut self, kind: DeclarationKind) {
        let Some(index) = self
            .frames
            .iter()
            .rposition(|f| f.declaration.as_ref().map(|d| d.kind) == Some(kind))
        else {
            return;
        };
        while self.frames.len() > index {
            if let Some(frame) = self.frames.pop() {
                self.attach(frame);
            }
        }
    }

    pub(crate) fn finish(mut self) -> Vec<Declaration> {
        while let Some(frame) = self.frames.pop() {
            self.attach(frame);
        }
        self.roots
    }

    fn attach(&mut self, frame: Frame) {
        let Some(declaration) = frame.declaration else {
            return;
        };
        match self
            .frames
            .iter_mut()
            .rev()
            .find_map(|f| f.declaration.as_mut())
        {
            Some(parent) => parent.children.push(declaration),
            None => self.roots.push(declaration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn search_descends_into_children() {
        let mut ns = Declaration::new(DeclarationKind::Namespace, "App.Input");
        let mut outer = Declaration::new(DeclarationKind::Class, "Outer");
        outer
            .children
            .push(Declaration::new(DeclarationKind::Interface, "IInner"));
        ns.children.push(Declaration::new(DeclarationKind::Class, "Data"));
        ns.children.push(outer);

        let found = find_interface(std::slice::from_ref(&ns)).expect("interface");
        assert_eq!(found.name, "IInner");
    }

    #[test]
    fn search_on_empty_tree_is_none() {
        assert!(find_interface(&[]).is_none());
    }

    #[test]
    fn unknown_extension_is_not_a_contract() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Input.proxy.fs");
        std::fs::write(&path, "type IInput = interface end").unwrap();
        assert!(!has_service_contract(&path));
        assert!(matches!(
            declarations(&path),
            Err(ContractError::UnsupportedLanguage { .. })
        ));
    }

    #[test]
    fn missing_file_is_not_a_contract() {
        let dir = TempDir::new().unwrap();
        assert!(!has_service_contract(&dir.path().join("Input.proxy.cs")));
    }

    #[test]
    fn generated_file_with_contract() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Input.proxy.cs");
        std::fs::write(
            &path,
            "namespace App.Input {\n  [ServiceContract]\n  public interface IInput { }\n}\n",
        )
        .unwrap();
        assert!(has_service_contract(&path));
    }
}
