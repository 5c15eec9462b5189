//! Visual Basic declaration scanner.
//!
//! VB blocks are line oriented: `Namespace X` … `End Namespace`, so the
//! scanner works a line at a time after stripping comments and attribute
//! prefixes. Keywords are case-insensitive.

use super::{Declaration, DeclarationKind, TreeBuilder};

const MODIFIERS: &[&str] = &[
    "public",
    "private",
    "protected",
    "friend",
    "partial",
    "shadows",
    "mustinherit",
    "notinheritable",
    "shared",
    "overloads",
    "widening",
    "narrowing",
];

pub(super) fn parse(source: &str) -> Vec<Declaration> {
    let mut tree = TreeBuilder::default();
    for raw in source.lines() {
        let line = strip_attributes(strip_comment(raw).trim());
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            continue;
        };

        if first.eq_ignore_ascii_case("end") {
            if let Some(kind) = words.next().and_then(block_kind) {
                tree.close_kind(kind);
            }
            continue;
        }

        let mut word = Some(first);
        while let Some(w) = word {
            if !MODIFIERS.iter().any(|m| w.eq_ignore_ascii_case(m)) {
                break;
            }
            word = words.next();
        }
        let Some(kind) = word.and_then(block_kind) else {
            continue;
        };
        let Some(name) = words.next().map(declared_name).filter(|n| !n.is_empty()) else {
            continue;
        };
        tree.open(Some(Declaration::new(kind, name)));
    }
    tree.finish()
}

fn block_kind(word: &str) -> Option<DeclarationKind> {
    match word.to_ascii_lowercase().as_str() {
        "namespace" => Some(DeclarationKind::Namespace),
        "class" => Some(DeclarationKind::Class),
        "structure" => Some(DeclarationKind::Struct),
        "interface" => Some(DeclarationKind::Interface),
        "enum" => Some(DeclarationKind::Enum),
        "module" => Some(DeclarationKind::Module),
        _ => None,
    }
}

/// `Repository(Of T)` → `Repository`; `[Error]` → `Error`.
fn declared_name(word: &str) -> &str {
    let word = word.split('(').next().unwrap_or(word);
    word.trim_start_matches('[').trim_end_matches(']')
}

/// Drop a trailing `'` or leading `REM` comment, respecting string literals.
fn strip_comment(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("rem"))
        && trimmed[3..].chars().next().map_or(true, char::is_whitespace)
    {
        return "";
    }
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '\'' | '‘' | '’' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Remove leading `<Attribute(...)>` blocks.
fn strip_attributes(mut line: &str) -> &str {
    while line.starts_with('<') {
        let mut in_string = false;
        let mut end = None;
        for (i, c) in line.char_indices() {
            match c {
                '"' => in_string = !in_string,
                '>' if !in_string => {
                    end = Some(i);
                    break;
                }
                _ => {}
            }
        }
        match end {
            Some(i) => line = line[i + 1..].trim_start(),
            None => return "",
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::find_interface;

    const GENERATED: &str = r#"'------------------------------------------------------------------------------
' <auto-generated>
'     This code was generated by a tool.
' </auto-generated>
'------------------------------------------------------------------------------

Option Strict Off
Option Explicit On

Namespace MySampleApp.Input

    <System.Runtime.Serialization.DataContractAttribute(Name:="Order")>  _
    Partial Public Class Order
        Inherits Object
        Public Property Name() As String
            Get
                Return Me.nameField
            End Get
        End Property
    End Class

    <System.ServiceModel.ServiceContractAttribute(ConfigurationName:="IInput")> Public Interface IInput
        <System.ServiceModel.OperationContractAttribute(Action:="http://tempuri.org/IInput/Get")>
        Function [Get](ByVal id As Integer) As Order
    End Interface
End Namespace
"#;

    #[test]
    fn generated_proxy_tree() {
        let tree = parse(GENERATED);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "MySampleApp.Input");
        let kinds: Vec<_> = tree[0].children.iter().map(|d| (d.kind, d.name.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (DeclarationKind::Class, "Order"),
                (DeclarationKind::Interface, "IInput"),
            ]
        );
        assert!(find_interface(&tree).is_some());
    }

    #[test]
    fn commented_interface_is_ignored() {
        let src = "Namespace A\n    ' Public Interface IOld\n    REM Interface IRem\n    Public Class C ' Interface IInline\n    End Class\nEnd Namespace\n";
        let tree = parse(src);
        assert!(find_interface(&tree).is_none(), "{tree:?}");
        assert_eq!(tree[0].children.len(), 1);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let src = "NAMESPACE A\n  public INTERFACE IShout\n  END INTERFACE\nend namespace\n";
        assert!(find_interface(&parse(src)).is_some());
    }

    #[test]
    fn generic_names_are_trimmed() {
        let src = "Public Class Repository(Of T)\n    Public Structure Entry\n    End Structure\nEnd Class\n";
        let tree = parse(src);
        assert_eq!(tree[0].name, "Repository");
        assert_eq!(tree[0].children[0].kind, DeclarationKind::Struct);
    }

    #[test]
    fn strings_may_contain_apostrophes() {
        assert_eq!(strip_comment(r#"x = "it's" ' note"#), r#"x = "it's" "#);
    }
}
