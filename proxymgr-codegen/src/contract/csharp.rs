//! C# declaration scanner.
//!
//! Only enough of the language to find type declarations: comments, string
//! and character literals and preprocessor lines are skipped, and the
//! remaining input is reduced to identifiers, braces, dots and semicolons.

use super::{Declaration, DeclarationKind, TreeBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Open,
    Close,
    Semi,
    Dot,
    Other,
}

pub(super) fn parse(source: &str) -> Vec<Declaration> {
    let tokens = lex(source);
    let mut tree = TreeBuilder::default();
    let mut pending: Option<Declaration> = None;
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            Token::Ident(word) => {
                if let Some(kind) = declaration_kind(word) {
                    if let Some((name, next)) = declared_name(&tokens, i + 1, kind) {
                        pending = Some(Declaration::new(kind, name));
                        i = next;
                        continue;
                    }
                }
            }
            Token::Open => tree.open(pending.take()),
            Token::Close => {
                pending = None;
                tree.close_brace();
            }
            Token::Semi => match pending.take() {
                Some(decl) if decl.kind == DeclarationKind::Namespace => tree.open_until_end(decl),
                _ => {}
            },
            Token::Dot | Token::Other => {}
        }
        i += 1;
    }
    tree.finish()
}

fn declaration_kind(word: &str) -> Option<DeclarationKind> {
    match word {
        "namespace" => Some(DeclarationKind::Namespace),
        "class" => Some(DeclarationKind::Class),
        "struct" => Some(DeclarationKind::Struct),
        "interface" => Some(DeclarationKind::Interface),
        "enum" => Some(DeclarationKind::Enum),
        "record" => Some(DeclarationKind::Record),
        _ => None,
    }
}

/// Name following a declaration keyword, and the index after it. Namespaces
/// may be dotted. `class` in a `where T : class` constraint has no name and
/// yields `None`, as does `record struct`/`record class` (the inner keyword
/// declares).
fn declared_name(tokens: &[Token<'_>], start: usize, kind: DeclarationKind) -> Option<(String, usize)> {
    let Token::Ident(first) = *tokens.get(start)? else {
        return None;
    };
    if declaration_kind(first).is_some() {
        return None;
    }
    let mut name = first.to_owned();
    let mut i = start + 1;
    if kind == DeclarationKind::Namespace {
        while let (Some(Token::Dot), Some(Token::Ident(part))) = (tokens.get(i), tokens.get(i + 1)) {
            name.push('.');
            name.push_str(part);
            i += 2;
        }
    }
    Some((name, i))
}

fn lex(source: &str) -> Vec<Token<'_>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line_start = true;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\n' => {
                line_start = true;
                i += 1;
                continue;
            }
            b' ' | b'\t' | b'\r' => {
                i += 1;
                continue;
            }
            b'#' if line_start => {
                i = skip_line(bytes, i);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = skip_line(bytes, i);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i + 2);
            }
            b'"' => i = skip_string(bytes, i),
            b'\'' => i = skip_char(bytes, i + 1),
            b'@' | b'$' if is_string_prefix(bytes, i) => i = skip_prefixed_string(bytes, i),
            b'{' => {
                tokens.push(Token::Open);
                i += 1;
            }
            b'}' => {
                tokens.push(Token::Close);
                i += 1;
            }
            b';' => {
                tokens.push(Token::Semi);
                i += 1;
            }
            b'.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            _ if is_ident_start(source, i) => {
                let start = i;
                // `@class` is an identifier, never a keyword.
                if b == b'@' {
                    i += 1;
                }
                i = ident_end(source, i);
                tokens.push(Token::Ident(&source[start..i]));
            }
            _ => {
                tokens.push(Token::Other);
                i += source[i..].chars().next().map_or(1, char::len_utf8);
            }
        }
        line_start = false;
    }
    tokens
}

fn skip_line(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

fn skip_block_comment(bytes: &[u8], mut i: usize) -> usize {
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}

/// Regular or raw (`"""`) string starting at `i`.
fn skip_string(bytes: &[u8], i: usize) -> usize {
    if bytes[i..].starts_with(b"\"\"\"") {
        let mut j = i + 3;
        while j < bytes.len() {
            if bytes[j..].starts_with(b"\"\"\"") {
                return j + 3;
            }
            j += 1;
        }
        return bytes.len();
    }
    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'"' => return j + 1,
            b'\n' => return j,
            _ => j += 1,
        }
    }
    bytes.len()
}

fn skip_char(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\'' => return i + 1,
            b'\n' => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn is_string_prefix(bytes: &[u8], i: usize) -> bool {
    matches!(
        (bytes.get(i), bytes.get(i + 1), bytes.get(i + 2)),
        (Some(b'@'), Some(b'"'), _)
            | (Some(b'$'), Some(b'"'), _)
            | (Some(b'@'), Some(b'$'), Some(b'"'))
            | (Some(b'$'), Some(b'@'), Some(b'"'))
    )
}

/// `@"…"`, `$"…"`, `$@"…"` and `@$"…"`. Verbatim strings escape quotes by
/// doubling them and may span lines.
fn skip_prefixed_string(bytes: &[u8], mut i: usize) -> usize {
    let mut verbatim = false;
    while i < bytes.len() && bytes[i] != b'"' {
        verbatim |= bytes[i] == b'@';
        i += 1;
    }
    if !verbatim {
        return skip_string(bytes, i);
    }
    let mut j = i + 1;
    while j < bytes.len() {
        if bytes[j] == b'"' {
            if bytes.get(j + 1) == Some(&b'"') {
                j += 2;
                continue;
            }
            return j + 1;
        }
        j += 1;
    }
    bytes.len()
}

fn is_ident_start(source: &str, i: usize) -> bool {
    let mut chars = source[i..].chars();
    match chars.next() {
        Some('@') => chars.next().is_some_and(|c| c == '_' || c.is_alphabetic()),
        Some(c) => c == '_' || c.is_alphabetic(),
        None => false,
    }
}

fn ident_end(source: &str, i: usize) -> usize {
    source[i..]
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map_or(source.len(), |(offset, _)| i + offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::find_interface;

    const GENERATED: &str = r#"//------------------------------------------------------------------------------
// <auto-generated>
//     This code was generated by a tool.
// </auto-generated>
//------------------------------------------------------------------------------

namespace MySampleApp.Input
{
    using System.Runtime.Serialization;

    [System.Diagnostics.DebuggerStepThroughAttribute()]
    [System.Runtime.Serialization.DataContractAttribute(Name="Order", Namespace="http://schemas.example.org/{orders}")]
    public partial class Order : object, System.Runtime.Serialization.IExtensibleDataObject
    {
        private string nameField;

        public string Name
        {
            get { return this.nameField; }
            set { this.nameField = value; }
        }
    }

    [System.ServiceModel.ServiceContractAttribute(ConfigurationName="IInput")]
    public interface IInput
    {
        [System.ServiceModel.OperationContractAttribute(Action="http://tempuri.org/IInput/Get")]
        Order Get(int id);
    }

    public interface IInputChannel : IInput, System.ServiceModel.IClientChannel
    {
    }
}
"#;

    #[test]
    fn generated_proxy_tree() {
        let tree = parse(GENERATED);
        assert_eq!(tree.len(), 1);
        let ns = &tree[0];
        assert_eq!(ns.kind, DeclarationKind::Namespace);
        assert_eq!(ns.name, "MySampleApp.Input");
        let kinds: Vec<_> = ns.children.iter().map(|d| (d.kind, d.name.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (DeclarationKind::Class, "Order"),
                (DeclarationKind::Interface, "IInput"),
                (DeclarationKind::Interface, "IInputChannel"),
            ]
        );
        assert_eq!(find_interface(&tree).map(|d| d.name.as_str()), Some("IInput"));
    }

    #[test]
    fn data_contracts_only_have_no_interface() {
        let src = r#"
            namespace App.Input {
                public partial class Order { public string Name { get; set; } }
                public enum Status : int { Open = 0, Closed = 1 }
                public struct Point { public int X; }
            }
        "#;
        let tree = parse(src);
        assert!(find_interface(&tree).is_none());
        assert_eq!(tree[0].children.len(), 3);
    }

    #[test]
    fn keywords_in_comments_and_strings_are_ignored() {
        let src = r#"
            // public interface ICommented { }
            /* interface IBlock { } */
            namespace App {
                class Holder {
                    string a = "interface IString { }";
                    string b = @"interface IVerbatim { ""quoted"" }";
                    string c = $"interface {nameof(Holder)} {{ }}";
                    char d = '{';
                }
            }
        "#;
        let tree = parse(src);
        assert!(find_interface(&tree).is_none(), "{tree:?}");
        assert_eq!(tree[0].children[0].name, "Holder");
    }

    #[test]
    fn preprocessor_lines_are_skipped() {
        let src = "#if NET48\nnamespace A {\n#else\nnamespace A {\n#endif\n interface IX {}\n}\n";
        let tree = parse(src);
        assert_eq!(tree.len(), 1);
        assert!(find_interface(&tree).is_some());
    }

    #[test]
    fn generic_class_constraint_is_not_a_declaration() {
        let src = r#"
            namespace App {
                public class Factory<T> where T : class, new() {
                    public T Create() { return new T(); }
                }
                public static class Helpers {
                    public static void Run<T>(T x) where T : class { }
                }
            }
        "#;
        let tree = parse(src);
        let names: Vec<_> = tree[0].children.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Factory", "Helpers"]);
    }

    #[test]
    fn nested_interface_found_depth_first() {
        let src = "namespace A { class Outer { class Middle { interface IDeep { } } } }";
        let tree = parse(src);
        assert_eq!(find_interface(&tree).map(|d| d.name.as_str()), Some("IDeep"));
    }

    #[test]
    fn file_scoped_namespace_contains_the_rest() {
        let src = "namespace App.Input;\n\npublic interface IInput { }\npublic class Data { }\n";
        let tree = parse(src);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "App.Input");
        assert_eq!(tree[0].children.len(), 2);
    }

    #[test]
    fn verbatim_identifier_is_not_a_keyword() {
        let src = "namespace A { class C { int @interface; object @class = null; } }";
        let tree = parse(src);
        assert!(find_interface(&tree).is_none());
        assert!(tree[0].children[0].children.is_empty());
    }

    #[test]
    fn positional_record_without_body() {
        let src = "namespace A { public record Person(string Name); interface IPeople { } }";
        let tree = parse(src);
        let kinds: Vec<_> = tree[0].children.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DeclarationKind::Interface]);
    }
}
