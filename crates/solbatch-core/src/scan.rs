//! Import and declaration extraction
//!
//! Extraction is pattern based, not a parser: it reads line-anchored
//! `import` statements and construct declarations and nothing else. Text
//! that merely looks like an import at the start of a line inside a block
//! comment or a multi-line string is picked up as well. Callers only depend
//! on [`SourceScanner`], so a real parser can take over without touching them.

use regex::Regex;

/// Extracts the pieces of a source file the build engine cares about
pub trait SourceScanner: Send + Sync {
    /// Import paths, in source order
    fn imports(&self, content: &str) -> Vec<String>;

    /// Names of constructs declared at line start, in source order
    fn declarations(&self, content: &str) -> Vec<String>;

    /// The content with every import statement removed
    fn strip_imports(&self, content: &str) -> String;
}

/// [`SourceScanner`] built on regular expressions
#[derive(Debug, Clone)]
pub struct RegexScanner {
    import: Regex,
    import_statement: Regex,
    declaration: Regex,
}

/// `import` up to and including the quoted path, which is group 1
///
/// The clause before `from` may be glued to its neighbours
/// (`import{X}from"a";`, `import*as X from"a";`).
const IMPORT_HEAD: &str = r#"^[ \t]*import\b\s*(?:[^;'"]*?\bfrom\s*)?["']([^"']+)["']"#;
/// Rest of the statement after the path (`as X`, `;`) plus the line break
const IMPORT_TAIL: &str = r#"[^;'"]*;[ \t]*(?:\r?\n)?"#;
const DECLARATION_PATTERN: &str =
    r"(?m)^[ \t]*(?:abstract[ \t]+)?(?:contract|library|interface)[ \t]+([A-Za-z_$][A-Za-z0-9_$]*)";

impl RegexScanner {
    pub fn new() -> Self {
        Self {
            import: compile(&format!("(?m){}", IMPORT_HEAD)),
            import_statement: compile(&format!("(?m){}{}", IMPORT_HEAD, IMPORT_TAIL)),
            declaration: compile(DECLARATION_PATTERN),
        }
    }
}

impl Default for RegexScanner {
    fn default() -> Self {
        Self::new()
    }
}

// The patterns are constants covered by the tests below.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("scanner pattern is valid")
}

impl SourceScanner for RegexScanner {
    fn imports(&self, content: &str) -> Vec<String> {
        self.import
            .captures_iter(content)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn declarations(&self, content: &str) -> Vec<String> {
        self.declaration
            .captures_iter(content)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn strip_imports(&self, content: &str) -> String {
        self.import_statement.replace_all(content, "").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_import_forms() {
        let source = indoc! {r#"
            pragma solidity ^0.8.0;
            import "./A.sol";
            import './B.sol';
            import {C, D} from "../lib/C.sol";
            import * as E from 'pkg/E.sol';
            import "F.sol" as F;
              import {
                G
              } from "./G.sol";
        "#};

        let imports = RegexScanner::new().imports(source);
        assert_eq!(
            imports,
            vec!["./A.sol", "./B.sol", "../lib/C.sol", "pkg/E.sol", "F.sol", "./G.sol"]
        );
    }

    #[test]
    fn test_compact_import_forms() {
        let source = indoc! {r#"
            import{X}from"./X.sol";
            import*as Y from"./Y.sol";
            import {Z}from './Z.sol';
            import"./W.sol";
        "#};

        let scanner = RegexScanner::new();
        assert_eq!(
            scanner.imports(source),
            vec!["./X.sol", "./Y.sol", "./Z.sol", "./W.sol"]
        );
        assert_eq!(scanner.strip_imports(source), "");
    }

    #[test]
    fn test_from_inside_identifier_is_not_a_clause_end() {
        let source = "import {fromBase, toBase} from \"./Convert.sol\";\n";
        assert_eq!(RegexScanner::new().imports(source), vec!["./Convert.sol"]);
    }

    #[test]
    fn test_strip_agrees_with_extraction() {
        let source = "/*\nimport order matters here\n*/\ncontract A { uint x; uint y; }\n";
        let scanner = RegexScanner::new();

        assert!(scanner.imports(source).is_empty());
        assert_eq!(scanner.strip_imports(source), source);
    }

    #[test]
    fn test_strip_keeps_code_after_import() {
        let source = "import \"./A.sol\" as A;\ncontract B { uint x; }\n";
        assert_eq!(
            RegexScanner::new().strip_imports(source),
            "contract B { uint x; }\n"
        );
    }

    #[test]
    fn test_line_comment_import_is_ignored() {
        let source = "// import \"./Ghost.sol\";\ncontract A {}\n";
        assert!(RegexScanner::new().imports(source).is_empty());
    }

    #[test]
    fn test_block_comment_import_is_extracted() {
        // Known limitation: block comments are not understood.
        let source = "/*\nimport \"./Ghost.sol\";\n*/\ncontract A {}\n";
        assert_eq!(RegexScanner::new().imports(source), vec!["./Ghost.sol"]);
    }

    #[test]
    fn test_multiline_string_import_is_extracted() {
        // Known limitation: string literals are not understood either.
        let source = "string constant S = \"\nimport './Fake.sol';\n\";\n";
        assert_eq!(RegexScanner::new().imports(source), vec!["./Fake.sol"]);
    }

    #[test]
    fn test_declarations() {
        let source = indoc! {r#"
            interface IToken { }
            library SafeMath { }
            abstract contract Base { }
            contract Token is Base, IToken {
                // contract Inner is not at line start after the comment marker
            }
            /* contract InComment */
        "#};

        assert_eq!(
            RegexScanner::new().declarations(source),
            vec!["IToken", "SafeMath", "Base", "Token"]
        );
    }

    #[test]
    fn test_declarations_require_line_start() {
        let source = "uint x; contract NotAtStart {}\n";
        assert!(RegexScanner::new().declarations(source).is_empty());
    }

    #[test]
    fn test_identifier_starting_with_import_is_not_an_import() {
        let source = "contract A {\n    function f() public {\n        importance = 1;\n    }\n}\n";
        let scanner = RegexScanner::new();
        assert!(scanner.imports(source).is_empty());
        assert_eq!(scanner.strip_imports(source), source);
    }

    #[test]
    fn test_strip_imports() {
        let source = indoc! {r#"
            pragma solidity ^0.8.0;
            import "./A.sol";
            import {B} from "./B.sol";

            contract C {}
        "#};

        assert_eq!(
            RegexScanner::new().strip_imports(source),
            "pragma solidity ^0.8.0;\n\ncontract C {}\n"
        );
    }
}
