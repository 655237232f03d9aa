use crate::error::{ExtractError, Result};
use crate::language::Language;
use crate::types::{Declaration, MethodDecl};
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Tree-sitter walker that turns Python source into class declarations
pub struct AstAnalyzer {
    parser: Parser,
}

impl AstAnalyzer {
    pub fn new(language: Language) -> Result<Self> {
        if !language.supports_ast() {
            return Err(ExtractError::unsupported_language(language.as_str()));
        }

        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| ExtractError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self { parser })
    }

    /// Parse `content` and collect every class definition in pre-order
    pub fn analyze(&mut self, content: &str, file_path: &Path) -> Result<Vec<Declaration>> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| ExtractError::parse("Failed to parse source code"))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            return Err(ExtractError::parse(format!(
                "{}: syntax error near line {line}",
                file_path.display()
            )));
        }

        let source = content.as_bytes();
        let mut declarations = Vec::new();

        // Explicit stack instead of recursion; deeply nested modules are legal Python.
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.kind() == "class_definition" {
                if let Some(decl) = Self::class_declaration(source, file_path, node) {
                    declarations.push(decl);
                }
            }

            let mut cursor = node.walk();
            let children: Vec<_> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        Ok(declarations)
    }

    fn class_declaration(source: &[u8], file_path: &Path, node: Node) -> Option<Declaration> {
        let name = node_text(source, node.child_by_field_name("name")?)?;
        let mut decl = Declaration::new(name, file_path, line_of(node));

        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for base in superclasses.named_children(&mut cursor) {
                if let Some(rendered) = render_base(source, base) {
                    decl.declared_bases.push(rendered);
                }
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for statement in body.named_children(&mut cursor) {
                let function = match statement.kind() {
                    "function_definition" => Some(statement),
                    "decorated_definition" => statement
                        .child_by_field_name("definition")
                        .filter(|def| def.kind() == "function_definition"),
                    _ => None,
                };

                if let Some(method) =
                    function.and_then(|f| Self::method_declaration(source, file_path, f))
                {
                    decl.insert_method(method);
                }
            }
        }

        Some(decl)
    }

    fn method_declaration(source: &[u8], file_path: &Path, node: Node) -> Option<MethodDecl> {
        let name = node_text(source, node.child_by_field_name("name")?)?;

        let mut signature = name.to_string();
        if let Some(params) = node.child_by_field_name("parameters") {
            signature.push_str(&compact_source(source, params));
        } else {
            signature.push_str("()");
        }
        if let Some(ret) = node.child_by_field_name("return_type") {
            signature.push_str(" -> ");
            signature.push_str(&compact_source(source, ret));
        }

        Some(MethodDecl {
            name: name.to_string(),
            line: line_of(node),
            signature,
            file_path: file_path.to_path_buf(),
        })
    }
}

/// Render one superclass-list entry; `None` for entries that are not class references
fn render_base(source: &[u8], node: Node) -> Option<String> {
    match node.kind() {
        "identifier" => node_text(source, node).map(str::to_string),
        "attribute" => {
            let object = render_dotted(source, node.child_by_field_name("object")?)?;
            let attr = node_text(source, node.child_by_field_name("attribute")?)?;
            Some(format!("{object}.{attr}"))
        }
        "subscript" => render_base(source, node.child_by_field_name("value")?),
        _ => None,
    }
}

fn render_dotted(source: &[u8], node: Node) -> Option<String> {
    match node.kind() {
        "identifier" | "attribute" => render_base(source, node),
        _ => None,
    }
}

fn node_text<'a>(source: &'a [u8], node: Node) -> Option<&'a str> {
    node.utf8_text(source).ok()
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

/// Source text of `node` on one line: comments dropped, whitespace runs collapsed, string
/// literals kept as written
fn compact_source(source: &[u8], node: Node) -> String {
    let mut out = Compact::default();
    out.push_node(source, node);
    out.text
}

#[derive(Default)]
struct Compact {
    text: String,
    pending_space: bool,
}

impl Compact {
    fn push_node(&mut self, source: &[u8], node: Node) {
        match node.kind() {
            "comment" => self.pending_space = true,
            "string" | "concatenated_string" => {
                self.push_verbatim(node_text(source, node).unwrap_or_default());
            }
            _ if node.child_count() == 0 => {
                self.push_code(node_text(source, node).unwrap_or_default());
            }
            _ => {
                let mut at = node.start_byte();
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.push_code(gap_text(source, at, child.start_byte()));
                    self.push_node(source, child);
                    at = child.end_byte();
                }
                self.push_code(gap_text(source, at, node.end_byte()));
            }
        }
    }

    fn push_code(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                self.pending_space = true;
            } else {
                self.push_char(ch);
            }
        }
    }

    fn push_verbatim(&mut self, text: &str) {
        let mut chars = text.chars();
        if let Some(first) = chars.next() {
            self.push_char(first);
            self.text.push_str(chars.as_str());
        }
    }

    fn push_char(&mut self, ch: char) {
        if self.pending_space && !self.text.is_empty() && !self.text.ends_with('(') && ch != ')'
        {
            self.text.push(' ');
        }
        self.pending_space = false;
        self.text.push(ch);
    }
}

fn gap_text(source: &[u8], start: usize, end: usize) -> &str {
    source
        .get(start..end)
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
        .unwrap_or_default()
}

fn first_error_line(root: Node) -> Option<usize> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(line_of(node));
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}
