//! Tree-sitter based Go reader.
//!
//! Lowers the concrete tree-sitter tree into the `go/ast`-shaped [`File`].
//! Anything outside the modelled subset becomes [`NodeKind::Unsupported`]
//! tagged with the `go/ast` kind name, so reading never rejects valid Go.

use crate::ast::*;
use crate::traits::{ReadError, Reader};
use tree_sitter::{Node as TsNode, Parser, Tree};

const RED_ZONE: usize = 64 * 1024;
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// Static instance of the Go reader for registry.
pub static GO_READER: GoReader = GoReader;

/// Go reader using tree-sitter.
pub struct GoReader;

impl Reader for GoReader {
    fn language(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn read(&self, source: &str) -> Result<File, ReadError> {
        read_go(source)
    }
}

/// Parse Go source into a compilation-unit tree.
pub fn read_go(source: &str) -> Result<File, ReadError> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_go::language().into())
        .map_err(|err| ReadError::Parse(err.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ReadError::Parse("failed to parse".into()))?;

    let ctx = ReadContext::new(source);
    ctx.read_file(&tree)
}

struct ReadContext<'a> {
    source: &'a str,
}

impl<'a> ReadContext<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn node_text(&self, node: TsNode) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn pos(&self, node: TsNode) -> Pos {
        let point = node.start_position();
        Pos::new(
            node.start_byte(),
            point.row as u32 + 1,
            point.column as u32 + 1,
        )
    }

    fn field<'t>(&self, node: TsNode<'t>, name: &str) -> Result<TsNode<'t>, ReadError> {
        node.child_by_field_name(name)
            .ok_or_else(|| ReadError::Parse(format!("{} missing {}", node.kind(), name)))
    }

    fn named_children<'t>(&self, node: TsNode<'t>) -> Vec<TsNode<'t>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .collect()
    }

    fn ident(&self, node: TsNode) -> Ident {
        Ident::new(self.node_text(node)).at(self.pos(node))
    }

    fn read_file(&self, tree: &Tree) -> Result<File, ReadError> {
        let root = tree.root_node();

        if root.has_error() {
            return Err(ReadError::Parse("syntax error in source".into()));
        }
        if root.kind() != "source_file" {
            return Err(ReadError::UnexpectedNode {
                expected: "source_file".into(),
                got: root.kind().into(),
            });
        }

        let mut package = None;
        let mut decls = Vec::new();

        for child in self.named_children(root) {
            match child.kind() {
                "package_clause" => {
                    let name = self
                        .named_children(child)
                        .into_iter()
                        .next()
                        .ok_or_else(|| ReadError::Parse("package_clause has no name".into()))?;
                    package = Some(self.ident(name));
                }
                _ => decls.push(self.read_decl(child)?),
            }
        }

        let package = package.ok_or_else(|| ReadError::Parse("missing package clause".into()))?;

        Ok(File {
            pos: self.pos(root),
            package,
            decls,
        })
    }

    fn read_decl(&self, node: TsNode) -> Result<Node, ReadError> {
        let pos = self.pos(node);
        let kind = match node.kind() {
            "function_declaration" | "method_declaration" => self.read_func_decl(node)?,
            "import_declaration" => NodeKind::GenDecl {
                tok: DeclToken::Import,
                specs: self.read_specs(node, &["import_spec"], Self::read_import_spec)?,
            },
            "const_declaration" => NodeKind::GenDecl {
                tok: DeclToken::Const,
                specs: self.read_specs(node, &["const_spec"], Self::read_value_spec)?,
            },
            "var_declaration" => NodeKind::GenDecl {
                tok: DeclToken::Var,
                specs: self.read_specs(node, &["var_spec"], Self::read_value_spec)?,
            },
            "type_declaration" => NodeKind::GenDecl {
                tok: DeclToken::Type,
                specs: self.read_specs(node, &["type_spec", "type_alias"], Self::read_type_spec)?,
            },
            _ => return self.read_node(node),
        };
        Ok(Node { pos, kind })
    }

    /// Collect specs, descending through `*_spec_list` wrappers.
    fn read_specs(
        &self,
        node: TsNode,
        kinds: &[&str],
        read: fn(&Self, TsNode) -> Result<Node, ReadError>,
    ) -> Result<Vec<Node>, ReadError> {
        let mut specs = Vec::new();
        for child in self.named_children(node) {
            if kinds.contains(&child.kind()) {
                specs.push(read(self, child)?);
            } else if child.kind().ends_with("_spec_list") {
                specs.extend(self.read_specs(child, kinds, read)?);
            }
        }
        Ok(specs)
    }

    fn read_import_spec(&self, node: TsNode) -> Result<Node, ReadError> {
        let name = node.child_by_field_name("name").map(|n| self.ident(n));
        let path = node.child_by_field_name("path").map(|p| BasicLit {
            pos: self.pos(p),
            kind: LitKind::String,
            value: self.node_text(p).to_string(),
        });
        Ok(Node::new(NodeKind::ImportSpec { name, path }).at(self.pos(node)))
    }

    fn read_value_spec(&self, node: TsNode) -> Result<Node, ReadError> {
        let mut cursor = node.walk();
        let names = node
            .children_by_field_name("name", &mut cursor)
            .map(|n| self.ident(n))
            .collect();
        let ty = node
            .child_by_field_name("type")
            .map(|t| self.read_node(t).map(Box::new))
            .transpose()?;
        let values = match node.child_by_field_name("value") {
            Some(list) => self.read_list(list)?,
            None => Vec::new(),
        };
        Ok(Node::new(NodeKind::ValueSpec { names, ty, values }).at(self.pos(node)))
    }

    fn read_type_spec(&self, node: TsNode) -> Result<Node, ReadError> {
        let name = self.ident(self.field(node, "name")?);
        let ty = self.read_node(self.field(node, "type")?)?;
        Ok(Node::new(NodeKind::TypeSpec {
            name,
            ty: Box::new(ty),
        })
        .at(self.pos(node)))
    }

    fn read_func_decl(&self, node: TsNode) -> Result<NodeKind, ReadError> {
        let name = self.ident(self.field(node, "name")?);
        let ty = self.read_func_type(node)?;
        let body = node
            .child_by_field_name("body")
            .map(|b| self.read_node(b).map(Box::new))
            .transpose()?;
        Ok(NodeKind::FuncDecl {
            name,
            ty: Box::new(ty),
            body,
        })
    }

    /// Build a `FuncType` from a node carrying `parameters`/`result` fields.
    fn read_func_type(&self, node: TsNode) -> Result<Node, ReadError> {
        let params = match node.child_by_field_name("parameters") {
            Some(list) => self.read_param_types(list)?,
            None => Vec::new(),
        };
        let results = match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => self.read_param_types(result)?,
            Some(result) => vec![self.read_node(result)?],
            None => Vec::new(),
        };
        Ok(Node::new(NodeKind::FuncType { params, results }).at(self.pos(node)))
    }

    fn read_param_types(&self, list: TsNode) -> Result<Vec<Node>, ReadError> {
        self.named_children(list)
            .into_iter()
            .map(|param| match param.child_by_field_name("type") {
                Some(ty) => self.read_node(ty),
                None => self.read_node(param),
            })
            .collect()
    }

    /// Flatten `expression_list` (or a lone expression) into nodes.
    fn read_list(&self, node: TsNode) -> Result<Vec<Node>, ReadError> {
        if node.kind() == "expression_list" {
            self.named_children(node)
                .into_iter()
                .map(|child| self.read_node(child))
                .collect()
        } else {
            Ok(vec![self.read_node(node)?])
        }
    }

    fn read_block(&self, node: TsNode) -> Result<Vec<Node>, ReadError> {
        let mut stmts = Vec::new();
        for child in self.named_children(node) {
            if child.kind() == "statement_list" {
                stmts.extend(self.read_block(child)?);
            } else if child.kind() != "empty_statement" {
                stmts.push(self.read_node(child)?);
            }
        }
        Ok(stmts)
    }

    /// Lower one node. Deeply nested expressions recurse once per level, so
    /// every level runs with at least `RED_ZONE` bytes of stack left.
    fn read_node(&self, node: TsNode) -> Result<Node, ReadError> {
        stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || self.lower_node(node))
    }

    fn lower_node(&self, node: TsNode) -> Result<Node, ReadError> {
        let pos = self.pos(node);
        let kind = match node.kind() {
            "identifier" | "type_identifier" | "field_identifier" | "package_identifier"
            | "blank_identifier" | "true" | "false" | "nil" | "iota" => {
                NodeKind::Ident(self.ident(node))
            }

            "selector_expression" => NodeKind::Selector {
                x: Box::new(self.read_node(self.field(node, "operand")?)?),
                sel: self.ident(self.field(node, "field")?),
            },
            "qualified_type" => NodeKind::Selector {
                x: Box::new(self.read_node(self.field(node, "package")?)?),
                sel: self.ident(self.field(node, "name")?),
            },
            "pointer_type" => {
                let inner = self
                    .named_children(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| ReadError::Parse("pointer_type has no element".into()))?;
                NodeKind::Star {
                    x: Box::new(self.read_node(inner)?),
                }
            }
            "function_type" => return self.read_func_type(node),

            "block" => NodeKind::Block {
                stmts: self.read_block(node)?,
            },
            "expression_statement" => {
                let inner = self.named_children(node).into_iter().next().ok_or_else(|| {
                    ReadError::Parse("expression_statement has no child".into())
                })?;
                NodeKind::ExprStmt {
                    x: Box::new(self.read_node(inner)?),
                }
            }
            "return_statement" => {
                let results = match self.named_children(node).into_iter().next() {
                    Some(list) => self.read_list(list)?,
                    None => Vec::new(),
                };
                NodeKind::Return { results }
            }
            "defer_statement" => {
                let call = self
                    .named_children(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| ReadError::Parse("defer_statement has no call".into()))?;
                NodeKind::DeferStmt {
                    call: Box::new(self.read_node(call)?),
                }
            }
            // The initializer of `if init; cond {}` is not modelled.
            "if_statement" => NodeKind::If {
                cond: Box::new(self.read_node(self.field(node, "condition")?)?),
                body: Box::new(self.read_node(self.field(node, "consequence")?)?),
                els: node
                    .child_by_field_name("alternative")
                    .map(|alt| self.read_node(alt).map(Box::new))
                    .transpose()?,
            },
            "assignment_statement" | "short_var_declaration" => {
                let tok = match node.child_by_field_name("operator") {
                    Some(op) => self.node_text(op).to_string(),
                    None => ":=".to_string(),
                };
                NodeKind::Assign {
                    lhs: self.read_list(self.field(node, "left")?)?,
                    tok,
                    rhs: self.read_list(self.field(node, "right")?)?,
                }
            }

            "call_expression" => {
                let args = match node.child_by_field_name("arguments") {
                    Some(list) => self
                        .named_children(list)
                        .into_iter()
                        .map(|arg| self.read_node(arg))
                        .collect::<Result<Vec<_>, _>>()?,
                    None => Vec::new(),
                };
                NodeKind::Call {
                    fun: Box::new(self.read_node(self.field(node, "function")?)?),
                    args,
                }
            }
            "binary_expression" => NodeKind::Binary {
                x: Box::new(self.read_node(self.field(node, "left")?)?),
                op: self.node_text(self.field(node, "operator")?).to_string(),
                y: Box::new(self.read_node(self.field(node, "right")?)?),
            },
            "unary_expression" => {
                let op = self.node_text(self.field(node, "operator")?).to_string();
                let x = Box::new(self.read_node(self.field(node, "operand")?)?);
                // go/ast parses `*x` as a StarExpr, not a UnaryExpr.
                if op == "*" {
                    NodeKind::Star { x }
                } else {
                    NodeKind::Unary { op, x }
                }
            }

            "int_literal" => self.basic_lit(node, LitKind::Int),
            "float_literal" => self.basic_lit(node, LitKind::Float),
            "imaginary_literal" => self.basic_lit(node, LitKind::Imag),
            "rune_literal" => self.basic_lit(node, LitKind::Char),
            "interpreted_string_literal" | "raw_string_literal" => {
                self.basic_lit(node, LitKind::String)
            }
            "composite_literal" => NodeKind::CompositeLit {
                ty: node
                    .child_by_field_name("type")
                    .map(|t| self.read_node(t).map(Box::new))
                    .transpose()?,
                elts: match node.child_by_field_name("body") {
                    Some(body) => self
                        .named_children(body)
                        .into_iter()
                        .map(|elt| self.read_node(elt))
                        .collect::<Result<Vec<_>, _>>()?,
                    None => Vec::new(),
                },
            },

            "function_declaration" | "method_declaration" => self.read_func_decl(node)?,

            kind => NodeKind::Unsupported {
                kind: go_ast_name(kind).to_string(),
            },
        };
        Ok(Node { pos, kind })
    }

    fn basic_lit(&self, node: TsNode, kind: LitKind) -> NodeKind {
        NodeKind::BasicLit(BasicLit {
            pos: self.pos(node),
            kind,
            value: self.node_text(node).to_string(),
        })
    }
}

/// Map a tree-sitter kind without a rule to its `go/ast` spelling.
fn go_ast_name(kind: &str) -> &str {
    match kind {
        "parenthesized_expression" | "parenthesized_type" => "ParenExpr",
        "index_expression" | "generic_type" => "IndexExpr",
        "slice_expression" => "SliceExpr",
        "type_assertion_expression" => "TypeAssertExpr",
        "type_conversion_expression" => "CallExpr(Conversion)",
        "func_literal" => "FuncLit",
        "keyed_element" | "literal_element" => "KeyValueExpr",
        "array_type" | "slice_type" | "implicit_length_array_type" => "ArrayType",
        "map_type" => "MapType",
        "channel_type" => "ChanType",
        "struct_type" => "StructType",
        "interface_type" => "InterfaceType",
        "variadic_argument" => "Ellipsis",
        "for_statement" => "ForStmt",
        "expression_switch_statement" => "SwitchStmt",
        "type_switch_statement" => "TypeSwitchStmt",
        "select_statement" => "SelectStmt",
        "go_statement" => "GoStmt",
        "send_statement" => "SendStmt",
        "inc_statement" | "dec_statement" => "IncDecStmt",
        "labeled_statement" => "LabeledStmt",
        "break_statement" | "continue_statement" | "goto_statement"
        | "fallthrough_statement" => "BranchStmt",
        "const_declaration" | "var_declaration" | "type_declaration" => "DeclStmt",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name() {
        let file = read_go("package demo\n").unwrap();
        assert_eq!(file.package.name, "demo");
        assert!(file.decls.is_empty());
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            read_go("package demo\nfunc {"),
            Err(ReadError::Parse(_))
        ));
    }

    #[test]
    fn test_go_ast_names() {
        assert_eq!(go_ast_name("for_statement"), "ForStmt");
        assert_eq!(go_ast_name("something_new"), "something_new");
    }
}
