//! Owned Go syntax tree consumed by the translator.
//!
//! The tree mirrors the subset of `go/ast` the translator has rules for. Every
//! node owns its children, so a conversion can move a subtree into its own task
//! without sharing. Constructs outside the subset are kept as
//! [`NodeKind::Unsupported`] so that the translator decides what is fatal.

use serde::Serialize;
use std::fmt;

/// Source position: byte offset plus 1-based line and column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An identifier together with its position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ident {
    pub pos: Pos,
    pub name: String,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            pos: Pos::default(),
            name: name.into(),
        }
    }

    pub fn at(mut self, pos: Pos) -> Self {
        self.pos = pos;
        self
    }
}

impl From<Ident> for Node {
    fn from(ident: Ident) -> Self {
        Node {
            pos: ident.pos,
            kind: NodeKind::Ident(ident),
        }
    }
}

/// Literal token class, as in `go/token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    String,
}

/// A literal with its raw source text (quotes included for strings).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicLit {
    pub pos: Pos,
    pub kind: LitKind,
    pub value: String,
}

/// Keyword introducing a declaration group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclToken {
    Const,
    Type,
    Var,
    Import,
}

impl DeclToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclToken::Const => "const",
            DeclToken::Type => "type",
            DeclToken::Var => "var",
            DeclToken::Import => "import",
        }
    }
}

/// A compilation unit: package name plus ordered top-level declarations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct File {
    pub pos: Pos,
    pub package: Ident,
    pub decls: Vec<Node>,
}

impl File {
    pub fn new(package: impl Into<String>, decls: Vec<Node>) -> Self {
        Self {
            pos: Pos::default(),
            package: Ident::new(package),
            decls,
        }
    }
}

impl From<File> for Node {
    fn from(file: File) -> Self {
        Node {
            pos: file.pos,
            kind: NodeKind::File(file),
        }
    }
}

/// A positioned syntax node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub pos: Pos,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node")]
pub enum NodeKind {
    File(File),
    Ident(Ident),
    /// `x.sel`
    Selector {
        x: Box<Node>,
        sel: Ident,
    },
    /// `*x`, in type or expression position.
    Star {
        x: Box<Node>,
    },
    TypeSpec {
        name: Ident,
        ty: Box<Node>,
    },
    Block {
        stmts: Vec<Node>,
    },
    FuncType {
        params: Vec<Node>,
        results: Vec<Node>,
    },
    FuncDecl {
        name: Ident,
        ty: Box<Node>,
        body: Option<Box<Node>>,
    },
    ValueSpec {
        names: Vec<Ident>,
        ty: Option<Box<Node>>,
        values: Vec<Node>,
    },
    ImportSpec {
        name: Option<Ident>,
        path: Option<BasicLit>,
    },
    GenDecl {
        tok: DeclToken,
        specs: Vec<Node>,
    },
    DeferStmt {
        call: Box<Node>,
    },
    Call {
        fun: Box<Node>,
        args: Vec<Node>,
    },
    Assign {
        lhs: Vec<Node>,
        tok: String,
        rhs: Vec<Node>,
    },
    Binary {
        x: Box<Node>,
        op: String,
        y: Box<Node>,
    },
    Unary {
        op: String,
        x: Box<Node>,
    },
    If {
        cond: Box<Node>,
        body: Box<Node>,
        els: Option<Box<Node>>,
    },
    ExprStmt {
        x: Box<Node>,
    },
    Return {
        results: Vec<Node>,
    },
    BasicLit(BasicLit),
    CompositeLit {
        ty: Option<Box<Node>>,
        elts: Vec<Node>,
    },
    /// A construct the front-end recognised but the subset does not model.
    Unsupported {
        kind: String,
    },
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            pos: Pos::default(),
            kind,
        }
    }

    pub fn at(mut self, pos: Pos) -> Self {
        self.pos = pos;
        self
    }

    /// Name of the node kind as `go/ast` spells it.
    pub fn kind_name(&self) -> &str {
        match &self.kind {
            NodeKind::File(_) => "File",
            NodeKind::Ident(_) => "Ident",
            NodeKind::Selector { .. } => "SelectorExpr",
            NodeKind::Star { .. } => "StarExpr",
            NodeKind::TypeSpec { .. } => "TypeSpec",
            NodeKind::Block { .. } => "BlockStmt",
            NodeKind::FuncType { .. } => "FuncType",
            NodeKind::FuncDecl { .. } => "FuncDecl",
            NodeKind::ValueSpec { .. } => "ValueSpec",
            NodeKind::ImportSpec { .. } => "ImportSpec",
            NodeKind::GenDecl { .. } => "GenDecl",
            NodeKind::DeferStmt { .. } => "DeferStmt",
            NodeKind::Call { .. } => "CallExpr",
            NodeKind::Assign { .. } => "AssignStmt",
            NodeKind::Binary { .. } => "BinaryExpr",
            NodeKind::Unary { .. } => "UnaryExpr",
            NodeKind::If { .. } => "IfStmt",
            NodeKind::ExprStmt { .. } => "ExprStmt",
            NodeKind::Return { .. } => "ReturnStmt",
            NodeKind::BasicLit(_) => "BasicLit",
            NodeKind::CompositeLit { .. } => "CompositeLit",
            NodeKind::Unsupported { kind } => kind,
        }
    }

    // Fixture constructors. Positions default to zero; chain `.at(pos)` when
    // a test cares about them.

    pub fn ident(name: impl Into<String>) -> Self {
        Ident::new(name).into()
    }

    pub fn selector(x: Node, sel: impl Into<String>) -> Self {
        Self::new(NodeKind::Selector {
            x: Box::new(x),
            sel: Ident::new(sel),
        })
    }

    pub fn star(x: Node) -> Self {
        Self::new(NodeKind::Star { x: Box::new(x) })
    }

    pub fn type_spec(name: impl Into<String>, ty: Node) -> Self {
        Self::new(NodeKind::TypeSpec {
            name: Ident::new(name),
            ty: Box::new(ty),
        })
    }

    pub fn block(stmts: Vec<Node>) -> Self {
        Self::new(NodeKind::Block { stmts })
    }

    pub fn func_type() -> Self {
        Self::new(NodeKind::FuncType {
            params: Vec::new(),
            results: Vec::new(),
        })
    }

    pub fn func_decl(name: impl Into<String>, body: Option<Node>) -> Self {
        Self::new(NodeKind::FuncDecl {
            name: Ident::new(name),
            ty: Box::new(Self::func_type()),
            body: body.map(Box::new),
        })
    }

    pub fn value_spec(names: &[&str], ty: Option<Node>, values: Vec<Node>) -> Self {
        Self::new(NodeKind::ValueSpec {
            names: names.iter().map(|n| Ident::new(*n)).collect(),
            ty: ty.map(Box::new),
            values,
        })
    }

    pub fn import_spec(name: Option<&str>, path: Option<&str>) -> Self {
        Self::new(NodeKind::ImportSpec {
            name: name.map(Ident::new),
            path: path.map(|p| BasicLit {
                pos: Pos::default(),
                kind: LitKind::String,
                value: format!("\"{p}\""),
            }),
        })
    }

    pub fn gen_decl(tok: DeclToken, specs: Vec<Node>) -> Self {
        Self::new(NodeKind::GenDecl { tok, specs })
    }

    pub fn defer(call: Node) -> Self {
        Self::new(NodeKind::DeferStmt {
            call: Box::new(call),
        })
    }

    pub fn call(fun: Node, args: Vec<Node>) -> Self {
        Self::new(NodeKind::Call {
            fun: Box::new(fun),
            args,
        })
    }

    pub fn assign(lhs: Vec<Node>, tok: impl Into<String>, rhs: Vec<Node>) -> Self {
        Self::new(NodeKind::Assign {
            lhs,
            tok: tok.into(),
            rhs,
        })
    }

    pub fn binary(x: Node, op: impl Into<String>, y: Node) -> Self {
        Self::new(NodeKind::Binary {
            x: Box::new(x),
            op: op.into(),
            y: Box::new(y),
        })
    }

    pub fn unary(op: impl Into<String>, x: Node) -> Self {
        Self::new(NodeKind::Unary {
            op: op.into(),
            x: Box::new(x),
        })
    }

    pub fn if_stmt(cond: Node, body: Node, els: Option<Node>) -> Self {
        Self::new(NodeKind::If {
            cond: Box::new(cond),
            body: Box::new(body),
            els: els.map(Box::new),
        })
    }

    pub fn expr_stmt(x: Node) -> Self {
        Self::new(NodeKind::ExprStmt { x: Box::new(x) })
    }

    pub fn ret(results: Vec<Node>) -> Self {
        Self::new(NodeKind::Return { results })
    }

    pub fn lit(kind: LitKind, value: impl Into<String>) -> Self {
        Self::new(NodeKind::BasicLit(BasicLit {
            pos: Pos::default(),
            kind,
            value: value.into(),
        }))
    }

    pub fn int(value: impl Into<String>) -> Self {
        Self::lit(LitKind::Int, value)
    }

    pub fn composite_lit(ty: Option<Node>, elts: Vec<Node>) -> Self {
        Self::new(NodeKind::CompositeLit {
            ty: ty.map(Box::new),
            elts,
        })
    }

    pub fn unsupported(kind: impl Into<String>) -> Self {
        Self::new(NodeKind::Unsupported { kind: kind.into() })
    }
}
