//! Node classification: which head, which arguments, in which order.
//!
//! [`classify`] looks at exactly one node and returns a [`Rule`]. Rules never
//! convert children themselves; they list them, in source order, for the
//! evaluator to fan out. The few shapes that depend on a converted child
//! (field access, calls) are finished by [`select`] and [`call`] once the
//! children are available.
//!
//! | Go node            | Expression                                    |
//! |--------------------|-----------------------------------------------|
//! | `x`                | `x`                                           |
//! | `C.f` / `x.f`      | `Foreign[f]` / `GetField[x, f]`               |
//! | `*T`               | `Reference[T]`                                |
//! | `type N T`         | `Type[N, T]`                                  |
//! | `{ s1; s2 }`       | `CompoundExpression[s1, s2]`                  |
//! | `func(...)`        | `List[]`                                      |
//! | `func f() {...}`   | `Function[f, List[], body]`                   |
//! | `a T`              | `Value[a, T]`                                 |
//! | `import "p"`       | `Import["p"]`                                 |
//! | `defer f()`        | `Defer[f[]]`                                  |
//! | `f(a, b)`          | `f[a, b]`                                     |
//! | `a = b`            | `Set[a, b]`, or `Set[List[..], List[..]]`     |
//! | `a + b` / `-a`     | `BinaryExpr["+", a, b]` / `UnaryOperation["-", a]` |
//! | `if c {..} else {..}` | `If[c, then, else]`                        |
//! | `return r`         | `BinaryExpr[r]`, or `BinaryExpr[List[..]]`    |

use crate::error::ConvertError;
use crate::expr::{Expression, Symbol};
use rasta_syntax::{BasicLit, DeclToken, File, Ident, LitKind, Node, NodeKind, Pos};
use tracing::trace;

/// A child slot of a rule.
pub enum Arg {
    /// A subtree still to be converted.
    Node(Node),
    /// A value known without converting anything.
    Ready(Expression),
    /// A synthetic normal whose arguments are themselves slots.
    Apply(Symbol, Vec<Arg>),
}

impl From<Node> for Arg {
    fn from(node: Node) -> Self {
        Arg::Node(node)
    }
}

impl From<Ident> for Arg {
    fn from(ident: Ident) -> Self {
        Arg::Node(ident.into())
    }
}

/// How to convert one node.
pub enum Rule {
    /// Already fully converted.
    Atom(Expression),
    /// `head[args...]`.
    Apply(Symbol, Vec<Arg>),
    /// Field access, finished by [`select`].
    Selector { pos: Pos, x: Node, sel: Node },
    /// Call, finished by [`call`].
    Call { pos: Pos, fun: Node, args: Vec<Node> },
    /// Declaration group: one expression per spec.
    Group { pos: Pos, specs: Vec<Arg> },
    /// Compilation unit.
    Package(Package),
}

/// A compilation unit split into its sentinels and declarations.
pub struct Package {
    pub begin: Expression,
    pub decls: Vec<Node>,
    pub end: Expression,
}

/// Classify a single node.
pub fn classify(node: Node) -> Result<Rule, ConvertError> {
    let pos = node.pos;
    let rule = match node.kind {
        NodeKind::File(file) => Rule::Package(package(file)),

        NodeKind::Ident(ident) => Rule::Atom(Symbol::system(ident.name).at(ident.pos).into()),

        NodeKind::Selector { x, sel } => Rule::Selector {
            pos,
            x: *x,
            sel: sel.into(),
        },

        NodeKind::Star { x } => Rule::Apply(rasta("Reference", pos), vec![(*x).into()]),

        NodeKind::TypeSpec { name, ty } => {
            Rule::Apply(rasta("Type", pos), vec![name.into(), (*ty).into()])
        }

        NodeKind::Block { stmts } => Rule::Apply(
            system("CompoundExpression", pos),
            stmts.into_iter().map(Arg::Node).collect(),
        ),

        // Parameters are not modelled.
        NodeKind::FuncType { .. } => Rule::Atom(system("List", pos).apply(Vec::new())),

        NodeKind::FuncDecl { name, ty, body } => Rule::Apply(
            rasta("Function", pos),
            vec![name.into(), (*ty).into(), or_null(body, pos)],
        ),

        NodeKind::ValueSpec { mut names, ty, .. } => {
            if names.len() != 1 {
                return Err(ConvertError::UnsupportedArity {
                    count: names.len(),
                    pos,
                });
            }
            let name = names.remove(0);
            Rule::Apply(rasta("Value", pos), vec![name.into(), or_null(ty, pos)])
        }

        NodeKind::ImportSpec { name, path } => {
            Rule::Atom(rasta("Import", pos).apply(vec![import_target(name, path, pos)]))
        }

        NodeKind::GenDecl { tok, specs } => Rule::Group {
            pos,
            specs: group(tok, specs),
        },

        NodeKind::DeferStmt { call } => Rule::Apply(rasta("Defer", pos), vec![(*call).into()]),

        NodeKind::Call { fun, args } => Rule::Call {
            pos,
            fun: *fun,
            args,
        },

        NodeKind::Assign { lhs, rhs, .. } => {
            let args = if lhs.len() == 1 && rhs.len() == 1 {
                lhs.into_iter().chain(rhs).map(Arg::Node).collect()
            } else {
                vec![list(lhs, pos), list(rhs, pos)]
            };
            Rule::Apply(system("Set", pos), args)
        }

        NodeKind::Binary { x, op, y } => Rule::Apply(
            rasta("BinaryExpr", pos),
            vec![
                Arg::Ready(Expression::string(op).at(pos)),
                (*x).into(),
                (*y).into(),
            ],
        ),

        NodeKind::Unary { op, x } => Rule::Apply(
            rasta("UnaryOperation", pos),
            vec![Arg::Ready(Expression::string(op).at(pos)), (*x).into()],
        ),

        NodeKind::If { cond, body, els } => Rule::Apply(
            system("If", pos),
            vec![(*cond).into(), (*body).into(), or_null(els, pos)],
        ),

        // Placeholder: the inner expression is not converted.
        NodeKind::ExprStmt { .. } => Rule::Atom(rasta("ExprStmt", pos).into()),

        NodeKind::Return { mut results } => {
            let arg = if results.len() == 1 {
                Arg::Node(results.remove(0))
            } else {
                list(results, pos)
            };
            Rule::Apply(rasta("BinaryExpr", pos), vec![arg])
        }

        NodeKind::BasicLit(lit) => Rule::Atom(literal(lit)?),

        // Placeholder: type and elements are not converted.
        NodeKind::CompositeLit { .. } => Rule::Atom(rasta("CompositeLit", pos).into()),

        NodeKind::Unsupported { kind } => {
            return Err(ConvertError::UnsupportedNodeKind { kind, pos });
        }
    };
    Ok(rule)
}

/// Split a compilation unit into `BeginPackage["name"]`, its declarations and
/// `EndPackage[]`.
pub fn package(file: File) -> Package {
    let File {
        pos,
        package,
        decls,
    } = file;
    Package {
        begin: system("BeginPackage", pos)
            .apply(vec![Expression::string(package.name).at(package.pos)]),
        decls,
        end: system("EndPackage", pos).apply(Vec::new()),
    }
}

/// Finish a field access once its base and selector are converted.
///
/// A base that renders as `C` is the cgo pseudo-package, so the access refers
/// to a foreign name.
pub fn select(pos: Pos, x: Expression, sel: Expression) -> Expression {
    let is_cgo = x.as_symbol().is_some_and(|sym| sym.to_string() == "C");
    if is_cgo {
        rasta("Foreign", pos).apply(vec![sel])
    } else {
        rasta("GetField", pos).apply(vec![x, sel])
    }
}

/// Finish a call once callee and arguments are converted.
///
/// A symbol callee becomes the head. Any other callee (a field access, say)
/// cannot be a head, so the call is spelled `Call[callee, args...]`.
pub fn call(pos: Pos, fun: Expression, args: Vec<Expression>) -> Expression {
    match fun {
        Expression::Symbol(head) => head.at(pos).apply(args),
        callee => {
            let mut all = Vec::with_capacity(args.len() + 1);
            all.push(callee);
            all.extend(args);
            rasta("Call", pos).apply(all)
        }
    }
}

fn group(tok: DeclToken, specs: Vec<Node>) -> Vec<Arg> {
    trace!(tok = tok.as_str(), specs = specs.len(), "declaration group");
    let wrapper = match tok {
        DeclToken::Const => Some("DeclareConstant"),
        DeclToken::Type => Some("DeclareType"),
        DeclToken::Var => Some("Declare"),
        DeclToken::Import => None,
    };
    specs
        .into_iter()
        .map(|spec| match wrapper {
            Some(name) => Arg::Apply(rasta(name, spec.pos), vec![Arg::Node(spec)]),
            None => Arg::Node(spec),
        })
        .collect()
}

fn import_target(name: Option<Ident>, path: Option<BasicLit>, pos: Pos) -> Expression {
    match (name, path) {
        (_, Some(path)) => {
            Expression::string(path.value.trim_matches(|c| c == '"' || c == '`')).at(path.pos)
        }
        (Some(name), None) => Expression::string(name.name).at(name.pos),
        (None, None) => Expression::string("Empty").at(pos),
    }
}

fn literal(lit: BasicLit) -> Result<Expression, ConvertError> {
    match lit.kind {
        LitKind::Int => match parse_int(&lit.value) {
            Some(value) => Ok(Expression::integer(value).at(lit.pos)),
            None => Err(ConvertError::LiteralParseError {
                text: lit.value,
                pos: lit.pos,
            }),
        },
        LitKind::Float | LitKind::Imag | LitKind::Char | LitKind::String => {
            Ok(Expression::string("Unhandled literal").at(lit.pos))
        }
    }
}

/// Parse a Go integer literal: decimal, `0x`, `0o`, `0b`, legacy leading-zero
/// octal, with `_` digit separators.
pub fn parse_int(text: &str) -> Option<i64> {
    if text.starts_with('_') || text.ends_with('_') {
        return None;
    }
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    if body.is_empty() || body.starts_with(['+', '-']) {
        return None;
    }
    i64::from_str_radix(body, radix).ok()
}

fn or_null(node: Option<Box<Node>>, pos: Pos) -> Arg {
    match node {
        Some(node) => Arg::Node(*node),
        None => Arg::Ready(Expression::null().at(pos)),
    }
}

fn list(nodes: Vec<Node>, pos: Pos) -> Arg {
    Arg::Apply(
        system("List", pos),
        nodes.into_iter().map(Arg::Node).collect(),
    )
}

fn system(name: &str, pos: Pos) -> Symbol {
    Symbol::system(name).at(pos)
}

fn rasta(name: &str, pos: Pos) -> Symbol {
    Symbol::rasta(name).at(pos)
}
