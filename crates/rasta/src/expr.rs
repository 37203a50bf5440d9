//! Symbolic expressions.
//!
//! Every value the translator produces is either an atom (`Symbol`, `String`,
//! `Integer`, `Real`) or a [`Normal`] expression: a symbol head applied to an
//! ordered argument list. Expressions are immutable once built; they carry the
//! position of the source node they came from, but positions never take part
//! in equality.

use rasta_syntax::Pos;
use std::hash::{Hash, Hasher};

/// Context of built-in vocabulary.
pub const SYSTEM: &str = "System";

/// Context of vocabulary introduced by the translator.
pub const RASTA: &str = "Rasta";

/// A namespaced identifier.
///
/// Two symbols are equal iff their context and name match.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub context: String,
    pub name: String,
    pub pos: Pos,
}

impl Symbol {
    pub fn new(context: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            name: name.into(),
            pos: Pos::default(),
        }
    }

    pub fn system(name: impl Into<String>) -> Self {
        Self::new(SYSTEM, name)
    }

    pub fn rasta(name: impl Into<String>) -> Self {
        Self::new(RASTA, name)
    }

    pub fn at(mut self, pos: Pos) -> Self {
        self.pos = pos;
        self
    }

    /// Apply this symbol as the head of a normal expression.
    pub fn apply(self, args: Vec<Expression>) -> Expression {
        let pos = self.pos;
        Expression::Normal(Normal {
            head: self,
            args,
            pos,
        })
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.context == other.context && self.name == other.name
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.context.hash(state);
        self.name.hash(state);
    }
}

/// A head applied to ordered arguments.
///
/// The head is a [`Symbol`] by construction, so a composite head cannot be
/// represented. Argument order is source order.
#[derive(Debug, Clone)]
pub struct Normal {
    pub head: Symbol,
    pub args: Vec<Expression>,
    pub pos: Pos,
}

impl PartialEq for Normal {
    fn eq(&self, other: &Self) -> bool {
        self.head == other.head && self.args == other.args
    }
}

#[derive(Debug, Clone)]
pub enum Expression {
    Symbol(Symbol),
    String { value: String, pos: Pos },
    Integer { value: i64, pos: Pos },
    Real { value: f64, pos: Pos },
    Normal(Normal),
}

impl Expression {
    pub fn string(value: impl Into<String>) -> Self {
        Expression::String {
            value: value.into(),
            pos: Pos::default(),
        }
    }

    pub fn integer(value: i64) -> Self {
        Expression::Integer {
            value,
            pos: Pos::default(),
        }
    }

    pub fn real(value: f64) -> Self {
        Expression::Real {
            value,
            pos: Pos::default(),
        }
    }

    /// `System`Null`, the stand-in for an absent child.
    pub fn null() -> Self {
        Expression::Symbol(Symbol::system("Null"))
    }

    pub fn at(self, pos: Pos) -> Self {
        match self {
            Expression::Symbol(sym) => Expression::Symbol(sym.at(pos)),
            Expression::String { value, .. } => Expression::String { value, pos },
            Expression::Integer { value, .. } => Expression::Integer { value, pos },
            Expression::Real { value, .. } => Expression::Real { value, pos },
            Expression::Normal(normal) => Expression::Normal(Normal { pos, ..normal }),
        }
    }

    /// The head symbol: the constructor for normals, the kind for atoms.
    pub fn head(&self) -> Symbol {
        match self {
            Expression::Symbol(_) => Symbol::system("Symbol"),
            Expression::String { .. } => Symbol::system("String"),
            Expression::Integer { .. } => Symbol::system("Integer"),
            Expression::Real { .. } => Symbol::system("Real"),
            Expression::Normal(normal) => normal.head.clone(),
        }
    }

    /// Argument count; always 0 for atoms.
    pub fn length(&self) -> usize {
        match self {
            Expression::Normal(normal) => normal.args.len(),
            _ => 0,
        }
    }

    pub fn pos(&self) -> Pos {
        match self {
            Expression::Symbol(sym) => sym.pos,
            Expression::String { pos, .. }
            | Expression::Integer { pos, .. }
            | Expression::Real { pos, .. } => *pos,
            Expression::Normal(normal) => normal.pos,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Expression::Symbol(sym) => Some(sym),
            _ => None,
        }
    }

    pub fn as_normal(&self) -> Option<&Normal> {
        match self {
            Expression::Normal(normal) => Some(normal),
            _ => None,
        }
    }

    /// Arguments of a normal expression; empty for atoms.
    pub fn args(&self) -> &[Expression] {
        match self {
            Expression::Normal(normal) => &normal.args,
            _ => &[],
        }
    }
}

impl From<Symbol> for Expression {
    fn from(sym: Symbol) -> Self {
        Expression::Symbol(sym)
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expression::Symbol(a), Expression::Symbol(b)) => a == b,
            (Expression::String { value: a, .. }, Expression::String { value: b, .. }) => a == b,
            (Expression::Integer { value: a, .. }, Expression::Integer { value: b, .. }) => a == b,
            (Expression::Real { value: a, .. }, Expression::Real { value: b, .. }) => a == b,
            (Expression::Normal(a), Expression::Normal(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_equality_ignores_position() {
        let a = Symbol::system("x").at(Pos::new(3, 1, 4));
        let b = Symbol::system("x");
        assert_eq!(a, b);
        assert_ne!(Symbol::system("x"), Symbol::rasta("x"));
    }

    #[test]
    fn test_atom_heads() {
        assert_eq!(Expression::string("s").head(), Symbol::system("String"));
        assert_eq!(Expression::integer(1).head(), Symbol::system("Integer"));
        assert_eq!(Expression::real(1.5).head(), Symbol::system("Real"));
        assert_eq!(Expression::null().head(), Symbol::system("Symbol"));
        assert_eq!(Expression::integer(1).length(), 0);
    }

    #[test]
    fn test_normal_head_and_length() {
        let expr = Symbol::system("List").apply(vec![Expression::integer(1), Expression::null()]);
        assert_eq!(expr.head(), Symbol::system("List"));
        assert_eq!(expr.length(), 2);
        assert_eq!(expr.args()[0], Expression::integer(1));
    }

    #[test]
    fn test_at_moves_position_onto_normal() {
        let pos = Pos::new(10, 2, 1);
        let expr = Symbol::system("List").apply(vec![]).at(pos);
        assert_eq!(expr.pos(), pos);
    }
}
