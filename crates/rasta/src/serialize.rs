//! Textual rendering of expressions.
//!
//! Normals render as `Head[arg, arg, ...]`, except a head whose text is
//! exactly `CompoundExpression`, which renders its arguments as a `;\n`
//! separated statement sequence. Symbols whose context is on the
//! [`ContextPath`] render bare; all others render as `Context`Name`.

use crate::expr::{Expression, RASTA, SYSTEM, Symbol};
use serde::Deserialize;
use std::fmt;

const COMPOUND_EXPRESSION: &str = "CompoundExpression";

/// Contexts whose symbols render without qualification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ContextPath(Vec<String>);

impl ContextPath {
    pub fn new<I, S>(contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(contexts.into_iter().map(Into::into).collect())
    }

    /// Only `System` renders bare.
    pub fn system_only() -> Self {
        Self::new([SYSTEM])
    }

    pub fn contains(&self, context: &str) -> bool {
        self.0.iter().any(|c| c == context)
    }
}

impl Default for ContextPath {
    fn default() -> Self {
        Self::new([SYSTEM, RASTA])
    }
}

/// Renders expressions into a string buffer.
pub struct Renderer<'a> {
    path: &'a ContextPath,
    output: String,
}

impl<'a> Renderer<'a> {
    pub fn new(path: &'a ContextPath) -> Self {
        Self {
            path,
            output: String::new(),
        }
    }

    /// Render one expression to text.
    pub fn render(path: &ContextPath, expr: &Expression) -> String {
        let mut renderer = Renderer::new(path);
        renderer.write_expr(expr);
        renderer.output
    }

    fn write_expr(&mut self, expr: &Expression) {
        stacker::maybe_grow(64 * 1024, 2 * 1024 * 1024, || self.write_expr_inner(expr));
    }

    fn write_expr_inner(&mut self, expr: &Expression) {
        match expr {
            Expression::Symbol(sym) => self.write_symbol(sym),
            Expression::String { value, .. } => self.write_string(value),
            Expression::Integer { value, .. } => self.output.push_str(&value.to_string()),
            Expression::Real { value, .. } => self.output.push_str(&format!("{value:?}")),
            Expression::Normal(normal) => {
                let head = Renderer::render_symbol(self.path, &normal.head);
                let separator = if head == COMPOUND_EXPRESSION {
                    ";\n"
                } else {
                    self.output.push_str(&head);
                    self.output.push('[');
                    ", "
                };
                for (i, arg) in normal.args.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(separator);
                    }
                    self.write_expr(arg);
                }
                if head != COMPOUND_EXPRESSION {
                    self.output.push(']');
                }
            }
        }
    }

    fn write_symbol(&mut self, sym: &Symbol) {
        if !self.path.contains(&sym.context) {
            self.output.push_str(&sym.context);
            self.output.push('`');
        }
        self.output.push_str(&sym.name);
    }

    fn write_string(&mut self, value: &str) {
        self.output.push('"');
        for c in value.chars() {
            match c {
                '"' => self.output.push_str("\\\""),
                '\\' => self.output.push_str("\\\\"),
                '\n' => self.output.push_str("\\n"),
                _ => self.output.push(c),
            }
        }
        self.output.push('"');
    }

    fn render_symbol(path: &ContextPath, sym: &Symbol) -> String {
        let mut renderer = Renderer::new(path);
        renderer.write_symbol(sym);
        renderer.output
    }
}

impl Expression {
    /// Render with an explicit context path.
    pub fn render(&self, path: &ContextPath) -> String {
        Renderer::render(path, self)
    }

    /// JSON array form: `["Head", arg, ...]` for normals, the rendered name
    /// for symbols, `{"string": ...}` for strings, and numbers as numbers.
    pub fn to_json(&self, path: &ContextPath) -> serde_json::Value {
        use serde_json::{Value, json};
        match self {
            Expression::Symbol(sym) => Value::String(Renderer::render_symbol(path, sym)),
            Expression::String { value, .. } => json!({ "string": value }),
            Expression::Integer { value, .. } => json!(value),
            Expression::Real { value, .. } => json!(value),
            Expression::Normal(normal) => stacker::maybe_grow(64 * 1024, 2 * 1024 * 1024, || {
                let mut items = Vec::with_capacity(normal.args.len() + 1);
                items.push(Value::String(Renderer::render_symbol(path, &normal.head)));
                items.extend(normal.args.iter().map(|arg| arg.to_json(path)));
                Value::Array(items)
            }),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&ContextPath::default()))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Renderer::render_symbol(&ContextPath::default(), self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Expression {
        Symbol::system(name).into()
    }

    #[test]
    fn test_symbol_qualification() {
        let system_only = ContextPath::system_only();
        assert_eq!(Expression::from(Symbol::system("x")).render(&system_only), "x");
        assert_eq!(
            Expression::from(Symbol::rasta("ExprStmt")).render(&system_only),
            "Rasta`ExprStmt"
        );
        assert_eq!(Symbol::rasta("ExprStmt").to_string(), "ExprStmt");
        assert_eq!(Symbol::new("Foo", "bar").to_string(), "Foo`bar");
    }

    #[test]
    fn test_normal_rendering() {
        let expr = Symbol::system("f").apply(vec![sym("a"), Expression::integer(5)]);
        assert_eq!(expr.to_string(), "f[a, 5]");
        assert_eq!(Symbol::system("EndPackage").apply(vec![]).to_string(), "EndPackage[]");
    }

    #[test]
    fn test_compound_expression_rendering() {
        let expr = Symbol::system("CompoundExpression").apply(vec![
            sym("a"),
            Symbol::system("f").apply(vec![sym("b")]),
        ]);
        assert_eq!(expr.to_string(), "a;\nf[b]");
    }

    #[test]
    fn test_compound_check_uses_rendered_head() {
        // Qualified, so the head text is not exactly `CompoundExpression`.
        let expr = Symbol::new("Other", "CompoundExpression").apply(vec![sym("a"), sym("b")]);
        assert_eq!(expr.to_string(), "Other`CompoundExpression[a, b]");
    }

    #[test]
    fn test_atoms() {
        assert_eq!(Expression::string("demo").to_string(), "\"demo\"");
        assert_eq!(Expression::string("a\"b").to_string(), "\"a\\\"b\"");
        assert_eq!(Expression::integer(-42).to_string(), "-42");
        assert_eq!(Expression::real(2.5).to_string(), "2.5");
        assert_eq!(Expression::real(5.0).to_string(), "5.0");
    }

    #[test]
    fn test_json_form() {
        let expr = Symbol::system("BeginPackage").apply(vec![Expression::string("demo")]);
        assert_eq!(
            expr.to_json(&ContextPath::default()),
            serde_json::json!(["BeginPackage", { "string": "demo" }])
        );
    }
}
