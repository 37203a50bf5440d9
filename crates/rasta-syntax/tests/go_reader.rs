//! Go reader lowering tests.
//!
//! These check that tree-sitter output is lowered into the `go/ast`-shaped
//! tree the translator expects.

use rasta_syntax::{DeclToken, File, LitKind, Node, NodeKind, read_go};

fn parse(code: &str) -> File {
    read_go(code).expect("parse failed")
}

fn only_decl(file: File) -> Node {
    assert_eq!(file.decls.len(), 1, "expected one declaration");
    file.decls.into_iter().next().unwrap()
}

fn func_body(code: &str) -> Vec<Node> {
    match only_decl(parse(code)).kind {
        NodeKind::FuncDecl {
            body: Some(body), ..
        } => match body.kind {
            NodeKind::Block { stmts } => stmts,
            other => panic!("expected block, got {other:?}"),
        },
        other => panic!("expected function, got {other:?}"),
    }
}

#[test]
fn package_and_positions() {
    let file = parse("package demo\n\nfunc foo() {}\n");
    assert_eq!(file.package.name, "demo");
    let decl = only_decl(file);
    assert_eq!(decl.pos.line, 3);
    assert_eq!(decl.pos.column, 1);
}

#[test]
fn import_group() {
    let decl = only_decl(parse("package demo\nimport (\n\t\"fmt\"\n\tx \"os\"\n)\n"));
    let NodeKind::GenDecl { tok, specs } = decl.kind else {
        panic!("expected GenDecl");
    };
    assert_eq!(tok, DeclToken::Import);
    assert_eq!(specs.len(), 2);

    match &specs[0].kind {
        NodeKind::ImportSpec {
            name: None,
            path: Some(path),
        } => assert_eq!(path.value, "\"fmt\""),
        other => panic!("unexpected spec {other:?}"),
    }
    match &specs[1].kind {
        NodeKind::ImportSpec {
            name: Some(name),
            path: Some(path),
        } => {
            assert_eq!(name.name, "x");
            assert_eq!(path.value, "\"os\"");
        }
        other => panic!("unexpected spec {other:?}"),
    }
}

#[test]
fn type_spec_with_qualified_type() {
    let decl = only_decl(parse("package demo\ntype Action C.LLVMAction\n"));
    let NodeKind::GenDecl { tok, specs } = decl.kind else {
        panic!("expected GenDecl");
    };
    assert_eq!(tok, DeclToken::Type);
    match &specs[0].kind {
        NodeKind::TypeSpec { name, ty } => {
            assert_eq!(name.name, "Action");
            match &ty.kind {
                NodeKind::Selector { x, sel } => {
                    assert!(matches!(&x.kind, NodeKind::Ident(id) if id.name == "C"));
                    assert_eq!(sel.name, "LLVMAction");
                }
                other => panic!("expected selector, got {other:?}"),
            }
        }
        other => panic!("unexpected spec {other:?}"),
    }
}

#[test]
fn const_group_keeps_every_spec() {
    let decl = only_decl(parse(
        "package demo\nconst (\n\tA Action = C.Abort\n\tB Action = C.Print\n)\n",
    ));
    let NodeKind::GenDecl { tok, specs } = decl.kind else {
        panic!("expected GenDecl");
    };
    assert_eq!(tok, DeclToken::Const);
    assert_eq!(specs.len(), 2);
    match &specs[1].kind {
        NodeKind::ValueSpec { names, ty, values } => {
            assert_eq!(names.len(), 1);
            assert_eq!(names[0].name, "B");
            assert!(ty.is_some());
            assert_eq!(values.len(), 1);
        }
        other => panic!("unexpected spec {other:?}"),
    }
}

#[test]
fn var_spec_with_two_names() {
    let decl = only_decl(parse("package demo\nvar a, b int\n"));
    let NodeKind::GenDecl { specs, .. } = decl.kind else {
        panic!("expected GenDecl");
    };
    match &specs[0].kind {
        NodeKind::ValueSpec { names, .. } => {
            let names: Vec<_> = names.iter().map(|n| n.name.as_str()).collect();
            assert_eq!(names, ["a", "b"]);
        }
        other => panic!("unexpected spec {other:?}"),
    }
}

#[test]
fn function_body_statements() {
    let stmts = func_body("package demo\nfunc foo() int {\n\tbar(1, x)\n\treturn 5\n}\n");
    assert_eq!(stmts.len(), 2);

    match &stmts[0].kind {
        NodeKind::ExprStmt { x } => match &x.kind {
            NodeKind::Call { fun, args } => {
                assert!(matches!(&fun.kind, NodeKind::Ident(id) if id.name == "bar"));
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call, got {other:?}"),
        },
        other => panic!("expected expression statement, got {other:?}"),
    }

    match &stmts[1].kind {
        NodeKind::Return { results } => match &results[..] {
            [Node {
                kind: NodeKind::BasicLit(lit),
                ..
            }] => {
                assert_eq!(lit.kind, LitKind::Int);
                assert_eq!(lit.value, "5");
            }
            other => panic!("unexpected results {other:?}"),
        },
        other => panic!("expected return, got {other:?}"),
    }
}

#[test]
fn assignment_and_defer() {
    let stmts = func_body("package demo\nfunc foo() {\n\ta, b = 1, 2\n\tdefer close(c)\n}\n");
    match &stmts[0].kind {
        NodeKind::Assign { lhs, tok, rhs } => {
            assert_eq!(lhs.len(), 2);
            assert_eq!(tok, "=");
            assert_eq!(rhs.len(), 2);
        }
        other => panic!("expected assignment, got {other:?}"),
    }
    assert!(matches!(&stmts[1].kind, NodeKind::DeferStmt { call } if matches!(call.kind, NodeKind::Call { .. })));
}

#[test]
fn star_and_unary() {
    let stmts = func_body("package demo\nfunc foo() {\n\tx = *p\n\ty = -z\n}\n");
    match &stmts[0].kind {
        NodeKind::Assign { rhs, .. } => assert!(matches!(rhs[0].kind, NodeKind::Star { .. })),
        other => panic!("expected assignment, got {other:?}"),
    }
    match &stmts[1].kind {
        NodeKind::Assign { rhs, .. } => {
            assert!(matches!(&rhs[0].kind, NodeKind::Unary { op, .. } if op == "-"))
        }
        other => panic!("expected assignment, got {other:?}"),
    }
}

#[test]
fn if_else_chain() {
    let stmts = func_body(
        "package demo\nfunc foo() {\n\tif a < b {\n\t\tbar()\n\t} else {\n\t\tbaz()\n\t}\n}\n",
    );
    match &stmts[0].kind {
        NodeKind::If { cond, els, .. } => {
            assert!(matches!(&cond.kind, NodeKind::Binary { op, .. } if op == "<"));
            assert!(matches!(
                els.as_deref().map(|n| &n.kind),
                Some(NodeKind::Block { .. })
            ));
        }
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn unmodelled_constructs_are_kept() {
    let stmts = func_body("package demo\nfunc foo() {\n\tfor {\n\t}\n}\n");
    assert_eq!(stmts[0].kind_name(), "ForStmt");
    assert!(matches!(stmts[0].kind, NodeKind::Unsupported { .. }));
}

#[test]
fn if_initializer_is_dropped() {
    let stmts = func_body("package demo\nfunc foo() {\n\tif x := f(); x > 0 {\n\t\treturn 1\n\t}\n}\n");
    match &stmts[0].kind {
        NodeKind::If { cond, els, .. } => {
            assert!(matches!(&cond.kind, NodeKind::Binary { op, .. } if op == ">"));
            assert!(els.is_none());
        }
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn long_sum_is_read_without_overflow() {
    let terms: Vec<String> = (0..1000).map(|i| format!("a{i}")).collect();
    let code = format!("package demo\nfunc foo() {{\n\tx = {}\n}}\n", terms.join(" + "));
    let stmts = func_body(&code);
    let NodeKind::Assign { rhs, .. } = &stmts[0].kind else {
        panic!("expected assignment");
    };

    // Left-associative: walk down the left spine.
    let mut depth = 0;
    let mut node = &rhs[0];
    while let NodeKind::Binary { x, .. } = &node.kind {
        depth += 1;
        node = x;
    }
    assert_eq!(depth, 999);
    assert!(matches!(&node.kind, NodeKind::Ident(id) if id.name == "a0"));
}
