//! Argument and declaration order must survive arbitrary completion order.
//!
//! Every node conversion is delayed by a pseudo-random few milliseconds so
//! that children finish out of order.

use rasta::{EvalOptions, Evaluator, StreamDriver};
use rasta::eval::DelayFn;
use rasta_syntax::{File, Node};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// xorshift64 over a shared state; the sequence is fixed but which node gets
/// which delay depends on scheduling.
fn jitter(seed: u64, max_ms: u64) -> DelayFn {
    let state = Arc::new(AtomicU64::new(seed));
    Arc::new(move |_node: &Node| {
        let mut x = state.load(Ordering::Relaxed);
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        state.store(x, Ordering::Relaxed);
        Duration::from_millis(x % (max_ms + 1))
    })
}

fn wide_call(width: usize) -> (Node, String) {
    let args: Vec<Node> = (0..width)
        .map(|i| {
            if i % 2 == 0 {
                Node::ident(format!("a{i}"))
            } else {
                Node::binary(Node::ident(format!("b{i}")), "+", Node::int(i.to_string()))
            }
        })
        .collect();
    let expected: Vec<String> = (0..width)
        .map(|i| {
            if i % 2 == 0 {
                format!("a{i}")
            } else {
                format!("BinaryExpr[\"+\", b{i}, {i}]")
            }
        })
        .collect();
    (
        Node::call(Node::ident("f"), args),
        format!("f[{}]", expected.join(", ")),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn arguments_keep_source_order() {
    for seed in [1, 7, 42, 0x9e37_79b9] {
        let (node, expected) = wide_call(24);
        let options = EvalOptions::default().with_delay(jitter(seed, 3));
        let evaluator = Evaluator::new(&options);
        let expr = evaluator.convert(node).await.unwrap();
        assert_eq!(expr.to_string(), expected, "seed {seed}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn small_pool_keeps_source_order() {
    for max_tasks in [1, 2, 3] {
        let (node, expected) = wide_call(16);
        let options = EvalOptions::default()
            .with_max_tasks(max_tasks)
            .with_delay(jitter(max_tasks as u64 + 11, 2));
        let expr = Evaluator::new(&options).convert(node).await.unwrap();
        assert_eq!(expr.to_string(), expected, "max_tasks {max_tasks}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn declarations_keep_source_order() {
    let names: Vec<String> = (0..12).map(|i| format!("f{i}")).collect();
    let decls = names
        .iter()
        .map(|name| {
            Node::func_decl(
                name.clone(),
                Some(Node::block(vec![Node::ret(vec![Node::ident("x")])])),
            )
        })
        .collect();

    let driver = StreamDriver::new(EvalOptions::default().with_delay(jitter(3, 4))).with_capacity(2);
    let out = driver.collect(File::new("p", decls)).await.unwrap();

    let emitted: Vec<String> = out[1..out.len() - 1]
        .iter()
        .map(|expr| expr.args()[0].to_string())
        .collect();
    assert_eq!(emitted, names);
    assert_eq!(out.len(), names.len() + 2);
}
