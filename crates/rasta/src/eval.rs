//! Ordered concurrent evaluation.
//!
//! Every child slot of a rule is launched as its own tokio task, and the
//! parent awaits the handles in declared order. Children may finish in any
//! order; argument order is fixed by the order of the handles.
//!
//! Spawning is bounded by a semaphore. A child that cannot get a permit is
//! converted inline by its parent instead, which keeps the traversal moving
//! no matter how deep the tree is.
//!
//! The first fatal error trips a shared abort flag and is recorded as the
//! cause. Tasks check the flag before converting their node, and a parent that
//! bails out aborts the sibling tasks it still holds.

use crate::classify::{self, Arg, Rule};
use crate::error::ConvertError;
use crate::expr::Expression;
use rasta_syntax::Node;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::{trace, warn};

const RED_ZONE: usize = 64 * 1024;
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, ConvertError>> + Send + 'static>>;

/// Delay injected before a node is converted. Used to shake up scheduling.
pub type DelayFn = Arc<dyn Fn(&Node) -> Duration + Send + Sync>;

/// Evaluator settings.
#[derive(Clone)]
pub struct EvalOptions {
    /// Maximum number of spawned conversion tasks alive at once.
    pub max_tasks: usize,
    pub delay: Option<DelayFn>,
}

impl EvalOptions {
    pub fn with_max_tasks(mut self, max_tasks: usize) -> Self {
        self.max_tasks = max_tasks.max(1);
        self
    }

    pub fn with_delay(mut self, delay: DelayFn) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Default for EvalOptions {
    fn default() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            max_tasks: cores * 4,
            delay: None,
        }
    }
}

impl std::fmt::Debug for EvalOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalOptions")
            .field("max_tasks", &self.max_tasks)
            .field("delay", &self.delay.is_some())
            .finish()
    }
}

/// Abort flag shared by every task of one traversal.
#[derive(Default)]
struct Abort {
    tripped: AtomicBool,
    cause: OnceLock<ConvertError>,
}

impl Abort {
    fn trip(&self, err: &ConvertError) {
        if !matches!(err, ConvertError::Cancelled) && self.cause.set(err.clone()).is_ok() {
            warn!(error = %err, "aborting conversion");
        }
        self.tripped.store(true, Ordering::SeqCst);
    }

    fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}

struct Shared {
    pool: Arc<Semaphore>,
    abort: Abort,
    delay: Option<DelayFn>,
}

/// Converts syntax trees into expressions. One evaluator serves one traversal;
/// once an error has tripped it, every further conversion is cancelled.
#[derive(Clone)]
pub struct Evaluator {
    shared: Arc<Shared>,
}

impl Evaluator {
    pub fn new(options: &EvalOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                pool: Arc::new(Semaphore::new(options.max_tasks.max(1))),
                abort: Abort::default(),
                delay: options.delay.clone(),
            }),
        }
    }

    /// Convert one node to one expression.
    pub fn convert(&self, node: Node) -> BoxFuture<Expression> {
        let this = self.clone();
        Box::pin(async move {
            let rule = this.enter(node).await?;
            let result = this.apply(rule).await;
            this.observe(result)
        })
    }

    /// Convert one top-level declaration. Declaration groups yield one
    /// expression per spec; everything else yields exactly one.
    pub fn convert_decl(&self, node: Node) -> BoxFuture<Vec<Expression>> {
        let this = self.clone();
        Box::pin(async move {
            let rule = this.enter(node).await?;
            let result = match rule {
                Rule::Group { specs, .. } => this.fan_out(specs).await,
                rule => this.apply(rule).await.map(|expr| vec![expr]),
            };
            this.observe(result)
        })
    }

    /// Launch a declaration conversion, in its own task when the pool allows.
    pub fn launch_decl(&self, node: Node) -> Pending<Vec<Expression>> {
        self.launch(self.convert_decl(node))
    }

    /// The error that tripped the abort flag, if any.
    pub fn cause(&self) -> Option<ConvertError> {
        self.shared.abort.cause.get().cloned()
    }

    /// Replace a secondary cancellation with the error that caused it.
    pub fn root_cause(&self, err: ConvertError) -> ConvertError {
        match err {
            ConvertError::Cancelled => self.cause().unwrap_or(ConvertError::Cancelled),
            err => err,
        }
    }

    /// Checkpoint, optional delay, then classification.
    async fn enter(&self, node: Node) -> Result<Rule, ConvertError> {
        self.checkpoint()?;
        if let Some(delay) = &self.shared.delay {
            let pause = delay(&node);
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
                self.checkpoint()?;
            }
        }
        trace!(kind = node.kind_name(), pos = %node.pos, "convert");
        self.observe(classify::classify(node))
    }

    fn checkpoint(&self) -> Result<(), ConvertError> {
        if self.shared.abort.is_tripped() {
            Err(ConvertError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn observe<T>(&self, result: Result<T, ConvertError>) -> Result<T, ConvertError> {
        if let Err(err) = &result {
            self.shared.abort.trip(err);
        }
        result
    }

    async fn apply(&self, rule: Rule) -> Result<Expression, ConvertError> {
        match rule {
            Rule::Atom(expr) => Ok(expr),
            Rule::Apply(head, args) => Ok(head.apply(self.fan_out(args).await?)),
            Rule::Selector { pos, x, sel } => {
                let mut parts = self.fan_out(vec![Arg::Node(x), Arg::Node(sel)]).await?;
                let sel = parts.pop().ok_or(ConvertError::Cancelled)?;
                let x = parts.pop().ok_or(ConvertError::Cancelled)?;
                Ok(classify::select(pos, x, sel))
            }
            Rule::Call { pos, fun, args } => {
                let slots = std::iter::once(fun).chain(args).map(Arg::Node).collect();
                let mut parts = self.fan_out(slots).await?.into_iter();
                let fun = parts.next().ok_or(ConvertError::Cancelled)?;
                Ok(classify::call(pos, fun, parts.collect()))
            }
            Rule::Group { pos, .. } => Err(ConvertError::Misplaced {
                kind: "GenDecl".into(),
                pos,
            }),
            Rule::Package(package) => Err(ConvertError::Misplaced {
                kind: "File".into(),
                pos: package.begin.pos(),
            }),
        }
    }

    /// Launch every slot, then collect results in slot order.
    async fn fan_out(&self, args: Vec<Arg>) -> Result<Vec<Expression>, ConvertError> {
        let pending: Vec<Pending<Expression>> =
            args.into_iter().map(|arg| self.launch_arg(arg)).collect();
        let mut results = Vec::with_capacity(pending.len());
        // Returning early drops the remaining handles, which aborts them.
        for slot in pending {
            results.push(slot.join().await?);
        }
        Ok(results)
    }

    fn launch_arg(&self, arg: Arg) -> Pending<Expression> {
        match arg {
            Arg::Node(node) => self.launch(self.convert(node)),
            Arg::Ready(expr) => Pending::Ready(expr),
            Arg::Apply(head, args) => {
                let this = self.clone();
                Pending::Inline(Box::pin(async move {
                    Ok(head.apply(this.fan_out(args).await?))
                }))
            }
        }
    }

    fn launch<T: Send + 'static>(&self, work: BoxFuture<T>) -> Pending<T> {
        match self.shared.pool.clone().try_acquire_owned() {
            Ok(permit) => Pending::Spawned(AbortOnDrop(tokio::spawn(async move {
                let result = work.await;
                drop(permit);
                result
            }))),
            Err(_) => Pending::Inline(work),
        }
    }
}

/// A launched conversion awaiting collection.
pub enum Pending<T> {
    Spawned(AbortOnDrop<Result<T, ConvertError>>),
    Inline(BoxFuture<T>),
    Ready(T),
}

impl<T> Pending<T> {
    pub async fn join(self) -> Result<T, ConvertError> {
        match self {
            Pending::Spawned(mut handle) => match (&mut handle.0).await {
                Ok(result) => result,
                Err(err) => Err(join_error(err)),
            },
            Pending::Inline(work) => GrowStack(work).await,
            Pending::Ready(value) => Ok(value),
        }
    }
}

/// Polls an inline conversion with at least `RED_ZONE` bytes of stack left.
/// Inline conversions nest one poll frame per tree level.
struct GrowStack<F>(F);

impl<F: Future + Unpin> Future for GrowStack<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<F::Output> {
        let work = &mut self.0;
        stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || Pin::new(work).poll(cx))
    }
}

/// Join handle that aborts its task when dropped uncollected.
pub struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn join_error(err: JoinError) -> ConvertError {
    if err.is_cancelled() {
        ConvertError::Cancelled
    } else {
        ConvertError::TaskFailed(err.to_string())
    }
}
