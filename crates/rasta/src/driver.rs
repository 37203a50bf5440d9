//! Stream driver: one compilation unit in, a bracketed expression stream out.
//!
//! A producer task emits `BeginPackage[name]`, the expressions of every
//! top-level declaration in source order, and `EndPackage[]`. The consumer
//! loop writes each expression to the sink as soon as it arrives and stops
//! when the producer signals completion. After a fatal error nothing further
//! is emitted; in particular `EndPackage[]` is missing.

use crate::classify;
use crate::error::{ConvertError, DriveError};
use crate::eval::{EvalOptions, Evaluator, Pending};
use crate::expr::Expression;
use crate::serialize::ContextPath;
use rasta_syntax::File;
use std::io::Write;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Receives expressions in stream order.
pub trait Sink {
    fn emit(&mut self, expr: &Expression) -> std::io::Result<()>;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn emit(&mut self, expr: &Expression) -> std::io::Result<()> {
        (**self).emit(expr)
    }
}

impl Sink for Vec<Expression> {
    fn emit(&mut self, expr: &Expression) -> std::io::Result<()> {
        self.push(expr.clone());
        Ok(())
    }
}

/// Writes one rendered expression per line.
pub struct TextSink<W: Write> {
    out: W,
    path: ContextPath,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W, path: ContextPath) -> Self {
        Self { out, path }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for TextSink<W> {
    fn emit(&mut self, expr: &Expression) -> std::io::Result<()> {
        writeln!(self.out, "{}", expr.render(&self.path))?;
        self.out.flush()
    }
}

/// Writes one JSON array per line.
pub struct JsonSink<W: Write> {
    out: W,
    path: ContextPath,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W, path: ContextPath) -> Self {
        Self { out, path }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for JsonSink<W> {
    fn emit(&mut self, expr: &Expression) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.out, &expr.to_json(&self.path))?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

/// Runs one compilation unit through the evaluator into a sink.
#[derive(Debug, Clone)]
pub struct StreamDriver {
    options: EvalOptions,
    capacity: usize,
}

impl StreamDriver {
    pub fn new(options: EvalOptions) -> Self {
        Self {
            options,
            capacity: 64,
        }
    }

    /// Buffer size of the stream between producer and consumer.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Convert `file` and drain the stream into `sink`. Returns the number of
    /// expressions emitted.
    pub async fn run<S: Sink>(&self, file: File, sink: &mut S) -> Result<usize, DriveError> {
        let evaluator = Evaluator::new(&self.options);
        let (tx, mut rx) = mpsc::channel(self.capacity);

        info!(package = %file.package.name, decls = file.decls.len(), "translating");
        let mut done = tokio::spawn(produce(evaluator.clone(), file, tx));

        let mut emitted = 0;
        let outcome = loop {
            tokio::select! {
                biased;
                Some(expr) = rx.recv() => {
                    if let Err(err) = emit(sink, &expr, &mut emitted) {
                        done.abort();
                        return Err(DriveError::Sink(err));
                    }
                }
                outcome = &mut done => break outcome,
            }
        };

        // Anything sent between the last receive and completion.
        while let Ok(expr) = rx.try_recv() {
            emit(sink, &expr, &mut emitted)?;
        }

        match outcome {
            Ok(Ok(())) => {
                info!(emitted, "translation finished");
                Ok(emitted)
            }
            Ok(Err(err)) => Err(evaluator.root_cause(err).into()),
            Err(join) => Err(ConvertError::TaskFailed(join.to_string()).into()),
        }
    }

    /// Convert `file` and collect the whole stream.
    pub async fn collect(&self, file: File) -> Result<Vec<Expression>, DriveError> {
        let mut out = Vec::new();
        self.run(file, &mut out).await?;
        Ok(out)
    }
}

impl Default for StreamDriver {
    fn default() -> Self {
        Self::new(EvalOptions::default())
    }
}

fn emit<S: Sink>(sink: &mut S, expr: &Expression, emitted: &mut usize) -> std::io::Result<()> {
    sink.emit(expr)?;
    *emitted += 1;
    debug!(emitted = *emitted, "entry emitted");
    Ok(())
}

async fn produce(
    evaluator: Evaluator,
    file: File,
    tx: mpsc::Sender<Expression>,
) -> Result<(), ConvertError> {
    let package = classify::package(file);
    send(&tx, package.begin).await?;

    let pending: Vec<Pending<Vec<Expression>>> = package
        .decls
        .into_iter()
        .map(|decl| evaluator.launch_decl(decl))
        .collect();

    for (index, decl) in pending.into_iter().enumerate() {
        let exprs = decl.join().await?;
        debug!(index, entries = exprs.len(), "declaration converted");
        for expr in exprs {
            send(&tx, expr).await?;
        }
    }

    send(&tx, package.end).await
}

async fn send(tx: &mpsc::Sender<Expression>, expr: Expression) -> Result<(), ConvertError> {
    // A closed channel means the consumer has given up.
    tx.send(expr).await.map_err(|_| ConvertError::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasta_syntax::Node;

    #[tokio::test]
    async fn test_empty_file_is_just_sentinels() {
        let out = StreamDriver::default()
            .collect(File::new("empty", vec![]))
            .await
            .unwrap();
        let rendered: Vec<_> = out.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["BeginPackage[\"empty\"]", "EndPackage[]"]);
    }

    #[tokio::test]
    async fn test_text_sink_writes_lines() {
        let file = File::new("p", vec![Node::func_decl("f", None)]);
        let mut sink = TextSink::new(Vec::new(), ContextPath::default());
        let emitted = StreamDriver::default().run(file, &mut sink).await.unwrap();
        assert_eq!(emitted, 3);
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            text,
            "BeginPackage[\"p\"]\nFunction[f, List[], Null]\nEndPackage[]\n"
        );
    }

    #[tokio::test]
    async fn test_json_sink_writes_arrays() {
        let file = File::new("p", vec![]);
        let mut sink = JsonSink::new(Vec::new(), ContextPath::default());
        StreamDriver::default().run(file, &mut sink).await.unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "[\"BeginPackage\",{\"string\":\"p\"}]\n[\"EndPackage\"]\n");
    }

    #[derive(Default)]
    struct CountingSink(usize);

    impl Sink for CountingSink {
        fn emit(&mut self, _: &Expression) -> std::io::Result<()> {
            self.0 += 1;
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_every_entry_is_counted() {
        let decls = (0..20).map(|i| Node::func_decl(format!("f{i}"), None)).collect();
        let mut sink = CountingSink::default();
        let emitted = StreamDriver::default()
            .with_capacity(1)
            .run(File::new("p", decls), &mut sink)
            .await
            .unwrap();
        assert_eq!(emitted, 22);
        assert_eq!(sink.0, emitted);
    }

    struct FailingSink;

    impl Sink for FailingSink {
        fn emit(&mut self, _: &Expression) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[tokio::test]
    async fn test_sink_failure_stops_the_run() {
        let err = StreamDriver::default()
            .run(File::new("p", vec![]), &mut FailingSink)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::Sink(_)));
    }
}
