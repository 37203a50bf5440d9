use clap::Parser;
use rasta::{JsonSink, OutputFormat, RastaConfig, Sink, StreamDriver, TextSink};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Translate a Go source file into a stream of symbolic expressions.
#[derive(Parser)]
#[command(name = "rasta", version, about)]
struct Cli {
    /// Input source file, use - for stdin
    input: PathBuf,

    /// Output encoding (overrides config)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Maximum number of concurrent conversion tasks (overrides config)
    #[arg(long)]
    max_tasks: Option<usize>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Project root used to find .rasta/config.toml
    #[arg(long)]
    root: Option<PathBuf>,

    /// Print the parsed syntax tree as JSON instead of translating
    #[arg(long)]
    dump_ast: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().map_err(|e| format!("Failed to get cwd: {e}"))?,
    };
    let mut config = RastaConfig::load(&root);
    if cli.max_tasks.is_some() {
        config.convert.max_tasks = cli.max_tasks;
    }
    if cli.format.is_some() {
        config.output.format = cli.format;
    }

    let is_stdin = cli.input.as_os_str() == "-";
    let source = if is_stdin {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("Failed to read stdin: {e}"))?;
        buf
    } else {
        std::fs::read_to_string(&cli.input)
            .map_err(|e| format!("Failed to read {}: {e}", cli.input.display()))?
    };

    let ext = if is_stdin {
        "go"
    } else {
        cli.input
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("go")
    };
    let reader = rasta_syntax::reader_for_extension(ext)
        .or_else(|| rasta_syntax::reader_for_language("go"))
        .ok_or_else(|| "No Go reader available".to_string())?;
    let file = reader
        .read(&source)
        .map_err(|e| format!("Failed to parse {}: {e}", cli.input.display()))?;

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path)
                .map_err(|e| format!("Failed to create {}: {e}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };

    if cli.dump_ast {
        let json = rasta::dump_syntax(&file).map_err(|e| format!("Failed to dump syntax tree: {e}"))?;
        writeln!(out, "{json}").map_err(|e| format!("Failed to write output: {e}"))?;
        return Ok(());
    }

    let driver = StreamDriver::new(config.eval_options()).with_capacity(config.channel_capacity());
    let path = config.context_path();
    let mut sink: Box<dyn Sink> = match config.format() {
        OutputFormat::Text => Box::new(TextSink::new(out, path)),
        OutputFormat::Json => Box::new(JsonSink::new(out, path)),
    };
    driver
        .run(file, &mut sink)
        .await
        .map_err(|e| e.to_string())?;
    Ok(())
}
