//! pastila: read and write pastes on the pastila.nl copy-paste service
//!
//! Read data goes to stdout, everything else goes to stderr. A written
//! paste's URL goes to stdout, or to stderr with `--tee`.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tracing::debug;

use pastila::{
    cipher, EditSession, EditorConfig, KeySource, Output, PasteService, ServiceConfig,
    WriteOptions,
};

#[derive(Parser)]
#[command(name = "pastila")]
#[command(about = "Read and write pastes on the pastila.nl copy-paste service")]
#[command(
    after_help = "See https://github.com/ClickHouse/pastila for more information about the service."
)]
struct Cli {
    /// Paste URL to read, or "-" to read the URL from stdin
    url: Option<String>,

    /// Content file path
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,

    /// Do not encrypt content
    #[arg(long)]
    plain: bool,

    /// Key to encrypt content, or a path to a file holding it (random 128-bit key by default)
    #[arg(long, conflicts_with = "plain")]
    key: Option<String>,

    /// Show the query id after reading
    #[arg(short = 's', long = "summary")]
    summary: bool,

    /// Launch an editor on the paste; every save is published as a new revision
    #[arg(short = 'e', long = "edit")]
    edit: bool,

    /// Copy written content to stdout and print the URL to stderr
    #[arg(long)]
    tee: bool,

    /// Base URL used for paste links
    #[arg(long, env = "PASTILA_URL")]
    service_url: Option<String>,

    /// ClickHouse HTTP endpoint
    #[arg(long, env = "PASTILA_CLICKHOUSE_URL")]
    clickhouse_url: Option<String>,

    /// Editor command for --edit
    #[arg(long, env = "EDITOR")]
    editor: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pastila=warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = ServiceConfig::default()
        .with_overrides(cli.service_url.clone(), cli.clickhouse_url.clone());
    let editor = cli
        .editor
        .as_deref()
        .map(EditorConfig::from_command)
        .unwrap_or_default();

    debug!(
        service_url = %config.service_url,
        clickhouse_url = %config.clickhouse_url,
        "Configured"
    );

    let service = PasteService::new(&config)?;
    let output = Output::stderr();

    let url = match cli.url.as_deref() {
        Some("-") => Some(read_url_from_stdin().await?),
        other => other.map(str::to_string),
    };

    if let Some(url) = url {
        return read_paste(&cli, service, output, editor, &url).await;
    }

    let content = match &cli.file {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to open file {}", path.display()))?,
        None if !io::stdin().is_terminal() => read_content(tokio::io::stdin())
            .await
            .context("Failed to read content from stdin")?,
        None => {
            Cli::command().print_help()?;
            std::process::exit(1);
        }
    };

    write_paste(&cli, service, output, editor, content).await
}

async fn read_paste(
    cli: &Cli,
    service: PasteService,
    output: Output,
    editor: EditorConfig,
    url: &str,
) -> anyhow::Result<()> {
    let paste = service.read(url).await?;

    if cli.summary {
        output.println(format!("Query id: {}", paste.request_id));
    }

    if cli.edit {
        EditSession::new(service, output, editor).run(paste).await?;
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(paste.content())
        .and_then(|_| stdout.flush())
        .context("Failed to write to output")?;
    Ok(())
}

async fn write_paste(
    cli: &Cli,
    service: PasteService,
    output: Output,
    editor: EditorConfig,
    content: Vec<u8>,
) -> anyhow::Result<()> {
    if cli.tee {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(&content)
            .and_then(|_| stdout.flush())
            .context("Failed to write to output")?;
    }

    let key = if cli.plain {
        None
    } else if let Some(arg) = &cli.key {
        let source = KeySource::from_arg(arg);
        Some(
            source
                .load()
                .with_context(|| format!("Failed to read key from {:?}", source))?,
        )
    } else {
        Some(cipher::generate_key())
    };

    let paste = service
        .write_bytes(content, &WriteOptions::new().with_key(key))
        .await?;

    if cli.tee {
        output.println(paste.url());
    } else {
        println!("{}", paste.url());
    }

    if cli.edit {
        EditSession::new(service, output, editor).run(paste).await?;
    }

    Ok(())
}

async fn read_url_from_stdin() -> anyhow::Result<String> {
    if io::stdin().is_terminal() {
        bail!("No URL provided in stdin, but \"-\" was passed as URL");
    }

    read_first_line(tokio::io::stdin())
        .await
        .context("Failed to read pastila URL from stdin")
}

async fn read_first_line(reader: impl AsyncRead + Unpin) -> io::Result<String> {
    let mut line = String::new();
    BufReader::new(reader).read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

async fn read_content(mut reader: impl AsyncRead + Unpin) -> io::Result<Vec<u8>> {
    let mut content = Vec::new();
    reader.read_to_end(&mut content).await?;
    Ok(content)
}
