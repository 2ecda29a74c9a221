use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use edeps_classifier::classify;
use edeps_graph::Graph;
use edeps_parser::{write_sentence, ReadError, Sentence, SentenceReader};
use edeps_protocol::{EdgeKey, NodeId};

#[derive(Parser)]
#[command(author, version, about = "Labels every enhanced dependency edge with the reason it differs from the basic tree")]
struct Cli {
    /// Input file; stdin when omitted.
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file; stdout when omitted.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Conllu)]
    format: Format,

    /// Pass sentences that fail to build through unchanged instead of stopping.
    #[arg(long)]
    skip_invalid: bool,

    /// Process sentences on all cores; output keeps input order.
    #[arg(long)]
    parallel: bool,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Conllu,
    Json,
}

#[derive(Debug, Clone, Copy)]
struct Options {
    format: Format,
    skip_invalid: bool,
    parallel: bool,
}

impl From<&Cli> for Options {
    fn from(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            skip_invalid: cli.skip_invalid,
            parallel: cli.parallel,
        }
    }
}

#[derive(Serialize)]
struct NodeReport {
    id: NodeId,
    form: String,
    edeps: BTreeMap<EdgeKey, String>,
}

#[derive(Serialize)]
struct SentenceReport<'a> {
    sent_id: Option<&'a str>,
    line: usize,
    nodes: Vec<NodeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Rendered output for one input sentence.
struct Processed {
    text: String,
    skipped: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    sentences: usize,
    skipped: usize,
}

fn describe(sentence: &Sentence) -> String {
    match sentence.sent_id() {
        Some(id) => format!("sentence {} (line {})", id, sentence.first_line),
        None => format!("sentence at line {}", sentence.first_line),
    }
}

fn render(sentence: &Sentence, graph: Option<&Graph>, error: Option<String>, format: Format) -> anyhow::Result<String> {
    match format {
        Format::Conllu => {
            let mut out = Vec::new();
            write_sentence(&mut out, sentence)?;
            Ok(String::from_utf8(out)?)
        }
        Format::Json => {
            let nodes = graph
                .map(|graph| {
                    graph
                        .nodes()
                        .filter(|node| !node.misc.edeps().is_empty())
                        .map(|node| NodeReport {
                            id: node.id(),
                            form: node.form.clone(),
                            edeps: node
                                .misc
                                .edeps()
                                .iter()
                                .map(|(key, categories)| (key.clone(), categories.letters()))
                                .collect(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            let report = SentenceReport {
                sent_id: sentence.sent_id(),
                line: sentence.first_line,
                nodes,
                error,
            };
            Ok(serde_json::to_string(&report)? + "\n")
        }
    }
}

/// Builds, classifies and renders one sentence.
fn process_sentence(sentence: &Sentence, options: &Options) -> anyhow::Result<Processed> {
    let mut graph = match Graph::from_records(&sentence.rows) {
        Ok(graph) => graph,
        Err(err) if options.skip_invalid => {
            warn!(error = %err, "{}: passed through unchanged", describe(sentence));
            return Ok(Processed {
                text: render(sentence, None, Some(err.to_string()), options.format)?,
                skipped: true,
            });
        }
        Err(err) => return Err(err).with_context(|| describe(sentence)),
    };

    classify(&mut graph);
    let annotated = Sentence {
        comments: sentence.comments.clone(),
        rows: graph.to_records(),
        first_line: sentence.first_line,
    };
    Ok(Processed {
        text: render(&annotated, Some(&graph), None, options.format)?,
        skipped: false,
    })
}

fn process_block(block: Result<Sentence, ReadError>, options: &Options) -> anyhow::Result<Option<Processed>> {
    match block {
        Ok(sentence) => process_sentence(&sentence, options).map(Some),
        Err(err @ ReadError::Io(_)) => Err(err.into()),
        Err(err) if options.skip_invalid => {
            warn!(line = ?err.line(), error = %err, "dropping unreadable sentence");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn run<R: BufRead, W: Write>(input: R, output: &mut W, options: &Options) -> anyhow::Result<Summary> {
    let mut summary = Summary::default();
    let mut emit = |processed: Option<Processed>, output: &mut W| -> anyhow::Result<()> {
        summary.sentences += 1;
        match processed {
            Some(processed) => {
                summary.skipped += usize::from(processed.skipped);
                output.write_all(processed.text.as_bytes())?;
            }
            None => summary.skipped += 1,
        }
        Ok(())
    };

    let blocks = SentenceReader::new(input);
    if options.parallel {
        let blocks: Vec<_> = blocks.collect();
        let results: Vec<_> = blocks
            .into_par_iter()
            .map(|block| process_block(block, options))
            .collect();
        for result in results {
            emit(result?, output)?;
        }
    } else {
        for block in blocks {
            emit(process_block(block, options)?, output)?;
        }
    }

    output.flush()?;
    Ok(summary)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    let options = Options::from(&cli);

    let input: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let mut output: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let summary = run(input, &mut output, &options)?;
    info!(
        sentences = summary.sentences,
        skipped = summary.skipped,
        "annotation finished"
    );
    Ok(())
}
