//! tsflow CLI: run a JSON query over a JSONL sample stream.
//!
//! The query document mirrors the storage engine's query surface:
//!
//! ```json
//! {
//!   "metrics": ["cpu.user"],
//!   "range": {"from": 0, "to": 1000},
//!   "group-by-time": 10,
//!   "filter": {"include": [7]},
//!   "sample": [{"name": "moving-average"}]
//! }
//! ```
//!
//! Input is one sample per line: `{"paramid": 7, "timestamp": 3, "value":
//! 1.0}`; a line without `value` is an explicit bucket-boundary sentinel.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::warn;

use tsflow_core::prelude::{Error, PipelineConfig, Result, Sample, Timestamp, MAX_TIMESTAMP};
use tsflow_nodes::{shared, CollectorSink, FnSink, SharedNode};
use tsflow_query::{
    GroupByTime, MetadataQueryProcessor, NodeBuilder, QueryProcessor, ScanQueryProcessor,
};

#[derive(Parser)]
#[command(name = "tsflow")]
#[command(about = "Streaming query pipeline for time-series samples", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query over a JSONL sample stream
    Run {
        /// Path to the query JSON file
        #[arg(short, long)]
        query: PathBuf,

        /// Path to the JSONL input samples (not needed for metadata queries)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write emitted samples (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reservoir RNG seed (overrides TSFLOW_SEED)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Validate a query JSON file (builds the chain, runs nothing)
    Validate {
        /// Path to the query JSON file
        #[arg(short, long)]
        query: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
struct QueryDoc {
    #[serde(default)]
    metrics: Vec<String>,

    #[serde(default)]
    range: Option<RangeDoc>,

    #[serde(rename = "group-by-time", default)]
    group_by_time: Option<Timestamp>,

    #[serde(default)]
    filter: Option<FilterDoc>,

    #[serde(default)]
    sample: Vec<serde_json::Value>,

    /// When present, runs a metadata query for these series ids instead of
    /// a scan.
    #[serde(default)]
    metadata: Option<Vec<u64>>,
}

#[derive(Debug, Deserialize)]
struct RangeDoc {
    from: Timestamp,
    to: Timestamp,
}

#[derive(Debug, Default, Deserialize)]
struct FilterDoc {
    #[serde(default)]
    include: Vec<u64>,

    #[serde(default)]
    exclude: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct InputRecord {
    #[serde(default)]
    paramid: u64,
    timestamp: Timestamp,
    #[serde(default)]
    value: Option<f64>,
}

impl InputRecord {
    fn into_sample(self) -> Sample {
        match self.value {
            Some(v) => Sample::float(self.paramid, self.timestamp, v),
            None => Sample::sentinel(self.timestamp),
        }
    }
}

#[derive(Debug, Serialize)]
struct OutputRecord {
    paramid: u64,
    timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    urgent: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    sentinel: bool,
}

impl OutputRecord {
    fn from_sample(sample: &Sample) -> Self {
        Self {
            paramid: sample.paramid,
            timestamp: sample.timestamp,
            value: sample.float_value(),
            urgent: sample.is_urgent(),
            sentinel: sample.is_sentinel(),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            query,
            input,
            output,
            seed,
        } => {
            if let Err(e) = run_query(&query, input.as_deref(), output.as_deref(), seed) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Validate { query } => {
            if let Err(e) = validate_query(&query) {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
            println!("✓ Query is valid");
        }
    }
}

fn parse_query(path: &std::path::Path) -> Result<QueryDoc> {
    let content = fs::read_to_string(path)?;
    let doc: QueryDoc = serde_json::from_str(&content)?;
    Ok(doc)
}

fn build_chain(
    doc: &QueryDoc,
    builder: &mut NodeBuilder,
    sink: SharedNode,
) -> Result<SharedNode> {
    let mut head = builder
        .build_pipeline(&doc.sample, sink)
        .map_err(|e| Error::Query(e.to_string()))?;
    if let Some(filter) = &doc.filter {
        if !filter.exclude.is_empty() {
            head = builder.make_filter_out_by_id_list(filter.exclude.clone(), head);
        }
        match filter.include.as_slice() {
            [] => {}
            [only] => head = builder.make_filter_by_id(*only, head),
            many => head = builder.make_filter_by_id_list(many.to_vec(), head),
        }
    }
    Ok(head)
}

fn run_query(
    query_path: &std::path::Path,
    input: Option<&std::path::Path>,
    output: Option<&std::path::Path>,
    seed: Option<u64>,
) -> Result<()> {
    let doc = parse_query(query_path)?;
    let config = PipelineConfig::from_env();
    let mut builder = NodeBuilder::with_seed(seed.or(config.seed))
        .with_default_reservoir_size(config.reservoir_size);

    let mut writer: BufWriter<Box<dyn Write + Send>> = BufWriter::new(match output {
        Some(path) => Box::new(fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    });
    // BufWriter flushes on drop; delivery failures stop the stream below.
    let sink = Arc::new(Mutex::new(FnSink::new(move |sample: &Sample| {
        let record = OutputRecord::from_sample(sample);
        match serde_json::to_string(&record) {
            Ok(line) => writeln!(writer, "{}", line).is_ok(),
            Err(e) => {
                warn!(error = %e, "failed to encode output sample");
                false
            }
        }
    })));
    let sink_node: SharedNode = sink.clone();

    let head = build_chain(&doc, &mut builder, sink_node)?;

    if let Some(ids) = &doc.metadata {
        let mut processor = MetadataQueryProcessor::new(ids.clone(), head);
        if !processor.start() {
            processor.stop();
            return Err(Error::Query("metadata query was refused by the chain".to_string()));
        }
        processor.stop();
    } else {
        let input = input.ok_or_else(|| {
            Error::Config("scan queries need an --input sample stream".to_string())
        })?;
        let (from, to) = match &doc.range {
            Some(range) => (range.from, range.to),
            None => (0, MAX_TIMESTAMP),
        };
        let step = doc
            .group_by_time
            .or(config.group_by_step)
            .unwrap_or_default();
        let mut processor = ScanQueryProcessor::new(
            head,
            doc.metrics.clone(),
            from,
            to,
            GroupByTime::new(step),
        );
        if !processor.start() {
            return Err(Error::Invariant("query refused to start".to_string()));
        }

        let reader = std::io::BufReader::new(fs::File::open(input)?);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: InputRecord = serde_json::from_str(&line)?;
            if !processor.put(&record.into_sample()) {
                break;
            }
        }
        processor.stop();
    }

    let status = sink.lock().unwrap().status();
    if !status.is_ok() {
        return Err(Error::Query(format!("stream aborted: {}", status)));
    }
    Ok(())
}

fn validate_query(query_path: &std::path::Path) -> Result<()> {
    let doc = parse_query(query_path)?;
    let config = PipelineConfig::from_env();
    let mut builder =
        NodeBuilder::new().with_default_reservoir_size(config.reservoir_size);
    build_chain(&doc, &mut builder, shared(CollectorSink::new()))?;
    Ok(())
}
