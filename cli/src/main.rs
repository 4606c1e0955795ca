use clap::{Parser, ValueEnum};
use log::LevelFilter;
use serde_json::{Value, json};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;

use font_stats::{DirectoryContainer, FontStats, StatsCollector};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One line per font with the characters it needs
    Plain,
    /// Everything that was collected, as JSON
    Json,
}

#[derive(Parser)]
#[command(name = "font-stats")]
#[command(about = "Report which characters of which fonts an ebook renders", long_about = None)]
struct Args {
    /// JSON dump of the rendered documents, in spine order
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Directory the book is unpacked into
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Also collect usage of fonts that are not embedded
    #[arg(short, long)]
    embed: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Plain)]
    format: OutputFormat,

    /// More logging, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn chars(text: &std::collections::BTreeSet<char>) -> String {
    text.iter().collect()
}

fn to_json(stats: &FontStats) -> Value {
    let fonts: serde_json::Map<String, Value> = stats
        .font_usage()
        .iter()
        .map(|(source, text)| {
            let mut font = json!({ "characters": chars(text) });
            if let Some(rule) = stats.rule(source) {
                font["families"] = json!(rule.families);
                font["font-weight"] = json!(rule.properties.weight);
                font["font-style"] = json!(rule.properties.style.as_str());
                font["font-stretch"] = json!(rule.properties.stretch.as_str());
            }
            (source.clone(), font)
        })
        .collect();

    let buckets: Vec<Value> = stats
        .embedding_buckets()
        .values()
        .map(|bucket| {
            json!({
                "font-family": bucket.family,
                "font-weight": bucket.properties.weight,
                "font-style": bucket.properties.style.as_str(),
                "font-stretch": bucket.properties.stretch.as_str(),
                "characters": chars(&bucket.text),
            })
        })
        .collect();

    json!({
        "fonts": fonts,
        "embedding_candidates": buckets,
        "families": stats.family_names(),
    })
}

fn main() {
    let args = Args::parse();

    let level = match (args.quiet, args.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, 2) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    if let Err(e) = simple_logger::SimpleLogger::new().with_level(level).init() {
        eprintln!("Could not set up logging: {}", e);
    }

    let documents = match File::open(&args.file)
        .map_err(font_stats::StatsError::from)
        .and_then(|file| font_stats::documents_from_reader(BufReader::new(file)))
    {
        Ok(documents) => documents,
        Err(e) => {
            eprintln!("Error reading {:?}: {}", args.file, e);
            std::process::exit(1);
        }
    };
    info!("Read {} documents from {:?}", documents.len(), args.file);

    let collector = StatsCollector::builder()
        .collect_embedding_candidates(args.embed)
        .build();
    let container = DirectoryContainer::new(&args.root);

    let stats = match collector.collect(&container, documents) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("Failed to gather statistics from book: {}", e);
            std::process::exit(1);
        }
    };

    match args.format {
        OutputFormat::Plain => {
            if stats.is_empty() {
                println!("No fonts used.");
                return;
            }
            print!("{}", stats);
            if args.embed && !stats.family_names().is_empty() {
                println!();
                println!("Families referenced:");
                for family in stats.family_names() {
                    println!("  {}", family);
                }
            }
        }
        OutputFormat::Json => {
            println!("{:#}", to_json(&stats));
        }
    }
}
