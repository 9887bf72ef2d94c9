//! Insight Batch - runs a capped batch of reviews or images through Ollama
//! and prints the report as JSON.
//!
//! ```text
//! insight-batch reviews <file.json> [--cap N] [--model NAME] [--out FILE]
//! insight-batch images <dir> [--cap N] [--model NAME] [--out FILE]
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use review_insight_backend::sources::{load_image_dir, load_reviews};
use review_insight_backend::{logging, BatchJob, BatchOrchestrator, Config, OllamaClient};

#[derive(Debug, Parser)]
#[command(name = "insight-batch")]
#[command(version, about = "Run a capped analysis batch and print the report as JSON")]
struct Args {
    #[command(subcommand)]
    source: Source,

    /// Maximum number of items to analyse (default: batch.default_cap)
    #[arg(long, global = true)]
    cap: Option<usize>,

    /// Model to use instead of the configured one
    #[arg(long, global = true)]
    model: Option<String>,

    /// Write the report here instead of stdout
    #[arg(long, global = true)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Source {
    /// One-word sentiment for each review in a JSON file
    Reviews {
        /// JSON array of {id, text, subjectId?}
        file: PathBuf,
    },

    /// Animal profile for each image in a directory
    Images {
        /// Directory with jpg/jpeg/png/gif files
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load()?;

    logging::init(&config.logging.level);

    let (items, job) = match &args.source {
        Source::Reviews { file } => (load_reviews(file)?, BatchJob::reviews(&config.ollama)),
        Source::Images { dir } => (load_image_dir(dir)?, BatchJob::images(&config.ollama)),
    };
    let job = job.with_model(args.model.clone());
    let cap = args.cap.unwrap_or(config.batch.default_cap);

    tracing::info!(source = ?args.source, loaded = items.len(), cap, "Loaded work items");

    let client = Arc::new(OllamaClient::new(&config.ollama.base_url));
    let orchestrator = BatchOrchestrator::new(client, config.batch.concurrency);

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let report = orchestrator.run_until(items, cap, &job, shutdown).await;

    let json = serde_json::to_string_pretty(&report)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => println!("{}", json),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reviews_defaults() {
        let args = Args::try_parse_from(["insight-batch", "reviews", "reviews.json"]).unwrap();
        assert_eq!(
            args.source,
            Source::Reviews {
                file: PathBuf::from("reviews.json")
            }
        );
        assert_eq!(args.cap, None);
        assert_eq!(args.model, None);
        assert_eq!(args.out, None);
    }

    #[test]
    fn test_parse_images_with_options() {
        let args = Args::try_parse_from([
            "insight-batch", "images", "pics", "--cap", "5", "--model", "llava", "--out", "report.json",
        ])
        .unwrap();
        assert_eq!(args.source, Source::Images { dir: PathBuf::from("pics") });
        assert_eq!(args.cap, Some(5));
        assert_eq!(args.model.as_deref(), Some("llava"));
        assert_eq!(args.out, Some(PathBuf::from("report.json")));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Args::try_parse_from(["insight-batch"]).is_err());
        assert!(Args::try_parse_from(["insight-batch", "videos", "x"]).is_err());
        assert!(Args::try_parse_from(["insight-batch", "reviews"]).is_err());
        assert!(Args::try_parse_from(["insight-batch", "reviews", "r.json", "--cap", "-1"]).is_err());
        assert!(Args::try_parse_from(["insight-batch", "reviews", "r.json", "--cap"]).is_err());
        assert!(Args::try_parse_from(["insight-batch", "reviews", "r.json", "--verbose"]).is_err());
    }

    #[test]
    fn test_command_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
