mod display;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use spamlens_ai::{ArtifactSource, Artifacts, load_vocabulary};
use spamlens_core::{DEFAULT_THRESHOLD, Encoder, MAX_LEN, PipelineConfig};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spamlens", version, about = "Classify text messages as spam or ham")]
struct Cli {
    /// Directory or URL holding `model.onnx` and `word_index.json`.
    #[arg(
        long,
        env = "SPAMLENS_MODEL_DIR",
        default_value = "models/spam-classifier",
        global = true
    )]
    model_dir: String,

    /// Vocabulary location, if not alongside the model.
    #[arg(long, env = "SPAMLENS_VOCAB", global = true)]
    vocab: Option<String>,

    /// Sequence length the model was trained with.
    #[arg(long, env = "SPAMLENS_MAX_LEN", default_value_t = MAX_LEN, global = true)]
    max_len: usize,

    /// Scores strictly above this are spam.
    #[arg(long, env = "SPAMLENS_THRESHOLD", default_value_t = DEFAULT_THRESHOLD, global = true)]
    threshold: f32,

    /// Give up on a prediction after this many milliseconds.
    #[arg(long, env = "SPAMLENS_TIMEOUT_MS", global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a message (argument, --file, or stdin).
    Analyze {
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the encoded id sequence for a message.
    Encode {
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Show vocabulary statistics.
    Vocab,
}

impl Cli {
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let config = PipelineConfig {
            max_len: self.max_len,
            threshold: self.threshold,
            timeout_ms: self.timeout_ms,
        };
        config.validate()?;
        Ok(config)
    }

    fn artifacts(&self) -> Artifacts {
        let mut artifacts = Artifacts::under(&ArtifactSource::parse(&self.model_dir));
        if let Some(vocab) = &self.vocab {
            artifacts.vocabulary = ArtifactSource::parse(vocab);
        }
        artifacts
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.pipeline_config()?;
    let artifacts = cli.artifacts();
    tracing::debug!(?artifacts, ?config, "spamlens v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Analyze { text, file, json } => {
            let message = read_message(text, file).await?;
            cmd_analyze(&artifacts, config, &message, json).await
        }
        Command::Encode { text, file } => {
            let message = read_message(text, file).await?;
            cmd_encode(&artifacts, &config, &message).await
        }
        Command::Vocab => cmd_vocab(&artifacts).await,
    }
}

#[cfg(feature = "onnx")]
async fn cmd_analyze(
    artifacts: &Artifacts,
    config: PipelineConfig,
    message: &str,
    json: bool,
) -> anyhow::Result<()> {
    use spamlens_ai::{OnnxModel, SpamPipeline, load_onnx};

    let mut pipeline = SpamPipeline::<OnnxModel>::new(config)?;
    eprintln!("Status: Loading AI model... Please wait.");
    pipeline
        .initialize(|| load_onnx(artifacts))
        .await
        .context("Failed to load AI model")?;
    tracing::info!(state = pipeline.state().as_str(), "AI ready");

    let Some(result) = pipeline.analyze(message).await.context("analyzing message")? else {
        eprintln!("Nothing to analyze.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result.to_response())?);
    } else {
        display::print_result(&result);
    }
    Ok(())
}

#[cfg(not(feature = "onnx"))]
async fn cmd_analyze(
    _artifacts: &Artifacts,
    _config: PipelineConfig,
    _message: &str,
    _json: bool,
) -> anyhow::Result<()> {
    anyhow::bail!("spamlens was built without the `onnx` feature; `analyze` is unavailable")
}

async fn cmd_encode(
    artifacts: &Artifacts,
    config: &PipelineConfig,
    message: &str,
) -> anyhow::Result<()> {
    let vocab = load_vocabulary(&artifacts.vocabulary)
        .await
        .with_context(|| format!("loading vocabulary from {}", artifacts.vocabulary))?;
    let encoder = Encoder::new(Arc::new(vocab), config.max_len);

    match encoder.encode(message) {
        Some(encoded) => display::print_encoded(&encoded),
        None => eprintln!("Nothing to encode."),
    }
    Ok(())
}

async fn cmd_vocab(artifacts: &Artifacts) -> anyhow::Result<()> {
    let vocab = load_vocabulary(&artifacts.vocabulary)
        .await
        .with_context(|| format!("loading vocabulary from {}", artifacts.vocabulary))?;
    display::print_vocab_summary(&vocab.summary());
    Ok(())
}

/// Message text from the argument, a file, or stdin (for piped or pasted input).
async fn read_message(text: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        return Ok(strip_line_ending(contents));
    }

    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .context("reading message from stdin")?;
    Ok(strip_line_ending(buf))
}

/// Drop one trailing `\n` or `\r\n` so the last word still matches the vocabulary.
fn strip_line_ending(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use spamlens_core::Vocabulary;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_point_at_model_dir() {
        let cli = Cli::try_parse_from(["spamlens", "vocab"]).unwrap();
        let artifacts = cli.artifacts();
        assert_eq!(
            artifacts.vocabulary,
            ArtifactSource::File(PathBuf::from("models/spam-classifier/word_index.json"))
        );
        assert_eq!(cli.pipeline_config().unwrap(), PipelineConfig::default());
    }

    #[test]
    fn vocab_override_and_tuning_flags() {
        let cli = Cli::try_parse_from([
            "spamlens",
            "analyze",
            "hello",
            "--vocab",
            "https://example.com/word_index.json",
            "--threshold",
            "0.8",
            "--timeout-ms",
            "500",
        ])
        .unwrap();
        assert_eq!(
            cli.artifacts().vocabulary,
            ArtifactSource::Url("https://example.com/word_index.json".into())
        );
        let config = cli.pipeline_config().unwrap();
        assert_eq!(config.threshold, 0.8);
        assert_eq!(config.timeout_ms, Some(500));
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let cli = Cli::try_parse_from(["spamlens", "vocab", "--threshold", "1.5"]).unwrap();
        assert!(cli.pipeline_config().is_err());
    }

    #[tokio::test]
    async fn message_argument_wins() {
        let msg = read_message(Some("hi".into()), None).await.unwrap();
        assert_eq!(msg, "hi");
    }

    #[tokio::test]
    async fn message_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("message.txt");
        tokio::fs::write(&path, "WIN a prize").await.unwrap();

        let msg = read_message(None, Some(path)).await.unwrap();
        assert_eq!(msg, "WIN a prize");
    }

    #[tokio::test]
    async fn file_line_ending_does_not_hide_last_word() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("message.txt");
        tokio::fs::write(&path, "win free prize\n").await.unwrap();

        let msg = read_message(None, Some(path)).await.unwrap();
        let vocab: Vocabulary = [("win", 1), ("free", 2), ("prize", 3)].into_iter().collect();
        let encoded = Encoder::new(Arc::new(vocab), MAX_LEN).encode(&msg).unwrap();
        assert_eq!(&encoded.as_slice()[MAX_LEN - 3..], &[1, 2, 3]);
    }

    #[test]
    fn strips_exactly_one_line_ending() {
        assert_eq!(strip_line_ending("hi\n".into()), "hi");
        assert_eq!(strip_line_ending("hi\r\n".into()), "hi");
        assert_eq!(strip_line_ending("hi\n\n".into()), "hi\n");
        assert_eq!(strip_line_ending("a\nb".into()), "a\nb");
        assert_eq!(strip_line_ending("hi".into()), "hi");
    }

    #[tokio::test]
    async fn argument_keeps_line_ending() {
        let msg = read_message(Some("hi\n".into()), None).await.unwrap();
        assert_eq!(msg, "hi\n");
    }
}
