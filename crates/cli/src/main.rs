//! CLI tool for generating presentation decks from AI outlines.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use deck_core::expand::DEFAULT_CHUNK_LINES;
use deck_core::{parse_outline, Error as DeckError};
use deck_generator::config::{DEFAULT_STORE_DIR, DEFAULT_TEMPLATE};
use deck_generator::{
    request_outline, BlobStore, DeckAssembler, DeckRequest, DeckService, FsBlobStore,
    GeminiClient, GeneratorConfig, GoogleImageSearch, GroqClient, HttpImageFetcher, ModelKind,
    TextModel,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

/// Generate PowerPoint decks from AI-written outlines.
#[derive(Parser, Debug)]
#[command(name = "deckgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Template deck whose first slides are the title, content and code layouts
    #[arg(short, long, global = true, env = "DECK_TEMPLATE", default_value = DEFAULT_TEMPLATE)]
    template: PathBuf,

    /// Directory rendered decks are stored in
    #[arg(short, long, global = true, env = "DECK_STORE", default_value = DEFAULT_STORE_DIR)]
    store: PathBuf,

    /// Maximum code lines per code slide
    #[arg(long, global = true, default_value_t = DEFAULT_CHUNK_LINES)]
    chunk_lines: usize,

    /// Model request timeout in seconds
    #[arg(long, global = true, default_value = "120")]
    timeout: u64,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask the model for an outline and print it as JSON
    Outline(RequestArgs),

    /// Generate an outline, render it and store the deck
    Generate {
        #[command(flatten)]
        request: RequestArgs,

        /// Look up pictures for slides through Google image search
        #[arg(long)]
        enrich_images: bool,

        /// Also write the deck to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render and store an outline read from a JSON file
    Build {
        /// Outline file: a JSON array whose first entry holds the title
        outline: PathBuf,

        /// Also write the deck to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a stored deck to disk
    Download {
        /// Identifier printed by `generate` or `build`
        id: String,

        /// Output path (default: the stored file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Presentation topic
    title: String,

    /// Maximum number of slides the model should write
    #[arg(short = 'n', long, default_value = "8")]
    slides: usize,

    /// Model provider (groq or gemini)
    #[arg(short, long, default_value_t = ModelKind::Groq)]
    model: ModelKind,

    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    groq_api_key: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: Option<String>,

    #[arg(long, env = "GOOGLE_CX")]
    google_cx: Option<String>,
}

fn main() -> ExitCode {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Client errors (invalid requests, unknown ids) exit with 2, every other
/// failure with 1.
fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<DeckError>() {
        Some(e) if e.is_client_error() => 2,
        _ => 1,
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = GeneratorConfig::new()
        .with_template(&cli.template)
        .with_store_dir(&cli.store)
        .with_chunk_lines(cli.chunk_lines)
        .with_model_timeout(Duration::from_secs(cli.timeout));

    match &cli.command {
        Command::Outline(args) => {
            let model = text_model(args, &config)?;
            let outline = request_outline(model.as_ref(), &deck_request(args))?;
            println!("{}", serde_json::to_string_pretty(&outline)?);
        }
        Command::Generate {
            request,
            enrich_images,
            output,
        } => {
            let mut service = service(&config)?.with_model(text_model(request, &config)?);
            if *enrich_images {
                let (Some(key), Some(cx)) = (&request.google_api_key, &request.google_cx) else {
                    bail!("--enrich-images needs GOOGLE_API_KEY and GOOGLE_CX");
                };
                service = service.with_search(Box::new(GoogleImageSearch::new(key, cx)?));
            }

            let generated = service
                .generate(&deck_request(request).with_image_enrichment(*enrich_images))?;
            if let Some(path) = output {
                write_deck(&service, &generated.id, path)?;
            }
            println!("{}", serde_json::to_string_pretty(&generated)?);
        }
        Command::Build { outline, output } => {
            let text = fs::read_to_string(outline)
                .with_context(|| format!("Failed to read {}", outline.display()))?;
            let outline = parse_outline(&text)
                .with_context(|| format!("Failed to parse outline {}", outline.display()))?;

            let service = service(&config)?;
            let generated = service.build(outline)?;
            if let Some(path) = output {
                write_deck(&service, &generated.id, path)?;
            }
            println!("{}", serde_json::to_string_pretty(&generated)?);
        }
        Command::Download { id, output } => {
            let store = FsBlobStore::open(&config.store_dir)?;
            let deck = store.retrieve(id)?;
            let path = output.clone().unwrap_or_else(|| PathBuf::from(&deck.name));
            write_file(&path, &deck.bytes)?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn deck_request(args: &RequestArgs) -> DeckRequest {
    DeckRequest::new(&args.title, args.slides)
}

/// Build the client for the selected provider from its API key.
fn text_model(args: &RequestArgs, config: &GeneratorConfig) -> Result<Box<dyn TextModel>> {
    let key = match args.model {
        ModelKind::Groq => args.groq_api_key.as_deref(),
        ModelKind::Gemini => args.gemini_api_key.as_deref(),
    }
    .filter(|key| !key.trim().is_empty())
    .with_context(|| format!("{} is not set", args.model.api_key_var()))?;

    log::debug!("Using {} with a {:?} timeout", args.model, config.model_timeout);
    let model: Box<dyn TextModel> = match args.model {
        ModelKind::Groq => Box::new(GroqClient::new(key, config.model_timeout)?),
        ModelKind::Gemini => Box::new(GeminiClient::new(key, config.model_timeout)?),
    };
    Ok(model)
}

fn service(config: &GeneratorConfig) -> Result<DeckService> {
    let assembler = DeckAssembler::from_path(&config.template_path)
        .with_context(|| {
            format!(
                "Failed to load template {}",
                config.template_path.display()
            )
        })?
        .with_expander(config.expander());
    let store = FsBlobStore::open(&config.store_dir).with_context(|| {
        format!(
            "Failed to open store directory {}",
            config.store_dir.display()
        )
    })?;

    Ok(DeckService::new(
        Box::new(HttpImageFetcher::new()?),
        Box::new(store),
        assembler,
    ))
}

fn write_deck(service: &DeckService, id: &str, path: &Path) -> Result<()> {
    let deck = service.download(id)?;
    write_file(path, &deck.bytes)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "deckgen",
            "generate",
            "Cloud Trends",
            "-n",
            "5",
            "--model",
            "gemini",
            "--enrich-images",
            "--chunk-lines",
            "10",
        ])
        .unwrap();

        assert_eq!(cli.chunk_lines, 10);
        match cli.command {
            Command::Generate {
                request,
                enrich_images,
                output,
            } => {
                assert_eq!(request.title, "Cloud Trends");
                assert_eq!(request.slides, 5);
                assert_eq!(request.model, ModelKind::Gemini);
                assert!(enrich_images);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_model_rejected() {
        assert!(Cli::try_parse_from(["deckgen", "outline", "AI", "--model", "gpt"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let invalid = anyhow::Error::new(DeckError::InvalidRequest("empty".into()));
        assert_eq!(exit_code(&invalid), 2);

        let wrapped =
            anyhow::Error::new(DeckError::InvalidRequest("empty".into())).context("generate");
        assert_eq!(exit_code(&wrapped), 2);

        let unknown = anyhow::Error::new(DeckError::NotFound("no deck with id x".into()));
        assert_eq!(exit_code(&unknown), 2);

        let remote = anyhow::Error::new(DeckError::RemoteFetch("503".into()));
        assert_eq!(exit_code(&remote), 1);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }
}
