//! CLI for ugcshot - UGC-style food shots via Gemini.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use ugcshot::{GeminiModel, GeminiProvider, Session, SessionState, UploadedImage};

#[derive(Parser)]
#[command(name = "ugcshot")]
#[command(about = "Turn a food photo into three UGC-style marketing shots (Gemini)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate three UGC shots from a food photo
    Generate(GenerateArgs),

    /// Print the prompts a batch would send
    Prompts(PromptsArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Food photo (PNG, JPEG or WebP)
    #[arg(short, long)]
    food: PathBuf,

    /// Optional photo of the person to feature
    #[arg(short, long)]
    person: Option<PathBuf>,

    /// Directory the shots are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Gemini model to use
    #[arg(short, long, value_enum, default_value = "nano-banana")]
    model: ModelArg,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Args)]
struct PromptsArgs {
    /// Use the template for batches that include a person photo
    #[arg(long)]
    with_person: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    NanoBanana,
    NanoBananaPro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::NanoBanana => GeminiModel::NanoBanana,
            ModelArg::NanoBananaPro => GeminiModel::NanoBananaPro,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "ugcshot=debug" } else { "ugcshot=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate(args) => {
            generate(args, cli.json).await?;
        }
        Commands::Prompts(args) => {
            print_prompts(args, cli.json)?;
        }
    }

    Ok(())
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let mut builder = GeminiProvider::builder().model(args.model.into());
    if let Some(secs) = args.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let provider = builder.build()?;

    let mut session = Session::new();
    let food = UploadedImage::from_path(&args.food)
        .with_context(|| format!("cannot use food photo {}", args.food.display()))?;
    session.upload_food(food);

    if let Some(ref person_path) = args.person {
        let person = UploadedImage::from_path(person_path)
            .with_context(|| format!("cannot use person photo {}", person_path.display()))?;
        session.upload_person(person);
    }

    tracing::info!(
        food = %args.food.display(),
        with_person = args.person.is_some(),
        model = GeminiModel::from(args.model).as_str(),
        "generating UGC shots"
    );

    let shots = match session.generate(&provider).await {
        SessionState::Success(shots) => shots,
        SessionState::Failure(message) => anyhow::bail!("{}", message),
        other => anyhow::bail!("generation did not settle: {:?}", other),
    };

    let paths = shots.save_all(&args.output_dir)?;

    if json_output {
        let images: Vec<_> = shots
            .shots()
            .iter()
            .zip(&paths)
            .map(|(shot, path)| {
                serde_json::json!({
                    "file": path.display().to_string(),
                    "size_bytes": shot.image.size(),
                    "variation": shot.prompt_index,
                    "duration_ms": shot.image.metadata.duration_ms,
                })
            })
            .collect();
        let result = serde_json::json!({
            "success": true,
            "requested": shots.requested(),
            "succeeded": shots.len(),
            "model": provider.model().as_str(),
            "images": images,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for (shot, path) in shots.shots().iter().zip(&paths) {
            println!("Saved {} ({} bytes)", path.display(), shot.image.size());
        }
        if shots.is_partial() {
            println!(
                "Only {} of {} images could be generated.",
                shots.len(),
                shots.requested()
            );
        }
    }

    Ok(())
}

fn print_prompts(args: PromptsArgs, json_output: bool) -> anyhow::Result<()> {
    let prompts = ugcshot::assemble_prompts(args.with_person);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&prompts)?);
    } else {
        for (i, prompt) in prompts.iter().enumerate() {
            println!("--- prompt {} ---{}\n", i + 1, prompt);
        }
    }

    Ok(())
}
