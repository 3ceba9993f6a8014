use anyhow::Result;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use thucchien_gen::app::{load_request, record_failure, App};
use thucchien_gen::config::Config;
use thucchien_gen::models::{ContentKind, GenerationResult};
use thucchien_gen::Error;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "thucchien-gen")]
#[command(about = "Generate text, images, video and speech through the AI gateway")]
struct CliArgs {
    /// Type of content to generate.
    #[arg(value_enum)]
    kind: ContentKind,

    /// Path to the file containing the prompt text.
    prompt_file: PathBuf,

    /// Path to a JSON file with additional arguments for the API.
    #[arg(long, alias = "args_file")]
    args_file: Option<PathBuf>,

    /// Path to an input image file (video generation only).
    #[arg(long, alias = "input_image")]
    input_image: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thucchien_gen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    info!("Starting thucchien-gen ({})", args.kind);

    let prompt_log = Config::prompt_log_from_env();

    let request = match load_request(
        args.kind,
        &args.prompt_file,
        args.args_file.as_deref(),
        args.input_image.as_deref(),
    ) {
        Ok(request) => request,
        Err(e) => {
            let prompt = fs::read_to_string(&args.prompt_file).unwrap_or_default();
            fail(&prompt_log, args.kind, &prompt, e)
        }
    };

    let app = match Config::from_env().and_then(|config| App::new(&config)) {
        Ok(app) => app,
        Err(e) => fail(&prompt_log, args.kind, request.prompt(), e),
    };

    match app.run(&request).await {
        Ok(artifact) => {
            println!("Generation successful!");
            match &artifact.result {
                GenerationResult::Text(text) => println!("{}", text),
                GenerationResult::Binary(_) => println!("Output for {} generated.", artifact.kind),
            }
            println!("Saved {} to {}", artifact.kind, artifact.path.display());
            Ok(())
        }
        Err(e) => {
            println!("Generation failed.");
            println!("{}", e);
            std::process::exit(1);
        }
    }
}

fn fail(prompt_log: &Path, kind: ContentKind, prompt: &str, error: Error) -> ! {
    record_failure(prompt_log, kind, prompt, &error);
    println!("Generation failed.");
    println!("{}", error);
    std::process::exit(1);
}
