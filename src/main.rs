use clap::Parser;
use futures::StreamExt;
use rvidgen::{
    config::API_KEY_BILLING_LINK,
    logger::{self, LogLevel, LoggerConfig},
    AspectRatio, Config, CycleOutcome, EnvKeySelector, GenAiClient, GenAiConfig,
    GenerationController, GenerationForm, ImageFile, KeySession, KeyStatus, Resolution, VideoClient, VideoMode,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "rvidgen", version, about = "Generate videos with Gemini Veo models")]
struct Cli {
    /// Generation mode: text, text-image, start-end, multi-ref
    #[arg(short, long, default_value = "text")]
    mode: VideoMode,

    #[arg(short, long, default_value = "")]
    prompt: String,

    /// Starting frame image
    #[arg(long)]
    start: Option<PathBuf>,

    /// Ending frame image (start-end mode)
    #[arg(long)]
    end: Option<PathBuf>,

    /// Reference image, up to three (multi-ref mode)
    #[arg(long = "reference")]
    references: Vec<PathBuf>,

    #[arg(short, long, default_value = "720p")]
    resolution: Resolution,

    #[arg(short, long, default_value = "16:9")]
    aspect_ratio: AspectRatio,

    /// Extend the generated video with this prompt; repeat to chain extensions
    #[arg(long = "extend")]
    extend_prompts: Vec<String>,

    /// Stop after this many status checks per video
    #[arg(long)]
    max_polls: Option<u32>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    json_logs: bool,

    #[arg(long)]
    list_models: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let logger_config = if cli.verbose {
        LoggerConfig::development()
    } else {
        LoggerConfig::default().with_level(LogLevel::Info)
    }
    .with_json_output(cli.json_logs);
    logger::init_with_config(logger_config)?;

    if dotenv_loaded {
        log::debug!(".env file loaded");
    }
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    if cli.list_models {
        println!("Models:");
        for model in VideoClient::supported_models() {
            println!(
                "  {} - {} ({}): {}",
                model.id, model.name, model.provider, model.description
            );
        }
        println!("Modes:");
        for mode in VideoMode::ALL {
            println!("  {} - {}", mode.name(), mode.description());
        }
        return Ok(());
    }

    if cli.mode == VideoMode::ExtendVideo {
        return Err("extend mode needs a video from this session; use --extend after another mode".into());
    }

    let key_session = Arc::new(KeySession::new(EnvKeySelector));
    if key_session.check_status().await != KeyStatus::Selected
        && key_session.open_selection().await != KeyStatus::Selected
    {
        log::error!("A paid API key is required for video generation models.");
        log::error!("Set GEMINI_API_KEY. Learn about billing: {}", API_KEY_BILLING_LINK);
        return Err("no API key selected".into());
    }

    let mut config = Config::from_env();
    if let Some(max) = cli.max_polls {
        config.generation = config.generation.with_max_poll_attempts(max);
    }
    logger::log_config_info(&config);

    let client = GenAiClient::new(&config.genai)?;
    let mut controller = GenerationController::new(
        client.video(),
        client.api_key(),
        config.generation.clone(),
    )
    .with_key_listener(key_session.clone());

    let mut form = GenerationForm::new(cli.mode)
        .with_prompt(cli.prompt.clone())
        .with_resolution(cli.resolution)
        .with_aspect_ratio(cli.aspect_ratio);
    form.start_image = cli.start.as_ref().map(ImageFile::from_path);
    form.end_image = cli.end.as_ref().map(ImageFile::from_path);
    form.reference_images = cli.references.iter().map(ImageFile::from_path).collect();
    controller.set_form(form);

    let mut succeeded = run_cycle(&controller).await?;
    if !succeeded && reselect_key(&mut controller, &key_session, &config).await? {
        succeeded = run_cycle(&controller).await?;
    }
    if !succeeded {
        return finish_with_failure(&key_session);
    }

    for prompt in &cli.extend_prompts {
        controller.set_mode(VideoMode::ExtendVideo);
        controller.set_prompt(prompt.clone());
        if let Some(previous) = controller.last_video() {
            controller.set_aspect_ratio(previous.aspect_ratio);
        }
        if !run_cycle(&controller).await? {
            return finish_with_failure(&key_session);
        }
    }

    Ok(())
}

/// Runs one cycle, echoing loading messages. Returns false when it failed.
async fn run_cycle(controller: &GenerationController) -> Result<bool, Box<dyn std::error::Error>> {
    let mode = controller.snapshot().form.mode;
    println!("🎬 {}", mode.name());

    let mut updates = controller.status_updates();
    let submit = controller.submit();
    tokio::pin!(submit);

    let outcome = loop {
        tokio::select! {
            outcome = &mut submit => break outcome?,
            Some(message) = updates.next() => println!("⏳ {}", message),
            _ = tokio::signal::ctrl_c() => {
                controller.reset();
                return Err("interrupted".into());
            }
        }
    };

    match outcome {
        CycleOutcome::Completed { video, url } => {
            println!(
                "✅ Video ready ({} {}): {}",
                video.resolution, video.aspect_ratio, url
            );
            Ok(true)
        }
        CycleOutcome::Failed(message) => {
            eprintln!("❌ {}", message);
            Ok(false)
        }
        CycleOutcome::Discarded => Ok(false),
    }
}

/// After a rejected key, asks for a new one and rebuilds the client with it.
/// Returns false when there is nothing to retry.
async fn reselect_key(
    controller: &mut GenerationController,
    key_session: &KeySession<EnvKeySelector>,
    config: &Config,
) -> Result<bool, Box<dyn std::error::Error>> {
    if key_session.status() != KeyStatus::NotSelected
        || key_session.open_selection().await != KeyStatus::Selected
    {
        return Ok(false);
    }

    let genai = match GenAiConfig::from_env().api_key {
        Some(key) if Some(&key) != config.genai.api_key.as_ref() => {
            config.genai.clone().with_api_key(key)
        }
        _ => {
            log::warn!("API key unchanged after re-selection");
            return Ok(false);
        }
    };

    let client = GenAiClient::new(&genai)?;
    controller.set_client(client.video(), client.api_key());
    log::info!("Retrying with the newly selected API key");
    Ok(true)
}

fn finish_with_failure(
    key_session: &KeySession<EnvKeySelector>,
) -> Result<(), Box<dyn std::error::Error>> {
    if key_session.status() == KeyStatus::NotSelected {
        eprintln!("Select a different API key. Learn about billing: {}", API_KEY_BILLING_LINK);
    }
    Err("video generation failed".into())
}
