use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use rpollen::logger::{self, LoggerConfig};
use rpollen::models::{Capability, GenerationRequest, ModelFilter};
use rpollen::{Config, Session};

/// Command line client for the Pollinations.ai image API
#[derive(Parser)]
#[command(name = "rpollen", version, about = "Generate images with Pollinations.ai")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an image from a text prompt
    Generate {
        /// Prompt describing the image
        prompt: String,

        /// Model to generate with
        #[arg(short, long, default_value = "flux")]
        model: String,

        /// Output size as WIDTHxHEIGHT, e.g. 1024x1024
        #[arg(long, conflicts_with = "aspect")]
        size: Option<String>,

        /// Aspect preset
        #[arg(long, value_enum)]
        aspect: Option<Aspect>,

        /// Reference image URL for image-to-image models
        #[arg(long)]
        reference: Option<String>,

        /// Where to save the image (defaults to ./rpollen-{seed}.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List available models
    Models {
        /// Only free models
        #[arg(long, conflicts_with = "paid")]
        free: bool,

        /// Only paid models
        #[arg(long)]
        paid: bool,

        /// Only models that accept text prompts
        #[arg(long, conflicts_with = "i2i")]
        t2i: bool,

        /// Only models that accept a reference image
        #[arg(long)]
        i2i: bool,

        /// Only models with a success rate of at least 90%
        #[arg(long)]
        healthy: bool,

        /// Match against model names and descriptions
        #[arg(long)]
        search: Option<String>,
    },

    /// Show account balance and profile
    Account,

    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store an API key
    Set { key: String },
    /// Show whether a key is stored
    Show,
    /// Remove the stored key
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum Aspect {
    /// 1024x1024
    Square,
    /// 1920x1080
    Landscape,
    /// 1080x1920
    Portrait,
}

impl Aspect {
    fn dimensions(self) -> (u32, u32) {
        match self {
            Aspect::Square => (1024, 1024),
            Aspect::Landscape => (1920, 1080),
            Aspect::Portrait => (1080, 1920),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let env_loaded = dotenv::dotenv().is_ok();

    let logger_config = if cli.verbose {
        LoggerConfig::development()
    } else {
        LoggerConfig::quiet()
    };
    logger::init_with_config(logger_config)?;

    if env_loaded {
        log::debug!("✅ .env file loaded successfully");
    } else {
        log::debug!("No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    if cli.verbose {
        logger::log_startup_info("rpollen", env!("CARGO_PKG_VERSION"));
        logger::log_config_info(&config);
    }
    let mut session = Session::from_config(&config)?;
    session.load_preferences().await;

    match cli.command {
        Commands::Generate {
            prompt,
            model,
            size,
            aspect,
            reference,
            output,
        } => cmd_generate(&mut session, prompt, model, size, aspect, reference, output).await,
        Commands::Models {
            free,
            paid,
            t2i,
            i2i,
            healthy,
            search,
        } => cmd_models(&session, free, paid, t2i, i2i, healthy, search).await,
        Commands::Account => cmd_account(&mut session).await,
        Commands::Key { action } => cmd_key(&mut session, action).await,
    }
}

async fn cmd_generate(
    session: &mut Session,
    prompt: String,
    model: String,
    size: Option<String>,
    aspect: Option<Aspect>,
    reference: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let (width, height) = match (size, aspect) {
        (Some(size), _) => parse_size(&size)?,
        (None, Some(aspect)) => aspect.dimensions(),
        (None, None) => Aspect::Square.dimensions(),
    };

    let mut request = GenerationRequest::new(prompt)
        .with_size(width, height)
        .with_model(model);
    if let Some(reference) = reference {
        request = request.with_reference_image(reference);
    }

    {
        let _timer = logger::timer("image generation");
        session.generate(request).await;
    }

    if let Some(image) = session.state().displayed_image() {
        let destination = output.unwrap_or_else(|| PathBuf::from(image.suggested_filename()));
        image.handle.save_to(&destination)?;
        println!(
            "💾 Saved {}x{} image (model {}, seed {}) to {}",
            width,
            height,
            image.model,
            image.seed,
            destination.display()
        );
        return Ok(());
    }

    if let Some(message) = session.state().error_message() {
        return Err(message.to_string().into());
    }

    log::warn!("Prompt was empty, nothing was generated");
    Ok(())
}

async fn cmd_models(
    session: &Session,
    free: bool,
    paid: bool,
    t2i: bool,
    i2i: bool,
    healthy: bool,
    search: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let catalog = session.client().catalog().fetch().await;
    if catalog.is_offline() {
        println!("⚠️  Live catalog unreachable, showing the offline model list");
    }

    let mut filter = ModelFilter::new();
    if free {
        filter = filter.free_only();
    }
    if paid {
        filter = filter.paid_only();
    }
    if t2i {
        filter = filter.with_capability(Capability::TextToImage);
    }
    if i2i {
        filter = filter.with_capability(Capability::ImageToImage);
    }
    if healthy {
        filter = filter.healthy();
    }
    if let Some(needle) = search {
        filter = filter.with_search(needle);
    }

    let models = catalog.filter(&filter);
    println!("{} model(s)", models.len());
    for model in models {
        let caps = match (model.capabilities.accepts_text, model.capabilities.accepts_image) {
            (true, true) => "t2i+i2i",
            (true, false) => "t2i",
            (false, true) => "i2i",
            (false, false) => "-",
        };
        let price = if model.pricing.unit_cost > 0.0 {
            format!("{} {}", model.pricing.unit_cost, model.pricing.currency)
        } else {
            model.pricing.tier.to_string()
        };
        println!(
            "  {:<16} {:<24} {:>5.1}% ok {:>6.1}s  {:<8} {}",
            model.name,
            model.description,
            model.health.success_rate_percent,
            model.health.avg_response_seconds,
            caps,
            price
        );
    }

    Ok(())
}

async fn cmd_account(session: &mut Session) -> Result<(), Box<dyn Error>> {
    if session.api_key().is_none() {
        println!("No API key set. Store one with: rpollen key set <KEY>");
        return Ok(());
    }

    session.refresh_account().await;
    let account = session.account();
    println!("👤 {}", account.display_name_or_default());
    println!("   Tier: {}", account.tier_or_default());
    println!("   Balance: {} Pollen", account.balance_or_zero());
    Ok(())
}

async fn cmd_key(session: &mut Session, action: KeyAction) -> Result<(), Box<dyn Error>> {
    match action {
        KeyAction::Set { key } => {
            session.set_api_key(Some(&key)).await?;
            println!("🔑 API key saved");

            session.refresh_account().await;
            let account = session.account();
            if !account.is_empty() {
                println!(
                    "   Signed in as {} ({})",
                    account.display_name_or_default(),
                    account.tier_or_default()
                );
            }
        }
        KeyAction::Show => match session.api_key() {
            Some(key) => println!("🔑 Key stored, starts with: {}...", key_preview(key)),
            None => println!("No API key stored"),
        },
        KeyAction::Clear => {
            session.set_api_key(None).await?;
            println!("🔑 API key cleared");
        }
    }
    Ok(())
}

/// First few characters of the stored key for display. Keys are
/// arbitrary text, so the cut has to land on a character boundary.
fn key_preview(key: &str) -> String {
    key.chars().take(5).collect()
}

fn parse_size(raw: &str) -> Result<(u32, u32), Box<dyn Error>> {
    let normalized = raw.to_lowercase();
    let (width, height) = normalized
        .split_once('x')
        .ok_or_else(|| format!("Size must look like 1024x1024, got '{}'", raw))?;
    let (width, height) = (width.trim().parse()?, height.trim().parse()?);
    if width == 0 || height == 0 {
        return Err(format!("Size must be positive, got '{}'", raw).into());
    }
    Ok((width, height))
}
