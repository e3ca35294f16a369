use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Import modules from the library crate
use shadematch::analysis::{
    DetectorCell, FaceDetector, FaceLandmarks, Keypoint, SampleRegionSelector, SkinToneAnalysis,
    SkinToneAnalyzer, SkinToneClassifier, StaticLandmarkDetector,
};
use shadematch::catalog::{HttpShadeCatalog, Season, ShadeCatalog, StaticShadeCatalog};
use shadematch::config;
use shadematch::dispenser::{CommandChannel, DispenseSequencer};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Capture frame to analyze (any format the image crate reads).
    #[clap(long, value_parser = parse_path)]
    pub image: Option<PathBuf>,

    /// JSON keypoint dump enabling landmark-driven sampling for --image.
    #[clap(long, value_parser = parse_path)]
    pub landmarks: Option<PathBuf>,

    /// Season of the shade to resolve. Defaults to the primary season of
    /// the analysis when --image was given.
    #[clap(long)]
    pub season: Option<String>,

    /// Shade name to resolve (case-insensitive).
    #[clap(long)]
    pub shade: Option<String>,

    /// Drive the rig through the blend sequence for the resolved shade.
    #[clap(long)]
    pub dispense: bool,

    /// Send the rig to its home position before exiting.
    #[clap(long)]
    pub home: bool,

    /// Use the bundled catalog instead of the HTTP store.
    #[clap(long)]
    pub offline_catalog: bool,

    /// The rig bridge websocket URL.
    #[clap(long)]
    pub rig_url: Option<String>,

    /// The catalog store base URL.
    #[clap(long)]
    pub catalog_url: Option<String>,

    /// Timeout in seconds for catalog requests.
    #[clap(long, default_value_t = 10)]
    pub catalog_timeout_sec: u64,

    /// Number of analyses retained in the session history.
    #[clap(long, default_value_t = 5)]
    pub history_limit: usize,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            rig_url: args.rig_url.clone(),
            catalog_url: args.catalog_url.clone(),
            catalog_timeout_sec: args.catalog_timeout_sec,
            history_limit: args.history_limit,
        }
    }
}

fn build_catalog(args: &CliArgs, app_config: &config::AppConfig) -> Arc<dyn ShadeCatalog> {
    if args.offline_catalog {
        Arc::new(StaticShadeCatalog::default())
    } else {
        Arc::new(HttpShadeCatalog::new(
            app_config.catalog_url.clone(),
            app_config.catalog_timeout_sec,
        ))
    }
}

/// Analyze a still capture frame.
///
/// Pipeline errors are advisories, not failures: they are reported and
/// `None` is returned so the caller can proceed (or retry).
async fn analyze_capture(
    image_path: &Path,
    landmarks_path: Option<&Path>,
    app_config: &config::AppConfig,
) -> Result<Option<SkinToneAnalysis>> {
    let frame = image::open(image_path)
        .with_context(|| format!("Failed to read capture frame: {:?}", image_path))?
        .to_rgb8();

    let selector = match landmarks_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read landmarks file: {:?}", path))?;
            let keypoints: Vec<Keypoint> = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse landmarks file: {:?}", path))?;
            let detector: Arc<dyn FaceDetector> =
                Arc::new(StaticLandmarkDetector::new(FaceLandmarks::new(keypoints)));
            SampleRegionSelector::landmark_driven(
                Arc::new(DetectorCell::preloaded(detector)),
                app_config.detection_retry.clone(),
            )
        }
        None => SampleRegionSelector::fixed(),
    };

    let mut analyzer = SkinToneAnalyzer::new(
        selector,
        SkinToneClassifier::new(app_config.thresholds),
    )
    .with_history_limit(app_config.history_limit);

    match analyzer.analyze(&frame).await {
        Ok(analysis) => {
            println!("{}", serde_json::to_string_pretty(&analysis)?);
            info!("{}", analysis.light_condition.advice());
            Ok(Some(analysis))
        }
        Err(e) => {
            warn!(error = %e, "analysis did not produce a result");
            eprintln!("Analysis advisory: {}", e);
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  rig_url: {}", app_config.rig_url);
    info!("  catalog_url: {}", app_config.catalog_url);
    info!("  thresholds: {:?}", app_config.thresholds);

    let analysis = match &cli_args.image {
        Some(image_path) => {
            analyze_capture(image_path, cli_args.landmarks.as_deref(), &app_config).await?
        }
        None => None,
    };

    // Resolve a shade when requested; an invalid season/name pair is a
    // caller error and fails hard.
    let resolved = match &cli_args.shade {
        Some(shade_name) => {
            let season: Season = match &cli_args.season {
                Some(s) => s.parse().map_err(|e: String| anyhow::anyhow!(e))?,
                None => analysis
                    .as_ref()
                    .map(|a| a.primary_season())
                    .context("--season is required when no analysis was run")?,
            };
            let catalog = build_catalog(&cli_args, &app_config);
            let shade = catalog.lookup(season, shade_name).await?;
            info!(season = %season, shade = %shade.name, pumps = shade.ingredients.total_pumps(), "shade resolved");
            println!("{}", serde_json::to_string_pretty(&shade)?);
            Some((season, shade))
        }
        None => None,
    };

    if cli_args.dispense || cli_args.home {
        // Rig unavailability degrades gracefully; it never blocks the
        // rest of the run.
        let channel = match CommandChannel::connect(&app_config.rig_url).await {
            Ok(channel) => channel,
            Err(e) => {
                warn!(error = %e, "rig bridge unavailable, skipping rig actions");
                return Ok(());
            }
        };

        let catalog = build_catalog(&cli_args, &app_config);
        let mut sequencer = DispenseSequencer::attach(catalog, &channel)
            .await
            .with_settle_delay(app_config.settle_delay);

        if cli_args.dispense {
            let (season, shade) = resolved
                .as_ref()
                .context("--dispense requires --shade")?;
            sequencer.select_shade(*season, &shade.name).await?;
            let session = sequencer.run_to_completion().await?;
            println!("{}", serde_json::to_string(&session)?);
        }

        if cli_args.home {
            sequencer.home_best_effort().await;
        }

        channel.disconnect();
    }

    Ok(())
}
