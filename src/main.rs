//! Mudra recognition application for live camera, video files and still images.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use mudra_recognition::{
    app::{AppConfig, GuiMode, MudraApp, VideoSource},
    classification::OnnxClassifier,
    config::Config,
    frame::{Frame, InvertMode},
    hand_detection::OnnxHandLandmarker,
    pipeline::Pipeline,
    render::Renderer,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Camera index to use
    #[arg(long, default_value = "0")]
    cam: i32,

    /// Video file to process
    #[arg(short, long, conflicts_with = "image")]
    video: Option<String>,

    /// Still image to classify once
    #[arg(long)]
    image: Option<PathBuf>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// GUI display mode (all, cam, none) [default: from config, all]
    #[arg(short, long)]
    gui: Option<String>,

    /// Invert image (none, x, y, xy) [default: from config, x]
    #[arg(short, long)]
    inv: Option<String>,

    /// Angle smoothing filter, e.g. moving_average:5, median:3, exponential:0.5, none
    #[arg(short, long)]
    filter: Option<String>,

    /// Minimum confidence for a recognized label
    #[arg(short, long)]
    threshold: Option<f32>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Write the default configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if let Some(path) = &args.write_config {
        Config::default()
            .to_file(path)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        info!("Default configuration written to {}", path.display());
        return Ok(());
    }

    info!("Mudra Recognition");

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {e}. Using defaults.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    // Command line overrides
    if let Some(filter) = &args.filter {
        config.smoothing.filter.clone_from(filter);
    }
    if let Some(threshold) = args.threshold {
        config.decision.threshold = threshold;
    }
    if let Some(gui) = &args.gui {
        config.display.gui_mode.clone_from(gui);
    }
    if let Some(inv) = &args.inv {
        config.display.invert = InvertMode::parse(inv);
    }
    if args.image.is_some() {
        config.landmarks.static_image_mode = true;
    }

    config.validate().context("Invalid configuration")?;
    config.check_model_paths()?;

    let vocabulary = Arc::new(config.vocabulary()?);
    info!("Vocabulary: {} labels", vocabulary.len());

    let landmarker = OnnxHandLandmarker::new(&config.models.hand_landmarks, config.landmarks)?;
    let classifier = OnnxClassifier::new(&config.models.classifier, Arc::clone(&vocabulary))?;
    let mut pipeline = Pipeline::new(landmarker, classifier, &vocabulary, &config.pipeline_settings())?;

    if let Some(image_path) = &args.image {
        let frame = Frame::open(image_path).with_context(|| format!("Failed to open {}", image_path.display()))?;
        return classify_still(&mut pipeline, &frame, config.decision.top_k);
    }

    let app_config = AppConfig {
        video_source: args.video.map_or(VideoSource::Camera(args.cam), VideoSource::File),
        gui_mode: GuiMode::parse(&config.display.gui_mode),
        invert_mode: config.display.invert,
        show_model_input: config.display.show_model_input,
        model_preview_size: config.display.model_preview_size,
        show_fps: config.display.show_fps,
        target_fps: config.display.target_fps,
    };

    // Create and run application
    let mut app = MudraApp::new(app_config, pipeline, Renderer::new(config.overlay_layout()))?;
    app.run()?;

    Ok(())
}

/// Run the pipeline once and print the decision and top predictions per hand
fn classify_still(
    pipeline: &mut Pipeline<OnnxHandLandmarker, OnnxClassifier>,
    frame: &Frame,
    top_k: usize,
) -> Result<()> {
    let result = pipeline.process_frame(frame)?;
    if result.is_empty() {
        println!("No hand detected");
        return Ok(());
    }

    for (slot, hand) in result.hands.iter().enumerate() {
        match &hand.decision {
            Some(decision) => println!("Hand {slot}: {decision}"),
            None => println!("Hand {slot}: not classified"),
        }
        if let Some(distribution) = &hand.distribution {
            for score in distribution.top_k(top_k) {
                println!("  {}: {:.1}%", score.label, score.probability * 100.0);
            }
        }
    }
    Ok(())
}
