use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use emotion_recognizer::analysis::features::{FeatureExtractor, FeatureSelection};
use emotion_recognizer::audio::{wav, Ingestor};
use emotion_recognizer::config::AppConfig;
use emotion_recognizer::error::{log_pipeline_error, PipelineError, PipelineStage};
use emotion_recognizer::http::{run_http_server, AppState};
use emotion_recognizer::model::{load_model, Classifier};
use emotion_recognizer::pipeline::EmotionPipeline;
use emotion_recognizer::plot;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "emotion_cli",
    about = "Speech emotion recognition from MFCC, chroma and mel features"
)]
struct Cli {
    /// JSON config file (defaults to $EMOTION_CONFIG or assets/emotion_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct FeatureFlags {
    /// Leave out the 40 MFCC means
    #[arg(long)]
    no_mfcc: bool,
    /// Leave out the 12 chroma means
    #[arg(long)]
    no_chroma: bool,
    /// Leave out the 128 mel band means
    #[arg(long)]
    no_mel: bool,
}

impl FeatureFlags {
    fn selection(&self) -> FeatureSelection {
        FeatureSelection {
            mfcc: !self.no_mfcc,
            chroma: !self.no_chroma,
            mel: !self.no_mel,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Predict the emotion of an audio file
    Predict {
        input: PathBuf,
        /// Model artifact (overrides the configured path)
        #[arg(long)]
        model: Option<PathBuf>,
        /// Print a JSON report instead of the header line
        #[arg(long)]
        json: bool,
        /// Also write the waveform plot as SVG
        #[arg(long)]
        plot: Option<PathBuf>,
        #[command(flatten)]
        flags: FeatureFlags,
    },
    /// Print the feature vector of an audio file as JSON
    Features {
        input: PathBuf,
        #[command(flatten)]
        flags: FeatureFlags,
    },
    /// Render the waveform of an audio file as SVG
    Plot {
        input: PathBuf,
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Convert an audio file to canonical 16-bit PCM WAV
    Convert {
        input: PathBuf,
        #[arg(long, short)]
        output: PathBuf,
        /// Resample to this rate
        #[arg(long)]
        sample_rate: Option<u32>,
    },
    /// Run the web front end
    Serve {
        /// Bind address (overrides config and $EMOTION_HTTP_ADDR)
        #[arg(long)]
        addr: Option<SocketAddr>,
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct PredictOutput<'a> {
    file: &'a Path,
    label: String,
    header: String,
    sample_rate: u32,
    duration_secs: f32,
    features: &'a [f32],
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => {
            let mut config = AppConfig::load_from_file(path);
            config.apply_env_overrides();
            config
        }
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Predict {
            input,
            model,
            json,
            plot,
            flags,
        } => run_predict(&config, &input, model, json, plot, flags.selection()),
        Commands::Features { input, flags } => run_features(&config, &input, flags.selection()),
        Commands::Plot { input, output } => run_plot(&config, &input, &output),
        Commands::Convert {
            input,
            output,
            sample_rate,
        } => run_convert(&config, &input, &output, sample_rate),
        Commands::Serve { addr, model } => run_serve(config, addr, model),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Exit status per failing stage so scripts can tell the categories apart
fn stage_exit_code(stage: PipelineStage) -> ExitCode {
    match stage {
        PipelineStage::Decode => ExitCode::from(3),
        PipelineStage::Extraction => ExitCode::from(4),
        PipelineStage::Prediction => ExitCode::from(5),
    }
}

fn report_failure(err: PipelineError, input: &Path) -> ExitCode {
    log_pipeline_error(&err, &input.display().to_string());
    eprintln!("Error: {err}");
    stage_exit_code(err.stage())
}

fn load_classifier(config: &AppConfig, model: Option<PathBuf>) -> Result<Arc<dyn Classifier>> {
    let path = model.unwrap_or_else(|| config.model.path.clone());
    let model = load_model(&path).with_context(|| format!("loading model {}", path.display()))?;
    Ok(Arc::new(model))
}

fn run_predict(
    config: &AppConfig,
    input: &Path,
    model: Option<PathBuf>,
    json: bool,
    plot_path: Option<PathBuf>,
    selection: FeatureSelection,
) -> Result<ExitCode> {
    let classifier = load_classifier(config, model)?;
    let pipeline =
        EmotionPipeline::new(config.features.clone(), classifier).with_selection(selection);
    let ingestor = Ingestor::new(config.ingest.clone());

    let clip = match ingestor.ingest_file(input) {
        Ok(clip) => clip,
        Err(err) => return Ok(report_failure(err.into(), input)),
    };
    let wave = match wav::read_wav(clip.path()) {
        Ok(wave) => wave,
        Err(err) => return Ok(report_failure(err.into(), input)),
    };
    let report = match pipeline.predict_waveform(&wave) {
        Ok(report) => report,
        Err(err) => return Ok(report_failure(err, input)),
    };

    if let Some(path) = plot_path {
        plot::write_waveform_svg(&wave, &config.plot, &path)?;
    }

    if json {
        let output = PredictOutput {
            file: input,
            label: report.label.to_string(),
            header: report.header(),
            sample_rate: report.sample_rate,
            duration_secs: report.duration_secs,
            features: report.features.as_slice(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", report.header());
    }
    Ok(ExitCode::from(0))
}

fn run_features(config: &AppConfig, input: &Path, selection: FeatureSelection) -> Result<ExitCode> {
    let ingestor = Ingestor::new(config.ingest.clone());
    let extractor = FeatureExtractor::new(config.features.clone());

    let clip = match ingestor.ingest_file(input) {
        Ok(clip) => clip,
        Err(err) => return Ok(report_failure(err.into(), input)),
    };
    let vector = match extractor.extract_file(clip.path(), selection) {
        Ok(vector) => vector,
        Err(err) => return Ok(report_failure(err.into(), input)),
    };

    println!("{}", serde_json::to_string(vector.as_slice())?);
    Ok(ExitCode::from(0))
}

fn run_plot(config: &AppConfig, input: &Path, output: &Path) -> Result<ExitCode> {
    let ingestor = Ingestor::new(config.ingest.clone());
    let clip = match ingestor.ingest_file(input) {
        Ok(clip) => clip,
        Err(err) => return Ok(report_failure(err.into(), input)),
    };
    let wave = match wav::read_wav(clip.path()) {
        Ok(wave) => wave,
        Err(err) => return Ok(report_failure(err.into(), input)),
    };

    plot::write_waveform_svg(&wave, &config.plot, output)?;
    println!("{}", output.display());
    Ok(ExitCode::from(0))
}

fn run_convert(
    config: &AppConfig,
    input: &Path,
    output: &Path,
    sample_rate: Option<u32>,
) -> Result<ExitCode> {
    let mut ingest_config = config.ingest.clone();
    if sample_rate.is_some() {
        ingest_config.target_sample_rate = sample_rate;
    }
    let ingestor = Ingestor::new(ingest_config);

    let clip = match ingestor.ingest_file(input) {
        Ok(clip) => clip,
        Err(err) => return Ok(report_failure(err.into(), input)),
    };
    let summary = format!(
        "{} ch, {} Hz, {:.2} s",
        clip.channels(),
        clip.sample_rate(),
        clip.duration_secs()
    );
    let written = clip
        .persist(output)
        .with_context(|| format!("writing {}", output.display()))?;

    println!("{} ({})", written.display(), summary);
    Ok(ExitCode::from(0))
}

fn run_serve(config: AppConfig, addr: Option<SocketAddr>, model: Option<PathBuf>) -> Result<ExitCode> {
    let addr = match addr {
        Some(addr) => addr,
        None => config
            .server
            .addr
            .parse()
            .with_context(|| format!("invalid bind address {}", config.server.addr))?,
    };

    let classifier = load_classifier(&config, model)?;
    let pipeline = EmotionPipeline::new(config.features.clone(), classifier);
    let state = AppState::new(pipeline, Ingestor::new(config.ingest.clone()), config.plot.clone())
        .with_request_timeout(Duration::from_secs(config.server.request_timeout_secs));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(run_http_server(state, addr))?;
    Ok(ExitCode::from(0))
}
