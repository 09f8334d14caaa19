mod compiler;
mod sinks;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use playlink_core::{
    audio::interleave, AppConfig, Collaborators, CompileLinkController, IngestOutcome,
    PlayLinkError, PlaybackState, Upload, WavDecoder,
};
use tracing_subscriber::EnvFilter;

use crate::{
    compiler::PulseCompiler,
    sinks::{ConsoleAnimation, ConsoleEditor, HeadlessAudio},
};

fn main() -> playlink_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { source } => run_check(&source),
        Commands::Play {
            source,
            audio_override,
            syllable_time,
            config,
            output,
        } => run_play(PlayArgs {
            source: &source,
            audio_override: audio_override.as_deref(),
            syllable_time,
            config: config.as_deref(),
            output: output.as_deref(),
        }),
    }
}

fn run_check(source: &Path) -> playlink_core::Result<()> {
    let text = std::fs::read_to_string(source)?;
    let mut compiler = PulseCompiler::new(playlink_core::ASSUMED_SAMPLE_RATE);
    let outcome = playlink_core::Compiler::compile(
        &mut compiler,
        &text,
        AppConfig::default().editor.default_syllable_time_ms,
    );

    for diag in &outcome.diagnostics {
        println!("{}", serde_json::to_string(diag)?);
    }
    if outcome.diagnostics.is_empty() {
        tracing::info!(?source, "source compiles");
        Ok(())
    } else {
        Err(PlayLinkError::msg(format!(
            "{} diagnostic(s) in {}",
            outcome.diagnostics.len(),
            source.display()
        )))
    }
}

struct PlayArgs<'a> {
    source: &'a Path,
    audio_override: Option<&'a Path>,
    syllable_time: Option<f64>,
    config: Option<&'a Path>,
    output: Option<&'a Path>,
}

fn run_play(args: PlayArgs<'_>) -> playlink_core::Result<()> {
    let mut config = match args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    config.editor.initial_source = std::fs::read_to_string(args.source)?;
    tracing::info!(source = ?args.source, "starting headless session");

    let (audio, audio_state) = HeadlessAudio::new();
    let mut controller = CompileLinkController::new(
        &config,
        Collaborators {
            compiler: Box::new(PulseCompiler::new(config.audio.sample_rate)),
            editor: Box::new(ConsoleEditor),
            audio: Box::new(audio),
            animation: Box::new(ConsoleAnimation::default()),
        },
    );

    if let Some(ms) = args.syllable_time {
        if !controller.on_syllable_time_change(ms) {
            tracing::warn!(ms, "syllable time not applied");
        }
    }

    if let Some(path) = args.audio_override {
        let bytes = std::fs::read(path)?;
        let outcome = controller.load_upload(Some(Upload::from_wav_bytes(&bytes)), &WavDecoder)?;
        if let Some(IngestOutcome::Applied(report)) = outcome {
            tracing::info!(
                frames = report.frames,
                published = ?report.published,
                rate_mismatch = report.rate_mismatch,
                "override applied"
            );
        }
    }

    if controller.play()?.is_none() {
        return Err(PlayLinkError::msg(format!(
            "cannot play: {} diagnostic(s)",
            controller.diagnostics().len()
        )));
    }

    loop {
        let event = audio_state.borrow_mut().events.pop_front();
        let Some(event) = event else { break };
        if controller.handle_playback_event(event) == PlaybackState::Stopped {
            break;
        }
    }

    if let Some(path) = args.output {
        let published = audio_state.borrow().published.clone();
        match published {
            Some(clip) => write_clip(path, &clip, config.audio.sample_rate)?,
            None => tracing::warn!("no audio was published"),
        }
    }
    Ok(())
}

fn write_clip(path: &Path, clip: &[playlink_core::Frame], sample_rate: u32) -> playlink_core::Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in interleave(clip) {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    tracing::info!(?path, frames = clip.len(), "published audio written");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile, link and play notation sources headlessly", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a source file and print its diagnostics as JSON lines.
    Check {
        /// Notation source to compile.
        source: PathBuf,
    },
    /// Run one full playback cycle against a source file.
    Play {
        /// Notation source to compile.
        source: PathBuf,
        /// WAV file that replaces the compiled audio.
        #[arg(long = "override")]
        audio_override: Option<PathBuf>,
        /// Milliseconds per syllable pulse.
        #[arg(short, long)]
        syllable_time: Option<f64>,
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Where to write the audio that was last published.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
