//! Keeps the compiled artifact, the published audio and the playback
//! session consistent with the text being edited.

use crate::{
    cache::{ArtifactState, CompiledArtifactCache},
    compile::{CompiledArtifact, Compiler, Diagnostic},
    config::AppConfig,
    decode::{AudioDecoder, DecodedAudio, Upload},
    overrides::{AudioOverrideProcessor, DecodeTicket, IngestOutcome},
    playback::{PlaybackSessionController, PlaybackState},
    sinks::{AnimationSink, AudioSink, EditorSink, MarkerSeverity, PlaybackEvent, SessionId},
    Result,
};

/// Owner id under which compiler markers are reported.
pub const MARKER_OWNER: &str = "playlink";

/// External services one editor instance talks to. Each controller owns its
/// own set, so several editors can coexist.
pub struct Collaborators {
    pub compiler: Box<dyn Compiler>,
    pub editor: Box<dyn EditorSink>,
    pub audio: Box<dyn AudioSink>,
    pub animation: Box<dyn AnimationSink>,
}

/// Upload payload waiting to be decoded. Hand the result back through
/// [`CompileLinkController::finish_decode`] with the same ticket.
#[derive(Debug, Clone)]
pub struct PendingDecode {
    pub ticket: DecodeTicket,
    pub payload: Vec<u8>,
}

impl PendingDecode {
    pub fn decode(&self, decoder: &dyn AudioDecoder) -> Result<DecodedAudio> {
        decoder.decode(&self.payload)
    }
}

pub struct CompileLinkController {
    composition: String,
    syllable_time_ms: f64,
    min_syllable_time_ms: f64,
    cache: CompiledArtifactCache,
    overrides: AudioOverrideProcessor,
    playback: PlaybackSessionController,
    collaborators: Collaborators,
}

impl CompileLinkController {
    /// Builds a controller and compiles the configured initial source, the
    /// same way the editor compiles its content when it first mounts.
    pub fn new(config: &AppConfig, collaborators: Collaborators) -> Self {
        let mut controller = Self {
            composition: config.editor.initial_source.clone(),
            syllable_time_ms: config.editor.default_syllable_time_ms,
            min_syllable_time_ms: config.editor.min_syllable_time_ms.max(1.0),
            cache: CompiledArtifactCache::new(),
            overrides: AudioOverrideProcessor::new(&config.audio),
            playback: PlaybackSessionController::new(),
            collaborators,
        };
        controller.recompile();
        controller
    }

    pub fn composition(&self) -> &str {
        &self.composition
    }

    pub fn syllable_time_ms(&self) -> f64 {
        self.syllable_time_ms
    }

    pub fn artifact_state(&self) -> ArtifactState {
        self.cache.state()
    }

    pub fn is_ready(&self) -> bool {
        self.cache.is_ready()
    }

    /// Diagnostics of the most recent compilation.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.cache.diagnostics()
    }

    pub fn cache(&self) -> &CompiledArtifactCache {
        &self.cache
    }

    pub fn overrides(&self) -> &AudioOverrideProcessor {
        &self.overrides
    }

    pub fn playback(&self) -> &PlaybackSessionController {
        &self.playback
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    /// Whether a play request would currently be accepted.
    pub fn can_play(&self) -> bool {
        self.cache.is_ready()
            && !self.playback.is_active()
            && !self.collaborators.audio.is_playing()
    }

    /// Syllable time may only change while no session is active.
    pub fn can_edit_syllable_time(&self) -> bool {
        !self.playback.is_active()
    }

    /// Replaces the composition and recompiles.
    pub fn on_edit(&mut self, new_text: impl Into<String>) -> ArtifactState {
        self.composition = new_text.into();
        self.recompile()
    }

    /// Applies a new syllable time. Values below the minimum, non-finite
    /// values and changes during playback are refused.
    pub fn on_syllable_time_change(&mut self, value: f64) -> bool {
        if !value.is_finite() || value < self.min_syllable_time_ms {
            tracing::debug!(value, "rejecting syllable time below minimum");
            return false;
        }
        if self.playback.is_active() {
            tracing::debug!(value, "syllable time is locked during playback");
            return false;
        }
        if value == self.syllable_time_ms {
            return false;
        }

        self.syllable_time_ms = value;
        self.recompile();
        true
    }

    /// Runs the compiler synchronously and publishes the result.
    pub fn recompile(&mut self) -> ArtifactState {
        self.cache.invalidate();

        let outcome = self
            .collaborators
            .compiler
            .compile(&self.composition, self.syllable_time_ms);
        let artifact = CompiledArtifact::from(outcome);

        let Collaborators {
            editor,
            audio,
            animation,
            ..
        } = &mut self.collaborators;

        editor.set_markers(MARKER_OWNER, MarkerSeverity::Error, artifact.diagnostics());

        match &artifact {
            CompiledArtifact::Valid(output) => {
                editor.paint_colors(&output.color_map);
                animation.set_animation_provider(output.animation.clone());
                self.overrides.update_target(output.audio.len());
                if self.overrides.is_active() {
                    self.overrides.realign(audio.as_mut());
                } else {
                    audio.set_audio(output.audio.clone());
                }
            }
            CompiledArtifact::Invalid(diagnostics) => {
                tracing::info!(count = diagnostics.len(), "compilation failed");
            }
        }

        self.cache.store(artifact)
    }

    /// Receives the upload source's current value. `None` withdraws any
    /// override or pending decode, and is ignored when there is neither;
    /// `Some` yields the payload to decode.
    pub fn set_upload(&mut self, upload: Option<Upload>) -> Result<Option<PendingDecode>> {
        let Some(upload) = upload else {
            self.clear_override();
            return Ok(None);
        };

        let payload = upload.payload().map_err(|err| {
            tracing::warn!(error = %err, "ignoring unreadable upload");
            err
        })?;
        let ticket = self.overrides.begin_ingest();
        tracing::debug!(ticket = ticket.sequence(), bytes = payload.len(), "upload queued for decode");
        Ok(Some(PendingDecode { ticket, payload }))
    }

    /// Applies a finished decode started by [`Self::set_upload`].
    pub fn finish_decode(
        &mut self,
        ticket: DecodeTicket,
        decoded: Result<DecodedAudio>,
    ) -> Result<IngestOutcome> {
        self.overrides
            .complete_ingest(ticket, decoded, self.collaborators.audio.as_mut())
    }

    /// Accepts an upload and decodes it inline.
    pub fn load_upload(
        &mut self,
        upload: Option<Upload>,
        decoder: &dyn AudioDecoder,
    ) -> Result<Option<IngestOutcome>> {
        match self.set_upload(upload)? {
            Some(pending) => {
                let decoded = pending.decode(decoder);
                self.finish_decode(pending.ticket, decoded).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Re-crops the override against the latest natural audio length.
    pub fn realign(&mut self) -> Option<usize> {
        self.overrides.realign(self.collaborators.audio.as_mut())
    }

    /// Drops the override and republishes the natural audio. Does nothing
    /// to the audio sink when no override was active.
    pub fn clear_override(&mut self) -> bool {
        self.overrides.clear(
            self.cache.natural_audio(),
            self.collaborators.audio.as_mut(),
        )
    }

    /// Starts playback if the artifact is ready and no session is active.
    /// Returns the id the sink's start/stop notifications must carry.
    pub fn play(&mut self) -> Result<Option<SessionId>> {
        let Collaborators { audio, editor, .. } = &mut self.collaborators;
        self.playback.play(
            self.cache.is_ready(),
            self.cache.color_map(),
            audio.as_mut(),
            editor.as_mut(),
        )
    }

    /// Forwards a start/stop notification from the audio sink.
    pub fn handle_playback_event(&mut self, event: PlaybackEvent) -> PlaybackState {
        let Collaborators {
            animation, editor, ..
        } = &mut self.collaborators;
        self.playback
            .handle_event(event, animation.as_mut(), editor.as_mut())
    }
}
