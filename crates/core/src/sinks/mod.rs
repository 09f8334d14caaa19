//! Collaborators the controller publishes into. All calls are
//! fire-and-forget from the controller's point of view.

use std::sync::Arc;

use crate::{
    audio::AudioClip,
    compile::{AnimationInfoProvider, ColorMap, Diagnostic},
    Result,
};

/// Severity attached to every marker the controller reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSeverity {
    Error,
}

/// Editor surface: markers, color decorations and input suppression.
pub trait EditorSink {
    /// Replaces the full marker set owned by `owner`.
    fn set_markers(&mut self, owner: &str, severity: MarkerSeverity, diagnostics: &[Diagnostic]);

    fn paint_colors(&mut self, color_map: &ColorMap);

    /// Suppresses or re-enables user input while a session is active.
    fn set_read_only(&mut self, read_only: bool);
}

/// Playback engine. Starting is asynchronous: the sink reports completion
/// later through [`PlaybackEvent::Started`] tagged with the session it was
/// asked to start.
pub trait AudioSink {
    fn set_audio(&mut self, audio: AudioClip);

    /// Requests playback of the currently published audio for `session`.
    fn start_playback(&mut self, session: SessionId) -> Result<()>;

    fn is_playing(&self) -> bool;
}

/// Animation engine driven by the compiled timing data.
pub trait AnimationSink {
    fn set_animation_provider(&mut self, provider: AnimationInfoProvider);

    fn initiate(&mut self, color_map: Arc<ColorMap>, start_timestamp: f64);
}

/// Identifies one playback session. Events for any other session are
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub(crate) u64);

impl SessionId {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// Notifications from the audio sink, delivered to the controller by the
/// host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    /// Playback began at the given absolute timestamp (seconds on the
    /// sink's clock).
    Started { session: SessionId, timestamp: f64 },
    /// The clip ended or playback was halted.
    Stopped { session: SessionId },
}

impl PlaybackEvent {
    pub fn session(&self) -> SessionId {
        match self {
            Self::Started { session, .. } | Self::Stopped { session } => *session,
        }
    }
}
