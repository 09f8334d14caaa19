//! Core library for the PlayLink editor controller.
//!
//! The controller keeps four things consistent while the user types: the
//! source text, the artifact compiled from it, an optional uploaded audio
//! clip that replaces the compiled audio, and the playback session. Each
//! module owns one piece of that (artifact caching, override alignment,
//! the playback gate) and [`CompileLinkController`] ties them together
//! around an explicitly owned set of [`Collaborators`].

pub mod audio;
pub mod cache;
pub mod compile;
pub mod config;
pub mod controller;
pub mod decode;
pub mod error;
pub mod overrides;
pub mod playback;
pub mod sinks;

#[cfg(test)]
pub(crate) mod testing;

pub use audio::{AudioClip, Frame, StereoSample, ASSUMED_SAMPLE_RATE, FRAME_SIZE};
pub use cache::{ArtifactState, CompiledArtifactCache};
pub use compile::{
    AnimationFrame, AnimationInfoProvider, ColorMap, ColorSpan, CompileOutcome, CompiledArtifact,
    CompiledOutput, Compiler, Diagnostic,
};
pub use config::{AppConfig, AudioConfig, EditorConfig, ShortOverridePolicy};
pub use controller::{Collaborators, CompileLinkController, PendingDecode, MARKER_OWNER};
pub use decode::{AudioDecoder, DecodedAudio, Upload, WavDecoder};
pub use error::{PlayLinkError, Result};
pub use overrides::{AudioOverrideProcessor, DecodeTicket, IngestOutcome, IngestReport};
pub use playback::{PlaybackSession, PlaybackSessionController, PlaybackState};
pub use sinks::{
    AnimationSink, AudioSink, EditorSink, MarkerSeverity, PlaybackEvent, SessionId,
};
