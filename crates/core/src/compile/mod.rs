//! Compiler boundary: what one compilation hands back, and how the result
//! is classified before anything downstream consumes it.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::audio::AudioClip;

/// Compiler-reported problem anchored to a source range. Positions are
/// passed through exactly as the compiler produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub message: String,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Diagnostic {
    pub fn new(
        message: impl Into<String>,
        (start_line, start_col): (u32, u32),
        (end_line, end_col): (u32, u32),
    ) -> Self {
        Self {
            message: message.into(),
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

/// A colored range of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSpan {
    pub line: u32,
    pub start_col: u32,
    pub end_col: u32,
    pub color: String,
}

/// Decorations computed by the compiler. The controller never looks inside;
/// it forwards the map to the editor and snapshots it for playback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorMap {
    pub spans: Vec<ColorSpan>,
}

impl ColorMap {
    pub fn new(spans: Vec<ColorSpan>) -> Self {
        Self { spans }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// What the animation engine should highlight at a given playback offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimationFrame {
    /// Indices into [`ColorMap::spans`].
    pub active_spans: Vec<usize>,
}

/// Timing lookup produced by the compiler: elapsed milliseconds since the
/// start of playback to the frame that should be shown.
#[derive(Clone)]
pub struct AnimationInfoProvider {
    lookup: Arc<dyn Fn(f64) -> AnimationFrame + Send + Sync>,
}

impl AnimationInfoProvider {
    pub fn new(lookup: impl Fn(f64) -> AnimationFrame + Send + Sync + 'static) -> Self {
        Self {
            lookup: Arc::new(lookup),
        }
    }

    pub fn frame_at(&self, elapsed_ms: f64) -> AnimationFrame {
        (self.lookup)(elapsed_ms)
    }

    /// True when both handles share the same underlying lookup.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.lookup, &other.lookup)
    }
}

impl fmt::Debug for AnimationInfoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationInfoProvider").finish()
    }
}

/// Raw compiler return value. Any of the data fields may be missing when
/// compilation failed.
#[derive(Debug, Clone, Default)]
pub struct CompileOutcome {
    pub color_map: Option<ColorMap>,
    pub animation: Option<AnimationInfoProvider>,
    pub audio: Option<AudioClip>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutcome {
    pub fn success(color_map: ColorMap, animation: AnimationInfoProvider, audio: AudioClip) -> Self {
        Self {
            color_map: Some(color_map),
            animation: Some(animation),
            audio: Some(audio),
            diagnostics: Vec::new(),
        }
    }

    pub fn failure(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            ..Self::default()
        }
    }
}

/// Data fields of a valid artifact.
#[derive(Debug, Clone)]
pub struct CompiledOutput {
    pub color_map: Arc<ColorMap>,
    pub animation: AnimationInfoProvider,
    pub audio: AudioClip,
}

/// Result of one compilation, classified once so the invalid case cannot
/// leak partially filled data to collaborators.
#[derive(Debug, Clone)]
pub enum CompiledArtifact {
    Valid(CompiledOutput),
    /// Diagnostics may be empty when the compiler returned no errors but
    /// left a data field unset.
    Invalid(Vec<Diagnostic>),
}

impl CompiledArtifact {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Valid(_) => &[],
            Self::Invalid(diagnostics) => diagnostics,
        }
    }
}

impl From<CompileOutcome> for CompiledArtifact {
    fn from(outcome: CompileOutcome) -> Self {
        if !outcome.diagnostics.is_empty() {
            return Self::Invalid(outcome.diagnostics);
        }
        match (outcome.color_map, outcome.animation, outcome.audio) {
            (Some(color_map), Some(animation), Some(audio)) => Self::Valid(CompiledOutput {
                color_map: Arc::new(color_map),
                animation,
                audio,
            }),
            _ => {
                tracing::warn!("compiler reported no diagnostics but omitted artifact data");
                Self::Invalid(Vec::new())
            }
        }
    }
}

/// External notation compiler. Pure with respect to controller state.
pub trait Compiler {
    fn compile(&mut self, source: &str, syllable_time_ms: f64) -> CompileOutcome;
}

impl<F> Compiler for F
where
    F: FnMut(&str, f64) -> CompileOutcome,
{
    fn compile(&mut self, source: &str, syllable_time_ms: f64) -> CompileOutcome {
        self(source, syllable_time_ms)
    }
}
