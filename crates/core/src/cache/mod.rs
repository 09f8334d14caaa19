use std::sync::Arc;

use crate::{
    audio::AudioClip,
    compile::{AnimationInfoProvider, ColorMap, CompiledArtifact, CompiledOutput, Diagnostic},
};

/// Whether the current artifact may be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactState {
    /// Source changed and the new result is not known yet.
    #[default]
    Pending,
    Ready,
    NotReady,
}

/// Holds the most recent compilation result plus the last valid output,
/// which doubles as the natural (non-overridden) audio.
#[derive(Debug, Default)]
pub struct CompiledArtifactCache {
    state: ArtifactState,
    last_valid: Option<CompiledOutput>,
    diagnostics: Vec<Diagnostic>,
    compilations: u64,
}

impl CompiledArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ArtifactState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ArtifactState::Ready
    }

    /// Flips to [`ArtifactState::Pending`] ahead of a recompilation.
    pub fn invalidate(&mut self) {
        self.state = ArtifactState::Pending;
    }

    /// Records a compilation result. Invalid results keep the previous
    /// valid output so stale-but-valid data stays available.
    pub fn store(&mut self, artifact: CompiledArtifact) -> ArtifactState {
        self.compilations += 1;
        match artifact {
            CompiledArtifact::Valid(output) => {
                self.diagnostics.clear();
                self.last_valid = Some(output);
                self.state = ArtifactState::Ready;
            }
            CompiledArtifact::Invalid(diagnostics) => {
                self.diagnostics = diagnostics;
                self.state = ArtifactState::NotReady;
            }
        }
        self.state
    }

    /// Diagnostics of the most recent compilation.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn last_valid(&self) -> Option<&CompiledOutput> {
        self.last_valid.as_ref()
    }

    /// Audio of the most recent valid artifact.
    pub fn natural_audio(&self) -> Option<&AudioClip> {
        self.last_valid.as_ref().map(|output| &output.audio)
    }

    pub fn color_map(&self) -> Option<&Arc<ColorMap>> {
        self.last_valid.as_ref().map(|output| &output.color_map)
    }

    pub fn animation(&self) -> Option<&AnimationInfoProvider> {
        self.last_valid.as_ref().map(|output| &output.animation)
    }

    pub fn compilations(&self) -> u64 {
        self.compilations
    }
}
