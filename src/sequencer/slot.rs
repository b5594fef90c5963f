// Slot - one sequencer step holding an optional video clip

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Opaque reference to a loadable media resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClipHandle {
    path: Arc<Path>,
}

impl ClipHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        Self {
            path: Arc::from(path.as_path()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for ClipHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Opaque preview image for the controller UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail(pub Arc<[u8]>);

/// One cell of a track
///
/// A slot without a clip is never played, an inactive slot with a clip is
/// armed but muted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slot {
    pub active: bool,
    pub clip: Option<ClipHandle>,
    pub thumbnail: Option<Thumbnail>,
    /// Identity of the source file, used by the player to detect clip changes
    pub source: Option<String>,
}

impl Slot {
    /// Empty, inactive slot
    pub fn empty() -> Self {
        Self::default()
    }

    /// Inactive slot bound to a clip, identified by its full path
    pub fn with_clip(clip: ClipHandle) -> Self {
        let source = Some(clip.path().to_string_lossy().into_owned());
        Self {
            active: false,
            clip: Some(clip),
            thumbnail: None,
            source,
        }
    }

    /// Whether a tick on this slot should trigger playback
    pub fn is_playable(&self) -> bool {
        self.active && self.clip.is_some()
    }
}
