//! Impulse response library for the convolution effect

use std::path::Path;

use tracing::{debug, warn};

use crate::engine::{find_audio_files, import_audio, AudioBuffer};
use crate::error::{Result, SonicPrepError};

/// A named impulse response
#[derive(Debug, Clone, PartialEq)]
pub struct Impulse {
    pub name: String,
    pub buffer: AudioBuffer,
}

/// Impulse responses the convolution effect draws from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImpulseLibrary {
    impulses: Vec<Impulse>,
}

impl ImpulseLibrary {
    /// Load every WAV file in `dir`
    ///
    /// A missing directory yields an empty library; the convolution effect
    /// then fails when drawn. Unreadable files are skipped with a warning.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "impulse response directory not found");
            return Ok(Self::default());
        }

        let files = match find_audio_files(dir, &["wav".to_string()]) {
            Ok(files) => files,
            Err(SonicPrepError::NoFilesFound { .. }) => {
                warn!(dir = %dir.display(), "no impulse responses found");
                return Ok(Self::default());
            }
            Err(e) => return Err(e),
        };

        let mut impulses = Vec::with_capacity(files.len());
        for path in files {
            match import_audio(&path) {
                Ok(buffer) if !buffer.is_empty() => {
                    let name = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    debug!(%name, len = buffer.len(), "loaded impulse response");
                    impulses.push(Impulse { name, buffer });
                }
                Ok(_) => warn!(path = %path.display(), "skipping empty impulse response"),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping impulse response"),
            }
        }
        Ok(Self { impulses })
    }

    /// Build a library from in-memory buffers
    pub fn from_buffers(buffers: Vec<(String, AudioBuffer)>) -> Self {
        Self {
            impulses: buffers
                .into_iter()
                .map(|(name, buffer)| Impulse { name, buffer })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.impulses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.impulses.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Impulse> {
        self.impulses.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Impulse> {
        self.impulses.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{export_audio, ExportFormat};
    use tempfile::TempDir;

    #[test]
    fn test_missing_dir_is_empty() {
        let library = ImpulseLibrary::load(Path::new("/nonexistent/impulses")).unwrap();
        assert!(library.is_empty());
    }

    #[test]
    fn test_loads_wav_files() {
        let dir = TempDir::new().unwrap();
        let ir = AudioBuffer::mono(vec![1.0, 0.5, 0.25, 0.0], 44100);
        export_audio(&ir, &dir.path().join("hall.wav"), ExportFormat::default()).unwrap();
        export_audio(&ir, &dir.path().join("room.wav"), ExportFormat::default()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not audio").unwrap();

        let library = ImpulseLibrary::load(dir.path()).unwrap();
        assert_eq!(library.len(), 2);
        let names: Vec<&str> = library.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["hall", "room"]);
        assert_eq!(library.get(0).unwrap().buffer.len(), 4);
    }

    #[test]
    fn test_empty_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(ImpulseLibrary::load(dir.path()).unwrap().is_empty());
    }
}
