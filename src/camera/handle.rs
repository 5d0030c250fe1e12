use crate::error::CameraError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifies a capture device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraHandle {
    Index(u32),
    /// Device node or symlink (e.g. `/dev/v4l/by-id/...-video-index0`)
    Path(PathBuf),
}

impl CameraHandle {
    /// Interpret a configured device string: all digits means an index,
    /// anything else is a path
    pub fn parse(device: &str) -> Result<Self, CameraError> {
        let device = device.trim();
        if device.is_empty() {
            return Err(CameraError::InvalidHandle {
                handle: device.to_string(),
                reason: "empty device".to_string(),
            });
        }

        if device.bytes().all(|b| b.is_ascii_digit()) {
            let index = device.parse().map_err(|_| CameraError::InvalidHandle {
                handle: device.to_string(),
                reason: "index out of range".to_string(),
            })?;
            Ok(CameraHandle::Index(index))
        } else {
            Ok(CameraHandle::Path(PathBuf::from(device)))
        }
    }

    /// Resolve to a device index.
    ///
    /// Paths are canonicalized first so that symlinks resolve to the real
    /// device node, then the trailing digit run of the result is used.
    pub fn resolve_index(&self) -> Result<u32, CameraError> {
        match self {
            CameraHandle::Index(index) => Ok(*index),
            CameraHandle::Path(path) => {
                let canonical = path.canonicalize().map_err(|e| CameraError::InvalidHandle {
                    handle: path.display().to_string(),
                    reason: format!("cannot resolve path: {}", e),
                })?;
                index_from_path(&canonical)
            }
        }
    }
}

impl fmt::Display for CameraHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraHandle::Index(index) => write!(f, "#{}", index),
            CameraHandle::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

fn index_from_path(path: &Path) -> Result<u32, CameraError> {
    let text = path.to_string_lossy();
    parse_trailing_index(&text).ok_or_else(|| CameraError::InvalidHandle {
        handle: text.to_string(),
        reason: "path has no trailing device index".to_string(),
    })
}

/// Parse the maximal run of decimal digits at the end of `text`.
///
/// Returns `None` when there are no trailing digits or the run does not fit
/// in a `u32`.
pub fn parse_trailing_index(text: &str) -> Option<u32> {
    let digits = text
        .bytes()
        .rev()
        .take_while(|b| b.is_ascii_digit())
        .count();

    if digits == 0 {
        return None;
    }

    text[text.len() - digits..].parse().ok()
}
