//! The active group, remembered between invocations.

use std::{fs, io::ErrorKind, path::Path};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub active_group: Option<Uuid>,
}

impl Session {
    /// Read the session file. A missing or unreadable document means no
    /// session.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str(&content) {
            Ok(session) => Ok(session),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "ignoring malformed session file");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(self)?;
        fs::write(path, payload)?;
        tracing::debug!(path = %path.display(), active_group = ?self.active_group, "session saved");
        Ok(())
    }

    /// Forget the active group.
    pub fn clear(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(session, Session::default());
    }

    #[test]
    fn save_then_load_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let session = Session {
            active_group: Some(Uuid::from_u128(7)),
        };
        session.save(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"active_group\""));
        assert_eq!(Session::load(&path).unwrap(), session);

        Session::clear(&path).unwrap();
        assert_eq!(Session::load(&path).unwrap(), Session::default());
        Session::clear(&path).unwrap();
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(Session::load(&path).unwrap(), Session::default());
    }
}
