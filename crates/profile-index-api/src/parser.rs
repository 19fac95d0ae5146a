//! Turns one profile file into the `(id, version marker, raw content)` triple.

use std::path::{Path, PathBuf};

use profile_index_core::{ProfileId, UNKNOWN_VERSION_MARKER};
use regex_lite::Regex;

const USER_ID_PATTERN: &str = r"user_(\d+)\.md";
const VERSION_MARKER_PATTERN: &str = r"# Final Profile \(UUID\): ([a-f0-9-]+)";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid file name format: {0}")]
    InvalidFileName(String),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid parser pattern: {0}")]
    Pattern(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub id: ProfileId,
    pub version_marker: String,
    pub raw_content: String,
}

#[derive(Debug, Clone)]
pub struct ProfileParser {
    user_id: Regex,
    version_marker: Regex,
}

impl ProfileParser {
    /// # Errors
    /// Returns [`ParseError::Pattern`] if a built-in pattern fails to compile.
    pub fn new() -> Result<Self, ParseError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|err| ParseError::Pattern(format!("{pattern}: {err}")))
        };
        Ok(Self { user_id: compile(USER_ID_PATTERN)?, version_marker: compile(VERSION_MARKER_PATTERN)? })
    }

    /// Read and parse one profile file.
    ///
    /// # Errors
    /// Returns [`ParseError::InvalidFileName`] when the file name carries no
    /// `user_<digits>.md` id, or [`ParseError::Io`] when the content cannot be read
    /// as UTF-8 text.
    pub fn parse_file(&self, path: &Path) -> Result<ParsedDocument, ParseError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = self.extract_user_id(&file_name)?;
        let raw_content = std::fs::read_to_string(path)
            .map_err(|source| ParseError::Io { path: path.to_path_buf(), source })?;

        Ok(ParsedDocument {
            id,
            version_marker: self.extract_version_marker(&raw_content),
            raw_content,
        })
    }

    /// # Errors
    /// Returns [`ParseError::InvalidFileName`] when no `user_<digits>.md` id is present.
    pub fn parse_document(
        &self,
        file_name: &str,
        raw_content: impl Into<String>,
    ) -> Result<ParsedDocument, ParseError> {
        let id = self.extract_user_id(file_name)?;
        let raw_content = raw_content.into();
        Ok(ParsedDocument { id, version_marker: self.extract_version_marker(&raw_content), raw_content })
    }

    /// # Errors
    /// Returns [`ParseError::InvalidFileName`] when no `user_<digits>.md` id is present.
    pub fn extract_user_id(&self, file_name: &str) -> Result<ProfileId, ParseError> {
        self.user_id
            .captures(file_name)
            .and_then(|captures| captures.get(1))
            .map(|digits| ProfileId::new(format!("user_{}", digits.as_str())))
            .ok_or_else(|| ParseError::InvalidFileName(file_name.to_string()))
    }

    #[must_use]
    pub fn extract_version_marker(&self, content: &str) -> String {
        self.version_marker
            .captures(content)
            .and_then(|captures| captures.get(1))
            .map_or_else(|| UNKNOWN_VERSION_MARKER.to_string(), |marker| marker.as_str().to_string())
    }
}
