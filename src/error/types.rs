//! Custom error types with exit codes

use thiserror::Error;

/// Main error type for chartdoc operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ChartDocError {
    /// Configuration Error - missing or invalid configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Document Not Found - `Chart.yaml` or `values.yaml` missing
    #[error("Document not found: {message}")]
    DocumentNotFound { message: String },

    /// Document Parse Error - malformed YAML document
    #[error("Document parse error: {message}")]
    DocumentParse { message: String },

    /// Dependency Tool Missing - `helm` is not installed or not on PATH
    #[error("Dependency tool missing: {message}")]
    DependencyToolMissing { message: String },

    /// Dependency Tool Error - `helm` ran but failed
    #[error("Dependency tool error: {message}")]
    DependencyTool { message: String },

    /// Dependency Archive Missing - packaged dependency not found under `charts/`
    #[error("Dependency archive missing: {message}")]
    DependencyArchiveMissing { message: String },

    /// Archive Extraction Error - dependency archive could not be unpacked
    #[error("Archive extraction error: {message}")]
    ArchiveExtraction { message: String },

    /// Template Error - documentation template failed to render
    #[error("Template error: {message}")]
    Template { message: String },

    /// Filesystem Error - file operation failed
    #[error("Filesystem error: {message}")]
    Filesystem { message: String },
}

impl ChartDocError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Configuration { .. } => 2,
            Self::DocumentNotFound { .. } => 3,
            Self::DocumentParse { .. } => 4,
            Self::DependencyToolMissing { .. } | Self::DependencyTool { .. } => 5,
            Self::DependencyArchiveMissing { .. } | Self::ArchiveExtraction { .. } => 6,
            Self::Template { .. } => 7,
            Self::Filesystem { .. } => 8,
        }
    }

    /// Create a configuration error
    #[inline]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a document-not-found error
    #[inline]
    pub fn document_not_found<S: Into<String>>(message: S) -> Self {
        Self::DocumentNotFound {
            message: message.into(),
        }
    }

    /// Create a document parse error
    #[inline]
    pub fn document_parse<S: Into<String>>(message: S) -> Self {
        Self::DocumentParse {
            message: message.into(),
        }
    }

    /// Create a dependency-tool-missing error
    #[inline]
    pub fn dependency_tool_missing<S: Into<String>>(message: S) -> Self {
        Self::DependencyToolMissing {
            message: message.into(),
        }
    }

    /// Create a dependency tool error
    #[inline]
    pub fn dependency_tool<S: Into<String>>(message: S) -> Self {
        Self::DependencyTool {
            message: message.into(),
        }
    }

    /// Create a dependency-archive-missing error
    #[inline]
    pub fn dependency_archive_missing<S: Into<String>>(message: S) -> Self {
        Self::DependencyArchiveMissing {
            message: message.into(),
        }
    }

    /// Create an archive extraction error
    #[inline]
    pub fn archive_extraction<S: Into<String>>(message: S) -> Self {
        Self::ArchiveExtraction {
            message: message.into(),
        }
    }

    /// Create a template error
    #[inline]
    pub fn template<S: Into<String>>(message: S) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Create a filesystem error
    #[inline]
    pub fn filesystem<S: Into<String>>(message: S) -> Self {
        Self::Filesystem {
            message: message.into(),
        }
    }
}
