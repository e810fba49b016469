//! Error-related types for a [`Book`](crate::Book).

use std::path::PathBuf;

/// Alias for `Result<T, BookError>`.
pub type BookResult<T> = Result<T, BookError>;

/// Alias for `Result<T, ToolError>`.
pub type ToolResult<T> = Result<T, ToolError>;

/// Unified error type.
/// Possible errors when assembling or serializing a [`Book`](crate::Book).
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum BookError {
    /// An operation is illegal given the current state of the book,
    /// such as mutating a book that has already been finalized.
    #[error(transparent)]
    State(#[from] StateError),

    /// An in-package path was rejected before anything was written.
    #[error(transparent)]
    Path(#[from] PathError),

    /// An external tool (validator or converter) failed.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Generated XML could not be written.
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    /// An IO exception occurred while staging or serializing the container.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Possible state errors for a [`Book`](crate::Book).
///
/// # Variants
/// ## Lifecycle
/// - [`Finalized`](StateError::Finalized)
/// - [`RootLocked`](StateError::RootLocked)
/// ## Finalize Guards
/// - [`NoChapters`](StateError::NoChapters)
/// - [`MissingTitle`](StateError::MissingTitle)
/// - [`MissingLanguage`](StateError::MissingLanguage)
/// - [`DanglingSpineEntry`](StateError::DanglingSpineEntry)
/// ## Arguments
/// - [`InvalidLanguage`](StateError::InvalidLanguage)
/// - [`DuplicateHref`](StateError::DuplicateHref)
/// - [`DuplicateId`](StateError::DuplicateId)
/// - [`MissingContent`](StateError::MissingContent)
/// - [`CoverAlreadySet`](StateError::CoverAlreadySet)
/// - [`RequiresModernVersion`](StateError::RequiresModernVersion)
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    ////////////////////////////////////////////////////////////////////////////////
    // Lifecycle
    ////////////////////////////////////////////////////////////////////////////////
    /// The book was already finalized and can no longer be modified.
    #[error("The book is finalized and can no longer be modified")]
    Finalized,

    /// The book root cannot change once entries have been staged in the container.
    #[error("The book root cannot be changed after entries have been added")]
    RootLocked,

    ////////////////////////////////////////////////////////////////////////////////
    // Finalize guards
    ////////////////////////////////////////////////////////////////////////////////
    /// At least one chapter is required to finalize.
    #[error("At least one chapter is required")]
    NoChapters,

    /// A non-empty title is required to finalize.
    #[error("A title is required")]
    MissingTitle,

    /// A non-empty language is required to finalize.
    #[error("A language is required")]
    MissingLanguage,

    /// A spine entry references an id absent from the manifest.
    #[error("Spine entry `{0}` does not reference a manifest item")]
    DanglingSpineEntry(String),

    ////////////////////////////////////////////////////////////////////////////////
    // Arguments
    ////////////////////////////////////////////////////////////////////////////////
    /// A language code must be exactly two ASCII letters (e.g., `en`).
    #[error("Invalid language code (expected two letters): {0}")]
    InvalidLanguage(String),

    /// The in-package path is already occupied.
    #[error("An entry already exists at: {0}")]
    DuplicateHref(String),

    /// The manifest id is already taken by another item.
    #[error("A manifest item already uses the id: {0}")]
    DuplicateId(String),

    /// A manifest item needs a non-empty id and media type.
    #[error("Entry `{0}` needs a non-empty id and media type")]
    IncompleteItem(String),

    /// A chapter was given without content and is neither a
    /// fragment link nor the table of contents placeholder.
    #[error("Chapter `{0}` has no content")]
    MissingContent(String),

    /// A cover image can only be set once.
    #[error("A cover image is already set")]
    CoverAlreadySet,

    /// A table of contents is already provided, either generated through
    /// `build_toc` or added as a reference page.
    #[error("A table of contents is already provided")]
    TocAlreadySet,

    /// The operation is only available for EPUB 3 output.
    #[error("The operation requires EPUB 3 output")]
    RequiresModernVersion,
}

/// Reasons an in-package path is rejected.
///
/// Paths are checked before any byte reaches the container.
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Nothing remains of the path after sanitizing.
    #[error("The path is empty")]
    Empty,

    /// The path contains a `..` segment.
    #[error("Path traversal is not allowed: {0}")]
    Traversal(String),

    /// The path starts with a drive letter (e.g., `C:`).
    #[error("Drive-letter paths are not allowed: {0}")]
    DriveLetter(String),

    /// The path collides with an entry managed by the container itself.
    #[error("The path is reserved: {0}")]
    Reserved(String),
}

/// Possible errors when running an external tool.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    /// The tool could not be located.
    #[error("`{0}` could not be found")]
    NotFound(String),

    /// The tool did not exit within the given time.
    #[error("`{program}` did not finish within {seconds} seconds")]
    TimedOut {
        /// The program that was running.
        program: String,
        /// The timeout that elapsed.
        seconds: u64,
    },

    /// The tool exited unsuccessfully.
    #[error("`{program}` failed ({status}): {diagnostics}")]
    Failed {
        /// The program that was running.
        program: String,
        /// The exit status, or `-1` when terminated by a signal.
        status: i32,
        /// Captured diagnostic output (stderr, falling back to stdout).
        diagnostics: String,
    },

    /// The tool could not be started.
    #[error("`{program}` could not be started: {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The file handed to the tool does not exist.
    #[error("No such file: {0}")]
    MissingInput(PathBuf),
}
