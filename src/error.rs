// Error types shared by every leadsheet operation

use crate::leadsheet::store::ItemHandle;

/// Result type for leadsheet operations
pub type Result<T> = std::result::Result<T, LeadsheetError>;

/// Errors returned by leadsheet operations
///
/// Every variant is reported before any mutation happens: an operation that
/// returns an error left the document untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeadsheetError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Position out of bounds: bar {bar} (size {size_in_bars} bars)")]
    PositionOutOfBounds { bar: u32, size_in_bars: u32 },

    #[error("Invalid bar {0}")]
    InvalidBar(u32),

    #[error("Bar {0} already starts a section")]
    BarOccupied(u32),

    #[error("An item of the same kind already exists at {0}")]
    DuplicatePosition(String),

    #[error("Section name '{0}' is already used")]
    DuplicateSectionName(String),

    #[error("Invalid bar range {from}..={to}")]
    InvalidRange { from: u32, to: u32 },

    #[error("Illegal section position: bar {0}")]
    IllegalSectionPosition(u32),

    #[error("The initial section can not be removed")]
    CannotRemoveInitialSection,

    #[error("The initial section can not be moved")]
    CannotMoveInitialSection,

    #[error("{0}")]
    Vetoed(String),

    #[error("Stale item handle {0}")]
    StaleHandle(ItemHandle),

    #[error("Follow-up edit dropped: more than {0} queued by one operation")]
    FollowUpLimit(usize),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for LeadsheetError {
    fn from(err: std::io::Error) -> Self {
        LeadsheetError::Io(err.to_string())
    }
}

impl LeadsheetError {
    /// True for errors raised by a listener veto rather than by a rule of the document
    pub fn is_veto(&self) -> bool {
        matches!(self, LeadsheetError::Vetoed(_))
    }
}
