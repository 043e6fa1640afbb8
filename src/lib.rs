// Leadsheet - chord leadsheet document model
//
// Positions, sections and chord symbols of a song, edited through vetoable,
// undoable operations.

pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod leadsheet;
pub mod project;
pub mod timeline;

// Re-export commonly used types for convenience
pub use command::{Mutation, SheetEdit, SheetState, UndoManager, UndoableEdit};
pub use config::LeadsheetConfig;
pub use error::{LeadsheetError, Result};
pub use events::{
    Adjustment, Change, ChangeEvent, ChangeListener, ChangeOrigin, FollowUps, LayoutChange,
    ListenerId, ProtocolPhase, SectionMoveKind, VetoableListener,
};
pub use leadsheet::{
    ChordSymbol, EditRequest, Item, ItemData, ItemHandle, ItemKind, ItemKinds, Leadsheet,
    MAX_FOLLOW_UPS, NoteName, Section, SectionSpan,
};
pub use project::SheetSnapshot;
pub use timeline::{Beat, Position, Quantization, TimeSignature};
