// Change notification protocol
//
// Every edit is described by a `Change` before it happens. Vetoable listeners
// may reject it (the edit is then abandoned untouched); change listeners are
// told about it once committed, and again whenever undo or redo replays it.

pub mod change;
pub mod listener;

pub use change::{Adjustment, Change, ChangeEvent, ChangeOrigin, LayoutChange, SectionMoveKind};
pub use listener::{
    ChangeDispatcher, ChangeListener, FollowUps, ListenerId, ProtocolPhase, VetoableListener,
};
