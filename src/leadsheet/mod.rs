// Leadsheet - the chord leadsheet document
//
// Items (sections, chord symbols, annotations, time signature markers) are
// kept ordered by position and the sections partition the bars. Every edit is
// planned first, then authorized by the vetoable listeners, committed as one
// undoable edit and finally broadcast to the change listeners.

pub mod chord;
pub mod item;
pub(crate) mod plan;
pub mod request;
pub mod sections;
pub mod store;

pub use chord::{Accidental, ChordSymbol, NoteName};
pub use item::{Item, ItemData, ItemKind, ItemKinds, Section};
pub use request::EditRequest;
pub use sections::{SectionIndex, SectionSpan};
pub use store::{ItemHandle, ItemStore};

use crate::command::{SheetEdit, SheetState, UndoManager};
use crate::config::LeadsheetConfig;
use crate::error::{LeadsheetError, Result};
use crate::events::{
    Change, ChangeDispatcher, ChangeEvent, ChangeListener, ChangeOrigin, FollowUps, ListenerId,
    ProtocolPhase, VetoableListener,
};
use crate::project::{self, SheetSnapshot};
use crate::timeline::{Position, Quantization, TimeSignature};
use plan::Planner;
use std::collections::VecDeque;
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Follow-up edits one operation may trigger, its own follow-ups' follow-ups included.
/// Requests queued past the limit are dropped and reported as `FollowUpLimit`.
pub const MAX_FOLLOW_UPS: usize = 256;

/// A chord leadsheet
///
/// # Example
/// ```
/// use leadsheet::{Leadsheet, Position, TimeSignature};
///
/// let mut sheet = Leadsheet::new("Intro", TimeSignature::FOUR_FOUR, 8).unwrap();
/// sheet.add_chord("Dm7", Position::at_bar(0)).unwrap();
/// let verse = sheet.add_section("Verse", TimeSignature::THREE_FOUR, 4).unwrap();
/// assert_eq!(sheet.bar_range(verse).unwrap(), 4..=7);
///
/// sheet.undo().unwrap();
/// assert!(sheet.section_by_name("Verse").is_none());
/// ```
#[derive(Debug)]
pub struct Leadsheet {
    state: SheetState,
    config: LeadsheetConfig,
    dispatcher: ChangeDispatcher,
    history: UndoManager,
    follow_up_errors: Vec<(EditRequest, LeadsheetError)>,
    /// Follow-ups waiting for the outermost operation to run them
    pending: VecDeque<EditRequest>,
    draining: bool,
}

impl Leadsheet {
    /// Create a leadsheet holding a single section covering all its bars
    pub fn new(initial_section_name: &str, time_signature: TimeSignature, size_in_bars: u32) -> Result<Self> {
        Self::with_config(
            initial_section_name,
            time_signature,
            size_in_bars,
            LeadsheetConfig::default(),
        )
    }

    pub fn with_config(
        initial_section_name: &str,
        time_signature: TimeSignature,
        size_in_bars: u32,
        config: LeadsheetConfig,
    ) -> Result<Self> {
        let name = initial_section_name.trim();
        if name.is_empty() {
            return Err(LeadsheetError::InvalidArgument("section name is blank".into()));
        }
        if size_in_bars == 0 {
            return Err(LeadsheetError::InvalidArgument(
                "a leadsheet has at least one bar".into(),
            ));
        }
        let time_signature = time_signature.validate()?;
        let state = SheetState::new(Section::new(name, time_signature), size_in_bars);
        Ok(Self::from_state(state, config))
    }

    /// Rebuild a leadsheet from a snapshot, rejecting any snapshot breaking a document rule
    pub fn from_snapshot(snapshot: &SheetSnapshot, config: LeadsheetConfig) -> Result<Self> {
        let state = project::state_from_snapshot(snapshot)?;
        Ok(Self::from_state(state, config))
    }

    fn from_state(state: SheetState, config: LeadsheetConfig) -> Self {
        Self {
            state,
            history: UndoManager::with_capacity(config.max_undo_history),
            config,
            dispatcher: ChangeDispatcher::new(),
            follow_up_errors: Vec::new(),
            pending: VecDeque::new(),
            draining: false,
        }
    }

    /// Items and size, for persistence
    pub fn snapshot(&self) -> SheetSnapshot {
        SheetSnapshot::new(
            self.size_in_bars(),
            self.items().map(|(_, item)| item.clone()).collect(),
        )
    }

    pub fn config(&self) -> &LeadsheetConfig {
        &self.config
    }

    pub fn quantization(&self) -> Quantization {
        self.config.quantization
    }

    /// Grid used by later inserts and moves; existing items are left alone
    pub fn set_quantization(&mut self, quantization: Quantization) {
        self.config.quantization = quantization;
    }

    // ---- Queries ----

    pub fn size_in_bars(&self) -> u32 {
        self.state.size_in_bars()
    }

    /// Number of items, sections included
    pub fn len(&self) -> usize {
        self.state.store().len()
    }

    /// Never true for a valid leadsheet, which always has its initial section
    pub fn is_empty(&self) -> bool {
        self.state.store().is_empty()
    }

    pub fn item(&self, handle: ItemHandle) -> Option<&Item> {
        self.state.store().get(handle)
    }

    /// All items in position order
    pub fn items(&self) -> impl Iterator<Item = (ItemHandle, &Item)> + Clone + '_ {
        self.state.store().iter()
    }

    /// Items of the given kinds in `bar_from..=bar_to`, in position order
    pub fn query_range(
        &self,
        bar_from: u32,
        bar_to: u32,
        kinds: ItemKinds,
    ) -> impl Iterator<Item = (ItemHandle, &Item)> + Clone + '_ {
        self.state.store().query_range(bar_from, bar_to, kinds)
    }

    /// Items of the given kinds inside the bar range of a section
    pub fn query_by_section(
        &self,
        section: ItemHandle,
        kinds: ItemKinds,
    ) -> Result<impl Iterator<Item = (ItemHandle, &Item)> + Clone + '_> {
        let range = self.bar_range(section)?;
        Ok(self.query_range(*range.start(), *range.end(), kinds))
    }

    /// First item strictly after `position`
    pub fn first_item_after(&self, position: Position, kinds: ItemKinds) -> Option<(ItemHandle, &Item)> {
        self.query_range(position.bar, u32::MAX, kinds)
            .find(|(_, item)| item.position > position)
    }

    /// Last item strictly before `position`
    pub fn last_item_before(&self, position: Position, kinds: ItemKinds) -> Option<(ItemHandle, &Item)> {
        self.query_range(0, position.bar, kinds)
            .take_while(|(_, item)| item.position < position)
            .last()
    }

    /// Section layout, ordered by start bar
    pub fn section_spans(&self) -> &[SectionSpan] {
        self.state.sections().spans()
    }

    /// Sections with their handles, ordered by start bar
    pub fn sections(&self) -> impl Iterator<Item = (ItemHandle, &Section)> + '_ {
        self.section_spans()
            .iter()
            .map(|span| (span.handle, &span.section))
    }

    /// Section owning a bar
    pub fn get_section(&self, bar: u32) -> Option<&SectionSpan> {
        if bar >= self.size_in_bars() {
            return None;
        }
        self.state.sections().span_of_bar(bar)
    }

    pub fn section_of_bar(&self, bar: u32) -> Option<&SectionSpan> {
        self.get_section(bar)
    }

    /// Section by name, case-insensitive
    pub fn section_by_name(&self, name: &str) -> Option<&SectionSpan> {
        self.state.sections().by_name(name)
    }

    /// Bars covered by a section
    pub fn bar_range(&self, section: ItemHandle) -> Result<RangeInclusive<u32>> {
        let item = self.state.store().resolve(section)?;
        if item.as_section().is_none() {
            return Err(LeadsheetError::InvalidArgument(format!(
                "{} is not a section",
                section
            )));
        }
        self.state
            .sections()
            .span_of(section)
            .map(|span| span.start_bar..=span.end_bar)
            .ok_or(LeadsheetError::StaleHandle(section))
    }

    /// Check every document invariant
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        self.state.check_invariants()
    }

    pub fn state(&self) -> &SheetState {
        &self.state
    }

    // ---- Listeners ----

    pub fn add_listener(&mut self, listener: Arc<dyn ChangeListener>) -> ListenerId {
        self.dispatcher.add_listener(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.dispatcher.remove_listener(id)
    }

    pub fn add_vetoable_listener(&mut self, listener: Arc<dyn VetoableListener>) -> ListenerId {
        self.dispatcher.add_vetoable_listener(listener)
    }

    pub fn remove_vetoable_listener(&mut self, id: ListenerId) -> bool {
        self.dispatcher.remove_vetoable_listener(id)
    }

    pub fn protocol_phase(&self) -> ProtocolPhase {
        self.dispatcher.phase()
    }

    /// Errors of follow-up edits queued by listeners since the last call
    pub fn take_follow_up_errors(&mut self) -> Vec<(EditRequest, LeadsheetError)> {
        std::mem::take(&mut self.follow_up_errors)
    }

    // ---- Edits ----

    fn planner(&self) -> Planner<'_> {
        Planner::new(
            &self.state,
            self.config.quantization,
            &self.config.section_name_prefix,
        )
    }

    /// Run the validation and veto phase of a request without changing anything.
    ///
    /// Returns the change the request would make, `None` if it changes nothing.
    pub fn authorize(&mut self, request: &EditRequest) -> Result<Option<Change>> {
        let Some(plan) = self.planner().plan(request)? else {
            return Ok(None);
        };
        self.dispatcher.authorize(&plan.change)?;
        self.dispatcher.abort();
        Ok(Some(plan.change))
    }

    /// Run any edit from its data form.
    ///
    /// Returns the committed change, or `None` when the request changes
    /// nothing (no event is sent and no undo entry is recorded then).
    pub fn apply(&mut self, request: EditRequest) -> Result<Option<Change>> {
        let Some(plan) = self.planner().plan(&request)? else {
            tracing::trace!(%request, "edit changes nothing");
            return Ok(None);
        };
        self.dispatcher.authorize(&plan.change)?;

        let change = plan.change.clone();
        let committed = SheetEdit::new(plan.mutations, plan.change)
            .and_then(|edit| self.history.execute(Box::new(edit), &mut self.state));
        if let Err(error) = committed {
            self.dispatcher.abort();
            return Err(error);
        }
        debug_assert_eq!(
            self.state.check_invariants(),
            Ok(()),
            "invariant broken by {}",
            change
        );
        tracing::debug!(
            change = %change,
            undo_depth = self.history.undo_count(),
            "edit committed"
        );

        let follow_ups = self
            .dispatcher
            .commit(&ChangeEvent::new(change.clone(), ChangeOrigin::Edit));
        self.run_follow_ups(follow_ups);
        Ok(Some(change))
    }

    /// Queue the follow-ups of a broadcast and, unless an outer call is
    /// already doing it, run the queue in order until it is empty.
    fn run_follow_ups(&mut self, follow_ups: FollowUps) {
        self.pending.extend(follow_ups.into_requests());
        if self.draining {
            return;
        }
        self.draining = true;
        let mut ran = 0;
        while let Some(request) = self.pending.pop_front() {
            if ran == MAX_FOLLOW_UPS {
                tracing::warn!(
                    limit = MAX_FOLLOW_UPS,
                    dropped = self.pending.len() + 1,
                    "too many follow-up edits, dropping the rest"
                );
                self.follow_up_errors
                    .push((request, LeadsheetError::FollowUpLimit(MAX_FOLLOW_UPS)));
                self.pending.clear();
                break;
            }
            ran += 1;
            if let Err(error) = self.apply(request.clone()) {
                tracing::warn!(%request, %error, "follow-up edit failed");
                self.follow_up_errors.push((request, error));
            }
        }
        self.draining = false;
    }

    fn created(change: Option<Change>) -> Result<ItemHandle> {
        change
            .and_then(|change| change.target())
            .ok_or_else(|| LeadsheetError::InvalidArgument("nothing was created".into()))
    }

    /// Add a chord symbol, annotation or time signature marker.
    ///
    /// Beat-based items are snapped to the quantization grid of the section
    /// owning the bar; markers always sit on beat 0.
    pub fn add_item(&mut self, data: ItemData, position: Position) -> Result<ItemHandle> {
        Self::created(self.apply(EditRequest::AddItem { data, position })?)
    }

    pub fn add_chord(&mut self, text: &str, position: Position) -> Result<ItemHandle> {
        self.add_item(ItemData::chord(text)?, position)
    }

    pub fn add_annotation(&mut self, text: &str, position: Position) -> Result<ItemHandle> {
        self.add_item(ItemData::annotation(text), position)
    }

    /// Remove an item; sections go through [`Leadsheet::remove_section`] rules
    pub fn remove_item(&mut self, handle: ItemHandle) -> Result<()> {
        self.apply(EditRequest::RemoveItem { handle }).map(|_| ())
    }

    /// Move an item; for a section only the bar of `position` is used
    pub fn move_item(&mut self, handle: ItemHandle, position: Position) -> Result<()> {
        self.apply(EditRequest::MoveItem { handle, position }).map(|_| ())
    }

    /// Replace the payload of a non-section item with one of the same kind
    pub fn change_item(&mut self, handle: ItemHandle, data: ItemData) -> Result<()> {
        self.apply(EditRequest::ChangeItem { handle, data }).map(|_| ())
    }

    pub fn add_section(&mut self, name: &str, time_signature: TimeSignature, bar: u32) -> Result<ItemHandle> {
        Self::created(self.apply(EditRequest::AddSection {
            name: name.to_string(),
            time_signature,
            bar,
        })?)
    }

    /// Remove a section; its bars are absorbed by the preceding section
    pub fn remove_section(&mut self, handle: ItemHandle) -> Result<()> {
        self.apply(EditRequest::RemoveSection { handle }).map(|_| ())
    }

    pub fn move_section(&mut self, handle: ItemHandle, bar: u32) -> Result<()> {
        self.apply(EditRequest::MoveSection { handle, bar }).map(|_| ())
    }

    pub fn set_section_name(&mut self, handle: ItemHandle, name: &str) -> Result<()> {
        self.apply(EditRequest::RenameSection {
            handle,
            name: name.to_string(),
        })
        .map(|_| ())
    }

    /// Retype a section, snapping the items no longer on its grid
    pub fn set_section_time_signature(&mut self, handle: ItemHandle, time_signature: TimeSignature) -> Result<()> {
        self.apply(EditRequest::SetSectionTimeSignature {
            handle,
            time_signature,
        })
        .map(|_| ())
    }

    /// Insert `count` empty bars before `at_bar` (`at_bar == size` appends)
    pub fn insert_bars(&mut self, at_bar: u32, count: u32) -> Result<()> {
        self.apply(EditRequest::InsertBars { at_bar, count }).map(|_| ())
    }

    /// Delete bars `from..=to` and everything in them
    pub fn delete_bars(&mut self, from: u32, to: u32) -> Result<()> {
        self.apply(EditRequest::DeleteBars { from, to }).map(|_| ())
    }

    pub fn set_size_in_bars(&mut self, size_in_bars: u32) -> Result<()> {
        self.apply(EditRequest::SetSize { size_in_bars }).map(|_| ())
    }

    // ---- Undo / redo ----

    /// Revert the last edit and tell the change listeners about it
    pub fn undo(&mut self) -> Result<Change> {
        let change = self.history.undo(&mut self.state)?;
        self.replayed(change, ChangeOrigin::Undo)
    }

    /// Re-apply the last undone edit
    pub fn redo(&mut self) -> Result<Change> {
        let change = self.history.redo(&mut self.state)?;
        self.replayed(change, ChangeOrigin::Redo)
    }

    fn replayed(&mut self, change: Change, origin: ChangeOrigin) -> Result<Change> {
        debug_assert_eq!(
            self.state.check_invariants(),
            Ok(()),
            "invariant broken replaying {}",
            change
        );
        tracing::debug!(change = %change, ?origin, undo_depth = self.history.undo_count(), "history replayed");
        let follow_ups = self
            .dispatcher
            .replay(&ChangeEvent::new(change.clone(), origin));
        self.run_follow_ups(follow_ups);
        Ok(change)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Number of entries on the undo stack
    pub fn undo_count(&self) -> usize {
        self.history.undo_count()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.history.undo_description()
    }

    pub fn redo_description(&self) -> Option<String> {
        self.history.redo_description()
    }

    pub fn clear_undo_history(&mut self) {
        self.history.clear();
    }
}
