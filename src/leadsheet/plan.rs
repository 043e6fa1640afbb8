// Edit planning - turns an EditRequest into the mutations implementing it
//
// Planning never touches the document. It validates a request against the
// current state and computes every resulting position up front, so the
// complete change can be shown to vetoable listeners before anything happens
// and recorded as a single undoable edit afterwards.

use crate::command::{Mutation, SheetState};
use crate::error::{LeadsheetError, Result};
use crate::events::{Adjustment, Change, LayoutChange, SectionMoveKind};
use crate::leadsheet::item::{Item, ItemData, ItemKind, ItemKinds, Section};
use crate::leadsheet::request::EditRequest;
use crate::leadsheet::sections::{SectionSpan, span_at, spans_from_starts};
use crate::leadsheet::store::ItemHandle;
use crate::timeline::{Position, Quantization, TimeSignature, is_on_grid, quantize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Mutations of one operation plus the change they describe
#[derive(Debug, Clone)]
pub(crate) struct Plan {
    pub mutations: Vec<Mutation>,
    pub change: Change,
}

type SectionStart = (u32, ItemHandle, Section);

pub(crate) struct Planner<'a> {
    state: &'a SheetState,
    quantization: Quantization,
    section_name_prefix: &'a str,
}

impl<'a> Planner<'a> {
    pub fn new(state: &'a SheetState, quantization: Quantization, section_name_prefix: &'a str) -> Self {
        Self {
            state,
            quantization,
            section_name_prefix,
        }
    }

    /// Plan a request; `Ok(None)` means it would not change anything
    pub fn plan(&self, request: &EditRequest) -> Result<Option<Plan>> {
        match request {
            EditRequest::AddItem { data, position } => self.add_item(data, *position).map(Some),
            EditRequest::RemoveItem { handle } => self.remove_item(*handle).map(Some),
            EditRequest::MoveItem { handle, position } => self.move_item(*handle, *position),
            EditRequest::ChangeItem { handle, data } => self.change_item(*handle, data),
            EditRequest::AddSection {
                name,
                time_signature,
                bar,
            } => self.add_section(name, *time_signature, *bar).map(Some),
            EditRequest::RemoveSection { handle } => self.remove_section(*handle).map(Some),
            EditRequest::MoveSection { handle, bar } => self.move_section(*handle, *bar),
            EditRequest::RenameSection { handle, name } => self.rename_section(*handle, name),
            EditRequest::SetSectionTimeSignature {
                handle,
                time_signature,
            } => self.set_time_signature(*handle, *time_signature),
            EditRequest::InsertBars { at_bar, count } => self.insert_bars(*at_bar, *count).map(Some),
            EditRequest::DeleteBars { from, to } => self.delete_bars(*from, *to).map(Some),
            EditRequest::SetSize { size_in_bars } => self.set_size(*size_in_bars),
        }
    }

    fn spans(&self) -> &[SectionSpan] {
        self.state.sections().spans()
    }

    fn size(&self) -> u32 {
        self.state.size_in_bars()
    }

    fn starts(&self) -> Vec<SectionStart> {
        self.spans()
            .iter()
            .map(|span| (span.start_bar, span.handle, span.section.clone()))
            .collect()
    }

    fn layout(&self, after: &[SectionSpan]) -> LayoutChange {
        LayoutChange::new(self.spans().to_vec(), after.to_vec())
    }

    fn section(&self, handle: ItemHandle) -> Result<(Position, Section)> {
        let item = self.state.store().resolve(handle)?;
        let section = item.as_section().cloned().ok_or_else(|| {
            LeadsheetError::InvalidArgument(format!("{} is not a section", handle))
        })?;
        Ok((item.position, section))
    }

    fn removal(&self, handle: ItemHandle) -> Result<Mutation> {
        let store = self.state.store();
        Ok(Mutation::Remove {
            handle,
            item: store.resolve(handle)?.clone(),
            seq: store.seq_of(handle)?,
        })
    }

    fn check_in_bounds(&self, bar: u32) -> Result<()> {
        if bar >= self.size() {
            return Err(LeadsheetError::PositionOutOfBounds {
                bar,
                size_in_bars: self.size(),
            });
        }
        Ok(())
    }

    /// Position an item of `kind` actually lands on when placed at `position`
    fn snap(&self, kind: ItemKind, position: Position) -> Position {
        if !kind.is_beat_based() {
            return Position::at_bar(position.bar);
        }
        match self.state.sections().span_of_bar(position.bar) {
            Some(span) => quantize(
                position,
                span.time_signature(),
                self.quantization,
                span.end_bar,
            ),
            None => position,
        }
    }

    fn is_occupied(&self, kind: ItemKind, position: Position, except: Option<ItemHandle>) -> bool {
        self.state
            .store()
            .items_at(position, kind.into())
            .any(|(handle, _)| Some(handle) != except)
    }

    fn validate_payload(data: &ItemData) -> Result<()> {
        match data {
            ItemData::Section(_) => Err(LeadsheetError::InvalidArgument(
                "sections are edited with the section operations".into(),
            )),
            ItemData::Annotation(text) if text.trim().is_empty() => Err(
                LeadsheetError::InvalidArgument("annotation text is blank".into()),
            ),
            ItemData::TimeSignatureMarker(signature) => signature.validate().map(|_| ()),
            _ => Ok(()),
        }
    }

    fn unused_section_name(&self) -> String {
        (1u32..)
            .map(|k| format!("{}{}", self.section_name_prefix, k))
            .find(|name| self.state.sections().by_name(name).is_none())
            .unwrap_or_default()
    }

    /// Settle every surviving event after an edit.
    ///
    /// `shift` maps a current position to the one it has once bars are
    /// inserted or deleted. A beat-based item whose owning time signature
    /// changes is snapped to the new grid when its beat is no longer on it.
    /// Snapping onto a position already taken by an item of the same kind
    /// drops the snapped item; items that did not need snapping always win.
    fn relocate(
        &self,
        after: &[SectionSpan],
        removed: &HashSet<ItemHandle>,
        shift: impl Fn(Position) -> Position,
        mutations: &mut Vec<Mutation>,
    ) -> Result<Vec<Adjustment>> {
        let mut settled = Vec::new();
        for (handle, item) in self.state.store().query_range(0, u32::MAX, ItemKinds::EVENTS) {
            if removed.contains(&handle) {
                continue;
            }
            let shifted = shift(item.position);
            let mut target = shifted;
            if item.kind().is_beat_based() {
                let owners = (
                    span_at(self.spans(), item.position.bar),
                    span_at(after, shifted.bar),
                );
                if let (Some(old_owner), Some(new_owner)) = owners {
                    let ts = new_owner.time_signature();
                    if old_owner.time_signature() != ts
                        && !is_on_grid(shifted.beat, ts, self.quantization)
                    {
                        target = quantize(shifted, ts, self.quantization, new_owner.end_bar);
                    }
                }
            }
            settled.push((handle, item, target, target != shifted));
        }

        let mut taken: HashSet<(ItemKind, Position)> = settled
            .iter()
            .filter(|(_, _, _, snapped)| !snapped)
            .map(|(_, item, target, _)| (item.kind(), *target))
            .collect();

        let mut adjustments = Vec::new();
        for (handle, item, target, snapped) in settled {
            if snapped {
                if !taken.insert((item.kind(), target)) {
                    mutations.push(self.removal(handle)?);
                    adjustments.push(Adjustment::Dropped {
                        handle,
                        item: item.clone(),
                    });
                    continue;
                }
                adjustments.push(Adjustment::Requantized {
                    handle,
                    kind: item.kind(),
                    from: item.position,
                    to: target,
                });
            }
            if target != item.position {
                mutations.push(Mutation::Move {
                    handle,
                    from: item.position,
                    to: target,
                });
            }
        }
        Ok(adjustments)
    }

    fn add_item(&self, data: &ItemData, position: Position) -> Result<Plan> {
        Self::validate_payload(data)?;
        self.check_in_bounds(position.bar)?;
        let kind = data.kind();
        let position = self.snap(kind, position);
        if self.is_occupied(kind, position, None) {
            return Err(LeadsheetError::DuplicatePosition(position.to_string()));
        }

        let store = self.state.store();
        let handle = store.next_handle();
        let item = Item::new(position, data.clone());
        Ok(Plan {
            mutations: vec![Mutation::Insert {
                handle,
                item: item.clone(),
                seq: store.next_seq(),
            }],
            change: Change::ItemAdded { handle, item },
        })
    }

    fn remove_item(&self, handle: ItemHandle) -> Result<Plan> {
        let item = self.state.store().resolve(handle)?;
        if item.kind() == ItemKind::Section {
            return self.remove_section(handle);
        }
        Ok(Plan {
            mutations: vec![self.removal(handle)?],
            change: Change::ItemRemoved {
                handle,
                item: item.clone(),
            },
        })
    }

    fn move_item(&self, handle: ItemHandle, position: Position) -> Result<Option<Plan>> {
        let item = self.state.store().resolve(handle)?;
        let kind = item.kind();
        if kind == ItemKind::Section {
            return self.move_section(handle, position.bar);
        }
        self.check_in_bounds(position.bar)?;

        let from = item.position;
        let to = self.snap(kind, position);
        if to == from {
            return Ok(None);
        }
        if self.is_occupied(kind, to, Some(handle)) {
            return Err(LeadsheetError::DuplicatePosition(to.to_string()));
        }
        Ok(Some(Plan {
            mutations: vec![Mutation::Move { handle, from, to }],
            change: Change::ItemMoved {
                handle,
                kind,
                from,
                to,
            },
        }))
    }

    fn change_item(&self, handle: ItemHandle, data: &ItemData) -> Result<Option<Plan>> {
        let item = self.state.store().resolve(handle)?;
        if item.kind() == ItemKind::Section {
            return Err(LeadsheetError::InvalidArgument(
                "sections are renamed or retyped, not replaced".into(),
            ));
        }
        Self::validate_payload(data)?;
        if data.kind() != item.kind() {
            return Err(LeadsheetError::InvalidArgument(format!(
                "can not turn a {:?} into a {:?}",
                item.kind(),
                data.kind()
            )));
        }
        if *data == item.data {
            return Ok(None);
        }
        Ok(Some(Plan {
            mutations: vec![Mutation::Replace {
                handle,
                old: item.data.clone(),
                new: data.clone(),
            }],
            change: Change::ItemChanged {
                handle,
                position: item.position,
                old: item.data.clone(),
                new: data.clone(),
            },
        }))
    }

    fn add_section(&self, name: &str, time_signature: TimeSignature, bar: u32) -> Result<Plan> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LeadsheetError::InvalidArgument("section name is blank".into()));
        }
        time_signature.validate()?;
        if self.state.sections().by_name(name).is_some() {
            return Err(LeadsheetError::DuplicateSectionName(name.to_string()));
        }
        if bar == 0 || bar >= self.size() {
            return Err(LeadsheetError::InvalidBar(bar));
        }
        if self.state.sections().starting_at(bar).is_some() {
            return Err(LeadsheetError::BarOccupied(bar));
        }

        let store = self.state.store();
        let handle = store.next_handle();
        let section = Section::new(name, time_signature);
        let mut mutations = vec![Mutation::Insert {
            handle,
            item: Item::new(Position::at_bar(bar), ItemData::Section(section.clone())),
            seq: store.next_seq(),
        }];

        let mut starts = self.starts();
        starts.push((bar, handle, section.clone()));
        let after = spans_from_starts(starts, self.size());
        let adjustments = self.relocate(&after, &HashSet::new(), |p| p, &mut mutations)?;

        Ok(Plan {
            mutations,
            change: Change::SectionAdded {
                handle,
                section,
                bar,
                adjustments,
                layout: self.layout(&after),
            },
        })
    }

    fn remove_section(&self, handle: ItemHandle) -> Result<Plan> {
        let (position, section) = self.section(handle)?;
        if position.bar == 0 {
            return Err(LeadsheetError::CannotRemoveInitialSection);
        }

        let mut mutations = vec![self.removal(handle)?];
        let starts = self
            .starts()
            .into_iter()
            .filter(|(_, other, _)| *other != handle)
            .collect();
        let after = spans_from_starts(starts, self.size());
        let adjustments = self.relocate(&after, &HashSet::new(), |p| p, &mut mutations)?;

        Ok(Plan {
            mutations,
            change: Change::SectionRemoved {
                handle,
                section,
                bar: position.bar,
                adjustments,
                layout: self.layout(&after),
            },
        })
    }

    fn move_section(&self, handle: ItemHandle, bar: u32) -> Result<Option<Plan>> {
        let (position, section) = self.section(handle)?;
        let from_bar = position.bar;
        if from_bar == 0 {
            return Err(LeadsheetError::CannotMoveInitialSection);
        }
        if bar == 0 {
            return Err(LeadsheetError::IllegalSectionPosition(bar));
        }
        self.check_in_bounds(bar)?;
        if bar == from_bar {
            return Ok(None);
        }
        if self.state.sections().starting_at(bar).is_some() {
            return Err(LeadsheetError::IllegalSectionPosition(bar));
        }

        let (low, high) = (from_bar.min(bar), from_bar.max(bar));
        let kind = if self
            .spans()
            .iter()
            .any(|span| span.start_bar > low && span.start_bar < high)
        {
            SectionMoveKind::Big
        } else {
            SectionMoveKind::Small
        };

        let mut mutations = vec![Mutation::Move {
            handle,
            from: position,
            to: Position::at_bar(bar),
        }];
        let starts = self
            .starts()
            .into_iter()
            .map(|(start, other, s)| if other == handle { (bar, other, s) } else { (start, other, s) })
            .collect();
        let after = spans_from_starts(starts, self.size());
        let adjustments = self.relocate(&after, &HashSet::new(), |p| p, &mut mutations)?;

        Ok(Some(Plan {
            mutations,
            change: Change::SectionMoved {
                handle,
                section,
                from_bar,
                to_bar: bar,
                kind,
                adjustments,
                layout: self.layout(&after),
            },
        }))
    }

    fn rename_section(&self, handle: ItemHandle, name: &str) -> Result<Option<Plan>> {
        let (_, section) = self.section(handle)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(LeadsheetError::InvalidArgument("section name is blank".into()));
        }
        if section.name == name {
            return Ok(None);
        }
        let taken = self
            .state
            .sections()
            .by_name(name)
            .is_some_and(|span| span.handle != handle);
        if taken {
            return Err(LeadsheetError::DuplicateSectionName(name.to_string()));
        }

        let renamed = Section::new(name, section.time_signature);
        Ok(Some(Plan {
            mutations: vec![Mutation::Replace {
                handle,
                old: ItemData::Section(section.clone()),
                new: ItemData::Section(renamed),
            }],
            change: Change::SectionRenamed {
                handle,
                old_name: section.name,
                new_name: name.to_string(),
            },
        }))
    }

    fn set_time_signature(&self, handle: ItemHandle, time_signature: TimeSignature) -> Result<Option<Plan>> {
        let (_, section) = self.section(handle)?;
        time_signature.validate()?;
        if section.time_signature == time_signature {
            return Ok(None);
        }

        let retyped = Section::new(section.name.clone(), time_signature);
        let mut mutations = vec![Mutation::Replace {
            handle,
            old: ItemData::Section(section.clone()),
            new: ItemData::Section(retyped.clone()),
        }];
        let starts = self
            .starts()
            .into_iter()
            .map(|(start, other, s)| {
                if other == handle {
                    (start, other, retyped.clone())
                } else {
                    (start, other, s)
                }
            })
            .collect();
        let after = spans_from_starts(starts, self.size());
        let adjustments = self.relocate(&after, &HashSet::new(), |p| p, &mut mutations)?;

        Ok(Some(Plan {
            mutations,
            change: Change::SectionTimeSignatureChanged {
                handle,
                name: section.name,
                old: section.time_signature,
                new: time_signature,
                adjustments,
                layout: self.layout(&after),
            },
        }))
    }

    fn insert_bars(&self, at_bar: u32, count: u32) -> Result<Plan> {
        if count == 0 {
            return Err(LeadsheetError::InvalidArgument(
                "at least one bar must be inserted".into(),
            ));
        }
        let size = self.size();
        if at_bar > size {
            return Err(LeadsheetError::InvalidBar(at_bar));
        }
        let new_size = size
            .checked_add(count)
            .ok_or_else(|| LeadsheetError::InvalidArgument("too many bars".into()))?;

        let store = self.state.store();
        let mut mutations = vec![Mutation::Resize {
            from: size,
            to: new_size,
        }];
        for (handle, item) in store.query_range(at_bar, u32::MAX, ItemKinds::all()) {
            mutations.push(Mutation::Move {
                handle,
                from: item.position,
                to: item.position.with_bar(item.position.bar + count),
            });
        }

        let mut starts: Vec<SectionStart> = self
            .starts()
            .into_iter()
            .map(|(start, handle, s)| {
                if start >= at_bar {
                    (start + count, handle, s)
                } else {
                    (start, handle, s)
                }
            })
            .collect();

        // The initial section moves along; a new one keeps bar 0 covered
        let mut new_initial_section = None;
        if at_bar == 0 {
            let time_signature = self
                .state
                .sections()
                .initial()
                .map(|span| span.time_signature())
                .ok_or_else(|| LeadsheetError::InvalidArgument("no initial section".into()))?;
            let section = Section::new(self.unused_section_name(), time_signature);
            let handle = store.next_handle();
            mutations.push(Mutation::Insert {
                handle,
                item: Item::new(Position::zero(), ItemData::Section(section.clone())),
                seq: store.next_seq(),
            });
            starts.push((0, handle, section));
            new_initial_section = Some(handle);
        }
        let after = spans_from_starts(starts, new_size);

        Ok(Plan {
            mutations,
            change: Change::BarsInserted {
                at_bar,
                count,
                new_initial_section,
                layout: self.layout(&after),
            },
        })
    }

    fn delete_bars(&self, from: u32, to: u32) -> Result<Plan> {
        let size = self.size();
        if from > to || to >= size || (from == 0 && to == size - 1) {
            return Err(LeadsheetError::InvalidRange { from, to });
        }
        let count = to - from + 1;
        let store = self.state.store();

        let mut mutations = vec![Mutation::Resize {
            from: size,
            to: size - count,
        }];
        let mut removed = Vec::new();
        let mut removed_handles = HashSet::new();
        for (handle, item) in store.query_range(from, to, ItemKinds::EVENTS) {
            mutations.push(self.removal(handle)?);
            removed.push((handle, item.clone()));
            removed_handles.insert(handle);
        }

        // When bar 0 goes, the section owning the first surviving bar takes its place
        let promoted = if from == 0 {
            span_at(self.spans(), to + 1).map(|span| span.handle)
        } else {
            None
        };

        let mut starts = Vec::new();
        for span in self.spans() {
            let (start, handle) = (span.start_bar, span.handle);
            if start > to {
                mutations.push(Mutation::Move {
                    handle,
                    from: Position::at_bar(start),
                    to: Position::at_bar(start - count),
                });
                starts.push((start - count, handle, span.section.clone()));
            } else if start < from {
                starts.push((start, handle, span.section.clone()));
            } else if Some(handle) == promoted {
                if start != 0 {
                    mutations.push(Mutation::Move {
                        handle,
                        from: Position::at_bar(start),
                        to: Position::zero(),
                    });
                }
                starts.push((0, handle, span.section.clone()));
            } else {
                mutations.push(self.removal(handle)?);
                removed.push((handle, store.resolve(handle)?.clone()));
            }
        }

        let after = spans_from_starts(starts, size - count);
        let shift = |p: Position| {
            if p.bar > to {
                p.with_bar(p.bar - count)
            } else {
                p
            }
        };
        let adjustments = self.relocate(&after, &removed_handles, shift, &mut mutations)?;
        removed.sort_by_key(|(_, item)| item.position);

        Ok(Plan {
            mutations,
            change: Change::BarsDeleted {
                from,
                to,
                removed,
                adjustments,
                layout: self.layout(&after),
            },
        })
    }

    fn set_size(&self, size_in_bars: u32) -> Result<Option<Plan>> {
        if size_in_bars == 0 {
            return Err(LeadsheetError::InvalidArgument(
                "a leadsheet has at least one bar".into(),
            ));
        }
        let old_size = self.size();
        let plan = match size_in_bars.cmp(&old_size) {
            Ordering::Equal => return Ok(None),
            Ordering::Less => self.delete_bars(size_in_bars, old_size - 1)?,
            Ordering::Greater => self.insert_bars(old_size, size_in_bars - old_size)?,
        };

        let (removed, adjustments, layout) = match plan.change {
            Change::BarsDeleted {
                removed,
                adjustments,
                layout,
                ..
            } => (removed, adjustments, layout),
            other => (
                Vec::new(),
                Vec::new(),
                other.layout().cloned().unwrap_or_default(),
            ),
        };
        Ok(Some(Plan {
            mutations: plan.mutations,
            change: Change::SizeChanged {
                old_size,
                new_size: size_in_bars,
                removed,
                adjustments,
                layout,
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> SheetState {
        SheetState::new(Section::new("Section1", TimeSignature::FOUR_FOUR), 8)
    }

    fn plan(state: &SheetState, request: EditRequest) -> Result<Option<Plan>> {
        Planner::new(state, Quantization::Beat, "Section").plan(&request)
    }

    fn commit(state: &mut SheetState, request: EditRequest) -> Change {
        let plan = plan(state, request).unwrap().unwrap();
        state.apply_all(&plan.mutations).unwrap();
        assert_eq!(state.check_invariants(), Ok(()));
        plan.change
    }

    #[test]
    fn test_planning_does_not_mutate() {
        let state = sheet();
        let before = state.clone();
        let planned = plan(
            &state,
            EditRequest::AddSection {
                name: "B".into(),
                time_signature: TimeSignature::THREE_FOUR,
                bar: 4,
            },
        )
        .unwrap();
        assert!(planned.is_some());
        assert!(state == before);
    }

    #[test]
    fn test_add_item_snaps_to_grid() {
        let mut state = sheet();
        let change = commit(
            &mut state,
            EditRequest::AddItem {
                data: ItemData::chord("C").unwrap(),
                position: Position::beats(1, 7, 4),
            },
        );
        let Change::ItemAdded { item, .. } = change else {
            panic!("unexpected change {:?}", change);
        };
        assert_eq!(item.position, Position::beats(1, 2, 1));
    }

    #[test]
    fn test_markers_sit_on_first_beat() {
        let mut state = sheet();
        let change = commit(
            &mut state,
            EditRequest::AddItem {
                data: ItemData::TimeSignatureMarker(TimeSignature::FOUR_FOUR),
                position: Position::beats(2, 3, 1),
            },
        );
        assert!(matches!(change, Change::ItemAdded { item, .. } if item.position == Position::at_bar(2)));
    }

    #[test]
    fn test_requantize_collision_drops_snapped_item() {
        let mut state = sheet();
        for (numer, denom, text) in [(1, 1, "C"), (3, 2, "C7"), (2, 1, "D")] {
            let planned = Planner::new(&state, Quantization::HalfBeat, "Section")
                .plan(&EditRequest::AddItem {
                    data: ItemData::chord(text).unwrap(),
                    position: Position::beats(2, numer, denom),
                })
                .unwrap()
                .unwrap();
            state.apply_all(&planned.mutations).unwrap();
        }

        let planned = plan(
            &state,
            EditRequest::AddSection {
                name: "Waltz".into(),
                time_signature: TimeSignature::THREE_FOUR,
                bar: 2,
            },
        )
        .unwrap()
        .unwrap();
        // Only beat 1.5 is off the 3/4 grid; it rounds onto beat 2, which is taken
        let Change::SectionAdded { adjustments, .. } = &planned.change else {
            panic!("unexpected change {:?}", planned.change);
        };
        assert_eq!(adjustments.len(), 1);
        assert!(matches!(
            &adjustments[0],
            Adjustment::Dropped { item, .. } if item.position == Position::beats(2, 3, 2)
        ));

        state.apply_all(&planned.mutations).unwrap();
        assert_eq!(state.check_invariants(), Ok(()));
        let left: Vec<_> = state
            .store()
            .query_range(2, 2, ItemKinds::CHORD_SYMBOL)
            .map(|(_, item)| item.to_string())
            .collect();
        assert_eq!(left, vec!["C[2:1]", "D[2:2]"]);
    }

    #[test]
    fn test_no_op_requests() {
        let mut state = sheet();
        let section = state.sections().initial().unwrap().handle;
        assert!(
            plan(
                &state,
                EditRequest::RenameSection {
                    handle: section,
                    name: "Section1".into()
                }
            )
            .unwrap()
            .is_none()
        );
        assert!(
            plan(
                &state,
                EditRequest::SetSectionTimeSignature {
                    handle: section,
                    time_signature: TimeSignature::FOUR_FOUR
                }
            )
            .unwrap()
            .is_none()
        );
        assert!(plan(&state, EditRequest::SetSize { size_in_bars: 8 }).unwrap().is_none());

        let change = commit(
            &mut state,
            EditRequest::AddItem {
                data: ItemData::annotation("intro"),
                position: Position::at_bar(1),
            },
        );
        let handle = change.target().unwrap();
        assert!(
            plan(
                &state,
                EditRequest::MoveItem {
                    handle,
                    position: Position::at_bar(1)
                }
            )
            .unwrap()
            .is_none()
        );
    }

    #[test]
    fn test_generated_initial_section_name() {
        let mut state = sheet();
        commit(
            &mut state,
            EditRequest::AddSection {
                name: "section2".into(),
                time_signature: TimeSignature::FOUR_FOUR,
                bar: 4,
            },
        );
        let change = commit(&mut state, EditRequest::InsertBars { at_bar: 0, count: 2 });
        let handle = change.target().unwrap();
        let section = state.store().get(handle).unwrap().as_section().unwrap().clone();
        assert_eq!(section.name, "Section3");
        assert_eq!(state.sections().by_name("Section1").unwrap().start_bar, 2);
    }
}
