// SectionIndex - derived partition of the bars into sections
//
// Rebuilt from the store's section items whenever a committed mutation touches
// a section or the size of the sheet. Never edited directly.

use crate::leadsheet::item::{ItemKinds, Section};
use crate::leadsheet::store::{ItemHandle, ItemStore};
use crate::timeline::TimeSignature;

/// Bar range covered by one section, both ends inclusive
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SectionSpan {
    pub handle: ItemHandle,
    pub section: Section,
    pub start_bar: u32,
    pub end_bar: u32,
}

impl SectionSpan {
    pub fn contains(&self, bar: u32) -> bool {
        (self.start_bar..=self.end_bar).contains(&bar)
    }

    /// Number of bars in the span
    pub fn bar_count(&self) -> u32 {
        self.end_bar - self.start_bar + 1
    }

    pub fn name(&self) -> &str {
        &self.section.name
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.section.time_signature
    }
}

/// Build spans from section starts; starts may be given in any order
pub fn spans_from_starts(
    mut starts: Vec<(u32, ItemHandle, Section)>,
    size_in_bars: u32,
) -> Vec<SectionSpan> {
    starts.sort_by_key(|(bar, _, _)| *bar);
    let next_starts: Vec<u32> = starts
        .iter()
        .skip(1)
        .map(|(bar, _, _)| *bar)
        .chain(std::iter::once(size_in_bars))
        .collect();
    starts
        .into_iter()
        .zip(next_starts)
        .map(|((start_bar, handle, section), next)| SectionSpan {
            handle,
            section,
            start_bar,
            end_bar: next.saturating_sub(1).max(start_bar),
        })
        .collect()
}

/// Span owning `bar` in an ordered span list
pub fn span_at(spans: &[SectionSpan], bar: u32) -> Option<&SectionSpan> {
    let index = spans.partition_point(|span| span.start_bar <= bar);
    index.checked_sub(1).map(|i| &spans[i])
}

/// Ordered, non-overlapping sections of a leadsheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionIndex {
    spans: Vec<SectionSpan>,
}

impl SectionIndex {
    /// Compute the index from the section items of a store
    pub fn build(store: &ItemStore, size_in_bars: u32) -> Self {
        let starts = store
            .query_range(0, u32::MAX, ItemKinds::SECTION)
            .filter_map(|(handle, item)| {
                item.as_section()
                    .map(|section| (item.position.bar, handle, section.clone()))
            })
            .collect();
        Self {
            spans: spans_from_starts(starts, size_in_bars),
        }
    }

    pub fn spans(&self) -> &[SectionSpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The section pinned at bar 0
    pub fn initial(&self) -> Option<&SectionSpan> {
        self.spans.first()
    }

    /// Section owning a bar
    pub fn span_of_bar(&self, bar: u32) -> Option<&SectionSpan> {
        span_at(&self.spans, bar)
    }

    /// Span of a section item
    pub fn span_of(&self, handle: ItemHandle) -> Option<&SectionSpan> {
        self.spans.iter().find(|span| span.handle == handle)
    }

    /// Section by name, case-insensitive
    pub fn by_name(&self, name: &str) -> Option<&SectionSpan> {
        self.spans.iter().find(|span| span.section.has_name(name))
    }

    /// Section starting exactly at `bar`
    pub fn starting_at(&self, bar: u32) -> Option<&SectionSpan> {
        self.spans
            .binary_search_by_key(&bar, |span| span.start_bar)
            .ok()
            .map(|i| &self.spans[i])
    }
}
