#![forbid(unsafe_code)]

//! Grouped, ordered view over a flat list of live content items.
//!
//! # Invariants
//!
//! 1. If any item is global, the global group is element 0.
//! 2. Community groups keep first-seen order and are never reordered in
//!    storage.
//! 3. Items within a group ascend by creation time; ties keep input order.
//! 4. Every group holds at least one item.
//! 5. [`StoryCollection::display_order`] returns a permutation of canonical
//!    indices and never touches storage.

use std::collections::{HashMap, HashSet};

use crate::content::{CommunityId, ContentItem, GroupSource};

/// Avatar glyph used when a group has no display name.
const FALLBACK_INITIAL: char = 'C';

/// Items sharing one content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    source: GroupSource,
    name: String,
    items: Vec<ContentItem>,
}

impl Group {
    #[must_use]
    pub fn source(&self) -> &GroupSource {
        &self.source
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.source.is_global()
    }

    #[must_use]
    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    #[must_use]
    pub fn item(&self, index: usize) -> Option<&ContentItem> {
        self.items.get(index)
    }

    /// Number of items. Never zero for a group built by [`StoryCollection`].
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the last item.
    #[inline]
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.items.len().saturating_sub(1)
    }

    /// Uppercase first character of the display name, for the avatar.
    #[must_use]
    pub fn initial(&self) -> char {
        self.name
            .trim()
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or(FALLBACK_INITIAL)
    }
}

/// Ordered collection of story groups in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryCollection {
    groups: Vec<Group>,
}

impl StoryCollection {
    /// Group `items` by source.
    ///
    /// The input is expected to be pre-filtered to live items. Groups are
    /// created in first-seen order; the global group, if any, is moved to
    /// the front.
    #[must_use]
    pub fn build(items: Vec<ContentItem>) -> Self {
        let mut global: Option<Group> = None;
        let mut groups: Vec<Group> = Vec::new();
        let mut slots: HashMap<CommunityId, usize> = HashMap::new();

        for item in items {
            match item.source() {
                GroupSource::Global => {
                    global
                        .get_or_insert_with(|| Group {
                            source: GroupSource::Global,
                            name: item.source_name.clone(),
                            items: Vec::new(),
                        })
                        .items
                        .push(item);
                }
                GroupSource::Community(id) => {
                    let slot = *slots.entry(id.clone()).or_insert_with(|| {
                        groups.push(Group {
                            source: GroupSource::Community(id),
                            name: item.source_name.clone(),
                            items: Vec::new(),
                        });
                        groups.len() - 1
                    });
                    groups[slot].items.push(item);
                }
            }
        }

        if let Some(global) = global {
            groups.insert(0, global);
        }
        for group in &mut groups {
            // Stable: equal timestamps keep arrival order.
            group.items.sort_by_key(|item| item.created_at);
        }

        tracing::debug!(
            target: "story.collection",
            groups = groups.len(),
            has_global = groups.first().is_some_and(Group::is_global),
            "collection built"
        );

        Self { groups }
    }

    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    #[must_use]
    pub fn group(&self, index: usize) -> Option<&Group> {
        self.groups.get(index)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of items across all groups.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }

    /// Canonical index of the group with the given source.
    ///
    /// This is how a display position is reconciled back to the index that
    /// `open` addresses.
    #[must_use]
    pub fn index_of(&self, source: &GroupSource) -> Option<usize> {
        self.groups.iter().position(|g| g.source() == source)
    }

    /// Render order: global first, then unviewed, then viewed groups.
    ///
    /// Relative canonical order is preserved inside each band.
    #[must_use]
    pub fn display_order(&self, history: &ViewHistory) -> Vec<usize> {
        let mut global = Vec::with_capacity(1);
        let mut unviewed = Vec::with_capacity(self.groups.len());
        let mut viewed = Vec::new();

        for (index, group) in self.groups.iter().enumerate() {
            if group.is_global() {
                global.push(index);
            } else if history.is_viewed(group.source()) {
                viewed.push(index);
            } else {
                unviewed.push(index);
            }
        }

        global.extend(unviewed);
        global.extend(viewed);
        global
    }
}

/// In-memory set of community groups the user has opened.
///
/// Grows monotonically. The global source is never recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewHistory {
    viewed: HashSet<CommunityId>,
}

impl ViewHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `source` as viewed. Returns `true` if it was newly added.
    pub fn mark_viewed(&mut self, source: &GroupSource) -> bool {
        match source {
            GroupSource::Global => false,
            GroupSource::Community(id) => self.viewed.insert(id.clone()),
        }
    }

    #[must_use]
    pub fn is_viewed(&self, source: &GroupSource) -> bool {
        match source {
            GroupSource::Global => false,
            GroupSource::Community(id) => self.viewed.contains(id),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.viewed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.viewed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommunityId> {
        self.viewed.iter()
    }
}
