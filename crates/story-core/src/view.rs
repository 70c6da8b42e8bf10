#![forbid(unsafe_code)]

//! Read-only render model derived from the controller.
//!
//! [`StoryView::project`] is recomputed after every update. It borrows from
//! the controller and never mutates it; the rail uses display order while
//! every index it exposes is canonical.

use std::time::Duration;

use crate::content::{ContentItem, GroupSource};
use crate::controller::{PlaybackController, PlaybackState};

/// The open story player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView<'a> {
    /// Canonical index of the active group.
    pub group_index: usize,
    pub group_name: &'a str,
    pub is_global: bool,
    pub item_index: usize,
    pub item: &'a ContentItem,
    /// Fill fraction of each segment bar: `1.0` for items already shown,
    /// the live progress for the active item, `0.0` for items ahead.
    pub bars: Vec<f64>,
    pub paused: bool,
    pub remaining: Duration,
}

/// One avatar in the story rail.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupChip<'a> {
    /// Canonical index; pass this to `open`.
    pub index: usize,
    pub source: &'a GroupSource,
    pub name: &'a str,
    pub initial: char,
    pub item_count: usize,
    pub viewed: bool,
    /// Rendered faded: viewed and not global.
    pub dimmed: bool,
    /// Carries the urgent badge: the global group.
    pub urgent: bool,
    /// Currently open in the player.
    pub active: bool,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryView<'a> {
    pub player: Option<PlayerView<'a>>,
    /// Groups in display order.
    pub rail: Vec<GroupChip<'a>>,
}

impl<'a> StoryView<'a> {
    /// Project the controller's current state.
    #[must_use]
    pub fn project(controller: &'a PlaybackController) -> Self {
        let collection = controller.collection();
        let history = controller.history();
        let state = controller.state();
        let active_group = state.position().map(|(g, _)| g);

        let rail = collection
            .display_order(history)
            .into_iter()
            .filter_map(|index| {
                let group = collection.group(index)?;
                let viewed = history.is_viewed(group.source());
                Some(GroupChip {
                    index,
                    source: group.source(),
                    name: group.name(),
                    initial: group.initial(),
                    item_count: group.len(),
                    viewed,
                    dimmed: viewed && !group.is_global(),
                    urgent: group.is_global(),
                    active: active_group == Some(index),
                })
            })
            .collect();

        let player = state.position().and_then(|(group_index, item_index)| {
            let group = collection.group(group_index)?;
            let item = group.item(item_index)?;
            let progress = controller.progress();
            let bars = (0..group.len())
                .map(|i| match i.cmp(&item_index) {
                    std::cmp::Ordering::Less => 1.0,
                    std::cmp::Ordering::Equal => progress,
                    std::cmp::Ordering::Greater => 0.0,
                })
                .collect();
            Some(PlayerView {
                group_index,
                group_name: group.name(),
                is_global: group.is_global(),
                item_index,
                item,
                bars,
                paused: matches!(state, PlaybackState::Paused { .. }),
                remaining: controller.remaining(),
            })
        });

        Self { player, rail }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.player.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::StoryCollection;
    use crate::config::StoryConfig;
    use crate::content::Timestamp;

    const FAR: Timestamp = Timestamp(u64::MAX);

    fn controller() -> PlaybackController {
        let items = vec![
            ContentItem::community("a1", "a", "Zona Sul", "x", Timestamp(1), FAR),
            ContentItem::community("a2", "a", "Zona Sul", "x", Timestamp(2), FAR),
            ContentItem::community("a3", "a", "Zona Sul", "x", Timestamp(3), FAR),
            ContentItem::community("b1", "b", "Centro", "x", Timestamp(1), FAR),
            ContentItem::global("g1", "Coordenação", "x", Timestamp(1), FAR),
        ];
        PlaybackController::new(StoryCollection::build(items), StoryConfig::default())
    }

    #[test]
    fn closed_view_lists_rail_only() {
        let c = controller();
        let view = StoryView::project(&c);
        assert!(!view.is_open());
        let names: Vec<_> = view.rail.iter().map(|chip| chip.name).collect();
        assert_eq!(names, vec!["Coordenação", "Zona Sul", "Centro"]);
        assert!(view.rail[0].urgent);
        assert!(view.rail.iter().all(|chip| !chip.dimmed && !chip.active));
    }

    #[test]
    fn bars_fill_behind_active_item() {
        let mut c = controller();
        c.open(1);
        c.advance_item();
        c.tick(Duration::from_millis(1500));

        let view = StoryView::project(&c);
        let Some(player) = view.player else {
            panic!("player should be open");
        };
        assert_eq!(player.group_name, "Zona Sul");
        assert_eq!(player.item.id, "a2");
        assert_eq!(player.bars.len(), 3);
        assert_eq!(player.bars[0], 1.0);
        assert!((player.bars[1] - 0.25).abs() < 1e-9);
        assert_eq!(player.bars[2], 0.0);
        assert!(!player.paused);
    }

    #[test]
    fn viewed_groups_dim_and_move_back_without_reindexing() {
        let mut c = controller();
        c.open(1);
        c.close();

        let view = StoryView::project(&c);
        let order: Vec<_> = view.rail.iter().map(|chip| chip.index).collect();
        assert_eq!(order, vec![0, 2, 1]);
        let zona_sul = &view.rail[2];
        assert!(zona_sul.viewed && zona_sul.dimmed);
        assert_eq!(zona_sul.index, 1, "chip keeps its canonical index");
    }

    #[test]
    fn active_chip_and_pause_flag() {
        let mut c = controller();
        c.open(0);
        c.tick(Duration::from_secs(3));
        c.pause();

        let view = StoryView::project(&c);
        let active: Vec<_> = view.rail.iter().filter(|chip| chip.active).collect();
        assert_eq!(active.len(), 1);
        assert!(active[0].urgent && !active[0].dimmed);

        let Some(player) = view.player else {
            panic!("player should be open");
        };
        assert!(player.paused);
        assert!(player.is_global);
        assert_eq!(player.remaining, Duration::from_secs(3));
    }
}
