#![forbid(unsafe_code)]

//! Content items as handed over by the loading collaborator.
//!
//! Items are immutable once loaded. The loader is expected to drop expired
//! rows before building a collection; [`retain_live`] is the filter it uses.

use std::fmt;

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Construct from epoch milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Epoch milliseconds.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let ms = web_time::SystemTime::now()
            .duration_since(web_time::UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64);
        Self(ms)
    }
}

/// Identifier of a community that publishes stories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommunityId(pub String);

impl CommunityId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The source a group of stories belongs to.
///
/// `Global` is the reserved broadcast source. It sorts first in every
/// collection and is never recorded as viewed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupSource {
    Global,
    Community(CommunityId),
}

impl GroupSource {
    #[inline]
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }
}

impl fmt::Display for GroupSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Community(id) => write!(f, "community:{id}"),
        }
    }
}

/// One ephemeral announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: String,
    /// Owning community. Ignored when `is_global` is set.
    pub group_id: String,
    pub is_global: bool,
    /// Display name of the owning source (community name or the global label).
    pub source_name: String,
    pub body: String,
    /// Ordered poll options, if the item carries a poll.
    pub poll_options: Option<Vec<String>>,
    /// Call-to-action button label.
    pub cta_label: Option<String>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl ContentItem {
    /// Create a community item with the given creation and expiry times.
    #[must_use]
    pub fn community(
        id: impl Into<String>,
        group_id: impl Into<String>,
        source_name: impl Into<String>,
        body: impl Into<String>,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            group_id: group_id.into(),
            is_global: false,
            source_name: source_name.into(),
            body: body.into(),
            poll_options: None,
            cta_label: None,
            created_at,
            expires_at,
        }
    }

    /// Create a global broadcast item.
    #[must_use]
    pub fn global(
        id: impl Into<String>,
        source_name: impl Into<String>,
        body: impl Into<String>,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            group_id: String::new(),
            is_global: true,
            source_name: source_name.into(),
            body: body.into(),
            poll_options: None,
            cta_label: None,
            created_at,
            expires_at,
        }
    }

    /// Attach poll options (builder pattern).
    #[must_use]
    pub fn with_poll(mut self, options: Vec<String>) -> Self {
        self.poll_options = Some(options);
        self
    }

    /// Attach a call-to-action label (builder pattern).
    #[must_use]
    pub fn with_cta(mut self, label: impl Into<String>) -> Self {
        self.cta_label = Some(label.into());
        self
    }

    /// The group this item belongs to.
    #[must_use]
    pub fn source(&self) -> GroupSource {
        if self.is_global {
            GroupSource::Global
        } else {
            GroupSource::Community(CommunityId::new(self.group_id.clone()))
        }
    }

    /// Whether the item is still visible at `now`.
    #[inline]
    #[must_use]
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.expires_at > now
    }
}

/// Drop every item that has expired at `now`, preserving order.
#[must_use]
pub fn retain_live(items: Vec<ContentItem>, now: Timestamp) -> Vec<ContentItem> {
    items.into_iter().filter(|item| item.is_live(now)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, expires: u64) -> ContentItem {
        ContentItem::community(
            id,
            "c1",
            "Comunidade",
            "body",
            Timestamp(0),
            Timestamp(expires),
        )
    }

    #[test]
    fn source_maps_global_flag() {
        let g = ContentItem::global("g", "Coordenação", "b", Timestamp(1), Timestamp(2));
        assert_eq!(g.source(), GroupSource::Global);
        assert!(g.source().is_global());

        let c = item("a", 10);
        assert_eq!(c.source(), GroupSource::Community(CommunityId::new("c1")));
    }

    #[test]
    fn expiry_is_exclusive() {
        let it = item("a", 100);
        assert!(it.is_live(Timestamp(99)));
        assert!(!it.is_live(Timestamp(100)));
    }

    #[test]
    fn retain_live_preserves_order() {
        let items = vec![item("a", 50), item("b", 200), item("c", 10), item("d", 300)];
        let live: Vec<_> = retain_live(items, Timestamp(100))
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(live, vec!["b", "d"]);
    }

    #[test]
    fn builders_attach_optional_fields() {
        let it = item("a", 10)
            .with_poll(vec!["sim".into(), "não".into()])
            .with_cta("Participar");
        assert_eq!(it.poll_options.as_deref().map(<[String]>::len), Some(2));
        assert_eq!(it.cta_label.as_deref(), Some("Participar"));
    }

    #[test]
    fn source_display() {
        assert_eq!(GroupSource::Global.to_string(), "global");
        assert_eq!(
            GroupSource::Community(CommunityId::new("abc")).to_string(),
            "community:abc"
        );
    }
}
