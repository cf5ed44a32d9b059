//! Source ranking used to settle conflicting writes.

use std::collections::HashMap;

use ssot_model::Header;

/// Rank of each source by name; lower rank wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePriority {
    ranks: HashMap<String, usize>,
}

impl SourcePriority {
    /// Ranks taken from list position: the first name has rank 0.
    #[must_use]
    pub fn from_order<S: AsRef<str>>(order: &[S]) -> Self {
        let ranks = order
            .iter()
            .enumerate()
            .map(|(rank, name)| (name.as_ref().to_string(), rank))
            .collect();
        Self { ranks }
    }

    #[must_use]
    pub fn rank(&self, source: &str) -> Option<usize> {
        self.ranks.get(source).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Whether an observation with header `new` may overwrite values held by
    /// `existing`.
    ///
    /// A non-ARP observation always beats an ARP-derived one. Otherwise the
    /// new observation loses only when both sides are ranked and the new
    /// source ranks strictly worse.
    #[must_use]
    pub fn has_priority(&self, new: &Header, existing: &Header) -> bool {
        let (new_arp, existing_arp) = (new.is_arp_entry(), existing.is_arp_entry());
        if new_arp != existing_arp {
            return !new_arp;
        }
        let new_rank = new.source_name().and_then(|s| self.rank(s));
        let existing_rank = existing.source_name().and_then(|s| self.rank(s));
        match (new_rank, existing_rank) {
            (Some(new_rank), Some(existing_rank)) => new_rank <= existing_rank,
            _ => true,
        }
    }
}
