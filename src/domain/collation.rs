//! Locale-aware text ordering for sorting display text

use std::cmp::Ordering;

use feruca::Collator;

use crate::domain::entities::SortOrder;

/// Unicode Collation Algorithm comparison of display strings.
pub struct TextCollator {
    collator: Collator,
}

impl Default for TextCollator {
    fn default() -> Self {
        Self::new()
    }
}

impl TextCollator {
    pub fn new() -> Self {
        Self {
            collator: Collator::default(),
        }
    }

    pub fn compare(&mut self, a: &str, b: &str) -> Ordering {
        self.collator.collate(a, b)
    }

    pub fn compare_ordered(&mut self, a: &str, b: &str, order: SortOrder) -> Ordering {
        match order {
            SortOrder::Ascending => self.compare(a, b),
            SortOrder::Descending => self.compare(b, a),
        }
    }
}
