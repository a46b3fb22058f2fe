//! Fixed category set.
//!
//! # Invariants
//! - The set and its order never change during the process lifetime.
//! - Stored entries may carry any string; only aggregation folds unknown
//!   values into `Other`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One of the nine journal categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Work,
    Family,
    Health,
    Environment,
    Learning,
    Money,
    Hobby,
    #[serde(rename = "Mind-Mental")]
    MindMental,
    Other,
}

impl Category {
    /// Size of the fixed set.
    pub const COUNT: usize = 9;

    /// All categories in canonical order.
    pub const ALL: [Category; Self::COUNT] = [
        Category::Work,
        Category::Family,
        Category::Health,
        Category::Environment,
        Category::Learning,
        Category::Money,
        Category::Hobby,
        Category::MindMental,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Family => "Family",
            Self::Health => "Health",
            Self::Environment => "Environment",
            Self::Learning => "Learning",
            Self::Money => "Money",
            Self::Hobby => "Hobby",
            Self::MindMental => "Mind-Mental",
            Self::Other => "Other",
        }
    }

    /// Exact-match lookup by display name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
    }

    /// Category used when counting a stored value.
    pub fn for_aggregation(value: &str) -> Self {
        Self::parse(value).unwrap_or(Self::Other)
    }

    /// Position in `ALL`.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Category;

    #[test]
    fn parse_roundtrips_every_name() {
        for (idx, category) in Category::ALL.into_iter().enumerate() {
            assert_eq!(Category::parse(category.as_str()), Some(category));
            assert_eq!(category.index(), idx);
        }
    }

    #[test]
    fn unknown_values_fold_into_other() {
        assert_eq!(Category::parse("work"), None);
        assert_eq!(Category::for_aggregation("Gardening"), Category::Other);
        assert_eq!(Category::for_aggregation(""), Category::Other);
    }

    #[test]
    fn serializes_with_display_name() {
        let json = serde_json::to_value(Category::MindMental).unwrap();
        assert_eq!(json, "Mind-Mental");
    }
}
