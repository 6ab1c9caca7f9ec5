// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::FactId;

/// A fact row as the remote table stores it. Vote columns keep the table's
/// camelCase names on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub id: FactId,
    pub text: String,
    pub source: String,
    pub category: String,
    #[serde(rename = "votesInteresting")]
    pub votes_interesting: i64,
    #[serde(rename = "votesMindblowing")]
    pub votes_mindblowing: i64,
    #[serde(rename = "votesFalse")]
    pub votes_false: i64,
}

impl Fact {
    /// Disputed iff false-votes outweigh interesting + mindblowing combined.
    pub fn is_disputed(&self) -> bool {
        self.votes_interesting + self.votes_mindblowing < self.votes_false
    }

    pub fn vote_count(&self, kind: VoteKind) -> i64 {
        match kind {
            VoteKind::Interesting => self.votes_interesting,
            VoteKind::Mindblowing => self.votes_mindblowing,
            VoteKind::False => self.votes_false,
        }
    }
}

/// The three vote counters, as an enumerated tag rather than a free-form
/// column-name string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteKind {
    Interesting,
    Mindblowing,
    False,
}

impl VoteKind {
    pub const ALL: [Self; 3] = [Self::Interesting, Self::Mindblowing, Self::False];

    /// The remote table column backing this counter.
    pub const fn column(self) -> &'static str {
        match self {
            Self::Interesting => "votesInteresting",
            Self::Mindblowing => "votesMindblowing",
            Self::False => "votesFalse",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "votesInteresting" => Some(Self::Interesting),
            "votesMindblowing" => Some(Self::Mindblowing),
            "votesFalse" => Some(Self::False),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Interesting => "interesting",
            Self::Mindblowing => "mindblowing",
            Self::False => "false",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub color: &'static str,
}

/// Fixed at build time; never mutated at runtime.
pub const CATEGORIES: [Category; 8] = [
    Category {
        name: "technology",
        color: "#3b82f6",
    },
    Category {
        name: "science",
        color: "#16a34a",
    },
    Category {
        name: "finance",
        color: "#ef4444",
    },
    Category {
        name: "society",
        color: "#eab308",
    },
    Category {
        name: "entertainment",
        color: "#db2777",
    },
    Category {
        name: "health",
        color: "#14b8a6",
    },
    Category {
        name: "history",
        color: "#f97316",
    },
    Category {
        name: "news",
        color: "#8b5cf6",
    },
];

pub fn find_category(name: &str) -> Option<Category> {
    CATEGORIES.into_iter().find(|category| category.name == name)
}

pub fn category_color(name: &str) -> Option<&'static str> {
    find_category(name).map(|category| category.color)
}
