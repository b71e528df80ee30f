#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct ReactionId(pub String);

impl ReactionId {
    pub fn new(id: impl Into<String>) -> ReactionId {
        ReactionId(id.into())
    }
}

impl std::fmt::Display for ReactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One reaction counter on a comment
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Reaction {
    pub id: ReactionId,
    pub label: String,
    pub emoji: String,
    pub count: u32,

    /// Whether the local viewer reacted this way
    #[serde(default)]
    pub is_active: bool,
}

impl Reaction {
    pub fn new(id: impl Into<String>, label: impl Into<String>, emoji: impl Into<String>) -> Reaction {
        Reaction {
            id: ReactionId(id.into()),
            label: label.into(),
            emoji: emoji.into(),
            count: 0,
            is_active: false,
        }
    }

    pub fn with_count(mut self, count: u32, is_active: bool) -> Reaction {
        self.count = count;
        self.is_active = is_active;
        self
    }

    /// Flips `is_active`, keeping `count` in sync (and never below zero)
    pub fn toggle(&mut self) {
        match self.is_active {
            true => {
                self.is_active = false;
                self.count = self.count.saturating_sub(1);
            }
            false => {
                self.is_active = true;
                self.count = self.count.saturating_add(1);
            }
        }
    }
}
