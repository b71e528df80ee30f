#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct User {
    pub id: UserId,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub avatar_url: Option<String>,

    #[serde(default)]
    pub is_verified: bool,

    /// Free-form role, eg. "moderator" or "author"
    #[serde(default)]
    pub role: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> User {
        User {
            id: UserId(id.into()),
            name: name.into(),
            avatar_url: None,
            is_verified: false,
            role: None,
        }
    }
}
