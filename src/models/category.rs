use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

impl CategoryId {
    /// The fixed root of the taxonomy
    pub const ROOT: CategoryId = CategoryId(1);

    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CategoryId {
    fn from(value: i64) -> Self {
        CategoryId(value)
    }
}

/// Foreground/background colours used when a category is rendered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayColors {
    pub foreground: Option<String>,
    pub background: Option<String>,
}

/// Ownership and capability levels; stored but never interpreted by the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    pub owner_id: i64,
    pub group_id: i64,
    pub perm_owner: u8,
    pub perm_group: u8,
    pub perm_members: u8,
    pub perm_anon: u8,
}

impl Default for AccessControl {
    // Owner read-write, everyone else read-only
    fn default() -> Self {
        Self::new(0, 0, [3, 2, 2, 2])
    }
}

impl AccessControl {
    pub fn new(owner_id: i64, group_id: i64, perms: [u8; 4]) -> Self {
        let [perm_owner, perm_group, perm_members, perm_anon] = perms;
        Self {
            owner_id,
            group_id,
            perm_owner,
            perm_group,
            perm_members,
            perm_anon,
        }
    }

    pub fn perms(&self) -> [u8; 4] {
        [self.perm_owner, self.perm_group, self.perm_members, self.perm_anon]
    }
}

/// A node of the category taxonomy.
///
/// `left` and `right` are the nested-set bounds. They are assigned by the
/// tree mutator and ignored by attribute saves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    /// `None` only for the root
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub description: String,
    pub keywords: String,
    pub image: Option<String>,
    pub colors: DisplayColors,
    pub left: i64,
    pub right: i64,
    pub access: AccessControl,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.id.is_root()
    }

    pub fn is_leaf(&self) -> bool {
        self.right == self.left + 1
    }

    /// Number of descendants encoded by the interval
    pub fn descendant_count(&self) -> i64 {
        (self.right - self.left - 1) / 2
    }

    /// Whether `other` lies strictly inside this node's interval
    pub fn contains(&self, other: &Category) -> bool {
        self.left < other.left && other.right < self.right
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Input for inserting a category under an existing parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub parent_id: CategoryId,
    pub name: String,
    pub description: String,
    pub keywords: String,
    pub image: Option<String>,
    pub colors: DisplayColors,
    pub access: AccessControl,
}

impl NewCategory {
    pub fn new(parent_id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            parent_id,
            name: name.into(),
            description: String::new(),
            keywords: String::new(),
            image: None,
            colors: DisplayColors::default(),
            access: AccessControl::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_colors(mut self, colors: DisplayColors) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_access(mut self, access: AccessControl) -> Self {
        self.access = access;
        self
    }

    /// Materialises the row for the interval `[left, left + 1]`
    pub(crate) fn into_category(self, id: CategoryId, left: i64) -> Category {
        let now = Utc::now();
        Category {
            id,
            parent_id: Some(self.parent_id),
            name: self.name,
            description: self.description,
            keywords: self.keywords,
            image: self.image,
            colors: self.colors,
            left,
            right: left + 1,
            access: self.access,
            created_at: now,
            updated_at: now,
        }
    }
}
