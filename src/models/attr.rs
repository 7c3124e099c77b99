use serde::{Deserialize, Serialize};
use std::fmt;

/// The two name-only entities that hang off a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKind {
    Tag,
    Ingredient,
}

impl AttrKind {
    pub fn collection(self) -> &'static str {
        match self {
            AttrKind::Tag => "tags",
            AttrKind::Ingredient => "ingredients",
        }
    }

    /// Recipe field holding the ids of this kind
    pub fn recipe_field(self) -> &'static str {
        match self {
            AttrKind::Tag => "tag_ids",
            AttrKind::Ingredient => "ingredient_ids",
        }
    }
}

impl fmt::Display for AttrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrKind::Tag => write!(f, "tag"),
            AttrKind::Ingredient => write!(f, "ingredient"),
        }
    }
}

/// Tag or ingredient document
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RecipeAttr {
    #[serde(rename = "_id")]
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AttrRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct AttrResponse {
    pub id: i64,
    pub name: String,
}

impl From<RecipeAttr> for AttrResponse {
    fn from(attr: RecipeAttr) -> Self {
        AttrResponse {
            id: attr.id,
            name: attr.name,
        }
    }
}

impl From<&RecipeAttr> for AttrResponse {
    fn from(attr: &RecipeAttr) -> Self {
        AttrResponse {
            id: attr.id,
            name: attr.name.clone(),
        }
    }
}
