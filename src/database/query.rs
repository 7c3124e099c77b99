// Owner-scoped query values. Each one is built per request from the
// authenticated user and the parsed filter parameters, then executed by a
// Repository.

use mongodb::bson::{doc, Document};

use crate::models::AttrKind;
#[cfg(test)]
use crate::models::{Recipe, RecipeAttr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortOrder::Ascending),
            "desc" | "descending" => Some(SortOrder::Descending),
            _ => None,
        }
    }

    pub fn direction(self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

/// Recipes of one user, optionally restricted to any of the given tag / ingredient ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeQuery {
    pub user_id: i64,
    pub tag_ids: Option<Vec<i64>>,
    pub ingredient_ids: Option<Vec<i64>>,
}

impl RecipeQuery {
    pub fn filter_document(&self) -> Document {
        let mut filter = doc! { "user_id": self.user_id };
        if let Some(ids) = &self.tag_ids {
            filter.insert("tag_ids", doc! { "$in": ids.clone() });
        }
        if let Some(ids) = &self.ingredient_ids {
            filter.insert("ingredient_ids", doc! { "$in": ids.clone() });
        }
        filter
    }

    /// Newest first
    pub fn sort_document(&self) -> Document {
        doc! { "_id": -1 }
    }

    /// In-memory counterpart of `filter_document`
    #[cfg(test)]
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let any_of = |wanted: &Option<Vec<i64>>, present: &[i64]| match wanted {
            Some(ids) => ids.iter().any(|id| present.contains(id)),
            None => true,
        };

        recipe.user_id == self.user_id
            && any_of(&self.tag_ids, &recipe.tag_ids)
            && any_of(&self.ingredient_ids, &recipe.ingredient_ids)
    }
}

/// Tags or ingredients of one user, optionally only those used by a recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrQuery {
    pub kind: AttrKind,
    pub user_id: i64,
    pub assigned_only: bool,
    pub order: SortOrder,
}

impl AttrQuery {
    /// `assigned_ids` is only consulted when `assigned_only` is set
    pub fn filter_document(&self, assigned_ids: &[i64]) -> Document {
        let mut filter = doc! { "user_id": self.user_id };
        if self.assigned_only {
            filter.insert("_id", doc! { "$in": assigned_ids.to_vec() });
        }
        filter
    }

    pub fn sort_document(&self) -> Document {
        doc! { "name": self.order.direction(), "_id": 1 }
    }

    /// Filter for the recipes whose references make an attr "assigned"
    pub fn assigned_source_filter(&self) -> Document {
        doc! { "user_id": self.user_id }
    }

    #[cfg(test)]
    pub fn matches(&self, attr: &RecipeAttr, assigned_ids: &[i64]) -> bool {
        attr.user_id == self.user_id && (!self.assigned_only || assigned_ids.contains(&attr.id))
    }

    #[cfg(test)]
    pub fn sort(&self, attrs: &mut [RecipeAttr]) {
        attrs.sort_by(|a, b| {
            let by_name = match self.order {
                SortOrder::Ascending => a.name.cmp(&b.name),
                SortOrder::Descending => b.name.cmp(&a.name),
            };
            by_name.then(a.id.cmp(&b.id))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(id: i64, user_id: i64, tag_ids: Vec<i64>, ingredient_ids: Vec<i64>) -> Recipe {
        Recipe {
            id,
            user_id,
            title: format!("Recipe {}", id),
            time_minutes: 10,
            price: 1.0,
            link: String::new(),
            description: String::new(),
            tag_ids,
            ingredient_ids,
            created_at: 0,
        }
    }

    #[test]
    fn test_recipe_filter_document_is_owner_scoped() {
        let query = RecipeQuery {
            user_id: 4,
            tag_ids: Some(vec![1, 2]),
            ingredient_ids: None,
        };
        let filter = query.filter_document();

        assert_eq!(filter.get_i64("user_id").unwrap(), 4);
        assert_eq!(
            filter.get_document("tag_ids").unwrap(),
            &doc! { "$in": [1_i64, 2_i64] }
        );
        assert!(!filter.contains_key("ingredient_ids"));
    }

    #[test]
    fn test_recipe_query_matches_any_tag_and_all_filters() {
        let query = RecipeQuery {
            user_id: 1,
            tag_ids: Some(vec![1, 2]),
            ingredient_ids: Some(vec![5]),
        };

        assert!(query.matches(&recipe(1, 1, vec![2], vec![5, 6])));
        assert!(query.matches(&recipe(2, 1, vec![1, 2], vec![5])));
        assert!(!query.matches(&recipe(3, 1, vec![2], vec![6])));
        assert!(!query.matches(&recipe(4, 1, vec![3], vec![5])));
        assert!(!query.matches(&recipe(5, 2, vec![1], vec![5])));
    }

    #[test]
    fn test_attr_query_assigned_only() {
        let query = AttrQuery {
            kind: AttrKind::Tag,
            user_id: 1,
            assigned_only: true,
            order: SortOrder::Descending,
        };
        let used = RecipeAttr { id: 1, user_id: 1, name: "Vegan".into() };
        let unused = RecipeAttr { id: 2, user_id: 1, name: "Dessert".into() };

        assert!(query.matches(&used, &[1]));
        assert!(!query.matches(&unused, &[1]));
        assert!(query.filter_document(&[1]).contains_key("_id"));

        let everything = AttrQuery { assigned_only: false, ..query };
        assert!(everything.matches(&unused, &[1]));
        assert!(!everything.filter_document(&[1]).contains_key("_id"));
    }

    #[test]
    fn test_attr_sort_direction() {
        let mut attrs = vec![
            RecipeAttr { id: 1, user_id: 1, name: "Banana".into() },
            RecipeAttr { id: 2, user_id: 1, name: "Apple".into() },
            RecipeAttr { id: 3, user_id: 1, name: "Cherry".into() },
        ];
        let mut query = AttrQuery {
            kind: AttrKind::Ingredient,
            user_id: 1,
            assigned_only: false,
            order: SortOrder::Descending,
        };

        query.sort(&mut attrs);
        let names: Vec<&str> = attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Cherry", "Banana", "Apple"]);

        query.order = SortOrder::Ascending;
        query.sort(&mut attrs);
        assert_eq!(attrs[0].name, "Apple");
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse("ASC"), Some(SortOrder::Ascending));
        assert_eq!(SortOrder::parse(" desc "), Some(SortOrder::Descending));
        assert_eq!(SortOrder::parse("sideways"), None);
    }
}
