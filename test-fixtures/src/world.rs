//! A blog-shaped entity world mirroring a typical live system.

use std::collections::BTreeMap;

use hindsight_core::errors::HindsightResult;
use hindsight_core::models::{Diff, EntityDescriptor, EntityId, RelationDescriptor};
use hindsight_core::traits::ILiveWorld;

use crate::events;

/// Descriptor tables plus a mutable current-membership snapshot standing
/// in for the live database.
#[derive(Debug, Default)]
pub struct BlogWorld {
    entities: BTreeMap<String, EntityDescriptor>,
    live: BTreeMap<String, Vec<(EntityId, Diff)>>,
}

impl BlogWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entity descriptor.
    pub fn add_entity(&mut self, descriptor: EntityDescriptor) {
        self.entities.insert(descriptor.type_tag.clone(), descriptor);
    }

    /// Upsert a live row — what the live system holds right now, as
    /// opposed to what the log says it held in the past.
    pub fn set_live_row(
        &mut self,
        entity_type: &str,
        id: impl Into<EntityId>,
        attributes: serde_json::Value,
    ) {
        let id = id.into();
        let rows = self.live.entry(entity_type.to_string()).or_default();
        let attributes = events::diff(attributes);
        match rows.iter_mut().find(|(row_id, _)| *row_id == id) {
            Some(row) => row.1 = attributes,
            None => rows.push((id, attributes)),
        }
    }

    pub fn remove_live_row(&mut self, entity_type: &str, id: impl Into<EntityId>) {
        let id = id.into();
        if let Some(rows) = self.live.get_mut(entity_type) {
            rows.retain(|(row_id, _)| *row_id != id);
        }
    }
}

impl ILiveWorld for BlogWorld {
    fn entity(&self, type_tag: &str) -> Option<&EntityDescriptor> {
        self.entities.get(type_tag)
    }

    fn current_related_ids(
        &self,
        entity_type: &str,
        foreign_key: &str,
        parents: &[EntityId],
    ) -> HindsightResult<Vec<EntityId>> {
        let Some(rows) = self.live.get(entity_type) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .iter()
            .filter(|(_, attributes)| {
                attributes
                    .get(foreign_key)
                    .and_then(EntityId::from_value)
                    .map(|fk| parents.contains(&fk))
                    .unwrap_or(false)
            })
            .map(|(id, _)| id.clone())
            .collect())
    }
}

/// The entity world used across integration tests: users with posts,
/// posts with categories/comments/tags/versions, polymorphic comments.
pub fn blog_world() -> BlogWorld {
    let mut world = BlogWorld::new();

    world.add_entity(
        EntityDescriptor::new("user")
            .soft_deletes()
            .with_relation("posts", RelationDescriptor::has_many("post", "user_id"))
            .with_relation(
                "last_post",
                RelationDescriptor::has_one("post", "user_id").latest("id"),
            )
            .with_relation(
                "post_versions",
                RelationDescriptor::has_many_through("version", "post", "user_id", "post_id"),
            ),
    );

    world.add_entity(
        EntityDescriptor::new("post")
            .soft_deletes()
            .with_relation("user", RelationDescriptor::belongs_to("user", "user_id"))
            .with_relation(
                "categories",
                RelationDescriptor::belongs_to_many(
                    "category",
                    "category_post",
                    "post_id",
                    "category_id",
                ),
            )
            .with_relation(
                "comments",
                RelationDescriptor::morph_many("comment", "model_id", "model_type"),
            )
            .with_relation(
                "tags",
                RelationDescriptor::morph_to_many(
                    "tag",
                    "taggables",
                    "taggable_id",
                    "tag_id",
                    "taggable_type",
                ),
            )
            .with_relation("versions", RelationDescriptor::has_many("version", "post_id")),
    );

    world.add_entity(
        EntityDescriptor::new("comment")
            .with_relation("model", RelationDescriptor::morph_to("model_type", "model_id")),
    );

    world.add_entity(
        EntityDescriptor::new("category")
            .with_relation(
                "posts",
                RelationDescriptor::belongs_to_many(
                    "post",
                    "category_post",
                    "category_id",
                    "post_id",
                ),
            )
            .with_relation(
                "comments",
                RelationDescriptor::morph_many("comment", "model_id", "model_type"),
            ),
    );

    world.add_entity(EntityDescriptor::new("tag"));

    world.add_entity(
        EntityDescriptor::new("version")
            .with_relation("post", RelationDescriptor::belongs_to("post", "post_id")),
    );

    world
}
