//! Relation and entity descriptors — the static tables the live system
//! supplies so the engine can resolve relation names without reflection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The closed set of relation shapes the replay engine reconstructs.
///
/// The reconstructor matches exhaustively over this enum, so adding a kind
/// is a compile-enforced decision rather than a silent fall-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    BelongsTo,
    MorphTo,
    HasOne,
    HasMany,
    MorphMany,
    BelongsToMany,
    MorphToMany,
    HasManyThrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

/// One ordering clause declared on a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderClause {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Extra filter declared on a relation.
///
/// `Raw` carries arbitrary SQL the engine cannot evaluate against
/// reconstructed attributes; `Or` marks a disjunctive connector. Both are
/// representable so descriptors can mirror what the live system declares,
/// and both fail the ordering-constrained resolver's preconditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Cmp {
        field: String,
        op: CmpOp,
        value: serde_json::Value,
    },
    In {
        field: String,
        values: Vec<serde_json::Value>,
    },
    NotIn {
        field: String,
        values: Vec<serde_json::Value>,
    },
    Raw {
        sql: String,
    },
    Or(Box<Predicate>),
}

/// How a relation hangs off its parent.
///
/// The live system supplies one of these per declared relation name; the
/// engine never inspects live models beyond this table. Field roles by
/// kind:
/// - `foreign_key` sits on the parent for `BelongsTo`/`MorphTo`, on the
///   related entity for `HasOne`/`HasMany`/`MorphMany`, is the parent-side
///   pivot key for the many-to-many kinds, and the intermediate's key back
///   to the parent for `HasManyThrough`.
/// - `morph_type_field` is the discriminant: on the parent for `MorphTo`,
///   on the related entity for `MorphMany`, inside the pivot payload for
///   `MorphToMany`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    pub kind: RelationKind,
    /// Type tag of the related entity. `None` for `MorphTo`, where the tag
    /// is read off the parent's discriminant field at replay time.
    pub related_type: Option<String>,
    pub foreign_key: String,
    pub morph_type_field: Option<String>,
    /// Pivot table name (many-to-many kinds).
    pub pivot_table: Option<String>,
    /// Pivot key naming the related side (many-to-many kinds).
    pub related_pivot_key: Option<String>,
    /// Intermediate entity type (`HasManyThrough`).
    pub through_type: Option<String>,
    /// Key on the related entity pointing at the intermediate
    /// (`HasManyThrough`).
    pub through_foreign_key: Option<String>,
    /// Ordering clauses declared on the relation. `HasOne` requires
    /// exactly one.
    pub ordering: Vec<OrderClause>,
    /// Extra filter predicates declared on the relation.
    pub predicates: Vec<Predicate>,
}

impl RelationDescriptor {
    fn new(kind: RelationKind, related_type: Option<&str>, foreign_key: &str) -> Self {
        Self {
            kind,
            related_type: related_type.map(str::to_string),
            foreign_key: foreign_key.to_string(),
            morph_type_field: None,
            pivot_table: None,
            related_pivot_key: None,
            through_type: None,
            through_foreign_key: None,
            ordering: Vec::new(),
            predicates: Vec::new(),
        }
    }

    pub fn belongs_to(related_type: &str, foreign_key: &str) -> Self {
        Self::new(RelationKind::BelongsTo, Some(related_type), foreign_key)
    }

    /// `morph_type_field` and `foreign_key` both live on the parent.
    pub fn morph_to(morph_type_field: &str, foreign_key: &str) -> Self {
        let mut descriptor = Self::new(RelationKind::MorphTo, None, foreign_key);
        descriptor.morph_type_field = Some(morph_type_field.to_string());
        descriptor
    }

    pub fn has_one(related_type: &str, foreign_key: &str) -> Self {
        Self::new(RelationKind::HasOne, Some(related_type), foreign_key)
    }

    pub fn has_many(related_type: &str, foreign_key: &str) -> Self {
        Self::new(RelationKind::HasMany, Some(related_type), foreign_key)
    }

    pub fn morph_many(related_type: &str, foreign_key: &str, morph_type_field: &str) -> Self {
        let mut descriptor = Self::new(RelationKind::MorphMany, Some(related_type), foreign_key);
        descriptor.morph_type_field = Some(morph_type_field.to_string());
        descriptor
    }

    pub fn belongs_to_many(
        related_type: &str,
        pivot_table: &str,
        foreign_pivot_key: &str,
        related_pivot_key: &str,
    ) -> Self {
        let mut descriptor =
            Self::new(RelationKind::BelongsToMany, Some(related_type), foreign_pivot_key);
        descriptor.pivot_table = Some(pivot_table.to_string());
        descriptor.related_pivot_key = Some(related_pivot_key.to_string());
        descriptor
    }

    pub fn morph_to_many(
        related_type: &str,
        pivot_table: &str,
        foreign_pivot_key: &str,
        related_pivot_key: &str,
        morph_type_field: &str,
    ) -> Self {
        let mut descriptor = Self::belongs_to_many(
            related_type,
            pivot_table,
            foreign_pivot_key,
            related_pivot_key,
        );
        descriptor.kind = RelationKind::MorphToMany;
        descriptor.morph_type_field = Some(morph_type_field.to_string());
        descriptor
    }

    pub fn has_many_through(
        related_type: &str,
        through_type: &str,
        first_key: &str,
        second_key: &str,
    ) -> Self {
        let mut descriptor =
            Self::new(RelationKind::HasManyThrough, Some(related_type), first_key);
        descriptor.through_type = Some(through_type.to_string());
        descriptor.through_foreign_key = Some(second_key.to_string());
        descriptor
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.ordering.push(OrderClause {
            field: field.to_string(),
            direction,
        });
        self
    }

    /// Shorthand for descending order on a field — "latest by".
    pub fn latest(self, field: &str) -> Self {
        self.order_by(field, Direction::Desc)
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }
}

/// Static description of one live entity type: key field, soft-delete
/// marker, and the relations reconstructable by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub type_tag: String,
    pub key_field: String,
    /// Soft-delete marker column. `None` means deletes are terminal.
    pub deleted_at_field: Option<String>,
    pub relations: BTreeMap<String, RelationDescriptor>,
}

impl EntityDescriptor {
    pub fn new(type_tag: &str) -> Self {
        Self {
            type_tag: type_tag.to_string(),
            key_field: "id".to_string(),
            deleted_at_field: None,
            relations: BTreeMap::new(),
        }
    }

    pub fn with_key(mut self, key_field: &str) -> Self {
        self.key_field = key_field.to_string();
        self
    }

    /// Mark the type soft-deletable with the conventional marker column.
    pub fn soft_deletes(self) -> Self {
        self.with_deleted_at("deleted_at")
    }

    pub fn with_deleted_at(mut self, field: &str) -> Self {
        self.deleted_at_field = Some(field.to_string());
        self
    }

    pub fn with_relation(mut self, name: &str, descriptor: RelationDescriptor) -> Self {
        self.relations.insert(name.to_string(), descriptor);
        self
    }
}
