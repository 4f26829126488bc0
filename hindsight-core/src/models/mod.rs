mod change_event;
mod entity_id;
mod reconstructed;
mod relation;
mod time;
mod upper_bound;

pub use change_event::{ActionKind, ChangeEvent, Diff, PIVOT_ACTIONS, PIVOT_KEY_PREFIX, PIVOT_TABLE_KEY};
pub use entity_id::EntityId;
pub use reconstructed::{ReconstructedEntity, RelationResult};
pub use relation::{
    CmpOp, Direction, EntityDescriptor, OrderClause, Predicate, RelationDescriptor, RelationKind,
};
pub use time::{format_log_timestamp, parse_log_timestamp};
pub use upper_bound::UpperBound;
