//! Repository layer: entity-scoped database operations.
//!
//! The register has a single entity, the visit record; its functions live
//! in `visit_record` and are re-exported here.

mod visit_record;

pub(crate) use visit_record::DateBounds;
pub use visit_record::{
    count_visit_records, for_each_visit_record, get_visit_record, insert_visit_record,
    insert_visit_record_at, list_visit_records, list_visit_records_in_range, update_follow_up,
};
