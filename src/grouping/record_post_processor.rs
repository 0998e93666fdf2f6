use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::{grouping::GroupMeta, storage::Record};

/// Key under which a record store attaches group membership to each row.
pub const GROUP_METADATA_KEY: &str = "__group_metadata";
/// Key inside the annotation identifying the row's group.
pub const GROUP_ID_KEY: &str = "group_id";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupAnnotationError {
    #[error("record {index} has no '__group_metadata' annotation")]
    MissingAnnotation { index: usize },
    #[error("record {index} has a group annotation that is not an object")]
    NotAnObject { index: usize },
    #[error("record {index} group annotation has no 'group_id'")]
    MissingGroupId { index: usize },
}

/// Splits grouped records into plain rows and the list of groups they form.
pub trait RecordPostProcessor {
    fn split(&self, records: Vec<Record>) -> Result<(Vec<Record>, Vec<GroupMeta>), GroupAnnotationError>;
}

/// Reads the [`GROUP_METADATA_KEY`] object off every record.
///
/// Rows sharing a `group_id` collapse into one [`GroupMeta`] listing their
/// page positions. Groups come out in order of their first row; the
/// `group_id` itself is dropped from the group attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupMetadataSplitter;

impl RecordPostProcessor for GroupMetadataSplitter {
    fn split(&self, records: Vec<Record>) -> Result<(Vec<Record>, Vec<GroupMeta>), GroupAnnotationError> {
        let mut plain = Vec::with_capacity(records.len());
        // serde_json::Value is not Hash; key groups by the id's JSON text
        let mut groups: IndexMap<String, GroupMeta> = IndexMap::new();

        for (index, mut record) in records.into_iter().enumerate() {
            let annotation = record
                .shift_remove(GROUP_METADATA_KEY)
                .ok_or(GroupAnnotationError::MissingAnnotation { index })?;
            let Value::Object(mut annotation) = annotation else {
                return Err(GroupAnnotationError::NotAnObject { index });
            };
            let group_id = annotation
                .shift_remove(GROUP_ID_KEY)
                .ok_or(GroupAnnotationError::MissingGroupId { index })?;

            groups
                .entry(group_id.to_string())
                .or_insert_with(|| GroupMeta::new(annotation))
                .result_indices
                .push(index);
            plain.push(record);
        }

        Ok((plain, groups.into_values().collect()))
    }
}
