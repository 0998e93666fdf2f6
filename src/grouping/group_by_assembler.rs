use crate::{
    columns::{ColumnNotFoundError, ColumnRef, ResolvedColumns},
    grouping::{GroupMeta, GroupResult, GroupingDescriptor, GroupingSpec},
};

pub struct GroupByAssembler;

impl GroupByAssembler {
    /// Name-keyed descriptor for the record store.
    ///
    /// Repeated columns are kept once, in the order first given.
    pub fn descriptor(spec: &GroupingSpec<ColumnRef>, resolved: &ResolvedColumns) -> Result<GroupingDescriptor, ColumnNotFoundError> {
        let mut columns: Vec<String> = Vec::with_capacity(spec.columns.len());
        for id in &spec.columns {
            let name = resolved.name_of(*id)?;
            if !columns.iter().any(|known| known == name) {
                columns.push(name.to_string());
            }
        }

        Ok(GroupingSpec {
            columns,
            mode: spec.mode.clone(),
            ranged: spec.ranged,
        })
    }

    /// Summary returned to the client once the store has answered.
    pub fn assemble(descriptor: GroupingDescriptor, groups: Option<Vec<GroupMeta>>) -> GroupResult {
        GroupResult {
            num_groups: groups.as_ref().map_or(0, Vec::len),
            columns: descriptor.columns,
            mode: descriptor.mode,
            ranged: descriptor.ranged,
            groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};

    use crate::columns::ColumnMeta;

    use super::*;

    fn resolved() -> ResolvedColumns {
        ResolvedColumns::from_columns([ColumnMeta::new(3, "first_name"), ColumnMeta::new(4, "last_name")])
    }

    #[test]
    fn test_descriptor_resolves_names_and_keeps_flags() {
        let spec = GroupingSpec::new(vec![ColumnRef(4), ColumnRef(3), ColumnRef(4)], "prefix", true);

        let descriptor = GroupByAssembler::descriptor(&spec, &resolved()).unwrap();

        assert_eq!(descriptor.columns, vec!["last_name", "first_name"]);
        assert_eq!(descriptor.mode, "prefix");
        assert!(descriptor.ranged);
    }

    #[test]
    fn test_descriptor_unknown_column() {
        let spec = GroupingSpec::distinct(vec![ColumnRef(3), ColumnRef(5)]);

        assert_eq!(
            GroupByAssembler::descriptor(&spec, &resolved()),
            Err(ColumnNotFoundError::new(ColumnRef(5)))
        );
    }

    #[test]
    fn test_assemble_counts_groups() {
        let descriptor = GroupingSpec::distinct(vec!["city".to_string()]);
        let groups = vec![
            GroupMeta { attributes: Map::new(), result_indices: vec![0, 1] },
            GroupMeta { attributes: Map::new(), result_indices: vec![2] },
        ];

        let result = GroupByAssembler::assemble(descriptor, Some(groups));

        assert_eq!(serde_json::to_value(&result).unwrap(), json!({
            "columns": ["city"],
            "mode": "distinct",
            "num_groups": 2,
            "ranged": false,
            "groups": [{"result_indices": [0, 1]}, {"result_indices": [2]}]
        }));
    }

    #[test]
    fn test_assemble_without_groups() {
        let result = GroupByAssembler::assemble(GroupingSpec::distinct(vec!["city".to_string()]), None);

        assert_eq!(result.num_groups, 0);
        assert!(result.groups.is_none());
    }
}
