use std::{cmp::Ordering, collections::{HashMap, HashSet}};

use ordered_float::OrderedFloat;
use regex::{Regex, RegexBuilder};
use serde_json::{Number, Value};

use crate::{
    database::{JsonPrimitive, SchemaDict},
    filters::{FilterFolder, LogicalOp, NamedFilter},
    storage::{Record, StorageError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
    IsNull,
    IsNotNull,
}

impl CompareOp {
    fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "eq" | "=" | "==" => CompareOp::Eq,
            "ne" | "!=" => CompareOp::Ne,
            "gt" | ">" => CompareOp::Gt,
            "ge" | ">=" => CompareOp::Ge,
            "lt" | "<" => CompareOp::Lt,
            "le" | "<=" => CompareOp::Le,
            "in" => CompareOp::In,
            "not_in" => CompareOp::NotIn,
            "contains" => CompareOp::Contains,
            "starts_with" => CompareOp::StartsWith,
            "ends_with" => CompareOp::EndsWith,
            "is_null" => CompareOp::IsNull,
            "is_not_null" => CompareOp::IsNotNull,
            _ => return None,
        })
    }
}

/// A filter checked against a table and ready to run row by row.
#[derive(Debug)]
pub(crate) enum CompiledFilter {
    All(Vec<CompiledFilter>),
    Any(Vec<CompiledFilter>),
    Not(Box<CompiledFilter>),
    Compare { column: String, op: CompareOp, value: Value },
    Pattern { column: String, regex: Regex },
    Duplicated { columns: Vec<String>, keys: HashSet<String> },
}

pub struct RecordEval;

impl RecordEval {
    /// Validate `filter` against the table and precompute what the row scan
    /// needs (LIKE patterns, duplicated key sets).
    pub(crate) fn compile<'a, I>(filter: &NamedFilter, schema: &'a SchemaDict, rows: I) -> Result<CompiledFilter, StorageError>
    where
        I: IntoIterator<Item = &'a Record>,
        I::IntoIter: Clone,
    {
        filter.fold(&mut FilterCompiler { schema, rows: rows.into_iter() })
    }

    pub(crate) fn matches(filter: &CompiledFilter, row: &Record) -> bool {
        match filter {
            CompiledFilter::All(all) => all.iter().all(|f| Self::matches(f, row)),
            CompiledFilter::Any(any) => any.iter().any(|f| Self::matches(f, row)),
            CompiledFilter::Not(inner) => !Self::matches(inner, row),
            CompiledFilter::Compare { column, op, value } => Self::compare(Self::cell(row, column), *op, value),
            CompiledFilter::Pattern { column, regex } => match Self::cell(row, column) {
                Value::String(text) => regex.is_match(text),
                _ => false,
            },
            CompiledFilter::Duplicated { columns, keys } => keys.contains(&Self::group_key(row, columns)),
        }
    }

    pub fn cell<'a>(row: &'a Record, column: &str) -> &'a Value {
        row.get(column).unwrap_or(&Value::Null)
    }

    /// Stable text key of the values `row` holds in `columns`.
    pub fn group_key(row: &Record, columns: &[String]) -> String {
        Value::Array(columns.iter().map(|c| Self::cell(row, c).clone()).collect()).to_string()
    }

    /// Total order used for sorting: values of one kind compare naturally,
    /// different kinds by [`JsonPrimitive::sort_rank`], so NULL is greatest.
    pub fn compare_values(a: &Value, b: &Value) -> Ordering {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => Self::compare_numbers(x, y),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => {
                let (ra, rb) = (JsonPrimitive::of_value(a).sort_rank(), JsonPrimitive::of_value(b).sort_rank());
                ra.cmp(&rb).then_with(|| a.to_string().cmp(&b.to_string()))
            }
        }
    }

    /// Integers compare exactly; only when a float is involved do both sides
    /// go through `f64`.
    fn compare_numbers(x: &Number, y: &Number) -> Ordering {
        let integer = |n: &Number| n.as_i64().map(i128::from).or_else(|| n.as_u64().map(i128::from));
        match (integer(x), integer(y)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => OrderedFloat(x.as_f64().unwrap_or(f64::NAN)).cmp(&OrderedFloat(y.as_f64().unwrap_or(f64::NAN))),
        }
    }

    /// Comparison for filtering: NULL and mismatched kinds never compare.
    fn partial_compare(a: &Value, b: &Value) -> Option<Ordering> {
        let (ka, kb) = (JsonPrimitive::of_value(a), JsonPrimitive::of_value(b));
        if ka == JsonPrimitive::Null || kb == JsonPrimitive::Null || ka.sort_rank() != kb.sort_rank() {
            return None;
        }
        Some(Self::compare_values(a, b))
    }

    fn compare(cell: &Value, op: CompareOp, value: &Value) -> bool {
        let ordering = || Self::partial_compare(cell, value);
        match op {
            CompareOp::IsNull => cell.is_null(),
            CompareOp::IsNotNull => !cell.is_null(),
            CompareOp::Eq => ordering() == Some(Ordering::Equal),
            CompareOp::Ne => matches!(ordering(), Some(Ordering::Less | Ordering::Greater)),
            CompareOp::Gt => ordering() == Some(Ordering::Greater),
            CompareOp::Ge => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
            CompareOp::Lt => ordering() == Some(Ordering::Less),
            CompareOp::Le => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
            CompareOp::In => Self::in_list(cell, value),
            CompareOp::NotIn => !cell.is_null() && !Self::in_list(cell, value),
            CompareOp::Contains | CompareOp::StartsWith | CompareOp::EndsWith => {
                let (Value::String(text), Value::String(needle)) = (cell, value) else {
                    return false;
                };
                match op {
                    CompareOp::Contains => text.contains(needle.as_str()),
                    CompareOp::StartsWith => text.starts_with(needle.as_str()),
                    _ => text.ends_with(needle.as_str()),
                }
            }
        }
    }

    fn in_list(cell: &Value, list: &Value) -> bool {
        list.as_array()
            .is_some_and(|items| items.iter().any(|item| Self::partial_compare(cell, item) == Some(Ordering::Equal)))
    }

    fn like_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, regex::Error> {
        let mut source = String::from("^");
        for ch in pattern.chars() {
            match ch {
                '%' => source.push_str(".*"),
                '_' => source.push('.'),
                c => source.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
        }
        source.push('$');
        RegexBuilder::new(&source).case_insensitive(case_insensitive).dot_matches_new_line(true).build()
    }
}

struct FilterCompiler<'a, I> {
    schema: &'a SchemaDict,
    rows: I,
}

impl<'a, I> FilterCompiler<'a, I>
where
    I: Iterator<Item = &'a Record> + Clone,
{
    fn known_column(&self, column: &str) -> Result<String, StorageError> {
        if self.schema.contains(column) {
            Ok(column.to_string())
        } else {
            Err(StorageError::UnknownColumn(column.to_string()))
        }
    }

    fn invalid(op: &str, reason: &str) -> StorageError {
        StorageError::InvalidValue { op: op.to_string(), reason: reason.to_string() }
    }
}

impl<'a, I> FilterFolder<String> for FilterCompiler<'a, I>
where
    I: Iterator<Item = &'a Record> + Clone,
{
    type Output = CompiledFilter;
    type Error = StorageError;

    fn logical(&mut self, op: LogicalOp, mut children: Vec<CompiledFilter>) -> Result<CompiledFilter, StorageError> {
        Ok(match op {
            LogicalOp::And => CompiledFilter::All(children),
            LogicalOp::Or => CompiledFilter::Any(children),
            LogicalOp::Not => match (children.pop(), children.is_empty()) {
                (Some(inner), true) => CompiledFilter::Not(Box::new(inner)),
                _ => return Err(Self::invalid("not", "expects exactly one filter")),
            },
        })
    }

    fn comparison(&mut self, op: &str, field: &String, value: &Value) -> Result<CompiledFilter, StorageError> {
        let column = self.known_column(field)?;

        if op == "like" || op == "ilike" {
            let Value::String(pattern) = value else {
                return Err(Self::invalid(op, "pattern must be a string"));
            };
            let regex = RecordEval::like_regex(pattern, op == "ilike").map_err(|e| Self::invalid(op, &e.to_string()))?;
            return Ok(CompiledFilter::Pattern { column, regex });
        }

        let compare = CompareOp::parse(op).ok_or_else(|| StorageError::UnsupportedOperator(op.to_string()))?;
        match compare {
            CompareOp::In | CompareOp::NotIn if !value.is_array() => Err(Self::invalid(op, "value must be a list")),
            CompareOp::Contains | CompareOp::StartsWith | CompareOp::EndsWith if !value.is_string() => {
                Err(Self::invalid(op, "value must be a string"))
            }
            _ => Ok(CompiledFilter::Compare { column, op: compare, value: value.clone() }),
        }
    }

    fn duplicates(&mut self, columns: &[String]) -> Result<CompiledFilter, StorageError> {
        let columns = columns.iter().map(|c| self.known_column(c)).collect::<Result<Vec<_>, _>>()?;

        let mut seen: HashMap<String, usize> = HashMap::new();
        for row in self.rows.clone() {
            *seen.entry(RecordEval::group_key(row, &columns)).or_default() += 1;
        }
        let keys = seen.into_iter().filter(|(_, n)| *n > 1).map(|(key, _)| key).collect();

        Ok(CompiledFilter::Duplicated { columns, keys })
    }
}
