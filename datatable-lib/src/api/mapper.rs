//! Response mapping from raw JSON to rows.

use serde_json::Value;

use crate::error::MappingError;
use crate::model::Columns;
use crate::model::FetchResult;
use crate::model::FieldNames;
use crate::model::Row;
use crate::model::json_type_name;

/// Locates the record list inside a response.
///
/// In order: a bare array is used directly; otherwise the declared
/// collection root must hold an array; with no root declared the whole
/// response is a single record.
pub fn records<'a>(columns: &Columns, response: &'a Value) -> Result<Vec<&'a Value>, MappingError> {
    if let Value::Array(items) = response {
        return Ok(items.iter().collect());
    }

    if !response.is_object() {
        return Err(MappingError::UnsupportedShape {
            found: json_type_name(response),
        });
    }

    match columns.root() {
        Some(root) => match root.resolve(response) {
            Some(Value::Array(items)) => Ok(items.iter().collect()),
            Some(other) => Err(MappingError::RootNotArray {
                root: root.to_string(),
                found: json_type_name(other),
            }),
            None => Err(MappingError::root_missing(root.as_str())),
        },
        None => Ok(vec![response]),
    }
}

/// Projects a single record into a row.
///
/// Serial and collection root columns are skipped. Fields that do not
/// resolve are left out of the row.
pub fn map_record(columns: &Columns, record: &Value) -> Row {
    let mut row = Row::new();
    for column in columns.projected() {
        let value = column.source.as_ref().and_then(|path| path.resolve(record));
        if let Some(value) = value {
            row.insert(column.title.clone(), value.clone());
        }
    }
    row
}

/// Maps a raw response into rows, preserving response order.
///
/// # Example
///
/// ```
/// use datatable_lib::api::map_rows;
/// use datatable_lib::model::{ColumnSpec, Columns};
/// use serde_json::json;
///
/// let columns = Columns::new(vec![
///     ColumnSpec::field("Name", "name"),
///     ColumnSpec::collection_root("data"),
/// ])
/// .unwrap();
///
/// let rows = map_rows(&columns, &json!({ "data": [{ "name": "Jo" }] })).unwrap();
/// assert_eq!(rows[0].display("Name"), "Jo");
/// ```
pub fn map_rows(columns: &Columns, response: &Value) -> Result<Vec<Row>, MappingError> {
    Ok(records(columns, response)?
        .into_iter()
        .map(|record| map_record(columns, record))
        .collect())
}

/// Reads the total item count from a response.
///
/// Accepts non-negative numbers and numeric strings. An unconfigured,
/// absent or unreadable total is 0.
pub fn read_total(field_names: &FieldNames, response: &Value) -> u64 {
    let Some(path) = &field_names.total else {
        return 0;
    };

    match path.resolve(response) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Maps a response into rows and a total count.
pub fn map_response(
    columns: &Columns,
    field_names: &FieldNames,
    response: &Value,
) -> Result<FetchResult, MappingError> {
    Ok(FetchResult {
        rows: map_rows(columns, response)?,
        total_items: read_total(field_names, response),
    })
}
