//! Update operation algebra
//!
//! An [`Update`] is an ordered, non-empty list of [`UpdateOp`]s compiled into
//! one expression assignable to the document column. Operation *n* wraps the
//! fragment produced by operations `1..n-1`, with the bare column as the base:
//!
//! ```text
//! json_remove(json_set(data, '$.a', json(?)), '$.b')
//! ```
//!
//! Duplicate target fields are legal and apply in list order.
//!
//! `Increment` reads the field from the fragment built so far, so it sees
//! earlier operations on the same field. That fragment appears twice in the
//! SQL and its parameters are bound twice. An absent or null field counts as
//! zero. `SetTimestampNow` embeds the
//! engine's clock call, which makes it the only operation whose effect is
//! decided at execution time rather than compile time.

use crate::fragment::{Compiler, SqlFragment};
use jsondoc_core::sql::{json_extract, json_path_literal};
use jsondoc_core::{encode_value, EncodedValue, Error, FieldPath, Result, Value};
use serde_json::Number;
use tracing::trace;

/// A single field-level mutation
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Overwrite the field with an encoded value
    Set {
        /// Target field
        field: FieldPath,
        /// Encoded value
        value: EncodedValue,
    },
    /// Add a number to the field
    Increment {
        /// Target field
        field: FieldPath,
        /// Amount added
        delta: Number,
    },
    /// Set the field to the engine's current Unix time in seconds
    SetTimestampNow {
        /// Target field
        field: FieldPath,
    },
    /// Remove the field
    RemoveField {
        /// Target field
        field: FieldPath,
    },
}

impl UpdateOp {
    /// Field this operation targets
    pub fn field(&self) -> &FieldPath {
        match self {
            UpdateOp::Set { field, .. }
            | UpdateOp::Increment { field, .. }
            | UpdateOp::SetTimestampNow { field }
            | UpdateOp::RemoveField { field } => field,
        }
    }

    /// Whether the effect of this operation is fixed at compile time
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, UpdateOp::SetTimestampNow { .. })
    }

    fn wrap(&self, base: SqlFragment) -> SqlFragment {
        let mut params = base.params.clone();
        let path = json_path_literal(self.field());
        let sql = match self {
            UpdateOp::Set { value, .. } => {
                // Bound as JSON text so booleans, arrays and objects keep their type.
                params.push(EncodedValue::String(value.to_string()));
                format!("json_set({}, {}, json(?))", base.sql, path)
            }
            UpdateOp::Increment { field, delta } => {
                params.extend(base.params.iter().cloned());
                params.push(EncodedValue::Number(delta.clone()));
                format!(
                    "json_set({}, {}, COALESCE({}, 0) + ?)",
                    base.sql,
                    path,
                    json_extract(&base.sql, field)
                )
            }
            UpdateOp::SetTimestampNow { .. } => format!(
                "json_set({}, {}, CAST(strftime('%s', 'now') AS INTEGER))",
                base.sql, path
            ),
            UpdateOp::RemoveField { .. } => format!("json_remove({}, {})", base.sql, path),
        };
        SqlFragment::new(sql, params)
    }
}

/// `field = value`, encoding `value`
///
/// # Errors
///
/// Returns an encoder error if the value cannot be encoded.
pub fn set(field: impl Into<FieldPath>, value: impl Into<Value>) -> Result<UpdateOp> {
    Ok(UpdateOp::Set {
        field: field.into(),
        value: encode_value(value)?,
    })
}

/// `field = field + delta`
///
/// # Errors
///
/// Returns `Error::NonNumericDelta` if `delta` does not encode to a number.
pub fn increment(field: impl Into<FieldPath>, delta: impl Into<Value>) -> Result<UpdateOp> {
    match encode_value(delta)? {
        EncodedValue::Number(delta) => Ok(UpdateOp::Increment {
            field: field.into(),
            delta,
        }),
        other => Err(Error::NonNumericDelta(other.to_string())),
    }
}

/// `field = <engine now>` in whole Unix seconds
pub fn set_timestamp_now(field: impl Into<FieldPath>) -> UpdateOp {
    UpdateOp::SetTimestampNow {
        field: field.into(),
    }
}

/// Remove `field` from the document
pub fn remove_field(field: impl Into<FieldPath>) -> UpdateOp {
    UpdateOp::RemoveField {
        field: field.into(),
    }
}

/// Ordered, non-empty list of update operations
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    ops: Vec<UpdateOp>,
}

impl Update {
    /// Build an update statement
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyUpdateList` if `ops` is empty.
    pub fn new(ops: impl IntoIterator<Item = UpdateOp>) -> Result<Self> {
        let ops: Vec<UpdateOp> = ops.into_iter().collect();
        if ops.is_empty() {
            return Err(Error::EmptyUpdateList);
        }
        Ok(Update { ops })
    }

    /// Operations in application order
    pub fn ops(&self) -> &[UpdateOp] {
        &self.ops
    }

    /// Compile against the default `data` column
    pub fn to_sql(&self) -> SqlFragment {
        Compiler::default().fold_update(&self.ops)
    }
}

impl From<UpdateOp> for Update {
    fn from(op: UpdateOp) -> Self {
        Update { ops: vec![op] }
    }
}

impl Compiler {
    /// Compile an update statement into the new column value
    pub fn update(&self, update: &Update) -> SqlFragment {
        self.fold_update(update.ops())
    }

    /// Compile a raw operation list
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyUpdateList` if `ops` is empty.
    pub fn update_ops(&self, ops: &[UpdateOp]) -> Result<SqlFragment> {
        if ops.is_empty() {
            return Err(Error::EmptyUpdateList);
        }
        Ok(self.fold_update(ops))
    }

    fn fold_update(&self, ops: &[UpdateOp]) -> SqlFragment {
        let frag = ops
            .iter()
            .fold(SqlFragment::raw(self.column()), |base, op| op.wrap(base));
        trace!(target: "jsondoc::sql", sql = %frag.sql, params = frag.params.len(), "Compiled update");
        frag
    }
}

/// Compile an operation list against the default `data` column
///
/// # Errors
///
/// Returns `Error::EmptyUpdateList` if `ops` is empty.
pub fn compile_update(ops: &[UpdateOp]) -> Result<SqlFragment> {
    Compiler::default().update_ops(ops)
}
