//! Query and update algebra for jsondoc
//!
//! This crate compiles predicates and field-level updates into parameterized
//! JSON-path SQL fragments:
//! - Predicate: comparison leaves combined by AND/OR, compiled to a WHERE body
//! - UpdateOp / Update: mutations chained into one `json_set`/`json_remove` expression
//! - SqlFragment: SQL text plus parameters in placeholder order
//! - Compiler: targets a configurable document column (default `data`)
//!
//! Compilation is pure and byte-identical for identical inputs. The one
//! exception is `SetTimestampNow`, whose value is read from the engine clock
//! when the statement runs.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fragment;
pub mod predicate;
pub mod update;

pub use fragment::{Compiler, SqlFragment};
pub use predicate::{
    and, compile, eq, gt, gte, in_, lt, lte, neq, not_in, or, CompareOp, Comparison, LogicalOp,
    Operand, Predicate,
};
pub use update::{
    compile_update, increment, remove_field, set, set_timestamp_now, Update, UpdateOp,
};
