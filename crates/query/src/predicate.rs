//! Predicate algebra
//!
//! A [`Predicate`] is an immutable tree: comparison leaves over a field path,
//! combined by AND/OR nodes. Operands are encoded when the leaf is built, so
//! the tree only ever holds JSON-safe values.
//!
//! Compilation is pure. Each child of a logical node is parenthesised and the
//! parameters are concatenated in child order, keeping placeholders and
//! parameters aligned for arbitrarily nested trees.
//!
//! ```
//! use jsondoc_query::{and, eq, gt};
//!
//! let pred = and([eq("name", "John")?, gt("age", 25)?])?;
//! let frag = pred.to_sql();
//! assert_eq!(
//!     frag.sql,
//!     "(json_extract(data, '$.name') = ?) AND (json_extract(data, '$.age') > ?)"
//! );
//! assert_eq!(frag.params, vec![serde_json::json!("John"), serde_json::json!(25)]);
//! # Ok::<(), jsondoc_core::Error>(())
//! ```

use crate::fragment::{Compiler, SqlFragment};
use jsondoc_core::sql::json_extract;
use jsondoc_core::{encode_value, EncodedValue, Error, FieldPath, Result, Value};
use tracing::trace;

/// Comparison operator of a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=`
    Neq,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `IN (...)`
    In,
    /// `NOT IN (...)`
    NotIn,
}

impl CompareOp {
    /// SQL operator text
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Neq => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::In => "IN",
            CompareOp::NotIn => "NOT IN",
        }
    }

    /// Whether the operator takes a list operand
    pub fn takes_list(self) -> bool {
        matches!(self, CompareOp::In | CompareOp::NotIn)
    }
}

/// Boolean connective of an interior node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    /// All children must hold
    And,
    /// At least one child must hold
    Or,
}

impl LogicalOp {
    /// Separator placed between parenthesised children
    pub fn separator(self) -> &'static str {
        match self {
            LogicalOp::And => " AND ",
            LogicalOp::Or => " OR ",
        }
    }
}

/// Encoded right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Single value
    Value(EncodedValue),
    /// Non-empty list for IN / NOT IN
    List(Vec<EncodedValue>),
}

impl Operand {
    /// Operand values in placeholder order
    pub fn values(&self) -> &[EncodedValue] {
        match self {
            Operand::Value(v) => std::slice::from_ref(v),
            Operand::List(vs) => vs,
        }
    }
}

/// Leaf node: `field <op> operand`
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    field: FieldPath,
    op: CompareOp,
    operand: Operand,
}

impl Comparison {
    /// Build a single-value comparison, encoding `value`
    ///
    /// # Errors
    ///
    /// Returns `Error::Unencodable` (or another encoder error) if the value
    /// cannot be encoded, and `Error::EmptyPredicateList` if `op` is IN or
    /// NOT IN and the value does not encode to a non-empty array.
    pub fn new(field: impl Into<FieldPath>, op: CompareOp, value: impl Into<Value>) -> Result<Self> {
        let encoded = encode_value(value)?;
        let operand = if op.takes_list() {
            match encoded {
                EncodedValue::Array(items) if !items.is_empty() => Operand::List(items),
                _ => return Err(Error::EmptyPredicateList(op.as_sql())),
            }
        } else {
            Operand::Value(encoded)
        };
        Ok(Comparison {
            field: field.into(),
            op,
            operand,
        })
    }

    /// Build an IN / NOT IN comparison from individual values
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyPredicateList` if `values` is empty, or an encoder
    /// error if any value cannot be encoded.
    pub fn list<V: Into<Value>>(
        field: impl Into<FieldPath>,
        op: CompareOp,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        let items = values
            .into_iter()
            .map(encode_value)
            .collect::<Result<Vec<_>>>()?;
        if items.is_empty() {
            return Err(Error::EmptyPredicateList(op.as_sql()));
        }
        let operand = if op.takes_list() {
            Operand::List(items)
        } else {
            // A scalar operator given a list compares against the whole array.
            Operand::Value(EncodedValue::Array(items))
        };
        Ok(Comparison {
            field: field.into(),
            op,
            operand,
        })
    }

    /// Field path being compared
    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    /// Comparison operator
    pub fn op(&self) -> CompareOp {
        self.op
    }

    /// Encoded operand
    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    fn compile(&self, column: &str) -> SqlFragment {
        let lhs = json_extract(column, &self.field);
        let params = self.operand.values().to_vec();
        let sql = match &self.operand {
            Operand::Value(_) => format!("{} {} ?", lhs, self.op.as_sql()),
            Operand::List(items) => {
                let placeholders = vec!["?"; items.len()].join(", ");
                format!("{} {} ({})", lhs, self.op.as_sql(), placeholders)
            }
        };
        SqlFragment::new(sql, params)
    }
}

/// Boolean expression over document fields
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Leaf comparison
    Compare(Comparison),
    /// AND / OR over one or more children
    Logical {
        /// Connective
        op: LogicalOp,
        /// Children in source order (never empty)
        children: Vec<Predicate>,
    },
}

impl Predicate {
    /// Build a logical node
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyPredicateList` if `children` is empty.
    pub fn logical(op: LogicalOp, children: impl IntoIterator<Item = Predicate>) -> Result<Self> {
        let children: Vec<Predicate> = children.into_iter().collect();
        if children.is_empty() {
            let name = match op {
                LogicalOp::And => "AND",
                LogicalOp::Or => "OR",
            };
            return Err(Error::EmptyPredicateList(name));
        }
        Ok(Predicate::Logical { op, children })
    }

    /// Combine with another predicate under AND
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::Logical {
            op: LogicalOp::And,
            children: vec![self, other],
        }
    }

    /// Combine with another predicate under OR
    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::Logical {
            op: LogicalOp::Or,
            children: vec![self, other],
        }
    }

    /// Depth of the tree (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        match self {
            Predicate::Compare(_) => 1,
            Predicate::Logical { children, .. } => {
                1 + children.iter().map(Predicate::depth).max().unwrap_or(0)
            }
        }
    }

    /// Compile against the default `data` column
    pub fn to_sql(&self) -> SqlFragment {
        Compiler::default().predicate(self)
    }

    fn compile_into(&self, column: &str) -> SqlFragment {
        match self {
            Predicate::Compare(cmp) => cmp.compile(column),
            Predicate::Logical { op, children } => {
                let mut parts = Vec::with_capacity(children.len());
                let mut params = Vec::new();
                for child in children {
                    let frag = child.compile_into(column);
                    parts.push(format!("({})", frag.sql));
                    params.extend(frag.params);
                }
                SqlFragment::new(parts.join(op.separator()), params)
            }
        }
    }
}

impl From<Comparison> for Predicate {
    fn from(cmp: Comparison) -> Self {
        Predicate::Compare(cmp)
    }
}

impl Compiler {
    /// Compile a predicate into a WHERE-clause body
    pub fn predicate(&self, predicate: &Predicate) -> SqlFragment {
        let frag = predicate.compile_into(self.column());
        trace!(target: "jsondoc::sql", sql = %frag.sql, params = frag.params.len(), "Compiled predicate");
        frag
    }

    /// Compile an optional predicate; `None` means no WHERE clause at all
    pub fn filter(&self, predicate: Option<&Predicate>) -> Option<SqlFragment> {
        predicate.map(|p| self.predicate(p))
    }
}

/// Compile an optional predicate against the default `data` column
pub fn compile(predicate: Option<&Predicate>) -> Option<SqlFragment> {
    Compiler::default().filter(predicate)
}

fn leaf(field: impl Into<FieldPath>, op: CompareOp, value: impl Into<Value>) -> Result<Predicate> {
    Comparison::new(field, op, value).map(Predicate::Compare)
}

/// `field = value`
pub fn eq(field: impl Into<FieldPath>, value: impl Into<Value>) -> Result<Predicate> {
    leaf(field, CompareOp::Eq, value)
}

/// `field != value`
pub fn neq(field: impl Into<FieldPath>, value: impl Into<Value>) -> Result<Predicate> {
    leaf(field, CompareOp::Neq, value)
}

/// `field > value`
pub fn gt(field: impl Into<FieldPath>, value: impl Into<Value>) -> Result<Predicate> {
    leaf(field, CompareOp::Gt, value)
}

/// `field >= value`
pub fn gte(field: impl Into<FieldPath>, value: impl Into<Value>) -> Result<Predicate> {
    leaf(field, CompareOp::Gte, value)
}

/// `field < value`
pub fn lt(field: impl Into<FieldPath>, value: impl Into<Value>) -> Result<Predicate> {
    leaf(field, CompareOp::Lt, value)
}

/// `field <= value`
pub fn lte(field: impl Into<FieldPath>, value: impl Into<Value>) -> Result<Predicate> {
    leaf(field, CompareOp::Lte, value)
}

/// `field IN (values...)`; an empty list is rejected
pub fn in_<V: Into<Value>>(
    field: impl Into<FieldPath>,
    values: impl IntoIterator<Item = V>,
) -> Result<Predicate> {
    Comparison::list(field, CompareOp::In, values).map(Predicate::Compare)
}

/// `field NOT IN (values...)`; an empty list is rejected
pub fn not_in<V: Into<Value>>(
    field: impl Into<FieldPath>,
    values: impl IntoIterator<Item = V>,
) -> Result<Predicate> {
    Comparison::list(field, CompareOp::NotIn, values).map(Predicate::Compare)
}

/// AND of one or more predicates
pub fn and(children: impl IntoIterator<Item = Predicate>) -> Result<Predicate> {
    Predicate::logical(LogicalOp::And, children)
}

/// OR of one or more predicates
pub fn or(children: impl IntoIterator<Item = Predicate>) -> Result<Predicate> {
    Predicate::logical(LogicalOp::Or, children)
}
