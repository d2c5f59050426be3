//! Store-native filter expressions.
//!
//! An [`Expression`] is a predicate tree evaluated by the store against a
//! record before the record is returned or modified. Clients build one,
//! serialize it with [`Expression::to_bytes`], and carry the bytes to the
//! gateway, which hands them back to [`Expression::from_bytes`] untouched.
//!
//! ## Evaluation
//!
//! Evaluation is three-valued. A comparison whose operands have different
//! types, or that reads a missing bin or a bin of the wrong kind, is
//! *unknown*. `Not` of unknown is unknown, `And`/`Or` follow Kleene logic,
//! and an unknown result at the root rejects the record.

use std::cmp::Ordering;
use std::io::Cursor;

use recordgate_core::{Bins, Value};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Nesting limit enforced when parsing expression bytes.
const MAX_DEPTH: usize = 64;

/// Expected type of a bin read inside an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinKind {
    /// Integer bin
    Int,
    /// Float bin
    Float,
    /// String bin
    String,
    /// Boolean bin
    Bool,
    /// Blob bin
    Blob,
    /// List bin
    List,
    /// Map bin
    Map,
    /// GeoJSON bin
    GeoJson,
}

impl BinKind {
    fn admits(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (BinKind::Int, Value::Int(_))
                | (BinKind::Float, Value::Float(_))
                | (BinKind::String, Value::String(_))
                | (BinKind::Bool, Value::Bool(_))
                | (BinKind::Blob, Value::Blob(_))
                | (BinKind::List, Value::List(_))
                | (BinKind::Map, Value::Map(_))
                | (BinKind::GeoJson, Value::GeoJson(_))
        )
    }
}

/// Predicate tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Operands are equal
    Eq(Box<Expression>, Box<Expression>),
    /// Operands differ
    Ne(Box<Expression>, Box<Expression>),
    /// Left is greater than right
    Gt(Box<Expression>, Box<Expression>),
    /// Left is greater than or equal to right
    Ge(Box<Expression>, Box<Expression>),
    /// Left is less than right
    Lt(Box<Expression>, Box<Expression>),
    /// Left is less than or equal to right
    Le(Box<Expression>, Box<Expression>),
    /// Every operand holds
    And(Vec<Expression>),
    /// Some operand holds
    Or(Vec<Expression>),
    /// Operand does not hold
    Not(Box<Expression>),
    /// Value of a bin of the given kind
    Bin {
        /// Bin name
        name: String,
        /// Expected kind
        kind: BinKind,
    },
    /// The bin is present
    BinExists(String),
    /// Record generation as an integer
    Generation,
    /// Constant
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
enum Eval {
    Bool(bool),
    Value(Value),
    Unknown,
}

impl Expression {
    // ========================================================================
    // Builders
    // ========================================================================

    /// Integer bin reference.
    pub fn int_bin(name: &str) -> Self {
        Expression::Bin {
            name: name.to_string(),
            kind: BinKind::Int,
        }
    }

    /// Float bin reference.
    pub fn float_bin(name: &str) -> Self {
        Expression::Bin {
            name: name.to_string(),
            kind: BinKind::Float,
        }
    }

    /// String bin reference.
    pub fn string_bin(name: &str) -> Self {
        Expression::Bin {
            name: name.to_string(),
            kind: BinKind::String,
        }
    }

    /// Integer literal.
    pub fn int(v: i64) -> Self {
        Expression::Literal(Value::Int(v))
    }

    /// String literal.
    pub fn string(v: &str) -> Self {
        Expression::Literal(Value::String(v.to_string()))
    }

    /// `left == right`
    pub fn eq(left: Expression, right: Expression) -> Self {
        Expression::Eq(Box::new(left), Box::new(right))
    }

    /// `left != right`
    pub fn ne(left: Expression, right: Expression) -> Self {
        Expression::Ne(Box::new(left), Box::new(right))
    }

    /// `left > right`
    pub fn gt(left: Expression, right: Expression) -> Self {
        Expression::Gt(Box::new(left), Box::new(right))
    }

    /// `left >= right`
    pub fn ge(left: Expression, right: Expression) -> Self {
        Expression::Ge(Box::new(left), Box::new(right))
    }

    /// `left < right`
    pub fn lt(left: Expression, right: Expression) -> Self {
        Expression::Lt(Box::new(left), Box::new(right))
    }

    /// `left <= right`
    pub fn le(left: Expression, right: Expression) -> Self {
        Expression::Le(Box::new(left), Box::new(right))
    }

    /// Negation.
    pub fn not(inner: Expression) -> Self {
        Expression::Not(Box::new(inner))
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serialize to the store's expression byte format.
    pub fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        rmp_serde::to_vec(self).map_err(|e| StoreError::InvalidExpression {
            reason: e.to_string(),
        })
    }

    /// Parse expression bytes.
    ///
    /// Rejects trailing bytes, trees nested deeper than the store allows,
    /// and trees whose root or combinator operands are not predicates.
    pub fn from_bytes(bytes: &[u8]) -> StoreResult<Self> {
        let invalid = |reason: String| StoreError::InvalidExpression { reason };

        let mut cursor = Cursor::new(bytes);
        let mut de = rmp_serde::Deserializer::new(&mut cursor);
        let expr = Expression::deserialize(&mut de).map_err(|e| invalid(e.to_string()))?;
        if (cursor.position() as usize) != bytes.len() {
            return Err(invalid(format!(
                "{} trailing bytes after expression",
                bytes.len() - cursor.position() as usize
            )));
        }

        expr.validate(0)?;
        if !expr.is_predicate() {
            return Err(invalid("expression root must be a predicate".to_string()));
        }
        Ok(expr)
    }

    fn is_predicate(&self) -> bool {
        match self {
            Expression::Eq(..)
            | Expression::Ne(..)
            | Expression::Gt(..)
            | Expression::Ge(..)
            | Expression::Lt(..)
            | Expression::Le(..)
            | Expression::And(_)
            | Expression::Or(_)
            | Expression::Not(_)
            | Expression::BinExists(_) => true,
            Expression::Bin { kind, .. } => *kind == BinKind::Bool,
            Expression::Literal(v) => v.as_bool().is_some(),
            Expression::Generation => false,
        }
    }

    fn is_operand(&self) -> bool {
        matches!(
            self,
            Expression::Bin { .. } | Expression::Generation | Expression::Literal(_)
        )
    }

    fn validate(&self, depth: usize) -> StoreResult<()> {
        if depth > MAX_DEPTH {
            return Err(StoreError::InvalidExpression {
                reason: format!("expression nested deeper than {}", MAX_DEPTH),
            });
        }
        match self {
            Expression::Eq(l, r)
            | Expression::Ne(l, r)
            | Expression::Gt(l, r)
            | Expression::Ge(l, r)
            | Expression::Lt(l, r)
            | Expression::Le(l, r) => {
                if !l.is_operand() || !r.is_operand() {
                    return Err(StoreError::InvalidExpression {
                        reason: "comparison operands must be bins, literals or metadata"
                            .to_string(),
                    });
                }
                l.validate(depth + 1)?;
                r.validate(depth + 1)
            }
            Expression::And(items) | Expression::Or(items) => {
                if items.is_empty() {
                    return Err(StoreError::InvalidExpression {
                        reason: "logical combinator needs at least one operand".to_string(),
                    });
                }
                for item in items {
                    if !item.is_predicate() {
                        return Err(StoreError::InvalidExpression {
                            reason: "logical operands must be predicates".to_string(),
                        });
                    }
                    item.validate(depth + 1)?;
                }
                Ok(())
            }
            Expression::Not(inner) => {
                if !inner.is_predicate() {
                    return Err(StoreError::InvalidExpression {
                        reason: "negated operand must be a predicate".to_string(),
                    });
                }
                inner.validate(depth + 1)
            }
            Expression::Bin { name, .. } | Expression::BinExists(name) => {
                if name.is_empty() {
                    return Err(StoreError::InvalidExpression {
                        reason: "bin name must not be empty".to_string(),
                    });
                }
                Ok(())
            }
            Expression::Generation | Expression::Literal(_) => Ok(()),
        }
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Evaluate against a record's bins and generation. Unknown is false.
    pub fn matches(&self, bins: &Bins, generation: u32) -> bool {
        matches!(self.eval(bins, generation), Eval::Bool(true))
    }

    fn eval(&self, bins: &Bins, generation: u32) -> Eval {
        match self {
            Expression::Eq(l, r) => compare(Cmp::Eq, l, r, bins, generation),
            Expression::Ne(l, r) => compare(Cmp::Ne, l, r, bins, generation),
            Expression::Gt(l, r) => compare(Cmp::Gt, l, r, bins, generation),
            Expression::Ge(l, r) => compare(Cmp::Ge, l, r, bins, generation),
            Expression::Lt(l, r) => compare(Cmp::Lt, l, r, bins, generation),
            Expression::Le(l, r) => compare(Cmp::Le, l, r, bins, generation),
            Expression::And(items) => {
                let mut unknown = false;
                for item in items {
                    match item.eval(bins, generation) {
                        Eval::Bool(false) => return Eval::Bool(false),
                        Eval::Bool(true) => {}
                        _ => unknown = true,
                    }
                }
                if unknown {
                    Eval::Unknown
                } else {
                    Eval::Bool(true)
                }
            }
            Expression::Or(items) => {
                let mut unknown = false;
                for item in items {
                    match item.eval(bins, generation) {
                        Eval::Bool(true) => return Eval::Bool(true),
                        Eval::Bool(false) => {}
                        _ => unknown = true,
                    }
                }
                if unknown {
                    Eval::Unknown
                } else {
                    Eval::Bool(false)
                }
            }
            Expression::Not(inner) => match inner.eval(bins, generation) {
                Eval::Bool(b) => Eval::Bool(!b),
                _ => Eval::Unknown,
            },
            Expression::Bin { name, kind } => match bins.get(name) {
                Some(Value::Bool(b)) if *kind == BinKind::Bool => Eval::Bool(*b),
                Some(v) if kind.admits(v) => Eval::Value(v.clone()),
                _ => Eval::Unknown,
            },
            Expression::BinExists(name) => Eval::Bool(bins.contains_key(name)),
            Expression::Generation => Eval::Value(Value::Int(generation as i64)),
            Expression::Literal(Value::Bool(b)) => Eval::Bool(*b),
            Expression::Literal(v) => Eval::Value(v.clone()),
        }
    }
}

fn operand(expr: &Expression, bins: &Bins, generation: u32) -> Option<Value> {
    match expr.eval(bins, generation) {
        Eval::Value(v) => Some(v),
        Eval::Bool(b) => Some(Value::Bool(b)),
        Eval::Unknown => None,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Cmp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Cmp {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Cmp::Eq => ordering == Ordering::Equal,
            Cmp::Ne => ordering != Ordering::Equal,
            Cmp::Gt => ordering == Ordering::Greater,
            Cmp::Ge => ordering != Ordering::Less,
            Cmp::Lt => ordering == Ordering::Less,
            Cmp::Le => ordering != Ordering::Greater,
        }
    }
}

fn compare(op: Cmp, left: &Expression, right: &Expression, bins: &Bins, generation: u32) -> Eval {
    let (Some(l), Some(r)) = (operand(left, bins, generation), operand(right, bins, generation))
    else {
        return Eval::Unknown;
    };
    match (&l, &r) {
        (Value::Int(a), Value::Int(b)) => Eval::Bool(op.accepts(a.cmp(b))),
        (Value::Float(a), Value::Float(b)) => match a.partial_cmp(b) {
            Some(o) => Eval::Bool(op.accepts(o)),
            None => Eval::Unknown,
        },
        (Value::String(a), Value::String(b)) => Eval::Bool(op.accepts(a.cmp(b))),
        (Value::Bool(a), Value::Bool(b)) => Eval::Bool(op.accepts(a.cmp(b))),
        (Value::Blob(a), Value::Blob(b)) => Eval::Bool(op.accepts(a.cmp(b))),
        (Value::Null, Value::Null) => Eval::Bool(op.accepts(Ordering::Equal)),
        // Collections and GeoJSON are unordered: only equality applies.
        (Value::List(_), Value::List(_))
        | (Value::Map(_), Value::Map(_))
        | (Value::GeoJson(_), Value::GeoJson(_)) => match op {
            Cmp::Eq => Eval::Bool(l == r),
            Cmp::Ne => Eval::Bool(l != r),
            _ => Eval::Unknown,
        },
        _ => Eval::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bins(entries: &[(&str, Value)]) -> Bins {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_integer_comparison() {
        let record = bins(&[("integer", Value::Int(10))]);
        assert!(Expression::gt(Expression::int_bin("integer"), Expression::int(1)).matches(&record, 1));
        assert!(!Expression::le(Expression::int_bin("integer"), Expression::int(1)).matches(&record, 1));
    }

    #[test]
    fn test_type_mismatch_is_unknown() {
        let record = bins(&[("name", Value::from("bob"))]);
        let expr = Expression::gt(Expression::int_bin("name"), Expression::int(1));
        assert!(!expr.matches(&record, 1));
        // Not(unknown) stays unknown
        assert!(!Expression::not(expr).matches(&record, 1));
    }

    #[test]
    fn test_missing_bin_is_unknown() {
        let record = bins(&[]);
        let expr = Expression::eq(Expression::string_bin("x"), Expression::string("y"));
        assert!(!expr.matches(&record, 1));
    }

    #[test]
    fn test_logical_combinators() {
        let record = bins(&[("a", Value::Int(5)), ("b", Value::from("x"))]);
        let a_big = Expression::gt(Expression::int_bin("a"), Expression::int(3));
        let b_is_y = Expression::eq(Expression::string_bin("b"), Expression::string("y"));
        assert!(!Expression::And(vec![a_big.clone(), b_is_y.clone()]).matches(&record, 1));
        assert!(Expression::Or(vec![a_big, b_is_y]).matches(&record, 1));
    }

    #[test]
    fn test_generation_and_exists() {
        let record = bins(&[("a", Value::Int(1))]);
        assert!(Expression::ge(Expression::Generation, Expression::int(2)).matches(&record, 2));
        assert!(Expression::BinExists("a".into()).matches(&record, 1));
        assert!(!Expression::BinExists("z".into()).matches(&record, 1));
    }

    #[test]
    fn test_bytes_round_trip() {
        let expr = Expression::gt(Expression::int_bin("integer"), Expression::int(1));
        let bytes = expr.to_bytes().unwrap();
        assert_eq!(Expression::from_bytes(&bytes).unwrap(), expr);
    }

    #[test]
    fn test_parser_rejects_garbage_and_non_predicates() {
        assert!(Expression::from_bytes(b"not an expression").is_err());
        assert!(Expression::from_bytes(&[]).is_err());

        let bytes = Expression::int(3).to_bytes().unwrap();
        assert!(matches!(
            Expression::from_bytes(&bytes),
            Err(StoreError::InvalidExpression { .. })
        ));

        let nested = Expression::gt(
            Expression::not(Expression::BinExists("a".into())),
            Expression::int(1),
        );
        assert!(Expression::from_bytes(&nested.to_bytes().unwrap()).is_err());
    }

    #[test]
    fn test_parser_rejects_trailing_bytes() {
        let mut bytes = Expression::BinExists("a".into()).to_bytes().unwrap();
        bytes.push(0xc0);
        assert!(Expression::from_bytes(&bytes).is_err());
    }
}
