/// Search expression model: typed predicates validated before transport.
///
/// A basic expression pairs comparison operators with operand envelopes.
/// With no explicit field list the query is index-eligible: the service
/// evaluates it against the declared composite index, which requires the
/// operands to cover every indexed field. With an explicit field list the
/// query is a full scan restricted to the named field ids, and each operand
/// populates only its subset of fields (unset fields are don't-care).
///
/// Operands whose comparisons cover only a prefix of an index key are not
/// rejected here; whether the service runs a prefix-accelerated scan or
/// refuses the query is its contract, surfaced through the call status.
use strata_proto as proto;

use crate::codec::Envelope;
use crate::error::{ClientError, Result};

/// How a basic expression's clauses combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "rest",
    derive(serde::Serialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    fn into_proto(self) -> i32 {
        match self {
            LogicalOp::And => proto::LogicalOperator::And as i32,
            LogicalOp::Or => proto::LogicalOperator::Or as i32,
        }
    }
}

/// Comparison applied between an operand envelope and stored records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "rest",
    derive(serde::Serialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Comparison {
    Equal,
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
    NotEqual,
}

impl Comparison {
    fn into_proto(self) -> i32 {
        let op = match self {
            Comparison::Equal => proto::ComparisonOperator::Equal,
            Comparison::Greater => proto::ComparisonOperator::Greater,
            Comparison::GreaterEqual => proto::ComparisonOperator::GreaterEqual,
            Comparison::Lesser => proto::ComparisonOperator::Lesser,
            Comparison::LesserEqual => proto::ComparisonOperator::LesserEqual,
            Comparison::NotEqual => proto::ComparisonOperator::NotEqual,
        };
        op as i32
    }
}

/// How the service will evaluate a basic expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    /// No explicit fields: evaluated against the declared composite index.
    IndexEligible,
    /// Explicit fields: full scan restricted to these field ids.
    FieldScan(Vec<u32>),
}

/// A flat predicate: comparison/operand pairs under one logical operator.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicExpression {
    logical: LogicalOp,
    comparisons: Vec<Comparison>,
    operands: Vec<Envelope>,
    fields: Vec<u32>,
}

impl BasicExpression {
    pub fn builder(logical: LogicalOp) -> BasicExpressionBuilder {
        BasicExpressionBuilder {
            logical,
            comparisons: Vec::new(),
            operands: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn logical(&self) -> LogicalOp {
        self.logical
    }

    pub fn comparisons(&self) -> &[Comparison] {
        &self.comparisons
    }

    pub fn operands(&self) -> &[Envelope] {
        &self.operands
    }

    pub fn fields(&self) -> &[u32] {
        &self.fields
    }

    /// Classify how the service will evaluate this expression.
    pub fn kind(&self) -> QueryKind {
        if self.fields.is_empty() {
            QueryKind::IndexEligible
        } else {
            QueryKind::FieldScan(self.fields.clone())
        }
    }

    fn into_proto(self) -> proto::Basic {
        proto::Basic {
            logical_operator: self.logical.into_proto(),
            comparisons: self.comparisons.iter().map(|c| c.into_proto()).collect(),
            operands: self.operands,
            fields: self.fields,
        }
    }
}

/// Builder for [`BasicExpression`], in clause order.
#[derive(Debug, Clone)]
pub struct BasicExpressionBuilder {
    logical: LogicalOp,
    comparisons: Vec<Comparison>,
    operands: Vec<Envelope>,
    fields: Vec<u32>,
}

impl BasicExpressionBuilder {
    /// Add one comparison/operand pair.
    pub fn clause(mut self, comparison: Comparison, operand: Envelope) -> Self {
        self.comparisons.push(comparison);
        self.operands.push(operand);
        self
    }

    /// Restrict evaluation to an explicit field id.
    pub fn field(mut self, id: u32) -> Self {
        self.fields.push(id);
        self
    }

    /// Restrict evaluation to explicit field ids.
    pub fn fields(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.fields.extend(ids);
        self
    }

    pub fn build(self) -> Result<SearchExpression> {
        SearchExpression::basic(self.logical, self.comparisons, self.operands, self.fields)
    }
}

/// A search predicate: either a flat expression or a nested combination.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchExpression {
    Basic(BasicExpression),
    Composite {
        logical: LogicalOp,
        children: Vec<SearchExpression>,
    },
}

impl SearchExpression {
    /// Construct a validated basic expression.
    pub fn basic(
        logical: LogicalOp,
        comparisons: Vec<Comparison>,
        operands: Vec<Envelope>,
        fields: Vec<u32>,
    ) -> Result<Self> {
        validate_basic(comparisons.len(), operands.len(), fields.len())?;
        Ok(SearchExpression::Basic(BasicExpression {
            logical,
            comparisons,
            operands,
            fields,
        }))
    }

    /// Combine sub-expressions with AND.
    pub fn all_of(children: Vec<SearchExpression>) -> Result<Self> {
        Self::composite(LogicalOp::And, children)
    }

    /// Combine sub-expressions with OR.
    pub fn any_of(children: Vec<SearchExpression>) -> Result<Self> {
        Self::composite(LogicalOp::Or, children)
    }

    fn composite(logical: LogicalOp, children: Vec<SearchExpression>) -> Result<Self> {
        if children.is_empty() {
            return Err(ClientError::MalformedExpression(
                "composite expression requires at least one child".to_string(),
            ));
        }
        Ok(SearchExpression::Composite { logical, children })
    }

    pub fn as_basic(&self) -> Option<&BasicExpression> {
        match self {
            SearchExpression::Basic(basic) => Some(basic),
            SearchExpression::Composite { .. } => None,
        }
    }

    /// Encode for transport.
    pub fn into_proto(self) -> proto::Expression {
        match self {
            SearchExpression::Basic(basic) => proto::Expression {
                kind: Some(proto::expression::Kind::Basic(basic.into_proto())),
            },
            SearchExpression::Composite { logical, children } => proto::Expression {
                kind: Some(proto::expression::Kind::Composite(proto::Composite {
                    logical_operator: logical.into_proto(),
                    children: children.into_iter().map(|c| c.into_proto()).collect(),
                })),
            },
        }
    }
}

/// Shared structural validation for basic expressions (gRPC and REST paths).
pub(crate) fn validate_basic(
    comparisons: usize,
    operands: usize,
    fields: usize,
) -> Result<()> {
    if comparisons == 0 {
        return Err(ClientError::MalformedExpression(
            "expression requires at least one comparison".to_string(),
        ));
    }
    if comparisons != operands {
        return Err(ClientError::MalformedExpression(format!(
            "{comparisons} comparisons paired with {operands} operands"
        )));
    }
    if fields != 0 && fields % comparisons != 0 {
        return Err(ClientError::MalformedExpression(format!(
            "field list of length {fields} does not partition across {comparisons} operand groups"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::type_url_for;

    fn envelope(marker: u8) -> Envelope {
        Envelope {
            type_url: type_url_for("strata.test.TestRecord"),
            value: vec![marker],
        }
    }

    #[test]
    fn closed_range_without_fields_is_index_eligible() {
        let expr = SearchExpression::basic(
            LogicalOp::And,
            vec![Comparison::GreaterEqual, Comparison::LesserEqual],
            vec![envelope(1), envelope(2)],
            vec![],
        )
        .unwrap();

        assert_eq!(expr.as_basic().unwrap().kind(), QueryKind::IndexEligible);
    }

    #[test]
    fn explicit_fields_classify_as_field_scan() {
        let expr = SearchExpression::basic(
            LogicalOp::And,
            vec![Comparison::GreaterEqual, Comparison::LesserEqual],
            vec![envelope(1), envelope(2)],
            vec![1, 2],
        )
        .unwrap();

        assert_eq!(
            expr.as_basic().unwrap().kind(),
            QueryKind::FieldScan(vec![1, 2])
        );
    }

    #[test]
    fn mismatched_comparison_operand_counts_are_rejected() {
        let err = SearchExpression::basic(
            LogicalOp::And,
            vec![Comparison::GreaterEqual, Comparison::LesserEqual],
            vec![envelope(1)],
            vec![],
        )
        .unwrap_err();

        assert!(matches!(err, ClientError::MalformedExpression(_)));
    }

    #[test]
    fn empty_expression_is_rejected() {
        let err =
            SearchExpression::basic(LogicalOp::And, vec![], vec![], vec![]).unwrap_err();
        assert!(matches!(err, ClientError::MalformedExpression(_)));
    }

    #[test]
    fn field_list_must_partition_operand_groups() {
        let err = SearchExpression::basic(
            LogicalOp::And,
            vec![Comparison::GreaterEqual, Comparison::LesserEqual],
            vec![envelope(1), envelope(2)],
            vec![1, 2, 3],
        )
        .unwrap_err();

        assert!(matches!(err, ClientError::MalformedExpression(_)));

        // One field per operand group partitions evenly.
        SearchExpression::basic(
            LogicalOp::And,
            vec![Comparison::GreaterEqual, Comparison::LesserEqual],
            vec![envelope(1), envelope(2)],
            vec![1, 2, 3, 4],
        )
        .unwrap();
    }

    #[test]
    fn builder_preserves_clause_order() {
        let expr = BasicExpression::builder(LogicalOp::And)
            .clause(Comparison::GreaterEqual, envelope(1))
            .clause(Comparison::LesserEqual, envelope(2))
            .build()
            .unwrap();

        let basic = expr.as_basic().unwrap();
        assert_eq!(
            basic.comparisons(),
            &[Comparison::GreaterEqual, Comparison::LesserEqual]
        );
        assert_eq!(basic.operands()[0].value, vec![1]);
        assert_eq!(basic.operands()[1].value, vec![2]);
    }

    #[test]
    fn composite_encodes_recursively() {
        let left = BasicExpression::builder(LogicalOp::And)
            .clause(Comparison::GreaterEqual, envelope(1))
            .build()
            .unwrap();
        let right = BasicExpression::builder(LogicalOp::And)
            .clause(Comparison::LesserEqual, envelope(2))
            .build()
            .unwrap();

        let encoded = SearchExpression::all_of(vec![left, right]).unwrap().into_proto();
        match encoded.kind.unwrap() {
            strata_proto::expression::Kind::Composite(composite) => {
                assert_eq!(composite.children.len(), 2);
            }
            other => panic!("expected composite, got {other:?}"),
        }

        assert!(SearchExpression::all_of(vec![]).is_err());
    }
}
