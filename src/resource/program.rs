// src/resource/program.rs

//! Compiled `requires` programs and their evaluation against the
//! [`ResourceMap`].
//!
//! A requirement expression is satisfied when at least one combination of
//! records (one record per referenced resource) makes it truthy. A resource
//! that has not produced data yet makes the expression
//! [`Satisfaction::Indeterminate`] rather than false.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::resource::expr::eval::{Binding, eval};
use crate::resource::expr::{Expr, ExpressionError, parse};
use crate::resource::record::{ResourceMap, ResourceRecord};
use crate::types::JobId;
use crate::unit::model::Import;
use crate::unit::tokens::qualify_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Satisfaction {
    Satisfied,
    Unsatisfied,
    /// At least one referenced resource has no records yet.
    Indeterminate,
}

/// A `requires` line that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse requirement {expression:?}: {source}")]
pub struct RequirementError {
    pub expression: String,
    #[source]
    pub source: ExpressionError,
}

/// One compiled requirement expression.
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementExpression {
    text: String,
    expr: Expr,
    aliases: Vec<String>,
    resource_ids: Vec<JobId>,
}

impl RequirementExpression {
    /// Compile `text`, resolving every alias to a fully-qualified resource
    /// job id.
    ///
    /// Aliases bound by `imports` win; any other alias is qualified with
    /// `namespace` (the namespace of the unit owning the requirement).
    pub fn compile(
        text: &str,
        namespace: Option<&str>,
        imports: &[Import],
    ) -> Result<Self, ExpressionError> {
        let expr = parse(text)?;
        let aliases = expr.aliases();
        let resource_ids = aliases
            .iter()
            .map(|alias| {
                imports
                    .iter()
                    .find(|imp| &imp.alias == alias)
                    .map(Import::job_id)
                    .unwrap_or_else(|| qualify_id(namespace, alias))
            })
            .collect();

        Ok(Self {
            text: text.trim().to_string(),
            expr,
            aliases,
            resource_ids,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Resource job ids this expression reads, in order of first reference.
    pub fn resource_ids(&self) -> &[JobId] {
        &self.resource_ids
    }

    /// Resource job ids this expression reads that have no records yet.
    pub fn missing_resources<'a>(&'a self, resources: &ResourceMap) -> Vec<&'a JobId> {
        self.resource_ids
            .iter()
            .filter(|id| !resources.contains(id))
            .collect()
    }

    pub fn evaluate(&self, resources: &ResourceMap) -> Satisfaction {
        let mut lists: Vec<&[ResourceRecord]> = Vec::with_capacity(self.resource_ids.len());
        for id in &self.resource_ids {
            match resources.get(id) {
                Some(records) => lists.push(records),
                None => return Satisfaction::Indeterminate,
            }
        }

        if lists.iter().any(|records| records.is_empty()) {
            return Satisfaction::Unsatisfied;
        }

        // Odometer over the cartesian product of record lists.
        let mut cursor = vec![0usize; lists.len()];
        loop {
            let binding: Binding<'_> = self
                .aliases
                .iter()
                .zip(&lists)
                .zip(&cursor)
                .map(|((alias, records), &i)| (alias.as_str(), &records[i]))
                .collect();

            match eval(&self.expr, &binding) {
                Ok(value) if value.is_truthy() => return Satisfaction::Satisfied,
                Ok(_) => {}
                Err(err) => {
                    trace!(expression = %self.text, error = %err, "binding does not match");
                }
            }

            let mut pos = lists.len();
            loop {
                if pos == 0 {
                    return Satisfaction::Unsatisfied;
                }
                pos -= 1;
                cursor[pos] += 1;
                if cursor[pos] < lists[pos].len() {
                    break;
                }
                cursor[pos] = 0;
            }
        }
    }
}

/// Result of one expression inside a program evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionOutcome<'a> {
    pub expression: &'a RequirementExpression,
    pub satisfaction: Satisfaction,
}

/// The full `requires` program of a unit: every line must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequirementProgram {
    expressions: Vec<RequirementExpression>,
}

impl RequirementProgram {
    pub fn compile(
        lines: &[String],
        namespace: Option<&str>,
        imports: &[Import],
    ) -> Result<Self, RequirementError> {
        let expressions = lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(|line| {
                RequirementExpression::compile(line, namespace, imports).map_err(|source| {
                    RequirementError {
                        expression: line.to_string(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { expressions })
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn expressions(&self) -> &[RequirementExpression] {
        &self.expressions
    }

    /// Every resource job id referenced by the program, deduplicated, in
    /// order of first reference.
    pub fn required_resources(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = Vec::new();
        for id in self.expressions.iter().flat_map(|e| e.resource_ids()) {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }

    pub fn evaluate<'a>(&'a self, resources: &ResourceMap) -> Vec<ExpressionOutcome<'a>> {
        self.expressions
            .iter()
            .map(|expression| ExpressionOutcome {
                expression,
                satisfaction: expression.evaluate(resources),
            })
            .collect()
    }

    /// Overall verdict: any false line makes the program unsatisfied,
    /// otherwise any pending line makes it indeterminate.
    pub fn satisfaction(&self, resources: &ResourceMap) -> Satisfaction {
        let mut verdict = Satisfaction::Satisfied;
        for outcome in self.evaluate(resources) {
            match outcome.satisfaction {
                Satisfaction::Unsatisfied => return Satisfaction::Unsatisfied,
                Satisfaction::Indeterminate => verdict = Satisfaction::Indeterminate,
                Satisfaction::Satisfied => {}
            }
        }
        verdict
    }
}

/// Evaluate a single expression whose aliases are plain resource job ids.
pub fn is_satisfied(
    expression: &str,
    resources: &ResourceMap,
) -> Result<Satisfaction, ExpressionError> {
    Ok(RequirementExpression::compile(expression, None, &[])?.evaluate(resources))
}
