//! The solution-modifier resolver.
//!
//! [`ParsedQuery::add_solution_modifiers`] is a one-shot pass over a
//! freshly parsed query with five ordered stages:
//!
//! 1. GROUP BY — validate keys, materialize expression keys as binds
//! 2. HAVING — stored verbatim
//! 3. ORDER BY — validate keys against grouping, materialize expression
//!    keys as internal binds
//! 4. LIMIT/OFFSET/TEXTLIMIT — copied through
//! 5. SELECT alias normalization / CONSTRUCT grouping check
//!
//! Each stage's checks use the visible-variable set as it stands after
//! all earlier stages, so resolution order is the literal left-to-right
//! order of the clauses as written.
//!
//! A failure aborts the pass immediately. Binds materialized by earlier
//! stages stay in the tree; this is safe because the caller discards
//! the whole query on error.

use crate::clause::{Alias, Clause};
use crate::error::{QueryError, Result};
use crate::expr::Expression;
use crate::modifier::{GroupKey, OrderKey, SolutionModifiers, VariableOrderKey};
use crate::query::ParsedQuery;
use crate::var::Variable;
use std::collections::HashSet;

impl ParsedQuery {
    /// Resolve the raw solution modifiers into the query's normalized
    /// shape, mutating it in place.
    ///
    /// Called exactly once per query, after the pattern tree is built.
    /// On error the query is left partially mutated and must be
    /// discarded by the caller.
    pub fn add_solution_modifiers(&mut self, modifiers: SolutionModifiers) -> Result<()> {
        let no_extra = HashSet::new();

        // Stage 1 — GROUP BY.
        for key in modifiers.group_by {
            match key {
                GroupKey::Variable(variable) => {
                    self.check_variable_is_visible(&variable, "GROUP BY", &no_extra)?;
                    self.group_by_variables.push(variable);
                }
                GroupKey::Expression(expression) => {
                    self.check_used_variables_are_visible(&expression, "GROUP BY", &no_extra)?;
                    let target = self.add_internal_bind(expression);
                    self.group_by_variables.push(target);
                }
                GroupKey::Alias(alias) => {
                    self.add_bind(alias.expression, alias.target.clone(), true);
                    self.group_by_variables.push(alias.target);
                }
            }
        }

        // Stage 2 — HAVING, stored verbatim. Known gap: no visibility
        // or aggregate checks are performed on HAVING expressions.
        self.having_clauses = modifiers.having;

        // Grouping is explicit when GROUP BY resolved to something, and
        // implicit when a SELECT alias aggregates without any GROUP BY.
        let is_explicit_group_by = !self.group_by_variables.is_empty();
        let is_implicit_group_by = !is_explicit_group_by
            && self
                .aliases()
                .iter()
                .any(|alias| alias.expression.contains_aggregate());
        let is_group_by = is_explicit_group_by || is_implicit_group_by;

        let note_for_implicit_group_by = if is_implicit_group_by {
            " Note: The GROUP BY in this query is implicit because an aggregate expression \
             was used in the SELECT clause."
        } else {
            ""
        };
        let note_for_group_by_error = format!(
            " All non-aggregated variables must be part of the GROUP BY \
             clause.{note_for_implicit_group_by}"
        );

        // Stage 3 — ORDER BY.
        for key in modifiers.order_by.keys {
            match key {
                OrderKey::Variable(key) => {
                    if !is_group_by {
                        self.check_variable_is_visible(&key.variable, "ORDER BY", &no_extra)?;
                    } else {
                        let is_grouped = self.group_by_variables.contains(&key.variable);
                        // CONSTRUCT clauses have no aliases, so there the
                        // variable can never be an alias target.
                        let is_alias_target = self
                            .aliases()
                            .iter()
                            .any(|alias| alias.target == key.variable);
                        if !is_grouped && !is_alias_target {
                            return Err(QueryError::invalid_for_variable(
                                key.variable.clone(),
                                format!(
                                    "Variable {} was used in an ORDER BY clause, but is neither \
                                     grouped nor created as an alias in the SELECT \
                                     clause.{note_for_implicit_group_by}",
                                    key.variable
                                ),
                            ));
                        }
                    }
                    self.order_by.push(key);
                }
                OrderKey::Expression {
                    expression,
                    descending,
                } => {
                    self.check_used_variables_are_visible(&expression, "ORDER BY", &no_extra)?;
                    if is_group_by {
                        // Would need a hidden alias in the SELECT clause,
                        // which the planner does not support.
                        return Err(QueryError::not_supported(format!(
                            "Ordering by an expression while the query performs grouping. (The \
                             expression is \"{}\".) Please assign this expression to a new \
                             variable in the SELECT clause and then order by this \
                             variable.{note_for_implicit_group_by}",
                            expression.descriptor()
                        )));
                    }
                    // Ordering is only implemented over variables, so the
                    // expression is bound to an internal variable and the
                    // query is ordered by that.
                    let target = self.add_internal_bind(expression);
                    self.order_by.push(VariableOrderKey::new(target, descending));
                }
            }
        }
        self.is_internal_sort = modifiers.order_by.is_internal_sort;

        // Stage 4 — LIMIT/OFFSET/TEXTLIMIT.
        self.limit_offset = modifiers.limit_offset;

        // Stage 5 — alias / SELECT normalization, or the symmetric
        // CONSTRUCT grouping rule.
        if self.has_select_clause() {
            self.check_alias_targets_have_no_overlap()?;
            self.check_alias_variables_are_visible(is_group_by, &note_for_group_by_error)?;

            if is_group_by {
                self.check_select_aggregate_consistency(&note_for_group_by_error)?;
            } else {
                // Without grouping, every alias compiles to an ordinary
                // visible bind at the end of the query body, in clause
                // order; downstream consumers then see aliasing as
                // ordinary binding. The selection itself is unchanged.
                let aliases: Vec<Alias> = self.aliases().to_vec();
                for alias in aliases {
                    self.add_bind(alias.expression, alias.target, true);
                }
                if let Clause::Select(select) = &mut self.clause {
                    select.delete_aliases_but_keep_variables();
                }
            }
        } else if !self.group_by_variables.is_empty() {
            self.check_construct_template_is_grouped(&note_for_group_by_error)?;
        }

        Ok(())
    }

    /// Check that `variable` is visible in the query body, or part of
    /// `additional_visible`.
    fn check_variable_is_visible(
        &self,
        variable: &Variable,
        location: &str,
        additional_visible: &HashSet<Variable>,
    ) -> Result<()> {
        if self.visible_variables().contains(variable) || additional_visible.contains(variable) {
            return Ok(());
        }
        Err(QueryError::invalid_for_variable(
            variable.clone(),
            format!(
                "Variable {variable} was used by {location}, but is not defined in the query body."
            ),
        ))
    }

    /// Check that every variable of `expression` is visible in the
    /// query body, or part of `additional_visible`.
    fn check_used_variables_are_visible(
        &self,
        expression: &Expression,
        location: &str,
        additional_visible: &HashSet<Variable>,
    ) -> Result<()> {
        for variable in expression.contained_variables() {
            self.check_variable_is_visible(
                &variable,
                &format!("{location} in expression \"{}\"", expression.descriptor()),
                additional_visible,
            )?;
        }
        Ok(())
    }

    /// Check that no alias target collides with a body-visible variable
    /// or with another entry of the same SELECT clause.
    fn check_alias_targets_have_no_overlap(&self) -> Result<()> {
        let Clause::Select(select) = &self.clause else {
            return Ok(());
        };
        let selected = select.selected_variables();
        for alias in select.aliases() {
            if select.visible_variables().contains(&alias.target) {
                return Err(QueryError::invalid_for_variable(
                    alias.target.clone(),
                    format!(
                        "The target {} of an AS clause was already used in the query body.",
                        alias.target
                    ),
                ));
            }
            // The target joined the selection when the alias was parsed,
            // so it appears exactly once in a well-formed clause.
            let count = selected.iter().filter(|v| **v == alias.target).count();
            if count > 1 {
                return Err(QueryError::invalid_for_variable(
                    alias.target.clone(),
                    format!(
                        "The target {} of an AS clause was already used before in the SELECT \
                         clause.",
                        alias.target
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Check that every alias expression only uses visible variables.
    ///
    /// Without grouping, the targets of *earlier* aliases of the same
    /// SELECT clause count as visible (sequential chaining, e.g.
    /// `SELECT (?a AS ?b) (?b AS ?c)`). With grouping that chaining is
    /// not supported: a query that relies on it fails with a
    /// not-supported error citing the underlying visibility failure.
    fn check_alias_variables_are_visible(
        &self,
        is_group_by: bool,
        note_for_group_by_error: &str,
    ) -> Result<()> {
        let no_extra = HashSet::new();
        let mut bound_in_aliases: HashSet<Variable> = HashSet::new();
        for alias in self.aliases() {
            if !is_group_by {
                self.check_used_variables_are_visible(
                    &alias.expression,
                    "SELECT",
                    &bound_in_aliases,
                )?;
            } else if let Err(err) =
                self.check_used_variables_are_visible(&alias.expression, "SELECT", &no_extra)
            {
                // If the variable is defined neither in the query body nor
                // by an earlier alias, re-raise the same failure. Otherwise
                // the query relies on alias chaining under grouping.
                self.check_used_variables_are_visible(
                    &alias.expression,
                    "SELECT",
                    &bound_in_aliases,
                )?;
                let message = format!(
                    "{} Note: This variable was defined previously in the SELECT clause, which \
                     is allowed by the query language but currently not supported when the \
                     query performs grouping.{note_for_group_by_error}",
                    err.message()
                );
                return Err(QueryError::not_supported_with_metadata(
                    message,
                    err.into_metadata(),
                ));
            }
            bound_in_aliases.insert(alias.target.clone());
        }
        Ok(())
    }

    /// With grouping active, check that every selected variable is
    /// either grouped or the target of an aggregating alias, and that
    /// the selection is not an asterisk.
    fn check_select_aggregate_consistency(&self, note_for_group_by_error: &str) -> Result<()> {
        let Clause::Select(select) = &self.clause else {
            return Ok(());
        };
        if select.is_asterisk() {
            return Err(QueryError::invalid(
                "GROUP BY is not allowed when all variables are selected via SELECT *",
            ));
        }

        let group_variables: HashSet<Variable> =
            self.group_by_variables.iter().cloned().collect();
        for variable in select.selected_variables() {
            if let Some(alias) = select
                .aliases()
                .iter()
                .find(|alias| alias.target == variable)
            {
                if alias.expression.is_aggregate(&group_variables) {
                    continue;
                }
                let unaggregated = alias.expression.unaggregated_variables(&group_variables);
                let names: Vec<String> = unaggregated.iter().map(ToString::to_string).collect();
                return Err(QueryError::invalid_for_variables(
                    unaggregated,
                    format!(
                        "The expression \"{}\" does not aggregate {}.{note_for_group_by_error}",
                        alias.expression.descriptor(),
                        names.join(", ")
                    ),
                ));
            }
            if !self.group_by_variables.contains(&variable) {
                return Err(QueryError::invalid_for_variable(
                    variable.clone(),
                    format!(
                        "Variable {variable} is selected but not \
                         aggregated.{note_for_group_by_error}"
                    ),
                ));
            }
        }
        Ok(())
    }

    /// With explicit grouping active, check that every variable of the
    /// CONSTRUCT template is grouped.
    fn check_construct_template_is_grouped(&self, note_for_group_by_error: &str) -> Result<()> {
        let Clause::Construct(construct) = &self.clause else {
            return Ok(());
        };
        for variable in construct.contained_variables() {
            if !self.group_by_variables.contains(variable) {
                return Err(QueryError::invalid_for_variable(
                    variable.clone(),
                    format!(
                        "Variable {variable} is used but not \
                         aggregated.{note_for_group_by_error}"
                    ),
                ));
            }
        }
        Ok(())
    }
}
