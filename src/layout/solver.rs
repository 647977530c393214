//! Constraint solver integration for layout computation
//!
//! This module provides a wrapper around the kasuari Cassowary constraint solver.
//! Constraints are kept as plain values ([`Constraint`]) so containers can store,
//! compare and purge them; they are translated into the solver's format only when
//! they are added.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Sub};

use kasuari::{
    Constraint as KasuariConstraint, Expression as KasuariExpression, Solver as KasuariSolver,
    Strength as KasuariStrength, Term as KasuariTerm, Variable as KasuariVariable,
    WeightedRelation::*,
};
use thiserror::Error;

// ============================================================================
// Variables and expressions
// ============================================================================

/// An unknown in the constraint system.
///
/// Every call to [`Variable::new`] creates a distinct unknown; two variables
/// never compare equal just because they hold the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable(KasuariVariable);

impl Variable {
    pub fn new() -> Self {
        Self(KasuariVariable::new())
    }
}

impl Default for Variable {
    fn default() -> Self {
        Self::new()
    }
}

/// `coefficient * variable`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    pub variable: Variable,
    pub coefficient: f64,
}

/// A weighted sum of variables plus a constant
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    terms: Vec<Term>,
    constant: f64,
}

impl Expression {
    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn constant_value(&self) -> f64 {
        self.constant
    }

    /// True if any term references `var`
    pub fn references(&self, var: Variable) -> bool {
        self.terms.iter().any(|t| t.variable == var)
    }

    fn scaled(mut self, factor: f64) -> Self {
        for term in &mut self.terms {
            term.coefficient *= factor;
        }
        self.constant *= factor;
        self
    }

    fn to_kasuari(&self) -> KasuariExpression {
        let terms = self
            .terms
            .iter()
            .map(|t| KasuariTerm::new(t.variable.0, t.coefficient))
            .collect();
        KasuariExpression::new(terms, self.constant)
    }
}

impl From<Variable> for Expression {
    fn from(variable: Variable) -> Self {
        Self {
            terms: vec![Term {
                variable,
                coefficient: 1.0,
            }],
            constant: 0.0,
        }
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl<R: Into<Expression>> Add<R> for Expression {
    type Output = Expression;

    fn add(mut self, rhs: R) -> Expression {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl<R: Into<Expression>> Sub<R> for Expression {
    type Output = Expression;

    fn sub(self, rhs: R) -> Expression {
        self + rhs.into().scaled(-1.0)
    }
}

impl Mul<f64> for Expression {
    type Output = Expression;

    fn mul(self, rhs: f64) -> Expression {
        self.scaled(rhs)
    }
}

impl Div<f64> for Expression {
    type Output = Expression;

    fn div(self, rhs: f64) -> Expression {
        self.scaled(1.0 / rhs)
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        self.scaled(-1.0)
    }
}

impl<R: Into<Expression>> Add<R> for Variable {
    type Output = Expression;

    fn add(self, rhs: R) -> Expression {
        Expression::from(self) + rhs
    }
}

impl<R: Into<Expression>> Sub<R> for Variable {
    type Output = Expression;

    fn sub(self, rhs: R) -> Expression {
        Expression::from(self) - rhs
    }
}

impl Mul<f64> for Variable {
    type Output = Expression;

    fn mul(self, rhs: f64) -> Expression {
        Expression::from(self) * rhs
    }
}

impl Div<f64> for Variable {
    type Output = Expression;

    fn div(self, rhs: f64) -> Expression {
        Expression::from(self) / rhs
    }
}

impl Mul<Variable> for f64 {
    type Output = Expression;

    fn mul(self, rhs: Variable) -> Expression {
        Expression::from(rhs) * self
    }
}

// ============================================================================
// Constraints
// ============================================================================

/// Priority of a constraint when the system is over-constrained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strength {
    Required,
    Strong,
    Medium,
    Weak,
}

impl Strength {
    fn to_kasuari(self) -> KasuariStrength {
        match self {
            Strength::Required => KasuariStrength::REQUIRED,
            Strength::Strong => KasuariStrength::STRONG,
            Strength::Medium => KasuariStrength::MEDIUM,
            Strength::Weak => KasuariStrength::WEAK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Equal,
    LessOrEqual,
    GreaterOrEqual,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::Equal => "==",
            Relation::LessOrEqual => "<=",
            Relation::GreaterOrEqual => ">=",
        })
    }
}

/// A linear relation `expression <relation> 0` with a strength.
///
/// Constraints are values: two constraints built from the same terms compare
/// equal, which is how the solver detects duplicates.
#[derive(Debug, Clone)]
pub struct Constraint {
    expression: Expression,
    relation: Relation,
    strength: Strength,
}

impl Constraint {
    /// `lhs <relation> rhs`, stored as `lhs - rhs <relation> 0`
    pub fn new(
        lhs: impl Into<Expression>,
        relation: Relation,
        rhs: impl Into<Expression>,
        strength: Strength,
    ) -> Self {
        Self {
            expression: lhs.into() - rhs,
            relation,
            strength,
        }
    }

    pub fn equal(lhs: impl Into<Expression>, rhs: impl Into<Expression>, strength: Strength) -> Self {
        Self::new(lhs, Relation::Equal, rhs, strength)
    }

    pub fn less_or_equal(
        lhs: impl Into<Expression>,
        rhs: impl Into<Expression>,
        strength: Strength,
    ) -> Self {
        Self::new(lhs, Relation::LessOrEqual, rhs, strength)
    }

    pub fn greater_or_equal(
        lhs: impl Into<Expression>,
        rhs: impl Into<Expression>,
        strength: Strength,
    ) -> Self {
        Self::new(lhs, Relation::GreaterOrEqual, rhs, strength)
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    /// True if the constraint references `var`
    pub fn involves(&self, var: Variable) -> bool {
        self.expression.references(var)
    }

    fn to_kasuari(&self) -> KasuariConstraint {
        let expr = self.expression.to_kasuari();
        let strength = self.strength.to_kasuari();
        match self.relation {
            Relation::Equal => expr | EQ(strength) | 0.0,
            Relation::LessOrEqual => expr | LE(strength) | 0.0,
            Relation::GreaterOrEqual => expr | GE(strength) | 0.0,
        }
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.relation == other.relation
            && self.strength == other.strength
            && self.expression.constant.to_bits() == other.expression.constant.to_bits()
            && self.expression.terms.len() == other.expression.terms.len()
            && self
                .expression
                .terms
                .iter()
                .zip(&other.expression.terms)
                .all(|(a, b)| {
                    a.variable == b.variable && a.coefficient.to_bits() == b.coefficient.to_bits()
                })
    }
}

impl Eq for Constraint {}

impl Hash for Constraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relation.hash(state);
        self.strength.hash(state);
        self.expression.constant.to_bits().hash(state);
        for term in &self.expression.terms {
            term.variable.hash(state);
            term.coefficient.to_bits().hash(state);
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms = self.expression.terms.len();
        write!(
            f,
            "{}-term expression {} {} ({:?})",
            terms, self.relation, -self.expression.constant, self.strength
        )
    }
}

// ============================================================================
// SolverError
// ============================================================================

/// Errors from the constraint solver
#[derive(Debug, Clone, Error)]
pub enum SolverError {
    #[error("unsatisfiable constraint: {constraint}")]
    Unsatisfiable { constraint: String },

    #[error("duplicate constraint: {constraint}")]
    Duplicate { constraint: String },

    #[error("constraint is not part of the solver: {constraint}")]
    UnknownConstraint { constraint: String },

    #[error("edit variable added twice")]
    DuplicateEditVariable,

    #[error("value suggested for a variable that is not an edit variable")]
    UnknownEditVariable,

    #[error("edit variables cannot use required strength")]
    BadEditStrength,

    #[error("internal solver error: {0}")]
    Internal(String),
}

// ============================================================================
// LinearSolver
// ============================================================================

/// Wrapper around the kasuari solver.
///
/// kasuari only reports the variables whose value changed since the last
/// fetch, so the wrapper keeps the last known value of every variable.
pub struct LinearSolver {
    solver: KasuariSolver,
    constraints: HashMap<Constraint, KasuariConstraint>,
    edits: HashSet<Variable>,
    values: HashMap<Variable, f64>,
}

impl LinearSolver {
    pub fn new() -> Self {
        Self {
            solver: KasuariSolver::new(),
            constraints: HashMap::new(),
            edits: HashSet::new(),
            values: HashMap::new(),
        }
    }

    /// Register `var` as an edit variable so values can be suggested for it
    pub fn add_edit_variable(&mut self, var: Variable, strength: Strength) -> Result<(), SolverError> {
        if self.edits.contains(&var) {
            return Err(SolverError::DuplicateEditVariable);
        }
        if strength == Strength::Required {
            return Err(SolverError::BadEditStrength);
        }
        self.solver
            .add_edit_variable(var.0, strength.to_kasuari())
            .map_err(|e| match e {
                kasuari::AddEditVariableError::DuplicateEditVariable => {
                    SolverError::DuplicateEditVariable
                }
                other => SolverError::Internal(format!("failed to add edit variable: {:?}", other)),
            })?;
        self.edits.insert(var);
        Ok(())
    }

    /// Add a constraint to the solver.
    ///
    /// Conflicts between required constraints are reported here, not when
    /// variables are updated.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), SolverError> {
        if self.constraints.contains_key(&constraint) {
            return Err(SolverError::Duplicate {
                constraint: constraint.to_string(),
            });
        }
        let kconstraint = constraint.to_kasuari();
        self.solver
            .add_constraint(kconstraint.clone())
            .map_err(|e| match e {
                kasuari::AddConstraintError::UnsatisfiableConstraint => SolverError::Unsatisfiable {
                    constraint: constraint.to_string(),
                },
                kasuari::AddConstraintError::DuplicateConstraint => SolverError::Duplicate {
                    constraint: constraint.to_string(),
                },
                kasuari::AddConstraintError::InternalSolverError(msg) => {
                    SolverError::Internal(format!("adding {}: {}", constraint, msg))
                }
            })?;
        self.constraints.insert(constraint, kconstraint);
        Ok(())
    }

    pub fn remove_constraint(&mut self, constraint: &Constraint) -> Result<(), SolverError> {
        let kconstraint =
            self.constraints
                .remove(constraint)
                .ok_or_else(|| SolverError::UnknownConstraint {
                    constraint: constraint.to_string(),
                })?;
        self.solver
            .remove_constraint(&kconstraint)
            .map_err(|e| SolverError::Internal(format!("removing {}: {:?}", constraint, e)))
    }

    pub fn has_constraint(&self, constraint: &Constraint) -> bool {
        self.constraints.contains_key(constraint)
    }

    pub fn suggest_value(&mut self, var: Variable, value: f64) -> Result<(), SolverError> {
        if !self.edits.contains(&var) {
            return Err(SolverError::UnknownEditVariable);
        }
        self.solver
            .suggest_value(var.0, value)
            .map_err(|e| SolverError::Internal(format!("failed to suggest value: {:?}", e)))
    }

    /// Pull the current solution out of the solver
    pub fn update_variables(&mut self) {
        for (kvar, value) in self.solver.fetch_changes() {
            self.values.insert(Variable(*kvar), *value);
        }
    }

    /// Last value computed for `var` (zero if the solver never assigned it)
    pub fn value(&self, var: Variable) -> f64 {
        self.values.get(&var).copied().unwrap_or(0.0)
    }

    /// Drop every constraint, edit variable and cached value
    pub fn reset(&mut self) {
        self.solver = KasuariSolver::new();
        self.constraints.clear();
        self.edits.clear();
        self.values.clear();
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty() && self.edits.is_empty()
    }
}

impl Default for LinearSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LinearSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearSolver")
            .field("constraints", &self.constraints.len())
            .field("edit_variables", &self.edits.len())
            .field("values", &self.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.001
    }

    #[test]
    fn test_fixed_constraint() {
        let mut solver = LinearSolver::new();
        let width = Variable::new();

        solver
            .add_constraint(Constraint::equal(width, 100.0, Strength::Required))
            .unwrap();
        solver.update_variables();

        assert!(approx(solver.value(width), 100.0));
    }

    #[test]
    fn test_offset_constraint_follows_edit_variable() {
        let mut solver = LinearSolver::new();
        let a = Variable::new();
        let b = Variable::new();

        // a = b + 20
        solver
            .add_constraint(Constraint::equal(a, b + 20.0, Strength::Required))
            .unwrap();
        solver.add_edit_variable(b, Strength::Strong).unwrap();
        solver.suggest_value(b, 50.0).unwrap();
        solver.update_variables();

        assert!(approx(solver.value(a), 70.0));
        assert!(approx(solver.value(b), 50.0));

        solver.suggest_value(b, 10.0).unwrap();
        solver.update_variables();
        assert!(approx(solver.value(a), 30.0));
    }

    #[test]
    fn test_required_inequality_beats_suggestion() {
        let mut solver = LinearSolver::new();
        let width = Variable::new();

        solver
            .add_constraint(Constraint::greater_or_equal(width, 50.0, Strength::Required))
            .unwrap();
        solver.add_edit_variable(width, Strength::Strong).unwrap();
        solver.suggest_value(width, 30.0).unwrap();
        solver.update_variables();

        assert!(solver.value(width) >= 50.0 - 0.001);
    }

    #[test]
    fn test_medium_yields_to_required() {
        let mut solver = LinearSolver::new();
        let width = Variable::new();

        solver
            .add_constraint(Constraint::equal(width, 40.0, Strength::Medium))
            .unwrap();
        solver
            .add_constraint(Constraint::equal(width, 90.0, Strength::Required))
            .unwrap();
        solver.update_variables();

        assert!(approx(solver.value(width), 90.0));
    }

    #[test]
    fn test_conflicting_constraints_error() {
        let mut solver = LinearSolver::new();
        let x = Variable::new();

        solver
            .add_constraint(Constraint::greater_or_equal(x, 200.0, Strength::Required))
            .unwrap();
        let result =
            solver.add_constraint(Constraint::less_or_equal(x, 100.0, Strength::Required));

        match result {
            Err(SolverError::Unsatisfiable { .. }) => {}
            other => panic!("Expected Unsatisfiable error, got: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_constraint_error() {
        let mut solver = LinearSolver::new();
        let x = Variable::new();
        let c = Constraint::equal(x, 1.0, Strength::Weak);

        solver.add_constraint(c.clone()).unwrap();
        assert!(matches!(
            solver.add_constraint(c),
            Err(SolverError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_duplicate_edit_variable_error() {
        let mut solver = LinearSolver::new();
        let x = Variable::new();

        solver.add_edit_variable(x, Strength::Strong).unwrap();
        assert!(matches!(
            solver.add_edit_variable(x, Strength::Strong),
            Err(SolverError::DuplicateEditVariable)
        ));
        assert!(matches!(
            solver.suggest_value(Variable::new(), 1.0),
            Err(SolverError::UnknownEditVariable)
        ));
    }

    #[test]
    fn test_remove_constraint_releases_variable() {
        let mut solver = LinearSolver::new();
        let x = Variable::new();
        let pin = Constraint::equal(x, 10.0, Strength::Required);

        solver.add_constraint(pin.clone()).unwrap();
        solver
            .add_constraint(Constraint::equal(x, 25.0, Strength::Weak))
            .unwrap();
        solver.update_variables();
        assert!(approx(solver.value(x), 10.0));

        solver.remove_constraint(&pin).unwrap();
        solver.update_variables();
        assert!(approx(solver.value(x), 25.0));
        assert!(matches!(
            solver.remove_constraint(&pin),
            Err(SolverError::UnknownConstraint { .. })
        ));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut solver = LinearSolver::new();
        let x = Variable::new();

        solver.add_edit_variable(x, Strength::Strong).unwrap();
        solver
            .add_constraint(Constraint::equal(x, 5.0, Strength::Required))
            .unwrap();
        solver.update_variables();
        solver.reset();

        assert!(solver.is_empty());
        assert_eq!(solver.value(x), 0.0);
        // The edit variable can be registered again after a reset
        solver.add_edit_variable(x, Strength::Strong).unwrap();
    }

    #[test]
    fn test_constraint_value_equality() {
        let a = Variable::new();
        let b = Variable::new();
        let c1 = Constraint::equal(a, b + 4.0, Strength::Required);
        let c2 = Constraint::equal(a, b + 4.0, Strength::Required);
        let c3 = Constraint::equal(a, b + 4.0, Strength::Strong);

        assert_eq!(c1, c2);
        assert_ne!(c1, c3);
        assert!(c1.involves(a) && c1.involves(b));
        assert!(!c1.involves(Variable::new()));
    }
}
