//! Implements a solver interface for Clarabel
//!
//! Clarabel solves problems of the form min ½xᵀPx + qᵀx subject to Ax + s = b, s ∈ K. Linear
//! problems are passed with P = 0. Equality rows (equality constraints, and inequality
//! constraints or variables whose bounds coincide) go into the zero cone first, every finite
//! upper bound becomes a row `terms <= ub`, and every finite lower bound a row
//! `-terms <= -lb`, in the nonnegative cone.
use clarabel::algebra::CscMatrix as ClarabelCsc;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use indexmap::IndexMap;
use log::warn;
use nalgebra_sparse::{CooMatrix, CscMatrix};

use crate::configuration::Configuration;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Interior point solver backend
#[derive(Clone, Debug)]
pub struct ClarabelSolver {
    /// Feasibility and duality gap tolerance
    pub tolerance: f64,
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        ClarabelSolver {
            tolerance: Configuration::current().tolerance,
        }
    }
}

/// A row of the constraint matrix, as (column, coefficient) pairs with its right hand side
type Row = (Vec<(usize, f64)>, f64);

/// Rows of the constraint matrix, split by cone
#[derive(Default)]
struct Rows {
    zero: Vec<Row>,
    nonnegative: Vec<Row>,
}

impl Rows {
    /// Add the rows for lb <= terms <= ub
    fn push_bounded(&mut self, terms: Vec<(usize, f64)>, lb: f64, ub: f64) {
        if lb == ub {
            self.zero.push((terms, lb));
            return;
        }
        if ub.is_finite() {
            self.nonnegative.push((terms.clone(), ub));
        }
        if lb.is_finite() {
            let negated = terms.into_iter().map(|(c, v)| (c, -v)).collect();
            self.nonnegative.push((negated, -lb));
        }
    }
}

impl ClarabelSolver {
    fn assemble(problem: &Problem) -> Rows {
        let mut rows = Rows::default();
        for constraint in problem.constraints().values() {
            let terms = constraint
                .terms()
                .iter()
                .filter_map(|t| {
                    problem
                        .variables()
                        .get_index_of(&t.variable)
                        .map(|idx| (idx, t.coefficient))
                })
                .collect();
            let (lb, ub) = constraint.bounds();
            rows.push_bounded(terms, lb, ub);
        }
        for (idx, variable) in problem.variables().values().enumerate() {
            rows.push_bounded(vec![(idx, 1.)], variable.lower_bound, variable.upper_bound);
        }
        rows
    }
}

impl Solver for ClarabelSolver {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let n = problem.num_variables();
        let rows = ClarabelSolver::assemble(problem);
        let (n_zero, n_nonneg) = (rows.zero.len(), rows.nonnegative.len());
        let m = n_zero + n_nonneg;

        let mut row_indices = Vec::new();
        let mut col_indices = Vec::new();
        let mut values = Vec::new();
        let mut b = Vec::with_capacity(m);
        for (row, (terms, rhs)) in rows.zero.into_iter().chain(rows.nonnegative).enumerate() {
            for (col, coef) in terms {
                row_indices.push(row);
                col_indices.push(col);
                values.push(coef);
            }
            b.push(rhs);
        }
        let coo = CooMatrix::try_from_triplets(m, n, row_indices, col_indices, values)
            .map_err(|e| SolverError::Assembly(e.to_string()))?;
        let (colptr, rowval, nzval) = CscMatrix::from(&coo).disassemble();
        let a = ClarabelCsc::new(m, n, colptr, rowval, nzval);
        let p = ClarabelCsc::new(n, n, vec![0; n + 1], Vec::new(), Vec::new());

        let sign = match problem.objective().sense() {
            ObjectiveSense::Minimize => 1.,
            ObjectiveSense::Maximize => -1.,
        };
        let mut q = vec![0.; n];
        for (variable, coef) in problem.objective().coefficients() {
            if let Some(idx) = problem.variables().get_index_of(&variable) {
                q[idx] += sign * coef;
            }
        }

        let mut cones: Vec<SupportedConeT<f64>> = Vec::new();
        if n_zero > 0 {
            cones.push(SupportedConeT::ZeroConeT(n_zero));
        }
        if n_nonneg > 0 {
            cones.push(SupportedConeT::NonnegativeConeT(n_nonneg));
        }

        let settings = DefaultSettingsBuilder::default()
            .verbose(false)
            .tol_feas(self.tolerance)
            .tol_gap_abs(self.tolerance)
            .tol_gap_rel(self.tolerance)
            .build()
            .map_err(|e| SolverError::Setup(e.to_string()))?;

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = match solver.solution.status {
            SolverStatus::Solved => OptimizationStatus::Optimal,
            SolverStatus::AlmostSolved => OptimizationStatus::AlmostOptimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                OptimizationStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                OptimizationStatus::Unbounded
            }
            SolverStatus::MaxIterations
            | SolverStatus::MaxTime
            | SolverStatus::InsufficientProgress => OptimizationStatus::SolverHalted,
            SolverStatus::NumericalError => OptimizationStatus::NumericalError,
            other => {
                warn!("Unexpected Clarabel status {other:?}");
                OptimizationStatus::NumericalError
            }
        };
        if !status.is_success() {
            return Ok(ProblemSolution::failed(status));
        }

        let variable_values: IndexMap<String, f64> = problem
            .variables()
            .keys()
            .cloned()
            .zip(solver.solution.x.iter().copied())
            .collect();
        Ok(ProblemSolution {
            status,
            objective_value: Some(problem.objective().value(&variable_values)),
            variable_values: Some(variable_values),
        })
    }
}
