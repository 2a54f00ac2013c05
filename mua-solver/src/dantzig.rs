use crate::Approximator;
use mua_core::models::{Agent, AgentId, Allocation};
use mua_core::ports::AuctionLog;
use mua_core::{EPSILON, Map};

/// The result of one simplex pivot attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pivot {
    /// A column entered the basis; the named allocation replaced the
    /// variable previously basic in `leaving_row`.
    Pivoted {
        /// The registry name of the entering allocation.
        entering: String,
        /// The tableau row that left the basis.
        leaving_row: usize,
    },
    /// The oracle's best response no longer prices out; the tableau is
    /// optimal.
    Converged,
    /// No positive pivot ratio exists for the entering column.
    Stalled,
}

/// Manual Dantzig-Wolfe pivoting over the same cut structure the master
/// LP uses, as a from-scratch cross-check of the decomposition.
///
/// Each [`step`](DantzigWolfeSolver::step) is pure in the sense that it
/// consumes no input and returns the pivot outcome; a harness drives the
/// loop. Pedagogical only, not a second production path.
pub struct DantzigWolfeSolver<'a, A, L> {
    agents: Vec<&'a Agent>,
    approximator: A,
    log: L,
    /// Inverse-basis rows, one per structural constraint.
    base: Vec<Vec<f64>>,
    /// Current right-hand side per row.
    b: Vec<f64>,
    /// Dual row; the last cell accumulates the (negated) objective.
    z: Vec<f64>,
    row_names: Vec<String>,
    allocations: Map<String, Allocation>,
}

impl<'a, A, L> DantzigWolfeSolver<'a, A, L>
where
    A: Approximator,
    L: AuctionLog,
{
    /// Sets up the initial slack basis for the given economy.
    pub fn new(
        supply: u32,
        agents: impl IntoIterator<Item = &'a Agent>,
        approximator: A,
        log: L,
    ) -> Self {
        let agents: Vec<&'a Agent> = agents.into_iter().collect();
        let n = agents.len();
        let rows = n + 2;

        let base = (0..rows)
            .map(|i| (0..rows).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();

        let gap = approximator.gap();
        let mut b = vec![1.0 / gap; n];
        b.push(supply as f64 / gap);
        b.push(1.0);

        let row_names = (0..n)
            .map(|i| format!("s{i}"))
            .chain(["p".to_owned(), "l0".to_owned()])
            .collect();

        let mut allocations = Map::default();
        allocations.insert("l0".to_owned(), Allocation::empty());

        Self {
            agents,
            approximator,
            log,
            base,
            b,
            z: vec![0.0; rows + 1],
            row_names,
            allocations,
        }
    }

    /// The current per-item price (non-negative).
    pub fn price(&self) -> f64 {
        (-self.z[self.agents.len()]).max(0.0)
    }

    /// The current per-agent utilities (non-negative).
    pub fn utilities(&self) -> Map<AgentId, f64> {
        self.agents
            .iter()
            .enumerate()
            .map(|(i, agent)| (agent.id(), (-self.z[i]).max(0.0)))
            .collect()
    }

    /// The objective value accumulated by the pivots so far.
    pub fn objective(&self) -> f64 {
        -self.z[self.z.len() - 1]
    }

    /// The registered allocations, keyed by their column names.
    pub fn allocations(&self) -> &Map<String, Allocation> {
        &self.allocations
    }

    /// Asks the oracle for an entering column and performs one pivot.
    pub fn step(&mut self) -> Pivot {
        let allocation = self
            .approximator
            .approximate(self.price(), &self.utilities());

        // Reduced cost of the entering column: the allocation's welfare at
        // the current duals.
        let utilities = self.utilities();
        let reduced_cost = allocation.welfare()
            - allocation.quantity_assigned() * self.price()
            - self
                .agents
                .iter()
                .filter(|agent| allocation.includes(agent.id()))
                .map(|agent| utilities[&agent.id()])
                .sum::<f64>();
        if reduced_cost <= EPSILON {
            self.log.log("no improving column; tableau is optimal");
            return Pivot::Converged;
        }

        // A * X_j for the entering allocation.
        let n = self.agents.len();
        let mut column = vec![0.0; n + 2];
        for (i, agent) in self.agents.iter().enumerate() {
            if allocation.includes(agent.id()) {
                column[i] = 1.0;
            }
        }
        column[n] = allocation.quantity_assigned();
        column[n + 1] = 1.0;

        // Express the column in the current basis.
        let y: Vec<f64> = self
            .base
            .iter()
            .map(|row| row.iter().zip(&column).map(|(r, c)| r * c).sum())
            .collect();

        // Ratio test for the leaving row.
        let Some(leaving_row) = (0..y.len())
            .filter(|&i| y[i] > 0.0)
            .min_by(|&i, &j| {
                (self.b[i] / y[i])
                    .partial_cmp(&(self.b[j] / y[j]))
                    .expect("finite ratios")
            })
        else {
            self.log.log("entering column has no positive ratio");
            return Pivot::Stalled;
        };

        // Normalize the pivot row, then eliminate the column elsewhere.
        let pivot = y[leaving_row];
        for value in self.base[leaving_row].iter_mut() {
            *value /= pivot;
        }
        self.b[leaving_row] /= pivot;
        let pivot_row = self.base[leaving_row].clone();
        let pivot_b = self.b[leaving_row];
        for (i, factor) in y.iter().enumerate() {
            if i == leaving_row {
                continue;
            }
            for (cell, p) in self.base[i].iter_mut().zip(&pivot_row) {
                *cell -= factor * p;
            }
            self.b[i] -= factor * pivot_b;
        }
        for (cell, p) in self
            .z
            .iter_mut()
            .zip(pivot_row.iter().chain(std::iter::once(&pivot_b)))
        {
            *cell -= reduced_cost * p;
        }

        let entering = format!("l{}", self.allocations.len());
        self.log.log(&format!(
            "pivot: {entering} enters, {} leaves (ratio row {leaving_row})",
            self.row_names[leaving_row]
        ));
        self.row_names[leaving_row] = entering.clone();
        self.allocations.insert(entering.clone(), allocation);

        Pivot::Pivoted {
            entering,
            leaving_row,
        }
    }
}
