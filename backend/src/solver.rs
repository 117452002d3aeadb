// backend/src/solver.rs
//
// Step-wise CDCL solver. `step()` runs propagation and decisions until exactly one conflict,
// learns from it and returns, so the caller can report progress between conflicts.
//
//  - two watched literals per clause; watches[l] lists the clauses currently watching l
//  - first-UIP learning, learned clauses are never deleted
//  - VSIDS-style activity with decay, decisions taken from a max-heap on activity, saved phases

use crate::dimacs::Cnf;
use std::ops::Not;

const VAR_DECAY: f64 = 0.95;
const RESCALE_LIMIT: f64 = 1e100;

/// Literal encoded as `var * 2 + negative`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lit(u32);

impl Lit {
    pub fn new(var: usize, negative: bool) -> Self {
        debug_assert!(var <= (u32::MAX >> 1) as usize, "variable {var} does not fit a literal");
        Lit((var as u32) << 1 | negative as u32)
    }

    /// DIMACS literal (1-based, sign = polarity). Must not be 0.
    pub fn from_dimacs(n: i64) -> Self {
        Lit::new(n.unsigned_abs() as usize - 1, n < 0)
    }

    pub fn var(self) -> usize {
        (self.0 >> 1) as usize
    }

    pub fn is_negative(self) -> bool {
        self.0 & 1 == 1
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Lit(self.0 ^ 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LBool {
    True,
    False,
    Undef,
}

#[derive(Debug, Clone)]
struct Clause {
    lits: Vec<Lit>,
}

/// Binary max-heap of variables keyed on activity; ties go to the lower index.
/// `pos[v]` is the slot of `v` in `heap`, `None` when absent.
#[derive(Debug, Default)]
struct VarOrder {
    heap: Vec<usize>,
    pos: Vec<Option<usize>>,
}

impl VarOrder {
    fn grow(&mut self, n: usize) {
        if n > self.pos.len() {
            self.pos.resize(n, None);
        }
    }

    fn contains(&self, v: usize) -> bool {
        self.pos[v].is_some()
    }

    fn insert(&mut self, v: usize, activity: &[f64]) {
        if self.contains(v) {
            return;
        }
        self.pos[v] = Some(self.heap.len());
        self.heap.push(v);
        self.sift_up(self.heap.len() - 1, activity);
    }

    /// Restore heap order after `v`'s activity went up.
    fn bumped(&mut self, v: usize, activity: &[f64]) {
        if let Some(i) = self.pos[v] {
            self.sift_up(i, activity);
        }
    }

    fn pop_max(&mut self, activity: &[f64]) -> Option<usize> {
        if self.heap.is_empty() {
            return None;
        }
        let top = self.heap.swap_remove(0);
        self.pos[top] = None;
        if let Some(&moved) = self.heap.first() {
            self.pos[moved] = Some(0);
            self.sift_down(0, activity);
        }
        Some(top)
    }

    fn before(a: usize, b: usize, activity: &[f64]) -> bool {
        activity[a] > activity[b] || (activity[a] == activity[b] && a < b)
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        self.pos[self.heap[i]] = Some(i);
        self.pos[self.heap[j]] = Some(j);
    }

    fn sift_up(&mut self, mut i: usize, activity: &[f64]) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !Self::before(self.heap[i], self.heap[parent], activity) {
                break;
            }
            self.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize, activity: &[f64]) {
        loop {
            let mut best = i;
            for child in [2 * i + 1, 2 * i + 2] {
                if child < self.heap.len() && Self::before(self.heap[child], self.heap[best], activity) {
                    best = child;
                }
            }
            if best == i {
                break;
            }
            self.swap(i, best);
            i = best;
        }
    }
}

#[derive(Debug, Default)]
pub struct Solver {
    clauses: Vec<Clause>,
    watches: Vec<Vec<usize>>,
    assigns: Vec<LBool>,
    level: Vec<usize>,
    reason: Vec<Option<usize>>,
    polarity: Vec<bool>,
    activity: Vec<f64>,
    order: VarOrder,
    var_inc: f64,
    trail: Vec<Lit>,
    trail_lim: Vec<usize>,
    qhead: usize,
    num_learnts: usize,
    /// False once the formula is known to be unsatisfiable.
    ok: bool,
}

impl Solver {
    pub fn new() -> Self {
        Self {
            var_inc: 1.0,
            ok: true,
            ..Default::default()
        }
    }

    pub fn from_cnf(cnf: &Cnf) -> Self {
        let mut s = Solver::new();
        s.ensure_vars(cnf.num_vars);
        for clause in &cnf.clauses {
            if !s.add_clause(clause) {
                break;
            }
        }
        s
    }

    pub fn num_vars(&self) -> usize {
        self.assigns.len()
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len() - self.num_learnts
    }

    pub fn num_learnts(&self) -> usize {
        self.num_learnts
    }

    pub fn trail_size(&self) -> usize {
        self.trail.len()
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn value(&self, var: usize) -> LBool {
        self.assigns.get(var).copied().unwrap_or(LBool::Undef)
    }

    fn value_lit(&self, lit: Lit) -> LBool {
        match self.assigns[lit.var()] {
            LBool::Undef => LBool::Undef,
            LBool::True if lit.is_negative() => LBool::False,
            LBool::False if lit.is_negative() => LBool::True,
            v => v,
        }
    }

    fn decision_level(&self) -> usize {
        self.trail_lim.len()
    }

    fn ensure_vars(&mut self, n: usize) {
        let old = self.assigns.len();
        if n <= old {
            return;
        }
        self.assigns.resize(n, LBool::Undef);
        self.level.resize(n, 0);
        self.reason.resize(n, None);
        self.polarity.resize(n, true);
        self.activity.resize(n, 0.0);
        self.watches.resize(n * 2, Vec::new());
        self.order.grow(n);
        for v in old..n {
            self.order.insert(v, &self.activity);
        }
    }

    /// Add a clause at decision level 0. Returns `false` once the formula became trivially
    /// unsatisfiable.
    pub fn add_clause(&mut self, lits: &[Lit]) -> bool {
        if !self.ok {
            return false;
        }
        debug_assert_eq!(self.decision_level(), 0);

        if let Some(max_var) = lits.iter().map(|l| l.var()).max() {
            self.ensure_vars(max_var + 1);
        }

        let mut ps = lits.to_vec();
        ps.sort();
        ps.dedup();

        let mut kept = Vec::with_capacity(ps.len());
        for (i, &l) in ps.iter().enumerate() {
            // sorted, so l and !l are neighbours
            if self.value_lit(l) == LBool::True || (i > 0 && ps[i - 1] == !l) {
                return true;
            }
            if self.value_lit(l) != LBool::False {
                kept.push(l);
            }
        }

        match kept.len() {
            0 => {
                self.ok = false;
            }
            1 => {
                self.enqueue(kept[0], None);
                if self.propagate().is_some() {
                    self.ok = false;
                }
            }
            _ => {
                self.attach(kept, false);
            }
        }
        self.ok
    }

    /// Top-level propagation. `false` means the formula is unsatisfiable.
    pub fn simplify(&mut self) -> bool {
        if self.ok && self.propagate().is_some() {
            self.ok = false;
        }
        self.ok
    }

    /// Run until the next conflict and learn from it.
    ///
    /// Returns `false` without learning when every variable got assigned (a model is on the
    /// trail) or when the conflict happened at level 0 (unsatisfiable).
    pub fn step(&mut self) -> bool {
        if !self.ok {
            return false;
        }

        let conflict = loop {
            if let Some(ci) = self.propagate() {
                break ci;
            }
            let Some(next) = self.pick_branch_lit() else {
                return false;
            };
            self.trail_lim.push(self.trail.len());
            self.enqueue(next, None);
        };

        if self.decision_level() == 0 {
            self.ok = false;
            return false;
        }

        let (learnt, backtrack_level) = self.analyze(conflict);
        self.cancel_until(backtrack_level);

        let asserting = learnt[0];
        if learnt.len() == 1 {
            self.enqueue(asserting, None);
        } else {
            let ci = self.attach(learnt, true);
            self.enqueue(asserting, Some(ci));
        }

        self.var_inc /= VAR_DECAY;
        true
    }

    /// Undo every decision.
    pub fn backtrack(&mut self) {
        self.cancel_until(0);
    }

    fn attach(&mut self, lits: Vec<Lit>, learnt: bool) -> usize {
        let ci = self.clauses.len();
        self.watches[lits[0].index()].push(ci);
        self.watches[lits[1].index()].push(ci);
        self.clauses.push(Clause { lits });
        if learnt {
            self.num_learnts += 1;
        }
        ci
    }

    fn enqueue(&mut self, lit: Lit, reason: Option<usize>) {
        let v = lit.var();
        self.assigns[v] = if lit.is_negative() {
            LBool::False
        } else {
            LBool::True
        };
        self.level[v] = self.decision_level();
        self.reason[v] = reason;
        self.trail.push(lit);
    }

    fn propagate(&mut self) -> Option<usize> {
        while self.qhead < self.trail.len() {
            let p = self.trail[self.qhead];
            self.qhead += 1;
            let false_lit = !p;

            let mut ws = std::mem::take(&mut self.watches[false_lit.index()]);
            let mut conflict = None;
            let mut i = 0;

            'clauses: while i < ws.len() {
                let ci = ws[i];

                // keep the falsified watch in slot 1
                if self.clauses[ci].lits[0] == false_lit {
                    self.clauses[ci].lits.swap(0, 1);
                }
                let first = self.clauses[ci].lits[0];
                if self.value_lit(first) == LBool::True {
                    i += 1;
                    continue;
                }

                for k in 2..self.clauses[ci].lits.len() {
                    let candidate = self.clauses[ci].lits[k];
                    if self.value_lit(candidate) != LBool::False {
                        self.clauses[ci].lits.swap(1, k);
                        self.watches[candidate.index()].push(ci);
                        ws.swap_remove(i);
                        continue 'clauses;
                    }
                }

                if self.value_lit(first) == LBool::False {
                    conflict = Some(ci);
                    break;
                }
                self.enqueue(first, Some(ci));
                i += 1;
            }

            self.watches[false_lit.index()] = ws;
            if conflict.is_some() {
                self.qhead = self.trail.len();
                return conflict;
            }
        }
        None
    }

    /// First-UIP analysis. Returns the learned clause (asserting literal first, highest
    /// remaining level second) and the level to backtrack to.
    fn analyze(&mut self, conflict: usize) -> (Vec<Lit>, usize) {
        let mut seen = vec![false; self.num_vars()];
        let mut learnt: Vec<Lit> = vec![Lit(0)];
        let mut path_count = 0usize;
        let mut p: Option<Lit> = None;
        let mut index = self.trail.len();
        let mut reason = Some(conflict);

        while let Some(ci) = reason {
            let skip = usize::from(p.is_some());
            let lits = self.clauses[ci].lits.clone();
            for &q in &lits[skip..] {
                let v = q.var();
                if seen[v] || self.level[v] == 0 {
                    continue;
                }
                self.bump(v);
                seen[v] = true;
                if self.level[v] >= self.decision_level() {
                    path_count += 1;
                } else {
                    learnt.push(q);
                }
            }

            loop {
                index -= 1;
                if seen[self.trail[index].var()] {
                    break;
                }
            }
            let next = self.trail[index];
            seen[next.var()] = false;
            p = Some(next);
            path_count -= 1;
            if path_count == 0 {
                break;
            }
            reason = self.reason[next.var()];
        }

        if let Some(uip) = p {
            learnt[0] = !uip;
        }

        let backtrack_level = if learnt.len() == 1 {
            0
        } else {
            let mut max_i = 1;
            for i in 2..learnt.len() {
                if self.level[learnt[i].var()] > self.level[learnt[max_i].var()] {
                    max_i = i;
                }
            }
            learnt.swap(1, max_i);
            self.level[learnt[1].var()]
        };

        (learnt, backtrack_level)
    }

    fn cancel_until(&mut self, level: usize) {
        if self.decision_level() <= level {
            return;
        }
        let keep = self.trail_lim[level];
        for lit in self.trail.drain(keep..) {
            let v = lit.var();
            self.assigns[v] = LBool::Undef;
            self.reason[v] = None;
            self.polarity[v] = lit.is_negative();
            self.order.insert(v, &self.activity);
        }
        self.trail_lim.truncate(level);
        self.qhead = self.trail.len();
    }

    /// Most active unassigned variable. Assigned ones popped on the way are re-inserted
    /// when backtracking frees them.
    fn pick_branch_lit(&mut self) -> Option<Lit> {
        while let Some(v) = self.order.pop_max(&self.activity) {
            if self.assigns[v] == LBool::Undef {
                return Some(Lit::new(v, self.polarity[v]));
            }
        }
        None
    }

    fn bump(&mut self, v: usize) {
        self.activity[v] += self.var_inc;
        if self.activity[v] > RESCALE_LIMIT {
            for a in &mut self.activity {
                *a *= 1.0 / RESCALE_LIMIT;
            }
            self.var_inc *= 1.0 / RESCALE_LIMIT;
        }
        self.order.bumped(v, &self.activity);
    }

    #[cfg(test)]
    fn satisfies(&self, clauses: &[Vec<Lit>]) -> bool {
        clauses
            .iter()
            .all(|c| c.iter().any(|&l| self.value_lit(l) == LBool::True))
    }
}
