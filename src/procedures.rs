//! Procedure combinators (C10): `OneShot`, `Wait`, `BoolWaiter`, `Sequential`,
//! `Parallel`, `ParallelRace`, `ParallelDeadline`, `Selector`, and
//! `EStopSetterWrapper`. All combinators own their children exclusively — a tree,
//! never shared, never cyclic — and drop the subtree recursively when dropped.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::Cell;
use alloc::rc::Rc;

/// A step, or composite of steps, in a test or ESTOP sequence.
///
/// Every method has a sensible default matching the original base class: doing
/// nothing, and reporting itself finished immediately (so a bare `OneShot` that
/// only overrides `initialize` behaves correctly without restating `is_finished`).
pub trait Procedure {
    fn initialize(&mut self) {}
    fn execute(&mut self) {}
    fn end(&mut self, _interrupted: bool) {}
    fn is_finished(&mut self) -> bool {
        true
    }
}

type BoxProc = Box<dyn Procedure>;

/// Runs `run` once on `initialize`; finished immediately (the base default).
pub struct OneShot<F: FnMut()> {
    run: F,
}

impl<F: FnMut()> OneShot<F> {
    pub fn new(run: F) -> Self {
        Self { run }
    }
}

impl<F: FnMut()> Procedure for OneShot<F> {
    fn initialize(&mut self) {
        (self.run)();
    }
}

/// Finished once `wait_ms` milliseconds have elapsed since `initialize`.
pub struct Wait<C> {
    wait_ms: u32,
    start_ms: u32,
    now: C,
}

impl<C: FnMut() -> u32> Wait<C> {
    pub fn new(wait_ms: u32, now: C) -> Self {
        Self { wait_ms, start_ms: 0, now }
    }
}

impl<C: FnMut() -> u32> Procedure for Wait<C> {
    fn initialize(&mut self) {
        self.start_ms = (self.now)();
    }

    fn is_finished(&mut self) -> bool {
        (self.now)().wrapping_sub(self.start_ms) > self.wait_ms
    }
}

/// Finished exactly when `supplier` returns true.
pub struct BoolWaiter<F: FnMut() -> bool> {
    supplier: F,
}

impl<F: FnMut() -> bool> BoolWaiter<F> {
    pub fn new(supplier: F) -> Self {
        Self { supplier }
    }
}

impl<F: FnMut() -> bool> Procedure for BoolWaiter<F> {
    fn is_finished(&mut self) -> bool {
        (self.supplier)()
    }
}

/// Runs child procedures one after another.
pub struct Sequential {
    procedures: Vec<BoxProc>,
    current: usize,
}

impl Sequential {
    pub fn new(procedures: Vec<BoxProc>) -> Self {
        Self { procedures, current: 0 }
    }
}

impl Procedure for Sequential {
    fn initialize(&mut self) {
        self.current = 0;
        if let Some(p) = self.procedures.get_mut(self.current) {
            p.initialize();
        }
    }

    fn execute(&mut self) {
        let Some(p) = self.procedures.get_mut(self.current) else {
            return;
        };
        p.execute();
        if p.is_finished() {
            p.end(false);
            self.current += 1;
            if let Some(next) = self.procedures.get_mut(self.current) {
                next.initialize();
            }
        }
    }

    fn end(&mut self, interrupted: bool) {
        // Matches the original source: a non-interrupted `end` does NOT forward to
        // the still-active child (the child already ended itself in `execute`).
        if interrupted {
            if let Some(p) = self.procedures.get_mut(self.current) {
                p.end(true);
            }
        }
    }

    fn is_finished(&mut self) -> bool {
        self.current >= self.procedures.len()
    }
}

/// Runs all child procedures concurrently; finished when none are still running.
pub struct Parallel {
    procedures: Vec<BoxProc>,
    running: Vec<bool>,
}

impl Parallel {
    pub fn new(procedures: Vec<BoxProc>) -> Self {
        let running = alloc::vec![true; procedures.len()];
        Self { procedures, running }
    }
}

impl Procedure for Parallel {
    fn initialize(&mut self) {
        for (p, r) in self.procedures.iter_mut().zip(self.running.iter_mut()) {
            p.initialize();
            *r = true;
        }
    }

    fn execute(&mut self) {
        for (p, r) in self.procedures.iter_mut().zip(self.running.iter_mut()) {
            if !*r {
                continue;
            }
            p.execute();
            if p.is_finished() {
                p.end(false);
                *r = false;
            }
        }
    }

    fn end(&mut self, interrupted: bool) {
        if !interrupted {
            return;
        }
        for (p, r) in self.procedures.iter_mut().zip(self.running.iter_mut()) {
            if !*r {
                continue;
            }
            p.end(true);
            *r = false;
        }
    }

    fn is_finished(&mut self) -> bool {
        self.running.iter().all(|r| !r)
    }
}

/// Like [`Parallel`], but finished as soon as any one child finishes; the rest are
/// force-ended with `interrupted=true`.
pub struct ParallelRace {
    inner: Parallel,
}

impl ParallelRace {
    pub fn new(procedures: Vec<BoxProc>) -> Self {
        Self { inner: Parallel::new(procedures) }
    }
}

impl Procedure for ParallelRace {
    fn initialize(&mut self) {
        self.inner.initialize();
    }

    fn execute(&mut self) {
        self.inner.execute();
    }

    fn is_finished(&mut self) -> bool {
        self.inner.running.iter().any(|r| !r)
    }

    fn end(&mut self, _interrupted: bool) {
        for (p, r) in self.inner.procedures.iter_mut().zip(self.inner.running.iter_mut()) {
            if !*r {
                continue;
            }
            p.end(true);
            *r = false;
        }
    }
}

/// Runs child procedures concurrently with a deadline procedure; finished when the
/// deadline finishes, at which point the still-running children are ended.
pub struct ParallelDeadline {
    deadline: BoxProc,
    deadline_running: bool,
    procedures: Vec<BoxProc>,
    running: Vec<bool>,
}

impl ParallelDeadline {
    pub fn new(deadline: BoxProc, procedures: Vec<BoxProc>) -> Self {
        let running = alloc::vec![true; procedures.len()];
        Self {
            deadline,
            deadline_running: true,
            procedures,
            running,
        }
    }
}

impl Procedure for ParallelDeadline {
    fn initialize(&mut self) {
        self.deadline_running = true;
        self.deadline.initialize();
        for (p, r) in self.procedures.iter_mut().zip(self.running.iter_mut()) {
            p.initialize();
            *r = true;
        }
    }

    fn execute(&mut self) {
        if self.deadline_running {
            self.deadline.execute();
            if self.deadline.is_finished() {
                self.deadline.end(false);
                // A finished deadline ends the compound: see the design notes for
                // why this is `false`, not `true` (the original source's bug).
                self.deadline_running = false;
            }
        }

        for (p, r) in self.procedures.iter_mut().zip(self.running.iter_mut()) {
            if !*r {
                continue;
            }
            p.execute();
            if p.is_finished() {
                p.end(false);
                *r = false;
            }
        }
    }

    fn end(&mut self, _interrupted: bool) {
        if self.deadline_running {
            self.deadline.end(true);
        }
        for (p, r) in self.procedures.iter_mut().zip(self.running.iter_mut()) {
            if !*r {
                continue;
            }
            p.end(true);
        }
    }

    fn is_finished(&mut self) -> bool {
        !self.deadline_running
    }
}

/// Chooses between two branches once, at `initialize`, and forwards every
/// subsequent call to the chosen branch only.
pub struct Selector<F: FnMut() -> bool> {
    yes: BoxProc,
    no: BoxProc,
    chooser: F,
    choice: bool,
}

impl<F: FnMut() -> bool> Selector<F> {
    pub fn new(yes: BoxProc, no: BoxProc, chooser: F) -> Self {
        Self { yes, no, chooser, choice: true }
    }

    fn active(&mut self) -> &mut BoxProc {
        if self.choice {
            &mut self.yes
        } else {
            &mut self.no
        }
    }
}

impl<F: FnMut() -> bool> Procedure for Selector<F> {
    fn initialize(&mut self) {
        self.choice = (self.chooser)();
        self.active().initialize();
    }

    fn execute(&mut self) {
        self.active().execute();
    }

    fn is_finished(&mut self) -> bool {
        self.active().is_finished()
    }

    fn end(&mut self, interrupted: bool) {
        self.active().end(interrupted);
    }
}

/// A handle identifying one of the ESTOP procedures the engine (C9) knows about.
/// `EStopSetterWrapper` doesn't own the ESTOP procedure it switches in — in the
/// original source that's a raw global pointer to an externally-owned procedure —
/// so here it trades a slot id through a shared cell instead of holding (or
/// aliasing) a second owned copy of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EstopProcId(pub u8);

/// The shared cell an [`EStopSetterWrapper`] writes into, and the ESTOP engine (C9)
/// reads from, to know which registered ESTOP procedure is currently active.
pub type ActiveEstopSlot = Rc<Cell<Option<EstopProcId>>>;

/// Wraps `inner`; on `initialize`, runs `inner.initialize()` then registers
/// `seq_estop` as the active ESTOP procedure; on `end`, forwards to `inner` then
/// registers `end_estop`. Scopes which ESTOP sequence is active while `inner` runs.
pub struct EStopSetterWrapper {
    inner: BoxProc,
    seq_estop: EstopProcId,
    end_estop: EstopProcId,
    active_slot: ActiveEstopSlot,
}

impl EStopSetterWrapper {
    pub fn new(inner: BoxProc, seq_estop: EstopProcId, end_estop: EstopProcId, active_slot: ActiveEstopSlot) -> Self {
        Self { inner, seq_estop, end_estop, active_slot }
    }
}

impl Procedure for EStopSetterWrapper {
    fn initialize(&mut self) {
        self.inner.initialize();
        self.active_slot.set(Some(self.seq_estop));
    }

    fn execute(&mut self) {
        self.inner.execute();
    }

    fn is_finished(&mut self) -> bool {
        self.inner.is_finished()
    }

    fn end(&mut self, interrupted: bool) {
        self.inner.end(interrupted);
        self.active_slot.set(Some(self.end_estop));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc as StdRc;
    use std::vec::Vec as StdVec;

    /// A procedure that logs each lifecycle call (tagged by `name`) into a shared
    /// log, and finishes after `finished_after` ticks of `execute`.
    struct Logged {
        name: &'static str,
        finished_after: u32,
        ticks: u32,
        log: StdRc<RefCell<StdVec<std::string::String>>>,
    }

    impl Logged {
        fn new(name: &'static str, finished_after: u32, log: &StdRc<RefCell<StdVec<std::string::String>>>) -> BoxProc {
            Box::new(Self { name, finished_after, ticks: 0, log: log.clone() })
        }
    }

    impl Procedure for Logged {
        fn initialize(&mut self) {
            self.ticks = 0;
            self.log.borrow_mut().push(std::format!("{}:init", self.name));
        }

        fn execute(&mut self) {
            self.ticks += 1;
            self.log.borrow_mut().push(std::format!("{}:exec", self.name));
        }

        fn is_finished(&mut self) -> bool {
            self.ticks >= self.finished_after
        }

        fn end(&mut self, interrupted: bool) {
            self.log
                .borrow_mut()
                .push(std::format!("{}:end({})", self.name, interrupted));
        }
    }

    #[test]
    fn one_shot_runs_once_and_is_immediately_finished() {
        let mut ran = false;
        let mut os = OneShot::new(|| ran = true);
        os.initialize();
        assert!(ran);
        assert!(os.is_finished());
    }

    #[test]
    fn wait_finishes_strictly_after_the_window() {
        let mut now = 0u32;
        let mut w = Wait::new(10, || now);
        w.initialize();
        now = 10;
        assert!(!w.is_finished());
        now = 11;
        assert!(w.is_finished());
    }

    #[test]
    fn bool_waiter_follows_the_supplier() {
        let mut flag = false;
        let mut bw = BoolWaiter::new(|| flag);
        assert!(!bw.is_finished());
        flag = true;
        assert!(bw.is_finished());
    }

    #[test]
    fn sequential_runs_children_in_order_and_inits_the_next_on_finish() {
        let log = StdRc::new(RefCell::new(StdVec::new()));
        let mut seq = Sequential::new(alloc::vec![Logged::new("a", 1, &log), Logged::new("b", 1, &log)]);
        seq.initialize();
        seq.execute(); // a finishes, b inits
        assert!(!seq.is_finished());
        seq.execute(); // b finishes
        assert!(seq.is_finished());
        assert_eq!(
            *log.borrow(),
            std::vec![
                "a:init", "a:exec", "a:end(false)", "b:init", "b:exec", "b:end(false)"
            ]
        );
    }

    #[test]
    fn sequential_end_interrupted_forwards_only_when_interrupted() {
        let log = StdRc::new(RefCell::new(StdVec::new()));
        let mut seq = Sequential::new(alloc::vec![Logged::new("a", 5, &log)]);
        seq.initialize();
        seq.end(false);
        assert!(!log.borrow().iter().any(|e| e.starts_with("a:end")));
        seq.end(true);
        assert_eq!(log.borrow().last().unwrap(), "a:end(true)");
    }

    #[test]
    fn parallel_finishes_when_all_children_finish() {
        let log = StdRc::new(RefCell::new(StdVec::new()));
        let mut p = Parallel::new(alloc::vec![Logged::new("a", 1, &log), Logged::new("b", 2, &log)]);
        p.initialize();
        p.execute();
        assert!(!p.is_finished()); // b still running
        p.execute();
        assert!(p.is_finished());
    }

    #[test]
    fn parallel_race_finishes_on_first_child_and_interrupts_the_rest() {
        let log = StdRc::new(RefCell::new(StdVec::new()));
        let mut race = ParallelRace::new(alloc::vec![Logged::new("fast", 1, &log), Logged::new("slow", 10, &log)]);
        race.initialize();
        race.execute();
        assert!(race.is_finished());
        race.end(false);
        assert!(log.borrow().iter().any(|e| e == "slow:end(true)"));
    }

    #[test]
    fn parallel_deadline_ends_children_when_deadline_finishes() {
        let log = StdRc::new(RefCell::new(StdVec::new()));
        let deadline = Logged::new("deadline", 1, &log);
        let mut pd = ParallelDeadline::new(deadline, alloc::vec![Logged::new("child", 100, &log)]);
        pd.initialize();
        pd.execute();
        assert!(pd.is_finished());
        pd.end(false);
        assert!(log.borrow().iter().any(|e| e == "child:end(true)"));
    }

    #[test]
    fn selector_forwards_only_to_chosen_branch() {
        let log = StdRc::new(RefCell::new(StdVec::new()));
        let yes = Logged::new("yes", 1, &log);
        let no = Logged::new("no", 1, &log);
        let mut sel = Selector::new(yes, no, || false);
        sel.initialize();
        sel.execute();
        assert!(sel.is_finished());
        assert!(!log.borrow().iter().any(|e| e.starts_with("yes")));
        assert!(log.borrow().iter().any(|e| e == "no:init"));
    }

    #[test]
    fn estop_setter_wrapper_registers_seq_then_end_estop() {
        let slot: ActiveEstopSlot = Rc::new(Cell::new(None));
        let log = StdRc::new(RefCell::new(StdVec::new()));
        let inner = Logged::new("inner", 1, &log);
        let mut wrapper = EStopSetterWrapper::new(inner, EstopProcId(1), EstopProcId(2), slot.clone());
        wrapper.initialize();
        assert_eq!(slot.get(), Some(EstopProcId(1)));
        wrapper.end(false);
        assert_eq!(slot.get(), Some(EstopProcId(2)));
    }
}
