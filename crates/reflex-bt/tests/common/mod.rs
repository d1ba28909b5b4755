#![allow(dead_code)]

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use reflex_bt::{prototype, Children, NodeBehavior, NodeFactory, NodeState};
use reflex_core::{TickContext, WorldMut, WorldView};

pub type Journal = Rc<RefCell<Vec<String>>>;

/// World whose knobs let a test script what each probe does next tick.
#[derive(Debug, Default)]
pub struct TestWorld {
    /// Result a leaf probe reports from `on_update` (default `Success`).
    pub outcomes: BTreeMap<&'static str, NodeState>,
    /// Probes whose guard reports a missing capability.
    pub missing: BTreeSet<&'static str>,
}

impl WorldView for TestWorld {
    type Agent = u64;
}

impl WorldMut for TestWorld {}

impl TestWorld {
    pub fn set(&mut self, name: &'static str, state: NodeState) {
        self.outcomes.insert(name, state);
    }
}

/// Records every hook into a shared journal as `hook:name`.
#[derive(Clone)]
pub struct Probe {
    name: &'static str,
    journal: Journal,
    forward: bool,
}

impl Probe {
    pub fn leaf(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            journal: journal.clone(),
            forward: false,
        }
    }

    /// Pulls one child through `get_child` per update and reports its state.
    pub fn forwarding(name: &'static str, journal: &Journal) -> Self {
        Self {
            forward: true,
            ..Self::leaf(name, journal)
        }
    }

    fn record(&self, hook: &str) {
        self.journal
            .borrow_mut()
            .push(format!("{hook}:{}", self.name));
    }
}

impl NodeBehavior<TestWorld> for Probe {
    fn on_awake(&mut self, _agent: u64, _world: &mut TestWorld) {
        self.record("awake");
    }

    fn on_start(&mut self, _ctx: &TickContext, _agent: u64, _world: &mut TestWorld) {
        self.record("start");
    }

    fn try_failure(
        &self,
        _ctx: &TickContext,
        _agent: u64,
        world: &TestWorld,
    ) -> Option<Cow<'static, str>> {
        if world.missing.contains(self.name) {
            self.record("guard");
            return Some(Cow::Borrowed("missing capability `movement`"));
        }
        None
    }

    fn on_update(
        &mut self,
        ctx: &TickContext,
        _agent: u64,
        world: &mut TestWorld,
        children: &mut Children<'_, TestWorld>,
    ) -> NodeState {
        self.record("update");
        if self.forward {
            return match children.get_child() {
                Some(child) => child.do_update(ctx, world),
                None => NodeState::Failure,
            };
        }
        world
            .outcomes
            .get(self.name)
            .copied()
            .unwrap_or(NodeState::Success)
    }

    fn on_stop(&mut self, _ctx: &TickContext, _agent: u64, _world: &mut TestWorld) {
        self.record("stop");
    }

    fn on_dispose(&mut self) {
        self.record("dispose");
    }
}

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn probe(name: &'static str, journal: &Journal) -> impl NodeFactory<TestWorld> {
    prototype(Probe::leaf(name, journal))
}

pub fn forwarding(name: &'static str, journal: &Journal) -> impl NodeFactory<TestWorld> {
    prototype(Probe::forwarding(name, journal))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.borrow().clone()
}

pub fn count(journal: &Journal, entry: &str) -> usize {
    journal.borrow().iter().filter(|e| e.as_str() == entry).count()
}

pub fn ctx(tick: u64) -> TickContext {
    TickContext {
        tick,
        dt_seconds: 0.1,
    }
}
