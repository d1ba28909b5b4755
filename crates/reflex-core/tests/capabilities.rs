use std::collections::BTreeMap;

use reflex_core::{
    Capabilities, CapabilityError, CapabilityKey, CapabilityLookup, TickContext, WorldMut,
    WorldView,
};

#[derive(Debug, PartialEq)]
struct Movement {
    speed: f32,
}

const MOVEMENT: CapabilityKey<Movement> = CapabilityKey::new(1, "movement");
const TARGETING: CapabilityKey<u64> = CapabilityKey::new(2, "targeting");

#[derive(Default)]
struct TestWorld {
    agents: BTreeMap<u64, Capabilities>,
}

impl WorldView for TestWorld {
    type Agent = u64;
}

impl WorldMut for TestWorld {}

impl CapabilityLookup for TestWorld {
    fn capabilities(&self, agent: u64) -> Option<&Capabilities> {
        self.agents.get(&agent)
    }
}

#[test]
fn capabilities_insert_get_remove() {
    let mut caps = Capabilities::new();
    assert!(!caps.contains(MOVEMENT));

    caps.insert(MOVEMENT, Movement { speed: 3.0 });
    caps.insert(TARGETING, 42);

    assert_eq!(caps.get(MOVEMENT), Some(&Movement { speed: 3.0 }));
    assert_eq!(caps.get(TARGETING).copied(), Some(42));
    assert_eq!(caps.len(), 2);

    if let Some(m) = caps.get_mut(MOVEMENT) {
        m.speed = 5.0;
    }
    assert_eq!(caps.remove(MOVEMENT), Some(Movement { speed: 5.0 }));
    assert!(caps.get(MOVEMENT).is_none());
}

#[test]
fn require_reports_missing_and_mismatched_types() {
    let caps = Capabilities::new().with(CapabilityKey::<u32>::new(1, "movement"), 7u32);

    let err = caps.require(MOVEMENT).unwrap_err();
    assert_eq!(
        err,
        CapabilityError::TypeMismatch {
            id: 1,
            name: "movement"
        }
    );

    let err = caps.require(TARGETING).unwrap_err();
    assert_eq!(err.to_string(), "missing capability `targeting` (id=2)");

    // A mismatched entry is never removed under the wrong type.
    let mut caps = caps;
    assert!(caps.remove(MOVEMENT).is_none());
    assert_eq!(caps.len(), 1);
}

#[test]
fn world_lookup_resolves_per_agent() {
    let mut world = TestWorld::default();
    world
        .agents
        .insert(1, Capabilities::new().with(MOVEMENT, Movement { speed: 1.5 }));

    assert_eq!(world.capability(1, MOVEMENT).map(|m| m.speed), Some(1.5));
    assert!(world.capability(2, MOVEMENT).is_none());
    assert!(matches!(
        world.require_capability(2, TARGETING),
        Err(CapabilityError::Missing { id: 2, .. })
    ));
}

#[test]
fn tick_context_advances() {
    let ctx = TickContext::new(9, 0.5).next();
    assert_eq!(ctx.tick, 10);
    assert_eq!(ctx.dt_seconds, 0.5);
}

#[test]
fn agents_stagger_within_period() {
    use reflex_core::AgentId;

    assert_eq!(7u64.stagger(3), 1);
    assert_eq!(9u32.stagger(3), 0);
    assert_eq!(5usize.stagger(0), 0);
    assert_eq!(11u16.stable_id(), 11);
}
