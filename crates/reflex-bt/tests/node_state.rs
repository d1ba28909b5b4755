mod common;

use common::{count, ctx, entries, forwarding, journal, probe, Journal, TestWorld};
use reflex_bt::{DefinitionId, NodeState, Tree, TreeDefinition};

const AGENT: u64 = 7;

/// root -> a
fn single_leaf(j: &Journal) -> Tree<TestWorld> {
    let mut def = TreeDefinition::new(DefinitionId(1), "single");
    let a = def.add_action("a", probe("a", j));
    assert!(def.add_child(def.root(), a));
    Tree::build(&def).unwrap()
}

#[test]
fn fresh_tree_is_running_and_awake_walks_parent_first() {
    let j = journal();
    let mut def = TreeDefinition::new(DefinitionId(2), "nested");
    let outer = def.add_decorator("outer", forwarding("outer", &j));
    let inner = def.add_action("inner", probe("inner", &j));
    assert!(def.add_child(def.root(), outer));
    assert!(def.add_child(outer, inner));

    let mut tree = Tree::build(&def).unwrap();
    let mut world = TestWorld::default();
    assert_eq!(tree.state(), NodeState::Running);
    assert_eq!(tree.root().state(), NodeState::Running);
    assert!(tree.root().binding().is_none());

    tree.do_awake(AGENT, &mut world);
    tree.do_awake(AGENT, &mut world);
    assert_eq!(entries(&j), vec!["awake:outer", "awake:inner"]);

    let binding = tree.root().children()[0].children()[0].binding().unwrap();
    assert_eq!(binding.agent, AGENT);
    assert_eq!(binding.tree, DefinitionId(2));
}

#[test]
fn start_fires_once_before_update_and_stop_on_terminal() {
    let j = journal();
    let mut tree = single_leaf(&j);
    let mut world = TestWorld::default();
    tree.do_awake(AGENT, &mut world);

    world.set("a", NodeState::Running);
    assert_eq!(tree.do_update(&ctx(0), &mut world), NodeState::Running);
    assert_eq!(tree.do_update(&ctx(1), &mut world), NodeState::Running);
    assert!(tree.root().children()[0].is_started());

    world.set("a", NodeState::Success);
    assert_eq!(tree.do_update(&ctx(2), &mut world), NodeState::Success);

    assert_eq!(
        entries(&j),
        vec![
            "awake:a",
            "start:a",
            "update:a",
            "update:a",
            "update:a",
            "stop:a"
        ]
    );
    let a = &tree.root().children()[0];
    assert!(!a.is_started());
    assert_eq!(a.state(), NodeState::Success);
}

#[test]
fn finished_tree_does_not_rerun_until_reset() {
    let j = journal();
    let mut tree = single_leaf(&j);
    let mut world = TestWorld::default();
    tree.do_awake(AGENT, &mut world);

    world.set("a", NodeState::Failure);
    assert_eq!(tree.do_update(&ctx(0), &mut world), NodeState::Failure);
    assert_eq!(tree.do_update(&ctx(1), &mut world), NodeState::Failure);
    assert_eq!(count(&j, "update:a"), 1);
    assert_eq!(count(&j, "stop:a"), 1);

    tree.reset();
    assert_eq!(tree.state(), NodeState::Running);
    assert_eq!(tree.root().children()[0].state(), NodeState::Running);

    world.set("a", NodeState::Success);
    assert_eq!(tree.do_update(&ctx(2), &mut world), NodeState::Success);
    assert_eq!(count(&j, "start:a"), 2);
    assert_eq!(count(&j, "stop:a"), 2);
}

#[test]
fn guard_failure_skips_update_and_retries_next_activation() {
    let j = journal();
    let mut tree = single_leaf(&j);
    let mut world = TestWorld::default();
    tree.do_awake(AGENT, &mut world);

    world.missing.insert("a");
    assert_eq!(tree.do_update(&ctx(0), &mut world), NodeState::Failure);
    assert_eq!(
        entries(&j),
        vec!["awake:a", "start:a", "guard:a", "stop:a"]
    );
    assert!(!tree.root().children()[0].is_started());

    world.missing.clear();
    tree.reset();
    assert_eq!(tree.do_update(&ctx(1), &mut world), NodeState::Success);
    assert_eq!(count(&j, "update:a"), 1);
}

#[test]
fn disabled_is_sticky_until_reset() {
    let j = journal();
    let mut tree = single_leaf(&j);
    let mut world = TestWorld::default();
    tree.do_awake(AGENT, &mut world);

    world.set("a", NodeState::Running);
    tree.do_update(&ctx(0), &mut world);

    let a = tree.root_mut().child_mut(0).unwrap();
    a.disable();
    assert_eq!(a.do_update(&ctx(1), &mut world), NodeState::Disabled);
    assert_eq!(a.do_update(&ctx(2), &mut world), NodeState::Disabled);
    assert_eq!(count(&j, "update:a"), 1);
    // Disabling does not stop the activation.
    assert_eq!(count(&j, "stop:a"), 0);

    // The root forwards the disabled child's state.
    assert_eq!(tree.do_update(&ctx(3), &mut world), NodeState::Disabled);
    assert_eq!(tree.do_update(&ctx(4), &mut world), NodeState::Disabled);
    assert_eq!(count(&j, "update:a"), 1);

    tree.reset();
    assert_eq!(tree.root().children()[0].state(), NodeState::Running);
    assert_eq!(tree.do_update(&ctx(5), &mut world), NodeState::Running);
    assert_eq!(count(&j, "update:a"), 2);
}

#[test]
fn get_child_round_robins_over_unbounded_children() {
    let j = journal();
    let mut def = TreeDefinition::new(DefinitionId(3), "round-robin");
    let c = def.add_composite("c", forwarding("c", &j));
    assert!(def.add_child(def.root(), c));
    for name in ["A", "B", "C"] {
        let leaf = def.add_action(name, probe(name, &j));
        assert!(def.add_child(c, leaf));
    }

    let mut tree = Tree::build(&def).unwrap();
    let composite = tree.root_mut().child_mut(0).unwrap();
    let picked: Vec<String> = (0..4)
        .map(|_| composite.get_child().unwrap().name().to_string())
        .collect();
    assert_eq!(picked, vec!["A", "B", "C", "A"]);
    assert_eq!(composite.cursor(), 1);

    composite.reset();
    assert_eq!(composite.cursor(), 0);
    assert_eq!(composite.get_child().unwrap().name(), "A");

    // Leaves never yield a child; single-capacity nodes always yield the same one.
    let leaf = composite.child_mut(0).unwrap();
    assert!(leaf.get_child().is_none());
    let root = tree.root_mut();
    assert_eq!(root.get_child().unwrap().name(), "c");
    assert_eq!(root.get_child().unwrap().name(), "c");
}

#[test]
fn composite_ticks_children_in_turn() {
    let j = journal();
    let mut def = TreeDefinition::new(DefinitionId(4), "patrol");
    let c = def.add_composite("c", forwarding("c", &j));
    assert!(def.add_child(def.root(), c));
    for name in ["A", "B"] {
        let leaf = def.add_action(name, probe(name, &j));
        assert!(def.add_child(c, leaf));
    }

    let mut tree = Tree::build(&def).unwrap();
    let mut world = TestWorld::default();
    tree.do_awake(AGENT, &mut world);
    world.set("A", NodeState::Running);
    world.set("B", NodeState::Running);

    for tick in 0..3 {
        assert_eq!(tree.do_update(&ctx(tick), &mut world), NodeState::Running);
    }
    assert_eq!(count(&j, "update:A"), 2);
    assert_eq!(count(&j, "update:B"), 1);
}

#[test]
fn dispose_runs_once_and_unbinds() {
    let j = journal();
    let mut tree = single_leaf(&j);
    let mut world = TestWorld::default();
    tree.do_awake(AGENT, &mut world);

    tree.dispose();
    tree.dispose();
    assert_eq!(count(&j, "dispose:a"), 1);
    assert!(tree.root().is_disposed());
    assert!(tree.root().children().is_empty());
    assert!(tree.root().binding().is_none());

    // Ticking a torn-down node is tolerated and reports failure.
    assert_eq!(tree.do_update(&ctx(0), &mut world), NodeState::Failure);
}

#[test]
fn unbound_node_fails_without_running_hooks() {
    let j = journal();
    let mut tree = single_leaf(&j);
    let mut world = TestWorld::default();

    assert_eq!(tree.do_update(&ctx(0), &mut world), NodeState::Failure);
    assert!(entries(&j).is_empty());
}
