//! A turret that idles on a sweep timer and switches to tracking when an
//! intruder shows up.
//!
//! Run with `RUST_LOG=debug cargo run -p reflex-bt --example turret --features serde`.

use std::borrow::Cow;

use anyhow::{Context, Result};
use reflex_bt::{
    prototype, Children, DefinitionId, MultiTreeScheduler, NodeBehavior, NodeState,
    SchedulerConfig, TreeDefinition, Wait,
};
use reflex_core::{TickContext, WorldMut, WorldView};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = "\
think_every_ticks: 1
think_offset_ticks: 0
";

const PATROL: DefinitionId = DefinitionId(1);
const ENGAGE: DefinitionId = DefinitionId(2);

#[derive(Debug, Default)]
struct Arena {
    turret_yaw: f32,
    intruder_yaw: Option<f32>,
}

impl WorldView for Arena {
    type Agent = u32;
}

impl WorldMut for Arena {}

#[derive(Debug, Clone, Copy)]
struct Track {
    degrees_per_second: f32,
}

impl NodeBehavior<Arena> for Track {
    fn try_failure(&self, _ctx: &TickContext, _agent: u32, world: &Arena) -> Option<Cow<'static, str>> {
        world
            .intruder_yaw
            .is_none()
            .then_some(Cow::Borrowed("no intruder to track"))
    }

    fn on_update(
        &mut self,
        ctx: &TickContext,
        _agent: u32,
        world: &mut Arena,
        _children: &mut Children<'_, Arena>,
    ) -> NodeState {
        let Some(target) = world.intruder_yaw else {
            return NodeState::Failure;
        };
        let step = self.degrees_per_second * ctx.dt_seconds;
        let delta = target - world.turret_yaw;
        if delta.abs() <= step {
            world.turret_yaw = target;
            return NodeState::Success;
        }
        world.turret_yaw += step * delta.signum();
        NodeState::Running
    }
}

fn patrol() -> TreeDefinition<Arena> {
    let mut def = TreeDefinition::new(PATROL, "patrol");
    let sweep = def.add_action("sweep", prototype(Wait::new(0.5)));
    def.add_child(def.root(), sweep);
    def
}

fn engage() -> TreeDefinition<Arena> {
    let mut def = TreeDefinition::new(ENGAGE, "engage");
    let track = def.add_action(
        "track",
        prototype(Track {
            degrees_per_second: 90.0,
        }),
    );
    def.add_child(def.root(), track);
    def
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config: SchedulerConfig =
        serde_yaml::from_str(CONFIG).context("failed to parse scheduler config")?;

    let agent = 1u32;
    let mut world = Arena::default();
    let mut scheduler = MultiTreeScheduler::new(agent).with_config(config);

    let patrol_index = scheduler.register_or_activate(&patrol(), &mut world, true)?;
    let engage_index = scheduler.register_or_activate(&engage(), &mut world, false)?;

    let mut ctx = TickContext::new(0, 0.25);
    for _ in 0..24 {
        if ctx.tick == 6 {
            world.intruder_yaw = Some(120.0);
            scheduler.disable_all();
            scheduler.set_active(engage_index);
        }

        scheduler.tick(&ctx, &mut world);

        // Whatever finished, fall back to the patrol sweep.
        if scheduler.active_len() == 0 {
            if scheduler.state_of(ENGAGE) == Some(NodeState::Success) {
                world.intruder_yaw = None;
            }
            scheduler.set_active(patrol_index);
        }

        tracing::info!(
            tick = ctx.tick,
            yaw = world.turret_yaw,
            patrol = scheduler.is_active(PATROL),
            engage = scheduler.is_active(ENGAGE),
            "frame"
        );
        ctx = ctx.next();
    }

    scheduler.dispose_all();
    Ok(())
}
