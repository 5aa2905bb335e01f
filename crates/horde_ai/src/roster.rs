//! Agent ownership
//!
//! The roster owns every live agent, hands out their ids, ticks them and
//! tears them down once they ask to be removed.

use crate::agent::{Agent, TickContext};
use crate::config::{AgentConfig, BehaviorTuning};
use crate::error::{AiError, Result};
use crate::navigation::Navigation;
use crate::presentation::Presentation;
use crate::target::TargetRef;
use horde_combat::{DamageInfo, DamageOutcome, DamageSink, Damageable};
use horde_core::{EntityId, IdGenerator};
use horde_math::Vec3;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// All live agents, keyed by id
pub struct AgentRoster {
    agents: BTreeMap<EntityId, Agent>,
    ids: IdGenerator,
}

impl AgentRoster {
    pub fn new() -> Self {
        Self::with_id_generator(IdGenerator::starting_at(1))
    }

    /// Use a host-provided id source so agent ids don't collide with other entities
    pub fn with_id_generator(ids: IdGenerator) -> Self {
        Self {
            agents: BTreeMap::new(),
            ids,
        }
    }

    /// Instantiate an agent from `config` at `position`.
    ///
    /// Fails if the config is invalid, has no prefab, or the presentation
    /// layer can't instantiate it. Nothing is registered in that case.
    pub fn spawn(
        &mut self,
        config: Arc<AgentConfig>,
        tuning: Arc<BehaviorTuning>,
        position: Vec3,
        target: TargetRef,
        nav: &mut dyn Navigation,
        presentation: &mut dyn Presentation,
    ) -> Result<EntityId> {
        config.validate()?;
        tuning.validate()?;
        let prefab = config.prefab.as_deref().ok_or_else(|| AiError::MissingPrefab {
            name: config.name.clone(),
        })?;

        let id = self.ids.next();
        presentation.spawn_agent(id, prefab, position)?;
        nav.register_agent(id, position, config.move_speed);

        log::debug!("Spawned {} ({}) at {:?}", config.name, id, position);
        let agent = Agent::new(id, config, tuning, position).with_target(target);
        self.agents.insert(id, agent);
        Ok(id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.agents.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.agents.contains_key(&id)
    }

    /// Agents that are alive and not being torn down
    pub fn alive_count(&self) -> usize {
        self.agents.values().filter(|a| a.is_alive()).count()
    }

    /// Damage an agent and deliver its side effects right away
    pub fn apply_damage(
        &mut self,
        id: EntityId,
        damage: &DamageInfo,
        ctx: &mut TickContext<'_>,
    ) -> Result<DamageOutcome> {
        let agent = self.agents.get_mut(&id).ok_or(AiError::UnknownAgent(id))?;
        let outcome = agent.apply_damage(damage);
        agent.flush_cues(ctx.nav, ctx.presentation, ctx.rng);
        Ok(outcome)
    }

    /// Tick every agent, then remove those that asked for it.
    ///
    /// Returns the ids that were removed.
    pub fn tick_all(&mut self, ctx: &mut TickContext<'_>) -> Vec<EntityId> {
        for agent in self.agents.values_mut() {
            agent.tick(ctx);
        }

        let removed: Vec<EntityId> = self
            .agents
            .values()
            .filter(|a| a.is_removed())
            .map(Agent::id)
            .collect();
        for &id in &removed {
            self.remove(id, ctx.nav, ctx.presentation);
        }
        removed
    }

    /// Tear an agent down immediately
    pub fn destroy(
        &mut self,
        id: EntityId,
        nav: &mut dyn Navigation,
        presentation: &mut dyn Presentation,
    ) -> Result<()> {
        let agent = self.agents.get_mut(&id).ok_or(AiError::UnknownAgent(id))?;
        agent.destroy();
        self.remove(id, nav, presentation);
        Ok(())
    }

    fn remove(&mut self, id: EntityId, nav: &mut dyn Navigation, presentation: &mut dyn Presentation) {
        let Some(agent) = self.agents.remove(&id) else {
            return;
        };
        nav.unregister_agent(id);
        if let Err(err) = presentation.despawn_agent(id) {
            log::warn!("[{}] Failed to despawn: {}", agent.name(), err);
        }
        log::debug!("[{}] Removed", agent.name());
    }
}

impl Default for AgentRoster {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AgentRoster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRoster")
            .field("agents", &self.agents.len())
            .finish()
    }
}

/// Hit-scan damage lands on agents; side effects flush on their next tick
impl DamageSink for AgentRoster {
    fn deliver(&mut self, target: EntityId, damage: &DamageInfo) -> Option<DamageOutcome> {
        self.agents
            .get_mut(&target)
            .map(|agent| agent.apply_damage(damage))
    }
}
