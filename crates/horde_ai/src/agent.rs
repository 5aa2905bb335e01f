//! Enemy agents
//!
//! An [`Agent`] runs one routine at a time for its current [`AgentState`].
//! Routines are small phase records resumed on every [`Agent::tick`];
//! switching state drops the routine, and the next state's entry actions
//! run on the first tick spent in it.
//!
//! Damage arrives through [`Damageable`]. It changes health and state right
//! away, while its presentation side effects are queued and flushed on the
//! agent's next tick (or immediately by
//! [`AgentRoster::apply_damage`](crate::roster::AgentRoster::apply_damage)).
//!
//! Once an agent is being destroyed no further side effects are executed.

use crate::config::{AgentConfig, BehaviorTuning, EffectPrefab, SoundClip};
use crate::navigation::{random_walkable_point, Navigation};
use crate::presentation::{Presentation, PresentationResult};
use crate::state_machine::{AgentState, StateMachine};
use crate::target::TargetRef;
use horde_combat::{DamageInfo, DamageOutcome, Damageable, Health};
use horde_core::EntityId;
use horde_math::Vec3;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Collaborators and timing for one agent update
pub struct TickContext<'a> {
    /// Scaled game time in seconds
    pub now: f64,
    /// Scaled frame delta in seconds
    pub dt: f32,
    pub nav: &'a mut dyn Navigation,
    pub presentation: &'a mut dyn Presentation,
    pub rng: &'a mut dyn RngCore,
}

impl<'a> TickContext<'a> {
    pub fn new(
        now: f64,
        dt: f32,
        nav: &'a mut dyn Navigation,
        presentation: &'a mut dyn Presentation,
        rng: &'a mut dyn RngCore,
    ) -> Self {
        Self {
            now,
            dt,
            nav,
            presentation,
            rng,
        }
    }
}

/// Progress of the running state routine
#[derive(Debug, Clone, Copy, PartialEq)]
enum Routine {
    Idle { duration: f32, elapsed: f32 },
    Patrol,
    Chase(ChaseProgress),
    Attack { phase: AttackPhase, elapsed: f32 },
    Hurt { hold: f32, elapsed: f32 },
    Dead { elapsed: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ChaseProgress {
    ticks: u32,
    last_position: Vec3,
    last_sample_time: f64,
    stuck_time: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttackPhase {
    Windup,
    Recovery,
}

/// What a routine wants after running
enum Flow {
    Continue(Routine),
    Switch(AgentState),
}

/// Side effects of taking damage, waiting for collaborators
#[derive(Debug, Clone, PartialEq)]
enum Cue {
    HitEffect { prefab: EffectPrefab, position: Vec3 },
    Knockback(Vec3),
    HurtSound,
}

/// A live enemy
#[derive(Debug)]
pub struct Agent {
    id: EntityId,
    name: String,
    config: Arc<AgentConfig>,
    tuning: Arc<BehaviorTuning>,
    health: Health,
    fsm: StateMachine,
    /// `None` until the current state's entry actions have run
    routine: Option<Routine>,
    target: TargetRef,
    /// Last position reported by navigation
    position: Vec3,
    facing_yaw: f32,
    last_attack_time: Option<f64>,
    /// Hold time for the next Hurt state
    hurt_hold: f32,
    stuck_recoveries: u32,
    is_being_destroyed: bool,
    removal_requested: bool,
    cues: Vec<Cue>,
}

impl Agent {
    pub fn new(
        id: EntityId,
        config: Arc<AgentConfig>,
        tuning: Arc<BehaviorTuning>,
        position: Vec3,
    ) -> Self {
        Self {
            id,
            name: format!("{}_{}", config.name, id),
            health: Health::new(config.max_health),
            hurt_hold: tuning.engaged_hold(),
            config,
            tuning,
            fsm: StateMachine::new(AgentState::Idle),
            routine: None,
            target: TargetRef::none(),
            position,
            facing_yaw: 0.0,
            last_attack_time: None,
            stuck_recoveries: 0,
            is_being_destroyed: false,
            removal_requested: false,
            cues: Vec::new(),
        }
    }

    /// Set the tracked target
    pub fn with_target(mut self, target: TargetRef) -> Self {
        self.target = target;
        self
    }

    pub fn set_target(&mut self, target: TargetRef) {
        self.target = target;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Arc<AgentConfig> {
        &self.config
    }

    pub fn tuning(&self) -> &Arc<BehaviorTuning> {
        &self.tuning
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn state(&self) -> AgentState {
        self.fsm.current()
    }

    pub fn previous_state(&self) -> Option<AgentState> {
        self.fsm.previous()
    }

    pub fn state_machine(&self) -> &StateMachine {
        &self.fsm
    }

    pub fn target(&self) -> &TargetRef {
        &self.target
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Facing (radians around +Y)
    pub fn facing_yaw(&self) -> f32 {
        self.facing_yaw
    }

    /// Game time of the last attack that went through its cooldown check
    pub fn last_attack_time(&self) -> Option<f64> {
        self.last_attack_time
    }

    /// How many times the chase routine warped out of a stuck position
    pub fn stuck_recoveries(&self) -> u32 {
        self.stuck_recoveries
    }

    pub fn is_dead(&self) -> bool {
        self.health.is_dead()
    }

    pub fn is_being_destroyed(&self) -> bool {
        self.is_being_destroyed
    }

    /// Whether the agent asked to be removed from the world
    pub fn is_removed(&self) -> bool {
        self.removal_requested
    }

    /// Tear the agent down from outside. Nothing runs afterwards.
    pub fn destroy(&mut self) {
        if self.removal_requested {
            return;
        }
        log::debug!("[{}] Destroyed externally", self.name);
        self.is_being_destroyed = true;
        self.removal_requested = true;
        self.routine = None;
        self.cues.clear();
    }

    /// Run one step of the current state's routine
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) {
        if self.removal_requested {
            return;
        }
        if self.is_being_destroyed && !self.fsm.is_in(AgentState::Dead) {
            return;
        }

        if let Some(position) = ctx.nav.position(self.id) {
            self.position = position;
        }
        self.flush_cues(ctx.nav, ctx.presentation, ctx.rng);

        let flow = match self.routine {
            None => self.enter(ctx),
            Some(routine) => Flow::Continue(routine),
        };
        // Entry counts as the first tick of the state
        let flow = match flow {
            Flow::Continue(routine) => self.step(routine, ctx),
            switch => switch,
        };

        match flow {
            Flow::Continue(routine) => self.routine = Some(routine),
            Flow::Switch(to) => self.change_state(to),
        }
        self.fsm.advance(ctx.dt);
    }

    /// Deliver queued damage side effects
    pub fn flush_cues(
        &mut self,
        nav: &mut dyn Navigation,
        presentation: &mut dyn Presentation,
        rng: &mut dyn RngCore,
    ) {
        for cue in std::mem::take(&mut self.cues) {
            if self.is_being_destroyed {
                break;
            }
            match cue {
                Cue::HitEffect { prefab, position } => {
                    self.spawn_effect(
                        presentation,
                        Some(&prefab),
                        position,
                        self.tuning.damage_hit_effect_duration,
                    );
                }
                Cue::Knockback(velocity) => nav.set_velocity(self.id, velocity),
                Cue::HurtSound => self.play_random(presentation, &self.config.hurt_sounds, rng),
            }
        }
    }

    fn change_state(&mut self, to: AgentState) {
        if self.fsm.transition(to) {
            self.routine = None;
        }
    }

    fn enter(&mut self, ctx: &mut TickContext<'_>) -> Flow {
        let state = self.fsm.current();
        match self.fsm.previous() {
            Some(previous) if previous != state => {
                log::debug!("[{}] State change: {} -> {}", self.name, previous, state)
            }
            _ => log::debug!("[{}] Entering {}", self.name, state),
        }

        match state {
            AgentState::Idle => self.enter_idle(ctx),
            AgentState::Patrol => self.enter_patrol(ctx),
            AgentState::Chase => self.enter_chase(ctx),
            AgentState::Attack => self.enter_attack(ctx),
            AgentState::Hurt => self.enter_hurt(ctx),
            AgentState::Dead => self.enter_dead(ctx),
        }
    }

    fn step(&mut self, routine: Routine, ctx: &mut TickContext<'_>) -> Flow {
        match routine {
            Routine::Idle { duration, elapsed } => self.step_idle(duration, elapsed, ctx),
            Routine::Patrol => self.step_patrol(ctx),
            Routine::Chase(progress) => self.step_chase(progress, ctx),
            Routine::Attack { phase, elapsed } => self.step_attack(phase, elapsed, ctx),
            Routine::Hurt { hold, elapsed } => {
                let elapsed = elapsed + ctx.dt;
                if elapsed >= hold {
                    Flow::Switch(AgentState::Chase)
                } else {
                    Flow::Continue(Routine::Hurt { hold, elapsed })
                }
            }
            Routine::Dead { elapsed } => {
                let elapsed = elapsed + ctx.dt;
                if elapsed >= self.tuning.death_removal_delay && !self.removal_requested {
                    log::debug!("[{}] Removal requested", self.name);
                    self.removal_requested = true;
                }
                Flow::Continue(Routine::Dead { elapsed })
            }
        }
    }

    fn enter_idle(&mut self, ctx: &mut TickContext<'_>) -> Flow {
        ctx.nav.set_stopped(self.id, true);
        self.set_locomotion(ctx.presentation, false, false);
        self.trigger(ctx.presentation, self.config.animations.idle.as_deref());

        let (min, max) = (
            self.tuning.idle_duration_min,
            self.tuning.idle_duration_max,
        );
        let duration = if min.is_finite() && max.is_finite() && max > min {
            ctx.rng.gen_range(min..max)
        } else if min.is_finite() {
            min.max(0.0)
        } else {
            BehaviorTuning::default().idle_duration_min
        };

        Flow::Continue(Routine::Idle {
            duration,
            elapsed: 0.0,
        })
    }

    fn step_idle(&mut self, duration: f32, elapsed: f32, ctx: &mut TickContext<'_>) -> Flow {
        if let Some(distance) = self.detect_target() {
            log::debug!("[{}] Target detected at distance {:.2}", self.name, distance);
            return Flow::Switch(AgentState::Chase);
        }

        let elapsed = elapsed + ctx.dt;
        if elapsed < duration {
            return Flow::Continue(Routine::Idle { duration, elapsed });
        }

        if self.config.can_patrol {
            Flow::Switch(AgentState::Patrol)
        } else {
            Flow::Switch(AgentState::Idle)
        }
    }

    fn enter_patrol(&mut self, ctx: &mut TickContext<'_>) -> Flow {
        self.set_locomotion(ctx.presentation, true, false);
        ctx.nav.set_stopped(self.id, false);
        ctx.nav.set_speed(self.id, self.config.move_speed);

        let point = random_walkable_point(
            &*ctx.nav,
            self.position,
            self.tuning.patrol_radius,
            self.tuning.patrol_samples,
            ctx.rng,
        );
        let Some(point) = point else {
            log::debug!("[{}] No walkable patrol point near {:?}", self.name, self.position);
            return Flow::Switch(AgentState::Idle);
        };

        if !ctx.nav.steer_toward(self.id, point) {
            log::debug!("[{}] Can't steer to patrol point {:?}", self.name, point);
            return Flow::Switch(AgentState::Idle);
        }

        log::debug!("[{}] Patrolling to {:?}", self.name, point);
        Flow::Continue(Routine::Patrol)
    }

    fn step_patrol(&mut self, ctx: &mut TickContext<'_>) -> Flow {
        if let Some(distance) = self.detect_target() {
            log::debug!("[{}] Target spotted while patrolling at distance {:.2}", self.name, distance);
            return Flow::Switch(AgentState::Chase);
        }

        let arrived = !ctx.nav.path_pending(self.id)
            && ctx.nav.remaining_distance(self.id) <= self.config.stopping_distance(&self.tuning);
        if arrived {
            Flow::Switch(AgentState::Idle)
        } else {
            Flow::Continue(Routine::Patrol)
        }
    }

    fn enter_chase(&mut self, ctx: &mut TickContext<'_>) -> Flow {
        self.set_locomotion(ctx.presentation, true, true);

        let Some(aim) = self.target.aim_point() else {
            log::debug!("[{}] Nothing to chase", self.name);
            return Flow::Switch(AgentState::Idle);
        };

        ctx.nav.set_stopped(self.id, false);
        ctx.nav.set_speed(self.id, self.config.chase_speed);

        if ctx
            .nav
            .find_walkable_point_near(self.position, self.tuning.chase_probe_radius)
            .is_none()
        {
            log::warn!("[{}] Not on the navmesh at {:?}", self.name, self.position);
            let recovered = ctx
                .nav
                .find_walkable_point_near(self.position, self.tuning.chase_recovery_radius);
            match recovered {
                Some(point) if ctx.nav.warp(self.id, point) => {
                    log::debug!("[{}] Moved back onto the navmesh at {:?}", self.name, point);
                    self.position = point;
                }
                _ => {
                    log::warn!("[{}] No navmesh position nearby", self.name);
                    return Flow::Switch(AgentState::Idle);
                }
            }
        }

        let path = ctx.nav.compute_path(self.position, aim);
        if !path.valid {
            log::debug!("[{}] No valid path to target", self.name);
        }
        log::debug!(
            "[{}] Chasing target at {:?}, path valid: {}, corners: {}",
            self.name,
            aim,
            path.valid,
            path.waypoint_count
        );

        Flow::Continue(Routine::Chase(ChaseProgress {
            ticks: 0,
            last_position: self.position,
            last_sample_time: ctx.now,
            stuck_time: 0.0,
        }))
    }

    fn step_chase(&mut self, mut progress: ChaseProgress, ctx: &mut TickContext<'_>) -> Flow {
        let Some(aim) = self.target.aim_point() else {
            log::debug!("[{}] Lost target", self.name);
            return Flow::Switch(AgentState::Idle);
        };

        progress.ticks += 1;
        let distance = self.position.distance(aim);
        let steering = ctx.nav.steer_toward(self.id, aim);

        if progress.ticks % self.tuning.stuck_sample_interval.max(1) == 0 {
            let moved = progress.last_position.distance(self.position);
            let elapsed = (ctx.now - progress.last_sample_time) as f32;
            progress.last_position = self.position;
            progress.last_sample_time = ctx.now;

            if moved < self.tuning.stuck_epsilon {
                progress.stuck_time += elapsed;
                if progress.stuck_time > self.tuning.stuck_threshold {
                    log::debug!(
                        "[{}] Appears stuck (moved {:.2} in {} ticks)",
                        self.name,
                        moved,
                        self.tuning.stuck_sample_interval
                    );
                    self.recover_from_stuck(aim, ctx);
                    progress.stuck_time = 0.0;
                }
            } else {
                progress.stuck_time = 0.0;
            }

            log::debug!(
                "[{}] Chasing: distance {:.2}, moved {:.2}, steering: {}",
                self.name,
                distance,
                moved,
                steering
            );
        }

        if distance <= self.config.attack_range {
            log::debug!(
                "[{}] Within attack range ({:.2} <= {:.2})",
                self.name,
                distance,
                self.config.attack_range
            );
            return Flow::Switch(AgentState::Attack);
        }

        Flow::Continue(Routine::Chase(progress))
    }

    fn recover_from_stuck(&mut self, aim: Vec3, ctx: &mut TickContext<'_>) {
        let path = ctx.nav.compute_path(self.position, aim);
        if !path.valid {
            log::debug!("[{}] Path calculation failed", self.name);
        }

        let toward = (aim - self.position).normalize_or_zero();
        let probe = self.position + toward * self.tuning.stuck_recovery_step;
        if let Some(point) = ctx
            .nav
            .find_walkable_point_near(probe, self.tuning.stuck_search_radius)
        {
            log::debug!("[{}] Moving to intermediate point {:?}", self.name, point);
            if ctx.nav.warp(self.id, point) {
                self.position = point;
            }
        }
        self.stuck_recoveries += 1;
    }

    fn enter_attack(&mut self, ctx: &mut TickContext<'_>) -> Flow {
        self.set_locomotion(ctx.presentation, false, false);
        ctx.nav.set_stopped(self.id, true);

        let Some(aim) = self.target.aim_point() else {
            return Flow::Switch(AgentState::Idle);
        };

        if let Some(yaw) = (aim - self.position).yaw() {
            self.facing_yaw = yaw;
            self.present(ctx.presentation, |p, id| p.face(id, yaw));
        }

        if let Some(last) = self.last_attack_time {
            let since = ctx.now - last;
            let cooldown = f64::from(self.config.attack_cooldown);
            if since < cooldown {
                log::debug!(
                    "[{}] Attack on cooldown for {:.2}s",
                    self.name,
                    cooldown - since
                );
                return Flow::Switch(AgentState::Chase);
            }
        }

        self.last_attack_time = Some(ctx.now);
        self.trigger(ctx.presentation, self.config.animations.attack.as_deref());
        self.play_random(ctx.presentation, &self.config.attack_sounds, ctx.rng);

        Flow::Continue(Routine::Attack {
            phase: AttackPhase::Windup,
            elapsed: 0.0,
        })
    }

    fn step_attack(&mut self, phase: AttackPhase, elapsed: f32, ctx: &mut TickContext<'_>) -> Flow {
        let elapsed = elapsed + ctx.dt;
        match phase {
            AttackPhase::Windup if elapsed >= self.tuning.attack_windup => {
                self.resolve_attack(ctx);
                Flow::Continue(Routine::Attack {
                    phase: AttackPhase::Recovery,
                    elapsed: 0.0,
                })
            }
            AttackPhase::Recovery if elapsed >= self.tuning.attack_recovery => {
                log::debug!("[{}] Attack complete", self.name);
                Flow::Switch(AgentState::Chase)
            }
            phase => Flow::Continue(Routine::Attack { phase, elapsed }),
        }
    }

    fn resolve_attack(&mut self, ctx: &mut TickContext<'_>) {
        let Some(target) = self.target.upgrade() else {
            log::debug!("[{}] Target gone before the attack landed", self.name);
            return;
        };

        let (aim, ground) = {
            let target = target.read();
            (target.aim_point(), target.position())
        };
        let reach = self.config.attack_range * self.tuning.attack_reach_factor;
        if self.position.distance(aim) > reach {
            log::debug!("[{}] Target moved out of range", self.name);
            return;
        }

        let damage = DamageInfo::new(self.config.attack_damage).with_source(self.id);
        let outcome = target.write().apply_damage(&damage);
        log::debug!(
            "[{}] Dealt {:.1} damage to target{}",
            self.name,
            outcome.dealt,
            if outcome.died { " (killed)" } else { "" }
        );

        self.spawn_effect(
            ctx.presentation,
            self.config.hit_effect.as_ref(),
            ground + Vec3::UP * self.tuning.effect_height,
            self.tuning.attack_hit_effect_duration,
        );
    }

    fn enter_hurt(&mut self, ctx: &mut TickContext<'_>) -> Flow {
        self.set_locomotion(ctx.presentation, false, false);
        ctx.nav.set_stopped(self.id, true);
        self.trigger(ctx.presentation, self.config.animations.hurt.as_deref());
        self.play_random(ctx.presentation, &self.config.hurt_sounds, ctx.rng);

        Flow::Continue(Routine::Hurt {
            hold: self.hurt_hold,
            elapsed: 0.0,
        })
    }

    fn enter_dead(&mut self, ctx: &mut TickContext<'_>) -> Flow {
        log::info!("[{}] Died", self.name);

        ctx.nav.set_stopped(self.id, true);
        self.set_locomotion(ctx.presentation, false, false);
        self.trigger(ctx.presentation, self.config.animations.death.as_deref());
        self.present(ctx.presentation, |p, id| p.disable_physics(id));
        ctx.nav.disable(self.id);

        self.spawn_effect(
            ctx.presentation,
            self.config.death_effect.as_ref(),
            self.position + Vec3::UP * self.tuning.effect_height,
            self.tuning.death_effect_duration,
        );
        if let Some(clip) = &self.config.death_sound {
            self.present(ctx.presentation, |p, id| p.play_sound(id, clip));
        }

        self.is_being_destroyed = true;
        Flow::Continue(Routine::Dead { elapsed: 0.0 })
    }

    /// Distance to the target if it is within detection range
    fn detect_target(&self) -> Option<f32> {
        let distance = self.position.distance(self.target.aim_point()?);
        (distance < self.config.detection_radius).then_some(distance)
    }

    /// Run a presentation call unless the agent is being destroyed
    fn present<F>(&self, presentation: &mut dyn Presentation, action: F)
    where
        F: FnOnce(&mut dyn Presentation, EntityId) -> PresentationResult,
    {
        if self.is_being_destroyed {
            return;
        }
        if let Err(err) = action(presentation, self.id) {
            log::warn!("[{}] Presentation error: {}", self.name, err);
        }
    }

    fn set_locomotion(&self, presentation: &mut dyn Presentation, walking: bool, running: bool) {
        self.present(presentation, |p, id| p.set_locomotion(id, walking, running));
    }

    fn trigger(&self, presentation: &mut dyn Presentation, trigger: Option<&str>) {
        if let Some(trigger) = trigger.filter(|t| !t.is_empty()) {
            self.present(presentation, |p, id| p.play_animation_trigger(id, trigger));
        }
    }

    fn play_random(&self, presentation: &mut dyn Presentation, clips: &[SoundClip], rng: &mut dyn RngCore) {
        if let Some(clip) = clips.choose(rng) {
            self.present(presentation, |p, id| p.play_sound(id, clip));
        }
    }

    fn spawn_effect(
        &self,
        presentation: &mut dyn Presentation,
        prefab: Option<&EffectPrefab>,
        position: Vec3,
        duration: f32,
    ) {
        if let Some(prefab) = prefab {
            self.present(presentation, |p, _| p.spawn_effect(prefab, position, duration));
        }
    }
}

impl Damageable for Agent {
    fn apply_damage(&mut self, damage: &DamageInfo) -> DamageOutcome {
        if self.health.is_dead() || self.is_being_destroyed {
            return DamageOutcome::IGNORED;
        }

        if let Some(prefab) = &self.config.hit_effect {
            let position = damage
                .hit_point
                .unwrap_or(self.position + Vec3::UP * self.tuning.hit_point_height);
            self.cues.push(Cue::HitEffect {
                prefab: prefab.clone(),
                position,
            });
        }
        if let Some(hit_point) = damage.hit_point {
            let away = (self.position - hit_point).horizontal().normalize_or_zero();
            self.cues
                .push(Cue::Knockback(away * self.tuning.knockback_speed));
        }
        self.cues.push(Cue::HurtSound);

        let outcome = self.health.apply(damage.effective_amount());
        log::debug!(
            "[{}] Took {:.1} damage, health {:.1}/{:.1}",
            self.name,
            outcome.dealt,
            self.health.current(),
            self.health.max()
        );

        if outcome.died {
            self.change_state(AgentState::Dead);
            return outcome;
        }

        let alert = !self.fsm.current().is_engaged() && self.target.is_tracked();
        self.hurt_hold = if alert {
            log::debug!("[{}] Alerted by damage", self.name);
            self.tuning.alert_hold()
        } else {
            self.tuning.engaged_hold()
        };
        self.change_state(AgentState::Hurt);

        outcome
    }

    fn is_alive(&self) -> bool {
        !self.health.is_dead() && !self.is_being_destroyed
    }
}
