//! Assistant lifecycle state machine
//!
//! The machine owns its own [`TimerQueue`] and one [`CancellableSchedule`]
//! per timer class:
//!
//! - the inactivity pair (mischief and dormant), always reset together
//! - the recurring idle-variety cycle, alive exactly while the state is
//!   `Idle` and the imp is not minimized
//! - the single pending transition (end of greeting, farewell or mischief)
//!
//! Timers carry no state. Each handler re-reads the machine when it fires
//! and drops itself if the state has moved on. The machine never touches
//! the animation scheduler or the sound engine directly; it emits
//! [`LifecycleEffect`]s for its owner to route.

use std::sync::Arc;
use std::time::Duration;

use super::state::{LifecycleState, SeenTips, Tip};
use crate::animation::imp::{GOODBYE, GREETING, IDLE_VARIETY, MISCHIEF, REST_POSE};
use crate::animation::AnimationCatalog;
use crate::prefs::{keys, PreferenceWriter, Preferences};
use crate::sound::cues;
use crate::time::{CancellableSchedule, Clock, TimerQueue};

/// Inactivity and cadence settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleTimings {
    /// Inactivity before a mischief animation
    pub mischief_delay: Duration,
    /// Inactivity before departing to `Dormant`
    pub dormant_delay: Duration,
    /// Cadence of the idle-variety cycle
    pub idle_variety_period: Duration,
}

impl Default for LifecycleTimings {
    fn default() -> Self {
        Self {
            mischief_delay: Duration::from_millis(5000),
            dormant_delay: Duration::from_millis(15000),
            idle_variety_period: Duration::from_millis(8000),
        }
    }
}

/// Side effect requested by the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEffect {
    StateChanged {
        from: LifecycleState,
        to: LifecycleState,
    },
    /// Start playing the named animation from its first frame
    AnimationChanged(String),
    PlaySound(&'static str),
    VisibilityChanged(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    AwakeningComplete,
    DepartureToDormant,
    DepartureToMinimized,
    MischiefComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Mischief,
    Dormant,
    IdleVariety,
    Transition(Transition),
}

/// Lifecycle of one mounted assistant
pub struct LifecycleStateMachine {
    catalog: Arc<AnimationCatalog>,
    timings: LifecycleTimings,
    clock: Arc<dyn Clock>,
    prefs: PreferenceWriter,

    timers: TimerQueue<Timer>,
    mischief_timer: CancellableSchedule,
    dormant_timer: CancellableSchedule,
    idle_variety: CancellableSchedule,
    transition: CancellableSchedule,

    state: LifecycleState,
    visible: bool,
    minimized: bool,
    first_visit: bool,
    mounted: bool,
    current_tip: Option<Tip>,
    current_animation: String,
    seen_tips: SeenTips,
    idle_cursor: usize,
    mischief_cursor: usize,
    effects: Vec<LifecycleEffect>,
}

impl LifecycleStateMachine {
    /// Mount the machine in `Idle`, restoring persisted preferences and
    /// arming the inactivity timers unless the imp is minimized
    pub fn mount(
        catalog: Arc<AnimationCatalog>,
        timings: LifecycleTimings,
        preferences: &Preferences,
        prefs: PreferenceWriter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let rest = catalog.lookup(REST_POSE).0.to_string();
        let mut machine = Self {
            catalog,
            timings,
            clock,
            prefs,
            timers: TimerQueue::new(),
            mischief_timer: CancellableSchedule::new(),
            dormant_timer: CancellableSchedule::new(),
            idle_variety: CancellableSchedule::new(),
            transition: CancellableSchedule::new(),
            state: LifecycleState::Idle,
            visible: true,
            minimized: preferences.imp_minimized,
            first_visit: !preferences.first_visit_done,
            mounted: true,
            current_tip: None,
            current_animation: rest.clone(),
            seen_tips: preferences.seen_tip_ids.iter().collect(),
            idle_cursor: 0,
            mischief_cursor: 0,
            effects: vec![LifecycleEffect::AnimationChanged(rest)],
        };

        if machine.first_visit {
            machine.prefs.write_bool(keys::FIRST_VISIT_DONE, true);
        }

        let now = machine.clock.now();
        machine.sync_idle_variety(now);
        machine.arm_inactivity(now);
        log::debug!(
            "lifecycle mounted: minimized={} first_visit={} seen_tips={}",
            machine.minimized,
            machine.first_visit,
            machine.seen_tips.len()
        );
        machine
    }

    /// Cancel every pending timer. Later operations do nothing.
    pub fn unmount(&mut self) {
        self.timers.clear();
        self.mischief_timer.reset();
        self.dormant_timer.reset();
        self.idle_variety.reset();
        self.transition.reset();
        self.mounted = false;
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Leave `Dormant` through the greeting. In any other state this only
    /// counts as interaction.
    pub fn wake_up(&mut self) {
        if !self.mounted {
            return;
        }
        let now = self.clock.now();
        if self.state != LifecycleState::Dormant {
            self.arm_inactivity(now);
            return;
        }

        self.set_visible(true);
        self.set_state(now, LifecycleState::Awakening);
        self.set_animation(GREETING);
        self.effects.push(LifecycleEffect::PlaySound(cues::APPEAR));
        let delay = self.catalog.get_duration(GREETING);
        self.transition.schedule(
            &mut self.timers,
            now,
            delay,
            Timer::Transition(Transition::AwakeningComplete),
        );
    }

    /// Play the farewell and hide. A no-op when already dormant.
    pub fn go_to_dormant(&mut self) {
        if !self.mounted || self.state == LifecycleState::Dormant {
            return;
        }
        let now = self.clock.now();
        self.begin_departure(now, Transition::DepartureToDormant);
    }

    /// Present `tip`, recording it as seen
    pub fn show_tip(&mut self, tip: Tip) {
        if !self.mounted {
            return;
        }
        let now = self.clock.now();
        self.transition.cancel(&mut self.timers);

        if self.seen_tips.insert(&tip.id) {
            self.prefs.write_list(keys::SEEN_TIP_IDS, self.seen_tips.as_slice());
        }

        let previous = self.state;
        match tip.animation_name.as_deref() {
            Some(name) => self.set_animation(name),
            None if !matches!(previous, LifecycleState::Idle | LifecycleState::Active) => {
                self.set_animation(REST_POSE)
            }
            None => {}
        }

        log::debug!("showing tip {}", tip.id);
        self.current_tip = Some(tip);
        self.set_visible(true);
        self.set_minimized(now, false);
        self.set_state(now, LifecycleState::Active);
        self.effects.push(LifecycleEffect::PlaySound(cues::TIP));
        self.arm_inactivity(now);
    }

    /// Hide the balloon and depart to a minimized `Idle`. Only acts while a
    /// tip is shown.
    pub fn dismiss_tip(&mut self) {
        if !self.mounted || self.state != LifecycleState::Active {
            return;
        }
        let now = self.clock.now();
        self.begin_departure(now, Transition::DepartureToMinimized);
    }

    /// Close the balloon without departing
    pub fn close_balloon(&mut self) {
        if !self.mounted {
            return;
        }
        if !matches!(self.state, LifecycleState::Idle | LifecycleState::Mischief) {
            return;
        }
        let now = self.clock.now();
        self.current_tip = None;
        if self.state == LifecycleState::Mischief {
            self.transition.cancel(&mut self.timers);
            self.set_animation(REST_POSE);
            self.set_state(now, LifecycleState::Idle);
        }
        self.arm_inactivity(now);
    }

    /// Restore a minimized or dormant imp
    pub fn show_imp(&mut self) {
        if !self.mounted {
            return;
        }
        let now = self.clock.now();
        match self.state {
            LifecycleState::Dormant => {
                self.set_minimized(now, false);
                self.wake_up();
            }
            LifecycleState::Departing => {
                self.transition.cancel(&mut self.timers);
                self.set_minimized(now, false);
                self.set_animation(REST_POSE);
                self.set_state(now, LifecycleState::Idle);
                self.arm_inactivity(now);
            }
            _ => {
                self.set_minimized(now, false);
                self.arm_inactivity(now);
            }
        }
    }

    /// Depart to a minimized `Idle`
    pub fn hide_imp(&mut self) {
        if !self.mounted {
            return;
        }
        let already_hidden = match self.state {
            LifecycleState::Dormant | LifecycleState::Departing => true,
            LifecycleState::Idle => self.minimized,
            _ => false,
        };
        if already_hidden {
            return;
        }
        let now = self.clock.now();
        self.begin_departure(now, Transition::DepartureToMinimized);
    }

    /// Play the next mischief animation. Ignored unless idle or already
    /// mischievous and not minimized.
    pub fn play_mischief(&mut self) {
        if !self.mounted || self.minimized {
            return;
        }
        if !matches!(self.state, LifecycleState::Idle | LifecycleState::Mischief) {
            return;
        }
        let now = self.clock.now();
        self.start_mischief(now);
        self.arm_inactivity(now);
    }

    /// Restart the mischief/dormant pair from now
    pub fn reset_inactivity_timer(&mut self) {
        if !self.mounted {
            return;
        }
        let now = self.clock.now();
        self.arm_inactivity(now);
    }

    /// Forget every seen tip
    pub fn clear_seen_tips(&mut self) {
        self.seen_tips.clear();
        self.prefs.write_list(keys::SEEN_TIP_IDS, self.seen_tips.as_slice());
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Deadline of the earliest pending timer
    pub fn next_deadline(&self) -> Option<Duration> {
        if !self.mounted {
            return None;
        }
        self.timers.next_deadline()
    }

    /// Fire the earliest timer due at or before `up_to`. Returns its
    /// deadline, or `None` if nothing was due.
    pub fn fire_next(&mut self, up_to: Duration) -> Option<Duration> {
        if !self.mounted {
            return None;
        }
        let fired = self.timers.pop_due(up_to)?;
        let now = fired.at;

        match fired.event {
            Timer::Mischief => {
                if self.mischief_timer.complete(fired.id) {
                    self.on_mischief_timer(now);
                } else {
                    log::trace!("stale mischief timer dropped");
                }
            }
            Timer::Dormant => {
                if self.dormant_timer.complete(fired.id) {
                    self.on_dormant_timer(now);
                } else {
                    log::trace!("stale dormant timer dropped");
                }
            }
            Timer::IdleVariety => {
                if self.idle_variety.owns(fired.id) {
                    self.on_idle_variety(now);
                } else {
                    self.timers.cancel(fired.id);
                    log::trace!("stale idle-variety timer dropped");
                }
            }
            Timer::Transition(transition) => {
                if self.transition.complete(fired.id) {
                    self.on_transition(now, transition);
                } else {
                    log::trace!("stale {:?} dropped", transition);
                }
            }
        }
        Some(now)
    }

    /// Fire every timer due at or before `up_to`
    pub fn fire_due(&mut self, up_to: Duration) -> usize {
        let mut fired = 0;
        while self.fire_next(up_to).is_some() {
            fired += 1;
        }
        fired
    }

    /// Take the effects emitted since the last call
    pub fn drain_effects(&mut self) -> Vec<LifecycleEffect> {
        std::mem::take(&mut self.effects)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn is_dormant(&self) -> bool {
        self.state == LifecycleState::Dormant
    }

    /// Whether no earlier session completed a visit
    pub fn is_first_visit(&self) -> bool {
        self.first_visit
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn current_tip(&self) -> Option<&Tip> {
        self.current_tip.as_ref()
    }

    pub fn current_animation(&self) -> &str {
        &self.current_animation
    }

    pub fn seen_tip_ids(&self) -> &[String] {
        self.seen_tips.as_slice()
    }

    pub fn catalog(&self) -> &Arc<AnimationCatalog> {
        &self.catalog
    }

    pub fn timings(&self) -> LifecycleTimings {
        self.timings
    }

    /// Number of pending mischief and dormant timers
    pub fn pending_inactivity_timers(&self) -> usize {
        self.timers
            .count_matching(|t| matches!(t, Timer::Mischief | Timer::Dormant))
    }

    /// Number of pending mischief timers
    pub fn pending_mischief_timers(&self) -> usize {
        self.timers.count_matching(|t| *t == Timer::Mischief)
    }

    /// Number of pending dormant timers
    pub fn pending_dormant_timers(&self) -> usize {
        self.timers.count_matching(|t| *t == Timer::Dormant)
    }

    /// Number of pending state transitions (zero or one)
    pub fn pending_transitions(&self) -> usize {
        self.timers
            .count_matching(|t| matches!(t, Timer::Transition(_)))
    }

    pub fn is_idle_variety_running(&self) -> bool {
        self.idle_variety.is_pending(&self.timers)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn on_mischief_timer(&mut self, now: Duration) {
        if self.state != LifecycleState::Idle || self.minimized {
            log::trace!("mischief timer ignored in {}", self.state);
            return;
        }
        self.start_mischief(now);
    }

    fn on_dormant_timer(&mut self, now: Duration) {
        if !matches!(self.state, LifecycleState::Idle | LifecycleState::Mischief) || self.minimized {
            log::trace!("dormant timer ignored in {}", self.state);
            return;
        }
        self.begin_departure(now, Transition::DepartureToDormant);
    }

    fn on_idle_variety(&mut self, now: Duration) {
        if self.state != LifecycleState::Idle || self.minimized {
            self.idle_variety.cancel(&mut self.timers);
            return;
        }
        let name = IDLE_VARIETY[self.idle_cursor % IDLE_VARIETY.len()];
        self.idle_cursor = (self.idle_cursor + 1) % IDLE_VARIETY.len();
        log::trace!("idle variety at {:?}: {}", now, name);
        self.set_animation(name);
    }

    fn on_transition(&mut self, now: Duration, transition: Transition) {
        let expected = match transition {
            Transition::AwakeningComplete => LifecycleState::Awakening,
            Transition::DepartureToDormant | Transition::DepartureToMinimized => {
                LifecycleState::Departing
            }
            Transition::MischiefComplete => LifecycleState::Mischief,
        };
        if self.state != expected {
            log::trace!("{:?} ignored in {}", transition, self.state);
            return;
        }

        match transition {
            Transition::AwakeningComplete => {
                self.set_animation(REST_POSE);
                self.set_state(now, LifecycleState::Idle);
                self.arm_inactivity(now);
            }
            Transition::DepartureToDormant => {
                self.set_state(now, LifecycleState::Dormant);
                self.set_visible(false);
            }
            Transition::DepartureToMinimized => {
                self.set_minimized(now, true);
                self.set_animation(REST_POSE);
                self.set_state(now, LifecycleState::Idle);
            }
            Transition::MischiefComplete => {
                self.set_animation(REST_POSE);
                self.set_state(now, LifecycleState::Idle);
            }
        }
    }

    fn start_mischief(&mut self, now: Duration) {
        let name = MISCHIEF[self.mischief_cursor % MISCHIEF.len()];
        self.mischief_cursor = (self.mischief_cursor + 1) % MISCHIEF.len();

        self.set_state(now, LifecycleState::Mischief);
        self.set_animation(name);
        self.effects.push(LifecycleEffect::PlaySound(cues::MISCHIEF));
        let delay = self.catalog.get_duration(name);
        self.transition.schedule(
            &mut self.timers,
            now,
            delay,
            Timer::Transition(Transition::MischiefComplete),
        );
    }

    fn begin_departure(&mut self, now: Duration, target: Transition) {
        self.cancel_inactivity();
        self.current_tip = None;
        self.set_state(now, LifecycleState::Departing);
        self.set_animation(GOODBYE);
        self.effects.push(LifecycleEffect::PlaySound(cues::FAREWELL));
        let delay = self.catalog.get_duration(GOODBYE);
        self.transition
            .schedule(&mut self.timers, now, delay, Timer::Transition(target));
    }

    /// Cancel the mischief/dormant pair, then re-arm it if the current
    /// state allows inactivity to advance
    fn arm_inactivity(&mut self, now: Duration) {
        self.cancel_inactivity();
        if !self.inactivity_armable() {
            return;
        }
        self.mischief_timer.schedule(
            &mut self.timers,
            now,
            self.timings.mischief_delay,
            Timer::Mischief,
        );
        self.dormant_timer.schedule(
            &mut self.timers,
            now,
            self.timings.dormant_delay,
            Timer::Dormant,
        );
    }

    fn cancel_inactivity(&mut self) {
        self.mischief_timer.cancel(&mut self.timers);
        self.dormant_timer.cancel(&mut self.timers);
    }

    fn inactivity_armable(&self) -> bool {
        !self.minimized
            && matches!(
                self.state,
                LifecycleState::Idle | LifecycleState::Active | LifecycleState::Mischief
            )
    }

    fn set_state(&mut self, now: Duration, next: LifecycleState) {
        if self.state != next {
            log::debug!("lifecycle: {} -> {}", self.state, next);
            self.effects.push(LifecycleEffect::StateChanged {
                from: self.state,
                to: next,
            });
            self.state = next;
        }
        if !self.inactivity_armable() {
            self.cancel_inactivity();
        }
        self.sync_idle_variety(now);
    }

    fn set_minimized(&mut self, now: Duration, minimized: bool) {
        if self.minimized == minimized {
            return;
        }
        self.minimized = minimized;
        self.prefs.write_bool(keys::IMP_MINIMIZED, minimized);
        if minimized {
            self.cancel_inactivity();
        }
        self.sync_idle_variety(now);
    }

    fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.effects.push(LifecycleEffect::VisibilityChanged(visible));
        }
    }

    /// Resolve `name` against the catalog (unknown names fall back to the
    /// rest pose) and restart it
    fn set_animation(&mut self, name: &str) {
        let resolved = self.catalog.lookup(name).0.to_string();
        self.current_animation = resolved.clone();
        self.effects.push(LifecycleEffect::AnimationChanged(resolved));
    }

    fn sync_idle_variety(&mut self, now: Duration) {
        let wanted = self.state == LifecycleState::Idle && !self.minimized;
        if !wanted {
            self.idle_variety.cancel(&mut self.timers);
        } else if !self.idle_variety.is_pending(&self.timers) {
            self.idle_variety.schedule_every(
                &mut self.timers,
                now,
                self.timings.idle_variety_period,
                Timer::IdleVariety,
            );
        }
    }
}

impl std::fmt::Debug for LifecycleStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleStateMachine")
            .field("state", &self.state)
            .field("visible", &self.visible)
            .field("minimized", &self.minimized)
            .field("animation", &self.current_animation)
            .field("pending_timers", &self.timers.len())
            .finish()
    }
}
