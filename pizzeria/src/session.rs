use anyhow::{bail, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_derive::Deserialize;
use tracing::{debug, info, instrument};

use crate::{
    ingredient::Ingredient,
    mode::{Eligibility, GameMode},
    order::{Order, OrderId},
    results::{compute_results, CompletedOrders, Results},
    sampler::{WipSample, WipSampler},
    scheduler::{Scheduler, TaskHandle},
    stats::GameRunSubmission,
    store::{AddOutcome, OrderStore, Rejection},
    Millis,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub total_orders: u32,
    pub spawn_delay_min_ms: Millis,
    pub spawn_delay_max_ms: Millis,
    pub sample_interval_ms: Millis,
    // None keeps the multitask lock until another order is touched
    pub lock_cooldown_ms: Option<Millis>,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            total_orders: 5,
            spawn_delay_min_ms: 5_000,
            spawn_delay_max_ms: 10_000,
            sample_interval_ms: 1_000,
            lock_cooldown_ms: None,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Rejects settings a session can't run with. A zero sample interval
    /// would keep `advance` sampling the same instant forever.
    pub fn validate(&self) -> Result<()> {
        if self.total_orders == 0 {
            bail!("total_orders must be at least 1.");
        }
        if self.sample_interval_ms == 0 {
            bail!("sample_interval_ms must be greater than 0.");
        }
        if self.spawn_delay_max_ms < self.spawn_delay_min_ms {
            bail!(
                "spawn_delay_max_ms ({}) is smaller than spawn_delay_min_ms ({}).",
                self.spawn_delay_max_ms,
                self.spawn_delay_min_ms
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Spawn,
    SampleWip,
    Unlock(OrderId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Spawned(OrderId),
    Sampled(WipSample),
    Unlocked(OrderId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Running,
    Finished,
}

/// One playthrough. `start` and `reset` are the only lifecycle
/// transitions; everything timed runs from `advance`.
pub struct Session {
    mode: GameMode,
    config: GameConfig,
    policy: Box<dyn Eligibility>,
    rng: StdRng,
    status: Status,
    store: OrderStore,
    scheduler: Scheduler<Task>,
    sampler: WipSampler,
    completed: CompletedOrders,
    spawned: u32,
    lock_timer: Option<TaskHandle>,
    results: Option<Results>,
    submitted: bool,
}

impl Session {
    pub fn new(mode: GameMode, config: GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            mode,
            policy: mode.policy(config.lock_cooldown_ms),
            config,
            rng,
            status: Status::Idle,
            store: OrderStore::default(),
            scheduler: Scheduler::new(),
            sampler: WipSampler::default(),
            completed: CompletedOrders::default(),
            spawned: 0,
            lock_timer: None,
            results: None,
            submitted: false,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    pub fn samples(&self) -> &[WipSample] {
        self.sampler.samples()
    }

    pub fn completed(&self) -> &[Order] {
        self.completed.as_slice()
    }

    pub fn results(&self) -> Option<&Results> {
        self.results.as_ref()
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn next_timer(&mut self) -> Option<Millis> {
        self.scheduler.next_due()
    }

    /// Whether the mode keeps the player away from `order_id` right now.
    /// Selection in the WIP game is not a lock.
    pub fn is_locked(&self, order_id: OrderId, now: Millis) -> bool {
        if self.status != Status::Running || self.mode.requires_selection() {
            return false;
        }
        self.store.get(order_id).map_or(false, |o| o.is_open())
            && self.policy.check(&self.store, order_id, now).is_err()
    }

    #[instrument(level = "debug", name = "Starting session", skip(self), fields(mode = %self.mode))]
    pub fn start(&mut self, now: Millis) -> Vec<SessionEvent> {
        self.reset();
        self.status = Status::Running;
        let events: Vec<SessionEvent> = self.spawn_order(now).into_iter().collect();
        if self.spawned < self.config.total_orders {
            self.schedule_spawn(now);
        }
        if self.mode.samples_wip() {
            self.scheduler
                .schedule(now + self.config.sample_interval_ms, Task::SampleWip);
        }
        events
    }

    /// Drops every order, sample and pending timer.
    pub fn reset(&mut self) {
        self.scheduler.cancel_all();
        self.store = OrderStore::default();
        self.sampler.clear();
        self.completed.clear();
        self.spawned = 0;
        self.lock_timer = None;
        self.results = None;
        self.submitted = false;
        self.status = Status::Idle;
    }

    /// Runs every timer due at or before `now`.
    pub fn advance(&mut self, now: Millis) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while self.status == Status::Running {
            let (due, task) = match self.scheduler.pop_due(now) {
                Some(t) => t,
                None => break,
            };
            match task {
                Task::Spawn => {
                    if let Some(event) = self.spawn_order(due) {
                        events.push(event);
                    }
                    if self.spawned < self.config.total_orders {
                        self.schedule_spawn(due);
                    }
                }
                Task::SampleWip => {
                    if let Some(sample) = self.sampler.sample(&self.store, due) {
                        events.push(SessionEvent::Sampled(sample));
                    }
                    self.scheduler
                        .schedule(due + self.config.sample_interval_ms, Task::SampleWip);
                }
                Task::Unlock(id) => {
                    self.lock_timer = None;
                    events.push(SessionEvent::Unlocked(id));
                }
            }
        }
        events
    }

    fn spawn_order(&mut self, now: Millis) -> Option<SessionEvent> {
        if self.spawned >= self.config.total_orders {
            return None;
        }
        self.spawned += 1;
        let order = Order::random(self.spawned, now, &mut self.rng);
        debug!("Spawned order #{} needing {:?}", order.id, order.required);
        let id = order.id;
        self.store.push(order);
        Some(SessionEvent::Spawned(id))
    }

    fn schedule_spawn(&mut self, from: Millis) {
        let (min, max) = (self.config.spawn_delay_min_ms, self.config.spawn_delay_max_ms);
        let delay = if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        };
        self.scheduler.schedule(from + delay, Task::Spawn);
    }

    pub fn select(&mut self, order_id: OrderId) -> Result<(), Rejection> {
        if self.status != Status::Running {
            return Err(Rejection::NotRunning);
        }
        if !self.mode.requires_selection() {
            return Err(Rejection::SelectionUnused);
        }
        self.store.select(order_id)
    }

    pub fn add_ingredient(
        &mut self,
        order_id: OrderId,
        ingredient: Ingredient,
        now: Millis,
    ) -> Result<AddOutcome, Rejection> {
        if self.status != Status::Running {
            return Err(Rejection::NotRunning);
        }
        let outcome = self
            .store
            .add_ingredient(self.policy.as_ref(), order_id, ingredient, now)?;
        if let (GameMode::Multitask, Some(cooldown)) = (self.mode, self.config.lock_cooldown_ms) {
            if let Some(timer) = self.lock_timer.take() {
                self.scheduler.cancel(timer);
            }
            self.lock_timer = Some(
                self.scheduler
                    .schedule(now + cooldown, Task::Unlock(order_id)),
            );
        }
        if let AddOutcome::Completed(at) = outcome {
            self.record_completion(order_id, at);
        }
        Ok(outcome)
    }

    /// Confirms a finished order. Only the WIP game asks for this, the
    /// other modes complete on the last ingredient. Confirming an order
    /// twice gives back the first completion time.
    pub fn complete(&mut self, order_id: OrderId, now: Millis) -> Result<Millis, Rejection> {
        if self.status == Status::Idle {
            return Err(Rejection::NotRunning);
        }
        let order = self
            .store
            .get(order_id)
            .ok_or(Rejection::UnknownOrder(order_id))?;
        if let Some(done) = order.completion_time {
            self.record_completion(order_id, done);
            return Ok(done);
        }
        if self.mode.requires_selection() {
            match self.store.selected() {
                None => return Err(Rejection::NoSelection),
                Some(selected) if selected != order_id => {
                    return Err(Rejection::NotSelected(order_id))
                }
                _ => (),
            }
        }
        let at = self.store.mark_completed(order_id, now)?;
        self.record_completion(order_id, at);
        Ok(at)
    }

    fn record_completion(&mut self, order_id: OrderId, at: Millis) {
        let order = match self.store.get(order_id) {
            Some(order) => order.clone(),
            None => return,
        };
        if self.completed.insert(order) {
            info!("Order #{} completed at {}", order_id, at);
        }
        if self.status == Status::Running
            && self.completed.len() as u32 >= self.config.total_orders
        {
            self.finish();
        }
    }

    fn finish(&mut self) {
        self.scheduler.cancel_all();
        self.lock_timer = None;
        self.status = Status::Finished;
        let samples = self.mode.samples_wip().then(|| self.sampler.samples());
        self.results = compute_results(self.completed.as_slice(), samples);
        info!("Session finished: {:?}", self.results);
    }

    /// Hands the results out once per finished session.
    pub fn take_submission(&mut self) -> Option<GameRunSubmission> {
        if self.submitted {
            return None;
        }
        let submission = self.results.as_ref()?.to_submission(self.mode);
        self.submitted = true;
        Some(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GameConfig {
        GameConfig {
            seed: Some(1234),
            ..GameConfig::default()
        }
    }

    fn spawned(events: &[SessionEvent]) -> Vec<OrderId> {
        events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Spawned(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    // Fill every order, oldest first, confirming when the mode asks for it
    fn finish_all(session: &mut Session, now: Millis) {
        let ids: Vec<OrderId> = session.store().orders().iter().map(|o| o.id).collect();
        for id in ids {
            if session.mode().requires_selection() {
                session.select(id).unwrap();
            }
            let required = session.store().get(id).unwrap().required.clone();
            for ingredient in required {
                session.add_ingredient(id, ingredient, now).unwrap();
            }
            session.complete(id, now + id as Millis * 1_000).unwrap();
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(GameConfig::default().validate().is_ok());
        let zero_interval = GameConfig {
            sample_interval_ms: 0,
            ..config()
        };
        assert!(zero_interval
            .validate()
            .unwrap_err()
            .to_string()
            .contains("sample_interval_ms"));
        let no_orders = GameConfig {
            total_orders: 0,
            ..config()
        };
        assert!(no_orders.validate().is_err());
        let backwards = GameConfig {
            spawn_delay_min_ms: 9_000,
            spawn_delay_max_ms: 1_000,
            ..config()
        };
        assert!(backwards.validate().is_err());
    }

    #[test]
    fn test_spawns_exactly_five() {
        let mut session = Session::new(GameMode::Singletask, config());
        let mut events = session.start(0);
        assert_eq!(spawned(&events), vec![1]);
        assert_eq!(session.store().get(1).unwrap().start_time, 0);

        events.extend(session.advance(4_999));
        assert_eq!(session.store().len(), 1);

        events.extend(session.advance(60_000));
        assert_eq!(spawned(&events), vec![1, 2, 3, 4, 5]);
        assert_eq!(session.pending_timers(), 0);

        let starts: Vec<Millis> = session.store().orders().iter().map(|o| o.start_time).collect();
        for pair in starts.windows(2) {
            let gap = pair[1] - pair[0];
            assert!((5_000..10_000).contains(&gap));
        }
    }

    #[test]
    fn test_reset_cancels_spawns() {
        let mut session = Session::new(GameMode::Multitask, config());
        session.start(0);
        assert!(session.pending_timers() > 0);
        session.reset();
        assert_eq!(session.pending_timers(), 0);
        assert!(session.advance(100_000).is_empty());
        assert!(session.store().is_empty());
        assert_eq!(session.status(), Status::Idle);
    }

    #[test]
    fn test_restart_discards_old_session() {
        let mut session = Session::new(GameMode::Wip, config());
        session.start(0);
        session.advance(30_000);
        assert!(!session.samples().is_empty());
        let events = session.start(100_000);
        assert_eq!(spawned(&events), vec![1]);
        assert_eq!(session.store().len(), 1);
        assert!(session.samples().is_empty());
        assert_eq!(session.store().get(1).unwrap().start_time, 100_000);
    }

    #[test]
    fn test_wip_sampling_ticks() {
        let mut session = Session::new(GameMode::Wip, config());
        session.start(0);
        session.advance(3_000);
        let stamps: Vec<Millis> = session.samples().iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![1_000, 2_000, 3_000]);
        assert!(session.samples().iter().all(|s| s.wip == 0));

        session.select(1).unwrap();
        let first = session.store().get(1).unwrap().required[0];
        session.add_ingredient(1, first, 3_500).unwrap();
        session.advance(4_000);
        assert_eq!(session.samples().last().map(|s| s.wip), Some(1));
    }

    #[test]
    fn test_ready_order_still_counts_as_wip() {
        let mut session = Session::new(GameMode::Wip, config());
        session.start(0);
        session.select(1).unwrap();
        let required = session.store().get(1).unwrap().required.clone();
        for ingredient in required {
            session.add_ingredient(1, ingredient, 500).unwrap();
        }
        assert!(session.store().get(1).unwrap().is_open());
        session.advance(1_000);
        assert_eq!(session.samples().last().map(|s| s.wip), Some(1));

        session.complete(1, 1_500).unwrap();
        session.advance(2_000);
        assert_eq!(session.samples().last().map(|s| s.wip), Some(0));
    }

    #[test]
    fn test_other_modes_do_not_sample() {
        let mut session = Session::new(GameMode::Multitask, config());
        session.start(0);
        session.advance(3_000);
        assert!(session.samples().is_empty());
    }

    #[test]
    fn test_full_wip_game_submits_once() {
        let mut session = Session::new(GameMode::Wip, config());
        session.start(0);
        session.advance(60_000);
        assert_eq!(session.store().len(), 5);

        finish_all(&mut session, 61_000);
        assert_eq!(session.status(), Status::Finished);
        assert_eq!(session.pending_timers(), 0);

        let results = session.results().unwrap().clone();
        assert_eq!(results.order_times.len(), 5);
        assert_eq!(results.average_wip, Some(0.0));

        let submission = session.take_submission().unwrap();
        assert_eq!(submission.game_type, GameMode::Wip);
        assert_eq!(submission.total_time, results.total_time as f64);
        assert!(session.take_submission().is_none());
    }

    #[test]
    fn test_duplicate_completion_counted_once() {
        let mut session = Session::new(GameMode::Wip, config());
        session.start(0);
        session.select(1).unwrap();
        let required = session.store().get(1).unwrap().required.clone();
        for ingredient in required {
            session.add_ingredient(1, ingredient, 500).unwrap();
        }
        assert_eq!(session.complete(1, 1_000), Ok(1_000));
        assert_eq!(session.complete(1, 2_000), Ok(1_000));
        assert_eq!(session.completed().len(), 1);
        assert_eq!(session.status(), Status::Running);
    }

    #[test]
    fn test_singletask_completes_automatically() {
        let mut session = Session::new(GameMode::Singletask, config());
        session.start(0);
        session.advance(60_000);
        let required = session.store().get(1).unwrap().required.clone();
        let last = required.len() - 1;
        for (i, ingredient) in required.into_iter().enumerate() {
            let outcome = session.add_ingredient(1, ingredient, 61_000).unwrap();
            if i == last {
                assert_eq!(outcome, AddOutcome::Completed(61_000));
            }
        }
        assert_eq!(session.completed().len(), 1);
        let second = session.store().get(2).unwrap().required[0];
        assert!(session.add_ingredient(2, second, 61_500).is_ok());
    }

    #[test]
    fn test_multitask_cooldown_timer() {
        let mut session = Session::new(
            GameMode::Multitask,
            GameConfig {
                lock_cooldown_ms: Some(2_000),
                ..config()
            },
        );
        session.start(0);
        session.advance(60_000);
        let first = session.store().get(1).unwrap().required[0];
        let second = session.store().get(1).unwrap().required[1];
        session.add_ingredient(1, first, 60_000).unwrap();
        assert!(session.is_locked(1, 61_000));
        assert_eq!(
            session.add_ingredient(1, second, 61_000),
            Err(Rejection::Locked(1))
        );
        let events = session.advance(62_000);
        assert_eq!(events, vec![SessionEvent::Unlocked(1)]);
        assert!(!session.is_locked(1, 62_000));
        assert!(session.add_ingredient(1, second, 62_000).is_ok());
    }

    #[test]
    fn test_actions_need_running_session() {
        let mut session = Session::new(GameMode::Wip, config());
        assert_eq!(session.select(1), Err(Rejection::NotRunning));
        assert_eq!(
            session.add_ingredient(1, Ingredient::Garlic, 0),
            Err(Rejection::NotRunning)
        );
        let mut multitask = Session::new(GameMode::Multitask, config());
        multitask.start(0);
        assert_eq!(multitask.select(1), Err(Rejection::SelectionUnused));
    }
}
