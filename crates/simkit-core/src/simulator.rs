//! Simulator
//!
//! Owns the world and runs the tick pipeline. Each `step()` is one pass
//! through perception, decision, execution and memory, producing a
//! [`SimTickRecord`].

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use simkit_events::{SimAction, SimEvent, SimExport, SimTickRecord, SimTrace};

use crate::actions::{ActionCtx, EventSequence};
use crate::config::SimConfig;
use crate::error::Result;
use crate::output::{build_snapshot, compute_deltas};
use crate::plugin::SimPlugin;
use crate::rng::SimRng;
use crate::spatial;
use crate::systems::{
    drain_events, enumerate_action_offers, execute_actions, merge_inbox, select_actions,
    update_context_facts,
};
use crate::world::World;

pub struct Simulator {
    world: World,
    initial: World,
    config: SimConfig,
    rng: SimRng,
    plugins: Vec<Box<dyn SimPlugin>>,
    forced: Vec<SimAction>,
    history: VecDeque<SimTickRecord>,
}

impl Simulator {
    /// Creates a simulator over a validated world, seeded from `world.seed`.
    pub fn new(world: World, config: SimConfig) -> Result<Self> {
        world.validate()?;
        Ok(Self {
            rng: SimRng::new(world.seed),
            initial: world.clone(),
            world,
            config,
            plugins: Vec::new(),
            forced: Vec::new(),
            history: VecDeque::new(),
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tick_index(&self) -> u64 {
        self.world.tick_index
    }

    pub fn history(&self) -> &VecDeque<SimTickRecord> {
        &self.history
    }

    pub fn last_record(&self) -> Option<&SimTickRecord> {
        self.history.back()
    }

    /// Plugins are consulted in registration order.
    pub fn register_plugin(&mut self, plugin: Box<dyn SimPlugin>) {
        tracing::debug!(plugin = plugin.name(), "registered plugin");
        self.plugins.push(plugin);
    }

    /// Forces an action on the next tick. While the queue is non-empty it
    /// replaces plugin and greedy selection for that tick.
    pub fn enqueue_action(&mut self, action: SimAction) {
        self.forced.push(action);
    }

    /// Queues an event to be drained during the next tick.
    pub fn enqueue_event(&mut self, event: SimEvent) {
        self.world.push_event(event);
    }

    /// Advances the world by one tick.
    pub fn step(&mut self) -> Result<SimTickRecord> {
        let w0 = self.world.clone();
        let tick = self.world.tick_index;

        spatial::resolve_all_positions(&mut self.world)?;
        let spatial_cfg = self.config.spatial.effective(&self.world);
        update_context_facts(&mut self.world, &spatial_cfg)?;

        let offers = {
            let ctx = ActionCtx::new(&self.world, &self.config);
            enumerate_action_offers(&ctx)?
        };

        let forced = std::mem::take(&mut self.forced);
        let selected = select_actions(
            &self.world,
            &self.config,
            &offers,
            forced,
            &mut self.plugins,
            &mut self.rng,
        );

        let mut seq = EventSequence::new(tick);
        let report = execute_actions(
            &mut self.world,
            &selected.actions,
            &self.config,
            &spatial_cfg,
            &mut self.rng,
            &mut seq,
        )?;

        let (applied_events, perception) =
            drain_events(&mut self.world, &spatial_cfg, &self.config.memory)?;
        let merged = merge_inbox(
            &mut self.world,
            &self.config.acceptance,
            &self.config.memory,
            tick,
        )?;

        let snapshot = build_snapshot(
            &self.world,
            &applied_events,
            offers.len(),
            self.config.simulation.tick_ms,
        )?;
        let deltas = compute_deltas(&w0, &self.world);

        let mut notes = vec![format!("decided_by: {}", selected.source)];
        notes.extend(selected.notes);
        notes.extend(report.notes);

        tracing::debug!(
            tick,
            source = %selected.source,
            offers = offers.len(),
            applied = report.applied.len(),
            events = applied_events.len(),
            speech = perception.speech_delivered,
            observations = perception.observations,
            accepted = merged.accepted,
            quarantined = merged.quarantined,
            rejected = merged.rejected,
            "tick complete"
        );

        let record = SimTickRecord {
            snapshot,
            trace: SimTrace {
                actions_proposed: offers,
                actions_applied: report.applied,
                events_applied: applied_events.iter().map(|e| e.id.clone()).collect(),
                deltas,
                action_validations: report.validations,
                notes,
            },
        };

        for plugin in self.plugins.iter_mut() {
            plugin.after_snapshot(&record);
        }

        self.history.push_back(record.clone());
        while self.history.len() > self.config.simulation.max_records {
            self.history.pop_front();
        }
        self.world.tick_index += 1;

        Ok(record)
    }

    /// Runs `ticks` steps and returns their records.
    pub fn run(&mut self, ticks: u64) -> Result<Vec<SimTickRecord>> {
        let mut records = Vec::new();
        for _ in 0..ticks {
            records.push(self.step()?);
        }
        Ok(records)
    }

    /// Restores the initial world under a new seed. History and the forced
    /// queue are cleared; registered plugins are kept.
    pub fn reset(&mut self, seed: u64) {
        self.world = self.initial.clone();
        self.world.seed = seed;
        self.rng.reseed(seed);
        self.history.clear();
        self.forced.clear();
    }

    /// Packages the retained history as an export.
    pub fn export(&self, scenario_id: &str) -> SimExport {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        SimExport::new(
            scenario_id,
            self.world.seed,
            created_at,
            self.history.iter().cloned().collect(),
        )
    }

    /// Exports the retained history to `path`, creating parent directories.
    pub fn write_export(&self, scenario_id: &str, path: impl AsRef<Path>) -> Result<SimExport> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let export = self.export(scenario_id);
        export.write_to_file(path)?;
        Ok(export)
    }
}
