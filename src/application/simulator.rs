// Telemetry simulator - random-walk live data with threshold alarms
use crate::domain::alarm::{AlarmEvent, AlarmLog, classify_crossing};
use crate::domain::equipment::{EquipmentRecord, Measurement, MeasurementHistory};
use crate::domain::summary::round1;
use crate::infrastructure::config::SimulationConfig;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Next value of a random walk: rounded to one decimal, never negative,
/// and never more than `max_step` away from `previous`.
pub fn next_sample(previous: f64, delta: f64, max_step: f64) -> f64 {
    let delta = delta.clamp(-max_step, max_step);
    round1(previous + delta)
        .clamp(previous - max_step, previous + max_step)
        .max(0.0)
}

/// A working copy of a dataset's records that advances one tick at a time.
#[derive(Debug, Clone)]
pub struct TelemetrySimulator {
    records: Vec<EquipmentRecord>,
    settings: SimulationConfig,
}

impl TelemetrySimulator {
    /// Clone `records` and start every rolling window at the record's current sample.
    pub fn seed(records: &[EquipmentRecord], settings: SimulationConfig) -> Self {
        let records = records
            .iter()
            .map(|record| {
                let mut copy = record.clone();
                copy.history = Some(MeasurementHistory::seeded(record));
                copy
            })
            .collect();

        Self { records, settings }
    }

    pub fn records(&self) -> &[EquipmentRecord] {
        &self.records
    }

    /// Perturb every record once; returns the alarms raised by this tick in record order.
    pub fn tick<R: Rng>(
        &mut self,
        rng: &mut R,
        threshold: f64,
        now: DateTime<Utc>,
    ) -> Vec<AlarmEvent> {
        let steps = Measurement::ALL.map(|m| self.settings.max_step(m));
        let mut alarms = Vec::new();

        for index in 0..self.records.len() {
            let deltas = steps.map(|step| rng.random_range(-step..=step));
            if let Some(alarm) = self.advance(index, deltas, threshold, now) {
                alarms.push(alarm);
            }
        }

        alarms
    }

    /// Apply one step to a single record with the given per-quantity deltas.
    pub fn advance(
        &mut self,
        index: usize,
        deltas: [f64; 3],
        threshold: f64,
        now: DateTime<Utc>,
    ) -> Option<AlarmEvent> {
        let settings = &self.settings;
        let record = self.records.get_mut(index)?;
        let previous_pressure = record.pressure;

        for (measurement, delta) in Measurement::ALL.into_iter().zip(deltas) {
            let next = next_sample(record.value(measurement), delta, settings.max_step(measurement));
            record
                .history
                .get_or_insert_with(MeasurementHistory::default)
                .window_mut(measurement)
                .push(next);
            record.set_value(measurement, next);
        }

        let severity = classify_crossing(
            previous_pressure,
            record.pressure,
            threshold,
            settings.critical_margin,
        )?;

        tracing::debug!(
            "Pressure alarm on {}: {} -> {} (threshold {})",
            record.name,
            previous_pressure,
            record.pressure,
            threshold
        );

        Some(AlarmEvent {
            id: format!("alarm-{}-{}", now.timestamp_millis(), index),
            timestamp: now.to_rfc3339(),
            equipment_name: record.name.clone(),
            parameter: Measurement::Pressure,
            value: record.pressure,
            severity,
        })
    }
}

struct LiveState {
    working: Option<TelemetrySimulator>,
    alarms: AlarmLog,
    threshold: f64,
    // Bumped on every start/stop so a tick from an older loop never lands.
    generation: u64,
    task: Option<JoinHandle<()>>,
}

/// Idle/running state machine around a [`TelemetrySimulator`] driven by a tokio interval.
#[derive(Clone)]
pub struct Simulation {
    settings: SimulationConfig,
    live: Arc<Mutex<LiveState>>,
}

impl Simulation {
    pub fn new(settings: SimulationConfig, threshold: f64) -> Self {
        let live = LiveState {
            working: None,
            alarms: AlarmLog::new(settings.alarm_capacity),
            threshold,
            generation: 0,
            task: None,
        };
        Self {
            settings,
            live: Arc::new(Mutex::new(live)),
        }
    }

    /// Enter running. A no-op when a tick loop is already active.
    pub async fn start(&self, records: &[EquipmentRecord]) {
        let mut live = self.live.lock().await;
        if live.task.is_some() {
            return;
        }

        if live.working.is_none() {
            live.working = Some(TelemetrySimulator::seed(records, self.settings.clone()));
        }
        live.generation += 1;

        let generation = live.generation;
        let period = self.settings.tick_period();
        let shared = self.live.clone();

        tracing::info!(
            "Simulation started on {} records ({:?} tick)",
            records.len(),
            period
        );

        live.task = Some(tokio::spawn(async move {
            let mut rng = StdRng::from_os_rng();
            let mut interval = tokio::time::interval(period);
            // A late tick pushes the schedule back instead of bursting to catch up.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of an interval completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;

                let mut live = shared.lock().await;
                if live.generation != generation {
                    break;
                }
                let threshold = live.threshold;
                let Some(working) = live.working.as_mut() else {
                    break;
                };

                let raised = working.tick(&mut rng, threshold, Utc::now());
                for alarm in raised {
                    live.alarms.raise(alarm);
                }
            }
        }));
    }

    /// Enter idle: cancel any pending tick and discard the working copy. Alarms are kept.
    pub async fn stop(&self) {
        let mut live = self.live.lock().await;
        live.generation += 1;
        live.working = None;
        if let Some(task) = live.task.take() {
            task.abort();
            tracing::info!("Simulation stopped");
        }
    }

    pub async fn set_threshold(&self, threshold: f64) {
        self.live.lock().await.threshold = threshold;
    }

    pub async fn reset_alarms(&self) {
        self.live.lock().await.alarms.clear();
    }

    pub async fn alarms(&self) -> Vec<AlarmEvent> {
        self.live.lock().await.alarms.snapshot()
    }

    /// Current simulated records, if running.
    pub async fn snapshot(&self) -> Option<Vec<EquipmentRecord>> {
        let live = self.live.lock().await;
        live.working.as_ref().map(|w| w.records().to_vec())
    }
}
