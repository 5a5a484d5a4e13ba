// Session - the per-login context tying datasets, filter and simulation together
use crate::application::dataset_source::{DatasetSource, SourceError};
use crate::application::simulator::Simulation;
use crate::domain::alarm::AlarmEvent;
use crate::domain::dashboard::DashboardView;
use crate::domain::dataset::DatasetEntry;
use crate::domain::filter::FilterSpec;
use crate::domain::summary::SummaryStats;
use crate::infrastructure::config::AppConfig;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

struct SessionState {
    history: Vec<DatasetEntry>,
    active_id: Option<String>,
    filter: FilterSpec,
}

impl SessionState {
    fn active(&self) -> Option<&DatasetEntry> {
        let id = self.active_id.as_deref()?;
        self.history.iter().find(|entry| entry.id == id)
    }
}

pub struct Session {
    username: String,
    source: Arc<dyn DatasetSource>,
    simulation: Simulation,
    history_capacity: usize,
    state: Mutex<SessionState>,
}

impl Session {
    /// Load history from `source` and make the newest entry active.
    pub async fn open(username: String, source: Arc<dyn DatasetSource>, config: &AppConfig) -> Self {
        let history = source.fetch_history().await.unwrap_or_else(|e| {
            tracing::warn!("Starting {} with empty history: {}", username, e);
            Vec::new()
        });
        let filter = config.filter.to_spec();

        tracing::info!(
            "Session opened for {} via {} source ({} datasets)",
            username,
            source.name(),
            history.len()
        );

        let state = SessionState {
            active_id: history.first().map(|entry| entry.id.clone()),
            history,
            filter: filter.clone(),
        };

        Self {
            username,
            source,
            simulation: Simulation::new(config.simulation.clone(), filter.pressure_threshold),
            history_capacity: config.storage.capacity,
            state: Mutex::new(state),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub async fn history(&self) -> Vec<DatasetEntry> {
        self.state.lock().await.history.clone()
    }

    pub async fn active(&self) -> Option<DatasetEntry> {
        self.state.lock().await.active().cloned()
    }

    /// Submit an upload and make the resulting dataset active.
    pub async fn upload(&self, filename: &str, content: &str) -> Result<DatasetEntry, SourceError> {
        let entry = self.source.submit_dataset(filename, content).await?;

        let mut state = self.state.lock().await;
        state.history.retain(|existing| existing.id != entry.id);
        state.history.insert(0, entry.clone());
        state.history.truncate(self.history_capacity);
        self.activate(&mut state, &entry.id).await;

        Ok(entry)
    }

    /// Switch the active dataset. Stops any simulation and clears alarms.
    /// Returns false when `id` is not in history.
    pub async fn select(&self, id: &str) -> bool {
        let mut state = self.state.lock().await;
        if !state.history.iter().any(|entry| entry.id == id) {
            return false;
        }
        self.activate(&mut state, id).await;
        true
    }

    // Runs under the state lock so no start can pair the old records with the new id.
    async fn activate(&self, state: &mut SessionState, id: &str) {
        state.active_id = Some(id.to_string());
        self.simulation.stop().await;
        self.simulation.reset_alarms().await;
        tracing::debug!("Active dataset for {} is now {}", self.username, id);
    }

    pub async fn filter(&self) -> FilterSpec {
        self.state.lock().await.filter.clone()
    }

    pub async fn set_filter(&self, filter: FilterSpec) {
        self.simulation.set_threshold(filter.pressure_threshold).await;
        self.state.lock().await.filter = filter;
    }

    /// Start simulating the active dataset. Returns false when none is active.
    pub async fn start_simulation(&self) -> bool {
        let state = self.state.lock().await;
        let Some(active) = state.active() else {
            return false;
        };
        self.simulation.start(&active.data).await;
        true
    }

    pub async fn stop_simulation(&self) {
        self.simulation.stop().await;
    }

    pub async fn alarms(&self) -> Vec<AlarmEvent> {
        self.simulation.alarms().await
    }

    pub async fn reset_alarms(&self) {
        self.simulation.reset_alarms().await;
    }

    /// Filtered records of the active dataset (simulated while running) and their summary.
    pub async fn dashboard(&self) -> DashboardView {
        let (active, filter, simulated) = {
            let state = self.state.lock().await;
            let Some(active) = state.active().cloned() else {
                self.simulation.stop().await;
                return DashboardView::empty(self.simulation.alarms().await);
            };
            (active, state.filter.clone(), self.simulation.snapshot().await)
        };

        let simulating = simulated.is_some();
        let records = filter.apply(simulated.as_deref().unwrap_or(&active.data));

        DashboardView {
            dataset_id: Some(active.id),
            filename: Some(active.filename),
            simulating,
            summary: SummaryStats::from_records(&records),
            records,
            alarms: self.simulation.alarms().await,
        }
    }

    pub async fn close(&self) {
        self.simulation.stop().await;
        tracing::info!("Session closed for {}", self.username);
    }
}

/// Owns the single active session: created on login, torn down on logout.
pub struct SessionManager {
    source: Arc<dyn DatasetSource>,
    config: AppConfig,
    current: RwLock<Option<Arc<Session>>>,
}

impl SessionManager {
    pub fn new(source: Arc<dyn DatasetSource>, config: AppConfig) -> Self {
        Self {
            source,
            config,
            current: RwLock::new(None),
        }
    }

    pub async fn login(&self, username: String) -> Arc<Session> {
        let session = Arc::new(Session::open(username, self.source.clone(), &self.config).await);
        let previous = self.current.write().await.replace(session.clone());
        if let Some(previous) = previous {
            previous.close().await;
        }
        session
    }

    pub async fn logout(&self) -> bool {
        let taken = self.current.write().await.take();
        match taken {
            Some(session) => {
                session.close().await;
                true
            }
            None => false,
        }
    }

    pub async fn current(&self) -> Option<Arc<Session>> {
        self.current.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::history_store::HistoryStore;
    use crate::application::ingest::{SAMPLE_CSV, SAMPLE_FILENAME};
    use crate::infrastructure::blob_store::MemoryBlobStore;
    use crate::infrastructure::local_source::LocalSource;
    use std::collections::BTreeSet;

    const TWO_PUMPS: &str = "Equipment,Type,Flowrate,Pressure,Temperature\nPump A,Pump,450.5,12.4,85.0\nPump B,Pump,480.2,13.1,88.5";

    fn local_source() -> Arc<dyn DatasetSource> {
        let history = HistoryStore::new(Arc::new(MemoryBlobStore::new()), "k", 5);
        Arc::new(LocalSource::new(history))
    }

    #[tokio::test]
    async fn test_upload_activates_and_filters() {
        let session = Session::open("operator".to_string(), local_source(), &AppConfig::default()).await;
        assert!(session.active().await.is_none());

        let entry = session.upload("pumps.csv", TWO_PUMPS).await.unwrap();
        assert_eq!(session.active().await.unwrap().id, entry.id);
        assert_eq!(entry.summary.avg_flowrate, 465.35);

        session
            .set_filter(FilterSpec {
                min_flow: 0.0,
                max_flow: 460.0,
                min_pressure: 0.0,
                max_pressure: 100.0,
                selected_types: BTreeSet::new(),
                ..FilterSpec::default()
            })
            .await;

        let view = session.dashboard().await;
        assert!(!view.simulating);
        assert_eq!(view.records.len(), 1);
        assert_eq!(view.records[0].name, "Pump A");
        assert_eq!(view.summary.total_count, 1);
        assert_eq!(view.summary.avg_flowrate, 450.5);
    }

    #[tokio::test]
    async fn test_reopen_activates_newest_from_storage() {
        let source = local_source();
        let first = Session::open("a".to_string(), source.clone(), &AppConfig::default()).await;
        first.upload("one.csv", TWO_PUMPS).await.unwrap();
        let newest = first.upload(SAMPLE_FILENAME, SAMPLE_CSV).await.unwrap();

        let second = Session::open("b".to_string(), source, &AppConfig::default()).await;
        assert_eq!(second.history().await.len(), 2);
        assert_eq!(second.active().await.unwrap().id, newest.id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_never_mutates_stored_dataset() {
        let session = Session::open("operator".to_string(), local_source(), &AppConfig::default()).await;
        assert!(!session.start_simulation().await);

        let entry = session.upload("pumps.csv", TWO_PUMPS).await.unwrap();
        assert!(session.start_simulation().await);

        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        let view = session.dashboard().await;
        assert!(view.simulating);
        assert!(view.records.iter().all(|r| r.history.is_some()));

        session.stop_simulation().await;
        let view = session.dashboard().await;
        assert!(!view.simulating);
        assert_eq!(session.active().await.unwrap(), entry);
        assert_eq!(session.history().await[0], entry);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_stops_simulation_and_unknown_id_is_rejected() {
        let session = Session::open("operator".to_string(), local_source(), &AppConfig::default()).await;
        let first = session.upload("one.csv", TWO_PUMPS).await.unwrap();
        session.upload("two.csv", SAMPLE_CSV).await.unwrap();

        assert!(session.start_simulation().await);
        assert!(!session.select("ds-missing").await);
        assert!(session.dashboard().await.simulating);

        assert!(session.select(&first.id).await);
        let view = session.dashboard().await;
        assert!(!view.simulating);
        assert_eq!(view.dataset_id.as_deref(), Some(first.id.as_str()));
        assert!(view.alarms.is_empty());
    }

    #[tokio::test]
    async fn test_history_capacity_in_session() {
        let session = Session::open("operator".to_string(), local_source(), &AppConfig::default()).await;
        for i in 0..7 {
            session.upload(&format!("{}.csv", i), TWO_PUMPS).await.unwrap();
        }
        let history = session.history().await;
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].filename, "6.csv");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_select_and_start_stay_consistent() {
        let session = Arc::new(
            Session::open("operator".to_string(), local_source(), &AppConfig::default()).await,
        );
        let pumps = session.upload("pumps.csv", TWO_PUMPS).await.unwrap();
        let plant = session.upload(SAMPLE_FILENAME, SAMPLE_CSV).await.unwrap();

        for round in 0..200 {
            let target = if round % 2 == 0 { &pumps } else { &plant };
            let starter = {
                let session = session.clone();
                tokio::spawn(async move { session.start_simulation().await })
            };
            let selector = {
                let session = session.clone();
                let id = target.id.clone();
                tokio::spawn(async move { session.select(&id).await })
            };
            starter.await.unwrap();
            assert!(selector.await.unwrap());

            let view = session.dashboard().await;
            assert_eq!(view.dataset_id.as_deref(), Some(target.id.as_str()));
            if view.simulating {
                let names: Vec<_> = target.data.iter().map(|r| r.name.as_str()).collect();
                assert!(view.records.iter().all(|r| names.contains(&r.name.as_str())));
            }
            session.stop_simulation().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_relogin_closes_previous_session() {
        let manager = SessionManager::new(local_source(), AppConfig::default());
        let first = manager.login("a".to_string()).await;
        first.upload("pumps.csv", TWO_PUMPS).await.unwrap();
        assert!(first.start_simulation().await);
        assert!(first.dashboard().await.simulating);

        let second = manager.login("b".to_string()).await;
        assert!(!first.dashboard().await.simulating);
        assert_eq!(manager.current().await.unwrap().username(), second.username());

        assert!(manager.logout().await);
        assert!(manager.current().await.is_none());
    }

    #[tokio::test]
    async fn test_manager_login_logout() {
        let manager = SessionManager::new(local_source(), AppConfig::default());
        assert!(manager.current().await.is_none());

        let session = manager.login("operator".to_string()).await;
        assert_eq!(session.username(), "operator");
        assert!(manager.current().await.is_some());

        assert!(manager.logout().await);
        assert!(manager.current().await.is_none());
        assert!(!manager.logout().await);
    }
}
