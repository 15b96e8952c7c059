use std::sync::Arc;
use std::time::{Instant, SystemTime};

use satprep_algo::{EwmaParams, RoutingRiskParams, ScoreScale, WeaknessParams};

use crate::db::DatabaseProxy;

/// Tunable parameter sets for the assessment core, fixed at startup and
/// shared read-only across handlers.
#[derive(Debug, Default)]
pub struct EngineParams {
    pub score_scale: ScoreScale,
    pub ewma: EwmaParams,
    pub weakness: WeaknessParams,
    pub routing_risk: RoutingRiskParams,
}

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    db_proxy: Option<Arc<DatabaseProxy>>,
    engine: Arc<EngineParams>,
}

impl AppState {
    pub fn new(db_proxy: Option<Arc<DatabaseProxy>>) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            db_proxy,
            engine: Arc::new(EngineParams::default()),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn db_proxy(&self) -> Option<Arc<DatabaseProxy>> {
        self.db_proxy.clone()
    }

    pub fn engine(&self) -> Arc<EngineParams> {
        Arc::clone(&self.engine)
    }
}
