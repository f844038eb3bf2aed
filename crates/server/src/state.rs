//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use ksurplus_core::DailyReservationPolicy;

use crate::config::ServerConfig;
use crate::realtime::Broadcaster;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    broadcaster: Broadcaster,
    reservation_policy: DailyReservationPolicy,
}

impl AppState {
    /// Create the application state, with a fresh broadcaster sized from
    /// the configuration.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let broadcaster = Broadcaster::new(config.broadcast_capacity);
        let reservation_policy = DailyReservationPolicy::new(config.daily_reservation_limit);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                broadcaster,
                reservation_policy,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Realtime event fan-out.
    #[must_use]
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.inner.broadcaster
    }

    /// Daily reservation limit applied to customers.
    #[must_use]
    pub fn reservation_policy(&self) -> DailyReservationPolicy {
        self.inner.reservation_policy
    }
}
