pub mod app_config;
pub mod cycle_repo;
pub mod database;
pub mod hold_repo;
pub mod memory;
pub mod notifier;
pub mod settlement_repo;

pub use cycle_repo::PgCycleRepository;
pub use database::DbClient;
pub use hold_repo::PgHoldRepository;
pub use memory::MemoryStore;
pub use notifier::ChangeNotifier;
pub use settlement_repo::PgSettlementRepository;

use cyclemart_domain::HoldError;

/// Map a sqlx failure onto the domain taxonomy. Anything that is not a
/// recognizable constraint violation is a transient store problem.
pub(crate) fn store_err(err: sqlx::Error) -> HoldError {
    HoldError::StoreUnavailable(err.to_string())
}
