pub mod manager;
pub mod refresh;
pub mod settlement;

pub use manager::HoldManager;
pub use refresh::{RefreshLoop, Refresher};
pub use settlement::SettlementService;
