use std::sync::Arc;

use cyclemart_domain::repository::CycleRepository;
use cyclemart_hold::{HoldManager, SettlementService};
use cyclemart_store::ChangeNotifier;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<HoldManager>,
    pub settlement: Arc<SettlementService>,
    pub cycles: Arc<dyn CycleRepository>,
    pub notifier: ChangeNotifier,
}
