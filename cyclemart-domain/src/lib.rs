pub mod cycle;
pub mod error;
pub mod events;
pub mod hold;
pub mod repository;
pub mod settlement;

pub use cycle::{Cycle, CycleSummary};
pub use error::HoldError;
pub use events::{ChangeKind, HoldChange};
pub use hold::{Hold, HoldWithCycle, RemainingTime, Requester, DEFAULT_HOLD_MINUTES};
pub use settlement::{PaymentMethod, PaymentRequest, PaymentStatus, Purchase};
