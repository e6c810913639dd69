use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rentable cycle. `is_available` is advisory only: the authoritative
/// signal for "can this be reserved right now" is the absence of a blocking
/// hold, not this flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cycle {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub model: String,
    /// Price in paise.
    pub price: i64,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

/// Display attributes joined onto active holds for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub price: i64,
    pub image_url: Option<String>,
}

impl Cycle {
    pub fn summary(&self) -> CycleSummary {
        CycleSummary {
            id: self.id,
            name: self.name.clone(),
            brand: self.brand.clone(),
            model: self.model.clone(),
            price: self.price,
            image_url: self.image_url.clone(),
        }
    }
}
