use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the buyer settles out-of-band: a UPI deep link/QR or cash in person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Upi,
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Upi => "upi",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upi" => Ok(PaymentMethod::Upi),
            "cash" => Ok(PaymentMethod::Cash),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "approved" => Ok(PaymentStatus::Approved),
            "rejected" => Ok(PaymentStatus::Rejected),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// A manually-reviewed payment awaiting admin approval. Approval finalizes
/// the purchase and releases the hold; rejection just releases the hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub id: Uuid,
    pub cycle_id: Uuid,
    pub hold_id: Uuid,
    pub amount: i64,
    pub method: PaymentMethod,
    /// Human-facing bill number, generated at request time.
    pub order_id: String,
    /// Payer-supplied reference (UPI transaction id); absent for cash.
    pub payment_ref: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The finalized purchase record, written exactly once on approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    pub cycle_id: Uuid,
    pub buyer_name: String,
    pub buyer_email: String,
    pub bill_number: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}
