use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub booking_id: String,
    pub percentage: u32,
    pub suggested_amount: Decimal,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}
