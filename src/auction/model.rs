use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// 경매 모델 (차량당 1:1)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Auction {
    pub id: i64,
    pub car_id: i64,
    pub starting_price: Decimal,
    pub reserve_price: Option<Decimal>,
    pub current_price: Decimal,
    pub min_increment: Decimal,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

// 입찰 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_name: String,
    pub bidder_phone: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Auction {
    /// 새 입찰이 유효하기 위한 최소 금액
    pub fn minimum_bid(&self) -> Decimal {
        self.current_price + self.min_increment
    }
}
