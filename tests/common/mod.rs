//! 테스트 공용 인메모리 경매 저장소
//! AuctionStore 경계 뒤에서 Postgres 구현과 같은 검증/재계산 규칙을 적용하므로
//! BidService와 라우터를 외부 인프라 없이 구동할 수 있다.
#![allow(dead_code)]

use async_trait::async_trait;
use car_auction_service::auction::lifecycle::AuctionStatus;
use car_auction_service::auction::model::{Auction, Bid};
use car_auction_service::bidding::commands::{BidService, PlaceBidCommand};
use car_auction_service::bidding::validator::{self, BidRejection};
use car_auction_service::error::{AuctionError, AuctionResult};
use car_auction_service::store::{
    car_already_on_auction, merge_terms, AuctionFilter, AuctionStore, NewAuction, TermsUpdate,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration as StdDuration;
use tokio::sync::Mutex;

#[derive(Default)]
struct Inner {
    next_auction_id: i64,
    next_bid_id: i64,
    auctions: HashMap<i64, Auction>,
    bids: HashMap<i64, Vec<Bid>>,
}

#[derive(Default)]
pub struct MemoryAuctionStore {
    inner: Mutex<Inner>,
    /// 입찰 쓰기 직전의 인위적 지연 (직렬화 구간 점유 시나리오 구성용)
    place_delay: StdMutex<Option<StdDuration>>,
}

impl MemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 검증을 우회한 직접 시딩 (만료 시점 테스트 등 임의 상태 구성용)
    pub async fn seed_auction(
        &self,
        starting_price: i64,
        reserve_price: Option<i64>,
        min_increment: i64,
        end_time: DateTime<Utc>,
    ) -> Auction {
        let mut inner = self.inner.lock().await;
        inner.next_auction_id += 1;
        let id = inner.next_auction_id;
        let auction = Auction {
            id,
            car_id: id * 100,
            starting_price: Decimal::from(starting_price),
            reserve_price: reserve_price.map(Decimal::from),
            current_price: Decimal::from(starting_price),
            min_increment: Decimal::from(min_increment),
            end_time,
            status: "ACTIVE".to_string(),
            created_at: Utc::now(),
        };
        inner.auctions.insert(id, auction.clone());
        inner.bids.insert(id, Vec::new());
        auction
    }

    /// 검증을 우회한 입찰 직접 시딩 (표시 순서 등 임의 이력 구성용)
    pub async fn seed_bid(&self, auction_id: i64, amount: i64) -> Bid {
        let mut inner = self.inner.lock().await;
        inner.next_bid_id += 1;
        let bid = Bid {
            id: inner.next_bid_id,
            auction_id,
            bidder_name: "박지훈".to_string(),
            bidder_phone: "010-9876-5432".to_string(),
            amount: Decimal::from(amount),
            created_at: Utc::now(),
        };
        inner.bids.entry(auction_id).or_default().push(bid.clone());
        if let Some(a) = inner.auctions.get_mut(&auction_id) {
            if bid.amount > a.current_price {
                a.current_price = bid.amount;
            }
        }
        bid
    }

    /// 이후 입찰 쓰기가 `delay`만큼 직렬화 구간을 점유하도록 설정
    pub fn set_place_delay(&self, delay: StdDuration) {
        *self.place_delay.lock().unwrap() = Some(delay);
    }

    /// 만료 시나리오 구성을 위한 종료 시간 직접 변경
    pub async fn update_end_time_for_test(&self, auction_id: i64, end_time: DateTime<Utc>) {
        let mut inner = self.inner.lock().await;
        if let Some(auction) = inner.auctions.get_mut(&auction_id) {
            auction.end_time = end_time;
        }
    }
}

#[async_trait]
impl AuctionStore for MemoryAuctionStore {
    async fn create_auction(&self, new: NewAuction) -> AuctionResult<Auction> {
        let mut inner = self.inner.lock().await;
        // car_id 유니크 제약을 Postgres와 동일하게 적용
        if inner.auctions.values().any(|a| a.car_id == new.car_id) {
            return Err(car_already_on_auction(new.car_id));
        }
        inner.next_auction_id += 1;
        let id = inner.next_auction_id;
        let auction = Auction {
            id,
            car_id: new.car_id,
            starting_price: new.starting_price,
            reserve_price: new.reserve_price,
            current_price: new.starting_price,
            min_increment: new.min_increment,
            end_time: new.end_time,
            status: "ACTIVE".to_string(),
            created_at: Utc::now(),
        };
        inner.auctions.insert(id, auction.clone());
        inner.bids.insert(id, Vec::new());
        Ok(auction)
    }

    async fn get_auction(&self, auction_id: i64) -> AuctionResult<Option<Auction>> {
        let inner = self.inner.lock().await;
        Ok(inner.auctions.get(&auction_id).cloned())
    }

    async fn list_auctions(&self, filter: AuctionFilter) -> AuctionResult<Vec<Auction>> {
        let inner = self.inner.lock().await;
        let now = Utc::now();
        let mut auctions: Vec<Auction> = inner
            .auctions
            .values()
            .filter(|a| match filter.status {
                Some(status) => a.status == status.as_str(),
                None => true,
            })
            .filter(|a| !filter.only_open || (a.status == "ACTIVE" && a.end_time > now))
            .cloned()
            .collect();
        auctions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(auctions
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn list_bids(&self, auction_id: i64) -> AuctionResult<Vec<Bid>> {
        let inner = self.inner.lock().await;
        let mut bids = inner.bids.get(&auction_id).cloned().unwrap_or_default();
        bids.sort_by(|a, b| {
            b.amount
                .cmp(&a.amount)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(bids)
    }

    async fn count_bids(&self, auction_id: i64) -> AuctionResult<i64> {
        let inner = self.inner.lock().await;
        Ok(inner.bids.get(&auction_id).map(|b| b.len()).unwrap_or(0) as i64)
    }

    async fn place_bid(
        &self,
        auction_id: i64,
        cmd: &PlaceBidCommand,
        now: DateTime<Utc>,
    ) -> AuctionResult<Bid> {
        let delay = *self.place_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut inner = self.inner.lock().await;
        let auction = inner
            .auctions
            .get(&auction_id)
            .cloned()
            .ok_or_else(|| AuctionError::auction_not_found(auction_id))?;

        match validator::evaluate(&auction, cmd, now) {
            Ok(()) => {}
            Err(BidRejection::Ended) => {
                // 쓰기 경계의 지연 전이
                if let Some(a) = inner.auctions.get_mut(&auction_id) {
                    a.status = AuctionStatus::Ended.as_str().to_string();
                }
                return Err(BidRejection::Ended.into());
            }
            Err(rejection) => return Err(rejection.into()),
        }

        inner.next_bid_id += 1;
        let bid = Bid {
            id: inner.next_bid_id,
            auction_id,
            bidder_name: cmd.bidder_name.trim().to_string(),
            bidder_phone: cmd.phone_number.clone(),
            amount: cmd.amount,
            created_at: now,
        };
        inner.bids.entry(auction_id).or_default().push(bid.clone());
        if let Some(a) = inner.auctions.get_mut(&auction_id) {
            a.current_price = cmd.amount;
        }
        Ok(bid)
    }

    async fn remove_bid(&self, auction_id: i64, bid_id: i64) -> AuctionResult<Decimal> {
        let mut inner = self.inner.lock().await;
        let starting_price = inner
            .auctions
            .get(&auction_id)
            .map(|a| a.starting_price)
            .ok_or_else(|| AuctionError::auction_not_found(auction_id))?;

        let bids = inner.bids.entry(auction_id).or_default();
        let before = bids.len();
        bids.retain(|b| b.id != bid_id);
        if bids.len() == before {
            return Err(AuctionError::bid_not_found(bid_id));
        }
        let new_price = bids
            .iter()
            .map(|b| b.amount)
            .max()
            .unwrap_or(starting_price);
        if let Some(a) = inner.auctions.get_mut(&auction_id) {
            a.current_price = new_price;
        }
        Ok(new_price)
    }

    async fn update_terms(
        &self,
        auction_id: i64,
        update: TermsUpdate,
        now: DateTime<Utc>,
    ) -> AuctionResult<Auction> {
        let mut inner = self.inner.lock().await;
        let auction = inner
            .auctions
            .get(&auction_id)
            .cloned()
            .ok_or_else(|| AuctionError::auction_not_found(auction_id))?;
        let merged = merge_terms(&auction, update, now)?;
        let auction = inner.auctions.get_mut(&auction_id).unwrap();
        auction.end_time = merged.end_time;
        auction.status = merged.status.as_str().to_string();
        auction.reserve_price = merged.reserve_price;
        auction.min_increment = merged.min_increment;
        Ok(auction.clone())
    }

    async fn set_status(&self, auction_id: i64, status: AuctionStatus) -> AuctionResult<()> {
        let mut inner = self.inner.lock().await;
        let auction = inner
            .auctions
            .get_mut(&auction_id)
            .ok_or_else(|| AuctionError::auction_not_found(auction_id))?;
        auction.status = status.as_str().to_string();
        Ok(())
    }

    async fn delete_auction(&self, auction_id: i64) -> AuctionResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.auctions.remove(&auction_id).is_none() {
            return Err(AuctionError::auction_not_found(auction_id));
        }
        inner.bids.remove(&auction_id);
        Ok(())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AuctionResult<u64> {
        let mut inner = self.inner.lock().await;
        let mut swept = 0;
        for auction in inner.auctions.values_mut() {
            if auction.status == "ACTIVE" && auction.end_time <= now {
                auction.status = AuctionStatus::Ended.as_str().to_string();
                swept += 1;
            }
        }
        Ok(swept)
    }
}

/// 인메모리 저장소 위에 서비스 구성
pub fn memory_service() -> (Arc<BidService>, Arc<MemoryAuctionStore>) {
    let store = Arc::new(MemoryAuctionStore::new());
    let service = Arc::new(BidService::new(store.clone() as Arc<dyn AuctionStore>));
    (service, store)
}

/// 표준 입찰 명령
pub fn bid(amount: i64) -> PlaceBidCommand {
    PlaceBidCommand {
        bidder_name: "박지훈".to_string(),
        phone_number: "010-9876-5432".to_string(),
        amount: Decimal::from(amount),
    }
}

/// 앞으로 `hours`시간 뒤 종료되는 시각
pub fn ends_in_hours(hours: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(hours)
}
