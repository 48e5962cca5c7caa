/// 경매 저장소
/// 경매와 입찰의 영속 기록을 소유하며 디스크 불변식을 책임진다.
/// 모든 변이는 단일 트랜잭션 안에서 경매 행 잠금(SELECT ... FOR UPDATE)을 잡고 진행하므로
/// 프로세스 내 직렬화기와 무관하게 다중 프로세스 배포에서도 읽기-검증-쓰기가 원자적이다.
// region:    --- Imports
pub mod queries;

use crate::auction::lifecycle::{self, AuctionStatus};
use crate::auction::model::{Auction, Bid};
use crate::bidding::commands::PlaceBidCommand;
use crate::bidding::validator::{self, BidRejection};
use crate::error::{AuctionError, AuctionResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Store Types

/// 경매 생성 입력 (차량 가격 유형이 AUCTION으로 설정될 때 차량 모듈 경계에서 호출)
#[derive(Debug, Clone)]
pub struct NewAuction {
    pub car_id: i64,
    pub starting_price: Decimal,
    pub reserve_price: Option<Decimal>,
    pub min_increment: Decimal,
    pub end_time: DateTime<Utc>,
}

/// 경매 목록 필터
#[derive(Debug, Clone, Default)]
pub struct AuctionFilter {
    pub status: Option<AuctionStatus>,
    /// 비관리자 기본 필터: ACTIVE이면서 아직 만료되지 않은 경매만
    pub only_open: bool,
    pub limit: i64,
    pub offset: i64,
}

/// 경매 조건 수정 입력 (지정된 필드만 갱신)
#[derive(Debug, Clone, Default)]
pub struct TermsUpdate {
    pub end_time: Option<DateTime<Utc>>,
    pub status: Option<AuctionStatus>,
    pub reserve_price: Option<Decimal>,
    pub min_increment: Option<Decimal>,
}

// endregion: --- Store Types

// region:    --- Store Trait

#[async_trait]
pub trait AuctionStore: Send + Sync {
    async fn create_auction(&self, new: NewAuction) -> AuctionResult<Auction>;
    async fn get_auction(&self, auction_id: i64) -> AuctionResult<Option<Auction>>;
    async fn list_auctions(&self, filter: AuctionFilter) -> AuctionResult<Vec<Auction>>;
    async fn list_bids(&self, auction_id: i64) -> AuctionResult<Vec<Bid>>;
    async fn count_bids(&self, auction_id: i64) -> AuctionResult<i64>;

    /// 입찰 적용: 행 잠금 아래에서 스냅샷 재검증 후 입찰 기록과 현재가 갱신을 한 트랜잭션으로 수행.
    /// 종료 시간이 지난 ACTIVE 경매를 만나면 같은 트랜잭션에서 ENDED로 전이시키고 거절한다.
    async fn place_bid(
        &self,
        auction_id: i64,
        cmd: &PlaceBidCommand,
        now: DateTime<Utc>,
    ) -> AuctionResult<Bid>;

    /// 관리자 입찰 삭제: 같은 트랜잭션 안에서 현재가를
    /// max(남은 입찰) 없으면 starting_price로 재계산한다. 재계산된 현재가를 돌려준다.
    async fn remove_bid(&self, auction_id: i64, bid_id: i64) -> AuctionResult<Decimal>;

    async fn update_terms(
        &self,
        auction_id: i64,
        update: TermsUpdate,
        now: DateTime<Utc>,
    ) -> AuctionResult<Auction>;

    /// 종결 전이 (취소/종료). 존재 여부 외 추가 검증 없음.
    async fn set_status(&self, auction_id: i64, status: AuctionStatus) -> AuctionResult<()>;

    /// 경매 삭제 (입찰 연쇄 삭제)
    async fn delete_auction(&self, auction_id: i64) -> AuctionResult<()>;

    /// 만료된 ACTIVE 경매를 ENDED로 전이. 전이된 행 수를 돌려준다.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> AuctionResult<u64>;
}

// endregion: --- Store Trait

// region:    --- Postgres Store

pub struct PostgresAuctionStore {
    pool: Arc<PgPool>,
}

impl PostgresAuctionStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn create_auction(&self, new: NewAuction) -> AuctionResult<Auction> {
        let auction = sqlx::query_as::<_, Auction>(queries::INSERT_AUCTION)
            .bind(new.car_id)
            .bind(new.starting_price)
            .bind(new.reserve_price)
            .bind(new.min_increment)
            .bind(new.end_time)
            .fetch_one(&*self.pool)
            .await
            .map_err(|err| match &err {
                // car_id 유니크 제약 위반은 클라이언트 실수로 분류
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    car_already_on_auction(new.car_id)
                }
                _ => AuctionError::from(err),
            })?;
        info!(
            "{:<12} --> 경매 생성 id: {} (차량 id: {})",
            "Store", auction.id, auction.car_id
        );
        Ok(auction)
    }

    async fn get_auction(&self, auction_id: i64) -> AuctionResult<Option<Auction>> {
        let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
            .bind(auction_id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(auction)
    }

    async fn list_auctions(&self, filter: AuctionFilter) -> AuctionResult<Vec<Auction>> {
        let status = filter.status.map(|s| s.as_str().to_string());
        let auctions = sqlx::query_as::<_, Auction>(queries::LIST_AUCTIONS)
            .bind(status)
            .bind(filter.only_open)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&*self.pool)
            .await?;
        Ok(auctions)
    }

    async fn list_bids(&self, auction_id: i64) -> AuctionResult<Vec<Bid>> {
        let bids = sqlx::query_as::<_, Bid>(queries::LIST_BIDS)
            .bind(auction_id)
            .fetch_all(&*self.pool)
            .await?;
        Ok(bids)
    }

    async fn count_bids(&self, auction_id: i64) -> AuctionResult<i64> {
        let row = sqlx::query(queries::COUNT_BIDS)
            .bind(auction_id)
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get("bid_count"))
    }

    async fn place_bid(
        &self,
        auction_id: i64,
        cmd: &PlaceBidCommand,
        now: DateTime<Utc>,
    ) -> AuctionResult<Bid> {
        let mut tx = self.pool.begin().await?;

        // 행 잠금 아래의 최신 스냅샷 (클라이언트가 본 상태가 아님)
        let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION_FOR_UPDATE)
            .bind(auction_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AuctionError::auction_not_found(auction_id))?;

        match validator::evaluate(&auction, cmd, now) {
            Ok(()) => {}
            Err(BidRejection::Ended) => {
                // 스윕보다 먼저 만난 만료: 같은 트랜잭션에서 ENDED 전이 적용 후 거절
                sqlx::query(queries::UPDATE_STATUS)
                    .bind(AuctionStatus::Ended.as_str())
                    .bind(auction_id)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                info!(
                    "{:<12} --> 늦은 입찰로 종료 전이 적용 id: {}",
                    "Store", auction_id
                );
                return Err(BidRejection::Ended.into());
            }
            Err(rejection) => return Err(rejection.into()),
        }

        let bid = sqlx::query_as::<_, Bid>(queries::INSERT_BID)
            .bind(auction_id)
            .bind(cmd.bidder_name.trim())
            .bind(&cmd.phone_number)
            .bind(cmd.amount)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(queries::UPDATE_CURRENT_PRICE)
            .bind(cmd.amount)
            .bind(auction_id)
            .execute(&mut *tx)
            .await?;

        // 입찰 기록과 현재가 갱신은 함께 커밋되거나 함께 버려진다.
        tx.commit().await?;
        Ok(bid)
    }

    async fn remove_bid(&self, auction_id: i64, bid_id: i64) -> AuctionResult<Decimal> {
        let mut tx = self.pool.begin().await?;

        let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION_FOR_UPDATE)
            .bind(auction_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AuctionError::auction_not_found(auction_id))?;

        sqlx::query_as::<_, Bid>(queries::GET_BID)
            .bind(bid_id)
            .bind(auction_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AuctionError::bid_not_found(bid_id))?;

        sqlx::query(queries::DELETE_BID)
            .bind(bid_id)
            .execute(&mut *tx)
            .await?;

        // 남은 입찰이 없으면 시작가로 복귀
        let highest: Option<Decimal> = sqlx::query(queries::GET_HIGHEST_REMAINING_BID)
            .bind(auction_id)
            .fetch_one(&mut *tx)
            .await?
            .get("highest");
        let new_price = highest.unwrap_or(auction.starting_price);

        sqlx::query(queries::UPDATE_CURRENT_PRICE)
            .bind(new_price)
            .bind(auction_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(
            "{:<12} --> 입찰 삭제 id: {} (경매 id: {}, 재계산 현재가: {})",
            "Store", bid_id, auction_id, new_price
        );
        Ok(new_price)
    }

    async fn update_terms(
        &self,
        auction_id: i64,
        update: TermsUpdate,
        now: DateTime<Utc>,
    ) -> AuctionResult<Auction> {
        let mut tx = self.pool.begin().await?;

        let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION_FOR_UPDATE)
            .bind(auction_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AuctionError::auction_not_found(auction_id))?;

        let merged = merge_terms(&auction, update, now)?;

        let updated = sqlx::query_as::<_, Auction>(queries::UPDATE_TERMS)
            .bind(merged.end_time)
            .bind(merged.status.as_str())
            .bind(merged.reserve_price)
            .bind(merged.min_increment)
            .bind(auction_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn set_status(&self, auction_id: i64, status: AuctionStatus) -> AuctionResult<()> {
        let result = sqlx::query(queries::UPDATE_STATUS)
            .bind(status.as_str())
            .bind(auction_id)
            .execute(&*self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AuctionError::auction_not_found(auction_id));
        }
        Ok(())
    }

    async fn delete_auction(&self, auction_id: i64) -> AuctionResult<()> {
        let result = sqlx::query(queries::DELETE_AUCTION)
            .bind(auction_id)
            .execute(&*self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AuctionError::auction_not_found(auction_id));
        }
        info!("{:<12} --> 경매 삭제 id: {}", "Store", auction_id);
        Ok(())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AuctionResult<u64> {
        let result = sqlx::query(queries::SWEEP_EXPIRED)
            .bind(now)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// endregion: --- Postgres Store

/// 차량 하나당 경매 하나 규칙 위반. Postgres/메모리 저장소가 같은 응답을 내도록 분리.
pub fn car_already_on_auction(car_id: i64) -> AuctionError {
    AuctionError::Conflict {
        code: "CAR_ALREADY_ON_AUCTION",
        message: format!("차량 {}은(는) 이미 경매에 등록되어 있습니다.", car_id),
        minimum: None,
    }
}

// region:    --- Terms Merge

/// 갱신될 조건 필드의 병합 결과
pub struct MergedTerms {
    pub end_time: DateTime<Utc>,
    pub status: AuctionStatus,
    pub reserve_price: Option<Decimal>,
    pub min_increment: Decimal,
}

/// 조건 수정 검증과 병합. Postgres/메모리 저장소가 같은 규칙을 공유하도록 분리.
/// 과거 종료 시간은 거절한다. 재활성화(ENDED/CANCELLED -> ACTIVE)는 병합된 종료 시간이
/// 미래일 때만 허용한다. 입찰이 이미 존재해도 endTime/minIncrement 수정은 허용한다
/// (과거 입찰을 소급 무효화하지 않는다).
pub fn merge_terms(
    auction: &Auction,
    update: TermsUpdate,
    now: DateTime<Utc>,
) -> AuctionResult<MergedTerms> {
    if let Some(end_time) = update.end_time {
        if end_time <= now {
            return Err(AuctionError::Validation {
                field: "endTime",
                message: "종료 시간은 미래여야 합니다.".to_string(),
            });
        }
    }
    let end_time = update.end_time.unwrap_or(auction.end_time);

    let current_status =
        AuctionStatus::parse(&auction.status).unwrap_or(AuctionStatus::Cancelled);
    let status = match update.status {
        Some(next) => {
            if !lifecycle::can_transition(current_status, next) {
                return Err(AuctionError::Conflict {
                    code: "INVALID_TRANSITION",
                    message: format!(
                        "{} 상태에서 {} 상태로 전이할 수 없습니다.",
                        current_status.as_str(),
                        next.as_str()
                    ),
                    minimum: None,
                });
            }
            // 재활성화는 종료 시간 재검증을 요구한다.
            if next == AuctionStatus::Active
                && current_status != AuctionStatus::Active
                && end_time <= now
            {
                return Err(AuctionError::Validation {
                    field: "endTime",
                    message: "재활성화하려면 종료 시간이 미래여야 합니다.".to_string(),
                });
            }
            next
        }
        None => current_status,
    };

    if let Some(reserve) = update.reserve_price {
        if reserve < auction.starting_price {
            return Err(AuctionError::Validation {
                field: "reservePrice",
                message: "유보가는 시작가 이상이어야 합니다.".to_string(),
            });
        }
    }
    let reserve_price = update.reserve_price.or(auction.reserve_price);

    if let Some(increment) = update.min_increment {
        if increment < Decimal::ZERO {
            return Err(AuctionError::Validation {
                field: "minIncrement",
                message: "최소 증가분은 음수일 수 없습니다.".to_string(),
            });
        }
    }
    let min_increment = update.min_increment.unwrap_or(auction.min_increment);

    Ok(MergedTerms {
        end_time,
        status,
        reserve_price,
        min_increment,
    })
}

// endregion: --- Terms Merge

// region:    --- Tests


// endregion: --- Tests
