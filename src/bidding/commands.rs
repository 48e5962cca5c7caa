/// 입찰 관련 커맨드 처리
/// 1. 입찰
/// 2. 입찰 삭제 (관리자 정정)
/// 3. 경매 조건 수정 / 취소 / 종료
// region:    --- Imports
use crate::auction::lifecycle::AuctionStatus;
use crate::auction::model::{Auction, Bid};
use crate::bidding::serializer::AuctionSerializer;
use crate::error::{AuctionError, AuctionResult};
use crate::store::{AuctionFilter, AuctionStore, NewAuction, TermsUpdate};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands

/// 입찰 명령
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidCommand {
    pub bidder_name: String,
    pub phone_number: String,
    pub amount: Decimal,
}

/// 경매 조건 수정 명령
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuctionCommand {
    pub end_time: Option<chrono::DateTime<Utc>>,
    pub status: Option<AuctionStatus>,
    pub reserve_price: Option<Decimal>,
    pub min_increment: Option<Decimal>,
}

// endregion: --- Commands

// region:    --- Bid Service

/// 입찰 서비스 (파사드)
/// 검증기 + 직렬화기 + 저장소를 조합한다. 경매 상태를 요청 사이에 캐시하지 않으며,
/// 모든 변이는 해당 경매의 직렬화 구간 안에서 권위 있는 스냅샷을 다시 읽는다.
pub struct BidService {
    store: Arc<dyn AuctionStore>,
    serializer: AuctionSerializer,
}

impl BidService {
    pub fn new(store: Arc<dyn AuctionStore>) -> Self {
        Self {
            store,
            serializer: AuctionSerializer::default(),
        }
    }

    /// 잠금 획득 시간 제한을 지정한 구성 (과부하 시험용)
    pub fn with_acquire_timeout(
        store: Arc<dyn AuctionStore>,
        acquire_timeout: std::time::Duration,
    ) -> Self {
        Self {
            store,
            serializer: AuctionSerializer::new(acquire_timeout),
        }
    }

    /// 입찰 적용. 수락 시 입찰 기록과 현재가 갱신이 한 트랜잭션으로 영속된다.
    /// 거절 시 아무것도 변이하지 않고 타입화된 오류를 돌려준다.
    pub async fn place_bid(&self, auction_id: i64, cmd: PlaceBidCommand) -> AuctionResult<Bid> {
        info!(
            "{:<12} --> 입찰 요청 처리 시작 경매 id: {}, 금액: {}",
            "Command", auction_id, cmd.amount
        );
        let store = Arc::clone(&self.store);
        self.serializer
            .with_auction(auction_id, async move {
                store.place_bid(auction_id, &cmd, Utc::now()).await
            })
            .await
    }

    /// 관리자 입찰 삭제. 현재가 재계산은 삭제와 같은 직렬화 구간에서 수행되어
    /// 삭제 전 가격을 읽은 동시 입찰과 경합하지 않는다.
    pub async fn delete_bid(&self, auction_id: i64, bid_id: i64) -> AuctionResult<Decimal> {
        info!(
            "{:<12} --> 입찰 삭제 요청 경매 id: {}, 입찰 id: {}",
            "Command", auction_id, bid_id
        );
        let store = Arc::clone(&self.store);
        self.serializer
            .with_auction(auction_id, async move {
                store.remove_bid(auction_id, bid_id).await
            })
            .await
    }

    /// 경매 조건 수정. 과거 종료 시간은 거절한다.
    /// 입찰이 존재해도 endTime/minIncrement 수정은 허용되지만 운영 로그로 경고를 남긴다.
    pub async fn update_terms(
        &self,
        auction_id: i64,
        cmd: UpdateAuctionCommand,
    ) -> AuctionResult<Auction> {
        info!(
            "{:<12} --> 경매 조건 수정 요청 id: {}: {:?}",
            "Command", auction_id, cmd
        );
        let store = Arc::clone(&self.store);
        self.serializer
            .with_auction(auction_id, async move {
                let bid_count = store.count_bids(auction_id).await?;
                if bid_count > 0 && (cmd.end_time.is_some() || cmd.min_increment.is_some()) {
                    warn!(
                        "{:<12} --> 입찰 {}건이 있는 경매 {}의 조건을 수정합니다. 시작가 파생 필드는 참고용입니다.",
                        "Command", bid_count, auction_id
                    );
                }
                let update = TermsUpdate {
                    end_time: cmd.end_time,
                    status: cmd.status,
                    reserve_price: cmd.reserve_price,
                    min_increment: cmd.min_increment,
                };
                store.update_terms(auction_id, update, Utc::now()).await
            })
            .await
    }

    /// 경매 취소 (관리자 조치 또는 차량 가격 유형의 고정가 전환)
    pub async fn cancel_auction(&self, auction_id: i64) -> AuctionResult<()> {
        info!("{:<12} --> 경매 취소 요청 id: {}", "Command", auction_id);
        let store = Arc::clone(&self.store);
        self.serializer
            .with_auction(auction_id, async move {
                store.set_status(auction_id, AuctionStatus::Cancelled).await
            })
            .await
    }

    /// 경매 수동 종료. 최고 입찰은 기록상 낙찰 후보로 남지만 자동 SOLD 전이는 없다
    /// (유보가 미달 경매의 자동 낙찰을 막기 위한 분리된 관리자 단계).
    pub async fn close_auction(&self, auction_id: i64) -> AuctionResult<()> {
        info!("{:<12} --> 경매 종료 요청 id: {}", "Command", auction_id);
        let store = Arc::clone(&self.store);
        self.serializer
            .with_auction(auction_id, async move {
                store.set_status(auction_id, AuctionStatus::Ended).await
            })
            .await
    }

    /// 경매 삭제 (차량 삭제 연쇄). 입찰도 함께 삭제된다.
    pub async fn delete_auction(&self, auction_id: i64) -> AuctionResult<()> {
        info!("{:<12} --> 경매 삭제 요청 id: {}", "Command", auction_id);
        let store = Arc::clone(&self.store);
        self.serializer
            .with_auction(auction_id, async move {
                store.delete_auction(auction_id).await
            })
            .await
    }

    /// 경매 생성 (차량 가격 유형이 AUCTION으로 설정될 때 차량 모듈 경계에서 호출)
    pub async fn create_auction(&self, new: NewAuction) -> AuctionResult<Auction> {
        if new.starting_price < Decimal::ZERO {
            return Err(AuctionError::Validation {
                field: "startingPrice",
                message: "시작가는 음수일 수 없습니다.".to_string(),
            });
        }
        if let Some(reserve) = new.reserve_price {
            if reserve < new.starting_price {
                return Err(AuctionError::Validation {
                    field: "reservePrice",
                    message: "유보가는 시작가 이상이어야 합니다.".to_string(),
                });
            }
        }
        if new.min_increment < Decimal::ZERO {
            return Err(AuctionError::Validation {
                field: "minIncrement",
                message: "최소 증가분은 음수일 수 없습니다.".to_string(),
            });
        }
        if new.end_time <= Utc::now() {
            return Err(AuctionError::Validation {
                field: "endTime",
                message: "종료 시간은 미래여야 합니다.".to_string(),
            });
        }
        self.store.create_auction(new).await
    }

    // --- 읽기 경로 (직렬화 불필요, 서로 다른 경매와 완전히 병행)

    pub async fn get_auction(&self, auction_id: i64) -> AuctionResult<Auction> {
        self.store
            .get_auction(auction_id)
            .await?
            .ok_or_else(|| AuctionError::auction_not_found(auction_id))
    }

    pub async fn list_auctions(&self, filter: AuctionFilter) -> AuctionResult<Vec<Auction>> {
        self.store.list_auctions(filter).await
    }

    /// 입찰 이력 조회 (경매 존재 확인 포함)
    pub async fn list_bids(&self, auction_id: i64) -> AuctionResult<Vec<Bid>> {
        self.get_auction(auction_id).await?;
        self.store.list_bids(auction_id).await
    }
}

// endregion: --- Bid Service
