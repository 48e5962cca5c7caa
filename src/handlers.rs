// region:    --- Imports
use crate::auction::lifecycle::{self, AuctionStatus};
use crate::auction::model::{Auction, Bid};
use crate::auth;
use crate::bidding::commands::{BidService, PlaceBidCommand, UpdateAuctionCommand};
use crate::error::{AuctionError, AuctionResult};
use crate::store::{AuctionFilter, NewAuction};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Router

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 50;
pub const MAX_PAGE: i64 = 1_000_000;

/// 경매 라우터 구성
pub fn app(service: Arc<BidService>) -> Router {
    Router::new()
        .route(
            "/auctions",
            get(handle_list_auctions).post(handle_create_auction),
        )
        .route(
            "/auctions/:id",
            get(handle_get_auction)
                .put(handle_update_auction)
                .delete(handle_delete_auction),
        )
        .route("/auctions/:id/bids", post(handle_place_bid))
        .route("/auctions/:id/bids/:bid_id", delete(handle_delete_bid))
        .with_state(service)
}

// endregion: --- Router

// region:    --- Request / Response DTOs

/// 경매 목록 조회 파라미터
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAuctionsParams {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// 경매 생성 요청 (차량 가격 유형이 AUCTION으로 설정될 때의 경계 호출)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuctionRequest {
    pub car_id: i64,
    pub starting_price: Decimal,
    pub reserve_price: Option<Decimal>,
    pub min_increment: Decimal,
    pub end_time: DateTime<Utc>,
}

/// 경매 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionResponse {
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

impl From<Auction> for AuctionResponse {
    fn from(a: Auction) -> Self {
        Self {
            id: a.id,
            car_id: a.car_id,
            starting_price: a.starting_price,
            reserve_price: a.reserve_price,
            current_price: a.current_price,
            min_increment: a.min_increment,
            end_time: a.end_time,
            status: a.status,
            created_at: a.created_at,
        }
    }
}

/// 입찰 응답 (비관리자에게는 전화번호 마스킹)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidResponse {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_name: String,
    pub bidder_phone: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl BidResponse {
    fn from_bid(bid: Bid, admin: bool) -> Self {
        let bidder_phone = if admin {
            bid.bidder_phone
        } else {
            auth::mask_phone(&bid.bidder_phone)
        };
        Self {
            id: bid.id,
            auction_id: bid.auction_id,
            bidder_name: bid.bidder_name,
            bidder_phone,
            amount: bid.amount,
            created_at: bid.created_at,
        }
    }
}

/// 경매 목록 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionListResponse {
    pub auctions: Vec<AuctionResponse>,
    pub page: i64,
    pub per_page: i64,
}

/// 경매 상세 응답 (입찰 이력은 금액 내림차순)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionDetailResponse {
    #[serde(flatten)]
    pub auction: AuctionResponse,
    pub bids: Vec<BidResponse>,
}

/// 입찰 삭제 응답 (재계산된 현재가 포함)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBidResponse {
    pub current_price: Decimal,
}

// endregion: --- Request / Response DTOs

// region:    --- Handlers

/// 경매 목록 조회
/// 비관리자 기본 필터: ACTIVE이면서 아직 만료되지 않은 경매
pub async fn handle_list_auctions(
    State(service): State<Arc<BidService>>,
    headers: HeaderMap,
    Query(params): Query<ListAuctionsParams>,
) -> AuctionResult<impl IntoResponse> {
    let admin = auth::is_admin(&headers);
    info!(
        "{:<12} --> 경매 목록 조회 (admin: {}, 필터: {:?})",
        "Handler", admin, params.status
    );

    let status = match &params.status {
        Some(raw) => Some(AuctionStatus::parse(raw).ok_or(AuctionError::Validation {
            field: "status",
            message: "허용되지 않는 경매 상태입니다.".to_string(),
        })?),
        None => None,
    };

    // 호출자가 임의의 i64를 줄 수 있으므로 오프셋 곱셈 전에 범위를 묶는다
    let page = params.page.unwrap_or(1).clamp(1, MAX_PAGE);
    let per_page = params
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let filter = AuctionFilter {
        status,
        only_open: !admin && status.is_none(),
        limit: per_page,
        offset: (page - 1) * per_page,
    };

    let auctions = service.list_auctions(filter).await?;
    Ok(Json(AuctionListResponse {
        auctions: auctions.into_iter().map(AuctionResponse::from).collect(),
        page,
        per_page,
    }))
}

/// 경매 상세 조회 (입찰 이력 포함, 관리자만 전화번호 원문)
pub async fn handle_get_auction(
    State(service): State<Arc<BidService>>,
    headers: HeaderMap,
    Path(auction_id): Path<i64>,
) -> AuctionResult<impl IntoResponse> {
    info!("{:<12} --> 경매 상세 조회 id: {}", "Handler", auction_id);
    let admin = auth::is_admin(&headers);
    let auction = service.get_auction(auction_id).await?;
    let bids = service.list_bids(auction_id).await?;
    let mut auction = AuctionResponse::from(auction);
    // 스윕이 아직 돌지 않았더라도 만료를 반영해 표시
    if let Some(status) = AuctionStatus::parse(&auction.status) {
        auction.status = lifecycle::effective_status(status, auction.end_time, Utc::now())
            .as_str()
            .to_string();
    }
    Ok(Json(AuctionDetailResponse {
        auction,
        bids: bids
            .into_iter()
            .map(|b| BidResponse::from_bid(b, admin))
            .collect(),
    }))
}

/// 입찰 접수
pub async fn handle_place_bid(
    State(service): State<Arc<BidService>>,
    headers: HeaderMap,
    Path(auction_id): Path<i64>,
    Json(cmd): Json<PlaceBidCommand>,
) -> AuctionResult<impl IntoResponse> {
    let admin = auth::is_admin(&headers);
    let bid = service.place_bid(auction_id, cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(BidResponse::from_bid(bid, admin)),
    ))
}

/// 관리자 입찰 삭제 (현재가 재계산)
pub async fn handle_delete_bid(
    State(service): State<Arc<BidService>>,
    headers: HeaderMap,
    Path((auction_id, bid_id)): Path<(i64, i64)>,
) -> AuctionResult<impl IntoResponse> {
    require_admin(&headers)?;
    let current_price = service.delete_bid(auction_id, bid_id).await?;
    Ok(Json(DeleteBidResponse { current_price }))
}

/// 관리자 경매 생성
pub async fn handle_create_auction(
    State(service): State<Arc<BidService>>,
    headers: HeaderMap,
    Json(req): Json<CreateAuctionRequest>,
) -> AuctionResult<impl IntoResponse> {
    require_admin(&headers)?;
    let auction = service
        .create_auction(NewAuction {
            car_id: req.car_id,
            starting_price: req.starting_price,
            reserve_price: req.reserve_price,
            min_increment: req.min_increment,
            end_time: req.end_time,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(AuctionResponse::from(auction))))
}

/// 관리자 경매 조건 수정
pub async fn handle_update_auction(
    State(service): State<Arc<BidService>>,
    headers: HeaderMap,
    Path(auction_id): Path<i64>,
    Json(cmd): Json<UpdateAuctionCommand>,
) -> AuctionResult<impl IntoResponse> {
    require_admin(&headers)?;
    let auction = service.update_terms(auction_id, cmd).await?;
    Ok(Json(AuctionResponse::from(auction)))
}

/// 관리자 경매 삭제 (입찰 연쇄 삭제)
pub async fn handle_delete_auction(
    State(service): State<Arc<BidService>>,
    headers: HeaderMap,
    Path(auction_id): Path<i64>,
) -> AuctionResult<impl IntoResponse> {
    require_admin(&headers)?;
    service.delete_auction(auction_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn require_admin(headers: &HeaderMap) -> AuctionResult<()> {
    if auth::is_admin(headers) {
        Ok(())
    } else {
        Err(AuctionError::Unauthorized)
    }
}

// endregion: --- Handlers
