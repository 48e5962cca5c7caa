/// 경매 만료 스윕 스케줄러
/// 종료 시간이 지난 ACTIVE 경매를 주기적으로 ENDED로 전이시킨다.
/// 쓰기 경계의 지연 감지가 정합성을 책임지므로 스윕은 목록 표시를 신선하게 유지하는 역할이다.
/// ENDED 전이는 자동 SOLD로 이어지지 않는다 (유보가 미달 경매의 자동 낙찰 금지).
// region:    --- Imports
use crate::store::AuctionStore;
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error};

// endregion: --- Imports

// region:    --- Auction Scheduler

/// 경매 만료 스윕 스케줄러
pub struct AuctionScheduler {
    store: Arc<dyn AuctionStore>,
}

impl AuctionScheduler {
    pub fn new(store: Arc<dyn AuctionStore>) -> Self {
        Self { store }
    }

    /// 스윕 시작 (1초 주기)
    pub async fn start(&self) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                match store.sweep_expired(Utc::now()).await {
                    Ok(0) => {}
                    Ok(swept) => {
                        debug!("{:<12} --> 만료 경매 {}건 종료 처리", "Scheduler", swept);
                    }
                    Err(e) => {
                        error!(
                            "{:<12} --> 경매 상태 업데이트 중 오류 발생: {:?}",
                            "Scheduler", e
                        );
                    }
                }
            }
        });
    }
}

// endregion: --- Auction Scheduler
