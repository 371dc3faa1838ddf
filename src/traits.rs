use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::ScraperError;
use crate::offers::{OfferRecord, Tier, TierOutcome};
use crate::policy::PolicyDecision;

#[async_trait]
pub trait OfferExtractor: Send + Sync {
    /// 段階種別
    fn tier(&self) -> Tier;

    /// 特売レコードを抽出
    async fn extract(&self) -> Result<Vec<OfferRecord>, ScraperError>;

    /// 抽出を1回試行し、エラーを `TierOutcome::Failed` に変換する
    async fn attempt(&self) -> TierOutcome {
        match self.extract().await {
            Ok(records) => {
                info!("Tier {} produced {} offers", self.tier(), records.len());
                TierOutcome::from_records(records)
            }
            Err(ScraperError::HttpStatus { status, .. }) => {
                warn!("Tier {} failed with HTTP status {}", self.tier(), status);
                TierOutcome::Failed(format!("HTTP status {}", status))
            }
            Err(e) => {
                warn!("Tier {} failed: {}", self.tier(), e);
                TierOutcome::Failed(e.to_string())
            }
        }
    }
}

#[async_trait]
pub trait PolicyCheck: Send + Sync {
    /// 対象URLへのアクセス可否を判定
    async fn check(&self) -> PolicyDecision;
}
