use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::Utc;
use tower::Service;
use tracing::info;

use crate::config::{PolicyFallback, ScraperConfig};
use crate::error::ScraperError;
use crate::offers::{
    ApiExtractor, FetchReport, RenderedExtractor, StaticExtractor, TierAttempt, TierOutcome,
};
use crate::policy::{PolicyDecision, PolicyGate};
use crate::traits::{OfferExtractor, PolicyCheck};

/// robots.txt 判定 → 各段階を順に試行
///
/// 最初に1件以上取れた段階の結果をそのまま返す（結果の合算はしない）。
pub struct FallbackChain {
    gate: Box<dyn PolicyCheck>,
    tiers: Vec<Box<dyn OfferExtractor>>,
}

impl FallbackChain {
    pub fn new(gate: Box<dyn PolicyCheck>, tiers: Vec<Box<dyn OfferExtractor>>) -> Self {
        Self { gate, tiers }
    }

    /// 静的HTML → ブラウザ描画 → API の標準構成
    pub fn from_config(config: &ScraperConfig) -> Result<Self, ScraperError> {
        let client = config.http_client()?;
        let gate = PolicyGate::new(client.clone(), config)?;
        let tiers: Vec<Box<dyn OfferExtractor>> = vec![
            Box::new(StaticExtractor::new(client.clone(), config)?),
            Box::new(RenderedExtractor::new(config)?),
            Box::new(ApiExtractor::new(client, config)?),
        ];
        Ok(Self::new(Box::new(gate), tiers))
    }

    pub async fn run(&self) -> Result<FetchReport, ScraperError> {
        if let PolicyDecision::Denied { reason } = self.gate.check().await {
            return Err(ScraperError::PolicyDenied(reason));
        }

        let mut attempts = Vec::with_capacity(self.tiers.len());
        for (index, extractor) in self.tiers.iter().enumerate() {
            let tier = extractor.tier();
            info!("Trying tier {}", tier);

            let outcome = extractor.attempt().await;
            attempts.push(TierAttempt {
                tier,
                summary: outcome.summary(),
            });

            match outcome {
                TierOutcome::Success(offers) if !offers.is_empty() => {
                    info!("Tier {} succeeded with {} offers", tier, offers.len());
                    return Ok(FetchReport {
                        tier: Some(tier),
                        offers,
                        attempts,
                        fetched_at: Utc::now(),
                    });
                }
                TierOutcome::Failed(reason) => info!("Tier {} failed: {}", tier, reason),
                _ => info!("Tier {} empty", tier),
            }

            if let Some(next) = self.tiers.get(index + 1) {
                info!("{} yielded nothing, trying {}", tier, next.tier());
            }
        }

        info!("No offers found in any tier");
        Ok(FetchReport {
            tier: None,
            offers: Vec::new(),
            attempts,
            fetched_at: Utc::now(),
        })
    }
}

/// 取得リクエスト
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub base_url: String,
    pub region: String,
    pub headless: bool,
    pub policy_fallback: PolicyFallback,
}

impl Default for FetchRequest {
    fn default() -> Self {
        let config = ScraperConfig::default();
        Self {
            base_url: config.base_url,
            region: config.region,
            headless: config.headless,
            policy_fallback: config.policy_fallback,
        }
    }
}

impl FetchRequest {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_policy_fallback(mut self, fallback: PolicyFallback) -> Self {
        self.policy_fallback = fallback;
        self
    }
}

impl From<FetchRequest> for ScraperConfig {
    fn from(req: FetchRequest) -> Self {
        ScraperConfig::new(req.base_url)
            .with_region(req.region)
            .with_headless(req.headless)
            .with_policy_fallback(req.policy_fallback)
    }
}

/// tower::Serviceを実装した特売取得サービス
#[derive(Debug, Clone, Default)]
pub struct OfferService {}

impl OfferService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<FetchRequest> for OfferService {
    type Response = FetchReport;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: FetchRequest) -> Self::Future {
        info!("Fetch request received: base_url={}", req.base_url);

        Box::pin(async move {
            let config: ScraperConfig = req.into();
            let chain = FallbackChain::from_config(&config)?;
            let report = chain.run().await?;

            info!(
                "Fetch completed: tier={:?}, offers={}",
                report.tier,
                report.offers.len()
            );
            Ok(report)
        })
    }
}
