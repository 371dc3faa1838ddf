//! 特売情報スクレイパーライブラリ
//!
//! - robots.txt で取得可否を確認
//! - 静的HTML → ブラウザ描画 → JSON API の順に試行し、最初に取れた結果を返す
//!
//! # 使用例
//!
//! ```rust,ignore
//! use offer_scraper::{FetchRequest, OfferService};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = OfferService::new();
//!
//!     let request = FetchRequest::default().with_region("nord");
//!
//!     let report = service.call(request).await.unwrap();
//!     println!("Offers: {:?}", report.offers);
//! }
//! ```
//!
//! # 段階を個別に組み立てる例
//!
//! ```rust,ignore
//! use offer_scraper::{ApiExtractor, FallbackChain, OfferExtractor, PolicyGate, ScraperConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ScraperConfig::default();
//!     let client = config.http_client().unwrap();
//!
//!     let api: Box<dyn OfferExtractor> = Box::new(ApiExtractor::new(client.clone(), &config).unwrap());
//!     let chain = FallbackChain::new(
//!         Box::new(PolicyGate::new(client, &config).unwrap()),
//!         vec![api],
//!     );
//!     let report = chain.run().await.unwrap();
//!     println!("Offers: {}", report.offers.len());
//! }
//! ```

pub mod config;
pub mod error;
pub mod offers;
pub mod policy;
pub mod service;
pub mod traits;

// 主要な型をリエクスポート
pub use config::{CardSelectors, PolicyFallback, ScraperConfig};
pub use error::ScraperError;
pub use offers::{
    ApiExtractor, FetchReport, OfferRecord, RenderedExtractor, StaticExtractor, Tier, TierOutcome,
};
pub use policy::{PolicyDecision, PolicyGate};
pub use service::{FallbackChain, FetchRequest, OfferService};
pub use traits::{OfferExtractor, PolicyCheck};
