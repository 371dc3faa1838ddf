//! 特売情報抽出モジュール
//!
//! 静的HTML → ブラウザ描画 → JSON API の3段階

pub mod api;
pub mod rendered;
pub mod static_page;
mod types;

pub use api::ApiExtractor;
pub use rendered::RenderedExtractor;
pub use static_page::StaticExtractor;
pub use types::{AttemptSummary, FetchReport, OfferRecord, Tier, TierAttempt, TierOutcome};
