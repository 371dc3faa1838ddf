//! JSON API 直接呼び出しによる抽出

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::OfferExtractor;

use super::types::{OfferRecord, Tier};

/// パース失敗時にログへ出す本文の文字数
const BODY_PREVIEW_CHARS: usize = 500;
const CURRENCY_SUFFIX: &str = "€";

#[derive(Debug, Deserialize)]
struct OffersResponse {
    #[serde(default)]
    offers: Option<Vec<ApiOffer>>,
}

#[derive(Debug, Deserialize)]
struct ApiOffer {
    #[serde(rename = "productName", default)]
    product_name: Option<Value>,
    #[serde(default)]
    price: Option<Value>,
    #[serde(rename = "discountPercent", default)]
    discount_percent: Option<Value>,
}

impl From<ApiOffer> for OfferRecord {
    fn from(item: ApiOffer) -> Self {
        OfferRecord {
            title: item.product_name.and_then(value_text),
            price: item
                .price
                .and_then(value_text)
                .map(|price| format!("{} {}", price, CURRENCY_SUFFIX)),
            discount: item.discount_percent.and_then(|v| match v {
                Value::Number(n) => Some(n),
                _ => None,
            }),
        }
    }
}

/// 文字列はそのまま、それ以外はJSON表記（null は None）
fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

pub struct ApiExtractor {
    client: reqwest::Client,
    api_url: Url,
}

impl ApiExtractor {
    pub fn new(client: reqwest::Client, config: &ScraperConfig) -> Result<Self, ScraperError> {
        Ok(Self {
            client,
            api_url: config.api_url()?,
        })
    }
}

#[async_trait]
impl OfferExtractor for ApiExtractor {
    fn tier(&self) -> Tier {
        Tier::Api
    }

    async fn extract(&self) -> Result<Vec<OfferRecord>, ScraperError> {
        let resp = self.client.get(self.api_url.clone()).send().await?;
        let status = resp.status();
        info!("API status: {}", status.as_u16());

        let body = resp.text().await?;
        if !status.is_success() {
            warn!("API endpoint unavailable or wrong, body:\n{}", body);
            return Err(ScraperError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        parse_offers(&body)
    }
}

/// APIレスポンスを特売レコードに変換
pub fn parse_offers(body: &str) -> Result<Vec<OfferRecord>, ScraperError> {
    let response: OffersResponse = serde_json::from_str(body).map_err(|e| {
        warn!(
            "Failed to parse API response as JSON: {}\n{}",
            e,
            body_preview(body)
        );
        ScraperError::Json(e.to_string())
    })?;

    let offers: Vec<OfferRecord> = response
        .offers
        .unwrap_or_default()
        .into_iter()
        .map(OfferRecord::from)
        .collect();
    info!("Cards found (api): {}", offers.len());

    Ok(offers)
}

/// 先頭 `BODY_PREVIEW_CHARS` 文字（バイトではなく文字単位）
fn body_preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
