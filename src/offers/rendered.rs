//! ヘッドレスブラウザ描画による抽出
//!
//! ブラウザは呼び出しごとに起動し、どの経路で終了しても必ず閉じる。

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::OfferExtractor;

use super::types::{OfferRecord, Tier};

/// カード出現確認のポーリング間隔（ミリ秒）
const CARD_POLL_INTERVAL_MS: u64 = 250;

/// 使い捨てのブラウザセッション
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: PathBuf,
}

impl BrowserSession {
    async fn launch(config: &ScraperConfig) -> Result<Self, ScraperError> {
        // 実行ごとに専用のプロファイルを使う
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        let user_data_dir = std::env::temp_dir().join(format!("offer-scraper-{}", unique_id));

        let mut builder = BrowserConfig::builder().user_data_dir(&user_data_dir);
        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        if !config.headless {
            builder = builder.with_head();
        }
        builder = builder
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");
        if config.debug {
            builder = builder.arg("--enable-logging=stderr").arg("--v=1");
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        let (browser, mut handler) = match Browser::launch(browser_config).await {
            Ok(launched) => launched,
            Err(e) => {
                let _ = std::fs::remove_dir_all(&user_data_dir);
                return Err(ScraperError::BrowserInit(e.to_string()));
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        info!("Browser launched");
        Ok(Self {
            browser,
            handler,
            user_data_dir,
        })
    }

    /// ブラウザプロセスを終了し、一時プロファイルを削除
    async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("Failed to close browser: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("Failed to wait for browser exit: {}", e);
        }
        self.handler.abort();
        if let Err(e) = std::fs::remove_dir_all(&self.user_data_dir) {
            debug!("Failed to remove {:?}: {}", self.user_data_dir, e);
        }
        info!("Browser closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

pub struct RenderedExtractor {
    config: ScraperConfig,
    offers_url: Url,
}

impl RenderedExtractor {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScraperError> {
        Ok(Self {
            offers_url: config.offers_url()?,
            config: config.clone(),
        })
    }

    /// 新しいタブで描画・抽出し、タブを閉じる
    async fn render(&self, session: &BrowserSession) -> Result<Vec<OfferRecord>, ScraperError> {
        let page = session
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        let result = self.collect(&page).await;

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }
        result
    }

    async fn collect(&self, page: &Page) -> Result<Vec<OfferRecord>, ScraperError> {
        page.goto(self.offers_url.as_str())
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;

        let selectors = &self.config.selectors;
        let cards = match tokio::time::timeout(
            self.config.render_timeout,
            poll_cards(page, &selectors.card),
        )
        .await
        {
            Ok(cards) => cards?,
            Err(_) => {
                info!(
                    "Timeout after {:?}: {} not visible",
                    self.config.render_timeout, selectors.card
                );
                self.debug_screenshot(page).await;
                return Ok(Vec::new());
            }
        };
        info!("Cards found (rendered): {}", cards.len());

        let mut offers = Vec::new();
        for card in &cards {
            let title = child_text(card, &selectors.title).await;
            let price = child_text(card, &selectors.price).await;
            if let Some(offer) = OfferRecord::from_card(title.as_deref(), price.as_deref()) {
                offers.push(offer);
            }
        }
        Ok(offers)
    }

    async fn debug_screenshot(&self, page: &Page) {
        if !self.config.debug {
            return;
        }
        match page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
        {
            Ok(screenshot) => {
                use base64::Engine;
                let encoded = base64::engine::general_purpose::STANDARD.encode(&screenshot);
                debug!("Timeout screenshot: data:image/png;base64,{}", encoded);
            }
            Err(e) => debug!("Failed to take screenshot: {}", e),
        }
    }
}

/// カードが1件以上現れるまで待機
async fn poll_cards(page: &Page, selector: &str) -> Result<Vec<Element>, ScraperError> {
    loop {
        let cards = page
            .find_elements(selector)
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        if !cards.is_empty() {
            return Ok(cards);
        }
        sleep(Duration::from_millis(CARD_POLL_INTERVAL_MS)).await;
    }
}

async fn child_text(card: &Element, selector: &str) -> Option<String> {
    let child = card.find_element(selector).await.ok()?;
    child.inner_text().await.ok().flatten()
}

#[async_trait]
impl OfferExtractor for RenderedExtractor {
    fn tier(&self) -> Tier {
        Tier::Rendered
    }

    async fn extract(&self) -> Result<Vec<OfferRecord>, ScraperError> {
        let session = BrowserSession::launch(&self.config).await?;

        let result = self.render(&session).await;
        if let Err(e) = &result {
            warn!("Rendered tier error: {}", e);
        }
        session.shutdown().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offers::TierOutcome;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_launch_failure_is_contained() {
        let config = ScraperConfig::new("http://127.0.0.1:9")
            .with_chrome_executable("/nonexistent/offer-scraper/chrome");
        let extractor = RenderedExtractor::new(&config).unwrap();

        assert!(matches!(
            extractor.attempt().await,
            TierOutcome::Failed(_)
        ));
    }

    #[tokio::test]
    #[ignore] // 実ブラウザ用: cargo test test_rendered_single_card -- --ignored --nocapture
    async fn test_rendered_single_card() {
        let server = MockServer::start().await;
        let html = r#"
            <html><body><div id="app"></div>
            <script>
              setTimeout(() => {
                document.getElementById('app').innerHTML =
                  '<article class="teaser"><h2 class="teaser__title"> Äpfel </h2>' +
                  '<span class="price__value">2.29</span></article>' +
                  '<article class="teaser"><h2 class="teaser__title">Ohne Preis</h2></article>';
              }, 500);
            </script></body></html>
        "#;
        Mock::given(method("GET"))
            .and(path("/angebote.html"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
            .mount(&server)
            .await;

        let config = ScraperConfig::new(server.uri());
        let extractor = RenderedExtractor::new(&config).unwrap();

        let offers = extractor.extract().await.expect("render failed");
        assert_eq!(
            offers,
            vec![OfferRecord::from_card(Some("Äpfel"), Some("2.29")).unwrap()]
        );
    }

    #[tokio::test]
    #[ignore] // 実ブラウザ用
    async fn test_rendered_timeout_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/angebote.html"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<html><body></body></html>", "text/html"),
            )
            .mount(&server)
            .await;

        let config =
            ScraperConfig::new(server.uri()).with_render_timeout(Duration::from_secs(1));
        let extractor = RenderedExtractor::new(&config).unwrap();

        assert_eq!(extractor.attempt().await, TierOutcome::Empty);
    }
}
