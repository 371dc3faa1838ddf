use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ScraperError;

const DEFAULT_BASE_URL: &str = "https://www.aldi-nord.de";
const DEFAULT_OFFERS_PATH: &str = "/angebote.html";
const DEFAULT_ROBOTS_PATH: &str = "/robots.txt";
const DEFAULT_API_PATH: &str = "/offers-api/offers";
const DEFAULT_REGION: &str = "nord";
const RENDER_WAIT_SECS: u64 = 10;

/// robots.txt 取得失敗時の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyFallback {
    /// 取得できなければ拒否
    #[default]
    FailClosed,
    /// 取得できなければ許可
    FailOpen,
}

/// 特売カードのセレクタ群
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSelectors {
    pub container: String,
    pub card: String,
    pub title: String,
    pub price: String,
}

impl Default for CardSelectors {
    fn default() -> Self {
        Self {
            container: "div.teaser-grid".to_string(),
            card: "article.teaser".to_string(),
            title: "h2.teaser__title".to_string(),
            price: "span.price__value".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub offers_path: String,
    pub robots_path: String,
    pub api_path: String,
    pub region: String,
    /// robots.txt 判定に使うエージェント名
    pub agent: String,
    pub headless: bool,
    /// ブラウザ描画時のカード待機上限
    pub render_timeout: Duration,
    /// None の場合は reqwest のデフォルト（無制限）
    pub http_timeout: Option<Duration>,
    pub chrome_executable: Option<PathBuf>,
    pub selectors: CardSelectors,
    pub policy_fallback: PolicyFallback,
    pub debug: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            offers_path: DEFAULT_OFFERS_PATH.to_string(),
            robots_path: DEFAULT_ROBOTS_PATH.to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            region: DEFAULT_REGION.to_string(),
            agent: "*".to_string(),
            headless: true,
            render_timeout: Duration::from_secs(RENDER_WAIT_SECS),
            http_timeout: None,
            chrome_executable: None,
            selectors: CardSelectors::default(),
            policy_fallback: PolicyFallback::default(),
            debug: false,
        }
    }
}

impl ScraperConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_offers_path(mut self, path: impl Into<String>) -> Self {
        self.offers_path = path.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = agent.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    pub fn with_chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }

    pub fn with_policy_fallback(mut self, fallback: PolicyFallback) -> Self {
        self.policy_fallback = fallback;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn offers_url(&self) -> Result<Url, ScraperError> {
        self.join(&self.offers_path)
    }

    pub fn robots_url(&self) -> Result<Url, ScraperError> {
        self.join(&self.robots_path)
    }

    /// `?region=` を付与した API URL
    pub fn api_url(&self) -> Result<Url, ScraperError> {
        let mut url = self.join(&self.api_path)?;
        url.query_pairs_mut().append_pair("region", &self.region);
        Ok(url)
    }

    /// 共通の HTTP クライアントを生成
    pub fn http_client(&self) -> Result<reqwest::Client, ScraperError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("offer-scraper/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = self.http_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }

    fn join(&self, path: &str) -> Result<Url, ScraperError> {
        Ok(Url::parse(&self.base_url)?.join(path)?)
    }
}
