//! robots.txt によるアクセス可否判定

use async_trait::async_trait;
use texting_robots::Robot;
use tracing::{info, warn};
use url::Url;

use crate::config::{PolicyFallback, ScraperConfig};
use crate::error::ScraperError;
use crate::traits::PolicyCheck;

const DISALLOW_ALL: &[u8] = b"User-agent: *\nDisallow: /\n";

/// 判定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Allowed,
    Denied { reason: String },
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allowed)
    }
}

pub struct PolicyGate {
    client: reqwest::Client,
    robots_url: Url,
    target_url: Url,
    agent: String,
    fallback: PolicyFallback,
}

impl PolicyGate {
    pub fn new(client: reqwest::Client, config: &ScraperConfig) -> Result<Self, ScraperError> {
        Ok(Self {
            client,
            robots_url: config.robots_url()?,
            target_url: config.offers_url()?,
            agent: config.agent.clone(),
            fallback: config.policy_fallback,
        })
    }

    /// robots.txt を取得してパース
    ///
    /// 401/403 は全拒否、その他の 4xx は全許可。
    /// 5xx と通信エラーは `Err` を返し、扱いは呼び出し側で決める。
    pub async fn fetch(&self) -> Result<Robot, ScraperError> {
        let resp = self.client.get(self.robots_url.clone()).send().await?;
        let status = resp.status();
        info!("robots.txt status: {}", status.as_u16());

        if status.is_success() {
            let body = resp.text().await?;
            info!("robots.txt content:\n{}", body);
            return self.robot(body.as_bytes());
        }

        match status.as_u16() {
            401 | 403 => self.robot(DISALLOW_ALL),
            400..=499 => self.robot(b""),
            code => Err(ScraperError::HttpStatus {
                status: code,
                body: resp.text().await.unwrap_or_default(),
            }),
        }
    }

    fn robot(&self, txt: &[u8]) -> Result<Robot, ScraperError> {
        Robot::new(&self.agent, txt).map_err(|e| ScraperError::Robots(e.to_string()))
    }
}

#[async_trait]
impl PolicyCheck for PolicyGate {
    async fn check(&self) -> PolicyDecision {
        let robot = match self.fetch().await {
            Ok(robot) => robot,
            Err(e) => {
                warn!("robots.txt unavailable ({}): {}", self.robots_url, e);
                return match self.fallback {
                    PolicyFallback::FailOpen => {
                        info!("Policy fallback is fail-open, proceeding");
                        PolicyDecision::Allowed
                    }
                    PolicyFallback::FailClosed => PolicyDecision::Denied {
                        reason: format!("robots.txt unavailable: {}", e),
                    },
                };
            }
        };

        for sitemap in &robot.sitemaps {
            info!("robots.txt sitemap: {}", sitemap);
        }
        if let Some(delay) = robot.delay {
            info!("robots.txt crawl-delay: {}s", delay);
        }

        if robot.allowed(self.target_url.as_str()) {
            info!("Scraping allowed by robots.txt: {}", self.target_url);
            PolicyDecision::Allowed
        } else {
            warn!("Scraping disallowed by robots.txt: {}", self.target_url);
            PolicyDecision::Denied {
                reason: format!(
                    "{} disallowed for agent '{}'",
                    self.target_url.path(),
                    self.agent
                ),
            }
        }
    }
}
