//! 静的HTML取得による抽出

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::info;
use url::Url;

use crate::config::{CardSelectors, ScraperConfig};
use crate::error::ScraperError;
use crate::traits::OfferExtractor;

use super::types::{OfferRecord, Tier};

pub struct StaticExtractor {
    client: reqwest::Client,
    offers_url: Url,
    selectors: CardSelectors,
}

impl StaticExtractor {
    pub fn new(client: reqwest::Client, config: &ScraperConfig) -> Result<Self, ScraperError> {
        Ok(Self {
            client,
            offers_url: config.offers_url()?,
            selectors: config.selectors.clone(),
        })
    }
}

#[async_trait]
impl OfferExtractor for StaticExtractor {
    fn tier(&self) -> Tier {
        Tier::Static
    }

    async fn extract(&self) -> Result<Vec<OfferRecord>, ScraperError> {
        let resp = self.client.get(self.offers_url.clone()).send().await?;
        let status = resp.status();
        info!("Status code: {}", status.as_u16());

        if !status.is_success() {
            return Err(ScraperError::HttpStatus {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let body = resp.text().await?;
        parse_offers(&body, &self.selectors)
    }
}

pub(crate) fn parse_selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::Selector(format!("{}: {}", css, e)))
}

/// HTMLから特売カードを抽出
///
/// コンテナが無い場合は動的描画とみなして空を返す。
pub fn parse_offers(html: &str, selectors: &CardSelectors) -> Result<Vec<OfferRecord>, ScraperError> {
    let container_sel = parse_selector(&selectors.container)?;
    let card_sel = parse_selector(&selectors.card)?;
    let title_sel = parse_selector(&selectors.title)?;
    let price_sel = parse_selector(&selectors.price)?;

    let document = Html::parse_document(html);
    let Some(container) = document.select(&container_sel).next() else {
        info!(
            "Container {} not found, dynamic rendering suspected",
            selectors.container
        );
        return Ok(Vec::new());
    };

    let cards: Vec<ElementRef<'_>> = container.select(&card_sel).collect();
    info!("Cards found (static): {}", cards.len());

    let offers = cards
        .iter()
        .filter_map(|card| {
            let title = first_text(card, &title_sel);
            let price = first_text(card, &price_sel);
            OfferRecord::from_card(title.as_deref(), price.as_deref())
        })
        .collect();

    Ok(offers)
}

/// 各テキストノードを trim して区切りなしで連結
fn first_text(card: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector).next().map(|el| {
        el.text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<String>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TWO_CARDS: &str = r#"
        <html><body>
          <div class="teaser-grid">
            <article class="teaser">
              <h2 class="teaser__title">
                Bio Bananen
              </h2>
              <span class="price__value"> 1.99 </span>
            </article>
            <article class="teaser">
              <h2 class="teaser__title">Gouda jung</h2>
              <span class="price__value">2.49</span>
            </article>
            <article class="teaser">
              <h2 class="teaser__title">Ohne Preis</h2>
            </article>
          </div>
        </body></html>
    "#;

    fn titles(offers: &[OfferRecord]) -> Vec<&str> {
        offers.iter().filter_map(|o| o.title.as_deref()).collect()
    }

    #[test]
    fn test_parse_complete_cards() {
        let offers = parse_offers(TWO_CARDS, &CardSelectors::default()).unwrap();

        assert_eq!(titles(&offers), ["Bio Bananen", "Gouda jung"]);
        assert_eq!(offers[0].price.as_deref(), Some("1.99"));
        assert!(offers.iter().all(|o| o.discount.is_none()));
    }

    #[test]
    fn test_nested_text_nodes_joined_without_separator() {
        let html = r#"
            <div class="teaser-grid">
              <article class="teaser">
                <h2 class="teaser__title"> Kaffee  <em>Crema</em> </h2>
                <span class="price__value"><span> 1 </span> <span>€</span></span>
              </article>
            </div>
        "#;
        let offers = parse_offers(html, &CardSelectors::default()).unwrap();

        assert_eq!(offers[0].title.as_deref(), Some("KaffeeCrema"));
        assert_eq!(offers[0].price.as_deref(), Some("1€"));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let first = parse_offers(TWO_CARDS, &CardSelectors::default()).unwrap();
        let second = parse_offers(TWO_CARDS, &CardSelectors::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_container_is_empty() {
        let html = r#"<html><body><div id="app"></div></body></html>"#;
        let offers = parse_offers(html, &CardSelectors::default()).unwrap();
        assert!(offers.is_empty());
    }

    #[test]
    fn test_cards_outside_container_ignored() {
        let html = r#"
            <article class="teaser">
              <h2 class="teaser__title">Draußen</h2><span class="price__value">0.99</span>
            </article>
            <div class="teaser-grid"></div>
        "#;
        let offers = parse_offers(html, &CardSelectors::default()).unwrap();
        assert!(offers.is_empty());
    }

    #[test]
    fn test_invalid_selector() {
        let selectors = CardSelectors {
            card: "article[".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            parse_offers(TWO_CARDS, &selectors),
            Err(ScraperError::Selector(_))
        ));
    }

    #[tokio::test]
    async fn test_extract_from_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/angebote.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TWO_CARDS))
            .expect(1)
            .mount(&server)
            .await;

        let config = ScraperConfig::new(server.uri());
        let extractor = StaticExtractor::new(config.http_client().unwrap(), &config).unwrap();

        let offers = extractor.extract().await.unwrap();
        assert_eq!(offers.len(), 2);
    }

    #[tokio::test]
    async fn test_error_status_fails_tier() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/angebote.html"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let config = ScraperConfig::new(server.uri());
        let extractor = StaticExtractor::new(config.http_client().unwrap(), &config).unwrap();

        assert!(matches!(
            extractor.extract().await,
            Err(ScraperError::HttpStatus { status: 503, .. })
        ));
        assert!(matches!(
            extractor.attempt().await,
            crate::offers::TierOutcome::Failed(_)
        ));
    }
}
