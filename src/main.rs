use std::process::ExitCode;

use offer_scraper::{FetchRequest, OfferService, ScraperError};
use tower::Service;
use tracing_subscriber::EnvFilter;

/// robots.txt で拒否された場合の終了コード
const EXIT_POLICY_DENIED: u8 = 1;
const EXIT_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut service = OfferService::new();

    match service.call(FetchRequest::default()).await {
        Ok(report) if report.is_empty() => {
            println!("no offers found");
            ExitCode::SUCCESS
        }
        Ok(report) => match serde_json::to_string_pretty(&report.offers) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("エラー: {}", e);
                ExitCode::from(EXIT_FAILURE)
            }
        },
        Err(ScraperError::PolicyDenied(reason)) => {
            println!("Scraping not allowed by robots.txt: {}", reason);
            ExitCode::from(EXIT_POLICY_DENIED)
        }
        Err(e) => {
            eprintln!("エラー: {}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
