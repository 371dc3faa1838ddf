use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("robots.txt によりアクセス拒否: {0}")]
    PolicyDenied(String),

    #[error("robots.txt パースエラー: {0}")]
    Robots(String),

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTPステータス異常: {status}")]
    HttpStatus { status: u16, body: String },

    #[error("URL不正: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("セレクタ不正: {0}")]
    Selector(String),

    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("JSONパースエラー: {0}")]
    Json(String),
}
