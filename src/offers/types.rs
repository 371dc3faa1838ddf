//! 特売情報関連の型定義

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 特売レコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferRecord {
    pub title: Option<String>,
    /// 通貨表記付きの価格文字列
    pub price: Option<String>,
    pub discount: Option<serde_json::Number>,
}

impl OfferRecord {
    /// カードから抽出したタイトルと価格でレコードを作成
    ///
    /// どちらかが欠けている、または空白のみの場合は `None`。
    pub fn from_card(title: Option<&str>, price: Option<&str>) -> Option<Self> {
        let title = title?.trim();
        let price = price?.trim();
        if title.is_empty() || price.is_empty() {
            return None;
        }
        Some(Self {
            title: Some(title.to_string()),
            price: Some(price.to_string()),
            discount: None,
        })
    }
}

/// 抽出段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Static,
    Rendered,
    Api,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Static => "static",
            Tier::Rendered => "rendered",
            Tier::Api => "api",
        };
        f.write_str(name)
    }
}

/// 1段階分の抽出結果
#[derive(Debug, Clone, PartialEq)]
pub enum TierOutcome {
    Success(Vec<OfferRecord>),
    Empty,
    Failed(String),
}

impl TierOutcome {
    /// 空のレコード列は `Empty` に正規化する
    pub fn from_records(records: Vec<OfferRecord>) -> Self {
        if records.is_empty() {
            TierOutcome::Empty
        } else {
            TierOutcome::Success(records)
        }
    }

    pub fn summary(&self) -> AttemptSummary {
        match self {
            TierOutcome::Success(records) => AttemptSummary::Found(records.len()),
            TierOutcome::Empty => AttemptSummary::Empty,
            TierOutcome::Failed(reason) => AttemptSummary::Failed(reason.clone()),
        }
    }
}

/// 試行履歴に残す結果の要約
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", content = "detail", rename_all = "lowercase")]
pub enum AttemptSummary {
    Found(usize),
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierAttempt {
    pub tier: Tier,
    pub summary: AttemptSummary,
}

/// 1回の実行結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchReport {
    /// 結果を出した段階（見つからなければ None）
    pub tier: Option<Tier>,
    pub offers: Vec<OfferRecord>,
    pub attempts: Vec<TierAttempt>,
    pub fetched_at: DateTime<Utc>,
}

impl FetchReport {
    /// 「特売なし」の判定
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_card_trims_whitespace() {
        let record = OfferRecord::from_card(Some("\n  Bio Bananen\n  1 kg "), Some(" 1.99 ")).unwrap();
        assert_eq!(record.title.as_deref(), Some("Bio Bananen\n  1 kg"));
        assert_eq!(record.price.as_deref(), Some("1.99"));
        assert_eq!(record.discount, None);
    }

    #[test]
    fn test_from_card_skips_missing_or_blank() {
        assert!(OfferRecord::from_card(None, Some("1.99")).is_none());
        assert!(OfferRecord::from_card(Some("Milch"), None).is_none());
        assert!(OfferRecord::from_card(Some("   "), Some("1.99")).is_none());
    }

    #[test]
    fn test_outcome_from_records() {
        assert_eq!(TierOutcome::from_records(Vec::new()), TierOutcome::Empty);

        let record = OfferRecord::from_card(Some("Käse"), Some("2.49")).unwrap();
        let outcome = TierOutcome::from_records(vec![record]);
        assert_eq!(outcome.summary(), AttemptSummary::Found(1));
    }

    #[test]
    fn test_record_serializes_null_fields() {
        let record = OfferRecord {
            title: None,
            price: Some("1.99 €".to_string()),
            discount: Some(10.into()),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title": null, "price": "1.99 €", "discount": 10})
        );
    }
}
