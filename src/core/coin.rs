//! Market data types served by the backend

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coin {
    pub coin_id: String,
    pub name: String,
    pub symbol: String,
    pub price_usd: f64,
    pub market_cap_usd: f64,
    #[serde(default, rename = "change24hPercent")]
    pub change_24h_percent: Option<f64>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_updated: DateTime<Utc>,
}

impl Coin {
    pub fn avatar_glyph(&self) -> Option<char> {
        self.symbol.chars().next()
    }

    /// Case-insensitive substring match on name or symbol. `needle` must
    /// already be lower-cased.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.symbol.to_lowercase().contains(needle)
    }
}

/// Acknowledgement returned by the backend after storing a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotAck(pub Value);

/// A stored history entry. Only the commonly present fields are typed, the
/// rest are kept as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    #[serde(default)]
    pub coin_id: Option<String>,
    #[serde(default)]
    pub price_usd: Option<f64>,
    #[serde(default)]
    pub market_cap_usd: Option<f64>,
    #[serde(default, rename = "change24hPercent")]
    pub change_24h_percent: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {ms}"))),
        RawTimestamp::Text(text) => parse_timestamp(&text)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {text}"))),
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    // Servers that emit naive ISO strings report UTC.
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const COINS_JSON: &str = r#"[
        {
            "coinId": "bitcoin",
            "name": "Bitcoin",
            "symbol": "BTC",
            "priceUsd": 64123.45,
            "marketCapUsd": 1260000000000.0,
            "change24hPercent": -1.25,
            "lastUpdated": "2025-03-01T12:00:00Z"
        },
        {
            "coinId": "ethereum",
            "name": "Ethereum",
            "symbol": "ETH",
            "priceUsd": 3200.0,
            "marketCapUsd": 385000000000.0,
            "change24hPercent": null,
            "lastUpdated": "2025-03-01T12:00:00.123456"
        },
        {
            "coinId": "dogecoin",
            "name": "Dogecoin",
            "symbol": "DOGE",
            "priceUsd": 0.12,
            "marketCapUsd": 17000000000.0,
            "lastUpdated": 1740830400000
        }
    ]"#;

    #[test]
    fn test_decode_coin_list() {
        let coins: Vec<Coin> = serde_json::from_str(COINS_JSON).unwrap();
        assert_eq!(coins.len(), 3);
        assert_eq!(coins[0].coin_id, "bitcoin");
        assert_eq!(coins[0].change_24h_percent, Some(-1.25));
        assert_eq!(coins[0].last_updated.year(), 2025);

        // null and missing change both decode to None
        assert!(coins[1].change_24h_percent.is_none());
        assert!(coins[2].change_24h_percent.is_none());
        assert_eq!(coins[2].last_updated.timestamp_millis(), 1740830400000);
    }

    #[test]
    fn test_avatar_glyph() {
        let coins: Vec<Coin> = serde_json::from_str(COINS_JSON).unwrap();
        assert_eq!(coins[1].avatar_glyph(), Some('E'));
    }

    #[test]
    fn test_invalid_timestamp_fails_decode() {
        let json = r#"{"coinId":"x","name":"X","symbol":"X","priceUsd":1.0,
            "marketCapUsd":1.0,"lastUpdated":"yesterday"}"#;
        assert!(serde_json::from_str::<Coin>(json).is_err());
    }

    #[test]
    fn test_history_record_keeps_unknown_fields() {
        let json = r#"{"coinId":"bitcoin","priceUsd":61000.5,"timestamp":"2025-03-01T00:00:00Z"}"#;
        let record: HistoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.coin_id.as_deref(), Some("bitcoin"));
        assert_eq!(record.price_usd, Some(61000.5));
        assert!(record.market_cap_usd.is_none());
        assert_eq!(
            record.extra.get("timestamp"),
            Some(&Value::String("2025-03-01T00:00:00Z".into()))
        );
    }
}
