//! Append-only analytics: estate visits and listing searches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{EstateId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Visit {
    pub id: i64,
    pub estate: EstateId,
    pub visitor: UserId,
    pub visited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHistory {
    pub id: i64,
    pub user: UserId,
    pub query: String,
    pub searched_at: DateTime<Utc>,
}

/// Raw listing parameters as stored in history, e.g. `{"location":"Riga"}`.
pub fn encode_query(params: &BTreeMap<String, String>) -> String {
    serde_json::to_string(params).unwrap_or_else(|_| "{}".to_string())
}
