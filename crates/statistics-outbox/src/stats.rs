//! Statistic bundles produced by finished games.
//!
//! A bundle holds game-wide statistics and per-recipient statistics for one
//! namespace. It is encoded once into the `stats` field of the upload
//! document and rendered per recipient for the presentation sink.

use crate::{OutboxError, OutboxResult, RecipientId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Name of a single statistic, e.g. `kills` or `time_survived`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatisticKey(pub String);

impl StatisticKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StatisticKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for StatisticKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A statistic value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatisticValue {
    Int(i64),
    Float(f64),
}

impl StatisticValue {
    fn to_json(self, key: &StatisticKey) -> OutboxResult<Value> {
        match self {
            StatisticValue::Int(v) => Ok(Value::from(v)),
            StatisticValue::Float(v) => Number::from_f64(v).map(Value::Number).ok_or_else(|| {
                OutboxError::MalformedPayload(format!("statistic '{key}' is not finite: {v}"))
            }),
        }
    }
}

impl std::fmt::Display for StatisticValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatisticValue::Int(v) => write!(f, "{v}"),
            StatisticValue::Float(v) => write!(f, "{v:.2}"),
        }
    }
}

impl From<i64> for StatisticValue {
    fn from(v: i64) -> Self {
        StatisticValue::Int(v)
    }
}

impl From<i32> for StatisticValue {
    fn from(v: i32) -> Self {
        StatisticValue::Int(i64::from(v))
    }
}

impl From<f64> for StatisticValue {
    fn from(v: f64) -> Self {
        StatisticValue::Float(v)
    }
}

type StatisticMap = BTreeMap<StatisticKey, StatisticValue>;

/// Statistics of one namespace for a finished game.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatisticBundle {
    global: StatisticMap,
    players: BTreeMap<RecipientId, StatisticMap>,
}

impl StatisticBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a game-wide statistic.
    pub fn set_global(&mut self, key: impl Into<StatisticKey>, value: impl Into<StatisticValue>) {
        self.global.insert(key.into(), value.into());
    }

    /// Set a statistic for one recipient.
    pub fn set(
        &mut self,
        recipient: &RecipientId,
        key: impl Into<StatisticKey>,
        value: impl Into<StatisticValue>,
    ) {
        self.players
            .entry(recipient.clone())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Add `by` to an integer statistic of one recipient, starting from zero.
    ///
    /// A float statistic under the same key is converted by addition.
    pub fn increment(&mut self, recipient: &RecipientId, key: impl Into<StatisticKey>, by: i64) {
        let slot = self
            .players
            .entry(recipient.clone())
            .or_default()
            .entry(key.into())
            .or_insert(StatisticValue::Int(0));
        *slot = match *slot {
            StatisticValue::Int(v) => StatisticValue::Int(v.saturating_add(by)),
            StatisticValue::Float(v) => StatisticValue::Float(v + by as f64),
        };
    }

    /// The statistics recorded for `recipient` (empty if none).
    pub fn for_recipient(&self, recipient: &RecipientId) -> RecipientStatistics<'_> {
        RecipientStatistics {
            stats: self.players.get(recipient),
        }
    }

    /// Whether the bundle carries no statistics at all.
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.players.values().all(BTreeMap::is_empty)
    }

    /// Encode into the `stats` document of an upload.
    ///
    /// Shape: `{"players": {<id>: {<key>: <value>}}, "global": {<key>: <value>}}`,
    /// with empty sections left out.
    pub fn encode(&self) -> OutboxResult<Value> {
        let mut root = Map::new();

        let mut players = Map::new();
        for (recipient, stats) in &self.players {
            if stats.is_empty() {
                continue;
            }
            players.insert(recipient.to_string(), encode_map(stats)?);
        }
        if !players.is_empty() {
            root.insert("players".to_string(), Value::Object(players));
        }

        if !self.global.is_empty() {
            root.insert("global".to_string(), encode_map(&self.global)?);
        }

        Ok(Value::Object(root))
    }
}

fn encode_map(stats: &StatisticMap) -> OutboxResult<Value> {
    let mut out = Map::new();
    for (key, value) in stats {
        if key.as_str().is_empty() {
            return Err(OutboxError::MalformedPayload(
                "statistic key must not be empty".to_string(),
            ));
        }
        out.insert(key.to_string(), value.to_json(key)?);
    }
    Ok(Value::Object(out))
}

/// Borrowed view of one recipient's statistics.
#[derive(Clone, Copy, Debug)]
pub struct RecipientStatistics<'a> {
    stats: Option<&'a StatisticMap>,
}

impl<'a> RecipientStatistics<'a> {
    pub fn is_empty(&self) -> bool {
        self.stats.map_or(true, BTreeMap::is_empty)
    }

    pub fn len(&self) -> usize {
        self.stats.map_or(0, BTreeMap::len)
    }

    /// Visit every statistic in key order.
    pub fn visit_all(&self, mut visitor: impl FnMut(&'a StatisticKey, StatisticValue)) {
        if let Some(stats) = self.stats {
            for (key, value) in stats {
                visitor(key, *value);
            }
        }
    }
}
