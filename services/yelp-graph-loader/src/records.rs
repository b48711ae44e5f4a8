//! Dataset Records
//!
//! Typed views of the newline-delimited JSON datasets. Only the fields that
//! end up on graph nodes and edges are decoded; everything else in a line is
//! ignored.

use crate::error::ImportError;
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fans: i64,
    #[serde(default)]
    pub elite: Elite,
    /// Only needed to build friendships; never stored on the Person node.
    #[serde(default, deserialize_with = "string_list", skip_serializing)]
    pub friends: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub business_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "string_list")]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub user_id: String,
    pub business_id: String,
    pub stars: f64,
}

/// A (user, friend) pair. Serializes as a two element array so the merge
/// statement can address `f[0]` and `f[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendPair(pub String, pub String);

/// Flatten every user's friend list into pairs, consuming the users.
pub fn friend_pairs(users: Vec<UserRecord>) -> Vec<FriendPair> {
    let total: usize = users.iter().map(|u| u.friends.len()).sum();
    let mut pairs = Vec::with_capacity(total);
    for user in users {
        let UserRecord { user_id, friends, .. } = user;
        pairs.extend(friends.into_iter().map(|friend| FriendPair(user_id.clone(), friend)));
    }
    pairs
}

// ============================================================================
// Elite years
// ============================================================================

/// Years a user held elite status. Older dumps carry a list of years, some
/// carry a plain flag, newer ones a comma separated string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Elite {
    Years(Vec<i64>),
    Flag(bool),
}

impl Default for Elite {
    fn default() -> Self {
        Elite::Years(Vec::new())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawElite {
    Years(Vec<i64>),
    Flag(bool),
    Text(String),
}

impl<'de> Deserialize<'de> for Elite {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<RawElite>::deserialize(deserializer)? {
            None => Ok(Elite::default()),
            Some(RawElite::Years(years)) => Ok(Elite::Years(years)),
            Some(RawElite::Flag(flag)) => Ok(Elite::Flag(flag)),
            Some(RawElite::Text(text)) => split_listing(&text)
                .map(|year| {
                    year.parse::<i64>()
                        .map_err(|_| D::Error::custom(format!("invalid elite year {:?}", year)))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Elite::Years),
        }
    }
}

// ============================================================================
// Field helpers
// ============================================================================

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawList {
    Items(Vec<String>),
    Text(String),
}

/// Accepts `["a", "b"]`, `"a, b"`, `"None"`, `""` or null.
fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<RawList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(RawList::Items(items)) => items,
        Some(RawList::Text(text)) => split_listing(&text).map(str::to_string).collect(),
    })
}

fn split_listing(text: &str) -> impl Iterator<Item = &str> {
    let text = if text.trim() == "None" { "" } else { text };
    text.split(',').map(str::trim).filter(|part| !part.is_empty())
}

// ============================================================================
// Reading
// ============================================================================

/// Decode every non-blank line of `reader` as a `T`.
pub fn read_records<T, R>(reader: R) -> Result<Vec<T>, ImportError>
where
    T: DeserializeOwned,
    R: BufRead,
{
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| ImportError::Read { line: line_no, source })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|source| ImportError::MalformedRecord { line: line_no, source })?;
        records.push(record);
    }
    Ok(records)
}
