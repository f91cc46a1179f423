//! Song identities, add-song payloads and request parameter parsing.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// External identity of a song (the `id` clients send).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(pub i64);

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a user-curated song list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(pub i64);

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which song lists a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSelector {
    /// Every list at once (`list_id=all`).
    All,
    /// A single list.
    List(ListId),
}

impl ListSelector {
    /// Literal selecting every list.
    pub const ALL: &'static str = "all";

    /// Parse the `list_id` query parameter.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") => Err(Error::MissingField("list_id")),
            Some(Self::ALL) => Ok(Self::All),
            Some(value) => value
                .parse::<i64>()
                .map(|id| Self::List(ListId(id)))
                .map_err(|_| Error::InvalidListSelector(value.to_string())),
        }
    }
}

impl fmt::Display for ListSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(Self::ALL),
            Self::List(id) => write!(f, "{id}"),
        }
    }
}

fn parse_integer(field: &'static str, raw: Option<&str>) -> Result<i64> {
    let value = raw.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(Error::MissingField(field));
    }
    value.parse::<i64>().map_err(|_| Error::InvalidInteger {
        field,
        value: value.to_string(),
    })
}

/// Parse the `id` query parameter.
pub fn parse_song_id(raw: Option<&str>) -> Result<SongId> {
    parse_integer("id", raw).map(SongId)
}

/// Parse a concrete `list_id` query parameter (no `all`).
pub fn parse_list_id(raw: Option<&str>) -> Result<ListId> {
    parse_integer("list_id", raw).map(ListId)
}

/// Integer field that clients send either as a JSON number or as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseInteger {
    Number(i64),
    Text(String),
}

impl LooseInteger {
    fn resolve(self, field: &'static str) -> Result<i64> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(text) => parse_integer(field, Some(&text)),
        }
    }
}

fn loose_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Loose>::deserialize(deserializer)?.map(|value| match value {
        Loose::Text(text) => text,
        Loose::Int(n) => n.to_string(),
        Loose::Float(n) => n.to_string(),
    }))
}

/// Body of an add-song request, as decoded before validation.
///
/// Every field is optional here so that a missing field surfaces as a
/// validation error naming it, rather than as a generic decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongPayload {
    id: Option<LooseInteger>,
    pub title: Option<String>,
    pub singer: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub singer_id: Option<String>,
    pub mark: Option<String>,
    pub label: Option<String>,
    pub src: Option<String>,
    pub index: Option<i64>,
    pub lyric: Option<String>,
    list_id: Option<LooseInteger>,
}

/// A validated song, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSong {
    pub song_id: SongId,
    pub title: String,
    pub singer: String,
    pub singer_id: Option<String>,
    pub mark: Option<String>,
    pub label: Option<String>,
    pub src: String,
    pub index: Option<i64>,
    pub lyric: Option<String>,
}

fn required(field: &'static str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::MissingField(field)),
    }
}

impl SongPayload {
    /// Decode a JSON request body.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::InvalidPayload(e.to_string()))
    }

    /// Validate as a recently-played entry.
    pub fn into_new_song(self) -> Result<NewSong> {
        let song_id = match self.id {
            Some(id) => SongId(id.resolve("id")?),
            None => return Err(Error::MissingField("id")),
        };

        Ok(NewSong {
            song_id,
            title: required("title", self.title)?,
            singer: required("singer", self.singer)?,
            singer_id: self.singer_id,
            mark: self.mark,
            label: self.label,
            src: required("src", self.src)?,
            index: self.index,
            lyric: self.lyric,
        })
    }

    /// Validate as a song-list entry, which additionally needs `list_id`.
    pub fn into_list_entry(mut self) -> Result<(ListId, NewSong)> {
        if self.id.is_none() {
            return Err(Error::MissingField("id"));
        }
        let list_id = match self.list_id.take() {
            Some(id) => ListId(id.resolve("list_id")?),
            None => return Err(Error::MissingField("list_id")),
        };
        Ok((list_id, self.into_new_song()?))
    }
}
