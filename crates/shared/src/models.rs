//! Row models for the catalog store.
//!
//! These are the shapes the ingestion pipeline writes. They are produced by
//! pure mapping functions from the upstream wire payloads and carry no
//! behaviour beyond small conveniences.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Anime metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeRow {
    pub mal_id: u32,
    pub url: Option<String>,
    pub image_url: Option<String>,

    // Titles
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    pub title_synonyms: Vec<String>,

    // Type and status
    pub anime_type: Option<String>, // TV, Movie, OVA, etc.
    pub source: Option<String>,
    pub episodes: Option<u32>,
    pub status: Option<String>,
    pub airing: bool,

    // Dates
    pub aired_from: Option<NaiveDate>,
    pub aired_to: Option<NaiveDate>,
    pub duration: Option<String>,
    pub rating: Option<String>,
    pub season: Option<String>,
    pub year: Option<i32>,

    // Scores and rankings
    pub score: Option<f64>,
    pub scored_by: Option<u32>,
    pub rank: Option<u32>,
    pub popularity: Option<u32>,
    pub members: Option<u32>,
    pub favorites: Option<u32>,

    pub synopsis: Option<String>,
    pub background: Option<String>,

    pub fetched_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Manga metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MangaRow {
    pub mal_id: u32,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    pub title_synonyms: Vec<String>,
    pub manga_type: Option<String>,
    pub chapters: Option<u32>,
    pub volumes: Option<u32>,
    pub status: Option<String>,
    pub publishing: bool,
    pub published_from: Option<NaiveDate>,
    pub published_to: Option<NaiveDate>,
    pub score: Option<f64>,
    pub scored_by: Option<u32>,
    pub rank: Option<u32>,
    pub popularity: Option<u32>,
    pub members: Option<u32>,
    pub favorites: Option<u32>,
    pub synopsis: Option<String>,
    pub background: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Character metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRow {
    pub mal_id: u32,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub name: String,
    pub name_kanji: Option<String>,
    pub nicknames: Vec<String>,
    pub favorites: Option<u32>,
    pub about: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Person (voice actor, staff member, author)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRow {
    pub mal_id: u32,
    pub url: Option<String>,
    pub website_url: Option<String>,
    pub image_url: Option<String>,
    pub name: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub alternate_names: Vec<String>,
    pub birthday: Option<NaiveDate>,
    pub favorites: Option<u32>,
    pub about: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Producer, studio or licensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerRow {
    pub mal_id: u32,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub name: String,
    /// All titles as (type, title) pairs
    pub titles: Vec<(String, String)>,
    pub established: Option<NaiveDate>,
    pub favorites: Option<u32>,
    pub count: Option<u32>,
    pub about: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Manga magazine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagazineRow {
    pub mal_id: u32,
    pub name: String,
    pub url: Option<String>,
    pub count: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

/// Which catalog a genre list belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenreKind {
    Anime,
    Manga,
}

impl GenreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenreKind::Anime => "anime",
            GenreKind::Manga => "manga",
        }
    }
}

impl std::fmt::Display for GenreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GenreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anime" => Ok(GenreKind::Anime),
            "manga" => Ok(GenreKind::Manga),
            _ => Err(anyhow::anyhow!("Invalid genre kind: {}", s)),
        }
    }
}

/// Genre, keyed by (mal_id, kind)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreRow {
    pub mal_id: u32,
    pub kind: GenreKind,
    pub name: String,
    pub url: Option<String>,
    pub count: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

/// Anime episode, keyed by (anime_id, mal_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRow {
    pub anime_id: u32,
    pub mal_id: u32,
    pub title: Option<String>,
    pub title_japanese: Option<String>,
    pub title_romanji: Option<String>,
    pub aired: Option<NaiveDate>,
    pub score: Option<f64>,
    pub filler: bool,
    pub recap: bool,
    pub forum_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// How a genre-like classification is attached to an anime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenreRole {
    Genre,
    ExplicitGenre,
    Theme,
    Demographic,
}

impl GenreRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenreRole::Genre => "genre",
            GenreRole::ExplicitGenre => "explicit_genre",
            GenreRole::Theme => "theme",
            GenreRole::Demographic => "demographic",
        }
    }
}

/// How a company is attached to an anime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProducerRole {
    Producer,
    Licensor,
    Studio,
}

impl ProducerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProducerRole::Producer => "producer",
            ProducerRole::Licensor => "licensor",
            ProducerRole::Studio => "studio",
        }
    }
}

/// anime <-> genre association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeGenreLink {
    pub anime_id: u32,
    pub genre_id: u32,
    pub role: GenreRole,
}

/// anime <-> producer association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeProducerLink {
    pub anime_id: u32,
    pub producer_id: u32,
    pub role: ProducerRole,
}

/// anime -> related entry (sequel, adaptation, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeRelationLink {
    pub anime_id: u32,
    pub related_id: u32,
    /// "anime" or "manga"
    pub related_type: String,
    pub relation: String,
}

/// anime <-> character association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeCharacterLink {
    pub anime_id: u32,
    pub character_id: u32,
    pub role: Option<String>,
}

/// Who voices a character in an anime, per language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceActorLink {
    pub anime_id: u32,
    pub character_id: u32,
    pub person_id: u32,
    pub language: String,
}

/// anime <-> staff member, one row per position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeStaffLink {
    pub anime_id: u32,
    pub person_id: u32,
    pub position: String,
}

/// manga <-> character association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MangaCharacterLink {
    pub manga_id: u32,
    pub character_id: u32,
    pub role: Option<String>,
}
