//! Upstream catalog API (Jikan v4) response types.
//!
//! Only `mal_id` is required on any record. Everything else defaults when
//! absent or `null`, so upstream schema drift degrades a field instead of
//! failing the whole record.

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing field
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Single-record response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// Paginated response wrapper. Both fields may be absent on a final or
/// malformed page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub data: Option<Vec<T>>,
    pub pagination: Option<Pagination>,
}

impl<T> PageResponse<T> {
    pub fn has_next_page(&self) -> bool {
        self.pagination.as_ref().map_or(false, |p| p.has_next_page)
    }

    /// Total item count across all pages, if reported
    pub fn total_items(&self) -> Option<u64> {
        self.pagination
            .as_ref()
            .and_then(|p| p.items.as_ref())
            .map(|items| items.total)
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub last_visible_page: Option<u32>,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub items: Option<PaginationItems>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginationItems {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub per_page: u64,
}

/// Image URLs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub jpg: Option<ImageSet>,
    #[serde(default)]
    pub webp: Option<ImageSet>,
}

impl Images {
    pub fn image_url(&self) -> Option<String> {
        self.jpg.as_ref().and_then(|set| set.image_url.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageSet {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

/// Date range (`aired`, `published`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

/// Reference to another catalog record (genre, studio, related entry)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MalEntity {
    pub mal_id: u32,
    #[serde(rename = "type", default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Typed title (`Default`, `Japanese`, `Synonym`, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleEntry {
    #[serde(rename = "type", default)]
    pub title_type: String,
    #[serde(default)]
    pub title: String,
}

/// Anime record as returned by `/anime`, `/anime/{id}` and season listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimePayload {
    pub mal_id: u32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub images: Images,

    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub title_japanese: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub title_synonyms: Vec<String>,

    #[serde(rename = "type", default)]
    pub anime_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub airing: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub aired: DateRange,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,

    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub scored_by: Option<u32>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub members: Option<u32>,
    #[serde(default)]
    pub favorites: Option<u32>,

    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
}

/// Anime record from `/anime/{id}/full`: the base record plus associations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeFullPayload {
    pub mal_id: u32,

    #[serde(default, deserialize_with = "nullable")]
    pub producers: Vec<MalEntity>,
    #[serde(default, deserialize_with = "nullable")]
    pub licensors: Vec<MalEntity>,
    #[serde(default, deserialize_with = "nullable")]
    pub studios: Vec<MalEntity>,

    #[serde(default, deserialize_with = "nullable")]
    pub genres: Vec<MalEntity>,
    #[serde(default, deserialize_with = "nullable")]
    pub explicit_genres: Vec<MalEntity>,
    #[serde(default, deserialize_with = "nullable")]
    pub themes: Vec<MalEntity>,
    #[serde(default, deserialize_with = "nullable")]
    pub demographics: Vec<MalEntity>,

    #[serde(default, deserialize_with = "nullable")]
    pub relations: Vec<RelationGroup>,
}

/// One relation kind (`Sequel`, `Adaptation`, ...) and its entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationGroup {
    #[serde(default)]
    pub relation: String,
    #[serde(default, deserialize_with = "nullable")]
    pub entry: Vec<MalEntity>,
}

/// Manga record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MangaPayload {
    pub mal_id: u32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub images: Images,

    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub title_japanese: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub title_synonyms: Vec<String>,

    #[serde(rename = "type", default)]
    pub manga_type: Option<String>,
    #[serde(default)]
    pub chapters: Option<u32>,
    #[serde(default)]
    pub volumes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub publishing: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub published: DateRange,

    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub scored_by: Option<u32>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub members: Option<u32>,
    #[serde(default)]
    pub favorites: Option<u32>,

    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
}

/// Character record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterPayload {
    pub mal_id: u32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub images: Images,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_kanji: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub nicknames: Vec<String>,
    #[serde(default)]
    pub favorites: Option<u32>,
    #[serde(default)]
    pub about: Option<String>,
}

/// Person record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonPayload {
    pub mal_id: u32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub images: Images,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub alternate_names: Vec<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub favorites: Option<u32>,
    #[serde(default)]
    pub about: Option<String>,
}

/// Producer, studio or licensor record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerPayload {
    pub mal_id: u32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub titles: Vec<TitleEntry>,
    #[serde(default, deserialize_with = "nullable")]
    pub images: Images,
    #[serde(default)]
    pub favorites: Option<u32>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub established: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
}

/// Magazine record (listing only; there is no per-id endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagazinePayload {
    pub mal_id: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
}

/// Genre, theme, demographic or explicit genre
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenrePayload {
    pub mal_id: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
}

/// Episode from `/anime/{id}/episodes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodePayload {
    pub mal_id: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_japanese: Option<String>,
    #[serde(default)]
    pub title_romanji: Option<String>,
    #[serde(default)]
    pub aired: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub filler: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub recap: bool,
    #[serde(default)]
    pub forum_url: Option<String>,
}

/// Compact character or person reference inside cast listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRef {
    pub mal_id: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Entry of `/anime/{id}/characters`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeCharacterEntry {
    pub character: EntityRef,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub voice_actors: Vec<VoiceActorEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceActorEntry {
    pub person: EntityRef,
    #[serde(default)]
    pub language: Option<String>,
}

/// Entry of `/anime/{id}/staff`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffEntry {
    pub person: EntityRef,
    #[serde(default, deserialize_with = "nullable")]
    pub positions: Vec<String>,
}

/// Entry of `/manga/{id}/characters`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MangaCharacterEntry {
    pub character: EntityRef,
    #[serde(default)]
    pub role: Option<String>,
}

pub type AnimeResponse = DataResponse<AnimePayload>;
pub type AnimeFullResponse = DataResponse<AnimeFullPayload>;
pub type MangaResponse = DataResponse<MangaPayload>;
pub type CharacterResponse = DataResponse<CharacterPayload>;
pub type PersonResponse = DataResponse<PersonPayload>;
pub type ProducerResponse = DataResponse<ProducerPayload>;
pub type AnimeCharactersResponse = DataResponse<Vec<AnimeCharacterEntry>>;
pub type AnimeStaffResponse = DataResponse<Vec<StaffEntry>>;
pub type MangaCharactersResponse = DataResponse<Vec<MangaCharacterEntry>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nulls_and_missing_fields_default() -> anyhow::Result<()> {
        let json = r#"{
            "data": {
                "mal_id": 1,
                "title": "Cowboy Bebop",
                "title_synonyms": null,
                "images": null,
                "aired": {"from": "1998-04-03T00:00:00+00:00", "to": null}
            }
        }"#;
        let response: AnimeResponse = serde_json::from_str(json)?;
        assert_eq!(response.data.mal_id, 1);
        assert!(response.data.title_synonyms.is_empty());
        assert!(response.data.images.image_url().is_none());
        assert!(!response.data.airing);
        assert_eq!(response.data.aired.from.as_deref(), Some("1998-04-03T00:00:00+00:00"));
        Ok(())
    }

    #[test]
    fn test_page_metadata() -> anyhow::Result<()> {
        let json = r#"{
            "pagination": {
                "last_visible_page": 40,
                "has_next_page": true,
                "current_page": 1,
                "items": {"count": 25, "total": 1000, "per_page": 25}
            },
            "data": [{"mal_id": 1, "name": "Action", "count": 4000}]
        }"#;
        let page: PageResponse<GenrePayload> = serde_json::from_str(json)?;
        assert!(page.has_next_page());
        assert_eq!(page.total_items(), Some(1000));
        assert_eq!(page.data.map(|d| d.len()), Some(1));
        Ok(())
    }

    #[test]
    fn test_page_without_data() -> anyhow::Result<()> {
        let page: PageResponse<GenrePayload> = serde_json::from_str("{}")?;
        assert!(page.data.is_none());
        assert!(!page.has_next_page());
        assert_eq!(page.total_items(), None);
        Ok(())
    }

    #[test]
    fn test_page_of_non_default_items() -> anyhow::Result<()> {
        let page: PageResponse<EpisodePayload> =
            serde_json::from_str(r#"{"data": null, "pagination": {"has_next_page": true}}"#)?;
        assert!(page.data.is_none());
        assert!(page.has_next_page());

        let page: PageResponse<EpisodePayload> =
            serde_json::from_str(r#"{"data": [{"mal_id": 1, "title": "Asteroid Blues"}]}"#)?;
        assert_eq!(page.data.map(|d| d.len()), Some(1));
        Ok(())
    }

    #[test]
    fn test_missing_id_fails() {
        let result: Result<CharacterResponse, _> = serde_json::from_str(r#"{"data": {"name": "Spike"}}"#);
        assert!(result.is_err());
    }
}
