//! Pure wire-payload to row transforms.
//!
//! Mappers never touch the network or the store. A record without its
//! display name/title cannot be stored and is rejected with an error, which
//! the fetchers count against the record.

use crate::api::{
    AnimeCharacterEntry, AnimeFullPayload, AnimePayload, CharacterPayload, EpisodePayload,
    GenrePayload, MagazinePayload, MangaCharacterEntry, MangaPayload, MalEntity, PersonPayload,
    ProducerPayload, StaffEntry,
};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use shared::models::*;

/// Parse an upstream date, either RFC 3339 or a bare `YYYY-MM-DD`
pub fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| value.get(..10).and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()))
}

/// Non-blank value of a required text field
fn required(value: &Option<String>, what: &str, field: &str, mal_id: u32) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .with_context(|| format!("{} {} has no {}", what, mal_id, field))
}

pub fn anime_row(payload: &AnimePayload) -> Result<AnimeRow> {
    let now = Utc::now();
    Ok(AnimeRow {
        mal_id: payload.mal_id,
        url: payload.url.clone(),
        image_url: payload.images.image_url(),
        title: required(&payload.title, "anime", "title", payload.mal_id)?,
        title_english: payload.title_english.clone(),
        title_japanese: payload.title_japanese.clone(),
        title_synonyms: payload.title_synonyms.clone(),
        anime_type: payload.anime_type.clone(),
        source: payload.source.clone(),
        episodes: payload.episodes,
        status: payload.status.clone(),
        airing: payload.airing,
        aired_from: parse_date(payload.aired.from.as_deref()),
        aired_to: parse_date(payload.aired.to.as_deref()),
        duration: payload.duration.clone(),
        rating: payload.rating.clone(),
        season: payload.season.clone(),
        year: payload.year,
        score: payload.score,
        scored_by: payload.scored_by,
        rank: payload.rank,
        popularity: payload.popularity,
        members: payload.members,
        favorites: payload.favorites,
        synopsis: payload.synopsis.clone(),
        background: payload.background.clone(),
        fetched_at: now,
        updated_at: now,
    })
}

pub fn manga_row(payload: &MangaPayload) -> Result<MangaRow> {
    let now = Utc::now();
    Ok(MangaRow {
        mal_id: payload.mal_id,
        url: payload.url.clone(),
        image_url: payload.images.image_url(),
        title: required(&payload.title, "manga", "title", payload.mal_id)?,
        title_english: payload.title_english.clone(),
        title_japanese: payload.title_japanese.clone(),
        title_synonyms: payload.title_synonyms.clone(),
        manga_type: payload.manga_type.clone(),
        chapters: payload.chapters,
        volumes: payload.volumes,
        status: payload.status.clone(),
        publishing: payload.publishing,
        published_from: parse_date(payload.published.from.as_deref()),
        published_to: parse_date(payload.published.to.as_deref()),
        score: payload.score,
        scored_by: payload.scored_by,
        rank: payload.rank,
        popularity: payload.popularity,
        members: payload.members,
        favorites: payload.favorites,
        synopsis: payload.synopsis.clone(),
        background: payload.background.clone(),
        fetched_at: now,
        updated_at: now,
    })
}

pub fn character_row(payload: &CharacterPayload) -> Result<CharacterRow> {
    let now = Utc::now();
    Ok(CharacterRow {
        mal_id: payload.mal_id,
        url: payload.url.clone(),
        image_url: payload.images.image_url(),
        name: required(&payload.name, "character", "name", payload.mal_id)?,
        name_kanji: payload.name_kanji.clone(),
        nicknames: payload.nicknames.clone(),
        favorites: payload.favorites,
        about: payload.about.clone(),
        fetched_at: now,
        updated_at: now,
    })
}

pub fn person_row(payload: &PersonPayload) -> Result<PersonRow> {
    let now = Utc::now();
    Ok(PersonRow {
        mal_id: payload.mal_id,
        url: payload.url.clone(),
        website_url: payload.website_url.clone(),
        image_url: payload.images.image_url(),
        name: required(&payload.name, "person", "name", payload.mal_id)?,
        given_name: payload.given_name.clone(),
        family_name: payload.family_name.clone(),
        alternate_names: payload.alternate_names.clone(),
        birthday: parse_date(payload.birthday.as_deref()),
        favorites: payload.favorites,
        about: payload.about.clone(),
        fetched_at: now,
        updated_at: now,
    })
}

/// Display name: the `Default` title, else the first title, else a placeholder
pub fn producer_name(payload: &ProducerPayload) -> String {
    payload
        .titles
        .iter()
        .find(|t| t.title_type == "Default" && !t.title.is_empty())
        .or_else(|| payload.titles.iter().find(|t| !t.title.is_empty()))
        .map(|t| t.title.clone())
        .unwrap_or_else(|| format!("Producer {}", payload.mal_id))
}

pub fn producer_row(payload: &ProducerPayload) -> ProducerRow {
    ProducerRow {
        mal_id: payload.mal_id,
        url: payload.url.clone(),
        image_url: payload.images.image_url(),
        name: producer_name(payload),
        titles: payload
            .titles
            .iter()
            .map(|t| (t.title_type.clone(), t.title.clone()))
            .collect(),
        established: parse_date(payload.established.as_deref()),
        favorites: payload.favorites,
        count: payload.count,
        about: payload.about.clone(),
        updated_at: Utc::now(),
    }
}

pub fn magazine_row(payload: &MagazinePayload) -> Result<MagazineRow> {
    Ok(MagazineRow {
        mal_id: payload.mal_id,
        name: required(&payload.name, "magazine", "name", payload.mal_id)?,
        url: payload.url.clone(),
        count: payload.count,
        updated_at: Utc::now(),
    })
}

pub fn genre_row(payload: &GenrePayload, kind: GenreKind) -> Result<GenreRow> {
    Ok(GenreRow {
        mal_id: payload.mal_id,
        kind,
        name: required(&payload.name, "genre", "name", payload.mal_id)?,
        url: payload.url.clone(),
        count: payload.count,
        updated_at: Utc::now(),
    })
}

pub fn episode_rows(anime_id: u32, payloads: &[EpisodePayload]) -> Vec<EpisodeRow> {
    let now = Utc::now();
    payloads
        .iter()
        .map(|ep| EpisodeRow {
            anime_id,
            mal_id: ep.mal_id,
            title: ep.title.clone(),
            title_japanese: ep.title_japanese.clone(),
            title_romanji: ep.title_romanji.clone(),
            aired: parse_date(ep.aired.as_deref()),
            score: ep.score,
            filler: ep.filler,
            recap: ep.recap,
            forum_url: ep.forum_url.clone(),
            updated_at: now,
        })
        .collect()
}

/// Join rows derived from a full anime record
#[derive(Debug, Default)]
pub struct AnimeFullLinks {
    pub genres: Vec<AnimeGenreLink>,
    pub producers: Vec<AnimeProducerLink>,
    pub relations: Vec<AnimeRelationLink>,
}

impl AnimeFullLinks {
    pub fn len(&self) -> usize {
        self.genres.len() + self.producers.len() + self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn anime_full_links(payload: &AnimeFullPayload) -> AnimeFullLinks {
    let anime_id = payload.mal_id;

    let genre_links = |entities: &[MalEntity], role: GenreRole| {
        entities
            .iter()
            .map(move |e| AnimeGenreLink { anime_id, genre_id: e.mal_id, role })
            .collect::<Vec<_>>()
    };
    let producer_links = |entities: &[MalEntity], role: ProducerRole| {
        entities
            .iter()
            .map(move |e| AnimeProducerLink { anime_id, producer_id: e.mal_id, role })
            .collect::<Vec<_>>()
    };

    let mut genres = genre_links(&payload.genres, GenreRole::Genre);
    genres.extend(genre_links(&payload.explicit_genres, GenreRole::ExplicitGenre));
    genres.extend(genre_links(&payload.themes, GenreRole::Theme));
    genres.extend(genre_links(&payload.demographics, GenreRole::Demographic));

    let mut producers = producer_links(&payload.producers, ProducerRole::Producer);
    producers.extend(producer_links(&payload.licensors, ProducerRole::Licensor));
    producers.extend(producer_links(&payload.studios, ProducerRole::Studio));

    let relations = payload
        .relations
        .iter()
        .flat_map(|group| {
            group.entry.iter().map(move |entry| AnimeRelationLink {
                anime_id,
                related_id: entry.mal_id,
                related_type: entry.entity_type.clone().unwrap_or_else(|| "unknown".to_string()),
                relation: group.relation.clone(),
            })
        })
        .collect();

    AnimeFullLinks { genres, producers, relations }
}

pub fn anime_character_links(
    anime_id: u32,
    entries: &[AnimeCharacterEntry],
) -> (Vec<AnimeCharacterLink>, Vec<VoiceActorLink>) {
    let characters = entries
        .iter()
        .map(|entry| AnimeCharacterLink {
            anime_id,
            character_id: entry.character.mal_id,
            role: entry.role.clone(),
        })
        .collect();

    let voice_actors = entries
        .iter()
        .flat_map(|entry| {
            entry.voice_actors.iter().map(move |va| VoiceActorLink {
                anime_id,
                character_id: entry.character.mal_id,
                person_id: va.person.mal_id,
                language: va.language.clone().unwrap_or_else(|| "Unknown".to_string()),
            })
        })
        .collect();

    (characters, voice_actors)
}

/// One row per (person, position); a person listed without positions
/// gets a single `Unknown` row
pub fn anime_staff_links(anime_id: u32, entries: &[StaffEntry]) -> Vec<AnimeStaffLink> {
    entries
        .iter()
        .flat_map(|entry| {
            let positions = if entry.positions.is_empty() {
                vec!["Unknown".to_string()]
            } else {
                entry.positions.clone()
            };
            positions.into_iter().map(move |position| AnimeStaffLink {
                anime_id,
                person_id: entry.person.mal_id,
                position,
            })
        })
        .collect()
}

pub fn manga_character_links(manga_id: u32, entries: &[MangaCharacterEntry]) -> Vec<MangaCharacterLink> {
    entries
        .iter()
        .map(|entry| MangaCharacterLink {
            manga_id,
            character_id: entry.character.mal_id,
            role: entry.role.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AnimeFullResponse, AnimeResponse, ProducerResponse};

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("1998-04-03T00:00:00+00:00")),
            NaiveDate::from_ymd_opt(1998, 4, 3)
        );
        assert_eq!(parse_date(Some("2001-09-01")), NaiveDate::from_ymd_opt(2001, 9, 1));
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(Some("sometime")), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn test_anime_row() -> anyhow::Result<()> {
        let response: AnimeResponse = serde_json::from_value(serde_json::json!({
            "data": {
                "mal_id": 1,
                "title": "Cowboy Bebop",
                "title_synonyms": ["Bebop"],
                "type": "TV",
                "episodes": 26,
                "aired": {"from": "1998-04-03T00:00:00+00:00", "to": "1999-04-24T00:00:00+00:00"},
                "images": {"jpg": {"image_url": "https://cdn/1.jpg"}},
                "year": 1998
            }
        }))?;
        let row = anime_row(&response.data)?;
        assert_eq!(row.title, "Cowboy Bebop");
        assert_eq!(row.anime_type.as_deref(), Some("TV"));
        assert_eq!(row.aired_to, NaiveDate::from_ymd_opt(1999, 4, 24));
        assert_eq!(row.image_url.as_deref(), Some("https://cdn/1.jpg"));
        assert_eq!(row.title_synonyms, vec!["Bebop".to_string()]);
        Ok(())
    }

    #[test]
    fn test_anime_without_title_is_rejected() -> anyhow::Result<()> {
        let response: AnimeResponse =
            serde_json::from_value(serde_json::json!({"data": {"mal_id": 9, "title": "  "}}))?;
        let err = anime_row(&response.data).unwrap_err();
        assert!(err.to_string().contains("anime 9 has no title"));
        Ok(())
    }

    #[test]
    fn test_producer_name_fallbacks() -> anyhow::Result<()> {
        let with_default: ProducerResponse = serde_json::from_value(serde_json::json!({
            "data": {"mal_id": 14, "titles": [
                {"type": "Japanese", "title": "サンライズ"},
                {"type": "Default", "title": "Sunrise"}
            ]}
        }))?;
        assert_eq!(producer_name(&with_default.data), "Sunrise");

        let first_only: ProducerResponse = serde_json::from_value(serde_json::json!({
            "data": {"mal_id": 15, "titles": [{"type": "Synonym", "title": "Other"}]}
        }))?;
        assert_eq!(producer_name(&first_only.data), "Other");

        let untitled: ProducerResponse =
            serde_json::from_value(serde_json::json!({"data": {"mal_id": 16}}))?;
        assert_eq!(producer_name(&untitled.data), "Producer 16");
        assert_eq!(producer_row(&untitled.data).titles.len(), 0);
        Ok(())
    }

    #[test]
    fn test_anime_full_links() -> anyhow::Result<()> {
        let response: AnimeFullResponse = serde_json::from_value(serde_json::json!({
            "data": {
                "mal_id": 1,
                "genres": [{"mal_id": 1, "type": "anime", "name": "Action"}],
                "themes": [{"mal_id": 50, "type": "anime", "name": "Adult Cast"}],
                "studios": [{"mal_id": 14, "type": "anime", "name": "Sunrise"}],
                "licensors": [{"mal_id": 102, "type": "anime", "name": "Funimation"}],
                "relations": [
                    {"relation": "Adaptation", "entry": [{"mal_id": 173, "type": "manga", "name": "Cowboy Bebop"}]},
                    {"relation": "Side story", "entry": [{"mal_id": 5, "type": "anime"}, {"mal_id": 17205, "type": "anime"}]}
                ]
            }
        }))?;
        let links = anime_full_links(&response.data);
        assert_eq!(links.genres.len(), 2);
        assert_eq!(links.genres[1].role, GenreRole::Theme);
        assert_eq!(links.producers.len(), 2);
        assert_eq!(links.relations.len(), 3);
        assert_eq!(links.relations[0].related_type, "manga");
        assert_eq!(links.len(), 7);
        Ok(())
    }

    #[test]
    fn test_staff_links_per_position() -> anyhow::Result<()> {
        let entries: Vec<StaffEntry> = serde_json::from_value(serde_json::json!([
            {"person": {"mal_id": 7}, "positions": ["Director", "Storyboard"]},
            {"person": {"mal_id": 8}, "positions": []}
        ]))?;
        let links = anime_staff_links(1, &entries);
        assert_eq!(links.len(), 3);
        assert_eq!(links[2].position, "Unknown");
        Ok(())
    }
}
