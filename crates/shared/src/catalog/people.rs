use super::{from_json, to_json, Catalog};
use crate::models::PersonRow;
use anyhow::{bail, Context, Result};
use rusqlite::{params, OptionalExtension};
use tracing::debug;

impl Catalog {
    pub fn find_person(&self, mal_id: u32) -> Result<Option<PersonRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT mal_id, url, website_url, image_url, name, given_name, family_name,
                        alternate_names, birthday, favorites, about, fetched_at, updated_at
                 FROM people WHERE mal_id = ?1",
                params![mal_id],
                |row| {
                    Ok(PersonRow {
                        mal_id: row.get(0)?,
                        url: row.get(1)?,
                        website_url: row.get(2)?,
                        image_url: row.get(3)?,
                        name: row.get(4)?,
                        given_name: row.get(5)?,
                        family_name: row.get(6)?,
                        alternate_names: from_json(row.get(7)?),
                        birthday: row.get(8)?,
                        favorites: row.get(9)?,
                        about: row.get(10)?,
                        fetched_at: row.get(11)?,
                        updated_at: row.get(12)?,
                    })
                },
            )
            .optional()
            .context("Failed to query person")
        })
    }

    pub fn insert_person(&self, person: &PersonRow) -> Result<()> {
        let alternate_names = to_json(&person.alternate_names)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO people (
                    mal_id, url, website_url, image_url, name, given_name, family_name,
                    alternate_names, birthday, favorites, about, fetched_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    person.mal_id,
                    person.url,
                    person.website_url,
                    person.image_url,
                    person.name,
                    person.given_name,
                    person.family_name,
                    alternate_names,
                    person.birthday,
                    person.favorites,
                    person.about,
                    person.fetched_at,
                    person.updated_at,
                ],
            )
            .with_context(|| format!("Failed to insert person {}", person.mal_id))?;

            debug!(mal_id = person.mal_id, name = %person.name, "Inserted person");
            Ok(())
        })
    }

    pub fn update_person(&self, person: &PersonRow) -> Result<()> {
        let alternate_names = to_json(&person.alternate_names)?;
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE people SET
                        url = ?2, website_url = ?3, image_url = ?4, name = ?5,
                        given_name = ?6, family_name = ?7, alternate_names = ?8,
                        birthday = ?9, favorites = ?10, about = ?11, updated_at = ?12
                     WHERE mal_id = ?1",
                    params![
                        person.mal_id,
                        person.url,
                        person.website_url,
                        person.image_url,
                        person.name,
                        person.given_name,
                        person.family_name,
                        alternate_names,
                        person.birthday,
                        person.favorites,
                        person.about,
                        person.updated_at,
                    ],
                )
                .with_context(|| format!("Failed to update person {}", person.mal_id))?;

            if changed == 0 {
                bail!("Person {} does not exist", person.mal_id);
            }
            Ok(())
        })
    }
}
