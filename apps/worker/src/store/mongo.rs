//! MongoDB history store

use std::time::Duration;

use async_trait::async_trait;
use encore_shared_config::{HistoryStoreConfig, MongoCredentials, SecretBundle};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use serde::Deserialize;

use super::{HistoryStore, HistoryStoreGateway, StoreError, StoreResult};
use crate::models::{InsertedTrack, ListenedTrack, TrackAggregate, TrackIdentity};

/// Server error code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

const APP_NAME: &str = "encore-worker";

/// Gateway for the hosted MongoDB collection
#[derive(Debug, Clone)]
pub struct MongoGateway {
    config: HistoryStoreConfig,
}

impl MongoGateway {
    pub fn new(config: HistoryStoreConfig) -> Self {
        Self { config }
    }

    async fn connect(&self, credentials: &MongoCredentials) -> StoreResult<Client> {
        let url = self.config.connection_url(credentials)?;
        let timeout = Duration::from_secs(self.config.connect_timeout_secs);

        let mut options = ClientOptions::parse(&url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        options.app_name = Some(APP_NAME.to_string());
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);

        let client = Client::with_options(options)?;

        // Client creation is lazy; ping so an unreachable server fails here
        client
            .database(&self.config.database)
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(client)
    }
}

#[async_trait]
impl HistoryStoreGateway for MongoGateway {
    async fn open(&self, secrets: &SecretBundle) -> StoreResult<Box<dyn HistoryStore>> {
        let credentials = MongoCredentials::from_secrets(secrets);

        tracing::debug!(
            url = %self.config.redacted_url(&credentials),
            collection = %self.config.collection,
            "Connecting to history store"
        );

        let client = self.connect(&credentials).await?;
        let collection = client
            .database(&self.config.database)
            .collection::<ListenedTrack>(&self.config.collection);

        tracing::info!(
            database = %self.config.database,
            collection = %self.config.collection,
            "Connected to history store"
        );

        Ok(Box::new(MongoTrackStore { client, collection }))
    }
}

/// Open connection to the listened-tracks collection
#[derive(Debug, Clone)]
pub struct MongoTrackStore {
    client: Client,
    collection: Collection<ListenedTrack>,
}

/// Unique (`id`, `date`) index backing the duplicate check
///
/// Left unnamed so the server derives `id_1_date_1`, the name an index
/// provisioned by hand on the same keys already has.
fn unique_index_model() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "id": 1, "date": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

#[async_trait]
impl HistoryStore for MongoTrackStore {
    async fn insert(&self, track: &ListenedTrack) -> StoreResult<InsertedTrack> {
        let result = self
            .collection
            .insert_one(track, None)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    StoreError::duplicate(track)
                } else {
                    StoreError::Mongo(e)
                }
            })?;

        Ok(InsertedTrack {
            inserted_id: bson_id_to_string(&result.inserted_id),
            track: track.clone(),
        })
    }

    async fn ensure_unique_index(&self) -> StoreResult<()> {
        let created = self.collection.create_index(unique_index_model(), None).await?;
        tracing::debug!(index = %created.index_name, "Ensured unique index");
        Ok(())
    }

    async fn repeated_tracks(&self, min_count: u32) -> StoreResult<Vec<TrackAggregate>> {
        let mut cursor = self
            .collection
            .aggregate(repeated_tracks_pipeline(min_count), None)
            .await?;

        let mut aggregates = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            aggregates.push(decode_group(document)?);
        }

        tracing::debug!(groups = aggregates.len(), min_count, "Aggregated listening history");
        Ok(aggregates)
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        tracing::debug!("Closed history store connection");
    }
}

/// Aggregation pipeline grouping playback events by track identity
///
/// Groups are ranked by `count` descending, then earliest playback, then
/// track id, matching [`crate::aggregate::rank`].
pub fn repeated_tracks_pipeline(min_count: u32) -> Vec<Document> {
    vec![
        doc! {
            "$group": {
                "_id": {
                    "artist": "$artist.name",
                    "album": "$album.name",
                    "name": "$name",
                    "id": "$id",
                },
                "uniqueIds": { "$addToSet": "$date" },
                "count": { "$sum": 1 },
                "firstPlayedAt": { "$min": "$date" },
            }
        },
        doc! { "$match": { "count": { "$gte": i64::from(min_count) } } },
        doc! { "$sort": { "count": -1, "firstPlayedAt": 1, "_id.id": 1 } },
    ]
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupDocument {
    #[serde(rename = "_id")]
    key: GroupKey,
    count: i64,
    #[serde(default)]
    unique_ids: Vec<String>,
    #[serde(default)]
    first_played_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroupKey {
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    album: Option<String>,
    #[serde(default)]
    name: Option<String>,
    id: String,
}

fn decode_group(document: Document) -> StoreResult<TrackAggregate> {
    let group: GroupDocument =
        mongodb::bson::from_document(document).map_err(|e| StoreError::Decode(e.to_string()))?;

    let count = u32::try_from(group.count)
        .map_err(|_| StoreError::Decode(format!("invalid group count {}", group.count)))?;

    let mut unique_ids = group.unique_ids;
    unique_ids.sort();

    Ok(TrackAggregate {
        identity: TrackIdentity {
            artist: group.key.artist,
            album: group.key.album,
            name: group.key.name.unwrap_or_default(),
            id: group.key.id,
        },
        count,
        first_played_at: group
            .first_played_at
            .or_else(|| unique_ids.first().cloned())
            .unwrap_or_default(),
        unique_ids,
    })
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

fn bson_id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;
    use mongodb::error::WriteError;

    #[test]
    fn test_pipeline_threshold_and_sort() {
        let pipeline = repeated_tracks_pipeline(2);
        assert_eq!(pipeline.len(), 3);

        let group = pipeline[0].get_document("$group").unwrap();
        let key = group.get_document("_id").unwrap();
        assert_eq!(key.get_str("artist").unwrap(), "$artist.name");
        assert_eq!(key.get_str("album").unwrap(), "$album.name");
        assert_eq!(key.get_str("id").unwrap(), "$id");

        let threshold = pipeline[1]
            .get_document("$match")
            .and_then(|m| m.get_document("count"))
            .and_then(|c| c.get_i64("$gte"))
            .unwrap();
        assert_eq!(threshold, 2);

        let sort = pipeline[2].get_document("$sort").unwrap();
        let keys: Vec<&String> = sort.keys().collect();
        assert_eq!(keys, ["count", "firstPlayedAt", "_id.id"]);
        assert_eq!(sort.get_i32("count").unwrap(), -1);
    }

    #[test]
    fn test_decode_group() {
        let document = doc! {
            "_id": {
                "artist": "Boards of Canada",
                "album": "Music Has the Right to Children",
                "name": "Roygbiv",
                "id": "T1",
            },
            "uniqueIds": ["2024-05-01T10:10:00.000Z", "2024-05-01T10:00:00.000Z"],
            "count": 2,
            "firstPlayedAt": "2024-05-01T10:00:00.000Z",
        };

        let aggregate = decode_group(document).unwrap();
        assert_eq!(aggregate.count, 2);
        assert_eq!(aggregate.identity.artist.as_deref(), Some("Boards of Canada"));
        assert_eq!(aggregate.identity.id, "T1");
        assert_eq!(aggregate.unique_ids[0], "2024-05-01T10:00:00.000Z");
        assert_eq!(aggregate.first_played_at, "2024-05-01T10:00:00.000Z");
    }

    #[test]
    fn test_decode_group_with_missing_album_and_artist() {
        let document = doc! {
            "_id": { "artist": Bson::Null, "name": "Untitled", "id": "T9" },
            "uniqueIds": ["d1", "d2"],
            "count": 2_i64,
        };

        let aggregate = decode_group(document).unwrap();
        assert_eq!(aggregate.identity.artist, None);
        assert_eq!(aggregate.identity.album, None);
        assert_eq!(aggregate.first_played_at, "d1");
    }

    #[test]
    fn test_decode_group_without_id_fails() {
        let document = doc! { "_id": { "name": "Untitled" }, "count": 2 };
        assert!(matches!(decode_group(document), Err(StoreError::Decode(_))));
    }

    fn write_error(code: i32) -> MongoError {
        let failure: WriteError = mongodb::bson::from_document(doc! {
            "code": code,
            "codeName": "DuplicateKey",
            "errmsg": "E11000 duplicate key error collection: mussical-assistant.ListenedTracks",
        })
        .unwrap();
        MongoError::from(ErrorKind::Write(WriteFailure::WriteError(failure)))
    }

    #[test]
    fn test_duplicate_key_write_error() {
        assert!(is_duplicate_key(&write_error(DUPLICATE_KEY_CODE)));
        assert!(!is_duplicate_key(&write_error(121)));
    }

    #[test]
    fn test_unique_index_model() {
        let index = unique_index_model();
        let keys: Vec<&String> = index.keys.keys().collect();
        assert_eq!(keys, ["id", "date"]);

        let options = index.options.unwrap();
        assert_eq!(options.unique, Some(true));
        assert_eq!(options.name, None);
    }

    #[test]
    fn test_bson_id_to_string() {
        let oid = ObjectId::new();
        assert_eq!(bson_id_to_string(&Bson::ObjectId(oid)), oid.to_hex());
        assert_eq!(bson_id_to_string(&Bson::String("abc".into())), "abc");
    }
}
