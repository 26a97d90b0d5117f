use anyhow::{Context, Result};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex as AsyncMutex;

use crate::config::Config;

pub const PATHS_COLLECTION: &str = "paths";
pub const USERS_COLLECTION: &str = "users";

/// One geographic waypoint embedded in a path document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub lat: f64,
    pub lng: f64,
    pub order: u32,
}

/// A named, ordered sequence of waypoints
///
/// Locations are owned by the path: they are created, renumbered, and
/// destroyed only through mutations of the enclosing document. The `order`
/// values of the embedded locations are kept contiguous (`0..N-1`, ascending
/// in storage order) by every mutating method on this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub locations: Vec<LocationDoc>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

impl PathDoc {
    /// Create a new path document with a fresh id and timestamps
    ///
    /// The supplied locations are stably sorted by their `order` rank and
    /// then renumbered from zero, so callers may pass arbitrary ranks (or
    /// array positions) and still end up with a contiguous sequence.
    pub fn new(name: impl Into<String>, mut locations: Vec<LocationDoc>) -> Self {
        locations.sort_by_key(|location| location.order);
        let now = BsonDateTime::now();
        let mut path = PathDoc {
            id: ObjectId::new(),
            name: name.into(),
            locations,
            created_at: now,
            updated_at: now,
        };
        path.renumber();
        path
    }

    /// Append a waypoint at the end of the sequence
    ///
    /// The new location's `order` is the current location count, so appends
    /// never disturb existing orders. Returns the assigned location id.
    pub fn append_location(&mut self, lat: f64, lng: f64) -> ObjectId {
        let location = LocationDoc {
            id: ObjectId::new(),
            lat,
            lng,
            order: self.locations.len() as u32,
        };
        let id = location.id;
        self.locations.push(location);
        id
    }

    /// Mutable access to one waypoint by id
    pub fn location_mut(&mut self, location_id: ObjectId) -> Option<&mut LocationDoc> {
        self.locations
            .iter_mut()
            .find(|location| location.id == location_id)
    }

    /// Remove a waypoint and close the order gap it leaves
    ///
    /// Remaining locations are renumbered sequentially from zero in their
    /// current storage order. Returns false when the id matches nothing.
    pub fn remove_location(&mut self, location_id: ObjectId) -> bool {
        let before = self.locations.len();
        self.locations.retain(|location| location.id != location_id);
        if self.locations.len() == before {
            return false;
        }
        self.renumber();
        true
    }

    /// Reassign contiguous `order` values in current storage order
    pub fn renumber(&mut self) {
        for (index, location) in self.locations.iter_mut().enumerate() {
            location.order = index as u32;
        }
    }

    fn touch(&mut self) {
        self.updated_at = BsonDateTime::now();
    }
}

/// The administrative credential record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    /// bcrypt hash, never the plain password
    pub password: String,
    pub created_at: BsonDateTime,
}

impl UserDoc {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        UserDoc {
            id: ObjectId::new(),
            email: email.into(),
            password: password_hash.into(),
            created_at: BsonDateTime::now(),
        }
    }
}

/// Outcome of a mutation that targets one location inside a path
#[derive(Debug)]
pub enum LocationMutation {
    Applied(PathDoc),
    PathMissing,
    LocationMissing,
}

/// Per-path mutual exclusion registry
///
/// Location mutations are read-modify-write against the whole path document
/// and must not interleave for the same path. Entries are dropped when their
/// path is deleted.
#[derive(Default)]
struct PathLocks {
    inner: StdMutex<HashMap<ObjectId, Arc<AsyncMutex<()>>>>,
}

impl PathLocks {
    fn for_path(&self, id: ObjectId) -> Arc<AsyncMutex<()>> {
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(id).or_default().clone()
    }

    fn forget(&self, id: &ObjectId) {
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.remove(id);
    }

    fn clear(&self) {
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.clear();
    }
}

/// Shareable MongoDB client for use across async handlers
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
    paths: Collection<PathDoc>,
    users: Collection<UserDoc>,
    locks: Arc<PathLocks>,
}

impl MongoStore {
    /// Create a store from configuration, verifying connectivity
    ///
    /// Pings the server and provisions the unique email index before
    /// returning, so an unreachable store fails startup instead of the first
    /// request.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = Self::connect(&config.mongodb_uri, &config.mongodb_database).await?;

        store
            .health_check()
            .await
            .context("MongoDB is unreachable at startup")?;
        store.ensure_indexes().await?;

        tracing::info!(
            "Successfully connected to MongoDB database: {}",
            config.mongodb_database
        );
        Ok(store)
    }

    /// Create a store handle without any I/O
    ///
    /// The driver connects lazily on the first operation.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .context("Failed to create MongoDB client")?;
        let db = client.database(database);

        Ok(MongoStore {
            paths: db.collection(PATHS_COLLECTION),
            users: db.collection(USERS_COLLECTION),
            db,
            locks: Arc::new(PathLocks::default()),
        })
    }

    /// Verify that the server is reachable and responsive
    ///
    /// # Errors
    /// Returns an error if the ping command fails
    pub async fn health_check(&self) -> Result<()> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .context("Failed to ping MongoDB")?;

        tracing::debug!("Health check ping succeeded");
        Ok(())
    }

    /// Unique index on account email, so concurrent bootstrap attempts
    /// cannot create duplicate admin records
    async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.users
            .create_index(index)
            .await
            .context("Failed to create unique email index")?;
        Ok(())
    }

    /// All paths, most recently created first
    pub async fn list_paths(&self) -> Result<Vec<PathDoc>> {
        let cursor = self
            .paths
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .await
            .context("Failed to query paths")?;

        let paths: Vec<PathDoc> = cursor
            .try_collect()
            .await
            .context("Failed to read path cursor")?;

        tracing::debug!("Listed {} paths", paths.len());
        Ok(paths)
    }

    /// One path by id
    ///
    /// # Returns
    /// * `Ok(Some(path))` - path found
    /// * `Ok(None)` - no path with that id
    /// * `Err(_)` - store operation failed
    pub async fn get_path(&self, id: ObjectId) -> Result<Option<PathDoc>> {
        self.paths
            .find_one(doc! { "_id": id })
            .await
            .context("Failed to query path")
    }

    /// Persist a freshly constructed path document
    pub async fn insert_path(&self, path: PathDoc) -> Result<PathDoc> {
        self.paths
            .insert_one(&path)
            .await
            .context("Failed to insert path")?;

        tracing::debug!("Inserted path {}", path.id);
        Ok(path)
    }

    /// Update a path's name, leaving its locations untouched
    ///
    /// Returns the updated document, or None when the id matches nothing.
    pub async fn rename_path(&self, id: ObjectId, name: &str) -> Result<Option<PathDoc>> {
        let update = doc! {
            "$set": { "name": name, "updatedAt": BsonDateTime::now() }
        };

        self.paths
            .find_one_and_update(doc! { "_id": id }, update)
            .return_document(ReturnDocument::After)
            .await
            .context("Failed to update path name")
    }

    /// Delete a path and, implicitly, all its locations
    ///
    /// Returns the deleted document, or None when the id matches nothing.
    pub async fn delete_path(&self, id: ObjectId) -> Result<Option<PathDoc>> {
        let deleted = self
            .paths
            .find_one_and_delete(doc! { "_id": id })
            .await
            .context("Failed to delete path")?;

        if deleted.is_some() {
            self.locks.forget(&id);
            tracing::debug!("Deleted path {}", id);
        }
        Ok(deleted)
    }

    /// Delete every path unconditionally, returning the count removed
    pub async fn delete_all_paths(&self) -> Result<u64> {
        let result = self
            .paths
            .delete_many(doc! {})
            .await
            .context("Failed to delete paths")?;

        self.locks.clear();
        tracing::info!("Bulk-deleted {} paths", result.deleted_count);
        Ok(result.deleted_count)
    }

    /// Append a waypoint to a path's sequence
    ///
    /// Serialized per path id: the append's order assignment depends on the
    /// current location count, so concurrent appends must not interleave.
    ///
    /// # Returns
    /// * `Ok(Some(path))` - updated path
    /// * `Ok(None)` - no path with that id
    pub async fn add_location(
        &self,
        path_id: ObjectId,
        lat: f64,
        lng: f64,
    ) -> Result<Option<PathDoc>> {
        let lock = self.locks.for_path(path_id);
        let _guard = lock.lock().await;

        let Some(mut path) = self.get_path(path_id).await? else {
            return Ok(None);
        };

        path.append_location(lat, lng);
        path.touch();
        self.persist(&path).await?;
        Ok(Some(path))
    }

    /// Update one waypoint's coordinates in place
    ///
    /// Only `lat` and `lng` change; the location's `order` is never altered
    /// by this operation.
    pub async fn update_location(
        &self,
        path_id: ObjectId,
        location_id: ObjectId,
        lat: f64,
        lng: f64,
    ) -> Result<LocationMutation> {
        let lock = self.locks.for_path(path_id);
        let _guard = lock.lock().await;

        let Some(mut path) = self.get_path(path_id).await? else {
            return Ok(LocationMutation::PathMissing);
        };
        let Some(location) = path.location_mut(location_id) else {
            return Ok(LocationMutation::LocationMissing);
        };

        location.lat = lat;
        location.lng = lng;
        path.touch();
        self.persist(&path).await?;
        Ok(LocationMutation::Applied(path))
    }

    /// Remove one waypoint and renumber the survivors from zero
    pub async fn delete_location(
        &self,
        path_id: ObjectId,
        location_id: ObjectId,
    ) -> Result<LocationMutation> {
        let lock = self.locks.for_path(path_id);
        let _guard = lock.lock().await;

        let Some(mut path) = self.get_path(path_id).await? else {
            return Ok(LocationMutation::PathMissing);
        };
        if !path.remove_location(location_id) {
            return Ok(LocationMutation::LocationMissing);
        }

        path.touch();
        self.persist(&path).await?;
        Ok(LocationMutation::Applied(path))
    }

    /// Account lookup by email
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        self.users
            .find_one(doc! { "email": email })
            .await
            .context("Failed to query user by email")
    }

    /// Account lookup by id
    pub async fn find_user_by_id(&self, id: ObjectId) -> Result<Option<UserDoc>> {
        self.users
            .find_one(doc! { "_id": id })
            .await
            .context("Failed to query user by id")
    }

    /// Persist a new account record
    pub async fn insert_user(&self, user: &UserDoc) -> Result<()> {
        self.users
            .insert_one(user)
            .await
            .context("Failed to insert user")?;
        Ok(())
    }

    async fn persist(&self, path: &PathDoc) -> Result<()> {
        self.paths
            .replace_one(doc! { "_id": path.id }, path)
            .await
            .context("Failed to persist path")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders(path: &PathDoc) -> Vec<u32> {
        path.locations.iter().map(|location| location.order).collect()
    }

    #[test]
    fn test_new_numbers_locations_by_position() {
        let locations = vec![
            LocationDoc { id: ObjectId::new(), lat: 1.0, lng: 1.0, order: 0 },
            LocationDoc { id: ObjectId::new(), lat: 2.0, lng: 2.0, order: 1 },
        ];
        let path = PathDoc::new("route", locations);

        assert_eq!(orders(&path), vec![0, 1]);
        assert_eq!(path.locations[0].lat, 1.0);
        assert_eq!(path.locations[1].lat, 2.0);
    }

    #[test]
    fn test_new_sorts_by_supplied_rank_then_renumbers() {
        // Caller-supplied ranks decide the sequence; gaps are closed.
        let locations = vec![
            LocationDoc { id: ObjectId::new(), lat: 1.0, lng: 1.0, order: 5 },
            LocationDoc { id: ObjectId::new(), lat: 2.0, lng: 2.0, order: 2 },
        ];
        let path = PathDoc::new("route", locations);

        assert_eq!(orders(&path), vec![0, 1]);
        assert_eq!(path.locations[0].lat, 2.0);
        assert_eq!(path.locations[1].lat, 1.0);
    }

    #[test]
    fn test_new_with_equal_ranks_is_stable() {
        let locations = vec![
            LocationDoc { id: ObjectId::new(), lat: 1.0, lng: 1.0, order: 0 },
            LocationDoc { id: ObjectId::new(), lat: 2.0, lng: 2.0, order: 0 },
        ];
        let path = PathDoc::new("route", locations);

        assert_eq!(path.locations[0].lat, 1.0);
        assert_eq!(path.locations[1].lat, 2.0);
        assert_eq!(orders(&path), vec![0, 1]);
    }

    #[test]
    fn test_append_assigns_next_order() {
        let mut path = PathDoc::new("route", Vec::new());
        path.append_location(1.0, 1.0);
        path.append_location(2.0, 2.0);
        path.append_location(3.0, 3.0);

        assert_eq!(orders(&path), vec![0, 1, 2]);
    }

    #[test]
    fn test_remove_middle_renumbers_and_preserves_relative_order() {
        let mut path = PathDoc::new("route", Vec::new());
        path.append_location(1.0, 1.0);
        let middle = path.append_location(2.0, 2.0);
        path.append_location(3.0, 3.0);

        assert!(path.remove_location(middle));

        assert_eq!(orders(&path), vec![0, 1]);
        assert_eq!(path.locations[0].lat, 1.0);
        assert_eq!(path.locations[1].lat, 3.0);
    }

    #[test]
    fn test_remove_missing_location_changes_nothing() {
        let mut path = PathDoc::new("route", Vec::new());
        path.append_location(1.0, 1.0);
        path.append_location(2.0, 2.0);

        assert!(!path.remove_location(ObjectId::new()));
        assert_eq!(orders(&path), vec![0, 1]);
    }

    #[test]
    fn test_coordinate_update_leaves_order_and_count_alone() {
        let mut path = PathDoc::new("route", Vec::new());
        path.append_location(1.0, 1.0);
        let target = path.append_location(2.0, 2.0);
        path.append_location(3.0, 3.0);

        let location = path.location_mut(target).unwrap();
        location.lat = 9.0;
        location.lng = -9.0;

        assert_eq!(path.locations.len(), 3);
        assert_eq!(orders(&path), vec![0, 1, 2]);
        assert_eq!(path.locations[1].lat, 9.0);
        assert_eq!(path.locations[1].lng, -9.0);
    }

    #[test]
    fn test_orders_stay_contiguous_across_mixed_mutations() {
        let mut path = PathDoc::new("route", Vec::new());
        let mut ids = Vec::new();
        for i in 0..6 {
            ids.push(path.append_location(i as f64, i as f64));
        }

        assert!(path.remove_location(ids[0]));
        assert!(path.remove_location(ids[3]));
        path.append_location(100.0, 100.0);
        assert!(path.remove_location(ids[5]));

        let expected: Vec<u32> = (0..path.locations.len() as u32).collect();
        assert_eq!(orders(&path), expected);
    }

    #[tokio::test]
    async fn test_connect_is_lazy() {
        // No server behind this address; the handle must still build.
        let store = MongoStore::connect("mongodb://127.0.0.1:1", "lazy-test").await;
        assert!(store.is_ok());
    }

    #[tokio::test]
    async fn test_health_check_fails_when_unreachable() {
        let store = MongoStore::connect(
            "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=100&connectTimeoutMS=100",
            "unreachable-test",
        )
        .await
        .unwrap();

        assert!(store.health_check().await.is_err());
    }
}
