// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (identity + club back-references)
//! - Clubs (membership sets, geofence configuration)
//! - Events (per-club, archivable)
//! - Check-ins (attendance records, unique per user+event)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{CheckIn, Club, Event, User};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;
// Contended club mutations are retried with fresh state this many times
// before the conflict is surfaced to the caller.
const TXN_ATTEMPTS: usize = 5;

/// What a transactional mutation closure decided to do with the documents.
pub enum TxnAction<T> {
    /// Persist the mutated documents.
    Commit(T),
    /// Discard the transaction without writing; the caller acts on the
    /// result instead (e.g. a leave that turns into a club deletion).
    Rollback(T),
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing
        // a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Club Operations ─────────────────────────────────────────

    pub async fn get_club(&self, club_id: &str) -> Result<Option<Club>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CLUBS)
            .obj()
            .one(club_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look up a club by its current join code.
    pub async fn find_club_by_join_code(&self, code: &str) -> Result<Option<Club>, AppError> {
        let mut clubs: Vec<Club> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CLUBS)
            .filter(|q| q.for_all([q.field("join_code").eq(code)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(clubs.pop())
    }

    /// Fetch several clubs by id, skipping ids that no longer resolve.
    pub async fn get_clubs_by_ids(&self, club_ids: &[String]) -> Result<Vec<Club>, AppError> {
        let results: Vec<Result<Option<Club>, AppError>> = stream::iter(club_ids.to_vec())
            .map(|club_id| async move { self.get_club(&club_id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect()
            .await;

        let mut clubs = Vec::new();
        for result in results {
            if let Some(club) = result? {
                clubs.push(club);
            }
        }
        Ok(clubs)
    }

    /// Read-modify-write a club document through a transaction.
    ///
    /// The club is read with the transaction's consistency selector, which
    /// registers it for conflict detection: a concurrent write to the same
    /// club aborts the commit instead of being silently overwritten. Aborted
    /// attempts are retried with freshly read state.
    pub async fn mutate_club<T, F>(&self, club_id: &str, mutate: F) -> Result<T, AppError>
    where
        F: Fn(&mut Club) -> Result<T, AppError>,
    {
        let client = self.get_client()?;

        let mut last_err = None;
        for attempt in 1..=TXN_ATTEMPTS {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
            let reader = client.clone_with_consistency_selector(
                firestore::FirestoreConsistencySelector::Transaction(
                    transaction.transaction_id().clone(),
                ),
            );

            let found: Option<Club> = reader
                .fluent()
                .select()
                .by_id_in(collections::CLUBS)
                .obj()
                .one(club_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            let mut club = match found {
                Some(club) => club,
                None => {
                    let _ = transaction.rollback().await;
                    return Err(AppError::NotFound(format!("Club {} not found", club_id)));
                }
            };

            let result = match mutate(&mut club) {
                Ok(result) => result,
                Err(e) => {
                    let _ = transaction.rollback().await;
                    return Err(e);
                }
            };

            client
                .fluent()
                .update()
                .in_col(collections::CLUBS)
                .document_id(&club.id)
                .object(&club)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add club to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => return Ok(result),
                Err(e) => {
                    tracing::warn!(club_id, attempt, error = %e, "Club transaction aborted");
                    last_err = Some(e);
                }
            }
        }

        Err(AppError::Database(format!(
            "Club transaction failed after {} attempts: {}",
            TXN_ATTEMPTS,
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Read-modify-write a club and a user document through one transaction.
    ///
    /// Membership mutations touch both sides of the member/back-reference
    /// invariant, so both documents are read inside the transaction (for
    /// conflict detection) and written together. Two interleaved mutations of
    /// the same club cannot overwrite each other: the later commit aborts and
    /// is retried against the committed state.
    pub async fn mutate_club_and_user<T, F>(
        &self,
        club_id: &str,
        user_id: &str,
        mutate: F,
    ) -> Result<T, AppError>
    where
        F: Fn(&mut Club, &mut User) -> Result<TxnAction<T>, AppError>,
    {
        let client = self.get_client()?;

        let mut last_err = None;
        for attempt in 1..=TXN_ATTEMPTS {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
            let reader = client.clone_with_consistency_selector(
                firestore::FirestoreConsistencySelector::Transaction(
                    transaction.transaction_id().clone(),
                ),
            );

            let found: Option<Club> = reader
                .fluent()
                .select()
                .by_id_in(collections::CLUBS)
                .obj()
                .one(club_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            let mut club = match found {
                Some(club) => club,
                None => {
                    let _ = transaction.rollback().await;
                    return Err(AppError::NotFound(format!("Club {} not found", club_id)));
                }
            };

            let found: Option<User> = reader
                .fluent()
                .select()
                .by_id_in(collections::USERS)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            let mut user = match found {
                Some(user) => user,
                None => {
                    let _ = transaction.rollback().await;
                    return Err(AppError::NotFound(format!("User {} not found", user_id)));
                }
            };

            let result = match mutate(&mut club, &mut user) {
                Ok(TxnAction::Commit(result)) => result,
                Ok(TxnAction::Rollback(result)) => {
                    let _ = transaction.rollback().await;
                    return Ok(result);
                }
                Err(e) => {
                    let _ = transaction.rollback().await;
                    return Err(e);
                }
            };

            client
                .fluent()
                .update()
                .in_col(collections::CLUBS)
                .document_id(&club.id)
                .object(&club)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add club to transaction: {}", e))
                })?;

            client
                .fluent()
                .update()
                .in_col(collections::USERS)
                .document_id(&user.id)
                .object(&user)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add user to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => return Ok(result),
                Err(e) => {
                    tracing::warn!(club_id, user_id, attempt, error = %e, "Club/user transaction aborted");
                    last_err = Some(e);
                }
            }
        }

        Err(AppError::Database(format!(
            "Club/user transaction failed after {} attempts: {}",
            TXN_ATTEMPTS,
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Persist a freshly created club together with the owner's back-reference.
    ///
    /// The club document is new so only the owner needs conflict detection:
    /// their user document is read inside the transaction before the
    /// back-reference is appended.
    pub async fn create_club_with_owner(&self, club: &Club) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut last_err = None;
        for attempt in 1..=TXN_ATTEMPTS {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
            let reader = client.clone_with_consistency_selector(
                firestore::FirestoreConsistencySelector::Transaction(
                    transaction.transaction_id().clone(),
                ),
            );

            let found: Option<User> = reader
                .fluent()
                .select()
                .by_id_in(collections::USERS)
                .obj()
                .one(&club.owner_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            let mut owner = match found {
                Some(owner) => owner,
                None => {
                    let _ = transaction.rollback().await;
                    return Err(AppError::NotFound(format!(
                        "User {} not found",
                        club.owner_id
                    )));
                }
            };
            owner.add_club(&club.id);

            client
                .fluent()
                .update()
                .in_col(collections::CLUBS)
                .document_id(&club.id)
                .object(club)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add club to transaction: {}", e))
                })?;

            client
                .fluent()
                .update()
                .in_col(collections::USERS)
                .document_id(&owner.id)
                .object(&owner)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add user to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => return Ok(()),
                Err(e) => {
                    tracing::warn!(club_id = %club.id, attempt, error = %e, "Club creation transaction aborted");
                    last_err = Some(e);
                }
            }
        }

        Err(AppError::Database(format!(
            "Club creation transaction failed after {} attempts: {}",
            TXN_ATTEMPTS,
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Delete a club and everything hanging off it: check-ins, events, and
    /// the club reference on every member.
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_club_cascade(&self, club: &Club) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        // 1. Delete all check-ins recorded for this club's events
        let check_ins: Vec<CheckIn> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CHECK_INS)
            .filter(|q| q.for_all([q.field("club_id").eq(&club.id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = check_ins.len();
        self.batch_delete(&check_ins, collections::CHECK_INS, |c: &CheckIn| c.doc_id())
            .await?;
        deleted_count += count;
        tracing::debug!(club_id = %club.id, count, "Deleted check-ins");

        // 2. Delete all events
        let events = self.events_for_club(&club.id).await?;
        let count = events.len();
        self.batch_delete(&events, collections::EVENTS, |e: &Event| e.id.clone())
            .await?;
        deleted_count += count;
        tracing::debug!(club_id = %club.id, count, "Deleted events");

        // 3. Remove the club back-reference from every member
        let member_ids = club.member_ids.clone();
        stream::iter(member_ids)
            .map(|member_id| {
                let club_id = club.id.clone();
                async move {
                    if let Some(mut user) = self.get_user(&member_id).await? {
                        user.remove_club(&club_id);
                        self.upsert_user(&user).await?;
                    }
                    Ok::<_, AppError>(())
                }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        // 4. Delete the club document
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::CLUBS)
            .document_id(&club.id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        deleted_count += 1;

        tracing::info!(club_id = %club.id, deleted_count, "Club deletion complete");

        Ok(deleted_count)
    }

    // ─── Event Operations ────────────────────────────────────────

    pub async fn get_event(&self, event_id: &str) -> Result<Option<Event>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::EVENTS)
            .obj()
            .one(event_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_event(&self, event: &Event) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::EVENTS)
            .document_id(&event.id)
            .object(event)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn delete_event_doc(&self, event_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::EVENTS)
            .document_id(event_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All events belonging to a club (including archived ones).
    pub async fn events_for_club(&self, club_id: &str) -> Result<Vec<Event>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::EVENTS)
            .filter(|q| q.for_all([q.field("club_id").eq(club_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Events a user has RSVPed to.
    pub async fn events_rsvped_by_user(&self, user_id: &str) -> Result<Vec<Event>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::EVENTS)
            .filter(|q| q.for_all([q.field("rsvp_ids").array_contains(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Check-In Operations ─────────────────────────────────────

    pub async fn get_check_in(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<CheckIn>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHECK_INS)
            .obj()
            .one(&CheckIn::doc_id_for(event_id, user_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a check-in record, relying on the document id to enforce
    /// (user, event) uniqueness.
    ///
    /// Uses a Firestore *create* (not upsert): two concurrent attempts for the
    /// same pair race on the same document id and the loser gets a conflict,
    /// which surfaces as `DuplicateCheckIn`.
    pub async fn create_check_in(&self, check_in: &CheckIn) -> Result<(), AppError> {
        let _: CheckIn = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::CHECK_INS)
            .document_id(check_in.doc_id())
            .object(check_in)
            .execute()
            .await
            .map_err(|e| match e {
                firestore::errors::FirestoreError::DataConflictError(_) => {
                    AppError::DuplicateCheckIn
                }
                other => AppError::Database(other.to_string()),
            })?;
        Ok(())
    }

    /// All check-ins recorded for a club's events.
    pub async fn check_ins_for_club(&self, club_id: &str) -> Result<Vec<CheckIn>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHECK_INS)
            .filter(|q| q.for_all([q.field("club_id").eq(club_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check-in history for one user within a club.
    pub async fn check_ins_for_user_in_club(
        &self,
        club_id: &str,
        user_id: &str,
    ) -> Result<Vec<CheckIn>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHECK_INS)
            .filter(|q| {
                q.for_all([
                    q.field("club_id").eq(club_id),
                    q.field("user_id").eq(user_id),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete every check-in belonging to an event (event-deletion cascade).
    ///
    /// Returns the number of records removed.
    pub async fn delete_check_ins_for_event(&self, event_id: &str) -> Result<usize, AppError> {
        let check_ins: Vec<CheckIn> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CHECK_INS)
            .filter(|q| q.for_all([q.field("event_id").eq(event_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = check_ins.len();
        self.batch_delete(&check_ins, collections::CHECK_INS, |c: &CheckIn| c.doc_id())
            .await?;

        tracing::debug!(event_id, count, "Deleted check-ins for event");
        Ok(count)
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}
