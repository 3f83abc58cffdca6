//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{FirestoreDb, TxnAction};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CLUBS: &str = "clubs";
    pub const EVENTS: &str = "events";
    /// Attendance records (keyed by `{event_id}_{user_id}`)
    pub const CHECK_INS: &str = "check_ins";
}
