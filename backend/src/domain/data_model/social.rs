//! Friend graph: symmetric friendships and directed friend requests.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{DataModelError, TableRow, uuid_value};
use crate::domain::constraints::Row;

text_enum! {
    /// State of an established friendship.
    pub enum FriendshipStatus ("status") {
        Active => "active",
        Blocked => "blocked",
    }
}

text_enum! {
    /// Lifecycle of a friend request.
    pub enum FriendRequestStatus ("status") {
        Pending => "pending",
        Accepted => "accepted",
        Rejected => "rejected",
    }
}

/// Two distinct users in canonical order.
///
/// The lower id is always `user1`, so `(A, B)` and `(B, A)` produce the same
/// pair and the stored `unique(user1_id, user2_id)` key covers both orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FriendPair {
    user1_id: Uuid,
    user2_id: Uuid,
}

impl FriendPair {
    /// # Errors
    ///
    /// Returns [`DataModelError::SelfRelation`] when both ids are equal.
    pub fn new(a: Uuid, b: Uuid) -> Result<Self, DataModelError> {
        if a == b {
            return Err(DataModelError::SelfRelation);
        }
        let (user1_id, user2_id) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { user1_id, user2_id })
    }

    pub fn user1_id(&self) -> Uuid {
        self.user1_id
    }

    pub fn user2_id(&self) -> Uuid {
        self.user2_id
    }

    pub fn contains(&self, user: Uuid) -> bool {
        self.user1_id == user || self.user2_id == user
    }
}

/// An established friendship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Friendship {
    pub id: Uuid,
    pair: FriendPair,
    pub status: FriendshipStatus,
}

impl Friendship {
    pub fn new(id: Uuid, pair: FriendPair) -> Self {
        Self {
            id,
            pair,
            status: FriendshipStatus::Active,
        }
    }

    pub fn pair(&self) -> FriendPair {
        self.pair
    }
}

impl TableRow for Friendship {
    const TABLE: &'static str = "friendships";

    fn to_row(&self) -> Row {
        Row::from([
            ("id".to_owned(), uuid_value(self.id)),
            ("user1_id".to_owned(), uuid_value(self.pair.user1_id)),
            ("user2_id".to_owned(), uuid_value(self.pair.user2_id)),
            ("status".to_owned(), Value::from(self.status.as_str())),
        ])
    }
}

/// A directed request; `(A, B)` and `(B, A)` are distinct requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendRequest {
    pub id: Uuid,
    from_user_id: Uuid,
    to_user_id: Uuid,
    message: Option<String>,
    status: FriendRequestStatus,
    responded_at: Option<DateTime<Utc>>,
}

impl FriendRequest {
    /// # Errors
    ///
    /// Returns [`DataModelError::SelfRelation`] when sender and recipient
    /// are the same user.
    pub fn new(
        id: Uuid,
        from_user_id: Uuid,
        to_user_id: Uuid,
        message: Option<String>,
    ) -> Result<Self, DataModelError> {
        if from_user_id == to_user_id {
            return Err(DataModelError::SelfRelation);
        }
        Ok(Self {
            id,
            from_user_id,
            to_user_id,
            message,
            status: FriendRequestStatus::Pending,
            responded_at: None,
        })
    }

    /// Accept the request, yielding the friendship it establishes.
    ///
    /// # Errors
    ///
    /// Returns [`DataModelError::Invalid`] unless the request is pending.
    pub fn accept(
        &mut self,
        friendship_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Friendship, DataModelError> {
        self.respond(FriendRequestStatus::Accepted, at)?;
        let pair = FriendPair::new(self.from_user_id, self.to_user_id)?;
        Ok(Friendship::new(friendship_id, pair))
    }

    /// # Errors
    ///
    /// Returns [`DataModelError::Invalid`] unless the request is pending.
    pub fn reject(&mut self, at: DateTime<Utc>) -> Result<(), DataModelError> {
        self.respond(FriendRequestStatus::Rejected, at)
    }

    fn respond(
        &mut self,
        status: FriendRequestStatus,
        at: DateTime<Utc>,
    ) -> Result<(), DataModelError> {
        if self.status != FriendRequestStatus::Pending {
            return Err(DataModelError::Invalid {
                field: "status",
                reason: "request already answered",
            });
        }
        self.status = status;
        self.responded_at = Some(at);
        Ok(())
    }

    pub fn from_user_id(&self) -> Uuid {
        self.from_user_id
    }

    pub fn to_user_id(&self) -> Uuid {
        self.to_user_id
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn status(&self) -> FriendRequestStatus {
        self.status
    }

    pub fn responded_at(&self) -> Option<DateTime<Utc>> {
        self.responded_at
    }
}

impl TableRow for FriendRequest {
    const TABLE: &'static str = "friend_requests";

    fn to_row(&self) -> Row {
        Row::from([
            ("id".to_owned(), uuid_value(self.id)),
            ("from_user_id".to_owned(), uuid_value(self.from_user_id)),
            ("to_user_id".to_owned(), uuid_value(self.to_user_id)),
            ("message".to_owned(), Value::from(self.message.clone())),
            ("status".to_owned(), Value::from(self.status.as_str())),
        ])
    }
}
