use serde::{Deserialize, Serialize};

/// Public view of an account.
///
/// `id` is minted once at signup and never changes; it is the partition key
/// for everything the user stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}
