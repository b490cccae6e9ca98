pub mod id;
pub mod interaction;
pub mod session;

pub use id::{generate_id, ParticipantId, RoomName, SessionId, StoreId, TrackId};
pub use interaction::{CommentEntry, InteractionEvent, InteractionTally, COMMENT_LOG_CAPACITY};
pub use session::{LiveSession, StoreProfile, RELAY_MANAGED_STREAM};
