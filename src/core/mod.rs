// Core types and primitives shared by the engines and services

pub mod clock;
pub mod list_codec;
pub mod strong_types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use list_codec::{decode_list, encode_list};
pub use strong_types::{CommentId, PostId, ProjectId, UserId, DELETED_USER};
