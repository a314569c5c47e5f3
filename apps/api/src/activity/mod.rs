// User activity log: what a user did on the platform, with typed metadata per action.
// Feeds the resume flow's getUserHistory tool.

pub mod handlers;
pub mod models;
pub mod store;

pub use models::{is_valid_user_id, ActivityAction, ActivityEntry, NewActivity};
pub use store::{ActivityStore, InMemoryActivityStore};
