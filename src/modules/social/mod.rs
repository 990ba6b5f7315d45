pub mod graph;
pub mod profile;
pub mod user_interface;

pub use graph::FollowGraph;
pub use profile::{icon_path, sanitize_icon_name, validate_icon, AccountSummary, ProfileUpdate, ProfileView};
