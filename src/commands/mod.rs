pub mod browse;
pub mod list;
pub mod misc;
pub mod toggle;

pub use browse::{browse, BrowseArgs};
pub use list::list_repos;
pub use misc::generate_completions;
pub use toggle::{add_repo, toggle_repo};
