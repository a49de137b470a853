pub mod website;

pub use website::{display_name_from_url, NewWebsite, Website};
