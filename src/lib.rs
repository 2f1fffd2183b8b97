pub mod config;
pub mod exporter;
pub mod frontmatter;
pub mod ghost;
pub mod importer;
pub mod logging;
pub mod new_post;
pub mod reformat;
pub mod slug;
pub mod utils;
