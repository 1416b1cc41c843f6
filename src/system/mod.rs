//! System module: PlatformIO installation layout and project discovery

pub mod paths;

pub use paths::{find_project_root, PlatformioPaths, PlatformioResolver};
