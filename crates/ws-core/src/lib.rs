//! Core domain types for ws: workspaces, their metadata and sessions, and the
//! adapters that drive external tools on their behalf.

pub mod adapters;
pub mod archive;
pub mod config;
pub mod exec;
pub mod lifecycle;
pub mod listing;
pub mod name;
pub mod preset;
pub mod session;
pub mod setup;
pub mod step;
pub mod workspace;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::version;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
