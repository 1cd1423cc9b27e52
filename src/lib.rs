// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app;
pub mod app_dirs;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod finish;
pub mod race;
pub mod results;
pub mod runtime;
pub mod ui;
pub mod util;
pub mod workout;
