mod controller;
mod runtime;
mod types;

#[cfg(test)]
mod tests;

pub use controller::PhotoDbApp;
#[cfg(feature = "offline_cache")]
pub use runtime::serve_offline_cache;
pub use runtime::shutdown_token;
pub use types::AppStats;
