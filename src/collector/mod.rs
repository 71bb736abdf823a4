//! Activity collection from the GitHub API.
//!
//! - `window`: cutoff calculation and active-repository filtering
//! - `commits`: deduplicated commit authorship across branches
//! - `pulls`: pull request counts via search with a paginated fallback
//! - `retry`: rate-limit backoff policy and delay seam

pub mod commits;
pub mod pulls;
pub mod retry;
pub mod window;

pub use commits::collect_commits;
pub use pulls::PullRequestCollector;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use window::{cutoff_date, filter_active_repositories, DEFAULT_LOOKBACK_DAYS};
