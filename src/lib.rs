//! # Portfolio
//!
//! Personal portfolio site. Static landing page plus a page-view counter.
//!
//!
//!
//! # General Infrastructure
//! - Pages are static, rendering lives outside this workspace
//! - Every content page (blog post, project) reports one view on display through [`reporter`]
//! - Reports go to `POST /api/incr` on the `backend` binary (crate `server`)
//! - Counter state lives in Redis only, the server holds nothing between requests
//! - Reverse proxy in front sets `X-Forwarded-For`, run the backend with `TRUST_PROXY=true` there
//!
//!
//!
//! # Notes
//!
//! ## Why Redis
//! Counting needs exactly two things: create-if-absent with an expiry for deduplication and an
//! atomic increment for the count. Redis has both as single commands (`SET NX EX`, `INCR`), so
//! concurrent requests never race and the backend can be scaled out freely.
//!
//! ## Counts are write-only
//! Nothing here reads counts back. Use `redis-cli GET pageviews:{unit}:{slug}` when curious.
//!
//! ## Best effort
//! The reporter never looks at the response. A failed count is a lost view, not a broken page.
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! `````
//!
//! Run the backend against a local Redis.
//! ```sh
//! REDIS_URL=redis://localhost:6379 RUST_LOG=debug cargo run -p backend
//! ```
//!
//! Send a view by hand.
//! ```sh
//! cargo run -p tester -- blogs my-post
//! ```

pub mod reporter;
