//! Build trigger service — registry, orchestration and HTTP surface.
//!
//! ## Overview
//!
//! Each configured project has two shell scripts: a build phase and a
//! post-build phase. An authorized `GET /projects/{name}/build` schedules an
//! attempt; the outcome of the latest attempt is kept in memory and served as
//! an HTML status page and a PNG badge.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────────┐
//! │  Client  │ ───────> │  server.rs  (axum Router, TraceLayer, shutdown)  │
//! │ (browser,│ <─────── │    └─ api.rs  (handlers, AppState, ApiError)     │
//! │  README) │          │         │                                        │
//! └──────────┘          │         │ BuildOrchestrator::trigger(name)       │
//!                       │         v                                        │
//!                       │  orchestrator.rs  (build slot, two phases)       │
//!                       │         │                                        │
//!                       │         │ ScriptRunner::run(dir, script)         │
//!                       │         v                                        │
//!                       │  runner.rs  (ShellRunner: `<shell> -c`)          │
//!                       └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module      | Responsibility                                            |
//! |-------------|-----------------------------------------------------------|
//! | `models`    | `ProjectSpec`, `BuildRecord`, `BuildState`, outcomes      |
//! | `registry`  | `ProjectRegistry` + per-project record lock and slot      |
//! | `status`    | Pending/passing/failing projection for page and badge     |
//! | `render`    | HTML index and status pages                               |
//!
//! ## Typical Request Flow (trigger a build)
//!
//! 1. `GET /projects/site/build?secret=…` → `api::trigger_build()`
//! 2. Secret checked against `SharedSecret`; mismatch → 401, nothing else.
//! 3. `BuildOrchestrator::trigger("site")` claims the project's build slot.
//!    If an attempt is already running, one follow-up is queued instead.
//! 4. A spawned task marks the project pending, runs `before` in
//!    `<workspace>/site`, records the result, then runs `after` if the build
//!    phase succeeded. A post-build failure replaces the visible result.
//! 5. `GET /projects/site` and `/projects/site/badge` read a snapshot via
//!    `status::project_status()` / `status::badge_state()`.

pub mod api;
pub mod models;
pub mod orchestrator;
pub mod registry;
pub mod render;
pub mod runner;
pub mod server;
pub mod status;
