//! Planweave creator-service client adapter.
//!
//! Implements the [`resolution::CreatorClient`] trait over the creator API: a
//! JSON request/response protocol carried on HTTP. Each creator service
//! exposes two endpoints:
//!
//! - `POST <base>/resolve` — one fan-out call; body is the full current
//!   dependency set, response is the creator's classification for this
//!   iteration.
//! - `GET <base>/supported-types` — the creator's advertisement, polled
//!   independently of resolution to build the registry's support table.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL handling, serialisation, and failure mapping all
//! live here. The engine sees only [`resolution::CreatorClient`] and
//! [`resolution::CreatorError`].

mod http;

pub use http::HttpCreatorClient;
