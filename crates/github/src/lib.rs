//! Herald GitHub infrastructure adapter.
//!
//! Implements [`pipeline::SourceRepository`] with [`GithubClient`], a thin
//! `reqwest` client for the two GitHub REST endpoints Herald reads: the commit
//! list of a pull request and the issue list filtered by label.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! Authentication, pagination, rate-limit header parsing and status-code
//! mapping are handled here; the [`pipeline`] crate only ever sees
//! [`pipeline::SourceRepositoryError`].

mod client;

pub use client::{ClientBuildError, GithubClient, GithubClientConfig};
