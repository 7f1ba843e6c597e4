//! HTTP client for GitHub API

pub mod client;

pub use client::GitHubClient;
