pub mod client;

pub use client::GithubContentClient;
