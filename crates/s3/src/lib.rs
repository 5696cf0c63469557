//! sc-s3: S3 SDK adapter for s3commander
//!
//! This crate provides the implementation of the ObjectStore trait
//! using the aws-sdk-s3 crate. It is the only crate that directly
//! depends on the AWS SDK.

pub mod client;
pub mod select;

pub use client::{CredentialsInfo, S3Client};
pub use select::SelectEventStream;
