//! Resolve dataset and chart library locations to bytes.
//!
//! A location is either a local path or an `s3://bucket/key` URI. S3 objects
//! are downloaded whole; nothing is streamed.

use std::fmt;
use std::path::PathBuf;

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;

use crate::error::{ReportError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    S3 { bucket: String, key: String },
}

impl Location {
    pub fn parse(raw: &str) -> Self {
        match parse_s3_uri(raw) {
            Some((bucket, key)) => Location::S3 { bucket, key },
            None => Location::Local(PathBuf::from(raw)),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Local(path) => write!(f, "{}", path.display()),
            Location::S3 { bucket, key } => write!(f, "s3://{bucket}/{key}"),
        }
    }
}

/// Parse an S3 URI like s3://bucket/key into (bucket, key)
fn parse_s3_uri(uri: &str) -> Option<(String, String)> {
    let stripped = uri.strip_prefix("s3://")?;
    let (bucket, key) = stripped.split_once('/')?;
    if bucket.is_empty() || key.is_empty() {
        return None;
    }
    Some((bucket.to_string(), key.to_string()))
}

/// Read the full contents behind `location`.
pub async fn fetch(location: &Location) -> Result<Vec<u8>> {
    match location {
        Location::Local(path) => {
            std::fs::read(path).map_err(|e| ReportError::missing_resource(location.to_string(), e))
        }
        Location::S3 { bucket, key } => {
            let aws_conf = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .load()
                .await;
            let client = S3Client::new(&aws_conf);
            download_from_s3(&client, bucket, key).await
        }
    }
}

/// Read `location` as UTF-8 text. An empty payload counts as missing.
pub async fn fetch_text(location: &Location) -> Result<String> {
    let bytes = fetch(location).await?;
    let text = String::from_utf8(bytes)
        .map_err(|e| ReportError::missing_resource(location.to_string(), e))?;
    if text.trim().is_empty() {
        return Err(ReportError::missing_resource(
            location.to_string(),
            "payload is empty",
        ));
    }
    Ok(text)
}

/// Download an object from S3 and return its contents as bytes
async fn download_from_s3(client: &S3Client, bucket: &str, key: &str) -> Result<Vec<u8>> {
    let location = format!("s3://{bucket}/{key}");

    let resp = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| ReportError::missing_resource(&location, DisplayErrorContext(e)))?;

    let bytes = resp
        .body
        .collect()
        .await
        .map_err(|e| ReportError::missing_resource(&location, e))?
        .into_bytes()
        .to_vec();

    Ok(bytes)
}
