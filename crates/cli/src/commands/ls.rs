//! ls command - List buckets and objects
//!
//! Lists buckets when no bucket is given, otherwise the keys under an
//! optional prefix. Each key can be followed by its versions and content.

use clap::Args;
use sc_core::content::get_object_content;
use sc_core::listing::{list_buckets, list_objects, list_versions};
use sc_core::{ObjectRef, ObjectStore, VersionRecord};
use serde::Serialize;

use super::{Context, completion};
use crate::exit_code::ExitCode;

/// List buckets or objects
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Bucket to list; buckets are listed when omitted
    #[arg(add = completion::buckets())]
    pub bucket: Option<String>,

    /// Only list keys starting with this prefix
    #[arg(add = completion::keys())]
    pub prefix: Option<String>,

    /// Fetch every page instead of the first one
    #[arg(short = 'A', long)]
    pub all: bool,

    /// Print each object's content after its key
    #[arg(short, long)]
    pub print: bool,

    /// Show the versions of each listed key
    #[arg(short = 'V', long = "show-version")]
    pub show_version: bool,
}

#[derive(Debug, Serialize)]
struct BucketsOutput {
    buckets: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ObjectsOutput {
    bucket: String,
    items: Vec<ObjectEntry>,
}

#[derive(Debug, Serialize)]
struct ObjectEntry {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    versions: Option<Vec<VersionRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, ctx: &Context) -> ExitCode {
    let client = match ctx.connect().await {
        Ok(c) => c,
        Err(code) => return code,
    };

    match args.bucket.as_deref() {
        None => show_buckets(&client, ctx).await,
        Some(bucket) => show_objects(&client, bucket, &args, ctx).await,
    }
}

async fn show_buckets(store: &dyn ObjectStore, ctx: &Context) -> ExitCode {
    let formatter = &ctx.formatter;
    match list_buckets(store).await {
        Ok(buckets) => {
            if formatter.is_json() {
                formatter.json(&BucketsOutput { buckets });
            } else {
                for bucket in &buckets {
                    formatter.println(bucket);
                }
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail("Failed to list buckets", &e),
    }
}

async fn show_objects(
    store: &dyn ObjectStore,
    bucket: &str,
    args: &LsArgs,
    ctx: &Context,
) -> ExitCode {
    let formatter = &ctx.formatter;

    let keys = match list_objects(store, bucket, args.prefix.as_deref(), args.all).await {
        Ok(keys) => keys,
        Err(e) => return ctx.fail(&format!("Failed to list s3://{bucket}"), &e),
    };

    let mut items = Vec::with_capacity(keys.len());
    for key in keys {
        let entry = match describe(store, bucket, key, args).await {
            Ok(entry) => entry,
            Err((key, e)) => return ctx.fail(&format!("Failed to read s3://{bucket}/{key}"), &e),
        };

        // Human output streams as we go; JSON is printed once at the end.
        if formatter.is_json() {
            items.push(entry);
        } else {
            print_entry(ctx, &entry);
        }
    }

    if formatter.is_json() {
        formatter.json(&ObjectsOutput {
            bucket: bucket.to_string(),
            items,
        });
    }

    ExitCode::Success
}

async fn describe(
    store: &dyn ObjectStore,
    bucket: &str,
    key: String,
    args: &LsArgs,
) -> Result<ObjectEntry, (String, sc_core::Error)> {
    let versions = if args.show_version {
        match list_versions(store, bucket, &key).await {
            // The listing is by prefix; keep only this exact key.
            Ok(records) => Some(records.into_iter().filter(|r| r.key == key).collect()),
            Err(e) => return Err((key, e)),
        }
    } else {
        None
    };

    let content = if args.print {
        match get_object_content(store, &ObjectRef::new(bucket, key.as_str())).await {
            Ok(text) => Some(text),
            Err(e) => return Err((key, e)),
        }
    } else {
        None
    };

    Ok(ObjectEntry {
        key,
        versions,
        content,
    })
}

fn print_entry(ctx: &Context, entry: &ObjectEntry) {
    let formatter = &ctx.formatter;
    formatter.println(&entry.key);

    if let Some(versions) = &entry.versions {
        for record in versions {
            if formatter.is_verbose() {
                formatter.println(&format!("  {}", version_line(record)));
            } else {
                formatter.println(&format!("  {}", record.version_id));
            }
        }
    }

    if let Some(content) = &entry.content {
        formatter.println(&formatter.dim("---"));
        formatter.println(content.trim_end_matches('\n'));
        formatter.println(&formatter.dim("---"));
    }
}

fn version_line(record: &VersionRecord) -> String {
    let modified = record
        .last_modified
        .map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    let size = record
        .size_bytes
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut flags = Vec::new();
    if record.is_latest {
        flags.push("latest");
    }
    if record.is_delete_marker {
        flags.push("delete-marker");
    }
    format!(
        "{} {modified} {size} {}",
        record.version_id,
        flags.join(",")
    )
    .trim_end()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, latest: bool, marker: bool) -> VersionRecord {
        VersionRecord {
            key: "a.txt".into(),
            version_id: id.into(),
            is_latest: latest,
            is_delete_marker: marker,
            size_bytes: if marker { None } else { Some(42) },
            last_modified: Some(jiff::Timestamp::from_second(0).unwrap()),
            etag: None,
        }
    }

    #[test]
    fn test_version_line_latest() {
        assert_eq!(
            version_line(&record("v2", true, false)),
            "v2 1970-01-01 00:00:00 42 latest"
        );
    }

    #[test]
    fn test_version_line_delete_marker() {
        assert_eq!(
            version_line(&record("v3", false, true)),
            "v3 1970-01-01 00:00:00 - delete-marker"
        );
    }

    #[test]
    fn test_version_line_plain() {
        assert_eq!(
            version_line(&record("v1", false, false)),
            "v1 1970-01-01 00:00:00 42"
        );
    }

    #[test]
    fn test_entry_json_skips_unrequested_fields() {
        let entry = ObjectEntry {
            key: "a.txt".into(),
            versions: None,
            content: Some("hi".into()),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value, serde_json::json!({ "key": "a.txt", "content": "hi" }));
    }
}
