//! list-versions command - Show object versions
//!
//! Lists versions and delete markers of every key starting with KEY.

use clap::Args;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use sc_core::VersionRecord;
use sc_core::listing::list_versions;

use super::{Context, completion};
use crate::exit_code::ExitCode;

/// List object versions
#[derive(Args, Debug)]
pub struct ListVersionsArgs {
    /// Bucket name
    #[arg(add = completion::buckets())]
    pub bucket: String,

    /// Object key (matched as a prefix)
    #[arg(add = completion::keys())]
    pub key: String,
}

/// Execute the list-versions command
pub async fn execute(args: ListVersionsArgs, ctx: &Context) -> ExitCode {
    let formatter = &ctx.formatter;

    let client = match ctx.connect().await {
        Ok(c) => c,
        Err(code) => return code,
    };

    match list_versions(&client, &args.bucket, &args.key).await {
        Ok(records) => {
            if formatter.is_json() {
                formatter.json(&records);
            } else if records.is_empty() {
                formatter.warning(&format!(
                    "No versions found for s3://{}/{}",
                    args.bucket, args.key
                ));
            } else {
                formatter.println(&render_table(&records, formatter.colors_enabled()));
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(
            &format!("Failed to list versions of s3://{}/{}", args.bucket, args.key),
            &e,
        ),
    }
}

fn render_table(records: &[VersionRecord], colors: bool) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Key",
            "Version ID",
            "Latest",
            "Delete marker",
            "Size",
            "Last modified",
        ]);
    if !colors {
        table.force_no_tty();
    }

    for record in records {
        table.add_row(vec![
            record.key.clone(),
            record.version_id.clone(),
            yes_no(record.is_latest).to_string(),
            yes_no(record.is_delete_marker).to_string(),
            record
                .size_bytes
                .map(|s| humansize::format_size(s.max(0) as u64, humansize::BINARY))
                .unwrap_or_default(),
            record
                .last_modified
                .map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        ]);
    }

    table.to_string()
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_contains_every_record() {
        let records = vec![
            VersionRecord {
                key: "a.txt".into(),
                version_id: "v2".into(),
                is_latest: true,
                is_delete_marker: true,
                size_bytes: None,
                last_modified: None,
                etag: None,
            },
            VersionRecord {
                key: "a.txt".into(),
                version_id: "v1".into(),
                is_latest: false,
                is_delete_marker: false,
                size_bytes: Some(1024),
                last_modified: Some(jiff::Timestamp::from_second(86_400).unwrap()),
                etag: Some("abc".into()),
            },
        ];

        let table = render_table(&records, false);
        assert!(table.contains("Version ID"));
        assert!(table.contains("v2"));
        assert!(table.contains("v1"));
        assert!(table.contains("1 KiB"));
        assert!(table.contains("1970-01-02 00:00:00"));
    }
}
