//! creds command - Show resolved credentials
//!
//! Resolves credentials through the same provider chain every other command
//! uses. The secret key is masked unless --verbose is given.

use sc_s3::CredentialsInfo;
use serde::Serialize;

use super::Context;
use crate::exit_code::ExitCode;

#[derive(Debug, Serialize)]
struct CredsOutput {
    region: String,
    access_key_id: String,
    secret_access_key: String,
    has_session_token: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiry: Option<jiff::Timestamp>,
}

impl CredsOutput {
    fn new(region: &str, creds: CredentialsInfo, reveal: bool) -> Self {
        Self {
            region: region.to_string(),
            access_key_id: creds.access_key_id,
            secret_access_key: if reveal {
                creds.secret_access_key
            } else {
                mask(&creds.secret_access_key)
            },
            has_session_token: creds.session_token.is_some(),
            expiry: creds.expiry,
        }
    }
}

/// Keep the first four characters of a secret
fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}

/// Execute the creds command
pub async fn execute(ctx: &Context) -> ExitCode {
    let formatter = &ctx.formatter;

    let client = match ctx.connect().await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let creds = match client.credentials().await {
        Ok(c) => c,
        Err(e) => return ctx.fail("Failed to resolve credentials", &e),
    };

    let output = CredsOutput::new(client.region(), creds, formatter.is_verbose());
    if formatter.is_json() {
        formatter.json(&output);
    } else {
        formatter.println(&format!("Region:            {}", output.region));
        formatter.println(&format!("Access key ID:     {}", output.access_key_id));
        formatter.println(&format!("Secret access key: {}", output.secret_access_key));
        formatter.println(&format!(
            "Session token:     {}",
            if output.has_session_token { "present" } else { "none" }
        ));
        if let Some(expiry) = output.expiry {
            formatter.println(&format!("Expires:           {expiry}"));
        }
    }

    ExitCode::Success
}
