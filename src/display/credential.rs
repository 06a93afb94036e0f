//! Credential display formatting
//!
//! Formats credentials for terminal output. Secrets are masked unless the
//! caller asks for them; a secret that cannot be decrypted renders as the
//! decryption sentinel instead of failing the listing.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::crypto::{decrypt_or_sentinel, EncryptionContext, SessionStore};
use crate::models::Credential;
use crate::services::ServiceSummary;

const MASK: &str = "••••••••";

/// Format a list of credentials as a table
pub fn format_credential_list<S: SessionStore>(
    credentials: &[Credential],
    crypto: &EncryptionContext<S>,
    reveal: bool,
) -> String {
    if credentials.is_empty() {
        return "No API keys found.".to_string();
    }

    let secret = |envelope: &str| {
        if envelope.is_empty() {
            String::new()
        } else if reveal {
            decrypt_or_sentinel(crypto, envelope)
        } else {
            MASK.to_string()
        }
    };

    let rows: Vec<[String; 5]> = credentials
        .iter()
        .map(|c| {
            [
                c.id.to_string(),
                c.service_name.clone(),
                c.email_username.clone(),
                secret(&c.encrypted_api_key),
                c.tags.join(", "),
            ]
        })
        .collect();

    let headers = ["ID", "Service", "Email/Username", "API Key", "Tags"];
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    output.push_str(&pad_row(&headers.map(String::from), &widths));
    output.push_str(&pad_row(
        &widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>(),
        &widths,
    ));
    for row in &rows {
        output.push_str(&pad_row(row, &widths));
    }
    output.push_str(&format!("\nTotal: {} keys\n", credentials.len()));

    output
}

/// Format a single credential with its secrets decrypted
pub fn format_credential_details<S: SessionStore>(
    credential: &Credential,
    crypto: &EncryptionContext<S>,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Service:  {}\n", credential.service_name));
    output.push_str(&format!("  ID:       {}\n", credential.id));
    if !credential.email_username.is_empty() {
        output.push_str(&format!("  Login:    {}\n", credential.email_username));
    }
    output.push_str(&format!(
        "  API Key:  {}\n",
        decrypt_or_sentinel(crypto, &credential.encrypted_api_key)
    ));
    if credential.has_password() {
        output.push_str(&format!(
            "  Password: {}\n",
            decrypt_or_sentinel(crypto, &credential.encrypted_password)
        ));
    }
    if !credential.tags.is_empty() {
        output.push_str(&format!("  Tags:     {}\n", credential.tags.join(", ")));
    }
    if !credential.notes.is_empty() {
        output.push_str(&format!("  Notes:    {}\n", credential.notes));
    }
    output.push_str(&format!(
        "  Created:  {}\n",
        credential.created_at.format("%Y-%m-%d %H:%M")
    ));
    output.push_str(&format!(
        "  Updated:  {}\n",
        credential.updated_at.format("%Y-%m-%d %H:%M")
    ));

    output
}

#[derive(Tabled)]
struct OverviewRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Keys")]
    keys: usize,
    #[tabled(rename = "Last Updated")]
    last_updated: String,
}

/// Format the per-service overview
pub fn format_service_overview(summaries: &[ServiceSummary]) -> String {
    if summaries.is_empty() {
        return "No services yet. Add one with 'vault credential add'.".to_string();
    }

    let rows = summaries.iter().map(|s| OverviewRow {
        service: s.service_name.clone(),
        keys: s.key_count,
        last_updated: s.last_updated.format("%Y-%m-%d").to_string(),
    });

    Table::new(rows).with(Style::psql()).to_string()
}

fn pad_row<T: AsRef<str>>(cells: &[T], widths: &[usize]) -> String {
    let mut line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let cell = cell.as_ref();
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    let trimmed = line.trim_end().len();
    line.truncate(trimmed);
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{MemorySessionStore, DECRYPTION_SENTINEL};
    use crate::models::UserId;
    use chrono::Utc;

    fn credential(crypto: &EncryptionContext<MemorySessionStore>) -> Credential {
        let mut cred = Credential::new(
            UserId::new("u"),
            "OpenAI",
            crypto.encrypt("sk-visible").unwrap(),
        );
        cred.email_username = "dev@example.com".into();
        cred
    }

    #[test]
    fn test_list_masks_by_default() {
        let crypto = EncryptionContext::new(MemorySessionStore::new());
        let creds = vec![credential(&crypto)];

        let masked = format_credential_list(&creds, &crypto, false);
        assert!(masked.contains("OpenAI"));
        assert!(!masked.contains("sk-visible"));
        assert!(masked.contains("Total: 1 keys"));

        let revealed = format_credential_list(&creds, &crypto, true);
        assert!(revealed.contains("sk-visible"));
    }

    #[test]
    fn test_undecryptable_secret_shows_sentinel() {
        let crypto = EncryptionContext::new(MemorySessionStore::new());
        let cred = credential(&crypto);
        crypto.clear_session_key().unwrap();

        let details = format_credential_details(&cred, &crypto);
        assert!(details.contains(DECRYPTION_SENTINEL));
        assert!(details.contains("dev@example.com"));
    }

    #[test]
    fn test_empty_list() {
        let crypto = EncryptionContext::new(MemorySessionStore::new());
        assert_eq!(format_credential_list(&[], &crypto, false), "No API keys found.");
    }

    #[test]
    fn test_service_overview_table() {
        let summaries = vec![ServiceSummary {
            service_name: "Stripe".into(),
            key_count: 2,
            last_updated: Utc::now(),
        }];
        let table = format_service_overview(&summaries);
        assert!(table.contains("Stripe"));
        assert!(table.contains("Last Updated"));
    }
}
