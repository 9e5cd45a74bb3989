use chrono::Utc;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::api::members::{account_number_for, generate_member_number};
use crate::database::DatabaseConnection;
use crate::error::ServiceResult;
use crate::models::{Account, AccountType, Member};

/// Canonical field names and the source spellings seen in exported
/// spreadsheets. Lookup normalizes keys before comparing, so the aliases
/// only need to cover genuinely different names.
const COLUMN_ALIASES: &[(&str, &[&str])] = &[
    (
        "member_number",
        &["member_number", "member_no", "membership_number", "memberid"],
    ),
    ("fullname", &["fullname", "full_name", "name", "member_name"]),
    ("email", &["email", "email_address", "mail"]),
];

/// Lowercase, strip everything but letters and digits. "Member No." and
/// "memberNo" both normalize to "memberno".
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Single lookup point for record fields: resolves a canonical field name
/// against a loosely keyed record via the alias table.
fn lookup_field<'a>(record: &'a Value, canonical: &str) -> Option<&'a str> {
    let object = record.as_object()?;
    let aliases = COLUMN_ALIASES
        .iter()
        .find(|(name, _)| *name == canonical)
        .map(|(_, aliases)| *aliases)?;

    for (key, value) in object {
        let normalized = normalize_key(key);
        if aliases.iter().any(|alias| normalize_key(alias) == normalized) {
            return value.as_str().map(str::trim).filter(|v| !v.is_empty());
        }
    }
    None
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct ImportErrorDto {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct ImportReportDto {
    pub imported: usize,
    pub errors: Vec<ImportErrorDto>,
}

/// Row failures are collected per index, valid rows are inserted with
/// their savings and checking accounts. Imported members have no password
/// until staff set one.
pub async fn import_members(
    db: &mut DatabaseConnection,
    records: Vec<Value>,
) -> ServiceResult<ImportReportDto> {
    let mut report = ImportReportDto {
        imported: 0,
        errors: Vec::new(),
    };

    for (index, record) in records.iter().enumerate() {
        let fullname = match lookup_field(record, "fullname") {
            Some(v) => v.to_string(),
            None => {
                report.errors.push(ImportErrorDto {
                    index,
                    reason: "Could not resolve field 'fullname'".to_string(),
                });
                continue;
            }
        };
        let email = match lookup_field(record, "email") {
            Some(v) => v.to_string(),
            None => {
                report.errors.push(ImportErrorDto {
                    index,
                    reason: "Could not resolve field 'email'".to_string(),
                });
                continue;
            }
        };
        let member_number = lookup_field(record, "member_number")
            .map(str::to_string)
            .unwrap_or_else(generate_member_number);

        if db.get_member_by_email(&email).await?.is_some() {
            report.errors.push(ImportErrorDto {
                index,
                reason: format!("A member with email '{email}' already exists"),
            });
            continue;
        }
        if db
            .get_member_by_member_number(&member_number)
            .await?
            .is_some()
        {
            report.errors.push(ImportErrorDto {
                index,
                reason: format!("Member number '{member_number}' is already in use"),
            });
            continue;
        }

        let member = db
            .store_member(Member {
                id: 0,
                member_number: member_number.clone(),
                fullname,
                email,
                password_hash: Vec::new(),
                active: true,
                created_at: Utc::now(),
            })
            .await?;

        for account_type in [AccountType::Savings, AccountType::Checking] {
            db.store_account(Account {
                id: 0,
                member_id: member.id,
                account_type,
                account_number: account_number_for(&member_number, account_type),
                balance_cents: 0,
                created_at: Utc::now(),
            })
            .await?;
        }

        report.imported += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{lookup_field, normalize_key};
    use serde_json::json;

    #[test]
    fn normalization_collapses_spelling_variants() {
        assert_eq!(normalize_key("Member No."), "memberno");
        assert_eq!(normalize_key("memberNo"), "memberno");
        assert_eq!(normalize_key("MEMBER_NO"), "memberno");
        assert_eq!(normalize_key("full name"), "fullname");
    }

    #[test]
    fn lookup_resolves_aliases() {
        let record = json!({
            "Member No.": "MB-00000001",
            "Full Name": "Ada Lovelace",
            "E-Mail": "ada@example.com",
        });
        assert_eq!(lookup_field(&record, "member_number"), Some("MB-00000001"));
        assert_eq!(lookup_field(&record, "fullname"), Some("Ada Lovelace"));
        assert_eq!(lookup_field(&record, "email"), Some("ada@example.com"));
    }

    #[test]
    fn lookup_ignores_blank_and_unknown_fields() {
        let record = json!({ "fullname": "   ", "favourite_color": "green" });
        assert_eq!(lookup_field(&record, "fullname"), None);
        assert_eq!(lookup_field(&record, "email"), None);
    }

    #[test]
    fn lookup_requires_an_object() {
        assert_eq!(lookup_field(&json!("not a record"), "email"), None);
        assert_eq!(lookup_field(&json!(null), "email"), None);
    }
}
