//! Accounts file loading (`display_name:token[:account_id]` per line).

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;

use crate::core::types::AccountSession;

/// Offset between a 64-bit SteamID and the 32-bit account id it wraps.
const STEAMID64_BASE: u64 = 76_561_197_960_265_728;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{32}$").expect("static token regex"))
}

/// Read and parse the accounts file. Any malformed line fails the whole load.
pub fn load_accounts(path: &Path) -> Result<Vec<AccountSession>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read accounts file {}", path.display()))?;
    parse_accounts(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Parse accounts from text. Blank lines and `#` comments are skipped.
pub fn parse_accounts(contents: &str) -> Result<Vec<AccountSession>> {
    let mut accounts = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let account = parse_line(line).with_context(|| format!("line {}", index + 1))?;
        if accounts
            .iter()
            .any(|existing: &AccountSession| existing.name == account.name)
        {
            bail!("line {}: duplicate account name {:?}", index + 1, account.name);
        }
        accounts.push(account);
    }
    if accounts.is_empty() {
        bail!("no accounts defined");
    }
    Ok(accounts)
}

/// Build a session, rejecting credentials that cannot possibly be valid.
pub fn session(name: &str, token: &str, account_id: Option<u64>) -> Result<AccountSession> {
    let account_id = account_id.map(normalize_account_id).transpose()?;
    let session = AccountSession {
        name: name.trim().to_string(),
        token: token.trim().to_string(),
        account_id,
    };
    check_credentials(&session)?;
    Ok(session)
}

/// Reject a session whose name or token cannot possibly be valid.
pub fn check_credentials(session: &AccountSession) -> Result<()> {
    let name = &session.name;
    if name.is_empty() {
        bail!("missing display name");
    }
    if session.token.is_empty() {
        bail!("missing token for {name:?}");
    }
    if !token_pattern().is_match(&session.token) {
        bail!("token for {name:?} must be 32 hexadecimal characters");
    }
    Ok(())
}

fn parse_line(line: &str) -> Result<AccountSession> {
    let fields: Vec<&str> = line.split(':').collect();
    match fields.as_slice() {
        [name, token] => session(name, token, None),
        [name, token, id] => {
            let id = id
                .trim()
                .parse::<u64>()
                .map_err(|_| anyhow!("account id {:?} is not a number", id.trim()))?;
            session(name, token, Some(id))
        }
        _ => bail!("expected display_name:token[:account_id]"),
    }
}

/// Accept either a 32-bit account id or a 64-bit SteamID.
fn normalize_account_id(id: u64) -> Result<u32> {
    let id = if id >= STEAMID64_BASE {
        id - STEAMID64_BASE
    } else {
        id
    };
    u32::try_from(id).map_err(|_| anyhow!("account id {id} out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0123456789abcdef0123456789ABCDEF";

    #[test]
    fn parses_with_and_without_account_id() {
        let text = format!("# fleet\nalice:{TOKEN}\n\nbob:{TOKEN}:1234\n");
        let accounts = parse_accounts(&text).expect("parse");
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].name, "alice");
        assert_eq!(accounts[0].account_id, None);
        assert_eq!(accounts[1].account_id, Some(1234));
    }

    #[test]
    fn steamid64_is_reduced_to_account_id() {
        let text = format!("carol:{TOKEN}:76561197960265738\n");
        let accounts = parse_accounts(&text).expect("parse");
        assert_eq!(accounts[0].account_id, Some(10));
    }

    #[test]
    fn malformed_lines_report_line_number() {
        let text = format!("alice:{TOKEN}\nbroken\n");
        let err = parse_accounts(&text).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));

        let err = parse_accounts(&format!("alice:{TOKEN}:abc")).unwrap_err();
        assert!(format!("{err:#}").contains("not a number"));

        let err = parse_accounts("alice:short").unwrap_err();
        assert!(format!("{err:#}").contains("32 hexadecimal"));
    }

    #[test]
    fn empty_and_duplicate_files_are_rejected() {
        assert!(parse_accounts("# nothing\n\n").is_err());
        let text = format!("alice:{TOKEN}\nalice:{TOKEN}\n");
        let err = parse_accounts(&text).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = load_accounts(&temp.path().join("tokens.txt")).unwrap_err();
        assert!(err.to_string().contains("read accounts file"));
    }
}
