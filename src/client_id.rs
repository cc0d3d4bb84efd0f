use std::{fmt, fs, io, str::FromStr};

use veil::Redact;

use crate::error::Error;

/// API client identifier.
///
/// An opaque alphanumeric token that SoundCloud hands to its own web player.
/// It is validated locally only for shape; whether it still works is decided
/// by the remote end, see [`Gateway::verify`](crate::gateway::Gateway::verify).
#[derive(Clone, Eq, Hash, PartialEq, Redact)]
pub struct ClientId(#[redact(fixed = 3)] String);

impl ClientId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ClientId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.chars().all(|chr| chr.is_ascii_alphanumeric()) {
            return Err(Error::Assertion(
                "client id must be non-empty and ascii alphanumeric".to_string(),
            ));
        }

        Ok(Self(s.to_owned()))
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn check(secrets_file: &str) -> io::Result<()> {
    // Prevent out-of-memory condition: the secrets file should be small.
    let attributes = fs::metadata(secrets_file)?;
    let file_size = attributes.len();

    if file_size > 1024 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{secrets_file} is too large"),
        ));
    }

    Ok(())
}

pub fn load(secrets_file: &str) -> io::Result<ClientId> {
    check(secrets_file)?;

    let contents = fs::read_to_string(secrets_file)?;
    let value = contents.parse::<toml::Value>().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{secrets_file} format is invalid: {e}"),
        )
    })?;

    match value.get("client_id").and_then(toml::Value::as_str) {
        Some(client_id) => client_id.parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{secrets_file} contains an invalid client id: {e}"),
            )
        }),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{secrets_file} does not contain a client id"),
        )),
    }
}

pub fn store(secrets_file: &str, client_id: &ClientId) -> io::Result<()> {
    fs::write(secrets_file, format!("client_id = \"{client_id}\"\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_alphanumeric_ids() {
        let client_id = "aAbBcC123456".parse::<ClientId>().unwrap();
        assert_eq!(client_id.as_str(), "aAbBcC123456");
    }

    #[test]
    fn rejects_empty_and_non_alphanumeric_ids() {
        assert!("".parse::<ClientId>().is_err());
        assert!("abc-def".parse::<ClientId>().is_err());
        assert!("abc def".parse::<ClientId>().is_err());
    }

    #[test]
    fn debug_output_is_redacted() {
        let client_id = "secretsecret1234".parse::<ClientId>().unwrap();
        assert!(!format!("{client_id:?}").contains("secretsecret1234"));
    }

    #[test]
    fn stores_and_loads_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        let path = path.to_str().unwrap();

        let client_id = "aAbBcC123456".parse::<ClientId>().unwrap();
        store(path, &client_id).unwrap();
        assert_eq!(load(path).unwrap(), client_id);
    }

    #[test]
    fn rejects_files_without_a_client_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        fs::write(&path, "api_key = \"nope\"\n").unwrap();

        let error = load(path.to_str().unwrap()).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn rejects_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        fs::write(&path, "x".repeat(2048)).unwrap();

        let error = load(path.to_str().unwrap()).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }
}
