use std::path::Path;

use anyhow::{Context as _, bail};
use socks_auth::Credential;

pub(crate) const USAGE: &str = "[--port <PORT>] [--user <USERNAME>:<PASSWORD>]... [--users-file <PATH>] \
[--upstream <ADDR>] [--upstream-user <USERNAME>:<PASSWORD>] [--log-filter <DIRECTIVES>]";

const DEFAULT_PORT: u16 = 1080;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug)]
pub(crate) struct Args<'a> {
    pub(crate) port: u16,
    pub(crate) users: Vec<Credential>,
    pub(crate) users_file: Option<&'a str>,
    pub(crate) upstream: Option<&'a str>,
    pub(crate) upstream_user: Option<Credential>,
    pub(crate) log_filter: &'a str,
    pub(crate) show_usage: bool,
}

impl Default for Args<'_> {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            users: Vec::new(),
            users_file: None,
            upstream: None,
            upstream_user: None,
            log_filter: DEFAULT_LOG_FILTER,
            show_usage: false,
        }
    }
}

pub(crate) fn parse_args<'a>(mut input: &[&'a str]) -> anyhow::Result<Args<'a>> {
    let mut args = Args::default();

    loop {
        match input {
            ["--port" | "-p", value, rest @ ..] => {
                args.port = value.parse().context("port value malformed")?;
                input = rest;
            }
            ["--user" | "-u", value, rest @ ..] => {
                args.users.push(parse_user(value)?);
                input = rest;
            }
            ["--users-file", value, rest @ ..] => {
                args.users_file = Some(*value);
                input = rest;
            }
            ["--upstream", value, rest @ ..] => {
                args.upstream = Some(*value);
                input = rest;
            }
            ["--upstream-user", value, rest @ ..] => {
                args.upstream_user = Some(parse_user(value)?);
                input = rest;
            }
            ["--log-filter", value, rest @ ..] => {
                args.log_filter = value;
                input = rest;
            }
            ["--help" | "-h", rest @ ..] => {
                args.show_usage = true;
                input = rest;
            }
            [unexpected_arg, ..] => bail!("unexpected argument: {unexpected_arg}"),
            [] => break,
        }
    }

    Ok(args)
}

fn parse_user(value: &str) -> anyhow::Result<Credential> {
    if !value.contains(':') {
        bail!("malformed username:password: {value}");
    }

    let Ok(credential) = value.parse::<Credential>();
    Ok(credential)
}

/// Parses a users file: one `username:password` per line.
///
/// Blank lines and lines starting with `#` are skipped. A line without `:` is a username
/// accepted with any password.
pub(crate) fn parse_users(contents: &str) -> Vec<Credential> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let Ok(credential) = line.parse::<Credential>();
            credential
        })
        .collect()
}

pub(crate) async fn load_users_file(path: &Path) -> anyhow::Result<Vec<Credential>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read users file at {}", path.display()))?;
    Ok(parse_users(&contents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = parse_args(&[]).unwrap();
        assert_eq!(args.port, 1080);
        assert!(args.users.is_empty());
        assert!(args.upstream.is_none());
        assert_eq!(args.log_filter, "info");
        assert!(!args.show_usage);
    }

    #[test]
    fn repeated_users() {
        let args = parse_args(&["-p", "9050", "--user", "alice:secret", "-u", "bob:hunter2"]).unwrap();
        assert_eq!(args.port, 9050);
        assert_eq!(
            args.users,
            vec![Credential::new("alice", "secret"), Credential::new("bob", "hunter2")]
        );
    }

    #[test]
    fn upstream() {
        let args = parse_args(&["--upstream", "10.0.0.1:1080", "--upstream-user", "svc:pw"]).unwrap();
        assert_eq!(args.upstream, Some("10.0.0.1:1080"));
        assert_eq!(args.upstream_user, Some(Credential::new("svc", "pw")));
    }

    #[test]
    fn malformed_user() {
        let err = parse_args(&["--user", "alice"]).unwrap_err();
        assert_eq!(err.to_string(), "malformed username:password: alice");
    }

    #[test]
    fn unexpected_argument() {
        let err = parse_args(&["--verbose"]).unwrap_err();
        assert_eq!(err.to_string(), "unexpected argument: --verbose");
    }

    #[test]
    fn missing_value() {
        assert!(parse_args(&["--port"]).is_err());
        assert!(parse_args(&["--port", "not-a-port"]).is_err());
    }

    #[test]
    fn users_file() {
        let contents = "
            # operators
            alice:secret

            bob
            :shared-password
        ";

        assert_eq!(
            parse_users(contents),
            vec![
                Credential::new("alice", "secret"),
                Credential::new("bob", ""),
                Credential::new("", "shared-password"),
            ]
        );
    }
}
