//! Session identity stored in cookies
//!
//! Over time the server used three different cookie layouts for the logged-in
//! user, and nothing migrates between them. Which one to read is therefore an
//! explicit [`SessionSchema`] choice rather than a guess.

use std::fmt;
use std::str::FromStr;

use cookie::{Cookie, CookieJar};
use freeblog_util_error::FmtCompact as _;
use serde::{Deserialize, Serialize};
use snafu::Snafu;
use tracing::{debug, trace};

use crate::LOG_TARGET;

pub const USERIDTOK_COOKIE_NAME: &str = "useridtok";
pub const USERNAMETOK_COOKIE_NAME: &str = "usernametok";
pub const USERID_COOKIE_NAME: &str = "userid";
pub const USERNAME_COOKIE_NAME: &str = "username";
pub const SIG_COOKIE_NAME: &str = "sig";

const SUBFIELD_SEPARATOR: char = '|';

/// Cookie layout holding the session identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionSchema {
    /// `useridtok=<userid>|<tok>`
    #[default]
    UseridTok,
    /// `usernametok=<username>|<tok>`
    UsernameTok,
    /// `userid=<userid>; username=<username>; sig=<sig>`
    Separate,
}

impl SessionSchema {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UseridTok => "useridtok",
            Self::UsernameTok => "usernametok",
            Self::Separate => "separate",
        }
    }
}

impl fmt::Display for SessionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("Unknown session schema: {value}"))]
pub struct UnknownSessionSchemaError {
    value: String,
}

impl FromStr for SessionSchema {
    type Err = UnknownSessionSchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "useridtok" => Self::UseridTok,
            "usernametok" => Self::UsernameTok,
            "separate" => Self::Separate,
            _ => return UnknownSessionSchemaSnafu { value: s }.fail(),
        })
    }
}

/// Identity of the current user, as far as the cookies tell
///
/// Anonymous users get the zero value: `userid` 0 and empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub userid: i64,
    pub username: String,
    pub tok: String,
}

impl Session {
    pub fn is_anonymous(&self) -> bool {
        self.userid == 0 && self.username.is_empty()
    }

    /// Read the session from a `Cookie` header value (`a=1; b=2`)
    pub fn from_cookie_header(header: &str, schema: SessionSchema) -> Self {
        Self::from_jar(&jar_from_cookie_header(header), schema)
    }

    /// Read the session from a cookie jar
    ///
    /// Never fails. Anything missing or malformed degrades to the zero value.
    pub fn from_jar(jar: &CookieJar, schema: SessionSchema) -> Self {
        let value = |name: &str| jar.get(name).map(|c| c.value());

        match schema {
            SessionSchema::UseridTok => {
                let Some(v) = value(USERIDTOK_COOKIE_NAME) else {
                    return Self::default();
                };
                let (suserid, tok) = split_subfields(v);
                let Some(userid) = parse_userid(suserid) else {
                    return Self::default();
                };
                Self {
                    userid,
                    username: String::new(),
                    tok: tok.to_owned(),
                }
            }
            SessionSchema::UsernameTok => {
                let Some(v) = value(USERNAMETOK_COOKIE_NAME) else {
                    return Self::default();
                };
                let (username, tok) = split_subfields(v);
                Self {
                    userid: 0,
                    username: username.to_owned(),
                    tok: tok.to_owned(),
                }
            }
            SessionSchema::Separate => Self {
                userid: value(USERID_COOKIE_NAME)
                    .and_then(parse_userid)
                    .unwrap_or_default(),
                username: value(USERNAME_COOKIE_NAME).unwrap_or_default().to_owned(),
                tok: value(SIG_COOKIE_NAME).unwrap_or_default().to_owned(),
            },
        }
    }
}

/// Build a jar out of a `Cookie` header value
///
/// Malformed pairs (no `=`, empty name) are skipped. For a repeated name the
/// first occurrence is kept, as browsers list the most specific path first.
pub fn jar_from_cookie_header(header: &str) -> CookieJar {
    let mut jar = CookieJar::new();
    for cookie in Cookie::split_parse(header.to_owned()) {
        match cookie {
            Ok(cookie) if jar.get(cookie.name()).is_none() => jar.add_original(cookie),
            Ok(cookie) => {
                trace!(target: LOG_TARGET, name = %cookie.name(), "Skipping repeated cookie");
            }
            Err(err) => {
                debug!(target: LOG_TARGET, err = %err.fmt_compact(), "Skipping malformed cookie");
            }
        }
    }
    jar
}

/// `a|b` -> (`a`, `b`); `a` -> (`a`, ``); anything past a second `|` is dropped
fn split_subfields(value: &str) -> (&str, &str) {
    let mut parts = value.split(SUBFIELD_SEPARATOR);
    let first = parts.next().unwrap_or_default();
    let second = parts.next().unwrap_or_default();
    (first, second)
}

fn parse_userid(s: &str) -> Option<i64> {
    s.trim()
        .parse::<i64>()
        .inspect_err(|err| {
            debug!(target: LOG_TARGET, err = %err.fmt_compact(), "Invalid userid in session cookie");
        })
        .ok()
}
