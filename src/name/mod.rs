use serde::{Deserialize, Serialize};

/// Rejected whatever the policy says: the detail command line wraps the name
/// in double quotes, and a line break would end the command.
const ALWAYS_REJECTED: char = '"';
const CONTROL: std::ops::RangeInclusive<char> = '\0'..='\x1f';

/// Why a candidate name was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Nothing left after trimming surrounding whitespace.
    Empty,
    TooLong { len: usize, max: usize },
    DisallowedChar { name: String, ch: char },
    TrailingChar { name: String, ch: char },
}

impl std::fmt::Display for NameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "group name is empty"),
            Self::TooLong { len, max } => {
                write!(f, "group name is {len} characters long (limit {max})")
            }
            Self::DisallowedChar { name, ch } => {
                write!(f, "illegal character {ch:?} in name \"{}\"", name.escape_debug())
            }
            Self::TrailingChar { name, ch } => {
                write!(f, "invalid name \"{}\": must not end with {ch:?}", name.escape_debug())
            }
        }
    }
}

impl std::error::Error for NameError {}

/// The host's account naming rules.
///
/// Loaded from the `[policy]` table of the config file; the defaults are the
/// rules `net localgroup` enforces on current Windows releases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamePolicy {
    /// Maximum length in characters.
    pub max_len: usize,
    /// Printable characters a name must not contain. Code points 0x00-0x1F
    /// are always rejected.
    pub disallowed: String,
    /// Characters a name must not end with.
    pub forbidden_trailing: String,
}

impl Default for NamePolicy {
    fn default() -> Self {
        Self {
            max_len: 256,
            disallowed: r#","/\[]:|<>+=;?*"#.to_string(),
            forbidden_trailing: ".".to_string(),
        }
    }
}

impl NamePolicy {
    /// Validate an untrusted group name.
    ///
    /// Surrounding whitespace is trimmed first; the trimmed text is what gets
    /// checked and returned.
    ///
    /// # Errors
    ///
    /// Returns a [`NameError`] describing the first rule the name breaks.
    pub fn validate(&self, candidate: &str) -> Result<ValidName, NameError> {
        let name = candidate.trim();
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        let len = name.chars().count();
        if len > self.max_len {
            return Err(NameError::TooLong {
                len,
                max: self.max_len,
            });
        }
        self.check_chars(name)?;
        Ok(ValidName(name.to_string()))
    }

    /// Apply the character and trailing rules to the local-account part of a
    /// member name. The domain prefix is not checked.
    ///
    /// # Errors
    ///
    /// Returns a [`NameError`] if the account part breaks a rule.
    pub fn check_member(&self, member: &MemberName) -> Result<(), NameError> {
        let account = member.account();
        if account.is_empty() {
            return Err(NameError::Empty);
        }
        self.check_chars(account)
    }

    fn check_chars(&self, name: &str) -> Result<(), NameError> {
        if let Some(ch) = name.chars().find(|&c| self.is_rejected(c)) {
            return Err(NameError::DisallowedChar {
                name: name.to_string(),
                ch,
            });
        }
        if let Some(ch) = name.chars().next_back()
            && self.forbidden_trailing.contains(ch)
        {
            return Err(NameError::TrailingChar {
                name: name.to_string(),
                ch,
            });
        }
        Ok(())
    }

    fn is_rejected(&self, c: char) -> bool {
        c == ALWAYS_REJECTED || CONTROL.contains(&c) || self.disallowed.contains(c)
    }
}

/// A group name that passed [`NamePolicy::validate`].
///
/// The only way to obtain one is through validation, which is what lets the
/// detail command line embed it between double quotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidName(String);

impl ValidName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for ValidName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ValidName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A group member as printed by the tool, optionally `DOMAIN\user`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberName(String);

impl MemberName {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text before the last backslash, if the name is domain-qualified.
    pub fn domain(&self) -> Option<&str> {
        self.0.rfind('\\').map(|pos| &self.0[..pos])
    }

    /// The local-account suffix.
    pub fn account(&self) -> &str {
        self.0.rfind('\\').map_or(&self.0, |pos| &self.0[pos + 1..])
    }
}

impl std::fmt::Display for MemberName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
