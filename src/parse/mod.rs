//! Line-oriented parsers for `net localgroup` console output.
//!
//! The tool prints two shapes: a bulleted list of group names when run
//! without arguments, and a fixed key/value header plus member list when
//! given a group name. Both end with a success line. Anything that does not
//! fit the expected grammar is reported as [`MalformedOutput`] rather than
//! skipped, so a change in the tool's output never silently drops data.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::name::MemberName;

const TITLE_PATTERN: &str = r"^Aliases for ";
const BULLET_PATTERN: &str = r"^\*(.+)$";
const CLOSING_PATTERN: &str = r"^The command completed successfully\.";
const RULE_PATTERN: &str = r"^-+$";
const KEY_VALUE_PATTERN: &str = r"^(\S+(?: \S+)*)(?:\s{5,}(\S.*)?)?$";

const KEY_ALIAS_NAME: &str = "Alias name";
const KEY_COMMENT: &str = "Comment";
const MEMBERS_KEYWORD: &str = "Members";

/// Compiled line classifiers, shared by both parsers.
struct LinePatterns {
    title: Regex,
    bullet: Regex,
    closing: Regex,
    rule: Regex,
    key_value: Regex,
}

impl LinePatterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            title: Regex::new(TITLE_PATTERN)?,
            bullet: Regex::new(BULLET_PATTERN)?,
            closing: Regex::new(CLOSING_PATTERN)?,
            rule: Regex::new(RULE_PATTERN)?,
            key_value: Regex::new(KEY_VALUE_PATTERN)?,
        })
    }
}

static PATTERNS: LazyLock<Result<LinePatterns, regex::Error>> =
    LazyLock::new(LinePatterns::compile);

fn patterns() -> Result<&'static LinePatterns, MalformedOutput> {
    let Ok(p) = PATTERNS.as_ref() else {
        return Err(MalformedOutput::whole("line patterns failed to compile"));
    };
    Ok(p)
}

/// The captured text did not match the expected line grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedOutput {
    /// 1-based line number, or `None` when the problem is not tied to one
    /// line (e.g. the input ended early).
    pub line_no: Option<usize>,
    pub line: String,
    pub reason: &'static str,
}

impl MalformedOutput {
    fn at(line_no: usize, line: &str, reason: &'static str) -> Self {
        Self {
            line_no: Some(line_no),
            line: line.to_string(),
            reason,
        }
    }

    const fn whole(reason: &'static str) -> Self {
        Self {
            line_no: None,
            line: String::new(),
            reason,
        }
    }
}

impl std::fmt::Display for MalformedOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line_no {
            Some(n) => write!(
                f,
                "unexpected line {n} in net localgroup output ({}): {}",
                self.reason,
                self.line.escape_debug()
            ),
            None => write!(f, "could not parse net localgroup output ({})", self.reason),
        }
    }
}

impl std::error::Error for MalformedOutput {}

/// One local group as described by detail-mode output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRecord {
    pub name: String,
    /// `None` when the tool printed an empty comment.
    pub comment: Option<String>,
    pub members: Vec<MemberName>,
}

/// How a single list-mode line is interpreted.
#[derive(Debug, PartialEq, Eq)]
enum ListLine<'a> {
    Blank,
    Title,
    Rule,
    Closing,
    Name(&'a str),
    Unrecognized,
}

fn classify_list_line<'a>(p: &LinePatterns, line: &'a str) -> ListLine<'a> {
    if line.is_empty() {
        return ListLine::Blank;
    }
    if p.title.is_match(line) {
        return ListLine::Title;
    }
    if p.rule.is_match(line) {
        return ListLine::Rule;
    }
    if p.closing.is_match(line) {
        return ListLine::Closing;
    }
    p.bullet
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map_or(ListLine::Unrecognized, |m| ListLine::Name(m.as_str()))
}

/// Parse list-mode output into group names, in the order printed.
///
/// Scanning stops at the closing line; without one, every line is scanned.
///
/// # Errors
///
/// Returns [`MalformedOutput`] for a line that is neither a header, a rule,
/// a bulleted name nor the closing line.
pub fn parse_names(text: &str) -> Result<Vec<String>, MalformedOutput> {
    let p = patterns()?;
    let mut names = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        match classify_list_line(p, line) {
            ListLine::Blank | ListLine::Title | ListLine::Rule => {}
            ListLine::Closing => break,
            ListLine::Name(name) => names.push(name.to_string()),
            ListLine::Unrecognized => {
                return Err(MalformedOutput::at(idx + 1, line, "expected *name"));
            }
        }
    }
    Ok(names)
}

/// Position of the detail-mode scanner within the fixed layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetailState {
    Header,
    AwaitingMembersKeyword,
    /// Just after `Members`: one blank line is tolerated before the rule.
    AwaitingSeparator,
    AwaitingRule,
    ScanningMembers,
    Done,
}

/// Accumulates header fields and members while the scanner runs.
#[derive(Default)]
struct DetailBuilder {
    name: Option<String>,
    comment: Option<Option<String>>,
    members: Vec<MemberName>,
}

impl DetailBuilder {
    fn header_line(
        &mut self,
        p: &LinePatterns,
        line_no: usize,
        line: &str,
    ) -> Result<(), MalformedOutput> {
        let caps = p
            .key_value
            .captures(line)
            .ok_or_else(|| MalformedOutput::at(line_no, line, "expected key/value pair"))?;
        let key = caps.get(1).map_or("", |m| m.as_str());
        let value = caps.get(2).map(|m| m.as_str().to_string());
        match key {
            KEY_ALIAS_NAME => {
                if self.name.is_some() {
                    return Err(MalformedOutput::at(line_no, line, "repeated field"));
                }
                let value = value
                    .ok_or_else(|| MalformedOutput::at(line_no, line, "alias name has no value"))?;
                self.name = Some(value);
            }
            KEY_COMMENT => {
                if self.comment.is_some() {
                    return Err(MalformedOutput::at(line_no, line, "repeated field"));
                }
                self.comment = Some(value);
            }
            _ => return Err(MalformedOutput::at(line_no, line, "unknown field")),
        }
        Ok(())
    }

    fn finish(self) -> Result<GroupRecord, MalformedOutput> {
        let name = self
            .name
            .ok_or_else(|| MalformedOutput::whole("no alias name in header"))?;
        Ok(GroupRecord {
            name,
            comment: self.comment.flatten(),
            members: self.members,
        })
    }
}

fn step(
    p: &LinePatterns,
    state: DetailState,
    builder: &mut DetailBuilder,
    line_no: usize,
    line: &str,
) -> Result<DetailState, MalformedOutput> {
    use DetailState::{
        AwaitingMembersKeyword, AwaitingRule, AwaitingSeparator, Done, Header, ScanningMembers,
    };

    match state {
        Header if line.is_empty() => Ok(AwaitingMembersKeyword),
        Header => builder.header_line(p, line_no, line).map(|()| Header),
        AwaitingMembersKeyword if line == MEMBERS_KEYWORD => Ok(AwaitingSeparator),
        AwaitingMembersKeyword => Err(MalformedOutput::at(line_no, line, "expected Members")),
        AwaitingSeparator if line.is_empty() => Ok(AwaitingRule),
        AwaitingSeparator | AwaitingRule if p.rule.is_match(line) => Ok(ScanningMembers),
        AwaitingSeparator | AwaitingRule => {
            Err(MalformedOutput::at(line_no, line, "expected a line of hyphens"))
        }
        ScanningMembers if p.closing.is_match(line) => Ok(Done),
        // TODO: confirm whether a comment with an embedded line break can put a
        // blank line here; until then a gap in the member list is an error.
        ScanningMembers if line.is_empty() => {
            Err(MalformedOutput::at(line_no, line, "blank line in member list"))
        }
        ScanningMembers => {
            builder.members.push(MemberName::new(line));
            Ok(ScanningMembers)
        }
        Done => Ok(Done),
    }
}

/// Parse detail-mode output for a single group.
///
/// # Errors
///
/// Returns [`MalformedOutput`] on any deviation from the fixed layout:
/// unknown header field, missing `Members` keyword or rule, a blank line
/// among the members, or a missing closing line.
pub fn parse_detail(text: &str) -> Result<GroupRecord, MalformedOutput> {
    let p = patterns()?;
    let mut state = DetailState::Header;
    let mut builder = DetailBuilder::default();
    for (idx, line) in text.lines().enumerate() {
        state = step(p, state, &mut builder, idx + 1, line)?;
        if state == DetailState::Done {
            return builder.finish();
        }
    }
    Err(MalformedOutput::whole(match state {
        DetailState::Header | DetailState::AwaitingMembersKeyword => "no Members section",
        DetailState::AwaitingSeparator | DetailState::AwaitingRule => "no member list rule",
        DetailState::ScanningMembers | DetailState::Done => "no closing line",
    }))
}
