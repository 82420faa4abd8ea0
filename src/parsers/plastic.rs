use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const FIELD_SEPARATOR: &str = "|";
pub const LINE_START: &str = "@@SAFE@@";
pub const LINE_END: &str = "##SAFE##";

const AUTH_MARKERS: &[&str] = &[
    "login",
    "log in",
    "authentication",
    "credential",
    "unauthorized",
    "not authorized",
    "access denied",
    "token",
    "expired",
];

/// Case-insensitive check for the client's authentication-failure wording.
pub fn is_auth_failure(text: &str) -> bool {
    let lower = text.to_lowercase();
    AUTH_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Parse `getworkspacefrompath --format={wkname}|{wkpath}` into (name, path).
///
/// Both fields are required.
pub fn parse_workspace_from_path(output: &str) -> Option<(String, String)> {
    let mut parts = output
        .trim()
        .split(FIELD_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty());
    let name = parts.next()?;
    let path = parts.next()?;
    Some((name.to_string(), path.to_string()))
}

/// Branch from `workspaceinfo`: first line starting with "Branch" that has a
/// `:` or `=` separator.
pub fn parse_workspace_info_branch(output: &str) -> Option<String> {
    output.lines().map(str::trim).find_map(|line| {
        if !line.starts_with("Branch") {
            return None;
        }
        let split = line.find(':').or_else(|| line.find('='))?;
        let branch = line[split + 1..].trim();
        (!branch.is_empty()).then(|| branch.to_string())
    })
}

/// Fields extracted from `status --header --head`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlasticHeader {
    pub current_changeset: Option<u64>,
    pub head_changeset: Option<u64>,
    pub branch: Option<String>,
}

impl PlasticHeader {
    /// Upstream is known only when both changeset ids resolved.
    pub fn has_upstream(&self) -> bool {
        self.current_changeset.is_some() && self.head_changeset.is_some()
    }

    /// (ahead, behind) relative to the branch head.
    pub fn ahead_behind(&self) -> (u32, u32) {
        match (self.current_changeset, self.head_changeset) {
            (Some(current), Some(head)) => (
                clamp_u32(current.saturating_sub(head)),
                clamp_u32(head.saturating_sub(current)),
            ),
            _ => (0, 0),
        }
    }
}

fn clamp_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn changeset_re() -> &'static Regex {
    static CS_RE: OnceLock<Regex> = OnceLock::new();
    CS_RE.get_or_init(|| Regex::new(r"cs:(\d+)").expect("cs regex"))
}

fn head_re() -> &'static Regex {
    static HEAD_RE: OnceLock<Regex> = OnceLock::new();
    HEAD_RE.get_or_init(|| Regex::new(r"head:(\d+)").expect("head regex"))
}

fn capture_number(re: &Regex, line: &str) -> Option<u64> {
    re.captures(line)?.get(1)?.as_str().parse().ok()
}

/// Branch candidate from a header line such as
/// `/main/task@repo@server (cs:12 - head:14)` or `lb:dev@repo`.
fn header_branch(line: &str) -> Option<String> {
    let left = match line.find('(') {
        Some(idx) => &line[..idx],
        None => line,
    };
    let left = left.trim();
    let is_branch_line = left.starts_with('/')
        || left
            .get(..3)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("lb:"));
    if !is_branch_line {
        return None;
    }
    let left = match left.find('@') {
        Some(idx) => &left[..idx],
        None => left,
    };
    Some(left.trim().to_string())
}

pub fn parse_status_header(output: &str) -> PlasticHeader {
    let mut header = PlasticHeader::default();

    for line in output.lines() {
        if let Some(cs) = capture_number(changeset_re(), line) {
            header.current_changeset = Some(cs);
        }
        if let Some(head) = capture_number(head_re(), line) {
            header.head_changeset = Some(head);
        }
        if header.branch.is_none() {
            header.branch = header_branch(line);
        }
    }

    header
}

/// Counts from `status --machinereadable` with the custom line markers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlasticStatusFields {
    pub change_count: u32,
    pub untracked: u32,
    pub has_conflicts: bool,
}

impl PlasticStatusFields {
    /// Controlled changes: everything that is not private.
    pub fn unstaged(&self) -> u32 {
        self.change_count.saturating_sub(self.untracked)
    }
}

fn is_private_code(code: &str) -> bool {
    code.split('+')
        .filter(|part| !part.is_empty())
        .any(|part| part.eq_ignore_ascii_case("PR"))
}

fn is_conflict_field(field: &str) -> bool {
    let upper = field.to_uppercase();
    upper.contains("CONFLICT") || (upper.contains("MERGE") && !upper.contains("NO_MERGES"))
}

pub fn parse_status(output: &str) -> PlasticStatusFields {
    let mut fields = PlasticStatusFields::default();

    for line in output.lines() {
        let clean = line.replace(LINE_START, "").replace(LINE_END, "");
        let clean = clean.trim();
        if clean.is_empty() {
            continue;
        }

        // Empty fields are kept so positions stay stable.
        let parts: Vec<&str> = clean.split(FIELD_SEPARATOR).collect();
        let code = parts[0].trim();
        if code.eq_ignore_ascii_case("STATUS") {
            continue;
        }

        fields.change_count += 1;
        if is_private_code(code) {
            fields.untracked += 1;
        }
        if parts.iter().any(|field| is_conflict_field(field)) {
            fields.has_conflicts = true;
        }
    }

    fields
}
