use serde::{Deserialize, Serialize};

use crate::status::StatusSnapshot;

/// Fields extracted from `git status --porcelain=v2 -b`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitStatusFields {
    pub branch: Option<String>,
    pub has_upstream: bool,
    pub ahead: u32,
    pub behind: u32,
    pub staged: u32,
    pub unstaged: u32,
    pub untracked: u32,
    pub has_conflicts: bool,
}

impl GitStatusFields {
    pub fn apply_to(&self, snapshot: &mut StatusSnapshot) {
        if let Some(branch) = &self.branch {
            snapshot.branch = branch.clone();
        }
        snapshot.has_upstream = self.has_upstream;
        snapshot.ahead = self.ahead;
        snapshot.behind = self.behind;
        snapshot.staged = self.staged;
        snapshot.unstaged = self.unstaged;
        snapshot.untracked = self.untracked;
        snapshot.has_conflicts = self.has_conflicts;
    }
}

/// Parse porcelain v2 output with branch headers, line by line.
pub fn parse_porcelain_v2(output: &str) -> GitStatusFields {
    let mut fields = GitStatusFields::default();

    for line in output.lines() {
        if let Some(head) = line.strip_prefix("# branch.head ") {
            fields.branch = Some(head.trim().to_string());
        } else if line.starts_with("# branch.upstream ") {
            fields.has_upstream = true;
        } else if let Some(ab) = line.strip_prefix("# branch.ab ") {
            for part in ab.split_whitespace() {
                if let Some(n) = part.strip_prefix('+') {
                    fields.ahead = n.parse().unwrap_or(0);
                } else if let Some(n) = part.strip_prefix('-') {
                    fields.behind = n.parse().unwrap_or(0);
                }
            }
        } else if line.starts_with("1 ") || line.starts_with("2 ") {
            // "1 XY ...": X = index state, Y = worktree state, '.' = unchanged.
            let bytes = line.as_bytes();
            if bytes.len() > 3 {
                let (x, y) = (bytes[2], bytes[3]);
                if x != b'.' {
                    fields.staged += 1;
                }
                if y != b'.' {
                    fields.unstaged += 1;
                }
                if x == b'U' || y == b'U' {
                    fields.has_conflicts = true;
                }
            }
        } else if line.starts_with("u ") {
            fields.has_conflicts = true;
        } else if line.starts_with("? ") {
            fields.untracked += 1;
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_branch_headers() {
        let out = "# branch.oid 1234abcd\n# branch.head main\n# branch.upstream origin/main\n# branch.ab +3 -1\n";
        let fields = parse_porcelain_v2(out);
        assert_eq!(fields.branch.as_deref(), Some("main"));
        assert!(fields.has_upstream);
        assert_eq!(fields.ahead, 3);
        assert_eq!(fields.behind, 1);
    }

    #[test]
    fn ahead_behind_alone() {
        let fields = parse_porcelain_v2("# branch.ab +3 -1");
        assert_eq!((fields.ahead, fields.behind), (3, 1));
        assert!(!fields.has_upstream);
    }

    #[test]
    fn tracked_change_counts_both_sides() {
        let fields = parse_porcelain_v2("1 MM N... 100644 100644 100644 abc def path");
        assert_eq!(fields.staged, 1);
        assert_eq!(fields.unstaged, 1);
        assert!(!fields.has_conflicts);
    }

    #[test]
    fn index_only_and_worktree_only_changes() {
        let out = "1 A. N... 000000 100644 100644 0000 abcd new.txt\n\
                   1 .D N... 100644 100644 000000 abcd abcd gone.txt\n\
                   2 R. N... 100644 100644 100644 abcd abcd R100 to.txt\tfrom.txt\n";
        let fields = parse_porcelain_v2(out);
        assert_eq!(fields.staged, 2);
        assert_eq!(fields.unstaged, 1);
    }

    #[test]
    fn unmerged_line_sets_conflicts() {
        let fields = parse_porcelain_v2("u UU N... 100644 100644 100644 100644 a b c path");
        assert!(fields.has_conflicts);
        assert_eq!(fields.staged + fields.unstaged, 0);
    }

    #[test]
    fn u_code_on_tracked_line_sets_conflicts() {
        let fields = parse_porcelain_v2("1 .U N... 100644 100644 100644 abc def path");
        assert!(fields.has_conflicts);
    }

    #[test]
    fn untracked_and_ignored() {
        let fields = parse_porcelain_v2("? new.txt\n? other.txt\n! ignored.log\n");
        assert_eq!(fields.untracked, 2);
        assert_eq!(fields.staged + fields.unstaged, 0);
    }

    #[test]
    fn detached_head_and_garbage_are_tolerated() {
        let out = "# branch.head (detached)\n# branch.ab +x -\n1 \nnonsense\n";
        let fields = parse_porcelain_v2(out);
        assert_eq!(fields.branch.as_deref(), Some("(detached)"));
        assert_eq!((fields.ahead, fields.behind), (0, 0));
        assert_eq!(fields.staged, 0);
    }

    #[test]
    fn apply_keeps_existing_branch_when_header_missing() {
        let mut snap = StatusSnapshot::new(crate::status::ScmProvider::Git);
        snap.branch = "keep".into();
        parse_porcelain_v2("? a\n").apply_to(&mut snap);
        assert_eq!(snap.branch, "keep");
        assert_eq!(snap.untracked, 1);
    }
}
