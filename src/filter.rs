//! Ignore rules for excluding files from listings.
//!
//! Rules are read from a plain-text file (one pattern per line, `#` starts a
//! comment) and matched against paths relative to the project root, always
//! written with `/` separators.
//!
//! Three kinds of rule exist:
//! - `build/` excludes a directory wherever it appears as a complete segment
//! - `/docs/*.md` is anchored at the project root
//! - `*.log` matches the relative path or just the file name

use crate::error::{Error, Result};
use globset::{GlobBuilder, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File names probed when no ignore file is given explicitly.
pub(crate) const IGNORE_FILE_NAME: &str = "ignore.txt";

/// How an [`IgnoreRule`] is matched.
#[derive(Debug, Clone)]
enum RuleKind {
    /// Trailing separator: exclude a directory by prefix or segment.
    Directory {
        dir: String,
        rooted: bool,
    },
    /// Leading separator: glob against the whole relative path.
    Rooted(GlobMatcher),
    /// Glob against the relative path or the file name.
    Anywhere(GlobMatcher),
}

/// A single exclusion pattern.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pattern: String,
    kind: RuleKind,
}

impl IgnoreRule {
    /// Parses a single, already normalized pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the glob part of the pattern is malformed.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();

        let kind = if let Some(dir) = pattern.strip_suffix('/') {
            match dir.strip_prefix('/') {
                Some(dir) => RuleKind::Directory {
                    dir: dir.to_string(),
                    rooted: true,
                },
                None => RuleKind::Directory {
                    dir: dir.to_string(),
                    rooted: false,
                },
            }
        } else if let Some(rest) = pattern.strip_prefix('/') {
            RuleKind::Rooted(compile_glob(&pattern, rest)?)
        } else {
            RuleKind::Anywhere(compile_glob(&pattern, &pattern)?)
        };

        Ok(Self { pattern, kind })
    }

    /// Normalizes a raw line from an ignore file.
    ///
    /// Returns `None` for blank lines and comments. Backslashes become `/`,
    /// and a bare dotted name such as `.env` is widened to `*.env` so it
    /// excludes that suffix at any depth.
    #[must_use]
    pub fn normalize(raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let pattern = trimmed.replace('\\', "/");
        let is_bare_suffix = pattern.starts_with('.')
            && !pattern.contains('/')
            && !pattern.contains(&['*', '?', '['][..]);

        if is_bare_suffix {
            Some(format!("*{pattern}"))
        } else {
            Some(pattern)
        }
    }

    /// Returns the pattern text this rule was built from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true for directory rules (trailing `/`).
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        matches!(self.kind, RuleKind::Directory { .. })
    }

    /// Returns true for rules anchored at the project root (leading `/`).
    #[must_use]
    pub const fn is_rooted(&self) -> bool {
        matches!(
            self.kind,
            RuleKind::Rooted(_) | RuleKind::Directory { rooted: true, .. }
        )
    }

    /// Checks the rule against a relative path and its file name.
    #[must_use]
    pub fn matches(&self, rel: &str, name: &str) -> bool {
        match &self.kind {
            RuleKind::Directory { dir, rooted } => {
                if rel == dir || rel.starts_with(&format!("{dir}/")) {
                    return true;
                }
                !rooted && format!("/{rel}/").contains(&format!("/{dir}/"))
            }
            RuleKind::Rooted(glob) => glob.is_match(rel),
            RuleKind::Anywhere(glob) => glob.is_match(rel) || glob.is_match(name),
        }
    }
}

/// Shell-style glob: `*` crosses separators, no escapes, case-sensitive.
///
/// An unclosed `[` and any brace match literally, as with fnmatch.
fn compile_glob(pattern: &str, glob: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(&literal_braces(glob))
        .literal_separator(false)
        .backslash_escape(false)
        .allow_unclosed_class(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| Error::invalid_pattern(pattern, e.to_string()))
}

/// Wraps `{` and `}` outside character classes in `[..]` so globset
/// does not expand them as alternations.
fn literal_braces(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len());
    let mut in_class = false;
    // Members seen since `[`; a leading `!` negates, a leading `]` is a member.
    let mut members = 0usize;

    for ch in glob.chars() {
        match ch {
            '[' if !in_class => {
                in_class = true;
                members = 0;
                out.push(ch);
            }
            ']' if in_class && members > 0 => {
                in_class = false;
                out.push(ch);
            }
            '{' | '}' if !in_class => {
                out.push('[');
                out.push(ch);
                out.push(']');
            }
            '!' if in_class && members == 0 && out.ends_with('[') => out.push(ch),
            _ => {
                if in_class {
                    members += 1;
                }
                out.push(ch);
            }
        }
    }

    out
}

/// An ordered set of ignore rules for one run.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<IgnoreRule>,
}

impl IgnoreRules {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds rules from raw lines, skipping blanks and comments.
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern is malformed.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Self::new();
        rules.extend_lines(lines)?;
        Ok(rules)
    }

    /// Loads rules from an ignore file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains a malformed
    /// pattern.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        let text = crate::file::decode_lossy(&bytes);
        let rules = Self::from_lines(text.lines())?;

        debug!("Loaded {} ignore rules from {}", rules.len(), path.display());
        Ok(rules)
    }

    /// Finds the ignore file used when none is configured.
    ///
    /// Looks for `ignore.txt` next to the targets directory first, then
    /// inside it.
    #[must_use]
    pub fn locate(targets_dir: &Path) -> Option<PathBuf> {
        let beside = targets_dir
            .parent()
            .map(|parent| parent.join(IGNORE_FILE_NAME));

        beside
            .into_iter()
            .chain(std::iter::once(targets_dir.join(IGNORE_FILE_NAME)))
            .find(|candidate| candidate.is_file())
    }

    /// Appends rules from raw lines.
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern is malformed.
    pub fn extend_lines<I, S>(&mut self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            if let Some(pattern) = IgnoreRule::normalize(line.as_ref()) {
                self.rules.push(IgnoreRule::new(pattern)?);
            }
        }
        Ok(())
    }

    /// Returns true if any rule excludes the path.
    #[must_use]
    pub fn is_ignored(&self, rel: &str, name: &str) -> bool {
        self.matching_rule(rel, name).is_some()
    }

    /// Returns the first rule that excludes the path.
    #[must_use]
    pub fn matching_rule(&self, rel: &str, name: &str) -> Option<&IgnoreRule> {
        self.rules.iter().find(|rule| rule.matches(rel, name))
    }

    /// Returns the rules in load order.
    #[must_use]
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn rules(lines: &[&str]) -> IgnoreRules {
        IgnoreRules::from_lines(lines.iter().copied()).unwrap()
    }

    fn ignored(rules: &IgnoreRules, rel: &str) -> bool {
        let name = rel.rsplit('/').next().unwrap_or(rel);
        rules.is_ignored(rel, name)
    }

    #[test]
    fn test_normalize_skips_comments_and_blanks() {
        assert_eq!(IgnoreRule::normalize(""), None);
        assert_eq!(IgnoreRule::normalize("   "), None);
        assert_eq!(IgnoreRule::normalize("# node_modules/"), None);
        assert_eq!(IgnoreRule::normalize("  *.log  "), Some("*.log".to_string()));
    }

    #[test]
    fn test_normalize_bare_suffix() {
        assert_eq!(IgnoreRule::normalize(".env"), Some("*.env".to_string()));
        assert_eq!(IgnoreRule::normalize(".git/"), Some(".git/".to_string()));
        assert_eq!(IgnoreRule::normalize(".*.swp"), Some(".*.swp".to_string()));
        assert_eq!(IgnoreRule::normalize("a\\b\\"), Some("a/b/".to_string()));
    }

    #[test]
    fn test_rule_flags() {
        let dir = IgnoreRule::new("build/").unwrap();
        assert!(dir.is_directory());
        assert!(!dir.is_rooted());

        let rooted = IgnoreRule::new("/main.py").unwrap();
        assert!(!rooted.is_directory());
        assert!(rooted.is_rooted());

        let anywhere = IgnoreRule::new("*.log").unwrap();
        assert!(!anywhere.is_directory());
        assert!(!anywhere.is_rooted());
        assert_eq!(anywhere.pattern(), "*.log");
    }

    #[test]
    fn test_directory_rule_matches_segments() {
        let rules = rules(&["build/"]);

        assert!(ignored(&rules, "build/out.o"));
        assert!(ignored(&rules, "sub/build/x.txt"));
        assert!(!ignored(&rules, "buildtools/x.txt"));
        assert!(!ignored(&rules, "sub/mybuild/x.txt"));
    }

    #[test]
    fn test_nested_directory_rule() {
        let rules = rules(&["src/gen/"]);

        assert!(ignored(&rules, "src/gen/a.rs"));
        assert!(ignored(&rules, "crates/x/src/gen/a.rs"));
        assert!(!ignored(&rules, "src/generated/a.rs"));
    }

    #[test]
    fn test_rooted_directory_rule_only_at_root() {
        let rules = rules(&["/build/"]);

        assert!(ignored(&rules, "build/out.o"));
        assert!(!ignored(&rules, "sub/build/x.txt"));
    }

    #[test]
    fn test_rooted_glob() {
        let md = rules(&["/*.md"]);

        assert!(ignored(&md, "README.md"));
        // `*` crosses separators, as with fnmatch.
        assert!(ignored(&md, "docs/guide.md"));
        assert!(!ignored(&md, "main.py"));

        let rooted = rules(&["/main.py"]);
        assert!(ignored(&rooted, "main.py"));
        assert!(!ignored(&rooted, "sub/main.py"));
    }

    #[test]
    fn test_basename_glob_matches_any_depth() {
        let rules = rules(&["*.log", "Cargo.lock"]);

        assert!(ignored(&rules, "app.log"));
        assert!(ignored(&rules, "logs/2024/app.log"));
        assert!(ignored(&rules, "Cargo.lock"));
        assert!(ignored(&rules, "crates/a/Cargo.lock"));
        assert!(!ignored(&rules, "app.logger"));
    }

    #[test]
    fn test_dotfile_suffix_rule() {
        let rules = rules(&[".env"]);

        assert!(ignored(&rules, ".env"));
        assert!(ignored(&rules, "config/prod.env"));
        assert!(!ignored(&rules, "environment.py"));
    }

    #[test]
    fn test_glob_classes_and_question_mark() {
        let rules = rules(&["file?.[ch]"]);

        assert!(ignored(&rules, "file1.c"));
        assert!(ignored(&rules, "src/fileA.h"));
        assert!(!ignored(&rules, "file12.c"));
        assert!(!ignored(&rules, "file1.cpp"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let rules = rules(&["*.LOG"]);
        assert!(!ignored(&rules, "app.log"));
        assert!(ignored(&rules, "app.LOG"));
    }

    #[test]
    fn test_matching_rule_reports_first_match() {
        let rules = rules(&["*.txt", "notes/"]);
        let rule = rules.matching_rule("notes/a.txt", "a.txt").unwrap();
        assert_eq!(rule.pattern(), "*.txt");
    }

    #[test]
    fn test_unclosed_class_matches_literally() {
        let backup = rules(&["backup[old"]);

        assert!(ignored(&backup, "backup[old"));
        assert!(ignored(&backup, "data/backup[old"));
        assert!(!ignored(&backup, "backupo"));
    }

    #[test]
    fn test_braces_match_literally() {
        let braces = rules(&["file{1}.txt", "*.{js,ts}"]);

        assert!(ignored(&braces, "file{1}.txt"));
        assert!(!ignored(&braces, "file1.txt"));
        assert!(ignored(&braces, "lib/x.{js,ts}"));
        assert!(!ignored(&braces, "app.js"));
        assert!(!ignored(&braces, "app.ts"));

        // Braces inside a class stay class members.
        let class = rules(&["[{]x"]);
        assert!(ignored(&class, "{x"));
    }

    #[test]
    fn test_literal_braces_translation() {
        assert_eq!(literal_braces("a{b,c}"), "a[{]b,c[}]");
        assert_eq!(literal_braces("[{}]"), "[{}]");
        assert_eq!(literal_braces("[]{]"), "[]{]");
        assert_eq!(literal_braces("[!{]}"), "[!{][}]");
        assert_eq!(literal_braces("*.py"), "*.py");
    }

    #[test]
    fn test_invalid_glob_is_rejected() {
        let result = IgnoreRules::from_lines(["src/[z-a]"]);
        assert!(matches!(result, Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("ignore.txt");
        file.write_str("# comment\n__pycache__/\n\n*.pyc\r\n.venv/\n")
            .unwrap();

        let rules = IgnoreRules::load(file.path()).unwrap();

        assert_eq!(rules.len(), 3);
        assert!(ignored(&rules, "pkg/__pycache__/mod.cpython-311.pyc"));
        assert!(ignored(&rules, "mod.pyc"));
        assert!(ignored(&rules, ".venv/bin/python"));
        assert!(!ignored(&rules, "main.py"));
    }

    #[test]
    fn test_locate_prefers_file_beside_targets() {
        let temp = assert_fs::TempDir::new().unwrap();
        let targets = temp.child("targets");
        targets.create_dir_all().unwrap();
        targets.child("ignore.txt").write_str("*.tmp").unwrap();

        assert_eq!(
            IgnoreRules::locate(targets.path()),
            Some(targets.path().join("ignore.txt"))
        );

        temp.child("ignore.txt").write_str("*.log").unwrap();
        assert_eq!(
            IgnoreRules::locate(targets.path()),
            Some(temp.path().join("ignore.txt"))
        );
    }

    #[test]
    fn test_locate_none() {
        let temp = assert_fs::TempDir::new().unwrap();
        let targets = temp.child("targets");
        targets.create_dir_all().unwrap();

        assert_eq!(IgnoreRules::locate(targets.path()), None);
    }

    #[test]
    fn test_empty_rules_ignore_nothing() {
        let rules = IgnoreRules::new();
        assert!(rules.is_empty());
        assert!(!ignored(&rules, "anything/at/all.rs"));
    }
}
