//! SERVICEOWNERS pattern compiler and matcher
//!
//! A pattern is split into `/`-separated segments. Each segment is one of:
//! - a literal, compared case-sensitively against exactly one path segment
//! - a single-segment wildcard (`*`, `?`, `[...]`), never crossing `/`
//! - `**`, which consumes zero or more whole path segments
//!
//! Every pattern is anchored at the repository root. A trailing `/` is
//! shorthand for a trailing `/**`.

use globset::{GlobBuilder, GlobMatcher};

/// Characters that turn a segment into a single-segment wildcard.
const WILDCARD_CHARS: &[char] = &['*', '?', '['];

/// Characters that end a literal prefix/suffix when comparing wildcards.
const GLOB_META_CHARS: &[char] = &['*', '?', '[', ']', '{', '}', ','];

/// Errors raised while compiling a pattern
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternSyntaxError {
    #[error("empty pattern")]
    Empty,

    #[error("pattern '{0}' points at the repository root, not a file glob")]
    RootOnly(String),

    #[error("invalid glob segment '{segment}' in pattern '{pattern}': {reason}")]
    InvalidSegment {
        pattern: String,
        segment: String,
        reason: String,
    },
}

/// A glob confined to one path segment.
#[derive(Debug, Clone)]
pub struct SegmentGlob {
    raw: String,
    matcher: GlobMatcher,
}

impl SegmentGlob {
    fn new(pattern: &str, raw: &str) -> Result<Self, PatternSyntaxError> {
        let collapsed = collapse_stars(raw);
        let glob = GlobBuilder::new(&escape_literals(&collapsed))
            .literal_separator(true)
            .build()
            .map_err(|e| PatternSyntaxError::InvalidSegment {
                pattern: pattern.to_string(),
                segment: raw.to_string(),
                reason: e.kind().to_string(),
            })?;

        Ok(Self {
            raw: collapsed,
            matcher: glob.compile_matcher(),
        })
    }

    /// The segment text as handed to the glob engine
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_match(&self, segment: &str) -> bool {
        self.matcher.is_match(segment)
    }

    /// Literal text before the first glob metacharacter
    fn literal_prefix(&self) -> &str {
        match self.raw.find(GLOB_META_CHARS) {
            Some(i) => &self.raw[..i],
            None => &self.raw,
        }
    }

    /// Literal text after the last glob metacharacter
    fn literal_suffix(&self) -> &str {
        match self.raw.rfind(GLOB_META_CHARS) {
            Some(i) => &self.raw[i + 1..],
            None => &self.raw,
        }
    }

    /// `*` followed only by literal text, e.g. `*.md`
    fn star_then_literal(&self) -> Option<&str> {
        let rest = self.raw.strip_prefix('*')?;
        (!rest.contains(GLOB_META_CHARS)).then_some(rest)
    }

    /// Literal text followed only by `*`, e.g. `README*`
    fn literal_then_star(&self) -> Option<&str> {
        let rest = self.raw.strip_suffix('*')?;
        (!rest.contains(GLOB_META_CHARS)).then_some(rest)
    }
}

impl PartialEq for SegmentGlob {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for SegmentGlob {}

/// One compiled pattern segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Exact, case-sensitive match of one path segment
    Literal(String),
    /// Glob match of one path segment
    Wildcard(SegmentGlob),
    /// `**`: zero or more path segments
    AnyDepth,
}

impl Segment {
    fn classify(pattern: &str, raw: &str) -> Result<Self, PatternSyntaxError> {
        if raw == "**" {
            Ok(Segment::AnyDepth)
        } else if raw.contains(WILDCARD_CHARS) {
            Ok(Segment::Wildcard(SegmentGlob::new(pattern, raw)?))
        } else {
            Ok(Segment::Literal(raw.to_string()))
        }
    }

    fn matches(&self, segment: &str) -> bool {
        match self {
            Segment::Literal(lit) => lit == segment,
            Segment::Wildcard(glob) => glob.is_match(segment),
            Segment::AnyDepth => true,
        }
    }

    /// Every path segment `other` matches is also matched by `self`.
    /// May answer `false` for covering wildcards it cannot prove.
    fn covers(&self, other: &Segment) -> bool {
        match (self, other) {
            (Segment::Literal(a), Segment::Literal(b)) => a == b,
            (Segment::Wildcard(a), Segment::Literal(b)) => a.is_match(b),
            (Segment::Literal(_), Segment::Wildcard(_)) => false,
            (Segment::Wildcard(a), Segment::Wildcard(b)) => {
                if a.raw == "*" || a == b {
                    return true;
                }
                if let Some(suffix) = a.star_then_literal() {
                    return b.literal_suffix().ends_with(suffix);
                }
                if let Some(prefix) = a.literal_then_star() {
                    return b.literal_prefix().starts_with(prefix);
                }
                false
            }
            (_, Segment::AnyDepth) | (Segment::AnyDepth, _) => false,
        }
    }

    /// Some path segment may be matched by both. May answer `true` for
    /// wildcard pairs that turn out to be disjoint.
    fn intersects(&self, other: &Segment) -> bool {
        match (self, other) {
            (Segment::Literal(a), Segment::Literal(b)) => a == b,
            (Segment::Wildcard(g), Segment::Literal(l)) | (Segment::Literal(l), Segment::Wildcard(g)) => {
                g.is_match(l)
            }
            (Segment::Wildcard(a), Segment::Wildcard(b)) => {
                let (pa, pb) = (a.literal_prefix(), b.literal_prefix());
                let (sa, sb) = (a.literal_suffix(), b.literal_suffix());
                (pa.starts_with(pb) || pb.starts_with(pa)) && (sa.ends_with(sb) || sb.ends_with(sa))
            }
            (_, Segment::AnyDepth) | (Segment::AnyDepth, _) => true,
        }
    }
}

/// A rule pattern compiled into segment matchers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    raw: String,
    segments: Vec<Segment>,
    directory: bool,
}

impl CompiledPattern {
    /// The pattern exactly as written in the rule
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the pattern used the trailing-slash directory shorthand
    pub fn is_directory(&self) -> bool {
        self.directory
    }

    /// Whether the pattern matches every path (`**`)
    pub fn matches_everything(&self) -> bool {
        self.segments.iter().all(|s| *s == Segment::AnyDepth)
    }

    /// Match a repository-relative path
    pub fn matches(&self, path: &str) -> bool {
        self.matches_segments(&split_path(path))
    }

    /// Match a path already split with [`split_path`].
    ///
    /// `reach[j]` holds whether the segments compiled so far can consume
    /// exactly the first `j` path segments.
    pub fn matches_segments(&self, path: &[&str]) -> bool {
        let mut reach = vec![false; path.len() + 1];
        reach[0] = true;

        for segment in &self.segments {
            let mut next = vec![false; path.len() + 1];
            match segment {
                Segment::AnyDepth => {
                    let mut any = false;
                    for (j, slot) in next.iter_mut().enumerate() {
                        any |= reach[j];
                        *slot = any;
                    }
                }
                single => {
                    for (j, part) in path.iter().enumerate() {
                        next[j + 1] = reach[j] && single.matches(part);
                    }
                }
            }
            if !next.iter().any(|r| *r) {
                return false;
            }
            reach = next;
        }

        reach[path.len()]
    }

    /// Every path matched by `other` is also matched by `self`.
    ///
    /// Conservative: a `true` answer is always correct, a `false` answer may
    /// miss containment between exotic wildcard segments.
    pub fn covers(&self, other: &CompiledPattern) -> bool {
        let (a, b) = (&self.segments, &other.segments);
        // table[i][j]: a[i..] covers b[j..]
        let mut table = vec![vec![false; b.len() + 1]; a.len() + 1];
        table[a.len()][b.len()] = true;

        for i in (0..a.len()).rev() {
            table[i][b.len()] = a[i] == Segment::AnyDepth && table[i + 1][b.len()];
            for j in (0..b.len()).rev() {
                table[i][j] = match (&a[i], &b[j]) {
                    (Segment::AnyDepth, _) => table[i + 1][j] || table[i][j + 1],
                    (_, Segment::AnyDepth) => false,
                    (sa, sb) => sa.covers(sb) && table[i + 1][j + 1],
                };
            }
        }

        table[0][0]
    }

    /// Some path may be matched by both patterns.
    ///
    /// Over-approximates for wildcard segments whose literal affixes are
    /// compatible; literal and `**` structure is decided exactly.
    pub fn intersects(&self, other: &CompiledPattern) -> bool {
        let (a, b) = (&self.segments, &other.segments);
        // table[i][j]: a[i..] and b[j..] can match a common path
        let mut table = vec![vec![false; b.len() + 1]; a.len() + 1];
        table[a.len()][b.len()] = true;

        for j in (0..b.len()).rev() {
            table[a.len()][j] = b[j] == Segment::AnyDepth && table[a.len()][j + 1];
        }

        for i in (0..a.len()).rev() {
            table[i][b.len()] = a[i] == Segment::AnyDepth && table[i + 1][b.len()];
            for j in (0..b.len()).rev() {
                table[i][j] = match (&a[i], &b[j]) {
                    (Segment::AnyDepth, _) => table[i + 1][j] || table[i][j + 1],
                    (_, Segment::AnyDepth) => table[i][j + 1] || table[i + 1][j],
                    (sa, sb) => sa.intersects(sb) && table[i + 1][j + 1],
                };
            }
        }

        table[0][0]
    }
}

impl std::fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Compile a raw rule pattern.
pub fn compile(raw: &str) -> Result<CompiledPattern, PatternSyntaxError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PatternSyntaxError::Empty);
    }

    let mut body = trimmed.replace('\\', "/");
    while let Some(rest) = body.strip_prefix("./") {
        body = rest.to_string();
    }
    if let Some(rest) = body.strip_prefix('/') {
        body = rest.to_string();
    }

    let directory = body.ends_with('/');
    let body = body.trim_end_matches('/');
    if body.is_empty() {
        return Err(PatternSyntaxError::RootOnly(raw.to_string()));
    }

    let mut segments: Vec<Segment> = Vec::new();
    for part in body.split('/').filter(|p| !p.is_empty() && *p != ".") {
        let segment = Segment::classify(raw, part)?;
        // Consecutive `**` collapse into one
        if segment == Segment::AnyDepth && segments.last() == Some(&Segment::AnyDepth) {
            continue;
        }
        segments.push(segment);
    }

    if directory && segments.last() != Some(&Segment::AnyDepth) {
        segments.push(Segment::AnyDepth);
    }

    Ok(CompiledPattern {
        raw: raw.to_string(),
        segments,
        directory,
    })
}

/// Split a repository-relative path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".").collect()
}

/// `a**b` means the same as `a*b` inside one segment.
fn collapse_stars(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Rewrite a segment so the glob engine only sees `*`, `?` and closed
/// `[...]` classes as syntax. Braces and commas are literal, and a `[` with
/// no closing `]` matches itself.
fn escape_literals(segment: &str) -> String {
    let chars: Vec<char> = segment.chars().collect();
    let mut out = String::with_capacity(segment.len() + 8);
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '{' => out.push_str("[{]"),
            '}' => out.push_str("[}]"),
            ',' => out.push_str("[,]"),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.extend(&chars[i..=end]);
                    i = end;
                }
                None => out.push_str("[[]"),
            },
            c => out.push(c),
        }
        i += 1;
    }
    out
}

/// Index of the `]` closing the class opened at `start`, if any.
/// A `]` right after the opening (or after `!`/`^`) is a member, not the end.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if matches!(chars.get(i), Some('!') | Some('^')) {
        i += 1;
    }
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    chars[i.min(chars.len())..]
        .iter()
        .position(|&c| c == ']')
        .map(|offset| i + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pat(raw: &str) -> CompiledPattern {
        compile(raw).unwrap()
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert_eq!(compile(""), Err(PatternSyntaxError::Empty));
        assert_eq!(compile("   "), Err(PatternSyntaxError::Empty));
    }

    #[test]
    fn test_root_only_pattern_rejected() {
        assert!(matches!(compile("/"), Err(PatternSyntaxError::RootOnly(_))));
        assert!(matches!(compile("./"), Err(PatternSyntaxError::RootOnly(_))));
    }

    #[test]
    fn test_unclosed_bracket_is_literal() {
        let p = pat("docs/[draft");
        assert!(p.matches("docs/[draft"));
        assert!(!p.matches("docs/d"));

        let p = pat("src/[abc*");
        assert!(p.matches("src/[abc.rs"));
        assert!(!p.matches("src/a.rs"));
    }

    #[test]
    fn test_reversed_range_rejected() {
        let err = compile("src/[z-a]*").unwrap_err();
        assert!(matches!(err, PatternSyntaxError::InvalidSegment { .. }));
        assert!(err.to_string().contains("[z-a]"));
    }

    #[test]
    fn test_braces_are_literal() {
        let p = pat("*.{md,rs}");
        assert!(p.matches("x.{md,rs}"));
        assert!(!p.matches("x.md"));
        assert!(!p.matches("x.rs"));

        assert!(pat("docs/*}.md").matches("docs/a}.md"));
        assert!(pat("docs/*{a").matches("docs/x{a"));
        assert!(pat("a,b/*").matches("a,b/c"));
    }

    #[test]
    fn test_class_with_leading_bracket_member() {
        let p = pat("v[]x]*");
        assert!(p.matches("v]1"));
        assert!(p.matches("vx1"));
        assert!(!p.matches("vy1"));

        let p = pat("v[!]]*");
        assert!(p.matches("va"));
        assert!(!p.matches("v]a"));
    }

    #[test]
    fn test_escape_literals() {
        assert_eq!(escape_literals("*.{md,rs}"), "*.[{]md[,]rs[}]");
        assert_eq!(escape_literals("[draft"), "[[]draft");
        assert_eq!(escape_literals("[ab]*"), "[ab]*");
        assert_eq!(escape_literals("[ab]x[c"), "[ab]x[[]c");
    }

    #[test]
    fn test_segment_classification() {
        let p = pat("apps/*.rs/**");
        assert!(matches!(p.segments()[0], Segment::Literal(ref s) if s == "apps"));
        assert!(matches!(p.segments()[1], Segment::Wildcard(_)));
        assert_eq!(p.segments()[2], Segment::AnyDepth);
    }

    #[test]
    fn test_consecutive_double_stars_collapse() {
        let p = pat("a/**/**/b");
        assert_eq!(p.segments().len(), 3);
        assert_eq!(p, pat("a/**/b").with_raw("a/**/**/b"));
    }

    #[test]
    fn test_leading_slash_is_noop() {
        let anchored = pat("/docs/*");
        assert!(anchored.matches("docs/a.md"));
        assert!(!anchored.matches("x/docs/a.md"));
        assert_eq!(anchored.segments(), pat("docs/*").segments());
    }

    #[test]
    fn test_leading_dot_slash_and_backslashes_normalized() {
        let p = pat(".\\docs\\*.md");
        assert!(p.matches("docs/a.md"));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let p = pat("docs/*");
        assert!(p.matches("docs/a.md"));
        assert!(!p.matches("docs/a/b.md"));
    }

    #[test]
    fn test_double_star_crosses_segments() {
        let p = pat("docs/**");
        assert!(p.matches("docs/a.md"));
        assert!(p.matches("docs/a/b.md"));
        assert!(!p.matches("other/docs/a.md"));
    }

    #[test]
    fn test_directory_shorthand_equals_double_star() {
        let short = pat("docs/");
        let long = pat("docs/**");
        assert!(short.is_directory());
        assert_eq!(short.segments(), long.segments());
        for path in ["docs", "docs/a.md", "docs/a/b/c.md", "doc/a.md", "x/docs/a"] {
            assert_eq!(short.matches(path), long.matches(path), "path {}", path);
        }
    }

    #[test]
    fn test_root_level_wildcard_is_single_segment() {
        let p = pat("*.md");
        assert!(p.matches("a.md"));
        assert!(!p.matches("docs/readme.md"));

        let deep = pat("**/*.md");
        assert!(deep.matches("a.md"));
        assert!(deep.matches("docs/readme.md"));
        assert!(!deep.matches("docs/readme.mdx"));
    }

    #[test]
    fn test_double_star_alone_matches_everything() {
        let p = pat("**");
        assert!(p.matches_everything());
        assert!(p.matches("README.md"));
        assert!(p.matches("a/b/c/d/e"));
    }

    #[test]
    fn test_double_star_in_middle() {
        let p = pat("apps/**/tests/*.py");
        assert!(p.matches("apps/tests/test_a.py"));
        assert!(p.matches("apps/api/v1/tests/test_a.py"));
        assert!(!p.matches("apps/api/tests/nested/test_a.py"));
    }

    #[test]
    fn test_literals_are_case_sensitive() {
        let p = pat("Docs/**");
        assert!(!p.matches("docs/a.md"));
    }

    #[test]
    fn test_whole_path_must_be_consumed() {
        let p = pat("src/main.rs");
        assert!(p.matches("src/main.rs"));
        assert!(!p.matches("src/main.rs/extra"));
        assert!(!p.matches("src"));
    }

    #[test]
    fn test_question_mark_and_class() {
        let p = pat("v?/[ab]*.txt");
        assert!(p.matches("v1/a.txt"));
        assert!(p.matches("v2/bee.txt"));
        assert!(!p.matches("v10/a.txt"));
        assert!(!p.matches("v1/c.txt"));
    }

    #[test]
    fn test_deep_path_does_not_blow_up() {
        let p = pat("**/a/**/b/**/c");
        let deep: Vec<String> = (0..2000).map(|i| format!("d{}", i)).collect();
        let path = format!("{}/a/b/c", deep.join("/"));
        assert!(p.matches(&path));
    }

    #[test]
    fn test_covers() {
        assert!(pat("**").covers(&pat("a/**")));
        assert!(pat("a/**").covers(&pat("a/b/**")));
        assert!(pat("a/*").covers(&pat("a/b")));
        assert!(pat("**/*.md").covers(&pat("docs/*.md")));
        assert!(pat("*.md").covers(&pat("README*.md")));
        assert!(!pat("a/b/**").covers(&pat("a/**")));
        assert!(!pat("a/*").covers(&pat("a/**")));
        assert!(!pat("*.md").covers(&pat("docs/**")));
    }

    #[test]
    fn test_intersects() {
        assert!(pat("*.md").intersects(&pat("**")));
        assert!(pat("docs/**").intersects(&pat("**/*.md")));
        assert!(pat("a/*/c").intersects(&pat("a/b/*")));
        assert!(!pat("*.md").intersects(&pat("*.rs")));
        assert!(!pat("apps/api/**").intersects(&pat("apps/web/**")));
        assert!(!pat("*.md").intersects(&pat("docs/**")));
    }

    impl CompiledPattern {
        fn with_raw(mut self, raw: &str) -> Self {
            self.raw = raw.to_string();
            self
        }
    }
}
