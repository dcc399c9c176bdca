//! Output rendering for command results
//!
//! Every view renders to pretty JSON with `to_json` and to a human form with
//! `to_human` (plus markdown flavours for impacted services). Service
//! metadata only decorates output.

mod impacted;
mod lint;
mod owner;

pub use impacted::{ImpactFormat, ImpactOutput, ImpactView, ServiceFiles};
pub use lint::{LintFormat, LintOutput};
pub use owner::{OwnerFormat, OwnerOutput, RuleRef};

/// `n file` / `n files`
pub(crate) fn file_count(n: usize) -> String {
    if n == 1 {
        "1 file".to_string()
    } else {
        format!("{} files", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_count() {
        assert_eq!(file_count(0), "0 files");
        assert_eq!(file_count(1), "1 file");
        assert_eq!(file_count(7), "7 files");
    }
}
