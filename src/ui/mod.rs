//! Console output.
//!
//! Everything renders to a `String` so the binary decides where it goes and
//! tests can inspect it. Logs go to stderr; these reports go to stdout.

mod progress;
mod section;
mod summary;

pub use progress::batch_progress;
pub use section::Section;
pub use summary::{render_estimate, render_ledger, render_ledger_entry, render_report, render_tree};

use std::io::IsTerminal;

/// Whether stdout should get ANSI colors (`NO_COLOR` disables them).
pub fn stdout_supports_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}
