//! Per-file action selection

use crate::core::config::Config;
use crate::scanner::FileKind;
use crate::store::ActionKind;
use rand::Rng;

/// Rewrite with probability `percent-rewrite` for code-like files when
/// rewrites are enabled; summarize everything else.
pub fn choose_action<R: Rng + ?Sized>(config: &Config, kind: FileKind, rng: &mut R) -> ActionKind {
    if kind != FileKind::Code || !config.rewrite_enabled() {
        return ActionKind::Summarize;
    }
    if rng.gen_range(1..=100u8) <= config.percent_rewrite {
        ActionKind::Rewrite
    } else {
        ActionKind::Summarize
    }
}
