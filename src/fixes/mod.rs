//! Fix synthesis
//!
//! Applies registered patches for auto-fixable findings and produces the
//! improved source.
//!
//! # Ordering and conflicts
//!
//! Every patch returns a [`LineEdit`] against the pre-fix snapshot, so line
//! numbers never shift while edits are collected. Candidates are visited by
//! priority (severity, then line, then rule ID). Each anchor line accepts at
//! most `max_auto_fixes_per_line` edits, and an edit that overlaps one
//! already accepted is rejected. Rejected and declined findings are marked
//! `unresolved` with the reason; applied ones are marked `resolved`.
//! Accepted edits are spliced in ascending line order.
//!
//! Patches preserve syntactic validity of the construct they touch. They do
//! not prove semantic equivalence.

mod base;
mod comprehension;
mod type_hints;
mod unbound_variable;
mod whitespace;

pub use base::{LineEdit, Patch};
pub use comprehension::ComprehensionPatch;
pub use type_hints::TypeHintStubPatch;
pub use unbound_variable::InitializeUnboundPatch;
pub use whitespace::{ExpandTabsPatch, TrimTrailingPatch};

use crate::cancel::CancellationToken;
use crate::error::{Result, ReviewError};
use crate::models::Finding;
use crate::normalizer::{LineEnding, SourceFile};
use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Result of one synthesis pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    pub improved_code: String,
    pub applied: usize,
    pub unresolved: usize,
}

/// All built-in patches
pub fn default_patches() -> Vec<Arc<dyn Patch>> {
    vec![
        Arc::new(InitializeUnboundPatch),
        Arc::new(ComprehensionPatch),
        Arc::new(TypeHintStubPatch),
        Arc::new(ExpandTabsPatch),
        Arc::new(TrimTrailingPatch),
    ]
}

/// Registry of patches keyed by rule ID
pub struct FixSynthesizer {
    patches: BTreeMap<&'static str, Arc<dyn Patch>>,
    max_per_line: usize,
}

impl FixSynthesizer {
    /// Empty registry
    pub fn new(max_per_line: usize) -> Self {
        Self {
            patches: BTreeMap::new(),
            max_per_line: max_per_line.max(1),
        }
    }

    /// Registry holding every built-in patch
    pub fn with_default_patches(max_per_line: usize) -> Self {
        let mut synth = Self::new(max_per_line);
        for patch in default_patches() {
            synth.register(patch);
        }
        synth
    }

    pub fn register(&mut self, patch: Arc<dyn Patch>) {
        self.patches.insert(patch.rule_id(), patch);
    }

    pub fn has_patch(&self, rule_id: &str) -> bool {
        self.patches.contains_key(rule_id)
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.patches.keys().copied()
    }

    /// Apply patches for the auto-fixable findings, recording the outcome on
    /// each of them. Returns the original text untouched when nothing was
    /// applied.
    pub fn synthesize(
        &self,
        source: &SourceFile,
        findings: &mut [Finding],
        cancel: &CancellationToken,
    ) -> Result<FixOutcome> {
        let mut candidates: Vec<usize> = (0..findings.len())
            .filter(|&i| findings[i].auto_fixable)
            .collect();
        candidates.sort_by(|&a, &b| {
            let (fa, fb) = (&findings[a], &findings[b]);
            fb.kind
                .cmp(&fa.kind)
                .then_with(|| fa.line.cmp(&fb.line))
                .then_with(|| fa.rule_id.cmp(&fb.rule_id))
                .then_with(|| fa.message.cmp(&fb.message))
        });

        let mut per_line: HashMap<u32, usize> = HashMap::new();
        let mut accepted: Vec<(LineEdit, usize)> = Vec::new();
        let mut unresolved = 0;

        for idx in candidates {
            if cancel.is_cancelled() {
                return Err(ReviewError::Cancelled);
            }

            let reason = match self.try_patch(source, &findings[idx], &per_line, &accepted) {
                Ok(edit) => {
                    debug!(
                        "Accepted {} fix at line {}",
                        findings[idx].rule_id, findings[idx].line
                    );
                    *per_line.entry(findings[idx].line).or_insert(0) += 1;
                    accepted.push((edit, idx));
                    continue;
                }
                Err(reason) => reason,
            };

            debug!(
                "Unresolved {} fix at line {}: {}",
                findings[idx].rule_id, findings[idx].line, reason
            );
            findings[idx].unresolved = Some(reason);
            unresolved += 1;
        }

        for (_, idx) in &accepted {
            findings[*idx].resolved = true;
        }

        let applied = accepted.len();
        let improved_code = if accepted.is_empty() {
            source.raw().to_string()
        } else {
            apply_edits(source, accepted.into_iter().map(|(edit, _)| edit).collect())
        };

        info!("Fixes: {} applied, {} unresolved", applied, unresolved);
        Ok(FixOutcome {
            improved_code,
            applied,
            unresolved,
        })
    }

    fn try_patch(
        &self,
        source: &SourceFile,
        finding: &Finding,
        per_line: &HashMap<u32, usize>,
        accepted: &[(LineEdit, usize)],
    ) -> std::result::Result<LineEdit, String> {
        if per_line.get(&finding.line).copied().unwrap_or(0) >= self.max_per_line {
            return Err(format!(
                "conflicts with a higher-priority fix on line {}",
                finding.line
            ));
        }

        let Some(patch) = self.patches.get(finding.rule_id.as_str()) else {
            return Err(format!("no patch registered for rule '{}'", finding.rule_id));
        };

        let edit = match panic::catch_unwind(AssertUnwindSafe(|| patch.patch(source, finding))) {
            Ok(Some(edit)) => edit,
            Ok(None) => return Err("not applicable".to_string()),
            Err(panic_info) => {
                let msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                error!("Patch for {} panicked: {}", finding.rule_id, msg);
                return Err("not applicable".to_string());
            }
        };

        if edit.start > edit.end || edit.end > source.line_count() {
            return Err("not applicable".to_string());
        }

        if let Some((other, _)) = accepted.iter().find(|(e, _)| e.conflicts_with(&edit)) {
            let (first, last) = other.span();
            return Err(format!(
                "overlaps a higher-priority fix on lines {}-{}",
                first, last
            ));
        }

        Ok(edit)
    }
}

/// Splice non-conflicting edits into the snapshot in ascending order
fn apply_edits(source: &SourceFile, mut edits: Vec<LineEdit>) -> String {
    // Stable: insertions at the same position keep acceptance order
    edits.sort_by_key(|e| (e.start, e.end));

    let lines = source.lines();
    let endings = source.line_endings();
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + edits.len());
    let mut out_endings: Vec<LineEnding> = Vec::with_capacity(lines.len() + edits.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.start > cursor {
            out.extend_from_slice(&lines[cursor..edit.start]);
            out_endings.extend_from_slice(&endings[cursor..edit.start]);
        }
        // New lines end like the last line they replace, or the line they precede
        let ending = if edit.end > edit.start {
            endings.get(edit.end - 1)
        } else {
            endings.get(edit.start)
        }
        .copied()
        .unwrap_or(source.line_ending());
        out_endings.extend(std::iter::repeat(ending).take(edit.replacement.len()));
        out.extend(edit.replacement);
        cursor = cursor.max(edit.end);
    }
    if cursor < lines.len() {
        out.extend_from_slice(&lines[cursor..]);
        out_endings.extend_from_slice(&endings[cursor..]);
    }
    source.join_lines(&out, &out_endings)
}
