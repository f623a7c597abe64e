//! The checked, immutable result of a compilation.

use quill_types::ast::Expr;
use quill_types::Kind;
use sha2::{Digest, Sha256};

use crate::options::Options;

/// A compiled expression, ready to run any number of times.
///
/// `Program` never changes after [`compile`](crate::compile) returns and is
/// shared freely between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    source: String,
    expr: Expr,
    kind: Kind,
    fingerprint: String,
}

impl Program {
    pub(crate) fn new(source: &str, expr: Expr, options: &Options) -> Self {
        Self {
            source: source.to_string(),
            kind: expr.ty.clone(),
            fingerprint: fingerprint(source, options),
            expr,
        }
    }

    /// Source text the program was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Checked tree. Every node carries its kind.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Static kind of the result.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// SHA-256 of the source and the options it was compiled with, as hex.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn fingerprint(source: &str, options: &Options) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update([0u8]);
    // Options serialize deterministically: descriptors are ordered maps.
    if let Ok(encoded) = serde_json::to_vec(options) {
        hasher.update(&encoded);
    }
    format!("{:x}", hasher.finalize())
}
