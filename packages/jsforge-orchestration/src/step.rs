//! The fixed pipeline of build steps.
//!
//! Steps execute in series per artifact. Each step knows its on-disk
//! directory suffix (the numbered suffixes are an external contract; other
//! tooling inspects them), whether it applies to bootstrap/JRE artifacts or
//! to non-root artifacts, and its successor.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepKind {
    /// Computes the artifact fingerprint, materializing its cache directory.
    Hash,
    /// Unpacks dependency archives (or copies root source trees).
    Unpack,
    /// javac over the unpacked sources.
    Compile,
    /// Annotation-driven source stripping.
    Strip,
    /// javac over the stripped sources.
    CompileStripped,
    /// Package renaming for artifacts that declare shade mappings.
    Shade,
    /// Java to JavaScript translation.
    Transpile,
    /// Whole-program JavaScript optimization.
    Closure,
    /// Copies the optimized bundle into the request target directory.
    Assemble,
}

impl StepKind {
    pub const FIRST: StepKind = StepKind::Hash;

    pub const ALL: [StepKind; 9] = [
        StepKind::Hash,
        StepKind::Unpack,
        StepKind::Compile,
        StepKind::Strip,
        StepKind::CompileStripped,
        StepKind::Shade,
        StepKind::Transpile,
        StepKind::Closure,
        StepKind::Assemble,
    ];

    /// The slot directory name under the artifact's cache entry.
    pub fn directory_name(self) -> &'static str {
        match self {
            Self::Hash => "0-hash",
            Self::Unpack => "1-unpack",
            Self::Compile => "2-javac-compiled-source",
            Self::Strip => "3-gwt-incompatible-stripped-source",
            Self::CompileStripped => "4-javac-compiled-gwt-incompatible-stripped-source",
            Self::Shade => "shade-output",
            Self::Transpile => "5-transpiled-java-to-javascript",
            Self::Closure => "6-closure-compiler-output",
            Self::Assemble => "7-output-assembler",
        }
    }

    /// Bootstrap and JRE artifacts arrive prebuilt; everything after hashing
    /// is skipped for them.
    pub fn skip_for_bootstrap_or_jre(self) -> bool {
        !matches!(self, Self::Hash)
    }

    /// Only the requested root is optimized and assembled.
    pub fn skip_for_non_root(self) -> bool {
        matches!(self, Self::Closure | Self::Assemble)
    }

    pub fn next(self) -> Option<StepKind> {
        match self {
            Self::Hash => Some(Self::Unpack),
            Self::Unpack => Some(Self::Compile),
            Self::Compile => Some(Self::Strip),
            Self::Strip => Some(Self::CompileStripped),
            Self::CompileStripped => Some(Self::Shade),
            Self::Shade => Some(Self::Transpile),
            Self::Transpile => Some(Self::Closure),
            Self::Closure => Some(Self::Assemble),
            Self::Assemble => None,
        }
    }

    /// Whether a successful run leaves an `output/` payload in the slot.
    /// Hash only records its marker; Assemble writes into the target
    /// directory instead.
    pub fn produces_output(self) -> bool {
        !matches!(self, Self::Hash | Self::Assemble)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hash => "hash",
            Self::Unpack => "unpack",
            Self::Compile => "compile",
            Self::Strip => "strip",
            Self::CompileStripped => "compile-stripped",
            Self::Shade => "shade",
            Self::Transpile => "transpile",
            Self::Closure => "closure",
            Self::Assemble => "assemble",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
