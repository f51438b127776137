//! File-tree transforms central to cache correctness: the ignore-aware
//! stripping copy and the package-renaming shade.

pub mod shade;
pub mod strip;
