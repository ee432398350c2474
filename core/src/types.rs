//! Shared primitive types used across the entire engine.

/// A jurisdiction value after normalization.
pub type Country = String;

/// A sanctions program code (e.g. "SDGT", "IRAN").
pub type ProgramCode = String;

/// A single cell of a loaded table. `None` means absent (empty in the
/// source file, or unmatched by a left join).
pub type Cell = Option<String>;
