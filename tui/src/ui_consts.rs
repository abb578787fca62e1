//! Shared layout constants for the composer UI.

/// Columns reserved on the left of the input for the `›` prompt glyph.
pub(crate) const LIVE_PREFIX_COLS: u16 = 2;

/// Indentation applied to footer hint rows.
pub(crate) const FOOTER_INDENT_COLS: usize = 2;
