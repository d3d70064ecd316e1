//! Constants for reading and writing bracket notation.

/// Label delimiters: parentheses, comma, colon, semicolon, whitespace
pub(crate) const NEWICK_LABEL_DELIMITERS: &[u8] = b"(,:; \n\t\r)";

/// Default guess for number of vertices, when unknown
pub(crate) const DEFAULT_NUM_VERTICES_GUESS: usize = 16;

/// Characters per vertex assumed when pre-allocating output strings
pub(crate) const CHARS_PER_VERTEX_GUESS: usize = 12;
