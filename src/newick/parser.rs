//! Recursive descent parser for single-line bracket-notation trees.
//!
//! This module provides the [NewickParser], which builds a [PhyloTree] from
//! strings such as `((1:0.1,2:0.2)4:0.3,3:0.4)5;`. Unlike plain binary
//! Newick, trees in reports are multifurcating (the root is usually a
//! trifurcation) and internal vertices may be labelled with node numbers.

use crate::model::tree::{PhyloTree, VertexIndex};
use crate::newick::defs::{DEFAULT_NUM_VERTICES_GUESS, NEWICK_LABEL_DELIMITERS};
use crate::parser::byte_parser::ByteParser;
use crate::parser::parsing_error::ParsingError;
use crate::parser::utils::parse_number;

// =#========================================================================#=
// NEWICK PARSER
// =#========================================================================$=
/// Parser for bracket-notation trees with any number of children per vertex.
///
/// # Grammar
/// ```text
/// tree     := vertex ';'
/// vertex   := '(' vertex (',' vertex)* ')' [label] [':' length]
///           | label [':' length]
/// ```
///
/// # Example
/// ```
/// use pamlwick::newick::NewickParser;
/// use pamlwick::parser::ByteParser;
///
/// let mut byte_parser = ByteParser::for_str("((human:0.1,chimp:0.2)5:0.05,gorilla:0.3,orang:0.6);");
/// let tree = NewickParser::new().parse_str(&mut byte_parser).unwrap();
/// assert_eq!(tree.num_leaves(), 4);
/// assert_eq!(tree.root().children().len(), 3);
/// ```
#[derive(Debug)]
pub struct NewickParser {
    num_vertices: usize,
}

impl Default for NewickParser {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Construction & API Parsing (pub)
// ============================================================================
impl NewickParser {
    /// Creates a new [NewickParser] with a default size guess.
    pub fn new() -> Self {
        Self {
            num_vertices: DEFAULT_NUM_VERTICES_GUESS,
        }
    }

    /// Sets the expected number of leaves in each parsed tree.
    ///
    /// This allows pre-allocation of the arena. If not set,
    /// the size of the previously parsed tree is used.
    pub fn with_num_leaves(mut self, num_leaves: usize) -> Self {
        self.num_vertices = 2 * num_leaves;
        self
    }

    /// Parses a single tree from the given [ByteParser].
    ///
    /// # Arguments
    /// * `parser` - The byte parser positioned at the start of a tree string
    ///
    /// # Returns
    /// * `Ok(PhyloTree)` - The parsed tree
    /// * `Err(ParsingError)` - If the string is not valid bracket notation
    pub fn parse_str(&mut self, parser: &mut ByteParser) -> Result<PhyloTree, ParsingError> {
        let mut tree = PhyloTree::with_capacity(self.num_vertices);
        let root = self.parse_vertex(parser, &mut tree)?;

        parser.skip_whitespace();
        if !parser.consume_if(b';') {
            let next_char = parser.peek().map(char::from);
            return Err(parser.error(format!(
                "Expected ';' at end of tree but found {:?}",
                next_char
            )));
        }

        tree.set_root(root);
        self.num_vertices = tree.num_vertices();
        Ok(tree)
    }
}

// ============================================================================
// Parsing
// ============================================================================
impl NewickParser {
    /// Parses a vertex (internal or leaf) together with its label and
    /// branch length, adds it to the tree and returns its index.
    fn parse_vertex(
        &mut self,
        parser: &mut ByteParser,
        tree: &mut PhyloTree,
    ) -> Result<VertexIndex, ParsingError> {
        parser.skip_whitespace();
        let children = if parser.peek_is(b'(') {
            Some(self.parse_children(parser, tree)?)
        } else {
            None
        };

        let label = parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
        let label = (!label.is_empty()).then_some(label);
        let branch_length = Self::parse_branch_length(parser)?;

        let index = match children {
            Some(children) => tree.add_internal(children, label, branch_length),
            None if label.is_none() && !parser.peek_is(b',') && !parser.peek_is(b')') => {
                let next_char = parser.peek().map(char::from);
                return Err(parser.error(format!("Expected vertex but found {:?}", next_char)));
            }
            None => tree.add_leaf(label, branch_length),
        };
        Ok(index)
    }

    /// Parses `(vertex, vertex, ...)` and returns the child indices in written order.
    fn parse_children(
        &mut self,
        parser: &mut ByteParser,
        tree: &mut PhyloTree,
    ) -> Result<Vec<VertexIndex>, ParsingError> {
        parser.consume_if(b'(');
        let mut children = vec![self.parse_vertex(parser, tree)?];

        loop {
            parser.skip_whitespace();
            match parser.next_byte() {
                Some(b',') => children.push(self.parse_vertex(parser, tree)?),
                Some(b')') => return Ok(children),
                other => {
                    return Err(parser.error(format!(
                        "Expected ',' or ')' between children but found {:?}",
                        other.map(char::from)
                    )));
                }
            }
        }
    }

    /// Parses optional branch length `[:number]`.
    ///
    /// # Returns
    /// - `Ok(Some(branch_length))` if found a branch length and was able to parse it
    /// - `Ok(None)` if no branch length found
    /// - [ParsingError] if it couldn't parse branch length value
    fn parse_branch_length(parser: &mut ByteParser) -> Result<Option<f64>, ParsingError> {
        parser.skip_whitespace();
        if !parser.consume_if(b':') {
            return Ok(None);
        }
        parser.skip_whitespace();

        let token = parser.parse_number_token();
        match parse_number(token) {
            Some(value) => Ok(Some(value)),
            None => Err(parser.error(format!("Invalid branch length: {:?}", token))),
        }
    }
}
