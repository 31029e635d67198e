//! Reads instances from the line oriented text format
//!
//! ```text
//! o i a                                  orders, items, aisles
//! k item_1 qty_1 ... item_k qty_k        one line per order
//! l item_1 qty_1 ... item_l qty_l        one line per aisle
//! LB UB                                  bounds on the wave size
//! ```
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use thiserror::Error;

use crate::io::IoError;
use crate::wave::instance::{
    total_units, Aisle, Instance, InstanceBuilder, ItemId, Order, MAX_TOTAL_UNITS,
};

/// Read an instance file
pub fn read_instance<P: AsRef<Path>>(path: P) -> Result<Instance, IoError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_instance(&text).map_err(|source| IoError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse the text of an instance
///
/// Line numbers in errors start at 1.
///
/// # Examples
/// ```rust
/// use wavepick_core::io::instance_text::parse_instance;
/// let instance = parse_instance("2 1 2\n1 0 3\n1 0 2\n1 0 3\n1 0 2\n2 5\n").unwrap();
/// assert_eq!(instance.orders().len(), 2);
/// assert_eq!(instance.upper_bound(), 5);
/// ```
pub fn parse_instance(text: &str) -> Result<Instance, ParseError> {
    let mut lines = InstanceLines::new(text);

    let (line, values) = lines.next_numbers("header")?;
    if values.len() != 3 {
        return Err(ParseError::TokenCount {
            line,
            expected: 3,
            found: values.len(),
        });
    }
    let (order_count, item_count, aisle_count) = (
        to_usize(line, values[0])?,
        to_usize(line, values[1])?,
        to_usize(line, values[2])?,
    );

    // Running totals stay within MAX_TOTAL_UNITS, so every later sum of units is exact
    let mut demanded = 0;
    let mut orders = Vec::new();
    for id in 0..order_count {
        let (line, demand) = lines.next_quantities("order")?;
        demanded = add_units(demanded, demand.values(), line)?;
        orders.push(Order::new(id, demand));
    }
    let mut supplied = 0;
    let mut aisles = Vec::new();
    for id in 0..aisle_count {
        let (line, supply) = lines.next_quantities("aisle")?;
        supplied = add_units(supplied, supply.values(), line)?;
        aisles.push(Aisle::new(id, supply));
    }

    let (line, bounds) = lines.next_numbers("bounds")?;
    if bounds.len() != 2 {
        return Err(ParseError::TokenCount {
            line,
            expected: 2,
            found: bounds.len(),
        });
    }
    let (lower_bound, upper_bound) = (bounds[0], bounds[1]);
    if lower_bound > upper_bound {
        return Err(ParseError::InvalidBounds {
            lower_bound,
            upper_bound,
        });
    }
    lines.expect_end()?;

    InstanceBuilder::default()
        .orders(orders)
        .aisles(aisles)
        .declared_item_count(item_count)
        .lower_bound(lower_bound)
        .upper_bound(upper_bound)
        .build()
        .map_err(|err| ParseError::InvalidInstance(err.to_string()))
}

/// Walks the lines of an instance, keeping track of line numbers
struct InstanceLines<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> InstanceLines<'a> {
    fn new(text: &'a str) -> Self {
        InstanceLines {
            lines: text.lines().enumerate(),
        }
    }

    /// Parse the next line into numbers, returning the line number with them
    fn next_numbers(&mut self, expected: &'static str) -> Result<(usize, Vec<u64>), ParseError> {
        let Some((index, line)) = self.lines.next() else {
            return Err(ParseError::MissingLine { expected });
        };
        let line_number = index + 1;
        let numbers = line
            .split_whitespace()
            .map(|token| {
                token.parse::<u64>().map_err(|_| ParseError::InvalidToken {
                    line: line_number,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if numbers.is_empty() {
            return Err(ParseError::EmptyLine {
                line: line_number,
                expected,
            });
        }
        Ok((line_number, numbers))
    }

    /// Parse a `count item qty ...` line into an item map
    ///
    /// A repeated item keeps its last quantity.
    fn next_quantities(
        &mut self,
        expected: &'static str,
    ) -> Result<(usize, IndexMap<ItemId, u64>), ParseError> {
        let (line, numbers) = self.next_numbers(expected)?;
        let count = to_usize(line, numbers[0])?;
        let pairs = &numbers[1..];
        if count.checked_mul(2) != Some(pairs.len()) {
            return Err(ParseError::TokenCount {
                line,
                expected: count.saturating_mul(2).saturating_add(1),
                found: numbers.len(),
            });
        }
        let quantities = pairs
            .chunks_exact(2)
            .map(|pair| to_usize(line, pair[0]).map(|item| (item, pair[1])))
            .collect::<Result<_, _>>()?;
        Ok((line, quantities))
    }

    /// Only blank lines may follow the bounds
    fn expect_end(&mut self) -> Result<(), ParseError> {
        match self.lines.find(|(_, line)| !line.trim().is_empty()) {
            Some((index, _)) => Err(ParseError::TrailingContent { line: index + 1 }),
            None => Ok(()),
        }
    }
}

fn add_units<'a>(
    total: u64,
    quantities: impl IntoIterator<Item = &'a u64>,
    line: usize,
) -> Result<u64, ParseError> {
    let quantities = total_units(quantities).ok_or(ParseError::TooManyUnits {
        line,
        limit: MAX_TOTAL_UNITS,
    })?;
    total
        .checked_add(quantities)
        .filter(|&t| t <= MAX_TOTAL_UNITS)
        .ok_or(ParseError::TooManyUnits {
            line,
            limit: MAX_TOTAL_UNITS,
        })
}

fn to_usize(line: usize, value: u64) -> Result<usize, ParseError> {
    usize::try_from(value).map_err(|_| ParseError::InvalidToken {
        line,
        token: value.to_string(),
    })
}

/// Errors found in the text of an instance
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The file ended before all declared lines were read
    #[error("Missing {expected} line, the file ended early")]
    MissingLine { expected: &'static str },
    /// A line that should hold numbers is blank
    #[error("Line {line} is empty, expected the {expected} line")]
    EmptyLine { line: usize, expected: &'static str },
    /// A token isn't a non-negative integer
    #[error("Line {line}: `{token}` is not a non-negative integer")]
    InvalidToken { line: usize, token: String },
    /// A line holds the wrong number of tokens
    #[error("Line {line}: expected {expected} tokens, found {found}")]
    TokenCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    /// Content follows the bounds line
    #[error("Line {line}: unexpected content after the bounds line")]
    TrailingContent { line: usize },
    /// The orders, or the aisles, hold more units than can be optimized exactly
    #[error("Line {line}: total units exceed {limit}")]
    TooManyUnits { line: usize, limit: u64 },
    /// The lower bound exceeds the upper bound
    #[error("Lower bound {lower_bound} exceeds upper bound {upper_bound}")]
    InvalidBounds { lower_bound: u64, upper_bound: u64 },
    /// The parsed values don't form a valid instance
    #[error("Invalid instance: {0}")]
    InvalidInstance(String),
}
