//! Two-field plain min-cost flow format.
//!
//! ```text
//! <nodes> <arcs>
//! <tail> <head> <capacity> <cost> [<fixed cost>]   (one line per arc)
//! <demand> <best cost>
//! ```
//!
//! The header `0 0` ends the stream.

use std::io::{BufRead, Write};

use crate::generator::mcf::McfCase;
use crate::graph::Network;
use crate::{FuzzError, Result};

pub const MCF_SENTINEL: &str = "0 0";

pub fn write_mcf_case<W: Write + ?Sized>(out: &mut W, case: &McfCase) -> std::io::Result<()> {
    writeln!(out, "{} {}", case.network.node_count(), case.network.arc_count())?;
    for (a, (tail, head)) in case.network.arcs().enumerate() {
        write!(out, "{tail} {head} {} {}", case.capacity[a], case.cost[a])?;
        if let Some(fixed) = &case.fixed_cost {
            write!(out, " {}", fixed[a])?;
        }
        writeln!(out)?;
    }
    writeln!(out, "{} {}", case.demand, case.best_cost)
}

pub fn write_mcf_sentinel<W: Write + ?Sized>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "{MCF_SENTINEL}")
}

fn malformed(line: usize, reason: String) -> FuzzError {
    FuzzError::Malformed {
        line,
        id: "-".to_string(),
        reason,
    }
}

/// Reads plain cases until the `0 0` header or end of input.
pub fn read_mcf_cases<R: BufRead>(input: R) -> Result<Vec<McfCase>> {
    let mut lines = input.lines().enumerate().map(|(i, l)| (i + 1, l));
    let mut next_fields = |what: &str| -> Result<Option<(usize, Vec<i64>)>> {
        for (line_no, line) in lines.by_ref() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fields = line
                .split_whitespace()
                .map(|tok| tok.parse::<i64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| malformed(line_no, format!("{what}: non-integer field")))?;
            return Ok(Some((line_no, fields)));
        }
        Ok(None)
    };

    let mut cases = Vec::new();
    while let Some((line_no, header)) = next_fields("header")? {
        if header.len() != 2 || header[0] < 0 || header[1] < 0 {
            return Err(malformed(line_no, "header must be `<nodes> <arcs>`".to_string()));
        }
        if header == [0, 0] {
            break;
        }
        let (n, m) = (header[0] as usize, header[1] as usize);
        let mut tails = Vec::with_capacity(m);
        let mut heads = Vec::with_capacity(m);
        let mut capacity = Vec::with_capacity(m);
        let mut cost = Vec::with_capacity(m);
        let mut fixed = Vec::with_capacity(m);
        let mut width = None;
        for _ in 0..m {
            let (arc_line, fields) = next_fields("arc")?
                .ok_or_else(|| malformed(line_no, "stream ended inside arc list".to_string()))?;
            let expected = *width.get_or_insert(fields.len());
            if !(expected == 4 || expected == 5) || fields.len() != expected {
                return Err(malformed(arc_line, "arc lines need 4 or 5 consistent fields".to_string()));
            }
            if fields[0] < 0 || fields[1] < 0 {
                return Err(malformed(arc_line, "negative arc endpoint".to_string()));
            }
            tails.push(fields[0] as u32);
            heads.push(fields[1] as u32);
            capacity.push(fields[2]);
            cost.push(fields[3]);
            if expected == 5 {
                fixed.push(fields[4]);
            }
        }
        let (tail_line, trailer) = next_fields("demand")?
            .ok_or_else(|| malformed(line_no, "stream ended before demand line".to_string()))?;
        if trailer.len() != 2 {
            return Err(malformed(tail_line, "expected `<demand> <best cost>`".to_string()));
        }
        let network = Network::new(n, tails, heads).map_err(|err| malformed(line_no, err.to_string()))?;
        cases.push(McfCase {
            network,
            capacity,
            cost,
            fixed_cost: (width == Some(5)).then_some(fixed),
            demand: trailer[0],
            best_cost: trailer[1],
        });
    }
    Ok(cases)
}
