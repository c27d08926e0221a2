//! Line-oriented text formats for instance and result streams.
//!
//! Instance record layout:
//!
//! ```text
//! <id>
//! <nodes> <arcs> <constraints> <difficulty tag> [<difficulty 1> ... <difficulty k-1>]
//! <tail> <head> <capacity> (<unit cost> <fixed cost>) per cost column   (one line per arc)
//! <bound 0> ... <bound k-1>
//! <source> <destination> <demand>
//! <best cost>
//! <flow 0> ... <flow m-1>
//! ```
//!
//! A record whose id is all zeros ends the stream and has no body.
//!
//! The trailing header difficulties for `k >= 2` make the header longer than four
//! tokens, which breaks readers that scan whitespace tokens in a fixed order.
//! [`HeaderStyle::Compact`] writes only the tag; such a header is read back with the tag
//! replicated across all constraints.

use std::io::{BufRead, Write};
use std::str::FromStr;

use crate::graph::Network;
use crate::instance::{is_valid_difficulty, Instance, InstanceId, ResultRecord, SENTINEL_ID};
use crate::{FuzzError, Result};

pub mod mcf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderStyle {
    /// One difficulty per constraint.
    #[default]
    Full,
    /// `n m k d` only.
    Compact,
}

pub fn write_instance<W: Write + ?Sized>(out: &mut W, instance: &Instance) -> std::io::Result<()> {
    write_instance_with(out, instance, HeaderStyle::Full)
}

pub fn write_instance_with<W: Write + ?Sized>(
    out: &mut W,
    instance: &Instance,
    style: HeaderStyle,
) -> std::io::Result<()> {
    writeln!(out, "{}", instance.id)?;
    write!(
        out,
        "{} {} {} {}",
        instance.node_count(),
        instance.arc_count(),
        instance.constraint_count(),
        instance.difficulty_tag()
    )?;
    if style == HeaderStyle::Full {
        for d in instance.difficulty.iter().skip(1) {
            write!(out, " {d}")?;
        }
    }
    writeln!(out)?;

    for (a, (tail, head)) in instance.network.arcs().enumerate() {
        write!(out, "{tail} {head} {}", instance.capacity[a])?;
        for (unit, fixed) in instance.unit_cost.iter().zip(instance.fixed_cost.iter()) {
            write!(out, " {} {}", unit[a], fixed[a])?;
        }
        writeln!(out)?;
    }
    writeln!(out, "{}", join(&instance.bounds))?;
    writeln!(
        out,
        "{} {} {}",
        instance.source, instance.destination, instance.demand
    )?;
    writeln!(out, "{}", instance.best_cost)?;
    writeln!(out, "{}", join(&instance.proof))
}

pub fn write_sentinel<W: Write + ?Sized>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "{SENTINEL_ID}")
}

/// Writes every instance followed by the sentinel.
pub fn write_stream<'a, W, I>(out: &mut W, instances: I) -> std::io::Result<()>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = &'a Instance>,
{
    for instance in instances {
        write_instance(out, instance)?;
    }
    write_sentinel(out)
}

fn join(values: &[i64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_fields<T: FromStr>(line: &str) -> std::result::Result<Vec<T>, String> {
    line.split_whitespace()
        .map(|tok| tok.parse::<T>().map_err(|_| format!("cannot parse field {tok:?}")))
        .collect()
}

/// Streams instances until the sentinel record or end of input.
#[derive(Debug)]
pub struct InstanceReader<R> {
    input: R,
    line: usize,
    finished: bool,
}

impl<R: BufRead> InstanceReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            line: 0,
            finished: false,
        }
    }

    /// Number of lines consumed so far.
    pub fn line(&self) -> usize {
        self.line
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        self.line += 1;
        Ok(Some(buf))
    }

    fn malformed(&self, id: &str, reason: impl Into<String>) -> FuzzError {
        FuzzError::Malformed {
            line: self.line,
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    fn body_line(&mut self, id: &str, what: &str) -> Result<String> {
        match self.next_line()? {
            Some(line) => Ok(line),
            None => Err(self.malformed(id, format!("stream ended before the {what} line"))),
        }
    }

    fn body_fields<T: FromStr>(&mut self, id: &str, what: &str, expected: Option<usize>) -> Result<Vec<T>> {
        let line = self.body_line(id, what)?;
        let fields = parse_fields::<T>(&line).map_err(|reason| self.malformed(id, format!("{what}: {reason}")))?;
        if let Some(expected) = expected {
            if fields.len() != expected {
                return Err(self.malformed(
                    id,
                    format!("{what} has {} fields, expected {expected}", fields.len()),
                ));
            }
        }
        Ok(fields)
    }

    pub fn read_instance(&mut self) -> Result<Option<Instance>> {
        if self.finished {
            return Ok(None);
        }
        let id_line = loop {
            match self.next_line()? {
                None => {
                    self.finished = true;
                    return Ok(None);
                }
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => break line,
            }
        };
        let token = id_line.split_whitespace().next().unwrap_or_default();
        let id = InstanceId::parse(token).map_err(|err| self.malformed(token, err.to_string()))?;
        if id.is_sentinel() {
            self.finished = true;
            return Ok(None);
        }
        let id_str = id.as_str().to_string();
        let id_ref = id_str.as_str();

        let header = self.body_line(id_ref, "header")?;
        let header_fields: Vec<&str> = header.split_whitespace().collect();
        if header_fields.len() < 4 {
            return Err(self.malformed(id_ref, "header needs nodes, arcs, constraints and difficulty"));
        }
        let counts = parse_fields::<usize>(&header_fields[..3].join(" "))
            .map_err(|reason| self.malformed(id_ref, format!("header: {reason}")))?;
        let (n, m, k) = (counts[0], counts[1], counts[2]);
        let difficulties = parse_fields::<f64>(&header_fields[3..].join(" "))
            .map_err(|reason| self.malformed(id_ref, format!("header: {reason}")))?;
        let difficulty = match (k, difficulties.len()) {
            (0, _) => Vec::new(),
            (k, len) if len == k => difficulties,
            // four-field header: only the primary tag survived
            (k, 1) => vec![difficulties[0]; k],
            (k, len) => {
                return Err(self.malformed(
                    id_ref,
                    format!("header carries {len} difficulties for {k} constraints"),
                ))
            }
        };

        let columns = k.max(1);
        let mut tails = Vec::with_capacity(m);
        let mut heads = Vec::with_capacity(m);
        let mut capacity = Vec::with_capacity(m);
        let mut unit_cost = vec![Vec::with_capacity(m); columns];
        let mut fixed_cost = vec![Vec::with_capacity(m); columns];
        for _ in 0..m {
            let fields = self.body_fields::<i64>(id_ref, "arc", Some(3 + 2 * columns))?;
            let tail = u32::try_from(fields[0]).map_err(|_| self.malformed(id_ref, "negative arc tail"))?;
            let head = u32::try_from(fields[1]).map_err(|_| self.malformed(id_ref, "negative arc head"))?;
            tails.push(tail);
            heads.push(head);
            capacity.push(fields[2]);
            for col in 0..columns {
                unit_cost[col].push(fields[3 + 2 * col]);
                fixed_cost[col].push(fields[4 + 2 * col]);
            }
        }

        let bounds = self.body_fields::<i64>(id_ref, "bounds", Some(k))?;
        let endpoints = self.body_fields::<i64>(id_ref, "endpoints", Some(3))?;
        let best = self.body_fields::<i64>(id_ref, "best cost", None)?;
        let best_cost = *best
            .first()
            .ok_or_else(|| self.malformed(id_ref, "best cost line is empty"))?;
        let proof = self.body_fields::<i64>(id_ref, "proof", Some(m))?;

        let source = u32::try_from(endpoints[0]).map_err(|_| self.malformed(id_ref, "negative source"))?;
        let destination =
            u32::try_from(endpoints[1]).map_err(|_| self.malformed(id_ref, "negative destination"))?;
        let network = Network::new(n, tails, heads).map_err(|err| self.malformed(id_ref, err.to_string()))?;

        let instance = Instance {
            id,
            network,
            difficulty,
            capacity,
            unit_cost,
            fixed_cost,
            bounds,
            source,
            destination,
            demand: endpoints[2],
            best_cost,
            proof,
        };
        instance
            .check_shape()
            .map_err(|err| self.malformed(id_ref, err.to_string()))?;
        Ok(Some(instance))
    }
}

impl<R: BufRead> Iterator for InstanceReader<R> {
    type Item = Result<Instance>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.read_instance().transpose();
        if matches!(item, Some(Err(_))) {
            self.finished = true;
        }
        item
    }
}

/// Reads a whole instance stream.
pub fn read_instances<R: BufRead>(input: R) -> Result<Vec<Instance>> {
    InstanceReader::new(input).collect()
}

/// Parses one result line:
/// `id difficulty exact_cost constraints mcf_cost mcf_satisfied approx_cost approx_satisfied`.
pub fn parse_result_record(line: &str, line_no: usize) -> Result<ResultRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let id_token = fields.first().copied().unwrap_or_default();
    let malformed = |reason: String| FuzzError::Malformed {
        line: line_no,
        id: id_token.to_string(),
        reason,
    };
    if fields.len() != 8 {
        return Err(malformed(format!("result line has {} fields, expected 8", fields.len())));
    }
    let id = InstanceId::parse(id_token).map_err(|err| malformed(err.to_string()))?;
    let difficulty = fields[1]
        .parse::<f64>()
        .map_err(|_| malformed(format!("cannot parse difficulty {:?}", fields[1])))?;
    if !is_valid_difficulty(difficulty) {
        return Err(malformed(format!("difficulty {difficulty} outside [0, 1]")));
    }
    let costs = parse_fields::<i64>(&fields[2..].join(" ")).map_err(malformed)?;
    let count = |value: i64, what: &str| {
        usize::try_from(value).map_err(|_| malformed(format!("negative {what}")))
    };
    let record = ResultRecord {
        id,
        difficulty,
        best_cost: costs[0],
        constraint_count: count(costs[1], "constraint count")?,
        mcf_cost: costs[2],
        mcf_satisfied: count(costs[3], "satisfied count")?,
        approx_cost: costs[4],
        approx_satisfied: count(costs[5], "satisfied count")?,
    };
    if record.mcf_satisfied > record.constraint_count
        || record.approx_satisfied > record.constraint_count
    {
        return Err(malformed(format!(
            "satisfied counts exceed {} constraints",
            record.constraint_count
        )));
    }
    Ok(record)
}

/// Streams result records, one per non-blank line.
#[derive(Debug)]
pub struct ResultReader<R> {
    input: R,
    line: usize,
}

impl<R: BufRead> ResultReader<R> {
    pub fn new(input: R) -> Self {
        Self { input, line: 0 }
    }

    /// Returns the raw line alongside the parsed record.
    pub fn read_raw(&mut self) -> Result<Option<(String, ResultRecord)>> {
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.input.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            if !buf.trim().is_empty() {
                break;
            }
        }
        let record = parse_result_record(&buf, self.line)?;
        Ok(Some((buf.trim_end().to_string(), record)))
    }
}

impl<R: BufRead> Iterator for ResultReader<R> {
    type Item = Result<ResultRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_raw()
            .map(|raw| raw.map(|(_, record)| record))
            .transpose()
    }
}
