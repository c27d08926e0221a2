use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use fcnfp_fuzz_core::analysis::{AccuracyAnalyzer, AccuracyReport, Observation};
use fcnfp_fuzz_core::codec::mcf::{write_mcf_case, write_mcf_sentinel};
use fcnfp_fuzz_core::codec::{
    write_instance_with, write_sentinel, HeaderStyle, InstanceReader, ResultReader,
};
use fcnfp_fuzz_core::filter::HardCaseFilter;
use fcnfp_fuzz_core::generator::mcf::{generate_mcf_case, McfCaseParams};
use fcnfp_fuzz_core::generator::{GeneratorConfig, GeneratorParams, ProblemGenerator};
use fcnfp_fuzz_core::oracle::MilpOracle;
use fcnfp_fuzz_core::verify::{reoptimize_instance, verify_instance};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};

use crate::config::SweepConfig;

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    let seed = seed.unwrap_or_else(rand::random);
    info!(seed, "seeding generator");
    StdRng::seed_from_u64(seed)
}

pub fn generate(
    params: &GeneratorParams,
    count: usize,
    seed: Option<u64>,
    max_attempts: usize,
    append: bool,
    style: HeaderStyle,
) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if params.nodes == 0 {
        write_sentinel(&mut out)?;
        out.flush()?;
        return Ok(());
    }

    let config = GeneratorConfig {
        max_attempts,
        ..GeneratorConfig::default()
    };
    let generator = ProblemGenerator::with_config(MilpOracle, &config);
    let mut rng = seeded_rng(seed);
    let mut written = 0;
    for _ in 0..count {
        if let Some(instance) = generator.generate(&mut rng, params)? {
            write_instance_with(&mut out, &instance, style)?;
            written += 1;
        }
    }
    if !append {
        write_sentinel(&mut out)?;
    }
    out.flush()?;
    info!(requested = count, written, "generation finished");
    Ok(())
}

pub fn generate_mcf(params: &McfCaseParams, count: usize, seed: Option<u64>, append: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if params.nodes == 0 {
        write_mcf_sentinel(&mut out)?;
        out.flush()?;
        return Ok(());
    }

    let generator = ProblemGenerator::new(MilpOracle);
    let mut rng = seeded_rng(seed);
    for _ in 0..count {
        let case = generate_mcf_case(generator.oracle(), generator.sampler(), &mut rng, params)?;
        write_mcf_case(&mut out, &case)?;
    }
    if !append {
        write_mcf_sentinel(&mut out)?;
    }
    out.flush()?;
    Ok(())
}

pub fn sweep(path: &Path, style: HeaderStyle) -> Result<()> {
    let config = SweepConfig::from_file(path)?;
    let jobs = config.jobs();
    info!(jobs = jobs.len(), seed = config.seed, "starting sweep");

    let generator = ProblemGenerator::with_config(MilpOracle, &config.generator);
    let results = generator.generate_batch(&jobs);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut written = 0;
    for (index, result) in results.into_iter().enumerate() {
        match result.with_context(|| format!("Sweep job #{} failed", index + 1))? {
            Some(instance) => {
                write_instance_with(&mut out, &instance, style)?;
                written += 1;
            }
            None => warn!(job = index + 1, seed = jobs[index].seed, "job skipped"),
        }
    }
    write_sentinel(&mut out)?;
    out.flush()?;
    info!(written, skipped = jobs.len() - written, "sweep finished");
    Ok(())
}

pub fn filter(data: &Path, results: &Path, tolerance: f64) -> Result<()> {
    let problems = open(data)?;
    let records = open(results)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let summary = HardCaseFilter::new(tolerance)
        .run(problems, records, &mut out)
        .with_context(|| format!("Failed to filter {}", data.display()))?;
    out.flush()?;
    info!(seen = summary.seen, hard = summary.hard, "filter finished");
    Ok(())
}

pub fn analyze(results: Option<&Path>, outlier_ratio: f64, json: bool) -> Result<()> {
    let input: Box<dyn BufRead> = match results {
        Some(path) => Box::new(open(path)?),
        None => Box::new(io::stdin().lock()),
    };
    let mut reader = ResultReader::new(input);
    let mut analyzer = AccuracyAnalyzer::new(outlier_ratio);
    let mut outlier_lines = Vec::new();
    while let Some((raw, record)) = reader.read_raw()? {
        if let Observation::Outlier { .. } = analyzer.record(&record) {
            outlier_lines.push(raw);
        }
    }
    let report = analyzer.report();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if json {
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        write_table(&mut out, &report)?;
        if !outlier_lines.is_empty() {
            writeln!(out, "outliers (ratio > {outlier_ratio}):")?;
            for line in &outlier_lines {
                writeln!(out, "{line}")?;
            }
        }
    }
    out.flush()?;

    if !report.success_rate_is_non_increasing() {
        warn!("success rate rises with difficulty");
    }
    if !report.violations.is_empty() {
        bail!(
            "{} records report a cost below the exact optimum",
            report.violations.len()
        );
    }
    Ok(())
}

fn write_table<W: Write>(out: &mut W, report: &AccuracyReport) -> io::Result<()> {
    writeln!(
        out,
        "{:>10} {:>10} {:>7} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "difficulty", "-log2(1-d)", "trials", "success", "mcf", "p50", "p75", "p95", "p99"
    )?;
    for bucket in &report.buckets {
        write!(
            out,
            "{:>10} {:>10.4} {:>7} {:>8.4} {:>8.4}",
            bucket.difficulty,
            bucket.transformed,
            bucket.trials,
            bucket.success_rate,
            bucket.mcf_success_rate
        )?;
        match bucket.ratio_quantiles {
            Some(quantiles) => {
                for q in quantiles {
                    write!(out, " {q:>8.4}")?;
                }
            }
            None => {
                for _ in 0..4 {
                    write!(out, " {:>8}", "-")?;
                }
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn verify(data: &Path, reoptimize: bool) -> Result<()> {
    let mut reader = InstanceReader::new(open(data)?);
    let (mut checked, mut failed) = (0usize, 0usize);
    while let Some(instance) = reader
        .read_instance()
        .with_context(|| format!("Failed to read {}", data.display()))?
    {
        checked += 1;
        let outcome = verify_instance(&instance).and_then(|()| {
            if reoptimize {
                reoptimize_instance(&MilpOracle, &instance)
            } else {
                Ok(())
            }
        });
        if let Err(err) = outcome {
            error!(id = %instance.id, "{err}");
            failed += 1;
        }
    }
    info!(checked, failed, reoptimize, "verification finished");
    if failed > 0 {
        bail!("{failed} of {checked} instances failed verification");
    }
    Ok(())
}
