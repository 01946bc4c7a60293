//! CLI entrypoint for the isoclass classification harness.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use isoclass_core::EngineConfig;
use isoclass_harness::{
    ArtifactIndex, ClassificationReport, GroupSet, LogEmitter, ProofSet, RunOptions, Runner,
    WorkerResult, merge_results, stage_proofs, validate_log_file,
};
use isoclass_harness::structured_log::sha256_hex;
use isoclass_oracle::NaiveOracle;

/// Classification tooling for collections of finite permutation groups.
#[derive(Debug, Parser)]
#[command(name = "isoclass")]
#[command(about = "Classify finite groups into isomorphism types, with proofs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify one worker's shard of a group set.
    Classify {
        /// Group set JSON path.
        #[arg(long)]
        groups: PathBuf,
        /// Optional master proof set JSON path.
        #[arg(long)]
        proofs: Option<PathBuf>,
        /// 1-based worker identifier.
        #[arg(long, default_value_t = 1)]
        worker: usize,
        /// Total number of workers sharing the run.
        #[arg(long, default_value_t = 1)]
        num_workers: usize,
        /// Expected type count; a mismatch exits nonzero.
        #[arg(long)]
        expected: Option<usize>,
        /// Output path for the worker result JSON (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Output report path (markdown).
        #[arg(long)]
        report: Option<PathBuf>,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Verify a proof set against a group set without classifying.
    VerifyProofs {
        /// Group set JSON path.
        #[arg(long)]
        groups: PathBuf,
        /// Proof set JSON path.
        #[arg(long)]
        proofs: PathBuf,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Check that no two groups in the set are conjugate in the ambient
    /// symmetric group.
    CheckConjugacy {
        /// Group set JSON path.
        #[arg(long)]
        groups: PathBuf,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Merge worker result files and cross-check shard coverage.
    Merge {
        /// Worker result JSON paths.
        #[arg(long, required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        /// Output path for the merged JSON (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Stage generated proofs into a master proof set, first wins per
    /// duplicate.
    StageProofs {
        /// Group set JSON path.
        #[arg(long)]
        groups: PathBuf,
        /// Master proof set JSON path; created if missing.
        #[arg(long)]
        master: PathBuf,
        /// Worker result JSON carrying the generated proofs.
        #[arg(long)]
        incoming: PathBuf,
    },
    /// Validate a structured JSONL log file against the schema.
    ValidateLog {
        /// Structured JSONL log path.
        #[arg(long)]
        log: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let oracle = NaiveOracle::default();
    let config = EngineConfig::default();

    match cli.command {
        Command::Classify {
            groups,
            proofs,
            worker,
            num_workers,
            expected,
            output,
            report,
            log,
        } => {
            let set = GroupSet::from_file(&groups)?;
            let proof_set = match proofs {
                Some(path) => ProofSet::from_file(&path)?,
                None => ProofSet::empty(),
            };
            let mut emitter = open_log(log.as_deref(), "classify")?;
            let runner = Runner::new(&oracle, &config);
            let opts = RunOptions {
                worker,
                num_workers,
                expected,
            };
            let result = runner.classify_shard(&set, &proof_set, &opts, &mut emitter)?;

            let result_json = result.to_json()?;
            match &output {
                Some(path) => std::fs::write(path, &result_json)?,
                None => println!("{result_json}"),
            }
            if let Some(path) = &report {
                let rendered =
                    ClassificationReport::from_result("Classification run", &result).to_markdown();
                std::fs::write(path, rendered)?;
            }
            if let (Some(log_path), Some(out_path)) = (&log, &output) {
                let mut index = ArtifactIndex::new(format!("classify-w{worker}"));
                index.add(
                    out_path.display().to_string(),
                    "worker_result",
                    sha256_hex(result_json.as_bytes()),
                );
                std::fs::write(
                    log_path.with_extension("artifacts.json"),
                    index.to_json()?,
                )?;
            }

            eprintln!(
                "worker {worker}/{num_workers}: {} group(s), {} type(s)",
                result.indices.len(),
                result.type_count
            );
            if let Some(matched) = result.expected_match {
                if matched {
                    eprintln!("expected count: MATCH");
                } else {
                    eprintln!("expected count: MISMATCH");
                    std::process::exit(1);
                }
            }
        }
        Command::VerifyProofs { groups, proofs, log } => {
            let set = GroupSet::from_file(&groups)?;
            let proof_set = ProofSet::from_file(&proofs)?;
            let mut emitter = open_log(log.as_deref(), "verify")?;
            let runner = Runner::new(&oracle, &config);
            let verdicts = runner.verify_proofs(&set, &proof_set, &mut emitter)?;
            let rejected: Vec<_> = verdicts.iter().filter(|v| !v.accepted).collect();
            for verdict in &rejected {
                eprintln!(
                    "proof {} ({} -> {}): {}",
                    verdict.proof_index,
                    verdict.duplicate,
                    verdict.representative,
                    verdict.failure.as_deref().unwrap_or("rejected")
                );
            }
            eprintln!(
                "{} proof(s) checked, {} rejected",
                verdicts.len(),
                rejected.len()
            );
            if !rejected.is_empty() {
                std::process::exit(1);
            }
        }
        Command::CheckConjugacy { groups, log } => {
            let set = GroupSet::from_file(&groups)?;
            let mut emitter = open_log(log.as_deref(), "conjugacy")?;
            let runner = Runner::new(&oracle, &config);
            let stats = runner.check_conjugacy(&set, &mut emitter)?;
            eprintln!(
                "{} group(s): {} -> {} -> {} pairs through the funnel, no conjugates",
                stats.groups,
                stats.pairs_into_l1(),
                stats.pairs_into_l2,
                stats.pairs_into_l3
            );
        }
        Command::Merge { inputs, output } => {
            let mut results = Vec::with_capacity(inputs.len());
            for path in &inputs {
                results.push(WorkerResult::from_file(path)?);
            }
            let merged = merge_results(&results)?;
            let json = merged.to_json()?;
            match &output {
                Some(path) => std::fs::write(path, &json)?,
                None => println!("{json}"),
            }
            eprintln!(
                "merged {} worker(s), {} group(s), at most {} type(s)",
                merged.num_workers,
                merged.total_groups,
                merged.type_count_upper_bound()
            );
        }
        Command::StageProofs {
            groups,
            master,
            incoming,
        } => {
            let set = GroupSet::from_file(&groups)?;
            let handles = set.handles();
            let mut master_set = if master.exists() {
                ProofSet::from_file(&master)?
            } else {
                ProofSet::empty()
            };
            let result = WorkerResult::from_file(&incoming)?;
            let report = stage_proofs(&oracle, &handles, &mut master_set, &result.generated_proofs)?;
            std::fs::write(&master, master_set.to_json()?)?;
            eprintln!(
                "staged {} proof(s), skipped {} covered, rejected {}",
                report.appended, report.skipped_covered, report.rejected
            );
        }
        Command::ValidateLog { log } => {
            let (lines, errors) = validate_log_file(&log)?;
            for error in &errors {
                eprintln!("{error}");
            }
            eprintln!("{lines} line(s) checked, {} error(s)", errors.len());
            if !errors.is_empty() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn open_log(
    path: Option<&std::path::Path>,
    job: &str,
) -> Result<Option<LogEmitter>, std::io::Error> {
    match path {
        Some(path) => {
            let run_id = format!("run-{}", std::process::id());
            Ok(Some(LogEmitter::to_file(path, job, &run_id)?))
        }
        None => Ok(None),
    }
}
