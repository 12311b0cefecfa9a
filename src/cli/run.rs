use anyhow::{bail, Context, Result};
use bio::io::{fasta, fastq};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::args::SearchArgs;
use crate::core::seq_coding::Coding;
use crate::seed::hash_atom::{IndelState, Strand};
use crate::seed::query::{Query, QueryArena, QueryId};
use crate::seed::query_hash::{QueryHash, QueryHashBuilder};
use crate::seed::scanner::{MatchList, ReferenceBuffer, ScanStats, SeedMatch, SequenceScanner};

/// One read component as loaded from disk.
#[derive(Debug)]
pub struct ReadRecord {
    pub id: String,
    pub coding: Coding,
    pub data: Vec<u8>,
}

/// FASTQ when the first non-blank byte is `@`, FASTA otherwise.
fn is_fastq(path: &Path) -> Result<bool> {
    let mut head = [0u8; 256];
    let n = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .read(&mut head)?;
    Ok(head[..n].iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'@'))
}

fn record_id(id: &str) -> String {
    id.split_whitespace().next().unwrap_or("unknown").to_string()
}

/// Read every record of a query file.
///
/// FASTQ reads become base/phred pairs so low-quality calls turn into
/// ambiguous bases when hashed.
pub fn read_reads(path: &Path) -> Result<Vec<ReadRecord>> {
    if is_fastq(path)? {
        let reader = fastq::Reader::from_file(path)
            .with_context(|| format!("Failed to open FASTQ {}", path.display()))?;
        reader
            .records()
            .map(|r| -> Result<ReadRecord> {
                let r = r.with_context(|| format!("Malformed FASTQ record in {}", path.display()))?;
                let data = r
                    .seq()
                    .iter()
                    .zip(r.qual())
                    .flat_map(|(&base, &qual)| [base, qual.saturating_sub(33)])
                    .collect();
                Ok(ReadRecord {
                    id: record_id(r.id()),
                    coding: Coding::Ncbiqna,
                    data,
                })
            })
            .collect()
    } else {
        let reader = fasta::Reader::from_file(path)
            .with_context(|| format!("Failed to open FASTA {}", path.display()))?;
        reader
            .records()
            .map(|r| -> Result<ReadRecord> {
                let r = r.with_context(|| format!("Malformed FASTA record in {}", path.display()))?;
                Ok(ReadRecord {
                    id: record_id(r.id()),
                    coding: Coding::Iupac,
                    data: r.seq().to_vec(),
                })
            })
            .collect()
    }
}

/// Load single or paired reads into a query arena.
pub fn load_queries(query: &Path, mate: Option<&PathBuf>) -> Result<QueryArena> {
    let first = read_reads(query)?;
    let mut arena = QueryArena::with_capacity(first.len());
    match mate {
        None => {
            for r in first {
                arena.push(Query::new(r.id, r.coding, r.data));
            }
        }
        Some(mate_path) => {
            let second = read_reads(mate_path)?;
            if second.len() != first.len() {
                bail!(
                    "{} holds {} reads but {} holds {}",
                    query.display(),
                    first.len(),
                    mate_path.display(),
                    second.len()
                );
            }
            for (a, b) in first.into_iter().zip(second) {
                if a.coding != b.coding {
                    bail!("mates of {} use different formats", a.id);
                }
                arena.push(Query::paired(a.id, a.coding, a.data, b.data));
            }
        }
    }
    Ok(arena)
}

/// Build the frozen query hash for a loaded arena.
pub fn build_hash(args: &SearchArgs, arena: &mut QueryArena) -> Result<QueryHash> {
    let params = args.hash_params().context("Invalid hashing parameters")?;
    let mut builder = QueryHashBuilder::new(params)?;
    builder.add_arena(arena);
    let rejected = arena.iter().filter(|(_, q)| !q.rejected().is_empty()).count();
    if rejected > 0 {
        warn!(rejected, total = arena.len(), "some reads had windows left out of the hash");
    }
    Ok(builder.finalize())
}

/// Hits of one reference record, one per (query, mate, strand, position).
fn dedup_hits(matches: Vec<SeedMatch>) -> Vec<SeedMatch> {
    let mut seen: FxHashSet<(QueryId, u8, Strand, i64)> = FxHashSet::default();
    let mut out: Vec<SeedMatch> = matches
        .into_iter()
        .filter(|m| seen.insert((m.query, m.mate, m.strand, m.position)))
        .collect();
    out.sort_by_key(|m| (m.position, m.query, m.mate, m.strand));
    out
}

fn indel_label(indel: IndelState) -> &'static str {
    match indel {
        IndelState::None => "none",
        IndelState::Insertion => "ins",
        IndelState::Deletion => "del",
        IndelState::Invalid => "invalid",
    }
}

pub fn write_hits(
    out_path: Option<&PathBuf>,
    arena: &QueryArena,
    results: &[(String, Vec<SeedMatch>)],
) -> io::Result<()> {
    let stdout = io::stdout();
    let mut writer: Box<dyn Write> = if let Some(path) = out_path {
        Box::new(BufWriter::new(File::create(path)?))
    } else {
        Box::new(BufWriter::new(stdout.lock()))
    };
    for (reference, hits) in results {
        for m in hits {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                arena[m.query].name,
                m.mate + 1,
                reference,
                m.strand.symbol(),
                m.position,
                m.offset,
                m.mismatches,
                indel_label(m.indel),
                m.indel_len
            )?;
        }
    }
    writer.flush()
}

pub fn run(args: SearchArgs) -> Result<()> {
    let num_threads = if args.num_threads == 0 {
        num_cpus::get()
    } else {
        args.num_threads
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .context("Failed to build thread pool")?;

    info!(path = %args.query.display(), "reading queries");
    let mut arena = load_queries(&args.query, args.mate.as_ref())?;
    if arena.is_empty() {
        warn!("no queries found");
        return Ok(());
    }
    let hash = build_hash(&args, &mut arena)?;
    if hash.is_empty() {
        warn!("query hash is empty, nothing to search");
        return Ok(());
    }

    let reader = fasta::Reader::from_file(&args.reference)
        .with_context(|| format!("Failed to open reference {}", args.reference.display()))?;
    let references: Vec<fasta::Record> = reader
        .records()
        .collect::<Result<_, _>>()
        .with_context(|| format!("Malformed FASTA record in {}", args.reference.display()))?;
    info!(records = references.len(), threads = num_threads, "scanning references");

    let bar = ProgressBar::new(references.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
            .context("Invalid progress bar template")?,
    );

    let min_block = args.min_block;
    let scanned: Vec<(String, Vec<SeedMatch>, ScanStats)> = references
        .par_iter()
        .map(|record| {
            let name = record_id(record.id());
            let mut scanner = SequenceScanner::new(&hash);
            if let Some(block) = min_block {
                scanner = scanner.with_min_block(block);
            }
            let mut list = MatchList::default();
            let stats = scanner.scan(&ReferenceBuffer::new(&name, record.seq()), &mut list);
            bar.inc(1);
            (name, dedup_hits(list.matches), stats)
        })
        .collect();
    bar.finish_and_clear();

    let mut total = ScanStats::default();
    let mut results = Vec::with_capacity(scanned.len());
    for (name, hits, stats) in scanned {
        total.merge(&stats);
        results.push((name, hits));
    }
    let reported: usize = results.iter().map(|(_, h)| h.len()).sum();
    info!(
        bases = total.bases,
        probes = total.probes,
        hits = total.hits,
        reported,
        "search finished"
    );

    write_hits(args.out.as_ref(), &arena, &results).context("Failed to write hits")?;
    Ok(())
}
