use clap::*;
use umi4c::libs::digest::{DigestedGenome, Enzyme};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("digest")
        .about("In-silico restriction map of a genome")
        .after_help(
            r###"
This command scans each chromosome for the enzyme recognition motif and
emits the restriction fragments between consecutive cut sites as a TSV of
chrom, start, end and per-chromosome fragment index (0-based half-open).

Notes:
* Matches are leftmost-first and non-overlapping; scanning resumes after
  each matched motif, so near-adjacent sites cannot overlap.
* The chromosome start and end act as implicit cut boundaries.
* A chromosome without any motif occurrence yields one whole-chromosome
  fragment and a warning.
* Supports both plain text and gzipped (.gz) FASTA files.
* Re-running with identical inputs yields identical output.

Examples:
1. DpnII (GATC, blunt cut before the motif):
   u4c digest genome.fa --enzyme GATC --offset 0 -o frags.tsv

2. Restrict to two chromosomes, digest in parallel:
   u4c digest genome.fa --enzyme GATC --chr chr2 --chr chr3 --parallel 4

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Input genome FASTA file. [stdin] for standard input"),
        )
        .arg(
            Arg::new("enzyme")
                .long("enzyme")
                .short('e')
                .required(true)
                .num_args(1)
                .help("Recognition motif over A/C/G/T, case-insensitive"),
        )
        .arg(
            Arg::new("offset")
                .long("offset")
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("0")
                .help("Zero-based cut offset inside the motif"),
        )
        .arg(
            Arg::new("chr")
                .long("chr")
                .num_args(1)
                .action(ArgAction::Append)
                .help("Restrict to this chromosome; repeatable"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("1")
                .help("Number of threads for parallel processing"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let enzyme = Enzyme::new(
        args.get_one::<String>("enzyme").unwrap(),
        *args.get_one::<usize>("offset").unwrap(),
    )?;
    let subset: Vec<String> = args
        .get_many::<String>("chr")
        .unwrap_or_default()
        .cloned()
        .collect();

    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();
    rayon::ThreadPoolBuilder::new()
        .num_threads(opt_parallel)
        .build_global()?;

    //----------------------------
    // Digest
    //----------------------------
    let reader = umi4c::reader(infile)?;
    let mut fa_in = noodles_fasta::io::Reader::new(reader);

    let mut seqs: Vec<(String, Vec<u8>)> = vec![];
    for result in fa_in.records() {
        let record = result?;
        let name = String::from_utf8(record.name().into())?;
        if !subset.is_empty() && !subset.contains(&name) {
            continue;
        }
        let seq = record.sequence().get(..).unwrap_or_default().to_vec();
        seqs.push((name, seq));
    }

    let mut genome = DigestedGenome::digest(&seqs, &enzyme);
    if !subset.is_empty() {
        genome.retain_chromosomes(&subset);
    }

    //----------------------------
    // Output
    //----------------------------
    let mut writer = umi4c::writer(args.get_one::<String>("outfile").unwrap())?;
    genome.write_tsv(&mut writer)?;

    Ok(())
}
