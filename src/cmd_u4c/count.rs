use clap::*;
use std::io::Write;

use umi4c::libs::dedup::{contact_rows, count_contacts, SiteRow};
use umi4c::libs::digest::DigestedGenome;

use crate::cmd_u4c::utils;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("count")
        .about("Deduplicate aligned sites into contact counts")
        .after_help(
            r###"
This command collapses one sample's aligned sites into deduplicated
per-fragment contact counts. Each site row is chrom, position and UMI tag
(one row per aligned read; `*` as chrom marks an unmapped read). Sites are
assigned to restriction fragments, capped to a distance bound around the
viewpoint, and every distinct (fragment, UMI) pair then counts exactly once
no matter how many PCR duplicates produced it.

Output rows are chrom, start, end, count. Fragments without any retained
UMI are absent, not written as 0.

Notes:
* The result is invariant under input reordering and duplicated rows.
* Stage counters (specific/mapped/unmapped/filtered/umis) are logged and
  can be written as a TSV with --stats for QC reporting.

Examples:
1. Count against a DpnII map:
   u4c count sites.tsv --digest frags.tsv -v chr2:110100-110700 -o wt_1.tsv

2. Tighter distance cap, keep the QC counters:
   u4c count sites.tsv --digest frags.tsv -v chr2:110100-110700 \
       --max-dist 2000000 --stats wt_1.stats.tsv

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Input site table (chrom, pos, umi). [stdin] for standard input"),
        )
        .arg(
            Arg::new("digest")
                .long("digest")
                .short('d')
                .required(true)
                .num_args(1)
                .help("Restriction map produced by `u4c digest`"),
        )
        .arg(
            Arg::new("viewpoint")
                .long("viewpoint")
                .short('v')
                .required(true)
                .num_args(1)
                .help("Viewpoint range, e.g. chr7:110100-110700 (1-based inclusive)"),
        )
        .arg(
            Arg::new("max-dist")
                .long("max-dist")
                .num_args(1)
                .value_parser(value_parser!(u64))
                .default_value("10000000")
                .help("Discard contacts farther than this from the viewpoint"),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .num_args(1)
                .help("Write stage counters to this TSV"),
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
    let max_dist = *args.get_one::<u64>("max-dist").unwrap();

    let digest =
        DigestedGenome::read_tsv(umi4c::reader(args.get_one::<String>("digest").unwrap())?)?;
    let viewpoint = utils::parse_viewpoint(args.get_one::<String>("viewpoint").unwrap())?;

    //----------------------------
    // Count
    //----------------------------
    let mut sites = vec![];
    for line in umi4c::libs::io::data_lines(umi4c::reader(infile)?)? {
        sites.push(SiteRow::parse(&line)?);
    }

    let (counts, counters) =
        count_contacts(&digest, &viewpoint.chr, viewpoint.pos(), max_dist, sites);

    //----------------------------
    // Output
    //----------------------------
    let mut writer = umi4c::writer(args.get_one::<String>("outfile").unwrap())?;
    for row in contact_rows(&digest, &viewpoint.chr, &counts) {
        writer.write_fmt(format_args!("{}", row))?;
    }

    log::info!(
        "{} specific, {} mapped, {} unmapped, {} filtered, {} deduplicated UMIs",
        counters.specific,
        counters.mapped,
        counters.unmapped,
        counters.filtered,
        counters.umis
    );
    if let Some(stats) = args.get_one::<String>("stats") {
        let mut stats_writer = umi4c::writer(stats)?;
        stats_writer.write_fmt(format_args!("{}", counters))?;
    }

    Ok(())
}
