use clap::*;
use std::io::Write;

use umi4c::libs::digest::Enzyme;
use umi4c::libs::split::cut_position;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("split")
        .about("Split reads at their first restriction site")
        .after_help(
            r###"
This command splits each read at the cut coordinate implied by its first
(5'-most) restriction motif occurrence, producing the sub-sequences the
external aligner maps independently. Only the first occurrence is used:
the ligation structure downstream is defined by the enzyme cut nearest the
viewpoint.

Notes:
* Reads are expected to begin with bait + pad + restriction content;
  --skip masks that prefix from the motif search.
* Quality strings are sliced at the same coordinate.
* A read without any motif occurrence passes through unsplit.
* Part ordinals are appended to read names as `name.0`, `name.1`.

Examples:
1. DpnII, 20 bp of bait and pad:
   u4c split reads.fq --enzyme GATC --offset 0 --skip 20 -o parts.fq

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Input FASTQ file. [stdin] for standard input"),
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
            Arg::new("skip")
                .long("skip")
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("0")
                .help("Bait/pad prefix length excluded from the motif search"),
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
    let infile = args.get_one::<String>("infile").unwrap();
    let enzyme = Enzyme::new(
        args.get_one::<String>("enzyme").unwrap(),
        *args.get_one::<usize>("offset").unwrap(),
    )?;
    let skip = *args.get_one::<usize>("skip").unwrap();

    let mut writer = umi4c::writer(args.get_one::<String>("outfile").unwrap())?;

    let reader = umi4c::reader(infile)?;
    let mut fq_in = noodles_fastq::io::Reader::new(reader);

    let mut n_split: u64 = 0;
    let mut n_whole: u64 = 0;

    for result in fq_in.records() {
        let record = result?;
        let name = String::from_utf8_lossy(record.name().as_ref()).into_owned();
        let seq: &[u8] = record.sequence().as_ref();
        let qual: &[u8] = record.quality_scores().as_ref();

        match cut_position(seq, &enzyme, skip) {
            Some(cut) => {
                n_split += 1;
                for (ordinal, (s, q)) in [(&seq[..cut], &qual[..cut]), (&seq[cut..], &qual[cut..])]
                    .into_iter()
                    .enumerate()
                {
                    writer.write_fmt(format_args!(
                        "@{}.{}\n{}\n+\n{}\n",
                        name,
                        ordinal,
                        String::from_utf8_lossy(s),
                        String::from_utf8_lossy(q),
                    ))?;
                }
            }
            None => {
                n_whole += 1;
                writer.write_fmt(format_args!(
                    "@{}\n{}\n+\n{}\n",
                    name,
                    String::from_utf8_lossy(seq),
                    String::from_utf8_lossy(qual),
                ))?;
            }
        }
    }

    log::info!("{} reads split, {} passed through whole", n_split, n_whole);

    Ok(())
}
