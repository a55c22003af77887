use clap::*;
use cmd_lib::*;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("align")
        .about("Delegate mapping to an external aligner")
        .after_help(
            r###"
This command hands split reads to an external short-read aligner and waits
for it to finish. The aligner runs as an opaque subprocess; its exit status
is propagated and its SAM output is left where --outfile points.

Notes:
* The aligner binary must be on PATH (checked before launching).
* Aligner-internal threading is the aligner's own business; --parallel is
  passed straight through.

Examples:
1. bowtie2 against a prebuilt index:
   u4c align idx/genome reads.fq -o mapped.sam --parallel 4

2. A differently named binary:
   u4c align idx/genome reads.fq --aligner bowtie2-align-s

"###,
        )
        .arg(
            Arg::new("index")
                .required(true)
                .index(1)
                .help("Aligner index basename"),
        )
        .arg(
            Arg::new("reads")
                .required(true)
                .index(2)
                .help("Input FASTQ file of split reads"),
        )
        .arg(
            Arg::new("aligner")
                .long("aligner")
                .num_args(1)
                .default_value("bowtie2")
                .help("Aligner binary name"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("1")
                .help("Aligner thread count"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("mapped.sam")
                .help("SAM output filename"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let index = args.get_one::<String>("index").unwrap();
    let reads = args.get_one::<String>("reads").unwrap();
    let aligner = args.get_one::<String>("aligner").unwrap();
    let threads = *args.get_one::<usize>("parallel").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();

    if which::which(aligner).is_err() {
        anyhow::bail!("can't find `{}` in $PATH", aligner);
    }

    run_cmd!(
        ${aligner} -x ${index} -U ${reads} -S ${outfile} -p ${threads}
    )?;

    log::info!("alignment finished: {}", outfile);

    Ok(())
}
