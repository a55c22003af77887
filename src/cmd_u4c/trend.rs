use clap::*;
use std::io::Write;

use umi4c::libs::trend::compute;

use crate::cmd_u4c::utils;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("trend")
        .about("Adaptive-bandwidth smoothed curve")
        .after_help(
            r###"
This command smooths each group's profile with support-driven windows: at
every fragment position a symmetric window grows outward, nearest fragment
first, until it holds --min-support raw UMIs. Statistical support stays
roughly constant along the curve, so sparse far-field regions are not
over-smoothed and the dense near-bait region is not under-smoothed.

Notes:
* Windows never cross the bait exclusion gap or the region edge; at a
  boundary they keep growing one-sidedly instead.
* The rate divides the normalized count in the window by its extent in
  bases, so curves are comparable across groups.

Output columns: group, midpoint, rate, half_width.

Examples:
1. Default support of 20 UMIs per window:
   u4c trend samples.tsv -v chr2:110100-110700 -o trend.tsv

"###,
        );

    utils::experiment_args(cmd).arg(
        Arg::new("min-support")
            .long("min-support")
            .num_args(1)
            .value_parser(value_parser!(u64))
            .default_value("20")
            .help("Raw UMI count each window must reach"),
    )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let min_support = *args.get_one::<u64>("min-support").unwrap();

    let exp = utils::load_experiment(args)?;
    let curves = compute(&exp, min_support);

    let mut writer = umi4c::writer(args.get_one::<String>("outfile").unwrap())?;
    writer.write_fmt(format_args!("#group\tmidpoint\trate\thalf_width\n"))?;
    for curve in &curves {
        for point in &curve.points {
            writer.write_fmt(format_args!(
                "{}\t{}\t{:.6e}\t{}\n",
                curve.group, point.pos, point.rate, point.half_width
            ))?;
        }
    }

    Ok(())
}
