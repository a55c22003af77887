use clap::*;
use std::io::Write;

use umi4c::libs::domainogram::{compute, DomainogramParams};

use crate::cmd_u4c::utils;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("domainogram")
        .about("Multi-scale smoothed intensity grid")
        .after_help(
            r###"
This command smooths each group's normalized profile over a progression of
window sizes, revealing interaction domains without committing to one bin
size. For scale s and fragment midpoint p, the cell value is the sum of
counts of all fragments whose midpoint lies within s of p.

Notes:
* Scales start at one fragment width and double up to --max-scale.
* Sparse windows yield 0, never an error.
* Groups are computed independently; output order is by group, scale,
  then position.

Output columns: group, scale, midpoint, value.

Examples:
1. Default scales up to 64 kb:
   u4c domainogram samples.tsv -v chr2:110100-110700 -o dgram.tsv

2. Counts per base up to 16 kb windows:
   u4c domainogram samples.tsv -v chr2:110100-110700 \
       --max-scale 16384 --per-base

"###,
        );

    utils::experiment_args(cmd)
        .arg(
            Arg::new("max-scale")
                .long("max-scale")
                .num_args(1)
                .value_parser(value_parser!(u64))
                .default_value("65536")
                .help("Largest window half-width"),
        )
        .arg(
            Arg::new("per-base")
                .long("per-base")
                .action(ArgAction::SetTrue)
                .help("Report counts per base instead of window sums"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let params = DomainogramParams {
        max_scale: *args.get_one::<u64>("max-scale").unwrap(),
        per_base: args.get_flag("per-base"),
    };

    let exp = utils::load_experiment(args)?;
    let grids = compute(&exp, &params);

    let mut writer = umi4c::writer(args.get_one::<String>("outfile").unwrap())?;
    writer.write_fmt(format_args!("#group\tscale\tmidpoint\tvalue\n"))?;
    for grid in &grids {
        for (s, &scale) in grid.scales.iter().enumerate() {
            for (p, &midpoint) in grid.midpoints.iter().enumerate() {
                writer.write_fmt(format_args!(
                    "{}\t{}\t{}\t{:.4}\n",
                    grid.group, scale, midpoint, grid.values[s][p]
                ))?;
            }
        }
    }

    Ok(())
}
