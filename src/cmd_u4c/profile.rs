use clap::*;
use std::io::Write;

use crate::cmd_u4c::utils;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("profile")
        .about("Grouped, normalized contact profile")
        .after_help(
            r###"
This command assembles the viewpoint-anchored contact profile: the union
grid of retained restriction fragments, one column per group, normalized to
the reference group's total.

Grid construction:
* Fragments come from every sample's contact table, restricted to the
  viewpoint chromosome and the analysis window.
* Fragments closer than --exclusion to the viewpoint are dropped.
* Samples missing a fragment contribute 0 there.

Grouping and normalization:
* Columns sharing the same --group-by value are summed. Grouping by a
  per-sample-unique column (e.g. `sample`) keeps per-sample columns.
* The reference is the minimum-total group unless --reference names one.
* Every group is scaled by total(reference) / total(group), unrounded.

Header comments carry the viewpoint, regions, grouping and per-group
factors.

Examples:
1. Per-condition profile:
   u4c profile samples.tsv -v chr2:110100-110700 -o profile.tsv

2. Raw counts, per-sample columns:
   u4c profile samples.tsv -v chr2:110100-110700 --group-by sample --raw

"###,
        );

    utils::experiment_args(cmd).arg(
        Arg::new("raw")
            .long("raw")
            .action(ArgAction::SetTrue)
            .help("Write raw counts instead of normalized values"),
    )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let raw = args.get_flag("raw");
    let exp = utils::load_experiment(args)?;
    let mut writer = umi4c::writer(args.get_one::<String>("outfile").unwrap())?;

    //----------------------------
    // Header
    //----------------------------
    let vp = exp.viewpoint();
    let (region_start, region_end) = exp.region();
    let (excl_start, excl_end) = exp.exclusion_region();
    writer.write_fmt(format_args!(
        "# viewpoint: {}:{}-{}\n",
        vp.chr, vp.start, vp.end
    ))?;
    writer.write_fmt(format_args!(
        "# region: {}:{}-{}\n",
        vp.chr, region_start, region_end
    ))?;
    writer.write_fmt(format_args!(
        "# exclusion: {}:{}-{}\n",
        vp.chr, excl_start, excl_end
    ))?;
    writer.write_fmt(format_args!("# group_by: {}\n", exp.group_by()))?;
    writer.write_fmt(format_args!(
        "# reference: {}\n",
        exp.reference_group().name
    ))?;
    for group in exp.groups() {
        writer.write_fmt(format_args!(
            "# factor: {}\t{:.6}\n",
            group.name, group.factor
        ))?;
    }

    //----------------------------
    // Table
    //----------------------------
    let names: Vec<&str> = exp.groups().iter().map(|g| g.name.as_str()).collect();
    writer.write_fmt(format_args!("#chrom\tstart\tend\t{}\n", names.join("\t")))?;

    for (i, row) in exp.rows().iter().enumerate() {
        let cells: Vec<String> = exp
            .groups()
            .iter()
            .map(|g| {
                if raw {
                    format!("{}", g.raw[i])
                } else {
                    format!("{:.4}", g.norm[i])
                }
            })
            .collect();
        writer.write_fmt(format_args!(
            "{}\t{}\t{}\t{}\n",
            vp.chr,
            row.start,
            row.end,
            cells.join("\t")
        ))?;
    }

    Ok(())
}
