extern crate clap;
use clap::*;

mod cmd_u4c;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = Command::new("u4c")
        .version(crate_version!())
        .about("`u4c` - UMI-4C contact profiling")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_u4c::digest::make_subcommand())
        .subcommand(cmd_u4c::split::make_subcommand())
        .subcommand(cmd_u4c::align::make_subcommand())
        .subcommand(cmd_u4c::count::make_subcommand())
        .subcommand(cmd_u4c::profile::make_subcommand())
        .subcommand(cmd_u4c::domainogram::make_subcommand())
        .subcommand(cmd_u4c::trend::make_subcommand())
        .subcommand(cmd_u4c::test::make_subcommand())
        .after_help(
            r###"Subcommand groups:

* Reference preparation:
    * digest - In-silico restriction map of a genome
    * split  - Split reads at their first restriction site
    * align  - Delegate mapping to an external aligner

* Per-sample counting:
    * count - Deduplicate aligned sites into contact counts

* Profiles over a sample sheet:
    * profile     - Grouped, normalized contact profile
    * domainogram - Multi-scale smoothed intensity grid
    * trend       - Adaptive-bandwidth smoothed curve
    * test        - Fisher-exact/FDR differential contacts

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("digest", sub_matches)) => cmd_u4c::digest::execute(sub_matches),
        Some(("split", sub_matches)) => cmd_u4c::split::execute(sub_matches),
        Some(("align", sub_matches)) => cmd_u4c::align::execute(sub_matches),
        Some(("count", sub_matches)) => cmd_u4c::count::execute(sub_matches),
        Some(("profile", sub_matches)) => cmd_u4c::profile::execute(sub_matches),
        Some(("domainogram", sub_matches)) => cmd_u4c::domainogram::execute(sub_matches),
        Some(("trend", sub_matches)) => cmd_u4c::trend::execute(sub_matches),
        Some(("test", sub_matches)) => cmd_u4c::test::execute(sub_matches),
        _ => unreachable!(),
    }
}
