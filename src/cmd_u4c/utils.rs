use clap::*;
use rayon::prelude::*;
use std::path::Path;

use umi4c::libs::dedup::ContactRow;
use umi4c::libs::experiment::{BuildParams, Experiment, Viewpoint};
use umi4c::libs::sample::SampleSheet;

/// Attach the arguments shared by every profile-building subcommand.
pub fn experiment_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("samples")
            .required(true)
            .index(1)
            .help("Sample sheet (TSV with sample/replicate/condition/file columns)"),
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
        Arg::new("exclusion")
            .long("exclusion")
            .num_args(1)
            .value_parser(value_parser!(u64))
            .default_value("3000")
            .help("Bait exclusion distance around the viewpoint"),
    )
    .arg(
        Arg::new("half-width")
            .long("half-width")
            .num_args(1)
            .value_parser(value_parser!(u64))
            .default_value("1000000")
            .help("Analysis half-width on each side of the viewpoint"),
    )
    .arg(
        Arg::new("group-by")
            .long("group-by")
            .num_args(1)
            .default_value("condition")
            .help("Sample sheet column defining the groups"),
    )
    .arg(
        Arg::new("reference")
            .long("reference")
            .num_args(1)
            .help("Reference group label. The minimum-total group when omitted"),
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

/// Parse a 1-based inclusive `chr:start-end` range into a viewpoint.
pub fn parse_viewpoint(range: &str) -> anyhow::Result<Viewpoint> {
    let rg = intspan::Range::from_str(range);
    if !rg.is_valid() || *rg.start() < 1 {
        anyhow::bail!("invalid viewpoint range `{}`; expected chr:start-end", range);
    }

    // 1-based inclusive to 0-based half-open
    let start = (*rg.start() as u64) - 1;
    let end = *rg.end() as u64;
    Ok(Viewpoint::new(rg.chr(), start, end)?)
}

/// Read one sample's contact table.
pub fn read_contacts(path: &str) -> anyhow::Result<Vec<ContactRow>> {
    let mut rows = vec![];
    for line in umi4c::libs::io::data_lines(umi4c::reader(path)?)? {
        rows.push(ContactRow::parse(&line)?);
    }
    Ok(rows)
}

/// Load the sample sheet, pull every sample's contact table and assemble the
/// experiment. `file` entries resolve relative to the sheet's directory.
pub fn load_experiment(args: &ArgMatches) -> anyhow::Result<Experiment> {
    let sheet_path = args.get_one::<String>("samples").unwrap();

    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();
    rayon::ThreadPoolBuilder::new()
        .num_threads(opt_parallel)
        .build_global()?;

    let mut text = String::new();
    let mut reader = umi4c::reader(sheet_path)?;
    std::io::Read::read_to_string(&mut reader, &mut text)?;
    let sheet = SampleSheet::parse(&text)?;

    let viewpoint = parse_viewpoint(args.get_one::<String>("viewpoint").unwrap())?;
    let params = BuildParams {
        exclusion: *args.get_one::<u64>("exclusion").unwrap(),
        half_width: *args.get_one::<u64>("half-width").unwrap(),
        group_by: args.get_one::<String>("group-by").unwrap().clone(),
        reference: args.get_one::<String>("reference").cloned(),
    };

    let base = if sheet_path == "stdin" {
        None
    } else {
        Path::new(sheet_path).parent().map(Path::to_path_buf)
    };

    // every sample is an independent task; the merge keeps sheet order, so
    // scheduling cannot change the outcome
    let mut tables = vec![];
    for sample in sheet.samples() {
        let file = sheet.value(sample, "file")?.to_string();
        let resolved = match &base {
            Some(dir) if !Path::new(&file).is_absolute() => {
                dir.join(&file).to_string_lossy().into_owned()
            }
            _ => file,
        };
        tables.push((sample.to_string(), resolved));
    }
    let counts: Vec<(String, Vec<ContactRow>)> = tables
        .par_iter()
        .map(|(sample, path)| {
            let rows = read_contacts(path)
                .map_err(|e| anyhow::anyhow!("sample `{}`: {}", sample, e))?;
            Ok((sample.clone(), rows))
        })
        .collect::<anyhow::Result<_>>()?;

    Ok(Experiment::build(&sheet, &counts, &viewpoint, &params)?)
}
