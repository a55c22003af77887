use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

const FRAGS: &str = "\
#chrom\tstart\tend\tindex
chr1\t0\t100\t0
chr1\t100\t200\t1
chr1\t200\t300\t2
chr1\t300\t400\t3
";

fn run_count(temp: &TempDir, sites: &str, extra: &[&str]) -> anyhow::Result<std::process::Output> {
    let frags = temp.path().join("frags.tsv");
    fs::write(&frags, FRAGS)?;
    let input = temp.path().join("sites.tsv");
    fs::write(&input, sites)?;

    let mut cmd = Command::cargo_bin("u4c")?;
    let output = cmd
        .arg("count")
        .arg(&input)
        .arg("--digest")
        .arg(&frags)
        .arg("--viewpoint")
        .arg("chr1:101-200")
        .args(extra)
        .output()?;
    Ok(output)
}

#[test]
fn command_count_dedup() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let sites = "\
chr1\t50\tAAAA
chr1\t60\tAAAA
chr1\t70\tCCCC
chr1\t250\tAAAA
";
    let output = run_count(&temp, sites, &[])?;

    let stdout = String::from_utf8(output.stdout)?;
    // two distinct UMIs on [0,100), one on [200,300)
    assert!(stdout.contains("chr1\t0\t100\t2\n"));
    assert!(stdout.contains("chr1\t200\t300\t1\n"));
    // untouched fragments are absent, not zero
    assert!(!stdout.contains("chr1\t100\t200"));

    Ok(())
}

#[test]
fn command_count_invariant_under_duplication() -> anyhow::Result<()> {
    let base = "chr1\t50\tAAAA\nchr1\t250\tCCCC\n";
    let doubled = format!("{}{}", base, base);

    let temp = TempDir::new()?;
    let once = run_count(&temp, base, &[])?;
    let temp = TempDir::new()?;
    let twice = run_count(&temp, &doubled, &[])?;

    assert_eq!(once.stdout, twice.stdout);

    Ok(())
}

#[test]
fn command_count_stats_counters() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let sites = "\
chr1\t50\tAAAA
*\t0\tCCCC
chr2\t50\tGGGG
";
    let stats = temp.path().join("qc.tsv");
    let output = run_count(
        &temp,
        sites,
        &["--stats", stats.to_str().unwrap()],
    )?;
    assert!(output.status.success());

    let text = fs::read_to_string(&stats)?;
    assert!(text.contains("specific\t3\n"));
    assert!(text.contains("mapped\t2\n"));
    assert!(text.contains("unmapped\t1\n"));
    assert!(text.contains("filtered\t1\n"));
    assert!(text.contains("umis\t1\n"));

    Ok(())
}

#[test]
fn command_count_distance_bound() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    // viewpoint anchor is 150; fragment [300,400) has midpoint 350
    let sites = "chr1\t50\tAAAA\nchr1\t350\tCCCC\n";
    let output = run_count(&temp, sites, &["--max-dist", "150"])?;

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("chr1\t0\t100\t1\n"));
    assert!(!stdout.contains("chr1\t300\t400"));

    Ok(())
}
