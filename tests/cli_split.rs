use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

#[test]
fn command_split_at_first_site() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("reads.fq");
    fs::write(&input, "@r1\nAAGATCTT\n+\nIIIIIIII\n")?;

    let mut cmd = Command::cargo_bin("u4c")?;
    let output = cmd
        .arg("split")
        .arg(&input)
        .arg("--enzyme")
        .arg("GATC")
        .output()?;

    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(stdout, "@r1.0\nAA\n+\nII\n@r1.1\nGATCTT\n+\nIIIIII\n");

    Ok(())
}

#[test]
fn command_split_skip_masks_bait() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("reads.fq");
    // sites at 2 and 8; the first lies inside the bait prefix
    fs::write(&input, "@r1\nAAGATCTTGATCAA\n+\nIIIIIIIIIIIIII\n")?;

    let mut cmd = Command::cargo_bin("u4c")?;
    let output = cmd
        .arg("split")
        .arg(&input)
        .arg("--enzyme")
        .arg("GATC")
        .arg("--skip")
        .arg("4")
        .output()?;

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("@r1.0\nAAGATCTT\n"));
    assert!(stdout.contains("@r1.1\nGATCAA\n"));

    Ok(())
}

#[test]
fn command_split_no_site_passes_through() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("reads.fq");
    fs::write(&input, "@r1\nACACACAC\n+\nIIIIIIII\n")?;

    let mut cmd = Command::cargo_bin("u4c")?;
    let output = cmd
        .arg("split")
        .arg(&input)
        .arg("--enzyme")
        .arg("GATC")
        .output()?;

    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(stdout, "@r1\nACACACAC\n+\nIIIIIIII\n");

    Ok(())
}
