use std::fmt;
use std::io::{BufRead, Write};

use indexmap::IndexMap;
use rayon::prelude::*;

use crate::libs::error::U4cError;

//----------------------------
// Enzyme
//----------------------------

/// A restriction enzyme model: recognition motif plus the zero-based cut
/// offset inside the motif.
///
/// ```
/// use umi4c::libs::digest::Enzyme;
/// let dpnii = Enzyme::new("gatc", 0).unwrap();
/// assert_eq!(dpnii.motif(), b"GATC");
/// assert!(Enzyme::new("GATN", 0).is_err());
/// assert!(Enzyme::new("GATC", 5).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enzyme {
    motif: Vec<u8>,
    cut_offset: usize,
}

impl Enzyme {
    pub fn new(motif: &str, cut_offset: usize) -> Result<Self, U4cError> {
        if motif.is_empty() {
            return Err(U4cError::Config("empty recognition motif".to_string()));
        }
        let motif: Vec<u8> = motif.bytes().map(|b| b.to_ascii_uppercase()).collect();
        if let Some(&b) = motif
            .iter()
            .find(|&&b| !matches!(b, b'A' | b'C' | b'G' | b'T'))
        {
            return Err(U4cError::Config(format!(
                "invalid base '{}' in recognition motif",
                b as char
            )));
        }
        if cut_offset > motif.len() {
            return Err(U4cError::Config(format!(
                "cut offset {} outside motif of length {}",
                cut_offset,
                motif.len()
            )));
        }

        Ok(Self { motif, cut_offset })
    }

    pub fn motif(&self) -> &[u8] {
        &self.motif
    }

    pub fn cut_offset(&self) -> usize {
        self.cut_offset
    }

    /// Position of the first motif occurrence at or after `from`,
    /// case-insensitive on the subject.
    pub fn find_site(&self, seq: &[u8], from: usize) -> Option<usize> {
        let m = self.motif.len();
        if seq.len() < m || from > seq.len() - m {
            return None;
        }

        (from..=seq.len() - m).find(|&p| {
            seq[p..p + m]
                .iter()
                .zip(self.motif.iter())
                .all(|(&s, &q)| s.to_ascii_uppercase() == q)
        })
    }

    /// Cut coordinates from non-overlapping, leftmost-first matches.
    ///
    /// Scanning resumes strictly after each matched motif, so near-adjacent
    /// sites cannot yield overlapping matches.
    pub fn cut_sites(&self, seq: &[u8]) -> Vec<usize> {
        let mut cuts = vec![];
        let mut from = 0;
        while let Some(hit) = self.find_site(seq, from) {
            cuts.push(hit + self.cut_offset);
            from = hit + self.motif.len();
        }
        cuts
    }
}

//----------------------------
// RestrictionFragment
//----------------------------

/// One interval between consecutive enzyme cuts, 0-based half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionFragment {
    pub chr: String,
    pub start: u64,
    pub end: u64,
    /// Per-chromosome ordinal
    pub index: usize,
}

impl RestrictionFragment {
    pub fn midpoint(&self) -> u64 {
        (self.start + self.end) / 2
    }

    pub fn width(&self) -> u64 {
        self.end - self.start
    }

    /// ```
    /// use umi4c::libs::digest::RestrictionFragment;
    /// let frag = RestrictionFragment::parse("chr2\t0\t150\t0").unwrap();
    /// assert_eq!(frag.midpoint(), 75);
    /// assert_eq!(frag.to_string(), "chr2\t0\t150\t0\n");
    /// ```
    pub fn parse(line: &str) -> Result<Self, U4cError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 4 {
            return Err(U4cError::Integrity(format!(
                "fragment row needs 4 fields, got {}: `{}`",
                fields.len(),
                line
            )));
        }
        let start: u64 = fields[1]
            .parse()
            .map_err(|_| U4cError::Integrity(format!("bad fragment start `{}`", fields[1])))?;
        let end: u64 = fields[2]
            .parse()
            .map_err(|_| U4cError::Integrity(format!("bad fragment end `{}`", fields[2])))?;
        let index: usize = fields[3]
            .parse()
            .map_err(|_| U4cError::Integrity(format!("bad fragment index `{}`", fields[3])))?;
        if start >= end {
            return Err(U4cError::Integrity(format!(
                "fragment {}:{}-{} is empty or reversed",
                fields[0], start, end
            )));
        }

        Ok(Self {
            chr: fields[0].to_string(),
            start,
            end,
            index,
        })
    }
}

impl fmt::Display for RestrictionFragment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}\t{}\t{}\t{}", self.chr, self.start, self.end, self.index)
    }
}

/// Fragments of one chromosome: intervals between consecutive cuts, with the
/// chromosome start and end as implicit boundaries.
///
/// A chromosome without any motif occurrence yields a single whole-chromosome
/// fragment and a warning, not an error.
pub fn digest_chromosome(chr: &str, seq: &[u8], enzyme: &Enzyme) -> Vec<RestrictionFragment> {
    let mut cuts = enzyme.cut_sites(seq);
    if cuts.is_empty() && !seq.is_empty() {
        log::warn!(
            "no {} site on {}; emitting a whole-chromosome fragment",
            String::from_utf8_lossy(enzyme.motif()),
            chr
        );
    }

    // implicit boundaries; dedup guards cuts falling on them
    cuts.insert(0, 0);
    cuts.push(seq.len());
    cuts.dedup();

    cuts.windows(2)
        .enumerate()
        .map(|(index, w)| RestrictionFragment {
            chr: chr.to_string(),
            start: w[0] as u64,
            end: w[1] as u64,
            index,
        })
        .collect()
}

//----------------------------
// DigestedGenome
//----------------------------

/// Per-chromosome restriction maps. Built once per enzyme configuration and
/// read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct DigestedGenome {
    chromosomes: IndexMap<String, Vec<RestrictionFragment>>,
}

impl DigestedGenome {
    pub fn new() -> Self {
        Default::default()
    }

    /// Digest chromosomes on the current rayon pool. Chromosomes are
    /// independent tasks; the merge keeps input order, so scheduling cannot
    /// change the outcome.
    pub fn digest(seqs: &[(String, Vec<u8>)], enzyme: &Enzyme) -> Self {
        let digested: Vec<(String, Vec<RestrictionFragment>)> = seqs
            .par_iter()
            .map(|(chr, seq)| (chr.clone(), digest_chromosome(chr, seq, enzyme)))
            .collect();

        let mut genome = Self::new();
        for (chr, frags) in digested {
            genome.chromosomes.insert(chr, frags);
        }
        genome
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    pub fn chr_names(&self) -> Vec<&String> {
        self.chromosomes.keys().collect()
    }

    pub fn fragments(&self, chr: &str) -> Option<&[RestrictionFragment]> {
        self.chromosomes.get(chr).map(|v| v.as_slice())
    }

    /// Restrict to a chromosome subset, keeping the original order.
    pub fn retain_chromosomes(&mut self, subset: &[String]) {
        self.chromosomes.retain(|chr, _| subset.contains(chr));
    }

    /// The fragment covering `pos`, by binary search.
    pub fn find_fragment(&self, chr: &str, pos: u64) -> Option<&RestrictionFragment> {
        let frags = self.chromosomes.get(chr)?;
        let i = frags.partition_point(|f| f.end <= pos);
        frags.get(i).filter(|f| f.start <= pos)
    }

    pub fn write_tsv(&self, writer: &mut dyn Write) -> anyhow::Result<()> {
        writer.write_fmt(format_args!("#chrom\tstart\tend\tindex\n"))?;
        for frags in self.chromosomes.values() {
            for frag in frags {
                writer.write_fmt(format_args!("{}", frag))?;
            }
        }
        Ok(())
    }

    /// Reload a persisted restriction map, validating that each chromosome's
    /// fragments are ascending, contiguous and correctly numbered.
    pub fn read_tsv(reader: Box<dyn BufRead>) -> anyhow::Result<Self> {
        let mut genome = Self::new();
        for line in crate::libs::io::data_lines(reader)? {
            let frag = RestrictionFragment::parse(&line)?;
            genome
                .chromosomes
                .entry(frag.chr.clone())
                .or_default()
                .push(frag);
        }

        for (chr, frags) in &genome.chromosomes {
            for (i, frag) in frags.iter().enumerate() {
                if frag.index != i {
                    return Err(U4cError::Integrity(format!(
                        "fragment index {} out of order on {}",
                        frag.index, chr
                    ))
                    .into());
                }
                if i > 0 && frags[i - 1].end != frag.start {
                    return Err(U4cError::Integrity(format!(
                        "fragments not contiguous on {} at {}",
                        chr, frag.start
                    ))
                    .into());
                }
            }
        }

        Ok(genome)
    }
}
