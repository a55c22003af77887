use crate::libs::digest::Enzyme;

/// Cut coordinate implied by the first (5'-most) motif occurrence at or
/// after `skip`, the bait+pad prefix length.
///
/// Only the first occurrence matters: downstream ligation structure is
/// defined by the enzyme cut nearest the viewpoint. `None` when the motif
/// does not occur or the cut would not leave two non-empty parts.
pub fn cut_position(seq: &[u8], enzyme: &Enzyme, skip: usize) -> Option<usize> {
    let hit = enzyme.find_site(seq, skip)?;
    let cut = hit + enzyme.cut_offset();
    if cut == 0 || cut >= seq.len() {
        return None;
    }
    Some(cut)
}

/// Split a read at its first restriction cut after the bait/pad prefix.
///
/// Returns the ordered sub-sequences to hand to the aligner; a read without
/// any site comes back whole.
///
/// ```
/// use umi4c::libs::digest::Enzyme;
/// use umi4c::libs::split::split_read;
/// let enzyme = Enzyme::new("GATC", 0).unwrap();
/// assert_eq!(split_read(b"AAGATCTT", &enzyme, 0), vec![&b"AA"[..], &b"GATCTT"[..]]);
/// assert_eq!(split_read(b"AATTAATT", &enzyme, 0), vec![&b"AATTAATT"[..]]);
/// ```
pub fn split_read<'a>(seq: &'a [u8], enzyme: &Enzyme, skip: usize) -> Vec<&'a [u8]> {
    match cut_position(seq, enzyme, skip) {
        Some(cut) => vec![&seq[..cut], &seq[cut..]],
        None => vec![seq],
    }
}
