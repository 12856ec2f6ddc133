use itertools::Itertools;

use super::*;
use crate::error::DmrError;

#[test]
fn test_interval_getters() {
    let iv = GenomicInterval::new("chr1", 100, 250);
    assert_eq!(iv.chr().as_str(), "chr1");
    assert_eq!(iv.start(), 100);
    assert_eq!(iv.end(), 250);
    assert_eq!(iv.length(), 150);
    assert_eq!(iv.to_string(), "chr1:100-250");
}

#[test]
fn test_interval_try_new_rejects_empty() {
    let res = GenomicInterval::try_new("chr1", 10, 10);
    assert!(matches!(res, Err(DmrError::InputShape(_))));
    let res = GenomicInterval::try_new("chr1", 11, 10);
    assert!(matches!(res, Err(DmrError::InputShape(_))));
}

#[test]
#[should_panic]
fn test_interval_new_panics_on_inverted() {
    let _ = GenomicInterval::new("chr1", 20, 10);
}

#[test]
fn test_interval_ordering_chr_then_start() {
    let sorted = vec![
        GenomicInterval::new("chr2", 5, 6),
        GenomicInterval::new("chr10", 500, 501),
        GenomicInterval::new("chr1", 100, 101),
        GenomicInterval::new("chr1", 7, 8),
    ]
    .into_iter()
    .sorted()
    .map(|iv| iv.to_string())
    .collect_vec();
    assert_eq!(sorted, vec![
        "chr1:7-8",
        "chr1:100-101",
        "chr10:500-501",
        "chr2:5-6"
    ]);
}

#[test]
fn test_interval_overlaps() {
    let a = GenomicInterval::new("chr1", 10, 20);
    assert!(a.overlaps(&GenomicInterval::new("chr1", 19, 30)));
    assert!(!a.overlaps(&GenomicInterval::new("chr1", 20, 30)));
    assert!(!a.overlaps(&GenomicInterval::new("chr2", 10, 20)));
    assert!(a.contains_pos(10));
    assert!(!a.contains_pos(20));
}
