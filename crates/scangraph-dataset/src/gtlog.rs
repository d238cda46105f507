use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use scangraph_pose::{PairwiseRecords, RigidTransform, ScanIndex};

use crate::naming::IndexStyle;

/// Error types for ground-truth log parsing.
#[derive(Debug, thiserror::Error)]
pub enum GtLogError {
    /// Failed to read the log file
    #[error("failed to read ground-truth log")]
    Io(#[from] std::io::Error),

    /// A line of the log does not match the expected layout
    #[error("line {line}: {reason}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// A matrix block fails the rigid-transform validation
    #[error("line {line}: matrix is not a rigid transform")]
    NotRigid {
        /// 1-based line number of the block's first matrix row.
        line: usize,
    },

    /// The same scan pair appears in more than one block
    #[error("line {line}: duplicate pair {first} {second}")]
    DuplicatePair {
        /// 1-based line number of the offending header.
        line: usize,
        /// First index of the pair.
        first: ScanIndex,
        /// Second index of the pair.
        second: ScanIndex,
    },
}

/// Read a ground-truth log from disk.
///
/// The log is a repetition of 5-line blocks: a header `idx1 idx2 total`
/// followed by the four rows of the 4x4 homogeneous matrix mapping scan
/// `idx2`'s points into scan `idx1`'s frame. Blank lines between blocks are
/// tolerated; anything else is an error.
pub fn read_gt_log(
    path: impl AsRef<Path>,
    style: IndexStyle,
) -> Result<PairwiseRecords, GtLogError> {
    let file = File::open(path)?;
    parse_gt_log(BufReader::new(file), style)
}

/// Parse a ground-truth log from any buffered reader.
pub fn parse_gt_log<R: BufRead>(reader: R, style: IndexStyle) -> Result<PairwiseRecords, GtLogError> {
    let mut records = PairwiseRecords::new();
    let mut lines = reader.lines().enumerate();

    while let Some((lineno, line)) = lines.next() {
        let line = line?;
        let header = line.trim();
        if header.is_empty() {
            continue;
        }
        let header_line = lineno + 1;

        let tokens: Vec<&str> = header.split_whitespace().collect();
        let &[first, second, total] = tokens.as_slice() else {
            return Err(GtLogError::Malformed {
                line: header_line,
                reason: format!("expected `idx1 idx2 total` header, got {:?}", header),
            });
        };
        if total.parse::<usize>().is_err() {
            return Err(GtLogError::Malformed {
                line: header_line,
                reason: format!("scan count {:?} is not a number", total),
            });
        }
        let first = style.parse(first).map_err(|e| GtLogError::Malformed {
            line: header_line,
            reason: e.to_string(),
        })?;
        let second = style.parse(second).map_err(|e| GtLogError::Malformed {
            line: header_line,
            reason: e.to_string(),
        })?;

        let mut rows = [[0.0f64; 4]; 4];
        for row in rows.iter_mut() {
            let Some((row_lineno, row_line)) = lines.next() else {
                return Err(GtLogError::Malformed {
                    line: header_line,
                    reason: "matrix block truncated by end of file".to_string(),
                });
            };
            let row_line = row_line?;
            *row = parse_matrix_row(row_lineno + 1, &row_line)?;
        }

        let transform = RigidTransform::from_rows(&rows)
            .map_err(|_| GtLogError::NotRigid { line: header_line + 1 })?;

        if records
            .insert((first.clone(), second.clone()), transform)
            .is_some()
        {
            return Err(GtLogError::DuplicatePair {
                line: header_line,
                first,
                second,
            });
        }
    }

    log::debug!("parsed {} pairwise records", records.len());
    Ok(records)
}

fn parse_matrix_row(lineno: usize, line: &str) -> Result<[f64; 4], GtLogError> {
    let mut row = [0.0f64; 4];
    let mut values = line.split_whitespace();
    for slot in row.iter_mut() {
        let token = values.next().ok_or_else(|| GtLogError::Malformed {
            line: lineno,
            reason: "matrix row has fewer than 4 entries".to_string(),
        })?;
        *slot = token.parse().map_err(|_| GtLogError::Malformed {
            line: lineno,
            reason: format!("matrix entry {:?} is not a number", token),
        })?;
    }
    if values.next().is_some() {
        return Err(GtLogError::Malformed {
            line: lineno,
            reason: "matrix row has more than 4 entries".to_string(),
        });
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scangraph_pose::ScanIndex;

    const CHAIN_LOG: &str = "\
0 1 3
1 0 0 0.5
0 1 0 0
0 0 1 -2
0 0 0 1
1 2 3
0 -1 0 0
1 0 0 3
0 0 1 0
0 0 0 1
";

    fn idx(n: u64) -> ScanIndex {
        ScanIndex::Ordinal(n)
    }

    #[test]
    fn test_parse_chain_log() {
        let records = parse_gt_log(CHAIN_LOG.as_bytes(), IndexStyle::Numeric).unwrap();
        assert_eq!(records.len(), 2);

        let t01 = records[&(idx(0), idx(1))];
        assert_eq!(
            t01.to_rows(),
            [
                [1.0, 0.0, 0.0, 0.5],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, -2.0],
                [0.0, 0.0, 0.0, 1.0],
            ]
        );

        let t12 = records[&(idx(1), idx(2))];
        assert_eq!(t12.translation().y, 3.0);
    }

    #[test]
    fn test_blank_lines_between_blocks() {
        let log = "0 1 2\n1 0 0 0\n0 1 0 0\n0 0 1 0\n0 0 0 1\n\n";
        let records = parse_gt_log(log.as_bytes(), IndexStyle::Numeric).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_literal_style_keeps_tokens() {
        let log = "000000 000010 2\n1 0 0 0\n0 1 0 0\n0 0 1 0\n0 0 0 1\n";
        let records = parse_gt_log(log.as_bytes(), IndexStyle::Literal).unwrap();
        assert!(records.contains_key(&(ScanIndex::from("000000"), ScanIndex::from("000010"))));
    }

    #[test]
    fn test_truncated_block_rejected() {
        let log = "0 1 2\n1 0 0 0\n0 1 0 0\n";
        match parse_gt_log(log.as_bytes(), IndexStyle::Numeric) {
            Err(GtLogError::Malformed { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_float_rejected() {
        let log = "0 1 2\n1 0 0 zero\n0 1 0 0\n0 0 1 0\n0 0 0 1\n";
        match parse_gt_log(log.as_bytes(), IndexStyle::Numeric) {
            Err(GtLogError::Malformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_short_row_rejected() {
        let log = "0 1 2\n1 0 0\n0 1 0 0\n0 0 1 0\n0 0 0 1\n";
        assert!(matches!(
            parse_gt_log(log.as_bytes(), IndexStyle::Numeric),
            Err(GtLogError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn test_bad_header_rejected() {
        let log = "0 1\n1 0 0 0\n0 1 0 0\n0 0 1 0\n0 0 0 1\n";
        assert!(matches!(
            parse_gt_log(log.as_bytes(), IndexStyle::Numeric),
            Err(GtLogError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let block = "0 1 2\n1 0 0 0\n0 1 0 0\n0 0 1 0\n0 0 0 1\n";
        let log = format!("{}{}", block, block);
        assert!(matches!(
            parse_gt_log(log.as_bytes(), IndexStyle::Numeric),
            Err(GtLogError::DuplicatePair { line: 6, .. })
        ));
    }

    #[test]
    fn test_non_rigid_matrix_rejected() {
        let log = "0 1 2\n2 0 0 0\n0 2 0 0\n0 0 2 0\n0 0 0 1\n";
        assert!(matches!(
            parse_gt_log(log.as_bytes(), IndexStyle::Numeric),
            Err(GtLogError::NotRigid { line: 2 })
        ));
    }
}
