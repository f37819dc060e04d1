//! CSV dialect detection from a leading sample of the file.

/// Bytes of content inspected when guessing the dialect.
pub const SAMPLE_BYTES: usize = 64 * 1024;

/// Delimiters tried, in order of preference.
const CANDIDATE_DELIMITERS: [u8; 5] = [b',', b'\t', b';', b'|', b':'];

/// Share of sampled lines that must agree on a delimiter count.
const CONSISTENCY: f64 = 0.9;

/// Delimiter and quote character of a CSV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub quote: u8,
    /// Spaces right after a delimiter are not part of the next cell.
    pub skip_initial_space: bool,
}

impl Default for Dialect {
    /// Comma separated, double-quote escaped.
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            skip_initial_space: false,
        }
    }
}

impl Dialect {
    /// Sniff the dialect, falling back to [`Dialect::default`].
    pub fn detect(sample: &[u8], truncated: bool) -> Self {
        sniff(sample, truncated).unwrap_or_default()
    }
}

/// Guess the dialect of `sample`.
///
/// A delimiter qualifies when most sampled lines contain it the same
/// non-zero number of times outside quotes. When `truncated` is set the
/// last, possibly partial, line is ignored. Initial spaces are skipped when
/// every delimiter on the first line is followed by a space. Returns `None`
/// when nothing qualifies.
pub fn sniff(sample: &[u8], truncated: bool) -> Option<Dialect> {
    let quote = guess_quote(sample);

    let mut lines: Vec<&[u8]> = sample
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect();
    if truncated && lines.len() > 1 {
        lines.pop();
    }
    lines.retain(|line| !line.is_empty());
    if lines.is_empty() {
        return None;
    }

    CANDIDATE_DELIMITERS
        .into_iter()
        .find(|&delimiter| is_consistent(&lines, delimiter, quote))
        .map(|delimiter| Dialect {
            delimiter,
            quote,
            skip_initial_space: spaced_after(lines[0], delimiter),
        })
}

fn spaced_after(line: &[u8], delimiter: u8) -> bool {
    let delimiters = line.iter().filter(|&&b| b == delimiter).count();
    let spaced = line
        .windows(2)
        .filter(|pair| pair[0] == delimiter && pair[1] == b' ')
        .count();
    delimiters == spaced
}

fn is_consistent(lines: &[&[u8]], delimiter: u8, quote: u8) -> bool {
    let counts: Vec<usize> = lines
        .iter()
        .map(|line| count_unquoted(line, delimiter, quote))
        .collect();

    let Some(mode) = mode(&counts) else {
        return false;
    };
    if mode == 0 {
        return false;
    }

    let agreeing = counts.iter().filter(|&&c| c == mode).count();
    agreeing as f64 / counts.len() as f64 >= CONSISTENCY
}

fn count_unquoted(line: &[u8], delimiter: u8, quote: u8) -> usize {
    let mut quoted = false;
    let mut count = 0;
    for &byte in line {
        if byte == quote {
            quoted = !quoted;
        } else if byte == delimiter && !quoted {
            count += 1;
        }
    }
    count
}

fn mode(counts: &[usize]) -> Option<usize> {
    let mut tally: Vec<(usize, usize)> = Vec::new();
    for &count in counts {
        match tally.iter_mut().find(|(value, _)| *value == count) {
            Some((_, seen)) => *seen += 1,
            None => tally.push((count, 1)),
        }
    }
    // Ties go to the larger count so a header-only sample still qualifies.
    tally
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(value, _)| value)
}

/// Single quotes win only when they open fields and double quotes never do.
fn guess_quote(sample: &[u8]) -> u8 {
    let opens = |quote: u8| {
        sample
            .windows(2)
            .filter(|pair| pair[1] == quote && matches!(pair[0], b',' | b'\t' | b';' | b'|' | b':' | b'\n'))
            .count()
            + usize::from(sample.first() == Some(&quote))
    };

    if opens(b'"') == 0 && opens(b'\'') > 0 {
        b'\''
    } else {
        b'"'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_comma() {
        let sample = b"zip,county_code\n02138,25017\n02139,25017\n";
        assert_eq!(sniff(sample, false), Some(Dialect::default()));
    }

    #[test]
    fn detects_semicolon_and_tab() {
        let sample = b"a;b;c\n1;2;3\n4;5;6\n";
        assert_eq!(sniff(sample, false).map(|d| d.delimiter), Some(b';'));

        let sample = b"a\tb\n1\t2\n";
        assert_eq!(sniff(sample, false).map(|d| d.delimiter), Some(b'\t'));
    }

    #[test]
    fn quoted_delimiters_are_ignored() {
        let sample = b"name;note\n\"Suffolk, MA\";x\n\"Kings, NY\";y\n";
        assert_eq!(sniff(sample, false).map(|d| d.delimiter), Some(b';'));
    }

    #[test]
    fn inconsistent_sample_falls_back_to_default() {
        let sample = b"a,b,c\n1,2\n1,2,3\n1,2,3,4\n";
        assert_eq!(sniff(sample, false), None);
        assert_eq!(Dialect::detect(sample, false), Dialect::default());
    }

    #[test]
    fn single_column_falls_back_to_default() {
        assert_eq!(sniff(b"zip\n02138\n", false), None);
        assert_eq!(sniff(b"", false), None);
    }

    #[test]
    fn truncated_tail_is_ignored() {
        let sample = b"a|b\n1|2\n3|4\n5";
        assert_eq!(sniff(sample, true).map(|d| d.delimiter), Some(b'|'));
    }

    #[test]
    fn detects_single_quote() {
        let sample = b"'a','b'\n'1','2'\n";
        assert_eq!(
            sniff(sample, false),
            Some(Dialect {
                delimiter: b',',
                quote: b'\'',
                skip_initial_space: false,
            })
        );
    }

    #[test]
    fn detects_space_after_delimiter() {
        let dialect = sniff(b"a, b\n1, 2\n3, 4\n", false).unwrap();
        assert_eq!(dialect.delimiter, b',');
        assert!(dialect.skip_initial_space);

        // One bare delimiter on the first line is enough to keep spaces.
        let dialect = sniff(b"a, b,c\n1, 2,3\n", false).unwrap();
        assert!(!dialect.skip_initial_space);
    }
}
