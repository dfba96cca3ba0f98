//! Reading spectra from coalescent simulations in `ms` output format.
//!
//! The first line holds the simulator command line, `ms <nsam> <nreps> ...`. If the command
//! contains `-I <npop> <n1> <n2> ...`, haplotypes are assigned to populations in order of the
//! given sample sizes; otherwise all haplotypes belong to a single population. Each replicate
//! starts with a line beginning `//`, followed by `segsites: <S>` and, if `S > 0`, a
//! `positions:` line and one line of `S` zeros and ones per haplotype.
//!
//! Counts of derived alleles are summed over all replicates.

use std::{fmt, io, num::ParseIntError};

use crate::Scs;

/// Reads an SCS in `ms` format from a reader.
pub fn read_scs<R>(reader: &mut R) -> io::Result<Scs>
where
    R: io::BufRead,
{
    let mut src = String::new();
    reader.read_to_string(&mut src)?;

    parse_scs(&src).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn parse_scs(src: &str) -> Result<Scs, ParseMsError> {
    let mut lines = src.lines().map(str::trim).filter(|line| !line.is_empty());

    let command = lines.next().ok_or(ParseMsError::Empty)?;
    let command = Command::parse(command)?;

    let shape = command.sample_sizes.iter().map(|n| n + 1).collect::<Vec<_>>();
    let mut scs = Scs::from_zeros(shape);

    let mut replicates = 0;
    while replicates < command.replicates {
        // Skip seeds and anything else preceding the replicate
        if !lines.by_ref().any(|line| line.starts_with("//")) {
            break;
        }

        let segregating_sites = parse_segregating_sites(lines.next())?;

        if segregating_sites > 0 {
            match lines.next() {
                Some(line) if line.starts_with("positions") => (),
                _ => return Err(ParseMsError::MissingPositions),
            }

            // All haplotypes must have one allele per site before counts are allocated
            let haplotypes = command
                .populations()
                .map(|population| {
                    let haplotype = lines.next().ok_or(ParseMsError::MissingHaplotypes)?;

                    if haplotype.len() == segregating_sites {
                        Ok((population, haplotype))
                    } else {
                        Err(ParseMsError::HaplotypeLength {
                            expected: segregating_sites,
                            found: haplotype.len(),
                        })
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;

            let mut counts = vec![vec![0; command.sample_sizes.len()]; segregating_sites];
            for (population, haplotype) in haplotypes {
                for (site, allele) in haplotype.bytes().enumerate() {
                    match allele {
                        b'0' => (),
                        b'1' => counts[site][population] += 1,
                        _ => return Err(ParseMsError::InvalidAllele(allele as char)),
                    }
                }
            }

            for count in counts.iter() {
                scs[count] += 1.0;
            }
        }

        replicates += 1;
    }

    if replicates < command.replicates {
        Err(ParseMsError::MissingReplicates {
            expected: command.replicates,
            found: replicates,
        })
    } else {
        Ok(scs)
    }
}

fn parse_segregating_sites(line: Option<&str>) -> Result<usize, ParseMsError> {
    let line = line.ok_or(ParseMsError::MissingSegregatingSites)?;

    line.strip_prefix("segsites:")
        .ok_or(ParseMsError::MissingSegregatingSites)?
        .trim()
        .parse()
        .map_err(ParseMsError::from)
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Command {
    sample_sizes: Vec<usize>,
    replicates: usize,
}

impl Command {
    fn parse(line: &str) -> Result<Self, ParseMsError> {
        let terms = line.split_ascii_whitespace().collect::<Vec<_>>();

        match terms.first() {
            Some(program) if program.contains("ms") => (),
            _ => return Err(ParseMsError::UnrecognizedCommand(line.to_string())),
        }

        let samples = parse_term(&terms, 1)?;
        let replicates = parse_term(&terms, 2)?;

        let sample_sizes = if let Some(flag) = terms.iter().position(|&term| term == "-I") {
            let populations = parse_term(&terms, flag + 1)?;
            let sample_sizes = (flag + 2..flag + 2 + populations)
                .map(|i| parse_term(&terms, i))
                .collect::<Result<Vec<_>, _>>()?;

            let total = sample_sizes.iter().sum::<usize>();
            if total != samples {
                return Err(ParseMsError::SampleSizeMismatch { samples, total });
            }

            sample_sizes
        } else {
            vec![samples]
        };

        Ok(Self {
            sample_sizes,
            replicates,
        })
    }

    /// Returns the population index of each haplotype in order.
    fn populations(&self) -> impl Iterator<Item = usize> + '_ {
        self.sample_sizes
            .iter()
            .enumerate()
            .flat_map(|(population, &n)| std::iter::repeat(population).take(n))
    }
}

fn parse_term(terms: &[&str], i: usize) -> Result<usize, ParseMsError> {
    terms
        .get(i)
        .ok_or_else(|| ParseMsError::UnrecognizedCommand(terms.join(" ")))?
        .parse()
        .map_err(ParseMsError::from)
}

/// An error associated with parsing the `ms` format.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseMsError {
    /// The input contained no command line.
    Empty,
    /// A haplotype line had a character other than `0` or `1`.
    InvalidAllele(char),
    /// A haplotype line had the wrong number of sites.
    HaplotypeLength {
        /// The number of segregating sites in the replicate.
        expected: usize,
        /// The length of the haplotype line.
        found: usize,
    },
    /// A replicate ended before all haplotypes were read.
    MissingHaplotypes,
    /// A replicate with segregating sites lacked a positions line.
    MissingPositions,
    /// The input ended before the declared number of replicates.
    MissingReplicates {
        /// The number of replicates declared in the command line.
        expected: usize,
        /// The number of replicates read.
        found: usize,
    },
    /// A replicate lacked a segregating sites line.
    MissingSegregatingSites,
    /// An integer could not be parsed.
    ParseInt(ParseIntError),
    /// The population sample sizes do not add up to the total number of samples.
    SampleSizeMismatch {
        /// The total number of samples.
        samples: usize,
        /// The sum of the population sample sizes.
        total: usize,
    },
    /// The command line was not recognised as an `ms` command.
    UnrecognizedCommand(String),
}

impl From<ParseIntError> for ParseMsError {
    fn from(e: ParseIntError) -> Self {
        Self::ParseInt(e)
    }
}

impl fmt::Display for ParseMsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseMsError::Empty => f.write_str("empty ms input"),
            ParseMsError::InvalidAllele(c) => write!(f, "invalid allele '{c}' in ms haplotype"),
            ParseMsError::HaplotypeLength { expected, found } => write!(
                f,
                "ms haplotype has {found} sites, expected {expected} segregating sites"
            ),
            ParseMsError::MissingHaplotypes => f.write_str("ms replicate has too few haplotypes"),
            ParseMsError::MissingPositions => f.write_str("ms replicate has no positions line"),
            ParseMsError::MissingReplicates { expected, found } => write!(
                f,
                "ms command declares {expected} replicates, found only {found}"
            ),
            ParseMsError::MissingSegregatingSites => {
                f.write_str("ms replicate has no segsites line")
            }
            ParseMsError::ParseInt(e) => write!(f, "failed to parse integer in ms input: {e}"),
            ParseMsError::SampleSizeMismatch { samples, total } => write!(
                f,
                "ms population sample sizes sum to {total}, expected {samples}"
            ),
            ParseMsError::UnrecognizedCommand(command) => {
                write!(f, "unrecognized ms command '{command}'")
            }
        }
    }
}

impl std::error::Error for ParseMsError {}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_POPULATIONS: &str = "\
ms 4 2 -t 2.0 -I 2 2 2 -ej 0.5 2 1
7 8 9

//
segsites: 3
positions: 0.1000 0.5000 0.9000
100
110
001
011

//
segsites: 0

";

    #[test]
    fn test_parse_command() {
        assert_eq!(
            Command::parse("ms 20 100 -t 5.0").unwrap(),
            Command {
                sample_sizes: vec![20],
                replicates: 100,
            }
        );

        assert_eq!(
            Command::parse("./ms 20 1 -t 5.0 -I 2 10 10 1.5").unwrap(),
            Command {
                sample_sizes: vec![10, 10],
                replicates: 1,
            }
        );
    }

    #[test]
    fn test_parse_command_errors() {
        assert!(matches!(
            Command::parse("slim 20 100"),
            Err(ParseMsError::UnrecognizedCommand(_))
        ));

        assert_eq!(
            Command::parse("ms 20 1 -I 2 10 9"),
            Err(ParseMsError::SampleSizeMismatch {
                samples: 20,
                total: 19
            })
        );

        assert!(matches!(
            Command::parse("ms 20"),
            Err(ParseMsError::UnrecognizedCommand(_))
        ));
    }

    #[test]
    fn test_parse_two_populations() {
        let scs = parse_scs(TWO_POPULATIONS).unwrap();

        // Site 1: pop 1 has 2 derived, pop 2 has 0
        // Site 2: pop 1 has 1 derived, pop 2 has 1
        // Site 3: pop 1 has 0 derived, pop 2 has 2
        let mut expected = Scs::from_zeros([3, 3]);
        expected[[2, 0]] = 1.0;
        expected[[1, 1]] = 1.0;
        expected[[0, 2]] = 1.0;

        assert_eq!(scs, expected);
    }

    #[test]
    fn test_parse_sums_replicates() {
        let src = "ms 2 2 -t 1.0\n1 2 3\n//\nsegsites: 1\npositions: 0.5\n1\n0\n//\nsegsites: 2\npositions: 0.1 0.2\n10\n01\n";

        assert_eq!(parse_scs(src).unwrap(), Scs::new([0., 3., 0.], 3).unwrap());
    }

    #[test]
    fn test_parse_missing_replicates() {
        let src = "ms 2 3 -t 1.0\n1 2 3\n//\nsegsites: 0\n";

        assert_eq!(
            parse_scs(src),
            Err(ParseMsError::MissingReplicates {
                expected: 3,
                found: 1
            })
        );
    }

    #[test]
    fn test_parse_invalid_haplotypes() {
        let src = "ms 2 1\n1 2 3\n//\nsegsites: 2\npositions: 0.1 0.2\n10\n1\n";
        assert_eq!(
            parse_scs(src),
            Err(ParseMsError::HaplotypeLength {
                expected: 2,
                found: 1
            })
        );

        let src = "ms 2 1\n1 2 3\n//\nsegsites: 2\npositions: 0.1 0.2\n10\n1x\n";
        assert_eq!(parse_scs(src), Err(ParseMsError::InvalidAllele('x')));

        let src = "ms 2 1\n1 2 3\n//\nsegsites: 2\npositions: 0.1 0.2\n10\n";
        assert_eq!(parse_scs(src), Err(ParseMsError::MissingHaplotypes));
    }

    #[test]
    fn test_parse_huge_segsites() {
        let src = format!(
            "ms 2 1\n1 2 3\n//\nsegsites: {}\npositions: 0.1 0.2\n10\n01\n",
            usize::MAX
        );

        assert_eq!(
            parse_scs(&src),
            Err(ParseMsError::HaplotypeLength {
                expected: usize::MAX,
                found: 2
            })
        );

        let src = "ms 2 1\n1 2 3\n//\nsegsites: 1000000000000\npositions: 0.1\n";
        assert_eq!(parse_scs(src), Err(ParseMsError::MissingHaplotypes));
    }
}
