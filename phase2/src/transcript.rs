//! Verification of a sequence of parameter files, either the whole history
//! of a ceremony or a window of consecutive files.

use crate::parameters::MPCParameters;
use setup_utils::{progress::report_progress_processing, CheckForCorrectness, Error, Result};

use ark_ec::pairing::Pairing;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info, info_span};

/// One contribution of the verified history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributionRecord {
    pub index: usize,
    /// Digest of the file the contribution was applied to.
    pub previous_digest: String,
    /// Digest of the file the contribution produced.
    pub digest: String,
}

/// The outcome of verifying a sequence of parameter files.
#[derive(Debug, Serialize)]
pub struct VerificationReport {
    pub valid: bool,
    /// Number of files checked.
    pub files: usize,
    /// Number of contributions recorded in the last file that could be read.
    pub contributions: usize,
    /// Every contribution of the last file, oldest first. Empty unless the sequence is valid.
    pub history: Vec<ContributionRecord>,
    /// Position in the sequence of the first file that is invalid.
    pub first_invalid_index: Option<usize>,
    pub error: Option<String>,
    pub error_kind: Option<String>,
    /// Transcript digest of the last file, when the sequence is valid.
    pub digest: Option<String>,
    #[serde(skip)]
    failure: Option<Error>,
}

impl VerificationReport {
    fn valid<E: Pairing>(sequence: &[MPCParameters<E>]) -> Self {
        let last = sequence.last();
        let history = last
            .map(|p| {
                let digests = p
                    .contributions
                    .iter()
                    .skip(1)
                    .map(|key| hex::encode(&key.transcript[..]))
                    .chain(std::iter::once(p.digest_hex()));
                p.contributions
                    .iter()
                    .zip(digests)
                    .enumerate()
                    .map(|(index, (key, digest))| ContributionRecord {
                        index,
                        previous_digest: hex::encode(&key.transcript[..]),
                        digest,
                    })
                    .collect()
            })
            .unwrap_or_default();
        VerificationReport {
            valid: true,
            files: sequence.len(),
            contributions: last.map(|p| p.contributions.len()).unwrap_or(0),
            history,
            first_invalid_index: None,
            error: None,
            error_kind: None,
            digest: last.map(|p| p.digest_hex()),
            failure: None,
        }
    }

    fn invalid(files: usize, contributions: usize, index: Option<usize>, failure: Error) -> Self {
        VerificationReport {
            valid: false,
            files,
            contributions,
            history: vec![],
            first_invalid_index: index,
            error: Some(failure.to_string()),
            error_kind: Some(failure.kind().to_string()),
            digest: None,
            failure: Some(failure),
        }
    }

    /// Converts the report into an error naming the first invalid file.
    pub fn into_result(self) -> Result<()> {
        match (self.failure, self.first_invalid_index) {
            (None, _) => Ok(()),
            (Some(source), Some(index)) => Err(Error::InvalidContribution {
                index,
                source: Box::new(source),
            }),
            (Some(failure), None) => Err(failure),
        }
    }
}

/// Verifies every adjacent pair of the sequence in parallel and reports the
/// smallest failing position. A sequence starting at a file without
/// contributions also checks that file is a well-formed initial file.
pub fn verify_transcript<E: Pairing>(sequence: &[MPCParameters<E>]) -> VerificationReport {
    let span = info_span!("phase2-verify", files = sequence.len());
    let _enter = span.enter();

    let first = match sequence.first() {
        Some(first) => first,
        None => {
            return VerificationReport::invalid(0, 0, None, Error::InvalidLength { expected: 1, got: 0 });
        }
    };

    let check_initial = first.contributions.is_empty();
    let failure = (0..sequence.len()).into_par_iter().find_map_first(|i| {
        let result = if i == 0 {
            if check_initial {
                first.verify_initial()
            } else {
                Ok(())
            }
        } else {
            let result = sequence[i - 1].verify(&sequence[i]);
            report_progress_processing("phase2-verify", i - 1, i, sequence.len() - 1);
            result
        };
        result.err().map(|e| (i, e))
    });

    match failure {
        Some((index, e)) => {
            error!(index, "invalid parameters: {}", e);
            let contributions = sequence[index].contributions.len();
            VerificationReport::invalid(sequence.len(), contributions, Some(index), e)
        }
        None => {
            let report = VerificationReport::valid(sequence);
            info!(contributions = report.contributions, "transcript verified");
            report
        }
    }
}

/// Decodes and verifies a sequence of encoded parameter files. A file that
/// cannot be decoded is reported at its position, unless an earlier pair
/// already fails.
pub fn verify_encoded<E: Pairing, B: AsRef<[u8]> + Sync>(
    files: &[B],
    check: CheckForCorrectness,
) -> VerificationReport {
    let decoded = files
        .par_iter()
        .map(|bytes| MPCParameters::<E>::read(bytes.as_ref(), check))
        .collect::<Vec<_>>();

    let readable = decoded.iter().take_while(|result| result.is_ok()).count();
    let mut sequence = Vec::with_capacity(readable);
    let mut decode_failure = None;
    for (i, result) in decoded.into_iter().enumerate() {
        match result {
            Ok(params) => sequence.push(params),
            Err(e) => {
                decode_failure = Some((i, e));
                break;
            }
        }
    }

    match decode_failure {
        None => verify_transcript(&sequence),
        Some((index, e)) => {
            // pairs before the unreadable file may fail first
            let report = verify_transcript(&sequence);
            if !report.valid && report.first_invalid_index.is_some() {
                return report;
            }
            error!(index, "could not decode parameters: {}", e);
            let contributions = sequence.last().map(|p| p.contributions.len()).unwrap_or(0);
            VerificationReport::invalid(files.len(), contributions, Some(index), e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::R1CS;
    use ark_bls12_381::{Bls12_381, Fr};
    use ark_std::UniformRand;
    use rand::thread_rng;
    use setup_utils::UseCompression;
    use test_helpers::{random_phase1, CubicCircuit};

    fn chain(contributions: usize) -> Vec<MPCParameters<Bls12_381>> {
        let rng = &mut thread_rng();
        let r1cs = R1CS::from_synthesizer(CubicCircuit::<Fr>::default()).unwrap();
        let phase1 = random_phase1::<Bls12_381, _>(8, rng).unwrap();
        let mut current = MPCParameters::new(&r1cs, &phase1).unwrap();
        let mut sequence = vec![current.clone()];
        for _ in 0..contributions {
            let delta = Fr::rand(rng);
            current.contribute(&delta, rng).unwrap();
            sequence.push(current.clone());
        }
        sequence
    }

    #[test]
    fn valid_chain() {
        let sequence = chain(3);
        let report = verify_transcript(&sequence);
        assert!(report.valid, "{:?}", report.error);
        assert_eq!(report.contributions, 3);
        assert_eq!(report.files, 4);
        assert_eq!(report.digest, Some(sequence[3].digest_hex()));
        // each contribution links the file before it to the file after it
        assert_eq!(report.history.len(), 3);
        for (i, record) in report.history.iter().enumerate() {
            assert_eq!(record.index, i);
            assert_eq!(record.previous_digest, sequence[i].digest_hex());
            assert_eq!(record.digest, sequence[i + 1].digest_hex());
        }
        report.into_result().unwrap();

        // a window in the middle of the history
        assert!(verify_transcript(&sequence[1..3]).valid);
    }

    #[test]
    fn empty_sequence_is_invalid() {
        let report = verify_transcript::<Bls12_381>(&[]);
        assert!(!report.valid);
        assert_eq!(report.first_invalid_index, None);
        assert!(report.into_result().is_err());
    }

    #[test]
    fn reports_smallest_failing_index() {
        let mut sequence = chain(3);
        // drop a file, its successor now carries two new contributions
        sequence.remove(2);
        let report = verify_transcript(&sequence);
        assert!(!report.valid);
        assert_eq!(report.first_invalid_index, Some(2));
        assert!(report.history.is_empty());

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, Error::InvalidContribution { index: 2, .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn undecodable_file_is_reported_at_its_index() {
        let sequence = chain(2);
        let mut files = sequence
            .iter()
            .map(|p| {
                let mut buf = vec![];
                p.write(&mut buf, UseCompression::Yes).unwrap();
                buf
            })
            .collect::<Vec<_>>();
        assert!(verify_encoded::<Bls12_381, _>(&files, CheckForCorrectness::Full).valid);

        files[1].truncate(100);
        let report = verify_encoded::<Bls12_381, _>(&files, CheckForCorrectness::Full);
        assert!(!report.valid);
        assert_eq!(report.first_invalid_index, Some(1));
        assert_eq!(report.error_kind.as_deref(), Some("CodecError"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["first_invalid_index"], 1);
    }
}
