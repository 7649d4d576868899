use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, TrainError};

/// A labeled dataset: ordered (input, target) pairs of fixed arity.
///
/// Immutable during training and shared read-only across worker threads.
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub num_input: usize,
    pub num_output: usize,
    pub inputs: Vec<Vec<f64>>,
    pub targets: Vec<Vec<f64>>,
}

impl TrainingData {
    /// Builds a dataset from in-memory vectors, checking that every pair
    /// matches the arity of the first.
    pub fn new(inputs: Vec<Vec<f64>>, targets: Vec<Vec<f64>>) -> Result<TrainingData> {
        if inputs.len() != targets.len() {
            return Err(TrainError::InvalidConfiguration(format!(
                "{} inputs but {} targets", inputs.len(), targets.len()
            )));
        }
        if inputs.is_empty() {
            return Err(TrainError::InvalidConfiguration("dataset is empty".into()));
        }
        let num_input = inputs[0].len();
        let num_output = targets[0].len();
        for input in &inputs {
            if input.len() != num_input {
                return Err(TrainError::DimensionMismatch { expected: num_input, found: input.len() });
            }
        }
        for target in &targets {
            if target.len() != num_output {
                return Err(TrainError::DimensionMismatch { expected: num_output, found: target.len() });
            }
        }
        Ok(TrainingData { num_input, num_output, inputs, targets })
    }

    /// Reads a dataset in the classic text format: a header line
    /// `num_pairs num_input num_output`, then for each pair one line of
    /// inputs and one line of targets, whitespace-separated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<TrainingData> {
        let file = File::open(path)?;
        let mut lines = BufReader::new(file).lines().enumerate();

        let (num_pairs, num_input, num_output) = {
            let (idx, line) = lines.next().ok_or_else(|| TrainError::DatasetFormat {
                line: 1,
                msg: "file is empty".into(),
            })?;
            let line = line?;
            let header: Vec<usize> = line
                .split_whitespace()
                .map(|tok| tok.parse().map_err(|_| TrainError::DatasetFormat {
                    line: idx + 1,
                    msg: format!("bad header value `{tok}`"),
                }))
                .collect::<Result<_>>()?;
            match header[..] {
                [pairs, ni, no] => (pairs, ni, no),
                _ => return Err(TrainError::DatasetFormat {
                    line: idx + 1,
                    msg: "header must be `num_pairs num_input num_output`".into(),
                }),
            }
        };

        let mut inputs = Vec::with_capacity(num_pairs);
        let mut targets = Vec::with_capacity(num_pairs);

        for _ in 0..num_pairs {
            inputs.push(read_vector(&mut lines, num_input)?);
            targets.push(read_vector(&mut lines, num_output)?);
        }

        TrainingData::new(inputs, targets)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn example(&self, i: usize) -> (&[f64], &[f64]) {
        (&self.inputs[i], &self.targets[i])
    }
}

/// Parses the next non-empty line as exactly `arity` floats.
fn read_vector<I>(lines: &mut I, arity: usize) -> Result<Vec<f64>>
where
    I: Iterator<Item = (usize, std::io::Result<String>)>,
{
    for (idx, line) in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let values: Vec<f64> = line
            .split_whitespace()
            .map(|tok| tok.parse().map_err(|_| TrainError::DatasetFormat {
                line: idx + 1,
                msg: format!("bad float `{tok}`"),
            }))
            .collect::<Result<_>>()?;
        if values.len() != arity {
            return Err(TrainError::DatasetFormat {
                line: idx + 1,
                msg: format!("expected {} values, found {}", arity, values.len()),
            });
        }
        return Ok(values);
    }
    Err(TrainError::DatasetFormat {
        line: 0,
        msg: "unexpected end of file".into(),
    })
}
