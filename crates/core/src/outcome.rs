use crate::errors::Error;

/// Result of running one task in a batch.
///
/// The batch runner returns exactly one `Outcome` per submitted task, in
/// submission order, so callers can correlate entries back to inputs by
/// position regardless of completion order.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    Failure(Error),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn as_success(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<T, Error> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(err) => Err(err),
        }
    }
}

impl<T> From<Result<T, Error>> for Outcome<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(err) => Outcome::Failure(err),
        }
    }
}

/// Drop failures and keep successful values, preserving order.
pub fn successes<T>(outcomes: Vec<Outcome<T>>) -> Vec<T> {
    outcomes
        .into_iter()
        .filter_map(Outcome::success)
        .collect()
}
