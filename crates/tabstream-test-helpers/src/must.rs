//! Unwrap helpers with good error messages.
//!
//! These replace `unwrap()` and `expect()` in test code. The synchronous
//! helpers carry `#[track_caller]` so panics point at the test line; the
//! stream helpers name the expectation that failed instead.

use std::fmt::Debug;

use tabstream::{MalformedRecordError, RecordStream, StreamError};

/// Unwrap a `Result`, panicking with the error value.
///
/// ```rust
/// use tabstream_test_helpers::must;
///
/// let result: Result<i32, &str> = Ok(42);
/// assert_eq!(must(result), 42);
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap an `Option`, panicking with `msg` if `None`.
///
/// # Panics
///
/// Panics if the option is `None`.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// Expect a construction error of the given shape.
///
/// # Panics
///
/// Panics if the result is `Ok` or the error does not satisfy `check`.
#[track_caller]
pub fn must_fail_with<T, F>(result: Result<T, StreamError>, check: F) -> StreamError
where
    F: FnOnce(&StreamError) -> bool,
{
    match result {
        Ok(_) => panic!("must_fail_with: expected an error, got Ok"),
        Err(e) if check(&e) => e,
        Err(e) => panic!("must_fail_with: unexpected error kind: {e:?}"),
    }
}

/// Pull the next record, panicking on an error or end of stream.
///
/// # Panics
///
/// Panics if the stream yields an error or `None`.
pub async fn must_next<R>(stream: &mut RecordStream<R>) -> R
where
    R: Send + 'static,
{
    match stream.next().await {
        Some(Ok(record)) => record,
        Some(Err(e)) => panic!("must_next: stream yielded an error: {e}"),
        None => panic!("must_next: stream ended early"),
    }
}

/// Pull the next item and expect a malformed-line error.
///
/// # Panics
///
/// Panics on a record, a different error, or end of stream.
pub async fn must_malformed<R>(stream: &mut RecordStream<R>) -> MalformedRecordError
where
    R: Send + Debug + 'static,
{
    match stream.next().await {
        Some(Err(StreamError::Malformed(e))) => e,
        Some(Err(e)) => panic!("must_malformed: unexpected error: {e}"),
        Some(Ok(record)) => panic!("must_malformed: got a record: {record:?}"),
        None => panic!("must_malformed: stream ended early"),
    }
}

/// Expect end of stream.
///
/// # Panics
///
/// Panics if the stream yields anything.
pub async fn must_end<R>(stream: &mut RecordStream<R>)
where
    R: Send + Debug + 'static,
{
    match stream.next().await {
        None => {}
        Some(Ok(record)) => panic!("must_end: got a record: {record:?}"),
        Some(Err(e)) => panic!("must_end: got an error: {e}"),
    }
}

/// Drain every record, panicking on the first error.
///
/// # Panics
///
/// Panics if the stream yields an error.
pub async fn drain<R>(stream: &mut RecordStream<R>) -> Vec<R>
where
    R: Send + 'static,
{
    let mut records = Vec::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(record) => records.push(record),
            Err(e) => panic!("drain: stream yielded an error after {} records: {e}", records.len()),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_must_ok() {
        let result: Result<i32, &str> = Ok(42);
        assert_eq!(must(result), 42);
    }

    #[test]
    #[should_panic(expected = "must: unexpected Err")]
    fn test_must_err() {
        let result: Result<i32, &str> = Err("test error");
        let _ = must(result);
    }

    #[test]
    #[should_panic(expected = "must_some: expected value")]
    fn test_must_some_none() {
        let option: Option<i32> = None;
        let _ = must_some(option, "expected value");
    }

    #[test]
    fn test_must_fail_with_matching_kind() {
        let result: Result<(), StreamError> = Err(StreamError::config("nope"));
        let err = must_fail_with(result, |e| matches!(e, StreamError::Configuration(_)));
        assert!(err.is_construction_error());
    }

    #[test]
    #[should_panic(expected = "must_fail_with: unexpected error kind")]
    fn test_must_fail_with_wrong_kind() {
        let result: Result<(), StreamError> = Err(StreamError::Cancelled);
        let _ = must_fail_with(result, |e| matches!(e, StreamError::Configuration(_)));
    }
}
