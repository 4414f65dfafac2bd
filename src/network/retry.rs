//! Retry combinator for transient OS conditions
//!
//! Interrupted system calls are never surfaced to callers. Every blocking
//! call goes through [`retry_interrupted`], or [`retry_transient`] when the
//! operation has its own transient set (accept).

use std::io;

use crate::error::OsCondition;

/// Repeat `op` while its error is classified as transient by `is_transient`
pub(crate) fn retry_transient<T>(
    is_transient: impl Fn(OsCondition) -> bool,
    mut op: impl FnMut() -> io::Result<T>,
) -> io::Result<T> {
    loop {
        match op() {
            Err(e) if is_transient(OsCondition::of(&e)) => {
                tracing::trace!("Retrying after transient condition: {}", e);
            }
            result => return result,
        }
    }
}

/// Repeat `op` while it fails with an interrupted call
pub(crate) fn retry_interrupted<T>(op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    retry_transient(|c| c == OsCondition::Interrupted, op)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_interrupted() {
        let mut calls = 0;
        let result = retry_interrupted(|| {
            calls += 1;
            if calls < 3 {
                Err(io::Error::from(io::ErrorKind::Interrupted))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_surfaces_would_block() {
        let mut calls = 0;
        let result: io::Result<()> = retry_interrupted(|| {
            calls += 1;
            Err(io::Error::from(io::ErrorKind::WouldBlock))
        });
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::WouldBlock);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_custom_transient_set() {
        let mut calls = 0;
        let result = retry_transient(
            |c| matches!(c, OsCondition::Interrupted | OsCondition::ConnectionAborted),
            || {
                calls += 1;
                match calls {
                    1 => Err(io::Error::from(io::ErrorKind::ConnectionAborted)),
                    2 => Err(io::Error::from(io::ErrorKind::Interrupted)),
                    _ => Ok("accepted"),
                }
            },
        );
        assert_eq!(result.unwrap(), "accepted");
        assert_eq!(calls, 3);
    }
}
