// App-layer error type. Anything that goes wrong above the decoder itself
// (opening or mapping a file, emitting XML, scanning terrain) funnels into
// one backtrace-carrying value. Centralizing construction here gives us:
// 1. A backtrace captured at the point of failure
// 2. One place to set a breakpoint to trap any error soon after creation
// 3. One place that emits the error into the tracing/logging system

use backtrace_error::DynBacktraceError;
use std::borrow::Cow;
use tracing::error;

#[cfg(test)]
use test_log::test;

#[derive(Debug)]
pub struct Error(DynBacktraceError);
pub type Result<T> = std::result::Result<T, Error>;

struct Msg(Cow<'static, str>);
impl std::fmt::Debug for Msg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for Msg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for Msg {}

impl<E: std::error::Error + Send + Sync + 'static> From<E> for Error {
    fn from(err: E) -> Error {
        Error::new(err)
    }
}

impl Error {
    pub fn new<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
        error!(target: "rbxfile", "{:?}", err);
        Error(DynBacktraceError::from(err))
    }
}

pub fn err(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::new(Msg(msg.into()))
}

#[test]
fn test_error() {
    let e = err("test error");
    assert!(format!("{:?}", e).contains("test error"));
}
