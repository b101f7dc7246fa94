//! Unit tests for chain construction and rendering.

use std::error::Error;
use std::fmt;
use std::io;

use rstest::rstest;

use super::{ErrorChain, ResultExt, original_cause, sources};

fn foreign() -> io::Error {
    io::Error::other("original error")
}

fn bare(message: &str, cause: Option<ErrorChain>) -> ErrorChain {
    ErrorChain {
        message: message.to_owned(),
        location: None,
        cause: cause.map(|inner| Box::new(inner) as super::Cause),
    }
}

#[derive(Debug)]
struct SelfReferential;

impl fmt::Display for SelfReferential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("loops forever")
    }
}

impl Error for SelfReferential {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self)
    }
}

#[test]
fn new_records_caller_location() {
    let err = ErrorChain::new("original error");
    let line = line!() - 1;

    let location = err.location().expect("location should be captured");
    assert_eq!(location.file(), file!());
    assert_eq!(location.line(), line);
    assert!(err.cause().is_none());
}

#[rstest]
#[case::root(bare("an error", None), "an error")]
#[case::nested(
    bare("an error", Some(bare("original message", None))),
    "an error: original message"
)]
#[case::deep(
    bare("an error", Some(bare("middle", Some(bare("original message", None))))),
    "an error: original message"
)]
fn short_message_pairs_outer_with_original(#[case] err: ErrorChain, #[case] expected: &str) {
    assert_eq!(err.short_message(), expected);
    assert_eq!(err.to_string(), expected);
}

#[test]
fn short_message_includes_foreign_original() {
    let err = ErrorChain::wrap(foreign(), "an error");
    assert_eq!(err.short_message(), "an error: original error");
}

#[test]
fn wrap_optional_without_cause_is_a_root() {
    let err = ErrorChain::wrap_optional(None::<io::Error>, "an error");
    assert_eq!(err.short_message(), "an error");
    assert!(err.cause().is_none());
}

#[test]
fn full_trace_lists_chain_nodes_outermost_first() {
    let innermost = ErrorChain {
        message: String::from("even more context"),
        location: None,
        cause: Some(Box::new(foreign())),
    };
    let mut err = ErrorChain::wrap(innermost, "more context");
    err.location = None;
    let err = ErrorChain::wrap(err, "some context");
    let outer = ErrorChain::wrap(err, "an error");
    let outer_line = line!() - 1;

    let trace = outer.full_trace();
    let lines: Vec<&str> = trace.lines().collect();

    assert_eq!(lines.len(), 5, "trace: {trace}");
    assert_eq!(lines[0], "an error: original error");
    assert_eq!(lines[1], format!("- {}:{outer_line}: an error", file!()));
    assert_eq!(lines[2], format!("- {}:{}: some context", file!(), outer_line - 1));
    assert_eq!(lines[3], "- more context");
    assert_eq!(lines[4], "- even more context");
}

#[test]
fn full_trace_of_root_has_single_line() {
    let err = ErrorChain::new(format!("{} occurred", "an error"));
    let line = line!() - 1;

    assert_eq!(
        err.full_trace(),
        format!("an error occurred\n- {}:{line}: an error occurred", file!())
    );
}

#[test]
fn original_cause_stops_at_first_foreign_error() {
    let err = ErrorChain::wrap(ErrorChain::wrap(foreign(), "some context"), "more context");
    let original = err.original_cause();

    assert!(original.downcast_ref::<io::Error>().is_some());
    assert_eq!(original.to_string(), "original error");
}

#[test]
fn original_cause_returns_deepest_chain_node() {
    let err = ErrorChain::wrap(ErrorChain::new("root"), "context");
    let original = err.original_cause();

    let chain = original
        .downcast_ref::<ErrorChain>()
        .expect("original should be a chain node");
    assert_eq!(chain.message(), "root");
}

#[test]
fn original_cause_is_idempotent() {
    let foreign_rooted = ErrorChain::wrap(foreign(), "context");
    let chain_rooted = ErrorChain::wrap(ErrorChain::new("root"), "context");

    for err in [&foreign_rooted, &chain_rooted] {
        let once = original_cause(err);
        let twice = original_cause(once);
        assert!(std::ptr::addr_eq(
            once as *const dyn Error,
            twice as *const dyn Error
        ));
    }
}

#[test]
fn find_reaches_through_nested_chains() {
    let err = ErrorChain::wrap(ErrorChain::wrap(foreign(), "inner"), "outer");

    let found = err.find::<io::Error>().expect("io error should be found");
    assert_eq!(found.kind(), io::ErrorKind::Other);
    assert!(err.is::<ErrorChain>());
    assert!(!err.is::<fmt::Error>());
}

#[test]
fn self_referential_source_terminates() {
    let err = ErrorChain::wrap(SelfReferential, "context");

    assert_eq!(err.short_message(), "context: loops forever");
    assert_eq!(sources(&err).count(), 2);
    assert!(!err.is::<io::Error>());
    assert!(err.is::<SelfReferential>());
}

#[test]
fn context_wraps_errors_at_call_site() {
    let result: Result<(), io::Error> = Err(foreign());
    let err = result.context("reading config").expect_err("should fail");
    let line = line!() - 1;

    assert_eq!(err.short_message(), "reading config: original error");
    let location = err.location().expect("location should be captured");
    assert_eq!(location.line(), line);
}

#[test]
fn with_context_leaves_success_untouched() {
    let result: Result<u8, io::Error> = Ok(7);
    let value = result
        .with_context(|| String::from("unused"))
        .expect("ok should pass through");
    assert_eq!(value, 7);
}
