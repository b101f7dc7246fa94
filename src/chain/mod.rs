//! Causally linked errors that remember where they were raised.
//!
//! Each layer that sees a failure wraps it in an [`ErrorChain`] node carrying
//! one line of local context and the caller's source location. The rendered
//! message pairs the outermost context with the original failure, while
//! [`ErrorChain::full_trace`] lists every hop from outermost to innermost.

use std::error::Error;
use std::fmt;
use std::panic::Location;

/// Upper bound on `source()` links followed by [`sources`].
const MAX_SOURCE_DEPTH: usize = 64;

/// Boxed error stored as the cause of a chain node.
pub type Cause = Box<dyn Error + Send + Sync + 'static>;

/// One node of a causal error chain.
#[derive(Debug)]
pub struct ErrorChain {
    message: String,
    location: Option<&'static Location<'static>>,
    cause: Option<Cause>,
}

impl ErrorChain {
    /// Creates a chain root with no cause, recording the caller's location.
    #[must_use]
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: Some(Location::caller()),
            cause: None,
        }
    }

    /// Wraps `cause` with a line of context, recording the caller's location.
    ///
    /// The cause may be another [`ErrorChain`] or any foreign error.
    #[must_use]
    #[track_caller]
    pub fn wrap<E>(cause: E, message: impl Into<String>) -> Self
    where
        E: Into<Cause>,
    {
        Self {
            message: message.into(),
            location: Some(Location::caller()),
            cause: Some(cause.into()),
        }
    }

    /// Same as [`ErrorChain::wrap`], but accepts an absent cause, in which
    /// case the node becomes a chain root.
    #[must_use]
    #[track_caller]
    pub fn wrap_optional<E>(cause: Option<E>, message: impl Into<String>) -> Self
    where
        E: Into<Cause>,
    {
        Self {
            message: message.into(),
            location: Some(Location::caller()),
            cause: cause.map(Into::into),
        }
    }

    /// Context message attached to this node.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Source location captured when this node was created.
    #[must_use]
    pub const fn location(&self) -> Option<&'static Location<'static>> {
        self.location
    }

    /// The error wrapped by this node, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Follows chain links to the first cause that is not an [`ErrorChain`].
    ///
    /// Returns the deepest chain node when the chain ends without a foreign
    /// cause, which is `self` for an unwrapped root.
    #[must_use]
    pub fn original_cause(&self) -> &(dyn Error + 'static) {
        let mut node = self;
        loop {
            let Some(cause) = node.cause.as_deref() else {
                return node;
            };
            match cause.downcast_ref::<Self>() {
                Some(inner) => node = inner,
                None => return cause,
            }
        }
    }

    /// Renders `"<message>: <original message>"`, or just the message when
    /// this node is its own original.
    #[must_use]
    pub fn short_message(&self) -> String {
        let original = self.original_cause();
        if std::ptr::addr_eq(original as *const dyn Error, self as *const Self) {
            return self.message.clone();
        }
        format!("{}: {original}", self.message)
    }

    /// Renders the short message followed by one `- file:line: message` line
    /// per chain node. Foreign causes only appear in the short message.
    #[must_use]
    pub fn full_trace(&self) -> String {
        let mut lines = Vec::new();
        let mut node = Some(self);
        while let Some(current) = node {
            lines.push(current.trace_line());
            node = current
                .cause
                .as_deref()
                .and_then(|cause| cause.downcast_ref::<Self>());
        }
        format!("{}\n- {}", self.short_message(), lines.join("\n- "))
    }

    /// Returns the first error of type `E` anywhere in the source chain,
    /// including this node and foreign causes below it.
    #[must_use]
    pub fn find<E>(&self) -> Option<&E>
    where
        E: Error + 'static,
    {
        sources(self).find_map(|err| err.downcast_ref::<E>())
    }

    /// Reports whether an error of type `E` appears in the source chain.
    #[must_use]
    pub fn is<E>(&self) -> bool
    where
        E: Error + 'static,
    {
        self.find::<E>().is_some()
    }

    fn trace_line(&self) -> String {
        match self.location {
            Some(location) => format!(
                "{}:{}: {}",
                location.file(),
                location.line(),
                self.message
            ),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for ErrorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_message())
    }
}

impl Error for ErrorChain {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}

/// Returns the original cause of `err` when it is an [`ErrorChain`], or
/// `err` itself otherwise. Applying it to its own result is a no-op.
#[must_use]
pub fn original_cause<'a>(err: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    match err.downcast_ref::<ErrorChain>() {
        Some(chain) => chain.original_cause(),
        None => err,
    }
}

/// Iterates `err` and its `source()` links.
///
/// Iteration stops at an error reporting itself as its own source and after
/// a fixed number of hops, so misbehaving foreign errors cannot loop.
#[must_use]
pub const fn sources<'a>(err: &'a (dyn Error + 'static)) -> Sources<'a> {
    Sources {
        next: Some(err),
        depth: 0,
    }
}

/// Iterator returned by [`sources`].
#[derive(Debug)]
pub struct Sources<'a> {
    next: Option<&'a (dyn Error + 'static)>,
    depth: usize,
}

impl<'a> Iterator for Sources<'a> {
    type Item = &'a (dyn Error + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if self.depth >= MAX_SOURCE_DEPTH {
            return None;
        }
        self.depth += 1;
        self.next = current.source().filter(|source| {
            !std::ptr::addr_eq(*source as *const dyn Error, current as *const dyn Error)
        });
        Some(current)
    }
}

/// Adds chain context to fallible results.
pub trait ResultExt<T> {
    /// Wraps the error, if any, with `message` and the caller's location.
    ///
    /// # Errors
    ///
    /// Returns the wrapped error when `self` is `Err`.
    fn context(self, message: impl Into<String>) -> Result<T, ErrorChain>;

    /// Like [`ResultExt::context`], building the message only on failure.
    ///
    /// # Errors
    ///
    /// Returns the wrapped error when `self` is `Err`.
    fn with_context<F, M>(self, message: F) -> Result<T, ErrorChain>
    where
        F: FnOnce() -> M,
        M: Into<String>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<Cause>,
{
    #[track_caller]
    fn context(self, message: impl Into<String>) -> Result<T, ErrorChain> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(ErrorChain::wrap(err, message)),
        }
    }

    #[track_caller]
    fn with_context<F, M>(self, message: F) -> Result<T, ErrorChain>
    where
        F: FnOnce() -> M,
        M: Into<String>,
    {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(ErrorChain::wrap(err, message())),
        }
    }
}

#[cfg(test)]
mod tests;
