//! Call-site metadata

/// Where a log entry was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Source file as reported by the compiler
    pub file: &'static str,
    /// Line number
    pub line: u32,
    /// Enclosing function or module, when the call site supplied one
    pub function: Option<&'static str>,
}

impl Location {
    /// Build a location from explicit parts.
    #[must_use]
    pub const fn new(file: &'static str, line: u32, function: Option<&'static str>) -> Self {
        Self {
            file,
            line,
            function,
        }
    }

    /// Location of the code that called the current `#[track_caller]` chain.
    #[track_caller]
    #[must_use]
    pub fn caller() -> Self {
        let caller = std::panic::Location::caller();
        Self::new(caller.file(), caller.line(), None)
    }

    /// Last path component of [`Self::file`].
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        self.file.rsplit(['/', '\\']).next().unwrap_or(self.file)
    }

    /// Function name, or `???` when unknown.
    #[must_use]
    pub fn function_name(&self) -> &'static str {
        self.function.unwrap_or("???")
    }
}
