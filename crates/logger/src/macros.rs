//! Logging macros
//!
//! Each macro takes the logger first, followed by `format!` arguments, and
//! records file, line and module path of the call site:
//!
//! ```
//! use sluice_logger::{info, StdoutLogger};
//!
//! let logger = StdoutLogger::new();
//! let port = 8080;
//! info!(logger, "listening on {port}");
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! __emit {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        #[allow(unused_imports)]
        use $crate::Logger as _;
        let logger = &$logger;
        let level: $crate::Level = $level;
        if logger.is_enabled(level) {
            // the match keeps format_args! temporaries alive
            #[allow(clippy::match_single_binding)]
            let message: ::std::borrow::Cow<'static, str> = match ::std::format_args!($($arg)+) {
                args => match args.as_str() {
                    ::std::option::Option::Some(s) => ::std::borrow::Cow::Borrowed(s),
                    ::std::option::Option::None => {
                        ::std::borrow::Cow::Owned(::std::string::ToString::to_string(&args))
                    }
                },
            };
            logger.log(
                $crate::Record::new(level, message)
                    .with_target(::std::module_path!())
                    .with_location($crate::Location::new(
                        ::std::file!(),
                        ::std::line!(),
                        ::std::option::Option::Some(::std::module_path!()),
                    )),
            );
        }
    }};
}

/// Log a debug entry: `debug!(logger, "fmt", args..)`
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => { $crate::__emit!($logger, $crate::Level::Debug, $($arg)+) };
}

/// Log an info entry: `info!(logger, "fmt", args..)`
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => { $crate::__emit!($logger, $crate::Level::Info, $($arg)+) };
}

/// Log a warning: `warn!(logger, "fmt", args..)`
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => { $crate::__emit!($logger, $crate::Level::Warn, $($arg)+) };
}

/// Log an error: `error!(logger, "fmt", args..)`
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => { $crate::__emit!($logger, $crate::Level::Error, $($arg)+) };
}

/// Log a fatal entry: `fatal!(logger, "fmt", args..)`
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => { $crate::__emit!($logger, $crate::Level::Fatal, $($arg)+) };
}
