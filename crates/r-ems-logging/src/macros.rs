//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structured logging adapters and sinks."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Level-specific macros carrying a [`crate::LogContext`].

/// Shared expansion of the level macros.
#[doc(hidden)]
#[macro_export]
macro_rules! ems_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            $level,
            run = ctx.run.unwrap_or(""),
            model = ctx.model.unwrap_or(""),
            lib = ctx.lib.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with run and model context.
#[macro_export]
macro_rules! ems_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::ems_event!(tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::ems_event!(tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with run and model context.
#[macro_export]
macro_rules! ems_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::ems_event!(tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::ems_event!(tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning enriched with run and model context.
#[macro_export]
macro_rules! ems_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::ems_event!(tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::ems_event!(tracing::Level::WARN, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with run and model context.
#[macro_export]
macro_rules! ems_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::ems_event!(tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::ems_event!(tracing::Level::ERROR, $crate::LogContext::default(), $($arg)+)
    };
}
