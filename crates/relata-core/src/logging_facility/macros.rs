//! Canonical logging macros
//!
//! These macros provide a structured, consistent way to log operations.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use relata_core::log_op_start;
/// log_op_start!("patch_relationship");
/// log_op_start!("patch_relationship", resource_type = "tasks");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = relata_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = relata_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use relata_core::log_op_end;
/// log_op_end!("patch_relationship", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = relata_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = relata_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error with its stable code
///
/// # Example
///
/// ```
/// # use relata_core::log_op_error;
/// # use relata_core::errors::RelataError;
/// let err = RelataError::AlreadyInitialized;
/// log_op_error!("init", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = relata_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?$err.kind(),
            err.code = $err.code(),
            err.message = %$err,
        );
    }};
}
