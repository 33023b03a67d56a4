//! Declarative macros for ergonomic effect construction
//!
//! Reducers build most of their effects from API calls, so the common case
//! is wrapping an async block into an `Effect::Future`.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use bookflow_core::async_effect;
///
/// let backend = Arc::clone(&env.backend);
/// async_effect! {
///     match backend.flow_steps(flow_id).await {
///         Ok(steps) => Some(WizardAction::StepsLoaded { steps }),
///         Err(error) => Some(WizardAction::LoadFailed { error: error.to_string() }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use bookflow_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(4),
///     action: AdminAction::DismissToast { id }
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}
