use std::fmt;

use thiserror::Error;

/// The call a [`ComponentError::Intercepted`] refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    CreateElement,
    Init,
    Render,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::CreateElement => "create-element",
            Phase::Init => "init",
            Phase::Render => "render",
        };
        f.write_str(name)
    }
}

/// Programmer errors raised by the component runtime.
///
/// None of these are retried internally; they propagate to the host
/// renderer's error boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    #[error("extension `{extension}` has been called outside of a component function")]
    OutsidePhase { extension: &'static str },

    #[error(
        "extension `{extension}` has been called after the initialization phase of component `{component}`"
    )]
    AfterInit {
        extension: &'static str,
        component: String,
    },

    #[error("component `{component}` mixes extension conventions: {detail}")]
    ConventionMismatch { component: String, detail: String },

    #[error("extensions are not allowed inside of stateless component `{component}`")]
    StatelessExtension { component: String },

    #[error("prop validation failed for component `{component}`: {message}")]
    InvalidProps { component: String, message: String },

    #[error("invalid render target `{target}`")]
    InvalidTarget { target: String },

    #[error("an interceptor withheld the {phase} call of component `{component}`")]
    Intercepted { component: String, phase: Phase },
}
