//! # step-commands
//!
//! Talk to a pipeline orchestrator from inside a job step.
//!
//! The orchestrator only sees the step's standard output and the variables it
//! launched the step with. Structured signals (exported variables, masked
//! secrets, outputs, saved state, annotations, log groups) travel as workflow
//! commands, one per line:
//!
//! ```text
//! ::set-output name=version::1.4.2
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use step_commands::{Environment, InputOptions, Step};
//!
//! let env = Environment::from_process();
//! let mut step = Step::stdout();
//!
//! let token = step.get_input_with(&env, "api token", InputOptions::required())?;
//! step.set_secret(&token)?;
//!
//! let env = step.export_variable(env, "DEPLOY_TARGET", "staging")?;
//! step.group("Deploy", |step| step.info(&format!("deploying to {}", env.get("DEPLOY_TARGET"))))??;
//! step.set_output("deployed", &true)?;
//!
//! std::process::exit(step.exit_code().code());
//! # Ok::<(), step_commands::Error>(())
//! ```

pub mod cause;
pub mod command;
mod context;
pub mod emitter;
mod error;
mod status;
mod step;
pub mod value;

pub use command::{Command, CommandProperties};
pub use context::Environment;
pub use error::{Error, Result};
pub use status::ExitCode;
pub use step::{InputOptions, Step, StepBuilder, StepConfig};
pub use value::{JsonSerializer, ValueSerializer};
