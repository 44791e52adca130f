//! The step facade: everything a job step says to the orchestrator.

use crate::cause::root_cause_message;
use crate::command::CommandProperties;
use crate::context::Environment;
use crate::emitter::{issue, issue_command, issue_plain};
use crate::error::{Error, Result};
use crate::status::ExitCode;
use crate::value::{JsonSerializer, ValueSerializer};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::io::{self, Stdout, Write};
use std::panic::Location;

#[cfg(windows)]
const PATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const PATH_SEPARATOR: &str = ":";

/// Names of the variables the orchestrator and the step agree on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Variable holding the executable search path.
    pub path_var: String,

    /// Variable that turns on step debugging when set to `"1"`.
    pub debug_var: String,

    /// Separator placed after a prepended path entry.
    pub path_separator: String,

    /// Prefix of step inputs (e.g. `INPUT_TOKEN`).
    pub input_prefix: String,

    /// Prefix of state saved by an earlier phase (e.g. `STATE_pid`).
    pub state_prefix: String,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            path_var: "PATH".to_string(),
            debug_var: "RUNNER_DEBUG".to_string(),
            path_separator: PATH_SEPARATOR.to_string(),
            input_prefix: "INPUT_".to_string(),
            state_prefix: "STATE_".to_string(),
        }
    }
}

/// Options for [`Step::get_input_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputOptions {
    /// Fail if the input is missing or blank.
    pub required: bool,
}

impl InputOptions {
    /// Options for an input that must be supplied.
    pub fn required() -> Self {
        Self { required: true }
    }
}

/// A running job step.
///
/// Commands are written to `out` as they are issued. The environment is
/// passed in explicitly: read operations borrow it, and the two operations
/// that change it (`export_variable`, `add_path`) take it by value and hand
/// back the updated copy.
#[derive(Debug)]
pub struct Step<W: Write, S: ValueSerializer = JsonSerializer> {
    out: W,
    config: StepConfig,
    serializer: S,
    exit_code: ExitCode,
}

impl Step<Stdout> {
    /// A step writing to the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Step<W> {
    /// Create a step with the default config and JSON value conversion.
    pub fn new(out: W) -> Self {
        Self {
            out,
            config: StepConfig::default(),
            serializer: JsonSerializer,
            exit_code: ExitCode::Success,
        }
    }

    /// Start building a step.
    pub fn builder() -> StepBuilder<W> {
        StepBuilder::new()
    }
}

impl<W: Write, S: ValueSerializer> Step<W, S> {
    // -----------------------------------------------------------------
    // Variables
    // -----------------------------------------------------------------

    /// Set a variable for this step and every later step in the job.
    ///
    /// Non-string values are converted with the step's serializer.
    pub fn export_variable<T: Serialize + ?Sized>(
        &mut self,
        env: Environment,
        name: &str,
        value: &T,
    ) -> Result<Environment> {
        let converted = self.serializer.to_command_value(value)?;
        issue_command(
            &mut self.out,
            "set-env",
            Some(CommandProperties::named(name)),
            &converted,
        )?;

        tracing::debug!(name = %name, "Exported variable");
        Ok(env.with_var(name, converted))
    }

    /// Register a secret that the orchestrator masks in logs.
    pub fn set_secret(&mut self, secret: &str) -> Result<()> {
        issue(&mut self.out, "add-mask", secret)
    }

    /// Prepend `path` to the search path, for this step and later ones.
    pub fn add_path(&mut self, env: Environment, path: &str) -> Result<Environment> {
        issue(&mut self.out, "add-path", path)?;

        tracing::debug!(path = %path, var = %self.config.path_var, "Prepended path entry");
        Ok(env.with_path_prefix(&self.config.path_var, path, &self.config.path_separator))
    }

    /// Get an optional input, trimmed. Missing inputs read as `""`.
    pub fn get_input(&self, env: &Environment, name: &str) -> String {
        self.lookup_input(env, name).to_string()
    }

    /// Get an input, trimmed.
    ///
    /// The name is normalized (spaces to underscores, upper-cased) and looked
    /// up under the input prefix. With `required`, an input that is missing
    /// or only whitespace fails with [`Error::MissingRequiredInput`].
    pub fn get_input_with(
        &self,
        env: &Environment,
        name: &str,
        options: InputOptions,
    ) -> Result<String> {
        let value = self.lookup_input(env, name);
        if options.required && value.is_empty() {
            return Err(Error::MissingRequiredInput {
                name: name.to_string(),
            });
        }
        Ok(value.to_string())
    }

    fn lookup_input<'e>(&self, env: &'e Environment, name: &str) -> &'e str {
        let key = format!(
            "{}{}",
            self.config.input_prefix,
            name.replace(' ', "_").to_uppercase()
        );
        env.get(&key).trim()
    }

    /// Set an output of this step.
    pub fn set_output<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        let converted = self.serializer.to_command_value(value)?;
        issue_command(
            &mut self.out,
            "set-output",
            Some(CommandProperties::named(name)),
            &converted,
        )
    }

    /// Turn echoing of commands in the log on or off.
    pub fn set_command_echo(&mut self, enabled: bool) -> Result<()> {
        issue(&mut self.out, "echo", if enabled { "on" } else { "off" })
    }

    // -----------------------------------------------------------------
    // Results
    // -----------------------------------------------------------------

    /// Mark the step as failed and log `message` as an error.
    ///
    /// Never fails; the step keeps running so cleanup code can follow. The
    /// status stays `Failure` for the rest of the step.
    pub fn set_failed(&mut self, message: &str) {
        if !self.exit_code.is_failure() {
            tracing::debug!("Step marked as failed");
        }
        self.exit_code = ExitCode::Failure;

        if let Err(err) = self.error(message) {
            tracing::warn!(error = %err, "Could not report step failure");
        }
    }

    /// Like [`set_failed`](Self::set_failed), reporting the root cause of `err`.
    #[track_caller]
    pub fn set_failed_with(&mut self, err: &(dyn StdError + 'static)) {
        let message = root_cause_message(err, Location::caller());
        self.set_failed(&message);
    }

    /// The current outcome of the step.
    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    // -----------------------------------------------------------------
    // Logging
    // -----------------------------------------------------------------

    /// Whether step debugging is on.
    pub fn is_debug(&self, env: &Environment) -> bool {
        env.get(&self.config.debug_var) == "1"
    }

    /// Write a debug message, shown only when step debugging is on.
    pub fn debug(&mut self, message: &str) -> Result<()> {
        issue(&mut self.out, "debug", message)
    }

    /// Write a debug message describing the root cause of `err`.
    #[track_caller]
    pub fn debug_with(&mut self, err: &(dyn StdError + 'static)) -> Result<()> {
        let message = root_cause_message(err, Location::caller());
        self.debug(&message)
    }

    /// Add an error annotation.
    pub fn error(&mut self, message: &str) -> Result<()> {
        issue(&mut self.out, "error", message)
    }

    /// Add an error annotation describing the root cause of `err`.
    #[track_caller]
    pub fn error_with(&mut self, err: &(dyn StdError + 'static)) -> Result<()> {
        let message = root_cause_message(err, Location::caller());
        self.error(&message)
    }

    /// Add a warning annotation.
    pub fn warning(&mut self, message: &str) -> Result<()> {
        issue(&mut self.out, "warning", message)
    }

    /// Add a warning annotation describing the root cause of `err`.
    #[track_caller]
    pub fn warning_with(&mut self, err: &(dyn StdError + 'static)) -> Result<()> {
        let message = root_cause_message(err, Location::caller());
        self.warning(&message)
    }

    /// Write a plain log line. No command envelope, no escaping.
    pub fn info(&mut self, message: &str) -> Result<()> {
        issue_plain(&mut self.out, message)
    }

    /// Begin a foldable output group.
    pub fn start_group(&mut self, name: &str) -> Result<()> {
        issue(&mut self.out, "group", name)
    }

    /// End the current output group.
    pub fn end_group(&mut self) -> Result<()> {
        issue(&mut self.out, "endgroup", "")
    }

    /// Run `f` inside an output group.
    ///
    /// The group is closed after `f` returns, whatever it returned.
    pub fn group<T, F>(&mut self, name: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> T,
    {
        self.start_group(name)?;
        let result = f(self);
        self.end_group()?;
        Ok(result)
    }

    // -----------------------------------------------------------------
    // State
    // -----------------------------------------------------------------

    /// Save state that a later phase of this step can read with
    /// [`get_state`](Self::get_state). The local environment is not touched.
    pub fn save_state<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        let converted = self.serializer.to_command_value(value)?;
        issue_command(
            &mut self.out,
            "save-state",
            Some(CommandProperties::named(name)),
            &converted,
        )
    }

    /// Read state saved by an earlier phase, or `""`.
    pub fn get_state(&self, env: &Environment, name: &str) -> String {
        env.get(&format!("{}{}", self.config.state_prefix, name))
            .to_string()
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// The variable names this step uses.
    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    /// The output stream.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Consume the step, returning the output stream.
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Builder for creating steps.
#[derive(Debug)]
pub struct StepBuilder<W, S = JsonSerializer> {
    out: Option<W>,
    config: StepConfig,
    serializer: S,
}

impl<W: Write> StepBuilder<W> {
    /// Create a new step builder.
    pub fn new() -> Self {
        Self {
            out: None,
            config: StepConfig::default(),
            serializer: JsonSerializer,
        }
    }
}

impl<W: Write> Default for StepBuilder<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write, S: ValueSerializer> StepBuilder<W, S> {
    /// Set the output stream commands are written to.
    pub fn output(mut self, out: W) -> Self {
        self.out = Some(out);
        self
    }

    /// Replace the whole config.
    pub fn config(mut self, config: StepConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the variable holding the search path.
    pub fn path_var(mut self, name: &str) -> Self {
        self.config.path_var = name.to_string();
        self
    }

    /// Set the variable that turns on step debugging.
    pub fn debug_var(mut self, name: &str) -> Self {
        self.config.debug_var = name.to_string();
        self
    }

    /// Set the separator placed after a prepended path entry.
    pub fn path_separator(mut self, separator: &str) -> Self {
        self.config.path_separator = separator.to_string();
        self
    }

    /// Use a different value serializer.
    pub fn serializer<S2: ValueSerializer>(self, serializer: S2) -> StepBuilder<W, S2> {
        StepBuilder {
            out: self.out,
            config: self.config,
            serializer,
        }
    }

    /// Build the step. Fails if no output stream was set.
    pub fn build(self) -> Result<Step<W, S>> {
        let out = self
            .out
            .ok_or_else(|| Error::InvalidArgument("output stream is required".to_string()))?;

        Ok(Step {
            out,
            config: self.config,
            serializer: self.serializer,
            exit_code: ExitCode::Success,
        })
    }
}
