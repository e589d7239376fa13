// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider command adapters.
//!
//! Each known CLI family gets an adapter that renders a non-interactive
//! invocation reading its prompt on stdin. Unknown providers fall back to
//! [`GenericCli`], which runs the provider name as the executable with no
//! extra flags — new CLI families work without a code change as long as
//! they follow that convention.

use errand_core::Provider;

/// Renders the command line for one provider family.
pub trait ProviderCommand: Send + Sync {
    /// Executable name resolved on PATH.
    fn program(&self) -> &str;

    /// Arguments for a non-interactive run that reads the prompt on stdin.
    fn base_args(&self) -> Vec<String>;
}

/// `codex exec -` reads the prompt from stdin in non-interactive mode.
pub struct CodexCli;

impl ProviderCommand for CodexCli {
    fn program(&self) -> &str {
        "codex"
    }

    fn base_args(&self) -> Vec<String> {
        vec!["exec".to_string(), "-".to_string()]
    }
}

/// The gemini CLI takes its prompt from stdin when run headless.
pub struct GeminiCli;

impl ProviderCommand for GeminiCli {
    fn program(&self) -> &str {
        "gemini"
    }

    fn base_args(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Fallback for providers without a dedicated adapter.
pub struct GenericCli {
    name: String,
}

impl ProviderCommand for GenericCli {
    fn program(&self) -> &str {
        &self.name
    }

    fn base_args(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Dispatch to the adapter for a provider.
pub fn adapter_for(provider: &Provider) -> Box<dyn ProviderCommand> {
    match provider {
        Provider::Codex => Box::new(CodexCli),
        Provider::Gemini => Box::new(GeminiCli),
        Provider::Other(name) => Box::new(GenericCli { name: name.to_string() }),
    }
}

/// A fully rendered invocation: program plus arguments, prompt on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Build the invocation for a provider with caller-supplied extra args.
    pub fn build(provider: &Provider, extra_args: &[String]) -> Self {
        let adapter = adapter_for(provider);
        let mut args = adapter.base_args();
        args.extend(extra_args.iter().cloned());
        Self { program: adapter.program().to_string(), args }
    }

    /// Shell-quoted rendering, for the wrapper script and the job record's
    /// `command` field.
    pub fn render(&self) -> String {
        let mut parts = vec![shell_quote(&self.program)];
        parts.extend(self.args.iter().map(|a| shell_quote(a)));
        parts.join(" ")
    }
}

/// Quote a string for safe interpolation into a shell command
/// (single quotes escaped with the `'\''` idiom).
pub(crate) fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
