use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

/// A command, its args and its env vars. Not yet executed.
#[derive(Debug, Default, Clone)]
pub struct CommandBuilder {
    /// Path to the binary.
    pub program: PathBuf,
    /// Arguments to the binary.
    pub args: Vec<OsString>,
    /// Environment variables to set when the command runs.
    pub envs: Vec<(OsString, OsString)>,
    /// The directory to run the command in.
    pub cwd: Option<PathBuf>,
}

impl CommandBuilder {
    /// A `cargo` invocation routed to the given toolchain via the rustup shim.
    pub fn cargo(toolchain: &str) -> Self {
        Self {
            program: PathBuf::from("cargo"),
            args: vec![format!("+{toolchain}").into()],
            envs: vec![],
            cwd: None,
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the command.
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Set the working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Build an executable [`Command`].
    pub fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    /// Render the command for display purposes.
    pub fn display(&self) -> String {
        let mut rendered = self.program.display().to_string();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(&arg.to_string_lossy());
        }
        rendered
    }
}
