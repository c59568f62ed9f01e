//! Shared helpers for driving the `lenrich` binary in a scratch session.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A session directory plus an isolated credentials file.
pub struct Session {
    temp: TempDir,
    keys: bool,
}

impl Session {
    /// Session whose API keys are provided through the environment.
    pub fn with_keys() -> Self {
        Self {
            temp: tempfile::tempdir().expect("create temp dir"),
            keys: true,
        }
    }

    /// Session with no API keys anywhere.
    pub fn without_keys() -> Self {
        Self {
            keys: false,
            ..Self::with_keys()
        }
    }

    pub fn dir(&self) -> PathBuf {
        self.temp.path().join("session")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }

    /// A generator command that ignores the request and prints `response`.
    pub fn generator_command(&self, name: &str, response: &str) -> String {
        let path = self.write_file(name, response);
        let script = format!(
            "cat >/dev/null; cat {}",
            shell_words::quote(&path.display().to_string())
        );
        shell_words::join(["sh", "-c", script.as_str()])
    }

    /// Run `lenrich <args>`; session commands get `--session` appended.
    pub fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_lenrich"));
        cmd.args(args)
            .env("LENRICH_CREDENTIALS", self.path("credentials.json"))
            .env_remove("LENRICH_GENERATOR_URL")
            .env_remove("LENRICH_GENERATOR_COMMAND")
            .env_remove("RUST_LOG");
        if self.keys {
            cmd.env("FIRECRAWL_API_KEY", "fc-test")
                .env("OPENAI_API_KEY", "sk-test");
        } else {
            cmd.env_remove("FIRECRAWL_API_KEY")
                .env_remove("OPENAI_API_KEY");
        }
        if takes_session(args) {
            cmd.arg("--session").arg(self.dir());
        }
        cmd.output().expect("run lenrich")
    }

    pub fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "lenrich {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Run a command expected to fail and return its stderr.
    pub fn run_err(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "lenrich {args:?} unexpectedly succeeded: {}",
            String::from_utf8_lossy(&output.stdout)
        );
        String::from_utf8_lossy(&output.stderr).into_owned()
    }

    pub fn status(&self) -> Value {
        let stdout = self.run_ok(&["status", "--json"]);
        serde_json::from_str(&stdout).expect("parse status json")
    }

    pub fn read_json(&self, path: &Path) -> Value {
        let bytes = fs::read(path).expect("read json");
        serde_json::from_slice(&bytes).expect("parse json")
    }
}

fn takes_session(args: &[&str]) -> bool {
    match args {
        ["detect", ..] | ["keys", ..] | ["fields", "presets", ..] => false,
        _ => !args.is_empty(),
    }
}

/// Scenario dataset: a Work Email column with company and personal addresses.
pub const LEADS_CSV: &str = "\
Name,Work Email,Company
Ann,ann@acme.io,Acme
Bob,bob@gmail.com,
Cy,cy@globex.com,Globex
Dee,,Initech
Eve,not-an-email,Umbrella
";

/// Names of the selected fields in a status report.
pub fn selected_names(status: &Value) -> Vec<String> {
    status["selected_fields"]
        .as_array()
        .expect("selected_fields")
        .iter()
        .map(|field| field["name"].as_str().expect("name").to_string())
        .collect()
}
