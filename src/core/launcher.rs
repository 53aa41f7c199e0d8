use super::config::AppConfig;
use super::path_utils;
use super::selection::SelectionSet;
use super::vault::{EntryKind, VaultHostOperations};
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

/*
 * Turns a selection into a single editor invocation and runs it.
 *
 * Resolution is pure with respect to the vault snapshot: selected paths are
 * classified into folders and files, a directory wins over files, and only
 * the first directory is used. Launching is fire-and-forget: the process is
 * waited on by a worker thread and its outcome delivered through a callback.
 */

// Why an "open" request could not produce a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    BasePathUnavailable,
    NothingSelected,
}

impl std::fmt::Display for OpenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpenError::BasePathUnavailable => write!(f, "Vault base path is unavailable"),
            OpenError::NothingSelected => write!(f, "No files or directories selected"),
        }
    }
}

impl std::error::Error for OpenError {}

#[derive(Debug)]
pub enum LaunchError {
    Spawn(io::Error),
    NonZeroExit { code: Option<i32> },
}

impl From<io::Error> for LaunchError {
    fn from(err: io::Error) -> Self {
        LaunchError::Spawn(err)
    }
}

impl std::fmt::Display for LaunchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchError::Spawn(e) => write!(f, "Failed to start editor: {e}"),
            LaunchError::NonZeroExit { code: Some(code) } => {
                write!(f, "Editor exited with status {code}")
            }
            LaunchError::NonZeroExit { code: None } => {
                write!(f, "Editor was terminated by a signal")
            }
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaunchError::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchKind {
    Directory,
    Files,
}

/*
 * Selected paths split by kind, each list in selection order. Paths that no
 * longer resolve to anything in the vault are dropped.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

pub fn classify_selection(
    selection: &SelectionSet,
    host: &dyn VaultHostOperations,
) -> Classification {
    let mut classification = Classification::default();
    for path in selection.iter() {
        match host.entry_kind(path) {
            Some(EntryKind::Folder) => classification.directories.push(path.to_string()),
            Some(EntryKind::File) => classification.files.push(path.to_string()),
            None => log::debug!("Launcher: Selected path '{path}' no longer resolves, ignoring."),
        }
    }
    classification
}

/// The final editor invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    program: String,
    window_flag: String,
    paths: Vec<PathBuf>,
    kind: LaunchKind,
}

impl ResolvedCommand {
    pub fn new(program: &str, window_flag: &str, paths: Vec<PathBuf>, kind: LaunchKind) -> Self {
        ResolvedCommand {
            program: program.to_string(),
            window_flag: window_flag.to_string(),
            paths,
            kind,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn window_flag(&self) -> &str {
        &self.window_flag
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn kind(&self) -> LaunchKind {
        self.kind
    }

    // Shell form, each path double-quoted. Used for logging.
    pub fn display_line(&self) -> String {
        let mut line = format!("{} {}", self.program, self.window_flag);
        for path in &self.paths {
            line.push_str(&format!(" \"{}\"", path.display()));
        }
        line
    }
}

/*
 * Resolves the selection into an editor command.
 *
 * The base path is checked first; without it nothing else is looked at. If
 * any selected path is a folder, only the first one (in selection order) is
 * opened and every other selection is ignored. Otherwise all selected files
 * are opened together. With neither, `NothingSelected` is returned.
 */
pub fn resolve_open_command(
    selection: &SelectionSet,
    host: &dyn VaultHostOperations,
    config: &AppConfig,
) -> Result<ResolvedCommand, OpenError> {
    let base_path = host.base_path().ok_or(OpenError::BasePathUnavailable)?;
    let classification = classify_selection(selection, host);
    log::debug!(
        "Launcher: Classified selection into {} directories and {} files.",
        classification.directories.len(),
        classification.files.len()
    );

    if let Some(first_directory) = classification.directories.first() {
        if classification.directories.len() > 1 || !classification.files.is_empty() {
            log::info!(
                "Launcher: Opening only directory '{first_directory}'; ignoring {} other directories and {} files.",
                classification.directories.len() - 1,
                classification.files.len()
            );
        }
        let full_path = path_utils::join_vault_path(&base_path, first_directory);
        return Ok(ResolvedCommand::new(
            &config.editor_command,
            &config.window_flag,
            vec![full_path],
            LaunchKind::Directory,
        ));
    }

    if !classification.files.is_empty() {
        let full_paths = classification
            .files
            .iter()
            .map(|file| path_utils::join_vault_path(&base_path, file))
            .collect();
        return Ok(ResolvedCommand::new(
            &config.editor_command,
            &config.window_flag,
            full_paths,
            LaunchKind::Files,
        ));
    }

    Err(OpenError::NothingSelected)
}

#[derive(Debug)]
pub enum LaunchOutcome {
    Succeeded { kind: LaunchKind },
    Failed(LaunchError),
}

pub type LaunchCallback = Box<dyn FnOnce(LaunchOutcome) + Send + 'static>;

/*
 * Runs a resolved command. Implementations must start exactly one process per
 * call, must not block the caller until it exits, and must invoke
 * `on_complete` exactly once.
 */
pub trait ProcessLauncherOperations: Send + Sync {
    fn launch(&self, command: ResolvedCommand, on_complete: LaunchCallback);
}

type LaunchWork = Box<dyn FnOnce() + Send + 'static>;

// Starts `work` off the caller's thread.
type WorkerSpawner = fn(LaunchWork) -> io::Result<()>;

fn spawn_launch_thread(work: LaunchWork) -> io::Result<()> {
    thread::Builder::new()
        .name("editor-launch".to_string())
        .spawn(work)
        .map(|_| ())
}

// Hands out the completion callback at most once, whichever side gets there first.
fn take_callback(slot: &Mutex<Option<LaunchCallback>>) -> Option<LaunchCallback> {
    match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
}

pub struct CoreProcessLauncher {
    spawn_worker: WorkerSpawner,
}

impl CoreProcessLauncher {
    pub fn new() -> Self {
        CoreProcessLauncher {
            spawn_worker: spawn_launch_thread,
        }
    }

    fn run_to_completion(command: &ResolvedCommand) -> Result<(), LaunchError> {
        let output = Command::new(command.program())
            .arg(command.window_flag())
            .args(command.paths())
            .stdin(Stdio::null())
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            log::debug!("Launcher: stdout: {}", stdout.trim_end());
        }
        if !stderr.trim().is_empty() {
            log::warn!("Launcher: stderr: {}", stderr.trim_end());
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(LaunchError::NonZeroExit {
                code: output.status.code(),
            })
        }
    }
}

impl Default for CoreProcessLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLauncherOperations for CoreProcessLauncher {
    fn launch(&self, command: ResolvedCommand, on_complete: LaunchCallback) {
        log::info!("Launcher: Executing command: {}", command.display_line());
        let pending = Arc::new(Mutex::new(Some(on_complete)));
        let worker_pending = Arc::clone(&pending);
        let spawn_result = (self.spawn_worker)(Box::new(move || {
            let kind = command.kind();
            let outcome = match Self::run_to_completion(&command) {
                Ok(()) => LaunchOutcome::Succeeded { kind },
                Err(e) => {
                    log::error!("Launcher: '{}' failed: {e}", command.display_line());
                    LaunchOutcome::Failed(e)
                }
            };
            if let Some(callback) = take_callback(&worker_pending) {
                callback(outcome);
            }
        }));
        if let Err(e) = spawn_result {
            log::error!("Launcher: Failed to start launch thread: {e}");
            if let Some(callback) = take_callback(&pending) {
                callback(LaunchOutcome::Failed(LaunchError::Spawn(e)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vault::{CoreVaultHost, Result as VaultResult, VaultSnapshot};
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::mpsc;
    use std::time::Duration;

    struct FakeVault {
        base_path: Option<PathBuf>,
        kinds: HashMap<String, EntryKind>,
    }

    impl FakeVault {
        fn new(base_path: Option<&str>) -> Self {
            FakeVault {
                base_path: base_path.map(PathBuf::from),
                kinds: HashMap::new(),
            }
        }

        fn with_folder(mut self, path: &str) -> Self {
            self.kinds.insert(path.to_string(), EntryKind::Folder);
            self
        }

        fn with_file(mut self, path: &str) -> Self {
            self.kinds.insert(path.to_string(), EntryKind::File);
            self
        }
    }

    impl VaultHostOperations for FakeVault {
        fn snapshot(&self) -> VaultResult<VaultSnapshot> {
            Ok(VaultSnapshot::default())
        }
        fn entry_kind(&self, vault_relative: &str) -> Option<EntryKind> {
            self.kinds.get(vault_relative).copied()
        }
        fn base_path(&self) -> Option<PathBuf> {
            self.base_path.clone()
        }
    }

    fn selection(paths: &[&str]) -> SelectionSet {
        let mut set = SelectionSet::new();
        for path in paths {
            set.insert(path);
        }
        set
    }

    #[test]
    fn test_directory_takes_precedence_over_files() {
        let vault = FakeVault::new(Some("/vault"))
            .with_folder("folderA")
            .with_file("fileB.md");

        let command =
            resolve_open_command(&selection(&["folderA", "fileB.md"]), &vault, &AppConfig::default())
                .unwrap();

        assert_eq!(command.kind(), LaunchKind::Directory);
        assert_eq!(command.paths(), &[Path::new("/vault").join("folderA")]);
        assert_eq!(command.program(), "cursor");
        assert_eq!(command.window_flag(), "--new-window");
    }

    #[test]
    fn test_only_first_directory_is_opened() {
        let vault = FakeVault::new(Some("/vault"))
            .with_folder("second")
            .with_folder("first")
            .with_file("note.md");

        let command = resolve_open_command(
            &selection(&["note.md", "first", "second"]),
            &vault,
            &AppConfig::default(),
        )
        .unwrap();

        assert_eq!(command.paths(), &[Path::new("/vault").join("first")]);
    }

    #[test]
    fn test_files_opened_in_insertion_order_each_quoted() {
        let vault = FakeVault::new(Some("/vault"))
            .with_file("fileX.md")
            .with_file("fileY.md");

        let command =
            resolve_open_command(&selection(&["fileY.md", "fileX.md"]), &vault, &AppConfig::default())
                .unwrap();

        assert_eq!(command.kind(), LaunchKind::Files);
        let expected_y = Path::new("/vault").join("fileY.md");
        let expected_x = Path::new("/vault").join("fileX.md");
        assert_eq!(command.paths(), &[expected_y.clone(), expected_x.clone()]);
        assert_eq!(
            command.display_line(),
            format!(
                "cursor --new-window \"{}\" \"{}\"",
                expected_y.display(),
                expected_x.display()
            )
        );
    }

    #[test]
    fn test_empty_selection_is_nothing_selected() {
        let vault = FakeVault::new(Some("/vault"));
        assert_eq!(
            resolve_open_command(&SelectionSet::new(), &vault, &AppConfig::default()),
            Err(OpenError::NothingSelected)
        );
    }

    #[test]
    fn test_unresolvable_paths_count_as_nothing_selected() {
        let vault = FakeVault::new(Some("/vault"));
        assert_eq!(
            resolve_open_command(&selection(&["gone.md"]), &vault, &AppConfig::default()),
            Err(OpenError::NothingSelected)
        );
    }

    #[test]
    fn test_missing_base_path_wins_over_selection() {
        let vault = FakeVault::new(None).with_folder("folderA");
        assert_eq!(
            resolve_open_command(&selection(&["folderA"]), &vault, &AppConfig::default()),
            Err(OpenError::BasePathUnavailable)
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let vault = FakeVault::new(Some("/vault"))
            .with_file("a.md")
            .with_file("b/c.md");
        let selected = selection(&["a.md", "b/c.md"]);

        let first = resolve_open_command(&selected, &vault, &AppConfig::default());
        let second = resolve_open_command(&selected, &vault, &AppConfig::default());

        assert_eq!(first, second);
    }

    #[test]
    fn test_configured_editor_is_used() {
        let vault = FakeVault::new(Some("/vault")).with_file("a.md");
        let config = AppConfig {
            editor_command: "code".to_string(),
            ..AppConfig::default()
        };

        let command = resolve_open_command(&selection(&["a.md"]), &vault, &config).unwrap();

        assert!(command.display_line().starts_with("code --new-window "));
    }

    #[test]
    fn test_classify_keeps_selection_order() {
        let vault = FakeVault::new(Some("/vault"))
            .with_folder("z")
            .with_folder("a")
            .with_file("m.md");

        let classification = classify_selection(&selection(&["z", "m.md", "a", "missing"]), &vault);

        assert_eq!(classification.directories, vec!["z", "a"]);
        assert_eq!(classification.files, vec!["m.md"]);
    }

    #[test]
    fn test_relative_vault_root_resolves_to_absolute_paths() {
        // Unit tests run from the package root, which holds Cargo.toml.
        let vault = CoreVaultHost::new(PathBuf::from("."), Vec::new());

        let command =
            resolve_open_command(&selection(&["Cargo.toml"]), &vault, &AppConfig::default())
                .unwrap();

        assert_eq!(command.kind(), LaunchKind::Files);
        assert_eq!(command.paths().len(), 1);
        assert!(command.paths()[0].is_absolute());
        assert!(command.paths()[0].ends_with("Cargo.toml"));
        assert!(!command.display_line().contains("\"./"));
    }

    fn refuse_to_spawn(_work: LaunchWork) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::WouldBlock, "no threads available"))
    }

    #[test]
    fn test_thread_start_failure_still_reports_outcome() {
        let launcher = CoreProcessLauncher {
            spawn_worker: refuse_to_spawn,
        };
        let command = ResolvedCommand::new(
            "cursor",
            "--new-window",
            vec![PathBuf::from("/vault/a.md")],
            LaunchKind::Files,
        );
        let (tx, rx) = mpsc::channel();

        launcher.launch(
            command,
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );

        let outcomes: Vec<LaunchOutcome> = rx.try_iter().collect();
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            outcomes[0],
            LaunchOutcome::Failed(LaunchError::Spawn(_))
        ));
    }

    fn launch_and_wait(command: ResolvedCommand) -> LaunchOutcome {
        let (tx, rx) = mpsc::channel();
        CoreProcessLauncher::new().launch(
            command,
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );
        rx.recv_timeout(Duration::from_secs(10))
            .expect("launch callback was not invoked")
    }

    #[test]
    fn test_launch_missing_program_reports_spawn_failure() {
        let command = ResolvedCommand::new(
            "vault_opener_no_such_editor_binary",
            "--new-window",
            vec![PathBuf::from("/tmp")],
            LaunchKind::Directory,
        );

        let outcome = launch_and_wait(command);

        assert!(matches!(outcome, LaunchOutcome::Failed(LaunchError::Spawn(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_success_reports_kind() {
        let command = ResolvedCommand::new(
            "true",
            "--new-window",
            vec![PathBuf::from("/tmp/a.md")],
            LaunchKind::Files,
        );

        let outcome = launch_and_wait(command);

        assert!(matches!(
            outcome,
            LaunchOutcome::Succeeded {
                kind: LaunchKind::Files
            }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_nonzero_exit_is_failure() {
        let command = ResolvedCommand::new(
            "false",
            "--new-window",
            vec![PathBuf::from("/tmp")],
            LaunchKind::Directory,
        );

        let outcome = launch_and_wait(command);

        assert!(matches!(
            outcome,
            LaunchOutcome::Failed(LaunchError::NonZeroExit { code: Some(1) })
        ));
    }
}
