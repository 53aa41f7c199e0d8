mod app_logic;
mod core;
mod platform_layer;

use crate::app_logic::VaultOpenerLogic;
use crate::core::{
    AppConfig, ConfigManagerOperations, CoreConfigManager, CoreProcessLauncher, CoreVaultHost,
    path_utils,
};
use crate::platform_layer::{PlatformEventHandler, PlatformInterface, PlatformResult};

use clap::Parser;
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, Once};

pub(crate) const APP_NAME: &str = "VaultOpener";
const LOG_FILENAME: &str = "vault_opener.log";

static LOGGING_INIT: Once = Once::new();

/*
 * Initializes logging once per process. The application logs everything at
 * debug level to a file in its config directory and prints warnings and
 * errors to stderr; tests log to stderr only.
 */
pub(crate) fn initialize_logging() {
    LOGGING_INIT.call_once(|| {
        let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

        if cfg!(test) {
            loggers.push(TermLogger::new(
                LevelFilter::Debug,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Never,
            ));
        } else {
            loggers.push(TermLogger::new(
                LevelFilter::Warn,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ));
            if let Some(config_dir) = path_utils::get_base_app_config_local_dir(APP_NAME) {
                match File::create(config_dir.join(LOG_FILENAME)) {
                    Ok(file) => loggers.push(WriteLogger::new(
                        LevelFilter::Debug,
                        Config::default(),
                        file,
                    )),
                    Err(e) => eprintln!("Failed to create log file in {config_dir:?}: {e}"),
                }
            }
        }

        if let Err(e) = CombinedLogger::init(loggers) {
            eprintln!("Failed to initialize logger: {e}");
        }
    });
}

#[derive(Parser, Debug, Default, PartialEq)]
#[command(name = "vault_opener")]
#[command(about = "Pick notes and folders from a vault and open them in an editor", long_about = None)]
struct CliArgs {
    /// Vault directory (default: the vault used last time, else the current directory)
    #[arg(value_name = "VAULT_PATH")]
    vault_path: Option<PathBuf>,

    /// Editor command to launch instead of the configured one
    #[arg(short, long)]
    editor: Option<String>,
}

/*
 * Picks the vault to open: the command line wins, then the vault used last
 * time, then the current directory. A vault given on the command line is
 * remembered for next time.
 */
fn resolve_vault_path(
    cli: &CliArgs,
    config: &mut AppConfig,
    config_manager: &dyn ConfigManagerOperations,
) -> PathBuf {
    if let Some(path) = &cli.vault_path {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.clone());
        if config.last_vault_path.as_ref() != Some(&absolute) {
            config.last_vault_path = Some(absolute.clone());
            if let Err(e) = config_manager.save_config(APP_NAME, config) {
                log::warn!("Main: Failed to save last vault path: {e}");
            }
        }
        return absolute;
    }
    config
        .last_vault_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("."))
}

fn main() -> PlatformResult<()> {
    initialize_logging();

    let cli = CliArgs::parse();

    let config_manager = CoreConfigManager::new();
    let mut config = match config_manager.load_config(APP_NAME) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Main: Failed to load configuration, using defaults: {e}");
            AppConfig::default()
        }
    };
    if let Some(editor) = &cli.editor {
        config.editor_command = editor.clone();
    }

    let vault_path = resolve_vault_path(&cli, &mut config, &config_manager);
    log::info!(
        "Main: Starting for vault '{}' at {vault_path:?} with editor '{}'.",
        crate::core::vault::describe_vault(&vault_path),
        config.editor_command
    );

    let platform = PlatformInterface::new(APP_NAME.to_string())?;
    let vault_host = Arc::new(CoreVaultHost::new(
        vault_path,
        config.exclude_patterns.clone(),
    ));
    let launcher = Arc::new(CoreProcessLauncher::new());
    let logic: Arc<Mutex<dyn PlatformEventHandler>> = Arc::new(Mutex::new(VaultOpenerLogic::new(
        vault_host,
        launcher,
        config,
        platform.event_sender(),
    )));

    let run_result = platform.run(logic);
    log::info!("Main: Event loop exited.");
    run_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfigError;
    use std::sync::Mutex as StdMutex;

    #[test]
    fn test_cli_vault_and_editor() {
        let parsed = CliArgs::try_parse_from(["vault_opener", "--editor", "code", "/notes"]).unwrap();
        assert_eq!(parsed.vault_path, Some(PathBuf::from("/notes")));
        assert_eq!(parsed.editor, Some("code".to_string()));

        let short = CliArgs::try_parse_from(["vault_opener", "-e", "cursor"]).unwrap();
        assert_eq!(short.editor, Some("cursor".to_string()));
        assert_eq!(short.vault_path, None);
    }

    #[test]
    fn test_cli_rejects_bad_arguments() {
        assert!(CliArgs::try_parse_from(["vault_opener", "--editor"]).is_err());
        assert!(CliArgs::try_parse_from(["vault_opener", "--bogus"]).is_err());
        assert!(CliArgs::try_parse_from(["vault_opener", "/a", "/b"]).is_err());
        assert_eq!(
            CliArgs::try_parse_from(["vault_opener"]).unwrap(),
            CliArgs::default()
        );
    }

    #[test]
    fn test_cli_help_is_reported_by_clap() {
        let err = CliArgs::try_parse_from(["vault_opener", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    struct RecordingConfigManager {
        saved: StdMutex<Vec<AppConfig>>,
    }

    impl ConfigManagerOperations for RecordingConfigManager {
        fn load_config(&self, _app_name: &str) -> Result<AppConfig, ConfigError> {
            Ok(AppConfig::default())
        }
        fn save_config(&self, _app_name: &str, config: &AppConfig) -> Result<(), ConfigError> {
            self.saved.lock().unwrap().push(config.clone());
            Ok(())
        }
    }

    #[test]
    fn test_resolve_vault_path_prefers_cli_and_remembers_it() {
        let manager = RecordingConfigManager {
            saved: StdMutex::new(Vec::new()),
        };
        let mut config = AppConfig {
            last_vault_path: Some(PathBuf::from("/old/vault")),
            ..AppConfig::default()
        };
        let cli = CliArgs {
            vault_path: Some(PathBuf::from("/new/vault")),
            ..CliArgs::default()
        };

        let chosen = resolve_vault_path(&cli, &mut config, &manager);

        assert_eq!(chosen, PathBuf::from("/new/vault"));
        let saved = manager.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].last_vault_path, Some(PathBuf::from("/new/vault")));
    }

    #[test]
    fn test_resolve_vault_path_falls_back_to_last_vault() {
        let manager = RecordingConfigManager {
            saved: StdMutex::new(Vec::new()),
        };
        let mut config = AppConfig {
            last_vault_path: Some(PathBuf::from("/old/vault")),
            ..AppConfig::default()
        };

        let chosen = resolve_vault_path(&CliArgs::default(), &mut config, &manager);

        assert_eq!(chosen, PathBuf::from("/old/vault"));
        assert!(manager.saved.lock().unwrap().is_empty());
    }
}
