use super::console_executor::{self, ConsoleWindowState};
use super::error::{PlatformError, Result as PlatformResult};
use super::event_sender::AppEventSender;
use super::types::{AppEvent, PlatformEventHandler};

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

/*
 * The console platform layer. `PlatformInterface` owns the single event loop:
 * lines typed by the user and events posted from other threads (the editor
 * launch worker) arrive on one channel, are turned into `AppEvent`s, handed to
 * the application logic, and the commands it enqueues are executed against
 * the console.
 */

#[derive(Debug)]
enum LoopMessage {
    Input(String),
    InputClosed,
    Event(AppEvent),
}

const HELP_TEXT: &str = "Commands: 'open' shows the selection dialog, a row number toggles it, \
'ok' opens the selection in the editor, 'cancel' closes the dialog, 'quit' exits.";

pub struct PlatformInterface {
    tx: mpsc::Sender<LoopMessage>,
    rx: mpsc::Receiver<LoopMessage>,
    app_name: String,
}

impl PlatformInterface {
    pub fn new(app_name: String) -> PlatformResult<Self> {
        let (tx, rx) = mpsc::channel();
        log::debug!("Platform: PlatformInterface created for '{app_name}'.");
        Ok(PlatformInterface { tx, rx, app_name })
    }

    pub fn event_sender(&self) -> AppEventSender {
        let tx = self.tx.clone();
        AppEventSender::new(move |event| tx.send(LoopMessage::Event(event)).is_ok())
    }

    fn spawn_stdin_reader(&self) -> PlatformResult<()> {
        let tx = self.tx.clone();
        thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || {
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    match line {
                        Ok(text) => {
                            if tx.send(LoopMessage::Input(text)).is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            log::error!("Platform: Failed to read from stdin: {e}");
                            break;
                        }
                    }
                }
                let _ = tx.send(LoopMessage::InputClosed);
            })
            .map_err(|e| {
                PlatformError::OperationFailed(format!("Failed to start input thread: {e}"))
            })?;
        Ok(())
    }

    /*
     * Runs the event loop until the application logic requests quit or input
     * is closed. The selection dialog is opened once at startup.
     */
    pub fn run(&self, event_handler: Arc<Mutex<dyn PlatformEventHandler>>) -> PlatformResult<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let mut window_state = ConsoleWindowState::default();

        writeln!(out, "{} ({HELP_TEXT})", self.app_name)?;
        self.spawn_stdin_reader()?;
        self.event_sender().send(AppEvent::OpenSelectionDialogRequested);

        while let Ok(message) = self.rx.recv() {
            let event = match message {
                LoopMessage::Event(event) => event,
                LoopMessage::Input(line) => match translate_input(&line, &window_state) {
                    InputAction::Event(event) => event,
                    InputAction::Help => {
                        writeln!(out, "{HELP_TEXT}")?;
                        continue;
                    }
                    InputAction::Ignored(reason) => {
                        writeln!(out, "{reason}")?;
                        continue;
                    }
                },
                LoopMessage::InputClosed => {
                    log::info!("Platform: Input closed, quitting.");
                    AppEvent::QuitRequested
                }
            };

            dispatch_event(&event_handler, event, &mut window_state, &mut out)?;
            if window_state.quit_requested {
                break;
            }
        }

        match event_handler.lock() {
            Ok(mut handler) => handler.on_quit(),
            Err(_) => log::error!("Platform: Event handler mutex poisoned during shutdown."),
        }
        Ok(())
    }
}

// Hands one event to the application logic and executes what it enqueued.
pub(crate) fn dispatch_event(
    event_handler: &Arc<Mutex<dyn PlatformEventHandler>>,
    event: AppEvent,
    window_state: &mut ConsoleWindowState,
    out: &mut dyn Write,
) -> PlatformResult<()> {
    let mut handler = event_handler
        .lock()
        .map_err(|_| PlatformError::OperationFailed("Event handler mutex poisoned".into()))?;
    handler.handle_event(event);
    while let Some(command) = handler.try_dequeue_command() {
        if let Err(e) = console_executor::execute_command(window_state, command, out) {
            match e {
                PlatformError::Io(_) => return Err(e),
                other => log::error!("Platform: Failed to execute command: {other}"),
            }
        }
    }
    out.flush()?;
    Ok(())
}

#[derive(Debug)]
pub(crate) enum InputAction {
    Event(AppEvent),
    Help,
    Ignored(String),
}

// Interprets one line of user input against what the console currently shows.
pub(crate) fn translate_input(line: &str, window_state: &ConsoleWindowState) -> InputAction {
    let trimmed = line.trim();
    let dialog = window_state.open_dialog.as_ref();

    match trimmed.to_lowercase().as_str() {
        "" => return InputAction::Ignored(String::new()),
        "h" | "help" | "?" => return InputAction::Help,
        "q" | "quit" | "exit" => return InputAction::Event(AppEvent::QuitRequested),
        "o" | "open" => {
            return match dialog {
                Some(_) => InputAction::Ignored("The selection dialog is already open.".into()),
                None => InputAction::Event(AppEvent::OpenSelectionDialogRequested),
            };
        }
        "y" | "ok" | "confirm" => {
            return match dialog {
                Some(d) => InputAction::Event(AppEvent::DialogConfirmed {
                    window_id: d.window_id,
                }),
                None => InputAction::Ignored("No dialog is open. Type 'open' first.".into()),
            };
        }
        "c" | "cancel" => {
            return match dialog {
                Some(d) => InputAction::Event(AppEvent::DialogCancelled {
                    window_id: d.window_id,
                }),
                None => InputAction::Ignored("No dialog is open.".into()),
            };
        }
        _ => {}
    }

    let Ok(row_number) = trimmed.parse::<usize>() else {
        return InputAction::Ignored(format!("Unknown command '{trimmed}'. Type 'help'."));
    };
    let Some(d) = dialog else {
        return InputAction::Ignored("No dialog is open. Type 'open' first.".into());
    };
    match d.item_for_row_number(row_number) {
        Some((item_id, new_state)) => InputAction::Event(AppEvent::TreeViewItemToggledByUser {
            window_id: d.window_id,
            item_id,
            new_state,
        }),
        None => InputAction::Ignored(format!("There is no row {row_number}.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform_layer::types::{
        CheckState, PlatformCommand, TreeItemDescriptor, TreeItemId, WindowId,
    };
    use std::collections::VecDeque;

    fn state_with_dialog() -> ConsoleWindowState {
        let mut state = ConsoleWindowState::default();
        let items = vec![TreeItemDescriptor {
            id: TreeItemId(10),
            text: "Root".to_string(),
            is_folder: true,
            state: CheckState::Unchecked,
            children: vec![],
        }];
        let mut sink: Vec<u8> = Vec::new();
        console_executor::execute_command(
            &mut state,
            PlatformCommand::ShowSelectionDialog {
                window_id: WindowId(4),
                title: "t".to_string(),
                items,
            },
            &mut sink,
        )
        .unwrap();
        state
    }

    #[test]
    fn test_row_number_becomes_toggle_event() {
        let state = state_with_dialog();
        match translate_input(" 1 ", &state) {
            InputAction::Event(AppEvent::TreeViewItemToggledByUser {
                window_id,
                item_id,
                new_state,
            }) => {
                assert_eq!(window_id, WindowId(4));
                assert_eq!(item_id, TreeItemId(10));
                assert_eq!(new_state, CheckState::Checked);
            }
            other => panic!("Unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_confirm_and_cancel_need_open_dialog() {
        let empty = ConsoleWindowState::default();
        assert!(matches!(translate_input("ok", &empty), InputAction::Ignored(_)));
        assert!(matches!(translate_input("cancel", &empty), InputAction::Ignored(_)));

        let state = state_with_dialog();
        assert!(matches!(
            translate_input("OK", &state),
            InputAction::Event(AppEvent::DialogConfirmed { window_id: WindowId(4) })
        ));
        assert!(matches!(
            translate_input("c", &state),
            InputAction::Event(AppEvent::DialogCancelled { window_id: WindowId(4) })
        ));
    }

    #[test]
    fn test_open_quit_help_and_garbage() {
        let empty = ConsoleWindowState::default();
        assert!(matches!(
            translate_input("open", &empty),
            InputAction::Event(AppEvent::OpenSelectionDialogRequested)
        ));
        assert!(matches!(
            translate_input("open", &state_with_dialog()),
            InputAction::Ignored(_)
        ));
        assert!(matches!(
            translate_input("quit", &empty),
            InputAction::Event(AppEvent::QuitRequested)
        ));
        assert!(matches!(translate_input("help", &empty), InputAction::Help));
        assert!(matches!(translate_input("banana", &empty), InputAction::Ignored(_)));
        assert!(matches!(translate_input("9", &state_with_dialog()), InputAction::Ignored(_)));
    }

    struct ScriptedHandler {
        seen: Vec<String>,
        queue: VecDeque<PlatformCommand>,
    }

    impl PlatformEventHandler for ScriptedHandler {
        fn handle_event(&mut self, event: AppEvent) {
            self.seen.push(format!("{event:?}"));
            self.queue.push_back(PlatformCommand::ShowNotification {
                text: "handled".to_string(),
                severity: crate::platform_layer::MessageSeverity::Information,
            });
            // Refers to a dialog that is not open; must be logged, not fatal.
            self.queue.push_back(PlatformCommand::CloseDialog {
                window_id: WindowId(99),
            });
        }

        fn try_dequeue_command(&mut self) -> Option<PlatformCommand> {
            self.queue.pop_front()
        }
    }

    #[test]
    fn test_dispatch_event_executes_all_enqueued_commands() {
        let handler = Arc::new(Mutex::new(ScriptedHandler {
            seen: Vec::new(),
            queue: VecDeque::new(),
        }));
        let dyn_handler: Arc<Mutex<dyn PlatformEventHandler>> = handler.clone();
        let mut state = ConsoleWindowState::default();
        let mut out: Vec<u8> = Vec::new();

        let result = dispatch_event(&dyn_handler, AppEvent::QuitRequested, &mut state, &mut out);

        assert!(result.is_ok());
        assert_eq!(String::from_utf8(out).unwrap(), "[info] handled\n");
        assert_eq!(handler.lock().unwrap().seen, vec!["QuitRequested".to_string()]);
    }

    #[test]
    fn test_event_sender_delivers_to_loop_channel() {
        let platform = PlatformInterface::new("test".to_string()).unwrap();
        platform.event_sender().send(AppEvent::QuitRequested);
        assert!(matches!(
            platform.rx.recv().unwrap(),
            LoopMessage::Event(AppEvent::QuitRequested)
        ));
    }
}
