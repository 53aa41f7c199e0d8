use super::types::PlatformCommand;

/*
 * Decides when a windowed session is over. The Win32 frontend has no console
 * to fall back on, so once the dialog is gone and nothing else is pending the
 * application exits on its own.
 *
 * `after_confirm` is true when the commands came from handling
 * `DialogConfirmed`. A confirmed dialog that produced no notification has
 * handed an editor launch to the launcher, and its result is still to come.
 */
pub(crate) fn session_finished(
    after_confirm: bool,
    commands: &[PlatformCommand],
    dialog_open: bool,
) -> bool {
    if commands
        .iter()
        .any(|c| matches!(c, PlatformCommand::QuitApplication))
    {
        return true;
    }
    if dialog_open {
        return false;
    }
    let notified = commands
        .iter()
        .any(|c| matches!(c, PlatformCommand::ShowNotification { .. }));
    !(after_confirm && !notified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform_layer::types::{MessageSeverity, WindowId};

    fn notification() -> PlatformCommand {
        PlatformCommand::ShowNotification {
            text: "done".to_string(),
            severity: MessageSeverity::Information,
        }
    }

    #[test]
    fn test_open_dialog_keeps_session_alive() {
        assert!(!session_finished(false, &[], true));
        assert!(!session_finished(false, &[notification()], true));
    }

    #[test]
    fn test_quit_command_ends_session_even_with_dialog() {
        assert!(session_finished(
            false,
            &[
                PlatformCommand::CloseDialog {
                    window_id: WindowId(1)
                },
                PlatformCommand::QuitApplication
            ],
            true
        ));
    }

    #[test]
    fn test_confirm_waits_for_launch_result() {
        let close = PlatformCommand::CloseDialog {
            window_id: WindowId(1),
        };
        assert!(!session_finished(true, std::slice::from_ref(&close), false));
        // Nothing selected: the warning is the last thing to show.
        assert!(session_finished(true, &[close, notification()], false));
    }

    #[test]
    fn test_cancel_and_launch_result_end_session() {
        let cancel = [PlatformCommand::CloseDialog {
            window_id: WindowId(1),
        }];
        assert!(session_finished(false, &cancel, false));
        assert!(session_finished(false, &[notification()], false));
    }
}
