/*
 * This module provides the application logic layer, centered around
 * `VaultOpenerLogic`, which acts as the Presenter. It also includes
 * `SelectionDialogState` for the state of one selection dialog session.
 * Unit tests for `VaultOpenerLogic` are in `handler_tests.rs`.
 */
pub mod handler;
pub mod selection_dialog_state;
pub mod ui_constants;


pub use handler::VaultOpenerLogic;
