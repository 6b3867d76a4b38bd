//! Blocks client tests.
//!
//! Peers are `sh -c` scripts; the blocks-mode arguments appended after the
//! script land in its positional parameters and are ignored.

mod interaction_test;
mod update_test;

use std::time::Duration;

use rofi_blocks::blocks::BlocksCommand;

/// Upper bound for anything a test waits on.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Command running `script` as the peer process.
pub fn peer(script: &str) -> BlocksCommand {
    BlocksCommand::with_prefix(["sh", "-c", script, "sh"])
}

/// Verify all public blocks types are exported from the library.
#[test]
fn test_all_blocks_types_exported() {
    use rofi_blocks::blocks::{
        decode_line, message_channel, BlocksClient, ClientState, DecodedLine, InputAction,
        Interaction, LaunchError, ProcessExit, UpdateCommand, BLOCKS_MODE_ARGS, DEFAULT_PROGRAM,
    };

    let _ = BlocksClient::new(BlocksCommand::new());
    let _ = UpdateCommand::new().input_action(InputAction::Send);
    let _ = Interaction::empty();
    let _ = message_channel();
    let _: fn() -> LaunchError = || LaunchError::AlreadyLaunched;

    assert_eq!(decode_line(b""), DecodedLine::Empty);
    assert_eq!(ClientState::default(), ClientState::Unstarted);
    assert_eq!(ProcessExit::default().status, None);
    assert_eq!(DEFAULT_PROGRAM, "rofi");
    assert_eq!(BLOCKS_MODE_ARGS.len(), 4);
}
